use std::{borrow::Cow, collections::BTreeMap, fmt};

use validator::ValidationErrors;

/// Escapes text for use inside element content and quoted attributes.
pub fn escape(value: &str) -> Cow<'_, str> {
    if !value.contains(['&', '<', '>', '"', '\'']) {
        return Cow::Borrowed(value);
    }
    let mut escaped = String::with_capacity(value.len() + 8);
    for c in value.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#x27;"),
            _ => escaped.push(c),
        }
    }
    Cow::Owned(escaped)
}

/// Messages per field name. Errors that belong to no field live under
/// [`FormErrors::NON_FIELD`].
#[derive(Debug, Default, Clone, PartialEq)]
pub struct FormErrors(BTreeMap<String, Vec<String>>);

impl FormErrors {
    pub const NON_FIELD: &'static str = "__all__";

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0.entry(field.to_owned()).or_default().push(message.into());
    }

    pub fn non_field(message: impl Into<String>) -> Self {
        let mut errors = Self::default();
        errors.add(Self::NON_FIELD, message);
        errors
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn get(&self, field: &str) -> &[String] {
        self.0.get(field).map(Vec::as_slice).unwrap_or_default()
    }

    fn tags<'a>(&'a self, field: &str) -> impl Iterator<Item = HtmlTag<'a>> {
        self.get(field).iter().map(|message| {
            HtmlTag::ChildTag(GeneralChildTag::new(
                Some(ChildTag::P),
                BasicAttributes::class("form-error"),
                Cow::Borrowed(message.as_str()),
            ))
        })
    }
}

impl From<ValidationErrors> for FormErrors {
    fn from(errors: ValidationErrors) -> Self {
        let mut form_errors = Self::default();
        for (field, field_errors) in errors.field_errors() {
            for error in field_errors {
                let message = error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid value ({}).", error.code));
                form_errors.add(&field, message);
            }
        }
        form_errors
    }
}

#[derive(Default, Debug, Clone, Copy, PartialEq)]
pub enum InputType {
    #[default]
    Text,
    Password,
    File,
    Hidden,
}

impl fmt::Display for InputType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Text => write!(f, "text"),
            Self::Password => write!(f, "password"),
            Self::File => write!(f, "file"),
            Self::Hidden => write!(f, "hidden"),
        }
    }
}

#[derive(Default)]
pub struct InputTag<'a> {
    name: Cow<'a, str>,
    type_: InputType,
    value: Option<Cow<'a, str>>,
    required: bool,
}

impl<'a> InputTag<'a> {
    pub fn new(name: &'a str, type_: InputType) -> Self {
        Self {
            name: Cow::Borrowed(name),
            type_,
            ..Default::default()
        }
    }

    pub fn value(mut self, value: &'a str) -> Self {
        self.value = Some(Cow::Borrowed(value));
        self
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }
}

impl fmt::Display for InputTag<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<input id=\"id_{name}\" name=\"{name}\" type=\"{type_}\"",
            name = self.name,
            type_ = self.type_
        )?;
        // browsers never prefill file inputs, nor do we echo passwords back
        if let (Some(value), InputType::Text | InputType::Hidden) = (&self.value, self.type_) {
            write!(f, " value=\"{}\"", escape(value))?;
        }
        if self.required {
            write!(f, " required")?;
        }
        write!(f, ">")
    }
}

pub struct TextareaTag<'a> {
    name: Cow<'a, str>,
    value: Cow<'a, str>,
    required: bool,
}

impl<'a> TextareaTag<'a> {
    pub fn new(name: &'a str, value: &'a str, required: bool) -> Self {
        Self {
            name: Cow::Borrowed(name),
            value: Cow::Borrowed(value),
            required,
        }
    }
}

impl fmt::Display for TextareaTag<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<textarea id=\"id_{name}\" name=\"{name}\" rows=\"10\"{required}>{value}</textarea>",
            name = self.name,
            required = if self.required { " required" } else { "" },
            value = escape(&self.value)
        )
    }
}

/// A `<select>` whose first option is the empty choice.
pub struct SelectTag<'a> {
    name: Cow<'a, str>,
    options: Vec<(String, Cow<'a, str>)>,
    selected: Option<String>,
}

impl<'a> SelectTag<'a> {
    pub fn new(name: &'a str, options: Vec<(String, Cow<'a, str>)>, selected: Option<String>) -> Self {
        Self {
            name: Cow::Borrowed(name),
            options,
            selected,
        }
    }
}

impl fmt::Display for SelectTag<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<select id=\"id_{name}\" name=\"{name}\">", name = self.name)?;
        write!(f, "<option value=\"\">---------</option>")?;
        for (value, label) in &self.options {
            let selected = self.selected.as_deref() == Some(value.as_str());
            write!(
                f,
                "<option value=\"{}\"{}>{}</option>",
                escape(value),
                if selected { " selected" } else { "" },
                escape(label)
            )?;
        }
        write!(f, "</select>")
    }
}

#[derive(Default, Clone, Copy)]
pub enum Enctype {
    #[default]
    UrlEncoded,
    Multipart,
}

impl fmt::Display for Enctype {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::UrlEncoded => write!(f, "application/x-www-form-urlencoded"),
            Self::Multipart => write!(f, "multipart/form-data"),
        }
    }
}

pub struct FormTag<'a> {
    action: Cow<'a, str>,
    method: Cow<'a, str>,
    enctype: Enctype,
    attributes: BasicAttributes<'a>,
    children: Vec<HtmlTag<'a>>,
}

impl<'a> FormTag<'a> {
    pub fn new(children: Vec<HtmlTag<'a>>) -> Self {
        let mut form = Self::default();
        form.children = children;
        form
    }

    pub fn set_action(mut self, action: impl Into<Cow<'a, str>>) -> Self {
        self.action = action.into();
        self
    }

    pub fn set_enctype(mut self, enctype: Enctype) -> Self {
        self.enctype = enctype;
        self
    }

    pub fn set_id(mut self, id: &'a str) -> Self {
        self.attributes.id = Cow::Borrowed(id);
        self
    }

    pub fn add_button(mut self, button: HtmlTag<'a>) -> Self {
        self.children.push(button);
        self
    }

    fn default() -> Self {
        Self {
            action: Cow::default(),
            method: Cow::Borrowed("POST"),
            enctype: Enctype::default(),
            attributes: BasicAttributes {
                id: Cow::Borrowed("form-id"),
                class: Cow::Borrowed("form-class"),
            },
            children: vec![],
        }
    }
}

impl fmt::Display for FormTag<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "<form {} method=\"{}\" action=\"{}\" enctype=\"{}\">",
            self.attributes,
            self.method,
            escape(&self.action),
            self.enctype
        )?;
        for child in &self.children {
            write!(f, "{}", child)?;
        }
        write!(f, "</form>")
    }
}

#[derive(Default)]
pub enum ChildTag {
    #[default]
    Label,
    P,
}

impl fmt::Display for ChildTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Label => write!(f, "label"),
            Self::P => write!(f, "p"),
        }
    }
}

/// A leaf element with escaped text content, or bare text when `tag` is `None`.
#[derive(Default)]
pub struct GeneralChildTag<'a> {
    tag: Option<ChildTag>,
    attributes: BasicAttributes<'a>,
    value: Cow<'a, str>,
}

impl<'a> GeneralChildTag<'a> {
    pub fn new(tag: Option<ChildTag>, attributes: BasicAttributes<'a>, value: Cow<'a, str>) -> Self {
        Self {
            tag,
            attributes,
            value,
        }
    }

    pub fn label(for_field: &str, value: &'a str) -> Self {
        Self::new(
            Some(ChildTag::Label),
            BasicAttributes::default(),
            Cow::Borrowed(value),
        )
        .with_for(for_field)
    }

    fn with_for(mut self, for_field: &str) -> Self {
        self.attributes.id = Cow::Owned(format!("label_{}", for_field));
        self
    }

    pub fn empty(value: Cow<'a, str>) -> Self {
        Self {
            tag: None,
            attributes: BasicAttributes::default(),
            value,
        }
    }
}

impl fmt::Display for GeneralChildTag<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.tag {
            Some(tag) => write!(
                f,
                "<{tag} {attributes}>{value}</{tag}>",
                tag = tag,
                attributes = self.attributes,
                value = escape(&self.value),
            ),
            None => write!(f, "{}", escape(&self.value)),
        }
    }
}

pub enum ParentTag {
    Button,
    Div,
}

impl fmt::Display for ParentTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Button => write!(f, "button"),
            Self::Div => write!(f, "div"),
        }
    }
}

pub struct GeneralParentTag<'a> {
    tag: ParentTag,
    attributes: BasicAttributes<'a>,
    children: Vec<HtmlTag<'a>>,
    type_: Option<Cow<'a, str>>,
}

impl<'a> GeneralParentTag<'a> {
    pub fn new(tag: ParentTag, attributes: BasicAttributes<'a>, children: Vec<HtmlTag<'a>>) -> Self {
        Self {
            tag,
            attributes,
            children,
            type_: None,
        }
    }

    pub fn submit_button(value: &'a str) -> Self {
        Self {
            tag: ParentTag::Button,
            attributes: BasicAttributes::class("btn btn-primary"),
            children: vec![HtmlTag::ChildTag(GeneralChildTag::empty(Cow::Borrowed(value)))],
            type_: Some(Cow::Borrowed("submit")),
        }
    }

    /// A labelled form row: label, control, then its error messages.
    pub fn field(
        name: &'a str,
        label: &'a str,
        control: HtmlTag<'a>,
        errors: &'a FormErrors,
    ) -> Self {
        let mut children = vec![
            HtmlTag::ChildTag(GeneralChildTag::label(name, label)),
            control,
        ];
        children.extend(errors.tags(name));
        Self::new(ParentTag::Div, BasicAttributes::class("form-group"), children)
    }

    pub fn non_field_errors(errors: &'a FormErrors) -> Self {
        Self::new(
            ParentTag::Div,
            BasicAttributes::class("form-errors"),
            errors.tags(FormErrors::NON_FIELD).collect(),
        )
    }
}

impl fmt::Display for GeneralParentTag<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "<{} {}", self.tag, self.attributes)?;
        if let Some(type_) = &self.type_ {
            write!(f, " type=\"{}\"", type_)?;
        }
        write!(f, ">")?;
        for child in &self.children {
            write!(f, "{}", child)?;
        }
        write!(f, "</{}>", self.tag)
    }
}

#[derive(Default)]
pub struct BasicAttributes<'a> {
    id: Cow<'a, str>,
    class: Cow<'a, str>,
}

impl<'a> BasicAttributes<'a> {
    pub fn new(id: Cow<'a, str>, class: Cow<'a, str>) -> Self {
        Self { id, class }
    }

    pub fn class(class: &'a str) -> Self {
        Self {
            class: Cow::Borrowed(class),
            ..Default::default()
        }
    }
}

impl fmt::Display for BasicAttributes<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "id=\"{}\" class=\"{}\"", self.id, self.class)
    }
}

pub enum HtmlTag<'a> {
    Form(FormTag<'a>),
    ParentTag(GeneralParentTag<'a>),
    Input(InputTag<'a>),
    Textarea(TextareaTag<'a>),
    Select(SelectTag<'a>),
    ChildTag(GeneralChildTag<'a>),
}

impl fmt::Display for HtmlTag<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Form(tag) => write!(f, "{}", tag),
            Self::ParentTag(tag) => write!(f, "{}", tag),
            Self::Input(tag) => write!(f, "{}", tag),
            Self::Textarea(tag) => write!(f, "{}", tag),
            Self::Select(tag) => write!(f, "{}", tag),
            Self::ChildTag(tag) => write!(f, "{}", tag),
        }
    }
}

/// Renders a form struct, its current values and its errors, as HTML.
/// The output is already escaped and goes through templates with `|safe`.
pub trait ToForm {
    fn form_button<'a>() -> HtmlTag<'a>;

    fn raw_form<'a>(&'a self) -> FormTag<'a>;

    fn to_form(&self) -> HtmlTag<'_> {
        let form = self.raw_form().add_button(Self::form_button());
        HtmlTag::Form(form)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_form_tag() {
        let result = HtmlTag::Form(FormTag::default());
        assert_eq!(
            &result.to_string(),
            "<form id=\"form-id\" class=\"form-class\" method=\"POST\" action=\"\" enctype=\"application/x-www-form-urlencoded\"></form>"
        );
    }

    #[test]
    fn test_form_tag_with_children() {
        let children = HtmlTag::Input(InputTag::new("username", InputType::Text).value("leo"));
        let result = HtmlTag::Form(
            FormTag::new(vec![children])
                .set_action("/auth/login/")
                .set_enctype(Enctype::Multipart),
        );
        assert_eq!(
            &result.to_string(),
            "<form id=\"form-id\" class=\"form-class\" method=\"POST\" action=\"/auth/login/\" enctype=\"multipart/form-data\"><input id=\"id_username\" name=\"username\" type=\"text\" value=\"leo\"></form>"
        );
    }

    #[test]
    fn test_values_are_escaped() {
        let textarea = TextareaTag::new("text", "<script>alert(\"x\")</script>", true);
        assert_eq!(
            textarea.to_string(),
            "<textarea id=\"id_text\" name=\"text\" rows=\"10\" required>&lt;script&gt;alert(&quot;x&quot;)&lt;/script&gt;</textarea>"
        );
    }

    #[test]
    fn test_password_is_never_echoed() {
        let input = InputTag::new("password", InputType::Password).value("hunter22");
        assert!(!input.to_string().contains("hunter22"));
    }

    #[test]
    fn test_select_marks_selected_option() {
        let select = SelectTag::new(
            "group",
            vec![("1".into(), "Cats".into()), ("2".into(), "Dogs".into())],
            Some("2".into()),
        );
        let html = select.to_string();
        assert!(html.contains("<option value=\"2\" selected>Dogs</option>"));
        assert!(html.contains("<option value=\"1\">Cats</option>"));
    }

    #[test]
    fn test_field_renders_errors() {
        let mut errors = FormErrors::default();
        errors.add("text", "This field is required.");
        let field = GeneralParentTag::field(
            "text",
            "Text",
            HtmlTag::Textarea(TextareaTag::new("text", "", true)),
            &errors,
        );
        assert!(field
            .to_string()
            .contains("<p id=\"\" class=\"form-error\">This field is required.</p>"));
    }
}
