use serde::Deserialize;
use validator::Validate;

use crate::website::html::{
    FormErrors, FormTag, GeneralParentTag, HtmlTag, InputTag, InputType, ToForm,
};

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct LoginForm {
    #[validate(length(min = 1, message = "This field is required."))]
    pub username: String,
    #[validate(length(min = 1, message = "This field is required."))]
    pub password: String,
    pub next: String,
    #[serde(skip)]
    pub errors: FormErrors,
}

impl LoginForm {
    pub fn with_next(next: Option<&str>) -> Self {
        Self {
            next: next.unwrap_or_default().to_owned(),
            ..Default::default()
        }
    }

    pub fn normalize(&mut self) {
        self.username = self.username.trim().to_owned();
    }

    pub fn check(&self) -> Result<(), FormErrors> {
        self.validate().map_err(FormErrors::from)
    }

    /// The form after a failed attempt. Which half of the credentials was
    /// wrong is not disclosed.
    pub fn rejected(mut self) -> Self {
        self.password.clear();
        self.errors = FormErrors::non_field(
            "Please enter a correct username and password. Note that both fields may be case-sensitive.",
        );
        self
    }

    pub fn next(&self) -> Option<&str> {
        Some(self.next.as_str()).filter(|next| !next.is_empty())
    }
}

impl ToForm for LoginForm {
    fn form_button<'a>() -> HtmlTag<'a> {
        HtmlTag::ParentTag(GeneralParentTag::submit_button("Log in"))
    }

    fn raw_form<'a>(&'a self) -> FormTag<'a> {
        FormTag::new(vec![
            HtmlTag::ParentTag(GeneralParentTag::non_field_errors(&self.errors)),
            HtmlTag::ParentTag(GeneralParentTag::field(
                "username",
                "Username",
                HtmlTag::Input(InputTag::new("username", InputType::Text).value(&self.username).required()),
                &self.errors,
            )),
            HtmlTag::ParentTag(GeneralParentTag::field(
                "password",
                "Password",
                HtmlTag::Input(InputTag::new("password", InputType::Password).required()),
                &self.errors,
            )),
            HtmlTag::Input(InputTag::new("next", InputType::Hidden).value(&self.next)),
        ])
        .set_id("login-form")
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct SignupForm {
    #[validate(length(min = 1, max = 150, message = "Required. 150 characters or fewer."))]
    pub username: String,
    #[validate(length(min = 8, message = "This password is too short. It must contain at least 8 characters."))]
    pub password: String,
    pub password_confirmation: String,
    #[serde(skip)]
    pub errors: FormErrors,
}

impl SignupForm {
    pub fn normalize(&mut self) {
        self.username = self.username.trim().to_owned();
    }

    pub fn check(&self) -> Result<(), FormErrors> {
        let mut errors = self.validate().err().map(FormErrors::from).unwrap_or_default();
        if !self
            .username
            .chars()
            .all(|c| c.is_alphanumeric() || "@.+-_".contains(c))
        {
            errors.add(
                "username",
                "Letters, digits and @/./+/-/_ only.",
            );
        }
        if self.password != self.password_confirmation {
            errors.add("password_confirmation", "The two password fields didn't match.");
        }
        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl ToForm for SignupForm {
    fn form_button<'a>() -> HtmlTag<'a> {
        HtmlTag::ParentTag(GeneralParentTag::submit_button("Sign up"))
    }

    fn raw_form<'a>(&'a self) -> FormTag<'a> {
        FormTag::new(vec![
            HtmlTag::ParentTag(GeneralParentTag::field(
                "username",
                "Username",
                HtmlTag::Input(InputTag::new("username", InputType::Text).value(&self.username).required()),
                &self.errors,
            )),
            HtmlTag::ParentTag(GeneralParentTag::field(
                "password",
                "Password",
                HtmlTag::Input(InputTag::new("password", InputType::Password).required()),
                &self.errors,
            )),
            HtmlTag::ParentTag(GeneralParentTag::field(
                "password_confirmation",
                "Password confirmation",
                HtmlTag::Input(InputTag::new("password_confirmation", InputType::Password).required()),
                &self.errors,
            )),
        ])
        .set_id("signup-form")
    }
}
