use std::borrow::Cow;

use bytes::Bytes;
use serde::Deserialize;
use validator::Validate;

use crate::{
    models::Group,
    website::html::{
        BasicAttributes, ChildTag, Enctype, FormErrors, FormTag, GeneralChildTag,
        GeneralParentTag, HtmlTag, InputTag, InputType, SelectTag, TextareaTag, ToForm,
    },
};

const REQUIRED: &str = "This field is required.";
const INVALID_GROUP: &str = "Select a valid choice. That choice is not one of the available choices.";
const INVALID_IMAGE: &str =
    "Upload a valid image. The file you uploaded was either not an image or a corrupted image.";

/// Recognises the formats browsers display by their leading bytes and returns
/// the extension to store the file under.
pub fn sniff_image(content: &[u8]) -> Option<&'static str> {
    match content {
        [0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A, ..] => Some("png"),
        [0xFF, 0xD8, 0xFF, ..] => Some("jpg"),
        [b'G', b'I', b'F', b'8', b'7' | b'9', b'a', ..] => Some("gif"),
        [b'R', b'I', b'F', b'F', _, _, _, _, b'W', b'E', b'B', b'P', ..] => Some("webp"),
        [b'B', b'M', ..] => Some("bmp"),
        _ => None,
    }
}

#[derive(Debug, Clone)]
pub struct UploadedImage {
    pub file_name: String,
    pub content: Bytes,
}

/// Raw values of a submitted post form, before validation.
#[derive(Debug, Default)]
pub struct PostSubmission {
    pub text: String,
    pub group: String,
    pub image: Option<UploadedImage>,
}

/// What a valid post form resolves to.
#[derive(Debug)]
pub struct CleanPost {
    pub text: String,
    pub group_id: Option<i64>,
    pub image: Option<(UploadedImage, &'static str)>,
}

/// The create/edit form as shown to the author.
#[derive(Debug, Default)]
pub struct PostForm {
    pub text: String,
    pub group: String,
    pub current_image: Option<String>,
    pub groups: Vec<Group>,
    pub errors: FormErrors,
}

impl PostForm {
    pub fn new(groups: Vec<Group>) -> Self {
        Self {
            groups,
            ..Default::default()
        }
    }

    pub fn with_values(mut self, text: &str, group_id: Option<i64>, image: Option<&str>) -> Self {
        self.text = text.to_owned();
        self.group = group_id.map(|id| id.to_string()).unwrap_or_default();
        self.current_image = image.map(str::to_owned);
        self
    }

    /// Validates `submission` against the known groups. On failure the form
    /// comes back holding the submitted values and the errors.
    pub fn clean(mut self, submission: PostSubmission) -> Result<CleanPost, Self> {
        let text = submission.text.trim().to_owned();
        if text.is_empty() {
            self.errors.add("text", REQUIRED);
        }

        let group_id = match submission.group.trim() {
            "" => None,
            raw => match raw.parse::<i64>() {
                Ok(id) if self.groups.iter().any(|g| g.id == id) => Some(id),
                _ => {
                    self.errors.add("group", INVALID_GROUP);
                    None
                }
            },
        };

        let image = match submission.image {
            Some(image) => match sniff_image(&image.content) {
                Some(extension) => Some((image, extension)),
                None => {
                    self.errors.add("image", INVALID_IMAGE);
                    None
                }
            },
            None => None,
        };

        if self.errors.is_empty() {
            Ok(CleanPost {
                text,
                group_id,
                image,
            })
        } else {
            self.text = submission.text;
            self.group = submission.group;
            Err(self)
        }
    }
}

impl ToForm for PostForm {
    fn form_button<'a>() -> HtmlTag<'a> {
        HtmlTag::ParentTag(GeneralParentTag::submit_button("Save"))
    }

    fn raw_form<'a>(&'a self) -> FormTag<'a> {
        let options = self
            .groups
            .iter()
            .map(|g| (g.id.to_string(), Cow::Borrowed(g.title.as_str())))
            .collect();
        let selected = Some(self.group.clone()).filter(|g| !g.is_empty());

        let mut children = vec![
            HtmlTag::ParentTag(GeneralParentTag::field(
                "text",
                "Text",
                HtmlTag::Textarea(TextareaTag::new("text", &self.text, true)),
                &self.errors,
            )),
            HtmlTag::ParentTag(GeneralParentTag::field(
                "group",
                "Group",
                HtmlTag::Select(SelectTag::new("group", options, selected)),
                &self.errors,
            )),
        ];
        if let Some(current) = &self.current_image {
            children.push(HtmlTag::ChildTag(GeneralChildTag::new(
                Some(ChildTag::P),
                BasicAttributes::class("current-image"),
                Cow::Owned(format!("Currently: {}", current)),
            )));
        }
        children.push(HtmlTag::ParentTag(GeneralParentTag::field(
            "image",
            "Image",
            HtmlTag::Input(InputTag::new("image", InputType::File)),
            &self.errors,
        )));

        FormTag::new(children)
            .set_id("post-form")
            .set_enctype(Enctype::Multipart)
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
#[serde(default)]
pub struct CommentForm {
    #[validate(length(min = 1, message = "This field is required."))]
    pub text: String,
    #[serde(skip)]
    pub action: String,
    #[serde(skip)]
    pub errors: FormErrors,
}

impl CommentForm {
    pub fn for_post(post_id: i64) -> Self {
        Self {
            action: format!("/posts/{}/comment/", post_id),
            ..Default::default()
        }
    }

    /// The trimmed text when the form is valid.
    pub fn clean(mut self) -> Result<String, Self> {
        self.text = self.text.trim().to_owned();
        match self.validate() {
            Ok(()) => Ok(self.text),
            Err(errors) => {
                self.errors = errors.into();
                Err(self)
            }
        }
    }
}

impl ToForm for CommentForm {
    fn form_button<'a>() -> HtmlTag<'a> {
        HtmlTag::ParentTag(GeneralParentTag::submit_button("Send"))
    }

    fn raw_form<'a>(&'a self) -> FormTag<'a> {
        FormTag::new(vec![HtmlTag::ParentTag(GeneralParentTag::field(
            "text",
            "Comment",
            HtmlTag::Textarea(TextareaTag::new("text", &self.text, true)),
            &self.errors,
        ))])
        .set_id("comment-form")
        .set_action(self.action.as_str())
    }
}
