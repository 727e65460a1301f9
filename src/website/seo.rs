use std::borrow::Cow;

/// Head metadata every page renders through `base.html`.
#[derive(Debug, Clone)]
pub struct Meta<'a> {
    pub meta_title: Cow<'a, str>,
    pub meta_description: Cow<'a, str>,
    pub meta_keywords: Cow<'a, str>,
    pub meta_author: Cow<'a, str>,
    pub meta_url: Cow<'a, str>,
}

impl Default for Meta<'_> {
    fn default() -> Self {
        Self {
            meta_title: Cow::Borrowed("Yatube"),
            meta_description: Cow::Borrowed(env!("CARGO_PKG_DESCRIPTION")),
            meta_keywords: Cow::Borrowed("blog,posts,groups,follow"),
            meta_author: Cow::Borrowed(env!("CARGO_PKG_AUTHORS")),
            meta_url: Cow::Borrowed("/"),
        }
    }
}

impl<'a> Meta<'a> {
    pub fn new(meta_title: impl Into<Cow<'a, str>>, meta_url: impl Into<Cow<'a, str>>) -> Self {
        Self {
            meta_title: meta_title.into(),
            meta_url: meta_url.into(),
            ..Default::default()
        }
    }

    pub fn with_description(mut self, meta_description: impl Into<Cow<'a, str>>) -> Self {
        self.meta_description = meta_description.into();
        self
    }
}
