pub mod html;
mod seo;
mod views;

pub use seo::Meta;
pub use views::{not_found, template_to_response, HtmlError, HtmlResult};
