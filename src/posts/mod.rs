mod forms;
mod routes;
mod services;

pub use forms::{sniff_image, CommentForm, PostForm};
pub use routes::routes;
pub use services::POST_IMAGES_DIR;
