mod comment;
mod follow;
mod group;
mod post;
mod user;

pub use comment::Comment;
pub use follow::Follow;
pub use group::Group;
pub use post::{Post, PostFilter, POST_PREVIEW_CHARS};
pub use user::{User, UserWithPassword};

fn now() -> chrono::NaiveDateTime {
    chrono::Utc::now().naive_utc()
}
