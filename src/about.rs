use axum::{routing::get, Router};

use crate::{create_view, state::WebsiteState};

create_view!(AuthorTemplate, author, "about/author.html", {
    meta_title: "About the author",
    meta_description: "Who writes and maintains Yatube.",
    meta_url: "/about/author/",
});

create_view!(TechTemplate, tech, "about/tech.html", {
    meta_title: "Technologies",
    meta_description: "What Yatube is built with.",
    meta_url: "/about/tech/",
});

pub fn routes(state: WebsiteState) -> Router<WebsiteState> {
    Router::new()
        .route("/about/author", get(author))
        .route("/about/tech", get(tech))
        .with_state(state)
}
