mod forms;
mod middlewares;
mod routes;
mod services;

pub use forms::{LoginForm, SignupForm};
pub use middlewares::{login_required_middleware, sessions_middleware};
pub use routes::routes;
pub use services::{hash_password, verify_password};
