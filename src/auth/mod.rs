mod basic;

pub use basic::{
    hash_password, login_required_middleware, routes, sessions_middleware, verify_password,
    LoginForm, SignupForm,
};
