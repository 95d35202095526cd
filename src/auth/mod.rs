//! User registration, login, and JWT session handling

pub mod middleware;
pub mod service;

pub use service::{AuthError, AuthService, Claims, RegisteredAccount};
