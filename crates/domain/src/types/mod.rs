//! Domain types and models

pub mod auth;
pub mod session;
pub mod user;

pub use auth::{
    LoginRequest, LoginResponse, MessageResponse, PasswordChange, RefreshRequest,
    RefreshResponse, Registration, TokenPair, UserEnvelope,
};
pub use session::Session;
pub use user::CurrentUser;
