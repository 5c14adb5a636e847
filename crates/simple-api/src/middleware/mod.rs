//! Request middleware

pub mod auth;

pub use auth::{access_gate, AuthenticatedUser};
