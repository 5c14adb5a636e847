//! Endpoint handlers

use axum::{http::StatusCode, Extension};

use crate::middleware::AuthenticatedUser;

/// GET /api/public
pub async fn public_string() -> &'static str {
    "It is public."
}

/// GET /api/private
pub async fn private_string(Extension(user): Extension<AuthenticatedUser>) -> String {
    format!("{}, it is private.", user.username())
}

/// Requests matching no route, after the access gate let them through
pub async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}
