//! Authentication middleware
//!
//! Looks the request up in the access rules and, when authentication is
//! required, runs the Basic credentials through the gate:
//! `Authorization: Basic <base64(username:password)>`

use axum::{
    body::Body,
    extract::State,
    http::{header::WWW_AUTHENTICATE, Request, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
};
use simple_auth::{challenge, extract_credentials};
use simple_core::types::AuthVerdict;
use tracing::debug;

use crate::access::Access;
use crate::server::AppState;

/// Principal the gate authenticated, attached to the request extensions
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthenticatedUser(pub String);

impl AuthenticatedUser {
    pub fn username(&self) -> &str {
        &self.0
    }
}

/// Access gate middleware
pub async fn access_gate(
    State(state): State<AppState>,
    mut request: Request<Body>,
    next: Next,
) -> Response {
    let access = state
        .rules
        .evaluate(request.method(), request.uri().path());

    if access == Access::PermitAll {
        return next.run(request).await;
    }

    let outcome = match extract_credentials(request.headers()) {
        Ok(credentials) => state.gate.evaluate(&credentials).await,
        Err(e) => Err(e),
    };

    if let Some(metrics) = &state.metrics {
        metrics.record_auth_attempt(match &outcome {
            Ok(_) => "authenticated",
            Err(e) => e.code(),
        });
    }

    if let Err(e) = &outcome {
        debug!(
            path = %request.uri().path(),
            reason = e.code(),
            "Request not authenticated"
        );
    }

    match AuthVerdict::from(outcome) {
        AuthVerdict {
            authenticated: true,
            principal: Some(principal),
        } => {
            request.extensions_mut().insert(AuthenticatedUser(principal));
            next.run(request).await
        }
        _ => unauthorized(&state.config.auth.realm),
    }
}

/// 401 carrying a Basic challenge; the body never says why
fn unauthorized(realm: &str) -> Response {
    (
        StatusCode::UNAUTHORIZED,
        [(WWW_AUTHENTICATE, challenge(realm))],
    )
        .into_response()
}
