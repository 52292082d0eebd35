//! Authentication middleware.

use axum::{
    body::Body,
    extract::State,
    http::{Request, header::AUTHORIZATION},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::api::state::AppState;
use crate::error::AppError;

/// Extract bearer token from Authorization header.
fn extract_bearer_token(req: &Request<Body>) -> Option<&str> {
    let auth_header = req.headers().get(AUTHORIZATION)?.to_str().ok()?;

    auth_header
        .strip_prefix("Bearer ")
        .or_else(|| auth_header.strip_prefix("bearer "))
}

/// Compare tokens without short-circuiting on the first differing byte.
fn tokens_match(given: &str, expected: &str) -> bool {
    given.len() == expected.len()
        && given
            .bytes()
            .zip(expected.bytes())
            .fold(0u8, |acc, (a, b)| acc | (a ^ b))
            == 0
}

/// Middleware that requires the admin bearer token.
pub async fn require_admin(
    State(state): State<AppState>,
    req: Request<Body>,
    next: Next,
) -> Response {
    let Some(token) = extract_bearer_token(&req) else {
        return AppError::Unauthorized.into_response();
    };

    if !tokens_match(token, &state.config.auth.admin_token) {
        tracing::debug!(path = %req.uri().path(), "Rejected admin token");
        return AppError::Unauthorized.into_response();
    }

    next.run(req).await
}
