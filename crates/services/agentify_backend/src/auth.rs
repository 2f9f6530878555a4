use axum::{
    extract::{Request, State},
    http::{header::AUTHORIZATION, StatusCode},
    middleware::Next,
    response::{IntoResponse, Response},
    Json,
};
use constant_time_eq::constant_time_eq;
use serde_json::json;
use tracing::warn;

use crate::app_state::AppState;

fn bearer_token(req: &Request) -> Option<&str> {
    let value = req.headers().get(AUTHORIZATION)?.to_str().ok()?;
    let (scheme, token) = value.split_once(' ')?;
    scheme.eq_ignore_ascii_case("bearer").then(|| token.trim())
}

fn unauthorized(reason: &str) -> Response {
    warn!("Rejected /invoke request: {}", reason);
    (
        StatusCode::UNAUTHORIZED,
        Json(json!({ "success": false, "error": "Unauthorized" })),
    )
        .into_response()
}

/// Requires `Authorization: Bearer <shared secret>`.
///
/// Runs before the body is read, so a bad bearer is a 401 whatever the body.
pub async fn require_bearer(State(state): State<AppState>, req: Request, next: Next) -> Response {
    let expected = state.config.auth.shared_secret.as_bytes();
    if expected.is_empty() {
        return unauthorized("no shared secret configured");
    }
    let verdict = match bearer_token(&req) {
        Some(provided) if constant_time_eq(provided.as_bytes(), expected) => Ok(()),
        Some(_) => Err("incorrect bearer token"),
        None => Err("missing bearer token"),
    };
    match verdict {
        Ok(()) => next.run(req).await,
        Err(reason) => unauthorized(reason),
    }
}
