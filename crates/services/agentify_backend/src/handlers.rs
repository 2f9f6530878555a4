use agentify_common::{log_error, CredentialRecord, IntoHttpResponse};
use axum::{
    body::Bytes,
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::{json, Value};
use tracing::info;

use crate::app_state::AppState;

fn bad_request(body: Value) -> Response {
    (StatusCode::BAD_REQUEST, Json(body)).into_response()
}

/// `POST /invoke`: runs one instruction for the caller whose credential is in the body.
pub async fn invoke(State(state): State<AppState>, body: Bytes) -> Response {
    let payload = match serde_json::from_slice::<Value>(&body) {
        Ok(Value::Object(map)) => map,
        _ => return bad_request(json!({ "error": "Request body must be JSON" })),
    };

    let input = payload.get("input").and_then(Value::as_str);
    let token = payload.get("token").filter(|t| !t.is_null());
    let (input, token) = match (input, token) {
        (Some(input), Some(token)) => (input.to_string(), token.clone()),
        _ => {
            return bad_request(json!({ "error": "Missing 'input' or 'token' in request body" }))
        }
    };

    let credential = match CredentialRecord::from_value(token) {
        Ok(credential) => credential,
        Err(e) => {
            return bad_request(json!({
                "error": "Invalid 'token' in request body",
                "details": e.to_string(),
            }))
        }
    };

    info!("Dispatching instruction ({} chars)", input.len());
    match state.dispatcher.run(&input, credential).await {
        Ok(result) => Json(json!({ "success": true, "result": result })).into_response(),
        Err(e) => {
            log_error(&e, "Dispatch failed");
            e.into_http_response()
        }
    }
}

/// `GET /health`
pub async fn health() -> Json<Value> {
    Json(json!({ "status": "healthy", "message": "AI Agent API is running" }))
}
