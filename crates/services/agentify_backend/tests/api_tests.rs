use agentify_agent::{AssistantTurn, ChatMessage, Dispatcher, MockChatModel};
use agentify_backend::{routes, AppState};
use agentify_common::{dispatch_error, MockSessionFactory};
use agentify_config::{AppConfig, AuthConfig, CorsConfig, GoogleConfig, LlmConfig, ServerConfig};
use agentify_gcal::CalendarSettings;
use axum::{
    body::{to_bytes, Body},
    http::{header, Request, StatusCode},
    Router,
};
use chrono::NaiveTime;
use serde_json::{json, Value};
use std::sync::Arc;
use tower::ServiceExt;

const SECRET: &str = "s3cret-bearer";

fn config() -> Arc<AppConfig> {
    Arc::new(AppConfig {
        server: ServerConfig::default(),
        llm: LlmConfig {
            endpoint: "https://example.openai.azure.com".to_string(),
            api_key: "azure-key".to_string(),
            deployment: "gpt-4o".to_string(),
            api_version: "2024-12-01-preview".to_string(),
            temperature: 0.0,
            max_iterations: 15,
            timeout_secs: 60,
        },
        auth: AuthConfig {
            shared_secret: SECRET.to_string(),
        },
        google: GoogleConfig::default(),
        cors: CorsConfig::default(),
    })
}

fn settings() -> CalendarSettings {
    CalendarSettings {
        time_zone: chrono_tz::Asia::Kolkata,
        calendar_id: "primary".to_string(),
        work_start: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
        work_end: NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
    }
}

fn app(model: MockChatModel) -> Router {
    let dispatcher = Dispatcher::new(
        Arc::new(model),
        Arc::new(MockSessionFactory::new()),
        settings(),
        15,
    );
    routes(AppState::new(config(), Arc::new(dispatcher)))
}

/// A model that must never be consulted.
fn untouched_model() -> MockChatModel {
    let mut model = MockChatModel::new();
    model.expect_complete().never();
    model
}

fn invoke_request(bearer: Option<&str>, body: &str) -> Request<Body> {
    let mut builder = Request::builder()
        .method("POST")
        .uri("/invoke")
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(bearer) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", bearer));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

async fn json_body(response: axum::response::Response) -> Value {
    let bytes = to_bytes(response.into_body(), usize::MAX).await.unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

fn valid_body() -> String {
    json!({
        "input": "What is on my calendar?",
        "token": { "access_token": "ya29.caller", "refresh_token": "1//r" }
    })
    .to_string()
}

#[tokio::test]
async fn test_health() {
    let response = app(untouched_model())
        .oneshot(Request::builder().uri("/health").body(Body::empty()).unwrap())
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await,
        json!({ "status": "healthy", "message": "AI Agent API is running" })
    );
}

#[tokio::test]
async fn test_missing_bearer_is_401_whatever_the_body() {
    for body in [valid_body(), "not json".to_string(), "{}".to_string()] {
        let response = app(untouched_model())
            .oneshot(invoke_request(None, &body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}

#[tokio::test]
async fn test_incorrect_bearer_is_401() {
    let response = app(untouched_model())
        .oneshot(invoke_request(Some("wrong-secret"), &valid_body()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);

    let basic = Request::builder()
        .method("POST")
        .uri("/invoke")
        .header(header::AUTHORIZATION, format!("Basic {}", SECRET))
        .body(Body::from(valid_body()))
        .unwrap();
    let response = app(untouched_model()).oneshot(basic).await.unwrap();
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_non_json_body_is_400() {
    for body in ["", "not json", "[1, 2]", "\"text\""] {
        let response = app(untouched_model())
            .oneshot(invoke_request(Some(SECRET), body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            json_body(response).await,
            json!({ "error": "Request body must be JSON" })
        );
    }
}

#[tokio::test]
async fn test_missing_fields_are_400_and_skip_dispatch() {
    let bodies = [
        json!({ "token": { "access_token": "t" } }),
        json!({ "input": "hello" }),
        json!({ "input": "hello", "token": null }),
        json!({ "input": 42, "token": { "access_token": "t" } }),
    ];
    for body in bodies {
        let response = app(untouched_model())
            .oneshot(invoke_request(Some(SECRET), &body.to_string()))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        assert_eq!(
            json_body(response).await,
            json!({ "error": "Missing 'input' or 'token' in request body" })
        );
    }
}

#[tokio::test]
async fn test_token_must_be_an_object() {
    let body = json!({ "input": "hello", "token": "ya29.raw-string" }).to_string();
    let response = app(untouched_model())
        .oneshot(invoke_request(Some(SECRET), &body))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
}

#[tokio::test]
async fn test_success_envelope() {
    let mut model = MockChatModel::new();
    model
        .expect_complete()
        .withf(|messages, _| {
            matches!(messages.get(1), Some(ChatMessage::User(text)) if text == "What is on my calendar?")
        })
        .times(1)
        .returning(|_, _| Ok(AssistantTurn::Answer("Nothing today.".to_string())));

    let response = app(model)
        .oneshot(invoke_request(Some(SECRET), &valid_body()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        json_body(response).await,
        json!({ "success": true, "result": "Nothing today." })
    );
}

#[tokio::test]
async fn test_dispatch_failure_is_500_envelope() {
    let mut model = MockChatModel::new();
    model
        .expect_complete()
        .returning(|_, _| Err(dispatch_error("model unavailable")));

    let response = app(model)
        .oneshot(invoke_request(Some(SECRET), &valid_body()))
        .await
        .unwrap();
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);

    let body = json_body(response).await;
    assert_eq!(body["success"], false);
    assert_eq!(body["error"], "Failed to process request");
    assert!(body["details"].as_str().unwrap().contains("model unavailable"));
}
