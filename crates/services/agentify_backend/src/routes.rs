use agentify_config::CorsConfig;
use axum::{
    middleware,
    routing::{get, post},
    Router,
};
use http::HeaderValue;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tracing::{info, warn};

use crate::app_state::AppState;
use crate::auth::require_bearer;
use crate::handlers::{health, invoke};

fn cors_layer(config: &CorsConfig) -> CorsLayer {
    let base = CorsLayer::new().allow_methods(Any).allow_headers(Any);
    if config.allowed_origins.iter().any(|o| o == "*") {
        return base.allow_origin(Any);
    }
    let origins: Vec<HeaderValue> = config
        .allowed_origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                warn!("Ignoring invalid CORS origin {:?}", origin);
                None
            }
        })
        .collect();
    base.allow_origin(AllowOrigin::list(origins))
}

/// Builds the service router: `POST /invoke` behind the bearer check, `GET /health` open.
pub fn routes(state: AppState) -> Router {
    info!(
        "Mounting /invoke and /health (CORS origins: {:?})",
        state.config.cors.allowed_origins
    );

    let protected = Router::new()
        .route("/invoke", post(invoke))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_bearer));

    Router::new()
        .merge(protected)
        .route("/health", get(health))
        .layer(TraceLayer::new_for_http())
        .layer(cors_layer(&state.config.cors))
        .with_state(state)
}
