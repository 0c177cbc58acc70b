//! Axum router wiring.
//!
//! Layer order, outermost first: instrumentation, CORS, panic catcher. Every
//! request (preflights, 404s and panicking handlers included) is counted.

use axum::{
    http::HeaderValue,
    middleware,
    routing::{get, post},
    Router,
};
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::config::ServerSection;
use crate::obs::middleware::track_requests;
use crate::http::error::panic_response;
use crate::{app_state::AppState, http, ops};

pub fn build_router(state: AppState) -> Router {
    let routes = Router::new()
        .route("/", get(ops::root))
        .route("/health", get(ops::health))
        .route("/metrics", get(ops::metrics))
        .route("/chat", post(http::chat::chat))
        .fallback(ops::not_found);

    with_layers(routes, &state).with_state(state)
}

fn with_layers(routes: Router<AppState>, state: &AppState) -> Router<AppState> {
    routes
        .layer(CatchPanicLayer::custom(panic_response))
        .layer(cors_layer(&state.cfg().server))
        .layer(middleware::from_fn_with_state(state.metrics(), track_requests))
}

fn cors_layer(server: &ServerSection) -> CorsLayer {
    let base = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if server.cors_allow_origins.iter().any(|o| o == "*") {
        return base.allow_origin(Any);
    }

    let origins: Vec<HeaderValue> = server
        .cors_allow_origins
        .iter()
        .filter_map(|o| match HeaderValue::from_str(o) {
            Ok(v) => Some(v),
            Err(_) => {
                tracing::warn!(origin = %o, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    base.allow_origin(AllowOrigin::list(origins))
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use axum::{body::Body, http::{Request, StatusCode}};
    use tower::ServiceExt;

    use super::*;
    use crate::config::GatewayConfig;
    use crate::llm::ScriptedClient;

    async fn boom() -> &'static str {
        panic!("handler bug");
    }

    #[tokio::test]
    async fn panicking_handler_is_answered_and_counted() {
        let state = AppState::with_client(GatewayConfig::default(), Arc::new(ScriptedClient::new()));
        let metrics = state.metrics();
        let app = with_layers(Router::new().route("/boom", get(boom)), &state).with_state(state);

        let resp = app
            .oneshot(Request::builder().uri("/boom").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(resp.status(), StatusCode::INTERNAL_SERVER_ERROR);

        assert_eq!(
            metrics.http_requests.get(&[("method", "GET"), ("endpoint", "/boom"), ("status", "500")]),
            1
        );
        assert_eq!(
            metrics.http_request_duration.count(&[("method", "GET"), ("endpoint", "/boom")]),
            1
        );
        assert_eq!(metrics.errors.get(&[("error_type", "InternalError")]), 1);
        assert_eq!(metrics.in_flight(), 0);
    }
}
