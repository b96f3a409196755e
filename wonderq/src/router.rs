//! HTTP router for WonderQ

use axum::{
    extract::State,
    http::{header, StatusCode},
    response::IntoResponse,
    routing::get,
    Router,
};
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use wonderq_queue::QueueStore;

/// Create the main application router
pub fn create_router(store: Arc<QueueStore>) -> Router {
    Router::new()
        .route("/", get(handle_root))
        .route("/health", get(health_check))
        .route("/stats", get(handle_stats))
        .merge(wonderq_queue::routes())
        .layer(TraceLayer::new_for_http())
        .with_state(store)
}

async fn handle_root() -> &'static str {
    "Hello Welcome to WonderQ!"
}

async fn health_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        r#"{"status":"running"}"#,
    )
}

async fn handle_stats(State(store): State<Arc<QueueStore>>) -> impl IntoResponse {
    let body = serde_json::to_string(&store.stats()).unwrap_or_else(|_| "{}".to_string());
    (
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/json")],
        body,
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request};
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    async fn get_body(router: Router, uri: &str) -> (StatusCode, String) {
        let response = router
            .oneshot(Request::builder().uri(uri).body(Body::empty()).unwrap())
            .await
            .unwrap();
        let status = response.status();
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        (status, String::from_utf8(bytes.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_root_greeting() {
        let router = create_router(Arc::new(QueueStore::default()));
        let (status, body) = get_body(router, "/").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(body, "Hello Welcome to WonderQ!");
    }

    #[tokio::test]
    async fn test_health() {
        let router = create_router(Arc::new(QueueStore::default()));
        let (status, body) = get_body(router, "/health").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(
            serde_json::from_str::<Value>(&body).unwrap(),
            json!({"status": "running"})
        );
    }

    #[tokio::test]
    async fn test_stats_reflect_stored_state() {
        let store = Arc::new(QueueStore::default());
        store.enqueue("a").unwrap();
        store.enqueue("b").unwrap();
        store.lease_next().unwrap();

        let (_, body) = get_body(create_router(store), "/stats").await;
        assert_eq!(
            serde_json::from_str::<Value>(&body).unwrap(),
            json!({"total": 2, "available": 1, "leased": 1, "expired": 0})
        );
    }

    #[tokio::test]
    async fn test_queue_routes_are_mounted() {
        let router = create_router(Arc::new(QueueStore::default()));
        let (status, body) = get_body(router, "/new-message").await;
        assert_eq!(status, StatusCode::OK);
        assert_eq!(serde_json::from_str::<Value>(&body).unwrap(), json!({"error": 1}));
    }
}
