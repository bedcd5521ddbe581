//! Axum router construction.

use std::time::Duration;

use axum::{routing::post, Router};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};

use super::{handlers, state::AppState};

/// Per-request timeout applied to all routes.
const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// Build the application [`Router`] with all routes and middleware attached.
pub fn build(state: AppState) -> Router {
    Router::new()
        .route("/hello", post(handlers::hello))
        .fallback(handlers::not_found)
        .layer(TraceLayer::new_for_http())
        .layer(TimeoutLayer::new(REQUEST_TIMEOUT))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::Request};
    use tower::ServiceExt;

    #[tokio::test]
    async fn unknown_route_returns_404() {
        let app = build(AppState::new("Hey"));
        let req = Request::builder()
            .uri("/unknown")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        assert_eq!(resp.status(), 404);
    }

    #[tokio::test]
    async fn hello_route_exists() {
        let app = build(AppState::new("Hey"));
        let req = Request::builder()
            .method("POST")
            .uri("/hello")
            .body(Body::empty())
            .unwrap();
        let resp = app.oneshot(req).await.unwrap();
        // 400 because the empty body carries none of the mandatory fields.
        assert_eq!(resp.status(), 400);
    }
}
