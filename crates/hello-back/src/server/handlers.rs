//! Axum request handlers.

use std::collections::HashMap;

use axum::{
    extract::{rejection::FormRejection, Form, State},
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use common::protocol::{HelloResponse, SlackRequest};
use tracing::{debug, warn};

use super::state::AppState;

/// `POST /hello` — answer a Slack outgoing-webhook notification.
///
/// The form body must carry all ten notification fields. Anything missing or
/// malformed, including a body that cannot be decoded as a form at all,
/// yields an empty `400 Bad Request`; the failure detail is logged, never
/// returned to the caller.
pub async fn hello(
    State(state): State<AppState>,
    form: Result<Form<HashMap<String, String>>, FormRejection>,
) -> Response {
    let Form(fields) = match form {
        Ok(form) => form,
        Err(e) => {
            warn!(error = %e, "unable to decode form body");
            return StatusCode::BAD_REQUEST.into_response();
        }
    };

    match SlackRequest::from_fields(&fields) {
        Ok(request) => {
            debug!(?request, "handling hello request");
            let body = HelloResponse::greet(&state.greeting, &request);
            (StatusCode::OK, Json(body)).into_response()
        }
        Err(e) => {
            warn!(error = %e, "unable to parse request");
            StatusCode::BAD_REQUEST.into_response()
        }
    }
}

/// Catch-all 404 handler.
pub async fn not_found() -> StatusCode {
    StatusCode::NOT_FOUND
}
