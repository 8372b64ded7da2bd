use axum::body::Body;
use axum::extract::State;
use axum::http::Request;
use axum::middleware::Next;
use axum::response::{IntoResponse, Response};

use crate::dto::error::ErrorResponseRestDTO;
use crate::dto::response::ErrorResponse;
use crate::router::{AppState, MAX_REQUEST_BODY_SIZE};

/// Hex encoded HMAC-SHA256 of the raw request body
pub const AUTHENTICATION_TAG_HEADER: &str = "x-triphase-signature";

pub struct HttpRequestContext<'a> {
    pub path: &'a str,
    pub method: &'a str,
    pub request_id: Option<&'a str>,
}

pub fn get_http_request_context<T>(request: &Request<T>) -> HttpRequestContext<'_> {
    let request_id = request
        .headers()
        .get("x-request-id")
        .and_then(|header| header.to_str().ok())
        .filter(|value| !value.is_empty());

    HttpRequestContext {
        path: request.uri().path(),
        method: request.method().as_str(),
        request_id,
    }
}

/// Rejects requests whose body does not match the authentication tag.
///
/// The body has to be buffered to be authenticated, it is handed on to the
/// endpoint unchanged.
pub(crate) async fn authenticate(
    State(state): State<AppState>,
    request: Request<Body>,
    next: Next,
) -> Response {
    let (parts, body) = request.into_parts();

    let payload = match axum::body::to_bytes(body, MAX_REQUEST_BODY_SIZE).await {
        Ok(payload) => payload,
        Err(error) => {
            tracing::warn!(%error, "Could not read request body");
            return ErrorResponse::BadRequest(ErrorResponseRestDTO::invalid_input(
                error.to_string(),
            ))
            .into_response();
        }
    };

    let tag = parts
        .headers
        .get(AUTHENTICATION_TAG_HEADER)
        .and_then(|header| header.to_str().ok());

    if let Err(error) = state.core.authenticator.authenticate(&payload, tag) {
        tracing::warn!(%error, "Rejected unauthenticated request to {}", parts.uri.path());
        let response = ErrorResponseRestDTO::from_error(&error)
            .hide_cause(state.config.hide_error_response_cause);
        return ErrorResponse::Unauthorized(response).into_response();
    }

    next.run(Request::from_parts(parts, Body::from(payload))).await
}
