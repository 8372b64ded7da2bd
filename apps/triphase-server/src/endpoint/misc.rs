use std::future;

use axum::Json;
use axum::handler::Handler;
use axum::http::StatusCode;
use axum::response::IntoResponse;

#[utoipa::path(
    get,
    path = "/health",
    responses(
        (status = 204, description = "No content")
    ),
    tag = "other",
    summary = "Health check",
    description = "Returns a `204` response when the service is up.",
)]
pub(crate) async fn health_check() -> impl IntoResponse {
    StatusCode::NO_CONTENT
}

pub(crate) fn get_openapi_json<S>(openapi: utoipa::openapi::OpenApi) -> impl Handler<((),), S> {
    move || future::ready(Json(openapi.clone()).into_response())
}
