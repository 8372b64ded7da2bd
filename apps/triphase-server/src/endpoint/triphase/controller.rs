use axum::Json;
use axum::extract::State;
use axum_extra::extract::WithRejection;
use triphase_core::service::triphase::dto::{PostSignRequestDTO, PreSignRequestDTO};

use super::dto::{
    PostSignRequestRestDTO, PostSignResponseRestDTO, PreSignRequestRestDTO,
    PreSignResponseRestDTO,
};
use crate::dto::error::ErrorResponseRestDTO;
use crate::dto::response::OkOrErrorResponse;
use crate::router::AppState;

#[utoipa::path(
    post,
    path = "/api/triphase/v1/pre-sign",
    request_body = PreSignRequestRestDTO,
    responses(OkOrErrorResponse<PreSignResponseRestDTO>),
    params(
        ("X-Triphase-Signature" = Option<String>, Header, description = "Hex encoded HMAC-SHA256 of the request body")
    ),
    tag = "triphase",
    summary = "Prepare documents for signing",
    description = indoc::formatdoc! {"
    Resolves every document and returns the bytes the client has to sign,
    together with the session the signatures must be posted back to.

    Each document reports its own outcome, a failing document does not
    abort the others.
"},
)]
pub(crate) async fn pre_sign(
    state: State<AppState>,
    WithRejection(Json(request), _): WithRejection<
        Json<PreSignRequestRestDTO>,
        ErrorResponseRestDTO,
    >,
) -> OkOrErrorResponse<PreSignResponseRestDTO> {
    let request = match PreSignRequestDTO::try_from(request) {
        Ok(request) => request,
        Err(error) => return OkOrErrorResponse::bad_request(error),
    };

    let result = state.core.triphase_service.pre_sign(request).await;
    OkOrErrorResponse::from_result(result, state, "preparing documents for signing")
}

#[utoipa::path(
    post,
    path = "/api/triphase/v1/post-sign",
    request_body = PostSignRequestRestDTO,
    responses(OkOrErrorResponse<PostSignResponseRestDTO>),
    params(
        ("X-Triphase-Signature" = Option<String>, Header, description = "Hex encoded HMAC-SHA256 of the request body")
    ),
    tag = "triphase",
    summary = "Complete signed documents",
    description = indoc::formatdoc! {"
    Embeds the client signatures into their containers, validates the
    result and delivers the signed documents.

    Repeating a request for an already completed document returns the
    same signed document.
"},
)]
pub(crate) async fn post_sign(
    state: State<AppState>,
    WithRejection(Json(request), _): WithRejection<
        Json<PostSignRequestRestDTO>,
        ErrorResponseRestDTO,
    >,
) -> OkOrErrorResponse<PostSignResponseRestDTO> {
    let request = match PostSignRequestDTO::try_from(request) {
        Ok(request) => request,
        Err(error) => return OkOrErrorResponse::bad_request(error),
    };

    let result = state.core.triphase_service.post_sign(request).await;
    OkOrErrorResponse::from_result(result, state, "completing signed documents")
}
