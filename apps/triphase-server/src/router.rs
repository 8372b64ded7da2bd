use std::any::Any;
use std::net::TcpListener;
use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::body::Body;
use axum::extract::DefaultBodyLimit;
use axum::http::header::ACCESS_CONTROL_ALLOW_ORIGIN;
use axum::http::{HeaderValue, Request, Response};
use axum::middleware;
use axum::response::IntoResponse;
use axum::routing::{get, post};
use tokio::time::MissedTickBehavior;
use tower_http::catch_panic::CatchPanicLayer;
use tower_http::set_header::SetResponseHeaderLayer;
use tower_http::trace::TraceLayer;
use tracing::{Span, info, info_span};
use triphase_core::TriphaseCore;
use utoipa::OpenApi;

use crate::ServerConfig;
use crate::dto::response::ErrorResponse;
use crate::endpoint::{self, misc, triphase};
use crate::middleware::get_http_request_context;

/// Inline documents travel base64url encoded inside the JSON body
pub(crate) const MAX_REQUEST_BODY_SIZE: usize = 64 * 1024 * 1024;

pub(crate) struct InternalAppState {
    pub core: TriphaseCore,
    pub config: Arc<ServerConfig>,
}

pub(crate) type AppState = Arc<InternalAppState>;

pub async fn start_server(
    listener: TcpListener,
    core: TriphaseCore,
    config: ServerConfig,
) -> std::io::Result<()> {
    listener.set_nonblocking(true)?;

    let state: AppState = Arc::new(InternalAppState {
        core,
        config: Arc::new(config),
    });

    spawn_session_purge(state.clone());

    let addr = listener.local_addr()?;
    info!("Starting server at http://{addr}");

    axum::serve(
        tokio::net::TcpListener::from_std(listener)?,
        router(state).into_make_service(),
    )
    .await
}

fn router(state: AppState) -> Router {
    let openapi_documentation = gen_openapi_documentation();

    let protected = Router::new()
        .route(
            "/api/triphase/v1/pre-sign",
            post(triphase::controller::pre_sign),
        )
        .route(
            "/api/triphase/v1/post-sign",
            post(triphase::controller::post_sign),
        )
        .layer(middleware::from_fn_with_state(
            state.clone(),
            crate::middleware::authenticate,
        ))
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_SIZE));

    let unprotected = Router::new()
        .route("/health", get(misc::health_check))
        .route(
            "/api-docs/openapi.json",
            get(misc::get_openapi_json(openapi_documentation)),
        );

    Router::new()
        .merge(protected)
        .merge(unprotected)
        .layer(CatchPanicLayer::custom(handle_panic))
        .layer(
            TraceLayer::new_for_http()
                .make_span_with(|request: &Request<_>| {
                    let context = get_http_request_context(request);
                    info_span!(
                        "http_request",
                        method = context.method,
                        path = context.path,
                        service = "triphase-server",
                        RequestId = context.request_id,
                    )
                })
                .on_request(|request: &Request<_>, _span: &Span| {
                    tracing::debug!(
                        "SERVICE CALL START {} {}",
                        request.method(),
                        request.uri().path()
                    )
                })
                .on_failure(|_, _, _: &_| {}) // override default on_failure handler
                .on_response(|response: &Response<_>, _: Duration, _span: &Span| {
                    tracing::debug!("SERVICE CALL END {}", response.status())
                }),
        )
        .layer(SetResponseHeaderLayer::overriding(
            ACCESS_CONTROL_ALLOW_ORIGIN,
            allow_origin(state.core.config.allow_origin()),
        ))
        .with_state(state)
}

fn allow_origin(configured: &str) -> HeaderValue {
    HeaderValue::from_str(configured).unwrap_or_else(|_| {
        tracing::warn!("Invalid Access-Control-Allow-Origin `{configured}`, using `*`");
        HeaderValue::from_static("*")
    })
}

fn spawn_session_purge(state: AppState) {
    let period = state.config.session_purge_interval;
    if period.is_zero() {
        return;
    }

    tokio::spawn(async move {
        let mut interval = tokio::time::interval(period);
        interval.set_missed_tick_behavior(MissedTickBehavior::Delay);
        loop {
            interval.tick().await;
            if let Err(error) = state.core.triphase_service.delete_expired_sessions().await {
                tracing::warn!(%error, "Failed to purge expired sessions");
            }
        }
    });
}

fn gen_openapi_documentation() -> utoipa::openapi::OpenApi {
    #[derive(OpenApi)]
    #[openapi(
        paths(
            endpoint::triphase::controller::pre_sign,
            endpoint::triphase::controller::post_sign,

            endpoint::misc::health_check,
        ),
        components(
            schemas(
                endpoint::triphase::dto::PreSignRequestRestDTO,
                endpoint::triphase::dto::PreSignDocumentRestDTO,
                endpoint::triphase::dto::JobSettingsRestDTO,
                endpoint::triphase::dto::SignatureModeRestEnum,
                endpoint::triphase::dto::PreSignResponseRestDTO,
                endpoint::triphase::dto::PreSignResultRestDTO,
                endpoint::triphase::dto::PreSignArtifactRestDTO,
                endpoint::triphase::dto::PostSignRequestRestDTO,
                endpoint::triphase::dto::PostSignDocumentRestDTO,
                endpoint::triphase::dto::PostSignResponseRestDTO,
                endpoint::triphase::dto::PostSignResultRestDTO,
                endpoint::triphase::dto::SignedDocumentRestDTO,
                endpoint::triphase::dto::JobStatusRestEnum,
                endpoint::triphase::dto::JobErrorRestDTO,

                crate::dto::error::ErrorCode,
                crate::dto::error::ErrorResponseRestDTO,
                crate::dto::error::Cause,
            )
        ),
        tags(
            (name = "triphase", description = "Triphase remote signature"),
            (name = "other", description = "Other utility endpoints"),
        ),
    )]
    struct ApiDoc;

    ApiDoc::openapi()
}

fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response<Body> {
    let message = if let Some(s) = err.downcast_ref::<String>() {
        s.clone()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s.to_string()
    } else {
        "Unknown panic message".to_string()
    };

    tracing::error!("PANIC occurred in request: {message}");

    ErrorResponse::for_panic(message).into_response()
}
