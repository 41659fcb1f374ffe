//! Cross-cutting request handling applied to every route.
//!
//! Order, outermost first: client ip resolution, request id assignment,
//! request logging, panic recovery, request timeout, body timeouts.
//! Failures are logged where they are handled, not again by the trace layer.

pub mod real_ip;

pub use real_ip::{real_ip, resolve_client_ip, ClientIp};

use crate::config::ServerConfig;
use crate::response::error_text;
use axum::{
    body::Body,
    error_handling::HandleErrorLayer,
    http::{Request, StatusCode},
    response::Response,
    BoxError, Router,
};
use std::any::Any;
use tower::{timeout::error::Elapsed, timeout::TimeoutLayer, ServiceBuilder};
use tower_http::{
    catch_panic::CatchPanicLayer,
    map_request_body::MapRequestBodyLayer,
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::{RequestBodyTimeoutLayer, ResponseBodyTimeoutLayer, TimeoutBody},
    trace::{DefaultOnResponse, TraceLayer},
};
use tracing::{Level, Span};

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Wrap every route of `router` in the standard middleware stack.
pub fn apply(router: Router, config: &ServerConfig) -> Router {
    router.layer(
        ServiceBuilder::new()
            .layer(axum::middleware::from_fn(real_ip))
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
            .layer(
                TraceLayer::new_for_http()
                    .make_span_with(request_span)
                    .on_response(DefaultOnResponse::new().level(Level::INFO))
                    .on_failure(()),
            )
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(CatchPanicLayer::custom(handle_panic))
            .layer(HandleErrorLayer::new(handle_timeout_error))
            .layer(TimeoutLayer::new(config.request_timeout))
            .layer(RequestBodyTimeoutLayer::new(config.read_timeout))
            .layer(MapRequestBodyLayer::new(Body::new::<TimeoutBody<Body>>))
            .layer(ResponseBodyTimeoutLayer::new(config.write_timeout)),
    )
}

fn request_span(req: &Request<Body>) -> Span {
    let request_id = req
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("-");
    let client_ip = req
        .extensions()
        .get::<ClientIp>()
        .map(|ClientIp(ip)| ip.to_string())
        .unwrap_or_else(|| "-".into());
    tracing::info_span!(
        "request",
        method = %req.method(),
        uri = %req.uri(),
        request_id = %request_id,
        client_ip = %client_ip,
    )
}

/// Turn a handler panic into a 500 so the connection and the process survive.
fn handle_panic(err: Box<dyn Any + Send + 'static>) -> Response {
    let detail = if let Some(s) = err.downcast_ref::<String>() {
        s.as_str()
    } else if let Some(s) = err.downcast_ref::<&str>() {
        s
    } else {
        "unknown panic payload"
    };
    tracing::error!(panic = %detail, "request handler panicked");
    error_text(StatusCode::INTERNAL_SERVER_ERROR, "internal server error")
}

/// The timed-out request future has already been dropped by the time this runs.
async fn handle_timeout_error(err: BoxError) -> Response {
    if err.is::<Elapsed>() {
        tracing::warn!("request timed out");
        error_text(StatusCode::GATEWAY_TIMEOUT, "request timed out")
    } else {
        tracing::error!(error = %err, "unhandled middleware error");
        error_text(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
    }
}
