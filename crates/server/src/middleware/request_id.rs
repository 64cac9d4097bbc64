//! Per-request correlation IDs.
//!
//! An upstream `x-request-id` is trusted when it is short printable ASCII;
//! anything else is replaced with a fresh UUID v4. The ID ends up on the
//! `http_request` span, as a Sentry tag, in the request extensions as
//! [`RequestId`], and on the response.

use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};
use tracing::Span;
use uuid::Uuid;

/// The HTTP header name for request IDs.
pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Longest upstream request ID accepted as-is.
const MAX_UPSTREAM_ID_LENGTH: usize = 128;

/// The correlation ID of the current request.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RequestId(pub String);

impl RequestId {
    fn from_upstream(value: &HeaderValue) -> Option<Self> {
        let id = value.to_str().ok()?;
        let acceptable = !id.is_empty()
            && id.len() <= MAX_UPSTREAM_ID_LENGTH
            && id.bytes().all(|b| b.is_ascii_graphic());
        acceptable.then(|| Self(id.to_owned()))
    }

    fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }
}

/// Attach a [`RequestId`] to every request and echo it in the response.
pub async fn request_id_middleware(mut request: Request, next: Next) -> Response {
    let request_id = request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(RequestId::from_upstream)
        .unwrap_or_else(RequestId::generate);

    Span::current().record("request_id", request_id.0.as_str());
    sentry::configure_scope(|scope| scope.set_tag("request_id", &request_id.0));

    let header = HeaderValue::from_str(&request_id.0).ok();
    request.extensions_mut().insert(request_id);

    let mut response = next.run(request).await;
    if let Some(value) = header {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::{Extension, Router, body::Body, http::Request as HttpRequest, routing::get};
    use tower::ServiceExt;

    use super::*;

    fn app() -> Router {
        Router::new()
            .route(
                "/",
                get(|Extension(id): Extension<RequestId>| async move { id.0 }),
            )
            .layer(axum::middleware::from_fn(request_id_middleware))
    }

    async fn roundtrip(header: Option<&str>) -> (String, String) {
        let mut request = HttpRequest::get("/");
        if let Some(value) = header {
            request = request.header(REQUEST_ID_HEADER, value);
        }
        let response = app()
            .oneshot(request.body(Body::empty()).unwrap())
            .await
            .unwrap();
        let echoed = response.headers()[REQUEST_ID_HEADER]
            .to_str()
            .unwrap()
            .to_owned();
        let body = axum::body::to_bytes(response.into_body(), usize::MAX)
            .await
            .unwrap();
        (echoed, String::from_utf8(body.to_vec()).unwrap())
    }

    #[tokio::test]
    async fn test_upstream_id_is_kept() {
        let (echoed, seen) = roundtrip(Some("edge-42")).await;
        assert_eq!(echoed, "edge-42");
        assert_eq!(seen, "edge-42");
    }

    #[tokio::test]
    async fn test_missing_or_unusable_id_is_generated() {
        for header in [None, Some(""), Some("has space")] {
            let (echoed, seen) = roundtrip(header).await;
            assert_eq!(echoed, seen);
            assert!(Uuid::parse_str(&echoed).is_ok(), "{header:?}");
        }

        let too_long = "a".repeat(MAX_UPSTREAM_ID_LENGTH + 1);
        let (echoed, _) = roundtrip(Some(too_long.as_str())).await;
        assert_ne!(echoed, too_long);
    }
}
