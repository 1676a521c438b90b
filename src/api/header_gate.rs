//! Request-header gate. Routes behind it answer 404 unless the request
//! carries the expected header value, which is how API versions are selected.

use axum::extract::{Request, State};
use axum::http::{HeaderMap, HeaderName};
use axum::middleware::Next;
use axum::response::Response;
use thiserror::Error;

use crate::api::errors::ApiError;

pub(crate) const VERSION_HEADER: &str = "x-version";

#[derive(Debug, Error, PartialEq, Eq)]
pub(crate) enum HeaderRejection {
    #[error("header '{0}' is missing")]
    Missing(HeaderName),
    #[error("header '{name}' does not match")]
    Mismatch { name: HeaderName },
}

impl From<HeaderRejection> for ApiError {
    fn from(_: HeaderRejection) -> Self {
        ApiError::NotFound("Not Found".to_string())
    }
}

pub(crate) fn check_header(
    headers: &HeaderMap,
    name: &HeaderName,
    expected: &str,
) -> Result<(), HeaderRejection> {
    let value = headers.get(name).ok_or_else(|| HeaderRejection::Missing(name.clone()))?;

    if value.as_bytes() == expected.as_bytes() {
        Ok(())
    } else {
        Err(HeaderRejection::Mismatch { name: name.clone() })
    }
}

#[derive(Debug, Clone)]
pub(crate) struct HeaderGate {
    name: HeaderName,
    expected: &'static str,
}

impl HeaderGate {
    pub(crate) fn new(name: HeaderName, expected: &'static str) -> Self {
        Self { name, expected }
    }

    pub(crate) fn version(expected: &'static str) -> Self {
        Self::new(HeaderName::from_static(VERSION_HEADER), expected)
    }
}

pub(crate) async fn require_header(
    State(gate): State<HeaderGate>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    if let Err(rejection) = check_header(request.headers(), &gate.name, gate.expected) {
        tracing::debug!(reason = %rejection, path = %request.uri().path(), "Header gate rejected request");
        return Err(rejection.into());
    }

    Ok(next.run(request).await)
}

#[cfg(test)]
mod tests {
    use axum::body::Body;
    use axum::http::{self, HeaderValue, StatusCode};
    use axum::routing::get;
    use axum::{middleware, Router};
    use tower::ServiceExt;

    use super::*;

    fn version_header() -> HeaderName {
        HeaderName::from_static(VERSION_HEADER)
    }

    #[test]
    fn absent_header_is_rejected() {
        let result = check_header(&HeaderMap::new(), &version_header(), "1");
        assert_eq!(result, Err(HeaderRejection::Missing(version_header())));
    }

    #[test]
    fn matching_header_is_allowed() {
        let mut headers = HeaderMap::new();
        headers.insert(VERSION_HEADER, HeaderValue::from_static("1"));
        assert_eq!(check_header(&headers, &version_header(), "1"), Ok(()));
    }

    #[test]
    fn other_version_is_rejected() {
        let mut headers = HeaderMap::new();
        headers.insert(VERSION_HEADER, HeaderValue::from_static("2"));
        assert_eq!(
            check_header(&headers, &version_header(), "1"),
            Err(HeaderRejection::Mismatch { name: version_header() })
        );
    }

    fn gated() -> Router {
        Router::new()
            .route("/", get(|| async { "ok" }))
            .route_layer(middleware::from_fn_with_state(HeaderGate::version("1"), require_header))
    }

    #[tokio::test]
    async fn middleware_hides_routes_without_version() {
        let response =
            gated().oneshot(http::Request::builder().uri("/").body(Body::empty()).unwrap()).await.unwrap();

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn middleware_passes_matching_version() {
        let request =
            http::Request::builder().uri("/").header("x-version", "1").body(Body::empty()).unwrap();

        let response = gated().oneshot(request).await.unwrap();

        assert_eq!(response.status(), StatusCode::OK);
    }
}
