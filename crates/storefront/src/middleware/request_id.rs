//! Request ID middleware for log and Sentry correlation.
//!
//! An upstream `x-request-id` is kept; otherwise a UUID v4 is generated. The
//! ID is recorded on the current span, tagged on the Sentry scope and echoed
//! back in the response.

use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};
use tracing::Span;
use uuid::Uuid;

pub const REQUEST_ID_HEADER: &str = "x-request-id";

/// Longest upstream ID accepted; longer values are replaced.
const MAX_UPSTREAM_ID_LEN: usize = 128;

fn upstream_id(request: &Request) -> Option<String> {
    request
        .headers()
        .get(REQUEST_ID_HEADER)
        .and_then(|h| h.to_str().ok())
        .map(str::trim)
        .filter(|id| !id.is_empty() && id.len() <= MAX_UPSTREAM_ID_LEN)
        .map(String::from)
}

pub async fn request_id_middleware(request: Request, next: Next) -> Response {
    let request_id = upstream_id(&request).unwrap_or_else(|| Uuid::new_v4().to_string());

    Span::current().record("request_id", &request_id);
    sentry::configure_scope(|scope| {
        scope.set_tag("request_id", &request_id);
    });

    let mut response = next.run(request).await;
    if let Ok(value) = HeaderValue::from_str(&request_id) {
        response.headers_mut().insert(REQUEST_ID_HEADER, value);
    }
    response
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use axum::body::Body;

    use super::*;

    #[test]
    fn test_upstream_id_rules() {
        let keep = Request::builder()
            .header(REQUEST_ID_HEADER, " cf-123 ")
            .body(Body::empty())
            .unwrap();
        assert_eq!(upstream_id(&keep).as_deref(), Some("cf-123"));

        let huge = Request::builder()
            .header(REQUEST_ID_HEADER, "x".repeat(MAX_UPSTREAM_ID_LEN + 1))
            .body(Body::empty())
            .unwrap();
        assert!(upstream_id(&huge).is_none());

        let none = Request::builder().body(Body::empty()).unwrap();
        assert!(upstream_id(&none).is_none());
    }
}
