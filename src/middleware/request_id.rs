use axum::extract::Request;
use axum::middleware::Next;
use axum::response::Response;

use crate::correlation::{new_correlation_id, CORRELATION_ID_HEADER};

/// Reads `X-Correlation-Id` off the inbound request, or mints a fresh one,
/// and stamps it back onto both the request extensions (so handlers and
/// the outbox/task-enqueue paths can thread it through) and the response
/// headers (so the caller can correlate logs on their side too).
pub async fn inject_request_id(mut request: Request, next: Next) -> Response {
    let correlation_id = request
        .headers()
        .get(&CORRELATION_ID_HEADER)
        .and_then(|value| value.to_str().ok())
        .filter(|value| !value.is_empty())
        .map(str::to_string)
        .unwrap_or_else(new_correlation_id);

    request.extensions_mut().insert(CorrelationId(correlation_id.clone()));

    let span = tracing::info_span!("request", correlation_id = %correlation_id);
    let _guard = span.enter();

    let mut response = next.run(request).await;
    if let Ok(header_value) = correlation_id.parse() {
        response.headers_mut().insert(CORRELATION_ID_HEADER.clone(), header_value);
    }
    response
}

/// Request-extension wrapper so handlers can pull the resolved
/// correlation id out via `Extension<CorrelationId>` without re-parsing
/// the header.
#[derive(Debug, Clone)]
pub struct CorrelationId(pub String);
