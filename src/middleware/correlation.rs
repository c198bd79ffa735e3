use axum::{extract::Request, http::HeaderValue, middleware::Next, response::Response};
use uuid::Uuid;

const HEADER: &str = "x-request-id";

/// Tags every request with a correlation id, reusing the caller's id when it
/// sends one, and echoes it back in the response.
pub async fn correlacionar_peticion(request: Request, next: Next) -> Response {
    let id = request
        .headers()
        .get(HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .unwrap_or_else(|| Uuid::new_v4().to_string());

    tracing::debug!(request_id = %id, method = %request.method(), uri = %request.uri());

    let mut response = next.run(request).await;
    if let Ok(valor) = HeaderValue::from_str(&id) {
        response.headers_mut().insert(HEADER, valor);
    }
    response
}
