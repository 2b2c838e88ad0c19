use axum::{
    body::Body,
    extract::{Request, State},
    http::header::{self, HeaderName},
    response::Response,
};

use service_core::error::AppError;

use crate::AppState;

/// Hop-by-hop headers, never relayed from the backend response.
const HOP_BY_HOP_HEADERS: [HeaderName; 4] = [
    header::CONNECTION,
    header::TRANSFER_ENCODING,
    header::TE,
    header::UPGRADE,
];

/// Proxy fallback: every verb on every path not handled by the gateway
/// itself. Resolves the backend from the dispatch table, reissues the
/// request with body streamed through, and relays status and body back
/// untouched. Runs behind the authentication filter.
pub async fn proxy(State(state): State<AppState>, req: Request) -> Result<Response, AppError> {
    let path = req.uri().path().to_string();

    let Some(base_url) = state.dispatch.resolve(&path) else {
        tracing::info!(path = %path, "No backend configured for path");
        return Err(AppError::BadRequest(anyhow::anyhow!(
            "no backend configured for path {}",
            path
        )));
    };

    let mut url = format!("{}{}", base_url, path);
    if let Some(query) = req.uri().query() {
        url.push('?');
        url.push_str(query);
    }

    let method = req.method().clone();
    let content_type = req.headers().get(header::CONTENT_TYPE).cloned();

    tracing::debug!(method = %method, url = %url, "Forwarding request upstream");

    // Stream the request body through without buffering it.
    let body_stream = req.into_body().into_data_stream();
    let mut upstream_request = state
        .http
        .request(method, &url)
        .body(reqwest::Body::wrap_stream(body_stream));
    if let Some(content_type) = content_type {
        upstream_request = upstream_request.header(header::CONTENT_TYPE, content_type);
    }

    let upstream_response = upstream_request
        .send()
        .await
        .map_err(|e| AppError::BadGateway(format!("{}: {}", url, e)))?;

    let status = upstream_response.status();
    let headers = upstream_response.headers().clone();

    let mut response = Response::builder()
        .status(status)
        .body(Body::from_stream(upstream_response.bytes_stream()))
        .map_err(|e| AppError::InternalError(anyhow::anyhow!("Failed to relay response: {}", e)))?;

    for (name, value) in headers.iter() {
        if !HOP_BY_HOP_HEADERS.contains(name) {
            response.headers_mut().insert(name.clone(), value.clone());
        }
    }

    Ok(response)
}
