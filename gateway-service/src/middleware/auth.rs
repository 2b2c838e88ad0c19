use axum::{
    extract::{ConnectInfo, FromRequestParts, Request, State},
    http::{header, request::Parts},
    middleware::Next,
    response::Response,
};
use std::net::SocketAddr;

use service_core::error::AppError;

use crate::services::jwt::GatewayClaims;
use crate::services::permissions::{self, normalize_path};
use crate::AppState;

/// Header carrying the caller-declared employee id, re-checked against the
/// credential's subject on every request.
pub const EMPLOYEE_ID_HEADER: &str = "x-employee-id";

/// Paths served without a credential.
const UNAUTHENTICATED_PATHS: [&str; 3] = ["/auth/login", "/auth/logout", "/health"];

/// Per-request gate: extract the bearer credential, re-check the binding
/// context captured at login (IP, user agent, declared subject), then
/// evaluate the credential's permission rules against the request. Rejections
/// set the response status and stop the request; nothing else is mutated.
pub async fn auth_middleware(
    State(state): State<AppState>,
    mut req: Request,
    next: Next,
) -> Result<Response, AppError> {
    let path = normalize_path(req.uri().path());

    if UNAUTHENTICATED_PATHS.contains(&path.as_str()) {
        return Ok(next.run(req).await);
    }

    let token = req
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|value| value.to_str().ok())
        .and_then(|value| value.strip_prefix("Bearer "))
        .ok_or_else(|| {
            AppError::Unauthorized(anyhow::anyhow!("missing or malformed Authorization header"))
        })?;

    let claims = state.jwt.parse(token).map_err(AppError::Unauthorized)?;

    let remote_ip = req
        .extensions()
        .get::<ConnectInfo<SocketAddr>>()
        .map(|ConnectInfo(addr)| addr.ip().to_string())
        .unwrap_or_else(|| "unknown".to_string());
    let user_agent = header_value(&req, header::USER_AGENT.as_str());
    let employee_id = header_value(&req, EMPLOYEE_ID_HEADER);

    if remote_ip != claims.ip_address {
        tracing::info!(
            remote_ip = %remote_ip,
            bound_ip = %claims.ip_address,
            "Credential presented from a different address"
        );
        return Err(AppError::Unauthorized(anyhow::anyhow!(
            "request address does not match credential"
        )));
    }
    if user_agent != claims.user_agent {
        tracing::info!(sub = %claims.sub, "Credential presented with a different user agent");
        return Err(AppError::Unauthorized(anyhow::anyhow!(
            "user agent does not match credential"
        )));
    }
    if employee_id != claims.sub {
        tracing::info!(
            declared = %employee_id,
            sub = %claims.sub,
            "Declared employee id does not match credential subject"
        );
        return Err(AppError::Unauthorized(anyhow::anyhow!(
            "declared identity does not match credential"
        )));
    }

    let method = req.method().as_str().to_string();
    if !permissions::has_permission(&method, &path, &claims.permissions) {
        return Err(AppError::Forbidden(anyhow::anyhow!(
            "no permission rule allows {} {}",
            method,
            path
        )));
    }

    // Hand the verified claims to downstream handlers.
    req.extensions_mut().insert(claims);

    Ok(next.run(req).await)
}

fn header_value(req: &Request, name: &str) -> String {
    req.headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string()
}

/// Extractor for handlers running behind the authentication filter.
pub struct AuthenticatedEmployee(pub GatewayClaims);

#[axum::async_trait]
impl<S> FromRequestParts<S> for AuthenticatedEmployee
where
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        let claims = parts.extensions.get::<GatewayClaims>().ok_or_else(|| {
            AppError::InternalError(anyhow::anyhow!(
                "auth claims missing from request extensions"
            ))
        })?;

        Ok(AuthenticatedEmployee(claims.clone()))
    }
}
