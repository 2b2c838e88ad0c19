use axum::{
    extract::{ConnectInfo, State},
    http::{header, HeaderMap, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use std::net::SocketAddr;

use service_core::error::AppError;

use crate::dtos::auth::{EnrollmentRedirect, LoginRequest, LoginResponse};
use crate::services::totp;
use crate::AppState;

/// Login: authenticate against the identity service, then either issue a
/// full credential, demand a second-factor code, or redirect the employee to
/// second-factor enrollment.
///
/// POST /auth/login
pub async fn login(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    headers: HeaderMap,
    Json(request): Json<LoginRequest>,
) -> Result<Response, AppError> {
    tracing::info!(
        identification_type = %request.identification_type,
        identification_number = %request.identification_number,
        "Login request"
    );

    let employee = state.employees.authenticate(&request).await?;

    let ip_address = addr.ip().to_string();
    let user_agent = headers
        .get(header::USER_AGENT)
        .and_then(|value| value.to_str().ok())
        .unwrap_or_default()
        .to_string();
    let employee_id = employee.id.to_string();
    let username = format!("{} {}", employee.names, employee.lastnames);

    let secret = employee.secret.as_deref().filter(|s| !s.is_empty());

    let Some(secret) = secret else {
        // No second factor enrolled yet: hand out a credential that can only
        // reach the enrollment endpoints and tell the client where to go.
        let token = state.jwt.issue(
            &employee_id,
            &username,
            employee.rol_name.as_deref(),
            &ip_address,
            &user_agent,
            Vec::new(),
        )?;

        tracing::info!(
            employee_id = %employee_id,
            "Login accepted, second factor not enrolled; redirecting to enrollment"
        );

        let body = EnrollmentRedirect {
            redirect_url: format!(
                "/2fa/generate-qr/{}/{}",
                request.identification_type, request.identification_number
            ),
            token,
            employee_id,
        };
        return Ok((StatusCode::OK, Json(body)).into_response());
    };

    let submitted = request.two_fa.as_deref().unwrap_or_default();
    if submitted.is_empty() {
        return Err(AppError::AuthError(anyhow::anyhow!(
            "second-factor code required"
        )));
    }

    let code_matches = totp::validate(secret, submitted).map_err(|e| {
        tracing::error!(employee_id = %employee_id, error = %e, "Second-factor secret cannot be validated");
        AppError::AuthError(e)
    })?;
    if !code_matches {
        tracing::info!(employee_id = %employee_id, "Second-factor code rejected");
        return Err(AppError::AuthError(anyhow::anyhow!(
            "second-factor code invalid"
        )));
    }

    let token = state.jwt.issue(
        &employee_id,
        &username,
        employee.rol_name.as_deref(),
        &ip_address,
        &user_agent,
        employee.permissions.clone(),
    )?;

    tracing::info!(employee_id = %employee_id, "Login successful");

    let body = LoginResponse {
        token,
        username,
        employee_id,
        rol: employee.rol_name,
        permissions: employee.permissions,
    };
    Ok((StatusCode::OK, Json(body)).into_response())
}

/// Logout: tokens are stateless, so there is nothing to revoke server-side.
///
/// POST /auth/logout
pub async fn logout() -> impl IntoResponse {
    tracing::info!("Logout request");
    StatusCode::OK
}
