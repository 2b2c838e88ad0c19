use axum::{
    extract::{Path, State},
    http::header,
    response::{IntoResponse, Response},
};

use service_core::error::AppError;

use crate::middleware::AuthenticatedEmployee;
use crate::services::{qr, totp};
use crate::AppState;

/// Second-factor enrollment: generate a fresh secret for the employee, store
/// it on their record at the identity service, and answer with a QR-encoded
/// provisioning URI.
///
/// The caller may only enroll their own record: the authenticated subject
/// must match the employee resolved from the path.
///
/// GET /2fa/generate-qr/{identification_type}/{identification_number}
pub async fn generate_qr(
    State(state): State<AppState>,
    Path((identification_type, identification_number)): Path<(String, String)>,
    AuthenticatedEmployee(claims): AuthenticatedEmployee,
) -> Result<Response, AppError> {
    let employee = state
        .employees
        .get_by_identification(&identification_type, &identification_number)
        .await?;

    if employee.id.to_string() != claims.sub {
        tracing::warn!(
            employee_id = %employee.id,
            caller = %claims.sub,
            "Second-factor enrollment attempted for another employee"
        );
        return Err(AppError::Unauthorized(anyhow::anyhow!(
            "enrollment subject does not match caller"
        )));
    }

    let new_secret = totp::generate_secret();

    if !state.employees.patch_secret(employee.id, &new_secret).await {
        return Err(AppError::Unauthorized(anyhow::anyhow!(
            "could not store second-factor secret"
        )));
    }

    let account = format!("{}@{}", identification_type, identification_number);
    let provisioning_url =
        totp::otpauth_url(&account, &new_secret, &state.config.two_factor.issuer);
    let png = qr::render_png(&provisioning_url)?;

    tracing::info!(employee_id = %employee.id, "Second-factor enrollment QR issued");

    Ok(([(header::CONTENT_TYPE, "image/png")], png).into_response())
}
