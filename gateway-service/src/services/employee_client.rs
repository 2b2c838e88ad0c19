use std::time::Duration;

use reqwest::Client;
use service_core::error::AppError;

use crate::dtos::auth::{EmployeeAuth, LoginRequest};

/// Client for the identity service owning employee records, credentials, and
/// second-factor secrets. The whole contract is three calls: authenticate,
/// fetch-by-identification, patch-secret.
#[derive(Clone)]
pub struct EmployeeClient {
    client: Client,
    base_url: String,
}

impl EmployeeClient {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, AppError> {
        let client = Client::builder().timeout(timeout).build().map_err(|e| {
            AppError::ConfigError(anyhow::anyhow!("Failed to build identity client: {}", e))
        })?;

        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    /// Validate credentials and fetch the employee's role and permission set.
    ///
    /// Rejection and unreachability both surface as authentication errors;
    /// the distinction is logged, not returned.
    pub async fn authenticate(&self, request: &LoginRequest) -> Result<EmployeeAuth, AppError> {
        let url = format!("{}/api/v1/employees/authenticate", self.base_url);
        let payload = serde_json::json!({
            "identification_type": request.identification_type,
            "identification_number": request.identification_number,
            "password": request.password,
        });

        let response = self
            .client
            .post(&url)
            .json(&payload)
            .send()
            .await
            .map_err(|e| {
                tracing::error!(error = %e, url = %url, "Identity service unreachable during authentication");
                AppError::AuthError(anyhow::anyhow!("identity service unreachable: {}", e))
            })?;

        if !response.status().is_success() {
            tracing::info!(
                status = %response.status(),
                identification_number = %request.identification_number,
                "Identity service rejected credentials"
            );
            return Err(AppError::AuthError(anyhow::anyhow!(
                "authentication rejected by identity service"
            )));
        }

        response.json::<EmployeeAuth>().await.map_err(|e| {
            tracing::error!(error = %e, "Malformed authentication response from identity service");
            AppError::AuthError(anyhow::anyhow!("malformed authentication response: {}", e))
        })
    }

    /// Fetch an employee record by identification type and number.
    pub async fn get_by_identification(
        &self,
        identification_type: &str,
        identification_number: &str,
    ) -> Result<EmployeeAuth, AppError> {
        let url = format!(
            "{}/api/v1/employees/by-identification/{}/{}",
            self.base_url, identification_type, identification_number
        );

        let response = self.client.get(&url).send().await.map_err(|e| {
            tracing::error!(error = %e, url = %url, "Identity service unreachable during employee lookup");
            AppError::AuthError(anyhow::anyhow!("identity service unreachable: {}", e))
        })?;

        if !response.status().is_success() {
            tracing::info!(
                status = %response.status(),
                identification_number = %identification_number,
                "Employee lookup failed"
            );
            return Err(AppError::AuthError(anyhow::anyhow!(
                "employee lookup rejected by identity service"
            )));
        }

        response.json::<EmployeeAuth>().await.map_err(|e| {
            tracing::error!(error = %e, "Malformed employee record from identity service");
            AppError::AuthError(anyhow::anyhow!("malformed employee record: {}", e))
        })
    }

    /// Store a freshly generated second-factor secret on the employee record.
    /// Returns whether the update was accepted; failures are absorbed and
    /// logged so the caller can reject the enrollment as a whole.
    pub async fn patch_secret(&self, employee_id: i64, secret: &str) -> bool {
        let url = format!("{}/api/v1/employees/{}", self.base_url, employee_id);
        let payload = serde_json::json!({ "secret": secret });

        match self.client.patch(&url).json(&payload).send().await {
            Ok(response) if response.status().is_success() => {
                tracing::info!(employee_id = %employee_id, "Second-factor secret updated");
                true
            }
            Ok(response) => {
                tracing::error!(
                    status = %response.status(),
                    employee_id = %employee_id,
                    "Identity service refused second-factor secret update"
                );
                false
            }
            Err(e) => {
                tracing::error!(
                    error = %e,
                    employee_id = %employee_id,
                    "Failed to update second-factor secret"
                );
                false
            }
        }
    }
}
