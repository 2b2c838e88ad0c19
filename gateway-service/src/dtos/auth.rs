use serde::{Deserialize, Serialize};

use crate::services::permissions::PermissionRule;

/// Login request body. `twoFA` is only present once the employee has an
/// enrolled second factor.
#[derive(Debug, Clone, Deserialize)]
pub struct LoginRequest {
    pub identification_type: String,
    pub identification_number: String,
    pub password: String,
    #[serde(rename = "twoFA", default)]
    pub two_fa: Option<String>,
}

/// Successful login with a fully scoped credential.
#[derive(Debug, Serialize)]
pub struct LoginResponse {
    pub token: String,
    pub username: String,
    #[serde(rename = "employeeId")]
    pub employee_id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub rol: Option<String>,
    pub permissions: Vec<PermissionRule>,
}

/// Login answered with an enrollment redirect: credentials were valid but no
/// second factor exists yet, so the credential carries no permissions and the
/// client is pointed at the QR endpoint.
#[derive(Debug, Serialize)]
pub struct EnrollmentRedirect {
    pub redirect_url: String,
    pub token: String,
    #[serde(rename = "employeeId")]
    pub employee_id: String,
}

/// Employee record as returned by the identity service.
#[derive(Debug, Clone, Deserialize)]
pub struct EmployeeAuth {
    pub id: i64,
    pub names: String,
    pub lastnames: String,
    #[serde(default)]
    pub identification_type: Option<String>,
    #[serde(default)]
    pub identification_number: Option<String>,
    #[serde(default)]
    pub rol_id: Option<i64>,
    #[serde(default)]
    pub rol_name: Option<String>,
    #[serde(default)]
    pub permissions: Vec<PermissionRule>,
    /// Enrolled second-factor secret, absent until enrollment completes.
    #[serde(default)]
    pub secret: Option<String>,
}
