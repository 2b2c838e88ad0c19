use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};

use crate::config::JwtConfig;
use crate::services::permissions::PermissionRule;

/// Issues and verifies the signed credential carried on every request.
///
/// Signing is symmetric (HS256); the same process-wide secret is used for
/// issuance and verification and is never rotated at runtime.
#[derive(Clone)]
pub struct JwtService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    expiry_minutes: i64,
}

/// Fixed claim set. Nothing is read off a token before `parse` verifies the
/// signature and expiry.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct GatewayClaims {
    /// Employee id the credential was issued to.
    pub sub: String,
    pub username: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub rol: Option<String>,
    /// Remote address captured at login; re-checked on every request.
    pub ip_address: String,
    /// User agent captured at login; re-checked on every request.
    pub user_agent: String,
    #[serde(default)]
    pub permissions: Vec<PermissionRule>,
    /// Expiration time (Unix timestamp)
    pub exp: i64,
    /// Issued at (Unix timestamp)
    pub iat: i64,
}

impl JwtService {
    pub fn new(config: &JwtConfig) -> Self {
        Self {
            encoding_key: EncodingKey::from_secret(config.secret.as_bytes()),
            decoding_key: DecodingKey::from_secret(config.secret.as_bytes()),
            expiry_minutes: config.expiry_minutes,
        }
    }

    /// Issue a credential bound to the given login context.
    pub fn issue(
        &self,
        subject: &str,
        username: &str,
        rol: Option<&str>,
        ip_address: &str,
        user_agent: &str,
        permissions: Vec<PermissionRule>,
    ) -> Result<String, anyhow::Error> {
        let now = Utc::now();
        let exp = now + Duration::minutes(self.expiry_minutes);

        let claims = GatewayClaims {
            sub: subject.to_string(),
            username: username.to_string(),
            rol: rol.map(|r| r.to_string()),
            ip_address: ip_address.to_string(),
            user_agent: user_agent.to_string(),
            permissions,
            exp: exp.timestamp(),
            iat: now.timestamp(),
        };

        encode(&Header::new(Algorithm::HS256), &claims, &self.encoding_key)
            .map_err(|e| anyhow::anyhow!("Failed to encode token: {}", e))
    }

    /// Verify signature and expiry, returning the claims.
    ///
    /// Any verification failure (bad signature, expired, malformed
    /// structure) is an error; callers treat it as "no credential".
    pub fn parse(&self, token: &str) -> Result<GatewayClaims, anyhow::Error> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = true;
        validation.leeway = 0;

        let token_data = decode::<GatewayClaims>(token, &self.decoding_key, &validation)
            .map_err(|e| anyhow::anyhow!("Invalid token: {}", e))?;

        Ok(token_data.claims)
    }

    /// Credential lifetime in seconds (for client info).
    pub fn expiry_seconds(&self) -> i64 {
        self.expiry_minutes * 60
    }
}
