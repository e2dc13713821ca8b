//! Admin authentication configuration
//!
//! The payment subsystem only consumes the auth contract: an authenticated
//! admin identity with a role, carried in an HS256 bearer token minted by
//! the (separate) admin login flow.

use serde::Deserialize;

use super::error::ValidationError;

/// Admin authentication configuration
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AuthConfig {
    /// HS256 signing secret for admin tokens
    pub admin_jwt_secret: String,
}

impl AuthConfig {
    /// Validate authentication configuration
    pub fn validate(&self) -> Result<(), ValidationError> {
        if self.admin_jwt_secret.is_empty() {
            return Err(ValidationError::MissingRequired("ADMIN_JWT_SECRET"));
        }
        if self.admin_jwt_secret.len() < 32 {
            return Err(ValidationError::JwtSecretTooShort);
        }
        Ok(())
    }
}
