use serde::Deserialize;

use crate::auth::error::AuthError;
use crate::auth::services::is_valid_email;

/// Request body for signup and signin.
#[derive(Debug, Deserialize)]
pub struct Credentials {
    pub email: String,
    pub password: String,
}

impl Credentials {
    /// Normalizes the email and rejects input the services should never see.
    pub fn validated(mut self) -> Result<Self, AuthError> {
        self.email = self.email.trim().to_lowercase();
        if !is_valid_email(&self.email) {
            return Err(AuthError::Validation("Invalid email".into()));
        }
        if self.password.is_empty() {
            return Err(AuthError::Validation("Password must not be empty".into()));
        }
        Ok(self)
    }
}
