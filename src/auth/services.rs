use std::sync::Arc;

use lazy_static::lazy_static;
use regex::Regex;
use tracing::{debug, info, warn};

use crate::auth::error::AuthError;
use crate::auth::password::{hash_password, verify_password};
use crate::users::repo::{DirectoryError, UserDirectory};
use crate::users::repo_types::User;

pub(crate) fn is_valid_email(email: &str) -> bool {
    lazy_static! {
        static ref EMAIL_RE: Regex = Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").unwrap();
    }
    EMAIL_RE.is_match(email)
}

/// Signup and signin rules on top of a [`UserDirectory`]. Holds no state of
/// its own between calls.
#[derive(Clone)]
pub struct AuthService {
    users: Arc<dyn UserDirectory>,
}

impl AuthService {
    pub fn new(users: Arc<dyn UserDirectory>) -> Self {
        Self { users }
    }

    /// Creates an account with a salted hash of `password`.
    ///
    /// The existence check and the insert are not atomic; a concurrent signup
    /// for the same email is caught by the directory's uniqueness guard and
    /// reported as [`AuthError::Conflict`] as well.
    pub async fn signup(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let existing = self.users.find(email).await?;
        if !existing.is_empty() {
            warn!(email = %email, "signup with email in use");
            return Err(AuthError::Conflict);
        }

        let stored = hash_password(password)?;

        let user = match self.users.create(email, &stored).await {
            Ok(u) => u,
            Err(DirectoryError::EmailTaken) => {
                warn!(email = %email, "signup lost race on email");
                return Err(AuthError::Conflict);
            }
            Err(e) => return Err(e.into()),
        };

        info!(user_id = user.id, email = %user.email, "user signed up");
        Ok(user)
    }

    /// Checks `password` against the stored hash and returns the user on match.
    pub async fn signin(&self, email: &str, password: &str) -> Result<User, AuthError> {
        let mut matches = self.users.find(email).await?;
        if matches.is_empty() {
            warn!(email = %email, "signin unknown email");
            return Err(AuthError::NotFound);
        }
        if matches.len() > 1 {
            warn!(email = %email, count = matches.len(), "several users share email; using first");
        }
        let user = matches.swap_remove(0);

        if !verify_password(password, &user.password)? {
            warn!(user_id = user.id, "signin bad password");
            return Err(AuthError::InvalidCredentials);
        }

        debug!(user_id = user.id, "password verified");
        info!(user_id = user.id, email = %user.email, "user signed in");
        Ok(user)
    }

    /// Looks up a user by id.
    pub async fn user(&self, id: i64) -> Result<User, AuthError> {
        self.users.find_one(id).await?.ok_or(AuthError::NotFound)
    }

    pub async fn users_by_email(&self, email: &str) -> Result<Vec<User>, AuthError> {
        Ok(self.users.find(email).await?)
    }
}
