use async_trait::async_trait;
use tokio::sync::Mutex;

use crate::users::repo::{DirectoryError, UserDirectory};
use crate::users::repo_types::User;

/// Directory kept in process memory. Ids start at 1 and increase by one.
#[derive(Default)]
pub struct InMemoryUserDirectory {
    users: Mutex<Vec<User>>,
}

impl InMemoryUserDirectory {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl UserDirectory for InMemoryUserDirectory {
    async fn find(&self, email: &str) -> Result<Vec<User>, DirectoryError> {
        let users = self.users.lock().await;
        Ok(users.iter().filter(|u| u.email == email).cloned().collect())
    }

    async fn create(&self, email: &str, password: &str) -> Result<User, DirectoryError> {
        let mut users = self.users.lock().await;
        // mirrors the UNIQUE (email) constraint of the users table
        if users.iter().any(|u| u.email == email) {
            return Err(DirectoryError::EmailTaken);
        }
        let user = User {
            id: users.len() as i64 + 1,
            email: email.to_string(),
            password: password.to_string(),
        };
        users.push(user.clone());
        Ok(user)
    }

    async fn find_one(&self, id: i64) -> Result<Option<User>, DirectoryError> {
        let users = self.users.lock().await;
        Ok(users.iter().find(|u| u.id == id).cloned())
    }
}
