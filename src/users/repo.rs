use async_trait::async_trait;
use sqlx::PgPool;
use thiserror::Error;

use crate::users::repo_types::User;

#[derive(Debug, Error)]
pub enum DirectoryError {
    /// Storage refused a second record for the same email.
    #[error("email already exists")]
    EmailTaken,
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

/// Persistence seam for user records.
#[async_trait]
pub trait UserDirectory: Send + Sync {
    /// All users stored under `email`; empty when there are none.
    async fn find(&self, email: &str) -> Result<Vec<User>, DirectoryError>;

    /// Store a new user. `password` is already in its "salt.hash" form.
    async fn create(&self, email: &str, password: &str) -> Result<User, DirectoryError>;

    async fn find_one(&self, id: i64) -> Result<Option<User>, DirectoryError>;
}

/// Postgres-backed directory.
#[derive(Clone)]
pub struct PgUserDirectory {
    db: PgPool,
}

impl PgUserDirectory {
    pub fn new(db: PgPool) -> Self {
        Self { db }
    }
}

#[async_trait]
impl UserDirectory for PgUserDirectory {
    async fn find(&self, email: &str) -> Result<Vec<User>, DirectoryError> {
        let users = sqlx::query_as::<_, User>(
            r#"
            SELECT id, email, password
            FROM users
            WHERE email = $1
            ORDER BY id
            "#,
        )
        .bind(email)
        .fetch_all(&self.db)
        .await?;
        Ok(users)
    }

    async fn create(&self, email: &str, password: &str) -> Result<User, DirectoryError> {
        let user = sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (email, password)
            VALUES ($1, $2)
            RETURNING id, email, password
            "#,
        )
        .bind(email)
        .bind(password)
        .fetch_one(&self.db)
        .await
        .map_err(|e| {
            let taken = e
                .as_database_error()
                .map_or(false, |db_err| db_err.is_unique_violation());
            if taken {
                DirectoryError::EmailTaken
            } else {
                DirectoryError::Database(e)
            }
        })?;
        Ok(user)
    }

    async fn find_one(&self, id: i64) -> Result<Option<User>, DirectoryError> {
        let user = sqlx::query_as::<_, User>(
            r#"SELECT id, email, password FROM users WHERE id = $1"#,
        )
        .bind(id)
        .fetch_optional(&self.db)
        .await?;
        Ok(user)
    }
}
