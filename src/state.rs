use std::sync::Arc;

use anyhow::Context;
use tracing::warn;

use crate::auth::services::AuthService;
use crate::config::AppConfig;
use crate::users::memory::InMemoryUserDirectory;
use crate::users::repo::{PgUserDirectory, UserDirectory};

#[derive(Clone)]
pub struct AppState {
    pub auth: AuthService,
    pub config: Arc<AppConfig>,
}

impl AppState {
    pub async fn init() -> anyhow::Result<Self> {
        let config = Arc::new(AppConfig::from_env()?);

        let users: Arc<dyn UserDirectory> = match &config.database_url {
            Some(url) => {
                let db = sqlx::postgres::PgPoolOptions::new()
                    .max_connections(10)
                    .connect(url)
                    .await
                    .context("connect to database")?;

                if let Err(e) = sqlx::migrate!("./migrations").run(&db).await {
                    warn!(error = %e, "migration failed; continuing");
                }
                Arc::new(PgUserDirectory::new(db))
            }
            None => {
                warn!("DATABASE_URL not set; users are kept in memory");
                Arc::new(InMemoryUserDirectory::new())
            }
        };

        Ok(Self::from_parts(users, config))
    }

    pub fn from_parts(users: Arc<dyn UserDirectory>, config: Arc<AppConfig>) -> Self {
        Self {
            auth: AuthService::new(users),
            config,
        }
    }

    #[cfg(test)]
    pub fn fake() -> Self {
        let config = Arc::new(AppConfig {
            database_url: None,
            session: crate::config::SessionConfig {
                secret: "test".into(),
                issuer: "test-issuer".into(),
                audience: "test-aud".into(),
                ttl_minutes: 5,
                cookie_name: "session".into(),
            },
        });
        Self::from_parts(Arc::new(InMemoryUserDirectory::new()), config)
    }
}
