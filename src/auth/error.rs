use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::users::repo::DirectoryError;

#[derive(Debug, Error)]
pub enum AuthError {
    #[error("email in use")]
    Conflict,

    #[error("user not found")]
    NotFound,

    #[error("bad password")]
    InvalidCredentials,

    #[error("{0}")]
    Validation(String),

    #[error("not signed in")]
    Unauthenticated,

    #[error("stored password is malformed")]
    MalformedPassword,

    #[error("password hashing failed: {0}")]
    Hash(String),

    #[error("session error: {0}")]
    Session(String),

    #[error("user directory error: {0}")]
    Directory(#[from] DirectoryError),
}

impl IntoResponse for AuthError {
    fn into_response(self) -> Response {
        let status = match &self {
            AuthError::Conflict => StatusCode::CONFLICT,
            AuthError::NotFound => StatusCode::NOT_FOUND,
            AuthError::InvalidCredentials | AuthError::Unauthenticated => StatusCode::UNAUTHORIZED,
            AuthError::Validation(_) => StatusCode::BAD_REQUEST,
            AuthError::MalformedPassword
            | AuthError::Hash(_)
            | AuthError::Session(_)
            | AuthError::Directory(_) => {
                error!(error = %self, "internal auth error");
                return (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(json!({ "error": "internal server error" })),
                )
                    .into_response();
            }
        };

        (status, Json(json!({ "error": self.to_string() }))).into_response()
    }
}
