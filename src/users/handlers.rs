use axum::{
    extract::{Path, Query, State},
    routing::get,
    Json, Router,
};
use serde::Deserialize;
use tracing::instrument;

use crate::{auth::error::AuthError, state::AppState, users::repo_types::PublicUser};

#[derive(Debug, Deserialize)]
pub struct EmailQuery {
    pub email: String,
}

pub fn read_routes() -> Router<AppState> {
    Router::new()
        .route("/auth", get(find_users))
        .route("/auth/:id", get(get_user))
}

#[instrument(skip(state))]
pub async fn get_user(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<Json<PublicUser>, AuthError> {
    let user = state.auth.user(id).await?;
    Ok(Json(user.into()))
}

#[instrument(skip(state))]
pub async fn find_users(
    State(state): State<AppState>,
    Query(q): Query<EmailQuery>,
) -> Result<Json<Vec<PublicUser>>, AuthError> {
    let email = q.email.trim().to_lowercase();
    let users = state.auth.users_by_email(&email).await?;
    Ok(Json(users.into_iter().map(PublicUser::from).collect()))
}
