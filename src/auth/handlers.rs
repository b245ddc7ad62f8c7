use axum::{
    extract::{FromRef, State},
    http::{header, StatusCode},
    response::{AppendHeaders, IntoResponse},
    routing::{get, post},
    Json, Router,
};
use tracing::{error, instrument};

use crate::{
    auth::{
        dto::Credentials,
        error::AuthError,
        session::{SessionKeys, SessionUser},
    },
    state::AppState,
    users::repo_types::PublicUser,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/auth/signup", post(signup))
        .route("/auth/signin", post(signin))
        .route("/auth/signout", post(signout))
        .route("/auth/whoami", get(whoami))
}

fn start_session(state: &AppState, user_id: i64) -> Result<String, AuthError> {
    SessionKeys::from_ref(state)
        .start_cookie(user_id)
        .map_err(|e| {
            error!(error = %e, user_id, "session sign failed");
            AuthError::Session(e.to_string())
        })
}

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    Json(payload): Json<Credentials>,
) -> Result<impl IntoResponse, AuthError> {
    let payload = payload.validated()?;
    let user = state.auth.signup(&payload.email, &payload.password).await?;
    let cookie = start_session(&state, user.id)?;

    Ok((
        StatusCode::CREATED,
        AppendHeaders([(header::SET_COOKIE, cookie)]),
        Json(PublicUser::from(user)),
    ))
}

#[instrument(skip(state, payload))]
pub async fn signin(
    State(state): State<AppState>,
    Json(payload): Json<Credentials>,
) -> Result<impl IntoResponse, AuthError> {
    let payload = payload.validated()?;
    let user = state.auth.signin(&payload.email, &payload.password).await?;
    let cookie = start_session(&state, user.id)?;

    Ok((
        AppendHeaders([(header::SET_COOKIE, cookie)]),
        Json(PublicUser::from(user)),
    ))
}

#[instrument(skip(state))]
pub async fn signout(State(state): State<AppState>) -> impl IntoResponse {
    let keys = SessionKeys::from_ref(&state);
    (
        StatusCode::NO_CONTENT,
        AppendHeaders([(header::SET_COOKIE, keys.clear_cookie())]),
    )
}

#[instrument(skip(state))]
pub async fn whoami(
    State(state): State<AppState>,
    SessionUser(user_id): SessionUser,
) -> Result<Json<PublicUser>, AuthError> {
    // a session can outlive its user
    let user = state.auth.user(user_id).await.map_err(|e| match e {
        AuthError::NotFound => AuthError::Unauthenticated,
        other => other,
    })?;
    Ok(Json(user.into()))
}

#[cfg(test)]
mod tests {
    use axum::{
        body::Body,
        http::{header, Request, StatusCode},
        Router,
    };
    use http_body_util::BodyExt;
    use serde_json::{json, Value};
    use tower::ServiceExt;

    use crate::{app::build_app, state::AppState};

    fn app() -> Router {
        build_app(AppState::fake())
    }

    fn post_json(uri: &str, body: Value) -> Request<Body> {
        Request::builder()
            .method("POST")
            .uri(uri)
            .header(header::CONTENT_TYPE, "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    fn get_with_cookie(uri: &str, cookie: Option<&str>) -> Request<Body> {
        let mut req = Request::builder().uri(uri);
        if let Some(c) = cookie {
            req = req.header(header::COOKIE, c);
        }
        req.body(Body::empty()).unwrap()
    }

    /// "name=value" part of the response's Set-Cookie header.
    fn session_pair(res: &axum::response::Response) -> String {
        let set_cookie = res
            .headers()
            .get(header::SET_COOKIE)
            .expect("set-cookie header")
            .to_str()
            .unwrap();
        set_cookie.split(';').next().unwrap().to_string()
    }

    async fn body_json(res: axum::response::Response) -> Value {
        let bytes = res.into_body().collect().await.unwrap().to_bytes();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[tokio::test]
    async fn signup_whoami_signout_flow() {
        let app = app();

        let res = app
            .clone()
            .oneshot(post_json(
                "/auth/signup",
                json!({"email": "a@a.com", "password": "pw1"}),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CREATED);
        let cookie = session_pair(&res);
        assert!(cookie.starts_with("session="));
        let body = body_json(res).await;
        assert_eq!(body, json!({"id": 1, "email": "a@a.com"}));

        let res = app
            .clone()
            .oneshot(get_with_cookie("/auth/whoami", Some(&cookie)))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        assert_eq!(body_json(res).await, json!({"id": 1, "email": "a@a.com"}));

        let res = app
            .clone()
            .oneshot(
                Request::builder()
                    .method("POST")
                    .uri("/auth/signout")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NO_CONTENT);
        let cleared = res.headers().get(header::SET_COOKIE).unwrap().to_str().unwrap();
        assert!(cleared.contains("Max-Age=0"));

        let res = app
            .oneshot(get_with_cookie("/auth/whoami", Some("session=")))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }

    #[tokio::test]
    async fn signin_sets_session_for_existing_user() {
        let app = app();
        app.clone()
            .oneshot(post_json(
                "/auth/signup",
                json!({"email": "b@b.com", "password": "secret"}),
            ))
            .await
            .unwrap();

        let res = app
            .clone()
            .oneshot(post_json(
                "/auth/signin",
                json!({"email": "B@b.com ", "password": "secret"}),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
        let cookie = session_pair(&res);
        let body = body_json(res).await;
        assert_eq!(body["email"], "b@b.com");
        assert!(body.get("password").is_none());

        let res = app
            .oneshot(get_with_cookie("/auth/whoami", Some(&cookie)))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::OK);
    }

    #[tokio::test]
    async fn business_errors_surface_as_statuses() {
        let app = app();
        let creds = json!({"email": "c@c.com", "password": "right"});
        app.clone()
            .oneshot(post_json("/auth/signup", creds.clone()))
            .await
            .unwrap();

        let res = app
            .clone()
            .oneshot(post_json("/auth/signup", creds))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::CONFLICT);
        assert_eq!(body_json(res).await, json!({"error": "email in use"}));

        let res = app
            .clone()
            .oneshot(post_json(
                "/auth/signin",
                json!({"email": "c@c.com", "password": "wrong"}),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
        assert!(res.headers().get(header::SET_COOKIE).is_none());

        let res = app
            .oneshot(post_json(
                "/auth/signin",
                json!({"email": "nobody@c.com", "password": "right"}),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::NOT_FOUND);
        assert_eq!(body_json(res).await, json!({"error": "user not found"}));
    }

    #[tokio::test]
    async fn invalid_input_is_rejected() {
        let app = app();
        let res = app
            .clone()
            .oneshot(post_json(
                "/auth/signup",
                json!({"email": "not-an-email", "password": "pw"}),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);

        let res = app
            .oneshot(post_json(
                "/auth/signup",
                json!({"email": "d@d.com", "password": ""}),
            ))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn whoami_rejects_missing_or_forged_session() {
        let app = app();
        let res = app
            .clone()
            .oneshot(get_with_cookie("/auth/whoami", None))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);

        let res = app
            .oneshot(get_with_cookie("/auth/whoami", Some("session=forged.token.value")))
            .await
            .unwrap();
        assert_eq!(res.status(), StatusCode::UNAUTHORIZED);
    }
}
