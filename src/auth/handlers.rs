use axum::{
    extract::State,
    http::StatusCode,
    middleware,
    routing::{get, post},
    Json, Router,
};
use tracing::instrument;

use crate::{
    auth::{
        dto::{AuthResponse, CredentialsRequest, PublicUser, SignupResponse},
        extractors::{require_auth, AuthUser},
        services,
    },
    error::AppError,
    extract::AppJson,
    state::AppState,
};

pub fn auth_routes() -> Router<AppState> {
    Router::new()
        .route("/signup", post(signup))
        .route("/login", post(login))
}

pub fn me_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/me", get(get_me))
        .route_layer(middleware::from_fn_with_state(state, require_auth))
}

#[instrument(skip(state, payload))]
pub async fn signup(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CredentialsRequest>,
) -> Result<(StatusCode, Json<SignupResponse>), AppError> {
    let user = services::register(&state, payload).await?;
    Ok((
        StatusCode::CREATED,
        Json(SignupResponse {
            message: "user created",
            user: user.into(),
        }),
    ))
}

#[instrument(skip(state, payload))]
pub async fn login(
    State(state): State<AppState>,
    AppJson(payload): AppJson<CredentialsRequest>,
) -> Result<Json<AuthResponse>, AppError> {
    let user = services::authenticate(&state, payload).await?;
    let token = state.jwt.sign(user.id)?;

    Ok(Json(AuthResponse {
        token,
        token_type: "Bearer",
        expires_in: state.jwt.ttl.as_secs(),
        user: user.into(),
    }))
}

#[instrument(skip(state))]
pub async fn get_me(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<PublicUser>, AppError> {
    // A valid token for a user that no longer exists is treated like a bad token
    let user = state
        .users
        .find_by_id(user.id())
        .await?
        .ok_or(AppError::Unauthorized("invalid token"))?;
    Ok(Json(user.into()))
}
