use axum::{
    extract::State,
    http::{header, StatusCode},
    middleware,
    response::IntoResponse,
    routing::get,
    Json, Router,
};
use tracing::instrument;
use uuid::Uuid;

use crate::{
    auth::extractors::{require_auth, AuthUser},
    error::AppError,
    extract::{AppJson, AppPath},
    state::AppState,
    tasks::{
        dto::{CreateTaskRequest, MessageResponse, UpdateTaskRequest},
        repo_types::Task,
        services,
    },
};

/// Every route here sits behind `require_auth`.
pub fn task_routes(state: AppState) -> Router<AppState> {
    Router::new()
        .route("/tasks", get(list_tasks).post(create_task))
        .route(
            "/tasks/:id",
            get(get_task)
                .patch(update_task)
                .put(update_task)
                .delete(delete_task),
        )
        .route_layer(middleware::from_fn_with_state(state, require_auth))
}

#[instrument(skip(state, payload))]
pub async fn create_task(
    State(state): State<AppState>,
    user: AuthUser,
    AppJson(payload): AppJson<CreateTaskRequest>,
) -> Result<impl IntoResponse, AppError> {
    let task = services::create_task(state.tasks.as_ref(), user, payload).await?;
    let location = format!("/tasks/{}", task.id);
    Ok((StatusCode::CREATED, [(header::LOCATION, location)], Json(task)))
}

#[instrument(skip(state))]
pub async fn list_tasks(
    State(state): State<AppState>,
    user: AuthUser,
) -> Result<Json<Vec<Task>>, AppError> {
    Ok(Json(services::list_tasks(state.tasks.as_ref(), user).await?))
}

#[instrument(skip(state))]
pub async fn get_task(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<Task>, AppError> {
    Ok(Json(services::get_task(state.tasks.as_ref(), user, id).await?))
}

#[instrument(skip(state, payload))]
pub async fn update_task(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(id): AppPath<Uuid>,
    AppJson(payload): AppJson<UpdateTaskRequest>,
) -> Result<Json<Task>, AppError> {
    Ok(Json(
        services::update_task(state.tasks.as_ref(), user, id, payload).await?,
    ))
}

#[instrument(skip(state))]
pub async fn delete_task(
    State(state): State<AppState>,
    user: AuthUser,
    AppPath(id): AppPath<Uuid>,
) -> Result<Json<MessageResponse>, AppError> {
    services::delete_task(state.tasks.as_ref(), user, id).await?;
    Ok(Json(MessageResponse {
        message: "deleted successfully",
    }))
}
