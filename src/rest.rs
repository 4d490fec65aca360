use axum::{
    body::Bytes,
    extract::{rejection::JsonRejection, Path, State},
    http::{HeaderMap, StatusCode},
    routing::{get, patch, post},
    Json, Router,
};
use tower_http::{cors::CorsLayer, trace::TraceLayer};

use crate::{
    error::AppError,
    models::{
        task::{CreateTask, Task, UpdateTask},
        user::{AuthResponse, Credentials, MessageResponse},
    },
    AppState,
};

// Protected handlers authenticate before looking at the body, so a caller
// without a valid token gets 401 even when the JSON is malformed.

pub async fn register(
    State(state): State<AppState>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> Result<(StatusCode, Json<MessageResponse>), AppError> {
    let Json(req) = payload?;
    state
        .credentials
        .register(&req.username, &req.password)
        .await?;

    Ok((
        StatusCode::CREATED,
        Json(MessageResponse::new("User registered")),
    ))
}

pub async fn login(
    State(state): State<AppState>,
    payload: Result<Json<Credentials>, JsonRejection>,
) -> Result<Json<AuthResponse>, AppError> {
    let Json(req) = payload?;
    let user_id = state
        .credentials
        .verify(&req.username, &req.password)
        .await
        .inspect_err(|e| {
            if matches!(e, AppError::InvalidCredentials) {
                tracing::warn!("rejected login attempt");
            }
        })?;

    let token = state.sessions.issue(&user_id)?;
    tracing::info!(user_id = %user_id, "session issued");

    Ok(Json(AuthResponse { token }))
}

pub async fn list_tasks(
    State(state): State<AppState>,
    headers: HeaderMap,
) -> Result<Json<Vec<Task>>, AppError> {
    let user_id = state.sessions.authenticate(&headers)?;
    Ok(Json(state.tasks.list(&user_id).await?))
}

pub async fn create_task(
    State(state): State<AppState>,
    headers: HeaderMap,
    payload: Result<Json<CreateTask>, JsonRejection>,
) -> Result<(StatusCode, Json<Task>), AppError> {
    let user_id = state.sessions.authenticate(&headers)?;
    let Json(req) = payload?;

    let task = state
        .tasks
        .create(&user_id, &req.text, req.status, req.priority)
        .await?;

    Ok((StatusCode::CREATED, Json(task)))
}

pub async fn update_task(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(task_id): Path<String>,
    body: Bytes,
) -> Result<Json<Task>, AppError> {
    let user_id = state.sessions.authenticate(&headers)?;

    // Both fields are optional, so a PATCH without a body is an empty patch.
    let req = if body.iter().all(u8::is_ascii_whitespace) {
        UpdateTask::default()
    } else {
        serde_json::from_slice::<UpdateTask>(&body)
            .map_err(|e| AppError::Validation(format!("Invalid JSON body: {}", e)))?
    };

    let task = state
        .tasks
        .update(&user_id, &task_id, req.status, req.priority)
        .await?;

    Ok(Json(task))
}

pub async fn delete_task(
    State(state): State<AppState>,
    headers: HeaderMap,
    Path(task_id): Path<String>,
) -> Result<Json<MessageResponse>, AppError> {
    let user_id = state.sessions.authenticate(&headers)?;
    state.tasks.delete(&user_id, &task_id).await?;

    Ok(Json(MessageResponse::new("Task deleted")))
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/register", post(register))
        .route("/login", post(login))
        .route("/task", get(list_tasks).post(create_task))
        .route("/task/:id", patch(update_task).delete(delete_task))
        .layer(CorsLayer::permissive())
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}
