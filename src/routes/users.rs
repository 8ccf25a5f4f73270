use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;

use crate::{
    error::AppError,
    models::trip::TripId,
    services::{participants, users},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/user/create", post(create_user))
        .route("/users", get(list_users))
        .route("/user/login", post(login))
        .route("/user/:username/join-chat/:trip_id", get(join_chat))
        .route("/user/:username/change-password", put(change_password))
        .route("/user/:username/delete", delete(delete_user))
}

#[derive(Deserialize)]
struct CredentialsBody {
    username: String,
    password: String,
}

async fn create_user(
    State(state): State<AppState>,
    Json(body): Json<CredentialsBody>,
) -> Result<impl IntoResponse, AppError> {
    let user = users::create_user(&state, &body.username, &body.password).await?;
    Ok((
        StatusCode::CREATED,
        Json(json!({ "username": user.username })),
    ))
}

async fn list_users(State(state): State<AppState>) -> Result<impl IntoResponse, AppError> {
    let users = users::list_users(&state).await?;
    Ok(Json(json!({ "users": users })))
}

async fn login(
    State(state): State<AppState>,
    Json(body): Json<CredentialsBody>,
) -> Result<impl IntoResponse, AppError> {
    users::authenticate(&state, &body.username, &body.password).await?;
    Ok(Json(json!({ "response": "OK" })))
}

async fn join_chat(
    State(state): State<AppState>,
    Path((username, trip_id)): Path<(String, TripId)>,
) -> Result<impl IntoResponse, AppError> {
    if participants::can_join_chat(&state, &username, trip_id).await? {
        Ok((StatusCode::OK, Json(json!({ "response": "OK" }))))
    } else {
        Ok((
            StatusCode::FORBIDDEN,
            Json(json!({ "response": "Can not join to this chat" })),
        ))
    }
}

#[derive(Deserialize)]
struct ChangePasswordBody {
    password: String,
    new_password: String,
}

async fn change_password(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Json(body): Json<ChangePasswordBody>,
) -> Result<impl IntoResponse, AppError> {
    users::change_password(&state, &username, &body.password, &body.new_password).await?;
    Ok(Json(json!({ "response": "OK" })))
}

async fn delete_user(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    users::delete_user(&state, &username).await?;
    Ok(Json(json!({ "response": "OK" })))
}
