use tracing::{info, warn};

use crate::{db, error::AppError, models::user::User, queries, services::cascade, state::AppState};

pub async fn create_user(state: &AppState, username: &str, password: &str) -> Result<User, AppError> {
    // Names are stored verbatim, so one with surrounding whitespace could never be matched again.
    if username.trim().is_empty() || username.trim() != username {
        return Err(AppError::MissingParameter("username".into()));
    }
    if password.is_empty() {
        return Err(AppError::MissingParameter("password".into()));
    }

    let mut tx = db::begin_write(&state.db).await?;
    let user = state.credentials.register(&mut tx, username, password).await?;
    tx.commit().await?;

    info!(user = %user.username, "user created");
    Ok(user)
}

pub async fn authenticate(state: &AppState, username: &str, password: &str) -> Result<(), AppError> {
    let mut conn = state.db.acquire().await?;
    match state.credentials.verify(&mut conn, username, password).await? {
        Some(true) => Ok(()),
        Some(false) => {
            warn!(user = username, "wrong password");
            Err(AppError::WrongPassword)
        }
        None => Err(AppError::UnknownUser),
    }
}

pub async fn change_password(
    state: &AppState,
    username: &str,
    current_password: &str,
    new_password: &str,
) -> Result<(), AppError> {
    if new_password.is_empty() {
        return Err(AppError::MissingParameter("new_password".into()));
    }

    let mut tx = db::begin_write(&state.db).await?;
    match state.credentials.verify(&mut tx, username, current_password).await? {
        Some(true) => {}
        Some(false) => {
            warn!(user = username, "password change with wrong current password");
            return Err(AppError::WrongCurrentPassword);
        }
        None => return Err(AppError::UnknownUser),
    }
    state.credentials.rotate(&mut tx, username, new_password).await?;
    tx.commit().await?;

    info!(user = username, "password changed");
    Ok(())
}

pub async fn delete_user(state: &AppState, username: &str) -> Result<(), AppError> {
    let mut tx = db::begin_write(&state.db).await?;
    if !queries::user_exists(&mut tx, username).await? {
        return Err(AppError::UnknownUser);
    }
    let report = cascade::delete_user_cascade(&mut tx, username).await?;
    tx.commit().await?;

    info!(
        user = username,
        trips = report.trips,
        participants = report.participants,
        "user deleted"
    );
    Ok(())
}

pub async fn list_users(state: &AppState) -> Result<Vec<String>, AppError> {
    let mut conn = state.db.acquire().await?;
    Ok(queries::list_usernames(&mut conn).await?)
}
