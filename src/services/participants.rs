use sqlx::SqliteConnection;
use tracing::{debug, info};

use crate::{
    access, db,
    error::AppError,
    models::{participant::Participant, trip::TripId},
    queries,
    state::AppState,
};

/// Enrolls each username that resolves to a user and is not on the roster yet.
/// Returns how many rows were created.
pub(crate) async fn enroll_all(
    conn: &mut SqliteConnection,
    trip_id: TripId,
    usernames: &[String],
) -> Result<usize, AppError> {
    let mut enrolled = 0;
    for username in usernames {
        if queries::enroll_if_known(&mut *conn, trip_id, username).await? {
            enrolled += 1;
        } else {
            debug!(trip_id, user = %username, "skipped unknown or already enrolled user");
        }
    }
    Ok(enrolled)
}

pub async fn add_participants(
    state: &AppState,
    acting_username: &str,
    trip_id: TripId,
    usernames: &[String],
) -> Result<usize, AppError> {
    let mut tx = db::begin_write(&state.db).await?;
    access::authorize_owner_action(&mut tx, acting_username, trip_id).await?;
    let added = enroll_all(&mut tx, trip_id, usernames).await?;
    tx.commit().await?;

    info!(trip_id, added, "participants added");
    Ok(added)
}

/// Removing someone who is not on the roster is a no-op.
pub async fn remove_participants(
    state: &AppState,
    acting_username: &str,
    trip_id: TripId,
    usernames: &[String],
) -> Result<usize, AppError> {
    let mut tx = db::begin_write(&state.db).await?;
    access::authorize_owner_action(&mut tx, acting_username, trip_id).await?;
    let mut removed = 0;
    for username in usernames {
        if queries::delete_participant(&mut tx, trip_id, username).await? {
            removed += 1;
        }
    }
    tx.commit().await?;

    info!(trip_id, removed, "participants removed");
    Ok(removed)
}

pub async fn list_participants(
    state: &AppState,
    trip_id: TripId,
) -> Result<Vec<Participant>, AppError> {
    let mut tx = state.db.begin().await?;
    if queries::find_trip(&mut tx, trip_id).await?.is_none() {
        return Err(AppError::UnknownTrip);
    }
    let participants = queries::participants_of(&mut tx, trip_id).await?;
    tx.commit().await?;
    Ok(participants)
}

/// True for roster members and for the owner, even if the owner's own
/// roster row is gone.
pub async fn can_join_chat(
    state: &AppState,
    username: &str,
    trip_id: TripId,
) -> Result<bool, AppError> {
    let mut tx = state.db.begin().await?;
    let allowed = if access::is_member(&mut tx, username, trip_id).await? {
        true
    } else {
        queries::find_trip(&mut tx, trip_id)
            .await?
            .is_some_and(|trip| access::is_owner(&trip, username))
    };
    tx.commit().await?;
    Ok(allowed)
}
