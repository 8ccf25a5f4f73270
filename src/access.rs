//! Ownership and membership predicates shared by every trip and roster operation.

use sqlx::SqliteConnection;
use tracing::warn;

use crate::{
    error::AppError,
    models::trip::{Trip, TripId},
    queries,
};

pub fn is_owner(trip: &Trip, username: &str) -> bool {
    trip.owner_name == username
}

/// Loads the trip if `acting_username` owns it.
///
/// A trip that does not exist and a trip owned by someone else yield the same
/// [`AppError::NotOwnerOrMissing`], so non-owners cannot discover which trip ids exist.
/// Must be called on the transaction that performs the subsequent mutation.
pub async fn authorize_owner_action(
    conn: &mut SqliteConnection,
    acting_username: &str,
    trip_id: TripId,
) -> Result<Trip, AppError> {
    match queries::find_trip(conn, trip_id).await? {
        Some(trip) if is_owner(&trip, acting_username) => Ok(trip),
        _ => {
            warn!(user = acting_username, trip_id, "owner action denied");
            Err(AppError::NotOwnerOrMissing)
        }
    }
}

pub async fn is_member(
    conn: &mut SqliteConnection,
    username: &str,
    trip_id: TripId,
) -> Result<bool, AppError> {
    Ok(queries::find_participant(conn, trip_id, username)
        .await?
        .is_some())
}
