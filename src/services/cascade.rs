//! Explicit cascades for parent-entity deletion.
//!
//! Foreign keys carry no `ON DELETE` actions, so these procedures are the only
//! place dependent rows are removed. They run on the caller's transaction; if
//! any step fails the transaction is dropped and nothing is removed.

use sqlx::SqliteConnection;
use tracing::debug;

use crate::{models::trip::TripId, queries};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct CascadeReport {
    pub participants: u64,
    pub trips: u64,
    pub users: u64,
}

/// Removes the roster of `trip_id`, then the trip itself.
pub async fn delete_trip_cascade(
    conn: &mut SqliteConnection,
    trip_id: TripId,
) -> sqlx::Result<CascadeReport> {
    let participants = queries::delete_participants_of_trip(&mut *conn, trip_id).await?;
    let trips = queries::delete_trip(&mut *conn, trip_id).await?;
    let report = CascadeReport {
        participants,
        trips,
        users: 0,
    };
    debug!(trip_id, ?report, "trip cascade");
    Ok(report)
}

/// Removes every row that references `username`: rosters of the trips it owns,
/// its memberships elsewhere, the owned trips, and finally the user.
pub async fn delete_user_cascade(
    conn: &mut SqliteConnection,
    username: &str,
) -> sqlx::Result<CascadeReport> {
    let mut participants = queries::delete_participants_of_owned_trips(&mut *conn, username).await?;
    participants += queries::delete_memberships_of(&mut *conn, username).await?;
    let trips = queries::delete_trips_owned_by(&mut *conn, username).await?;
    let users = queries::delete_user(&mut *conn, username).await?;
    let report = CascadeReport {
        participants,
        trips,
        users,
    };
    debug!(user = username, ?report, "user cascade");
    Ok(report)
}
