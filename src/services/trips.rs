use sqlx::SqliteConnection;
use tracing::{debug, info};

use crate::{
    access, db,
    error::AppError,
    models::trip::{NewTrip, Trip, TripId, TripPatch, TripWithParticipants},
    queries,
    services::{cascade, participants},
    state::AppState,
};

/// Creates the trip, enrolls the owner and every resolvable initial
/// participant in one transaction. Unknown usernames are skipped.
pub async fn create_trip(
    state: &AppState,
    owner_username: &str,
    trip: NewTrip,
) -> Result<TripId, AppError> {
    let mut tx = db::begin_write(&state.db).await?;
    if !queries::user_exists(&mut tx, owner_username).await? {
        return Err(AppError::UnknownUser);
    }

    let trip_id = queries::insert_trip(
        &mut tx,
        owner_username,
        &trip.trip_name,
        trip.date_from,
        trip.date_to,
    )
    .await?;
    queries::enroll_if_known(&mut tx, trip_id, owner_username).await?;
    let enrolled = participants::enroll_all(&mut tx, trip_id, &trip.participants).await?;
    tx.commit().await?;

    info!(trip_id, owner = owner_username, enrolled, "trip created");
    Ok(trip_id)
}

pub async fn update_trip(
    state: &AppState,
    acting_username: &str,
    trip_id: TripId,
    patch: TripPatch,
) -> Result<(), AppError> {
    let mut tx = db::begin_write(&state.db).await?;
    if !queries::user_exists(&mut tx, acting_username).await? {
        return Err(AppError::UnknownUser);
    }
    access::authorize_owner_action(&mut tx, acting_username, trip_id).await?;
    if patch.is_empty() {
        return Err(AppError::NoFieldsChanged);
    }

    if let Some(name) = &patch.trip_name {
        queries::update_trip_name(&mut tx, trip_id, name).await?;
    }
    if let Some(dates) = patch.dates {
        queries::update_trip_dates(&mut tx, trip_id, dates.date_from, dates.date_to).await?;
    }
    if let Some(usernames) = &patch.participants {
        let enrolled = participants::enroll_all(&mut tx, trip_id, usernames).await?;
        debug!(trip_id, enrolled, "participants added through update");
    }
    tx.commit().await?;

    info!(trip_id, user = acting_username, "trip updated");
    Ok(())
}

pub async fn delete_trip(
    state: &AppState,
    acting_username: &str,
    trip_id: TripId,
) -> Result<(), AppError> {
    let mut tx = db::begin_write(&state.db).await?;
    if !queries::user_exists(&mut tx, acting_username).await? {
        return Err(AppError::UnknownUser);
    }
    access::authorize_owner_action(&mut tx, acting_username, trip_id).await?;
    cascade::delete_trip_cascade(&mut tx, trip_id).await?;
    tx.commit().await?;

    info!(trip_id, user = acting_username, "trip deleted");
    Ok(())
}

pub async fn list_owned_trips(
    state: &AppState,
    username: &str,
) -> Result<Vec<TripWithParticipants>, AppError> {
    let mut tx = state.db.begin().await?;
    if !queries::user_exists(&mut tx, username).await? {
        return Err(AppError::UnknownUser);
    }
    let trips = queries::trips_owned_by(&mut tx, username).await?;
    let trips = with_rosters(&mut tx, trips).await?;
    tx.commit().await?;
    Ok(trips)
}

/// Every trip `username` is on the roster of, owned ones included.
pub async fn list_participated_trips(
    state: &AppState,
    username: &str,
) -> Result<Vec<TripWithParticipants>, AppError> {
    let mut tx = state.db.begin().await?;
    if !queries::user_exists(&mut tx, username).await? {
        return Err(AppError::UnknownUser);
    }
    let trips = queries::trips_participated_by(&mut tx, username).await?;
    let trips = with_rosters(&mut tx, trips).await?;
    tx.commit().await?;
    Ok(trips)
}

async fn with_rosters(
    conn: &mut SqliteConnection,
    trips: Vec<Trip>,
) -> Result<Vec<TripWithParticipants>, AppError> {
    let mut out = Vec::with_capacity(trips.len());
    for trip in trips {
        let participants = queries::participants_of(&mut *conn, trip.trip_id)
            .await?
            .into_iter()
            .map(|p| p.username)
            .collect();
        out.push(TripWithParticipants { trip, participants });
    }
    Ok(out)
}
