//! Row-level SQL for the three relations.
//!
//! Every function runs on a caller-supplied connection, which in practice is
//! the transaction of the operation in progress. None of them open or commit
//! transactions on their own.

use chrono::NaiveDate;
use sqlx::SqliteConnection;

use crate::models::{
    participant::Participant,
    trip::{Trip, TripId},
    user::User,
};

// -- Users --

pub async fn find_user(conn: &mut SqliteConnection, username: &str) -> sqlx::Result<Option<User>> {
    sqlx::query_as::<_, User>("SELECT username, password_hash FROM users WHERE username = ?1")
        .bind(username)
        .fetch_optional(conn)
        .await
}

pub async fn user_exists(conn: &mut SqliteConnection, username: &str) -> sqlx::Result<bool> {
    let found: Option<i64> = sqlx::query_scalar("SELECT 1 FROM users WHERE username = ?1")
        .bind(username)
        .fetch_optional(conn)
        .await?;
    Ok(found.is_some())
}

pub async fn insert_user(
    conn: &mut SqliteConnection,
    username: &str,
    password_hash: &str,
) -> sqlx::Result<()> {
    sqlx::query("INSERT INTO users (username, password_hash) VALUES (?1, ?2)")
        .bind(username)
        .bind(password_hash)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn update_password_hash(
    conn: &mut SqliteConnection,
    username: &str,
    password_hash: &str,
) -> sqlx::Result<u64> {
    let result = sqlx::query("UPDATE users SET password_hash = ?1 WHERE username = ?2")
        .bind(password_hash)
        .bind(username)
        .execute(conn)
        .await?;
    Ok(result.rows_affected())
}

pub async fn delete_user(conn: &mut SqliteConnection, username: &str) -> sqlx::Result<u64> {
    let result = sqlx::query("DELETE FROM users WHERE username = ?1")
        .bind(username)
        .execute(conn)
        .await?;
    Ok(result.rows_affected())
}

pub async fn list_usernames(conn: &mut SqliteConnection) -> sqlx::Result<Vec<String>> {
    sqlx::query_scalar("SELECT username FROM users ORDER BY username")
        .fetch_all(conn)
        .await
}

// -- Trips --

pub async fn find_trip(conn: &mut SqliteConnection, trip_id: TripId) -> sqlx::Result<Option<Trip>> {
    sqlx::query_as::<_, Trip>(
        "SELECT trip_id, trip_name, date_from, date_to, owner_name FROM trips WHERE trip_id = ?1",
    )
    .bind(trip_id)
    .fetch_optional(conn)
    .await
}

pub async fn insert_trip(
    conn: &mut SqliteConnection,
    owner_name: &str,
    trip_name: &str,
    date_from: NaiveDate,
    date_to: NaiveDate,
) -> sqlx::Result<TripId> {
    let result = sqlx::query(
        "INSERT INTO trips (trip_name, date_from, date_to, owner_name) VALUES (?1, ?2, ?3, ?4)",
    )
    .bind(trip_name)
    .bind(date_from)
    .bind(date_to)
    .bind(owner_name)
    .execute(conn)
    .await?;
    Ok(result.last_insert_rowid())
}

pub async fn update_trip_name(
    conn: &mut SqliteConnection,
    trip_id: TripId,
    trip_name: &str,
) -> sqlx::Result<()> {
    sqlx::query("UPDATE trips SET trip_name = ?1 WHERE trip_id = ?2")
        .bind(trip_name)
        .bind(trip_id)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn update_trip_dates(
    conn: &mut SqliteConnection,
    trip_id: TripId,
    date_from: NaiveDate,
    date_to: NaiveDate,
) -> sqlx::Result<()> {
    sqlx::query("UPDATE trips SET date_from = ?1, date_to = ?2 WHERE trip_id = ?3")
        .bind(date_from)
        .bind(date_to)
        .bind(trip_id)
        .execute(conn)
        .await?;
    Ok(())
}

pub async fn delete_trip(conn: &mut SqliteConnection, trip_id: TripId) -> sqlx::Result<u64> {
    let result = sqlx::query("DELETE FROM trips WHERE trip_id = ?1")
        .bind(trip_id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected())
}

pub async fn delete_trips_owned_by(
    conn: &mut SqliteConnection,
    owner_name: &str,
) -> sqlx::Result<u64> {
    let result = sqlx::query("DELETE FROM trips WHERE owner_name = ?1")
        .bind(owner_name)
        .execute(conn)
        .await?;
    Ok(result.rows_affected())
}

pub async fn trips_owned_by(conn: &mut SqliteConnection, owner_name: &str) -> sqlx::Result<Vec<Trip>> {
    sqlx::query_as::<_, Trip>(
        "SELECT trip_id, trip_name, date_from, date_to, owner_name FROM trips
         WHERE owner_name = ?1 ORDER BY trip_id",
    )
    .bind(owner_name)
    .fetch_all(conn)
    .await
}

pub async fn trips_participated_by(
    conn: &mut SqliteConnection,
    username: &str,
) -> sqlx::Result<Vec<Trip>> {
    sqlx::query_as::<_, Trip>(
        "SELECT t.trip_id, t.trip_name, t.date_from, t.date_to, t.owner_name FROM trips t
         JOIN participants p ON p.trip_id = t.trip_id
         WHERE p.username = ?1 ORDER BY t.trip_id",
    )
    .bind(username)
    .fetch_all(conn)
    .await
}

// -- Participants --

/// Enrolls `username` on the trip if such a user exists and is not yet on the
/// roster. Returns whether a row was created.
pub async fn enroll_if_known(
    conn: &mut SqliteConnection,
    trip_id: TripId,
    username: &str,
) -> sqlx::Result<bool> {
    let result = sqlx::query(
        "INSERT OR IGNORE INTO participants (username, trip_id)
         SELECT username, ?2 FROM users WHERE username = ?1",
    )
    .bind(username)
    .bind(trip_id)
    .execute(conn)
    .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn find_participant(
    conn: &mut SqliteConnection,
    trip_id: TripId,
    username: &str,
) -> sqlx::Result<Option<Participant>> {
    sqlx::query_as::<_, Participant>(
        "SELECT participant_id, username, trip_id FROM participants
         WHERE trip_id = ?1 AND username = ?2",
    )
    .bind(trip_id)
    .bind(username)
    .fetch_optional(conn)
    .await
}

pub async fn participants_of(
    conn: &mut SqliteConnection,
    trip_id: TripId,
) -> sqlx::Result<Vec<Participant>> {
    sqlx::query_as::<_, Participant>(
        "SELECT participant_id, username, trip_id FROM participants
         WHERE trip_id = ?1 ORDER BY participant_id",
    )
    .bind(trip_id)
    .fetch_all(conn)
    .await
}

pub async fn delete_participant(
    conn: &mut SqliteConnection,
    trip_id: TripId,
    username: &str,
) -> sqlx::Result<bool> {
    let result = sqlx::query("DELETE FROM participants WHERE trip_id = ?1 AND username = ?2")
        .bind(trip_id)
        .bind(username)
        .execute(conn)
        .await?;
    Ok(result.rows_affected() > 0)
}

pub async fn delete_participants_of_trip(
    conn: &mut SqliteConnection,
    trip_id: TripId,
) -> sqlx::Result<u64> {
    let result = sqlx::query("DELETE FROM participants WHERE trip_id = ?1")
        .bind(trip_id)
        .execute(conn)
        .await?;
    Ok(result.rows_affected())
}

pub async fn delete_participants_of_owned_trips(
    conn: &mut SqliteConnection,
    owner_name: &str,
) -> sqlx::Result<u64> {
    let result = sqlx::query(
        "DELETE FROM participants
         WHERE trip_id IN (SELECT trip_id FROM trips WHERE owner_name = ?1)",
    )
    .bind(owner_name)
    .execute(conn)
    .await?;
    Ok(result.rows_affected())
}

pub async fn delete_memberships_of(
    conn: &mut SqliteConnection,
    username: &str,
) -> sqlx::Result<u64> {
    let result = sqlx::query("DELETE FROM participants WHERE username = ?1")
        .bind(username)
        .execute(conn)
        .await?;
    Ok(result.rows_affected())
}
