use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    routing::{delete, get, post, put},
    Json, Router,
};
use chrono::NaiveDate;
use serde::Deserialize;
use serde_json::json;

use crate::{
    error::AppError,
    models::trip::{NewTrip, TripDates, TripId, TripPatch},
    routes::{usernames, ParticipantRef},
    services::{participants, trips},
    state::AppState,
};

pub fn router() -> Router<AppState> {
    Router::new()
        .route("/user/:username/create-trip", post(create_trip))
        .route("/user/:username/trips", get(owned_trips))
        .route("/user/:username/all-trips", get(participated_trips))
        .route("/user/:username/trip/:trip_id/update", put(update_trip))
        .route("/user/:username/trip/:trip_id/delete", delete(delete_trip))
        .route(
            "/user/:username/trip/:trip_id/add-participants",
            post(add_participants),
        )
        .route(
            "/user/:username/trip/:trip_id/delete-participants",
            delete(remove_participants),
        )
        .route("/trip/:trip_id/participants", get(list_participants))
}

#[derive(Deserialize)]
struct CreateTripBody {
    trip_name: String,
    date_from: NaiveDate,
    date_to: NaiveDate,
    participants: Vec<ParticipantRef>,
}

async fn create_trip(
    State(state): State<AppState>,
    Path(username): Path<String>,
    Json(body): Json<CreateTripBody>,
) -> Result<impl IntoResponse, AppError> {
    let trip = NewTrip {
        trip_name: body.trip_name,
        date_from: body.date_from,
        date_to: body.date_to,
        participants: usernames(body.participants),
    };
    let trip_id = trips::create_trip(&state, &username, trip).await?;
    Ok((StatusCode::CREATED, Json(json!({ "trip_id": trip_id }))))
}

async fn owned_trips(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(trips::list_owned_trips(&state, &username).await?))
}

async fn participated_trips(
    State(state): State<AppState>,
    Path(username): Path<String>,
) -> Result<impl IntoResponse, AppError> {
    Ok(Json(trips::list_participated_trips(&state, &username).await?))
}

#[derive(Deserialize, Default)]
struct UpdateTripBody {
    trip_name: Option<String>,
    date_from: Option<NaiveDate>,
    date_to: Option<NaiveDate>,
    participants: Option<Vec<ParticipantRef>>,
}

impl UpdateTripBody {
    fn into_patch(self) -> Result<TripPatch, AppError> {
        let dates = match (self.date_from, self.date_to) {
            (Some(date_from), Some(date_to)) => Some(TripDates { date_from, date_to }),
            (None, None) => None,
            _ => {
                return Err(AppError::MissingParameter(
                    "date_from and date_to must be given together".into(),
                ))
            }
        };
        Ok(TripPatch {
            trip_name: self.trip_name,
            dates,
            participants: self.participants.map(usernames),
        })
    }
}

async fn update_trip(
    State(state): State<AppState>,
    Path((username, trip_id)): Path<(String, TripId)>,
    Json(body): Json<UpdateTripBody>,
) -> Result<impl IntoResponse, AppError> {
    let patch = body.into_patch()?;
    trips::update_trip(&state, &username, trip_id, patch).await?;
    Ok(Json(json!({ "response": "OK" })))
}

async fn delete_trip(
    State(state): State<AppState>,
    Path((username, trip_id)): Path<(String, TripId)>,
) -> Result<impl IntoResponse, AppError> {
    trips::delete_trip(&state, &username, trip_id).await?;
    Ok(Json(json!({ "response": "OK" })))
}

#[derive(Deserialize)]
struct RosterBody {
    participants: Vec<ParticipantRef>,
}

async fn add_participants(
    State(state): State<AppState>,
    Path((username, trip_id)): Path<(String, TripId)>,
    Json(body): Json<RosterBody>,
) -> Result<impl IntoResponse, AppError> {
    let added =
        participants::add_participants(&state, &username, trip_id, &usernames(body.participants))
            .await?;
    Ok(Json(json!({ "response": "OK", "added": added })))
}

async fn remove_participants(
    State(state): State<AppState>,
    Path((username, trip_id)): Path<(String, TripId)>,
    Json(body): Json<RosterBody>,
) -> Result<impl IntoResponse, AppError> {
    let removed = participants::remove_participants(
        &state,
        &username,
        trip_id,
        &usernames(body.participants),
    )
    .await?;
    Ok(Json(json!({ "response": "OK", "removed": removed })))
}

async fn list_participants(
    State(state): State<AppState>,
    Path(trip_id): Path<TripId>,
) -> Result<impl IntoResponse, AppError> {
    let roster: Vec<String> = participants::list_participants(&state, trip_id)
        .await?
        .into_iter()
        .map(|p| p.username)
        .collect();
    Ok(Json(json!({ "participants": roster })))
}
