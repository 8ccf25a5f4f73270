use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub type TripId = i64;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq, Eq)]
pub struct Trip {
    pub trip_id: TripId,
    pub trip_name: String,
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    pub owner_name: String,
}

/// A trip together with the usernames on its roster.
#[derive(Debug, Clone, Serialize, PartialEq, Eq)]
pub struct TripWithParticipants {
    #[serde(flatten)]
    pub trip: Trip,
    pub participants: Vec<String>,
}

#[derive(Debug, Clone)]
pub struct NewTrip {
    pub trip_name: String,
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
    pub participants: Vec<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TripDates {
    pub date_from: NaiveDate,
    pub date_to: NaiveDate,
}

/// Partial update of a trip. Dates only ever move together.
#[derive(Debug, Clone, Default)]
pub struct TripPatch {
    pub trip_name: Option<String>,
    pub dates: Option<TripDates>,
    pub participants: Option<Vec<String>>,
}

impl TripPatch {
    pub fn is_empty(&self) -> bool {
        self.trip_name.is_none() && self.dates.is_none() && self.participants.is_none()
    }
}
