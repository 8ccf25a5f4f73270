use serde::{Deserialize, Serialize};
use sqlx::FromRow;

#[derive(Debug, Clone, Serialize, Deserialize, FromRow, PartialEq, Eq)]
pub struct Participant {
    pub participant_id: i64,
    pub username: String,
    pub trip_id: i64,
}
