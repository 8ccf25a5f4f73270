pub mod trips;
pub mod users;

use axum::Router;
use serde::Deserialize;
use tower_http::trace::TraceLayer;

use crate::state::AppState;

pub fn create_router(state: AppState) -> Router {
    Router::new()
        .nest("/api", users::router().merge(trips::router()))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Participant lists accept bare usernames as well as `{"username": ..}` objects.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub(crate) enum ParticipantRef {
    Name(String),
    Object { username: String },
}

impl ParticipantRef {
    pub(crate) fn into_username(self) -> String {
        match self {
            ParticipantRef::Name(username) | ParticipantRef::Object { username } => username,
        }
    }
}

pub(crate) fn usernames(participants: Vec<ParticipantRef>) -> Vec<String> {
    participants
        .into_iter()
        .map(ParticipantRef::into_username)
        .collect()
}
