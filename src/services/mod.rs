pub mod cascade;
pub mod participants;
pub mod trips;
pub mod users;
