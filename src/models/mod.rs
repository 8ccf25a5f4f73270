pub mod participant;
pub mod trip;
pub mod user;
