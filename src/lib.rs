pub mod access;
pub mod auth;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod queries;
pub mod routes;
pub mod services;
pub mod state;

#[cfg(test)]
mod testing;
