use crate::{auth::CredentialStore, config::AppConfig, db::DbPool, error::AppError};

#[derive(Clone)]
pub struct AppState {
    pub config: AppConfig,
    pub db: DbPool,
    pub credentials: CredentialStore,
}

impl AppState {
    pub fn new(config: AppConfig, db: DbPool) -> Result<Self, AppError> {
        let credentials = CredentialStore::new(&config.hashing)?;
        Ok(Self {
            config,
            db,
            credentials,
        })
    }
}
