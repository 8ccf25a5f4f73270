use std::{net::SocketAddr, time::Duration};

use tempfile::TempDir;

use crate::{
    config::{AppConfig, HashingConfig},
    db::{init_pool, run_migrations},
    state::AppState,
};

pub fn cheap_hashing() -> HashingConfig {
    HashingConfig {
        memory_kib: 8,
        iterations: 1,
        parallelism: 1,
    }
}

/// Fresh migrated database in a temp dir that lives as long as the context.
pub struct TestContext {
    pub state: AppState,
    _root: TempDir,
}

impl TestContext {
    pub async fn new() -> Self {
        let root = TempDir::new().expect("temp dir");
        let db_path = root.path().join("test.sqlite");
        let config = AppConfig {
            database_url: format!("sqlite://{}", db_path.to_string_lossy()),
            listen_addr: SocketAddr::from(([127, 0, 0, 1], 0)),
            max_connections: 4,
            busy_timeout: Duration::from_secs(5),
            hashing: cheap_hashing(),
        };
        let db = init_pool(&config.database_url, config.max_connections, config.busy_timeout)
            .await
            .expect("pool");
        run_migrations(&db).await.expect("migrations");
        let state = AppState::new(config, db).expect("state");
        Self { state, _root: root }
    }

    pub async fn register(&self, username: &str) {
        crate::services::users::create_user(&self.state, username, "secret")
            .await
            .expect("register user");
    }
}
