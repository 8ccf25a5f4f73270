use std::{
    ops::{Deref, DerefMut},
    str::FromStr,
    time::Duration,
};

use sqlx::pool::PoolConnection;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePoolOptions};
use sqlx::{Sqlite, SqliteConnection, SqlitePool};
use tracing::{debug, info};

use crate::error::AppError;

pub type DbPool = SqlitePool;

pub async fn init_pool(
    database_url: &str,
    max_connections: u32,
    busy_timeout: Duration,
) -> Result<DbPool, AppError> {
    // Cascades are done by hand, so the store must reject anything that would orphan a row.
    let options = SqliteConnectOptions::from_str(database_url)?
        .create_if_missing(true)
        .foreign_keys(true)
        .busy_timeout(busy_timeout);

    let pool = SqlitePoolOptions::new()
        .max_connections(max_connections)
        .connect_with(options)
        .await?;
    Ok(pool)
}

pub async fn run_migrations(pool: &DbPool) -> Result<(), AppError> {
    sqlx::migrate!("./migrations").run(pool).await?;
    info!("database migrations complete");
    Ok(())
}

/// A transaction started with `BEGIN IMMEDIATE`.
///
/// The write lock is taken when the transaction opens, so a second writer
/// waits out the busy timeout instead of failing when its read lock would
/// have to be upgraded. Dropping it without [`WriteTx::commit`] closes the
/// connection, and SQLite rolls back whatever the transaction did.
pub struct WriteTx {
    conn: Option<PoolConnection<Sqlite>>,
    committed: bool,
}

pub async fn begin_write(pool: &DbPool) -> Result<WriteTx, AppError> {
    let mut conn = pool.acquire().await?;
    sqlx::query("BEGIN IMMEDIATE").execute(&mut *conn).await?;
    Ok(WriteTx {
        conn: Some(conn),
        committed: false,
    })
}

impl WriteTx {
    pub async fn commit(mut self) -> Result<(), AppError> {
        sqlx::query("COMMIT").execute(&mut *self).await?;
        self.committed = true;
        Ok(())
    }
}

impl Deref for WriteTx {
    type Target = SqliteConnection;

    fn deref(&self) -> &SqliteConnection {
        // Only `Drop` takes the connection out.
        self.conn.as_deref().expect("write transaction holds a connection")
    }
}

impl DerefMut for WriteTx {
    fn deref_mut(&mut self) -> &mut SqliteConnection {
        self.conn.as_deref_mut().expect("write transaction holds a connection")
    }
}

impl Drop for WriteTx {
    fn drop(&mut self) {
        if self.committed {
            return;
        }
        if let Some(conn) = self.conn.take() {
            // A connection with an open transaction must not go back to the pool.
            debug!("write transaction abandoned, closing its connection");
            drop(conn.detach());
        }
    }
}
