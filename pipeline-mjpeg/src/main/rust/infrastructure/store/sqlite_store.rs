use std::str::FromStr;

use async_trait::async_trait;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions};
use tokio::sync::Mutex;

use crate::domain::entities::Overlay;
use crate::domain::errors::{DomainError, Result};
use crate::domain::ports::OverlayStore;
use crate::domain::value_objects::{OverlayId, OverlayPayload};

const SCHEMA: &str = "CREATE TABLE IF NOT EXISTS overlays (
    seq INTEGER PRIMARY KEY AUTOINCREMENT,
    id TEXT NOT NULL UNIQUE,
    payload TEXT NOT NULL
)";

/// Overlay documents persisted as JSON text in SQLite.
///
/// Writes are serialized through `write_lock`: SQLite answers a second
/// read transaction upgrading to a writer with `SQLITE_BUSY` rather than waiting.
pub struct SqliteOverlayStore {
    pool: SqlitePool,
    write_lock: Mutex<()>,
}

impl SqliteOverlayStore {
    /// Connect and make sure the schema exists.
    pub async fn connect(database_url: &str) -> Result<Self> {
        let options = SqliteConnectOptions::from_str(database_url)
            .map_err(store_error)?
            .create_if_missing(true);

        // An in-memory database lives and dies with its single connection.
        let in_memory = database_url.contains(":memory:");
        let pool = SqlitePoolOptions::new()
            .max_connections(if in_memory { 1 } else { 5 })
            .idle_timeout(if in_memory { None } else { Some(std::time::Duration::from_secs(600)) })
            .max_lifetime(if in_memory { None } else { Some(std::time::Duration::from_secs(1800)) })
            .connect_with(options)
            .await
            .map_err(store_error)?;

        Self::from_pool(pool).await
    }

    pub async fn from_pool(pool: SqlitePool) -> Result<Self> {
        sqlx::query(SCHEMA)
            .execute(&pool)
            .await
            .map_err(store_error)?;
        Ok(Self {
            pool,
            write_lock: Mutex::new(()),
        })
    }

    pub async fn close(&self) {
        self.pool.close().await;
    }
}

#[async_trait]
impl OverlayStore for SqliteOverlayStore {
    async fn create(&self, payload: OverlayPayload) -> Result<OverlayId> {
        let id = OverlayId::generate();
        let _guard = self.write_lock.lock().await;
        sqlx::query("INSERT INTO overlays (id, payload) VALUES (?, ?)")
            .bind(id.to_string())
            .bind(payload.to_json_string())
            .execute(&self.pool)
            .await
            .map_err(store_error)?;
        Ok(id)
    }

    async fn list(&self) -> Result<Vec<Overlay>> {
        let rows = sqlx::query_as::<_, (String, String)>(
            "SELECT id, payload FROM overlays ORDER BY seq ASC",
        )
        .fetch_all(&self.pool)
        .await
        .map_err(store_error)?;

        rows.into_iter()
            .map(|(id, payload)| {
                let id = OverlayId::parse(&id)
                    .map_err(|_| DomainError::StoreFailed(format!("corrupt overlay id: {}", id)))?;
                Ok(Overlay::new(id, OverlayPayload::from_stored(&payload)?))
            })
            .collect()
    }

    async fn update(&self, id: OverlayId, patch: OverlayPayload) -> Result<()> {
        let _guard = self.write_lock.lock().await;
        let mut tx = self.pool.begin().await.map_err(store_error)?;

        let stored: Option<String> = sqlx::query_scalar("SELECT payload FROM overlays WHERE id = ?")
            .bind(id.to_string())
            .fetch_optional(&mut *tx)
            .await
            .map_err(store_error)?;

        let Some(raw) = stored else {
            return Err(DomainError::OverlayNotFound(id.to_string()));
        };

        let mut payload = OverlayPayload::from_stored(&raw)?;
        payload.merge(patch);

        sqlx::query("UPDATE overlays SET payload = ? WHERE id = ?")
            .bind(payload.to_json_string())
            .bind(id.to_string())
            .execute(&mut *tx)
            .await
            .map_err(store_error)?;

        tx.commit().await.map_err(store_error)
    }

    async fn delete(&self, id: OverlayId) -> Result<bool> {
        let _guard = self.write_lock.lock().await;
        let result = sqlx::query("DELETE FROM overlays WHERE id = ?")
            .bind(id.to_string())
            .execute(&self.pool)
            .await
            .map_err(store_error)?;
        Ok(result.rows_affected() > 0)
    }

    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1")
            .execute(&self.pool)
            .await
            .map(|_| ())
            .map_err(store_error)
    }
}

fn store_error(err: sqlx::Error) -> DomainError {
    DomainError::StoreFailed(err.to_string())
}
