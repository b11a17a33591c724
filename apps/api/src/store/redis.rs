use anyhow::{Context, Result};
use async_trait::async_trait;
use redis::aio::MultiplexedConnection;
use redis::AsyncCommands;
use tracing::info;

use super::Persistence;

/// Each key is stored as a plain Redis string, prefixed with the service name.
pub struct RedisPersistence {
    conn: MultiplexedConnection,
}

impl RedisPersistence {
    pub async fn connect(redis_url: &str) -> Result<Self> {
        let client = redis::Client::open(redis_url).context("Invalid REDIS_URL")?;
        let conn = client
            .get_multiplexed_async_connection()
            .await
            .context("Failed to connect to Redis")?;
        info!("Redis connection established");
        Ok(Self { conn })
    }
}

fn redis_key(key: &str) -> String {
    format!("assessor:{key}")
}

#[async_trait]
impl Persistence for RedisPersistence {
    async fn load(&self, key: &str) -> Result<Option<String>> {
        let mut conn = self.conn.clone();
        let value: Option<String> = conn
            .get(redis_key(key))
            .await
            .with_context(|| format!("Failed to read {key} from Redis"))?;
        Ok(value)
    }

    async fn save(&self, key: &str, value: &str) -> Result<()> {
        let mut conn = self.conn.clone();
        conn.set::<_, _, ()>(redis_key(key), value)
            .await
            .with_context(|| format!("Failed to write {key} to Redis"))?;
        Ok(())
    }
}
