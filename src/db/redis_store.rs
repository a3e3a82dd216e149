use std::collections::HashMap;
use std::time::Duration;

use async_trait::async_trait;
use bb8_redis::bb8::{self, Pool, PooledConnection, RunError};
use bb8_redis::redis::{self, RedisError};
use bb8_redis::RedisConnectionManager;

use super::{HashStore, StoreError};

impl From<RedisError> for StoreError {
    fn from(err: RedisError) -> Self {
        StoreError::Backend {
            message: err.to_string(),
        }
    }
}

impl From<RunError<RedisError>> for StoreError {
    fn from(err: RunError<RedisError>) -> Self {
        StoreError::Pool {
            message: err.to_string(),
        }
    }
}

/// KEYS: hash, index set. ARGV: marker field, marker value, member, then
/// field/value pairs.
const CREATE_IF_ABSENT_SCRIPT: &str = r#"
if redis.call('HSETNX', KEYS[1], ARGV[1], ARGV[2]) == 0 then
    return 0
end
for i = 4, #ARGV, 2 do
    redis.call('HSET', KEYS[1], ARGV[i], ARGV[i + 1])
end
redis.call('SADD', KEYS[2], ARGV[3])
return 1
"#;

/// KEYS: hash, index set. ARGV: member.
const DELETE_WITH_MEMBER_SCRIPT: &str = r#"
local removed = redis.call('DEL', KEYS[1])
return removed + redis.call('SREM', KEYS[2], ARGV[1])
"#;

/// Redis-backed store using a bb8 connection pool
#[derive(Clone)]
pub struct RedisStore {
    pool: Pool<RedisConnectionManager>,
}

impl RedisStore {
    /// Create a Redis connection pool and verify the server answers
    pub async fn connect(redis_url: &str, max_size: u32) -> Result<Self, StoreError> {
        tracing::info!("Creating Redis connection pool...");

        let manager = RedisConnectionManager::new(redis_url)?;
        let pool = bb8::Pool::builder()
            .max_size(max_size)
            .connection_timeout(Duration::from_secs(10))
            .idle_timeout(Some(Duration::from_secs(600)))
            .max_lifetime(Some(Duration::from_secs(1800)))
            .build(manager)
            .await?;

        let store = Self { pool };
        store.ping().await?;

        tracing::info!("Redis connection pool created successfully");

        Ok(store)
    }

    async fn conn(&self) -> Result<PooledConnection<'_, RedisConnectionManager>, StoreError> {
        Ok(self.pool.get().await?)
    }
}

#[async_trait]
impl HashStore for RedisStore {
    async fn hash_get(&self, key: &str, field: &str) -> Result<Option<String>, StoreError> {
        let mut conn = self.conn().await?;
        let value: Option<String> = redis::cmd("HGET")
            .arg(key)
            .arg(field)
            .query_async(&mut *conn)
            .await?;
        Ok(value)
    }

    async fn hash_set(&self, key: &str, field: &str, value: &str) -> Result<(), StoreError> {
        let mut conn = self.conn().await?;
        let _: i64 = redis::cmd("HSET")
            .arg(key)
            .arg(field)
            .arg(value)
            .query_async(&mut *conn)
            .await?;
        Ok(())
    }

    async fn hash_set_multiple(
        &self,
        key: &str,
        fields: &[(&str, &str)],
    ) -> Result<(), StoreError> {
        // HSET rejects an empty field list
        if fields.is_empty() {
            return Ok(());
        }

        let mut cmd = redis::cmd("HSET");
        cmd.arg(key);
        for (field, value) in fields {
            cmd.arg(*field).arg(*value);
        }

        let mut conn = self.conn().await?;
        let _: i64 = cmd.query_async(&mut *conn).await?;
        Ok(())
    }

    async fn create_hash_if_absent(
        &self,
        key: &str,
        marker: (&str, &str),
        fields: &[(&str, &str)],
        index_key: &str,
        member: &str,
    ) -> Result<bool, StoreError> {
        // Redis runs the script without interleaving other commands
        let mut cmd = redis::cmd("EVAL");
        cmd.arg(CREATE_IF_ABSENT_SCRIPT)
            .arg(2)
            .arg(key)
            .arg(index_key)
            .arg(marker.0)
            .arg(marker.1)
            .arg(member);
        for (field, value) in fields {
            cmd.arg(*field).arg(*value);
        }

        let mut conn = self.conn().await?;
        let created: i64 = cmd.query_async(&mut *conn).await?;
        Ok(created == 1)
    }

    async fn hash_get_all(&self, key: &str) -> Result<HashMap<String, String>, StoreError> {
        let mut conn = self.conn().await?;
        let fields: HashMap<String, String> = redis::cmd("HGETALL")
            .arg(key)
            .query_async(&mut *conn)
            .await?;
        Ok(fields)
    }

    async fn hash_increment(
        &self,
        key: &str,
        field: &str,
        delta: i64,
    ) -> Result<i64, StoreError> {
        let mut conn = self.conn().await?;
        let value: i64 = redis::cmd("HINCRBY")
            .arg(key)
            .arg(field)
            .arg(delta)
            .query_async(&mut *conn)
            .await?;
        Ok(value)
    }

    async fn delete_hash_and_member(
        &self,
        key: &str,
        index_key: &str,
        member: &str,
    ) -> Result<bool, StoreError> {
        let mut conn = self.conn().await?;
        let removed: i64 = redis::cmd("EVAL")
            .arg(DELETE_WITH_MEMBER_SCRIPT)
            .arg(2)
            .arg(key)
            .arg(index_key)
            .arg(member)
            .query_async(&mut *conn)
            .await?;
        Ok(removed > 0)
    }

    async fn set_add(&self, key: &str, member: &str) -> Result<bool, StoreError> {
        let mut conn = self.conn().await?;
        let added: i64 = redis::cmd("SADD")
            .arg(key)
            .arg(member)
            .query_async(&mut *conn)
            .await?;
        Ok(added == 1)
    }

    async fn set_members(&self, key: &str) -> Result<Vec<String>, StoreError> {
        let mut conn = self.conn().await?;
        let members: Vec<String> = redis::cmd("SMEMBERS")
            .arg(key)
            .query_async(&mut *conn)
            .await?;
        Ok(members)
    }

    async fn ping(&self) -> Result<(), StoreError> {
        let mut conn = self.conn().await?;
        let _: String = redis::cmd("PING").query_async(&mut *conn).await?;
        Ok(())
    }
}
