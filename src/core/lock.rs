//! Per-record run locks so overlapping monitor runs never act on the same
//! signal twice.
//!
//! Every acquisition carries its own random token; release only removes the
//! lock while that token still owns it, so a run that outlived its TTL cannot
//! free a lock taken since by another run.

use async_trait::async_trait;
use rand::Rng;
use redis::aio::ConnectionManager;
use std::collections::HashMap;
use std::fmt;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;
use tracing::debug;

/// Proof of ownership returned by a successful acquisition.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct LockToken(String);

impl LockToken {
    fn generate() -> Self {
        let bits: u128 = rand::thread_rng().gen();
        Self(format!("{:032x}", bits))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for LockToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[async_trait]
pub trait RunLock: Send + Sync {
    /// Take `key` for at most `ttl`. `Ok(None)` when someone else holds it.
    async fn try_acquire(
        &self,
        key: &str,
        ttl: Duration,
    ) -> Result<Option<LockToken>, Box<dyn std::error::Error + Send + Sync>>;

    /// Release `key` if `token` still owns it. Returns whether it was released.
    async fn release(
        &self,
        key: &str,
        token: &LockToken,
    ) -> Result<bool, Box<dyn std::error::Error + Send + Sync>>;
}

/// Lock table local to this process.
#[derive(Default)]
pub struct LocalRunLock {
    held: Mutex<HashMap<String, (LockToken, Instant)>>,
}

impl LocalRunLock {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl RunLock for LocalRunLock {
    async fn try_acquire(
        &self,
        key: &str,
        ttl: Duration,
    ) -> Result<Option<LockToken>, Box<dyn std::error::Error + Send + Sync>> {
        let mut held = self.held.lock().await;
        let now = Instant::now();
        if let Some((_, expires_at)) = held.get(key) {
            if *expires_at > now {
                return Ok(None);
            }
        }
        let token = LockToken::generate();
        held.insert(key.to_string(), (token.clone(), now + ttl));
        Ok(Some(token))
    }

    async fn release(
        &self,
        key: &str,
        token: &LockToken,
    ) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        let mut held = self.held.lock().await;
        match held.get(key) {
            Some((owner, _)) if owner == token => {
                held.remove(key);
                Ok(true)
            }
            _ => {
                debug!(key = %key, "Run lock {} no longer owned, left in place", key);
                Ok(false)
            }
        }
    }
}

/// Deletes the key only while it still holds the caller's token.
const RELEASE_SCRIPT: &str = r#"
if redis.call("GET", KEYS[1]) == ARGV[1] then
    return redis.call("DEL", KEYS[1])
else
    return 0
end
"#;

/// `SET key token NX PX ttl` against Redis, shared by every worker instance.
pub struct RedisRunLock {
    connection: ConnectionManager,
    prefix: String,
    release_script: redis::Script,
}

impl RedisRunLock {
    pub async fn connect(url: &str) -> Result<Self, Box<dyn std::error::Error + Send + Sync>> {
        let client = redis::Client::open(url)?;
        let connection = client.get_connection_manager().await.map_err(|e| {
            Box::new(std::io::Error::new(
                std::io::ErrorKind::ConnectionRefused,
                format!("Failed to connect to Redis for run locks: {}", e),
            )) as Box<dyn std::error::Error + Send + Sync>
        })?;
        Ok(Self::new(connection))
    }

    pub fn new(connection: ConnectionManager) -> Self {
        Self {
            connection,
            prefix: "candlescope:lock:".to_string(),
            release_script: redis::Script::new(RELEASE_SCRIPT),
        }
    }

    fn key(&self, key: &str) -> String {
        format!("{}{}", self.prefix, key)
    }
}

#[async_trait]
impl RunLock for RedisRunLock {
    async fn try_acquire(
        &self,
        key: &str,
        ttl: Duration,
    ) -> Result<Option<LockToken>, Box<dyn std::error::Error + Send + Sync>> {
        let mut conn = self.connection.clone();
        let ttl_ms = u64::try_from(ttl.as_millis()).unwrap_or(u64::MAX).max(1);
        let token = LockToken::generate();
        let reply: Option<String> = redis::cmd("SET")
            .arg(self.key(key))
            .arg(token.as_str())
            .arg("NX")
            .arg("PX")
            .arg(ttl_ms)
            .query_async(&mut conn)
            .await?;

        let acquired = reply.is_some();
        debug!(key = %key, acquired = acquired, "Run lock {}: acquired={}", key, acquired);
        Ok(acquired.then_some(token))
    }

    async fn release(
        &self,
        key: &str,
        token: &LockToken,
    ) -> Result<bool, Box<dyn std::error::Error + Send + Sync>> {
        let mut conn = self.connection.clone();
        let deleted: i64 = self
            .release_script
            .key(self.key(key))
            .arg(token.as_str())
            .invoke_async(&mut conn)
            .await?;
        if deleted == 0 {
            debug!(key = %key, "Run lock {} no longer owned, left in place", key);
        }
        Ok(deleted > 0)
    }
}
