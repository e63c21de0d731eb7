use redis::{AsyncCommands, aio::ConnectionManager};

use crate::middleware::AdminSession;

/// Seconds a blocklist entry lives: 5 hours from the triggering attempt.
pub const BLOCK_DURATION_SECS: u64 = 5 * 60 * 60;

/// Window over which failed login attempts accumulate before expiring.
pub const ATTEMPT_WINDOW_SECS: i64 = 5 * 60 * 60;

/// Redis wrapper for the pieces of state that live outside PostgreSQL:
/// admin sessions, the per-IP failed-login counter, and the blocklist.
///
/// The counter uses a single atomic INCR per failure, so concurrent attempts
/// from one IP can never under-count the way the old file-based counters
/// could.
#[derive(Clone)]
pub struct RedisClient {
    pub conn: ConnectionManager,
}

impl RedisClient {
    pub fn new(conn: ConnectionManager) -> Self {
        Self { conn }
    }

    // ------------------------------------------------------------------
    // Sessions
    // ------------------------------------------------------------------

    pub async fn save_session(
        &self,
        session_id: &str,
        session: &AdminSession,
        maxage_secs: i64,
    ) -> redis::RedisResult<()> {
        let key = format!("session:{}", session_id);
        let value = serde_json::to_string(session).map_err(|e| {
            redis::RedisError::from((redis::ErrorKind::TypeError, "session encode", e.to_string()))
        })?;
        let mut conn = self.conn.clone();
        conn.set_ex(key, value, maxage_secs as u64).await
    }

    /// Fetch a session by id. A value that fails to decode is treated as
    /// absent rather than surfacing a 500 to every request carrying it.
    pub async fn get_session(
        &self,
        session_id: &str,
    ) -> redis::RedisResult<Option<AdminSession>> {
        let key = format!("session:{}", session_id);
        let mut conn = self.conn.clone();
        let value: Option<String> = conn.get(key).await?;

        Ok(value.and_then(|v| serde_json::from_str(&v).ok()))
    }

    pub async fn delete_session(&self, session_id: &str) -> redis::RedisResult<()> {
        let key = format!("session:{}", session_id);
        let mut conn = self.conn.clone();
        conn.del(key).await
    }

    // ------------------------------------------------------------------
    // Login attempt counter
    // ------------------------------------------------------------------

    /// Record one failed attempt for this IP and return the running total.
    /// The window TTL is set when the key is first created.
    pub async fn incr_login_attempts(&self, ip: &str) -> redis::RedisResult<i64> {
        let key = format!("login_attempts:{}", ip);
        let mut conn = self.conn.clone();
        let attempts: i64 = conn.incr(&key, 1).await?;
        if attempts == 1 {
            let _: () = conn.expire(&key, ATTEMPT_WINDOW_SECS).await?;
        }
        Ok(attempts)
    }

    pub async fn clear_login_attempts(&self, ip: &str) -> redis::RedisResult<()> {
        let key = format!("login_attempts:{}", ip);
        let mut conn = self.conn.clone();
        conn.del(key).await
    }

    // ------------------------------------------------------------------
    // Blocklist
    // ------------------------------------------------------------------

    /// Block both identity components. Either one matching later is enough
    /// to reject, so a client can't dodge the block by rotating just its IP
    /// or just its headers.
    pub async fn block_client(&self, ip: &str, fingerprint: &str) -> redis::RedisResult<()> {
        let mut conn = self.conn.clone();
        let _: () = conn
            .set_ex(format!("block:ip:{}", ip), 1, BLOCK_DURATION_SECS)
            .await?;
        conn.set_ex(format!("block:fp:{}", fingerprint), 1, BLOCK_DURATION_SECS)
            .await
    }

    pub async fn is_blocked(&self, ip: &str, fingerprint: &str) -> redis::RedisResult<bool> {
        let mut conn = self.conn.clone();
        let ip_blocked: bool = conn.exists(format!("block:ip:{}", ip)).await?;
        if ip_blocked {
            return Ok(true);
        }
        conn.exists(format!("block:fp:{}", fingerprint)).await
    }
}
