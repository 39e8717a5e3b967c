use chrono::{DateTime, Utc};
use rusqlite::{params, OptionalExtension};

use crate::api::TokenSource;
use crate::error::ClientResult;
use crate::state::DbPool;

/// The signed-in user.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub token: String,
    pub email: String,
    pub signed_in_at: DateTime<Utc>,
}

/// Persists the single active session in the local database.
#[derive(Clone)]
pub struct SessionStore {
    pool: DbPool,
}

impl SessionStore {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Replace any existing session.
    pub fn save(&self, token: &str, email: &str) -> ClientResult<Session> {
        let session = Session {
            token: token.to_string(),
            email: email.to_string(),
            signed_in_at: Utc::now(),
        };

        let conn = self.pool.get()?;
        conn.execute(
            "INSERT INTO session (slot, token, email, signed_in_at) VALUES (1, ?1, ?2, ?3)
             ON CONFLICT(slot) DO UPDATE SET
               token = excluded.token,
               email = excluded.email,
               signed_in_at = excluded.signed_in_at",
            params![session.token, session.email, session.signed_in_at.to_rfc3339()],
        )?;

        Ok(session)
    }

    pub fn current(&self) -> ClientResult<Option<Session>> {
        let conn = self.pool.get()?;
        let row: Option<(String, String, String)> = conn
            .query_row(
                "SELECT token, email, signed_in_at FROM session WHERE slot = 1",
                [],
                |row| Ok((row.get(0)?, row.get(1)?, row.get(2)?)),
            )
            .optional()?;

        Ok(row.map(|(token, email, signed_in_at)| Session {
            token,
            email,
            signed_in_at: DateTime::parse_from_rfc3339(&signed_in_at)
                .map(|t| t.with_timezone(&Utc))
                .unwrap_or_else(|e| {
                    tracing::warn!(value = %signed_in_at, "Unreadable sign-in time: {}", e);
                    Utc::now()
                }),
        }))
    }

    /// Sign out. Mirrored recipes are kept for the next sign-in.
    pub fn clear(&self) -> ClientResult<()> {
        let conn = self.pool.get()?;
        conn.execute("DELETE FROM session", [])?;
        Ok(())
    }

    pub fn email(&self) -> ClientResult<Option<String>> {
        Ok(self.current()?.map(|s| s.email))
    }
}

impl TokenSource for SessionStore {
    fn token(&self) -> Option<String> {
        match self.current() {
            Ok(session) => session.map(|s| s.token),
            Err(e) => {
                tracing::warn!("Could not read session token: {}", e);
                None
            }
        }
    }
}
