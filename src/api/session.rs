//! Read-once result hand-off between the form POST and the results page
//!
//! The POST handler stores a [`Flash`] under the caller's session id and
//! redirects; the results page takes it out again. Entries live in memory and
//! expire after the configured TTL.

use axum_extra::extract::cookie::{Cookie, CookieJar, SameSite};
use chrono::{DateTime, Duration, Utc};
use std::collections::HashMap;
use std::sync::Arc;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::domain::SolveReport;

#[derive(Debug, Clone, PartialEq)]
pub enum Flash {
    Results(Box<SolveReport>),
    Error(String),
}

#[derive(Debug, Clone)]
struct FlashEntry {
    flash: Flash,
    stored_at: DateTime<Utc>,
}

#[derive(Debug, Clone)]
pub struct FlashStore {
    entries: Arc<RwLock<HashMap<Uuid, FlashEntry>>>,
    ttl: Duration,
}

impl FlashStore {
    pub fn new(ttl: std::time::Duration) -> Self {
        Self {
            entries: Arc::new(RwLock::new(HashMap::new())),
            ttl: Duration::from_std(ttl).unwrap_or_else(|_| Duration::minutes(10)),
        }
    }

    /// Replaces any pending flash of the session
    pub async fn put(&self, session: Uuid, flash: Flash) {
        self.put_at(session, flash, Utc::now()).await
    }

    pub async fn take(&self, session: Uuid) -> Option<Flash> {
        self.take_at(session, Utc::now()).await
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    pub async fn is_empty(&self) -> bool {
        self.entries.read().await.is_empty()
    }

    async fn put_at(&self, session: Uuid, flash: Flash, now: DateTime<Utc>) {
        let mut entries = self.entries.write().await;
        let before = entries.len();
        entries.retain(|_, e| now - e.stored_at <= self.ttl);
        let purged = before - entries.len();
        if purged > 0 {
            tracing::debug!(purged, "expired flash entries removed");
        }
        entries.insert(session, FlashEntry { flash, stored_at: now });
    }

    async fn take_at(&self, session: Uuid, now: DateTime<Utc>) -> Option<Flash> {
        let entry = self.entries.write().await.remove(&session)?;
        (now - entry.stored_at <= self.ttl).then_some(entry.flash)
    }
}

/// Session id carried by the cookie, if it parses
pub fn session_id(jar: &CookieJar, cookie_name: &str) -> Option<Uuid> {
    jar.get(cookie_name)
        .and_then(|c| Uuid::parse_str(c.value()).ok())
}

/// Returns the existing session id or issues a new cookie for one
pub fn ensure_session(jar: CookieJar, cookie_name: &str) -> (CookieJar, Uuid) {
    if let Some(id) = session_id(&jar, cookie_name) {
        return (jar, id);
    }
    let id = Uuid::new_v4();
    let cookie = Cookie::build((cookie_name.to_string(), id.to_string()))
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax);
    (jar.add(cookie), id)
}
