//! Server-side sessions addressed by an opaque cookie value.
//!
//! The cookie only carries a random identifier; the [`Session`] itself lives in the
//! cache under `session:<id>` and expires with the cache entry. Clearing a session
//! only tells the browser to forget the cookie; the entry is left to expire.

use crate::error::Error;
use crate::UserId;
use cache::{Cache, CacheExt};
use cookie::{Cookie, CookieJar};
use log::*;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;

/// Name of the cookie holding the session identifier.
pub const SESSION_COOKIE: &str = "session";

/// Default session lifetime: 720 hours (30 days).
pub const DEFAULT_SESSION_EXPIRATION: Duration = Duration::from_secs(60 * 60 * 720);

const SESSION_KEY_PREFIX: &str = "session:";

/// What the server remembers about a logged-in browser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub user_id: UserId,
}

impl Session {
    pub fn new(user_id: UserId) -> Self {
        Self { user_id }
    }
}

#[derive(Clone)]
pub struct SessionManager {
    cache: Arc<dyn Cache>,
    expiration: Duration,
    secure: bool,
}

impl SessionManager {
    /// `dev_mode` drops the `Secure` attribute so cookies work over plain HTTP locally.
    pub fn new(cache: Arc<dyn Cache>, expiration: Duration, dev_mode: bool) -> Self {
        Self {
            cache,
            expiration,
            secure: !dev_mode,
        }
    }

    pub fn expiration(&self) -> Duration {
        self.expiration
    }

    /// Store `session` under a fresh random identifier and return the cookie that
    /// binds the browser to it.
    pub async fn create_session(&self, session: &Session) -> Result<Cookie<'static>, Error> {
        let session_id = uuid::Uuid::new_v4().to_string();

        self.cache
            .set(&session_key(&session_id), session, self.expiration)
            .await
            .map_err(|e| Error::from(e).context("failed to store session in backend"))?;

        debug!("Created session for user {}", session.user_id);

        let max_age = i64::try_from(self.expiration.as_secs()).unwrap_or(i64::MAX);
        Ok(self.cookie(session_id, time::Duration::seconds(max_age)))
    }

    /// Load the session referenced by the request's cookies.
    ///
    /// Returns `Ok(None)` when the browser has no session cookie at all, and an error
    /// when it has one that can't be loaded, so callers can tell "never logged in"
    /// apart from a store failure or an expired session.
    pub async fn read_session(&self, cookies: &CookieJar) -> Result<Option<Session>, Error> {
        let Some(cookie) = cookies.get(SESSION_COOKIE) else {
            return Ok(None);
        };

        let session = self
            .cache
            .get::<Session>(&session_key(cookie.value()))
            .await
            .map_err(|e| Error::from(e).context("failed to load session from backend"))?;

        Ok(Some(session))
    }

    /// Replace the stored session for the request's cookie.
    ///
    /// The entry keeps its key and is written with the configured expiration, the
    /// same policy as creation. The browser cookie is not re-issued.
    pub async fn update_session(
        &self,
        cookies: &CookieJar,
        session: &Session,
    ) -> Result<(), Error> {
        let Some(cookie) = cookies.get(SESSION_COOKIE) else {
            return Err(Error::no_active_session());
        };

        self.cache
            .set(&session_key(cookie.value()), session, self.expiration)
            .await
            .map_err(|e| Error::from(e).context("failed to update session in backend"))?;

        Ok(())
    }

    /// Cookie instructing the browser to delete its session cookie.
    pub fn clear_session(&self) -> Cookie<'static> {
        self.cookie(String::new(), time::Duration::seconds(-1))
    }

    fn cookie(&self, value: String, max_age: time::Duration) -> Cookie<'static> {
        Cookie::build((SESSION_COOKIE, value))
            .http_only(true)
            .path("/")
            .secure(self.secure)
            .max_age(max_age)
            .build()
    }
}

fn session_key(session_id: &str) -> String {
    format!("{SESSION_KEY_PREFIX}{session_id}")
}
