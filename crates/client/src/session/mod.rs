//! Session lifecycle management.
//!
//! One [`SessionManager`] owns the session: it is handed already-issued
//! credentials by the auth exchange, mirrors them into the persistent store,
//! and arms a one-shot watcher that logs the session out the instant the
//! refresh token expires. The rest of the application sees the session only
//! through read-only snapshots and the `login`/`logout` operations.
//!
//! `logout` is the single exit path - explicit user logout, forced logout on
//! refresh failure, and expiry-triggered logout all funnel through it.

pub mod store;
pub mod token;

use std::sync::{Arc, Mutex, RwLock};

use chrono::Utc;
use thiserror::Error;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::api::types::{IssuedCredentials, UserProfile};
use store::{SessionStore, keys};

/// Why a session ended.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogoutReason {
    /// The user asked to log out.
    UserRequest,
    /// The refresh token reached its expiry instant.
    Expired,
    /// The refresh endpoint rejected or failed the exchange.
    RefreshFailed,
    /// A 401 arrived and no refresh token was stored.
    MissingRefreshToken,
}

impl std::fmt::Display for LogoutReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UserRequest => write!(f, "user request"),
            Self::Expired => write!(f, "session expired"),
            Self::RefreshFailed => write!(f, "token refresh failed"),
            Self::MissingRefreshToken => write!(f, "no refresh token"),
        }
    }
}

/// Read-only session snapshot broadcast on every transition.
#[derive(Debug, Clone)]
pub enum SessionEvent {
    /// No session yet (initial state before restore or login).
    None,
    /// A session is active.
    LoggedIn {
        /// The signed-in user.
        user: UserProfile,
    },
    /// The session ended. Subscribers route the user back to login.
    LoggedOut {
        /// What ended it.
        reason: LogoutReason,
    },
}

/// Errors raised by session operations.
#[derive(Debug, Error)]
pub enum SessionError {
    /// The user profile could not be serialized for storage.
    #[error("serializing user profile: {0}")]
    Serialize(#[from] serde_json::Error),
}

#[derive(Debug, Clone)]
struct ActiveSession {
    user: UserProfile,
}

/// Owner of the in-memory session state and the persistent session keys.
///
/// Cheaply cloneable via `Arc`; every clone shares the same session.
#[derive(Clone)]
pub struct SessionManager {
    inner: Arc<SessionManagerInner>,
}

struct SessionManagerInner {
    store: Arc<dyn SessionStore>,
    state: RwLock<Option<ActiveSession>>,
    watcher: Mutex<Option<JoinHandle<()>>>,
    events: watch::Sender<SessionEvent>,
}

impl SessionManager {
    /// Create a session manager over the given store. No state is restored;
    /// call [`Self::restore_on_startup`] for that.
    #[must_use]
    pub fn new(store: Arc<dyn SessionStore>) -> Self {
        let (events, _) = watch::channel(SessionEvent::None);
        Self {
            inner: Arc::new(SessionManagerInner {
                store,
                state: RwLock::new(None),
                watcher: Mutex::new(None),
                events,
            }),
        }
    }

    /// Install already-issued credentials as the active session.
    ///
    /// Writes all three session keys to the store, replaces in-memory state,
    /// and re-arms the expiry watcher (cancelling any previous one). Makes no
    /// network call of its own.
    ///
    /// # Errors
    ///
    /// Returns an error if the user profile cannot be serialized.
    pub fn login(&self, credentials: IssuedCredentials) -> Result<(), SessionError> {
        let user_json = serde_json::to_string(&credentials.user)?;

        self.inner.store.set(keys::ACCESS, &credentials.access);
        self.inner.store.set(keys::REFRESH, &credentials.refresh);
        self.inner.store.set(keys::USER, &user_json);

        if let Ok(mut state) = self.inner.state.write() {
            *state = Some(ActiveSession {
                user: credentials.user.clone(),
            });
        }

        // Broadcast before arming: a watcher firing immediately (already
        // expired token) must leave LoggedOut as the final snapshot.
        self.inner.events.send_replace(SessionEvent::LoggedIn {
            user: credentials.user,
        });
        self.arm_watcher(&credentials.refresh);

        tracing::info!("session established");
        Ok(())
    }

    /// End the session: cancel the watcher, clear the session keys and
    /// in-memory state synchronously, and broadcast the logout.
    pub fn logout(&self, reason: LogoutReason) {
        if let Ok(mut watcher) = self.inner.watcher.lock()
            && let Some(handle) = watcher.take()
        {
            handle.abort();
        }

        self.inner.store.remove(keys::ACCESS);
        self.inner.store.remove(keys::REFRESH);
        self.inner.store.remove(keys::USER);

        if let Ok(mut state) = self.inner.state.write() {
            *state = None;
        }

        self.inner
            .events
            .send_replace(SessionEvent::LoggedOut { reason });

        tracing::info!(%reason, "session ended");
    }

    /// Rehydrate a previously stored session on application start.
    ///
    /// An expired or undecodable stored refresh token is treated as absent:
    /// the stale keys are dropped and the session stays logged out. Returns
    /// whether a session was restored.
    pub fn restore_on_startup(&self) -> bool {
        let Some(refresh) = self.inner.store.get(keys::REFRESH) else {
            return false;
        };

        if token::is_expired(&refresh) {
            tracing::warn!("stored refresh token expired or undecodable, discarding session");
            self.inner.store.remove(keys::ACCESS);
            self.inner.store.remove(keys::REFRESH);
            self.inner.store.remove(keys::USER);
            return false;
        }

        let user: UserProfile = match self
            .inner
            .store
            .get(keys::USER)
            .map(|raw| serde_json::from_str(&raw))
        {
            Some(Ok(user)) => user,
            Some(Err(e)) => {
                tracing::warn!(error = %e, "stored user profile unreadable, discarding session");
                self.inner.store.remove(keys::ACCESS);
                self.inner.store.remove(keys::REFRESH);
                self.inner.store.remove(keys::USER);
                return false;
            }
            None => {
                self.inner.store.remove(keys::ACCESS);
                self.inner.store.remove(keys::REFRESH);
                return false;
            }
        };

        if let Ok(mut state) = self.inner.state.write() {
            *state = Some(ActiveSession { user: user.clone() });
        }

        self.inner
            .events
            .send_replace(SessionEvent::LoggedIn { user });
        self.arm_watcher(&refresh);

        tracing::info!("session restored from store");
        true
    }

    /// Persist a freshly issued access token (after a successful refresh).
    pub fn update_access_token(&self, access: &str) {
        self.inner.store.set(keys::ACCESS, access);
    }

    /// The stored access token, if any. Read from the persistent store so the
    /// gateway always attaches what is actually persisted.
    #[must_use]
    pub fn access_token(&self) -> Option<String> {
        self.inner.store.get(keys::ACCESS)
    }

    /// The stored refresh token, if any.
    #[must_use]
    pub fn refresh_token(&self) -> Option<String> {
        self.inner.store.get(keys::REFRESH)
    }

    /// The signed-in user, if any.
    #[must_use]
    pub fn current_user(&self) -> Option<UserProfile> {
        self.inner
            .state
            .read()
            .ok()
            .and_then(|state| state.as_ref().map(|s| s.user.clone()))
    }

    /// Whether a session is active.
    #[must_use]
    pub fn is_logged_in(&self) -> bool {
        self.inner
            .state
            .read()
            .is_ok_and(|state| state.is_some())
    }

    /// Subscribe to read-only session snapshots.
    #[must_use]
    pub fn subscribe(&self) -> watch::Receiver<SessionEvent> {
        self.inner.events.subscribe()
    }

    /// Arm the refresh-expiry watcher, replacing any previously scheduled one.
    ///
    /// The timer fires exactly at the refresh token's embedded expiry, or
    /// immediately when the token is already past it or undecodable.
    fn arm_watcher(&self, refresh: &str) {
        let delay = match token::expiry(refresh) {
            Ok(expiry) => expiry
                .signed_duration_since(Utc::now())
                .to_std()
                .unwrap_or(std::time::Duration::ZERO),
            Err(e) => {
                tracing::warn!(error = %e, "refresh token expiry undecodable, expiring now");
                std::time::Duration::ZERO
            }
        };

        let manager = self.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            tracing::info!("refresh token expired");
            manager.logout(LogoutReason::Expired);
        });

        if let Ok(mut watcher) = self.inner.watcher.lock()
            && let Some(previous) = watcher.replace(handle)
        {
            previous.abort();
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use base64::Engine as _;
    use base64::engine::general_purpose::URL_SAFE_NO_PAD;
    use store::MemoryStore;

    fn jwt_expiring_at(exp: i64) -> String {
        let header = URL_SAFE_NO_PAD.encode(br#"{"alg":"HS256","typ":"JWT"}"#);
        let body = URL_SAFE_NO_PAD.encode(
            serde_json::to_vec(&serde_json::json!({ "exp": exp })).unwrap(),
        );
        format!("{header}.{body}.sig")
    }

    fn credentials(refresh: &str) -> IssuedCredentials {
        IssuedCredentials {
            access: "access-1".to_string(),
            refresh: refresh.to_string(),
            user: serde_json::from_value(serde_json::json!({ "id": 7, "name": "Asha" })).unwrap(),
        }
    }

    fn future_exp() -> i64 {
        Utc::now().timestamp() + 3600
    }

    #[tokio::test]
    async fn test_login_persists_all_three_keys() {
        let store = Arc::new(MemoryStore::new());
        let session = SessionManager::new(store.clone());

        session.login(credentials(&jwt_expiring_at(future_exp()))).unwrap();

        assert_eq!(store.get(keys::ACCESS), Some("access-1".to_string()));
        assert!(store.get(keys::REFRESH).is_some());
        let user: UserProfile =
            serde_json::from_str(&store.get(keys::USER).unwrap()).unwrap();
        assert_eq!(user.id.as_i32(), 7);
        assert!(session.is_logged_in());
    }

    #[tokio::test]
    async fn test_logout_clears_session_keys_and_state() {
        let store = Arc::new(MemoryStore::new());
        let session = SessionManager::new(store.clone());
        session.login(credentials(&jwt_expiring_at(future_exp()))).unwrap();

        session.logout(LogoutReason::UserRequest);

        assert_eq!(store.get(keys::ACCESS), None);
        assert_eq!(store.get(keys::REFRESH), None);
        assert_eq!(store.get(keys::USER), None);
        assert!(!session.is_logged_in());
        assert!(matches!(
            *session.subscribe().borrow(),
            SessionEvent::LoggedOut {
                reason: LogoutReason::UserRequest
            }
        ));
    }

    #[tokio::test]
    async fn test_restore_with_valid_refresh_token() {
        let store = Arc::new(MemoryStore::new());
        {
            let session = SessionManager::new(store.clone());
            session.login(credentials(&jwt_expiring_at(future_exp()))).unwrap();
        }

        let session = SessionManager::new(store);
        assert!(session.restore_on_startup());
        assert!(session.is_logged_in());
        assert_eq!(session.current_user().unwrap().id.as_i32(), 7);
    }

    #[tokio::test]
    async fn test_restore_fails_closed_on_expired_refresh_token() {
        let store = Arc::new(MemoryStore::new());
        store.set(keys::ACCESS, "stale-access");
        store.set(keys::REFRESH, &jwt_expiring_at(1_000));
        store.set(keys::USER, r#"{"id":7}"#);

        let session = SessionManager::new(store.clone());
        assert!(!session.restore_on_startup());
        assert!(!session.is_logged_in());
        // Stale credentials are dropped, not left for a later accidental read
        assert_eq!(store.get(keys::ACCESS), None);
        assert_eq!(store.get(keys::REFRESH), None);
    }

    #[tokio::test]
    async fn test_restore_fails_closed_on_undecodable_refresh_token() {
        let store = Arc::new(MemoryStore::new());
        store.set(keys::REFRESH, "corrupted-token");
        store.set(keys::USER, r#"{"id":7}"#);

        let session = SessionManager::new(store.clone());
        assert!(!session.restore_on_startup());
        assert!(!session.is_logged_in());
        assert_eq!(store.get(keys::REFRESH), None);
    }

    #[tokio::test(start_paused = true)]
    async fn test_watcher_logs_out_at_expiry() {
        let store = Arc::new(MemoryStore::new());
        let session = SessionManager::new(store);
        session.login(credentials(&jwt_expiring_at(Utc::now().timestamp() + 2))).unwrap();
        assert!(session.is_logged_in());

        // Past the expiry instant the watcher must have fired
        tokio::time::sleep(std::time::Duration::from_secs(5)).await;
        assert!(!session.is_logged_in());
        assert!(matches!(
            *session.subscribe().borrow(),
            SessionEvent::LoggedOut {
                reason: LogoutReason::Expired
            }
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_second_login_cancels_first_watcher() {
        let store = Arc::new(MemoryStore::new());
        let session = SessionManager::new(store);

        session.login(credentials(&jwt_expiring_at(Utc::now().timestamp() + 2))).unwrap();
        session.login(credentials(&jwt_expiring_at(Utc::now().timestamp() + 60))).unwrap();

        // Past the first token's expiry: still logged in, so the first
        // watcher never fired
        tokio::time::sleep(std::time::Duration::from_secs(10)).await;
        assert!(session.is_logged_in());

        // Past the second token's expiry: exactly the second watcher fires
        tokio::time::sleep(std::time::Duration::from_secs(60)).await;
        assert!(!session.is_logged_in());
    }
}
