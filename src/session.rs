//! Session store
//!
//! Owns the bearer token and the cached user profile. The two are written
//! and cleared together; a store holding only one of them is corrupt and is
//! wiped on the next read. Observers are called synchronously after every
//! change, before the mutating call returns.

use crate::error::{ClientError, Result};
use crate::models::UserProfile;
use crate::storage::LocalStore;
use std::sync::{Arc, Mutex};

pub const TOKEN_KEY: &str = "token";
pub const USER_KEY: &str = "user";

/// A logged-in identity: token and profile, always together
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub token: String,
    pub user: UserProfile,
}

impl Session {
    pub fn is_admin(&self) -> bool {
        self.user.is_admin()
    }
}

/// Receives every session change
pub trait SessionObserver: Send + Sync {
    fn session_changed(&self, session: Option<&Session>);
}

pub struct SessionStore {
    store: LocalStore,
    observers: Mutex<Vec<Arc<dyn SessionObserver>>>,
}

impl SessionStore {
    pub fn new(store: LocalStore) -> Self {
        SessionStore {
            store,
            observers: Mutex::new(Vec::new()),
        }
    }

    /// Session store backed by an in-memory database
    pub fn in_memory() -> Result<Self> {
        Ok(Self::new(LocalStore::in_memory()?))
    }

    pub fn subscribe(&self, observer: Arc<dyn SessionObserver>) {
        if let Ok(mut observers) = self.observers.lock() {
            observers.push(observer);
        }
    }

    /// Persist a new session, replacing any previous one.
    ///
    /// A blank token is refused and leaves the store empty.
    pub fn set_session(&self, token: &str, user: UserProfile) -> Result<()> {
        let token = token.trim();
        if token.is_empty() {
            log::warn!("Refusing to store a session without a token");
            self.clear_session()?;
            return Err(ClientError::Validation(
                "Login failed: No token received".to_string(),
            ));
        }

        let user_json = serde_json::to_string(&user)?;
        self.store
            .set_many(&[(TOKEN_KEY, token), (USER_KEY, &user_json)])?;
        log::debug!("Session stored for {}", user.email);

        let session = Session {
            token: token.to_string(),
            user,
        };
        self.notify(Some(&session));
        Ok(())
    }

    /// Current session, if a complete and readable one is stored
    pub fn current(&self) -> Option<Session> {
        let token = self.read(TOKEN_KEY);
        let user = self.read(USER_KEY);

        match (token, user) {
            (None, None) => None,
            (Some(token), Some(user_json)) => {
                match serde_json::from_str::<UserProfile>(&user_json) {
                    Ok(user) if !token.trim().is_empty() => Some(Session { token, user }),
                    Ok(_) => {
                        self.discard("blank token");
                        None
                    }
                    Err(e) => {
                        self.discard(&format!("unreadable profile: {}", e));
                        None
                    }
                }
            }
            _ => {
                self.discard("partial session");
                None
            }
        }
    }

    pub fn token(&self) -> Option<String> {
        self.current().map(|s| s.token)
    }

    pub fn user(&self) -> Option<UserProfile> {
        self.current().map(|s| s.user)
    }

    pub fn is_admin(&self) -> bool {
        self.user().map(|u| u.is_admin()).unwrap_or(false)
    }

    pub fn clear_session(&self) -> Result<()> {
        self.store.remove_many(&[TOKEN_KEY, USER_KEY])?;
        log::debug!("Session cleared");
        self.notify(None);
        Ok(())
    }

    fn read(&self, key: &str) -> Option<String> {
        match self.store.get(key) {
            Ok(value) => value,
            Err(e) => {
                log::error!("Failed to read {} from local storage: {}", key, e);
                None
            }
        }
    }

    fn discard(&self, reason: &str) {
        log::warn!("Discarding stored session: {}", reason);
        if let Err(e) = self.clear_session() {
            log::error!("Failed to clear corrupt session: {}", e);
        }
    }

    fn notify(&self, session: Option<&Session>) {
        let observers = match self.observers.lock() {
            Ok(observers) => observers.clone(),
            Err(_) => return,
        };
        for observer in observers {
            observer.session_changed(session);
        }
    }

    #[cfg(test)]
    pub(crate) fn storage(&self) -> &LocalStore {
        &self.store
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::Role;
    use std::sync::atomic::{AtomicUsize, Ordering};

    fn profile(role: Role) -> UserProfile {
        UserProfile::new("reader@example.com", None, role, None)
    }

    struct Counter {
        calls: AtomicUsize,
        last_logged_in: Mutex<Option<bool>>,
    }

    impl SessionObserver for Counter {
        fn session_changed(&self, session: Option<&Session>) {
            self.calls.fetch_add(1, Ordering::SeqCst);
            *self.last_logged_in.lock().unwrap() = Some(session.is_some());
        }
    }

    #[test]
    fn test_set_and_read_session() {
        let store = SessionStore::in_memory().unwrap();
        store.set_session("tok-1", profile(Role::Admin)).unwrap();

        assert_eq!(store.token().as_deref(), Some("tok-1"));
        assert_eq!(store.user().unwrap().email, "reader@example.com");
        assert!(store.is_admin());
    }

    #[test]
    fn test_blank_token_is_rejected() {
        let store = SessionStore::in_memory().unwrap();
        store.set_session("tok-1", profile(Role::User)).unwrap();

        let result = store.set_session("   ", profile(Role::User));
        assert!(matches!(result, Err(ClientError::Validation(_))));
        assert!(store.token().is_none());
        assert!(store.user().is_none());
    }

    #[test]
    fn test_partial_pair_is_cleared() {
        let store = SessionStore::in_memory().unwrap();
        store.storage().set_many(&[(TOKEN_KEY, "orphan")]).unwrap();

        assert!(store.user().is_none());
        assert!(store.storage().get(TOKEN_KEY).unwrap().is_none());
    }

    #[test]
    fn test_malformed_profile_is_cleared() {
        let store = SessionStore::in_memory().unwrap();
        store
            .storage()
            .set_many(&[(TOKEN_KEY, "tok"), (USER_KEY, "{not json")])
            .unwrap();

        assert!(store.user().is_none());
        assert!(store.token().is_none());
        assert!(!store.is_admin());
    }

    #[test]
    fn test_observers_notified_synchronously() {
        let store = SessionStore::in_memory().unwrap();
        let counter = Arc::new(Counter {
            calls: AtomicUsize::new(0),
            last_logged_in: Mutex::new(None),
        });
        store.subscribe(counter.clone());

        store.set_session("tok", profile(Role::User)).unwrap();
        assert_eq!(counter.calls.load(Ordering::SeqCst), 1);
        assert_eq!(*counter.last_logged_in.lock().unwrap(), Some(true));

        store.clear_session().unwrap();
        assert_eq!(counter.calls.load(Ordering::SeqCst), 2);
        assert_eq!(*counter.last_logged_in.lock().unwrap(), Some(false));
    }
}
