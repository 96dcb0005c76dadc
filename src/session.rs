//! Session identity, persisted so telemetry ties events to one user session

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::preferences::{PreferenceStore, USER_ID_KEY};

/// Opaque session identifier
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    /// Generate a fresh random identifier
    pub fn generate() -> Self {
        Self(Uuid::new_v4().to_string())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SessionId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl From<String> for SessionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

/// Hands out the persisted session id, creating it on first use
#[derive(Debug, Clone)]
pub struct SessionProvider {
    prefs: PreferenceStore,
}

impl SessionProvider {
    pub fn new(prefs: PreferenceStore) -> Self {
        Self { prefs }
    }

    /// Return the stored id, generating and persisting one if none exists.
    ///
    /// A persisted value is never replaced. If persisting a new id fails, the
    /// id still lives in the store's memory, so later calls in this process
    /// return the same value.
    pub fn session_id(&self) -> SessionId {
        let mut generated = false;
        let id = self.prefs.get_or_insert_with(USER_ID_KEY, || {
            generated = true;
            SessionId::generate().0
        });
        if generated {
            tracing::debug!(session_id = %id, "Generated new session id");
        }
        SessionId(id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_session_id_is_idempotent() {
        let provider = SessionProvider::new(PreferenceStore::in_memory());
        let first = provider.session_id();
        let second = provider.session_id();
        assert_eq!(first, second);
        assert!(Uuid::parse_str(first.as_str()).is_ok());
    }

    #[test]
    fn test_session_id_survives_restart() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");

        let first = SessionProvider::new(PreferenceStore::file(&path)).session_id();
        let second = SessionProvider::new(PreferenceStore::file(&path)).session_id();
        assert_eq!(first, second);
    }

    #[test]
    fn test_existing_id_is_kept_verbatim() {
        let prefs = PreferenceStore::in_memory();
        prefs.set(USER_ID_KEY, "not-a-uuid").unwrap();
        let provider = SessionProvider::new(prefs);
        assert_eq!(provider.session_id().as_str(), "not-a-uuid");
    }

    #[test]
    fn test_concurrent_first_calls_agree() {
        let provider = SessionProvider::new(PreferenceStore::in_memory());
        let threads: Vec<_> = (0..8)
            .map(|_| {
                let provider = provider.clone();
                std::thread::spawn(move || provider.session_id())
            })
            .collect();
        let ids: Vec<SessionId> = threads.into_iter().map(|h| h.join().unwrap()).collect();
        assert!(ids.iter().all(|id| *id == ids[0]));
    }

    #[test]
    fn test_serializes_as_plain_string() {
        let id = SessionId::from("abc");
        assert_eq!(serde_json::to_string(&id).unwrap(), "\"abc\"");
    }
}
