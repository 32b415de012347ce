//! Durable session storage.

use toolkart_api::UserDetails;
use toolkart_storage::{KeyValueStore, get_json, keys, set_json};

/// A signed-in session: the bearer token plus the cached profile.
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub token: String,
    pub user: UserDetails,
}

/// Persists the session under two keys: the raw token and the profile JSON.
///
/// Reads are forgiving: a missing or unreadable value simply means "not
/// signed in". Write failures are logged and swallowed; the live session
/// stays valid for the rest of the process either way.
#[derive(Debug)]
pub struct SessionStore<S> {
    store: S,
}

impl<S: KeyValueStore> SessionStore<S> {
    pub fn new(store: S) -> Self {
        Self { store }
    }

    pub async fn save(&self, session: &Session) {
        if let Err(err) = self.store.set(keys::USER_TOKEN, &session.token).await {
            tracing::warn!(error = %err, "failed to persist session token");
        }
        if let Err(err) = set_json(&self.store, keys::USER_INFO, &session.user).await {
            tracing::warn!(error = %err, "failed to persist user profile");
        }
    }

    pub async fn load(&self) -> Option<Session> {
        let token = match self.store.get(keys::USER_TOKEN).await {
            Ok(token) => token?,
            Err(err) => {
                tracing::warn!(error = %err, "failed to read session token");
                return None;
            }
        };
        let user = match get_json::<UserDetails, _>(&self.store, keys::USER_INFO).await {
            Ok(user) => user?,
            Err(err) => {
                tracing::warn!(error = %err, "failed to read cached user profile");
                return None;
            }
        };
        Some(Session { token, user })
    }

    pub async fn clear(&self) {
        if let Err(err) = self.store.remove(keys::USER_TOKEN).await {
            tracing::warn!(error = %err, "failed to remove session token");
        }
        if let Err(err) = self.store.remove(keys::USER_INFO).await {
            tracing::warn!(error = %err, "failed to remove cached user profile");
        }
    }
}

#[cfg(test)]
mod tests {
    use toolkart_core::UserId;
    use toolkart_storage::MemoryStore;

    use super::*;

    fn session() -> Session {
        Session {
            token: "tok-1".to_string(),
            user: UserDetails {
                id: UserId::new(5),
                name: "Ada".to_string(),
                email: "ada@example.com".to_string(),
                phone: None,
            },
        }
    }

    #[tokio::test]
    async fn save_load_clear_cycle() {
        let store = SessionStore::new(MemoryStore::new());

        assert_eq!(store.load().await, None);

        store.save(&session()).await;
        assert_eq!(store.load().await, Some(session()));

        store.clear().await;
        assert_eq!(store.load().await, None);
    }

    #[tokio::test]
    async fn token_without_profile_reads_as_signed_out() {
        let memory = MemoryStore::new();
        memory.set(keys::USER_TOKEN, "tok-1").await.unwrap();

        let store = SessionStore::new(memory);
        assert_eq!(store.load().await, None);
    }

    #[tokio::test]
    async fn corrupt_profile_reads_as_signed_out() {
        let memory = MemoryStore::new();
        memory.set(keys::USER_TOKEN, "tok-1").await.unwrap();
        memory.set(keys::USER_INFO, "{oops").await.unwrap();

        let store = SessionStore::new(memory);
        assert_eq!(store.load().await, None);
    }
}
