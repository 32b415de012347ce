//! Live session management.

use std::sync::Mutex;

use toolkart_api::{ApiError, AuthApi, NewAccount, UserDetails};
use toolkart_core::UserId;
use toolkart_storage::KeyValueStore;

use crate::store::{Session, SessionStore};

/// Read-only view of "who is signed in right now".
pub trait IdentityProvider {
    fn current_user(&self) -> Option<UserId>;
}

/// Owns the live session: login/register against the backend, durable
/// persistence, and a non-fatal profile refresh at startup.
#[derive(Debug)]
pub struct SessionManager<A, S> {
    api: A,
    store: SessionStore<S>,
    current: Mutex<Option<Session>>,
}

impl<A, S> SessionManager<A, S>
where
    A: AuthApi,
    S: KeyValueStore,
{
    pub fn new(api: A, store: S) -> Self {
        Self {
            api,
            store: SessionStore::new(store),
            current: Mutex::new(None),
        }
    }

    /// Restore the persisted session, then refresh the profile from the
    /// backend. A failed refresh keeps the cached profile; startup never
    /// blocks on the network succeeding.
    pub async fn bootstrap(&self) -> Option<UserDetails> {
        let mut session = self.store.load().await?;
        self.api.install_token(Some(session.token.clone()));

        match self.api.fetch_user_details(session.user.id).await {
            Ok(fresh) => {
                session.user = fresh;
                self.store.save(&session).await;
            }
            Err(err) => {
                tracing::warn!(error = %err, "profile refresh failed, using cached identity");
            }
        }

        let user = session.user.clone();
        self.set_current(Some(session));
        Some(user)
    }

    pub async fn login(&self, email: &str, password: &str) -> Result<UserDetails, ApiError> {
        let auth = self.api.login(email, password).await?;
        let session = Session {
            token: auth.token,
            user: auth.user,
        };
        self.store.save(&session).await;
        let user = session.user.clone();
        self.set_current(Some(session));
        tracing::info!(user = %user.id, "signed in");
        Ok(user)
    }

    pub async fn register(&self, account: &NewAccount) -> Result<UserDetails, ApiError> {
        let auth = self.api.register(account).await?;
        let session = Session {
            token: auth.token,
            user: auth.user,
        };
        self.store.save(&session).await;
        let user = session.user.clone();
        self.set_current(Some(session));
        tracing::info!(user = %user.id, "account registered");
        Ok(user)
    }

    /// Drop the live session and erase the persisted one.
    pub async fn logout(&self) {
        self.set_current(None);
        self.api.install_token(None);
        self.store.clear().await;
        tracing::info!("signed out");
    }

    pub fn current(&self) -> Option<Session> {
        self.lock_current(|current| current.clone())
    }

    pub fn token(&self) -> Option<String> {
        self.lock_current(|current| current.as_ref().map(|s| s.token.clone()))
    }

    fn set_current(&self, session: Option<Session>) {
        self.lock_current(|current| *current = session);
    }

    fn lock_current<R>(&self, f: impl FnOnce(&mut Option<Session>) -> R) -> R {
        let mut guard = match self.current.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        f(&mut guard)
    }
}

impl<A, S> IdentityProvider for SessionManager<A, S>
where
    A: AuthApi,
    S: KeyValueStore,
{
    fn current_user(&self) -> Option<UserId> {
        self.lock_current(|current| current.as_ref().map(|s| s.user.id))
    }
}
