use std::sync::{Arc, PoisonError, RwLock};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use log::{debug, info};

use crate::engine::{IdGenerator, Repository, SESSION_KEY};
use crate::model::{NewUser, User};
use crate::{Authenticator, Error, Result};

#[derive(Debug, Clone, PartialEq)]
pub enum SessionState {
    Anonymous,
    Authenticated(User),
}

/// The signed-in user of this process, mirrored under [`SESSION_KEY`].
///
/// Login resolves against a fixed user directory (the demo accounts), not against the
/// users collection of the domain store.
pub struct SessionStore {
    current: RwLock<Option<User>>,
    directory: Vec<User>,
    repo: Repository,
    ids: Arc<IdGenerator>,
    latency: Duration,
}

impl SessionStore {
    pub fn new(repo: Repository, ids: Arc<IdGenerator>, directory: Vec<User>, latency: Duration) -> Result<Self> {
        let current: Option<User> = repo.load_entry(SESSION_KEY)?;
        match &current {
            Some(user) => info!("Restored session for {} ({})", user.email, user.role),
            None => debug!("No persisted session"),
        }
        Ok(Self {
            current: RwLock::new(current),
            directory,
            repo,
            ids,
            latency,
        })
    }

    pub fn state(&self) -> SessionState {
        match self.current_user() {
            Some(user) => SessionState::Authenticated(user),
            None => SessionState::Anonymous,
        }
    }

    fn set_current(&self, user: User) -> Result<User> {
        self.repo.save_entry(SESSION_KEY, &user)?;
        *self.current.write().unwrap_or_else(PoisonError::into_inner) = Some(user.clone());
        Ok(user)
    }

    async fn simulate_round_trip(&self) {
        if !self.latency.is_zero() {
            tokio::time::sleep(self.latency).await;
        }
    }
}

#[async_trait]
impl Authenticator for SessionStore {
    async fn login(&self, email: &str, _password: &str) -> Result<User> {
        self.simulate_round_trip().await;

        let user = self
            .directory
            .iter()
            .find(|u| u.email == email)
            .cloned()
            .ok_or(Error::InvalidCredentials)?;

        info!("Logged in {} as {}", user.email, user.role);
        self.set_current(user)
    }

    async fn signup(&self, data: NewUser) -> Result<User> {
        self.simulate_round_trip().await;

        let user = data.into_user(self.ids.next("user"), Utc::now());
        info!("Signed up {} as {}", user.email, user.role);
        self.set_current(user)
    }

    fn logout(&self) -> Result<()> {
        self.repo.remove_entry(SESSION_KEY)?;
        if let Some(user) = self.current.write().unwrap_or_else(PoisonError::into_inner).take() {
            info!("Logged out {}", user.email);
        }
        Ok(())
    }

    fn current_user(&self) -> Option<User> {
        self.current.read().unwrap_or_else(PoisonError::into_inner).clone()
    }
}
