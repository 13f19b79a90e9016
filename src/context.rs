use std::sync::Arc;

use crate::engine::{DomainStore, FileMedium, IdGenerator, Repository, SessionStore};
use crate::model::User;
use crate::policy::{Action, Policy, Resource};
use crate::{seed, Authenticator, Config, Error, Result, StorageMedium};

/// Everything a front end needs: the domain store, the session store, and the
/// configuration they were built from. Both stores share one medium.
pub struct AppContext {
    domain: DomainStore,
    session: SessionStore,
    config: Config,
}

impl AppContext {
    /// Opens a context backed by JSON files under `config.data_dir`.
    pub fn open(config: Config) -> Result<Self> {
        let medium = FileMedium::new(&config.data_dir)?;
        Self::with_medium(config, Arc::new(medium))
    }

    pub fn with_medium(config: Config, medium: Arc<dyn StorageMedium>) -> Result<Self> {
        let repo = Repository::new(medium);
        let ids = Arc::new(IdGenerator::new());
        let domain = DomainStore::new(repo.clone(), ids.clone(), &config)?;
        let session = SessionStore::new(repo, ids, seed::users(), config.login_latency)?;
        Ok(Self { domain, session, config })
    }

    pub fn domain(&self) -> &DomainStore {
        &self.domain
    }

    pub fn session(&self) -> &SessionStore {
        &self.session
    }

    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Returns the signed-in user if they may perform `action` on `resource`.
    pub fn authorize(&self, action: Action, resource: Resource<'_>) -> Result<User> {
        let user = self.session.current_user().ok_or(Error::NotAuthenticated)?;
        Policy::check(Some(&user), action, resource)?;
        Ok(user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::MemoryMedium;
    use crate::model::{NewUser, Role};
    use std::collections::HashSet;

    fn context() -> AppContext {
        AppContext::with_medium(Config::instant(), Arc::new(MemoryMedium::new())).unwrap()
    }

    #[tokio::test]
    async fn test_authorize_follows_session() {
        let ctx = context();
        assert!(matches!(
            ctx.authorize(Action::ViewDashboard, Resource::Any),
            Err(Error::NotAuthenticated)
        ));

        ctx.session().login("mary@farmer.com", "x").await.unwrap();
        let farm3 = ctx.domain().farm("farm3").unwrap();
        let farm1 = ctx.domain().farm("farm1").unwrap();

        assert_eq!(ctx.authorize(Action::ManageFarms, Resource::Farm(&farm3)).unwrap().id, "farmer2");
        assert!(matches!(
            ctx.authorize(Action::ManageFarms, Resource::Farm(&farm1)),
            Err(Error::Forbidden { .. })
        ));
    }

    #[tokio::test]
    async fn test_stores_share_medium() {
        let medium = Arc::new(MemoryMedium::new());
        let ctx = AppContext::with_medium(Config::instant(), medium.clone()).unwrap();
        ctx.session().login("admin@ulimi.com", "x").await.unwrap();
        ctx.domain().delete_user("customer2").unwrap();

        let keys = medium.keys();
        assert!(keys.contains(&"ulimi_user".to_string()));
        assert!(keys.contains(&"ulimi_users".to_string()));
    }

    #[tokio::test]
    async fn test_user_ids_unique_across_stores() {
        let ctx = context();
        let new_user = |email: &str| NewUser {
            name: "Test User".into(),
            email: email.into(),
            phone: "+260 977 000000".into(),
            role: Role::Customer,
            location: "Lusaka".into(),
            avatar: None,
        };

        let mut seen = HashSet::new();
        for i in 0..200 {
            let added = ctx.domain().add_user(new_user(&format!("added{}@ulimi.com", i))).unwrap();
            let signed_up = ctx.session().signup(new_user(&format!("new{}@ulimi.com", i))).await.unwrap();
            assert!(seen.insert(added.id));
            assert!(seen.insert(signed_up.id));
        }
    }
}
