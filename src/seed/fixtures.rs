//! Default fixtures: the rows a fresh permission system starts with.

use std::collections::HashSet;
use std::sync::Arc;

use async_trait::async_trait;
use tracing::{debug, info};

use crate::config::PermissionsConfig;
use crate::error::SeedError;
use crate::model::{Action, ModelDescriptor, ModelRecord, NewPermission, NewUser, Permission, Relation, Role, User};
use crate::storage::Store;

use super::ModelNameCache;

pub const ADMIN_ROLE: &str = "admin";
pub const REGISTERED_ROLE: &str = "registered";
pub const PUBLIC_ROLE: &str = "public";
pub const DEFAULT_ROLES: [&str; 3] = [ADMIN_ROLE, REGISTERED_ROLE, PUBLIC_ROLE];

/// Models registered users get no blanket create/read grant on.
pub const REGISTERED_RESTRICTED: [&str; 4] = ["Role", "Permission", "User", "Passport"];

/// The four creation factories the seeder runs, each fed the previous stage's output.
#[async_trait]
pub trait Fixtures: Send + Sync {
    async fn create_models(&self, catalog: &[ModelDescriptor]) -> Result<Vec<ModelRecord>, SeedError>;

    async fn create_roles(&self, models: &[ModelRecord]) -> Result<Vec<Role>, SeedError>;

    async fn create_users(&self, roles: &[Role], user_model: &ModelRecord) -> Result<Vec<User>, SeedError>;

    async fn create_permissions(
        &self,
        roles: &[Role],
        models: &[ModelRecord],
        cache: &ModelNameCache,
        admin: &User,
    ) -> Result<Vec<Permission>, SeedError>;
}

pub fn role_named<'a>(roles: &'a [Role], name: &str) -> Result<&'a Role, SeedError> {
    roles.iter().find(|r| r.name == name).ok_or_else(|| SeedError::Lookup(format!("role '{}'", name)))
}

fn require(value: &str, setting: &'static str) -> Result<(), SeedError> {
    if value.trim().is_empty() { Err(SeedError::MissingSetting(setting)) } else { Ok(()) }
}

pub struct DefaultFixtures<S: Store> {
    store: Arc<S>,
    config: PermissionsConfig,
}

impl<S: Store> DefaultFixtures<S> {
    pub fn new(store: Arc<S>, config: PermissionsConfig) -> Self { Self { store, config } }

    /// Grants every fresh install starts with, in creation order.
    pub fn default_grants(roles: &[Role], models: &[ModelRecord], cache: &ModelNameCache, admin: &User) -> Result<Vec<NewPermission>, SeedError> {
        let admin_role = role_named(roles, ADMIN_ROLE)?.id;
        let registered = role_named(roles, REGISTERED_ROLE)?.id;
        let mut grants = Vec::new();

        for m in models {
            for action in Action::CRUD {
                grants.push(NewPermission::for_role(m.id, action, admin_role));
            }
        }

        if let Some(id) = cache.get("permission") { grants.push(NewPermission::for_role(id, Action::Read, registered)); }
        if let Some(id) = cache.get("model") { grants.push(NewPermission::for_role(id, Action::Read, registered)); }
        if let Some(id) = cache.get("user") {
            grants.push(NewPermission::for_role(id, Action::Update, registered).owned_by(Relation::Owner));
            grants.push(NewPermission::for_role(id, Action::Read, registered).owned_by(Relation::Owner));
        }
        for m in models.iter().filter(|m| !REGISTERED_RESTRICTED.contains(&m.name.as_str())) {
            grants.push(NewPermission::for_role(m.id, Action::Create, registered));
            grants.push(NewPermission::for_role(m.id, Action::Read, registered));
        }

        // Model read for registered appears twice; keep the first
        let mut seen = HashSet::new();
        grants.retain(|g| seen.insert(g.key()));
        for g in grants.iter_mut() { g.created_by = Some(admin.id); }
        Ok(grants)
    }
}

#[async_trait]
impl<S: Store> Fixtures for DefaultFixtures<S> {
    async fn create_models(&self, catalog: &[ModelDescriptor]) -> Result<Vec<ModelRecord>, SeedError> {
        let mut out = Vec::with_capacity(catalog.len());
        for desc in catalog {
            out.push(self.store.find_or_create_model(desc).await?);
        }
        debug!(target: "permissions", count = out.len(), "model fixtures ready");
        Ok(out)
    }

    async fn create_roles(&self, _models: &[ModelRecord]) -> Result<Vec<Role>, SeedError> {
        let mut out = Vec::with_capacity(DEFAULT_ROLES.len());
        for name in DEFAULT_ROLES {
            out.push(self.store.find_or_create_role(name).await?);
        }
        Ok(out)
    }

    async fn create_users(&self, roles: &[Role], user_model: &ModelRecord) -> Result<Vec<User>, SeedError> {
        require(&self.config.admin_username, "permissions.admin_username")?;
        require(&self.config.admin_password, "permissions.admin_password")?;
        require(&self.config.admin_email, "permissions.admin_email")?;

        if let Some(existing) = self.store.find_user_by_username(&self.config.admin_username).await? {
            return Ok(vec![existing]);
        }
        info!(target: "permissions", username = %self.config.admin_username, "admin user does not exist; creating");
        let password_hash = crate::security::hash_password(&self.config.admin_password)
            .map_err(|e| SeedError::Password(e.to_string()))?;
        let admin = self.store.register_user(NewUser {
            username: self.config.admin_username.clone(),
            email: self.config.admin_email.clone(),
            password_hash: Some(password_hash),
            roles: vec![role_named(roles, ADMIN_ROLE)?.id],
            model: Some(user_model.id),
        }).await?;
        Ok(vec![admin])
    }

    async fn create_permissions(
        &self,
        roles: &[Role],
        models: &[ModelRecord],
        cache: &ModelNameCache,
        admin: &User,
    ) -> Result<Vec<Permission>, SeedError> {
        let grants = Self::default_grants(roles, models, cache, admin)?;
        let mut out = Vec::with_capacity(grants.len());
        for g in grants {
            out.push(self.store.find_or_create_permission(g).await?);
        }
        debug!(target: "permissions", count = out.len(), "permission fixtures ready");
        Ok(out)
    }
}
