//! Fixture seeding: a strictly ordered, one-shot pipeline that fills an empty
//! store with the default models, roles, admin user and permissions.
//!
//! Stages run one after another and each consumes the previous stage's output:
//! models → roles → users → admin self-ownership → permissions. A failing stage
//! stops the pipeline; rows written by earlier stages stay in the store.

mod cache;
mod fixtures;

use std::fmt::{Display, Formatter};

use serde::Serialize;
use tracing::{error, info, debug};

use crate::config::{PermissionsConfig, SeedDetection};
use crate::error::{BootstrapError, BootstrapResult, SeedError};
use crate::model::{ModelDescriptor, ModelRecord, Role, User};
use crate::storage::{Store, StoreError};

pub use cache::ModelNameCache;
pub use fixtures::{
    role_named, DefaultFixtures, Fixtures, ADMIN_ROLE, DEFAULT_ROLES, PUBLIC_ROLE, REGISTERED_RESTRICTED, REGISTERED_ROLE,
};

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "snake_case")]
pub enum SeedStage {
    Models,
    Roles,
    Users,
    AdminOwnership,
    Permissions,
    /// Recording the seeded marker once every stage has succeeded.
    SeedMarker,
}

impl SeedStage {
    pub const ORDER: [SeedStage; 5] = [
        SeedStage::Models,
        SeedStage::Roles,
        SeedStage::Users,
        SeedStage::AdminOwnership,
        SeedStage::Permissions,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            SeedStage::Models => "models",
            SeedStage::Roles => "roles",
            SeedStage::Users => "users",
            SeedStage::AdminOwnership => "admin_ownership",
            SeedStage::Permissions => "permissions",
            SeedStage::SeedMarker => "seed_marker",
        }
    }
}

impl Display for SeedStage {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result { f.write_str(self.as_str()) }
}

/// Emptiness heuristic: the store counts as seeded when it holds exactly one
/// model row per registered model.
///
/// This can miss a store whose row count matches by coincidence; use
/// [`SeedDetection::Marker`] where that matters.
pub fn should_seed(current_object_count: usize, registered_model_count: usize) -> bool {
    current_object_count != registered_model_count
}

pub async fn needs_seeding<S: Store + ?Sized>(store: &S, config: &PermissionsConfig, registered_model_count: usize) -> Result<bool, StoreError> {
    match config.seed_detection {
        SeedDetection::ModelCount => {
            let count = store.count_models().await?;
            debug!(target: "permissions", count, registered = registered_model_count, "seed check by model count");
            Ok(should_seed(count, registered_model_count))
        }
        SeedDetection::Marker => Ok(!store.has_seed_marker().await?),
    }
}

/// What one seeding pass created. Dropped once the pass completes.
#[derive(Debug, Clone)]
pub struct SeedPlan {
    pub models: Vec<ModelRecord>,
    pub roles: Vec<Role>,
    pub admin: User,
}

#[derive(Debug, Clone)]
pub struct SeedOutcome {
    pub plan: SeedPlan,
    pub cache: ModelNameCache,
    pub permissions: usize,
}

pub struct Seeder<'a, S: Store + ?Sized, F: Fixtures + ?Sized> {
    store: &'a S,
    fixtures: &'a F,
    config: &'a PermissionsConfig,
}

fn fail(stage: SeedStage, err: impl Into<SeedError>) -> BootstrapError {
    let err = BootstrapError::seeding(stage, err);
    error!(target: "permissions", stage = %stage, error = %err, "seeding failed");
    err
}

impl<'a, S: Store + ?Sized, F: Fixtures + ?Sized> Seeder<'a, S, F> {
    pub fn new(store: &'a S, fixtures: &'a F, config: &'a PermissionsConfig) -> Self { Self { store, fixtures, config } }

    pub async fn seed(&self, catalog: &[ModelDescriptor]) -> BootstrapResult<SeedOutcome> {
        info!(target: "permissions", models = catalog.len(), "seeding default fixtures");

        let models = self.fixtures.create_models(catalog).await.map_err(|e| fail(SeedStage::Models, e))?;
        let cache = ModelNameCache::from_records(&models);

        let roles = self.fixtures.create_roles(&models).await.map_err(|e| fail(SeedStage::Roles, e))?;

        let user_model = models.iter().find(|m| m.name == "User")
            .ok_or_else(|| fail(SeedStage::Users, SeedError::Lookup("model 'User' is not registered".into())))?;
        let users = self.fixtures.create_users(&roles, user_model).await.map_err(|e| fail(SeedStage::Users, e))?;

        let admin = self.bootstrap_admin(&users).await.map_err(|e| fail(SeedStage::AdminOwnership, e))?;
        debug!(target: "permissions", id = admin.id, username = %admin.username, "admin owns itself");

        let permissions = self.fixtures.create_permissions(&roles, &models, &cache, &admin).await
            .map_err(|e| fail(SeedStage::Permissions, e))?;

        if self.config.seed_detection == SeedDetection::Marker {
            self.store.write_seed_marker().await.map_err(|e| fail(SeedStage::SeedMarker, e))?;
        }

        info!(
            target: "permissions",
            models = models.len(), roles = roles.len(), permissions = permissions.len(),
            "seeding complete"
        );
        Ok(SeedOutcome { plan: SeedPlan { models, roles, admin }, cache, permissions: permissions.len() })
    }

    /// No other user exists yet to own the admin, so it owns itself.
    async fn bootstrap_admin(&self, users: &[User]) -> Result<User, SeedError> {
        let email = &self.config.admin_email;
        let found = match users.iter().find(|u| u.email.eq_ignore_ascii_case(email)) {
            Some(u) => Some(u.clone()),
            None => self.store.find_user_by_email(email).await?,
        };
        let mut admin = found.ok_or_else(|| SeedError::Lookup(format!("admin user with email '{}'", email)))?;
        admin.created_by = Some(admin.id);
        admin.owner = Some(admin.id);
        Ok(self.store.save_user(&admin).await?)
    }
}
