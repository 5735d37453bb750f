//! The permissions hook as the host sees it: a configure step, an initialize
//! step that gates startup, and two one-shot lifecycle tasks.

use tracing::{debug, error, info};

use crate::config::HookConfig;
use crate::error::{BootstrapError, BootstrapResult};
use crate::lifecycle::{Lifecycle, ORM_LOADED, PERMISSIONS_LOADED};
use crate::model::ModelDescriptor;
use crate::ownership::install_model_ownership;
use crate::policy::{preflight, InstalledHooks, PolicyRegistry};
use crate::seed::{needs_seeding, Fixtures, SeedOutcome, Seeder};
use crate::storage::Store;

pub const IDENTITY: &str = "permissions";

/// Work the hook schedules on host lifecycle events.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HookTask {
    SeedFixtures,
    InstallOwnership,
}

#[derive(Debug)]
pub enum Readiness {
    AlreadySeeded,
    Seeded(Box<SeedOutcome>),
}

#[derive(Debug, Default)]
pub struct PermissionsHook {
    initialized: bool,
    loaded_signals: usize,
}

impl PermissionsHook {
    pub fn new() -> Self { Self::default() }

    pub fn is_initialized(&self) -> bool { self.initialized }

    /// How many times this hook raised `hook:permissions:loaded`.
    pub fn loaded_signals(&self) -> usize { self.loaded_signals }

    /// Runs before the ORM loads. Automatic relation population is switched off
    /// so permission checks see bare foreign keys.
    pub fn configure(&self, config: &mut HookConfig) {
        config.blueprints.populate = false;
    }

    /// Preflight, then schedule seeding and ownership installation.
    /// On error nothing is scheduled and the host must lower.
    pub fn initialize(
        &mut self,
        config: &HookConfig,
        hooks: &InstalledHooks,
        policies: &PolicyRegistry,
        lifecycle: &mut Lifecycle<HookTask>,
    ) -> BootstrapResult<()> {
        debug!(target: "permissions", hook = IDENTITY, "initializing permissions hook");
        preflight(config, hooks, policies)?;
        lifecycle.after(&config.permissions.after_event, HookTask::InstallOwnership);
        lifecycle.after(ORM_LOADED, HookTask::SeedFixtures);
        self.initialized = true;
        Ok(())
    }

    pub async fn on_orm_loaded<S, F>(
        &mut self,
        store: &S,
        fixtures: &F,
        config: &HookConfig,
        catalog: &[ModelDescriptor],
        lifecycle: &mut Lifecycle<HookTask>,
    ) -> BootstrapResult<Readiness>
    where
        S: Store + ?Sized,
        F: Fixtures + ?Sized,
    {
        let needed = needs_seeding(store, &config.permissions, catalog.len()).await.map_err(|e| {
            error!(target: "permissions", error = %e, "seed check failed");
            BootstrapError::SeedCheck(e)
        })?;
        if !needed {
            info!(target: "permissions", "store already seeded; skipping fixtures");
            return Ok(Readiness::AlreadySeeded);
        }
        let outcome = Seeder::new(store, fixtures, &config.permissions).seed(catalog).await?;
        lifecycle.emit(PERMISSIONS_LOADED);
        self.loaded_signals += 1;
        Ok(Readiness::Seeded(Box::new(outcome)))
    }

    pub fn on_after_event(&self, config: &HookConfig, catalog: &mut [ModelDescriptor]) -> usize {
        install_model_ownership(catalog, config.models.auto_created_by)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::policy::{PolicyValue, REQUIRED_POLICIES, WILDCARD};

    fn policies() -> PolicyRegistry {
        PolicyRegistry::new()
            .with(WILDCARD, PolicyValue::chain(REQUIRED_POLICIES))
            .with("AuthController", PolicyValue::Flag(true))
    }

    #[test]
    fn configure_disables_populate() {
        let mut cfg = HookConfig::default();
        assert!(cfg.blueprints.populate);
        PermissionsHook::new().configure(&mut cfg);
        assert!(!cfg.blueprints.populate);
    }

    #[test]
    fn initialize_schedules_both_tasks() {
        let cfg = HookConfig::default();
        let mut lc = Lifecycle::new();
        let mut hook = PermissionsHook::new();
        hook.initialize(&cfg, &InstalledHooks::new(["auth"]), &policies(), &mut lc).unwrap();
        assert!(hook.is_initialized());
        assert_eq!(lc.pending(), 2);
        lc.emit(ORM_LOADED);
        assert_eq!(lc.next_ready(), Some(HookTask::SeedFixtures));
        lc.emit(&cfg.permissions.after_event);
        assert_eq!(lc.next_ready(), Some(HookTask::InstallOwnership));
    }

    #[tokio::test]
    async fn failing_seed_check_is_reported_without_seeding() {
        let store = crate::storage::MemoryStore::new();
        store.fail_on("count_models");
        let cfg = HookConfig::default();
        let fixtures = crate::seed::DefaultFixtures::new(std::sync::Arc::new(store.clone()), cfg.permissions.clone());
        let mut lc = Lifecycle::new();
        let mut hook = PermissionsHook::new();
        let err = hook
            .on_orm_loaded(&store, &fixtures, &cfg, &ModelDescriptor::core_catalog(), &mut lc)
            .await
            .unwrap_err();
        assert_eq!(err.code_str(), "seed_check_failed");
        assert!(!err.is_fatal());
        assert_eq!(hook.loaded_signals(), 0);
        assert!(store.models().is_empty());
        assert!(!lc.has_fired(PERMISSIONS_LOADED));
    }

    #[test]
    fn failed_preflight_schedules_nothing() {
        let cfg = HookConfig::default();
        let mut lc = Lifecycle::new();
        let mut hook = PermissionsHook::new();
        let err = hook.initialize(&cfg, &InstalledHooks::default(), &policies(), &mut lc).unwrap_err();
        assert!(err.is_fatal());
        assert!(!hook.is_initialized());
        assert_eq!(lc.pending(), 0);
    }
}
