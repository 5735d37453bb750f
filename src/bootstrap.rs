//! Host runner.
//! Drives the permissions hook through the host lifecycle in order:
//! configure → initialize → `hook:orm:loaded` → the companion's after event.
//! A preflight failure lowers the host before any fixture code runs. A seeding
//! failure is returned only after ownership installation has run.

use std::sync::Arc;

use serde::Serialize;
use tracing::{info, warn};

use crate::config::{HookConfig, HostManifest};
use crate::error::BootstrapResult;
use crate::hook::{HookTask, PermissionsHook, Readiness};
use crate::lifecycle::{is_hook_event, Lifecycle, ORM_LOADED};
use crate::model::{ModelDescriptor, RecordId};
use crate::policy::{InstalledHooks, PolicyRegistry};
use crate::seed::{DefaultFixtures, Fixtures, ModelNameCache};
use crate::storage::Store;

/// Summary handed to the startup continuation.
#[derive(Debug, Clone, Default, Serialize)]
pub struct Startup {
    pub seeded: bool,
    pub cache: ModelNameCache,
    pub admin_id: Option<RecordId>,
    pub permissions: usize,
    pub ownership_attributes_added: usize,
    pub loaded_signals: usize,
}

pub struct Host<S: Store, F: Fixtures> {
    pub config: HookConfig,
    pub hooks: InstalledHooks,
    pub policies: PolicyRegistry,
    pub models: Vec<ModelDescriptor>,
    store: Arc<S>,
    fixtures: F,
    hook: PermissionsHook,
    lifecycle: Lifecycle<HookTask>,
    lowered: bool,
    report: Startup,
}

impl<S: Store> Host<S, DefaultFixtures<S>> {
    /// Host over `store` using the default fixtures and the manifest's settings.
    pub fn with_default_fixtures(manifest: HostManifest, store: Arc<S>) -> Self {
        let fixtures = DefaultFixtures::new(store.clone(), manifest.config.permissions.clone());
        Self::from_manifest(manifest, store, fixtures)
    }
}

impl<S: Store, F: Fixtures> Host<S, F> {
    pub fn new(
        config: HookConfig,
        hooks: InstalledHooks,
        policies: PolicyRegistry,
        models: Vec<ModelDescriptor>,
        store: Arc<S>,
        fixtures: F,
    ) -> Self {
        Self {
            config,
            hooks,
            policies,
            models,
            store,
            fixtures,
            hook: PermissionsHook::new(),
            lifecycle: Lifecycle::new(),
            lowered: false,
            report: Startup::default(),
        }
    }

    pub fn from_manifest(manifest: HostManifest, store: Arc<S>, fixtures: F) -> Self {
        Self::new(manifest.config, manifest.hooks, manifest.policies, manifest.models, store, fixtures)
    }

    pub fn fixtures(&self) -> &F { &self.fixtures }
    pub fn lifecycle(&self) -> &Lifecycle<HookTask> { &self.lifecycle }
    pub fn is_lowered(&self) -> bool { self.lowered }

    /// Abort startup; nothing else runs on a lowered host.
    pub fn lower(&mut self) {
        warn!(target: "startup", "lowering host");
        self.lowered = true;
    }

    /// Run the whole startup sequence. The result is the startup continuation:
    /// `Err` for a fatal preflight failure or a failed seeding pass.
    pub async fn lift(&mut self) -> BootstrapResult<Startup> {
        info!(
            target: "startup",
            hooks = self.hooks.len(), models = self.models.len(), after_event = %self.config.permissions.after_event,
            "lifting host"
        );
        self.hook.configure(&mut self.config);
        if let Err(e) = self.hook.initialize(&self.config, &self.hooks, &self.policies, &mut self.lifecycle) {
            self.lower();
            return Err(e);
        }
        // Ownership installation waits on its own event, so a failed seeding
        // pass is held until the after event has had its turn.
        let seeding = self.emit(ORM_LOADED).await;
        let after = self.config.permissions.after_event.clone();
        if is_hook_event(&after) {
            if !self.lifecycle.has_fired(&after) {
                warn!(target: "startup", event = %after, "after event is raised by the hook itself and did not fire");
            }
        } else if !self.lifecycle.has_fired(&after) {
            self.lifecycle.emit(&after);
        }
        let installing = self.drain().await;
        self.report.loaded_signals = self.hook.loaded_signals();
        seeding?;
        installing?;
        info!(target: "startup", seeded = self.report.seeded, "host lifted");
        Ok(self.report.clone())
    }

    /// Emit a lifecycle event and run every task it makes ready.
    pub async fn emit(&mut self, event: &str) -> BootstrapResult<()> {
        if self.lowered { return Ok(()); }
        self.lifecycle.emit(event);
        self.drain().await
    }

    async fn drain(&mut self) -> BootstrapResult<()> {
        while let Some(task) = self.lifecycle.next_ready() {
            self.run(task).await?;
        }
        Ok(())
    }

    async fn run(&mut self, task: HookTask) -> BootstrapResult<()> {
        match task {
            HookTask::SeedFixtures => {
                let readiness = self.hook
                    .on_orm_loaded(self.store.as_ref(), &self.fixtures, &self.config, &self.models, &mut self.lifecycle)
                    .await?;
                if let Readiness::Seeded(outcome) = readiness {
                    let outcome = *outcome;
                    self.report.seeded = true;
                    self.report.admin_id = Some(outcome.plan.admin.id);
                    self.report.permissions = outcome.permissions;
                    self.report.cache = outcome.cache;
                }
            }
            HookTask::InstallOwnership => {
                self.report.ownership_attributes_added += self.hook.on_after_event(&self.config, &mut self.models);
            }
        }
        Ok(())
    }
}
