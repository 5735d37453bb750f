use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, fmt};

use gatehouse::config::HostManifest;
use gatehouse::model::ModelDescriptor;
use gatehouse::policy::{InstalledHooks, PolicyRegistry, PolicyValue, REQUIRED_POLICIES, WILDCARD};
use gatehouse::storage::MemoryStore;
use gatehouse::Host;

/// Host with the core models, the auth hook and a complete policy registry.
fn default_manifest() -> HostManifest {
    let mut manifest = HostManifest::default();
    manifest.hooks = InstalledHooks::new([manifest.config.permissions.auth_hook.clone()]);
    let mut chain = vec!["passport".to_string()];
    chain.extend(REQUIRED_POLICIES.iter().map(|p| p.to_string()));
    manifest.policies = PolicyRegistry::new()
        .with(WILDCARD, PolicyValue::Chain(chain))
        .with(&manifest.config.permissions.auth_controller, PolicyValue::chain(["passport"]));
    manifest.models = ModelDescriptor::core_catalog();
    manifest
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Init logging
    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .context("building log filter")?;
    fmt().with_env_filter(filter).init();

    let manifest_path = std::env::args().nth(1)
        .or_else(|| std::env::var("GATEHOUSE_MANIFEST").ok())
        .map(PathBuf::from);
    let mut manifest = match &manifest_path {
        Some(p) => HostManifest::load(p)?,
        None => default_manifest(),
    };
    manifest.config.apply_env();
    info!(
        target: "startup",
        "gatehouse starting: manifest={:?}, hooks={}, models={}, admin_email='{}'",
        manifest_path, manifest.hooks.len(), manifest.models.len(), manifest.config.permissions.admin_email
    );

    let store = Arc::new(MemoryStore::new());
    let mut host = Host::with_default_fixtures(manifest, store);
    match host.lift().await {
        Ok(startup) => {
            println!("{}", serde_json::to_string_pretty(&startup)?);
            Ok(())
        }
        Err(e) => {
            error!(target: "startup", code = e.code_str(), lowered = host.is_lowered(), "startup failed: {}", e);
            Err(e.into())
        }
    }
}
