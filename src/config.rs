//! Typed host configuration consumed by the permissions hook.
//!
//! Only the sub-trees the hook reads are modelled: `permissions`, `models` and
//! `blueprints`. Every section defaults so a partial JSON document still loads.

use std::path::Path;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::model::ModelDescriptor;
use crate::policy::{InstalledHooks, PolicyRegistry};

/// How the seeder decides whether the store still needs its fixtures.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SeedDetection {
    /// Compare the number of model rows with the number of registered models.
    #[default]
    ModelCount,
    /// Look for an explicit marker written after a successful pass.
    Marker,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct PermissionsConfig {
    #[serde(alias = "adminUsername")]
    pub admin_username: String,
    #[serde(alias = "adminEmail")]
    pub admin_email: String,
    #[serde(alias = "adminPassword")]
    pub admin_password: String,
    /// Event after which ownership attributes are installed on every model.
    #[serde(alias = "afterEvent")]
    pub after_event: String,
    /// Identity of the companion authentication hook.
    #[serde(alias = "authHook")]
    pub auth_hook: String,
    #[serde(alias = "authController")]
    pub auth_controller: String,
    #[serde(alias = "seedDetection")]
    pub seed_detection: SeedDetection,
}

impl Default for PermissionsConfig {
    fn default() -> Self {
        Self {
            admin_username: "admin".to_string(),
            admin_email: "admin@example.com".to_string(),
            admin_password: "admin1234".to_string(),
            after_event: "hook:auth:initialized".to_string(),
            auth_hook: "auth".to_string(),
            auth_controller: "AuthController".to_string(),
            seed_detection: SeedDetection::ModelCount,
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct ModelsConfig {
    /// `Some(false)` disables ownership attributes for every model.
    #[serde(alias = "autoCreatedBy")]
    pub auto_created_by: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct BlueprintsConfig {
    pub populate: bool,
}

impl Default for BlueprintsConfig {
    fn default() -> Self { Self { populate: true } }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct HookConfig {
    pub permissions: PermissionsConfig,
    pub models: ModelsConfig,
    pub blueprints: BlueprintsConfig,
}

fn parse_bool_word(v: &str) -> Option<bool> {
    match v.trim().to_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}

fn non_empty_env(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.trim().is_empty())
}

impl HookConfig {
    /// Overlay `GATEHOUSE_*` environment variables on top of the loaded values.
    pub fn apply_env(&mut self) {
        if let Some(v) = non_empty_env("GATEHOUSE_ADMIN_USERNAME") { self.permissions.admin_username = v; }
        if let Some(v) = non_empty_env("GATEHOUSE_ADMIN_EMAIL") { self.permissions.admin_email = v; }
        if let Some(v) = non_empty_env("GATEHOUSE_ADMIN_PASSWORD") { self.permissions.admin_password = v; }
        if let Some(v) = non_empty_env("GATEHOUSE_AFTER_EVENT") { self.permissions.after_event = v; }
        if let Some(b) = non_empty_env("GATEHOUSE_AUTO_CREATED_BY").as_deref().and_then(parse_bool_word) {
            self.models.auto_created_by = Some(b);
        }
    }
}

/// Everything a host hands to the hook, as one JSON document.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct HostManifest {
    pub config: HookConfig,
    pub hooks: InstalledHooks,
    pub policies: PolicyRegistry,
    pub models: Vec<ModelDescriptor>,
}

impl HostManifest {
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("reading host manifest {}", path.display()))?;
        let manifest: HostManifest = serde_json::from_str(&text)
            .with_context(|| format!("parsing host manifest {}", path.display()))?;
        Ok(manifest)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_fill_missing_sections() {
        let cfg: HookConfig = serde_json::from_str(r#"{ "permissions": { "admin_email": "root@corp.io" } }"#).unwrap();
        assert_eq!(cfg.permissions.admin_email, "root@corp.io");
        assert_eq!(cfg.permissions.admin_username, "admin");
        assert_eq!(cfg.permissions.after_event, "hook:auth:initialized");
        assert_eq!(cfg.permissions.seed_detection, SeedDetection::ModelCount);
        assert!(cfg.blueprints.populate);
        assert_eq!(cfg.models.auto_created_by, None);
    }

    #[test]
    fn host_style_keys_load() {
        let cfg: HookConfig = serde_json::from_str(r#"{
            "permissions": {
                "adminUsername": "root",
                "adminEmail": "root@corp.io",
                "adminPassword": "s3cret",
                "afterEvent": "hook:auth:loaded"
            },
            "models": { "autoCreatedBy": false }
        }"#).unwrap();
        assert_eq!(cfg.permissions.admin_username, "root");
        assert_eq!(cfg.permissions.admin_email, "root@corp.io");
        assert_eq!(cfg.permissions.admin_password, "s3cret");
        assert_eq!(cfg.permissions.after_event, "hook:auth:loaded");
        assert_eq!(cfg.models.auto_created_by, Some(false));
    }

    #[test]
    fn seed_detection_parses_snake_case() {
        let cfg: HookConfig = serde_json::from_str(r#"{ "permissions": { "seed_detection": "marker" } }"#).unwrap();
        assert_eq!(cfg.permissions.seed_detection, SeedDetection::Marker);
    }

    #[test]
    fn bool_words() {
        assert_eq!(parse_bool_word("ON"), Some(true));
        assert_eq!(parse_bool_word(" no "), Some(false));
        assert_eq!(parse_bool_word("maybe"), None);
    }
}
