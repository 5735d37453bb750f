//! Preflight validation: the companion authentication hook must be installed and
//! the global (`*`) policy chain must carry every permission policy before the
//! hook is allowed to seed anything. Both checks are pure reads of in-memory
//! configuration.

use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};
use tracing::{debug, error};

use crate::config::HookConfig;
use crate::error::ConfigurationError;

pub const WILDCARD: &str = "*";

/// Policies that must sit in the global chain for permission checks to run.
pub const REQUIRED_POLICIES: [&str; 6] = [
    "ModelPolicy",
    "AuditPolicy",
    "OwnerPolicy",
    "PermissionPolicy",
    "RolePolicy",
    "CriteriaPolicy",
];

/// Identities of the hooks installed in the host.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct InstalledHooks(BTreeSet<String>);

impl InstalledHooks {
    pub fn new<I, S>(ids: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self(ids.into_iter().map(Into::into).collect())
    }

    pub fn contains(&self, id: &str) -> bool { self.0.contains(id) }
    pub fn len(&self) -> usize { self.0.len() }
    pub fn is_empty(&self) -> bool { self.0.is_empty() }
}

/// Right-hand side of a policy mapping entry.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(untagged)]
pub enum PolicyValue {
    Flag(bool),
    Single(String),
    Chain(Vec<String>),
    Actions(BTreeMap<String, PolicyValue>),
}

impl PolicyValue {
    pub fn chain<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        PolicyValue::Chain(names.into_iter().map(Into::into).collect())
    }

    pub fn as_chain(&self) -> Option<&[String]> {
        match self {
            PolicyValue::Chain(v) => Some(v.as_slice()),
            _ => None,
        }
    }
}

/// Controller identifier (or `*`) to the policies guarding it.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct PolicyRegistry(BTreeMap<String, PolicyValue>);

impl PolicyRegistry {
    pub fn new() -> Self { Self::default() }

    pub fn set(&mut self, controller: &str, value: PolicyValue) { self.0.insert(controller.to_string(), value); }

    pub fn with(mut self, controller: &str, value: PolicyValue) -> Self {
        self.set(controller, value);
        self
    }

    pub fn get(&self, controller: &str) -> Option<&PolicyValue> { self.0.get(controller) }
    pub fn contains(&self, controller: &str) -> bool { self.0.contains_key(controller) }
    pub fn remove(&mut self, controller: &str) -> Option<PolicyValue> { self.0.remove(controller) }

    pub fn wildcard_chain(&self) -> Option<&[String]> { self.get(WILDCARD).and_then(PolicyValue::as_chain) }
}

/// A single preflight requirement and whether it held.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PolicyCheck {
    pub requirement: String,
    pub passed: bool,
}

/// True iff the companion authentication hook is installed.
pub fn validate_dependencies(hooks: &InstalledHooks, config: &HookConfig) -> bool {
    hooks.contains(&config.permissions.auth_hook)
}

/// Every requirement the policy registry is checked against, in evaluation order.
pub fn policy_checks(registry: &PolicyRegistry, config: &HookConfig) -> Vec<PolicyCheck> {
    let chain = registry.wildcard_chain();
    let auth_controller = &config.permissions.auth_controller;
    let mut checks = Vec::with_capacity(REQUIRED_POLICIES.len() + 2);
    checks.push(PolicyCheck { requirement: format!("'{}' policy chain", WILDCARD), passed: chain.is_some() });
    checks.push(PolicyCheck { requirement: format!("'{}' policy entry", auth_controller), passed: registry.contains(auth_controller) });
    for name in REQUIRED_POLICIES {
        let present = chain.map(|c| c.iter().any(|p| p == name)).unwrap_or(false);
        checks.push(PolicyCheck { requirement: name.to_string(), passed: present });
    }
    checks
}

/// Fails closed: any single missing requirement fails the whole registry.
pub fn validate_policy_config(registry: &PolicyRegistry, config: &HookConfig) -> bool {
    policy_checks(registry, config).iter().all(|c| c.passed)
}

/// Run both checks; the error names what is missing.
pub fn preflight(config: &HookConfig, hooks: &InstalledHooks, registry: &PolicyRegistry) -> Result<(), ConfigurationError> {
    if !validate_dependencies(hooks, config) {
        let hook = config.permissions.auth_hook.clone();
        error!(target: "permissions", hook = %hook, "cannot find the authentication hook; it must be installed alongside the permissions hook");
        return Err(ConfigurationError::MissingAuthHook { hook });
    }
    let missing: Vec<String> = policy_checks(registry, config)
        .into_iter()
        .filter(|c| !c.passed)
        .map(|c| c.requirement)
        .collect();
    if !missing.is_empty() {
        error!(target: "permissions", missing = ?missing, "one or more required policies are missing");
        return Err(ConfigurationError::MissingPolicies { missing });
    }
    debug!(target: "permissions", "preflight passed");
    Ok(())
}

#[cfg(test)]
#[path = "policy_tests.rs"]
mod policy_tests;
