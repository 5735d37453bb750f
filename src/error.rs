//! Error model for the permissions bootstrap.
//! Configuration errors abort startup before any seeding happens; seeding errors
//! carry the pipeline stage that failed so the host can report it.

use thiserror::Error;

use crate::seed::SeedStage;
use crate::storage::StoreError;

/// Preflight failures. Always fatal, never retried.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum ConfigurationError {
    #[error("cannot find companion hook '{hook}'; install the authentication hook before the permissions hook")]
    MissingAuthHook { hook: String },
    #[error("one or more required policies are missing: {}", missing.join(", "))]
    MissingPolicies { missing: Vec<String> },
}

/// Failures inside a single fixture stage.
#[derive(Debug, Error)]
pub enum SeedError {
    #[error(transparent)]
    Store(#[from] StoreError),
    #[error("lookup failed: {0}")]
    Lookup(String),
    #[error("{0} is not set")]
    MissingSetting(&'static str),
    #[error("password hashing failed: {0}")]
    Password(String),
}

#[derive(Debug, Error)]
pub enum BootstrapError {
    #[error("configuration: {0}")]
    Configuration(#[from] ConfigurationError),
    #[error("seed check failed: {0}")]
    SeedCheck(#[source] StoreError),
    #[error("seeding failed at stage '{stage}': {source}")]
    Seeding {
        stage: SeedStage,
        #[source]
        source: SeedError,
    },
}

impl BootstrapError {
    pub fn seeding(stage: SeedStage, source: impl Into<SeedError>) -> Self {
        BootstrapError::Seeding { stage, source: source.into() }
    }

    pub fn code_str(&self) -> &'static str {
        match self {
            BootstrapError::Configuration(ConfigurationError::MissingAuthHook { .. }) => "missing_auth_hook",
            BootstrapError::Configuration(ConfigurationError::MissingPolicies { .. }) => "missing_policies",
            BootstrapError::Seeding { source: SeedError::Lookup(_), .. } => "admin_lookup_failed",
            BootstrapError::Seeding { .. } => "seeding_failed",
            BootstrapError::SeedCheck(_) => "seed_check_failed",
        }
    }

    /// Configuration errors must stop the host; seeding errors leave a partially seeded store.
    pub fn is_fatal(&self) -> bool { matches!(self, BootstrapError::Configuration(_)) }

    pub fn stage(&self) -> Option<SeedStage> {
        match self {
            BootstrapError::Seeding { stage, .. } => Some(*stage),
            BootstrapError::Configuration(_) | BootstrapError::SeedCheck(_) => None,
        }
    }
}

pub type BootstrapResult<T> = Result<T, BootstrapError>;

#[cfg(test)]
#[path = "error_tests.rs"]
mod error_tests;
