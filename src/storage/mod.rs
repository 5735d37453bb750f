//! Backing store seam. The host ORM implements [`Store`]; [`MemoryStore`] is the
//! in-process implementation used by the binary and the tests.
//!
//! Implementations must reject duplicate default rows (unique model name, role
//! name, username, email and permission key). Two processes seeding the same
//! empty store concurrently rely on that, not on any locking here.

mod memory;

use async_trait::async_trait;
use thiserror::Error;

use crate::model::{ModelDescriptor, ModelRecord, NewPermission, NewUser, Permission, Role, User};

pub use memory::MemoryStore;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum StoreError {
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("backend: {0}")]
    Backend(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[async_trait]
pub trait Store: Send + Sync {
    /// Number of persisted model rows.
    async fn count_models(&self) -> StoreResult<usize>;

    async fn find_or_create_model(&self, descriptor: &ModelDescriptor) -> StoreResult<ModelRecord>;

    async fn find_or_create_role(&self, name: &str) -> StoreResult<Role>;

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>>;

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>>;

    /// Insert a new user; duplicates by username or email are a conflict.
    async fn register_user(&self, user: NewUser) -> StoreResult<User>;

    /// Persist changes to an existing user.
    async fn save_user(&self, user: &User) -> StoreResult<User>;

    async fn find_or_create_permission(&self, permission: NewPermission) -> StoreResult<Permission>;

    async fn has_seed_marker(&self) -> StoreResult<bool>;

    async fn write_seed_marker(&self) -> StoreResult<()>;
}
