use std::sync::Arc;

use async_trait::async_trait;
use parking_lot::Mutex;

use crate::model::{ModelDescriptor, ModelRecord, NewPermission, NewUser, Permission, RecordId, Role, User};
use crate::tprintln;

use super::{Store, StoreError, StoreResult};

#[derive(Debug, Default)]
struct Tables {
    models: Vec<ModelRecord>,
    roles: Vec<Role>,
    users: Vec<User>,
    permissions: Vec<Permission>,
    seed_marker: bool,
    next_id: [RecordId; 4],
}

impl Tables {
    fn alloc(&mut self, table: usize) -> RecordId {
        self.next_id[table] += 1;
        self.next_id[table]
    }
}

const T_MODEL: usize = 0;
const T_ROLE: usize = 1;
const T_USER: usize = 2;
const T_PERMISSION: usize = 3;

/// Process-local store. Clones share the same tables.
#[derive(Debug, Clone, Default)]
pub struct MemoryStore {
    inner: Arc<Mutex<Tables>>,
    fail_on: Arc<Mutex<Option<String>>>,
}

impl MemoryStore {
    pub fn new() -> Self { Self::default() }

    /// Make every call of the named operation fail with a backend error.
    pub fn fail_on(&self, op: &str) { *self.fail_on.lock() = Some(op.to_string()); }

    pub fn clear_failure(&self) { *self.fail_on.lock() = None; }

    fn check(&self, op: &str) -> StoreResult<()> {
        match self.fail_on.lock().as_deref() {
            Some(f) if f == op => Err(StoreError::Backend(format!("injected failure in {}", op))),
            _ => Ok(()),
        }
    }

    pub fn models(&self) -> Vec<ModelRecord> { self.inner.lock().models.clone() }
    pub fn roles(&self) -> Vec<Role> { self.inner.lock().roles.clone() }
    pub fn users(&self) -> Vec<User> { self.inner.lock().users.clone() }
    pub fn permissions(&self) -> Vec<Permission> { self.inner.lock().permissions.clone() }

    /// Insert a model row directly, bypassing find-or-create.
    pub fn insert_model_row(&self, name: &str) -> ModelRecord {
        let mut t = self.inner.lock();
        let id = t.alloc(T_MODEL);
        let rec = ModelRecord { id, name: name.to_string(), identity: name.to_lowercase(), attributes: Default::default() };
        t.models.push(rec.clone());
        rec
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn count_models(&self) -> StoreResult<usize> {
        self.check("count_models")?;
        Ok(self.inner.lock().models.len())
    }

    async fn find_or_create_model(&self, descriptor: &ModelDescriptor) -> StoreResult<ModelRecord> {
        self.check("find_or_create_model")?;
        let mut t = self.inner.lock();
        if let Some(existing) = t.models.iter().find(|m| m.name == descriptor.name) {
            return Ok(existing.clone());
        }
        let id = t.alloc(T_MODEL);
        let rec = ModelRecord {
            id,
            name: descriptor.name.clone(),
            identity: descriptor.identity.clone(),
            attributes: descriptor.attributes.clone(),
        };
        t.models.push(rec.clone());
        tprintln!("memory.model created name={} id={}", rec.name, rec.id);
        Ok(rec)
    }

    async fn find_or_create_role(&self, name: &str) -> StoreResult<Role> {
        self.check("find_or_create_role")?;
        let mut t = self.inner.lock();
        if let Some(existing) = t.roles.iter().find(|r| r.name == name) {
            return Ok(existing.clone());
        }
        let id = t.alloc(T_ROLE);
        let role = Role { id, name: name.to_string(), active: true };
        t.roles.push(role.clone());
        Ok(role)
    }

    async fn find_user_by_username(&self, username: &str) -> StoreResult<Option<User>> {
        self.check("find_user_by_username")?;
        Ok(self.inner.lock().users.iter().find(|u| u.username == username).cloned())
    }

    async fn find_user_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        self.check("find_user_by_email")?;
        Ok(self.inner.lock().users.iter().find(|u| u.email.eq_ignore_ascii_case(email)).cloned())
    }

    async fn register_user(&self, user: NewUser) -> StoreResult<User> {
        self.check("register_user")?;
        let mut t = self.inner.lock();
        if t.users.iter().any(|u| u.username == user.username) {
            return Err(StoreError::Conflict(format!("username '{}' already exists", user.username)));
        }
        if t.users.iter().any(|u| u.email.eq_ignore_ascii_case(&user.email)) {
            return Err(StoreError::Conflict(format!("email '{}' already exists", user.email)));
        }
        let id = t.alloc(T_USER);
        let rec = User {
            id,
            username: user.username,
            email: user.email,
            password_hash: user.password_hash,
            roles: user.roles,
            model: user.model,
            created_by: None,
            owner: None,
            created_at: chrono::Utc::now(),
        };
        t.users.push(rec.clone());
        tprintln!("memory.user registered username={} id={}", rec.username, rec.id);
        Ok(rec)
    }

    async fn save_user(&self, user: &User) -> StoreResult<User> {
        self.check("save_user")?;
        let mut t = self.inner.lock();
        let slot = t.users.iter_mut().find(|u| u.id == user.id)
            .ok_or_else(|| StoreError::NotFound(format!("user/{}", user.id)))?;
        *slot = user.clone();
        Ok(slot.clone())
    }

    async fn find_or_create_permission(&self, permission: NewPermission) -> StoreResult<Permission> {
        self.check("find_or_create_permission")?;
        let mut t = self.inner.lock();
        let key = permission.key();
        if let Some(existing) = t.permissions.iter().find(|p| (p.model, p.action, p.role, p.relation) == key) {
            return Ok(existing.clone());
        }
        let id = t.alloc(T_PERMISSION);
        let rec = Permission {
            id,
            model: permission.model,
            action: permission.action,
            relation: permission.relation,
            role: permission.role,
            created_by: permission.created_by,
            owner: permission.created_by,
        };
        t.permissions.push(rec.clone());
        Ok(rec)
    }

    async fn has_seed_marker(&self) -> StoreResult<bool> {
        self.check("has_seed_marker")?;
        Ok(self.inner.lock().seed_marker)
    }

    async fn write_seed_marker(&self) -> StoreResult<()> {
        self.check("write_seed_marker")?;
        self.inner.lock().seed_marker = true;
        Ok(())
    }
}
