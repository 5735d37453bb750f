use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

pub type RecordId = u64;

/// One attribute of a data model, in the host ORM's declarative shape.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct Attribute {
    #[serde(rename = "type", default, skip_serializing_if = "Option::is_none")]
    pub kind: Option<String>,
    /// Target model for a single reference.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub collection: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub via: Option<String>,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub index: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub required: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub unique: bool,
}

impl Attribute {
    pub fn typed(kind: &str) -> Self { Self { kind: Some(kind.to_string()), ..Default::default() } }

    /// Indexed reference to another model.
    pub fn reference(model: &str) -> Self { Self { model: Some(model.to_string()), index: true, ..Default::default() } }

    pub fn collection(model: &str, via: &str) -> Self {
        Self { collection: Some(model.to_string()), via: Some(via.to_string()), ..Default::default() }
    }

    pub fn required(mut self) -> Self { self.required = true; self }
    pub fn unique(mut self) -> Self { self.unique = true; self }
}

/// Metadata describing one registered entity type.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModelDescriptor {
    pub name: String,
    pub identity: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, Attribute>,
    /// Per-model opt-out of ownership attributes.
    #[serde(default, alias = "autoCreatedBy", skip_serializing_if = "Option::is_none")]
    pub auto_created_by: Option<bool>,
}

impl ModelDescriptor {
    pub fn new(name: &str) -> Self {
        Self { name: name.to_string(), identity: name.to_lowercase(), attributes: BTreeMap::new(), auto_created_by: None }
    }

    pub fn with_attribute(mut self, name: &str, attr: Attribute) -> Self {
        self.attributes.insert(name.to_string(), attr);
        self
    }

    pub fn without_ownership(mut self) -> Self {
        self.auto_created_by = Some(false);
        self
    }

    /// Descriptors for the entities the permission system itself persists.
    pub fn core_catalog() -> Vec<ModelDescriptor> {
        vec![
            ModelDescriptor::new("Model")
                .with_attribute("name", Attribute::typed("string").required().unique())
                .with_attribute("identity", Attribute::typed("string").required())
                .with_attribute("attributes", Attribute::typed("json"))
                .with_attribute("permissions", Attribute::collection("Permission", "model")),
            ModelDescriptor::new("Permission")
                .with_attribute("model", Attribute::reference("Model").required())
                .with_attribute("action", Attribute::typed("string").required())
                .with_attribute("relation", Attribute::typed("string"))
                .with_attribute("role", Attribute::reference("Role"))
                .with_attribute("user", Attribute::reference("User")),
            ModelDescriptor::new("Role")
                .with_attribute("name", Attribute::typed("string").required().unique())
                .with_attribute("users", Attribute::collection("User", "roles"))
                .with_attribute("active", Attribute::typed("boolean")),
            ModelDescriptor::new("User")
                .with_attribute("username", Attribute::typed("string").required().unique())
                .with_attribute("email", Attribute::typed("email").unique())
                .with_attribute("roles", Attribute::collection("Role", "users")),
            ModelDescriptor::new("Passport")
                .with_attribute("protocol", Attribute::typed("string").required())
                .with_attribute("password", Attribute::typed("string"))
                .with_attribute("user", Attribute::reference("User").required()),
        ]
    }
}

/// Persisted row describing a model; permissions point at these.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct ModelRecord {
    pub id: RecordId,
    pub name: String,
    pub identity: String,
    #[serde(default)]
    pub attributes: BTreeMap<String, Attribute>,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Role {
    pub id: RecordId,
    pub name: String,
    pub active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: RecordId,
    pub username: String,
    pub email: String,
    #[serde(default, skip_serializing)]
    pub password_hash: Option<String>,
    #[serde(default)]
    pub roles: Vec<RecordId>,
    /// Model row describing the User entity.
    #[serde(default)]
    pub model: Option<RecordId>,
    #[serde(default)]
    pub created_by: Option<RecordId>,
    #[serde(default)]
    pub owner: Option<RecordId>,
    pub created_at: chrono::DateTime<chrono::Utc>,
}

#[derive(Debug, Clone)]
pub struct NewUser {
    pub username: String,
    pub email: String,
    pub password_hash: Option<String>,
    pub roles: Vec<RecordId>,
    pub model: Option<RecordId>,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Create,
    Read,
    Update,
    Delete,
}

impl Action {
    pub const CRUD: [Action; 4] = [Action::Create, Action::Read, Action::Update, Action::Delete];
}

/// Who a permission applies to: holders of the role, the row owner, or a named user.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum Relation {
    #[default]
    Role,
    Owner,
    User,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Permission {
    pub id: RecordId,
    pub model: RecordId,
    pub action: Action,
    pub relation: Relation,
    pub role: Option<RecordId>,
    pub created_by: Option<RecordId>,
    pub owner: Option<RecordId>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NewPermission {
    pub model: RecordId,
    pub action: Action,
    pub relation: Relation,
    pub role: Option<RecordId>,
    pub created_by: Option<RecordId>,
}

impl NewPermission {
    pub fn for_role(model: RecordId, action: Action, role: RecordId) -> Self {
        Self { model, action, relation: Relation::Role, role: Some(role), created_by: None }
    }

    pub fn owned_by(mut self, relation: Relation) -> Self {
        self.relation = relation;
        self
    }

    /// Identity used for find-or-create; the creator is not part of it.
    pub fn key(&self) -> (RecordId, Action, Option<RecordId>, Relation) { (self.model, self.action, self.role, self.relation) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn identity_is_lowercase_name() {
        let m = ModelDescriptor::new("Passport");
        assert_eq!(m.identity, "passport");
        assert!(m.attributes.is_empty());
        assert_eq!(m.auto_created_by, None);
    }

    #[test]
    fn core_catalog_has_user_model() {
        let cat = ModelDescriptor::core_catalog();
        let names: Vec<&str> = cat.iter().map(|m| m.name.as_str()).collect();
        assert_eq!(names, vec!["Model", "Permission", "Role", "User", "Passport"]);
    }

    #[test]
    fn attribute_json_shape() {
        let v = serde_json::to_value(Attribute::reference("User")).unwrap();
        assert_eq!(v, serde_json::json!({ "model": "User", "index": true }));
        let parsed: Attribute = serde_json::from_str(r#"{ "type": "string", "unique": true }"#).unwrap();
        assert_eq!(parsed, Attribute::typed("string").unique());
    }

    #[test]
    fn descriptor_opt_out_from_json() {
        let m: ModelDescriptor = serde_json::from_str(
            r#"{ "name": "AuditLog", "identity": "auditlog", "auto_created_by": false }"#,
        ).unwrap();
        assert_eq!(m.auto_created_by, Some(false));
        let m: ModelDescriptor = serde_json::from_str(
            r#"{ "name": "AuditLog", "identity": "auditlog", "autoCreatedBy": false }"#,
        ).unwrap();
        assert_eq!(m.auto_created_by, Some(false));
    }
}
