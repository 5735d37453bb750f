use std::collections::BTreeMap;

use serde::Serialize;

use crate::model::{ModelRecord, RecordId};

/// Model identity to model row id, rebuilt from every seeding pass.
#[derive(Debug, Clone, Default, Serialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct ModelNameCache(BTreeMap<String, RecordId>);

impl ModelNameCache {
    pub fn from_records(models: &[ModelRecord]) -> Self {
        Self(models.iter().map(|m| (m.identity.clone(), m.id)).collect())
    }

    pub fn get(&self, identity: &str) -> Option<RecordId> { self.0.get(identity).copied() }
    pub fn contains(&self, identity: &str) -> bool { self.0.contains_key(identity) }
    pub fn len(&self) -> usize { self.0.len() }
    pub fn is_empty(&self) -> bool { self.0.is_empty() }
    pub fn iter(&self) -> impl Iterator<Item = (&str, RecordId)> { self.0.iter().map(|(k, v)| (k.as_str(), *v)) }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keyed_by_identity() {
        let recs = vec![
            ModelRecord { id: 4, name: "User".into(), identity: "user".into(), attributes: Default::default() },
            ModelRecord { id: 9, name: "Invoice".into(), identity: "invoice".into(), attributes: Default::default() },
        ];
        let cache = ModelNameCache::from_records(&recs);
        assert_eq!(cache.get("user"), Some(4));
        assert_eq!(cache.get("User"), None);
        assert_eq!(cache.iter().collect::<Vec<_>>(), vec![("invoice", 9), ("user", 4)]);
    }
}
