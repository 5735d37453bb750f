//! Ownership attributes: every model gains `createdBy` and `owner` references to
//! `User` unless it opts out. Existing attributes with those names win.

use tracing::debug;

use crate::model::{Attribute, ModelDescriptor};

pub const CREATED_BY: &str = "createdBy";
pub const OWNER: &str = "owner";
pub const OWNERSHIP_ATTRIBUTES: [&str; 2] = [CREATED_BY, OWNER];

/// Defaults-merge the ownership attributes into each descriptor.
/// Returns how many attributes were added; a repeated run adds none.
pub fn install_model_ownership(models: &mut [ModelDescriptor], global: Option<bool>) -> usize {
    if global == Some(false) {
        debug!(target: "permissions", "ownership attributes disabled for all models");
        return 0;
    }
    let mut added = 0usize;
    for model in models.iter_mut() {
        if model.auto_created_by == Some(false) { continue; }
        for name in OWNERSHIP_ATTRIBUTES {
            if !model.attributes.contains_key(name) {
                model.attributes.insert(name.to_string(), Attribute::reference("User"));
                added += 1;
            }
        }
    }
    debug!(target: "permissions", models = models.len(), added, "installed model ownership");
    added
}

#[cfg(test)]
mod tests {
    use super::*;

    fn catalog() -> Vec<ModelDescriptor> {
        vec![
            ModelDescriptor::new("Invoice").with_attribute("total", Attribute::typed("float")),
            ModelDescriptor::new("AuditLog").without_ownership(),
            ModelDescriptor::new("Note").with_attribute(OWNER, Attribute::reference("Team")),
        ]
    }

    #[test]
    fn adds_both_attributes_as_indexed_user_refs() {
        let mut models = catalog();
        install_model_ownership(&mut models, None);
        let invoice = &models[0];
        assert_eq!(invoice.attributes.len(), 3);
        assert_eq!(invoice.attributes[CREATED_BY], Attribute::reference("User"));
        assert_eq!(invoice.attributes[OWNER], Attribute::reference("User"));
        assert!(invoice.attributes[OWNER].index);
    }

    #[test]
    fn never_overwrites_existing_attribute() {
        let mut models = catalog();
        let added = install_model_ownership(&mut models, Some(true));
        // Invoice +2, AuditLog +0, Note +1
        assert_eq!(added, 3);
        assert_eq!(models[2].attributes[OWNER].model.as_deref(), Some("Team"));
        assert_eq!(models[2].attributes[CREATED_BY].model.as_deref(), Some("User"));
    }

    #[test]
    fn per_model_opt_out_wins_over_global_flag() {
        let mut models = catalog();
        let before = models[1].clone();
        install_model_ownership(&mut models, Some(true));
        assert_eq!(models[1], before);
    }

    #[test]
    fn global_opt_out_is_noop() {
        let mut models = catalog();
        let before = models.clone();
        assert_eq!(install_model_ownership(&mut models, Some(false)), 0);
        assert_eq!(models, before);
    }

    #[test]
    fn idempotent() {
        let mut once = catalog();
        install_model_ownership(&mut once, None);
        let mut twice = catalog();
        install_model_ownership(&mut twice, None);
        assert_eq!(install_model_ownership(&mut twice, None), 0);
        assert_eq!(once, twice);
    }
}
