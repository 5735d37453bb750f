use super::*;

#[test]
fn code_str_mapping() {
    let e: BootstrapError = ConfigurationError::MissingAuthHook { hook: "auth".into() }.into();
    assert_eq!(e.code_str(), "missing_auth_hook");
    let e: BootstrapError = ConfigurationError::MissingPolicies { missing: vec!["OwnerPolicy".into()] }.into();
    assert_eq!(e.code_str(), "missing_policies");
    let e = BootstrapError::seeding(SeedStage::AdminOwnership, SeedError::Lookup("admin@example.com".into()));
    assert_eq!(e.code_str(), "admin_lookup_failed");
    let e = BootstrapError::seeding(SeedStage::Roles, StoreError::Backend("down".into()));
    assert_eq!(e.code_str(), "seeding_failed");
    let e = BootstrapError::SeedCheck(StoreError::Backend("down".into()));
    assert_eq!(e.code_str(), "seed_check_failed");
    assert!(!e.is_fatal());
}

#[test]
fn only_configuration_errors_are_fatal() {
    let e: BootstrapError = ConfigurationError::MissingAuthHook { hook: "auth".into() }.into();
    assert!(e.is_fatal());
    assert_eq!(e.stage(), None);
    let e = BootstrapError::seeding(SeedStage::Permissions, SeedError::MissingSetting("permissions.admin_email"));
    assert!(!e.is_fatal());
    assert_eq!(e.stage(), Some(SeedStage::Permissions));
}

#[test]
fn display_names_failed_requirements() {
    let e = ConfigurationError::MissingPolicies { missing: vec!["OwnerPolicy".into(), "AuditPolicy".into()] };
    assert_eq!(e.to_string(), "one or more required policies are missing: OwnerPolicy, AuditPolicy");
    let e = BootstrapError::seeding(SeedStage::Users, SeedError::MissingSetting("permissions.admin_password"));
    assert_eq!(e.to_string(), "seeding failed at stage 'users': permissions.admin_password is not set");
}
