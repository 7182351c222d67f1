//! Integration tests for the data model

use ratchet_types::*;

#[test]
fn dependency_classifies_unknown_when_current_missing() {
    let latest = Version::parse("2.0.0").unwrap();
    let status = Dependency::classify(None, &latest);
    assert_eq!(status, DependencyStatus::Unknown);
}

#[test]
fn dependency_classifies_up_to_date_on_equal_versions() {
    let v = Version::parse("2.0.0").unwrap();
    let status = Dependency::classify(Some(&v), &v);
    assert_eq!(status, DependencyStatus::UpToDate);
}

#[test]
fn dependency_classifies_outdated_on_differing_versions() {
    let current = Version::parse("1.0.0").unwrap();
    let latest = Version::parse("2.0.0").unwrap();
    let status = Dependency::classify(Some(&current), &latest);
    assert_eq!(status, DependencyStatus::Outdated);
}

#[test]
fn risk_level_max_of_picks_critical_over_high() {
    let levels = vec![RiskLevel::Low, RiskLevel::High, RiskLevel::Critical, RiskLevel::Medium];
    assert_eq!(RiskLevel::max_of(levels), RiskLevel::Critical);
}

#[test]
fn risk_level_max_of_empty_defaults_low() {
    assert_eq!(RiskLevel::max_of(Vec::new()), RiskLevel::Low);
}

#[test]
fn rollback_item_reverses_update_versions() {
    let from = Version::parse("1.0.0").unwrap();
    let to = Version::parse("1.1.0").unwrap();
    let item = RollbackItem::reverse_of(1, "lodash", from.clone(), to.clone());
    assert_eq!(item.from_version, to);
    assert_eq!(item.to_version, from);
}

#[test]
fn policy_priority_clamped_to_100() {
    let policy = UpdatePolicy::new(
        "block-majors",
        None,
        250,
        PolicyConditions::default(),
        PolicyActions::default(),
    );
    assert_eq!(policy.priority, 100);
}

#[test]
fn ecosystem_kind_round_trips_through_serde() {
    let kind = EcosystemKind::Npm;
    let json = serde_json::to_string(&kind).unwrap();
    assert_eq!(json, "\"npm\"");
    let back: EcosystemKind = serde_json::from_str(&json).unwrap();
    assert_eq!(back, kind);
}
