#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions, clippy::too_many_lines)]

//! Structured policy matching against candidate updates

use chrono::{DateTime, Datelike, Timelike, Utc};
use ratchet_errors::{Error, PolicyError};
use ratchet_types::{
    AutoUpdateLevel, Dependency, PolicyActions, PolicyConditions, PolicyDecision, Project,
    TimeWindow, Update, UpdatePolicy, UpdateType,
};
use regex::Regex;

/// Everything one evaluation needs about a single candidate update.
pub struct EvaluationInput<'a> {
    pub update: &'a Update,
    pub dependency: &'a Dependency,
    pub project: &'a Project,
    /// Confidence of the risk-level prediction for this update, if one exists.
    pub confidence: Option<f64>,
    /// Whether a `SecurityCheck` with status `detected` exists for
    /// (dependency.name, dependency.current_version).
    pub security_check_detected: bool,
    pub now: DateTime<Utc>,
}

/// The coarse config-level filter, kept as its own small struct so this
/// crate need not depend on `ratchet-config`.
#[derive(Debug, Clone, Copy)]
pub struct ConfigOverlay {
    pub auto_update_level: AutoUpdateLevel,
    pub require_confirmation: bool,
    pub whitelist_enabled: bool,
}

/// Result of evaluating one candidate update against a policy set.
#[derive(Debug, Clone)]
pub struct PolicyEvaluation {
    pub decision: PolicyDecision,
    pub matched_policy: Option<String>,
    pub rationale: String,
    pub risk_score: f64,
}

/// Validate a policy's structured fields before it is persisted.
///
/// # Errors
///
/// Returns [`PolicyError::InvalidRegex`] if any pattern field fails to
/// compile, or [`PolicyError::OutOfRange`] if a numeric field falls outside
/// its documented range.
pub fn validate_policy(policy: &UpdatePolicy) -> Result<(), Error> {
    let c = &policy.conditions;
    check_regex(&policy.name, "package_patterns", c.package_patterns.as_deref())?;
    check_regex(&policy.name, "project_patterns", c.project_patterns.as_deref())?;
    if let Some(p) = &c.current_version_pattern {
        check_regex(&policy.name, "current_version_pattern", Some(std::slice::from_ref(p)))?;
    }
    if let Some(p) = &c.target_version_pattern {
        check_regex(&policy.name, "target_version_pattern", Some(std::slice::from_ref(p)))?;
    }
    check_range(&policy.name, "risk_score_min", c.risk_score_min, 0.0, 10.0)?;
    check_range(&policy.name, "risk_score_max", c.risk_score_max, 0.0, 10.0)?;
    check_range(&policy.name, "confidence_min", c.confidence_min, 0.0, 1.0)?;
    check_range(&policy.name, "confidence_max", c.confidence_max, 0.0, 1.0)?;
    Ok(())
}

fn check_regex(name: &str, field: &str, patterns: Option<&[String]>) -> Result<(), Error> {
    let Some(patterns) = patterns else { return Ok(()) };
    for pattern in patterns {
        if let Err(e) = Regex::new(pattern) {
            return Err(PolicyError::InvalidRegex {
                name: name.to_string(),
                field: field.to_string(),
                message: e.to_string(),
            }
            .into());
        }
    }
    Ok(())
}

fn check_range(name: &str, field: &str, value: Option<f64>, min: f64, max: f64) -> Result<(), Error> {
    if let Some(v) = value {
        if v < min || v > max {
            return Err(PolicyError::OutOfRange {
                name: name.to_string(),
                field: field.to_string(),
                value: v.to_string(),
            }
            .into());
        }
    }
    Ok(())
}

/// Base-by-update-type risk score, before the `SecurityCheck` bonus.
fn base_risk_score(update_type: UpdateType) -> f64 {
    match update_type {
        UpdateType::Security => 2.0,
        UpdateType::Major => 4.0,
        UpdateType::Minor => 2.0,
        UpdateType::Patch | UpdateType::Prerelease | UpdateType::Unknown => 1.0,
    }
}

/// Compute the policy-facing risk score ∈ [0,10] for a candidate update.
#[must_use]
pub fn risk_score(update: &Update, security_check_detected: bool) -> f64 {
    let mut score = base_risk_score(update.update_type);
    if security_check_detected {
        score += 3.0;
    }
    score.min(10.0)
}

/// Evaluate `input` against `policies`, then apply the config overlay.
///
/// A pattern field that fails to compile its regex is treated as
/// non-matching rather than aborting the whole evaluation — `validate_policy`
/// is what should have caught it before the policy was ever persisted.
#[must_use]
pub fn evaluate(policies: &[UpdatePolicy], input: &EvaluationInput<'_>, overlay: &ConfigOverlay) -> PolicyEvaluation {
    let score = risk_score(input.update, input.security_check_detected);
    tracing::debug!(dependency = %input.dependency.name, risk_score = score, "evaluating update policies");

    let mut candidates: Vec<&UpdatePolicy> = policies
        .iter()
        .filter(|p| p.enabled)
        .filter(|p| p.project_id.is_none() || p.project_id == Some(input.project.id))
        .filter(|p| match_ratio(&p.conditions, input, score) >= 0.5)
        .collect();
    candidates.sort_by(|a, b| b.priority.cmp(&a.priority));

    let Some(winner) = candidates.first() else {
        let decision = apply_overlay(PolicyDecision::Allow, false, overlay, input.update.update_type);
        return PolicyEvaluation {
            decision,
            matched_policy: None,
            rationale: "no policy matched; falling back to config overlay".to_string(),
            risk_score: score,
        };
    };

    let decision = decision_for(&winner.actions);
    let decision = apply_overlay(decision, true, overlay, input.update.update_type);

    PolicyEvaluation {
        decision,
        matched_policy: Some(winner.name.clone()),
        rationale: format!("matched policy {:?} (priority {})", winner.name, winner.priority),
        risk_score: score,
    }
}

fn decision_for(actions: &PolicyActions) -> PolicyDecision {
    if actions.block_update == Some(true) {
        PolicyDecision::Block
    } else if actions.require_approval == Some(true) {
        PolicyDecision::RequireApproval
    } else if actions.auto_update == Some(true) {
        PolicyDecision::AutoUpdate
    } else {
        PolicyDecision::Allow
    }
}

/// Narrow `decision` per the config-level overlay.
fn apply_overlay(
    decision: PolicyDecision,
    policy_matched: bool,
    overlay: &ConfigOverlay,
    update_type: UpdateType,
) -> PolicyDecision {
    let mut decision = decision;

    if decision == PolicyDecision::AutoUpdate && !auto_update_level_permits(overlay.auto_update_level, update_type) {
        decision = PolicyDecision::RequireApproval;
    }

    if !policy_matched && decision == PolicyDecision::Allow {
        if overlay.whitelist_enabled {
            decision = PolicyDecision::Block;
        } else if overlay.require_confirmation {
            decision = PolicyDecision::RequireApproval;
        }
    }

    decision
}

/// Whether `level` is permissive enough to auto-apply an update of
/// `update_type`: patch and security fixes need only `Security`, minor
/// bumps need `Minor`, major bumps and anything unclassified need `Major`.
fn auto_update_level_permits(level: AutoUpdateLevel, update_type: UpdateType) -> bool {
    let required = match update_type {
        UpdateType::Patch | UpdateType::Security => AutoUpdateLevel::Security,
        UpdateType::Minor => AutoUpdateLevel::Minor,
        UpdateType::Major | UpdateType::Prerelease | UpdateType::Unknown => AutoUpdateLevel::Major,
    };
    auto_update_level_rank(level) >= auto_update_level_rank(required)
}

fn auto_update_level_rank(level: AutoUpdateLevel) -> u8 {
    match level {
        AutoUpdateLevel::None => 0,
        AutoUpdateLevel::Security => 1,
        AutoUpdateLevel::Minor => 2,
        AutoUpdateLevel::Major => 3,
    }
}

fn match_ratio(conditions: &PolicyConditions, input: &EvaluationInput<'_>, score: f64) -> f64 {
    let mut total = 0u32;
    let mut matched = 0u32;
    let mut check = |populated: bool, holds: bool| {
        if populated {
            total += 1;
            if holds {
                matched += 1;
            }
        }
    };

    check(
        conditions.package_names.is_some(),
        conditions
            .package_names
            .as_ref()
            .is_some_and(|names| names.iter().any(|n| n == &input.dependency.name)),
    );
    check(
        conditions.package_patterns.is_some(),
        conditions.package_patterns.as_ref().is_some_and(|patterns| {
            patterns
                .iter()
                .filter_map(|p| Regex::new(p).ok())
                .any(|re| re.is_match(&input.dependency.name))
        }),
    );
    check(
        conditions.package_types.is_some(),
        conditions
            .package_types
            .as_ref()
            .is_some_and(|types| types.contains(&input.project.ecosystem)),
    );
    check(
        conditions.current_version_pattern.is_some(),
        conditions.current_version_pattern.as_deref().is_some_and(|p| {
            input
                .dependency
                .current_version
                .as_ref()
                .is_some_and(|v| Regex::new(p).is_ok_and(|re| re.is_match(&v.to_string())))
        }),
    );
    check(
        conditions.target_version_pattern.is_some(),
        conditions
            .target_version_pattern
            .as_deref()
            .is_some_and(|p| Regex::new(p).is_ok_and(|re| re.is_match(&input.update.to_version.to_string()))),
    );
    check(
        conditions.version_change_type.is_some(),
        conditions.version_change_type == Some(input.update.update_type),
    );
    check(
        conditions.update_types.is_some(),
        conditions
            .update_types
            .as_ref()
            .is_some_and(|types| types.contains(&input.update.update_type)),
    );
    check(
        conditions.security_risk.is_some(),
        conditions.security_risk == Some(input.update.security_fix),
    );
    check(
        conditions.breaking_change.is_some(),
        conditions.breaking_change == Some(input.update.breaking),
    );
    check(
        conditions.risk_score_min.is_some(),
        conditions.risk_score_min.is_some_and(|min| score >= min),
    );
    check(
        conditions.risk_score_max.is_some(),
        conditions.risk_score_max.is_some_and(|max| score <= max),
    );
    check(
        conditions.confidence_min.is_some(),
        conditions.confidence_min.is_some_and(|min| input.confidence.is_some_and(|c| c >= min)),
    );
    check(
        conditions.confidence_max.is_some(),
        conditions.confidence_max.is_some_and(|max| input.confidence.is_some_and(|c| c <= max)),
    );
    // Lag-days conditions are accepted but never satisfied: lag computation
    // is left outside the core (see design notes on adapter-provided
    // release timestamps).
    check(conditions.update_lag_days_min.is_some(), false);
    check(conditions.update_lag_days_max.is_some(), false);
    check(
        conditions.time_window.is_some(),
        conditions
            .time_window
            .as_ref()
            .is_some_and(|w| time_window_matches(w, input.now)),
    );
    check(
        conditions.project_names.is_some(),
        conditions
            .project_names
            .as_ref()
            .is_some_and(|names| names.iter().any(|n| n == &input.project.name)),
    );
    check(
        conditions.project_patterns.is_some(),
        conditions.project_patterns.as_ref().is_some_and(|patterns| {
            patterns
                .iter()
                .filter_map(|p| Regex::new(p).ok())
                .any(|re| re.is_match(&input.project.name))
        }),
    );
    // `Project` carries no tag list; see design notes.
    check(conditions.project_tags.is_some(), false);

    if total == 0 {
        return 0.0;
    }
    f64::from(matched) / f64::from(total)
}

fn time_window_matches(window: &TimeWindow, now: DateTime<Utc>) -> bool {
    if let Some(days) = &window.days_of_week {
        let today = u8::try_from(now.weekday().num_days_from_sunday()).unwrap_or(0);
        if !days.contains(&today) {
            return false;
        }
    }
    let minutes_now = now.hour() * 60 + now.minute();
    if let (Some(start), Some(end)) = (&window.start_time, &window.end_time) {
        let (Some(start), Some(end)) = (parse_hhmm(start), parse_hhmm(end)) else {
            return false;
        };
        if minutes_now < start || minutes_now > end {
            return false;
        }
    }
    true
}

fn parse_hhmm(raw: &str) -> Option<u32> {
    let (h, m) = raw.split_once(':')?;
    Some(h.parse::<u32>().ok()? * 60 + m.parse::<u32>().ok()?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratchet_types::{DependencyClass, EcosystemKind, RiskLevel, UpdateStatus};
    use semver::Version;

    fn project() -> Project {
        Project::new("demo", "/tmp/demo", EcosystemKind::Npm, "package.json")
    }

    fn dependency() -> Dependency {
        Dependency::new(1, "webpack", "^4.0.0", DependencyClass::Direct, "npm")
    }

    fn update(update_type: UpdateType, breaking: bool) -> Update {
        Update {
            id: 1,
            dependency_id: 1,
            from_version: Version::parse("4.0.0").unwrap(),
            to_version: Version::parse("5.0.0").unwrap(),
            update_type,
            severity: RiskLevel::High,
            breaking,
            security_fix: false,
            status: UpdateStatus::Pending,
            applied_at: None,
        }
    }

    fn overlay() -> ConfigOverlay {
        ConfigOverlay {
            auto_update_level: AutoUpdateLevel::Major,
            require_confirmation: false,
            whitelist_enabled: false,
        }
    }

    #[test]
    fn no_policies_allows_by_default() {
        let project = project();
        let dependency = dependency();
        let update = update(UpdateType::Major, false);
        let input = EvaluationInput {
            update: &update,
            dependency: &dependency,
            project: &project,
            confidence: None,
            security_check_detected: false,
            now: Utc::now(),
        };
        let result = evaluate(&[], &input, &overlay());
        assert_eq!(result.decision, PolicyDecision::Allow);
    }

    #[test]
    fn matching_policy_blocks_major_updates() {
        let policy = UpdatePolicy::new(
            "block-major-npm",
            None,
            80,
            PolicyConditions {
                package_types: Some(vec![EcosystemKind::Npm]),
                update_types: Some(vec![UpdateType::Major]),
                ..PolicyConditions::default()
            },
            PolicyActions {
                block_update: Some(true),
                ..PolicyActions::default()
            },
        );
        let project = project();
        let dependency = dependency();
        let update = update(UpdateType::Major, false);
        let input = EvaluationInput {
            update: &update,
            dependency: &dependency,
            project: &project,
            confidence: None,
            security_check_detected: false,
            now: Utc::now(),
        };
        let result = evaluate(std::slice::from_ref(&policy), &input, &overlay());
        assert_eq!(result.decision, PolicyDecision::Block);
        assert_eq!(result.matched_policy.as_deref(), Some("block-major-npm"));
    }

    #[test]
    fn whitelist_blocks_unmatched_allow() {
        let project = project();
        let dependency = dependency();
        let update = update(UpdateType::Patch, false);
        let input = EvaluationInput {
            update: &update,
            dependency: &dependency,
            project: &project,
            confidence: None,
            security_check_detected: false,
            now: Utc::now(),
        };
        let overlay = ConfigOverlay {
            auto_update_level: AutoUpdateLevel::None,
            require_confirmation: false,
            whitelist_enabled: true,
        };
        let result = evaluate(&[], &input, &overlay);
        assert_eq!(result.decision, PolicyDecision::Block);
    }

    #[test]
    fn invalid_regex_is_rejected_at_validation() {
        let policy = UpdatePolicy::new(
            "bad-regex",
            None,
            10,
            PolicyConditions {
                package_patterns: Some(vec!["[unterminated".to_string()]),
                ..PolicyConditions::default()
            },
            PolicyActions::default(),
        );
        assert!(validate_policy(&policy).is_err());
    }

    #[test]
    fn risk_score_caps_at_ten() {
        let update = update(UpdateType::Major, false);
        assert!((risk_score(&update, true) - 7.0).abs() < f64::EPSILON);
    }
}
