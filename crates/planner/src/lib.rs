#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Grouping candidate updates into an ordered, risk-stratified plan

use chrono::Utc;
use ratchet_errors::{Error, PlannerError};
use ratchet_types::{Dependency, RiskLevel, RollbackPlan, Update, UpdateType};
use std::time::Duration;

/// One candidate update paired with the dependency it belongs to, so the
/// planner can order sequential groups by dependency name without a store
/// round-trip per item.
#[derive(Debug, Clone)]
pub struct Candidate {
    pub dependency: Dependency,
    pub update: Update,
}

/// The canonical group a candidate update is assigned to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum GroupKey {
    Security,
    Breaking,
    HighRisk,
    Major,
    Minor,
    Patch,
}

impl GroupKey {
    /// Fixed execution order, most sensitive first; empty groups are omitted.
    const CANONICAL_ORDER: [Self; 6] = [
        Self::Security,
        Self::Breaking,
        Self::HighRisk,
        Self::Major,
        Self::Minor,
        Self::Patch,
    ];

    /// Whether updates in this group may execute concurrently.
    #[must_use]
    pub fn is_parallel(self) -> bool {
        matches!(self, Self::Patch | Self::Minor)
    }

    fn assign(candidate: &Candidate) -> Self {
        let update = &candidate.update;
        if update.security_fix {
            Self::Security
        } else if update.breaking {
            Self::Breaking
        } else if matches!(update.severity, RiskLevel::High | RiskLevel::Critical) {
            Self::HighRisk
        } else if update.update_type == UpdateType::Major {
            Self::Major
        } else if update.update_type == UpdateType::Minor {
            Self::Minor
        } else {
            Self::Patch
        }
    }
}

/// One ordered phase of the plan.
#[derive(Debug, Clone)]
pub struct UpdateGroup {
    pub key: GroupKey,
    pub parallel: bool,
    pub candidates: Vec<Candidate>,
}

/// Aggregate risk counts across a plan.
#[derive(Debug, Clone, Default)]
pub struct RiskSummary {
    pub low: u32,
    pub medium: u32,
    pub high: u32,
    pub critical: u32,
    pub breaking_count: u32,
    pub security_count: u32,
    pub overall: Option<RiskLevel>,
}

/// The planner's output.
#[derive(Debug, Clone)]
pub struct UpdatePlan {
    pub project_id: i64,
    pub update_groups: Vec<UpdateGroup>,
    pub risk_summary: RiskSummary,
    pub recommendations: Vec<String>,
    pub warnings: Vec<String>,
    pub estimated_time: Duration,
    pub rollback_plan: RollbackPlan,
}

const BASE_PER_UPDATE: Duration = Duration::from_secs(30);
const BREAKING_SURCHARGE: Duration = Duration::from_secs(120);
const MAJOR_SURCHARGE: Duration = Duration::from_secs(60);

/// Build an [`UpdatePlan`] from a flat list of candidate updates.
///
/// # Errors
///
/// Returns [`PlannerError::NothingToPlan`] if `candidates` is empty — there
/// is nothing to group, order, or estimate.
pub fn generate_plan(project_id: i64, candidates: Vec<Candidate>) -> Result<UpdatePlan, Error> {
    if candidates.is_empty() {
        return Err(PlannerError::NothingToPlan(project_id).into());
    }

    let mut buckets: std::collections::HashMap<GroupKey, Vec<Candidate>> =
        std::collections::HashMap::new();
    let mut risk_summary = RiskSummary::default();
    let mut estimated_time = Duration::ZERO;

    for candidate in candidates {
        let key = GroupKey::assign(&candidate);
        tally(&mut risk_summary, &candidate.update);
        estimated_time += estimate_for(&candidate.update);
        buckets.entry(key).or_default().push(candidate);
    }

    risk_summary.overall = RiskLevel::max_of(
        [
            (risk_summary.low > 0).then_some(RiskLevel::Low),
            (risk_summary.medium > 0).then_some(RiskLevel::Medium),
            (risk_summary.high > 0).then_some(RiskLevel::High),
            (risk_summary.critical > 0).then_some(RiskLevel::Critical),
        ]
        .into_iter()
        .flatten(),
    )
    .into();

    let update_groups = GroupKey::CANONICAL_ORDER
        .into_iter()
        .filter_map(|key| {
            let mut candidates = buckets.remove(&key)?;
            candidates.sort_by(|a, b| a.dependency.name.cmp(&b.dependency.name));
            Some(UpdateGroup {
                key,
                parallel: key.is_parallel(),
                candidates,
            })
        })
        .collect();

    let warnings = if risk_summary.critical > 0 {
        vec!["plan contains critical-severity updates".to_string()]
    } else {
        Vec::new()
    };
    let recommendations = if risk_summary.breaking_count > 0 {
        vec!["review breaking-change updates before applying".to_string()]
    } else {
        Vec::new()
    };

    Ok(UpdatePlan {
        project_id,
        update_groups,
        risk_summary,
        recommendations,
        warnings,
        estimated_time,
        rollback_plan: RollbackPlan::new(project_id, Utc::now()),
    })
}

fn tally(summary: &mut RiskSummary, update: &Update) {
    match update.severity {
        RiskLevel::Low => summary.low += 1,
        RiskLevel::Medium => summary.medium += 1,
        RiskLevel::High => summary.high += 1,
        RiskLevel::Critical => summary.critical += 1,
    }
    if update.breaking {
        summary.breaking_count += 1;
    }
    if update.security_fix {
        summary.security_count += 1;
    }
}

fn estimate_for(update: &Update) -> Duration {
    let mut total = BASE_PER_UPDATE;
    if update.breaking {
        total += BREAKING_SURCHARGE;
    }
    if update.update_type == UpdateType::Major {
        total += MAJOR_SURCHARGE;
    }
    total
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratchet_types::{DependencyClass, UpdateStatus};
    use semver::Version;

    fn candidate(name: &str, update_type: UpdateType, severity: RiskLevel, breaking: bool, security_fix: bool) -> Candidate {
        let dependency = Dependency::new(1, name, "^1.0.0", DependencyClass::Direct, "npm");
        let update = Update {
            id: 0,
            dependency_id: dependency.id,
            from_version: Version::parse("1.0.0").unwrap(),
            to_version: Version::parse("2.0.0").unwrap(),
            update_type,
            severity,
            breaking,
            security_fix,
            status: UpdateStatus::Pending,
            applied_at: None,
        };
        Candidate { dependency, update }
    }

    #[test]
    fn empty_candidates_is_an_error() {
        assert!(generate_plan(1, Vec::new()).is_err());
    }

    #[test]
    fn groups_follow_canonical_order() {
        let candidates = vec![
            candidate("patch-pkg", UpdateType::Patch, RiskLevel::Low, false, false),
            candidate("major-pkg", UpdateType::Major, RiskLevel::High, false, false),
            candidate("secure-pkg", UpdateType::Patch, RiskLevel::Critical, false, true),
        ];
        let plan = generate_plan(1, candidates).unwrap();
        let keys: Vec<_> = plan.update_groups.iter().map(|g| g.key).collect();
        assert_eq!(keys, vec![GroupKey::Security, GroupKey::Major, GroupKey::Patch]);
    }

    #[test]
    fn overall_risk_is_the_maximum_present() {
        let candidates = vec![
            candidate("a", UpdateType::Patch, RiskLevel::Low, false, false),
            candidate("b", UpdateType::Major, RiskLevel::High, false, false),
        ];
        let plan = generate_plan(1, candidates).unwrap();
        assert_eq!(plan.risk_summary.overall, Some(RiskLevel::High));
    }

    #[test]
    fn sequential_group_is_sorted_by_dependency_name() {
        let candidates = vec![
            candidate("zeta", UpdateType::Major, RiskLevel::High, false, false),
            candidate("alpha", UpdateType::Major, RiskLevel::High, false, false),
        ];
        let plan = generate_plan(1, candidates).unwrap();
        let group = &plan.update_groups[0];
        let names: Vec<_> = group.candidates.iter().map(|c| c.dependency.name.clone()).collect();
        assert_eq!(names, vec!["alpha".to_string(), "zeta".to_string()]);
    }

    #[test]
    fn estimate_includes_breaking_surcharge() {
        let candidates = vec![candidate("a", UpdateType::Major, RiskLevel::High, true, false)];
        let plan = generate_plan(1, candidates).unwrap();
        assert_eq!(plan.estimated_time, Duration::from_secs(30 + 120 + 60));
    }
}
