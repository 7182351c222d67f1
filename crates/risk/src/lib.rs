#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! Risk and changelog analysis
//!
//! A pure function: same `(from, to, changelog, release_notes)` always
//! yields the same [`RiskOutput`]. No I/O, no store access — the scan
//! engine feeds this analyzer already-fetched text.

use ratchet_errors::{Error, RiskError};
use ratchet_types::{RiskLevel, UpdateType};
use regex::Regex;
use semver::Version;

/// Everything the analyzer needs to classify one candidate update.
#[derive(Debug, Clone)]
pub struct RiskInput<'a> {
    pub from_version: &'a str,
    pub to_version: &'a str,
    pub changelog: &'a str,
    pub release_notes: &'a str,
}

/// Classification the planner and policy evaluator consume.
#[derive(Debug, Clone, PartialEq)]
pub struct RiskOutput {
    pub update_type: UpdateType,
    pub risk_level: RiskLevel,
    pub breaking: bool,
    pub security_fix: bool,
    pub severity: RiskLevel,
    pub confidence: f64,
    pub rationale: String,
    pub feature_count: u32,
    pub bugfix_count: u32,
    pub deprecation_count: u32,
}

const BREAKING_PATTERN: &str =
    r"(?i)breaking change|incompatible|removed|drop support|migration required";
const SECURITY_PATTERN: &str = r"(?i)CVE-\d{4}-\d+|security fix|vulnerability|patched|advisory";
const FEATURE_PATTERN: &str = r"(?i)feature|add|new";
const BUGFIX_PATTERN: &str = r"(?i)fix|bug";
const DEPRECATION_PATTERN: &str = r"(?i)deprecat";

/// Classify one candidate update.
///
/// Malformed regex construction here would be a programmer error (the
/// patterns are constants), not a caller input problem, so the only
/// realistic failure mode surfaced to callers is a malformed changelog
/// payload — the scan degrades the result rather than failing outright.
///
/// # Errors
///
/// Does not currently fail; kept fallible so a future changelog source
/// (e.g. one requiring decompression) can report [`RiskError`] without an
/// API break.
pub fn analyze(input: &RiskInput<'_>) -> Result<RiskOutput, Error> {
    let text = format!("{}\n{}", input.changelog, input.release_notes);

    let update_type = classify_update_type(input.from_version, input.to_version);
    let semver_parsed = update_type != UpdateType::Unknown;

    let breaking = matches(&text, BREAKING_PATTERN)?;
    let security_fix = matches(&text, SECURITY_PATTERN)?;
    let feature_count = count_matches(&text, FEATURE_PATTERN)?;
    let bugfix_count = count_matches(&text, BUGFIX_PATTERN)?;
    let deprecation_count = count_matches(&text, DEPRECATION_PATTERN)?;

    let risk_level = classify_risk_level(security_fix, breaking, update_type, deprecation_count);
    let severity = risk_level;

    let mut confidence: f64 = 0.5;
    if semver_parsed {
        confidence += 0.2;
    }
    if input.changelog.len() > 200 {
        confidence += 0.15;
    }
    if security_fix || breaking {
        confidence += 0.15;
    }
    let confidence = confidence.min(1.0);

    let rationale = rationale_for(update_type, breaking, security_fix, risk_level);

    Ok(RiskOutput {
        update_type,
        risk_level,
        breaking,
        security_fix,
        severity,
        confidence,
        rationale,
        feature_count,
        bugfix_count,
        deprecation_count,
    })
}

/// Degraded output used when the analyzer cannot be run at all: an
/// unparseable changelog yields `update_type=unknown, risk=low,
/// confidence=0.5` rather than an error.
#[must_use]
pub fn degraded(reason: impl Into<String>) -> RiskOutput {
    RiskOutput {
        update_type: UpdateType::Unknown,
        risk_level: RiskLevel::Low,
        breaking: false,
        security_fix: false,
        severity: RiskLevel::Low,
        confidence: 0.5,
        rationale: reason.into(),
        feature_count: 0,
        bugfix_count: 0,
        deprecation_count: 0,
    }
}

fn classify_update_type(from: &str, to: &str) -> UpdateType {
    let (Ok(from), Ok(to)) = (Version::parse(from), Version::parse(to)) else {
        return UpdateType::Unknown;
    };
    if !to.pre.is_empty() {
        return UpdateType::Prerelease;
    }
    if to.major != from.major {
        UpdateType::Major
    } else if to.minor != from.minor {
        UpdateType::Minor
    } else {
        UpdateType::Patch
    }
}

fn classify_risk_level(
    security_fix: bool,
    breaking: bool,
    update_type: UpdateType,
    deprecation_count: u32,
) -> RiskLevel {
    if security_fix {
        RiskLevel::Critical
    } else if breaking || update_type == UpdateType::Major {
        RiskLevel::High
    } else if update_type == UpdateType::Minor && deprecation_count >= 1 {
        RiskLevel::Medium
    } else {
        RiskLevel::Low
    }
}

fn rationale_for(
    update_type: UpdateType,
    breaking: bool,
    security_fix: bool,
    risk_level: RiskLevel,
) -> String {
    if security_fix {
        return "changelog references a security fix".to_string();
    }
    if breaking {
        return "changelog flags a breaking change".to_string();
    }
    format!("{update_type:?} update classified as {risk_level:?} risk")
}

fn matches(text: &str, pattern: &str) -> Result<bool, Error> {
    let re = Regex::new(pattern).map_err(|e| {
        RiskError::MalformedChangelog {
            message: e.to_string(),
        }
        .into()
    })?;
    Ok(re.is_match(text))
}

fn count_matches(text: &str, pattern: &str) -> Result<u32, Error> {
    let re = Regex::new(pattern).map_err(|e| {
        RiskError::MalformedChangelog {
            message: e.to_string(),
        }
        .into()
    })?;
    Ok(u32::try_from(re.find_iter(text).count()).unwrap_or(u32::MAX))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn patch_security_fix_is_critical() {
        let input = RiskInput {
            from_version: "4.17.20",
            to_version: "4.17.21",
            changelog: "Fixes a prototype pollution issue (CVE-2021-1234)",
            release_notes: "",
        };
        let out = analyze(&input).unwrap();
        assert_eq!(out.update_type, UpdateType::Patch);
        assert!(out.security_fix);
        assert_eq!(out.risk_level, RiskLevel::Critical);
    }

    #[test]
    fn major_breaking_change_is_high_risk() {
        let input = RiskInput {
            from_version: "17.0.0",
            to_version: "18.0.0",
            changelog: "Breaking change: removed ReactDOM.render",
            release_notes: "",
        };
        let out = analyze(&input).unwrap();
        assert_eq!(out.update_type, UpdateType::Major);
        assert!(out.breaking);
        assert_eq!(out.risk_level, RiskLevel::High);
    }

    #[test]
    fn unparseable_versions_are_unknown() {
        let input = RiskInput {
            from_version: "not-a-version",
            to_version: "also-not-one",
            changelog: "",
            release_notes: "",
        };
        let out = analyze(&input).unwrap();
        assert_eq!(out.update_type, UpdateType::Unknown);
        assert_eq!(out.risk_level, RiskLevel::Low);
    }

    #[test]
    fn confidence_is_capped_at_one() {
        let input = RiskInput {
            from_version: "1.0.0",
            to_version: "2.0.0",
            changelog: &"breaking change ".repeat(30),
            release_notes: "",
        };
        let out = analyze(&input).unwrap();
        assert!(out.confidence <= 1.0);
    }

    #[test]
    fn is_a_pure_function() {
        let input = RiskInput {
            from_version: "1.2.3",
            to_version: "1.3.0",
            changelog: "Added a new feature; deprecates the old API",
            release_notes: "",
        };
        assert_eq!(analyze(&input).unwrap(), analyze(&input).unwrap());
    }
}
