#![deny(clippy::pedantic, unsafe_code)]
#![allow(clippy::module_name_repetitions)]

//! `PackageAdapter` capability set
//!
//! The core never speaks HTTP to a registry or shells out to npm/pip/maven
//! directly — it calls through this trait. Production adapters for each
//! ecosystem are a separate concern from the core; this crate defines only
//! the interface and registry the core consumes, plus a `MockAdapter` the
//! core's own test suite scripts against.

pub mod mock;
pub mod registry;

pub use mock::MockAdapter;
pub use registry::AdapterRegistry;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ratchet_errors::Error;
use ratchet_types::{DependencyClass, EcosystemKind};
use semver::Version;
use std::path::{Path, PathBuf};

/// A project discovered on disk by `detect_projects`.
#[derive(Debug, Clone, PartialEq)]
pub struct ProjectDescriptor {
    pub name: String,
    pub path: PathBuf,
    pub config_file: PathBuf,
}

/// One dependency entry parsed from a project's manifest.
#[derive(Debug, Clone, PartialEq)]
pub struct DependencyEntry {
    pub name: String,
    pub declared_constraint: String,
    pub resolved_version: Option<Version>,
    pub class: DependencyClass,
}

/// Result of `latest_version`.
#[derive(Debug, Clone, PartialEq)]
pub struct LatestVersion {
    pub version: Version,
    pub published_at: Option<DateTime<Utc>>,
}

/// Result of `changelog`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ChangelogInfo {
    pub description: String,
    pub url: Option<String>,
    pub is_breaking_hint: bool,
    pub security_hint: bool,
}

/// The capability set an ecosystem-specific implementation must satisfy.
///
/// Every read (`parse_dependencies`, `latest_version`, `changelog`) must be
/// idempotent; `apply_update` is the only mutating call.
#[async_trait]
pub trait PackageAdapter: Send + Sync {
    /// Which ecosystem this adapter serves.
    fn ecosystem(&self) -> EcosystemKind;

    /// Whether the adapter's toolchain is present on the host. Probed once
    /// per invocation by the registry/scan engine, never cached indefinitely.
    async fn is_available(&self) -> bool;

    /// Discover candidate projects under `root_path`.
    ///
    /// # Errors
    ///
    /// Returns an error if the root path cannot be walked.
    async fn detect_projects(&self, root_path: &Path) -> Result<Vec<ProjectDescriptor>, Error>;

    /// Confirm `project_path` is one this adapter can actually operate on
    /// (manifest present and parseable, lockfile if the ecosystem requires
    /// one) before a scan commits to parsing dependencies.
    ///
    /// # Errors
    ///
    /// Returns `AdapterError::InvalidProject` if the project fails validation.
    async fn validate_project(&self, project_path: &Path) -> Result<(), Error>;

    /// Parse the declared dependency list for one project.
    ///
    /// # Errors
    ///
    /// Returns `AdapterError::ParseError` if the manifest is malformed.
    async fn parse_dependencies(&self, project_path: &Path) -> Result<Vec<DependencyEntry>, Error>;

    /// Fetch the latest published version of a package.
    ///
    /// # Errors
    ///
    /// Returns `AdapterError::UpstreamFetch` on registry failure.
    async fn latest_version(&self, package_name: &str) -> Result<LatestVersion, Error>;

    /// Fetch changelog/release-note text for a specific version.
    ///
    /// # Errors
    ///
    /// Returns `AdapterError::UpstreamFetch` on registry failure.
    async fn changelog(&self, package_name: &str, version: &Version) -> Result<ChangelogInfo, Error>;

    /// Apply an update on disk (or simulate it, when `dry_run` is set).
    ///
    /// # Errors
    ///
    /// Returns `AdapterError::ApplyRefused` if the adapter cannot perform the mutation.
    async fn apply_update(
        &self,
        project_path: &Path,
        package_name: &str,
        to_version: &Version,
        dry_run: bool,
    ) -> Result<(), Error>;
}
