//! In-memory, scriptable adapter used by the core's own test suite
//!
//! Not a production adapter: it has no filesystem or network behavior of its
//! own, only whatever the test that constructs it pre-loads. It exists so
//! `ratchet-scan`/`ratchet-executor` tests can drive edge-case adapter
//! behavior (slow responses, failures, stale data) without a real
//! npm/pip/maven toolchain.

use crate::{ChangelogInfo, DependencyEntry, LatestVersion, PackageAdapter, ProjectDescriptor};
use async_trait::async_trait;
use ratchet_errors::{AdapterError, Error};
use ratchet_types::EcosystemKind;
use semver::Version;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tokio::sync::RwLock;

#[derive(Debug, Clone)]
struct PackageFixture {
    latest: LatestVersion,
    changelog: HashMap<Version, ChangelogInfo>,
}

#[derive(Default)]
struct MockState {
    available: bool,
    projects: Vec<ProjectDescriptor>,
    dependencies: HashMap<PathBuf, Vec<DependencyEntry>>,
    packages: HashMap<String, PackageFixture>,
    fetch_failures: HashMap<String, String>,
    apply_failures: HashMap<String, String>,
    applied: Vec<(PathBuf, String, Version)>,
}

/// Fully in-memory [`PackageAdapter`] implementation for tests.
pub struct MockAdapter {
    ecosystem: EcosystemKind,
    state: Arc<RwLock<MockState>>,
}

impl MockAdapter {
    #[must_use]
    pub fn new(ecosystem: EcosystemKind) -> Self {
        Self {
            ecosystem,
            state: Arc::new(RwLock::new(MockState {
                available: true,
                ..MockState::default()
            })),
        }
    }

    pub async fn set_available(&self, available: bool) {
        self.state.write().await.available = available;
    }

    pub async fn add_project(&self, descriptor: ProjectDescriptor) {
        self.state.write().await.projects.push(descriptor);
    }

    pub async fn set_dependencies(&self, project_path: impl Into<PathBuf>, deps: Vec<DependencyEntry>) {
        self.state
            .write()
            .await
            .dependencies
            .insert(project_path.into(), deps);
    }

    pub async fn set_latest_version(
        &self,
        package_name: impl Into<String>,
        version: Version,
        changelog: ChangelogInfo,
    ) {
        let mut state = self.state.write().await;
        let fixture = state
            .packages
            .entry(package_name.into())
            .or_insert_with(|| PackageFixture {
                latest: LatestVersion {
                    version: version.clone(),
                    published_at: None,
                },
                changelog: HashMap::new(),
            });
        fixture.latest = LatestVersion {
            version: version.clone(),
            published_at: None,
        };
        fixture.changelog.insert(version, changelog);
    }

    pub async fn inject_fetch_failure(&self, package_name: impl Into<String>, message: impl Into<String>) {
        self.state
            .write()
            .await
            .fetch_failures
            .insert(package_name.into(), message.into());
    }

    pub async fn inject_apply_failure(&self, package_name: impl Into<String>, message: impl Into<String>) {
        self.state
            .write()
            .await
            .apply_failures
            .insert(package_name.into(), message.into());
    }

    /// Record of every successful `apply_update` call, in call order.
    pub async fn applied_calls(&self) -> Vec<(PathBuf, String, Version)> {
        self.state.read().await.applied.clone()
    }
}

#[async_trait]
impl PackageAdapter for MockAdapter {
    fn ecosystem(&self) -> EcosystemKind {
        self.ecosystem
    }

    async fn is_available(&self) -> bool {
        self.state.read().await.available
    }

    async fn detect_projects(&self, _root_path: &Path) -> Result<Vec<ProjectDescriptor>, Error> {
        Ok(self.state.read().await.projects.clone())
    }

    async fn validate_project(&self, project_path: &Path) -> Result<(), Error> {
        let state = self.state.read().await;
        if state.dependencies.contains_key(project_path) || state.projects.iter().any(|p| p.path == project_path) {
            return Ok(());
        }
        Err(AdapterError::InvalidProject {
            path: project_path.display().to_string(),
            reason: "no fixture registered for this project path".to_string(),
        }
        .into())
    }

    async fn parse_dependencies(&self, project_path: &Path) -> Result<Vec<DependencyEntry>, Error> {
        Ok(self
            .state
            .read()
            .await
            .dependencies
            .get(project_path)
            .cloned()
            .unwrap_or_default())
    }

    async fn latest_version(&self, package_name: &str) -> Result<LatestVersion, Error> {
        let state = self.state.read().await;
        if let Some(message) = state.fetch_failures.get(package_name) {
            return Err(AdapterError::UpstreamFetch {
                package: package_name.to_string(),
                message: message.clone(),
            }
            .into());
        }
        state
            .packages
            .get(package_name)
            .map(|fixture| fixture.latest.clone())
            .ok_or_else(|| {
                AdapterError::UpstreamFetch {
                    package: package_name.to_string(),
                    message: "no fixture registered".to_string(),
                }
                .into()
            })
    }

    async fn changelog(&self, package_name: &str, version: &Version) -> Result<ChangelogInfo, Error> {
        let state = self.state.read().await;
        Ok(state
            .packages
            .get(package_name)
            .and_then(|fixture| fixture.changelog.get(version).cloned())
            .unwrap_or_default())
    }

    async fn apply_update(
        &self,
        project_path: &Path,
        package_name: &str,
        to_version: &Version,
        dry_run: bool,
    ) -> Result<(), Error> {
        let mut state = self.state.write().await;
        if let Some(message) = state.apply_failures.get(package_name).cloned() {
            return Err(AdapterError::ApplyRefused {
                package: package_name.to_string(),
                to_version: to_version.to_string(),
                message,
            }
            .into());
        }
        if !dry_run {
            state
                .applied
                .push((project_path.to_path_buf(), package_name.to_string(), to_version.clone()));
        }
        Ok(())
    }
}
