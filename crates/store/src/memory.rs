//! In-memory [`Store`] for tests: a handful of `RwLock<HashMap>` tables,
//! no persistence, no migrations.

use crate::Store;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use ratchet_errors::{Error, StoreError};
use ratchet_types::{
    Dependency, Project, ProjectSettings, RiskPrediction, RollbackItem, RollbackItemStatus,
    RollbackPlan, RollbackPlanStatus, SecurityCheck, Update, UpdatePolicy, UpdateStatus,
};
use std::collections::HashMap;
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::RwLock;

#[derive(Default)]
struct Tables {
    projects: HashMap<i64, Project>,
    project_settings: HashMap<i64, ProjectSettings>,
    dependencies: HashMap<i64, Dependency>,
    updates: HashMap<i64, Update>,
    risk_predictions: HashMap<i64, RiskPrediction>,
    rollback_plans: HashMap<i64, RollbackPlan>,
    policies: HashMap<i64, UpdatePolicy>,
    security_checks: HashMap<i64, SecurityCheck>,
}

/// In-memory [`Store`] implementation.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    next_id: AtomicI64,
}

impl MemoryStore {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    fn allocate_id(&self) -> i64 {
        self.next_id.fetch_add(1, Ordering::SeqCst) + 1
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn list_projects(&self) -> Result<Vec<Project>, Error> {
        let mut projects: Vec<_> = self.tables.read().await.projects.values().cloned().collect();
        projects.sort_by_key(|p| p.id);
        Ok(projects)
    }

    async fn get_project(&self, id: i64) -> Result<Project, Error> {
        self.tables
            .read()
            .await
            .projects
            .get(&id)
            .cloned()
            .ok_or_else(|| {
                StoreError::NotFound {
                    entity: "project",
                    id: id.to_string(),
                }
                .into()
            })
    }

    async fn upsert_project(&self, project: &Project) -> Result<i64, Error> {
        let mut tables = self.tables.write().await;
        let mut project = project.clone();
        if project.id == 0 {
            project.id = self.allocate_id();
        }
        let id = project.id;
        tables.projects.insert(id, project);
        Ok(id)
    }

    async fn touch_project_scan(&self, id: i64, at: DateTime<Utc>) -> Result<(), Error> {
        let mut tables = self.tables.write().await;
        let project = tables.projects.get_mut(&id).ok_or_else(|| StoreError::NotFound {
            entity: "project",
            id: id.to_string(),
        })?;
        project.last_scan = Some(at);
        Ok(())
    }

    async fn get_project_settings(&self, project_id: i64) -> Result<Option<ProjectSettings>, Error> {
        Ok(self.tables.read().await.project_settings.get(&project_id).cloned())
    }

    async fn upsert_project_settings(&self, settings: &ProjectSettings) -> Result<(), Error> {
        self.tables
            .write()
            .await
            .project_settings
            .insert(settings.project_id, settings.clone());
        Ok(())
    }

    async fn list_dependencies(&self, project_id: i64) -> Result<Vec<Dependency>, Error> {
        let mut deps: Vec<_> = self
            .tables
            .read()
            .await
            .dependencies
            .values()
            .filter(|d| d.project_id == project_id)
            .cloned()
            .collect();
        deps.sort_by(|a, b| a.name.cmp(&b.name));
        Ok(deps)
    }

    async fn get_dependency(&self, id: i64) -> Result<Dependency, Error> {
        self.tables
            .read()
            .await
            .dependencies
            .get(&id)
            .cloned()
            .ok_or_else(|| {
                StoreError::NotFound {
                    entity: "dependency",
                    id: id.to_string(),
                }
                .into()
            })
    }

    async fn upsert_dependency(&self, dependency: &Dependency) -> Result<i64, Error> {
        let mut tables = self.tables.write().await;
        let mut dependency = dependency.clone();
        if dependency.id == 0 {
            dependency.id = self.allocate_id();
        }
        let id = dependency.id;
        tables.dependencies.insert(id, dependency);
        Ok(id)
    }

    async fn create_update(&self, update: &Update) -> Result<i64, Error> {
        let mut tables = self.tables.write().await;
        let mut update = update.clone();
        update.id = self.allocate_id();
        let id = update.id;
        tables.updates.insert(id, update);
        Ok(id)
    }

    async fn create_update_if_absent(&self, update: &Update) -> Result<Option<i64>, Error> {
        let mut tables = self.tables.write().await;
        let duplicate = tables.updates.values().any(|u| {
            u.status == UpdateStatus::Pending
                && u.dependency_id == update.dependency_id
                && u.to_version == update.to_version
        });
        if duplicate {
            return Ok(None);
        }
        let mut update = update.clone();
        update.id = self.allocate_id();
        let id = update.id;
        tables.updates.insert(id, update);
        Ok(Some(id))
    }

    async fn get_update(&self, id: i64) -> Result<Update, Error> {
        self.tables
            .read()
            .await
            .updates
            .get(&id)
            .cloned()
            .ok_or_else(|| {
                StoreError::NotFound {
                    entity: "update",
                    id: id.to_string(),
                }
                .into()
            })
    }

    async fn list_pending_updates(&self, project_id: i64) -> Result<Vec<Update>, Error> {
        let tables = self.tables.read().await;
        let mut updates: Vec<_> = tables
            .updates
            .values()
            .filter(|u| {
                u.status == UpdateStatus::Pending
                    && tables
                        .dependencies
                        .get(&u.dependency_id)
                        .is_some_and(|d| d.project_id == project_id)
            })
            .cloned()
            .collect();
        updates.sort_by_key(|u| u.id);
        Ok(updates)
    }

    async fn set_update_status(
        &self,
        id: i64,
        status: UpdateStatus,
        applied_at: Option<DateTime<Utc>>,
    ) -> Result<(), Error> {
        let mut tables = self.tables.write().await;
        let update = tables.updates.get_mut(&id).ok_or_else(|| StoreError::NotFound {
            entity: "update",
            id: id.to_string(),
        })?;
        update.status = status;
        update.applied_at = applied_at;
        Ok(())
    }

    async fn create_risk_prediction(&self, prediction: &RiskPrediction) -> Result<i64, Error> {
        let mut tables = self.tables.write().await;
        let mut prediction = prediction.clone();
        prediction.id = self.allocate_id();
        let id = prediction.id;
        tables.risk_predictions.insert(id, prediction);
        Ok(id)
    }

    async fn list_risk_predictions(&self, update_id: i64) -> Result<Vec<RiskPrediction>, Error> {
        let mut predictions: Vec<_> = self
            .tables
            .read()
            .await
            .risk_predictions
            .values()
            .filter(|p| p.update_id == update_id)
            .cloned()
            .collect();
        predictions.sort_by_key(|p| p.id);
        Ok(predictions)
    }

    async fn create_rollback_plan(&self, plan: &RollbackPlan) -> Result<i64, Error> {
        let mut tables = self.tables.write().await;
        let mut plan = plan.clone();
        plan.id = self.allocate_id();
        for item in &mut plan.items {
            item.id = self.allocate_id();
            item.plan_id = plan.id;
        }
        let id = plan.id;
        tables.rollback_plans.insert(id, plan);
        Ok(id)
    }

    async fn get_rollback_plan(&self, id: i64) -> Result<RollbackPlan, Error> {
        self.tables
            .read()
            .await
            .rollback_plans
            .get(&id)
            .cloned()
            .ok_or_else(|| {
                StoreError::NotFound {
                    entity: "rollback_plan",
                    id: id.to_string(),
                }
                .into()
            })
    }

    async fn append_rollback_item(&self, plan_id: i64, item: &RollbackItem) -> Result<i64, Error> {
        let mut tables = self.tables.write().await;
        let mut item = item.clone();
        item.id = self.allocate_id();
        item.plan_id = plan_id;
        let id = item.id;
        let plan = tables
            .rollback_plans
            .get_mut(&plan_id)
            .ok_or_else(|| StoreError::NotFound {
                entity: "rollback_plan",
                id: plan_id.to_string(),
            })?;
        plan.items.push(item);
        Ok(id)
    }

    async fn set_rollback_plan_status(
        &self,
        id: i64,
        status: RollbackPlanStatus,
        executed_at: Option<DateTime<Utc>>,
    ) -> Result<(), Error> {
        let mut tables = self.tables.write().await;
        let plan = tables.rollback_plans.get_mut(&id).ok_or_else(|| StoreError::NotFound {
            entity: "rollback_plan",
            id: id.to_string(),
        })?;
        plan.status = status;
        plan.executed_at = executed_at;
        Ok(())
    }

    async fn set_rollback_item_status(
        &self,
        item_id: i64,
        status: RollbackItemStatus,
        error: Option<String>,
    ) -> Result<(), Error> {
        let mut tables = self.tables.write().await;
        for plan in tables.rollback_plans.values_mut() {
            if let Some(item) = plan.items.iter_mut().find(|i| i.id == item_id) {
                item.status = status;
                item.error = error;
                item.executed_at = Some(Utc::now());
                return Ok(());
            }
        }
        Err(StoreError::NotFound {
            entity: "rollback_item",
            id: item_id.to_string(),
        }
        .into())
    }

    async fn list_policies(&self, project_id: Option<i64>) -> Result<Vec<UpdatePolicy>, Error> {
        let mut policies: Vec<_> = self
            .tables
            .read()
            .await
            .policies
            .values()
            .filter(|p| project_id.is_none() || p.project_id.is_none() || p.project_id == project_id)
            .cloned()
            .collect();
        policies.sort_by(|a, b| b.priority.cmp(&a.priority));
        Ok(policies)
    }

    async fn upsert_policy(&self, policy: &UpdatePolicy) -> Result<i64, Error> {
        let mut tables = self.tables.write().await;
        if policy.id == 0 && tables.policies.values().any(|p| p.name == policy.name) {
            return Err(StoreError::Conflict {
                entity: "update_policy",
                key: policy.name.clone(),
            }
            .into());
        }
        let mut policy = policy.clone();
        if policy.id == 0 {
            policy.id = self.allocate_id();
        }
        let id = policy.id;
        tables.policies.insert(id, policy);
        Ok(id)
    }

    async fn delete_policy(&self, id: i64) -> Result<(), Error> {
        self.tables.write().await.policies.remove(&id);
        Ok(())
    }

    async fn create_security_check(&self, check: &SecurityCheck) -> Result<i64, Error> {
        let mut tables = self.tables.write().await;
        let mut check = check.clone();
        check.id = self.allocate_id();
        let id = check.id;
        tables.security_checks.insert(id, check);
        Ok(id)
    }

    async fn list_security_checks(&self, package_name: &str) -> Result<Vec<SecurityCheck>, Error> {
        let mut checks: Vec<_> = self
            .tables
            .read()
            .await
            .security_checks
            .values()
            .filter(|c| c.package_name == package_name)
            .cloned()
            .collect();
        checks.sort_by_key(|c| c.id);
        Ok(checks)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ratchet_types::EcosystemKind;

    #[tokio::test]
    async fn project_round_trips() {
        let store = MemoryStore::new();
        let project = Project::new("demo", "/tmp/demo", EcosystemKind::Npm, "package.json");
        let id = store.upsert_project(&project).await.unwrap();
        let loaded = store.get_project(id).await.unwrap();
        assert_eq!(loaded.name, "demo");
    }

    #[tokio::test]
    async fn missing_project_is_not_found() {
        let store = MemoryStore::new();
        assert!(store.get_project(999).await.is_err());
    }

    #[tokio::test]
    async fn duplicate_policy_name_conflicts() {
        let store = MemoryStore::new();
        let policy = UpdatePolicy::new(
            "only-one",
            None,
            10,
            ratchet_types::PolicyConditions::default(),
            ratchet_types::PolicyActions::default(),
        );
        store.upsert_policy(&policy).await.unwrap();
        assert!(store.upsert_policy(&policy).await.is_err());
    }
}
