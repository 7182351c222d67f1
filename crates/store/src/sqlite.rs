//! `SQLite`-backed [`Store`] implementation, using runtime (non-macro)
//! queries so the crate builds without an offline query cache.

use crate::codec::{dec, dec_json, enc, enc_json};
use crate::Store;
use async_trait::async_trait;
use chrono::{DateTime, TimeZone, Utc};
use ratchet_errors::{Error, StoreError};
use ratchet_types::{
    Dependency, Project, ProjectSettings, RiskPrediction, RollbackItem, RollbackItemStatus,
    RollbackPlan, RollbackPlanStatus, SecurityCheck, Update, UpdatePolicy, UpdateStatus,
};
use semver::Version;
use sqlx::{query, Pool, Row, Sqlite};
use std::path::PathBuf;
use std::str::FromStr;

/// `SQLite`-backed [`Store`].
#[derive(Clone)]
pub struct SqliteStore {
    pool: Pool<Sqlite>,
}

impl SqliteStore {
    /// Open (creating if needed) a database file at `db_path` and apply migrations.
    ///
    /// # Errors
    ///
    /// Returns an error if the database cannot be opened or migrated.
    pub async fn open(db_path: &std::path::Path) -> Result<Self, Error> {
        let pool = crate::create_pool(db_path).await?;
        crate::run_migrations(&pool).await?;
        Ok(Self { pool })
    }

    /// Wrap an already-migrated pool.
    #[must_use]
    pub fn with_pool(pool: Pool<Sqlite>) -> Self {
        Self { pool }
    }
}

fn ts(at: Option<DateTime<Utc>>) -> Option<i64> {
    at.map(|d| d.timestamp())
}

fn from_ts(raw: Option<i64>) -> Option<DateTime<Utc>> {
    raw.and_then(|secs| Utc.timestamp_opt(secs, 0).single())
}

fn parse_version(raw: &str) -> Result<Version, Error> {
    Version::from_str(raw).map_err(|e| Error::internal(format!("invalid stored version {raw:?}: {e}")))
}

fn project_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Project, Error> {
    Ok(Project {
        id: row.get("id"),
        name: row.get("name"),
        path: PathBuf::from(row.get::<String, _>("path")),
        ecosystem: dec(&row.get::<String, _>("ecosystem"))?,
        config_file: PathBuf::from(row.get::<String, _>("config_file")),
        enabled: row.get::<i64, _>("enabled") != 0,
        last_scan: from_ts(row.get::<Option<i64>, _>("last_scan")),
    })
}

#[async_trait]
impl Store for SqliteStore {
    async fn list_projects(&self) -> Result<Vec<Project>, Error> {
        let rows = query("SELECT * FROM projects ORDER BY id").fetch_all(&self.pool).await?;
        rows.iter().map(project_from_row).collect()
    }

    async fn get_project(&self, id: i64) -> Result<Project, Error> {
        let row = query("SELECT * FROM projects WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound {
                entity: "project",
                id: id.to_string(),
            })?;
        project_from_row(&row)
    }

    async fn upsert_project(&self, project: &Project) -> Result<i64, Error> {
        if project.id == 0 {
            let row = query(
                "INSERT INTO projects (name, path, ecosystem, config_file, enabled, last_scan)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6) RETURNING id",
            )
            .bind(&project.name)
            .bind(project.path.display().to_string())
            .bind(enc(&project.ecosystem))
            .bind(project.config_file.display().to_string())
            .bind(project.enabled)
            .bind(ts(project.last_scan))
            .fetch_one(&self.pool)
            .await?;
            Ok(row.get("id"))
        } else {
            query(
                "UPDATE projects SET name = ?1, path = ?2, ecosystem = ?3, config_file = ?4,
                 enabled = ?5, last_scan = ?6 WHERE id = ?7",
            )
            .bind(&project.name)
            .bind(project.path.display().to_string())
            .bind(enc(&project.ecosystem))
            .bind(project.config_file.display().to_string())
            .bind(project.enabled)
            .bind(ts(project.last_scan))
            .bind(project.id)
            .execute(&self.pool)
            .await?;
            Ok(project.id)
        }
    }

    async fn touch_project_scan(&self, id: i64, at: DateTime<Utc>) -> Result<(), Error> {
        query("UPDATE projects SET last_scan = ?1 WHERE id = ?2")
            .bind(at.timestamp())
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn get_project_settings(&self, project_id: i64) -> Result<Option<ProjectSettings>, Error> {
        let row = query("SELECT * FROM project_settings WHERE project_id = ?1")
            .bind(project_id)
            .fetch_optional(&self.pool)
            .await?;
        let Some(row) = row else { return Ok(None) };
        let auto_update_level_override = row
            .get::<Option<String>, _>("auto_update_level_override")
            .map(|s| dec(&s))
            .transpose()?;
        Ok(Some(ProjectSettings {
            project_id: row.get("project_id"),
            max_concurrency_override: row
                .get::<Option<i64>, _>("max_concurrency_override")
                .map(|v| v as u32),
            auto_update_level_override,
            notify_channels: dec_json(&row.get::<String, _>("notify_channels"))?,
        }))
    }

    async fn upsert_project_settings(&self, settings: &ProjectSettings) -> Result<(), Error> {
        query(
            "INSERT INTO project_settings (project_id, max_concurrency_override, auto_update_level_override, notify_channels)
             VALUES (?1, ?2, ?3, ?4)
             ON CONFLICT(project_id) DO UPDATE SET
                max_concurrency_override = excluded.max_concurrency_override,
                auto_update_level_override = excluded.auto_update_level_override,
                notify_channels = excluded.notify_channels",
        )
        .bind(settings.project_id)
        .bind(settings.max_concurrency_override.map(i64::from))
        .bind(settings.auto_update_level_override.as_ref().map(enc))
        .bind(enc_json(&settings.notify_channels))
        .execute(&self.pool)
        .await?;
        Ok(())
    }

    async fn list_dependencies(&self, project_id: i64) -> Result<Vec<Dependency>, Error> {
        let rows = query("SELECT * FROM dependencies WHERE project_id = ?1 ORDER BY name")
            .bind(project_id)
            .fetch_all(&self.pool)
            .await?;
        rows.iter().map(dependency_from_row).collect()
    }

    async fn get_dependency(&self, id: i64) -> Result<Dependency, Error> {
        let row = query("SELECT * FROM dependencies WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound {
                entity: "dependency",
                id: id.to_string(),
            })?;
        dependency_from_row(&row)
    }

    async fn upsert_dependency(&self, dependency: &Dependency) -> Result<i64, Error> {
        if dependency.id == 0 {
            let row = query(
                "INSERT INTO dependencies
                    (project_id, name, declared_constraint, current_version, latest_version,
                     class, registry, status, last_checked)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9) RETURNING id",
            )
            .bind(dependency.project_id)
            .bind(&dependency.name)
            .bind(&dependency.declared_constraint)
            .bind(dependency.current_version.as_ref().map(ToString::to_string))
            .bind(dependency.latest_version.as_ref().map(ToString::to_string))
            .bind(enc(&dependency.class))
            .bind(&dependency.registry)
            .bind(enc(&dependency.status))
            .bind(ts(dependency.last_checked))
            .fetch_one(&self.pool)
            .await?;
            Ok(row.get("id"))
        } else {
            query(
                "UPDATE dependencies SET project_id = ?1, name = ?2, declared_constraint = ?3,
                 current_version = ?4, latest_version = ?5, class = ?6, registry = ?7,
                 status = ?8, last_checked = ?9 WHERE id = ?10",
            )
            .bind(dependency.project_id)
            .bind(&dependency.name)
            .bind(&dependency.declared_constraint)
            .bind(dependency.current_version.as_ref().map(ToString::to_string))
            .bind(dependency.latest_version.as_ref().map(ToString::to_string))
            .bind(enc(&dependency.class))
            .bind(&dependency.registry)
            .bind(enc(&dependency.status))
            .bind(ts(dependency.last_checked))
            .bind(dependency.id)
            .execute(&self.pool)
            .await?;
            Ok(dependency.id)
        }
    }

    async fn create_update(&self, update: &Update) -> Result<i64, Error> {
        let row = query(
            "INSERT INTO updates
                (dependency_id, from_version, to_version, update_type, severity,
                 breaking, security_fix, status, applied_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9) RETURNING id",
        )
        .bind(update.dependency_id)
        .bind(update.from_version.to_string())
        .bind(update.to_version.to_string())
        .bind(enc(&update.update_type))
        .bind(enc(&update.severity))
        .bind(update.breaking)
        .bind(update.security_fix)
        .bind(enc(&update.status))
        .bind(ts(update.applied_at))
        .fetch_one(&self.pool)
        .await?;
        Ok(row.get("id"))
    }

    async fn create_update_if_absent(&self, update: &Update) -> Result<Option<i64>, Error> {
        let row = query(
            "INSERT INTO updates
                (dependency_id, from_version, to_version, update_type, severity,
                 breaking, security_fix, status, applied_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7, ?8, ?9)
             ON CONFLICT (dependency_id, to_version) WHERE status = 'pending' DO NOTHING
             RETURNING id",
        )
        .bind(update.dependency_id)
        .bind(update.from_version.to_string())
        .bind(update.to_version.to_string())
        .bind(enc(&update.update_type))
        .bind(enc(&update.severity))
        .bind(update.breaking)
        .bind(update.security_fix)
        .bind(enc(&update.status))
        .bind(ts(update.applied_at))
        .fetch_optional(&self.pool)
        .await?;
        Ok(row.map(|r| r.get("id")))
    }

    async fn get_update(&self, id: i64) -> Result<Update, Error> {
        let row = query("SELECT * FROM updates WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound {
                entity: "update",
                id: id.to_string(),
            })?;
        update_from_row(&row)
    }

    async fn list_pending_updates(&self, project_id: i64) -> Result<Vec<Update>, Error> {
        let rows = query(
            "SELECT u.* FROM updates u
             JOIN dependencies d ON d.id = u.dependency_id
             WHERE d.project_id = ?1 AND u.status = 'pending'
             ORDER BY u.id",
        )
        .bind(project_id)
        .fetch_all(&self.pool)
        .await?;
        rows.iter().map(update_from_row).collect()
    }

    async fn set_update_status(
        &self,
        id: i64,
        status: UpdateStatus,
        applied_at: Option<DateTime<Utc>>,
    ) -> Result<(), Error> {
        query("UPDATE updates SET status = ?1, applied_at = ?2 WHERE id = ?3")
            .bind(enc(&status))
            .bind(ts(applied_at))
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn create_risk_prediction(&self, prediction: &RiskPrediction) -> Result<i64, Error> {
        let row = query(
            "INSERT INTO risk_predictions (update_id, prediction_type, confidence, result, reasoning)
             VALUES (?1, ?2, ?3, ?4, ?5) RETURNING id",
        )
        .bind(prediction.update_id)
        .bind(enc(&prediction.prediction_type))
        .bind(prediction.confidence)
        .bind(&prediction.result)
        .bind(&prediction.reasoning)
        .fetch_one(&self.pool)
        .await?;
        Ok(row.get("id"))
    }

    async fn list_risk_predictions(&self, update_id: i64) -> Result<Vec<RiskPrediction>, Error> {
        let rows = query("SELECT * FROM risk_predictions WHERE update_id = ?1 ORDER BY id")
            .bind(update_id)
            .fetch_all(&self.pool)
            .await?;
        rows.iter()
            .map(|row| {
                Ok(RiskPrediction {
                    id: row.get("id"),
                    update_id: row.get("update_id"),
                    prediction_type: dec(&row.get::<String, _>("prediction_type"))?,
                    confidence: row.get("confidence"),
                    result: row.get("result"),
                    reasoning: row.get("reasoning"),
                })
            })
            .collect()
    }

    async fn create_rollback_plan(&self, plan: &RollbackPlan) -> Result<i64, Error> {
        let row = query(
            "INSERT INTO rollback_plans (project_id, status, created_at, executed_at)
             VALUES (?1, ?2, ?3, ?4) RETURNING id",
        )
        .bind(plan.project_id)
        .bind(enc(&plan.status))
        .bind(plan.created_at.timestamp())
        .bind(ts(plan.executed_at))
        .fetch_one(&self.pool)
        .await?;
        let plan_id = row.get("id");
        for item in &plan.items {
            self.append_rollback_item(plan_id, item).await?;
        }
        Ok(plan_id)
    }

    async fn get_rollback_plan(&self, id: i64) -> Result<RollbackPlan, Error> {
        let row = query("SELECT * FROM rollback_plans WHERE id = ?1")
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .ok_or_else(|| StoreError::NotFound {
                entity: "rollback_plan",
                id: id.to_string(),
            })?;
        let item_rows = query("SELECT * FROM rollback_items WHERE plan_id = ?1 ORDER BY id")
            .bind(id)
            .fetch_all(&self.pool)
            .await?;
        let items = item_rows.iter().map(rollback_item_from_row).collect::<Result<Vec<_>, _>>()?;
        Ok(RollbackPlan {
            id: row.get("id"),
            project_id: row.get("project_id"),
            status: dec(&row.get::<String, _>("status"))?,
            created_at: Utc
                .timestamp_opt(row.get("created_at"), 0)
                .single()
                .ok_or_else(|| Error::internal("invalid stored timestamp"))?,
            executed_at: from_ts(row.get::<Option<i64>, _>("executed_at")),
            items,
        })
    }

    async fn append_rollback_item(&self, plan_id: i64, item: &RollbackItem) -> Result<i64, Error> {
        let row = query(
            "INSERT INTO rollback_items
                (plan_id, dependency_name, from_version, to_version, status, error, executed_at)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7) RETURNING id",
        )
        .bind(plan_id)
        .bind(&item.dependency_name)
        .bind(item.from_version.to_string())
        .bind(item.to_version.to_string())
        .bind(enc(&item.status))
        .bind(&item.error)
        .bind(ts(item.executed_at))
        .fetch_one(&self.pool)
        .await?;
        Ok(row.get("id"))
    }

    async fn set_rollback_plan_status(
        &self,
        id: i64,
        status: RollbackPlanStatus,
        executed_at: Option<DateTime<Utc>>,
    ) -> Result<(), Error> {
        query("UPDATE rollback_plans SET status = ?1, executed_at = ?2 WHERE id = ?3")
            .bind(enc(&status))
            .bind(ts(executed_at))
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn set_rollback_item_status(
        &self,
        item_id: i64,
        status: RollbackItemStatus,
        error: Option<String>,
    ) -> Result<(), Error> {
        query("UPDATE rollback_items SET status = ?1, error = ?2, executed_at = ?3 WHERE id = ?4")
            .bind(enc(&status))
            .bind(&error)
            .bind(Utc::now().timestamp())
            .bind(item_id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn list_policies(&self, project_id: Option<i64>) -> Result<Vec<UpdatePolicy>, Error> {
        let rows = match project_id {
            Some(project_id) => {
                query("SELECT * FROM update_policies WHERE project_id = ?1 OR project_id IS NULL ORDER BY priority DESC")
                    .bind(project_id)
                    .fetch_all(&self.pool)
                    .await?
            }
            None => {
                query("SELECT * FROM update_policies ORDER BY priority DESC")
                    .fetch_all(&self.pool)
                    .await?
            }
        };
        rows.iter().map(policy_from_row).collect()
    }

    async fn upsert_policy(&self, policy: &UpdatePolicy) -> Result<i64, Error> {
        if policy.id == 0 {
            let row = query(
                "INSERT INTO update_policies (name, project_id, priority, enabled, conditions, actions)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6) RETURNING id",
            )
            .bind(&policy.name)
            .bind(policy.project_id)
            .bind(i64::from(policy.priority))
            .bind(policy.enabled)
            .bind(enc_json(&policy.conditions))
            .bind(enc_json(&policy.actions))
            .fetch_one(&self.pool)
            .await
            .map_err(|e| map_unique_violation(e, "update_policy", &policy.name))?;
            Ok(row.get("id"))
        } else {
            query(
                "UPDATE update_policies SET name = ?1, project_id = ?2, priority = ?3,
                 enabled = ?4, conditions = ?5, actions = ?6 WHERE id = ?7",
            )
            .bind(&policy.name)
            .bind(policy.project_id)
            .bind(i64::from(policy.priority))
            .bind(policy.enabled)
            .bind(enc_json(&policy.conditions))
            .bind(enc_json(&policy.actions))
            .bind(policy.id)
            .execute(&self.pool)
            .await
            .map_err(|e| map_unique_violation(e, "update_policy", &policy.name))?;
            Ok(policy.id)
        }
    }

    async fn delete_policy(&self, id: i64) -> Result<(), Error> {
        query("DELETE FROM update_policies WHERE id = ?1")
            .bind(id)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn create_security_check(&self, check: &SecurityCheck) -> Result<i64, Error> {
        let row = query(
            "INSERT INTO security_checks (package_name, version, kind, severity, status, source, detail)
             VALUES (?1, ?2, ?3, ?4, ?5, ?6, ?7) RETURNING id",
        )
        .bind(&check.package_name)
        .bind(check.version.to_string())
        .bind(&check.kind)
        .bind(enc(&check.severity))
        .bind(enc(&check.status))
        .bind(&check.source)
        .bind(enc_json(&check.detail))
        .fetch_one(&self.pool)
        .await?;
        Ok(row.get("id"))
    }

    async fn list_security_checks(&self, package_name: &str) -> Result<Vec<SecurityCheck>, Error> {
        let rows = query("SELECT * FROM security_checks WHERE package_name = ?1 ORDER BY id")
            .bind(package_name)
            .fetch_all(&self.pool)
            .await?;
        rows.iter()
            .map(|row| {
                Ok(SecurityCheck {
                    id: row.get("id"),
                    package_name: row.get("package_name"),
                    version: parse_version(&row.get::<String, _>("version"))?,
                    kind: row.get("kind"),
                    severity: dec(&row.get::<String, _>("severity"))?,
                    status: dec(&row.get::<String, _>("status"))?,
                    source: row.get("source"),
                    detail: dec_json(&row.get::<String, _>("detail"))?,
                })
            })
            .collect()
    }
}

fn dependency_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Dependency, Error> {
    Ok(Dependency {
        id: row.get("id"),
        project_id: row.get("project_id"),
        name: row.get("name"),
        declared_constraint: row.get("declared_constraint"),
        current_version: row
            .get::<Option<String>, _>("current_version")
            .map(|v| parse_version(&v))
            .transpose()?,
        latest_version: row
            .get::<Option<String>, _>("latest_version")
            .map(|v| parse_version(&v))
            .transpose()?,
        class: dec(&row.get::<String, _>("class"))?,
        registry: row.get("registry"),
        status: dec(&row.get::<String, _>("status"))?,
        last_checked: from_ts(row.get::<Option<i64>, _>("last_checked")),
    })
}

fn update_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<Update, Error> {
    Ok(Update {
        id: row.get("id"),
        dependency_id: row.get("dependency_id"),
        from_version: parse_version(&row.get::<String, _>("from_version"))?,
        to_version: parse_version(&row.get::<String, _>("to_version"))?,
        update_type: dec(&row.get::<String, _>("update_type"))?,
        severity: dec(&row.get::<String, _>("severity"))?,
        breaking: row.get::<i64, _>("breaking") != 0,
        security_fix: row.get::<i64, _>("security_fix") != 0,
        status: dec(&row.get::<String, _>("status"))?,
        applied_at: from_ts(row.get::<Option<i64>, _>("applied_at")),
    })
}

fn rollback_item_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<RollbackItem, Error> {
    Ok(RollbackItem {
        id: row.get("id"),
        plan_id: row.get("plan_id"),
        dependency_name: row.get("dependency_name"),
        from_version: parse_version(&row.get::<String, _>("from_version"))?,
        to_version: parse_version(&row.get::<String, _>("to_version"))?,
        status: dec(&row.get::<String, _>("status"))?,
        error: row.get("error"),
        executed_at: from_ts(row.get::<Option<i64>, _>("executed_at")),
    })
}

fn policy_from_row(row: &sqlx::sqlite::SqliteRow) -> Result<UpdatePolicy, Error> {
    Ok(UpdatePolicy {
        id: row.get("id"),
        name: row.get("name"),
        project_id: row.get("project_id"),
        priority: row.get::<i64, _>("priority") as u8,
        enabled: row.get::<i64, _>("enabled") != 0,
        conditions: dec_json(&row.get::<String, _>("conditions"))?,
        actions: dec_json(&row.get::<String, _>("actions"))?,
    })
}

fn map_unique_violation(e: sqlx::Error, entity: &'static str, key: &str) -> Error {
    if let sqlx::Error::Database(ref db_err) = e {
        if db_err.is_unique_violation() {
            return StoreError::Conflict {
                entity,
                key: key.to_string(),
            }
            .into();
        }
    }
    Error::from(e)
}
