//! Integration tests for the executor crate

use ratchet_adapter::MockAdapter;
use ratchet_executor::{ApplyOptions, Executor, RollbackEngine, RollbackOptions};
use ratchet_planner::{generate_plan, Candidate};
use ratchet_policy::ConfigOverlay;
use ratchet_store::{MemoryStore, Store};
use ratchet_types::{
    AutoUpdateLevel, Dependency, DependencyClass, EcosystemKind, Project, RiskLevel, Update,
    UpdateStatus, UpdateType,
};
use semver::Version;
use std::sync::Arc;

fn overlay() -> ConfigOverlay {
    ConfigOverlay {
        auto_update_level: AutoUpdateLevel::Major,
        require_confirmation: false,
        whitelist_enabled: false,
    }
}

async fn setup() -> (Arc<MemoryStore>, Project, Dependency) {
    let store = Arc::new(MemoryStore::new());
    let mut project = Project::new("demo", "/tmp/demo", EcosystemKind::Npm, "package.json");
    project.id = store.upsert_project(&project).await.unwrap();

    let mut dependency = Dependency::new(project.id, "left-pad", "^1.0.0", DependencyClass::Direct, "npm");
    dependency.current_version = Some(Version::parse("1.0.0").unwrap());
    dependency.id = store.upsert_dependency(&dependency).await.unwrap();

    (store, project, dependency)
}

async fn pending_update(store: &MemoryStore, dependency: &Dependency, to: &str, update_type: UpdateType) -> Update {
    let update = Update::new(
        dependency.id,
        dependency.current_version.clone().unwrap(),
        Version::parse(to).unwrap(),
        update_type,
        RiskLevel::Low,
        false,
        false,
    )
    .unwrap();
    let id = store.create_update(&update).await.unwrap();
    let mut update = update;
    update.id = id;
    update
}

#[tokio::test]
async fn apply_marks_update_applied_and_bumps_dependency() {
    let (store, project, dependency) = setup().await;
    let update = pending_update(&store, &dependency, "1.0.1", UpdateType::Patch).await;

    let plan = generate_plan(
        project.id,
        vec![Candidate {
            dependency: dependency.clone(),
            update: update.clone(),
        }],
    )
    .unwrap();

    let adapter = Arc::new(MockAdapter::new(EcosystemKind::Npm));
    let executor = Executor::new(store.clone());

    let result = executor
        .apply(
            &plan,
            &project,
            adapter.clone(),
            &[],
            &overlay(),
            &ApplyOptions::default(),
        )
        .await
        .unwrap();

    assert_eq!(result.successful, vec![update.id]);
    assert!(result.failed.is_empty());

    let stored_update = store.get_update(update.id).await.unwrap();
    assert_eq!(stored_update.status, UpdateStatus::Applied);

    let stored_dependency = store.get_dependency(dependency.id).await.unwrap();
    assert_eq!(stored_dependency.current_version, Some(Version::parse("1.0.1").unwrap()));

    let calls = adapter.applied_calls().await;
    assert_eq!(calls.len(), 1);
}

#[tokio::test]
async fn apply_records_adapter_failure_without_rollback_item() {
    let (store, project, dependency) = setup().await;
    let update = pending_update(&store, &dependency, "2.0.0", UpdateType::Major).await;

    let plan = generate_plan(
        project.id,
        vec![Candidate {
            dependency: dependency.clone(),
            update: update.clone(),
        }],
    )
    .unwrap();

    let adapter = Arc::new(MockAdapter::new(EcosystemKind::Npm));
    adapter.inject_apply_failure("left-pad", "registry unreachable").await;
    let executor = Executor::new(store.clone());

    let result = executor
        .apply(
            &plan,
            &project,
            adapter,
            &[],
            &overlay(),
            &ApplyOptions::default(),
        )
        .await
        .unwrap();

    assert!(result.successful.is_empty());
    assert_eq!(result.failed.len(), 1);

    let stored_update = store.get_update(update.id).await.unwrap();
    assert_eq!(stored_update.status, UpdateStatus::Failed);
}

#[tokio::test]
async fn dry_run_does_not_touch_adapter_or_create_rollback_items() {
    let (store, project, dependency) = setup().await;
    let update = pending_update(&store, &dependency, "1.0.1", UpdateType::Patch).await;

    let plan = generate_plan(
        project.id,
        vec![Candidate {
            dependency: dependency.clone(),
            update: update.clone(),
        }],
    )
    .unwrap();

    let adapter = Arc::new(MockAdapter::new(EcosystemKind::Npm));
    let executor = Executor::new(store.clone());

    let options = ApplyOptions {
        dry_run: true,
        ..ApplyOptions::default()
    };
    let result = executor
        .apply(&plan, &project, adapter.clone(), &[], &overlay(), &options)
        .await
        .unwrap();

    assert_eq!(result.successful, vec![update.id]);
    assert!(result.rollback_plan_id.is_none());
    assert!(adapter.applied_calls().await.is_empty());

    // dry_run never persists a status change
    let stored_update = store.get_update(update.id).await.unwrap();
    assert_eq!(stored_update.status, UpdateStatus::Pending);
}

#[tokio::test]
async fn rollback_reverses_applied_items_in_order() {
    let (store, project, dependency) = setup().await;
    let update = pending_update(&store, &dependency, "1.0.1", UpdateType::Patch).await;

    let plan = generate_plan(
        project.id,
        vec![Candidate {
            dependency: dependency.clone(),
            update: update.clone(),
        }],
    )
    .unwrap();

    let adapter = Arc::new(MockAdapter::new(EcosystemKind::Npm));
    let executor = Executor::new(store.clone());
    let result = executor
        .apply(
            &plan,
            &project,
            adapter.clone(),
            &[],
            &overlay(),
            &ApplyOptions::default(),
        )
        .await
        .unwrap();
    let plan_id = result.rollback_plan_id.unwrap();

    let rollback = RollbackEngine::new(store.clone());
    let rollback_result = rollback
        .execute(plan_id, &project, adapter.clone(), RollbackOptions::default())
        .await
        .unwrap();

    assert_eq!(rollback_result.completed.len(), 1);
    assert!(rollback_result.failed.is_empty());

    let calls = adapter.applied_calls().await;
    assert_eq!(calls.len(), 2);
    assert_eq!(calls[1].2, Version::parse("1.0.0").unwrap());
}
