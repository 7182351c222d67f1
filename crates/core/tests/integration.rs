//! End-to-end pipeline test: scan → plan → apply → rollback

use ratchet_adapter::{AdapterRegistry, ChangelogInfo, DependencyEntry, MockAdapter};
use ratchet_config::Config;
use ratchet_core::{apply_plan, plan_updates, rollback_plan, scan_project, ApplyOptions, RatchetCtxBuilder, RollbackOptions};
use ratchet_store::{MemoryStore, Store};
use ratchet_types::{DependencyClass, EcosystemKind, Project};
use semver::Version;
use std::sync::Arc;

#[tokio::test]
async fn full_pipeline_scan_plan_apply_rollback() {
    let store = Arc::new(MemoryStore::new());
    let mut project = Project::new("demo", "/tmp/demo", EcosystemKind::Npm, "package.json");
    project.id = store.upsert_project(&project).await.unwrap();

    let adapter = Arc::new(MockAdapter::new(EcosystemKind::Npm));
    adapter
        .set_dependencies(
            project.path.clone(),
            vec![DependencyEntry {
                name: "left-pad".to_string(),
                declared_constraint: "^1.0.0".to_string(),
                resolved_version: Some(Version::parse("1.0.0").unwrap()),
                class: DependencyClass::Direct,
            }],
        )
        .await;
    adapter
        .set_latest_version("left-pad", Version::parse("1.0.1").unwrap(), ChangelogInfo::default())
        .await;

    let mut registry = AdapterRegistry::new();
    registry.register(adapter.clone());

    let ctx = RatchetCtxBuilder::new()
        .store(store.clone())
        .adapters(registry)
        .config(Config::default())
        .build()
        .unwrap();

    let scan_result = scan_project(&ctx, project.id).await.unwrap();
    assert_eq!(scan_result.updates_found, 1);

    let plan = plan_updates(&ctx, project.id).await.unwrap();
    assert_eq!(plan.update_groups.iter().map(|g| g.candidates.len()).sum::<usize>(), 1);

    let apply_result = apply_plan(&ctx, project.id, &plan, &ApplyOptions::default())
        .await
        .unwrap();
    assert_eq!(apply_result.successful.len(), 1);
    let plan_id = apply_result.rollback_plan_id.unwrap();

    let rollback_result = rollback_plan(&ctx, project.id, plan_id, RollbackOptions::default())
        .await
        .unwrap();
    assert_eq!(rollback_result.completed.len(), 1);

    let dependency = store.get_dependency(plan.update_groups[0].candidates[0].dependency.id).await.unwrap();
    assert_eq!(dependency.current_version, Some(Version::parse("1.0.0").unwrap()));
}
