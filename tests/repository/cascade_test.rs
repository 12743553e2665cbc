use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use custodian::application::storage::codec::default_registry;
use custodian::application::storage::repository::{CascadeDelete, RepositoryProvider};
use custodian::domain::entities::{Application, DynamicClassRule, Operation};
use custodian::infrastructure::repositories::{
    ApplicationRepository, DynamicClassRepository, OperationRepository,
};
use custodian::test_utils::MemoryDocumentStore;
use custodian::RepositoryError;

struct Fixture {
    applications: ApplicationRepository,
    operations: Arc<OperationRepository>,
    dynamic_classes: Arc<DynamicClassRepository>,
}

async fn build_fixture() -> Fixture {
    let store = MemoryDocumentStore::new(default_registry());
    let operations = Arc::new(OperationRepository::new(store.as_ref()));
    let dynamic_classes = Arc::new(DynamicClassRepository::new(store.as_ref()));

    let operations_target: Arc<dyn CascadeDelete> = operations.clone();
    let dynamic_classes_target: Arc<dyn CascadeDelete> = dynamic_classes.clone();
    let applications = ApplicationRepository::new(
        store.as_ref(),
        vec![operations_target, dynamic_classes_target],
    )
    .await
    .expect("repository construction");

    Fixture {
        applications,
        operations,
        dynamic_classes,
    }
}

async fn seed_app(fixture: &Fixture, app_id: &str) {
    let mut app = Application {
        app_id: app_id.to_string(),
        app_name: format!("{app_id} name"),
        ..Application::default()
    };
    fixture.applications.insert(&mut app).await.unwrap();

    for name in ["getUser", "putUser"] {
        let mut operation = Operation {
            app_id: app_id.to_string(),
            service_id: "user-service".to_string(),
            operation_name: name.to_string(),
            operation_type: "http".to_string(),
            operation_types: vec!["http".to_string()],
            ..Operation::default()
        };
        fixture.operations.insert(&mut operation).await.unwrap();
    }

    let mut rule = DynamicClassRule {
        app_id: app_id.to_string(),
        full_class_name: "java.lang.System".to_string(),
        ..DynamicClassRule::default()
    };
    fixture.dynamic_classes.insert(&mut rule).await.unwrap();
}

#[tokio::test]
async fn removing_an_application_cascades_to_every_provider() {
    let fixture = build_fixture().await;
    seed_app(&fixture, "svc-1").await;
    seed_app(&fixture, "svc-2").await;

    let app = fixture.applications.list_by("svc-1").await.unwrap()[0].clone();
    assert!(fixture.applications.remove(&app).await.unwrap());

    assert!(fixture.applications.list_by("svc-1").await.unwrap().is_empty());
    assert!(fixture.operations.list_by("svc-1").await.unwrap().is_empty());
    assert!(fixture
        .dynamic_classes
        .list_by("svc-1")
        .await
        .unwrap()
        .is_empty());

    // Unrelated applications are untouched.
    assert_eq!(fixture.applications.list_by("svc-2").await.unwrap().len(), 1);
    assert_eq!(fixture.operations.list_by("svc-2").await.unwrap().len(), 2);
    assert_eq!(
        fixture.dynamic_classes.list_by("svc-2").await.unwrap().len(),
        1
    );
}

#[tokio::test]
async fn remove_by_app_id_is_idempotent() {
    let fixture = build_fixture().await;
    seed_app(&fixture, "svc-3").await;

    assert!(fixture.applications.remove_by_app_id("svc-3").await.unwrap());

    // Re-running the cascade over already-empty collections is a no-op.
    assert!(!fixture.applications.remove_by_app_id("svc-3").await.unwrap());
    assert!(fixture.operations.list_by("svc-3").await.unwrap().is_empty());
    assert!(fixture
        .dynamic_classes
        .list_by("svc-3")
        .await
        .unwrap()
        .is_empty());
}

/// Fails its first delete, succeeds afterwards, like a collection that was
/// briefly unavailable.
struct FlakyTarget {
    failed_once: AtomicBool,
}

#[async_trait]
impl CascadeDelete for FlakyTarget {
    async fn remove_by_app_id(&self, _app_id: &str) -> Result<bool, RepositoryError> {
        if !self.failed_once.swap(true, Ordering::SeqCst) {
            return Err(RepositoryError::QueryError(
                "collection unavailable".to_string(),
            ));
        }
        Ok(false)
    }
}

#[tokio::test]
async fn failed_cascade_leaves_owning_record_for_retry() {
    let store = MemoryDocumentStore::new(default_registry());
    let operations = Arc::new(OperationRepository::new(store.as_ref()));

    let flaky: Arc<dyn CascadeDelete> = Arc::new(FlakyTarget {
        failed_once: AtomicBool::new(false),
    });
    let downstream: Arc<dyn CascadeDelete> = operations.clone();
    let applications = ApplicationRepository::new(store.as_ref(), vec![flaky, downstream])
        .await
        .expect("repository construction");

    let mut app = Application {
        app_id: "svc-flaky".to_string(),
        app_name: "svc flaky".to_string(),
        ..Application::default()
    };
    applications.insert(&mut app).await.unwrap();
    let mut operation = Operation {
        app_id: "svc-flaky".to_string(),
        service_id: "user-service".to_string(),
        operation_name: "getUser".to_string(),
        ..Operation::default()
    };
    operations.insert(&mut operation).await.unwrap();

    // First attempt stops at the failing target; nothing downstream of it is
    // touched and the owning record survives as the retry anchor.
    assert!(applications.remove_by_app_id("svc-flaky").await.is_err());
    assert_eq!(operations.list_by("svc-flaky").await.unwrap().len(), 1);
    assert_eq!(applications.list_by("svc-flaky").await.unwrap().len(), 1);

    // The retry resumes from the surviving App record and completes.
    assert!(applications.remove_by_app_id("svc-flaky").await.unwrap());
    assert!(operations.list_by("svc-flaky").await.unwrap().is_empty());
    assert!(applications.list_by("svc-flaky").await.unwrap().is_empty());
}

#[tokio::test]
async fn remove_with_blank_app_id_short_circuits() {
    let fixture = build_fixture().await;
    seed_app(&fixture, "svc-4").await;

    let blank = Application::default();
    assert!(!fixture.applications.remove(&blank).await.unwrap());
    assert!(!fixture.applications.remove_by_app_id("").await.unwrap());

    // Nothing was deleted anywhere.
    assert_eq!(fixture.applications.list_by("svc-4").await.unwrap().len(), 1);
    assert_eq!(fixture.operations.list_by("svc-4").await.unwrap().len(), 2);
}
