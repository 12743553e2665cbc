use custodian::application::storage::codec::default_registry;
use custodian::application::storage::repository::RepositoryProvider;
use custodian::domain::entities::DynamicClassRule;
use custodian::infrastructure::repositories::DynamicClassRepository;
use custodian::test_utils::MemoryDocumentStore;

fn test_rule(app_id: &str, class_name: &str) -> DynamicClassRule {
    DynamicClassRule {
        app_id: app_id.to_string(),
        full_class_name: class_name.to_string(),
        method_name: "currentTimeMillis".to_string(),
        parameter_types: "".to_string(),
        key_formula: "#args[0]".to_string(),
        config_type: 1,
        ..DynamicClassRule::default()
    }
}

#[tokio::test]
async fn insert_then_list_by_returns_submitted_fields() {
    let store = MemoryDocumentStore::new(default_registry());
    let repository = DynamicClassRepository::new(store.as_ref());

    let mut rule = test_rule("svc-1", "java.lang.System");
    assert!(repository.insert(&mut rule).await.unwrap());
    assert!(rule.id.is_some());

    let listed = repository.list_by("svc-1").await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].full_class_name, "java.lang.System");
    assert_eq!(listed[0].method_name, "currentTimeMillis");
    assert_eq!(listed[0].key_formula, "#args[0]");
    assert_eq!(listed[0].config_type, 1);
}

#[tokio::test]
async fn update_rewrites_rule_fields_by_identity() {
    let store = MemoryDocumentStore::new(default_registry());
    let repository = DynamicClassRepository::new(store.as_ref());

    let mut rule = test_rule("svc-2", "java.util.UUID");
    repository.insert(&mut rule).await.unwrap();

    rule.method_name = "randomUUID".to_string();
    rule.config_type = 2;
    assert!(repository.update(&rule).await.unwrap());

    let stored = &repository.list_by("svc-2").await.unwrap()[0];
    assert_eq!(stored.method_name, "randomUUID");
    assert_eq!(stored.config_type, 2);
    assert!(stored.modify_time >= stored.create_time);
}

#[tokio::test]
async fn update_without_identity_short_circuits() {
    let store = MemoryDocumentStore::new(default_registry());
    let repository = DynamicClassRepository::new(store.as_ref());

    let rule = test_rule("svc-2", "java.util.UUID");
    assert!(!repository.update(&rule).await.unwrap());
}

#[tokio::test]
async fn remove_deletes_by_identity() {
    let store = MemoryDocumentStore::new(default_registry());
    let repository = DynamicClassRepository::new(store.as_ref());

    let mut kept = test_rule("svc-3", "java.lang.System");
    let mut removed = test_rule("svc-3", "java.util.Random");
    repository.insert(&mut kept).await.unwrap();
    repository.insert(&mut removed).await.unwrap();

    assert!(repository.remove(&removed).await.unwrap());
    let listed = repository.list_by("svc-3").await.unwrap();
    assert_eq!(listed.len(), 1);
    assert_eq!(listed[0].full_class_name, "java.lang.System");
}

#[tokio::test]
async fn list_returns_newest_first() {
    let store = MemoryDocumentStore::new(default_registry());
    let repository = DynamicClassRepository::new(store.as_ref());

    let mut first = test_rule("svc-4", "com.example.Old");
    let mut second = test_rule("svc-4", "com.example.New");
    repository.insert(&mut first).await.unwrap();
    repository.insert(&mut second).await.unwrap();

    let all = repository.list().await.unwrap();
    assert_eq!(all[0].full_class_name, "com.example.New");
    assert_eq!(all[1].full_class_name, "com.example.Old");
}
