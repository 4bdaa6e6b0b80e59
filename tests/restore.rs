use std::sync::Arc;

use serde_json::json;
use tokio::sync::Mutex;
use uuid::Uuid;

use daylist::remote::auth::MemoryAuth;
use daylist::remote::memory::MemoryRemote;
use daylist::remote::{list_path, step_path, task_path, AuthProvider, Document, RemoteStore};
use daylist::repositories::{ListRepository, StepRepository, TaskRepository};
use daylist::storage::LocalStorage;
use daylist::sync::{BackupService, BackupStatus};

const UID: &str = "user-1";

async fn setup() -> (Arc<Mutex<LocalStorage>>, Arc<MemoryRemote>, BackupService) {
    let storage = Arc::new(Mutex::new(LocalStorage::new_in_memory().await.unwrap()));
    let auth: Arc<dyn AuthProvider> = Arc::new(MemoryAuth::new(UID));
    let remote = Arc::new(MemoryRemote::new());
    let remote_store: Arc<dyn RemoteStore> = remote.clone();
    let service = BackupService::new(Arc::clone(&storage), auth, remote_store);
    (storage, remote, service)
}

fn doc(pairs: &[(&str, serde_json::Value)]) -> Document {
    pairs.iter().map(|(k, v)| (k.to_string(), v.clone())).collect()
}

#[tokio::test]
async fn test_restore_without_remote_backup_keeps_local_data() {
    let (storage, _remote, service) = setup().await;
    {
        let storage = storage.lock().await;
        ListRepository::create(&storage.conn, "Precious", 0, None).await.unwrap();
    }

    let status = service.restore().await;

    assert!(matches!(status, BackupStatus::Error { .. }), "got {status:?}");
    let storage = storage.lock().await;
    let lists = ListRepository::get_all(&storage.conn).await.unwrap();
    assert_eq!(lists.len(), 1);
    assert_eq!(lists[0].name, "Precious");
}

#[tokio::test]
async fn test_restore_replaces_local_data_with_remote_mirror() {
    let (storage, remote, service) = setup().await;

    // Pre-existing local data that must be cleared
    {
        let storage = storage.lock().await;
        let old = ListRepository::create(&storage.conn, "Old", 0, None).await.unwrap();
        TaskRepository::create(&storage.conn, "old task", Some(old.id)).await.unwrap();
    }

    // Seed the remote mirror: one list, one task, one step
    let list_id = Uuid::new_v4().to_string();
    let task_id = Uuid::new_v4().to_string();
    let step_id = Uuid::new_v4().to_string();
    remote.seed(
        list_path(UID, &list_id),
        doc(&[
            ("name", json!("Groceries")),
            ("color", json!(3)),
            ("createdAt", json!(1_700_000_000_000i64)),
            ("position", json!(0)),
        ]),
    );
    remote.seed(
        task_path(UID, &list_id, &task_id),
        doc(&[
            ("title", json!("Milk")),
            ("isImportant", json!(true)),
            ("position", json!(0)),
        ]),
    );
    remote.seed(
        step_path(UID, &list_id, &task_id, &step_id),
        doc(&[("title", json!("Oat, not dairy")), ("isCompleted", json!(true))]),
    );

    let status = service.restore().await;
    assert_eq!(status, BackupStatus::Success { succeeded: 3, failed: 0 });

    let storage = storage.lock().await;
    let lists = ListRepository::get_all(&storage.conn).await.unwrap();
    assert_eq!(lists.len(), 1, "pre-existing lists must be cleared before inserting");
    assert_eq!(lists[0].name, "Groceries");
    assert_eq!(lists[0].color, 3);
    assert_eq!(lists[0].id.to_string(), list_id);

    let tasks = TaskRepository::get_for_list(&storage.conn, Some(&lists[0].id)).await.unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].title, "Milk");
    assert!(tasks[0].is_important);

    let steps = StepRepository::get_for_task(&storage.conn, &tasks[0].id).await.unwrap();
    assert_eq!(steps.len(), 1);
    assert_eq!(steps[0].title, "Oat, not dairy");
    assert!(steps[0].is_completed);
}

#[tokio::test]
async fn test_restore_defaults_missing_fields() {
    let (storage, remote, service) = setup().await;

    // A list document with no fields at all
    let list_id = Uuid::new_v4().to_string();
    remote.seed(list_path(UID, &list_id), Document::new());

    let status = service.restore().await;
    assert_eq!(status, BackupStatus::Success { succeeded: 1, failed: 0 });

    let storage = storage.lock().await;
    let lists = ListRepository::get_all(&storage.conn).await.unwrap();
    assert_eq!(lists.len(), 1);
    assert_eq!(lists[0].name, "Unnamed List");
    assert_eq!(lists[0].color, 0);
    assert_eq!(lists[0].emoji, None);
    assert_eq!(lists[0].created_at, 0);
}

#[tokio::test]
async fn test_restore_accepts_non_uuid_document_keys() {
    let (storage, remote, service) = setup().await;

    remote.seed(
        list_path(UID, "written-by-another-client"),
        doc(&[("name", json!("Imported"))]),
    );

    let status = service.restore().await;
    assert_eq!(status, BackupStatus::Success { succeeded: 1, failed: 0 });

    let storage = storage.lock().await;
    let lists = ListRepository::get_all(&storage.conn).await.unwrap();
    assert_eq!(lists.len(), 1);
    assert_eq!(lists[0].name, "Imported");
}

#[tokio::test]
async fn test_restore_aborts_on_connectivity_failure_and_keeps_local_data() {
    let (storage, remote, service) = setup().await;
    {
        let storage = storage.lock().await;
        ListRepository::create(&storage.conn, "Precious", 0, None).await.unwrap();
    }
    remote.seed(list_path(UID, &Uuid::new_v4().to_string()), doc(&[("name", json!("Remote"))]));
    remote.set_fail_all(true);

    let status = service.restore().await;

    assert!(matches!(status, BackupStatus::Error { .. }));
    let storage = storage.lock().await;
    let lists = ListRepository::get_all(&storage.conn).await.unwrap();
    assert_eq!(lists.len(), 1);
    assert_eq!(lists[0].name, "Precious");
}

#[tokio::test]
async fn test_backup_then_restore_round_trip() {
    let (storage, remote, service) = setup().await;

    {
        let storage = storage.lock().await;
        let list = ListRepository::create(&storage.conn, "Groceries", 3, Some("🛒".to_string()))
            .await
            .unwrap();
        let milk = TaskRepository::create(&storage.conn, "Milk", Some(list.id)).await.unwrap();
        TaskRepository::set_due_date(&storage.conn, &milk.id, Some(1_900_000_000_000)).await.unwrap();
        StepRepository::create(&storage.conn, &milk.id, "Oat").await.unwrap();
    }

    assert!(service.backup().await.is_success());

    // Wreck local state, then restore from the mirror
    {
        let storage = storage.lock().await;
        storage.clear_all_data().await.unwrap();
        ListRepository::create(&storage.conn, "Scratch", 0, None).await.unwrap();
    }

    let status = service.restore().await;
    assert_eq!(status, BackupStatus::Success { succeeded: 3, failed: 0 });
    drop(remote);

    let storage = storage.lock().await;
    let lists = ListRepository::get_all(&storage.conn).await.unwrap();
    assert_eq!(lists.len(), 1);
    assert_eq!(lists[0].name, "Groceries");
    assert_eq!(lists[0].emoji, Some("🛒".to_string()));

    let tasks = TaskRepository::get_for_list(&storage.conn, Some(&lists[0].id)).await.unwrap();
    assert_eq!(tasks.len(), 1);
    assert_eq!(tasks[0].due_date, Some(1_900_000_000_000));

    let steps = StepRepository::get_for_task(&storage.conn, &tasks[0].id).await.unwrap();
    assert_eq!(steps.len(), 1);
}
