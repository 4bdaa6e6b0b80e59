use std::sync::Arc;

use daylist::repositories::{AttachmentRepository, ListRepository, StepRepository, TaskRepository};
use daylist::storage::LocalStorage;
use tokio::sync::Mutex;

async fn open() -> Arc<Mutex<LocalStorage>> {
    Arc::new(Mutex::new(LocalStorage::new_in_memory().await.unwrap()))
}

#[tokio::test]
async fn test_deleting_a_list_cascades_to_tasks_steps_and_attachments() {
    let storage = open().await;
    let storage = storage.lock().await;
    let conn = &storage.conn;

    let list = ListRepository::create(conn, "Groceries", 3, None).await.unwrap();
    let milk = TaskRepository::create(conn, "Milk", Some(list.id)).await.unwrap();
    let bread = TaskRepository::create(conn, "Bread", Some(list.id)).await.unwrap();
    StepRepository::create(conn, &milk.id, "Check the fridge first").await.unwrap();
    StepRepository::create(conn, &milk.id, "Oat, not dairy").await.unwrap();
    AttachmentRepository::create(conn, &bread.id, "content://photos/42", "receipt.jpg", "image/jpeg", 20_480)
        .await
        .unwrap();

    ListRepository::delete(conn, list.clone()).await.unwrap();

    assert!(ListRepository::get_by_id(conn, &list.id).await.unwrap().is_none());
    assert!(TaskRepository::get_all(conn).await.unwrap().is_empty());
    assert!(StepRepository::get_for_task(conn, &milk.id).await.unwrap().is_empty());
    assert!(AttachmentRepository::get_for_task(conn, &bread.id).await.unwrap().is_empty());
}

#[tokio::test]
async fn test_deleting_a_task_cascades_to_its_steps_only() {
    let storage = open().await;
    let storage = storage.lock().await;
    let conn = &storage.conn;

    let list = ListRepository::create(conn, "Errands", 0, None).await.unwrap();
    let keep = TaskRepository::create(conn, "Post office", Some(list.id)).await.unwrap();
    let gone = TaskRepository::create(conn, "Bank", Some(list.id)).await.unwrap();
    let keep_step = StepRepository::create(conn, &keep.id, "Bring the parcel").await.unwrap();
    StepRepository::create(conn, &gone.id, "Bring the card").await.unwrap();

    TaskRepository::delete(conn, gone.clone()).await.unwrap();

    assert!(StepRepository::get_for_task(conn, &gone.id).await.unwrap().is_empty());
    let remaining = StepRepository::get_for_task(conn, &keep.id).await.unwrap();
    assert_eq!(remaining.len(), 1);
    assert_eq!(remaining[0].id, keep_step.id);
}

#[tokio::test]
async fn test_new_tasks_are_appended_with_dense_positions() {
    let storage = open().await;
    let storage = storage.lock().await;
    let conn = &storage.conn;

    let list = ListRepository::create(conn, "Chores", 0, None).await.unwrap();
    for title in ["one", "two", "three"] {
        TaskRepository::create(conn, title, Some(list.id)).await.unwrap();
    }

    let tasks = TaskRepository::get_for_list(conn, Some(&list.id)).await.unwrap();
    let positions: Vec<i32> = tasks.iter().map(|t| t.position).collect();
    assert_eq!(positions, vec![0, 1, 2]);
}

#[tokio::test]
async fn test_reordering_renumbers_positions_densely() {
    let storage = open().await;
    let storage = storage.lock().await;
    let conn = &storage.conn;

    let list = ListRepository::create(conn, "Chores", 0, None).await.unwrap();
    let mut ids = Vec::new();
    for title in ["one", "two", "three"] {
        ids.push(TaskRepository::create(conn, title, Some(list.id)).await.unwrap().id);
    }

    // Move the last task to the front
    TaskRepository::move_to_position(conn, &ids[2], 0).await.unwrap();

    let tasks = TaskRepository::get_for_list(conn, Some(&list.id)).await.unwrap();
    let titles: Vec<&str> = tasks.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, vec!["three", "one", "two"]);
    let positions: Vec<i32> = tasks.iter().map(|t| t.position).collect();
    assert_eq!(positions, vec![0, 1, 2]);

    // Out-of-range target clamps to the end
    TaskRepository::move_to_position(conn, &ids[2], 99).await.unwrap();
    let tasks = TaskRepository::get_for_list(conn, Some(&list.id)).await.unwrap();
    let titles: Vec<&str> = tasks.iter().map(|t| t.title.as_str()).collect();
    assert_eq!(titles, vec!["one", "two", "three"]);
    let positions: Vec<i32> = tasks.iter().map(|t| t.position).collect();
    assert_eq!(positions, vec![0, 1, 2]);
}

#[tokio::test]
async fn test_unfiled_tasks_live_outside_any_list() {
    let storage = open().await;
    let storage = storage.lock().await;
    let conn = &storage.conn;

    let list = ListRepository::create(conn, "Filed", 0, None).await.unwrap();
    TaskRepository::create(conn, "in list", Some(list.id)).await.unwrap();
    let loose = TaskRepository::create(conn, "loose end", None).await.unwrap();

    let unfiled = TaskRepository::get_for_list(conn, None).await.unwrap();
    assert_eq!(unfiled.len(), 1);
    assert_eq!(unfiled[0].id, loose.id);

    // clear_all_data removes unfiled tasks too, which no list cascade reaches
    storage.clear_all_data().await.unwrap();
    assert!(!storage.has_data().await.unwrap());
}

#[tokio::test]
async fn test_flag_toggles_touch_modified_at() {
    let storage = open().await;
    let storage = storage.lock().await;
    let conn = &storage.conn;

    let task = TaskRepository::create(conn, "flag me", None).await.unwrap();

    let updated = TaskRepository::set_important(conn, &task.id, true).await.unwrap();
    assert!(updated.is_important);
    assert!(updated.modified_at >= task.modified_at);

    let updated = TaskRepository::set_in_my_day(conn, &task.id, true).await.unwrap();
    assert!(updated.in_my_day);

    let updated = TaskRepository::set_completed(conn, &task.id, true).await.unwrap();
    assert!(updated.is_completed);

    let updated = TaskRepository::set_due_date(conn, &task.id, Some(1_900_000_000_000)).await.unwrap();
    assert_eq!(updated.due_date, Some(1_900_000_000_000));
}

#[tokio::test]
async fn test_search_matches_title_and_description() {
    let storage = open().await;
    let storage = storage.lock().await;
    let conn = &storage.conn;

    let task = TaskRepository::create(conn, "Buy milk", None).await.unwrap();
    let mut active: daylist::task::ActiveModel = task.into();
    active.description = sea_orm::ActiveValue::Set(Some("the oat kind".to_string()));
    TaskRepository::update(conn, active).await.unwrap();
    TaskRepository::create(conn, "Walk the dog", None).await.unwrap();

    let by_title = TaskRepository::search(conn, "milk").await.unwrap();
    assert_eq!(by_title.len(), 1);

    let by_description = TaskRepository::search(conn, "oat").await.unwrap();
    assert_eq!(by_description.len(), 1);

    let none = TaskRepository::search(conn, "laundry").await.unwrap();
    assert!(none.is_empty());
}

#[tokio::test]
async fn test_duplicate_copies_tasks_and_steps() {
    let storage = open().await;
    let storage = storage.lock().await;
    let conn = &storage.conn;

    let list = ListRepository::create(conn, "Trip", 7, Some("✈️".to_string())).await.unwrap();
    let pack = TaskRepository::create(conn, "Pack", Some(list.id)).await.unwrap();
    TaskRepository::create(conn, "Book hotel", Some(list.id)).await.unwrap();
    StepRepository::create(conn, &pack.id, "Passport").await.unwrap();
    TaskRepository::set_reminder(conn, &pack.id, Some(1_900_000_000_000)).await.unwrap();

    let copy = ListRepository::duplicate(conn, &list.id).await.unwrap();

    assert_eq!(copy.name, "Trip copy");
    assert_eq!(copy.color, 7);
    assert_ne!(copy.id, list.id);

    let copied_tasks = TaskRepository::get_for_list(conn, Some(&copy.id)).await.unwrap();
    assert_eq!(copied_tasks.len(), 2);
    let copied_pack = copied_tasks.iter().find(|t| t.title == "Pack").unwrap();
    // Reminders don't carry over to the copy
    assert_eq!(copied_pack.reminder_at, None);
    let copied_steps = StepRepository::get_for_task(conn, &copied_pack.id).await.unwrap();
    assert_eq!(copied_steps.len(), 1);
    assert_eq!(copied_steps[0].title, "Passport");

    // The original is untouched
    let original_tasks = TaskRepository::get_for_list(conn, Some(&list.id)).await.unwrap();
    assert_eq!(original_tasks.len(), 2);
}

#[tokio::test]
async fn test_schema_version_mismatch_wipes_the_database() {
    use sea_orm::ConnectionTrait;

    let dir = std::env::temp_dir().join("daylist_test_migration");
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    let url = format!("sqlite://{}/daylist.db?mode=rwc", dir.display());

    // First open: create some data
    {
        let storage = LocalStorage::new(&url).await.unwrap();
        ListRepository::create(&storage.conn, "Persisted", 0, None).await.unwrap();
        assert!(storage.has_data().await.unwrap());
    }

    // Reopen with a matching version: data survives
    {
        let storage = LocalStorage::new(&url).await.unwrap();
        assert!(storage.has_data().await.unwrap());
    }

    // Tamper with the stored schema version
    {
        let conn = sea_orm::Database::connect(url.as_str()).await.unwrap();
        conn.execute_unprepared("PRAGMA user_version = 1").await.unwrap();
    }

    // Destructive migration policy: mismatch wipes and recreates
    {
        let storage = LocalStorage::new(&url).await.unwrap();
        assert!(!storage.has_data().await.unwrap());
    }

    let _ = std::fs::remove_dir_all(&dir);
}
