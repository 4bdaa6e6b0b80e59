use std::sync::Arc;
use std::time::Duration;

use tokio::sync::Mutex;

use daylist::repositories::TaskRepository;
use daylist::search::SearchDebouncer;
use daylist::storage::LocalStorage;

async fn storage_with_tasks(titles: &[&str]) -> Arc<Mutex<LocalStorage>> {
    let storage = LocalStorage::new_in_memory().await.unwrap();
    for title in titles {
        TaskRepository::create(&storage.conn, title, None).await.unwrap();
    }
    Arc::new(Mutex::new(storage))
}

#[tokio::test]
async fn test_single_search_delivers_after_quiet_period() {
    let storage = storage_with_tasks(&["Buy milk", "Walk the dog"]).await;
    let debouncer = SearchDebouncer::with_delay(storage, Duration::from_millis(50));

    let results = debouncer.search("milk").await.unwrap();
    let results = results.expect("sole search must deliver");
    assert_eq!(results.len(), 1);
    assert_eq!(results[0].title, "Buy milk");
}

#[tokio::test]
async fn test_rapid_searches_deliver_only_the_latest() {
    let storage = storage_with_tasks(&["Buy milk", "Walk the dog"]).await;
    let debouncer = Arc::new(SearchDebouncer::with_delay(storage, Duration::from_millis(50)));

    // Two searches in quick succession: the older one is discarded
    let (first, second) = tokio::join!(debouncer.search("milk"), debouncer.search("dog"));

    assert!(first.unwrap().is_none(), "superseded search must be discarded");
    let second = second.unwrap().expect("latest search must deliver");
    assert_eq!(second.len(), 1);
    assert_eq!(second[0].title, "Walk the dog");
}

#[tokio::test]
async fn test_search_after_quiet_period_is_independent() {
    let storage = storage_with_tasks(&["Buy milk"]).await;
    let debouncer = SearchDebouncer::with_delay(storage, Duration::from_millis(20));

    let first = debouncer.search("milk").await.unwrap();
    assert!(first.is_some());

    // A later search is not affected by the earlier completed one
    let second = debouncer.search("milk").await.unwrap();
    assert!(second.is_some());
}
