use redis_stream_browser::{
    pagination::{DeleteOutcome, FetchKind, RangeWindow},
    stream::{SortOrder, StreamError},
};

use crate::test_utils::{TestEnv, TestUtils};

#[tokio::test]
async fn test_scan_visits_every_entry_once_in_both_orders() {
    let env = TestEnv::new();
    let ids = [
        "1000-0", "1000-1", "1000-2", "1001-0", "1500-0", "1500-1", "2000-0", "2999-0", "3000-0",
    ];
    env.seed_ids("events", &ids).await;

    for count in [1, 2, 3, 4, 100] {
        let mut paginator = env.paginator("events", count);

        paginator.load_entries().await.unwrap();
        paginator.load_all().await.unwrap();
        let mut expected = ids.to_vec();
        expected.reverse();
        assert_eq!(
            TestUtils::ids(paginator.entries()),
            expected,
            "descending scan with page size {}",
            count
        );

        paginator.change_sort_order(SortOrder::Asc).await.unwrap();
        paginator.load_all().await.unwrap();
        assert_eq!(
            TestUtils::ids(paginator.entries()),
            ids.to_vec(),
            "ascending scan with page size {}",
            count
        );
    }
}

#[tokio::test]
async fn test_scan_stays_within_window() {
    let env = TestEnv::new();
    env.seed_ids("events", &["1000-0", "1000-1", "2000-0", "3000-0", "4000-0"])
        .await;
    let mut paginator = env.paginator("events", 2);

    paginator.load_entries().await.unwrap();
    assert_eq!(paginator.state().range, RangeWindow::new("1000", "4000"));

    paginator.change_sort_order(SortOrder::Asc).await.unwrap();
    paginator.update_start(2000).await.unwrap();
    paginator.update_end(3000).await.unwrap();
    paginator.load_all().await.unwrap();

    assert_eq!(paginator.state().range, RangeWindow::new("2000", "3000"));
    assert_eq!(TestUtils::ids(paginator.entries()), vec!["2000-0", "3000-0"]);

    paginator.change_sort_order(SortOrder::Desc).await.unwrap();
    paginator.load_all().await.unwrap();
    assert_eq!(TestUtils::ids(paginator.entries()), vec!["3000-0", "2000-0"]);

    paginator.reset_filter().await.unwrap();
    paginator.load_all().await.unwrap();
    assert_eq!(paginator.state().range, RangeWindow::new("1000", "4000"));
    assert_eq!(paginator.entries().len(), 5);
}

#[tokio::test]
async fn test_window_follows_new_entries_only_when_pinned() {
    let env = TestEnv::new();
    env.seed_ids("events", &["1000-0", "2000-0"]).await;

    let mut pinned = env.paginator("events", 10);
    pinned.load_entries().await.unwrap();
    pinned
        .add_entries(vec![TestUtils::entry("3000-0", &[("n", "3000-0")])])
        .await
        .unwrap();
    assert_eq!(pinned.state().range, RangeWindow::new("1000", "3000"));

    pinned.load_entries().await.unwrap();
    assert_eq!(
        TestUtils::ids(pinned.entries()),
        vec!["3000-0", "2000-0", "1000-0"]
    );

    let mut narrowed = env.paginator("events", 10);
    narrowed.load_entries().await.unwrap();
    narrowed.update_end(2000).await.unwrap();
    narrowed
        .add_entries(vec![TestUtils::entry("4000-0", &[("n", "4000-0")])])
        .await
        .unwrap();
    assert_eq!(narrowed.state().range, RangeWindow::new("1000", "2000"));
    assert_eq!(
        TestUtils::ids(narrowed.entries()),
        vec!["2000-0", "1000-0"]
    );
}

#[tokio::test]
async fn test_failed_mutation_keeps_view() {
    let env = TestEnv::new();
    env.seed_ids("events", &["1000-0", "2000-0"]).await;
    let mut paginator = env.paginator("events", 10);
    paginator.load_entries().await.unwrap();
    let before = paginator.state().clone();

    let result = paginator
        .add_entries(vec![TestUtils::entry("500-0", &[("n", "500-0")])])
        .await;

    assert!(matches!(result, Err(StreamError::BadRequest(_))));
    assert_eq!(paginator.state(), &before);
}

#[tokio::test]
async fn test_deleting_remaining_entries_removes_key() {
    let env = TestEnv::new();
    env.seed_ids("events", &["1000-0", "2000-0", "3000-0"]).await;
    let mut paginator = env.paginator("events", 10);
    paginator.load_entries().await.unwrap();

    let partial = paginator
        .delete_entries(vec!["2000-0".to_string()])
        .await
        .unwrap();
    assert_eq!(partial, DeleteOutcome::EntriesDeleted(1));
    assert_eq!(TestUtils::ids(paginator.entries()), vec!["3000-0", "1000-0"]);

    let rest = paginator
        .delete_entries(vec!["1000-0".to_string(), "3000-0".to_string()])
        .await
        .unwrap();
    assert_eq!(rest, DeleteOutcome::KeyDeleted);
    assert!(paginator.entries().is_empty());
    assert!(env.get_store().await.get("events").is_none());
}

#[tokio::test]
async fn test_delete_without_loading_keeps_key() {
    let env = TestEnv::new();
    env.seed_ids("events", &["1000-0", "2000-0", "3000-0"]).await;
    let mut paginator = env.paginator("events", 10);

    let outcome = paginator
        .delete_entries(vec!["2000-0".to_string()])
        .await
        .unwrap();

    assert_eq!(outcome, DeleteOutcome::EntriesDeleted(1));
    assert!(env.get_store().await.get("events").is_some());
    assert_eq!(TestUtils::ids(paginator.entries()), vec!["3000-0", "1000-0"]);
}

#[tokio::test]
async fn test_slow_reply_is_discarded_after_sort_change() {
    let env = TestEnv::new();
    env.seed_ids("events", &["1000-0", "2000-0", "3000-0"]).await;
    let mut paginator = env.paginator("events", 10);

    let slow = paginator.begin_fetch(FetchKind::Fresh).unwrap();
    let slow_reply = env.service.get_entries(&slow.request).await;

    paginator.change_sort_order(SortOrder::Asc).await.unwrap();
    assert_eq!(paginator.complete_fetch(slow, slow_reply), Ok(false));

    assert_eq!(
        TestUtils::ids(paginator.entries()),
        vec!["1000-0", "2000-0", "3000-0"]
    );
    assert_eq!(paginator.state().sort_order, SortOrder::Asc);
}
