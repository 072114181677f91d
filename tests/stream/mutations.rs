use std::time::Duration;

use redis_stream_browser::{
    key_value_store::DataType,
    stream::{
        AddStreamEntriesRequest, CreateStreamRequest, DeleteStreamEntriesRequest,
        GetStreamEntriesRequest, StreamError,
    },
};
use tokio::time::Instant;

use crate::test_utils::{TestEnv, TestUtils};

#[tokio::test]
async fn test_create_stream_appends_entries_in_order() {
    let env = TestEnv::new();

    env.service
        .create_stream(&CreateStreamRequest {
            key_name: "events".to_string(),
            entries: vec![
                TestUtils::entry("1000-0", &[("a", "1")]),
                TestUtils::entry("1000-*", &[("b", "2")]),
                TestUtils::entry("2000-0", &[("c", "3"), ("d", "4")]),
            ],
            expire: None,
        })
        .await
        .unwrap();

    let response = env
        .service
        .get_entries(&GetStreamEntriesRequest::new("events"))
        .await
        .unwrap();
    assert_eq!(response.total, 3);
    assert_eq!(
        response.entries,
        vec![
            TestUtils::entry("2000-0", &[("c", "3"), ("d", "4")]),
            TestUtils::entry("1000-1", &[("b", "2")]),
            TestUtils::entry("1000-0", &[("a", "1")]),
        ]
    );
}

#[tokio::test]
async fn test_create_stream_with_expire_sets_deadline() {
    tokio::time::pause();
    let env = TestEnv::new();
    let now = Instant::now();

    env.service
        .create_stream(&CreateStreamRequest {
            key_name: "events".to_string(),
            entries: vec![TestUtils::entry("*", &[("a", "1")])],
            expire: Some(60),
        })
        .await
        .unwrap();

    let expiration = env.get_store().await.get("events").unwrap().expiration;
    assert_eq!(expiration, Some(now + Duration::from_secs(60)));

    tokio::time::advance(Duration::from_secs(61)).await;

    assert_eq!(
        env.service
            .get_entries(&GetStreamEntriesRequest::new("events"))
            .await,
        Err(StreamError::NotFound)
    );
}

#[tokio::test]
async fn test_create_stream_conflict_issues_no_appends() {
    let env = TestEnv::new();
    env.seed_ids("events", &["1000-0"]).await;

    let result = env
        .service
        .create_stream(&CreateStreamRequest {
            key_name: "events".to_string(),
            entries: vec![TestUtils::entry("5000-0", &[("a", "1")])],
            expire: None,
        })
        .await;

    assert_eq!(result, Err(StreamError::Conflict));

    let store_guard = env.get_store().await;
    let Some(DataType::Stream(stream)) = store_guard.get("events").map(|value| &value.data) else {
        panic!("events should still be a stream");
    };
    assert_eq!(stream.entries.len(), 1);
}

#[tokio::test]
async fn test_create_stream_validation() {
    let env = TestEnv::new();

    let test_cases = vec![
        CreateStreamRequest {
            key_name: "".to_string(),
            entries: vec![TestUtils::entry("*", &[("a", "1")])],
            expire: None,
        },
        CreateStreamRequest {
            key_name: "events".to_string(),
            entries: vec![],
            expire: None,
        },
        CreateStreamRequest {
            key_name: "events".to_string(),
            entries: vec![TestUtils::entry("*", &[])],
            expire: None,
        },
        CreateStreamRequest {
            key_name: "events".to_string(),
            entries: vec![TestUtils::entry("*", &[("a", "1")])],
            expire: Some(0),
        },
        CreateStreamRequest {
            key_name: "events".to_string(),
            entries: vec![TestUtils::entry("*", &[("a", "1")])],
            expire: Some(2_147_483_648),
        },
    ];

    for request in test_cases {
        let result = env.service.create_stream(&request).await;

        assert!(
            matches!(result, Err(StreamError::BadRequest(_))),
            "creating {:?} gave {:?}",
            request,
            result
        );
    }
    assert!(env.get_store().await.is_empty());
}

#[tokio::test]
async fn test_add_entries_returns_assigned_ids() {
    let env = TestEnv::new();
    env.seed_ids("events", &["1000-0"]).await;

    let response = env
        .service
        .add_entries(&AddStreamEntriesRequest {
            key_name: "events".to_string(),
            entries: vec![
                TestUtils::entry("1000-*", &[("a", "1")]),
                TestUtils::entry("1500-3", &[("b", "2")]),
            ],
        })
        .await
        .unwrap();

    assert_eq!(response.key_name, "events");
    assert_eq!(response.entries, vec!["1000-1", "1500-3"]);
}

#[tokio::test]
async fn test_add_entries_errors() {
    let env = TestEnv::new();
    env.seed_ids("events", &["2000-0"]).await;

    let missing = env
        .service
        .add_entries(&AddStreamEntriesRequest {
            key_name: "missing".to_string(),
            entries: vec![TestUtils::entry("*", &[("a", "1")])],
        })
        .await;
    assert_eq!(missing, Err(StreamError::NotFound));

    let not_greater = env
        .service
        .add_entries(&AddStreamEntriesRequest {
            key_name: "events".to_string(),
            entries: vec![TestUtils::entry("1000-0", &[("a", "1")])],
        })
        .await;
    assert_eq!(
        not_greater,
        Err(StreamError::BadRequest(
            "ERR The ID specified in XADD is equal or smaller than the target stream top item"
                .to_string()
        ))
    );
}

#[tokio::test]
async fn test_delete_entries_reports_affected() {
    let env = TestEnv::new();
    env.seed_ids("events", &["1000-0", "2000-0", "3000-0"]).await;

    let response = env
        .service
        .delete_entries(&DeleteStreamEntriesRequest {
            key_name: "events".to_string(),
            entries: vec![
                "1000-0".to_string(),
                "3000-0".to_string(),
                "9000-0".to_string(),
            ],
        })
        .await
        .unwrap();
    assert_eq!(response.affected, 2);

    let remaining = env
        .service
        .get_entries(&GetStreamEntriesRequest::new("events"))
        .await
        .unwrap();
    assert_eq!(TestUtils::ids(&remaining.entries), vec!["2000-0"]);
    assert_eq!(remaining.last_generated_id, "3000-0");

    let missing = env
        .service
        .delete_entries(&DeleteStreamEntriesRequest {
            key_name: "missing".to_string(),
            entries: vec!["1000-0".to_string()],
        })
        .await;
    assert_eq!(missing, Err(StreamError::NotFound));
}

#[tokio::test]
async fn test_get_length() {
    let env = TestEnv::new();
    env.seed_ids("events", &["1000-0", "2000-0"]).await;

    assert_eq!(env.service.get_length("events").await, Ok(2));
    assert_eq!(env.service.get_length("missing").await, Ok(0));
}

#[tokio::test]
async fn test_delete_key() {
    let env = TestEnv::new();
    env.seed_ids("events", &["1000-0"]).await;

    assert_eq!(env.service.delete_key("events").await, Ok(true));
    assert_eq!(env.service.delete_key("events").await, Ok(false));
    assert!(env.get_store().await.is_empty());
}
