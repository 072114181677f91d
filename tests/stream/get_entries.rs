use redis_stream_browser::stream::{GetStreamEntriesRequest, SortOrder, StreamError};

use crate::test_utils::{TestEnv, TestUtils};

fn request(start: &str, end: &str, count: u64, sort_order: SortOrder) -> GetStreamEntriesRequest {
    GetStreamEntriesRequest {
        key_name: "events".to_string(),
        start: start.to_string(),
        end: end.to_string(),
        count,
        sort_order,
    }
}

#[tokio::test]
async fn test_get_entries_returns_stream_metadata() {
    let env = TestEnv::new();
    env.seed_stream(
        "events",
        &[
            ("1000-0", &[("temperature", "20"), ("humidity", "40")]),
            ("2000-0", &[("temperature", "21")]),
            ("3000-0", &[("temperature", "22")]),
        ],
    )
    .await;

    let response = env
        .service
        .get_entries(&request("-", "+", 2, SortOrder::Desc))
        .await
        .unwrap();

    assert_eq!(response.key_name, "events");
    assert_eq!(response.total, 3);
    assert_eq!(response.last_generated_id, "3000-0");
    assert_eq!(
        response.first_entry,
        Some(TestUtils::entry(
            "1000-0",
            &[("temperature", "20"), ("humidity", "40")]
        ))
    );
    assert_eq!(
        response.last_entry,
        Some(TestUtils::entry("3000-0", &[("temperature", "22")]))
    );
    assert_eq!(TestUtils::ids(&response.entries), vec!["3000-0", "2000-0"]);
}

#[tokio::test]
async fn test_get_entries_orders_by_sort_order() {
    let env = TestEnv::new();
    env.seed_ids("events", &["1000-0", "1000-1", "2000-0", "3000-5"])
        .await;

    let test_cases = vec![
        (
            request("-", "+", 10, SortOrder::Asc),
            vec!["1000-0", "1000-1", "2000-0", "3000-5"],
        ),
        (
            request("-", "+", 10, SortOrder::Desc),
            vec!["3000-5", "2000-0", "1000-1", "1000-0"],
        ),
        (request("1000", "2000", 10, SortOrder::Asc), vec!["1000-0", "1000-1", "2000-0"]),
        (request("1000", "2000", 10, SortOrder::Desc), vec!["2000-0", "1000-1", "1000-0"]),
        (request("(1000-0", "3000", 10, SortOrder::Asc), vec!["1000-1", "2000-0", "3000-5"]),
        (request("1000-1", "2999", 1, SortOrder::Desc), vec!["2000-0"]),
        (request("4000", "+", 10, SortOrder::Asc), vec![]),
    ];

    for (request, expected) in test_cases {
        let response = env.service.get_entries(&request).await.unwrap();

        assert_eq!(
            TestUtils::ids(&response.entries),
            expected,
            "getting entries for {:?}",
            request
        );
    }
}

#[tokio::test]
async fn test_get_entries_preserves_field_order() {
    let env = TestEnv::new();
    env.seed_stream("events", &[("1000-0", &[("zeta", "1"), ("alpha", "2"), ("mid", "3")])])
        .await;

    let response = env
        .service
        .get_entries(&request("-", "+", 10, SortOrder::Asc))
        .await
        .unwrap();

    let fields = response.entries[0].fields.iter().collect::<Vec<(&str, &str)>>();
    assert_eq!(fields, vec![("zeta", "1"), ("alpha", "2"), ("mid", "3")]);
}

#[tokio::test]
async fn test_get_entries_errors() {
    let env = TestEnv::new();
    env.seed_string("plain", "value").await;

    let test_cases = vec![
        (request("-", "+", 10, SortOrder::Asc), StreamError::NotFound),
        (
            GetStreamEntriesRequest {
                key_name: "plain".to_string(),
                ..request("-", "+", 10, SortOrder::Asc)
            },
            StreamError::BadRequest(
                "WRONGTYPE Operation against a key holding the wrong kind of value".to_string(),
            ),
        ),
        (
            request("-", "+", 0, SortOrder::Asc),
            StreamError::BadRequest("count must not be less than 1".to_string()),
        ),
    ];

    for (request, expected) in test_cases {
        assert_eq!(
            env.service.get_entries(&request).await,
            Err(expected),
            "getting entries for {:?}",
            request
        );
    }
}

#[tokio::test]
async fn test_invalid_range_bound_is_bad_request() {
    let env = TestEnv::new();
    env.seed_ids("events", &["1000-0"]).await;

    let result = env
        .service
        .get_entries(&request("abc", "+", 10, SortOrder::Asc))
        .await;

    assert!(
        matches!(result, Err(StreamError::BadRequest(ref message)) if message.contains("Invalid stream ID")),
        "unexpected result {:?}",
        result
    );
}

#[tokio::test]
async fn test_window_query_in_both_orders() {
    let env = TestEnv::new();
    env.seed_ids("events", &["1000-0", "2000-0", "3000-0"]).await;

    let ascending = env
        .service
        .get_entries(&request("1000", "3000", 10, SortOrder::Asc))
        .await
        .unwrap();
    let descending = env
        .service
        .get_entries(&request("1000", "3000", 10, SortOrder::Desc))
        .await
        .unwrap();

    assert_eq!(
        TestUtils::ids(&ascending.entries),
        vec!["1000-0", "2000-0", "3000-0"]
    );
    assert_eq!(
        TestUtils::ids(&descending.entries),
        vec!["3000-0", "2000-0", "1000-0"]
    );
}
