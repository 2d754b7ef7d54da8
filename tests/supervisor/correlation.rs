use std::time::Duration;

use mcp_process_supervisor::{Correlation, ProcessSupervisor, Reply};
use serde_json::json;

use crate::common::{ECHO, options};

/// Answers the first line late, everything after promptly
const LATE_FIRST_REPLY: &str = "read l; sleep 0.6; echo \"$l\"; while read l; do echo \"$l\"; done";

#[tokio::test]
async fn test_by_id_skips_unrelated_replies() {
    // Emits a stale reply before echoing each command
    let supervisor = ProcessSupervisor::new(
        options(r#"while read line; do echo '{"id":999}'; echo "$line"; done"#)
            .correlation(Correlation::ById)
            .build(),
    );
    supervisor.start().await.unwrap();

    let reply = supervisor.send(&json!({"method": "ping"})).await.unwrap();
    let value = reply.value().expect("a response");
    assert_eq!(value["method"], "ping");
    assert_ne!(value["id"], 999);

    supervisor.stop().await;
}

#[tokio::test]
async fn test_by_id_stamps_increasing_ids() {
    let supervisor = ProcessSupervisor::new(options(ECHO).correlation(Correlation::ById).build());
    supervisor.start().await.unwrap();

    let first = supervisor.send(&json!({"n": 1})).await.unwrap();
    let second = supervisor.send(&json!({"n": 2})).await.unwrap();
    let first_id = first.value().unwrap()["id"].as_u64().unwrap();
    let second_id = second.value().unwrap()["id"].as_u64().unwrap();
    assert!(second_id > first_id);

    supervisor.stop().await;
}

#[tokio::test]
async fn test_positional_pairs_late_reply_with_next_command() {
    let supervisor = ProcessSupervisor::new(
        options(LATE_FIRST_REPLY)
            .response_timeout(Duration::from_millis(400))
            .build(),
    );
    supervisor.start().await.unwrap();

    let first = supervisor.send(&json!({"n": 1})).await.unwrap();
    assert!(first.is_timeout());

    // Positional correlation cannot tell the late reply apart
    let second = supervisor.send(&json!({"n": 2})).await.unwrap();
    assert_eq!(second.value(), Some(&json!({"n": 1})));

    supervisor.stop().await;
}

#[tokio::test]
async fn test_by_id_discards_late_reply() {
    let supervisor = ProcessSupervisor::new(
        options(LATE_FIRST_REPLY)
            .response_timeout(Duration::from_millis(400))
            .correlation(Correlation::ById)
            .build(),
    );
    supervisor.start().await.unwrap();

    let first = supervisor.send(&json!({"n": 1})).await.unwrap();
    assert!(first.is_timeout());

    let second = supervisor.send(&json!({"n": 2})).await.unwrap();
    assert_eq!(second.value().map(|v| &v["n"]), Some(&json!(2)));

    supervisor.stop().await;
}

#[tokio::test]
async fn test_by_id_falls_back_to_positional_for_non_objects() {
    let supervisor = ProcessSupervisor::new(options(ECHO).correlation(Correlation::ById).build());
    supervisor.start().await.unwrap();

    let reply = supervisor.send(&json!([1, 2, 3])).await.unwrap();
    assert_eq!(reply, Reply::response(json!([1, 2, 3])));

    supervisor.stop().await;
}
