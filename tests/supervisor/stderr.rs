use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use mcp_process_supervisor::{ChannelSink, DiagnosticSink, ProcessSupervisor};
use serde_json::json;

use crate::common::options;

#[tokio::test]
async fn test_stderr_lines_reach_the_sink() {
    let (sink, mut lines) = ChannelSink::new();
    let supervisor = ProcessSupervisor::new(
        options("echo 'booting' >&2; echo 'ready' >&2; cat")
            .diagnostics(Arc::new(sink))
            .build(),
    );
    supervisor.start().await.unwrap();

    let first = tokio::time::timeout(Duration::from_secs(2), lines.recv()).await.unwrap();
    let second = tokio::time::timeout(Duration::from_secs(2), lines.recv()).await.unwrap();
    assert_eq!(first.as_deref(), Some("booting"));
    assert_eq!(second.as_deref(), Some("ready"));

    supervisor.stop().await;
}

#[tokio::test]
async fn test_heavy_stderr_does_not_stall_the_child() {
    let count = Arc::new(AtomicUsize::new(0));
    let counter = Arc::clone(&count);
    let sink: Arc<dyn DiagnosticSink> = Arc::new(move |_: &str| {
        counter.fetch_add(1, Ordering::SeqCst);
    });

    // ~300 KB of stderr, far beyond a pipe buffer, before the first reply
    let script = "i=0; while [ $i -lt 5000 ]; do \
                  echo \"diagnostic line $i padded with some text to fill the pipe buffer\" >&2; \
                  i=$((i+1)); done; cat";
    let supervisor = ProcessSupervisor::new(
        options(script)
            .response_timeout(Duration::from_secs(10))
            .diagnostics(sink)
            .build(),
    );
    supervisor.start().await.unwrap();

    let reply = supervisor.send(&json!({"after": "noise"})).await.unwrap();
    assert_eq!(reply.value(), Some(&json!({"after": "noise"})));
    // The tail of the noise may still be in flight through the pipe
    tokio::time::timeout(Duration::from_secs(5), async {
        while count.load(Ordering::SeqCst) < 5000 {
            tokio::time::sleep(Duration::from_millis(10)).await;
        }
    })
    .await
    .expect("all stderr lines drained");
    assert_eq!(count.load(Ordering::SeqCst), 5000);

    supervisor.stop().await;
}

#[tokio::test]
async fn test_stderr_never_becomes_a_reply() {
    let (sink, _lines) = ChannelSink::new();
    let supervisor = ProcessSupervisor::new(
        options(r#"while read line; do echo '{"from":"stderr"}' >&2; echo '{"from":"stdout"}'; done"#)
            .diagnostics(Arc::new(sink))
            .build(),
    );
    supervisor.start().await.unwrap();

    for _ in 0..3 {
        let reply = supervisor.send(&json!({"method": "ping"})).await.unwrap();
        assert_eq!(reply.value(), Some(&json!({"from": "stdout"})));
    }

    supervisor.stop().await;
}
