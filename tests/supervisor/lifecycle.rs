use std::time::{Duration, Instant};

use mcp_process_supervisor::{ProcessSupervisor, SupervisorError, SupervisorOptions, SupervisorState};
use serde_json::json;
use tokio_test::{assert_err, assert_ok};

use crate::common::{ECHO, GRACE_PERIOD, READER_JOIN_TIMEOUT, options};

#[tokio::test]
async fn test_start_and_stop_transition_states() {
    let supervisor = ProcessSupervisor::new(options(ECHO).build());
    assert_eq!(supervisor.state(), SupervisorState::Stopped);
    assert!(supervisor.pid().is_none());

    assert_ok!(supervisor.start().await);
    assert_eq!(supervisor.state(), SupervisorState::Running);
    assert!(supervisor.is_running());
    assert!(supervisor.pid().is_some());

    supervisor.stop().await;
    assert_eq!(supervisor.state(), SupervisorState::Stopped);
    assert!(supervisor.pid().is_none());
}

#[tokio::test]
async fn test_second_start_is_a_noop() {
    let supervisor = ProcessSupervisor::new(options(ECHO).build());
    supervisor.start().await.unwrap();
    let pid = supervisor.pid();

    supervisor.start().await.unwrap();
    assert_eq!(supervisor.pid(), pid);

    // The first child still answers
    let reply = supervisor.send(&json!({"still": "here"})).await.unwrap();
    assert_eq!(reply.value(), Some(&json!({"still": "here"})));

    supervisor.stop().await;
}

#[tokio::test]
async fn test_stop_is_idempotent() {
    let supervisor = ProcessSupervisor::new(options(ECHO).build());
    supervisor.stop().await;
    assert_eq!(supervisor.state(), SupervisorState::Stopped);

    supervisor.start().await.unwrap();
    supervisor.stop().await;
    supervisor.stop().await;
    assert_eq!(supervisor.state(), SupervisorState::Stopped);
}

#[tokio::test]
async fn test_unlaunchable_program_leaves_supervisor_stopped() {
    let supervisor = ProcessSupervisor::new(
        SupervisorOptions::builder()
            .program("no-such-mcp-server-7c3e", ["--stdio"])
            .settle_delay(Duration::ZERO)
            .build(),
    );

    let err = assert_err!(supervisor.start().await);
    assert!(matches!(err, SupervisorError::Launch(_)));
    assert_eq!(supervisor.state(), SupervisorState::Stopped);
    assert!(supervisor.pid().is_none());
}

#[tokio::test]
async fn test_failed_spawn_never_leaves_stopped() {
    let supervisor = ProcessSupervisor::new(
        options(ECHO)
            .cwd("/nonexistent/mcp-supervisor-workdir")
            .build(),
    );

    let err = assert_err!(supervisor.start().await);
    assert!(matches!(err, SupervisorError::Launch(ref msg) if msg.contains("Working directory")));

    let status = supervisor.status();
    assert_eq!(status.state, SupervisorState::Stopped);
    assert!(status.pid.is_none());
    assert!(status.started_at.is_none());
    assert!(!supervisor.is_alive().await);
}

#[tokio::test]
async fn test_child_dying_during_settle_is_a_launch_failure() {
    let supervisor = ProcessSupervisor::new(
        options("exit 127")
            .settle_delay(Duration::from_millis(300))
            .build(),
    );

    let err = assert_err!(supervisor.start().await);
    assert!(matches!(err, SupervisorError::Launch(_)));
    assert_eq!(supervisor.state(), SupervisorState::Stopped);
}

#[tokio::test]
async fn test_graceful_stop_is_quick() {
    let supervisor = ProcessSupervisor::new(options(ECHO).build());
    supervisor.start().await.unwrap();

    let started = Instant::now();
    supervisor.stop().await;
    assert!(
        started.elapsed() < GRACE_PERIOD,
        "cat should exit on EOF/SIGTERM well before the grace period, took {:?}",
        started.elapsed()
    );
}

#[tokio::test]
async fn test_stop_force_kills_child_ignoring_sigterm() {
    let supervisor = ProcessSupervisor::new(
        options("trap '' TERM; while :; do sleep 0.1; done").build(),
    );
    supervisor.start().await.unwrap();
    // Let the shell install its trap
    tokio::time::sleep(Duration::from_millis(200)).await;

    let started = Instant::now();
    supervisor.stop().await;
    let elapsed = started.elapsed();

    assert_eq!(supervisor.state(), SupervisorState::Stopped);
    assert!(
        elapsed >= GRACE_PERIOD - Duration::from_millis(50),
        "child should have survived SIGTERM until the grace period ran out, took {elapsed:?}"
    );
    assert!(
        elapsed < GRACE_PERIOD + READER_JOIN_TIMEOUT + Duration::from_millis(500),
        "stop took too long: {elapsed:?}"
    );
}

#[tokio::test]
async fn test_restart_gets_a_fresh_child() {
    let supervisor = ProcessSupervisor::new(options(ECHO).build());
    supervisor.start().await.unwrap();
    let first = supervisor.pid();
    supervisor.stop().await;

    supervisor.start().await.unwrap();
    assert!(supervisor.pid().is_some());
    assert_ne!(supervisor.pid(), first);
    let reply = supervisor.send(&json!({"round": 2})).await.unwrap();
    assert_eq!(reply.value(), Some(&json!({"round": 2})));

    supervisor.stop().await;
}

#[tokio::test]
async fn test_unexpected_exit_is_detected() {
    let supervisor = ProcessSupervisor::new(options("sleep 0.2").build());
    supervisor.start().await.unwrap();
    tokio::time::sleep(Duration::from_millis(600)).await;

    assert!(!supervisor.is_alive().await);
    assert_eq!(supervisor.state(), SupervisorState::Stopped);

    let err = assert_err!(supervisor.send(&json!({"method": "ping"})).await);
    assert!(err.is_not_running());
}

#[tokio::test]
async fn test_status_reports_counters() {
    let supervisor = ProcessSupervisor::new(options(ECHO).build());
    let status = supervisor.status();
    assert_eq!(status.state, SupervisorState::Stopped);
    assert!(status.started_at.is_none());

    supervisor.start().await.unwrap();
    supervisor.send(&json!({"n": 1})).await.unwrap();

    let status = supervisor.status();
    assert_eq!(status.state, SupervisorState::Running);
    assert_eq!(status.pid, supervisor.pid());
    assert!(status.started_at.is_some());
    assert_eq!(status.commands_sent, 1);
    assert_eq!(status.responses_received, 1);

    let rendered = serde_json::to_value(&status).unwrap();
    assert_eq!(rendered["state"], "running");

    supervisor.stop().await;
}

#[tokio::test]
async fn test_independent_instances() {
    let a = ProcessSupervisor::new(options(ECHO).build());
    let b = ProcessSupervisor::new(options(ECHO).build());
    a.start().await.unwrap();
    b.start().await.unwrap();
    assert_ne!(a.id(), b.id());
    assert_ne!(a.pid(), b.pid());

    a.stop().await;
    assert!(b.is_running());
    let reply = b.send(&json!({"who": "b"})).await.unwrap();
    assert_eq!(reply.value(), Some(&json!({"who": "b"})));
    b.stop().await;
}

/// Whether `pid` is a live (non-zombie) process
#[cfg(target_os = "linux")]
fn process_alive(pid: u32) -> bool {
    match std::fs::read_to_string(format!("/proc/{pid}/stat")) {
        Ok(stat) => !stat
            .rsplit(')')
            .next()
            .is_some_and(|rest| rest.trim_start().starts_with('Z')),
        Err(_) => false,
    }
}

#[cfg(target_os = "linux")]
#[tokio::test]
async fn test_descendants_are_killed_after_leader_exits() {
    use mcp_process_supervisor::ChannelSink;
    use std::sync::Arc;

    let (sink, mut stderr) = ChannelSink::new();
    // The shell backgrounds a long sleep, reports its pid, then exits on its own
    let supervisor = ProcessSupervisor::new(
        options("sleep 30 & echo $! >&2; sleep 0.3; exit 0")
            .diagnostics(Arc::new(sink))
            .build(),
    );
    supervisor.start().await.unwrap();

    let line = tokio::time::timeout(Duration::from_secs(2), stderr.recv())
        .await
        .unwrap()
        .unwrap();
    let descendant: u32 = line.trim().parse().unwrap();
    assert!(process_alive(descendant));

    tokio::time::sleep(Duration::from_millis(600)).await;
    assert!(!supervisor.is_alive().await);

    let deadline = Instant::now() + Duration::from_secs(2);
    while process_alive(descendant) {
        assert!(
            Instant::now() < deadline,
            "background process {descendant} survived teardown"
        );
        tokio::time::sleep(Duration::from_millis(20)).await;
    }
}
