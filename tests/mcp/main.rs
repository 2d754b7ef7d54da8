//! `McpClient` against a scripted stand-in MCP server

#![cfg(unix)]

use std::sync::Arc;
use std::time::Duration;

use mcp_process_supervisor::{ChannelSink, McpClient, ProcessSupervisor, SupervisorOptions};
use serde_json::json;

const FAKE_SERVER: &str = r#"while read line; do
  case "$line" in
    *'"method":"initialize"'*)
      echo '{"jsonrpc":"2.0","id":1,"result":{"protocolVersion":"2024-11-05","capabilities":{"tools":{}},"serverInfo":{"name":"fake-mobile","version":"0.0.1"}}}';;
    *'notifications/initialized'*)
      echo 'got initialized' >&2;;
    *'"method":"tools/list"'*)
      echo '{"jsonrpc":"2.0","id":2,"result":{"tools":[{"name":"mobile_take_screenshot"},{"name":"mobile_tap"}]}}';;
    *'"method":"tools/call"'*)
      echo '{"jsonrpc":"2.0","id":2,"result":{"content":[{"type":"text","text":"tapped"}]}}';;
  esac
done"#;

fn client() -> (McpClient, tokio::sync::mpsc::UnboundedReceiver<String>) {
    let _ = env_logger::builder().is_test(true).try_init();
    let (sink, lines) = ChannelSink::new();
    let options = SupervisorOptions::builder()
        .shell_command(FAKE_SERVER)
        .settle_delay(Duration::ZERO)
        .response_timeout(Duration::from_secs(2))
        .grace_period(Duration::from_secs(1))
        .diagnostics(Arc::new(sink))
        .build();
    (McpClient::new(Arc::new(ProcessSupervisor::new(options))), lines)
}

#[tokio::test]
async fn test_initialize_handshake() {
    let (client, mut stderr) = client();
    client.supervisor().start().await.unwrap();

    let reply = client.initialize("mcp-supervisor-tests", "0.1.0").await.unwrap();
    let value = reply.value().expect("initialize result");
    assert_eq!(value["result"]["serverInfo"]["name"], "fake-mobile");

    // The initialized notification went out after the reply
    let line = tokio::time::timeout(Duration::from_secs(2), stderr.recv())
        .await
        .unwrap();
    assert_eq!(line.as_deref(), Some("got initialized"));

    client.supervisor().stop().await;
}

#[tokio::test]
async fn test_list_and_call_tools() {
    let (client, _stderr) = client();
    client.supervisor().start().await.unwrap();
    client.initialize("mcp-supervisor-tests", "0.1.0").await.unwrap();

    let tools = client.list_tools().await.unwrap();
    let names: Vec<_> = tools.value().unwrap()["result"]["tools"]
        .as_array()
        .unwrap()
        .iter()
        .map(|tool| tool["name"].as_str().unwrap().to_string())
        .collect();
    assert_eq!(names, ["mobile_take_screenshot", "mobile_tap"]);

    let reply = client
        .call_tool("mobile_tap", json!({"x": 10, "y": 20}))
        .await
        .unwrap();
    assert_eq!(
        reply.into_result().unwrap()["result"]["content"][0]["text"],
        "tapped"
    );

    client.supervisor().stop().await;
}

#[tokio::test]
async fn test_calls_fail_when_not_started() {
    let (client, _stderr) = client();
    let err = client.call_tool("mobile_tap", json!({})).await.unwrap_err();
    assert!(err.is_not_running());
}
