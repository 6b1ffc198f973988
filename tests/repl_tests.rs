mod common;

use common::{call, text, tool_calls, MockClient, MockRegistry};
use mcp_relay::client::ClientError;
use mcp_relay::repl::chat_loop;
use mcp_relay::Agent;

async fn drive(agent: &Agent<MockClient>, input: &str) -> String {
    let mut output = Vec::new();
    chat_loop(agent, input.as_bytes(), &mut output).await.unwrap();
    String::from_utf8(output).unwrap()
}

#[tokio::test]
async fn quit_ends_the_session_without_a_request() {
    let client = MockClient::with_turns(vec![text("unused")]);
    let agent = Agent::new(client.clone());

    let output = drive(&agent, "quit\nWhat are the alerts?\n").await;

    assert!(output.contains("MCP Client Started!"));
    assert!(output.contains("Type your queries or 'quit' to exit."));
    assert_eq!(client.request_count(), 0);
}

#[tokio::test]
async fn answers_are_printed_after_tool_traces() {
    let client = MockClient::with_turns(vec![
        tool_calls(vec![call("call_1", "get_alerts", r#"{"state":"CA"}"#)]),
        text("No active alerts in California."),
    ]);
    let registry = MockRegistry::new().tool("get_alerts", Ok("No activate alerts for this state."));
    let agent = Agent::new(client.clone()).with_registry(registry);

    let output = drive(&agent, "What are the weather alerts in California\nquit\n").await;

    let trace = output
        .find(r#"[Calling tool get_alerts with args {"state":"CA"}]"#)
        .expect("trace line");
    let answer = output.find("No active alerts in California.").expect("answer");
    assert!(trace < answer);
    assert_eq!(client.request_count(), 2);
}

#[tokio::test]
async fn errors_are_reported_and_the_loop_continues() {
    let client = MockClient::new(vec![
        Err(ClientError::ProviderError("rate limited".to_string())),
        Ok(mcp_relay::Response::new(text("Second try worked."))),
    ]);
    let agent = Agent::new(client.clone());

    let output = drive(&agent, "first\nsecond\n").await;

    assert!(output.contains("Error: Provider error: rate limited"));
    assert!(output.contains("Second try worked."));
    assert_eq!(client.request_count(), 2);
}

#[tokio::test]
async fn blank_lines_are_skipped_and_eof_ends_the_loop() {
    let client = MockClient::with_turns(vec![text("Hello there.")]);
    let agent = Agent::new(client.clone());

    let output = drive(&agent, "\n   \nhello").await;

    assert!(output.contains("Hello there."));
    assert!(!output.contains("Error:"));
    assert_eq!(client.request_count(), 1);
}
