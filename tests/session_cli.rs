//! Interactive session loop over in-memory input and output.

mod common;

use std::sync::atomic::Ordering;

use common::{calendar_tools, call, FakePeer, ScriptedModel};
use mcp_chat_agent::agent::{ConversationDriver, Session, SessionEnd};
use mcp_chat_agent::client::AssistantTurn;
use mcp_chat_agent::mcp::ToolRegistry;
use mcp_chat_agent::types::MessageRole;

async fn session_with(model: ScriptedModel, peer: FakePeer) -> Session {
    let mut registry = ToolRegistry::new(Box::new(peer));
    registry.discover().await.unwrap();
    Session::new(ConversationDriver::new(Box::new(model), registry), "sys")
}

#[tokio::test]
async fn test_quit_in_any_case_ends_cleanly() {
    for quit in ["quit", "QUIT", "Exit", "  eXiT  "] {
        let model = ScriptedModel::new(Vec::new());
        let model_calls = model.calls.clone();
        let peer = FakePeer::new(calendar_tools());
        let shut_down = peer.shut_down.clone();
        let peer_calls = peer.calls.clone();
        let mut session = session_with(model, peer).await;

        let input = format!("{quit}\nlist my events\n");
        let mut output = Vec::new();
        let end = session.run(input.as_bytes(), &mut output).await.unwrap();

        assert_eq!(end, SessionEnd::Quit);
        assert_eq!(model_calls.load(Ordering::SeqCst), 0);
        assert!(peer_calls.lock().unwrap().is_empty());
        assert!(shut_down.load(Ordering::SeqCst));
    }
}

#[tokio::test]
async fn test_conversation_output() {
    let model = ScriptedModel::new(vec![
        AssistantTurn::tool_calls(vec![call("c1", "list_upcoming", "{}")]),
        AssistantTurn::text("\nYou have no events today.  "),
    ]);
    let peer = FakePeer::new(calendar_tools());
    let shut_down = peer.shut_down.clone();
    let mut session = session_with(model, peer).await;

    let mut output = Vec::new();
    let end = session
        .run(&b"\n   \nanything today?\n"[..], &mut output)
        .await
        .unwrap();
    assert_eq!(end, SessionEnd::EndOfInput);
    assert!(shut_down.load(Ordering::SeqCst));

    let output = String::from_utf8(output).unwrap();
    assert!(output.starts_with(
        "Connected. Tools: [\"create_event\", \"list_upcoming\", \"cancel_event\", \"X\"]\n"
    ));
    assert!(output.contains("Type 'quit' to exit.\n> "));
    assert!(output.contains("\nYou have no events today.\n\n> "));

    // Blank lines never reach the model.
    let users = session
        .transcript()
        .messages()
        .iter()
        .filter(|m| m.role() == MessageRole::User)
        .count();
    assert_eq!(users, 1);
}

#[tokio::test]
async fn test_round_limit_and_errors_keep_the_session_alive() {
    let mut turns: Vec<_> = (0..5)
        .map(|i| AssistantTurn::tool_calls(vec![call(&format!("c{i}"), "list_upcoming", "")]))
        .collect();
    turns.push(AssistantTurn::text("second answer"));
    let model = ScriptedModel::new(turns);
    let mut session = session_with(model, FakePeer::new(calendar_tools())).await;

    // Third request finds the script exhausted and fails.
    let input = "keep going\nsecond\nthird\nquit\n";
    let mut output = Vec::new();
    let end = session.run(input.as_bytes(), &mut output).await.unwrap();
    assert_eq!(end, SessionEnd::Quit);

    let output = String::from_utf8(output).unwrap();
    assert!(output.contains("No final answer after 5 model calls"));
    assert!(output.contains("\nsecond answer\n\n"));
    assert!(output.contains("\nError: Runtime error: model script exhausted"));
}
