//! Conversation driver behaviour against a scripted model and a fake tool peer.

mod common;

use std::sync::atomic::Ordering;
use std::time::Duration;

use common::{calendar_tools, call, FakePeer, ScriptedModel};
use mcp_chat_agent::agent::{ConversationDriver, RoundOutcome, Transcript, TurnOutcome};
use mcp_chat_agent::client::{AssistantTurn, ChatModel};
use mcp_chat_agent::drivers::CompletionRequest;
use mcp_chat_agent::mcp::{CallToolResult, ToolRegistry};
use mcp_chat_agent::types::{Message, MessageRole};
use mcp_chat_agent::{Error, Result};
use serde_json::json;
use tokio_test::{assert_err, assert_ok};

async fn driver_with(model: ScriptedModel, peer: FakePeer) -> ConversationDriver {
    let mut registry = ToolRegistry::new(Box::new(peer));
    assert_ok!(registry.discover().await);
    ConversationDriver::new(Box::new(model), registry)
}

#[tokio::test]
async fn test_single_tool_round_then_answer() {
    let model = ScriptedModel::new(vec![
        AssistantTurn::tool_calls(vec![call("call_1", "X", r#"{"a":1}"#)]),
        AssistantTurn::text("  done \n"),
    ]);
    let seen = model.seen.clone();
    let peer = FakePeer::new(calendar_tools());
    let peer_calls = peer.calls.clone();
    let driver = driver_with(model, peer).await;

    let mut transcript = Transcript::new("sys");
    let outcome = driver.run_turn(&mut transcript, "do X").await.unwrap();
    assert_eq!(outcome, TurnOutcome::Answer("done".to_string()));

    assert_eq!(*peer_calls.lock().unwrap(), vec![("X".to_string(), json!({"a": 1}))]);

    let roles: Vec<_> = transcript.messages().iter().map(Message::role).collect();
    assert_eq!(
        roles,
        vec![
            MessageRole::System,
            MessageRole::User,
            MessageRole::Assistant,
            MessageRole::Tool,
            MessageRole::Assistant,
        ]
    );
    let tool_messages: Vec<_> = transcript
        .messages()
        .iter()
        .filter(|m| m.role() == MessageRole::Tool)
        .collect();
    assert_eq!(tool_messages.len(), 1);
    assert_eq!(*tool_messages[0], Message::tool_result("call_1", "X", "X ok"));
    assert_eq!(transcript.last().map(Message::text), Some("  done \n"));

    // The second model call saw the tool result.
    let seen = seen.lock().unwrap();
    assert_eq!(seen.len(), 2);
    assert_eq!(seen[1].len(), 4);
}

#[tokio::test]
async fn test_round_limit_stops_after_five_model_calls() {
    let model = ScriptedModel::always_calling("list_upcoming", 10);
    let model_calls = model.calls.clone();
    let peer = FakePeer::new(calendar_tools());
    let peer_calls = peer.calls.clone();
    let driver = driver_with(model, peer).await;

    let mut transcript = Transcript::new("sys");
    let outcome = driver.run_turn(&mut transcript, "what's next?").await.unwrap();
    assert_eq!(outcome, TurnOutcome::RoundLimitReached { rounds: 5 });
    assert_eq!(model_calls.load(Ordering::SeqCst), 5);
    assert_eq!(peer_calls.lock().unwrap().len(), 5);
    // Every request got its result, so the next turn can start cleanly.
    assert!(transcript.unanswered().is_empty());
    assert_ok!(transcript.push_user("never mind"));
}

#[tokio::test]
async fn test_round_limit_is_configurable() {
    let model = ScriptedModel::always_calling("list_upcoming", 10);
    let model_calls = model.calls.clone();
    let driver = driver_with(model, FakePeer::new(calendar_tools()))
        .await
        .with_max_rounds(2);

    let mut transcript = Transcript::new("sys");
    let outcome = driver.run_turn(&mut transcript, "loop").await.unwrap();
    assert_eq!(outcome, TurnOutcome::RoundLimitReached { rounds: 2 });
    assert_eq!(model_calls.load(Ordering::SeqCst), 2);
}

#[tokio::test]
async fn test_answer_within_limit_never_exceeds_it() {
    for tool_rounds in 0..5 {
        let mut turns: Vec<_> = (0..tool_rounds)
            .map(|i| AssistantTurn::tool_calls(vec![call(&format!("c{i}"), "list_upcoming", "")]))
            .collect();
        turns.push(AssistantTurn::text("here you go"));
        let model = ScriptedModel::new(turns);
        let model_calls = model.calls.clone();
        let driver = driver_with(model, FakePeer::new(calendar_tools())).await;

        let mut transcript = Transcript::new("sys");
        let outcome = driver.run_turn(&mut transcript, "list").await.unwrap();
        assert_eq!(outcome, TurnOutcome::Answer("here you go".into()));
        assert_eq!(model_calls.load(Ordering::SeqCst), tool_rounds + 1);
    }
}

#[tokio::test]
async fn test_tool_results_follow_their_requests_in_order() {
    let model = ScriptedModel::new(vec![
        AssistantTurn::tool_calls(vec![
            call("b", "list_upcoming", "{}"),
            call("a", "cancel_event", r#"{"event_id":"evt_1"}"#),
        ]),
        AssistantTurn::tool_calls(vec![call("c", "create_event", r#"{"title":"sync","start":"2024-05-01T15:00"}"#)]),
        AssistantTurn::text("All set."),
    ]);
    let peer = FakePeer::new(calendar_tools());
    let peer_calls = peer.calls.clone();
    let driver = driver_with(model, peer).await;

    let mut transcript = Transcript::new("sys");
    driver.run_turn(&mut transcript, "reschedule").await.unwrap();

    let names: Vec<_> = peer_calls.lock().unwrap().iter().map(|(n, _)| n.clone()).collect();
    assert_eq!(names, vec!["list_upcoming", "cancel_event", "create_event"]);

    // Each tool message answers the closest preceding assistant message.
    let mut open: Vec<String> = Vec::new();
    for message in transcript.messages() {
        match message {
            Message::Assistant { tool_requests, .. } => {
                assert!(open.is_empty());
                open = tool_requests.iter().map(|r| r.id.clone()).collect();
            }
            Message::Tool { tool_request_id, .. } => {
                assert_eq!(open.first(), Some(tool_request_id));
                open.remove(0);
            }
            _ => {}
        }
    }
}

#[tokio::test]
async fn test_invocation_failure_becomes_tool_message() {
    let model = ScriptedModel::new(vec![
        AssistantTurn::tool_calls(vec![call("c1", "cancel_event", r#"{"event_id":"missing"}"#)]),
        AssistantTurn::text("That event does not exist."),
    ]);
    let peer = FakePeer::with_handler(calendar_tools(), |name, _| {
        if name == "cancel_event" {
            Ok(CallToolResult::error("Event not found"))
        } else {
            Ok(CallToolResult::text("ok"))
        }
    });
    let driver = driver_with(model, peer).await;

    let mut transcript = Transcript::new("sys");
    let outcome = driver.run_turn(&mut transcript, "cancel it").await.unwrap();
    assert_eq!(outcome, TurnOutcome::Answer("That event does not exist.".into()));
    assert_eq!(
        transcript.messages()[3],
        Message::tool_result("c1", "cancel_event", "Error: Tool 'cancel_event' failed: Event not found")
    );
}

#[tokio::test]
async fn test_peer_fault_does_not_abort_the_round() {
    let model = ScriptedModel::new(vec![
        AssistantTurn::tool_calls(vec![call("c1", "list_upcoming", ""), call("c2", "X", "")]),
        AssistantTurn::text("partial"),
    ]);
    let peer = FakePeer::with_handler(calendar_tools(), |name, _| {
        if name == "list_upcoming" {
            Err(Error::invocation(name, "broken pipe"))
        } else {
            Ok(CallToolResult::text("fine"))
        }
    });
    let driver = driver_with(model, peer).await;

    let mut transcript = Transcript::new("sys");
    driver.run_turn(&mut transcript, "go").await.unwrap();
    assert!(transcript.messages()[3].text().starts_with("Error: "));
    assert_eq!(transcript.messages()[4].text(), "fine");
}

#[tokio::test]
async fn test_malformed_arguments_reach_the_peer_as_raw() {
    let model = ScriptedModel::new(vec![
        AssistantTurn::tool_calls(vec![call("c1", "create_event", "{bad")]),
        AssistantTurn::text("Could you repeat the title?"),
    ]);
    let peer = FakePeer::new(calendar_tools());
    let peer_calls = peer.calls.clone();
    let driver = driver_with(model, peer).await;

    let mut transcript = Transcript::new("sys");
    driver.run_turn(&mut transcript, "make an event").await.unwrap();
    assert_eq!(
        *peer_calls.lock().unwrap(),
        vec![("create_event".to_string(), json!({"_raw": "{bad"}))]
    );
}

#[tokio::test]
async fn test_run_round_exposes_intermediate_transcript() {
    let model = ScriptedModel::new(vec![
        AssistantTurn::tool_calls(vec![call("r1", "list_upcoming", "")]),
        AssistantTurn::text("Nothing scheduled."),
    ]);
    let driver = driver_with(model, FakePeer::new(calendar_tools())).await;

    let mut transcript = Transcript::new("sys");
    transcript.push_user("anything today?").unwrap();

    let first = driver.run_round(&mut transcript).await.unwrap();
    assert_eq!(first, RoundOutcome::ToolsDispatched(1));
    assert_eq!(transcript.len(), 4);
    assert_eq!(transcript.last().map(Message::role), Some(MessageRole::Tool));

    let second = driver.run_round(&mut transcript).await.unwrap();
    assert_eq!(second, RoundOutcome::Answer("Nothing scheduled.".into()));
    assert_eq!(transcript.len(), 5);
}

#[tokio::test]
async fn test_model_failure_ends_the_turn() {
    let driver = driver_with(ScriptedModel::new(Vec::new()), FakePeer::new(calendar_tools())).await;
    let mut transcript = Transcript::new("sys");
    assert_err!(driver.run_turn(&mut transcript, "hello").await);
    // The user's message stays; nothing is left unanswered.
    assert_eq!(transcript.len(), 2);
    assert_ok!(transcript.push_user("hello again"));
}

struct SlowModel;

#[async_trait::async_trait]
impl ChatModel for SlowModel {
    fn model_id(&self) -> &str {
        "slow"
    }

    async fn complete(&self, _request: &CompletionRequest<'_>) -> Result<AssistantTurn> {
        tokio::time::sleep(Duration::from_secs(600)).await;
        Ok(AssistantTurn::text("too late"))
    }
}

#[tokio::test(start_paused = true)]
async fn test_model_timeout() {
    let mut registry = ToolRegistry::new(Box::new(FakePeer::new(calendar_tools())));
    registry.discover().await.unwrap();
    let driver = ConversationDriver::new(Box::new(SlowModel), registry)
        .with_model_timeout(Some(Duration::from_secs(120)));

    let mut transcript = Transcript::new("sys");
    let err = driver.run_turn(&mut transcript, "hi").await.unwrap_err();
    assert!(matches!(err, Error::Timeout { elapsed_ms: 120_000, .. }));
    assert_eq!(err.to_string(), "Timed out after 120000 ms waiting for model 'slow'");
}

#[tokio::test]
async fn test_offered_tools_use_calling_convention() {
    let model = ScriptedModel::new(vec![AssistantTurn::text("hi")]);
    let driver = driver_with(model, FakePeer::new(calendar_tools())).await;
    let definitions = driver.registry().definitions();
    assert_eq!(definitions.len(), 4);
    assert_eq!(definitions[3].function.description, "No description");
    assert_eq!(definitions[3].function.parameters, json!({"type": "object"}));
}
