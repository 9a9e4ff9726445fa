//! Router verdicts over the last message of the conversation.

mod init_logging;

use ragent::{route, AgentError, ConversationState, Message, Route, RunContext, ToolCall};

fn state(messages: Vec<Message>) -> ConversationState {
    ConversationState::from_messages(messages).unwrap()
}

#[test]
fn empty_state_is_an_error() {
    let err = route(&ConversationState::new(), &RunContext::default()).unwrap_err();
    assert!(matches!(err, AgentError::EmptyState));
}

#[test]
fn plain_assistant_reply_terminates() {
    let s = state(vec![Message::user("hi"), Message::assistant("Hello there.")]);
    assert_eq!(route(&s, &RunContext::default()).unwrap(), Route::Terminate);
}

#[test]
fn assistant_with_tool_calls_executes_tools() {
    let s = state(vec![
        Message::user("weather?"),
        Message::assistant_with_tool_calls(
            "FURTHER THINKING",
            vec![ToolCall::new("c1", "get_weather_update", "{}")],
        ),
    ]);
    // Tool calls take precedence over the sentinel.
    assert_eq!(route(&s, &RunContext::default()).unwrap(), Route::ExecuteTools);
}

#[test]
fn tool_result_continues_reasoning() {
    let s = state(vec![
        Message::user("who am I?"),
        Message::assistant_with_tool_calls("", vec![ToolCall::new("c1", "get_name_of_user", "")]),
        Message::tool("c1", "Name: Ada", false),
    ]);
    assert_eq!(
        route(&s, &RunContext::default()).unwrap(),
        Route::ContinueReasoning
    );
}

#[test]
fn sentinel_anywhere_in_reply_continues() {
    let s = state(vec![
        Message::user("two cities"),
        Message::assistant("Manila done. FURTHER THINKING about Seoul."),
    ]);
    assert_eq!(
        route(&s, &RunContext::default()).unwrap(),
        Route::ContinueReasoning
    );
    // Match is case-sensitive.
    let s = state(vec![Message::user("x"), Message::assistant("further thinking")]);
    assert_eq!(route(&s, &RunContext::default()).unwrap(), Route::Terminate);
}

#[test]
fn custom_and_empty_sentinel() {
    let s = state(vec![Message::user("x"), Message::assistant("<continue> more")]);
    let ctx = RunContext::default().with_continuation_sentinel("<continue>");
    assert_eq!(route(&s, &ctx).unwrap(), Route::ContinueReasoning);

    let s = state(vec![Message::user("x"), Message::assistant("anything")]);
    let ctx = RunContext::default().with_continuation_sentinel("");
    assert_eq!(route(&s, &ctx).unwrap(), Route::Terminate);
}

#[test]
fn fresh_input_continues_reasoning() {
    let s = state(vec![Message::system("sys"), Message::user("hi")]);
    assert_eq!(
        route(&s, &RunContext::default()).unwrap(),
        Route::ContinueReasoning
    );
    let s = state(vec![Message::system("sys")]);
    assert_eq!(
        route(&s, &RunContext::default()).unwrap(),
        Route::ContinueReasoning
    );
}
