//! Built-in prompt text: the default system prompt, the few-shot transcript and fixed
//! replies the loop writes into the conversation.

use crate::message::Message;
use crate::state::ToolCall;

/// Substring that makes the router send an assistant reply back to the agent step.
pub const CONTINUATION_SENTINEL: &str = "FURTHER THINKING";

pub const DEFAULT_SYSTEM_PROMPT: &str = "You are a helpful AI assistant that uses tools to answer \
questions and complete tasks. You work in a ReAct loop: you can iterate between tool calls, \
reasoning to yourself, and exiting with the final answer.

When given a task:
1. Break down complex requests into smaller steps
2. Use available tools systematically to gather information
3. Think through each step before acting
4. Provide clear, accurate responses based on tool results

When using tools:
- Call tools one at a time when they depend on previous results
- Only provide final answers when you have all necessary information
- Combine tool results with your knowledge when appropriate

If you need further thinking rather than just executing a tool, reply with 'FURTHER THINKING' \
followed by your notes to trigger another reasoning pass.

Be thorough, accurate, and helpful in your responses.";

/// Assistant text used when the model returns neither text nor tool calls.
pub const EMPTY_REPLY_FALLBACK: &str =
    "I could not produce an answer for this request. Please rephrase or add more detail.";

/// Tool result content for calls left unanswered by a cancelled turn.
pub const INTERRUPTED_TOOL_RESULT: &str =
    "Error: tool call interrupted before completion. Call the tool again if the result is still needed.";

/// Condensed two-city weather transcript showing tool use and a `FURTHER THINKING` pass.
pub fn few_shot_messages() -> Vec<Message> {
    vec![
        Message::user(
            "Get weather for Manila, Philippines and Seoul, South Korea for October 18, 2025 \
             at 2:00 PM. Include their populations.",
        ),
        Message::assistant_with_tool_calls(
            "I'll get the weather for both cities, then add population data from my knowledge.",
            vec![ToolCall::new(
                "call_1",
                "get_weather_update",
                r#"{"city":"Manila, Philippines","date":"2025-10-18T14:00:00"}"#,
            )],
        ),
        Message::tool(
            "call_1",
            "It is sunny: 32 degrees celsius in Manila, Philippines at 2025-10-18 14:00:00",
            false,
        ),
        Message::assistant("FURTHER THINKING - Manila done. Getting Seoul weather next."),
        Message::assistant_with_tool_calls(
            "Retrieving Seoul weather.",
            vec![ToolCall::new(
                "call_2",
                "get_weather_update",
                r#"{"city":"Seoul, South Korea","date":"2025-10-18T14:00:00"}"#,
            )],
        ),
        Message::tool(
            "call_2",
            "It is raining: 15 degrees celsius in Seoul, South Korea at 2025-10-18 14:00:00",
            false,
        ),
        Message::assistant(
            "All weather data collected. Here's the complete information:\n\n\
             **Manila, Philippines:**\n- Weather: Sunny, 32°C\n\
             - Population: ~1.8 million (city), ~14 million (metro area)\n\n\
             **Seoul, South Korea:**\n- Weather: Raining, 15°C\n\
             - Population: ~9.7 million (city), ~25.6 million (metro area)",
        ),
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::state::ConversationState;

    #[test]
    fn system_prompt_carries_sentinel_instruction() {
        assert!(DEFAULT_SYSTEM_PROMPT.contains(CONTINUATION_SENTINEL));
    }

    #[test]
    fn few_shot_transcript_is_a_valid_history() {
        let state = ConversationState::from_messages(few_shot_messages()).unwrap();
        assert!(state.pending_tool_calls().is_empty());
        assert!(state.messages()[3].content().contains(CONTINUATION_SENTINEL));
    }
}
