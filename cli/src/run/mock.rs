//! Offline model for `--mock`: a short script chosen from the user's message.

use chrono::Local;
use serde_json::json;

use ragent::{LlmResponse, MockLlm, ToolCall};

/// Scripted model for one turn.
///
/// - mentions "weather": calls `get_weather_update` for the city after the last " in "
///   (default Manila) at the current local time, then answers;
/// - asks "who am i" or about "my name": calls `get_name_of_user`, then answers;
/// - anything else: echoes the message.
pub fn mock_model(message: &str) -> MockLlm {
    let lower = message.to_lowercase();
    let call_id = format!("call_{}", uuid::Uuid::new_v4().simple());
    if lower.contains("weather") {
        let city = city_of(message).unwrap_or_else(|| "Manila".to_string());
        let args = json!({
            "city": city,
            "date": Local::now().format("%Y-%m-%dT%H:%M:%S").to_string(),
        });
        return MockLlm::new(vec![
            LlmResponse::with_tool_calls(
                "",
                vec![ToolCall::new(call_id, "get_weather_update", args.to_string())],
            ),
            LlmResponse::text(format!("Here is the latest weather for {}.", city)),
        ]);
    }
    if lower.contains("who am i") || lower.contains("my name") {
        return MockLlm::new(vec![
            LlmResponse::with_tool_calls("", vec![ToolCall::new(call_id, "get_name_of_user", "{}")]),
            LlmResponse::text("I looked up your profile above."),
        ]);
    }
    MockLlm::new(vec![LlmResponse::text(format!("(mock) You said: {}", message.trim()))])
}

fn city_of(message: &str) -> Option<String> {
    let idx = message.rfind(" in ")?;
    let city = message[idx + 4..]
        .trim()
        .trim_end_matches(|c: char| c == '?' || c == '.' || c == '!')
        .trim();
    (!city.is_empty()).then(|| city.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use ragent::LlmClient;

    #[test]
    fn city_after_last_in() {
        assert_eq!(city_of("What's the weather in Paris?").as_deref(), Some("Paris"));
        assert_eq!(
            city_of("weather in spring in San Luis, Batangas.").as_deref(),
            Some("San Luis, Batangas")
        );
        assert_eq!(city_of("weather?"), None);
    }

    #[tokio::test]
    async fn weather_script_calls_the_weather_tool() {
        let model = mock_model("Weather in Seoul?");
        let first = model.invoke(&[], &[], false).await.unwrap();
        assert_eq!(first.tool_calls[0].name, "get_weather_update");
        let args: serde_json::Value = serde_json::from_str(&first.tool_calls[0].arguments).unwrap();
        assert_eq!(args["city"], "Seoul");
        let second = model.invoke(&[], &[], false).await.unwrap();
        assert!(second.content.contains("Seoul"));
    }

    #[tokio::test]
    async fn other_messages_echo() {
        let model = mock_model("  hello ");
        let r = model.invoke(&[], &[], false).await.unwrap();
        assert_eq!(r.content, "(mock) You said: hello");
        assert!(r.tool_calls.is_empty());
    }
}
