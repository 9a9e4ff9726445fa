//! Registry lookup, validation in front of calls, and the default tool set.

mod init_logging;

use std::sync::Arc;

use serde_json::{json, Value};

use ragent::tools::{GetNameOfUserTool, DEFAULT_USER_PROFILE};
use ragent::{
    default_registry, DocumentChunk, HashingEmbedder, InMemoryRetriever, LlmResponse,
    MemorySaver, MockLlm, ReactAgent, Retriever, Role, RunContext, ToolCall, ToolError,
    ToolRegistry,
};

async fn retriever() -> Arc<InMemoryRetriever> {
    let retriever = InMemoryRetriever::new(Arc::new(HashingEmbedder::default()));
    retriever
        .add(vec![
            DocumentChunk::new("rain", "Umbrellas keep you dry when it is raining in Manila.")
                .with_metadata(json!({"source": "tips.md"})),
            DocumentChunk::new("snow", "Snow chains help when driving in Seoul winters."),
            DocumentChunk::new("sun", "Sunscreen protects skin on sunny beach days."),
        ])
        .await
        .unwrap();
    Arc::new(retriever)
}

#[test]
fn default_registry_lists_tools_in_registration_order() {
    let registry = default_registry(DEFAULT_USER_PROFILE, None);
    assert_eq!(
        registry.names(),
        vec!["get_weather_update", "get_name_of_user", "reason"]
    );
    let specs = registry.specs();
    assert_eq!(specs.len(), 3);
    assert_eq!(specs[0].input_schema["required"], json!(["city", "date"]));
    assert!(specs.iter().all(|s| s.description.is_some()));
}

#[tokio::test]
async fn default_registry_adds_search_when_a_retriever_is_given() {
    let retriever: Arc<dyn Retriever> = retriever().await;
    let registry = default_registry(DEFAULT_USER_PROFILE, Some(retriever));
    assert_eq!(registry.len(), 4);
    assert!(registry.get("search_documents").is_some());
}

#[tokio::test]
async fn registering_a_name_twice_replaces_in_place() {
    let mut registry = default_registry("Name: First", None);
    registry.register(Arc::new(GetNameOfUserTool::new("Name: Second")));
    assert_eq!(registry.len(), 3);
    assert_eq!(registry.names()[1], "get_name_of_user");
    let out = registry.call("get_name_of_user", Value::Null, None).await.unwrap();
    assert_eq!(out.text, "Name: Second");
}

#[tokio::test]
async fn unknown_name_and_bad_arguments_are_rejected_before_the_tool_runs() {
    let registry = default_registry(DEFAULT_USER_PROFILE, None);
    let err = registry.call("teleport", json!({}), None).await.unwrap_err();
    assert_eq!(err, ToolError::UnknownTool("teleport".into()));

    // Numbers are coerced to strings for string parameters.
    let out = registry
        .call("get_weather_update", json!({"city": 7, "date": "2025-10-18"}), None)
        .await
        .unwrap();
    assert!(out.text.ends_with("in 7 at 2025-10-18 00:00:00"));

    let err = registry
        .call("get_weather_update", json!({"city": ["Paris"], "date": "2025-10-18"}), None)
        .await
        .unwrap_err();
    assert!(matches!(err, ToolError::InvalidArguments(m) if m.contains("expected string")));
}

#[tokio::test]
async fn reason_without_model_reports_missing_context() {
    let registry = default_registry(DEFAULT_USER_PROFILE, None);
    let err = registry.call("reason", json!({}), None).await.unwrap_err();
    assert!(matches!(err, ToolError::MissingContext(_)));
}

#[tokio::test]
async fn search_documents_returns_ranked_chunks() {
    let retriever: Arc<dyn Retriever> = retriever().await;
    let registry = ToolRegistry::new().with_tool(Arc::new(
        ragent::tools::SearchDocumentsTool::new(retriever),
    ));

    let out = registry
        .call(
            "search_documents",
            json!({"query": "raining in Manila", "limit": "2"}),
            None,
        )
        .await
        .unwrap();
    let hits: Vec<Value> = serde_json::from_str(&out.text).unwrap();
    assert_eq!(hits.len(), 2);
    assert!(hits[0]["content"].as_str().unwrap().contains("Manila"));
    assert_eq!(hits[0]["metadata"]["source"], "tips.md");
    assert!(hits[0]["score"].as_f64().unwrap() >= hits[1]["score"].as_f64().unwrap());

    let err = registry
        .call("search_documents", json!({"query": "  "}), None)
        .await
        .unwrap_err();
    assert!(matches!(err, ToolError::InvalidArguments(_)));
}

#[tokio::test]
async fn agent_grounds_an_answer_in_retrieved_documents() {
    let retriever: Arc<dyn Retriever> = retriever().await;
    let agent = ReactAgent::new(
        default_registry(DEFAULT_USER_PROFILE, Some(retriever)),
        Arc::new(MemorySaver::new()),
    );
    let model = Arc::new(MockLlm::new(vec![
        LlmResponse::with_tool_calls(
            "",
            vec![ToolCall::new(
                "c1",
                "search_documents",
                r#"{"query":"snow driving Seoul"}"#,
            )],
        ),
        LlmResponse::text("Bring snow chains."),
    ]));

    let out = agent
        .invoke("T1", "Tips for Seoul in winter?", &RunContext::new(model.clone()))
        .await
        .unwrap();

    assert_eq!(out.reply, "Bring snow chains.");
    let tool = &out.state.messages()[3];
    assert_eq!(tool.role(), Role::Tool);
    assert!(tool.content().contains("Snow chains"));
    assert_eq!(model.calls()[0].tools.len(), 4);
}
