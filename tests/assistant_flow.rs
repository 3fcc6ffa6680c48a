//! End-to-end assistant flows over the sample catalog with a scripted model.

#![allow(clippy::panic, clippy::unwrap_used)]

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;

use luxe_assist::agent::{
    ChatRequest, ChatResponse, LlmProvider, LoopSettings, PromptSet, Role, ToolCall,
};
use luxe_assist::embedding::HashEmbedder;
use luxe_assist::error::AgentError;
use luxe_assist::tools::{InMemoryCommerce, ToolDependencies};
use luxe_assist::{Assistant, KnowledgeStore, SessionStore, StopReason, ToolRegistry};

fn catalog_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("data").join("knowledge")
}

/// Calls one tool chosen from the user's message, then answers by quoting
/// the observation. Records the message count of every request.
#[derive(Default)]
struct ConciergeModel {
    request_sizes: Mutex<Vec<usize>>,
}

impl ConciergeModel {
    fn pick_tool(message: &str) -> (&'static str, String) {
        let lower = message.to_lowercase();
        if lower.contains("return my") {
            ("initiate_return", r#"{"order_id": "ord-12345", "reason": "too small"}"#.to_string())
        } else if lower.contains("where is") {
            ("order_status", r#"{"order_id": "ORD-87654"}"#.to_string())
        } else {
            ("knowledge_search", serde_json::json!({ "query": message }).to_string())
        }
    }
}

#[async_trait]
impl LlmProvider for ConciergeModel {
    fn name(&self) -> &'static str {
        "concierge"
    }

    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse, AgentError> {
        self.request_sizes.lock().push(request.messages.len());
        let last = request.messages.last().unwrap();
        if last.role == Role::Tool {
            return Ok(ChatResponse {
                content: format!("Here is what I found:\n{}", last.content),
                ..ChatResponse::default()
            });
        }
        let (name, arguments) = Self::pick_tool(&last.content);
        Ok(ChatResponse {
            tool_calls: vec![ToolCall {
                id: format!("call_{}", request.messages.len()),
                name: name.to_string(),
                arguments,
            }],
            ..ChatResponse::default()
        })
    }
}

fn assistant(model: Arc<ConciergeModel>) -> Assistant {
    let knowledge = Arc::new(KnowledgeStore::new(Arc::new(HashEmbedder::new(256))));
    let report = knowledge.ingest_dir(&catalog_dir()).unwrap();
    assert_eq!(report.documents_indexed, 15);

    let registry = ToolRegistry::customer_service(ToolDependencies {
        knowledge: Arc::clone(&knowledge),
        commerce: Arc::new(InMemoryCommerce::default()),
        handoff: None,
        retrieval_results: 5,
    })
    .unwrap();

    Assistant::new(
        model,
        registry,
        knowledge,
        SessionStore::default(),
        PromptSet::defaults(),
        LoopSettings {
            model: "scripted".to_string(),
            temperature: Some(0.0),
            max_tokens: Some(512),
            max_iterations: 5,
            max_execution_time: Duration::from_secs(10),
        },
    )
}

#[tokio::test]
async fn answers_policy_question_from_knowledge() {
    let assistant = assistant(Arc::new(ConciergeModel::default()));

    let reply = assistant
        .respond(None, "What is your return policy?")
        .await
        .unwrap();

    assert_eq!(reply.stop_reason, StopReason::FinalAnswer);
    assert_eq!(reply.iterations_used, 1);
    assert_eq!(reply.steps.len(), 1);
    assert_eq!(reply.steps[0].tool_name, "knowledge_search");
    assert!(reply.answer.contains("30 days"), "answer: {}", reply.answer);
    assert!(!reply.session_id.is_empty());
}

#[tokio::test]
async fn follow_up_carries_session_history() {
    let model = Arc::new(ConciergeModel::default());
    let assistant = assistant(Arc::clone(&model));

    let first = assistant
        .respond(Some("customer-7"), "Where is my order?")
        .await
        .unwrap();
    assert!(first.answer.contains("Shipped"), "answer: {}", first.answer);

    let second = assistant
        .respond(Some("customer-7"), "I want to return my order ORD-12345")
        .await
        .unwrap();
    assert_eq!(second.session_id, "customer-7");
    assert_eq!(second.steps[0].tool_name, "initiate_return");
    assert!(second.answer.contains("ORD-12345"));
    assert!(second.answer.contains("Return ID: RET-"));

    // system + user on the first request; the second message adds two turns of history
    let sizes = model.request_sizes.lock().clone();
    assert_eq!(sizes[0], 2);
    assert_eq!(sizes[2], 4);
    assert_eq!(assistant.sessions().get("customer-7").len(), 4);
}

#[tokio::test]
async fn concurrent_sessions_stay_isolated() {
    let assistant = Arc::new(assistant(Arc::new(ConciergeModel::default())));

    let handles: Vec<_> = (0..4)
        .map(|i| {
            let assistant = Arc::clone(&assistant);
            tokio::spawn(async move {
                assistant
                    .respond(Some(&format!("s-{i}")), "Do you offer white-glove delivery?")
                    .await
            })
        })
        .collect();

    for handle in handles {
        let reply = handle.await.unwrap().unwrap();
        assert_eq!(reply.stop_reason, StopReason::FinalAnswer);
    }
    assert_eq!(assistant.sessions().len(), 4);
    for i in 0..4 {
        assert_eq!(assistant.sessions().get(&format!("s-{i}")).len(), 2);
    }
}

#[tokio::test]
async fn rejects_oversized_query() {
    let assistant = assistant(Arc::new(ConciergeModel::default()));
    let query = "a".repeat(luxe_assist::agent::MAX_QUERY_BYTES + 1);

    let err = assistant.respond(None, &query).await.unwrap_err();
    assert!(matches!(err, AgentError::InvalidQuery { .. }));
    assert!(assistant.sessions().is_empty());
}
