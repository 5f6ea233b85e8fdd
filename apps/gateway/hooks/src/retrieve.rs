//! Enrich prompts and tool calls with previously stored context.
//!
//! Never blocks the host on failure: any error, an empty query or no hits all
//! produce `{"decision": "approve"}`.

use serde_json::{Value, json};
use tracing::{debug, warn};

use crate::client::{GatewayClient, Hit};
use crate::config::HookConfig;
use crate::error::HookResult;

/// `tool_input` fields tried in order for a search query.
const TOOL_QUERY_FIELDS: [&str; 6] = [
    "content",
    "query",
    "prompt",
    "description",
    "command",
    "pattern",
];

#[derive(Debug, Clone, PartialEq)]
pub enum HookEvent {
    UserPromptSubmit(String),
    PreToolUse(String),
}

impl HookEvent {
    pub fn parse(event: &Value) -> Option<Self> {
        let non_empty = |text: &str| (!text.trim().is_empty()).then(|| text.to_string());

        match event.get("hook_event_name").and_then(Value::as_str)? {
            "UserPromptSubmit" => event
                .get("prompt")
                .and_then(Value::as_str)
                .and_then(non_empty)
                .map(HookEvent::UserPromptSubmit),
            "PreToolUse" => {
                let query = match event.get("tool_input")? {
                    Value::String(text) => non_empty(text),
                    input => TOOL_QUERY_FIELDS.iter().find_map(|field| {
                        input.get(field).and_then(Value::as_str).and_then(non_empty)
                    }),
                };
                query.map(HookEvent::PreToolUse)
            }
            _ => None,
        }
    }

    pub fn query(&self) -> &str {
        match self {
            HookEvent::UserPromptSubmit(query) | HookEvent::PreToolUse(query) => query,
        }
    }
}

pub fn approve() -> Value {
    json!({"decision": "approve"})
}

/// Numbered context blocks for the hits that carry stored text.
pub fn format_context(hits: &[Hit]) -> Option<String> {
    let parts: Vec<String> = hits
        .iter()
        .filter_map(|hit| {
            let content = hit
                .payload
                .get("content")
                .and_then(Value::as_str)
                .filter(|c| !c.is_empty())?;
            let role = hit
                .payload
                .get("role")
                .and_then(Value::as_str)
                .unwrap_or("unknown");
            Some((role, content, hit.score))
        })
        .enumerate()
        .map(|(index, (role, content, score))| {
            format!(
                "[Context {} - {} message (similarity: {:.2})]:\n{}",
                index + 1,
                role,
                score,
                content
            )
        })
        .collect();

    (!parts.is_empty()).then(|| parts.join("\n\n---\n\n"))
}

pub fn respond(event: &HookEvent, hits: &[Hit]) -> Value {
    let Some(context) = format_context(hits) else {
        return approve();
    };

    match event {
        HookEvent::UserPromptSubmit(prompt) => json!({
            "prompt": format!("{}\n\n## Retrieved Context from Vector Store:\n\n{}", prompt, context),
        }),
        HookEvent::PreToolUse(_) => json!({
            "decision": "block",
            "reason": format!(
                "Retrieved {} relevant context(s) from vector store:\n\n{}\n\nContinue with the task using this additional context.",
                hits.len(),
                context
            ),
        }),
    }
}

async fn search(
    client: &GatewayClient,
    config: &HookConfig,
    event: &HookEvent,
) -> HookResult<Vec<Hit>> {
    if !client.collection_exists(&config.collection).await? {
        debug!(collection = %config.collection, "Nothing stored yet");
        return Ok(Vec::new());
    }
    client
        .search(&config.collection, event.query(), config.top_k, config.min_score)
        .await
}

pub async fn retrieve(client: &GatewayClient, config: &HookConfig, event: &Value) -> Value {
    let Some(event) = HookEvent::parse(event) else {
        return approve();
    };

    match search(client, config, &event).await {
        Ok(hits) => respond(&event, &hits),
        Err(e) => {
            warn!(error = %e, kind = e.kind(), "Retrieval failed, continuing without context");
            approve()
        }
    }
}
