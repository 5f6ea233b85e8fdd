//! Replace long transcript entries with references to stored vectors.
//!
//! Each JSONL entry from the user or the assistant whose text is longer than
//! the token threshold is stored through the gateway and its content becomes
//! `[[VEC:<id>]]`. The file is rewritten atomically (temp file in the same
//! directory, then rename) and only when something was stored.

use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Serialize;
use serde_json::{Map, Value, json};
use tempfile::NamedTempFile;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::client::GatewayClient;
use crate::config::HookConfig;
use crate::error::{HookError, HookResult};

pub const STUB_PREFIX: &str = "[[VEC:";

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PrecompactReport {
    pub status: &'static str,
    pub vectorized: usize,
    pub total_messages: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

/// Whitespace-delimited token estimate, the same measure the gateway uses.
pub fn estimate_tokens(text: &str) -> usize {
    text.split_whitespace().count()
}

pub fn stub(id: &str) -> String {
    format!("{}{}]]", STUB_PREFIX, id)
}

fn hook_field<'a>(event: &'a Value, key: &str) -> Option<&'a Value> {
    event
        .get(key)
        .or_else(|| event.get("payload").and_then(|payload| payload.get(key)))
}

/// `transcript_path` from the top level or a nested `payload`, with `~` expanded.
pub fn transcript_path(event: &Value) -> HookResult<PathBuf> {
    let raw = hook_field(event, "transcript_path")
        .and_then(Value::as_str)
        .filter(|p| !p.trim().is_empty())
        .ok_or_else(|| HookError::Input("No transcript_path provided".to_string()))?;

    match (raw.strip_prefix("~/"), std::env::var_os("HOME")) {
        (Some(rest), Some(home)) => Ok(PathBuf::from(home).join(rest)),
        _ => Ok(PathBuf::from(raw)),
    }
}

/// Entries may keep role and content at the top level or under `message`.
fn message_object(entry: &mut Value) -> Option<&mut Map<String, Value>> {
    if entry.get("role").is_some() {
        entry.as_object_mut()
    } else {
        entry.get_mut("message").and_then(Value::as_object_mut)
    }
}

/// Plain text of a content field: a string, or a list made only of text blocks.
fn content_text(content: &Value) -> Option<String> {
    match content {
        Value::String(text) => Some(text.clone()),
        Value::Array(blocks) => blocks
            .iter()
            .map(|block| match block.get("type").and_then(Value::as_str) {
                Some("text") => block.get("text").and_then(Value::as_str),
                _ => None,
            })
            .collect::<Option<Vec<_>>>()
            .map(|parts| parts.join("\n")),
        _ => None,
    }
}

struct Candidate {
    role: String,
    text: String,
    tokens: usize,
}

fn candidate(entry: &mut Value, threshold: usize) -> Option<Candidate> {
    let message = message_object(entry)?;
    let role = message.get("role").and_then(Value::as_str)?;
    if role != "user" && role != "assistant" {
        return None;
    }
    let text = content_text(message.get("content")?)?;
    let tokens = estimate_tokens(&text);
    (tokens > threshold).then(|| Candidate {
        role: role.to_string(),
        text,
        tokens,
    })
}

fn write_stub(entry: &mut Value, id: &str, tokens: usize) {
    if let Some(message) = message_object(entry) {
        message.insert("content".to_string(), Value::String(stub(id)));
        message.insert("original_tokens".to_string(), json!(tokens));
    }
}

/// Write `lines` to a sibling temp file, then rename it over `path`.
pub fn rewrite_atomically(path: &Path, lines: &[String]) -> HookResult<()> {
    let dir = path
        .parent()
        .filter(|dir| !dir.as_os_str().is_empty())
        .unwrap_or_else(|| Path::new("."));
    let fail = |e: std::io::Error| HookError::transcript(path, e);

    let permissions = std::fs::metadata(path).map_err(fail)?.permissions();
    let mut file = NamedTempFile::new_in(dir).map_err(fail)?;
    for line in lines {
        writeln!(file, "{}", line).map_err(fail)?;
    }
    file.as_file().sync_all().map_err(fail)?;
    file.as_file().set_permissions(permissions).map_err(fail)?;
    file.persist(path).map_err(|e| fail(e.error))?;
    Ok(())
}

pub async fn precompact(
    client: &GatewayClient,
    config: &HookConfig,
    event: &Value,
) -> HookResult<PrecompactReport> {
    let path = transcript_path(event)?;
    let transcript = tokio::fs::read_to_string(&path)
        .await
        .map_err(|e| HookError::transcript(&path, e))?;
    let session = hook_field(event, "session_id").cloned();

    let mut lines = Vec::new();
    let mut total_messages = 0;
    let mut vectorized = 0;
    let mut unavailable: Option<String> = None;

    for line in transcript.lines() {
        if line.trim().is_empty() {
            lines.push(line.to_string());
            continue;
        }
        total_messages += 1;

        if unavailable.is_some() {
            lines.push(line.to_string());
            continue;
        }

        let mut entry: Value = match serde_json::from_str(line) {
            Ok(entry) => entry,
            Err(e) => {
                debug!(error = %e, "Keeping unparseable transcript line");
                lines.push(line.to_string());
                continue;
            }
        };

        let Some(candidate) = candidate(&mut entry, config.token_threshold) else {
            lines.push(line.to_string());
            continue;
        };

        let mut payload = Map::new();
        payload.insert("role".to_string(), json!(candidate.role));
        payload.insert(
            "timestamp".to_string(),
            entry.get("timestamp").cloned().unwrap_or(json!("")),
        );
        payload.insert("session".to_string(), session.clone().unwrap_or(Value::Null));
        payload.insert("source".to_string(), json!("precompact"));

        let id = Uuid::new_v4().to_string();
        match client
            .store(&config.collection, &id, &candidate.text, payload)
            .await
        {
            Ok(stored) => {
                write_stub(&mut entry, &stored, candidate.tokens);
                lines.push(entry.to_string());
                vectorized += 1;
            }
            Err(HookError::Unavailable(reason)) => {
                warn!(%reason, "Gateway unavailable, leaving remaining entries as they are");
                unavailable = Some(reason);
                lines.push(line.to_string());
            }
            Err(e) => {
                warn!(error = %e, "Entry not stored, keeping it verbatim");
                lines.push(line.to_string());
            }
        }
    }

    if vectorized > 0 {
        let target = path.clone();
        let rewritten = lines;
        tokio::task::spawn_blocking(move || rewrite_atomically(&target, &rewritten))
            .await
            .map_err(|e| HookError::transcript(&path, std::io::Error::other(e)))??;
        info!(vectorized, total_messages, path = %path.display(), "Transcript rewritten");
    }

    let status = match (&unavailable, vectorized) {
        (None, _) => "success",
        (Some(_), 0) => "skipped",
        (Some(_), _) => "partial",
    };
    Ok(PrecompactReport {
        status,
        vectorized,
        total_messages,
        reason: unavailable,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_transcript_path_locations() {
        let top = json!({"transcript_path": "/tmp/a.jsonl"});
        assert_eq!(transcript_path(&top).unwrap(), PathBuf::from("/tmp/a.jsonl"));

        let nested = json!({"payload": {"transcript_path": "/tmp/b.jsonl"}});
        assert_eq!(transcript_path(&nested).unwrap(), PathBuf::from("/tmp/b.jsonl"));

        let missing = json!({"payload": {}});
        assert_eq!(transcript_path(&missing).unwrap_err().kind(), "input");
    }

    #[test]
    fn test_candidates() {
        let mut long = json!({"role": "user", "content": "a b c d e"});
        let found = candidate(&mut long, 4).unwrap();
        assert_eq!(found.tokens, 5);
        assert_eq!(found.role, "user");
        assert!(candidate(&mut long, 5).is_none());

        let mut system = json!({"role": "system", "content": "a b c d e"});
        assert!(candidate(&mut system, 1).is_none());

        let mut nested = json!({"type": "assistant", "message": {
            "role": "assistant",
            "content": [{"type": "text", "text": "one two"}, {"type": "text", "text": "three"}]
        }});
        assert_eq!(candidate(&mut nested, 2).unwrap().text, "one two\nthree");

        let mut tool = json!({"message": {
            "role": "assistant",
            "content": [{"type": "tool_use", "name": "Bash"}]
        }});
        assert!(candidate(&mut tool, 0).is_none());
    }

    #[test]
    fn test_write_stub_keeps_shape() {
        let mut nested = json!({"type": "user", "message": {"role": "user", "content": "long"}});
        write_stub(&mut nested, "abc", 900);
        assert_eq!(nested["message"]["content"], "[[VEC:abc]]");
        assert_eq!(nested["message"]["original_tokens"], 900);
        assert_eq!(nested["type"], "user");
    }

    #[test]
    fn test_rewrite_atomically() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("t.jsonl");
        std::fs::write(&path, "old\n").unwrap();

        rewrite_atomically(&path, &["one".to_string(), "two".to_string()]).unwrap();
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "one\ntwo\n");
        assert_eq!(std::fs::read_dir(dir.path()).unwrap().count(), 1);
    }

    #[test]
    fn test_rewrite_missing_file_is_a_transcript_error() {
        let dir = tempfile::tempdir().unwrap();
        let err = rewrite_atomically(&dir.path().join("gone.jsonl"), &[]).unwrap_err();
        assert_eq!(err.kind(), "transcript");
    }
}
