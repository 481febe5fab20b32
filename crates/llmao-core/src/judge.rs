//! Structured-output boundary to the language judge.
//!
//! Every structured call carries a JSON schema. The schema is appended to the
//! prompt as format instructions, the first JSON value in the reply is
//! validated against it and only then deserialised. Nothing in a reply is
//! ever evaluated as code.

use crate::errors::JudgeError;
use crate::providers::llm::LlmClient;
use crate::retry::{FailureClass, RetryPolicy};
use jsonschema::JSONSchema;
use serde::de::DeserializeOwned;
use std::sync::Arc;

#[derive(Clone)]
pub struct StructuredJudge {
    client: Arc<dyn LlmClient>,
}

impl StructuredJudge {
    pub fn new(client: Arc<dyn LlmClient>) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &Arc<dyn LlmClient> {
        &self.client
    }

    pub async fn complete_text(&self, prompt: &str) -> Result<String, JudgeError> {
        self.client
            .complete(prompt, None)
            .await
            .map(|r| r.text)
            .map_err(|e| JudgeError::Transport(e.to_string()))
    }

    /// One structured call; a reply that fails to parse or validate is
    /// re-requested according to `retry` with the same prompt.
    pub async fn judge<T: DeserializeOwned>(
        &self,
        prompt: &str,
        schema: &serde_json::Value,
        retry: RetryPolicy,
    ) -> Result<T, JudgeError> {
        self.judge_checked(prompt, schema, retry, |_: &T| Ok(()))
            .await
    }

    /// Like [`judge`](Self::judge) with a cross-field `check` the schema
    /// cannot express. A value the check rejects counts as unparsable.
    pub async fn judge_checked<T, F>(
        &self,
        prompt: &str,
        schema: &serde_json::Value,
        retry: RetryPolicy,
        check: F,
    ) -> Result<T, JudgeError>
    where
        T: DeserializeOwned,
        F: Fn(&T) -> Result<(), String> + Send + Sync,
    {
        let compiled = JSONSchema::options()
            .compile(schema)
            .map_err(|e| JudgeError::Schema(e.to_string()))?;
        let full_prompt = format!("{}\n\n{}", prompt, format_instructions(schema));

        let outcome = retry
            .run(classify, |_attempt, _previous| {
                let full_prompt = &full_prompt;
                let compiled = &compiled;
                let check = &check;
                async move {
                    let text = self.complete_text(full_prompt).await?;
                    let value = parse_structured::<T>(&text, compiled)?;
                    check(&value).map_err(JudgeError::Parse)?;
                    Ok(value)
                }
            })
            .await;

        if outcome.attempts > 1 {
            tracing::warn!(
                event = "llmao.judge.parse_retry",
                attempts = outcome.attempts,
                recovered = outcome.result.is_ok(),
                "judge output did not match schema on first attempt"
            );
        }
        outcome.result
    }
}

fn classify(err: &JudgeError) -> FailureClass {
    match err {
        JudgeError::Parse(_) => FailureClass::Retryable,
        JudgeError::Transport(_) | JudgeError::Schema(_) => FailureClass::Fatal,
    }
}

pub fn format_instructions(schema: &serde_json::Value) -> String {
    let pretty = serde_json::to_string_pretty(schema).unwrap_or_else(|_| schema.to_string());
    format!(
        "<formatting>\nRespond ONLY with a JSON value that conforms to the JSON schema below. \
         Do not explain your answer.\n```json\n{}\n```\n</formatting>",
        pretty
    )
}

fn parse_structured<T: DeserializeOwned>(
    text: &str,
    compiled: &JSONSchema,
) -> Result<T, JudgeError> {
    let value = extract_json(text)
        .ok_or_else(|| JudgeError::Parse(format!("no JSON value in reply: {}", preview(text))))?;

    if let Err(errors) = compiled.validate(&value) {
        let list: Vec<String> = errors.map(|e| e.to_string()).collect();
        return Err(JudgeError::Parse(list.join("; ")));
    }

    serde_json::from_value(value).map_err(|e| JudgeError::Parse(e.to_string()))
}

/// First JSON object or array in `text`, tolerating code fences and prose
/// around it.
pub fn extract_json(text: &str) -> Option<serde_json::Value> {
    let trimmed = text.trim();
    if let Ok(v) = serde_json::from_str::<serde_json::Value>(trimmed) {
        return Some(v);
    }
    let start = trimmed.find(['{', '['])?;
    let mut stream =
        serde_json::Deserializer::from_str(&trimmed[start..]).into_iter::<serde_json::Value>();
    match stream.next() {
        Some(Ok(v)) => Some(v),
        _ => None,
    }
}

fn preview(text: &str) -> String {
    let t: String = text.chars().take(120).collect();
    if text.chars().count() > 120 {
        format!("{}...", t)
    } else {
        t
    }
}
