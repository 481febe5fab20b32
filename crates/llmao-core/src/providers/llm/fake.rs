//! Deterministic in-process judge for tests and offline demos.
//!
//! Responses are chosen by the first rule whose `when` text occurs in the
//! prompt. A rule with several responses hands them out in order and keeps
//! repeating the last one.

use super::LlmClient;
use crate::model::LlmResponse;
use async_trait::async_trait;
use serde::Deserialize;
use std::sync::Mutex;

#[derive(Debug, Clone, Deserialize)]
pub struct FakeRule {
    pub when: String,
    pub respond: Vec<String>,
}

#[derive(Debug, Clone, Default, Deserialize)]
pub struct FakeScript {
    #[serde(default)]
    pub rules: Vec<FakeRule>,
    #[serde(default)]
    pub default: Option<String>,
}

struct RuleState {
    rule: FakeRule,
    served: usize,
}

pub struct FakeClient {
    rules: Mutex<Vec<RuleState>>,
    default: Option<String>,
    failure: Option<String>,
    prompts: Mutex<Vec<String>>,
}

impl Default for FakeClient {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeClient {
    pub fn new() -> Self {
        Self {
            rules: Mutex::new(Vec::new()),
            default: None,
            failure: None,
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn from_script(script: FakeScript) -> Self {
        let mut client = Self::new();
        for rule in script.rules {
            client = client.on_seq(&rule.when, rule.respond);
        }
        client.default = script.default;
        client
    }

    /// Every call fails with `message`, as an unreachable service would.
    pub fn failing(message: &str) -> Self {
        Self {
            failure: Some(message.to_string()),
            ..Self::new()
        }
    }

    pub fn with_default(mut self, text: &str) -> Self {
        self.default = Some(text.to_string());
        self
    }

    pub fn on(self, when: &str, respond: &str) -> Self {
        self.on_seq(when, vec![respond.to_string()])
    }

    pub fn on_seq<S: Into<String>>(self, when: &str, respond: Vec<S>) -> Self {
        let rule = FakeRule {
            when: when.to_string(),
            respond: respond.into_iter().map(Into::into).collect(),
        };
        self.rules
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(RuleState { rule, served: 0 });
        self
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .clone()
    }

    pub fn calls_matching(&self, needle: &str) -> usize {
        self.prompts().iter().filter(|p| p.contains(needle)).count()
    }

    fn respond(&self, prompt: &str) -> Option<String> {
        let mut rules = self.rules.lock().unwrap_or_else(|e| e.into_inner());
        for state in rules.iter_mut() {
            if !prompt.contains(&state.rule.when) || state.rule.respond.is_empty() {
                continue;
            }
            let idx = state.served.min(state.rule.respond.len() - 1);
            state.served += 1;
            return Some(state.rule.respond[idx].clone());
        }
        self.default.clone()
    }
}

#[async_trait]
impl LlmClient for FakeClient {
    async fn complete(
        &self,
        prompt: &str,
        _context: Option<&[String]>,
    ) -> anyhow::Result<LlmResponse> {
        self.prompts
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .push(prompt.to_string());

        if let Some(msg) = &self.failure {
            anyhow::bail!("fake judge failure: {}", msg);
        }

        let text = self.respond(prompt).ok_or_else(|| {
            anyhow::anyhow!(
                "fake judge has no rule for prompt: {}",
                prompt.chars().take(80).collect::<String>()
            )
        })?;

        Ok(LlmResponse {
            text,
            provider: "fake".to_string(),
            model: "fake".to_string(),
            meta: serde_json::json!({}),
        })
    }

    fn provider_name(&self) -> &'static str {
        "fake"
    }
}
