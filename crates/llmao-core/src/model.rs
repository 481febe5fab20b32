use crate::catalog::RelevantSchema;
use crate::engine::evaluator::ScoreSheet;
use crate::errors::ExecutionError;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LlmResponse {
    pub text: String,
    pub provider: String,
    pub model: String,
    #[serde(default)]
    pub meta: serde_json::Value,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Role {
    Human,
    Ai,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChatMessage {
    pub role: Role,
    pub content: String,
}

impl ChatMessage {
    pub fn human(content: impl Into<String>) -> Self {
        Self {
            role: Role::Human,
            content: content.into(),
        }
    }

    pub fn ai(content: impl Into<String>) -> Self {
        Self {
            role: Role::Ai,
            content: content.into(),
        }
    }
}

/// Prior turns of a conversation, oldest first.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ChatHistory(pub Vec<ChatMessage>);

impl ChatHistory {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn push(&mut self, msg: ChatMessage) {
        self.0.push(msg);
    }

    pub fn last_two(&self) -> Option<(&ChatMessage, &ChatMessage)> {
        match self.0.as_slice() {
            [.., second_last, last] => Some((last, second_last)),
            _ => None,
        }
    }

    /// Prompt rendering; empty history renders as "none".
    pub fn render(&self) -> String {
        if self.0.is_empty() {
            return "none".to_string();
        }
        self.0
            .iter()
            .map(|m| match m.role {
                Role::Human => format!("Human: {}", m.content),
                Role::Ai => format!("AI: {}", m.content),
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

/// One scored interaction. `truth` is only needed by `correctness`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct EvaluationRecord {
    pub question: String,
    pub response: String,
    #[serde(default)]
    pub context: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub truth: Option<String>,
}

impl EvaluationRecord {
    pub fn new(
        question: impl Into<String>,
        response: impl Into<String>,
        context: impl Into<String>,
    ) -> Self {
        Self {
            question: question.into(),
            response: response.into(),
            context: context.into(),
            truth: None,
        }
    }

    pub fn with_truth(mut self, truth: impl Into<String>) -> Self {
        self.truth = Some(truth.into());
        self
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    Database,
    General,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QueryRows {
    pub columns: Vec<String>,
    pub rows: Vec<Vec<serde_json::Value>>,
    /// Set when the store stopped fetching at its row cap.
    #[serde(default)]
    pub truncated: bool,
}

impl QueryRows {
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Compact JSON rendering used inside prompts.
    pub fn to_prompt_json(&self) -> String {
        let objects: Vec<serde_json::Value> = self
            .rows
            .iter()
            .map(|row| {
                let mut obj = serde_json::Map::new();
                for (col, val) in self.columns.iter().zip(row) {
                    obj.insert(col.clone(), val.clone());
                }
                serde_json::Value::Object(obj)
            })
            .collect();
        serde_json::Value::Array(objects).to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case", tag = "status")]
pub enum AttemptOutcome {
    Rows { rows: QueryRows },
    Failed { error: ExecutionError },
}

/// One execution of a generated (attempt 1) or repaired (attempt 2) query.
/// Rows and error are exclusive by construction.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SqlAttempt {
    pub question: String,
    pub query: String,
    pub attempt_no: u32,
    pub outcome: AttemptOutcome,
}

impl SqlAttempt {
    pub fn succeeded(&self) -> bool {
        matches!(self.outcome, AttemptOutcome::Rows { .. })
    }

    pub fn rows(&self) -> Option<&QueryRows> {
        match &self.outcome {
            AttemptOutcome::Rows { rows } => Some(rows),
            AttemptOutcome::Failed { .. } => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TurnStatus {
    /// Answer synthesised from executed rows.
    Answered,
    /// Plain completion for a question unrelated to the database.
    General,
    /// SQL path abandoned; the answer is the fallback message.
    Fallback,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ChatTurn {
    pub question: String,
    pub intent: Intent,
    pub status: TurnStatus,
    pub answer: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub relevant_schema: Option<RelevantSchema>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub attempts: Vec<SqlAttempt>,
    /// Retrieval context rendered from the successful query.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub context: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub fallback_reason: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub scores: Option<ScoreSheet>,
    /// Judge's rating of how satisfied the user was with the previous turn.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub satisfaction: Option<i8>,
}

impl ChatTurn {
    pub fn final_query(&self) -> Option<&str> {
        self.attempts
            .iter()
            .rev()
            .find(|a| a.succeeded())
            .map(|a| a.query.as_str())
    }

    pub fn to_record(&self) -> Option<EvaluationRecord> {
        let context = self.context.as_ref()?;
        Some(EvaluationRecord::new(
            self.question.clone(),
            self.answer.clone(),
            context.clone(),
        ))
    }
}
