use super::prompts;
use crate::catalog::SchemaCatalog;
use crate::errors::JudgeError;
use crate::judge::StructuredJudge;
use crate::model::Intent;
use crate::prompt::render;

/// Decides whether a question goes down the database path.
pub struct IntentClassifier {
    judge: StructuredJudge,
}

impl IntentClassifier {
    pub fn new(judge: StructuredJudge) -> Self {
        Self { judge }
    }

    pub async fn classify(
        &self,
        question: &str,
        catalog: &SchemaCatalog,
    ) -> Result<Intent, JudgeError> {
        let prompt = render(
            prompts::INTENT,
            &[
                ("schema", &catalog.to_prompt_json()),
                ("question", question),
            ],
        );
        let reply = self.judge.complete_text(&prompt).await?;
        let intent = parse_intent(&reply);
        tracing::debug!(event = "llmao.intent.classified", ?intent, reply = %reply.trim());
        Ok(intent)
    }
}

/// Anything but a leading "database" is treated as a general question.
pub fn parse_intent(reply: &str) -> Intent {
    let first = reply
        .split_whitespace()
        .next()
        .unwrap_or("")
        .chars()
        .filter(|c| c.is_ascii_alphabetic())
        .collect::<String>()
        .to_lowercase();
    if first == "database" {
        Intent::Database
    } else {
        Intent::General
    }
}
