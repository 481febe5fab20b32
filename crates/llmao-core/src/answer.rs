//! Natural-language answers from executed rows, and the retrieval context
//! recorded for evaluation.

use crate::errors::JudgeError;
use crate::judge::StructuredJudge;
use crate::model::{ChatHistory, QueryRows};
use crate::prompt::render;
use crate::sql::prompts;

/// Returned when the SQL path is abandoned. Deterministic so it can be
/// asserted on and never costs a judge call.
pub const FALLBACK_MESSAGE: &str = "Sorry, I wasn't able to find an answer to that in the AOP \
database. Could you rephrase your question, or mention the tables or columns you are interested in?";

pub struct AnswerSynthesizer {
    judge: StructuredJudge,
}

impl AnswerSynthesizer {
    pub fn new(judge: StructuredJudge) -> Self {
        Self { judge }
    }

    pub async fn synthesize(
        &self,
        question: &str,
        query: &str,
        rows: &QueryRows,
        history: &ChatHistory,
    ) -> Result<String, JudgeError> {
        let prompt = render(
            prompts::ANSWER,
            &[
                ("chat_history", &history.render()),
                ("question", question),
                ("query", query),
                ("result", &rows.to_prompt_json()),
            ],
        );
        let answer = self.judge.complete_text(&prompt).await?;
        Ok(answer.trim().to_string())
    }

    /// Plain completion for questions outside the database.
    pub async fn general(
        &self,
        question: &str,
        history: &ChatHistory,
    ) -> Result<String, JudgeError> {
        let prompt = render(
            prompts::GENERAL,
            &[("chat_history", &history.render()), ("question", question)],
        );
        let answer = self.judge.complete_text(&prompt).await?;
        Ok(answer.trim().to_string())
    }
}

/// One line for the query, one for the row count, then one sentence per
/// row of `column = value` pairs.
pub fn render_context(query: &str, rows: &QueryRows) -> String {
    let mut lines = vec![
        format!("The query `{}` was run against the database.", query),
        format!(
            "It returned {} row{}{}.",
            rows.len(),
            if rows.len() == 1 { "" } else { "s" },
            if rows.truncated { " (truncated)" } else { "" }
        ),
    ];
    for (i, row) in rows.rows.iter().enumerate() {
        let pairs: Vec<String> = rows
            .columns
            .iter()
            .zip(row)
            .map(|(c, v)| format!("{} = {}", c, display_value(v)))
            .collect();
        lines.push(format!("Row {}: {}.", i + 1, pairs.join(", ")));
    }
    lines.join("\n")
}

fn display_value(v: &serde_json::Value) -> String {
    match v {
        serde_json::Value::String(s) => s.clone(),
        serde_json::Value::Null => "NULL".to_string(),
        other => other.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::ChatMessage;
    use crate::providers::llm::fake::FakeClient;
    use serde_json::json;
    use std::sync::Arc;

    fn rows() -> QueryRows {
        QueryRows {
            columns: vec!["ChemicalName".into(), "ChemicalID".into()],
            rows: vec![
                vec![json!("Bevonium"), json!("MESH:C000002")],
                vec![json!("Insulin"), json!(null)],
            ],
            truncated: false,
        }
    }

    #[test]
    fn context_lists_rows() {
        let ctx = render_context("SELECT ChemicalName, ChemicalID FROM chemical_info LIMIT 2;", &rows());
        let lines: Vec<&str> = ctx.lines().collect();
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[1], "It returned 2 rows.");
        assert_eq!(lines[2], "Row 1: ChemicalName = Bevonium, ChemicalID = MESH:C000002.");
        assert_eq!(lines[3], "Row 2: ChemicalName = Insulin, ChemicalID = NULL.");
    }

    #[tokio::test]
    async fn answer_prompt_carries_rows_and_history() -> anyhow::Result<()> {
        let client = Arc::new(FakeClient::new().on("already executed", "  Bevonium and Insulin.  "));
        let synth = AnswerSynthesizer::new(StructuredJudge::new(client.clone()));
        let history = ChatHistory(vec![ChatMessage::human("hi"), ChatMessage::ai("hello")]);

        let answer = synth
            .synthesize("Look up 2 chemicals", "SELECT 1;", &rows(), &history)
            .await?;
        assert_eq!(answer, "Bevonium and Insulin.");

        let prompt = &client.prompts()[0];
        assert!(prompt.contains("\"ChemicalName\":\"Bevonium\""));
        assert!(prompt.contains("Human: hi"));
        Ok(())
    }
}
