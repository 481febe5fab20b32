use super::prompts;
use crate::catalog::{RelevantSchema, SchemaCatalog};
use crate::errors::{JudgeError, RoutingError};
use crate::judge::StructuredJudge;
use crate::prompt::render;
use crate::retry::RetryPolicy;
use serde_json::json;
use std::collections::BTreeMap;

/// Picks the tables and columns a question needs. The judge's proposal is
/// never trusted as-is: every name is checked against the catalog.
pub struct TableRouter {
    judge: StructuredJudge,
}

fn proposal_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "minProperties": 1,
        "additionalProperties": {
            "type": "array",
            "items": { "type": "string" }
        }
    })
}

impl TableRouter {
    pub fn new(judge: StructuredJudge) -> Self {
        Self { judge }
    }

    pub async fn route(
        &self,
        question: &str,
        catalog: &SchemaCatalog,
    ) -> Result<RelevantSchema, RoutingError> {
        let prompt = render(
            prompts::ROUTER,
            &[
                ("question", question),
                ("schema", &catalog.to_prompt_json()),
            ],
        );
        let proposal: BTreeMap<String, Vec<String>> = self
            .judge
            .judge(&prompt, &proposal_schema(), RetryPolicy::none())
            .await
            .map_err(|e: JudgeError| RoutingError::Judge(e.to_string()))?;

        let relevant = catalog.resolve(proposal)?;
        tracing::debug!(
            event = "llmao.router.resolved",
            tables = relevant.tables().count(),
            "relevant schema selected"
        );
        Ok(relevant)
    }
}
