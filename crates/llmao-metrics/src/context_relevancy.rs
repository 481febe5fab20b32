use async_trait::async_trait;
use crate::prompts::{metric_prompt, CONTEXT_RELEVANCY_CRITERIA, CONTEXT_RELEVANCY_EXAMPLES};
use llmao_core::metrics_api::{Metric, MetricContext, MetricResult};
use llmao_core::model::EvaluationRecord;
use llmao_core::retry::RetryPolicy;
use serde::Deserialize;
use serde_json::json;

pub struct ContextRelevancyMetric;

#[derive(Debug, Deserialize)]
struct Judged {
    #[serde(rename = "S")]
    relevant: u32,
    #[serde(rename = "T")]
    total: u32,
}

fn output_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "required": ["S", "T"],
        "properties": {
            "S": {
                "type": "integer",
                "minimum": 0,
                "description": "Number of sentences in the retrieved context relevant to the user's question"
            },
            "T": {
                "type": "integer",
                "minimum": 0,
                "description": "Total number of sentences in the retrieved context"
            }
        }
    })
}

#[async_trait]
impl Metric for ContextRelevancyMetric {
    fn name(&self) -> &'static str {
        "context_relevancy"
    }

    async fn evaluate(
        &self,
        record: &EvaluationRecord,
        ctx: &MetricContext,
    ) -> anyhow::Result<MetricResult> {
        let prompt = metric_prompt(
            record,
            &record.context,
            &[CONTEXT_RELEVANCY_CRITERIA, CONTEXT_RELEVANCY_EXAMPLES],
        );
        let judged: Judged = ctx
            .judge
            .judge(&prompt, &output_schema(), RetryPolicy::none())
            .await?;

        // With no sentences the score is S itself, so S is only bounded by T
        // when T is positive.
        if judged.total > 0 && judged.relevant > judged.total {
            anyhow::bail!(
                "judge reported {} relevant sentences out of {}",
                judged.relevant,
                judged.total
            );
        }
        Ok(MetricResult::ContextRelevancy {
            relevant_sentences: judged.relevant,
            total_sentences: judged.total,
        })
    }
}
