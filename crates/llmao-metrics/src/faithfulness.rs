use async_trait::async_trait;
use crate::prompts::{metric_prompt, FAITHFULNESS_CRITERIA, FAITHFULNESS_EXAMPLES};
use llmao_core::metrics_api::{Metric, MetricContext, MetricResult};
use llmao_core::model::EvaluationRecord;
use llmao_core::retry::RetryPolicy;
use serde::Deserialize;
use serde_json::json;

/// Share of the response's claims that the context supports (`B / A`).
pub struct FaithfulnessMetric;

#[derive(Debug, Deserialize)]
struct Judged {
    #[serde(rename = "A")]
    total_claims: u32,
    #[serde(rename = "B")]
    supported_claims: u32,
}

fn output_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "required": ["A", "B"],
        "properties": {
            "A": {
                "type": "integer",
                "minimum": 0,
                "description": "Total number of claims in the AI response"
            },
            "B": {
                "type": "integer",
                "minimum": 0,
                "description": "Number of claims in the AI response which can be inferred from the context"
            }
        }
    })
}

#[async_trait]
impl Metric for FaithfulnessMetric {
    fn name(&self) -> &'static str {
        "faithfulness"
    }

    async fn evaluate(
        &self,
        record: &EvaluationRecord,
        ctx: &MetricContext,
    ) -> anyhow::Result<MetricResult> {
        let prompt = metric_prompt(
            record,
            &record.context,
            &[FAITHFULNESS_CRITERIA, FAITHFULNESS_EXAMPLES],
        );
        // The only metric whose unreadable output is asked for again; more
        // supported claims than claims counts as unreadable.
        let judged: Judged = ctx
            .judge
            .judge_checked(&prompt, &output_schema(), RetryPolicy::once(), |j: &Judged| {
                if j.supported_claims > j.total_claims {
                    Err(format!(
                        "judge reported more supported claims ({}) than claims ({})",
                        j.supported_claims, j.total_claims
                    ))
                } else {
                    Ok(())
                }
            })
            .await?;

        Ok(MetricResult::Faithfulness {
            total_claims: judged.total_claims,
            supported_claims: judged.supported_claims,
        })
    }
}
