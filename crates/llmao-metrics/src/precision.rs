use async_trait::async_trait;
use crate::prompts::{metric_prompt, PRECISION_CRITERIA, PRECISION_EXAMPLES};
use llmao_core::metrics_api::{Metric, MetricContext, MetricResult};
use llmao_core::model::EvaluationRecord;
use llmao_core::retry::RetryPolicy;
use serde::Deserialize;
use serde_json::json;

pub struct PrecisionMetric;

#[derive(Debug, Deserialize)]
struct Judged {
    precision: f64,
}

// Values outside [0, 1] fail validation instead of reaching the score.
fn output_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "required": ["precision"],
        "properties": {
            "precision": {
                "type": "number",
                "minimum": 0,
                "maximum": 1,
                "description": "0 - none of the response is needed to answer the question; 1 - all of it is"
            }
        }
    })
}

#[async_trait]
impl Metric for PrecisionMetric {
    fn name(&self) -> &'static str {
        "precision"
    }

    async fn evaluate(
        &self,
        record: &EvaluationRecord,
        ctx: &MetricContext,
    ) -> anyhow::Result<MetricResult> {
        let prompt = metric_prompt(
            record,
            &record.context,
            &[PRECISION_CRITERIA, PRECISION_EXAMPLES],
        );
        let judged: Judged = ctx
            .judge
            .judge(&prompt, &output_schema(), RetryPolicy::none())
            .await?;
        Ok(MetricResult::Precision {
            precision: judged.precision,
        })
    }
}
