use anyhow::Context;
use async_trait::async_trait;
use crate::prompts::{metric_prompt, CORRECTNESS_CRITERIA};
use llmao_core::metrics_api::{bounded_similarity, Metric, MetricContext, MetricResult};
use llmao_core::model::EvaluationRecord;
use llmao_core::retry::RetryPolicy;
use serde::Deserialize;
use serde_json::json;

/// Mean of the judged fact-level F1 against the ground truth and the
/// semantic similarity between response and ground truth.
pub struct CorrectnessMetric;

#[derive(Debug, Deserialize)]
struct Judged {
    #[serde(rename = "TP")]
    tp: u32,
    #[serde(rename = "FP")]
    fp: u32,
    #[serde(rename = "FN")]
    fn_: u32,
}

fn output_schema() -> serde_json::Value {
    let count = |description: &str| {
        json!({ "type": "integer", "minimum": 0, "description": description })
    };
    json!({
        "type": "object",
        "required": ["TP", "FP", "FN"],
        "properties": {
            "TP": count("Facts present in both the ground truth and the AI response"),
            "FP": count("Facts present in the AI response but not in the ground truth"),
            "FN": count("Facts present in the ground truth but not in the AI response")
        }
    })
}

#[async_trait]
impl Metric for CorrectnessMetric {
    fn name(&self) -> &'static str {
        "correctness"
    }

    fn requires_truth(&self) -> bool {
        true
    }

    async fn evaluate(
        &self,
        record: &EvaluationRecord,
        ctx: &MetricContext,
    ) -> anyhow::Result<MetricResult> {
        let truth = record
            .truth
            .as_deref()
            .context("correctness requires a ground-truth answer")?;

        let ground_truth = format!("Ground truth answer - {}", truth);
        let prompt = metric_prompt(
            record,
            &record.context,
            &[ground_truth.as_str(), CORRECTNESS_CRITERIA],
        );
        let judged: Judged = ctx
            .judge
            .judge(&prompt, &output_schema(), RetryPolicy::none())
            .await?;

        let cosine = ctx
            .similarity
            .cosine(&record.response, truth)
            .await
            .context("similarity between response and ground truth")?;

        Ok(MetricResult::Correctness {
            tp: judged.tp,
            fp: judged.fp,
            fn_: judged.fn_,
            similarity: bounded_similarity(cosine),
        })
    }
}
