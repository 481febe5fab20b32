use async_trait::async_trait;
use crate::prompts::{metric_prompt, ANSWER_RELEVANCY_CRITERIA, ANSWER_RELEVANCY_EXAMPLES};
use llmao_core::metrics_api::{bounded_similarity, Metric, MetricContext, MetricResult};
use llmao_core::model::EvaluationRecord;
use llmao_core::prompt::render;
use llmao_core::retry::RetryPolicy;
use serde::Deserialize;
use serde_json::json;

pub const DEFAULT_SYNTHETIC_QUESTIONS: usize = 3;

/// The judge reverse-engineers `k` questions from the response; the score
/// is the mean cosine similarity between each and the original question.
pub struct AnswerRelevancyMetric {
    pub k: usize,
}

impl Default for AnswerRelevancyMetric {
    fn default() -> Self {
        Self {
            k: DEFAULT_SYNTHETIC_QUESTIONS,
        }
    }
}

#[derive(Debug, Deserialize)]
struct Judged {
    questions: Vec<String>,
}

fn output_schema() -> serde_json::Value {
    json!({
        "type": "object",
        "required": ["questions"],
        "properties": {
            "questions": {
                "type": "array",
                "items": { "type": "string" },
                "description": "Questions derived from the AI response alone"
            }
        }
    })
}

#[async_trait]
impl Metric for AnswerRelevancyMetric {
    fn name(&self) -> &'static str {
        "answer_relevancy"
    }

    async fn evaluate(
        &self,
        record: &EvaluationRecord,
        ctx: &MetricContext,
    ) -> anyhow::Result<MetricResult> {
        let criteria = render(ANSWER_RELEVANCY_CRITERIA, &[("k", &self.k.to_string())]);
        let prompt = metric_prompt(
            record,
            &record.context,
            &[criteria.as_str(), ANSWER_RELEVANCY_EXAMPLES],
        );
        let judged: Judged = ctx
            .judge
            .judge(&prompt, &output_schema(), RetryPolicy::none())
            .await?;

        let mut similarities = Vec::with_capacity(judged.questions.len());
        for synthetic in &judged.questions {
            let cosine = ctx.similarity.cosine(&record.question, synthetic).await?;
            similarities.push(bounded_similarity(cosine));
        }
        tracing::debug!(
            event = "llmao.metrics.answer_relevancy",
            questions = judged.questions.len(),
            model = %ctx.similarity.model_id()
        );
        Ok(MetricResult::AnswerRelevancy {
            questions: judged.questions,
            similarities,
        })
    }
}
