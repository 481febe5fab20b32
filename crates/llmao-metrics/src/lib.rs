use std::sync::Arc;

use llmao_core::metrics_api::Metric;

mod answer_relevancy;
mod context_relevancy;
mod correctness;
mod faithfulness;
mod precision;
pub mod prompts;

pub use answer_relevancy::AnswerRelevancyMetric;
pub use context_relevancy::ContextRelevancyMetric;
pub use correctness::CorrectnessMetric;
pub use faithfulness::FaithfulnessMetric;
pub use precision::PrecisionMetric;

pub fn default_metrics() -> Vec<Arc<dyn Metric>> {
    vec![
        Arc::new(FaithfulnessMetric),
        Arc::new(CorrectnessMetric),
        Arc::new(PrecisionMetric),
        Arc::new(AnswerRelevancyMetric::default()),
        Arc::new(ContextRelevancyMetric),
    ]
}

pub fn metric_names() -> Vec<&'static str> {
    default_metrics().iter().map(|m| m.name()).collect()
}
