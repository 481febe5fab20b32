use crate::embeddings::Similarity;
use crate::errors::ArithmeticError;
use crate::judge::StructuredJudge;
use crate::model::EvaluationRecord;
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Collaborators a metric may call. Owned by the evaluator and lent to
/// each metric call.
#[derive(Clone)]
pub struct MetricContext {
    pub judge: StructuredJudge,
    pub similarity: Similarity,
}

#[async_trait]
pub trait Metric: Send + Sync {
    fn name(&self) -> &'static str;

    /// Whether the metric reads `EvaluationRecord::truth`.
    fn requires_truth(&self) -> bool {
        false
    }

    async fn evaluate(
        &self,
        record: &EvaluationRecord,
        ctx: &MetricContext,
    ) -> anyhow::Result<MetricResult>;
}

/// Judged fields of one metric call. Scores are derived on demand and
/// never stored alongside the fields.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "metric", rename_all = "snake_case")]
pub enum MetricResult {
    Faithfulness {
        total_claims: u32,
        supported_claims: u32,
    },
    Correctness {
        tp: u32,
        fp: u32,
        #[serde(rename = "fn")]
        fn_: u32,
        similarity: f64,
    },
    Precision {
        precision: f64,
    },
    AnswerRelevancy {
        questions: Vec<String>,
        similarities: Vec<f64>,
    },
    ContextRelevancy {
        relevant_sentences: u32,
        total_sentences: u32,
    },
}

impl MetricResult {
    pub fn kind(&self) -> &'static str {
        match self {
            MetricResult::Faithfulness { .. } => "faithfulness",
            MetricResult::Correctness { .. } => "correctness",
            MetricResult::Precision { .. } => "precision",
            MetricResult::AnswerRelevancy { .. } => "answer_relevancy",
            MetricResult::ContextRelevancy { .. } => "context_relevancy",
        }
    }

    pub fn score(&self) -> Result<f64, ArithmeticError> {
        match self {
            MetricResult::Faithfulness {
                total_claims,
                supported_claims,
            } => faithfulness_score(*total_claims, *supported_claims),
            MetricResult::Correctness {
                tp,
                fp,
                fn_,
                similarity,
            } => Ok((f1(*tp, *fp, *fn_) + similarity) / 2.0),
            MetricResult::Precision { precision } => Ok(*precision),
            MetricResult::AnswerRelevancy { similarities, .. } => mean(similarities),
            MetricResult::ContextRelevancy {
                relevant_sentences,
                total_sentences,
            } => Ok(context_relevancy_score(
                *relevant_sentences,
                *total_sentences,
            )),
        }
    }

    /// The judged fields as a JSON object, for reports.
    pub fn details(&self) -> serde_json::Value {
        serde_json::to_value(self).unwrap_or(serde_json::Value::Null)
    }
}

pub fn faithfulness_score(total_claims: u32, supported_claims: u32) -> Result<f64, ArithmeticError> {
    if total_claims == 0 {
        return Err(ArithmeticError::ZeroClaims);
    }
    Ok(f64::from(supported_claims) / f64::from(total_claims))
}

/// `TP / (TP + (FP + FN) / 2)`, defined as 0 when all counts are 0.
pub fn f1(tp: u32, fp: u32, fn_: u32) -> f64 {
    let denom = f64::from(tp) + 0.5 * (f64::from(fp) + f64::from(fn_));
    if denom == 0.0 {
        return 0.0;
    }
    f64::from(tp) / denom
}

/// `S / T`, or `S` itself when the context has no sentences.
pub fn context_relevancy_score(relevant: u32, total: u32) -> f64 {
    f64::from(relevant) / f64::from(total.max(1))
}

/// Cosine similarity as stored in a score: opposed embeddings count as
/// unrelated (0), not as negative relevance.
pub fn bounded_similarity(cosine: f64) -> f64 {
    cosine.clamp(0.0, 1.0)
}

fn mean(values: &[f64]) -> Result<f64, ArithmeticError> {
    if values.is_empty() {
        return Err(ArithmeticError::NoSyntheticQuestions);
    }
    Ok(values.iter().sum::<f64>() / values.len() as f64)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn faithfulness_four_of_seven() {
        let r = MetricResult::Faithfulness {
            total_claims: 7,
            supported_claims: 4,
        };
        assert!((r.score().unwrap() - 4.0 / 7.0).abs() < 1e-12);
        assert_eq!(faithfulness_score(0, 0), Err(ArithmeticError::ZeroClaims));
    }

    #[test]
    fn f1_zero_counts_is_zero() {
        assert_eq!(f1(0, 0, 0), 0.0);
        assert_eq!(f1(2, 0, 0), 1.0);
        assert!((f1(1, 1, 1) - 0.5).abs() < 1e-12);
    }

    #[test]
    fn correctness_averages_f1_and_similarity() {
        let r = MetricResult::Correctness {
            tp: 0,
            fp: 0,
            fn_: 0,
            similarity: 0.8,
        };
        assert!((r.score().unwrap() - 0.4).abs() < 1e-12);
    }

    #[test]
    fn context_relevancy_zero_sentences_divides_by_one() {
        assert_eq!(context_relevancy_score(0, 0), 0.0);
        assert_eq!(context_relevancy_score(1, 0), 1.0);
        assert_eq!(context_relevancy_score(1, 4), 0.25);
    }

    #[test]
    fn answer_relevancy_needs_questions() {
        let r = MetricResult::AnswerRelevancy {
            questions: vec![],
            similarities: vec![],
        };
        assert_eq!(r.score(), Err(ArithmeticError::NoSyntheticQuestions));
    }

    #[test]
    fn similarity_is_bounded_to_unit_interval() {
        assert_eq!(bounded_similarity(-0.995), 0.0);
        assert_eq!(bounded_similarity(0.25), 0.25);
        assert_eq!(bounded_similarity(1.0000001), 1.0);
    }

    #[test]
    fn details_are_tagged_by_metric() {
        let r = MetricResult::Correctness {
            tp: 1,
            fp: 2,
            fn_: 3,
            similarity: 0.5,
        };
        let d = r.details();
        assert_eq!(d["metric"], "correctness");
        assert_eq!(d["fn"], 3);
    }
}
