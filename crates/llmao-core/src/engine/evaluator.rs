//! Runs requested metrics over evaluation records.
//!
//! Metric names are checked when the evaluator is built. Input problems
//! (missing records, missing truth) are reported before any judge call.
//! A metric that fails on one record is recorded in that record's sheet
//! with its error; the other metrics still run.

use crate::errors::{closest_match, EvalInputError, MetricConfigError};
use crate::metrics_api::{Metric, MetricContext, MetricResult};
use crate::model::EvaluationRecord;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetricScore {
    pub score: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<MetricResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

/// Metric name -> score for one record.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ScoreSheet(pub BTreeMap<String, MetricScore>);

impl ScoreSheet {
    pub fn score(&self, metric: &str) -> Option<f64> {
        self.0.get(metric).and_then(|s| s.score)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Mean over every metric; fails if any metric has no score.
    pub fn average(&self) -> Result<f64, EvalInputError> {
        average_of(std::iter::once(self))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EvaluationOutput {
    Single(ScoreSheet),
    Batch(Vec<ScoreSheet>),
}

impl EvaluationOutput {
    pub fn sheets(&self) -> &[ScoreSheet] {
        match self {
            EvaluationOutput::Single(s) => std::slice::from_ref(s),
            EvaluationOutput::Batch(v) => v,
        }
    }
}

pub struct Evaluator {
    metrics: Vec<Arc<dyn Metric>>,
    ctx: MetricContext,
    last: Option<Vec<ScoreSheet>>,
}

impl Evaluator {
    /// Selects `names` from `available`. Unknown names are rejected here,
    /// with the closest known name as a hint. Duplicates collapse.
    pub fn new<S: AsRef<str>>(
        names: &[S],
        available: &[Arc<dyn Metric>],
        ctx: MetricContext,
    ) -> Result<Self, EvalInputError> {
        if names.is_empty() {
            return Err(EvalInputError::NoMetrics);
        }
        let mut metrics: Vec<Arc<dyn Metric>> = Vec::new();
        for name in names {
            let name = name.as_ref().trim();
            let Some(m) = available.iter().find(|m| m.name() == name) else {
                let known: Vec<String> = available.iter().map(|m| m.name().to_string()).collect();
                return Err(MetricConfigError {
                    suggestion: closest_match(name, known.iter().map(String::as_str)),
                    name: name.to_string(),
                    known,
                }
                .into());
            };
            if !metrics.iter().any(|x| x.name() == m.name()) {
                metrics.push(m.clone());
            }
        }
        Ok(Self {
            metrics,
            ctx,
            last: None,
        })
    }

    pub fn metric_names(&self) -> Vec<&'static str> {
        self.metrics.iter().map(|m| m.name()).collect()
    }

    pub async fn evaluate(
        &mut self,
        records: &[EvaluationRecord],
        batch: bool,
    ) -> Result<EvaluationOutput, EvalInputError> {
        if records.is_empty() {
            return Err(EvalInputError::NoRecords);
        }
        if !batch && records.len() != 1 {
            return Err(EvalInputError::ExpectedSingleRecord(records.len()));
        }
        for m in self.metrics.iter().filter(|m| m.requires_truth()) {
            if let Some(index) = records.iter().position(|r| r.truth.is_none()) {
                return Err(EvalInputError::MissingTruth {
                    metric: m.name().to_string(),
                    index,
                });
            }
        }

        let mut sheets = Vec::with_capacity(records.len());
        for (index, record) in records.iter().enumerate() {
            sheets.push(self.score_record(index, record).await);
        }
        self.last = Some(sheets.clone());

        if batch {
            Ok(EvaluationOutput::Batch(sheets))
        } else {
            let sheet = sheets.into_iter().next().unwrap_or_default();
            Ok(EvaluationOutput::Single(sheet))
        }
    }

    async fn score_record(&self, index: usize, record: &EvaluationRecord) -> ScoreSheet {
        let mut sheet = ScoreSheet::default();
        for metric in &self.metrics {
            let entry = match metric.evaluate(record, &self.ctx).await {
                Ok(result) => match result.score() {
                    Ok(score) => MetricScore {
                        score: Some(score),
                        result: Some(result),
                        error: None,
                    },
                    Err(e) => {
                        tracing::warn!(
                            event = "llmao.eval.metric_undefined",
                            metric = metric.name(),
                            record = index,
                            error = %e
                        );
                        MetricScore {
                            score: None,
                            result: Some(result),
                            error: Some(e.to_string()),
                        }
                    }
                },
                Err(e) => {
                    tracing::warn!(
                        event = "llmao.eval.metric_failed",
                        metric = metric.name(),
                        record = index,
                        error = %e
                    );
                    MetricScore {
                        score: None,
                        result: None,
                        error: Some(format!("{:#}", e)),
                    }
                }
            };
            sheet.0.insert(metric.name().to_string(), entry);
        }
        tracing::debug!(event = "llmao.eval.record_scored", record = index);
        sheet
    }

    /// Mean of all per-metric scores of the most recent evaluation.
    pub fn average_score(&self) -> Result<f64, EvalInputError> {
        let sheets = self.last.as_ref().ok_or(EvalInputError::NothingEvaluated)?;
        average_of(sheets.iter())
    }
}

fn average_of<'a>(sheets: impl Iterator<Item = &'a ScoreSheet>) -> Result<f64, EvalInputError> {
    let mut total = 0.0;
    let mut count = 0usize;
    for sheet in sheets {
        for (metric, s) in &sheet.0 {
            let Some(score) = s.score else {
                return Err(EvalInputError::MissingScore {
                    metric: metric.clone(),
                    reason: s.error.clone().unwrap_or_else(|| "no score".to_string()),
                });
            };
            total += score;
            count += 1;
        }
    }
    if count == 0 {
        return Err(EvalInputError::NothingEvaluated);
    }
    Ok(total / count as f64)
}
