//! One chat turn end to end: intent, routing, SQL with one repair,
//! answer, and optional turn scoring and satisfaction rating.
//!
//! `answer` never fails. Every terminal problem on the database path ends
//! in [`TurnStatus::Fallback`] with the reason recorded on the turn.

use crate::answer::{render_context, AnswerSynthesizer, FALLBACK_MESSAGE};
use crate::catalog::{RelevantSchema, SchemaCatalog};
use crate::engine::evaluator::Evaluator;
use crate::engine::satisfaction::record_satisfaction;
use crate::errors::{ExecutionError, ExecutionErrorKind, QueryError};
use crate::judge::StructuredJudge;
use crate::model::{
    AttemptOutcome, ChatHistory, ChatTurn, Intent, QueryRows, SqlAttempt, TurnStatus,
};
use crate::retry::{FailureClass, RetryPolicy};
use crate::sql::generator::check_not_empty;
use crate::sql::{IntentClassifier, QueryGenerator, TableRouter};
use crate::storage::ratings::RatingLog;
use crate::storage::SqlStore;
use std::sync::Arc;

pub struct ChatPipeline {
    judge: StructuredJudge,
    store: Arc<dyn SqlStore>,
    catalog: Arc<SchemaCatalog>,
    classifier: IntentClassifier,
    router: TableRouter,
    generator: QueryGenerator,
    synthesizer: AnswerSynthesizer,
    repair: RetryPolicy,
    evaluator: Option<Evaluator>,
    ratings: Option<RatingLog>,
}

impl ChatPipeline {
    pub fn new(
        judge: StructuredJudge,
        store: Arc<dyn SqlStore>,
        catalog: Arc<SchemaCatalog>,
    ) -> Self {
        Self {
            classifier: IntentClassifier::new(judge.clone()),
            router: TableRouter::new(judge.clone()),
            generator: QueryGenerator::new(judge.clone()),
            synthesizer: AnswerSynthesizer::new(judge.clone()),
            judge,
            store,
            catalog,
            repair: RetryPolicy::once(),
            evaluator: None,
            ratings: None,
        }
    }

    pub fn with_limit_hint(mut self, limit_hint: usize) -> Self {
        self.generator = self.generator.with_limit_hint(limit_hint);
        self
    }

    /// Scores every answered turn with these metrics.
    pub fn with_evaluator(mut self, evaluator: Evaluator) -> Self {
        self.evaluator = Some(evaluator);
        self
    }

    pub fn with_ratings(mut self, log: RatingLog) -> Self {
        self.ratings = Some(log);
        self
    }

    pub fn catalog(&self) -> &SchemaCatalog {
        &self.catalog
    }

    pub async fn answer(&mut self, question: &str, history: &ChatHistory) -> ChatTurn {
        let satisfaction = self.rate_previous_turn(question, history).await;

        let intent = match self.classifier.classify(question, &self.catalog).await {
            Ok(i) => i,
            Err(e) => {
                tracing::warn!(event = "llmao.intent.failed", error = %e);
                let mut turn = fallback(question, Intent::General, e.to_string());
                turn.satisfaction = satisfaction;
                return turn;
            }
        };

        let mut turn = match intent {
            Intent::General => self.general(question, history).await,
            Intent::Database => self.database(question, history).await,
        };
        turn.satisfaction = satisfaction;

        if turn.status == TurnStatus::Answered {
            self.score_turn(&mut turn).await;
        }
        turn
    }

    async fn general(&self, question: &str, history: &ChatHistory) -> ChatTurn {
        match self.synthesizer.general(question, history).await {
            Ok(answer) => ChatTurn {
                question: question.to_string(),
                intent: Intent::General,
                status: TurnStatus::General,
                answer,
                relevant_schema: None,
                attempts: Vec::new(),
                context: None,
                fallback_reason: None,
                scores: None,
                satisfaction: None,
            },
            Err(e) => {
                tracing::warn!(event = "llmao.general.failed", error = %e);
                fallback(question, Intent::General, e.to_string())
            }
        }
    }

    async fn database(&self, question: &str, history: &ChatHistory) -> ChatTurn {
        let relevant = match self.router.route(question, &self.catalog).await {
            Ok(r) => r,
            Err(e) => {
                tracing::warn!(event = "llmao.router.rejected", error = %e);
                return fallback(question, Intent::Database, e.to_string());
            }
        };

        let (attempts, result) = self.run_sql(question, &relevant).await;
        let mut turn = fallback(question, Intent::Database, String::new());
        turn.relevant_schema = Some(relevant);
        turn.attempts = attempts;

        let (query, rows) = match result {
            Ok(ok) => ok,
            Err(e) => {
                tracing::warn!(
                    event = "llmao.sql.fallback",
                    attempts = turn.attempts.len(),
                    error = %e
                );
                turn.fallback_reason = Some(e.to_string());
                return turn;
            }
        };

        match self
            .synthesizer
            .synthesize(question, &query, &rows, history)
            .await
        {
            Ok(answer) => {
                turn.status = TurnStatus::Answered;
                turn.answer = answer;
                turn.context = Some(render_context(&query, &rows));
                turn.fallback_reason = None;
            }
            Err(e) => {
                tracing::warn!(event = "llmao.answer.failed", error = %e);
                turn.fallback_reason = Some(e.to_string());
            }
        }
        turn
    }

    /// Generate, execute, and on a repairable failure repair once and
    /// execute again. At most two executions per question.
    async fn run_sql(
        &self,
        question: &str,
        relevant: &RelevantSchema,
    ) -> (Vec<SqlAttempt>, Result<(String, QueryRows), QueryError>) {
        let outcome = self
            .repair
            .run(classify_query_error, |attempt, previous: Option<QueryError>| {
                let failed = previous.and_then(|p| p.failed_query().map(str::to_string));
                async move {
                    let query = match failed {
                        Some(failed) if attempt > 1 => {
                            tracing::info!(
                                event = "llmao.sql.repair",
                                attempt,
                                failed_query = %failed
                            );
                            self.generator.repair(question, &failed, relevant).await
                        }
                        _ => self.generator.generate(question, relevant).await,
                    }
                    .map_err(|e| QueryError::Generation(e.to_string()))?;
                    let rows = self.execute(&query).await.map_err(|error| {
                        QueryError::Execution {
                            query: query.clone(),
                            error,
                        }
                    })?;
                    Ok::<_, QueryError>((query, rows))
                }
            })
            .await;

        let mut attempts: Vec<SqlAttempt> = outcome
            .failures
            .iter()
            .enumerate()
            .filter_map(|(i, f)| match f {
                QueryError::Execution { query, error } => Some(SqlAttempt {
                    question: question.to_string(),
                    query: query.clone(),
                    attempt_no: i as u32 + 1,
                    outcome: AttemptOutcome::Failed {
                        error: error.clone(),
                    },
                }),
                QueryError::Generation(_) => None,
            })
            .collect();
        if let Ok((query, rows)) = &outcome.result {
            attempts.push(SqlAttempt {
                question: question.to_string(),
                query: query.clone(),
                attempt_no: outcome.attempts,
                outcome: AttemptOutcome::Rows { rows: rows.clone() },
            });
        }
        (attempts, outcome.result)
    }

    /// The store is synchronous; statements run on the blocking pool.
    async fn execute(&self, query: &str) -> Result<QueryRows, ExecutionError> {
        check_not_empty(query)?;
        let store = Arc::clone(&self.store);
        let sql = query.to_string();
        tokio::task::spawn_blocking(move || store.execute(&sql))
            .await
            .map_err(|e| {
                ExecutionError::new(
                    ExecutionErrorKind::Driver,
                    format!("execution task failed: {}", e),
                )
            })?
    }

    async fn score_turn(&mut self, turn: &mut ChatTurn) {
        let Some(evaluator) = self.evaluator.as_mut() else {
            return;
        };
        let Some(record) = turn.to_record() else {
            return;
        };
        match evaluator.evaluate(std::slice::from_ref(&record), false).await {
            Ok(out) => turn.scores = out.sheets().first().cloned(),
            Err(e) => tracing::warn!(event = "llmao.eval.turn_failed", error = %e),
        }
    }

    async fn rate_previous_turn(&self, question: &str, history: &ChatHistory) -> Option<i8> {
        let log = self.ratings.as_ref()?;
        match record_satisfaction(&self.judge, log, question, history).await {
            Ok(rating) => rating,
            Err(e) => {
                tracing::warn!(event = "llmao.satisfaction.failed", error = %format!("{:#}", e));
                None
            }
        }
    }
}

fn classify_query_error(err: &QueryError) -> FailureClass {
    match err {
        QueryError::Execution { error, .. } if error.kind.is_repairable() => {
            FailureClass::Retryable
        }
        _ => FailureClass::Fatal,
    }
}

fn fallback(question: &str, intent: Intent, reason: String) -> ChatTurn {
    ChatTurn {
        question: question.to_string(),
        intent,
        status: TurnStatus::Fallback,
        answer: FALLBACK_MESSAGE.to_string(),
        relevant_schema: None,
        attempts: Vec::new(),
        context: None,
        fallback_reason: Some(reason),
        scores: None,
        satisfaction: None,
    }
}
