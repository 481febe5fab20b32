use crate::cli::args::{Cli, Command};
use llmao_core::catalog::SchemaCatalog;
use llmao_core::config::{load_config, AppConfig};
use llmao_core::embeddings::Similarity;
use llmao_core::engine::{ChatPipeline, Evaluator};
use llmao_core::errors::{ConfigError, EvalInputError};
use llmao_core::judge::StructuredJudge;
use llmao_core::metrics_api::MetricContext;
use llmao_core::providers::{build_embedder, build_llm_client};
use llmao_core::storage::ratings::RatingLog;
use llmao_core::storage::{SqlStore, SqliteStore};
use std::sync::Arc;

pub mod ask;
pub mod catalog;
pub mod eval;
pub mod generate;
pub mod init;
pub mod metrics;

pub mod exit_codes {
    pub const OK: i32 = 0;
    /// The answer fell back, or a metric produced no score.
    pub const DEGRADED: i32 = 1;
    pub const CONFIG_ERROR: i32 = 2;
}

pub async fn dispatch(cli: Cli) -> anyhow::Result<i32> {
    match cli.cmd {
        Command::Init => {
            crate::init_logging(&env_log_level(), cli.log_json);
            init::run(&cli.config).or_else(input_error_code)
        }
        Command::Metrics => {
            crate::init_logging(&env_log_level(), cli.log_json);
            metrics::run()
        }
        cmd => {
            let loaded = match load_config(&cli.config, cli.strict) {
                Ok(l) => l,
                Err(e) => {
                    eprintln!("config error: {}", e);
                    if !cli.config.exists() {
                        eprintln!("hint: run `llmao init` to create {}", cli.config.display());
                    }
                    return Ok(exit_codes::CONFIG_ERROR);
                }
            };
            let mut cfg = loaded.config;
            cfg.apply_env();
            crate::init_logging(&cfg.log_level, cli.log_json);
            for key in &loaded.ignored_keys {
                tracing::warn!(event = "llmao.config.unknown_key", key = %key, "ignored unknown config field");
            }

            let result = match cmd {
                Command::Ask(args) => ask::run(args, &cfg).await,
                Command::Eval(args) => eval::run(args, &cfg).await,
                Command::Catalog => catalog::run(&cfg),
                Command::Generate(args) => generate::run(args, &cfg).await,
                Command::Init | Command::Metrics => Ok(exit_codes::OK),
            };
            result.or_else(input_error_code)
        }
    }
}

/// Configuration and input errors become exit code 2 with a one-line
/// message; anything else propagates.
fn input_error_code(err: anyhow::Error) -> anyhow::Result<i32> {
    if err.downcast_ref::<ConfigError>().is_some() || err.downcast_ref::<EvalInputError>().is_some()
    {
        eprintln!("error: {:#}", err);
        return Ok(exit_codes::CONFIG_ERROR);
    }
    Err(err)
}

fn env_log_level() -> String {
    std::env::var("LLMAO_LOG").unwrap_or_else(|_| "info".to_string())
}

pub(crate) fn judge(cfg: &AppConfig) -> anyhow::Result<StructuredJudge> {
    Ok(StructuredJudge::new(build_llm_client(&cfg.judge)?))
}

pub(crate) fn metric_context(cfg: &AppConfig, judge: &StructuredJudge) -> anyhow::Result<MetricContext> {
    Ok(MetricContext {
        judge: judge.clone(),
        similarity: Similarity::new(build_embedder(&cfg.embedder)?),
    })
}

pub(crate) fn catalog(cfg: &AppConfig) -> anyhow::Result<(Arc<dyn SqlStore>, Arc<SchemaCatalog>)> {
    let store: Arc<dyn SqlStore> =
        Arc::new(SqliteStore::new(&cfg.database.path).with_max_rows(cfg.database.max_rows));
    let catalog = SchemaCatalog::load(store.as_ref())
        .map_err(|e| ConfigError(format!("database {}: {:#}", cfg.database.path.display(), e)))?;
    Ok((store, Arc::new(catalog)))
}

/// Pipeline as configured. Turn scoring and rating are opt-in per caller.
pub(crate) fn pipeline(
    cfg: &AppConfig,
    judge: &StructuredJudge,
    evaluate: bool,
    rate: bool,
) -> anyhow::Result<ChatPipeline> {
    let (store, catalog) = catalog(cfg)?;
    let mut pipeline = ChatPipeline::new(judge.clone(), store, catalog)
        .with_limit_hint(cfg.pipeline.limit_hint);
    if evaluate && !cfg.pipeline.evaluate_turns.is_empty() {
        let evaluator = Evaluator::new(
            &cfg.pipeline.evaluate_turns,
            &llmao_metrics::default_metrics(),
            metric_context(cfg, judge)?,
        )?;
        pipeline = pipeline.with_evaluator(evaluator);
    }
    if rate {
        if let Some(path) = &cfg.pipeline.ratings_path {
            pipeline = pipeline.with_ratings(RatingLog::new(path));
        }
    }
    Ok(pipeline)
}
