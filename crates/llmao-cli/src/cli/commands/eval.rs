use super::exit_codes;
use crate::cli::args::EvalArgs;
use anyhow::Context;
use llmao_core::config::AppConfig;
use llmao_core::engine::Evaluator;
use llmao_core::model::EvaluationRecord;
use serde_json::json;

pub async fn run(args: EvalArgs, cfg: &AppConfig) -> anyhow::Result<i32> {
    let raw = std::fs::read_to_string(&args.records)
        .with_context(|| format!("failed to read records {}", args.records.display()))?;
    // YAML is a superset of JSON, so one parser covers both formats.
    let records: Vec<EvaluationRecord> = serde_yaml::from_str(&raw)
        .with_context(|| format!("invalid records file {}", args.records.display()))?;

    let judge = super::judge(cfg)?;
    let mut evaluator = Evaluator::new(
        &args.metrics,
        &llmao_metrics::default_metrics(),
        super::metric_context(cfg, &judge)?,
    )?;
    let output = evaluator.evaluate(&records, args.batch).await?;
    let average = evaluator.average_score();

    println!("{}", serde_json::to_string_pretty(&output)?);
    match &average {
        Ok(avg) => eprintln!("average: {:.4}", avg),
        Err(e) => eprintln!("average unavailable: {}", e),
    }

    if let Some(out) = &args.out {
        let report = json!({
            "generated_at": chrono::Utc::now().to_rfc3339(),
            "metrics": evaluator.metric_names(),
            "records": records.len(),
            "scores": output,
            "average": average.as_ref().ok(),
        });
        std::fs::write(out, serde_json::to_string_pretty(&report)?)
            .with_context(|| format!("failed to write report {}", out.display()))?;
        tracing::info!(event = "llmao.eval.report_written", path = %out.display());
    }

    Ok(if average.is_ok() {
        exit_codes::OK
    } else {
        exit_codes::DEGRADED
    })
}
