use super::exit_codes;
use crate::cli::args::GenerateArgs;
use anyhow::Context;
use llmao_core::config::AppConfig;
use llmao_core::engine::dataset::generate_dataset;

pub async fn run(args: GenerateArgs, cfg: &AppConfig) -> anyhow::Result<i32> {
    let judge = super::judge(cfg)?;
    let mut pipeline = super::pipeline(cfg, &judge, false, false)?;

    let records = generate_dataset(&judge, &mut pipeline, args.count).await?;
    std::fs::write(&args.out, serde_yaml::to_string(&records)?)
        .with_context(|| format!("failed to write {}", args.out.display()))?;
    eprintln!("wrote {} records to {}", records.len(), args.out.display());

    Ok(if records.len() == args.count {
        exit_codes::OK
    } else {
        exit_codes::DEGRADED
    })
}
