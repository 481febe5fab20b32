use super::exit_codes;
use crate::cli::args::AskArgs;
use anyhow::Context;
use llmao_core::config::AppConfig;
use llmao_core::model::{ChatHistory, ChatMessage, TurnStatus};
use std::path::Path;

pub async fn run(args: AskArgs, cfg: &AppConfig) -> anyhow::Result<i32> {
    let judge = super::judge(cfg)?;
    let mut pipeline = super::pipeline(cfg, &judge, !args.no_eval, true)?;

    let mut history = match &args.history_file {
        Some(path) => read_history(path)?,
        None => ChatHistory::default(),
    };

    let turn = pipeline.answer(&args.question, &history).await;

    if args.json {
        println!("{}", serde_json::to_string_pretty(&turn)?);
    } else {
        println!("{}", turn.answer);
        if let Some(scores) = &turn.scores {
            eprintln!("scores: {}", serde_json::to_string(scores)?);
        }
        if let Some(reason) = &turn.fallback_reason {
            eprintln!("fallback: {}", reason);
        }
    }

    if let Some(path) = &args.history_file {
        history.push(ChatMessage::human(args.question.clone()));
        history.push(ChatMessage::ai(turn.answer.clone()));
        let yaml = serde_yaml::to_string(&history)?;
        std::fs::write(path, yaml)
            .with_context(|| format!("failed to write history {}", path.display()))?;
    }

    Ok(match turn.status {
        TurnStatus::Fallback => exit_codes::DEGRADED,
        TurnStatus::Answered | TurnStatus::General => exit_codes::OK,
    })
}

fn read_history(path: &Path) -> anyhow::Result<ChatHistory> {
    let raw = match std::fs::read_to_string(path) {
        Ok(s) => s,
        Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(ChatHistory::default()),
        Err(e) => {
            return Err(e).with_context(|| format!("failed to read history {}", path.display()))
        }
    };
    if raw.trim().is_empty() {
        return Ok(ChatHistory::default());
    }
    serde_yaml::from_str(&raw).with_context(|| format!("invalid history file {}", path.display()))
}
