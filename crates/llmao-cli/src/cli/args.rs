use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(
    name = "llmao",
    version,
    about = "Ask questions of the AOP database and score the answers"
)]
pub struct Cli {
    /// Configuration file
    #[arg(long, global = true, env = "LLMAO_CONFIG", default_value = "llmao.yaml")]
    pub config: PathBuf,

    /// Reject unknown configuration keys instead of warning
    #[arg(long, global = true)]
    pub strict: bool,

    /// Emit logs as JSON lines on stderr
    #[arg(long, global = true)]
    pub log_json: bool,

    #[command(subcommand)]
    pub cmd: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Answer one question
    Ask(AskArgs),
    /// Score evaluation records with the given metrics
    Eval(EvalArgs),
    /// Print the table/column catalog of the database
    Catalog,
    /// Generate questions and answers to evaluate later
    Generate(GenerateArgs),
    /// Write a starter configuration file
    Init,
    /// List the known metric names
    Metrics,
}

#[derive(clap::Args, Debug, Clone)]
pub struct AskArgs {
    pub question: String,

    /// Conversation so far (YAML or JSON list of {role, content}); the new
    /// turn is appended to it
    #[arg(long)]
    pub history_file: Option<PathBuf>,

    /// Skip scoring the answer
    #[arg(long)]
    pub no_eval: bool,

    /// Print the whole turn as JSON instead of the answer text
    #[arg(long)]
    pub json: bool,
}

#[derive(clap::Args, Debug, Clone)]
pub struct EvalArgs {
    /// Records file (YAML or JSON list of {question, response, context, truth?})
    #[arg(long)]
    pub records: PathBuf,

    /// Comma-separated metric names
    #[arg(long, value_delimiter = ',', required = true)]
    pub metrics: Vec<String>,

    /// One score sheet per record instead of a single record
    #[arg(long)]
    pub batch: bool,

    /// Also write the report to this file
    #[arg(long)]
    pub out: Option<PathBuf>,
}

#[derive(clap::Args, Debug, Clone)]
pub struct GenerateArgs {
    /// Number of questions
    #[arg(short = 'n', long, default_value_t = 10)]
    pub count: usize,

    /// Output records file
    #[arg(long, default_value = "records.yaml")]
    pub out: PathBuf,
}
