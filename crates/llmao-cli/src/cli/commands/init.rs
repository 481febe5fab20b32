use super::exit_codes;
use llmao_core::config::write_sample_config;
use std::path::Path;

pub fn run(path: &Path) -> anyhow::Result<i32> {
    write_sample_config(path)?;
    eprintln!("wrote {}", path.display());
    Ok(exit_codes::OK)
}
