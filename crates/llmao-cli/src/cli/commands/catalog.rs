use super::exit_codes;
use llmao_core::config::AppConfig;

pub fn run(cfg: &AppConfig) -> anyhow::Result<i32> {
    let (_store, catalog) = super::catalog(cfg)?;
    println!("{}", serde_json::to_string_pretty(catalog.as_ref())?);
    Ok(exit_codes::OK)
}
