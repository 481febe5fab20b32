use super::exit_codes;

pub fn run() -> anyhow::Result<i32> {
    for name in llmao_metrics::metric_names() {
        println!("{}", name);
    }
    Ok(exit_codes::OK)
}
