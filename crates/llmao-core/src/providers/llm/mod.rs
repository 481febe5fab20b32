use crate::model::LlmResponse;
use async_trait::async_trait;

/// The language judge: routes tables, writes SQL, answers and scores.
#[async_trait]
pub trait LlmClient: Send + Sync {
    async fn complete(
        &self,
        prompt: &str,
        context: Option<&[String]>,
    ) -> anyhow::Result<LlmResponse>;
    fn provider_name(&self) -> &'static str;
}

pub mod anthropic;
pub mod fake;
pub mod openai;

/// Prompt body with optional context, shared by the HTTP clients.
pub(crate) fn render_prompt(prompt: &str, context: Option<&[String]>) -> String {
    match context {
        Some(ctx) if !ctx.is_empty() => {
            format!("Context:\n{}\n\n{}", ctx.join("\n"), prompt)
        }
        _ => prompt.to_string(),
    }
}
