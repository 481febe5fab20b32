use crate::config::{EmbedderConfig, EmbedderProvider, JudgeConfig, JudgeProvider};
use crate::errors::ConfigError;
use embedder::cached::CachedEmbedder;
use embedder::fake::FakeEmbedder;
use embedder::openai::OpenAIEmbedder;
use embedder::Embedder;
use llm::anthropic::AnthropicClient;
use llm::fake::{FakeClient, FakeScript};
use llm::openai::OpenAIClient;
use llm::LlmClient;
use std::sync::Arc;

pub mod embedder;
pub mod llm;

pub fn build_llm_client(cfg: &JudgeConfig) -> Result<Arc<dyn LlmClient>, ConfigError> {
    let client: Arc<dyn LlmClient> = match cfg.provider {
        JudgeProvider::OpenAI => Arc::new(OpenAIClient::new(
            cfg.model.clone(),
            require_key(&cfg.api_key, "OPENAI_API_KEY")?,
            cfg.temperature,
            cfg.max_tokens,
        )),
        JudgeProvider::Anthropic => Arc::new(AnthropicClient::new(
            cfg.model.clone(),
            require_key(&cfg.api_key, "ANTHROPIC_API_KEY")?,
            cfg.temperature,
            cfg.max_tokens,
        )),
        JudgeProvider::Fake => {
            let script = match &cfg.fake_script {
                Some(path) => {
                    let raw = std::fs::read_to_string(path).map_err(|e| {
                        ConfigError(format!(
                            "failed to read fake script {}: {}",
                            path.display(),
                            e
                        ))
                    })?;
                    serde_yaml::from_str::<FakeScript>(&raw).map_err(|e| {
                        ConfigError(format!(
                            "failed to parse fake script {}: {}",
                            path.display(),
                            e
                        ))
                    })?
                }
                None => FakeScript::default(),
            };
            Arc::new(FakeClient::from_script(script))
        }
    };
    tracing::debug!(
        event = "llmao.providers.judge",
        provider = client.provider_name(),
        model = %cfg.model
    );
    Ok(client)
}

pub fn build_embedder(cfg: &EmbedderConfig) -> Result<Arc<dyn Embedder>, ConfigError> {
    let inner: Arc<dyn Embedder> = match cfg.provider {
        EmbedderProvider::OpenAI => Arc::new(OpenAIEmbedder::new(
            cfg.model.clone(),
            require_key(&cfg.api_key, "OPENAI_API_KEY")?,
        )),
        EmbedderProvider::Fake => Arc::new(FakeEmbedder::default()),
    };
    if cfg.cache_entries == 0 {
        return Ok(inner);
    }
    Ok(Arc::new(CachedEmbedder::new(inner, cfg.cache_entries)))
}

fn require_key(key: &Option<String>, var: &str) -> Result<String, ConfigError> {
    match key {
        Some(k) if !k.trim().is_empty() => Ok(k.clone()),
        _ => Err(ConfigError(format!("{} is not set", var))),
    }
}
