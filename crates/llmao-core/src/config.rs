use crate::errors::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_FILE: &str = "llmao.yaml";
pub const SUPPORTED_CONFIG_VERSION: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    pub version: u32,
    pub database: DatabaseConfig,
    pub judge: JudgeConfig,
    pub embedder: EmbedderConfig,
    pub pipeline: PipelineConfig,
    pub log_level: String,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: SUPPORTED_CONFIG_VERSION,
            database: DatabaseConfig::default(),
            judge: JudgeConfig::default(),
            embedder: EmbedderConfig::default(),
            pipeline: PipelineConfig::default(),
            log_level: "info".to_string(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DatabaseConfig {
    pub path: PathBuf,
    pub max_rows: usize,
}

impl Default for DatabaseConfig {
    fn default() -> Self {
        Self {
            path: PathBuf::from("aop.db"),
            max_rows: crate::storage::sqlite::DEFAULT_MAX_ROWS,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum JudgeProvider {
    OpenAI,
    Anthropic,
    Fake,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct JudgeConfig {
    pub provider: JudgeProvider,
    pub model: String,
    pub temperature: f32,
    pub max_tokens: u32,
    /// Scripted replies for the `fake` provider.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fake_script: Option<PathBuf>,
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl Default for JudgeConfig {
    fn default() -> Self {
        Self {
            provider: JudgeProvider::Anthropic,
            model: "claude-3-sonnet-20240229".to_string(),
            temperature: 0.0,
            max_tokens: 1024,
            fake_script: None,
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EmbedderProvider {
    OpenAI,
    Fake,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct EmbedderConfig {
    pub provider: EmbedderProvider,
    pub model: String,
    /// In-memory cache size; 0 disables the cache.
    pub cache_entries: u64,
    #[serde(skip)]
    pub api_key: Option<String>,
}

impl Default for EmbedderConfig {
    fn default() -> Self {
        Self {
            provider: EmbedderProvider::OpenAI,
            model: "text-embedding-3-small".to_string(),
            cache_entries: 1024,
            api_key: None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PipelineConfig {
    pub limit_hint: usize,
    /// Metrics scored on every answered turn; empty disables turn scoring.
    pub evaluate_turns: Vec<String>,
    pub ratings_path: Option<PathBuf>,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            limit_hint: crate::sql::generator::DEFAULT_LIMIT_HINT,
            evaluate_turns: vec!["faithfulness".to_string(), "answer_relevancy".to_string()],
            ratings_path: Some(PathBuf::from(".llmao/ratings.jsonl")),
        }
    }
}

#[derive(Debug, Clone)]
pub struct LoadedConfig {
    pub config: AppConfig,
    /// Unknown keys tolerated outside strict mode; the caller reports them.
    pub ignored_keys: Vec<String>,
}

pub fn load_config(path: &Path, strict: bool) -> Result<LoadedConfig, ConfigError> {
    let raw = std::fs::read_to_string(path)
        .map_err(|e| ConfigError(format!("failed to read config {}: {}", path.display(), e)))?;
    let mut loaded = parse_config(&raw, strict)
        .map_err(|e| ConfigError(format!("{} (file: {})", e.0, path.display())))?;
    resolve_paths(&mut loaded.config, path);
    Ok(loaded)
}

pub fn parse_config(raw: &str, strict: bool) -> Result<LoadedConfig, ConfigError> {
    let mut ignored_keys = Vec::new();
    let deserializer = serde_yaml::Deserializer::from_str(raw);
    let config: AppConfig = serde_ignored::deserialize(deserializer, |path| {
        ignored_keys.push(path.to_string());
    })
    .map_err(|e| ConfigError(format!("failed to parse YAML: {}", e)))?;

    ignored_keys.retain(|k| !k.starts_with('_') && !k.starts_with("x-"));
    if strict && !ignored_keys.is_empty() {
        return Err(ConfigError(format!(
            "unknown fields detected in strict mode: {:?}",
            ignored_keys
        )));
    }

    if config.version != SUPPORTED_CONFIG_VERSION {
        return Err(ConfigError(format!(
            "unsupported config version {} (supported: {})",
            config.version, SUPPORTED_CONFIG_VERSION
        )));
    }
    if config.database.max_rows == 0 {
        return Err(ConfigError("database.max_rows must be at least 1".into()));
    }

    Ok(LoadedConfig {
        config,
        ignored_keys,
    })
}

/// Relative paths in the file are relative to the file's directory.
fn resolve_paths(cfg: &mut AppConfig, config_path: &Path) {
    let base = config_path.parent().unwrap_or(Path::new("."));
    let resolve = |p: &mut PathBuf| {
        if p.is_relative() {
            *p = base.join(&*p);
        }
    };
    resolve(&mut cfg.database.path);
    if let Some(p) = cfg.judge.fake_script.as_mut() {
        resolve(p);
    }
    if let Some(p) = cfg.pipeline.ratings_path.as_mut() {
        resolve(p);
    }
}

impl AppConfig {
    /// Applies `LLMAO_LOG`, `LLMAO_DB` and the provider API keys. Secrets
    /// are only ever taken from the environment.
    pub fn apply_env(&mut self) {
        self.apply_overrides(|k| std::env::var(k).ok());
    }

    pub fn apply_overrides(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        if let Some(level) = lookup("LLMAO_LOG").filter(|s| !s.is_empty()) {
            self.log_level = level;
        }
        if let Some(db) = lookup("LLMAO_DB").filter(|s| !s.is_empty()) {
            self.database.path = PathBuf::from(db);
        }
        self.judge.api_key = match self.judge.provider {
            JudgeProvider::OpenAI => lookup("OPENAI_API_KEY"),
            JudgeProvider::Anthropic => lookup("ANTHROPIC_API_KEY"),
            JudgeProvider::Fake => None,
        };
        self.embedder.api_key = match self.embedder.provider {
            EmbedderProvider::OpenAI => lookup("OPENAI_API_KEY"),
            EmbedderProvider::Fake => None,
        };
    }
}

pub fn write_sample_config(path: &Path) -> Result<(), ConfigError> {
    if path.exists() {
        return Err(ConfigError(format!(
            "refusing to overwrite existing config {}",
            path.display()
        )));
    }
    std::fs::write(
        path,
        r#"version: 1
log_level: info
database:
  path: aop.db
  max_rows: 200
judge:
  provider: anthropic        # openai | anthropic | fake
  model: claude-3-sonnet-20240229
  temperature: 0.0
  max_tokens: 1024
embedder:
  provider: openai           # openai | fake
  model: text-embedding-3-small
  cache_entries: 1024
pipeline:
  limit_hint: 5
  evaluate_turns: [faithfulness, answer_relevancy]
  ratings_path: .llmao/ratings.jsonl
"#,
    )
    .map_err(|e| ConfigError(format!("failed to write sample config: {}", e)))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sample_config_parses_strictly() -> anyhow::Result<()> {
        let dir = tempfile::tempdir()?;
        let path = dir.path().join(DEFAULT_CONFIG_FILE);
        write_sample_config(&path)?;
        let loaded = load_config(&path, true)?;
        assert!(loaded.ignored_keys.is_empty());
        assert_eq!(loaded.config.judge.provider, JudgeProvider::Anthropic);
        assert_eq!(loaded.config.database.path, dir.path().join("aop.db"));
        assert!(write_sample_config(&path).is_err());
        Ok(())
    }

    #[test]
    fn unknown_keys_warn_or_fail() {
        let raw = "version: 1\ndatabase:\n  paht: x.db\nx-anchor: 1\n";
        let loaded = parse_config(raw, false).unwrap();
        assert_eq!(loaded.ignored_keys, vec!["database.paht".to_string()]);
        let err = parse_config(raw, true).unwrap_err();
        assert!(err.0.contains("database.paht"));
    }

    #[test]
    fn defaults_fill_missing_sections() {
        let loaded = parse_config("version: 1\n", true).unwrap();
        assert_eq!(loaded.config.pipeline.limit_hint, 5);
        assert_eq!(
            loaded.config.pipeline.evaluate_turns,
            vec!["faithfulness", "answer_relevancy"]
        );
        assert_eq!(loaded.config.database.max_rows, 200);
    }

    #[test]
    fn bad_version_rejected() {
        assert!(parse_config("version: 7\n", false).is_err());
    }

    #[test]
    fn env_overrides() {
        let mut cfg = AppConfig::default();
        cfg.judge.provider = JudgeProvider::OpenAI;
        cfg.apply_overrides(|k| match k {
            "LLMAO_DB" => Some("/tmp/other.db".to_string()),
            "OPENAI_API_KEY" => Some("sk-test".to_string()),
            _ => None,
        });
        assert_eq!(cfg.database.path, PathBuf::from("/tmp/other.db"));
        assert_eq!(cfg.judge.api_key.as_deref(), Some("sk-test"));
        assert_eq!(cfg.embedder.api_key.as_deref(), Some("sk-test"));
        assert_eq!(cfg.log_level, "info");
    }
}
