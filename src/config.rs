//! Configuration types and loading

use eyre::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Main configuration
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// LLM provider configuration
    pub llm: LlmConfig,

    /// State and prompt storage
    pub storage: StorageConfig,

    /// Orchestrator behavior knobs
    pub orchestrator: OrchestratorConfig,
}

impl Config {
    /// Load configuration with fallback chain: explicit path, then
    /// `.helmsman.yml` in the working directory, then the user config dir.
    pub fn load(config_path: Option<&PathBuf>) -> Result<Self> {
        if let Some(path) = config_path {
            return Self::load_from_file(path)
                .context(format!("Failed to load config from {}", path.display()));
        }

        let local_config = PathBuf::from(".helmsman.yml");
        if local_config.exists() {
            match Self::load_from_file(&local_config) {
                Ok(config) => return Ok(config),
                Err(e) => {
                    tracing::warn!("Failed to load config from {}: {}", local_config.display(), e);
                }
            }
        }

        if let Some(config_dir) = dirs::config_dir() {
            let user_config = config_dir.join("helmsman").join("helmsman.yml");
            if user_config.exists() {
                match Self::load_from_file(&user_config) {
                    Ok(config) => return Ok(config),
                    Err(e) => {
                        tracing::warn!("Failed to load config from {}: {}", user_config.display(), e);
                    }
                }
            }
        }

        tracing::info!("No config file found, using defaults");
        Ok(Self::default())
    }

    fn load_from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = fs::read_to_string(&path).context("Failed to read config file")?;
        let config: Self = serde_yaml::from_str(&content).context("Failed to parse config file")?;
        tracing::info!("Loaded config from: {}", path.as_ref().display());
        Ok(config)
    }
}

/// LLM provider configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LlmConfig {
    /// Provider name (currently only "anthropic" supported)
    pub provider: String,

    /// Model identifier
    pub model: String,

    /// Environment variable containing the API key
    #[serde(rename = "api-key-env")]
    pub api_key_env: String,

    /// API base URL
    #[serde(rename = "base-url")]
    pub base_url: String,

    /// Maximum tokens per response
    #[serde(rename = "max-tokens")]
    pub max_tokens: u32,

    /// Request timeout in milliseconds
    #[serde(rename = "timeout-ms")]
    pub timeout_ms: u64,
}

impl Default for LlmConfig {
    fn default() -> Self {
        Self {
            provider: "anthropic".to_string(),
            model: "claude-sonnet-4-20250514".to_string(),
            api_key_env: "ANTHROPIC_API_KEY".to_string(),
            base_url: "https://api.anthropic.com".to_string(),
            max_tokens: 8192,
            timeout_ms: 300_000,
        }
    }
}

/// Which prompt style the planner uses while scoping.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum PlannerMode {
    /// One focused question per turn, chosen by the model
    #[default]
    Conversation,
    /// Walk the required fields in a fixed order
    Checklist,
}

/// Orchestrator behavior knobs
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct OrchestratorConfig {
    /// Gate execution start behind an explicit approval
    #[serde(rename = "require-execution-approval")]
    pub require_execution_approval: bool,

    /// Gate retries of failed tasks behind an explicit approval
    #[serde(rename = "require-retry-approval")]
    pub require_retry_approval: bool,

    /// Planner prompt mode while scoping
    #[serde(rename = "planner-mode")]
    pub planner_mode: PlannerMode,

    /// Shell command for the executor backend; receives the task envelope
    /// on stdin and answers on stdout
    #[serde(rename = "executor-command")]
    pub executor_command: String,
}

impl Default for OrchestratorConfig {
    fn default() -> Self {
        Self {
            require_execution_approval: false,
            require_retry_approval: true,
            planner_mode: PlannerMode::default(),
            executor_command: "helmsman-executor".to_string(),
        }
    }
}

/// State and prompt storage
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    /// Path of the project state document
    #[serde(rename = "state-file")]
    pub state_file: PathBuf,

    /// Optional directory of prompt template overrides
    #[serde(rename = "prompts-dir")]
    pub prompts_dir: Option<PathBuf>,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            state_file: PathBuf::from(".helmsman/state.json"),
            prompts_dir: None,
        }
    }
}

impl Config {
    /// Settings derived from config, used when creating a project.
    pub fn settings(&self) -> crate::domain::Settings {
        crate::domain::Settings {
            require_execution_approval: self.orchestrator.require_execution_approval,
            require_retry_approval: self.orchestrator.require_retry_approval,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert_eq!(config.llm.provider, "anthropic");
        assert_eq!(config.orchestrator.planner_mode, PlannerMode::Conversation);
        assert!(!config.orchestrator.require_execution_approval);
        assert!(config.orchestrator.require_retry_approval);
    }

    #[test]
    fn test_deserialize_config() {
        let yaml = r#"
llm:
  model: claude-opus-4
  api-key-env: MY_API_KEY
  max-tokens: 4096

orchestrator:
  require-execution-approval: true
  planner-mode: checklist
  executor-command: "cargo run -p worker"

storage:
  state-file: /tmp/proj/state.json
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.llm.model, "claude-opus-4");
        assert_eq!(config.llm.api_key_env, "MY_API_KEY");
        assert_eq!(config.llm.max_tokens, 4096);
        assert!(config.orchestrator.require_execution_approval);
        assert_eq!(config.orchestrator.planner_mode, PlannerMode::Checklist);
        assert_eq!(config.orchestrator.executor_command, "cargo run -p worker");
        assert_eq!(config.storage.state_file, PathBuf::from("/tmp/proj/state.json"));
    }

    #[test]
    fn test_partial_config_uses_defaults() {
        let yaml = r#"
llm:
  model: claude-haiku
"#;
        let config: Config = serde_yaml::from_str(yaml).unwrap();

        assert_eq!(config.llm.model, "claude-haiku");
        assert_eq!(config.llm.provider, "anthropic");
        assert_eq!(config.orchestrator.planner_mode, PlannerMode::Conversation);
        assert!(config.storage.prompts_dir.is_none());
    }

    #[test]
    fn test_settings_mirror_orchestrator_config() {
        let mut config = Config::default();
        config.orchestrator.require_execution_approval = true;
        config.orchestrator.require_retry_approval = false;

        let settings = config.settings();
        assert!(settings.require_execution_approval);
        assert!(!settings.require_retry_approval);
    }
}
