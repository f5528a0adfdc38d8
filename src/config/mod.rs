//! Process-wide configuration
//!
//! Loaded once at startup from the environment and layered `.env` files:
//! `.env.{APP_ENV}`, then `.env.local` (not in the test environment), then
//! `.env`. Variables that are already set always win, so earlier files take
//! precedence over later ones.
//!
//! The extraction pipeline never reads this; it only carries settings for the
//! optional LLM providers and the archive search directory.

use once_cell::sync::OnceCell;
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};

static CONFIG: OnceCell<AppConfig> = OnceCell::new();

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Environment {
    Development,
    Production,
    Test,
}

impl Environment {
    pub fn parse(value: &str) -> Self {
        match value.trim().to_ascii_lowercase().as_str() {
            "production" | "prod" => Self::Production,
            "test" => Self::Test,
            _ => Self::Development,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Development => "development",
            Self::Production => "production",
            Self::Test => "test",
        }
    }
}

/// LLM backends, numbered as in `LLM_CHOICE`
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum LlmProvider {
    OpenAi = 1,
    Anthropic = 2,
    DeepSeek = 3,
    LmStudio = 4,
    Ollama = 5,
}

impl LlmProvider {
    pub fn from_choice(choice: &str) -> Option<Self> {
        match choice.trim().parse::<u8>().ok()? {
            1 => Some(Self::OpenAi),
            2 => Some(Self::Anthropic),
            3 => Some(Self::DeepSeek),
            4 => Some(Self::LmStudio),
            5 => Some(Self::Ollama),
            _ => None,
        }
    }
}

/// Connection settings for one provider
#[derive(Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProviderConfig {
    #[serde(skip_serializing)]
    pub api_key: Option<String>,
    pub base_url: String,
    pub model_id: String,
}

impl ProviderConfig {
    pub fn has_api_key(&self) -> bool {
        self.api_key.as_deref().is_some_and(|k| !k.is_empty())
    }
}

impl fmt::Debug for ProviderConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProviderConfig")
            .field("api_key", &self.api_key.as_ref().map(|_| "<redacted>"))
            .field("base_url", &self.base_url)
            .field("model_id", &self.model_id)
            .finish()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct AppConfig {
    pub environment: Environment,
    /// Extra directory searched for archives besides the working directory
    pub data_dir: PathBuf,
    pub llm_provider: LlmProvider,
    pub openai: ProviderConfig,
    pub anthropic: ProviderConfig,
    pub deepseek: ProviderConfig,
    pub lm_studio: ProviderConfig,
    pub ollama: ProviderConfig,
}

impl AppConfig {
    /// Build from the process environment.
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Build from any key lookup, applying defaults for absent keys.
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let get = |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        let llm_provider = match lookup("LLM_CHOICE") {
            Some(choice) => LlmProvider::from_choice(&choice).unwrap_or_else(|| {
                log::warn!("Invalid LLM_CHOICE '{}', using OpenAI", choice);
                LlmProvider::OpenAi
            }),
            None => LlmProvider::OpenAi,
        };

        Self {
            environment: Environment::parse(&get("APP_ENV", "development")),
            data_dir: PathBuf::from(get("EMPOWER_DATA_DIR", ".")),
            llm_provider,
            openai: ProviderConfig {
                api_key: lookup("OPENAI_API_KEY"),
                base_url: get("OPENAI_API_BASE_URL", "https://api.openai.com/v1/"),
                model_id: get("OPENAI_MODEL_ID", "chatgpt-4o-latest"),
            },
            anthropic: ProviderConfig {
                api_key: lookup("ANTHROPIC_API_KEY"),
                base_url: get("ANTHROPIC_API_BASE_URL", "https://api.anthropic.com/v1/"),
                model_id: get("ANTHROPIC_MODEL_ID", "claude-3-5-sonnet-20241022"),
            },
            deepseek: ProviderConfig {
                api_key: lookup("DS_API_KEY"),
                base_url: get("DS_API_BASE_URL", "https://api.deepseek.com/v1"),
                model_id: get("DS_MODEL_ID", "deepseek-reasoner"),
            },
            lm_studio: ProviderConfig {
                api_key: Some(get("LM_API_KEY", "LM_STUDIO_NO_API_KEY")),
                base_url: get("LM_API_BASE_URL", "http://localhost:1234/v1"),
                model_id: get("LM_MODEL_ID", "deepseek-r1-distill-llama-8b"),
            },
            ollama: ProviderConfig {
                api_key: Some(get("OLM_API_KEY", "LM_STUDIO_NO_API_KEY")),
                base_url: get("OLM_API_BASE_URL", "http://localhost:11434/v1"),
                model_id: get("OLM_MODEL_ID", "llama3.2"),
            },
        }
    }

    /// Settings of the selected provider
    pub fn active_provider(&self) -> &ProviderConfig {
        match self.llm_provider {
            LlmProvider::OpenAi => &self.openai,
            LlmProvider::Anthropic => &self.anthropic,
            LlmProvider::DeepSeek => &self.deepseek,
            LlmProvider::LmStudio => &self.lm_studio,
            LlmProvider::Ollama => &self.ollama,
        }
    }
}

/// `.env` files for an environment, in load order.
pub fn env_files(base: &Path, environment: Environment) -> Vec<PathBuf> {
    let mut files = vec![base.join(format!(".env.{}", environment.as_str()))];
    if environment != Environment::Test {
        files.push(base.join(".env.local"));
    }
    files.push(base.join(".env"));
    files
}

/// Load the layered `.env` files found under `base`. Returns the files loaded.
pub fn load_env_files(base: &Path) -> Vec<PathBuf> {
    let environment = Environment::parse(&std::env::var("APP_ENV").unwrap_or_default());

    let mut loaded = Vec::new();
    for path in env_files(base, environment) {
        if !path.is_file() {
            continue;
        }
        match dotenvy::from_path(&path) {
            Ok(()) => {
                log::info!("Loaded environment variables from {}", path.display());
                loaded.push(path);
            }
            Err(e) => log::warn!("Failed to load {}: {}", path.display(), e),
        }
    }

    log::info!("Running in {} environment", environment.as_str());
    loaded
}

/// Load configuration on first call and return the shared instance.
pub fn init() -> &'static AppConfig {
    CONFIG.get_or_init(|| {
        load_env_files(Path::new("."));
        AppConfig::from_env()
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = AppConfig::from_lookup(lookup(&[]));
        assert_eq!(config.environment, Environment::Development);
        assert_eq!(config.data_dir, PathBuf::from("."));
        assert_eq!(config.llm_provider, LlmProvider::OpenAi);
        assert!(!config.openai.has_api_key());
        assert_eq!(config.ollama.model_id, "llama3.2");
    }

    #[test]
    fn test_overrides() {
        let config = AppConfig::from_lookup(lookup(&[
            ("APP_ENV", "Production"),
            ("EMPOWER_DATA_DIR", "/srv/captures"),
            ("LLM_CHOICE", "2"),
            ("ANTHROPIC_API_KEY", "sk-ant-secret"),
        ]));
        assert_eq!(config.environment, Environment::Production);
        assert_eq!(config.data_dir, PathBuf::from("/srv/captures"));
        assert_eq!(config.llm_provider, LlmProvider::Anthropic);
        assert!(config.active_provider().has_api_key());
    }

    #[test]
    fn test_invalid_choice_falls_back() {
        let config = AppConfig::from_lookup(lookup(&[("LLM_CHOICE", "9")]));
        assert_eq!(config.llm_provider, LlmProvider::OpenAi);
    }

    #[test]
    fn test_debug_redacts_keys() {
        let config = AppConfig::from_lookup(lookup(&[("OPENAI_API_KEY", "sk-secret")]));
        let debug = format!("{:?}", config);
        assert!(!debug.contains("sk-secret"));
        assert!(debug.contains("<redacted>"));
    }

    #[test]
    fn test_env_file_order() {
        let base = Path::new("/app");
        assert_eq!(
            env_files(base, Environment::Development),
            vec![
                PathBuf::from("/app/.env.development"),
                PathBuf::from("/app/.env.local"),
                PathBuf::from("/app/.env"),
            ]
        );
        assert_eq!(
            env_files(base, Environment::Test),
            vec![PathBuf::from("/app/.env.test"), PathBuf::from("/app/.env")]
        );
    }
}
