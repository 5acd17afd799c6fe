use crate::adapters::cohere::{DEFAULT_ENDPOINT, DEFAULT_MODEL};
use crate::core::normalizer::NormalizeMode;
use crate::core::ConfigProvider;
use crate::utils::error::{ProjectError, Result};
use crate::utils::validation::{self, Validate};
use serde::{Deserialize, Serialize};
use std::path::Path;

const DEFAULT_TIMEOUT_SECS: u64 = 60;
const DEFAULT_TOOL_ROUNDS: u32 = 1;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TomlConfig {
    pub project: ProjectConfig,
    #[serde(default)]
    pub model: ModelConfig,
    pub prompt: Option<PromptConfig>,
    pub normalizer: Option<NormalizerConfig>,
    pub catalog: Option<CatalogConfig>,
    pub logging: Option<LoggingConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectConfig {
    pub materials: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ModelConfig {
    pub endpoint: Option<String>,
    pub name: Option<String>,
    pub api_key: Option<String>,
    pub timeout_seconds: Option<u64>,
    pub max_tool_rounds: Option<u32>,
    pub json_response_format: Option<bool>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PromptConfig {
    pub personality: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NormalizerConfig {
    pub mode: Option<NormalizeMode>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CatalogConfig {
    pub path: String,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoggingConfig {
    pub format: Option<LogFormat>,
    pub verbose: Option<bool>,
}

impl TomlConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(ProjectError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| ProjectError::ConfigValidationError {
            field: "toml_parsing".to_string(),
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${COHERE_API_KEY})，未設定的保留原樣
    fn substitute_env_vars(content: &str) -> Result<String> {
        use regex::Regex;
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| ProjectError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn validate_config(&self) -> Result<()> {
        if self.project.materials.is_empty() {
            tracing::warn!("⚠️ project.materials is empty, the model will get a degenerate prompt");
        }

        validation::validate_model_settings(
            self.model_endpoint(),
            self.model_name(),
            self.request_timeout_secs(),
            self.max_tool_rounds(),
        )?;

        let api_key = validation::validate_required_field("model.api_key", &self.model.api_key)?;
        validation::validate_non_empty_string("model.api_key", api_key)?;
        if api_key.starts_with("${") {
            return Err(ProjectError::ConfigValidationError {
                field: "model.api_key".to_string(),
                message: format!("environment variable {} is not set", api_key),
            });
        }

        if let Some(catalog) = &self.catalog {
            validation::validate_path("catalog.path", &catalog.path)?;
        }

        Ok(())
    }

    pub fn materials(&self) -> &[String] {
        &self.project.materials
    }

    pub fn catalog_path(&self) -> Option<&str> {
        self.catalog.as_ref().map(|c| c.path.as_str())
    }

    pub fn log_format(&self) -> LogFormat {
        self.logging
            .as_ref()
            .and_then(|l| l.format)
            .unwrap_or_default()
    }

    pub fn verbose(&self) -> bool {
        self.logging
            .as_ref()
            .and_then(|l| l.verbose)
            .unwrap_or(false)
    }
}

impl ConfigProvider for TomlConfig {
    fn model_endpoint(&self) -> &str {
        self.model.endpoint.as_deref().unwrap_or(DEFAULT_ENDPOINT)
    }

    fn model_name(&self) -> &str {
        self.model.name.as_deref().unwrap_or(DEFAULT_MODEL)
    }

    fn api_key(&self) -> &str {
        self.model.api_key.as_deref().unwrap_or("")
    }

    fn request_timeout_secs(&self) -> u64 {
        self.model.timeout_seconds.unwrap_or(DEFAULT_TIMEOUT_SECS)
    }

    fn max_tool_rounds(&self) -> u32 {
        self.model.max_tool_rounds.unwrap_or(DEFAULT_TOOL_ROUNDS)
    }

    fn normalize_mode(&self) -> NormalizeMode {
        self.normalizer
            .as_ref()
            .and_then(|n| n.mode)
            .unwrap_or_default()
    }

    fn json_response_format(&self) -> bool {
        self.model.json_response_format.unwrap_or(true)
    }

    fn personality(&self) -> Option<&str> {
        self.prompt.as_ref().and_then(|p| p.personality.as_deref())
    }
}

impl Validate for TomlConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    #[test]
    fn test_parse_full_toml_config() {
        let toml_content = r#"
[project]
materials = ["Arduino Nano", "L298N Motor Driver", "DC Motor", "DC Motor", "9V Battery"]

[model]
endpoint = "https://api.example.com"
name = "command-a"
api_key = "secret"
timeout_seconds = 30
max_tool_rounds = 2
json_response_format = false

[prompt]
personality = "Be calm."

[normalizer]
mode = "lenient"

[catalog]
path = "./catalog.toml"

[logging]
format = "json"
verbose = true
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.materials().len(), 5);
        assert_eq!(config.model_endpoint(), "https://api.example.com");
        assert_eq!(config.model_name(), "command-a");
        assert_eq!(config.request_timeout_secs(), 30);
        assert_eq!(config.max_tool_rounds(), 2);
        assert!(!config.json_response_format());
        assert_eq!(config.personality(), Some("Be calm."));
        assert_eq!(config.normalize_mode(), NormalizeMode::Lenient);
        assert_eq!(config.catalog_path(), Some("./catalog.toml"));
        assert_eq!(config.log_format(), LogFormat::Json);
        assert!(config.verbose());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_defaults() {
        let toml_content = r#"
[project]
materials = ["DC Motor"]

[model]
api_key = "secret"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();

        assert_eq!(config.model_endpoint(), DEFAULT_ENDPOINT);
        assert_eq!(config.model_name(), DEFAULT_MODEL);
        assert_eq!(config.max_tool_rounds(), 1);
        assert_eq!(config.normalize_mode(), NormalizeMode::Strict);
        assert_eq!(config.log_format(), LogFormat::Compact);
        assert!(config.json_response_format());
        assert!(config.validate().is_ok());
    }

    #[test]
    fn test_env_var_substitution() {
        std::env::set_var("MAKER_WIRING_TEST_KEY", "from-env");

        let toml_content = r#"
[project]
materials = ["DC Motor"]

[model]
api_key = "${MAKER_WIRING_TEST_KEY}"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        assert_eq!(config.api_key(), "from-env");

        std::env::remove_var("MAKER_WIRING_TEST_KEY");
    }

    #[test]
    fn test_unset_env_var_fails_validation() {
        let toml_content = r#"
[project]
materials = ["DC Motor"]

[model]
api_key = "${MAKER_WIRING_UNSET_VARIABLE}"
"#;

        let config = TomlConfig::from_toml_str(toml_content).unwrap();
        let err = config.validate().unwrap_err();
        assert!(matches!(err, ProjectError::ConfigValidationError { ref field, .. } if field == "model.api_key"));
    }

    #[test]
    fn test_missing_api_key_and_bad_values() {
        let missing_key = TomlConfig::from_toml_str("[project]\nmaterials = []\n").unwrap();
        assert!(matches!(
            missing_key.validate(),
            Err(ProjectError::MissingConfigError { .. })
        ));

        let bad_rounds = TomlConfig::from_toml_str(
            "[project]\nmaterials = []\n[model]\napi_key = \"k\"\nmax_tool_rounds = 50\n",
        )
        .unwrap();
        assert!(bad_rounds.validate().is_err());

        let bad_mode =
            TomlConfig::from_toml_str("[project]\nmaterials = []\n[normalizer]\nmode = \"loose\"\n");
        assert!(bad_mode.is_err());
    }

    #[test]
    fn test_config_from_file() {
        let mut temp_file = NamedTempFile::new().unwrap();
        temp_file
            .write_all(b"[project]\nmaterials = [\"9V Battery\"]\n[model]\napi_key = \"k\"\n")
            .unwrap();

        let config = TomlConfig::from_file(temp_file.path()).unwrap();
        assert_eq!(config.materials(), ["9V Battery".to_string()]);
    }
}
