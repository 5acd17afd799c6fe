use crate::adapters::cohere::{DEFAULT_ENDPOINT, DEFAULT_MODEL};
use crate::core::normalizer::NormalizeMode;
use crate::core::ConfigProvider;
use crate::utils::error::Result;
use crate::utils::validation::{self, Validate};
use clap::Parser;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "maker-wiring")]
#[command(about = "Suggest a hobby electronics project and normalize its wiring")]
pub struct CliConfig {
    /// Available components, comma separated. Repeat a name for multiple units.
    #[arg(long, value_delimiter = ',')]
    pub materials: Vec<String>,

    #[arg(long, default_value = DEFAULT_ENDPOINT)]
    pub api_endpoint: String,

    #[arg(long, default_value = DEFAULT_MODEL)]
    pub model: String,

    #[serde(skip_serializing)]
    #[arg(long, env = "COHERE_API_KEY", default_value = "", hide_env_values = true)]
    pub api_key: String,

    #[arg(long, default_value = "60")]
    pub timeout_seconds: u64,

    #[arg(long, default_value = "1")]
    pub max_tool_rounds: u32,

    #[arg(long, help = "Skip malformed connections instead of failing")]
    pub lenient: bool,

    /// TOML component catalog replacing the built-in one
    #[arg(long)]
    pub catalog: Option<String>,

    /// Normalize a saved model response (JSON) instead of querying the model
    #[arg(long)]
    pub raw_input: Option<String>,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl ConfigProvider for CliConfig {
    fn model_endpoint(&self) -> &str {
        &self.api_endpoint
    }

    fn model_name(&self) -> &str {
        &self.model
    }

    fn api_key(&self) -> &str {
        &self.api_key
    }

    fn request_timeout_secs(&self) -> u64 {
        self.timeout_seconds
    }

    fn max_tool_rounds(&self) -> u32 {
        self.max_tool_rounds
    }

    fn normalize_mode(&self) -> NormalizeMode {
        if self.lenient {
            NormalizeMode::Lenient
        } else {
            NormalizeMode::Strict
        }
    }
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        if let Some(catalog) = &self.catalog {
            validation::validate_path("catalog", catalog)?;
        }

        // 離線模式不需要模型設定
        if let Some(raw_input) = &self.raw_input {
            return validation::validate_path("raw_input", raw_input);
        }

        if self.materials.is_empty() {
            tracing::warn!("⚠️ No materials given, the model will get a degenerate prompt");
        }

        validation::validate_model_settings(
            &self.api_endpoint,
            &self.model,
            self.timeout_seconds,
            self.max_tool_rounds,
        )?;
        validation::validate_non_empty_string("api_key", &self.api_key)
    }
}
