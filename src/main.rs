use clap::Parser;
use maker_wiring::core::ConfigProvider;
use maker_wiring::utils::{logger, validation::Validate};
use maker_wiring::{
    normalize_description, Catalog, CliConfig, NormalizedProject, ProjectEngine, ProjectError,
    RawProjectDescription,
};
use std::sync::Arc;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let config = CliConfig::parse();

    // 初始化日誌
    logger::init_cli_logger(config.verbose);

    tracing::info!("Starting maker-wiring CLI");
    if config.verbose {
        tracing::debug!("CLI config: {:?}", config);
    }

    // 驗證配置
    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    match run(&config).await {
        Ok(project) => {
            tracing::info!(
                "✅ Project '{}' ready ({} components)",
                project.name,
                project.components.len()
            );
            println!("{}", serde_json::to_string_pretty(&project)?);
        }
        Err(e) => {
            tracing::error!(
                "❌ Project build failed: {} (Category: {:?}, Severity: {:?})",
                e,
                e.category(),
                e.severity()
            );
            tracing::error!("💡 Recovery suggestion: {}", e.recovery_suggestion());

            eprintln!("❌ {}", e.user_friendly_message());
            eprintln!("💡 建議: {}", e.recovery_suggestion());
            std::process::exit(e.severity().exit_code());
        }
    }

    Ok(())
}

async fn run(config: &CliConfig) -> Result<NormalizedProject, ProjectError> {
    if let Some(raw_input) = &config.raw_input {
        tracing::info!("📂 Normalizing saved response from: {}", raw_input);
        let content = tokio::fs::read_to_string(raw_input).await?;
        let raw = RawProjectDescription::from_json_str(&content)?;
        return normalize_description(raw, config.normalize_mode());
    }

    let catalog = match &config.catalog {
        Some(path) => {
            tracing::info!("📚 Loading component catalog from: {}", path);
            Arc::new(Catalog::from_file(path)?)
        }
        None => Catalog::builtin(),
    };

    let engine = ProjectEngine::from_config(config, catalog)?;
    engine.build_project(&config.materials).await
}
