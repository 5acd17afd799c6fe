use clap::Parser;
use maker_wiring::config::toml_config::{LogFormat, TomlConfig};
use maker_wiring::core::query::{build_materials_query, system_prompt};
use maker_wiring::core::ConfigProvider;
use maker_wiring::utils::{logger, validation::Validate};
use maker_wiring::{Catalog, NormalizeMode, ProjectEngine, Toolbox};
use std::sync::Arc;

#[derive(Parser)]
#[command(name = "toml-project")]
#[command(about = "Project suggestion tool with TOML configuration support")]
struct Args {
    /// Path to TOML configuration file
    #[arg(short, long, default_value = "maker-wiring.toml")]
    config: String,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,

    /// Override the materials from config (comma separated)
    #[arg(long, value_delimiter = ',')]
    materials: Option<Vec<String>>,

    /// Override normalizer mode from config
    #[arg(long)]
    lenient: Option<bool>,

    /// Dry run - show the prompt and tools without calling the model
    #[arg(long)]
    dry_run: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    let mut config = match TomlConfig::from_file(&args.config) {
        Ok(config) => config,
        Err(e) => {
            eprintln!("❌ Failed to load config file '{}': {}", args.config, e);
            eprintln!("💡 Make sure the file exists and is valid TOML format");
            std::process::exit(1);
        }
    };

    // 初始化日誌
    let verbose = args.verbose || config.verbose();
    match config.log_format() {
        LogFormat::Json => logger::init_json_logger(verbose),
        LogFormat::Compact => logger::init_cli_logger(verbose),
    }

    tracing::info!("🚀 Starting TOML-based project tool");
    tracing::info!("📁 Loaded configuration from: {}", args.config);

    // 應用命令列覆蓋設定
    if let Some(materials) = args.materials.clone() {
        tracing::info!("🔧 Materials overridden to: {}", materials.join(", "));
        config.project.materials = materials;
    }
    if let Some(lenient) = args.lenient {
        let mode = if lenient {
            NormalizeMode::Lenient
        } else {
            NormalizeMode::Strict
        };
        tracing::info!("🔧 Normalizer mode overridden to: {:?}", mode);
        config.normalizer = Some(maker_wiring::config::toml_config::NormalizerConfig { mode: Some(mode) });
    }

    if let Err(e) = config.validate() {
        tracing::error!("❌ Configuration validation failed: {}", e);
        tracing::error!("💡 Suggestion: {}", e.recovery_suggestion());
        eprintln!("❌ {}", e.user_friendly_message());
        std::process::exit(1);
    }

    let catalog = match config.catalog_path() {
        Some(path) => match Catalog::from_file(path) {
            Ok(catalog) => Arc::new(catalog),
            Err(e) => {
                eprintln!("❌ {}", e.user_friendly_message());
                std::process::exit(e.severity().exit_code());
            }
        },
        None => Catalog::builtin(),
    };

    display_config_summary(&config, &catalog, &args);

    if args.dry_run {
        tracing::info!("🔍 DRY RUN MODE - the model will not be called");
        perform_dry_run(&config, catalog)?;
        return Ok(());
    }

    let engine = ProjectEngine::from_config(&config, catalog)?;
    match engine.build_project(config.materials()).await {
        Ok(project) => {
            tracing::info!("✅ Project '{}' ready", project.name);
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

fn display_config_summary(config: &TomlConfig, catalog: &Catalog, args: &Args) {
    eprintln!("📋 Configuration Summary:");
    eprintln!("  Materials: {}", config.materials().join(", "));
    eprintln!("  Model: {} @ {}", config.model_name(), config.model_endpoint());
    eprintln!("  Tool rounds: {}", config.max_tool_rounds());
    eprintln!("  Normalizer: {:?}", config.normalize_mode());
    eprintln!("  Catalog: {} components", catalog.len());

    if args.dry_run {
        eprintln!("  🔍 DRY RUN MODE ENABLED");
    }

    eprintln!();
}

fn perform_dry_run(config: &TomlConfig, catalog: Arc<Catalog>) -> anyhow::Result<()> {
    let missing = catalog.missing_components(config.materials());
    let toolbox = Toolbox::new(catalog);

    println!("🗣️ System prompt:");
    println!("{}", system_prompt(config.personality()));
    println!();
    println!("🙋 User query:");
    println!("{}", build_materials_query(config.materials()));
    println!();

    println!("🔧 Tools offered to the model:");
    for definition in toolbox.definitions() {
        println!("  {} - {}", definition.function.name, definition.function.description);
    }

    if !missing.is_empty() {
        println!();
        println!("⚠️ Not in catalog (passed through as-is): {}", missing.join(", "));
    }

    println!();
    println!("✅ Dry run complete.");
    Ok(())
}
