use crate::adapters::cohere::CohereClient;
use crate::catalog::Catalog;
use crate::core::conversation::ToolCallingClient;
use crate::core::normalizer::{normalize_description, NormalizeMode};
use crate::core::query::build_materials_query;
use crate::core::tools::Toolbox;
use crate::core::{ConfigProvider, ModelClient};
use crate::domain::model::NormalizedProject;
use crate::utils::error::Result;
use std::sync::Arc;
use std::time::Instant;

/// Query -> model -> normalize. Any failure aborts the whole build.
pub struct ProjectEngine<M: ModelClient> {
    client: M,
    toolbox: Toolbox,
    mode: NormalizeMode,
}

impl<M: ModelClient> ProjectEngine<M> {
    pub fn new(client: M) -> Self {
        Self {
            client,
            toolbox: Toolbox::default(),
            mode: NormalizeMode::default(),
        }
    }

    pub fn with_toolbox(mut self, toolbox: Toolbox) -> Self {
        self.toolbox = toolbox;
        self
    }

    pub fn with_mode(mut self, mode: NormalizeMode) -> Self {
        self.mode = mode;
        self
    }

    pub fn mode(&self) -> NormalizeMode {
        self.mode
    }

    pub async fn build_project<S: AsRef<str>>(&self, materials: &[S]) -> Result<NormalizedProject> {
        let started = Instant::now();
        tracing::info!("🚀 Building project from {} materials", materials.len());

        let materials: Vec<String> = materials.iter().map(|m| m.as_ref().to_string()).collect();
        let missing = self.toolbox.catalog().missing_components(&materials);
        if !missing.is_empty() {
            tracing::debug!("Materials without catalog entry: {}", missing.join(", "));
        }

        let query = build_materials_query(&materials);
        tracing::debug!("Materials query: {}", query);

        tracing::info!("📡 Asking the model for a project...");
        let raw = self
            .client
            .fetch_project_description(&query, &self.toolbox)
            .await?;
        tracing::info!(
            "📥 Received '{}' with {} connections",
            raw.name,
            raw.connections.len()
        );

        let project = normalize_description(raw, self.mode)?;
        if !project.skipped_connections.is_empty() {
            tracing::info!(
                "⚠️ Dropped {} malformed connections",
                project.skipped_connections.len()
            );
        }
        tracing::info!(
            "🔌 Normalized wiring: {} components, {} pair-labels",
            project.components.len(),
            project.pair_label_count()
        );
        tracing::debug!("Project built in {:?}", started.elapsed());

        Ok(project)
    }
}

impl ProjectEngine<ToolCallingClient<CohereClient>> {
    /// Engine talking to the Cohere chat API with the given catalog as tools.
    pub fn from_config<C: ConfigProvider + ?Sized>(config: &C, catalog: Arc<Catalog>) -> Result<Self> {
        let transport = CohereClient::from_config(config)?;
        let client = ToolCallingClient::new(transport, config.max_tool_rounds())
            .with_personality(config.personality().map(str::to_string));

        Ok(Self::new(client)
            .with_toolbox(Toolbox::new(catalog))
            .with_mode(config.normalize_mode()))
    }
}
