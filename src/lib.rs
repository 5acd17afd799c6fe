pub mod adapters;
pub mod catalog;
pub mod config;
pub mod core;
pub mod domain;
pub mod utils;

#[cfg(feature = "cli")]
pub use config::CliConfig;
pub use config::TomlConfig;

pub use adapters::{CohereClient, CohereSettings};
pub use catalog::Catalog;
pub use crate::core::conversation::ToolCallingClient;
pub use crate::core::engine::ProjectEngine;
pub use crate::core::normalizer::{normalize_connections, normalize_description, NormalizeMode};
pub use crate::core::tools::Toolbox;
pub use domain::model::{NormalizedProject, RawProjectDescription};
pub use utils::error::{ProjectError, Result};

/// Builds a project with the built-in catalog in strict mode.
pub async fn build_project<S, M>(materials: &[S], model_client: M) -> Result<NormalizedProject>
where
    S: AsRef<str>,
    M: crate::core::ModelClient,
{
    ProjectEngine::new(model_client).build_project(materials).await
}
