use crate::core::conversation::{ChatRequest, ChatResponse};
use crate::core::normalizer::NormalizeMode;
use crate::core::tools::Toolbox;
use crate::domain::model::RawProjectDescription;
use crate::utils::error::Result;
use async_trait::async_trait;

pub trait ConfigProvider: Send + Sync {
    fn model_endpoint(&self) -> &str;
    fn model_name(&self) -> &str;
    fn api_key(&self) -> &str;
    fn request_timeout_secs(&self) -> u64;
    fn max_tool_rounds(&self) -> u32;
    fn normalize_mode(&self) -> NormalizeMode;
    fn json_response_format(&self) -> bool {
        true
    }
    fn personality(&self) -> Option<&str> {
        None
    }
}

/// One request/response exchange with a chat model.
#[async_trait]
pub trait ChatTransport: Send + Sync {
    async fn chat(&self, request: &ChatRequest) -> Result<ChatResponse>;
}

/// Produces a single unstructured project description for a materials query.
/// Implementations may perform any number of tool round-trips internally.
#[async_trait]
pub trait ModelClient: Send + Sync {
    async fn fetch_project_description(
        &self,
        materials_query: &str,
        tools: &Toolbox,
    ) -> Result<RawProjectDescription>;
}
