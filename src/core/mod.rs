pub mod conversation;
pub mod engine;
pub mod normalizer;
pub mod query;
pub mod tools;

pub use crate::domain::model::{NormalizedProject, RawProjectDescription};
pub use crate::domain::ports::{ChatTransport, ConfigProvider, ModelClient};
pub use crate::utils::error::Result;
