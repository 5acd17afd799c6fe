// Adapters layer: concrete implementations for external systems.

pub mod cohere;

pub use cohere::{CohereClient, CohereSettings};
