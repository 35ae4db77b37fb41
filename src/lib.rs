// src/lib.rs
// Public library surface for the binary and integration tests.

pub mod config;
pub mod ingest;
pub mod lock;
pub mod metrics;
pub mod payload;
pub mod pipeline;
pub mod publish;

// ---- Re-exports for stable public API ----
pub use crate::config::PipelineConfig;
pub use crate::payload::Payload;
pub use crate::pipeline::{Pipeline, RunOutcome};
pub use crate::publish::PublishOutcome;
