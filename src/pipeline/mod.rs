// Batch pipeline: input decoding, per-record processing stages and orchestration

pub mod input;
pub mod orchestrator;
pub mod processing;
pub mod rate_limiter;

pub use input::parse_raw_records;
pub use orchestrator::PipelineOrchestrator;
pub use rate_limiter::{Limits, RateLimiter};
