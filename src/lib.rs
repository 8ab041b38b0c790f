//! Weekly aid-applicant processing: raw JSON exports in, one geocoded and
//! reference-joined table out.

pub mod config;
pub mod constants;
pub mod error;

// Layered boundaries: ports live in `app`, adapters in `infra`
pub mod app;
pub mod infra;

// Record and result shapes shared across layers
pub mod domain;

pub mod observability;
pub mod pipeline;

pub use config::Config;
pub use domain::{GeocodeResult, GeocodeStatus, PipelineResult, Record, RunSummary};
pub use error::{PipelineError, Result};
pub use pipeline::PipelineOrchestrator;
