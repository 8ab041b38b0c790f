use async_trait::async_trait;

use crate::domain::{FinalTable, GeocodeResult};

/// The external address geocoding service.
///
/// Implementations never fail the call: every outcome, including transport and
/// service errors, is folded into the returned status.
#[async_trait]
pub trait GeocodeClient: Send + Sync {
    async fn lookup(&self, address: &str) -> GeocodeResult;
}

/// Where the finalized table is written
#[async_trait]
pub trait TableSink: Send + Sync {
    async fn write_table(&self, table: &FinalTable) -> anyhow::Result<()>;
}
