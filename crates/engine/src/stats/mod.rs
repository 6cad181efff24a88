mod client;
pub mod table;

use std::future::Future;
use std::pin::Pin;

pub use client::StatsClient;
pub use table::{DataTable, TableError};

/// Errors from stats provider lookups.
#[derive(Debug, thiserror::Error)]
pub enum StatsError {
    #[error("stats HTTP error: {0}")]
    Http(String),

    #[error("stats API error ({status}): {body}")]
    Api { status: u16, body: String },

    #[error("stats response parse error: {0}")]
    Parse(String),

    #[error("stats response missing result set '{0}'")]
    MissingResultSet(String),
}

impl From<StatsError> for courtside_common::CourtsideError {
    fn from(e: StatsError) -> Self {
        courtside_common::CourtsideError::StatsProvider(e.to_string())
    }
}

/// Object-safe lookup seam over the stats provider.
/// Tests provide canned tables; production uses StatsClient.
pub trait StatsSource: Send + Sync {
    fn all_players(
        &self,
    ) -> Pin<Box<dyn Future<Output = Result<DataTable, StatsError>> + Send + '_>>;

    fn player_career(
        &self,
        player_id: i64,
    ) -> Pin<Box<dyn Future<Output = Result<DataTable, StatsError>> + Send + '_>>;

    fn franchise_history(
        &self,
    ) -> Pin<Box<dyn Future<Output = Result<DataTable, StatsError>> + Send + '_>>;
}
