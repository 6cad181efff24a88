use std::time::Duration;

use courtside_common::api::stats::StatsResponse;
use courtside_common::config::StatsProviderConfig;

use super::table::DataTable;
use super::{StatsError, StatsSource};

// The stats provider rejects requests without browser-ish headers.
const USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64; rv:128.0) Gecko/20100101 Firefox/128.0";
const REFERER: &str = "https://www.nba.com/";

/// HTTP client for the sports-statistics provider.
///
/// Each lookup is one GET returning named tabular result sets; the client
/// extracts the result set the endpoint documents and hands back a DataTable.
/// The provider is a black box — schema drift there surfaces as
/// `StatsError::MissingResultSet` or unknown-column errors in the handlers.
pub struct StatsClient {
    http: reqwest::Client,
    base_url: String,
    season: String,
}

impl StatsClient {
    pub fn new(config: &StatsProviderConfig) -> Result<Self, StatsError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_seconds))
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| StatsError::Http(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            season: config.season.clone(),
        })
    }

    async fn result_set(
        &self,
        endpoint: &str,
        set_name: &str,
        params: &[(&str, String)],
    ) -> Result<DataTable, StatsError> {
        let start = std::time::Instant::now();
        let url = format!("{}/{}", self.base_url, endpoint);

        let response = self
            .http
            .get(&url)
            .header("Referer", REFERER)
            .query(params)
            .send()
            .await
            .map_err(|e| StatsError::Http(e.to_string()))?;

        let status = response.status();
        metrics::histogram!("stats.request.latency", "endpoint" => endpoint.to_string())
            .record(start.elapsed().as_secs_f64());

        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            metrics::counter!("stats.request.errors", "endpoint" => endpoint.to_string())
                .increment(1);
            return Err(StatsError::Api {
                status: status.as_u16(),
                body,
            });
        }

        let parsed: StatsResponse = response
            .json()
            .await
            .map_err(|e| StatsError::Parse(e.to_string()))?;

        let rs = parsed
            .result_sets
            .into_iter()
            .find(|rs| rs.name == set_name)
            .ok_or_else(|| StatsError::MissingResultSet(set_name.to_string()))?;

        tracing::debug!(
            endpoint = endpoint,
            result_set = set_name,
            rows = rs.row_set.len(),
            "Stats lookup completed"
        );

        Ok(DataTable::from_result_set(rs))
    }

    /// Full player directory, historical players included.
    pub async fn all_players(&self) -> Result<DataTable, StatsError> {
        self.result_set(
            "commonallplayers",
            "CommonAllPlayers",
            &[
                ("LeagueID", "00".to_string()),
                ("Season", self.season.clone()),
                ("IsOnlyCurrentSeason", "0".to_string()),
            ],
        )
        .await
    }

    /// Season-by-season career totals for one player.
    pub async fn player_career(&self, player_id: i64) -> Result<DataTable, StatsError> {
        self.result_set(
            "playercareerstats",
            "SeasonTotalsRegularSeason",
            &[
                ("PlayerID", player_id.to_string()),
                ("PerMode36", "Totals".to_string()),
                ("LeagueID", "00".to_string()),
            ],
        )
        .await
    }

    /// Franchise tenure history with league title counts.
    pub async fn franchise_history(&self) -> Result<DataTable, StatsError> {
        self.result_set(
            "franchisehistory",
            "FranchiseHistory",
            &[("LeagueID", "00".to_string())],
        )
        .await
    }
}

impl StatsSource for StatsClient {
    fn all_players(
        &self,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<DataTable, StatsError>> + Send + '_>,
    > {
        Box::pin(self.all_players())
    }

    fn player_career(
        &self,
        player_id: i64,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<DataTable, StatsError>> + Send + '_>,
    > {
        Box::pin(self.player_career(player_id))
    }

    fn franchise_history(
        &self,
    ) -> std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<DataTable, StatsError>> + Send + '_>,
    > {
        Box::pin(self.franchise_history())
    }
}
