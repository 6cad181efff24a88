use serde::{Deserialize, Serialize};
use serde_json::Value;

/// Response envelope of the stats provider. Every endpoint returns one or
/// more named tabular result sets.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct StatsResponse {
    #[serde(default)]
    pub resource: Option<String>,
    #[serde(rename = "resultSets")]
    pub result_sets: Vec<ResultSet>,
}

/// One tabular result set: column headers plus rows of untyped cells.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct ResultSet {
    pub name: String,
    pub headers: Vec<String>,
    #[serde(rename = "rowSet")]
    pub row_set: Vec<Vec<Value>>,
}
