use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Value};

use crate::tools::registry::{ToolHandler, ToolHandlerContext};

const OUTPUT_COLUMNS: &[&str] = &[
    "TEAM_ID",
    "TEAM_CITY",
    "TEAM_NAME",
    "START_YEAR",
    "END_YEAR",
    "LEAGUE_TITLES",
];

#[derive(Deserialize)]
struct Args {
    // The schema says string, but models also send bare integers.
    #[serde(rename = "TEAM_ID")]
    team_id: Value,
}

fn parse_team_id(raw: &Value) -> Option<i64> {
    match raw {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub fn handler() -> ToolHandler {
    Arc::new(|args: Value, ctx: Arc<ToolHandlerContext>| {
        Box::pin(async move {
            let args: Args =
                serde_json::from_value(args).map_err(|e| format!("Invalid arguments: {}", e))?;

            let team_id = parse_team_id(&args.team_id).ok_or_else(|| {
                format!(
                    "Bad input: TEAM_ID '{}' — expected a numeric team identifier",
                    args.team_id
                )
            })?;

            let history = ctx
                .stats
                .franchise_history()
                .await
                .map_err(|e| format!("Franchise history lookup failed: {}", e))?;

            let matched = history
                .filter_num_eq("TEAM_ID", team_id)
                .map_err(|e| format!("Franchise history schema changed: {}", e))?;

            if matched.is_empty() {
                return Ok(json!({
                    "rows": [],
                    "row_count": 0,
                    "message": format!("No franchise found with team id {}", team_id),
                }));
            }

            let projected = matched
                .select(OUTPUT_COLUMNS)
                .map_err(|e| format!("Franchise history schema changed: {}", e))?;

            Ok(projected.to_json_records(ctx.result_limits.max_rows as usize))
        })
    })
}
