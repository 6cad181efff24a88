use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Value};

use crate::tools::registry::{ToolHandler, ToolHandlerContext};

const OUTPUT_COLUMNS: &[&str] = &[
    "PERSON_ID",
    "DISPLAY_FIRST_LAST",
    "TEAM_ID",
    "TEAM_CITY",
    "TEAM_NAME",
    "TEAM_ABBREVIATION",
];

#[derive(Deserialize)]
struct Args {
    #[serde(rename = "DISPLAY_FIRST_LAST")]
    display_first_last: String,
}

pub fn handler() -> ToolHandler {
    Arc::new(|args: Value, ctx: Arc<ToolHandlerContext>| {
        Box::pin(async move {
            let args: Args =
                serde_json::from_value(args).map_err(|e| format!("Invalid arguments: {}", e))?;

            let players = ctx
                .stats
                .all_players()
                .await
                .map_err(|e| format!("Player directory lookup failed: {}", e))?;

            // Exact "First Last" match; a miss is data, not an error.
            let matched = players
                .filter_text_eq("DISPLAY_FIRST_LAST", &args.display_first_last)
                .map_err(|e| format!("Player directory schema changed: {}", e))?;

            if matched.is_empty() {
                return Ok(json!({
                    "rows": [],
                    "row_count": 0,
                    "message": format!(
                        "No player found matching '{}'",
                        args.display_first_last
                    ),
                }));
            }

            let projected = matched
                .select(OUTPUT_COLUMNS)
                .map_err(|e| format!("Player directory schema changed: {}", e))?;

            Ok(projected.to_json_records(ctx.result_limits.max_rows as usize))
        })
    })
}
