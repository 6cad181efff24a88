use std::sync::Arc;

use serde::Deserialize;
use serde_json::{json, Value};

use crate::tools::registry::{ToolHandler, ToolHandlerContext};

const OUTPUT_COLUMNS: &[&str] = &[
    "PLAYER_ID",
    "SEASON_ID",
    "PTS",
    "FT_PCT",
    "TEAM_ID",
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

            let matched = players
                .filter_text_eq("DISPLAY_FIRST_LAST", &args.display_first_last)
                .map_err(|e| format!("Player directory schema changed: {}", e))?;

            let player_id = match matched.int_value(0, "PERSON_ID") {
                Some(id) => id,
                None => {
                    return Ok(json!({
                        "rows": [],
                        "row_count": 0,
                        "message": format!(
                            "No player found matching '{}'",
                            args.display_first_last
                        ),
                    }));
                }
            };

            let career = ctx
                .stats
                .player_career(player_id)
                .await
                .map_err(|e| format!("Career statistics lookup failed: {}", e))?;

            if career.is_empty() {
                return Ok(json!({
                    "rows": [],
                    "row_count": 0,
                    "message": format!(
                        "No career statistics recorded for '{}'",
                        args.display_first_last
                    ),
                }));
            }

            // The season(s) with the career-high point total. Ties all stay.
            let best = career
                .rows_with_max("PTS")
                .map_err(|e| format!("Career log schema changed: {}", e))?
                .select(OUTPUT_COLUMNS)
                .map_err(|e| format!("Career log schema changed: {}", e))?;

            Ok(best.to_json_records(ctx.result_limits.max_rows as usize))
        })
    })
}
