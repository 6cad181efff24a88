mod get_league_titles;
mod get_player_info;
mod get_player_statistics;

use super::registry::ToolRegistry;

/// Register all chat tool handlers with the registry.
pub fn register_chat_tools(registry: &mut ToolRegistry) {
    registry.register("get_player_info", get_player_info::handler());
    registry.register("get_player_statistics", get_player_statistics::handler());
    registry.register("get_league_titles", get_league_titles::handler());
}
