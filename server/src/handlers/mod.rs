pub mod admin;
pub mod catalog;
pub mod leaderboard;

use crate::config::Config;
use crate::services::leaderboard::Leaderboard;

/// Shared by every worker.
pub struct AppState {
    pub leaderboard: Leaderboard,
    pub config: Config,
}
