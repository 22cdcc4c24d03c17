pub mod leaderboard;
pub mod types;

pub use leaderboard::{build_summaries, leaderboard, LeaderboardQuery, SortKey, SortOrder};
pub use types::{slugify, Site, SiteSummary};
