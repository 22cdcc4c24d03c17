pub mod formatter;

pub use formatter::{
    format_age, format_history, format_leaderboard_table, format_leaderboard_tsv, format_max_age,
    format_scan_detail, format_sites, format_tristate, should_use_colors,
};
