use chrono::{Duration, Utc};
use owo_colors::OwoColorize;
use std::io::IsTerminal;
use terminal_size::{terminal_size, Width};

use crate::scan::{Scan, TriState};
use crate::scoring::ScoreResult;
use crate::sites::{Site, SiteSummary};

/// Check if stdout is a TTY (for auto-detecting color support)
pub fn should_use_colors() -> bool {
    std::io::stdout().is_terminal()
}

/// "yes", "no" or "?" for an observation pshtt could not determine
pub fn format_tristate(value: TriState) -> &'static str {
    match value {
        TriState::True => "yes",
        TriState::False => "no",
        TriState::Unknown => "?",
    }
}

fn paint_tristate(value: TriState, use_colors: bool) -> String {
    let text = format_tristate(value);
    if !use_colors {
        return text.to_string();
    }
    match value {
        TriState::True => text.green().to_string(),
        TriState::False => text.red().to_string(),
        TriState::Unknown => text.dimmed().to_string(),
    }
}

/// Right-align a score in a 3-char column, colored by band when enabled
fn paint_score(score: u8, use_colors: bool) -> String {
    let text = format!("{:>3}", score);
    if !use_colors {
        text
    } else if score >= 70 {
        text.green().bold().to_string()
    } else if score >= 30 {
        text.yellow().bold().to_string()
    } else {
        text.red().bold().to_string()
    }
}

/// Format an HSTS max-age as seconds plus whole days ("10886400s (126 days)")
pub fn format_max_age(max_age: Option<u64>) -> String {
    match max_age {
        Some(secs) => format!("{}s ({} days)", secs, secs / 86_400),
        None => "-".to_string(),
    }
}

/// Get terminal width, defaulting to None for pipes (unlimited)
fn get_terminal_width() -> Option<usize> {
    terminal_size().map(|(Width(w), _)| w as usize)
}

/// Truncate text to fit available width, accounting for Unicode
fn truncate(text: &str, max_width: usize) -> String {
    let chars: Vec<char> = text.chars().collect();
    if chars.len() <= max_width {
        text.to_string()
    } else if max_width > 3 {
        format!("{}...", chars[..max_width - 3].iter().collect::<String>())
    } else {
        chars[..max_width].iter().collect()
    }
}

const FLAG_HEADER: &str = "valid default enforce downgrade";

/// Format the leaderboard as a table: index, score, HTTPS flags, name, domain
///
/// The name column is truncated to fit the terminal; piped output is never
/// truncated.
pub fn format_leaderboard_table(rows: &[SiteSummary], use_colors: bool) -> String {
    if rows.is_empty() {
        return "No scanned sites found.".to_string();
    }

    let term_width = get_terminal_width();
    let separator = "  ";

    let header = format!("{:>8}{}{}{}{}", "", separator, FLAG_HEADER, separator, "site");
    let header = if use_colors {
        header.dimmed().to_string()
    } else {
        header
    };

    let body = rows
        .iter()
        .enumerate()
        .map(|(idx, row)| {
            let index_str = format!("{:>3}.", idx + 1);
            // Each flag is padded to its header word so the columns line up
            let flags = [
                (row.valid_https, "valid".len()),
                (row.default_https, "default".len()),
                (row.enforces_https, "enforce".len()),
                (row.downgrades_https, "downgrade".len()),
            ]
            .iter()
            .map(|(value, width)| {
                let pad = width.saturating_sub(format_tristate(*value).len());
                format!("{}{}", paint_tristate(*value, use_colors), " ".repeat(pad))
            })
            .collect::<Vec<_>>()
            .join(" ");

            let fixed_width = index_str.len() + 4 + separator.len() * 3 + FLAG_HEADER.len() + row.domain.len();
            let name = match term_width {
                Some(width) if width > fixed_width + 10 => truncate(&row.name, width - fixed_width),
                Some(_) => truncate(&row.name, 20),
                None => row.name.clone(),
            };

            let index_str = if use_colors {
                index_str.dimmed().to_string()
            } else {
                index_str
            };
            let domain = if use_colors {
                row.domain.cyan().to_string()
            } else {
                row.domain.clone()
            };

            format!(
                "{} {}{}{}{}{}{}{}",
                index_str,
                paint_score(row.score, use_colors),
                separator,
                flags,
                separator,
                name,
                separator,
                domain
            )
        })
        .collect::<Vec<_>>()
        .join("\n");

    format!("{}\n{}", header, body)
}

/// Format the leaderboard as tab-separated values for scripting
/// Columns: score, name, domain, slug, valid, default, enforces, downgrades
pub fn format_leaderboard_tsv(rows: &[SiteSummary]) -> String {
    rows.iter()
        .map(|row| {
            format!(
                "{}\t{}\t{}\t{}\t{}\t{}\t{}\t{}",
                row.score,
                row.name,
                row.domain,
                row.slug,
                format_tristate(row.valid_https),
                format_tristate(row.default_https),
                format_tristate(row.enforces_https),
                format_tristate(row.downgrades_https)
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Multi-line view of one scan with its score breakdown
pub fn format_scan_detail(scan: &Scan, scored: &ScoreResult, use_colors: bool) -> String {
    let r = &scan.result;
    let title = if use_colors {
        scan.domain.bold().to_string()
    } else {
        scan.domain.clone()
    };
    let score = if use_colors {
        scored.score.to_string().bold().to_string()
    } else {
        scored.score.to_string()
    };

    let mut lines = vec![
        format!("{}  {}/100", title, score),
        format!("  Scanned: {}", scan.timestamp.format("%Y-%m-%d %H:%M UTC")),
        format!("  Live: {}", if scan.live { "yes" } else { "no" }),
        format!("  Valid HTTPS: {}", paint_tristate(r.valid_https, use_colors)),
        format!("  Downgrades HTTPS: {}", paint_tristate(r.downgrades_https, use_colors)),
        format!("  Defaults to HTTPS: {}", paint_tristate(r.defaults_to_https, use_colors)),
        format!("  Strictly forces HTTPS: {}", paint_tristate(r.strictly_forces_https, use_colors)),
        format!("  HSTS: {}", paint_tristate(r.hsts, use_colors)),
        format!("  HSTS max-age: {}", format_max_age(r.hsts_max_age)),
        format!("  HSTS entire domain: {}", paint_tristate(r.hsts_entire_domain, use_colors)),
        format!("  HSTS preload ready: {}", paint_tristate(r.hsts_preload_ready, use_colors)),
        format!("  HSTS preloaded: {}", paint_tristate(r.hsts_preloaded, use_colors)),
    ];

    if scored.factors.is_empty() {
        lines.push(format!("  Breakdown: {} -> 0", scored.tier.label()));
    } else {
        lines.push("  Breakdown:".to_string());
        for factor in &scored.factors {
            lines.push(format!(
                "    {:>3} -> {:>3}  {}: {}",
                factor.before, factor.after, factor.label, factor.description
            ));
        }
    }

    lines.join("\n")
}

/// One line per scan, newest first: timestamp, score, age, live flag
pub fn format_history(scans: &[Scan], use_colors: bool) -> String {
    if scans.is_empty() {
        return "No scans recorded.".to_string();
    }

    let mut ordered: Vec<&Scan> = scans.iter().collect();
    ordered.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));

    let now = Utc::now();
    ordered
        .iter()
        .map(|scan| {
            let age = format!("{:>4}", format_age(now - scan.timestamp));
            let live = if scan.live { "" } else { "  (not live)" };
            format!(
                "{}  {}  {}{}",
                scan.timestamp.format("%Y-%m-%d %H:%M"),
                paint_score(scan.score(), use_colors),
                if use_colors { age.dimmed().to_string() } else { age },
                live
            )
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// List configured sites: slug, name, domain
pub fn format_sites(sites: &[Site], use_colors: bool) -> String {
    if sites.is_empty() {
        return "No sites configured.".to_string();
    }

    let slug_width = sites.iter().map(|s| s.slug.len()).max().unwrap_or(0);
    sites
        .iter()
        .map(|site| {
            let slug = format!("{:<width$}", site.slug, width = slug_width);
            if use_colors {
                format!("{}  {}  {}", slug.dimmed(), site.name.bold(), site.domain.cyan())
            } else {
                format!("{}  {}  {}", slug, site.name, site.domain)
            }
        })
        .collect::<Vec<_>>()
        .join("\n")
}

/// Format a duration into a human-readable age string
/// "2h" for hours, "3d" for days, "1w" for weeks
pub fn format_age(duration: Duration) -> String {
    let hours = duration.num_hours();
    let days = duration.num_days();
    let weeks = days / 7;

    if weeks >= 1 {
        format!("{}w", weeks)
    } else if days >= 1 {
        format!("{}d", days)
    } else if hours >= 1 {
        format!("{}h", hours)
    } else {
        let minutes = duration.num_minutes();
        if minutes >= 1 {
            format!("{}m", minutes)
        } else {
            "now".to_string()
        }
    }
}
