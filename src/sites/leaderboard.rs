use anyhow::{bail, Result};
use std::cmp::Ordering;

use super::types::{Site, SiteSummary};
use crate::history::ScanHistory;

/// Column the leaderboard is ordered by
///
/// The HTTPS columns order unknown < false < true. Unknown is its own
/// rank, so an unknown result never ties with a confirmed `false`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortKey {
    #[default]
    Score,
    Name,
    Domain,
    ValidHttps,
    DefaultHttps,
    EnforcesHttps,
    DowngradesHttps,
}

impl SortKey {
    pub fn parse(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().replace('-', "_").as_str() {
            "score" => Ok(SortKey::Score),
            "name" => Ok(SortKey::Name),
            "domain" => Ok(SortKey::Domain),
            "valid_https" => Ok(SortKey::ValidHttps),
            "default_https" => Ok(SortKey::DefaultHttps),
            "enforces_https" => Ok(SortKey::EnforcesHttps),
            "downgrades_https" => Ok(SortKey::DowngradesHttps),
            other => bail!(
                "Unknown sort key '{}'. Expected one of: score, name, domain, valid_https, default_https, enforces_https, downgrades_https",
                other
            ),
        }
    }

    fn compare(self, a: &SiteSummary, b: &SiteSummary) -> Ordering {
        match self {
            SortKey::Score => a.score.cmp(&b.score),
            SortKey::Name => a.name.cmp(&b.name),
            SortKey::Domain => a.domain.cmp(&b.domain),
            SortKey::ValidHttps => a.valid_https.cmp(&b.valid_https),
            SortKey::DefaultHttps => a.default_https.cmp(&b.default_https),
            SortKey::EnforcesHttps => a.enforces_https.cmp(&b.enforces_https),
            SortKey::DowngradesHttps => a.downgrades_https.cmp(&b.downgrades_https),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SortOrder {
    Asc,
    #[default]
    Desc,
}

/// Search and ordering state for the leaderboard (defaults: no filter, best score first)
#[derive(Debug, Clone, Default)]
pub struct LeaderboardQuery {
    pub search: String,
    pub order_by: SortKey,
    pub order: SortOrder,
}

/// Summaries for every site that has at least one recorded scan, plus the
/// sites that have none (they cannot appear on the leaderboard).
pub fn build_summaries<'a>(sites: &'a [Site], history: &ScanHistory) -> (Vec<SiteSummary>, Vec<&'a Site>) {
    let mut summaries = Vec::new();
    let mut unscanned = Vec::new();
    for site in sites {
        match history.latest(&site.domain) {
            Some(scan) => summaries.push(SiteSummary::from_latest(site, scan)),
            None => unscanned.push(site),
        }
    }
    (summaries, unscanned)
}

/// Filter summaries by a case-insensitive search over name and domain, then
/// order them.
///
/// Descending order is the reverse of the stable ascending sort, so ties
/// appear in reverse input order when descending.
pub fn leaderboard(summaries: Vec<SiteSummary>, query: &LeaderboardQuery) -> Vec<SiteSummary> {
    let needle = query.search.to_lowercase();

    let mut rows: Vec<SiteSummary> = summaries
        .into_iter()
        .filter(|s| {
            s.name.to_lowercase().contains(&needle) || s.domain.to_lowercase().contains(&needle)
        })
        .collect();

    rows.sort_by(|a, b| query.order_by.compare(a, b));

    if query.order == SortOrder::Desc {
        rows.reverse();
    }
    rows
}
