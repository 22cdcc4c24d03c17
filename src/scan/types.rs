use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::scoring::compute_score;

/// A boolean observation that pshtt may not have been able to determine.
///
/// Serialized as a nullable JSON boolean: `true`, `false` or `null`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Default, Serialize, Deserialize)]
#[serde(from = "Option<bool>", into = "Option<bool>")]
pub enum TriState {
    // Declaration order gives unknown < false < true for sorting
    #[default]
    Unknown,
    False,
    True,
}

impl TriState {
    /// Only an explicit `True` counts; `Unknown` is falsy.
    pub fn is_true(self) -> bool {
        match self {
            TriState::True => true,
            TriState::False | TriState::Unknown => false,
        }
    }

    pub fn is_known(self) -> bool {
        self != TriState::Unknown
    }
}

impl From<Option<bool>> for TriState {
    fn from(value: Option<bool>) -> Self {
        match value {
            Some(true) => TriState::True,
            Some(false) => TriState::False,
            None => TriState::Unknown,
        }
    }
}

impl From<bool> for TriState {
    fn from(value: bool) -> Self {
        Some(value).into()
    }
}

impl From<TriState> for Option<bool> {
    fn from(value: TriState) -> Self {
        match value {
            TriState::True => Some(true),
            TriState::False => Some(false),
            TriState::Unknown => None,
        }
    }
}

/// Observations pshtt made about one domain. These drive the score.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanResult {
    #[serde(default)]
    pub valid_https: TriState,
    #[serde(default)]
    pub downgrades_https: TriState,
    #[serde(default)]
    pub defaults_to_https: TriState,
    #[serde(default)]
    pub strictly_forces_https: TriState,

    #[serde(default)]
    pub hsts: TriState,
    /// HSTS max-age in seconds
    #[serde(default)]
    pub hsts_max_age: Option<u64>,
    #[serde(default)]
    pub hsts_entire_domain: TriState,
    #[serde(default)]
    pub hsts_preload_ready: TriState,
    #[serde(default)]
    pub hsts_preloaded: TriState,
}

/// One inspection run of a domain, as stored in the scan history.
///
/// The score is always derived from `result`; it is computed when the scan is
/// created and again whenever the scan is saved or loaded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Scan {
    pub domain: String,
    pub timestamp: DateTime<Utc>,
    pub live: bool,
    #[serde(flatten)]
    pub result: ScanResult,
    #[serde(default)]
    score: u8,
    #[serde(default)]
    pub pshtt_stdout: String,
    #[serde(default)]
    pub pshtt_stderr: String,
}

impl Scan {
    pub fn new(
        domain: impl Into<String>,
        live: bool,
        result: ScanResult,
        pshtt_stdout: String,
        pshtt_stderr: String,
    ) -> Self {
        Self::at(Utc::now(), domain, live, result, pshtt_stdout, pshtt_stderr)
    }

    /// Create a scan with an explicit timestamp (used when importing reports)
    pub fn at(
        timestamp: DateTime<Utc>,
        domain: impl Into<String>,
        live: bool,
        result: ScanResult,
        pshtt_stdout: String,
        pshtt_stderr: String,
    ) -> Self {
        let score = compute_score(&result);
        Self {
            domain: domain.into(),
            timestamp,
            live,
            result,
            score,
            pshtt_stdout,
            pshtt_stderr,
        }
    }

    pub fn score(&self) -> u8 {
        self.score
    }

    /// Recompute the derived score from the observations
    pub fn rescore(&mut self) {
        self.score = compute_score(&self.result);
    }
}

impl fmt::Display for Scan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} from {}", self.domain, self.timestamp.format("%Y-%m-%d %H:%M"))
    }
}
