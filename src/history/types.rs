use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::scan::Scan;

/// Append-only scan history, keyed by domain.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanHistory {
    pub version: u32,
    #[serde(default)]
    pub scans: BTreeMap<String, Vec<Scan>>,
}

impl Default for ScanHistory {
    fn default() -> Self {
        Self::new()
    }
}

impl ScanHistory {
    /// Create a new empty history with version 1
    pub fn new() -> Self {
        Self {
            version: 1,
            scans: BTreeMap::new(),
        }
    }

    /// Add a scan to its domain's history, keeping the list ordered by
    /// timestamp. Existing scans are never touched.
    pub fn record(&mut self, mut scan: Scan) {
        scan.rescore();
        let scans = self.scans.entry(scan.domain.to_ascii_lowercase()).or_default();
        // Equal timestamps keep recording order
        let pos = scans.partition_point(|s| s.timestamp <= scan.timestamp);
        scans.insert(pos, scan);
    }

    /// All scans for a domain, oldest first
    pub fn scans_for(&self, domain: &str) -> &[Scan] {
        self.scans
            .get(&domain.to_ascii_lowercase())
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Most recent scan for a domain by timestamp
    pub fn latest(&self, domain: &str) -> Option<&Scan> {
        self.scans_for(domain).iter().max_by_key(|scan| scan.timestamp)
    }

    /// Recompute every stored score from its observations
    pub fn rescore_all(&mut self) {
        for scan in self.scans.values_mut().flatten() {
            scan.rescore();
        }
    }

    pub fn len(&self) -> usize {
        self.scans.values().map(Vec::len).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
