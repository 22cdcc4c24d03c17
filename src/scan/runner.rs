use anyhow::Result;
use futures::stream::{self, StreamExt};
use std::time::Instant;

use super::pshtt::scan_domain;
use super::types::Scan;
use crate::config::PshttConfig;
use crate::sites::Site;

/// Scan every site with pshtt, running at most `config.concurrency` scans at
/// once. Failed sites are reported on stderr and skipped.
///
/// Results come back in the same order as `sites`. Errors only when every
/// site failed.
pub async fn scan_sites(sites: &[Site], config: &PshttConfig, verbose: bool) -> Result<Vec<(Site, Scan)>> {
    if sites.is_empty() {
        return Ok(Vec::new());
    }

    let concurrency = config.concurrency.max(1);
    if verbose {
        eprintln!("Scanning {} sites ({} at a time)", sites.len(), concurrency);
    }

    let mut results: Vec<_> = stream::iter(sites.iter().enumerate())
        .map(|(i, site)| async move {
            let start = Instant::now();
            let result = scan_domain(config, &site.domain).await;
            (i, result, start.elapsed())
        })
        .buffer_unordered(concurrency)
        .collect()
        .await;

    results.sort_by_key(|(i, _, _)| *i);

    let mut scans = Vec::new();
    for (i, result, elapsed) in results {
        let site = &sites[i];
        match result {
            Ok(scan) => {
                if verbose {
                    eprintln!("  {} scored {} in {:?}", site.domain, scan.score(), elapsed);
                }
                scans.push((site.clone(), scan));
            }
            Err(e) => {
                eprintln!("Scan failed: {} - {:#}", site.domain, e);
            }
        }
    }

    if scans.is_empty() {
        anyhow::bail!("All scans failed. Check that pshtt is installed and the sites are reachable.");
    }

    Ok(scans)
}
