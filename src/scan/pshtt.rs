use anyhow::{anyhow, bail, Context, Result};
use serde::Deserialize;
use std::time::Duration;
use tokio::process::Command;
use tokio_retry::{strategy::ExponentialBackoff, Retry};

use super::types::{Scan, ScanResult, TriState};
use crate::config::PshttConfig;

// pshtt makes several requests per domain, each bounded by --timeout
const PROCESS_TIMEOUT_FACTOR: u32 = 10;

/// One entry of a `pshtt --json` report. Keys pshtt emits that are not
/// listed here are ignored.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct PshttRecord {
    #[serde(rename = "Domain", default)]
    pub domain: String,
    #[serde(rename = "Live", default)]
    pub live: Option<bool>,
    #[serde(rename = "Valid HTTPS", default)]
    pub valid_https: TriState,
    #[serde(rename = "Downgrades HTTPS", default)]
    pub downgrades_https: TriState,
    #[serde(rename = "Defaults to HTTPS", default)]
    pub defaults_to_https: TriState,
    #[serde(rename = "Strictly Forces HTTPS", default)]
    pub strictly_forces_https: TriState,
    #[serde(rename = "HSTS", default)]
    pub hsts: TriState,
    #[serde(rename = "HSTS Max Age", default)]
    pub hsts_max_age: Option<i64>,
    #[serde(rename = "HSTS Entire Domain", default)]
    pub hsts_entire_domain: TriState,
    #[serde(rename = "HSTS Preload Ready", default)]
    pub hsts_preload_ready: TriState,
    #[serde(rename = "HSTS Preloaded", default)]
    pub hsts_preloaded: TriState,
}

impl PshttRecord {
    pub fn is_live(&self) -> bool {
        self.live.unwrap_or(false)
    }

    /// Map to scoring observations. A negative max-age is treated as unknown.
    pub fn scan_result(&self) -> ScanResult {
        ScanResult {
            valid_https: self.valid_https,
            downgrades_https: self.downgrades_https,
            defaults_to_https: self.defaults_to_https,
            strictly_forces_https: self.strictly_forces_https,
            hsts: self.hsts,
            hsts_max_age: self.hsts_max_age.and_then(|age| u64::try_from(age).ok()),
            hsts_entire_domain: self.hsts_entire_domain,
            hsts_preload_ready: self.hsts_preload_ready,
            hsts_preloaded: self.hsts_preloaded,
        }
    }

    pub fn to_scan(&self, domain: &str, stdout: String, stderr: String) -> Scan {
        Scan::new(domain, self.is_live(), self.scan_result(), stdout, stderr)
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum Report {
    Many(Vec<PshttRecord>),
    One(PshttRecord),
}

/// Parse the JSON printed by `pshtt --json`: an array of records, or a
/// single record object.
pub fn parse_report(stdout: &str) -> Result<Vec<PshttRecord>> {
    let report: Report =
        serde_json::from_str(stdout.trim()).context("Failed to parse pshtt JSON report")?;

    let records = match report {
        Report::Many(records) => records,
        Report::One(record) => vec![record],
    };

    if records.is_empty() {
        bail!("pshtt report contains no records");
    }
    Ok(records)
}

/// Pick the record for `domain`, falling back to the first record
pub fn find_record<'a>(records: &'a [PshttRecord], domain: &str) -> Option<&'a PshttRecord> {
    records
        .iter()
        .find(|r| r.domain.eq_ignore_ascii_case(domain))
        .or_else(|| records.first())
}

/// Build one scan per record of an existing report, keeping the report text
/// on every scan.
pub fn scans_from_report(stdout: &str, stderr: &str) -> Result<Vec<Scan>> {
    let records = parse_report(stdout)?;
    records
        .iter()
        .map(|record| {
            if record.domain.is_empty() {
                bail!("pshtt record has no \"Domain\"");
            }
            Ok(record.to_scan(&record.domain, stdout.to_string(), stderr.to_string()))
        })
        .collect()
}

/// Raw pshtt output together with the records parsed from it
#[derive(Debug, Clone)]
pub struct PshttOutput {
    pub stdout: String,
    pub stderr: String,
    pub records: Vec<PshttRecord>,
}

/// Run pshtt against a domain, retrying with exponential backoff when it
/// cannot be started, times out, fails, or prints no usable report.
pub async fn run_pshtt(config: &PshttConfig, domain: &str) -> Result<PshttOutput> {
    let retry_strategy = ExponentialBackoff::from_millis(100)
        .max_delay(Duration::from_secs(5))
        .take(config.retries);

    Retry::spawn(retry_strategy, || run_once(config, domain)).await
}

/// Wall-clock limit for one pshtt process
fn process_deadline(timeout: Duration) -> Duration {
    timeout.saturating_mul(PROCESS_TIMEOUT_FACTOR)
}

async fn run_once(config: &PshttConfig, domain: &str) -> Result<PshttOutput> {
    let timeout = config.timeout();

    let mut command = Command::new(&config.command);
    command
        .args(&config.args)
        .arg("--json")
        .arg("--timeout")
        .arg(timeout.as_secs().max(1).to_string())
        .arg(domain)
        .kill_on_drop(true);

    let deadline = process_deadline(timeout);
    let output = tokio::time::timeout(deadline, command.output())
        .await
        .map_err(|_| anyhow!("pshtt did not finish for {} within {:?}", domain, deadline))?
        .with_context(|| format!("Failed to run '{}'", config.command))?;

    let stdout = String::from_utf8_lossy(&output.stdout).into_owned();
    let stderr = String::from_utf8_lossy(&output.stderr).into_owned();

    if !output.status.success() {
        bail!(
            "pshtt exited with {} for {}: {}",
            output.status,
            domain,
            stderr.trim()
        );
    }

    let records = parse_report(&stdout).with_context(|| format!("No usable pshtt report for {}", domain))?;

    Ok(PshttOutput {
        stdout,
        stderr,
        records,
    })
}

/// Scan one domain with pshtt and build the scored scan record.
pub async fn scan_domain(config: &PshttConfig, domain: &str) -> Result<Scan> {
    let output = run_pshtt(config, domain).await?;
    let record = find_record(&output.records, domain)
        .ok_or_else(|| anyhow!("pshtt report for {} has no records", domain))?;
    Ok(record.to_scan(domain, output.stdout, output.stderr))
}

#[cfg(test)]
mod tests {
    use super::*;

    const REPORT: &str = r#"[
  {
    "Domain": "example.com",
    "Base Domain": "example.com",
    "Canonical URL": "https://www.example.com",
    "Live": true,
    "Redirect": true,
    "Valid HTTPS": true,
    "Defaults to HTTPS": true,
    "Downgrades HTTPS": false,
    "Strictly Forces HTTPS": true,
    "HTTPS Bad Chain": false,
    "HSTS": true,
    "HSTS Header": "max-age=31536000; includeSubDomains; preload",
    "HSTS Max Age": 31536000,
    "HSTS Entire Domain": true,
    "HSTS Preload Ready": true,
    "HSTS Preload Pending": false,
    "HSTS Preloaded": false,
    "Unknown Error": false
  }
]"#;

    #[test]
    fn test_parse_full_report() {
        let records = parse_report(REPORT).unwrap();
        assert_eq!(records.len(), 1);

        let record = &records[0];
        assert_eq!(record.domain, "example.com");
        assert!(record.is_live());

        let result = record.scan_result();
        assert_eq!(result.valid_https, TriState::True);
        assert_eq!(result.downgrades_https, TriState::False);
        assert_eq!(result.hsts_max_age, Some(31_536_000));
        assert_eq!(result.hsts_preloaded, TriState::False);
        assert_eq!(crate::scoring::compute_score(&result), 95);
    }

    #[test]
    fn test_parse_nulls_become_unknown() {
        let report = r#"[{
            "Domain": "down.example",
            "Live": false,
            "Valid HTTPS": null,
            "HSTS": null,
            "HSTS Max Age": null
        }]"#;
        let records = parse_report(report).unwrap();
        let result = records[0].scan_result();
        assert!(!records[0].is_live());
        assert_eq!(result.valid_https, TriState::Unknown);
        assert_eq!(result.hsts, TriState::Unknown);
        assert_eq!(result.strictly_forces_https, TriState::Unknown);
        assert_eq!(result.hsts_max_age, None);
    }

    #[test]
    fn test_negative_max_age_is_absent() {
        let records = parse_report(r#"{"Domain": "example.com", "HSTS Max Age": -1}"#).unwrap();
        assert_eq!(records[0].scan_result().hsts_max_age, None);
    }

    #[test]
    fn test_parse_single_object() {
        let records = parse_report(r#"{"Domain": "example.com", "Live": true}"#).unwrap();
        assert_eq!(records.len(), 1);
        assert!(records[0].is_live());
    }

    #[test]
    fn test_parse_rejects_empty_and_garbage() {
        assert!(parse_report("[]").is_err());
        assert!(parse_report("Traceback (most recent call last):").is_err());
    }

    #[test]
    fn test_process_deadline_saturates() {
        assert_eq!(process_deadline(Duration::from_secs(5)), Duration::from_secs(50));
        assert_eq!(process_deadline(Duration::from_secs(u64::MAX / 5)), Duration::MAX);
    }

    #[test]
    fn test_find_record_prefers_matching_domain() {
        let report = r#"[{"Domain": "a.example"}, {"Domain": "B.example"}]"#;
        let records = parse_report(report).unwrap();
        assert_eq!(find_record(&records, "b.example").unwrap().domain, "B.example");
        assert_eq!(find_record(&records, "c.example").unwrap().domain, "a.example");
    }

    #[test]
    fn test_scans_from_report() {
        let report = r#"[
            {"Domain": "a.example", "Live": true, "Valid HTTPS": true, "Defaults to HTTPS": true},
            {"Domain": "b.example", "Live": false}
        ]"#;
        let scans = scans_from_report(report, "").unwrap();
        assert_eq!(scans.len(), 2);
        assert_eq!(scans[0].domain, "a.example");
        assert_eq!(scans[0].score(), 50);
        assert!(!scans[1].live);
        assert_eq!(scans[1].score(), 0);
        assert_eq!(scans[1].pshtt_stdout, report);
    }

    #[test]
    fn test_scans_from_report_requires_domain() {
        assert!(scans_from_report(r#"[{"Live": true}]"#, "").is_err());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_scan_domain_with_stub_command() {
        let config = PshttConfig {
            command: "sh".to_string(),
            args: vec![
                "-c".to_string(),
                r#"printf '[{"Domain": "example.com", "Live": true, "Valid HTTPS": true, "Downgrades HTTPS": true}]'"#
                    .to_string(),
                "pshtt".to_string(),
            ],
            timeout: "5s".to_string(),
            concurrency: 1,
            retries: 0,
        };

        let scan = scan_domain(&config, "example.com").await.unwrap();
        assert_eq!(scan.domain, "example.com");
        assert!(scan.live);
        assert_eq!(scan.score(), 30);
        assert!(scan.pshtt_stdout.contains("Downgrades HTTPS"));
    }

    #[tokio::test]
    async fn test_missing_command_fails() {
        let config = PshttConfig {
            command: "stn-test-no-such-pshtt-binary".to_string(),
            retries: 1,
            ..PshttConfig::default()
        };
        let err = run_pshtt(&config, "example.com").await.unwrap_err();
        assert!(err.to_string().contains("Failed to run"));
    }
}
