use serde::{Deserialize, Serialize};

/// Top-level config file.
///
/// Example YAML:
/// ```yaml
/// sites:
///   - name: The Example Times
///     domain: example.com
/// pshtt:
///   command: pshtt
///   timeout: 30s
///   concurrency: 4
/// ```
#[derive(Debug, Clone, Default, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct Config {
    #[serde(default)]
    pub sites: Vec<SiteConfig>,

    #[serde(default)]
    pub pshtt: PshttConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct SiteConfig {
    pub name: String,
    /// Domain without the scheme, e.g. "example.com" instead of "https://example.com"
    pub domain: String,
}

/// How to invoke the pshtt scanner.
#[derive(Debug, Clone, Deserialize, Serialize, PartialEq)]
#[serde(deny_unknown_fields)]
pub struct PshttConfig {
    /// Executable to run (default: "pshtt" from PATH)
    #[serde(default = "default_command")]
    pub command: String,

    /// Extra arguments placed before `--json --timeout N <domain>`
    #[serde(default)]
    pub args: Vec<String>,

    /// Per-request timeout handed to pshtt, humantime format (e.g. "30s")
    #[serde(default = "default_timeout")]
    pub timeout: String,

    /// Maximum number of pshtt processes running at once
    #[serde(default = "default_concurrency")]
    pub concurrency: usize,

    /// Extra attempts when pshtt fails to produce a report
    #[serde(default = "default_retries")]
    pub retries: usize,
}

fn default_command() -> String {
    "pshtt".to_string()
}

fn default_timeout() -> String {
    "30s".to_string()
}

fn default_concurrency() -> usize {
    4
}

fn default_retries() -> usize {
    2
}

impl Default for PshttConfig {
    fn default() -> Self {
        Self {
            command: default_command(),
            args: Vec::new(),
            timeout: default_timeout(),
            concurrency: default_concurrency(),
            retries: default_retries(),
        }
    }
}

impl PshttConfig {
    /// Parsed timeout. Falls back to the default when the string is invalid;
    /// `validate_config` reports that case at startup.
    pub fn timeout(&self) -> std::time::Duration {
        humantime::parse_duration(&self.timeout)
            .unwrap_or_else(|_| std::time::Duration::from_secs(30))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_minimal_config_parse() {
        let yaml = r#"
sites:
  - name: The Example Times
    domain: example.com
"#;
        let config: Config = serde_saphyr::from_str(yaml).unwrap();
        assert_eq!(config.sites.len(), 1);
        assert_eq!(config.sites[0].domain, "example.com");
        assert_eq!(config.pshtt, PshttConfig::default());
    }

    #[test]
    fn test_full_config_parse() {
        let yaml = r#"
sites:
  - name: The Example Times
    domain: example.com
  - name: Daily Planet
    domain: dailyplanet.example
pshtt:
  command: /usr/local/bin/pshtt
  args: ["--user-agent", "stn"]
  timeout: 5s
  concurrency: 8
  retries: 0
"#;
        let config: Config = serde_saphyr::from_str(yaml).unwrap();
        assert_eq!(config.sites.len(), 2);
        assert_eq!(config.pshtt.command, "/usr/local/bin/pshtt");
        assert_eq!(config.pshtt.args, vec!["--user-agent", "stn"]);
        assert_eq!(config.pshtt.timeout(), std::time::Duration::from_secs(5));
        assert_eq!(config.pshtt.concurrency, 8);
        assert_eq!(config.pshtt.retries, 0);
    }

    #[test]
    fn test_empty_config_parse() {
        let config: Config = serde_saphyr::from_str("{}").unwrap();
        assert!(config.sites.is_empty());
        assert_eq!(config.pshtt.command, "pshtt");
    }

    #[test]
    fn test_unknown_field_rejected() {
        let yaml = r#"
sites:
  - name: The Example Times
    domain: example.com
    url: https://example.com
"#;
        let result: Result<Config, _> = serde_saphyr::from_str(yaml);
        assert!(result.is_err());
    }

    #[test]
    fn test_config_serde_roundtrip() {
        let config = Config {
            sites: vec![SiteConfig {
                name: "The Example Times".to_string(),
                domain: "example.com".to_string(),
            }],
            pshtt: PshttConfig::default(),
        };
        let yaml = serde_saphyr::to_string(&config).unwrap();
        let parsed: Config = serde_saphyr::from_str(&yaml).unwrap();
        assert_eq!(config, parsed);
    }
}
