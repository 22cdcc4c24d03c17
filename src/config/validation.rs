use std::collections::HashSet;
use std::time::Duration;

use super::schema::Config;
use crate::sites::slugify;

/// Longest per-request timeout pshtt may be given
const MAX_PSHTT_TIMEOUT: Duration = Duration::from_secs(60 * 60);

/// Validate configuration at startup.
/// Returns all validation errors at once (not just the first).
pub fn validate_config(config: &Config) -> Result<(), Vec<String>> {
    let mut errors = Vec::new();

    let mut names = HashSet::new();
    let mut slugs = HashSet::new();
    let mut domains = HashSet::new();

    for (i, site) in config.sites.iter().enumerate() {
        let name = site.name.trim();
        if name.is_empty() {
            errors.push(format!("sites[{}].name: must not be empty", i));
        } else if !names.insert(name.to_string()) {
            errors.push(format!("sites[{}].name: duplicate name '{}'", i, name));
        } else {
            let slug = slugify(name);
            if slug.is_empty() {
                errors.push(format!(
                    "sites[{}].name: '{}' has no characters usable in a slug",
                    i, name
                ));
            } else if !slugs.insert(slug.clone()) {
                errors.push(format!("sites[{}].name: slug '{}' is already taken", i, slug));
            }
        }

        if let Err(e) = check_domain(&site.domain) {
            errors.push(format!("sites[{}].domain: invalid '{}' - {}", i, site.domain, e));
        } else if !domains.insert(site.domain.to_ascii_lowercase()) {
            errors.push(format!("sites[{}].domain: duplicate domain '{}'", i, site.domain));
        }
    }

    let pshtt = &config.pshtt;
    if pshtt.command.trim().is_empty() {
        errors.push("pshtt.command: must not be empty".to_string());
    }
    match humantime::parse_duration(&pshtt.timeout) {
        Ok(d) if d.as_secs() == 0 => {
            errors.push("pshtt.timeout: must be at least one second".to_string());
        }
        Ok(d) if d > MAX_PSHTT_TIMEOUT => {
            errors.push(format!(
                "pshtt.timeout: '{}' is longer than the 1h maximum",
                pshtt.timeout
            ));
        }
        Ok(_) => {}
        Err(e) => {
            errors.push(format!("pshtt.timeout: invalid format '{}' - {}", pshtt.timeout, e));
        }
    }
    if pshtt.concurrency == 0 {
        errors.push("pshtt.concurrency: must be at least 1".to_string());
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}

fn check_domain(domain: &str) -> Result<(), &'static str> {
    if domain.is_empty() {
        return Err("must not be empty");
    }
    if domain.contains("://") {
        return Err("specify the domain without the scheme, e.g. \"example.com\"");
    }
    if domain.contains('/') {
        return Err("must not contain a path");
    }
    if domain.chars().any(char::is_whitespace) {
        return Err("must not contain whitespace");
    }
    Ok(())
}
