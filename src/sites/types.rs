use serde::{Deserialize, Serialize};
use unicode_normalization::UnicodeNormalization;

use crate::config::SiteConfig;
use crate::scan::{Scan, TriState};

/// A tracked news site.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Site {
    pub name: String,
    pub slug: String,
    pub domain: String,
}

impl Site {
    pub fn new(name: impl Into<String>, domain: impl Into<String>) -> Self {
        let name = name.into();
        Self {
            slug: slugify(&name),
            name,
            domain: domain.into(),
        }
    }

    /// Match a user-supplied identifier against the site's name, domain or slug
    pub fn matches(&self, ident: &str) -> bool {
        self.name.eq_ignore_ascii_case(ident)
            || self.domain.eq_ignore_ascii_case(ident)
            || self.slug == ident
    }
}

impl From<&SiteConfig> for Site {
    fn from(config: &SiteConfig) -> Self {
        Site::new(config.name.trim(), config.domain.trim())
    }
}

impl std::fmt::Display for Site {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.name)
    }
}

/// Turn a site name into a URL slug: lowercase ASCII letters, digits,
/// underscores and single hyphens.
///
/// Accented letters are decomposed (NFKD) and reduced to their ASCII base
/// letter. Anything else outside that set is dropped, and runs of
/// whitespace or hyphens collapse to one hyphen.
pub fn slugify(value: &str) -> String {
    let cleaned: String = value
        .nfkd()
        .filter(char::is_ascii)
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_' || *c == '-' || c.is_whitespace())
        .collect::<String>()
        .to_ascii_lowercase();

    let mut slug = String::with_capacity(cleaned.len());
    let mut pending_separator = false;
    for c in cleaned.trim().chars() {
        if c == '-' || c.is_whitespace() {
            pending_separator = true;
        } else {
            if pending_separator {
                slug.push('-');
                pending_separator = false;
            }
            slug.push(c);
        }
    }
    if pending_separator {
        slug.push('-');
    }
    slug
}

/// Public per-site record built from a site and its latest scan.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteSummary {
    pub domain: String,
    pub name: String,
    pub slug: String,
    pub live: bool,
    pub valid_https: TriState,
    pub default_https: TriState,
    pub enforces_https: TriState,
    pub downgrades_https: TriState,
    pub score: u8,
}

impl SiteSummary {
    pub fn from_latest(site: &Site, scan: &Scan) -> Self {
        Self {
            domain: site.domain.clone(),
            name: site.name.clone(),
            slug: site.slug.clone(),
            live: scan.live,
            valid_https: scan.result.valid_https,
            default_https: scan.result.defaults_to_https,
            enforces_https: scan.result.strictly_forces_https,
            downgrades_https: scan.result.downgrades_https,
            score: scan.score(),
        }
    }
}
