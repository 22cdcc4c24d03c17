use crate::scan::ScanResult;

/// HSTS max-age in seconds that earns the long-lived policy bonus (18 weeks)
pub const HSTS_MIN_MAX_AGE: u64 = 18 * 7 * 24 * 60 * 60;

pub const MAX_SCORE: u32 = 100;

/// The highest HTTPS tier a site reached. Each tier replaces the previous
/// tier's base score instead of adding to it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Tier {
    None,
    Downgrades,
    Defaults,
    StrictlyForces,
}

impl Tier {
    pub fn base_score(self) -> u32 {
        match self {
            Tier::None => 0,
            Tier::Downgrades => 30,
            Tier::Defaults => 50,
            Tier::StrictlyForces => 70,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Tier::None => "No valid HTTPS",
            Tier::Downgrades => "Downgrades HTTPS",
            Tier::Defaults => "Defaults to HTTPS",
            Tier::StrictlyForces => "Strictly forces HTTPS",
        }
    }
}

#[derive(Debug, Clone)]
pub struct FactorContribution {
    pub label: String,       // e.g. "Tier", "HSTS max-age"
    pub description: String, // e.g. "defaults to HTTPS -> 50", "+5"
    pub before: u32,
    pub after: u32,
}

#[derive(Debug, Clone)]
pub struct ScoreResult {
    pub score: u8,
    pub tier: Tier,
    pub factors: Vec<FactorContribution>,
}

/// Compute the 0-100 HTTPS quality score for a scan result.
pub fn compute_score(result: &ScanResult) -> u8 {
    calculate_score(result).score
}

/// Compute the score along with the tier and every factor that contributed.
///
/// # Panics
///
/// Panics if the tiers and bonuses ever produce a score above 100. That is a
/// defect in the scoring table, not a property of the input.
pub fn calculate_score(result: &ScanResult) -> ScoreResult {
    let mut score = 0;
    let mut tier = Tier::None;
    let mut factors = Vec::new();

    if result.valid_https.is_true() {
        if result.downgrades_https.is_true() {
            set_tier(&mut score, &mut tier, Tier::Downgrades, &mut factors);
        }
        if result.defaults_to_https.is_true() {
            set_tier(&mut score, &mut tier, Tier::Defaults, &mut factors);
        }
        if result.strictly_forces_https.is_true() {
            set_tier(&mut score, &mut tier, Tier::StrictlyForces, &mut factors);

            if result.hsts.is_true() {
                add_bonus(&mut score, "HSTS", "HSTS header present".to_string(), 5, &mut factors);
            }

            if let Some(max_age) = result.hsts_max_age {
                if max_age >= HSTS_MIN_MAX_AGE {
                    add_bonus(
                        &mut score,
                        "HSTS max-age",
                        format!("max-age {}s >= {}s", max_age, HSTS_MIN_MAX_AGE),
                        5,
                        &mut factors,
                    );
                }
            }

            if result.hsts_entire_domain.is_true() {
                add_bonus(
                    &mut score,
                    "HSTS entire domain",
                    "includeSubDomains on the base domain".to_string(),
                    10,
                    &mut factors,
                );
            }
            if result.hsts_preload_ready.is_true() {
                add_bonus(&mut score, "Preload ready", "ready for the HSTS preload list".to_string(), 5, &mut factors);
            }
            if result.hsts_preloaded.is_true() {
                add_bonus(&mut score, "Preloaded", "on the HSTS preload list".to_string(), 5, &mut factors);
            }
        }
    }

    assert!(
        score <= MAX_SCORE,
        "score must be between 0 and 100 (inclusive), is: {}",
        score
    );

    ScoreResult {
        score: score as u8,
        tier,
        factors,
    }
}

fn set_tier(score: &mut u32, tier: &mut Tier, next: Tier, factors: &mut Vec<FactorContribution>) {
    let before = *score;
    *score = next.base_score();
    *tier = next;
    factors.push(FactorContribution {
        label: "Tier".to_string(),
        description: format!("{} -> {}", next.label(), next.base_score()),
        before,
        after: *score,
    });
}

fn add_bonus(
    score: &mut u32,
    label: &str,
    description: String,
    points: u32,
    factors: &mut Vec<FactorContribution>,
) {
    let before = *score;
    *score += points;
    factors.push(FactorContribution {
        label: label.to_string(),
        description: format!("{} (+{})", description, points),
        before,
        after: *score,
    });
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::scan::TriState;

    fn https_result() -> ScanResult {
        ScanResult {
            valid_https: TriState::True,
            ..Default::default()
        }
    }

    fn all_true() -> ScanResult {
        ScanResult {
            valid_https: TriState::True,
            downgrades_https: TriState::True,
            defaults_to_https: TriState::True,
            strictly_forces_https: TriState::True,
            hsts: TriState::True,
            hsts_max_age: Some(HSTS_MIN_MAX_AGE),
            hsts_entire_domain: TriState::True,
            hsts_preload_ready: TriState::True,
            hsts_preloaded: TriState::True,
        }
    }

    #[test]
    fn test_eighteen_weeks_in_seconds() {
        assert_eq!(HSTS_MIN_MAX_AGE, 10_886_400);
    }

    #[test]
    fn test_empty_result_scores_zero() {
        let result = calculate_score(&ScanResult::default());
        assert_eq!(result.score, 0);
        assert_eq!(result.tier, Tier::None);
        assert!(result.factors.is_empty());
    }

    #[test]
    fn test_invalid_https_scores_zero_regardless() {
        let mut result = all_true();
        result.valid_https = TriState::False;
        assert_eq!(compute_score(&result), 0);

        result.valid_https = TriState::Unknown;
        assert_eq!(compute_score(&result), 0);
    }

    #[test]
    fn test_downgrades_only() {
        let mut result = https_result();
        result.downgrades_https = TriState::True;
        assert_eq!(compute_score(&result), 30);
    }

    #[test]
    fn test_defaults_only() {
        let mut result = https_result();
        result.defaults_to_https = TriState::True;
        assert_eq!(compute_score(&result), 50);
    }

    #[test]
    fn test_defaults_overrides_downgrades() {
        let mut result = https_result();
        result.downgrades_https = TriState::True;
        result.defaults_to_https = TriState::True;

        let scored = calculate_score(&result);
        assert_eq!(scored.score, 50);
        assert_eq!(scored.tier, Tier::Defaults);
        assert_eq!(scored.factors.len(), 2);
        assert_eq!(scored.factors[1].before, 30);
        assert_eq!(scored.factors[1].after, 50);
    }

    #[test]
    fn test_strictly_forces_without_bonuses() {
        let mut result = https_result();
        result.strictly_forces_https = TriState::True;
        result.hsts = TriState::False;
        assert_eq!(compute_score(&result), 70);
    }

    #[test]
    fn test_strictly_forces_replaces_lower_tiers() {
        let mut result = https_result();
        result.downgrades_https = TriState::True;
        result.defaults_to_https = TriState::True;
        result.strictly_forces_https = TriState::True;
        assert_eq!(compute_score(&result), 70);
    }

    #[test]
    fn test_all_bonuses_reach_maximum() {
        let scored = calculate_score(&all_true());
        assert_eq!(scored.score, 100);
        assert_eq!(scored.tier, Tier::StrictlyForces);
        assert_eq!(scored.factors.last().unwrap().after, 100);
    }

    #[test]
    fn test_max_age_one_second_short() {
        let mut result = https_result();
        result.strictly_forces_https = TriState::True;
        result.hsts_max_age = Some(HSTS_MIN_MAX_AGE - 1);
        assert_eq!(compute_score(&result), 70);

        result.hsts_max_age = Some(HSTS_MIN_MAX_AGE);
        assert_eq!(compute_score(&result), 75);
    }

    #[test]
    fn test_bonuses_ignored_below_strict_tier() {
        let mut result = all_true();
        result.strictly_forces_https = TriState::Unknown;
        assert_eq!(compute_score(&result), 50);
    }

    #[test]
    fn test_entire_domain_worth_ten() {
        let mut result = https_result();
        result.strictly_forces_https = TriState::True;
        result.hsts_entire_domain = TriState::True;
        assert_eq!(compute_score(&result), 80);
    }

    #[test]
    fn test_score_always_in_range() {
        let states = [TriState::True, TriState::False, TriState::Unknown];
        let ages = [None, Some(0), Some(HSTS_MIN_MAX_AGE - 1), Some(HSTS_MIN_MAX_AGE), Some(u64::MAX)];
        for &valid in &states {
            for &forces in &states {
                for &flag in &states {
                    for &age in &ages {
                        let result = ScanResult {
                            valid_https: valid,
                            downgrades_https: flag,
                            defaults_to_https: flag,
                            strictly_forces_https: forces,
                            hsts: flag,
                            hsts_max_age: age,
                            hsts_entire_domain: flag,
                            hsts_preload_ready: flag,
                            hsts_preloaded: flag,
                        };
                        assert!(compute_score(&result) <= 100);
                    }
                }
            }
        }
    }
}
