//! Compatibility scoring.
//!
//! Pure arithmetic over two users' personality archetypes, interest sets and
//! lifestyle preferences. Overall scores live in `[0, 99]`; 100 is
//! unreachable by construction.

use once_cell::sync::Lazy;
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};

use crate::models::{Lifestyle, PersonalityResult, Profile};

/// Pairwise archetype affinity. Stored one-directional; lookups fall back to
/// the reversed pair, so the table behaves commutatively.
static ARCHETYPE_TABLE: Lazy<HashMap<(&'static str, &'static str), u32>> = Lazy::new(|| {
    HashMap::from([
        (("dreamer", "anchor"), 100),
        (("explorer", "spark"), 95),
        (("sage", "anchor"), 90),
        (("nurturer", "dreamer"), 88),
        (("explorer", "sage"), 85),
        (("spark", "dreamer"), 82),
        (("nurturer", "anchor"), 80),
        (("explorer", "explorer"), 75),
        (("spark", "spark"), 72),
        (("sage", "sage"), 70),
        (("dreamer", "dreamer"), 68),
        (("nurturer", "nurturer"), 66),
        (("explorer", "anchor"), 60),
        (("spark", "sage"), 55),
    ])
});

const DEFAULT_ARCHETYPE_SCORE: u32 = 70;
const NO_COMMON_INTEREST_SCORE: u32 = 50;
const LIFESTYLE_BASE: u32 = 80;
const LIFESTYLE_ALCOHOL_BONUS: u32 = 10;
const OVERALL_CAP: u32 = 99;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompatibilityScore {
    pub overall: u32,
    pub personality: u32,
    pub interests: u32,
    pub lifestyle: u32,
}

pub fn compatibility(
    personality_a: &PersonalityResult,
    personality_b: &PersonalityResult,
    profile_a: &Profile,
    profile_b: &Profile,
) -> CompatibilityScore {
    let personality = personality_score(&personality_a.archetype, &personality_b.archetype);
    let interests = interest_score(&profile_a.interests, &profile_b.interests);
    let lifestyle = lifestyle_score(&profile_a.lifestyle, &profile_b.lifestyle);

    let weighted =
        0.5 * personality as f64 + 0.3 * interests as f64 + 0.2 * lifestyle as f64;
    let overall = (weighted.round() as u32).min(OVERALL_CAP);

    CompatibilityScore {
        overall,
        personality,
        interests,
        lifestyle,
    }
}

fn personality_score(a: &str, b: &str) -> u32 {
    ARCHETYPE_TABLE
        .get(&(a, b))
        .or_else(|| ARCHETYPE_TABLE.get(&(b, a)))
        .copied()
        .unwrap_or(DEFAULT_ARCHETYPE_SCORE)
}

fn interest_score(a: &[String], b: &[String]) -> u32 {
    let set_a: HashSet<&str> = a.iter().map(|s| s.as_str()).collect();
    let set_b: HashSet<&str> = b.iter().map(|s| s.as_str()).collect();

    let common = set_a.intersection(&set_b).count();
    if common == 0 {
        return NO_COMMON_INTEREST_SCORE;
    }

    let larger = set_a.len().max(set_b.len());
    (100.0 * common as f64 / larger as f64).round() as u32
}

fn lifestyle_score(a: &Lifestyle, b: &Lifestyle) -> u32 {
    let mut score = LIFESTYLE_BASE;
    if let (Some(pref_a), Some(pref_b)) = (&a.alcohol, &b.alcohol) {
        if !pref_a.is_empty() && pref_a == pref_b {
            score += LIFESTYLE_ALCOHOL_BONUS;
        }
    }
    score
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn personality(archetype: &str) -> PersonalityResult {
        PersonalityResult {
            archetype: archetype.to_string(),
            trait_scores: HashMap::new(),
            completed_at: Utc::now(),
        }
    }

    fn profile(interests: &[&str], alcohol: Option<&str>) -> Profile {
        Profile {
            user_id: "u".to_string(),
            display_name: "U".to_string(),
            bio: None,
            interests: interests.iter().map(|s| s.to_string()).collect(),
            lifestyle: Lifestyle {
                alcohol: alcohol.map(|s| s.to_string()),
                smoking: None,
            },
            created_at: Utc::now(),
        }
    }

    #[test]
    fn test_best_case_is_98() {
        // Table 100, identical non-empty interests (100), matching alcohol
        // (90): round(50 + 30 + 18) = 98.
        let score = compatibility(
            &personality("dreamer"),
            &personality("anchor"),
            &profile(&["hiking", "films"], Some("never")),
            &profile(&["hiking", "films"], Some("never")),
        );
        assert_eq!(score.personality, 100);
        assert_eq!(score.interests, 100);
        assert_eq!(score.lifestyle, 90);
        assert_eq!(score.overall, 98);
    }

    #[test]
    fn test_table_is_commutative() {
        let a = compatibility(
            &personality("anchor"),
            &personality("dreamer"),
            &profile(&[], None),
            &profile(&[], None),
        );
        assert_eq!(a.personality, 100);
    }

    #[test]
    fn test_unknown_pair_defaults_to_70() {
        let score = compatibility(
            &personality("wanderer"),
            &personality("anchor"),
            &profile(&[], None),
            &profile(&[], None),
        );
        assert_eq!(score.personality, 70);
    }

    #[test]
    fn test_disjoint_interests_fixed_at_50() {
        let score = compatibility(
            &personality("sage"),
            &personality("sage"),
            &profile(&["chess", "running"], None),
            &profile(&["pottery", "sailing"], None),
        );
        assert_eq!(score.interests, 50);
    }

    #[test]
    fn test_partial_overlap_uses_larger_set() {
        // 1 common out of max(3, 2) = 3 -> round(33.3) = 33.
        let score = compatibility(
            &personality("sage"),
            &personality("sage"),
            &profile(&["chess", "running", "films"], None),
            &profile(&["chess", "sailing"], None),
        );
        assert_eq!(score.interests, 33);
    }

    #[test]
    fn test_lifestyle_bonus_requires_both_set_and_equal() {
        let both = compatibility(
            &personality("sage"),
            &personality("sage"),
            &profile(&[], Some("socially")),
            &profile(&[], Some("socially")),
        );
        assert_eq!(both.lifestyle, 90);

        let one_missing = compatibility(
            &personality("sage"),
            &personality("sage"),
            &profile(&[], Some("socially")),
            &profile(&[], None),
        );
        assert_eq!(one_missing.lifestyle, 80);

        let different = compatibility(
            &personality("sage"),
            &personality("sage"),
            &profile(&[], Some("socially")),
            &profile(&[], Some("never")),
        );
        assert_eq!(different.lifestyle, 80);
    }

    #[test]
    fn test_overall_never_reaches_100() {
        // Exhaustive-ish sweep over table entries with maximal inputs.
        for ((a, b), _) in ARCHETYPE_TABLE.iter() {
            let score = compatibility(
                &personality(a),
                &personality(b),
                &profile(&["x"], Some("often")),
                &profile(&["x"], Some("often")),
            );
            assert!(score.overall <= 99, "{}-{} scored {}", a, b, score.overall);
        }
    }
}
