//! Weighted skill match: scores a candidate against a job's ordered list of
//! required skills.
//!
//! Algorithm:
//! 1. Required skill `i` gets a priority weight: 1.0, 0.9, 0.8, 0.7, 0.6 for
//!    the first five, 0.5 after that.
//! 2. Each required skill is matched against the candidate's skills:
//!    - exact (trimmed, lowercased) name → `exact`, score 100
//!    - best `token_sort_ratio` ≥ threshold → `fuzzy`
//!    - otherwise → `none` (the best score is still reported)
//! 3. A matched skill scores `weight × level_multiplier × sample_multiplier`,
//!    with level 1..=5 → 0.2..=1.0 and +5% per sample capped at +20%.
//! 4. percentage = total / (Σ weights × 1.2) × 100, rounded to 2 places.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::matching::fuzzy::extract_one;
use crate::models::candidate::CandidateSkill;

pub const PRIORITY_WEIGHTS: [f64; 5] = [1.0, 0.9, 0.8, 0.7, 0.6];
pub const DEFAULT_WEIGHT_AFTER_PRIORITY: f64 = 0.5;
pub const SAMPLE_PER: f64 = 0.05;
pub const SAMPLE_CAP: f64 = 0.20;
pub const DEFAULT_FUZZY_THRESHOLD: f64 = 75.0;
/// Matched skills below this level get an "improve your level" recommendation.
pub const LOW_LEVEL_BELOW: u8 = 3;

pub const LEARN_SKILL_MESSAGE: &str = "یادگیری این مهارت ضروری است.";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MatchType {
    Exact,
    Fuzzy,
    None,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchDetail {
    pub required_skill: String,
    pub matched_with: Option<String>,
    pub match_type: MatchType,
    pub fuzzy_score: Option<u32>,
    pub weight: f64,
    pub level: Option<u8>,
    pub sample_count: u32,
    pub sample_multiplier: f64,
    pub skill_score: f64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Recommendation {
    pub skill: String,
    pub recommendation: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchResult {
    pub percentage: f64,
    pub total_score: f64,
    pub max_possible_score: f64,
    pub details: Vec<MatchDetail>,
    pub recommendations: Vec<Recommendation>,
    pub required_skills: Vec<String>,
}

pub fn weight_for_index(idx: usize) -> f64 {
    PRIORITY_WEIGHTS
        .get(idx)
        .copied()
        .unwrap_or(DEFAULT_WEIGHT_AFTER_PRIORITY)
}

pub fn level_multiplier(level: u8) -> f64 {
    match level {
        1 => 0.2,
        2 => 0.4,
        3 => 0.6,
        4 => 0.8,
        5 => 1.0,
        _ => 0.2,
    }
}

pub fn sample_multiplier(samples: u32) -> f64 {
    1.0 + (samples as f64 * SAMPLE_PER).min(SAMPLE_CAP)
}

fn round_to(value: f64, places: i32) -> f64 {
    let factor = 10f64.powi(places);
    (value * factor).round() / factor
}

fn normalize(name: &str) -> String {
    name.trim().to_lowercase()
}

/// Scores `candidate` against `required_skills` (in priority order).
pub fn compute_match(
    required_skills: &[String],
    candidate: &[CandidateSkill],
    fuzzy_threshold: f64,
) -> MatchResult {
    // Later entries win on duplicate names.
    let mut by_name: HashMap<String, &CandidateSkill> = HashMap::new();
    let mut names: Vec<String> = Vec::new();
    for skill in candidate {
        let key = normalize(&skill.name);
        if by_name.insert(key.clone(), skill).is_none() {
            names.push(key);
        }
    }

    let weights: Vec<f64> = (0..required_skills.len()).map(weight_for_index).collect();
    let max_possible: f64 = weights.iter().sum::<f64>() * (1.0 + SAMPLE_CAP);

    let mut total_score = 0.0;
    let mut details = Vec::with_capacity(required_skills.len());

    for (required, &weight) in required_skills.iter().zip(&weights) {
        let key = normalize(required);

        let (matched, match_type, fuzzy_score) = match by_name.get(&key) {
            Some(skill) => (Some(*skill), MatchType::Exact, Some(100)),
            None => match extract_one(&key, &names) {
                Some((idx, score)) if score >= fuzzy_threshold => {
                    (by_name.get(&names[idx]).copied(), MatchType::Fuzzy, Some(score as u32))
                }
                Some((_, score)) => (None, MatchType::None, Some(score as u32)),
                None => (None, MatchType::None, None),
            },
        };

        let detail = match matched {
            Some(skill) => {
                let level = skill.clamped_level();
                let samp_mul = sample_multiplier(skill.samples);
                let skill_score = weight * level_multiplier(level) * samp_mul;
                total_score += skill_score;
                MatchDetail {
                    required_skill: required.clone(),
                    matched_with: Some(skill.name.clone()),
                    match_type,
                    fuzzy_score,
                    weight,
                    level: Some(level),
                    sample_count: skill.samples,
                    sample_multiplier: round_to(samp_mul, 3),
                    skill_score: round_to(skill_score, 4),
                }
            }
            None => MatchDetail {
                required_skill: required.clone(),
                matched_with: None,
                match_type,
                fuzzy_score,
                weight,
                level: None,
                sample_count: 0,
                sample_multiplier: 1.0,
                skill_score: 0.0,
            },
        };
        details.push(detail);
    }

    let percentage = if max_possible > 0.0 {
        round_to(total_score / max_possible * 100.0, 2)
    } else {
        0.0
    };

    let recommendations = build_recommendations(&details);

    MatchResult {
        percentage,
        total_score: round_to(total_score, 4),
        max_possible_score: round_to(max_possible, 4),
        details,
        recommendations,
        required_skills: required_skills.to_vec(),
    }
}

/// Missing skills must be learned; matched skills below level 3 should be improved.
fn build_recommendations(details: &[MatchDetail]) -> Vec<Recommendation> {
    details
        .iter()
        .filter_map(|d| match d.level {
            None => Some(Recommendation {
                skill: d.required_skill.clone(),
                recommendation: LEARN_SKILL_MESSAGE.to_string(),
            }),
            Some(level) if level < LOW_LEVEL_BELOW => Some(Recommendation {
                skill: d.required_skill.clone(),
                recommendation: format!(
                    "سطح مهارت پایین است (سطح فعلی: {level}). توصیه می‌شود سطح را ارتقا دهید."
                ),
            }),
            Some(_) => None,
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn required(names: &[&str]) -> Vec<String> {
        names.iter().map(|s| s.to_string()).collect()
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn test_weights_and_multipliers() {
        assert!(approx(weight_for_index(0), 1.0));
        assert!(approx(weight_for_index(4), 0.6));
        assert!(approx(weight_for_index(5), 0.5));
        assert!(approx(weight_for_index(42), 0.5));

        assert!(approx(level_multiplier(1), 0.2));
        assert!(approx(level_multiplier(5), 1.0));

        assert!(approx(sample_multiplier(0), 1.0));
        assert!(approx(sample_multiplier(2), 1.1));
        assert!(approx(sample_multiplier(10), 1.2));
    }

    #[test]
    fn test_perfect_candidate_scores_100() {
        let result = compute_match(
            &required(&["Python", "Django"]),
            &[
                CandidateSkill::new("python", 5, 4),
                CandidateSkill::new("django", 5, 4),
            ],
            DEFAULT_FUZZY_THRESHOLD,
        );
        assert!(approx(result.percentage, 100.0));
        assert!(result.recommendations.is_empty());
        assert!(result.details.iter().all(|d| d.match_type == MatchType::Exact));
    }

    #[test]
    fn test_worked_example() {
        // python: 1.0 * 0.8 * 1.1 = 0.88
        // django: 0.9 * 0.6 * 1.05 = 0.567
        // sql:    0.8 * 0.4 * 1.0 = 0.32
        // max:    2.7 * 1.2 = 3.24
        let result = compute_match(
            &required(&["python", "django", "sql"]),
            &[
                CandidateSkill::new("Python", 4, 2),
                CandidateSkill::new("Django", 3, 1),
                CandidateSkill::new("SQL", 2, 0),
            ],
            DEFAULT_FUZZY_THRESHOLD,
        );

        assert!(approx(result.total_score, 1.767));
        assert!(approx(result.max_possible_score, 3.24));
        assert!(approx(result.percentage, 54.54));
        assert!(approx(result.details[1].sample_multiplier, 1.05));
        assert!(approx(result.details[1].skill_score, 0.567));

        assert_eq!(result.recommendations.len(), 1);
        assert_eq!(result.recommendations[0].skill, "sql");
        assert!(result.recommendations[0].recommendation.contains("سطح فعلی: 2"));
    }

    #[test]
    fn test_fuzzy_match_above_threshold() {
        let result = compute_match(
            &required(&["PostgreSQL"]),
            &[CandidateSkill::new("postgres", 4, 0)],
            DEFAULT_FUZZY_THRESHOLD,
        );
        let detail = &result.details[0];
        assert_eq!(detail.match_type, MatchType::Fuzzy);
        assert_eq!(detail.matched_with.as_deref(), Some("postgres"));
        assert_eq!(detail.fuzzy_score, Some(88));
        assert_eq!(detail.level, Some(4));
    }

    #[test]
    fn test_below_threshold_reports_score_without_match() {
        let result = compute_match(
            &required(&["java"]),
            &[CandidateSkill::new("javascript", 5, 0)],
            DEFAULT_FUZZY_THRESHOLD,
        );
        let detail = &result.details[0];
        assert_eq!(detail.match_type, MatchType::None);
        assert_eq!(detail.matched_with, None);
        assert_eq!(detail.fuzzy_score, Some(57));
        assert!(approx(detail.skill_score, 0.0));
        assert_eq!(result.recommendations[0].recommendation, LEARN_SKILL_MESSAGE);
    }

    #[test]
    fn test_no_candidate_skills() {
        let result = compute_match(&required(&["rust"]), &[], DEFAULT_FUZZY_THRESHOLD);
        assert_eq!(result.details[0].match_type, MatchType::None);
        assert_eq!(result.details[0].fuzzy_score, None);
        assert!(approx(result.percentage, 0.0));
    }

    #[test]
    fn test_no_required_skills() {
        let result = compute_match(&[], &[CandidateSkill::new("rust", 5, 0)], 75.0);
        assert!(approx(result.percentage, 0.0));
        assert!(approx(result.max_possible_score, 0.0));
        assert!(result.details.is_empty());
    }

    #[test]
    fn test_level_is_clamped() {
        let result = compute_match(
            &required(&["rust"]),
            &[CandidateSkill::new("rust", 11, 0)],
            DEFAULT_FUZZY_THRESHOLD,
        );
        assert_eq!(result.details[0].level, Some(5));
    }

    #[test]
    fn test_duplicate_candidate_last_wins() {
        let result = compute_match(
            &required(&["rust"]),
            &[CandidateSkill::new("Rust", 1, 0), CandidateSkill::new("rust ", 5, 0)],
            DEFAULT_FUZZY_THRESHOLD,
        );
        assert_eq!(result.details[0].level, Some(5));
        assert_eq!(result.details[0].matched_with.as_deref(), Some("rust "));
    }

    #[test]
    fn test_sixth_skill_uses_default_weight() {
        let req = required(&["a", "b", "c", "d", "e", "f"]);
        let result = compute_match(&req, &[CandidateSkill::new("f", 5, 0)], 75.0);
        assert!(approx(result.details[5].weight, 0.5));
        assert!(approx(result.details[5].skill_score, 0.5));
    }
}
