//! Resume skill extraction: pluggable, trait-based extractors that turn resume
//! text into `CandidateSkill`s.
//!
//! The keyword extractor is the default. The LLM extractor is enabled when an
//! API key is configured.

use std::collections::HashSet;

use async_trait::async_trait;
use serde::Deserialize;
use tracing::debug;

use crate::errors::AppError;
use crate::llm_client::prompts::{JSON_ONLY_SYSTEM, NO_INVENTION_INSTRUCTION};
use crate::llm_client::LlmClient;
use crate::matching::fuzzy::extract_one;
use crate::models::candidate::CandidateSkill;
use crate::resume::prompts::{EXTRACT_SKILLS_PROMPT, MAX_PROMPT_CHARS};

/// Level assigned to skills found by keyword search; the text says nothing
/// about proficiency.
pub const KEYWORD_SKILL_LEVEL: i32 = 3;

/// Vocabulary skills shorter than this (in chars) must match exactly.
/// Short names like "go" or "sql" collide with too many ordinary words.
pub const MIN_FUZZY_SKILL_CHARS: usize = 6;

/// Skills recognized by the keyword extractor, in output order.
pub const SKILL_VOCABULARY: &[&str] = &[
    "python",
    "django",
    "flask",
    "fastapi",
    "java",
    "javascript",
    "typescript",
    "react",
    "vue",
    "angular",
    "node.js",
    "php",
    "laravel",
    "c++",
    "c#",
    "go",
    "rust",
    "sql",
    "mysql",
    "postgresql",
    "mongodb",
    "redis",
    "docker",
    "kubernetes",
    "linux",
    "git",
    "rest api",
    "graphql",
    "html",
    "css",
    "machine learning",
    "data analysis",
    "excel",
    "power bi",
    "tableau",
    "microsoft office",
    "photoshop",
    "figma",
    "پشتیبانی",
    "حسابداری",
    "فروش",
    "بازاریابی",
];

// ────────────────────────────────────────────────────────────────────────────
// Trait definition
// ────────────────────────────────────────────────────────────────────────────

/// Carried in `AppState` as `Arc<dyn ResumeSkillExtractor>`.
#[async_trait]
pub trait ResumeSkillExtractor: Send + Sync {
    async fn extract(&self, text: &str) -> Result<Vec<CandidateSkill>, AppError>;

    /// Short label reported to clients ("keyword", "llm").
    fn backend(&self) -> &'static str;
}

// ────────────────────────────────────────────────────────────────────────────
// KeywordSkillExtractor
// ────────────────────────────────────────────────────────────────────────────

/// Vocabulary search over the resume's words and word pairs. Deterministic,
/// no network.
///
/// A vocabulary skill is found when it equals a token (one-word skills) or a
/// bigram (two-word skills), or when it is at least `MIN_FUZZY_SKILL_CHARS`
/// long and its best `token_sort_ratio` against those candidates reaches the
/// threshold. Candidates are deduplicated first, and ones whose length alone
/// keeps them under the threshold are never scored.
#[derive(Debug, Clone, Copy)]
pub struct KeywordSkillExtractor {
    threshold: f64,
}

impl KeywordSkillExtractor {
    pub fn new(threshold: f64) -> Self {
        Self { threshold }
    }

    pub fn find_skills(&self, text: &str) -> Vec<CandidateSkill> {
        let tokens = tokenize(text);
        let bigrams: HashSet<String> = tokens
            .windows(2)
            .map(|pair| format!("{} {}", pair[0], pair[1]))
            .collect();
        let tokens: HashSet<String> = tokens.into_iter().collect();

        SKILL_VOCABULARY
            .iter()
            .filter(|skill| {
                let candidates = if skill.contains(' ') { &bigrams } else { &tokens };
                candidates.contains(**skill) || self.fuzzy_hit(skill, candidates)
            })
            .map(|skill| CandidateSkill::new(*skill, KEYWORD_SKILL_LEVEL, 0))
            .collect()
    }

    fn fuzzy_hit(&self, skill: &str, candidates: &HashSet<String>) -> bool {
        let skill_len = skill.chars().count();
        if skill_len < MIN_FUZZY_SKILL_CHARS {
            return false;
        }
        let reachable: Vec<&str> = candidates
            .iter()
            .map(String::as_str)
            .filter(|c| max_ratio(skill_len, c.chars().count()) >= self.threshold)
            .collect();
        extract_one(skill, &reachable).is_some_and(|(_, score)| score >= self.threshold)
    }
}

/// Upper bound of `ratio` for strings of these char lengths: the common
/// subsequence is at most the shorter one.
fn max_ratio(a: usize, b: usize) -> f64 {
    if a + b == 0 {
        return 100.0;
    }
    200.0 * a.min(b) as f64 / (a + b) as f64
}

#[async_trait]
impl ResumeSkillExtractor for KeywordSkillExtractor {
    /// Scans on the blocking pool; uploads can run to megabytes of text.
    async fn extract(&self, text: &str) -> Result<Vec<CandidateSkill>, AppError> {
        let extractor = *self;
        let text = text.to_string();
        tokio::task::spawn_blocking(move || extractor.find_skills(&text))
            .await
            .map_err(|e| AppError::Internal(e.into()))
    }

    fn backend(&self) -> &'static str {
        "keyword"
    }
}

/// Lowercased words. `+`, `#` and inner `.` are kept so "C++", "C#" and
/// "Node.js" survive; a trailing sentence period is dropped.
fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !(c.is_alphanumeric() || matches!(c, '+' | '#' | '.' | '\u{200c}')))
        .map(|t| t.trim_matches('.'))
        .filter(|t| !t.is_empty())
        .map(str::to_string)
        .collect()
}

// ────────────────────────────────────────────────────────────────────────────
// LlmSkillExtractor
// ────────────────────────────────────────────────────────────────────────────

pub struct LlmSkillExtractor(pub LlmClient);

#[derive(Debug, Deserialize)]
struct ExtractedSkills {
    #[serde(default)]
    skills: Vec<ExtractedSkill>,
}

#[derive(Debug, Deserialize)]
struct ExtractedSkill {
    name: String,
    level: Option<i32>,
    samples: Option<u32>,
}

#[async_trait]
impl ResumeSkillExtractor for LlmSkillExtractor {
    async fn extract(&self, text: &str) -> Result<Vec<CandidateSkill>, AppError> {
        let excerpt: String = text.chars().take(MAX_PROMPT_CHARS).collect();
        let prompt = EXTRACT_SKILLS_PROMPT
            .replace("{no_invention}", NO_INVENTION_INSTRUCTION)
            .replace("{resume_text}", &excerpt);

        let parsed: ExtractedSkills = self
            .0
            .call_json(&prompt, JSON_ONLY_SYSTEM)
            .await
            .map_err(|e| AppError::Llm(format!("Failed to extract resume skills: {e}")))?;

        debug!(
            model = self.0.model(),
            count = parsed.skills.len(),
            "LLM returned resume skills"
        );
        Ok(clean_llm_skills(parsed.skills))
    }

    fn backend(&self) -> &'static str {
        "llm"
    }
}

/// Drops blank and repeated names (case-insensitive) and clamps levels to 1..=5.
fn clean_llm_skills(skills: Vec<ExtractedSkill>) -> Vec<CandidateSkill> {
    let mut seen = HashSet::new();
    skills
        .into_iter()
        .filter_map(|s| {
            let name = s.name.trim().to_string();
            if name.is_empty() || !seen.insert(name.to_lowercase()) {
                return None;
            }
            let level = s.level.unwrap_or(KEYWORD_SKILL_LEVEL).clamp(1, 5);
            Some(CandidateSkill::new(name, level, s.samples.unwrap_or(0)))
        })
        .collect()
}
