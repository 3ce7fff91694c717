//! Quick job ranking by plain skill-set overlap (no weights, no fuzziness).

use std::collections::HashSet;

use serde::Serialize;

use crate::models::job::JobWithCategories;

pub const RECOMMEND_THRESHOLD: u32 = 50;
pub const RECOMMENDED_LABEL: &str = "پیشنهاد می‌شود";
pub const NEEDS_IMPROVEMENT_LABEL: &str = "نیاز به بهبود مهارت‌ها";

#[derive(Debug, Clone, Serialize)]
pub struct JobRecommendation {
    pub job_id: i64,
    pub job_title: String,
    pub url: String,
    pub categories: Vec<String>,
    pub skills_required: Vec<String>,
    pub match_percent: u32,
    pub recommendation: String,
}

fn skill_set<S: AsRef<str>>(skills: &[S]) -> HashSet<String> {
    skills
        .iter()
        .map(|s| s.as_ref().trim().to_lowercase())
        .filter(|s| !s.is_empty())
        .collect()
}

/// Share of the job's skills the user has, floored to a whole percent.
pub fn overlap_percent<A: AsRef<str>, B: AsRef<str>>(job_skills: &[A], user_skills: &[B]) -> u32 {
    let job = skill_set(job_skills);
    if job.is_empty() {
        return 0;
    }
    let user = skill_set(user_skills);
    let common = job.intersection(&user).count();
    (common * 100 / job.len()) as u32
}

/// Ranks jobs by overlap, best first. Jobs with equal scores keep their input order.
pub fn rank_jobs(jobs: Vec<JobWithCategories>, user_skills: &[String]) -> Vec<JobRecommendation> {
    let mut ranked: Vec<JobRecommendation> = jobs
        .into_iter()
        .map(|job| {
            let match_percent = overlap_percent(&job.skills, user_skills);
            let recommendation = if match_percent >= RECOMMEND_THRESHOLD {
                RECOMMENDED_LABEL
            } else {
                NEEDS_IMPROVEMENT_LABEL
            };
            JobRecommendation {
                job_id: job.id,
                job_title: job.job_title,
                url: job.url,
                categories: job.categories,
                skills_required: job.skills,
                match_percent,
                recommendation: recommendation.to_string(),
            }
        })
        .collect();

    ranked.sort_by(|a, b| b.match_percent.cmp(&a.match_percent));
    ranked
}
