// Skill matching: fuzzy similarity, weighted candidate scoring and
// overlap-based job ranking.

pub mod fuzzy;
pub mod handlers;
pub mod overlap;
pub mod scoring;
