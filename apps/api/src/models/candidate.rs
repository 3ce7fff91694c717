use serde::{Deserialize, Serialize};

/// One skill a candidate claims, with a self-assessed level and the number
/// of portfolio samples backing it.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CandidateSkill {
    pub name: String,
    /// 1..=5; out-of-range values are clamped when scoring.
    pub level: i32,
    #[serde(default)]
    pub samples: u32,
}

impl CandidateSkill {
    pub fn new(name: impl Into<String>, level: i32, samples: u32) -> Self {
        Self {
            name: name.into(),
            level,
            samples,
        }
    }

    pub fn clamped_level(&self) -> u8 {
        self.level.clamp(1, 5) as u8
    }
}
