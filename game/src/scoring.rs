use serde::{Deserialize, Serialize};

/// Final grade for a completed level. Mistakes are counted during the test
/// phase only; practice mistakes never reach this type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Grade {
    pub stars: u8,
    pub score: u32,
    pub mistakes: u32,
}

impl Grade {
    pub fn from_mistakes(mistakes: u32) -> Self {
        Self {
            stars: stars(mistakes),
            score: score(mistakes),
            mistakes,
        }
    }
}

pub fn stars(mistakes: u32) -> u8 {
    match mistakes {
        0 | 1 => 3,
        2..=4 => 2,
        _ => 1,
    }
}

pub fn score(mistakes: u32) -> u32 {
    100u32.saturating_sub(mistakes.saturating_mul(10)).max(10)
}
