use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Player skill bracket used to pick demo scores and practice material.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase", try_from = "SkillRepr")]
pub enum SkillLevel {
    Beginner,
    #[default]
    Intermediate,
    Advanced,
}

impl SkillLevel {
    /// Map a 1-10 self rating onto a bracket.
    pub fn from_rating(rating: u8) -> Self {
        match rating {
            0..=3 => Self::Beginner,
            4..=7 => Self::Intermediate,
            _ => Self::Advanced,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Beginner => "beginner",
            Self::Intermediate => "intermediate",
            Self::Advanced => "advanced",
        }
    }

    /// Practice tempo in BPM.
    pub fn tempo(&self) -> u32 {
        match self {
            Self::Beginner => 80,
            Self::Intermediate => 100,
            Self::Advanced => 120,
        }
    }

    pub fn complexity(&self) -> f64 {
        match self {
            Self::Beginner => 0.3,
            Self::Intermediate => 0.6,
            Self::Advanced => 0.9,
        }
    }

    /// Scripted (visual, audio) category scores for demos.
    pub fn demo_scores(&self) -> (f64, f64) {
        match self {
            Self::Beginner => (6.5, 6.2),
            Self::Intermediate => (7.8, 8.1),
            Self::Advanced => (9.2, 9.5),
        }
    }
}

impl fmt::Display for SkillLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SkillLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let trimmed = s.trim();
        if let Ok(rating) = trimmed.parse::<u8>() {
            return Self::try_from(SkillRepr::Rating(rating));
        }
        match trimmed.to_ascii_lowercase().as_str() {
            "beginner" => Ok(Self::Beginner),
            "intermediate" => Ok(Self::Intermediate),
            "advanced" => Ok(Self::Advanced),
            other => Err(format!(
                "unknown skill level {other:?} (expected beginner, intermediate, advanced or 1-10)"
            )),
        }
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum SkillRepr {
    Rating(u8),
    Name(String),
}

impl TryFrom<SkillRepr> for SkillLevel {
    type Error = String;

    fn try_from(repr: SkillRepr) -> Result<Self, Self::Error> {
        match repr {
            SkillRepr::Rating(rating @ 1..=10) => Ok(Self::from_rating(rating)),
            SkillRepr::Rating(rating) => Err(format!("skill rating {rating} is outside 1-10")),
            SkillRepr::Name(name) => name.parse(),
        }
    }
}
