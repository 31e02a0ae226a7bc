use crate::error::{ensure_finite, GradeError};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Letter grades, ordered from lowest to highest.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum GradeLabel {
    D,
    C,
    B,
    A,
    S,
    SS,
    SSS,
}

impl GradeLabel {
    pub const ALL: [GradeLabel; 7] = [
        GradeLabel::D,
        GradeLabel::C,
        GradeLabel::B,
        GradeLabel::A,
        GradeLabel::S,
        GradeLabel::SS,
        GradeLabel::SSS,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::D => "D",
            Self::C => "C",
            Self::B => "B",
            Self::A => "A",
            Self::S => "S",
            Self::SS => "SS",
            Self::SSS => "SSS",
        }
    }

    /// Display color, as a `#RRGGBB` hex string.
    pub fn color(&self) -> &'static str {
        match self {
            Self::SSS | Self::SS | Self::S => "#FF0000",
            Self::A => "#FFA500",
            Self::B => "#FFD700",
            Self::C => "#00FF00",
            Self::D => "#0000FF",
        }
    }
}

impl fmt::Display for GradeLabel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for GradeLabel {
    type Err = GradeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        GradeLabel::ALL
            .into_iter()
            .find(|label| label.as_str() == s)
            .ok_or_else(|| GradeError::UnknownLabel(s.to_string()))
    }
}

/// Inclusive lower bounds, checked highest first. Anything below the last
/// entry is a `D`.
const THRESHOLDS: [(f64, GradeLabel); 6] = [
    (9.5, GradeLabel::SSS),
    (9.0, GradeLabel::SS),
    (8.5, GradeLabel::S),
    (8.0, GradeLabel::A),
    (7.0, GradeLabel::B),
    (6.0, GradeLabel::C),
];

/// A letter grade with its display color.
///
/// The only way to obtain one is through [`classify`] (or deserializing a
/// label/color pair that agrees with it), so the color always matches the
/// label.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StyleRating {
    label: GradeLabel,
}

impl StyleRating {
    pub fn label(&self) -> GradeLabel {
        self.label
    }

    pub fn color(&self) -> &'static str {
        self.label.color()
    }

    /// Rebuild a rating from its wire form, refusing a color that disagrees
    /// with the label.
    pub(crate) fn from_pair(label: &str, color: &str) -> Result<Self, String> {
        let label: GradeLabel = label.parse().map_err(|e: GradeError| e.to_string())?;
        if !label.color().eq_ignore_ascii_case(color) {
            return Err(format!("color {color} does not belong to grade {label}"));
        }
        Ok(StyleRating { label })
    }
}

impl fmt::Display for StyleRating {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.label, self.color())
    }
}

impl Serialize for StyleRating {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (self.label.as_str(), self.color()).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for StyleRating {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (label, color) = <(String, String)>::deserialize(deserializer)?;
        StyleRating::from_pair(&label, &color).map_err(D::Error::custom)
    }
}

/// Map a score to its letter grade.
///
/// Total over finite input: scores above 10 are `SSS`, negative scores are
/// `D`. NaN fails every comparison and lands on `D`; use [`try_classify`] for
/// untrusted values.
pub fn classify(score: f64) -> StyleRating {
    let label = THRESHOLDS
        .iter()
        .find(|(min, _)| score >= *min)
        .map(|(_, label)| *label)
        .unwrap_or(GradeLabel::D);
    StyleRating { label }
}

/// Like [`classify`], but rejects NaN and infinities.
pub fn try_classify(score: f64) -> Result<StyleRating, GradeError> {
    ensure_finite("score", score).map(classify)
}
