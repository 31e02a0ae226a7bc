use crate::error::{ensure_finite, GradeError};
use crate::rating::{classify, GradeLabel, StyleRating};
use serde::de::Error as _;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

pub const ULTRA_LABEL: &str = "ULTRA";
pub const ULTRA_COLOR: &str = "#FFD700";

/// The grade shown for a whole performance.
///
/// `Ultra` is its own variant rather than a letter grade: it is only reachable
/// when both categories independently reach `SSS`, and never from a single
/// score, so `classify(10.0)` is still an ordinary `SSS`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OverallGrade {
    Rated(StyleRating),
    Ultra,
}

impl OverallGrade {
    pub fn label(&self) -> &'static str {
        match self {
            Self::Rated(rating) => rating.label().as_str(),
            Self::Ultra => ULTRA_LABEL,
        }
    }

    pub fn color(&self) -> &'static str {
        match self {
            Self::Rated(rating) => rating.color(),
            Self::Ultra => ULTRA_COLOR,
        }
    }

    pub fn is_ultra(&self) -> bool {
        matches!(self, Self::Ultra)
    }
}

impl From<StyleRating> for OverallGrade {
    fn from(rating: StyleRating) -> Self {
        OverallGrade::Rated(rating)
    }
}

impl fmt::Display for OverallGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl Serialize for OverallGrade {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        (self.label(), self.color()).serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for OverallGrade {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let (label, color) = <(String, String)>::deserialize(deserializer)?;
        if label == ULTRA_LABEL {
            if !color.eq_ignore_ascii_case(ULTRA_COLOR) {
                return Err(D::Error::custom(format!(
                    "color {color} does not belong to grade {ULTRA_LABEL}"
                )));
            }
            return Ok(OverallGrade::Ultra);
        }
        StyleRating::from_pair(&label, &color)
            .map(OverallGrade::Rated)
            .map_err(D::Error::custom)
    }
}

/// Combine the visual and audio category scores into the overall grade.
///
/// Both categories at `SSS` yields [`OverallGrade::Ultra`]. Anything else is
/// the letter grade of the mean.
pub fn combine(visual: f64, audio: f64) -> Result<OverallGrade, GradeError> {
    let visual = ensure_finite("visual score", visual)?;
    let audio = ensure_finite("audio score", audio)?;

    let both_sss =
        classify(visual).label() == GradeLabel::SSS && classify(audio).label() == GradeLabel::SSS;
    if both_sss {
        return Ok(OverallGrade::Ultra);
    }

    Ok(OverallGrade::Rated(classify(visual / 2.0 + audio / 2.0)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn both_sss_is_ultra() {
        assert_eq!(combine(9.6, 9.7).unwrap(), OverallGrade::Ultra);
        assert_eq!(combine(9.5, 9.5).unwrap(), OverallGrade::Ultra);
    }

    #[test]
    fn one_category_short_of_sss_grades_the_mean() {
        let grade = combine(9.6, 9.0).unwrap();
        assert_eq!(grade.label(), "SS");
        assert_eq!(grade.color(), "#FF0000");
    }

    #[test]
    fn mean_of_extreme_scores_stays_finite() {
        let grade = combine(-f64::MAX, -f64::MAX).unwrap();
        assert_eq!(grade.label(), "D");
        assert_eq!(combine(f64::MAX, 5.0).unwrap().label(), "SSS");
    }

    #[test]
    fn high_mean_alone_is_not_ultra() {
        // mean 9.7 is SSS, but audio alone is only SS
        let grade = combine(10.0, 9.4).unwrap();
        assert_eq!(grade, OverallGrade::Rated(classify(9.7)));
        assert!(!grade.is_ultra());
    }

    #[test]
    fn perfect_scores_are_ultra_but_perfect_classify_is_sss() {
        assert_eq!(combine(10.0, 10.0).unwrap(), OverallGrade::Ultra);
        assert_ne!(
            OverallGrade::from(classify(10.0)),
            combine(10.0, 10.0).unwrap()
        );
        assert_eq!(classify(10.0).label(), GradeLabel::SSS);
    }

    #[test]
    fn low_scores_grade_the_mean() {
        assert_eq!(combine(6.0, 5.0).unwrap().label(), "D");
        assert_eq!(combine(7.0, 9.0).unwrap().label(), "A");
    }

    #[test]
    fn rejects_non_finite_scores() {
        assert!(matches!(
            combine(f64::NAN, 9.0),
            Err(GradeError::InvalidScore { .. })
        ));
        assert!(combine(9.0, f64::NEG_INFINITY).is_err());
    }

    #[test]
    fn wire_form_is_label_color_pair() {
        assert_eq!(
            serde_json::to_string(&OverallGrade::Ultra).unwrap(),
            r##"["ULTRA","#FFD700"]"##
        );
        let rated: OverallGrade = serde_json::from_str(r##"["A","#FFA500"]"##).unwrap();
        assert_eq!(rated.label(), "A");
        let ultra: OverallGrade = serde_json::from_str(r##"["ULTRA","#FFD700"]"##).unwrap();
        assert!(ultra.is_ultra());
    }
}
