//! The feedback record handed back to users, and the correction flow that
//! keeps its derived scores and grades in step with the aspect scores.

use crate::aggregate::aggregate;
use crate::combine::{combine, OverallGrade};
use crate::error::{ensure_finite, GradeError};
use crate::rating::{classify, StyleRating};
use serde::de::{Error as _, MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;
use std::str::FromStr;

/// Key that carries the category score on the wire. Never an aspect name.
pub const RESERVED_ASPECT_NAME: &str = "score";

/// The two scored dimensions of a performance.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Category {
    #[serde(alias = "visual_feedback")]
    Visual,
    #[serde(alias = "audio_feedback")]
    Audio,
}

impl Category {
    pub const ALL: [Category; 2] = [Category::Visual, Category::Audio];

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Visual => "visual",
            Self::Audio => "audio",
        }
    }
}

impl fmt::Display for Category {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Category {
    type Err = GradeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "visual" | "visual_feedback" => Ok(Self::Visual),
            "audio" | "audio_feedback" => Ok(Self::Audio),
            other => Err(GradeError::UnknownCategory(other.to_string())),
        }
    }
}

/// One named sub-score with its remarks.
///
/// The score is private so the derived `style_rating` cannot drift from it.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreAspect {
    pub name: String,
    score: f64,
    pub feedback: Vec<String>,
    style_rating: StyleRating,
}

impl ScoreAspect {
    pub fn new(name: impl Into<String>, score: f64, feedback: Vec<String>) -> Self {
        Self {
            name: name.into(),
            score,
            feedback,
            style_rating: classify(score),
        }
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn style_rating(&self) -> StyleRating {
        self.style_rating
    }

    fn set_score(&mut self, score: f64) {
        self.score = score;
        self.style_rating = classify(score);
    }
}

#[derive(Serialize)]
struct AspectBodyRef<'a> {
    score: f64,
    feedback: &'a [String],
    style_rating: StyleRating,
}

// `style_rating` is accepted but ignored on input; it is always recomputed.
#[derive(Deserialize)]
struct AspectBody {
    score: f64,
    #[serde(default)]
    feedback: Vec<String>,
}

/// Aspects of one category in display order, plus their mean.
#[derive(Debug, Clone, PartialEq)]
pub struct CategoryFeedback {
    aspects: Vec<ScoreAspect>,
    score: f64,
}

impl CategoryFeedback {
    /// Build a category, rejecting duplicate or reserved aspect names.
    pub fn new(aspects: Vec<ScoreAspect>) -> Result<Self, GradeError> {
        for (i, aspect) in aspects.iter().enumerate() {
            if aspects[..i].iter().any(|a| a.name == aspect.name) {
                return Err(GradeError::DuplicateAspect(aspect.name.clone()));
            }
        }
        let mut category = Self {
            aspects,
            score: 0.0,
        };
        category.regrade()?;
        Ok(category)
    }

    pub fn score(&self) -> f64 {
        self.score
    }

    pub fn grade(&self) -> StyleRating {
        classify(self.score)
    }

    pub fn aspects(&self) -> &[ScoreAspect] {
        &self.aspects
    }

    pub fn get(&self, name: &str) -> Option<&ScoreAspect> {
        self.aspects.iter().find(|a| a.name == name)
    }

    pub fn len(&self) -> usize {
        self.aspects.len()
    }

    pub fn is_empty(&self) -> bool {
        self.aspects.is_empty()
    }

    fn regrade(&mut self) -> Result<(), GradeError> {
        for aspect in &mut self.aspects {
            aspect.style_rating = classify(aspect.score);
        }
        self.score = aggregate(&self.aspects)?;
        Ok(())
    }

    /// Overwrite one aspect score. Returns false when the aspect is absent.
    fn set_score(&mut self, aspect: &str, score: f64) -> bool {
        match self.aspects.iter_mut().find(|a| a.name == aspect) {
            Some(found) => {
                found.set_score(score);
                true
            }
            None => false,
        }
    }
}

impl Serialize for CategoryFeedback {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.aspects.len() + 1))?;
        for aspect in &self.aspects {
            map.serialize_entry(
                &aspect.name,
                &AspectBodyRef {
                    score: aspect.score,
                    feedback: &aspect.feedback,
                    style_rating: aspect.style_rating,
                },
            )?;
        }
        map.serialize_entry(RESERVED_ASPECT_NAME, &self.score)?;
        map.end()
    }
}

impl<'de> Deserialize<'de> for CategoryFeedback {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct CategoryVisitor;

        impl<'de> Visitor<'de> for CategoryVisitor {
            type Value = CategoryFeedback;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of aspect names to scored aspects")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut aspects = Vec::new();
                while let Some(key) = map.next_key::<String>()? {
                    if key == RESERVED_ASPECT_NAME {
                        // The stored mean is recomputed below.
                        map.next_value::<f64>()?;
                        continue;
                    }
                    let body: AspectBody = map.next_value()?;
                    aspects.push(ScoreAspect::new(key, body.score, body.feedback));
                }
                CategoryFeedback::new(aspects).map_err(A::Error::custom)
            }
        }

        deserializer.deserialize_map(CategoryVisitor)
    }
}

/// Coaching tips keyed by tip category, in insertion order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EducationTips(Vec<(String, Vec<String>)>);

impl EducationTips {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the tips for a category, replacing any earlier entry in place.
    pub fn insert(&mut self, category: impl Into<String>, tips: Vec<String>) {
        let category = category.into();
        match self.0.iter_mut().find(|(name, _)| *name == category) {
            Some((_, existing)) => *existing = tips,
            None => self.0.push((category, tips)),
        }
    }

    pub fn get(&self, category: &str) -> Option<&[String]> {
        self.0
            .iter()
            .find(|(name, _)| name == category)
            .map(|(_, tips)| tips.as_slice())
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &[String])> {
        self.0.iter().map(|(name, tips)| (name.as_str(), tips.as_slice()))
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl Serialize for EducationTips {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.0.len()))?;
        for (name, tips) in &self.0 {
            map.serialize_entry(name, tips)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for EducationTips {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        struct TipsVisitor;

        impl<'de> Visitor<'de> for TipsVisitor {
            type Value = EducationTips;

            fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
                f.write_str("a map of tip categories to lists of tips")
            }

            fn visit_map<A: MapAccess<'de>>(self, mut map: A) -> Result<Self::Value, A::Error> {
                let mut tips = EducationTips::new();
                while let Some((name, list)) = map.next_entry::<String, Vec<String>>()? {
                    tips.insert(name, list);
                }
                Ok(tips)
            }
        }

        deserializer.deserialize_map(TipsVisitor)
    }
}

/// Grades derived from the two category scores.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GradeSummary {
    pub visual_grade: StyleRating,
    pub audio_grade: StyleRating,
    pub overall_grade: OverallGrade,
    #[serde(default)]
    pub performance_summary: Option<String>,
}

/// A correction to a single aspect score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoreEdit {
    pub category: Category,
    pub aspect: String,
    pub score: f64,
}

/// A complete, internally consistent performance report.
///
/// Fields are private: the only ways to change a report are
/// [`PerformanceReport::apply_edits`] and the `with_*` builders, all of which
/// leave every derived score and grade recomputed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ReportWire")]
pub struct PerformanceReport {
    visual_feedback: CategoryFeedback,
    audio_feedback: CategoryFeedback,
    education_tips: EducationTips,
    summary: GradeSummary,
}

#[derive(Deserialize)]
struct ReportWire {
    visual_feedback: CategoryFeedback,
    audio_feedback: CategoryFeedback,
    #[serde(default)]
    education_tips: EducationTips,
    #[serde(default)]
    summary: Option<SummaryWire>,
}

// Grades are recomputed; only the free-text summary survives a round trip.
#[derive(Deserialize)]
struct SummaryWire {
    #[serde(default)]
    performance_summary: Option<String>,
}

impl TryFrom<ReportWire> for PerformanceReport {
    type Error = GradeError;

    fn try_from(wire: ReportWire) -> Result<Self, Self::Error> {
        PerformanceReport::from_categories(
            wire.visual_feedback,
            wire.audio_feedback,
            wire.education_tips,
            wire.summary.and_then(|s| s.performance_summary),
        )
    }
}

impl PerformanceReport {
    /// Aggregate both categories and grade the result.
    pub fn assemble(
        visual: Vec<ScoreAspect>,
        audio: Vec<ScoreAspect>,
        education_tips: EducationTips,
        performance_summary: Option<String>,
    ) -> Result<Self, GradeError> {
        Self::from_categories(
            CategoryFeedback::new(visual)?,
            CategoryFeedback::new(audio)?,
            education_tips,
            performance_summary,
        )
    }

    pub fn from_categories(
        visual_feedback: CategoryFeedback,
        audio_feedback: CategoryFeedback,
        education_tips: EducationTips,
        performance_summary: Option<String>,
    ) -> Result<Self, GradeError> {
        let summary = grade_summary(&visual_feedback, &audio_feedback, performance_summary)?;
        Ok(Self {
            visual_feedback,
            audio_feedback,
            education_tips,
            summary,
        })
    }

    pub fn visual_feedback(&self) -> &CategoryFeedback {
        &self.visual_feedback
    }

    pub fn audio_feedback(&self) -> &CategoryFeedback {
        &self.audio_feedback
    }

    pub fn category(&self, category: Category) -> &CategoryFeedback {
        match category {
            Category::Visual => &self.visual_feedback,
            Category::Audio => &self.audio_feedback,
        }
    }

    fn category_mut(&mut self, category: Category) -> &mut CategoryFeedback {
        match category {
            Category::Visual => &mut self.visual_feedback,
            Category::Audio => &mut self.audio_feedback,
        }
    }

    pub fn education_tips(&self) -> &EducationTips {
        &self.education_tips
    }

    pub fn summary(&self) -> &GradeSummary {
        &self.summary
    }

    pub fn overall_grade(&self) -> OverallGrade {
        self.summary.overall_grade
    }

    /// Mean of the two category scores.
    pub fn overall_score(&self) -> f64 {
        (self.visual_feedback.score + self.audio_feedback.score) / 2.0
    }

    /// Every aspect of both categories, visual first.
    pub fn all_aspects(&self) -> impl Iterator<Item = (Category, &ScoreAspect)> {
        Category::ALL
            .into_iter()
            .flat_map(move |c| self.category(c).aspects().iter().map(move |a| (c, a)))
    }

    pub fn with_performance_summary(mut self, performance_summary: Option<String>) -> Self {
        self.summary.performance_summary = performance_summary;
        self
    }

    pub fn with_education_tips(mut self, education_tips: EducationTips) -> Self {
        self.education_tips = education_tips;
        self
    }

    /// Recompute every derived field from the current aspect scores.
    pub fn regrade(&mut self) -> Result<(), GradeError> {
        self.visual_feedback.regrade()?;
        self.audio_feedback.regrade()?;
        let performance_summary = self.summary.performance_summary.take();
        self.summary = grade_summary(
            &self.visual_feedback,
            &self.audio_feedback,
            performance_summary,
        )?;
        Ok(())
    }

    /// Return a regraded copy with the edits applied.
    ///
    /// Either every edit lands or none does: `self` is never touched, and the
    /// first bad edit aborts the whole batch.
    pub fn apply_edits(&self, edits: &[ScoreEdit]) -> Result<Self, GradeError> {
        let mut next = self.clone();
        for edit in edits {
            let score = ensure_finite(&edit.aspect, edit.score)?;
            if !next.category_mut(edit.category).set_score(&edit.aspect, score) {
                return Err(GradeError::UnknownAspect {
                    category: edit.category,
                    aspect: edit.aspect.clone(),
                });
            }
        }
        next.regrade()?;
        Ok(next)
    }
}

fn grade_summary(
    visual: &CategoryFeedback,
    audio: &CategoryFeedback,
    performance_summary: Option<String>,
) -> Result<GradeSummary, GradeError> {
    Ok(GradeSummary {
        visual_grade: visual.grade(),
        audio_grade: audio.grade(),
        overall_grade: combine(visual.score, audio.score)?,
        performance_summary,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::rating::GradeLabel;
    use pretty_assertions::assert_eq;

    fn aspects(specs: &[(&str, f64)]) -> Vec<ScoreAspect> {
        specs
            .iter()
            .map(|(name, score)| ScoreAspect::new(*name, *score, vec![format!("{name} note")]))
            .collect()
    }

    fn sample_report() -> PerformanceReport {
        let mut tips = EducationTips::new();
        tips.insert("immediate_focus", vec!["Work on rhythm".to_string()]);
        PerformanceReport::assemble(
            aspects(&[("posture", 9.0), ("finger_position", 8.0), ("confidence", 7.0)]),
            aspects(&[("tempo", 9.6), ("pitch", 9.8), ("rhythm", 9.7)]),
            tips,
            Some("Nice work".to_string()),
        )
        .unwrap()
    }

    #[test]
    fn assemble_computes_category_scores_and_grades() {
        let report = sample_report();
        assert_eq!(report.visual_feedback().score(), 8.0);
        assert_eq!(report.summary().visual_grade.label(), GradeLabel::A);
        assert_eq!(report.summary().audio_grade.label(), GradeLabel::SSS);
        // mean of 8.0 and 9.7 is 8.85
        assert_eq!(report.overall_grade().label(), "S");
        assert_eq!(
            report.visual_feedback().get("confidence").unwrap().style_rating().label(),
            GradeLabel::B
        );
    }

    #[test]
    fn assemble_rejects_empty_or_reserved_categories() {
        let err = PerformanceReport::assemble(
            vec![],
            aspects(&[("tempo", 8.0)]),
            EducationTips::new(),
            None,
        );
        assert_eq!(err, Err(GradeError::EmptyCategory));

        let err = PerformanceReport::assemble(
            aspects(&[("score", 8.0)]),
            aspects(&[("tempo", 8.0)]),
            EducationTips::new(),
            None,
        );
        assert_eq!(err, Err(GradeError::ReservedAspectName));
    }

    #[test]
    fn duplicate_aspects_are_rejected() {
        let result = CategoryFeedback::new(aspects(&[("pitch", 8.0), ("pitch", 9.0)]));
        assert_eq!(result, Err(GradeError::DuplicateAspect("pitch".into())));
    }

    #[test]
    fn regrade_is_idempotent() {
        let report = sample_report();
        let mut once = report.clone();
        once.regrade().unwrap();
        let mut twice = once.clone();
        twice.regrade().unwrap();
        assert_eq!(once, report);
        assert_eq!(twice, once);
    }

    #[test]
    fn edit_changes_only_the_edited_category() {
        let report = sample_report();
        let edited = report
            .apply_edits(&[ScoreEdit {
                category: Category::Visual,
                aspect: "confidence".into(),
                score: 10.0,
            }])
            .unwrap();

        assert_eq!(edited.visual_feedback().score(), 9.0);
        assert_eq!(edited.summary().visual_grade.label(), GradeLabel::SS);
        assert_eq!(edited.audio_feedback(), report.audio_feedback());
        assert_eq!(edited.summary().audio_grade, report.summary().audio_grade);
        assert_eq!(edited.overall_grade(), combine(9.0, 9.7).unwrap());
        assert_eq!(edited.education_tips(), report.education_tips());
        assert_eq!(
            edited.summary().performance_summary.as_deref(),
            Some("Nice work")
        );
    }

    #[test]
    fn edits_can_reach_ultra() {
        let report = sample_report();
        let edited = report
            .apply_edits(&[
                ScoreEdit {
                    category: Category::Visual,
                    aspect: "finger_position".into(),
                    score: 10.0,
                },
                ScoreEdit {
                    category: Category::Visual,
                    aspect: "confidence".into(),
                    score: 10.0,
                },
            ])
            .unwrap();
        assert!(edited.overall_grade().is_ultra());
    }

    #[test]
    fn failed_edit_batch_leaves_report_untouched() {
        let report = sample_report();
        let before = report.clone();
        let result = report.apply_edits(&[
            ScoreEdit {
                category: Category::Visual,
                aspect: "posture".into(),
                score: 1.0,
            },
            ScoreEdit {
                category: Category::Audio,
                aspect: "posture".into(),
                score: 1.0,
            },
        ]);
        assert_eq!(
            result,
            Err(GradeError::UnknownAspect {
                category: Category::Audio,
                aspect: "posture".into(),
            })
        );
        assert_eq!(report, before);

        let result = report.apply_edits(&[ScoreEdit {
            category: Category::Audio,
            aspect: "pitch".into(),
            score: f64::NAN,
        }]);
        assert!(matches!(result, Err(GradeError::InvalidScore { .. })));
    }

    #[test]
    fn category_wire_form_keeps_score_out_of_the_aspects() {
        let category = CategoryFeedback::new(aspects(&[("tempo", 8.0), ("pitch", 10.0)])).unwrap();
        let json = serde_json::to_value(&category).unwrap();
        assert_eq!(json["score"], serde_json::json!(9.0));
        assert_eq!(json["tempo"]["style_rating"], serde_json::json!(["A", "#FFA500"]));
        assert_eq!(json["pitch"]["feedback"], serde_json::json!(["pitch note"]));

        let keys: Vec<_> = json.as_object().unwrap().keys().cloned().collect();
        assert_eq!(keys.len(), 3);

        let parsed: CategoryFeedback = serde_json::from_value(json).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed.score(), 9.0);
        assert!(parsed.get("score").is_none());
    }

    #[test]
    fn largest_finite_scores_keep_a_finite_category_score() {
        let category =
            CategoryFeedback::new(aspects(&[("tempo", f64::MAX), ("pitch", f64::MAX)])).unwrap();
        assert!(category.score().is_finite());
        assert_eq!(category.grade().label(), GradeLabel::SSS);
    }

    #[test]
    fn stale_category_score_is_recomputed_on_input() {
        let json = r##"{
            "tempo": {"score": 6.0, "feedback": []},
            "pitch": {"score": 8.0, "style_rating": ["D", "#0000FF"]},
            "score": 1.0
        }"##;
        let parsed: CategoryFeedback = serde_json::from_str(json).unwrap();
        assert_eq!(parsed.score(), 7.0);
        assert_eq!(parsed.aspects()[0].name, "tempo");
    }

    #[test]
    fn report_serializes_with_expected_field_names() {
        let json = serde_json::to_value(sample_report()).unwrap();
        for field in ["visual_feedback", "audio_feedback", "education_tips", "summary"] {
            assert!(json.get(field).is_some(), "missing {field}");
        }
        let summary = &json["summary"];
        assert_eq!(summary["audio_grade"], serde_json::json!(["SSS", "#FF0000"]));
        assert_eq!(summary["overall_grade"], serde_json::json!(["S", "#FF0000"]));
        assert_eq!(summary["performance_summary"], serde_json::json!("Nice work"));
        assert_eq!(
            json["education_tips"]["immediate_focus"],
            serde_json::json!(["Work on rhythm"])
        );

        let text = serde_json::to_string(&sample_report()).unwrap();
        let back: PerformanceReport = serde_json::from_str(&text).unwrap();
        assert_eq!(back, sample_report());
    }

    #[test]
    fn education_tips_keep_insertion_order() {
        let mut tips = EducationTips::new();
        tips.insert("performance_growth", vec!["a".into()]);
        tips.insert("immediate_focus", vec!["b".into()]);
        tips.insert("performance_growth", vec!["c".into()]);

        let names: Vec<_> = tips.iter().map(|(name, _)| name).collect();
        assert_eq!(names, vec!["performance_growth", "immediate_focus"]);
        assert_eq!(tips.get("performance_growth"), Some(&["c".to_string()][..]));
    }

    #[test]
    fn categories_parse_from_both_spellings() {
        assert_eq!("visual".parse::<Category>().unwrap(), Category::Visual);
        assert_eq!("audio_feedback".parse::<Category>().unwrap(), Category::Audio);
        assert_eq!(
            "video".parse::<Category>(),
            Err(GradeError::UnknownCategory("video".into()))
        );
        let edit: ScoreEdit =
            serde_json::from_str(r#"{"category":"visual_feedback","aspect":"posture","score":7}"#)
                .unwrap();
        assert_eq!(edit.category, Category::Visual);
    }
}
