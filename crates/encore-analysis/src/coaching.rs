use encore_grade::{CategoryFeedback, EducationTips, OverallGrade, ScoreAspect};

pub const IMMEDIATE_FOCUS: &str = "immediate_focus";
pub const TECHNICAL_DEVELOPMENT: &str = "technical_development";
pub const PERFORMANCE_GROWTH: &str = "performance_growth";

/// Aspects scoring below this get technical development tips.
const DEVELOPMENT_THRESHOLD: f64 = 8.0;

fn tips_for(aspect: &str) -> &'static [&'static str] {
    match aspect {
        "pitch" => &[
            "Use a tuner during practice",
            "Practice scales slowly",
            "Listen carefully to each note",
        ],
        "rhythm" | "tempo" => &[
            "Practice with a metronome",
            "Start slow and gradually increase tempo",
            "Count out loud while playing",
        ],
        "posture" => &[
            "Keep your back straight and shoulders relaxed",
            "Maintain proper instrument position",
            "Take regular breaks to prevent tension",
        ],
        "technique" | "finger_position" => &[
            "Practice basic techniques slowly",
            "Focus on clean execution",
            "Record yourself to check form",
        ],
        "confidence" | "expressiveness" => &[
            "Perform difficult sections for friends or family",
            "Practice recovering from mistakes without stopping",
        ],
        _ => &[
            "Isolate this area in short focused sessions",
            "Record yourself to track improvement",
        ],
    }
}

fn display_name(aspect: &str) -> String {
    aspect.replace('_', " ")
}

fn all_aspects<'a>(
    visual: &'a CategoryFeedback,
    audio: &'a CategoryFeedback,
) -> impl Iterator<Item = &'a ScoreAspect> {
    visual.aspects().iter().chain(audio.aspects().iter())
}

fn weakest<'a>(visual: &'a CategoryFeedback, audio: &'a CategoryFeedback) -> Option<&'a ScoreAspect> {
    all_aspects(visual, audio).fold(None, |lowest: Option<&ScoreAspect>, aspect| match lowest {
        Some(low) if low.score() <= aspect.score() => Some(low),
        _ => Some(aspect),
    })
}

fn strongest<'a>(
    visual: &'a CategoryFeedback,
    audio: &'a CategoryFeedback,
) -> Option<&'a ScoreAspect> {
    all_aspects(visual, audio).fold(None, |highest: Option<&ScoreAspect>, aspect| match highest {
        Some(high) if high.score() >= aspect.score() => Some(high),
        _ => Some(aspect),
    })
}

/// Coaching tips targeted at the weakest parts of a performance.
///
/// `immediate_focus` names the single lowest aspect; `technical_development`
/// collects drills for every aspect under 8.0; `performance_growth` is general
/// advice that applies at every level.
pub fn education_tips(visual: &CategoryFeedback, audio: &CategoryFeedback) -> EducationTips {
    let mut tips = EducationTips::new();

    let mut immediate = Vec::new();
    if let Some(aspect) = weakest(visual, audio) {
        immediate.push(format!(
            "Focus on {} first: it scored {:.1}/10, your lowest area",
            display_name(&aspect.name),
            aspect.score()
        ));
        if let Some(first) = tips_for(&aspect.name).first() {
            immediate.push(first.to_string());
        }
    }
    immediate.push("Practice difficult transitions at 70% speed".to_string());
    tips.insert(IMMEDIATE_FOCUS, immediate);

    let mut technical: Vec<String> = Vec::new();
    for aspect in all_aspects(visual, audio).filter(|a| a.score() < DEVELOPMENT_THRESHOLD) {
        for tip in tips_for(&aspect.name) {
            if !technical.iter().any(|t| t == tip) {
                technical.push(tip.to_string());
            }
        }
    }
    if technical.is_empty() {
        technical.push("Every area is strong: refine advanced repertoire and nuance".to_string());
        technical.push("Use a metronome for the fastest passages".to_string());
    }
    tips.insert(TECHNICAL_DEVELOPMENT, technical);

    tips.insert(
        PERFORMANCE_GROWTH,
        vec![
            "Try performing the difficult sections for friends".to_string(),
            "Practice recovery techniques for common mistakes".to_string(),
            "Record full run-throughs and review them the next day".to_string(),
        ],
    );

    tips
}

/// Template summary used when no language model is configured.
pub fn static_summary(
    visual: &CategoryFeedback,
    audio: &CategoryFeedback,
    overall: OverallGrade,
) -> String {
    let mut summary = format!(
        "Overall grade {}: visual {:.1}/10 and audio {:.1}/10.",
        overall,
        visual.score(),
        audio.score()
    );

    match (strongest(visual, audio), weakest(visual, audio)) {
        (Some(best), Some(worst)) if !std::ptr::eq(best, worst) => {
            summary.push_str(&format!(
                " Your {} stands out as a real strength, while {} is the best place to focus next.",
                display_name(&best.name),
                display_name(&worst.name)
            ));
        }
        (Some(best), _) => {
            summary.push_str(&format!(
                " Your {} is consistent across the performance.",
                display_name(&best.name)
            ));
        }
        _ => {}
    }

    if overall.is_ultra() {
        summary.push_str(" An outstanding performance in every dimension. Keep it up!");
    } else {
        summary.push_str(" Keep practicing steadily and the next take will be even better.");
    }
    summary
}

#[cfg(test)]
mod tests {
    use super::*;
    use encore_grade::combine;
    use pretty_assertions::assert_eq;

    fn category(specs: &[(&str, f64)]) -> CategoryFeedback {
        CategoryFeedback::new(
            specs
                .iter()
                .map(|(name, score)| ScoreAspect::new(*name, *score, vec![]))
                .collect(),
        )
        .unwrap()
    }

    #[test]
    fn tips_cover_the_three_categories_in_order() {
        let visual = category(&[("posture", 9.0), ("finger_position", 8.5)]);
        let audio = category(&[("pitch", 7.2), ("rhythm", 5.0)]);
        let tips = education_tips(&visual, &audio);

        let names: Vec<_> = tips.iter().map(|(name, _)| name).collect();
        assert_eq!(
            names,
            vec![IMMEDIATE_FOCUS, TECHNICAL_DEVELOPMENT, PERFORMANCE_GROWTH]
        );

        let immediate = tips.get(IMMEDIATE_FOCUS).unwrap();
        assert!(immediate[0].contains("rhythm"), "{immediate:?}");
        assert!(immediate[0].contains("5.0/10"));

        let technical = tips.get(TECHNICAL_DEVELOPMENT).unwrap();
        assert!(technical.contains(&"Use a tuner during practice".to_string()));
        assert!(technical.contains(&"Practice with a metronome".to_string()));
        assert!(!technical.contains(&"Maintain proper instrument position".to_string()));
    }

    #[test]
    fn rhythm_and_tempo_share_tips_once() {
        let visual = category(&[("posture", 9.0)]);
        let audio = category(&[("tempo", 6.0), ("rhythm", 6.5)]);
        let technical = education_tips(&visual, &audio)
            .get(TECHNICAL_DEVELOPMENT)
            .unwrap()
            .to_vec();
        assert_eq!(technical.len(), 3);
    }

    #[test]
    fn strong_performances_still_get_development_tips() {
        let visual = category(&[("posture", 9.6)]);
        let audio = category(&[("pitch", 9.9)]);
        let tips = education_tips(&visual, &audio);
        assert_eq!(tips.get(TECHNICAL_DEVELOPMENT).unwrap().len(), 2);
    }

    #[test]
    fn static_summary_names_strongest_and_weakest() {
        let visual = category(&[("posture", 9.0), ("finger_position", 6.0)]);
        let audio = category(&[("pitch", 8.0)]);
        let overall = combine(visual.score(), audio.score()).unwrap();
        let summary = static_summary(&visual, &audio, overall);

        assert!(summary.starts_with("Overall grade B: visual 7.5/10 and audio 8.0/10."));
        assert!(summary.contains("posture stands out"));
        assert!(summary.contains("finger position is the best place"));
    }

    #[test]
    fn same_name_in_both_categories_is_two_aspects() {
        let visual = category(&[("tempo", 9.0)]);
        let audio = category(&[("tempo", 5.0)]);
        let overall = combine(visual.score(), audio.score()).unwrap();
        let summary = static_summary(&visual, &audio, overall);

        assert!(summary.contains("tempo stands out"), "{summary}");
        assert!(summary.contains("tempo is the best place"), "{summary}");
    }

    #[test]
    fn even_scores_read_as_consistent() {
        let visual = category(&[("posture", 8.0)]);
        let audio = category(&[("pitch", 8.0)]);
        let overall = combine(visual.score(), audio.score()).unwrap();
        let summary = static_summary(&visual, &audio, overall);

        assert!(summary.contains("Your posture is consistent"), "{summary}");
    }
}
