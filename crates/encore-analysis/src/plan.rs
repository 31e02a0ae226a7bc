use encore_grade::{Category, PerformanceReport};
use serde::{Deserialize, Serialize};

/// Aspects under this score are weak points.
pub const WEAK_THRESHOLD: f64 = 7.0;
/// Weak points under this score are high priority.
pub const HIGH_PRIORITY_THRESHOLD: f64 = 5.0;
const SESSION_MINUTES: u32 = 15;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Priority {
    High,
    Medium,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct WeakPoint {
    pub category: Category,
    pub aspect: String,
    pub score: f64,
    pub priority: Priority,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlanItem {
    pub focus: String,
    pub duration_minutes: u32,
    pub instructions: Vec<String>,
    pub progression: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PracticePlan {
    pub weak_points: Vec<WeakPoint>,
    pub items: Vec<PlanItem>,
}

fn progression() -> Vec<String> {
    [
        "Start at 70% tempo",
        "Increase tempo gradually",
        "Practice difficult sections in isolation",
        "Combine sections at full tempo",
    ]
    .into_iter()
    .map(String::from)
    .collect()
}

fn focus_for(aspect: &str) -> &'static str {
    match aspect {
        "pitch" => "Pitch control and intonation",
        "rhythm" | "tempo" => "Rhythm and timing",
        "posture" => "Posture and alignment",
        "finger_position" | "technique" => "Finger placement and technique",
        "confidence" | "expressiveness" => "Stage presence and expression",
        _ => "Targeted practice",
    }
}

fn instructions_for(point: &WeakPoint) -> Vec<String> {
    let mut instructions: Vec<String> = match point.aspect.as_str() {
        "pitch" => vec![
            "Focus on maintaining consistent intonation",
            "Pay attention to key changes",
            "Practice problematic intervals slowly",
        ],
        "rhythm" | "tempo" => vec![
            "Practice with a metronome",
            "Count out loud while playing",
            "Focus on maintaining steady tempo",
        ],
        _ => vec![
            "Warm up before working on this area",
            "Work in short focused repetitions",
            "Record yourself and compare against the last session",
        ],
    }
    .into_iter()
    .map(String::from)
    .collect();

    if point.priority == Priority::High {
        let extra = match point.aspect.as_str() {
            "pitch" => ["Use a tuner for reference", "Record yourself and analyze pitch accuracy"],
            "rhythm" | "tempo" => ["Start at a slower tempo", "Clap the rhythm before playing"],
            _ => ["Slow everything down by half", "Ask a teacher to check your form"],
        };
        instructions.extend(extra.into_iter().map(String::from));
    }
    instructions
}

impl PracticePlan {
    /// Weak points lowest first, one session per weak point, then a balanced
    /// run-through.
    pub fn from_report(report: &PerformanceReport) -> Self {
        let mut weak_points: Vec<WeakPoint> = report
            .all_aspects()
            .filter(|(_, aspect)| aspect.score() < WEAK_THRESHOLD)
            .map(|(category, aspect)| WeakPoint {
                category,
                aspect: aspect.name.clone(),
                score: aspect.score(),
                priority: if aspect.score() < HIGH_PRIORITY_THRESHOLD {
                    Priority::High
                } else {
                    Priority::Medium
                },
            })
            .collect();
        weak_points.sort_by(|a, b| a.score.total_cmp(&b.score));

        let mut items: Vec<PlanItem> = weak_points
            .iter()
            .map(|point| PlanItem {
                focus: focus_for(&point.aspect).to_string(),
                duration_minutes: SESSION_MINUTES,
                instructions: instructions_for(point),
                progression: progression(),
            })
            .collect();

        items.push(PlanItem {
            focus: "Balanced run-through".to_string(),
            duration_minutes: SESSION_MINUTES,
            instructions: vec![
                "Play the full piece without stopping".to_string(),
                "Note where mistakes cluster for the next session".to_string(),
            ],
            progression: progression(),
        });

        Self { weak_points, items }
    }
}
