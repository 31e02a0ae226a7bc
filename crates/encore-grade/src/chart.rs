use crate::report::{Category, CategoryFeedback, PerformanceReport};
use serde::Serialize;

pub const RADAR_RANGE: [f64; 2] = [0.0, 10.0];

/// One radar chart: aspect labels and scores on a fixed 0-10 axis.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RadarSeries {
    pub title: String,
    pub labels: Vec<String>,
    pub values: Vec<f64>,
    pub range: [f64; 2],
}

impl RadarSeries {
    /// Plot the aspects of a category. The category mean is not a point.
    pub fn from_category(title: impl Into<String>, category: &CategoryFeedback) -> Self {
        let (labels, values) = category
            .aspects()
            .iter()
            .map(|aspect| (title_case(&aspect.name), aspect.score()))
            .unzip();
        Self {
            title: title.into(),
            labels,
            values,
            range: RADAR_RANGE,
        }
    }

    /// Visual then audio.
    pub fn for_report(report: &PerformanceReport) -> Vec<Self> {
        Category::ALL
            .into_iter()
            .map(|category| {
                let title = match category {
                    Category::Visual => "Visual Performance",
                    Category::Audio => "Audio Performance",
                };
                Self::from_category(title, report.category(category))
            })
            .collect()
    }
}

/// `finger_position` -> `Finger Position`
fn title_case(name: &str) -> String {
    name.split('_')
        .filter(|word| !word.is_empty())
        .map(|word| {
            let mut chars = word.chars();
            match chars.next() {
                Some(first) => first.to_uppercase().chain(chars).collect::<String>(),
                None => String::new(),
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
