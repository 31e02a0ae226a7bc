use std::sync::Mutex;

use encore_grade::ScoreAspect;
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::debug;

use crate::error::{AnalysisError, Result};
use crate::phrasing::remarks_for;
use crate::skill::SkillLevel;
use crate::upload::Upload;

pub const VISUAL_ASPECTS: [&str; 3] = ["posture", "finger_position", "confidence"];
pub const AUDIO_ASPECTS: [&str; 3] = ["tempo", "pitch", "rhythm"];

/// Backend that scores an uploaded performance.
///
/// Implementations return raw aspect scores with remarks. Aggregation and
/// grading happen afterwards in `encore-grade`, so an analyzer never decides
/// a category score or a letter grade.
pub trait Analyzer: Send + Sync {
    fn name(&self) -> &'static str;

    fn analyze_visual(&self, upload: &Upload) -> Result<Vec<ScoreAspect>>;

    fn analyze_audio(&self, upload: &Upload) -> Result<Vec<ScoreAspect>>;
}

fn scored(names: &[&str], mut score_for: impl FnMut(&str) -> f64) -> Vec<ScoreAspect> {
    names
        .iter()
        .map(|name| {
            let score = score_for(name);
            ScoreAspect::new(*name, score, remarks_for(name, score))
        })
        .collect()
}

/// Random scores in `[8.0, 10.0)` from a seedable generator.
pub struct MockAnalyzer {
    rng: Mutex<StdRng>,
}

impl MockAnalyzer {
    pub fn new() -> Self {
        Self {
            rng: Mutex::new(StdRng::from_os_rng()),
        }
    }

    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: Mutex::new(StdRng::seed_from_u64(seed)),
        }
    }

    fn draw(&self, names: &[&str]) -> Vec<ScoreAspect> {
        // A poisoned lock still holds a usable generator.
        let mut rng = self.rng.lock().unwrap_or_else(|e| e.into_inner());
        scored(names, |_| rng.random_range(8.0..10.0))
    }
}

impl Default for MockAnalyzer {
    fn default() -> Self {
        Self::new()
    }
}

impl Analyzer for MockAnalyzer {
    fn name(&self) -> &'static str {
        "mock"
    }

    fn analyze_visual(&self, _upload: &Upload) -> Result<Vec<ScoreAspect>> {
        Ok(self.draw(&VISUAL_ASPECTS))
    }

    fn analyze_audio(&self, _upload: &Upload) -> Result<Vec<ScoreAspect>> {
        Ok(self.draw(&AUDIO_ASPECTS))
    }
}

/// The same scores every time, for tests and skill-level demos.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FixedAnalyzer {
    visual: f64,
    audio: f64,
}

impl FixedAnalyzer {
    pub fn new(visual: f64, audio: f64) -> Self {
        Self { visual, audio }
    }

    pub fn for_skill(level: SkillLevel) -> Self {
        let (visual, audio) = level.demo_scores();
        Self::new(visual, audio)
    }
}

impl Analyzer for FixedAnalyzer {
    fn name(&self) -> &'static str {
        "fixed"
    }

    fn analyze_visual(&self, _upload: &Upload) -> Result<Vec<ScoreAspect>> {
        Ok(scored(&VISUAL_ASPECTS, |_| self.visual))
    }

    fn analyze_audio(&self, _upload: &Upload) -> Result<Vec<ScoreAspect>> {
        Ok(scored(&AUDIO_ASPECTS, |_| self.audio))
    }
}

/// Summary statistics over a byte slice, each normalized to `[0, 1]`.
#[derive(Debug, Clone, Copy, PartialEq)]
struct ByteStats {
    /// Closeness of the mean byte to the midpoint.
    balance: f64,
    /// Standard deviation relative to the widest possible spread.
    spread: f64,
    /// Shannon entropy over 8 bits.
    texture: f64,
    /// Fraction of neighbouring bytes within 16 of each other.
    smoothness: f64,
}

impl ByteStats {
    fn of(bytes: &[u8]) -> Self {
        let n = bytes.len() as f64;
        let mean = bytes.iter().map(|&b| b as f64).sum::<f64>() / n;
        let variance = bytes
            .iter()
            .map(|&b| (b as f64 - mean).powi(2))
            .sum::<f64>()
            / n;

        let mut histogram = [0usize; 256];
        for &b in bytes {
            histogram[b as usize] += 1;
        }
        let entropy: f64 = histogram
            .iter()
            .filter(|&&count| count > 0)
            .map(|&count| {
                let p = count as f64 / n;
                -p * p.log2()
            })
            .sum();

        let smoothness = if bytes.len() < 2 {
            1.0
        } else {
            let close = bytes
                .windows(2)
                .filter(|pair| pair[0].abs_diff(pair[1]) < 16)
                .count();
            close as f64 / (bytes.len() - 1) as f64
        };

        Self {
            balance: 1.0 - ((mean / 255.0) - 0.5).abs() * 2.0,
            spread: (variance.sqrt() / 127.5).min(1.0),
            texture: entropy / 8.0,
            smoothness,
        }
    }
}

/// Deterministic scores derived from the upload's byte statistics.
///
/// Visual aspects read the first half of the file and audio aspects the
/// second half, so the two categories differ for most inputs.
#[derive(Debug, Clone, Copy, Default)]
pub struct HeuristicAnalyzer;

impl HeuristicAnalyzer {
    fn stats(upload: &Upload, audio: bool) -> Result<ByteStats> {
        if upload.is_empty() {
            return Err(AnalysisError::EmptyUpload);
        }
        let bytes = &upload.bytes[..];
        let mid = bytes.len() / 2;
        let slice = match (audio, mid) {
            (_, 0) => bytes,
            (false, _) => &bytes[..mid],
            (true, _) => &bytes[mid..],
        };
        let stats = ByteStats::of(slice);
        debug!(?stats, audio, len = slice.len(), "byte statistics");
        Ok(stats)
    }
}

/// Map a `[0, 1]` metric into the `[4, 10]` score band, two decimals.
fn metric_score(metric: f64) -> f64 {
    let score = 4.0 + 6.0 * metric.clamp(0.0, 1.0);
    (score * 100.0).round() / 100.0
}

impl Analyzer for HeuristicAnalyzer {
    fn name(&self) -> &'static str {
        "heuristic"
    }

    fn analyze_visual(&self, upload: &Upload) -> Result<Vec<ScoreAspect>> {
        let stats = Self::stats(upload, false)?;
        Ok(scored(&VISUAL_ASPECTS, |name| match name {
            "posture" => metric_score(stats.balance),
            "finger_position" => metric_score(stats.texture),
            _ => metric_score(stats.smoothness),
        }))
    }

    fn analyze_audio(&self, upload: &Upload) -> Result<Vec<ScoreAspect>> {
        let stats = Self::stats(upload, true)?;
        Ok(scored(&AUDIO_ASPECTS, |name| match name {
            "tempo" => metric_score(stats.smoothness),
            "pitch" => metric_score(1.0 - (stats.spread - 0.5).abs() * 2.0),
            _ => metric_score(stats.texture),
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn upload(bytes: &'static [u8]) -> Upload {
        Upload::new("take.mp4", bytes)
    }

    fn scores(aspects: &[ScoreAspect]) -> Vec<f64> {
        aspects.iter().map(|a| a.score()).collect()
    }

    #[test]
    fn seeded_mock_is_reproducible() {
        let a = MockAnalyzer::seeded(42);
        let b = MockAnalyzer::seeded(42);
        let file = upload(b"anything");

        assert_eq!(
            scores(&a.analyze_visual(&file).unwrap()),
            scores(&b.analyze_visual(&file).unwrap())
        );
        assert_eq!(
            scores(&a.analyze_audio(&file).unwrap()),
            scores(&b.analyze_audio(&file).unwrap())
        );
    }

    #[test]
    fn mock_scores_stay_in_band() {
        let analyzer = MockAnalyzer::seeded(7);
        let file = upload(b"");
        for _ in 0..50 {
            for aspect in analyzer.analyze_visual(&file).unwrap() {
                assert!((8.0..10.0).contains(&aspect.score()));
                assert_eq!(aspect.feedback.len(), 2);
            }
        }
        let names: Vec<_> = analyzer
            .analyze_audio(&file)
            .unwrap()
            .into_iter()
            .map(|a| a.name)
            .collect();
        assert_eq!(names, AUDIO_ASPECTS);
    }

    #[test]
    fn fixed_analyzer_uses_skill_scores() {
        let analyzer = FixedAnalyzer::for_skill(SkillLevel::Beginner);
        let file = upload(b"x");
        assert_eq!(scores(&analyzer.analyze_visual(&file).unwrap()), vec![6.5; 3]);
        assert_eq!(scores(&analyzer.analyze_audio(&file).unwrap()), vec![6.2; 3]);
    }

    #[test]
    fn heuristic_is_deterministic_and_bounded() {
        let file = upload(b"\x00\x10\x20\x30\x40\x50\x60\x70\x80\x90\xa0\xb0\xc0\xd0\xe0\xf0");
        let first = HeuristicAnalyzer.analyze_visual(&file).unwrap();
        let second = HeuristicAnalyzer.analyze_visual(&file).unwrap();
        assert_eq!(first, second);

        for aspect in first
            .iter()
            .chain(HeuristicAnalyzer.analyze_audio(&file).unwrap().iter())
        {
            assert!((4.0..=10.0).contains(&aspect.score()), "{aspect:?}");
        }
    }

    #[test]
    fn heuristic_rejects_empty_upload() {
        assert!(matches!(
            HeuristicAnalyzer.analyze_visual(&upload(b"")),
            Err(AnalysisError::EmptyUpload)
        ));
        assert!(matches!(
            HeuristicAnalyzer.analyze_audio(&upload(b"")),
            Err(AnalysisError::EmptyUpload)
        ));
    }

    #[test]
    fn constant_bytes_are_smooth_but_textureless() {
        let stats = ByteStats::of(&[200; 64]);
        assert_eq!(stats.smoothness, 1.0);
        assert_eq!(stats.texture, 0.0);
        assert_eq!(stats.spread, 0.0);
    }

    #[test]
    fn single_byte_upload_is_scored_for_both_categories() {
        let file = upload(b"\x7f");
        assert_eq!(HeuristicAnalyzer.analyze_visual(&file).unwrap().len(), 3);
        assert_eq!(HeuristicAnalyzer.analyze_audio(&file).unwrap().len(), 3);
    }
}
