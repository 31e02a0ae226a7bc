//! Remark text attached to each scored aspect.

const STRONG: f64 = 8.0;
const FAIR: f64 = 6.0;

/// (strong, fair, weak) remark pairs per aspect.
type Bands = [[&'static str; 2]; 3];

const POSTURE: Bands = [
    ["Excellent posture maintained throughout", "Great alignment and stability"],
    ["Good posture with room for improvement", "Consider adjusting your sitting/standing position"],
    ["Posture needs significant improvement", "Focus on maintaining proper alignment"],
];

const MOVEMENT: Bands = [
    ["Fluid and natural movements", "Excellent control and precision"],
    ["Generally good movement control", "Some movements could be more fluid"],
    ["Movement needs more control", "Practice slower to improve precision"],
];

const TECHNIQUE: Bands = [
    ["Outstanding technical execution", "Excellent control of the instrument"],
    ["Good technical foundation", "Some aspects need refinement"],
    ["Technical elements need work", "Focus on basic techniques first"],
];

const FINGER_POSITION: Bands = [
    ["Clean transitions between positions", "Fingers stay close to the instrument"],
    ["Most transitions are clean", "Some hesitation in complex finger patterns"],
    ["Finger placement is inconsistent", "Slow down and practice each position change"],
];

const CONFIDENCE: Bands = [
    ["Natural and assured stage presence", "Good recovery from minor mistakes"],
    ["Stage presence is developing well", "Performance becomes hesitant in difficult passages"],
    ["Hesitation is noticeable throughout", "Perform for friends to build comfort"],
];

const EXPRESSIVENESS: Bands = [
    ["Strong emotional connection to the music", "Engaging performance style"],
    ["Expression comes through in places", "Let the phrasing breathe more"],
    ["Performance sounds mechanical", "Sing the phrase before playing it"],
];

const PITCH: Bands = [
    ["Excellent pitch accuracy", "Great intonation throughout"],
    ["Generally good pitch control", "Some intonation issues noted"],
    ["Pitch accuracy needs work", "Consider using a tuner for practice"],
];

const RHYTHM: Bands = [
    ["Excellent rhythm maintenance", "Strong sense of tempo"],
    ["Good rhythmic foundation", "Some timing inconsistencies"],
    ["Rhythm needs improvement", "Practice with a metronome"],
];

const TEMPO: Bands = [
    ["Steady tempo from start to finish", "Good use of dynamic pacing"],
    ["Tempo is mostly steady", "Slight rushing in transitions"],
    ["Tempo drifts noticeably", "Practice with a metronome at a slower speed"],
];

const DYNAMICS: Bands = [
    ["Excellent dynamic control", "Great expression through volume"],
    ["Good dynamic range", "Could use more contrast"],
    ["Dynamic control needs work", "Practice varying volume more"],
];

const GENERIC: Bands = [
    ["Strong work in this area", "Keep refining the details"],
    ["Solid foundation in this area", "A few spots need attention"],
    ["This area needs focused practice", "Break it down and work slowly"],
];

fn bands_for(aspect: &str) -> &'static Bands {
    match aspect {
        "posture" => &POSTURE,
        "movement" => &MOVEMENT,
        "technique" => &TECHNIQUE,
        "finger_position" => &FINGER_POSITION,
        "confidence" => &CONFIDENCE,
        "expressiveness" => &EXPRESSIVENESS,
        "pitch" => &PITCH,
        "rhythm" => &RHYTHM,
        "tempo" => &TEMPO,
        "dynamics" => &DYNAMICS,
        _ => &GENERIC,
    }
}

/// Two remarks describing how an aspect went at the given score.
pub fn remarks_for(aspect: &str, score: f64) -> Vec<String> {
    let bands = bands_for(aspect);
    let band = if score >= STRONG {
        &bands[0]
    } else if score >= FAIR {
        &bands[1]
    } else {
        &bands[2]
    };
    band.iter().map(|s| s.to_string()).collect()
}
