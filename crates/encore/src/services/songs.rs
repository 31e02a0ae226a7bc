use async_trait::async_trait;
use encore_analysis::SkillLevel;
use serde::{Deserialize, Serialize};
use serde_json::json;
use tracing::{info, instrument, warn};

use super::{with_trace_context, ServiceError};

pub const MOCK_SONG_URL: &str = "https://example.com/mock-song.mp3";
pub const MOCK_SHEET_MUSIC_URL: &str = "https://example.com/mock-sheet-music.png";

const SONG_SECONDS: u32 = 60;

/// What to generate practice material for.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct SongRequest {
    pub skill_level: SkillLevel,
    pub instrument: String,
    #[serde(default = "SongRequest::default_genre")]
    pub genre: String,
}

impl SongRequest {
    fn default_genre() -> String {
        "Pop".to_string()
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PracticeSong {
    pub song_url: String,
    /// Rendered notation, when the generator provides it.
    pub sheet_music: Option<String>,
}

#[async_trait]
pub trait PracticeSongGenerator: Send + Sync {
    fn name(&self) -> &'static str;

    async fn generate(&self, request: &SongRequest) -> Result<PracticeSong, ServiceError>;
}

#[derive(Debug, Clone, Copy, Default)]
pub struct MockSongGenerator;

#[async_trait]
impl PracticeSongGenerator for MockSongGenerator {
    fn name(&self) -> &'static str {
        "mock"
    }

    async fn generate(&self, _request: &SongRequest) -> Result<PracticeSong, ServiceError> {
        Ok(PracticeSong {
            song_url: MOCK_SONG_URL.to_string(),
            sheet_music: Some(MOCK_SHEET_MUSIC_URL.to_string()),
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Instrument {
    Piano,
    Guitar,
    Violin,
}

impl Instrument {
    /// Unknown instruments get piano technique.
    fn parse(name: &str) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "guitar" => Self::Guitar,
            "violin" => Self::Violin,
            _ => Self::Piano,
        }
    }

    fn technique(self, level: SkillLevel) -> &'static str {
        use SkillLevel::*;
        match (self, level) {
            (Self::Piano, Beginner) => "Use simple two-hand coordination, basic pedaling, clear articulation.",
            (Self::Piano, Intermediate) => "Include arpeggios, moderate pedaling, dynamic contrasts, hand crossing.",
            (Self::Piano, Advanced) => "Complex fingering patterns, sophisticated pedaling, full dynamic range, rapid hand movements.",
            (Self::Guitar, Beginner) => "Use open positions, simple strumming patterns, basic fingerpicking.",
            (Self::Guitar, Intermediate) => "Include barre chords, mixed strumming/picking, moderate position shifts.",
            (Self::Guitar, Advanced) => "Complex fingerstyle, advanced techniques, full fretboard navigation.",
            (Self::Violin, Beginner) => "Stay in first position, simple bowing patterns, clear string crossings.",
            (Self::Violin, Intermediate) => "Include position shifts, varied bow strokes, moderate double stops.",
            (Self::Violin, Advanced) => "Advanced positions, complex bow techniques, virtuosic passages.",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Style {
    Classical,
    Jazz,
    Pop,
}

impl Style {
    fn parse(genre: &str) -> Self {
        match genre.trim().to_ascii_lowercase().as_str() {
            "classical" => Self::Classical,
            "jazz" => Self::Jazz,
            _ => Self::Pop,
        }
    }

    fn as_str(self) -> &'static str {
        match self {
            Self::Classical => "classical",
            Self::Jazz => "jazz",
            Self::Pop => "pop",
        }
    }

    fn title(self) -> &'static str {
        match self {
            Self::Classical => "Classical",
            Self::Jazz => "Jazz",
            Self::Pop => "Pop",
        }
    }

    fn elements(self, level: SkillLevel) -> &'static str {
        use SkillLevel::*;
        match (self, level) {
            (Self::Classical, Beginner) => "Simple classical form, clear cadences, basic ornaments.",
            (Self::Classical, Intermediate) => "Traditional harmony, balanced phrases, moderate counterpoint.",
            (Self::Classical, Advanced) => "Complex harmonies, intricate counterpoint, sophisticated form.",
            (Self::Jazz, Beginner) => "Basic swing feel, simple jazz chords, clear rhythmic patterns.",
            (Self::Jazz, Intermediate) => "Moderate syncopation, extended chords, blues elements.",
            (Self::Jazz, Advanced) => "Complex rhythmic interplay, advanced harmony, bebop elements.",
            (Self::Pop, Beginner) => "Catchy hooks, simple chord progressions, steady rhythms.",
            (Self::Pop, Intermediate) => "Modern harmonies, syncopated rhythms, dynamic builds.",
            (Self::Pop, Advanced) => "Complex arrangements, contemporary techniques, dramatic contrasts.",
        }
    }
}

fn structure(level: SkillLevel) -> &'static str {
    match level {
        SkillLevel::Beginner => "Create a 60-second piece with clear 4-bar phrases. Include an intro (8s), main theme (30s), variation (15s), and ending (7s).",
        SkillLevel::Intermediate => "Compose a 60-second piece with 8-bar phrases. Structure: intro (8s), theme A (20s), theme B (20s), return to A (8s), coda (4s).",
        SkillLevel::Advanced => "Generate a 60-second virtuosic piece. Complex structure: intro (8s), theme A (16s), development (20s), climax (12s), coda (4s).",
    }
}

/// Generation prompt for a one-minute practice piece.
pub fn song_prompt(request: &SongRequest) -> String {
    let level = request.skill_level;
    let style = Style::parse(&request.genre);
    let instrument = request.instrument.trim();

    format!(
        "Create a precisely 60-second {style} piece for {instrument} at {level} level.\n\n\
         Structure and Timing:\n{structure}\n\n\
         Instrument-Specific Requirements:\n{technique}\n\n\
         Style and Musical Elements:\n{elements}\n\n\
         Additional Requirements:\n\
         - Maintain consistent tempo appropriate for {level} level\n\
         - Include clear dynamic markings and expressive elements\n\
         - Ensure all phrases connect smoothly\n\
         - Create musical interest throughout the full minute\n\
         - End with a satisfying conclusion\n\n\
         Focus on creating a complete musical journey that develops within exactly one minute.",
        style = style.as_str(),
        structure = structure(level),
        technique = Instrument::parse(instrument).technique(level),
        elements = style.elements(level),
    )
}

#[derive(Deserialize)]
struct LimitResponse {
    #[serde(default)]
    data: Option<LimitData>,
}

#[derive(Deserialize)]
struct LimitData {
    #[serde(default)]
    credits_left: i64,
}

#[derive(Deserialize)]
struct MusicResponse {
    #[serde(default)]
    status: Option<u16>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    data: Vec<MusicTrack>,
}

#[derive(Deserialize)]
struct MusicTrack {
    audio_file: Option<String>,
}

/// TopMediaAI music generation client.
pub struct TopMediaClient {
    base_url: String,
    api_key: String,
    client: reqwest::Client,
}

fn is_credits_message(message: &str) -> bool {
    message.to_ascii_lowercase().contains("left counts")
}

impl TopMediaClient {
    pub fn new(base_url: impl Into<String>, api_key: impl Into<String>) -> Result<Self, ServiceError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(ServiceError::MissingApiKey("TOPMEDIA_API_KEY"));
        }
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            api_key,
            client: reqwest::Client::new(),
        })
    }

    /// Remaining generation credits.
    #[instrument(skip(self))]
    pub async fn credits_left(&self) -> Result<i64, ServiceError> {
        let builder = self
            .client
            .get(format!("{}/v1/music/limit", self.base_url))
            .header("x-api-key", &self.api_key);
        let resp = with_trace_context(builder).send().await?;

        if !resp.status().is_success() {
            return Err(ServiceError::from_response(resp).await);
        }

        let limit: LimitResponse = resp
            .json()
            .await
            .map_err(|e| ServiceError::Decode(e.to_string()))?;
        let credits = limit.data.map(|d| d.credits_left).unwrap_or(0);
        info!(credits, "TopMediaAI credits");
        Ok(credits)
    }

    fn payload(request: &SongRequest) -> serde_json::Value {
        let level = request.skill_level;
        let style = Style::parse(&request.genre);
        let instrument = request.instrument.trim();

        json!({
            "is_auto": 1,
            "prompt": song_prompt(request),
            "title": format!("{} {} Practice - {}", style.title(), instrument, level),
            "instrumental": 1,
            "duration": SONG_SECONDS,
            "style": style.as_str(),
            "instrument": instrument.to_lowercase(),
            "tempo": level.tempo(),
            "complexity": level.complexity(),
            "parameters": {
                "duration_seconds": SONG_SECONDS,
                "strict_timing": true,
                "form": "structured",
                "ending_type": "conclusive"
            }
        })
    }
}

#[async_trait]
impl PracticeSongGenerator for TopMediaClient {
    fn name(&self) -> &'static str {
        "topmedia"
    }

    #[instrument(skip_all, fields(skill = %request.skill_level, instrument = %request.instrument))]
    async fn generate(&self, request: &SongRequest) -> Result<PracticeSong, ServiceError> {
        if self.credits_left().await? <= 0 {
            return Err(ServiceError::NoCredits);
        }

        let builder = self
            .client
            .post(format!("{}/v1/music", self.base_url))
            .header("x-api-key", &self.api_key)
            .json(&Self::payload(request));
        let resp = with_trace_context(builder).send().await?;
        let status = resp.status();

        if !status.is_success() {
            let err = ServiceError::from_response(resp).await;
            return Err(match err {
                ServiceError::Api { status: 400, ref body } if is_credits_message(body) => {
                    ServiceError::CreditsExhausted
                }
                other => other,
            });
        }

        let music: MusicResponse = resp
            .json()
            .await
            .map_err(|e| ServiceError::Decode(e.to_string()))?;

        // The API also reports failures in the body of a 200.
        if music.status == Some(400) {
            let message = music.message.unwrap_or_default();
            if is_credits_message(&message) {
                return Err(ServiceError::CreditsExhausted);
            }
            return Err(ServiceError::Api {
                status: 400,
                body: message,
            });
        }

        let song_url = music
            .data
            .into_iter()
            .find_map(|track| track.audio_file)
            .ok_or_else(|| {
                warn!("TopMediaAI response had no audio file");
                ServiceError::Decode("no audio_file in response".to_string())
            })?;

        info!(%song_url, "Practice song generated");
        Ok(PracticeSong {
            song_url,
            sheet_music: None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn request(level: SkillLevel, instrument: &str, genre: &str) -> SongRequest {
        SongRequest {
            skill_level: level,
            instrument: instrument.to_string(),
            genre: genre.to_string(),
        }
    }

    async fn with_credits(server: &MockServer, credits: i64) {
        Mock::given(method("GET"))
            .and(path("/v1/music/limit"))
            .and(header("x-api-key", "tm-key"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": 200,
                "data": {"credits_left": credits}
            })))
            .mount(server)
            .await;
    }

    #[test]
    fn request_defaults_genre_and_accepts_numeric_skill() {
        let req: SongRequest =
            serde_json::from_str(r#"{"skill_level": 2, "instrument": "Guitar"}"#).unwrap();
        assert_eq!(req.genre, "Pop");
        assert_eq!(req.skill_level, SkillLevel::Beginner);
    }

    #[test]
    fn prompt_uses_instrument_and_style_tables() {
        let prompt = song_prompt(&request(SkillLevel::Advanced, "Violin", "Jazz"));
        assert!(prompt.starts_with("Create a precisely 60-second jazz piece for Violin at advanced level."));
        assert!(prompt.contains("virtuosic passages"));
        assert!(prompt.contains("bebop elements"));
        assert!(prompt.contains("climax (12s)"));
    }

    #[test]
    fn unknown_instrument_and_genre_fall_back() {
        let prompt = song_prompt(&request(SkillLevel::Beginner, "Kazoo", "Polka"));
        assert!(prompt.contains("basic pedaling"));
        assert!(prompt.contains("Catchy hooks"));
    }

    #[test]
    fn payload_carries_tempo_and_complexity() {
        let payload = TopMediaClient::payload(&request(SkillLevel::Intermediate, "Piano", "classical"));
        assert_eq!(payload["tempo"], 100);
        assert_eq!(payload["complexity"], 0.6);
        assert_eq!(payload["title"], "Classical Piano Practice - intermediate");
        assert_eq!(payload["instrument"], "piano");
    }

    #[tokio::test]
    async fn mock_generator_returns_example_urls() {
        let song = MockSongGenerator
            .generate(&request(SkillLevel::Beginner, "Piano", "Pop"))
            .await
            .unwrap();
        assert_eq!(song.song_url, MOCK_SONG_URL);
        assert_eq!(song.sheet_music.as_deref(), Some(MOCK_SHEET_MUSIC_URL));
    }

    #[tokio::test]
    async fn generate_returns_first_audio_file() {
        let server = MockServer::start().await;
        with_credits(&server, 5).await;
        Mock::given(method("POST"))
            .and(path("/v1/music"))
            .and(header("x-api-key", "tm-key"))
            .and(body_partial_json(json!({"tempo": 120, "style": "pop", "duration": 60})))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": 200,
                "data": [{"audio_file": "https://cdn.example/song.mp3"}]
            })))
            .mount(&server)
            .await;

        let client = TopMediaClient::new(server.uri(), "tm-key").unwrap();
        let song = client
            .generate(&request(SkillLevel::Advanced, "Guitar", "Pop"))
            .await
            .unwrap();
        assert_eq!(song.song_url, "https://cdn.example/song.mp3");
        assert_eq!(song.sheet_music, None);
    }

    #[tokio::test]
    async fn no_credits_skips_generation() {
        let server = MockServer::start().await;
        with_credits(&server, 0).await;
        Mock::given(method("POST"))
            .and(path("/v1/music"))
            .respond_with(ResponseTemplate::new(200))
            .expect(0)
            .mount(&server)
            .await;

        let client = TopMediaClient::new(server.uri(), "tm-key").unwrap();
        assert!(matches!(
            client.generate(&request(SkillLevel::Beginner, "Piano", "Pop")).await,
            Err(ServiceError::NoCredits)
        ));
    }

    #[tokio::test]
    async fn left_counts_means_credits_exhausted() {
        let server = MockServer::start().await;
        with_credits(&server, 1).await;
        Mock::given(method("POST"))
            .and(path("/v1/music"))
            .respond_with(
                ResponseTemplate::new(400).set_body_string("Insufficient Left Counts for this key"),
            )
            .mount(&server)
            .await;

        let client = TopMediaClient::new(server.uri(), "tm-key").unwrap();
        assert!(matches!(
            client.generate(&request(SkillLevel::Beginner, "Piano", "Pop")).await,
            Err(ServiceError::CreditsExhausted)
        ));
    }

    #[tokio::test]
    async fn status_in_body_is_checked() {
        let server = MockServer::start().await;
        with_credits(&server, 1).await;
        Mock::given(method("POST"))
            .and(path("/v1/music"))
            .respond_with(ResponseTemplate::new(200).set_body_json(json!({
                "status": 400,
                "message": "no left counts",
                "data": []
            })))
            .mount(&server)
            .await;

        let client = TopMediaClient::new(server.uri(), "tm-key").unwrap();
        assert!(matches!(
            client.generate(&request(SkillLevel::Beginner, "Piano", "Pop")).await,
            Err(ServiceError::CreditsExhausted)
        ));
    }
}
