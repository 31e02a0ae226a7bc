use async_trait::async_trait;
use encore_analysis::static_summary;
use encore_grade::{CategoryFeedback, PerformanceReport};
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::{with_trace_context, ServiceError};

const SYSTEM_PROMPT: &str = "You are a supportive music teacher providing constructive feedback. \
Focus on both strengths and areas for improvement.";

#[async_trait]
pub trait SummaryGenerator: Send + Sync {
    fn name(&self) -> &'static str;

    /// One encouraging paragraph about the report.
    async fn summarize(&self, report: &PerformanceReport) -> Result<String, ServiceError>;
}

/// Template summary built from the report alone.
#[derive(Debug, Clone, Copy, Default)]
pub struct StaticSummary;

#[async_trait]
impl SummaryGenerator for StaticSummary {
    fn name(&self) -> &'static str {
        "static"
    }

    async fn summarize(&self, report: &PerformanceReport) -> Result<String, ServiceError> {
        Ok(static_summary(
            report.visual_feedback(),
            report.audio_feedback(),
            report.overall_grade(),
        ))
    }
}

#[derive(Serialize)]
struct ChatRequest<'a> {
    model: &'a str,
    messages: Vec<ChatMessage<'a>>,
    max_tokens: u32,
    temperature: f64,
}

#[derive(Serialize)]
struct ChatMessage<'a> {
    role: &'a str,
    content: &'a str,
}

#[derive(Deserialize)]
struct ChatResponse {
    choices: Vec<Choice>,
}

#[derive(Deserialize)]
struct Choice {
    message: ResponseMessage,
}

#[derive(Deserialize)]
struct ResponseMessage {
    #[serde(default)]
    content: Option<String>,
}

/// Summary from an OpenAI-compatible chat completions endpoint.
pub struct OpenAiSummary {
    base_url: String,
    model: String,
    api_key: String,
    client: reqwest::Client,
}

impl OpenAiSummary {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
    ) -> Result<Self, ServiceError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(ServiceError::MissingApiKey("OPENAI_API_KEY"));
        }
        Ok(Self {
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key,
            client: reqwest::Client::new(),
        })
    }
}

fn aspect_lines(category: &CategoryFeedback) -> String {
    category
        .aspects()
        .iter()
        .map(|aspect| format!("{}: {}", aspect.name, aspect.feedback.join(", ")))
        .collect::<Vec<_>>()
        .join("\n")
}

pub(crate) fn summary_prompt(report: &PerformanceReport) -> String {
    format!(
        "Summarize this music performance analysis in a single, encouraging paragraph:\n\n\
         Visual Analysis:\n{}\n\n\
         Audio Analysis:\n{}\n\n\
         Overall Scores:\n\
         Visual: {:.1}/10\n\
         Audio: {:.1}/10",
        aspect_lines(report.visual_feedback()),
        aspect_lines(report.audio_feedback()),
        report.visual_feedback().score(),
        report.audio_feedback().score(),
    )
}

#[async_trait]
impl SummaryGenerator for OpenAiSummary {
    fn name(&self) -> &'static str {
        "openai"
    }

    #[instrument(skip_all, fields(model = %self.model))]
    async fn summarize(&self, report: &PerformanceReport) -> Result<String, ServiceError> {
        let prompt = summary_prompt(report);
        let body = ChatRequest {
            model: &self.model,
            messages: vec![
                ChatMessage {
                    role: "system",
                    content: SYSTEM_PROMPT,
                },
                ChatMessage {
                    role: "user",
                    content: &prompt,
                },
            ],
            max_tokens: 200,
            temperature: 0.7,
        };

        let builder = self
            .client
            .post(format!("{}/chat/completions", self.base_url))
            .bearer_auth(&self.api_key)
            .json(&body);
        let resp = with_trace_context(builder).send().await?;

        if !resp.status().is_success() {
            return Err(ServiceError::from_response(resp).await);
        }

        let parsed: ChatResponse = resp
            .json()
            .await
            .map_err(|e| ServiceError::Decode(e.to_string()))?;

        let text = parsed
            .choices
            .into_iter()
            .next()
            .and_then(|choice| choice.message.content)
            .map(|content| content.trim().to_string())
            .filter(|content| !content.is_empty())
            .ok_or_else(|| ServiceError::Decode("no completion in response".to_string()))?;

        debug!(chars = text.len(), "Summary generated");
        Ok(text)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use encore_grade::{EducationTips, ScoreAspect};
    use wiremock::matchers::{body_partial_json, header, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn report() -> PerformanceReport {
        let visual = CategoryFeedback::new(vec![ScoreAspect::new(
            "posture",
            8.0,
            vec!["Upright".into(), "Relaxed shoulders".into()],
        )])
        .unwrap();
        let audio = CategoryFeedback::new(vec![ScoreAspect::new(
            "pitch",
            6.0,
            vec!["Mostly in tune".into()],
        )])
        .unwrap();
        PerformanceReport::from_categories(visual, audio, EducationTips::new(), None).unwrap()
    }

    #[test]
    fn prompt_lists_remarks_and_scores() {
        let prompt = summary_prompt(&report());
        assert!(prompt.contains("posture: Upright, Relaxed shoulders"));
        assert!(prompt.contains("pitch: Mostly in tune"));
        assert!(prompt.contains("Visual: 8.0/10"));
        assert!(prompt.contains("Audio: 6.0/10"));
    }

    #[test]
    fn empty_key_is_rejected() {
        assert!(matches!(
            OpenAiSummary::new("http://localhost", "gpt", " "),
            Err(ServiceError::MissingApiKey(_))
        ));
    }

    #[tokio::test]
    async fn static_summary_mentions_overall_grade() {
        let text = StaticSummary.summarize(&report()).await.unwrap();
        assert!(text.starts_with("Overall grade B"));
    }

    #[tokio::test]
    async fn openai_summary_returns_first_choice() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .and(header("authorization", "Bearer sk-test"))
            .and(body_partial_json(serde_json::json!({
                "model": "gpt-3.5-turbo",
                "max_tokens": 200,
                "temperature": 0.7
            })))
            .respond_with(ResponseTemplate::new(200).set_body_json(serde_json::json!({
                "choices": [{"message": {"role": "assistant", "content": "  Lovely tone!  "}}]
            })))
            .mount(&server)
            .await;

        let summary = OpenAiSummary::new(server.uri(), "gpt-3.5-turbo", "sk-test").unwrap();
        assert_eq!(summary.summarize(&report()).await.unwrap(), "Lovely tone!");
    }

    #[tokio::test]
    async fn openai_error_status_is_reported() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(ResponseTemplate::new(401).set_body_string("bad key"))
            .mount(&server)
            .await;

        let summary = OpenAiSummary::new(server.uri(), "gpt-3.5-turbo", "sk-test").unwrap();
        match summary.summarize(&report()).await {
            Err(ServiceError::Api { status, body }) => {
                assert_eq!(status, 401);
                assert_eq!(body, "bad key");
            }
            other => panic!("unexpected result: {other:?}"),
        }
    }

    #[tokio::test]
    async fn openai_without_choices_is_a_decode_error() {
        let server = MockServer::start().await;
        Mock::given(method("POST"))
            .and(path("/chat/completions"))
            .respond_with(
                ResponseTemplate::new(200).set_body_json(serde_json::json!({"choices": []})),
            )
            .mount(&server)
            .await;

        let summary = OpenAiSummary::new(server.uri(), "gpt-3.5-turbo", "sk-test").unwrap();
        assert!(matches!(
            summary.summarize(&report()).await,
            Err(ServiceError::Decode(_))
        ));
    }
}
