//! Gemini `generateContent` client for screenshot triage.
//!
//! Sends the image inline (base64) together with the fixed triage prompt,
//! analyst persona and response schema, and parses the model's JSON answer
//! into an `AnalysisResult`.

use base64::Engine;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::debug;

use super::model::AnalysisResult;
use super::prompt::{response_schema, ANALYST_PERSONA, RESPONSE_MIME_TYPE, TRIAGE_INSTRUCTION};
use crate::config::TriageConfig;
use crate::error::{TriageError, TriageResult};

/// Client for the Gemini REST API.
pub struct GeminiClient {
    api_key: String,
    model: String,
    base_url: String,
    temperature: f32,
    client: reqwest::Client,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct GenerateContentRequest {
    contents: Vec<Content>,
    system_instruction: Content,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<String>,
    parts: Vec<Part>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part {
    Text {
        text: String,
    },
    InlineData {
        #[serde(rename = "inlineData")]
        inline_data: Blob,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct Blob {
    mime_type: String,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    response_mime_type: String,
    response_schema: Value,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

impl GeminiClient {
    /// Create a client from the run configuration.
    pub fn new(config: &TriageConfig) -> TriageResult<Self> {
        let client = reqwest::Client::builder().timeout(config.timeout).build()?;

        Ok(Self {
            api_key: config.api_key.clone(),
            model: config.model.clone(),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            temperature: config.temperature,
            client,
        })
    }

    /// URL of the `generateContent` method for the configured model.
    pub fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model)
    }

    /// Build the request body for one screenshot.
    pub fn build_request(&self, image: &[u8], mime_type: &str) -> GenerateContentRequest {
        let data = base64::engine::general_purpose::STANDARD.encode(image);

        GenerateContentRequest {
            contents: vec![Content {
                role: Some("user".to_string()),
                parts: vec![
                    Part::Text {
                        text: TRIAGE_INSTRUCTION.to_string(),
                    },
                    Part::InlineData {
                        inline_data: Blob {
                            mime_type: mime_type.to_string(),
                            data,
                        },
                    },
                ],
            }],
            system_instruction: Content {
                role: None,
                parts: vec![Part::Text {
                    text: ANALYST_PERSONA.to_string(),
                }],
            },
            generation_config: GenerationConfig {
                temperature: self.temperature,
                response_mime_type: RESPONSE_MIME_TYPE.to_string(),
                response_schema: response_schema(),
            },
        }
    }

    /// Send the screenshot and return the model's raw text answer.
    pub async fn generate(&self, image: &[u8], mime_type: &str) -> TriageResult<String> {
        let request = self.build_request(image, mime_type);

        debug!(model = %self.model, mime_type, size = image.len(), "Calling Gemini generateContent");
        let response = self
            .client
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&request)
            .send()
            .await?;

        let status = response.status();
        debug!(status = status.as_u16(), "Gemini responded");
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(TriageError::Service {
                status: status.as_u16(),
                body,
            });
        }

        let raw = response.text().await?;
        let body: GenerateContentResponse = serde_json::from_str(&raw)?;
        extract_text(body)
    }

    /// Send the screenshot and parse the structured verdict.
    pub async fn analyze(&self, image: &[u8], mime_type: &str) -> TriageResult<AnalysisResult> {
        let text = self.generate(image, mime_type).await?;
        parse_analysis(&text)
    }
}

/// Pull the answer text out of the first candidate.
fn extract_text(body: GenerateContentResponse) -> TriageResult<String> {
    if let Some(reason) = body.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(TriageError::Blocked(reason));
    }

    let candidate = body
        .candidates
        .into_iter()
        .next()
        .ok_or(TriageError::EmptyResponse)?;

    let text: String = candidate
        .content
        .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
        .unwrap_or_default();

    if text.trim().is_empty() {
        if let Some(reason) = candidate.finish_reason.filter(|r| r != "STOP") {
            return Err(TriageError::Blocked(reason));
        }
        return Err(TriageError::EmptyResponse);
    }

    Ok(text)
}

/// Parse the model's answer into an `AnalysisResult`.
///
/// JSON mode normally yields a bare object; a fenced or prefixed object is
/// only unwrapped when the whole text does not parse.
pub fn parse_analysis(text: &str) -> TriageResult<AnalysisResult> {
    let trimmed = text.trim();
    match serde_json::from_str(trimmed) {
        Ok(result) => Ok(result),
        Err(err) => match unwrap_object(trimmed) {
            Some(inner) if inner != trimmed => Ok(serde_json::from_str(inner)?),
            _ => Err(err.into()),
        },
    }
}

/// Locate the JSON object inside a reply that is not bare JSON.
fn unwrap_object(text: &str) -> Option<&str> {
    let body = match text.strip_prefix("```") {
        // Drop the fence line (with its language tag) and the closing fence.
        Some(rest) => {
            let rest = rest.split_once('\n').map_or(rest, |(_, body)| body);
            rest.rsplit_once("```").map_or(rest, |(body, _)| body).trim()
        }
        None => text,
    };

    let start = body.find('{')?;
    let end = body.rfind('}')?;
    (end > start).then(|| &body[start..=end])
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::model::{Severity, Verdict};
    use axum::extract::State;
    use axum::http::{HeaderMap, StatusCode, Uri};
    use axum::response::{IntoResponse, Response};
    use axum::{Json, Router};
    use serde_json::json;
    use std::sync::{Arc, Mutex};

    const PHISH_JSON: &str = r#"{"Final_Verdict":"Confirmed Phish","Phishing_Confidence_Score":92,"Key_Indicators":[{"Indicator":"Mismatched sender domain","Severity":"High"}],"Explanation":"Domain spoofing detected."}"#;

    #[derive(Debug, Clone)]
    struct Seen {
        path: String,
        api_key: Option<String>,
        body: Value,
    }

    #[derive(Clone)]
    struct MockService {
        status: StatusCode,
        reply: Value,
        seen: Arc<Mutex<Option<Seen>>>,
    }

    async fn mock_generate(
        State(service): State<MockService>,
        uri: Uri,
        headers: HeaderMap,
        Json(body): Json<Value>,
    ) -> Response {
        let api_key = headers
            .get("x-goog-api-key")
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);
        *service.seen.lock().unwrap() = Some(Seen {
            path: uri.path().to_string(),
            api_key,
            body,
        });
        (service.status, Json(service.reply.clone())).into_response()
    }

    /// Start an in-process stand-in for the Gemini API.
    async fn spawn_service(status: StatusCode, reply: Value) -> (String, Arc<Mutex<Option<Seen>>>) {
        let seen = Arc::new(Mutex::new(None));
        let service = MockService {
            status,
            reply,
            seen: seen.clone(),
        };
        let app = Router::new().fallback(mock_generate).with_state(service);

        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            axum::serve(listener, app).await.unwrap();
        });

        (format!("http://{}", addr), seen)
    }

    fn candidate_reply(text: &str) -> Value {
        json!({
            "candidates": [{
                "content": { "role": "model", "parts": [{ "text": text }] },
                "finishReason": "STOP"
            }]
        })
    }

    fn client_for(base_url: &str) -> GeminiClient {
        let mut config = TriageConfig::new("test-key").with_model("gemini-test");
        config.base_url = base_url.to_string();
        GeminiClient::new(&config).unwrap()
    }

    #[test]
    fn test_request_shape() {
        let client = client_for("http://localhost");
        let request = client.build_request(b"\x89PNG", "image/png");
        let value = serde_json::to_value(&request).unwrap();

        let parts = &value["contents"][0]["parts"];
        assert_eq!(value["contents"][0]["role"], "user");
        assert_eq!(parts[0]["text"], TRIAGE_INSTRUCTION);
        assert_eq!(parts[1]["inlineData"]["mimeType"], "image/png");
        assert_eq!(parts[1]["inlineData"]["data"], "iVBORw==");
        assert_eq!(value["systemInstruction"]["parts"][0]["text"], ANALYST_PERSONA);
        assert!(value["systemInstruction"].get("role").is_none());
        assert_eq!(value["generationConfig"]["temperature"], 0.0);
        assert_eq!(value["generationConfig"]["responseMimeType"], "application/json");
        assert_eq!(value["generationConfig"]["responseSchema"], response_schema());
    }

    #[test]
    fn test_endpoint() {
        let client = client_for("https://example.test/");
        assert_eq!(
            client.endpoint(),
            "https://example.test/v1beta/models/gemini-test:generateContent"
        );
    }

    #[test]
    fn test_unwrap_object_variants() {
        assert_eq!(unwrap_object("```json\n{\"a\":1}\n```"), Some("{\"a\":1}"));
        assert_eq!(unwrap_object("```\n{\"a\":1}\n```"), Some("{\"a\":1}"));
        assert_eq!(unwrap_object("Here you go: {\"a\":1} done"), Some("{\"a\":1}"));
        assert_eq!(unwrap_object("plain"), None);
    }

    #[test]
    fn test_backticks_inside_strings_survive() {
        let json = r#"{"Final_Verdict":"Safe","Phishing_Confidence_Score":4,"Key_Indicators":[{"Indicator":"Body embeds ```powershell -enc``` payload.","Severity":"Medium"}],"Explanation":"Template ```{name}``` is benign."}"#;
        let result = parse_analysis(json).unwrap();
        assert_eq!(result.verdict, Verdict::Safe);
        assert_eq!(result.confidence_score, 4);
        assert_eq!(result.indicators[0].indicator, "Body embeds ```powershell -enc``` payload.");
        assert_eq!(result.explanation, "Template ```{name}``` is benign.");
    }

    #[test]
    fn test_fenced_reply_with_backticks_inside() {
        let text = "```json\n{\"Final_Verdict\":\"Suspicious\",\"Explanation\":\"See ```x``` here.\"}\n```";
        let result = parse_analysis(text).unwrap();
        assert_eq!(result.verdict, Verdict::Suspicious);
        assert_eq!(result.explanation, "See ```x``` here.");
    }

    #[test]
    fn test_parse_analysis_rejects_non_json() {
        let err = parse_analysis("I could not read the image.").unwrap_err();
        assert!(matches!(err, TriageError::Parse(_)));
    }

    #[test]
    fn test_parse_analysis_rejects_non_object() {
        let err = parse_analysis("\"Safe\"").unwrap_err();
        assert!(matches!(err, TriageError::Parse(_)));
    }

    #[tokio::test]
    async fn test_analyze_round_trip_against_service() {
        let (base_url, seen) = spawn_service(StatusCode::OK, candidate_reply(PHISH_JSON)).await;
        let client = client_for(&base_url);

        let result = client.analyze(b"fake-image", "image/jpeg").await.unwrap();
        assert_eq!(result.verdict, Verdict::ConfirmedPhish);
        assert_eq!(result.confidence_score, 92);
        assert_eq!(result.indicators[0].severity, Severity::High);
        assert_eq!(result.explanation, "Domain spoofing detected.");

        let seen = seen.lock().unwrap().clone().unwrap();
        assert_eq!(seen.path, "/v1beta/models/gemini-test:generateContent");
        assert_eq!(seen.api_key.as_deref(), Some("test-key"));
        assert_eq!(seen.body["contents"][0]["parts"][1]["inlineData"]["mimeType"], "image/jpeg");
        assert_eq!(seen.body["generationConfig"]["temperature"], 0.0);
    }

    #[tokio::test]
    async fn test_text_split_across_parts() {
        let reply = json!({
            "candidates": [{
                "content": { "parts": [
                    { "text": "{\"Final_Verdict\":\"Safe\"," },
                    { "text": "\"Phishing_Confidence_Score\":3}" }
                ]}
            }]
        });
        let (base_url, _) = spawn_service(StatusCode::OK, reply).await;

        let result = client_for(&base_url).analyze(b"x", "image/png").await.unwrap();
        assert_eq!(result.verdict, Verdict::Safe);
        assert_eq!(result.confidence_score, 3);
        assert!(result.indicators.is_empty());
    }

    #[tokio::test]
    async fn test_service_error() {
        let reply = json!({ "error": { "code": 403, "message": "API key not valid." } });
        let (base_url, _) = spawn_service(StatusCode::FORBIDDEN, reply).await;

        let err = client_for(&base_url).analyze(b"x", "image/png").await.unwrap_err();
        match err {
            TriageError::Service { status, body } => {
                assert_eq!(status, 403);
                assert!(body.contains("API key not valid."));
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_blocked_prompt() {
        let reply = json!({ "promptFeedback": { "blockReason": "SAFETY" } });
        let (base_url, _) = spawn_service(StatusCode::OK, reply).await;

        let err = client_for(&base_url).analyze(b"x", "image/png").await.unwrap_err();
        assert!(matches!(err, TriageError::Blocked(ref r) if r == "SAFETY"));
    }

    #[tokio::test]
    async fn test_candidate_without_text() {
        let reply = json!({ "candidates": [{ "finishReason": "RECITATION" }] });
        let (base_url, _) = spawn_service(StatusCode::OK, reply).await;

        let err = client_for(&base_url).analyze(b"x", "image/png").await.unwrap_err();
        assert!(matches!(err, TriageError::Blocked(ref r) if r == "RECITATION"));
    }

    #[tokio::test]
    async fn test_no_candidates() {
        let (base_url, _) = spawn_service(StatusCode::OK, json!({ "candidates": [] })).await;

        let err = client_for(&base_url).analyze(b"x", "image/png").await.unwrap_err();
        assert!(matches!(err, TriageError::EmptyResponse));
    }

    #[tokio::test]
    async fn test_unreachable_service() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);

        let err = client_for(&format!("http://{}", addr))
            .analyze(b"x", "image/png")
            .await
            .unwrap_err();
        assert!(matches!(err, TriageError::Transport(_)));
    }
}
