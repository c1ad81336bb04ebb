//! Roadmap generation through a text-generation API.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::time::Duration;

use crate::config::{self, RoadmapperConfig};
use crate::error::{Result, RoadmapError};

/// Produces raw roadmap text for a topic.
///
/// The text is expected, but not guaranteed, to follow the phase/bullet
/// grammar understood by [`crate::roadmap::parse`].
#[async_trait]
pub trait RoadmapGenerator: Send + Sync {
    async fn generate(&self, topic: &str) -> Result<String>;
}

/// Client for the Gemini `generateContent` endpoint.
#[derive(Clone, Debug)]
pub struct GeminiClient {
    http: reqwest::Client,
    base_url: String,
    model: String,
    api_key: String,
}

impl GeminiClient {
    pub fn new(
        base_url: impl Into<String>,
        model: impl Into<String>,
        api_key: impl Into<String>,
        timeout: Duration,
    ) -> Result<Self> {
        let http = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("roadmapper/", env!("CARGO_PKG_VERSION")))
            .build()?;
        Ok(Self {
            http,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            model: model.into(),
            api_key: api_key.into(),
        })
    }

    /// Builds a client from config, reading the key from `GEMINI_API_KEY`.
    pub fn from_config(cfg: &RoadmapperConfig) -> Result<Self> {
        Self::new(
            &cfg.api_base_url,
            &cfg.model,
            config::api_key()?,
            cfg.request_timeout(),
        )
    }

    /// Replaces the underlying HTTP client (proxy or TLS customisation).
    pub fn with_http_client(mut self, http: reqwest::Client) -> Self {
        self.http = http;
        self
    }

    fn endpoint(&self) -> String {
        format!("{}/v1beta/models/{}:generateContent", self.base_url, self.model)
    }
}

#[async_trait]
impl RoadmapGenerator for GeminiClient {
    async fn generate(&self, topic: &str) -> Result<String> {
        let topic = topic.trim();
        if topic.is_empty() {
            return Err(RoadmapError::Generation("Topic is required".into()));
        }

        tracing::info!(model = %self.model, topic, "requesting roadmap");
        let body = json!({
            "contents": [{ "parts": [{ "text": build_prompt(topic) }] }]
        });
        let response = self
            .http
            .post(self.endpoint())
            .header("x-goog-api-key", &self.api_key)
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        if !status.is_success() {
            let detail = response.text().await.unwrap_or_default();
            tracing::warn!(%status, "generation request failed");
            return Err(RoadmapError::Generation(format!(
                "API returned {status}: {}",
                detail.chars().take(200).collect::<String>()
            )));
        }

        let reply: Value = response.json().await?;
        let text = candidate_text(&reply)
            .ok_or_else(|| RoadmapError::Generation("response had no text candidate".into()))?;
        let roadmap = extract_roadmap(&text)?;
        tracing::info!(chars = roadmap.len(), "received roadmap");
        Ok(roadmap)
    }
}

/// Prompt asking for a phase/step outline wrapped in `{"roadmap": "..."}`.
pub fn build_prompt(topic: &str) -> String {
    format!(
        r#"You are an expert career and learning roadmap generator.
Create a detailed, step-by-step learning roadmap for the topic below.

Reply with ONLY a JSON object with a single key "roadmap" whose value is a string.
Inside that string, format the roadmap as phases and steps exactly like this:

**Phase 1: <phase title>**
* **Step 1.1: <step title>** <what to learn or do>
* **Step 1.2: <step title>** <what to learn or do>

**Phase 2: <phase title>**
* **Step 2.1: <step title>** <what to learn or do>

Topic: {topic}"#
    )
}

/// Concatenates the text parts of the first candidate.
fn candidate_text(reply: &Value) -> Option<String> {
    let parts = reply["candidates"][0]["content"]["parts"].as_array()?;
    let text: String = parts.iter().filter_map(|p| p["text"].as_str()).collect();
    (!text.is_empty()).then_some(text)
}

/// Pulls the `roadmap` string out of model text that should contain a JSON
/// object, possibly wrapped in prose or code fences.
///
/// The object is taken from the first `{` to the last `}`.
pub fn extract_roadmap(text: &str) -> Result<String> {
    let (Some(start), Some(end)) = (text.find('{'), text.rfind('}')) else {
        return Err(RoadmapError::Generation(
            "Could not find a JSON object in the model response".into(),
        ));
    };
    if end < start {
        return Err(RoadmapError::Generation(
            "Could not find a JSON object in the model response".into(),
        ));
    }
    let parsed: Value = serde_json::from_str(&text[start..=end])?;
    match parsed.get("roadmap") {
        Some(Value::String(roadmap)) => Ok(roadmap.clone()),
        _ => Err(RoadmapError::Generation(
            "model response has no \"roadmap\" string".into(),
        )),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tokio::io::{AsyncReadExt, AsyncWriteExt};
    use tokio::net::TcpListener;

    #[test]
    fn extracts_from_fenced_reply() {
        let text = "Sure!\n```json\n{\"roadmap\": \"**Phase 1: A**\\n* a\"}\n```";
        assert_eq!(extract_roadmap(text).unwrap(), "**Phase 1: A**\n* a");
    }

    #[test]
    fn rejects_reply_without_object() {
        assert!(matches!(
            extract_roadmap("no braces here"),
            Err(RoadmapError::Generation(_))
        ));
        assert!(matches!(extract_roadmap("} backwards {"), Err(RoadmapError::Generation(_))));
    }

    #[test]
    fn rejects_non_string_roadmap() {
        assert!(matches!(
            extract_roadmap(r#"{"roadmap": [{"title": "x"}]}"#),
            Err(RoadmapError::Generation(_))
        ));
        assert!(matches!(extract_roadmap("{not json}"), Err(RoadmapError::Json(_))));
    }

    #[test]
    fn prompt_mentions_topic_and_grammar() {
        let prompt = build_prompt("Data Science");
        assert!(prompt.contains("Topic: Data Science"));
        assert!(prompt.contains("**Phase 1:"));
    }

    fn local_http() -> reqwest::Client {
        reqwest::Client::builder().no_proxy().build().unwrap()
    }

    /// Serves one canned HTTP response and returns the request it received.
    async fn serve_once(status: &'static str, body: String) -> (String, tokio::task::JoinHandle<String>) {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let handle = tokio::spawn(async move {
            let (mut stream, _) = listener.accept().await.unwrap();
            let mut buf = Vec::new();
            let mut chunk = [0u8; 4096];
            loop {
                let n = stream.read(&mut chunk).await.unwrap();
                if n == 0 {
                    break;
                }
                buf.extend_from_slice(&chunk[..n]);
                let text = String::from_utf8_lossy(&buf);
                if let Some(header_end) = text.find("\r\n\r\n") {
                    let length = text[..header_end]
                        .lines()
                        .find_map(|l| {
                            let (name, value) = l.split_once(':')?;
                            name.eq_ignore_ascii_case("content-length")
                                .then(|| value.trim().parse::<usize>().ok())
                                .flatten()
                        })
                        .unwrap_or(0);
                    if buf.len() >= header_end + 4 + length {
                        break;
                    }
                }
            }
            let response = format!(
                "HTTP/1.1 {status}\r\nContent-Type: application/json\r\nContent-Length: {}\r\nConnection: close\r\n\r\n{body}",
                body.len()
            );
            stream.write_all(response.as_bytes()).await.unwrap();
            String::from_utf8_lossy(&buf).to_string()
        });
        (format!("http://{addr}"), handle)
    }

    #[tokio::test]
    async fn generates_from_candidate_text() {
        let inner = json!({ "roadmap": "**Phase 1: Basics**\n* HTML" }).to_string();
        let reply = json!({
            "candidates": [{ "content": { "parts": [{ "text": format!("```json\n{inner}\n```") }] } }]
        });
        let (base, server) = serve_once("200 OK", reply.to_string()).await;

        let client = GeminiClient::new(base, "test-model", "secret", Duration::from_secs(5))
            .unwrap()
            .with_http_client(local_http());
        let roadmap = client.generate("  Web Dev ").await.unwrap();
        assert_eq!(roadmap, "**Phase 1: Basics**\n* HTML");

        let request = server.await.unwrap();
        assert!(request.starts_with("POST /v1beta/models/test-model:generateContent"));
        assert!(request.to_lowercase().contains("x-goog-api-key: secret"));
        assert!(request.contains("Topic: Web Dev"));
    }

    #[tokio::test]
    async fn api_errors_surface_as_generation_errors() {
        let (base, server) = serve_once("500 Internal Server Error", "{\"error\":\"boom\"}".into()).await;
        let client = GeminiClient::new(base, "m", "k", Duration::from_secs(5))
            .unwrap()
            .with_http_client(local_http());
        let err = client.generate("Rust").await.unwrap_err();
        assert!(matches!(err, RoadmapError::Generation(ref msg) if msg.contains("500")));
        server.await.unwrap();
    }

    #[tokio::test]
    async fn empty_topic_is_rejected_without_a_request() {
        let client = GeminiClient::new("http://127.0.0.1:9", "m", "k", Duration::from_secs(1)).unwrap();
        let err = client.generate("   ").await.unwrap_err();
        assert_eq!(err.to_string(), "Generation failed: Topic is required");
    }
}
