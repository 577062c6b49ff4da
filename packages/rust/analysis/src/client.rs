//! HTTP client for the external generative text-analysis service.
//!
//! Speaks the `generateContent` REST shape of the generative language API.
//! Knows nothing about manifests or scenes: callers supply an instruction
//! and a document, and get back either the parsed JSON payload or a plain
//! text completion.

use reqwest::Client;
use serde::{Deserialize, Serialize};
use tracing::debug;
use url::Url;

use sceneweaver_shared::{Result, SceneweaverError};

/// Production endpoint; tests inject a mock server base instead.
pub const DEFAULT_API_BASE: &str = "https://generativelanguage.googleapis.com";

/// User-Agent string for analysis requests.
const USER_AGENT: &str = concat!("Sceneweaver/", env!("CARGO_PKG_VERSION"));

/// Longest response-body excerpt quoted in error messages.
const BODY_SNIPPET_CHARS: usize = 200;

// ---------------------------------------------------------------------------
// Wire types
// ---------------------------------------------------------------------------

/// Request body for `models/<id>:generateContent`.
#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
    #[serde(rename = "generationConfig", skip_serializing_if = "Option::is_none")]
    generation_config: Option<GenerationConfig>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
struct Part<'a> {
    text: &'a str,
}

#[derive(Debug, Serialize)]
struct GenerationConfig {
    response_mime_type: &'static str,
}

/// Response envelope; everything is optional because partial bodies happen.
#[derive(Debug, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Deserialize)]
struct Candidate {
    content: Option<CandidateContent>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    #[serde(default)]
    text: String,
}

// ---------------------------------------------------------------------------
// Client
// ---------------------------------------------------------------------------

/// Configured handle to the analysis service, reused across requests.
///
/// Constructed once at startup and injected into the pipeline, so tests can
/// point it at a fake server.
#[derive(Debug, Clone)]
pub struct AnalysisClient {
    http: Client,
    api_base: Url,
    api_key: String,
}

impl AnalysisClient {
    /// Create a client against the production endpoint.
    pub fn new(api_key: impl Into<String>) -> Result<Self> {
        let base = Url::parse(DEFAULT_API_BASE)
            .map_err(|e| SceneweaverError::config(format!("invalid API base: {e}")))?;
        Self::with_base(api_key, base)
    }

    /// Create a client against an explicit base URL.
    pub fn with_base(api_key: impl Into<String>, api_base: Url) -> Result<Self> {
        let api_key = api_key.into();
        if api_key.is_empty() {
            return Err(SceneweaverError::AnalysisUnavailable);
        }

        // TODO: per-attempt timeout so a hung call falls through to the
        // next model instead of blocking the ingestion indefinitely.
        let http = Client::builder()
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| {
                SceneweaverError::config(format!("failed to build HTTP client: {e}"))
            })?;

        Ok(Self {
            http,
            api_base,
            api_key,
        })
    }

    /// Send `instruction` and `document` to `model_id`, requiring a JSON
    /// reply, and parse it.
    ///
    /// Unreachable service, non-success status, a missing candidate, and an
    /// unparseable payload all collapse into [`SceneweaverError::Analysis`];
    /// the message tells them apart for the logs.
    pub async fn analyze(
        &self,
        model_id: &str,
        instruction: &str,
        document: &str,
    ) -> Result<serde_json::Value> {
        let text = self
            .generate(model_id, &[instruction, document], true)
            .await?;

        serde_json::from_str(&text).map_err(|e| {
            SceneweaverError::analysis(model_id, format!("unparseable response: {e}"))
        })
    }

    /// Send `instruction` to `model_id` and return the raw text completion.
    pub async fn generate_text(&self, model_id: &str, instruction: &str) -> Result<String> {
        self.generate(model_id, &[instruction], false).await
    }

    /// Shared request path: one `generateContent` call, one candidate out.
    async fn generate(
        &self,
        model_id: &str,
        parts: &[&str],
        json_response: bool,
    ) -> Result<String> {
        let url = self.endpoint(model_id)?;

        let request = GenerateRequest {
            contents: vec![Content {
                // Empty parts are rejected upstream; skip them.
                parts: parts
                    .iter()
                    .filter(|text| !text.is_empty())
                    .map(|text| Part { text })
                    .collect(),
            }],
            generation_config: json_response.then_some(GenerationConfig {
                response_mime_type: "application/json",
            }),
        };

        debug!(model = %model_id, parts = parts.len(), "sending generateContent request");

        let response = self
            .http
            .post(url)
            .json(&request)
            .send()
            .await
            .map_err(|e| {
                SceneweaverError::analysis(model_id, format!("request failed: {e}"))
            })?;

        let status = response.status();
        let body = response.text().await.map_err(|e| {
            SceneweaverError::analysis(model_id, format!("failed to read response body: {e}"))
        })?;

        if !status.is_success() {
            return Err(SceneweaverError::analysis(
                model_id,
                format!("HTTP {status}: {}", snippet(&body)),
            ));
        }

        let parsed: GenerateResponse = serde_json::from_str(&body).map_err(|e| {
            SceneweaverError::analysis(
                model_id,
                format!("invalid response envelope: {e} (got: {})", snippet(&body)),
            )
        })?;

        parsed
            .candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .and_then(|c| c.parts.into_iter().next())
            .map(|p| p.text)
            .filter(|t| !t.is_empty())
            .ok_or_else(|| {
                SceneweaverError::analysis(model_id, "response contained no candidate text")
            })
    }

    /// Build the keyed endpoint URL for a model, stripping the `-latest`
    /// alias the v1beta path does not accept.
    fn endpoint(&self, model_id: &str) -> Result<Url> {
        let model_id = model_id.strip_suffix("-latest").unwrap_or(model_id);

        let mut url = self
            .api_base
            .join(&format!("/v1beta/models/{model_id}:generateContent"))
            .map_err(|e| {
                SceneweaverError::validation(format!("invalid model id '{model_id}': {e}"))
            })?;

        url.query_pairs_mut().append_pair("key", &self.api_key);
        Ok(url)
    }
}

/// First [`BODY_SNIPPET_CHARS`] characters of a body, for error messages.
fn snippet(body: &str) -> String {
    body.chars().take(BODY_SNIPPET_CHARS).collect()
}
