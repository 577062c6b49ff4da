//! Scene extraction: drives the analysis client with a segmentation
//! instruction, tries model ids in priority order, and normalizes whatever
//! comes back into a predictable shape.
//!
//! Normalization never rejects a scene: offsets are coerced and clamped,
//! missing fields become empty strings, and metadata gets best-effort
//! placeholders. The only hard failure is every model failing in turn.

use std::time::Duration;

use serde::Deserialize;
use serde_json::Value;
use tracing::{info, instrument, warn};

use sceneweaver_shared::{
    AppConfig, AudioProfile, Result, SceneweaverError, Theme,
};

use crate::client::AnalysisClient;
use crate::text::{char_len, char_slice, truncate_chars};

/// Hard cap on characters submitted for analysis, to bound memory and cost
/// regardless of input size.
pub const MAX_ANALYSIS_CHARS: usize = 500_000;

/// Pause between failed model attempts.
pub const MODEL_RETRY_BACKOFF: Duration = Duration::from_secs(1);

/// Model ids tried in priority order: known-good primary first, then the
/// large-context alternate.
pub const DEFAULT_MODELS: &[&str] = &["gemini-2.5-flash", "gemini-2.0-flash"];

/// Tags used when no vibe analysis is available at all.
pub const DEFAULT_FALLBACK_TAGS: &[&str] = &["Sci-Fi", "Classic"];

const UNTITLED: &str = "Untitled";
const UNKNOWN: &str = "Unknown";

/// Fixed segmentation instruction sent ahead of the book text.
const SCENE_EXTRACTION_INSTRUCTION: &str = r#"Analyze the provided book text.
Split the ENTIRE book into 10-20 major scenes or chapters.
Ensure every part of the book is covered by a scene (contiguous).
Output a JSON object with this structure:
{
  "metadata": {
    "title": "Book Title",
    "author": "Author Name",
    "publication_year": "Year or Unknown",
    "source": "Source",
    "genre": "Genre",
    "tone": "Tone",
    "setting": "Setting"
  },
  "scenes": [
    {
      "heading": "Scene Title",
      "start_char": 0,
      "end_char": 100,
      "summary": "Summary",
      "image_prompt": "Detailed visual description: style, lighting, key elements.",
      "video_prompt": "Description of the motion and action in the scene."
    }
  ]
}
IMPORTANT: 'start_char' and 'end_char' must be integers."#;

/// Instruction for the lightweight vibe probe. Options are constrained to
/// the vocabularies the manifest types accept.
const VIBE_INSTRUCTION: &str = r#"Analyze the following text sample from a book.
Determine the Genre, Tone, and Setting.
Based on this, recommend:
1. A CSS primary color (hex code).
2. A font (options: 'Orbitron', 'Share Tech Mono', 'Merriweather').
3. A background style keyword (options: 'pulp_texture', 'industrial_blueprint', 'noir_shadows', 'clinical_white').
4. A narrator voice (options: 'Aoede', 'Charon', 'Fenrir', 'Puck', 'Kore', 'Zephyr').
5. An ambient track (options: 'desert_wind', 'computer_hum', 'subterranean_rumble', 'wind_leaves', 'dripping_water', 'hospital_beeps', 'silence').
6. Three short tags describing the book.
Return ONLY a valid JSON object with this structure:
{
  "theme": { "primaryColor": "...", "font": "...", "backgroundStyle": "..." },
  "audioProfile": { "narratorVoice": "...", "ambientTrack": "..." },
  "tags": ["...", "...", "..."]
}"#;

// ---------------------------------------------------------------------------
// Wire types (snake_case, lenient: the model does not always comply)
// ---------------------------------------------------------------------------

/// Book metadata as the model reports it. Everything optional.
#[derive(Debug, Clone, Default, Deserialize)]
struct RawMetadata {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    author: Option<String>,
    #[serde(default)]
    publication_year: Option<String>,
    #[serde(default)]
    source: Option<String>,
    #[serde(default)]
    genre: Option<String>,
    #[serde(default)]
    tone: Option<String>,
    #[serde(default)]
    setting: Option<String>,
}

/// A scene as the model reports it. Offsets arrive as arbitrary JSON values
/// because integers are requested but not guaranteed.
#[derive(Debug, Clone, Default, Deserialize)]
struct RawScene {
    #[serde(default)]
    heading: Option<String>,
    #[serde(default)]
    start_char: Value,
    #[serde(default)]
    end_char: Value,
    #[serde(default)]
    summary: Option<String>,
    #[serde(default)]
    image_prompt: Option<String>,
    #[serde(default)]
    video_prompt: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct RawAnalysis {
    #[serde(default)]
    metadata: RawMetadata,
    #[serde(default)]
    scenes: Vec<RawScene>,
}

// ---------------------------------------------------------------------------
// Normalized output
// ---------------------------------------------------------------------------

/// Book metadata after placeholder defaults have been applied.
#[derive(Debug, Clone, PartialEq)]
pub struct DocumentMetadata {
    /// `"Untitled"` when the model reported nothing usable; the synthesizer
    /// substitutes the filename in that case.
    pub title: String,
    pub author: String,
    pub publication_year: String,
    pub source: String,
    pub genre: String,
    pub tone: String,
    pub setting: String,
}

impl DocumentMetadata {
    fn from_raw(raw: RawMetadata) -> Self {
        Self {
            title: or_placeholder(raw.title, UNTITLED),
            author: or_placeholder(raw.author, UNKNOWN),
            publication_year: or_placeholder(raw.publication_year, UNKNOWN),
            source: raw.source.unwrap_or_default(),
            genre: raw.genre.unwrap_or_default(),
            tone: raw.tone.unwrap_or_default(),
            setting: raw.setting.unwrap_or_default(),
        }
    }

    /// True when the title is still the extraction placeholder.
    pub fn title_is_placeholder(&self) -> bool {
        self.title == UNTITLED
    }
}

/// A normalized scene: clamped offsets, sliced text, defaulted prompts.
#[derive(Debug, Clone, PartialEq)]
pub struct SceneDraft {
    pub heading: String,
    pub text: String,
    pub summary: String,
    pub image_prompt: String,
    pub video_prompt: String,
    pub start_char: usize,
    pub end_char: usize,
}

/// Output of a successful extraction, consumed once by the synthesizer.
#[derive(Debug, Clone)]
pub struct AnalysisResult {
    pub metadata: DocumentMetadata,
    pub scenes: Vec<SceneDraft>,
}

/// Result of the lightweight vibe probe: a complete theme/audio/tag triple.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct VibeSummary {
    pub theme: Theme,
    #[serde(rename = "audioProfile")]
    pub audio_profile: AudioProfile,
    #[serde(default)]
    pub tags: Vec<String>,
}

impl VibeSummary {
    /// The fixed triple used when no analysis capability is available.
    pub fn offline_default() -> Self {
        Self {
            theme: Theme::default(),
            audio_profile: AudioProfile::default(),
            tags: DEFAULT_FALLBACK_TAGS.iter().map(|t| t.to_string()).collect(),
        }
    }
}

/// A fabricated continuation scene (camelCase wire, all fields optional).
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContinuationScene {
    #[serde(default)]
    pub heading: Option<String>,
    #[serde(default)]
    pub text: Option<String>,
    #[serde(default)]
    pub image_prompt: Option<String>,
    #[serde(default)]
    pub video_prompt: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
struct ContinuationResponse {
    #[serde(default)]
    scenes: Vec<ContinuationScene>,
}

// ---------------------------------------------------------------------------
// Extractor
// ---------------------------------------------------------------------------

/// Knobs for the extraction loop.
#[derive(Debug, Clone)]
pub struct ExtractorOptions {
    /// Model ids tried in priority order.
    pub models: Vec<String>,
    /// Pause between failed attempts.
    pub backoff: Duration,
    /// Character cap applied before submission.
    pub max_chars: usize,
}

impl Default for ExtractorOptions {
    fn default() -> Self {
        Self {
            models: DEFAULT_MODELS.iter().map(|m| m.to_string()).collect(),
            backoff: MODEL_RETRY_BACKOFF,
            max_chars: MAX_ANALYSIS_CHARS,
        }
    }
}

impl From<&AppConfig> for ExtractorOptions {
    fn from(config: &AppConfig) -> Self {
        Self {
            models: config.gemini.models.clone(),
            backoff: Duration::from_millis(config.gemini.retry_backoff_ms),
            max_chars: config.gemini.max_analysis_chars,
        }
    }
}

/// Scene extractor: ordered model fallback plus output normalization.
pub struct SceneExtractor {
    client: AnalysisClient,
    options: ExtractorOptions,
}

impl SceneExtractor {
    /// Create an extractor with default options.
    pub fn new(client: AnalysisClient) -> Self {
        Self::with_options(client, ExtractorOptions::default())
    }

    pub fn with_options(client: AnalysisClient, options: ExtractorOptions) -> Self {
        Self { client, options }
    }

    /// Segment `text` into scenes with metadata.
    ///
    /// Tries each configured model in order, stopping at the first success;
    /// a structurally unusable reply counts as that model's failure. Only
    /// exhaustion of the whole list surfaces an error, which is the
    /// orchestrator's cue to take the non-AI path.
    #[instrument(skip_all, fields(chars = char_len(text)))]
    pub async fn extract_analysis(&self, text: &str) -> Result<AnalysisResult> {
        let text = truncate_chars(text, self.options.max_chars);
        let mut last_error: Option<SceneweaverError> = None;

        for model_id in &self.options.models {
            info!(model = %model_id, "attempting scene extraction");

            let attempt = self
                .client
                .analyze(model_id, SCENE_EXTRACTION_INSTRUCTION, text)
                .await
                .and_then(|value| process_analysis(model_id, value, text));

            match attempt {
                Ok(result) => {
                    info!(
                        model = %model_id,
                        scenes = result.scenes.len(),
                        "scene extraction succeeded"
                    );
                    return Ok(result);
                }
                Err(e) => {
                    warn!(model = %model_id, error = %e, "scene extraction attempt failed");
                    last_error = Some(e);
                    tokio::time::sleep(self.options.backoff).await;
                }
            }
        }

        warn!("all models failed scene extraction");
        Err(last_error
            .unwrap_or_else(|| SceneweaverError::validation("no analysis models configured")))
    }

    /// Lightweight single-call vibe probe on a text sample. No fallback
    /// tier: any failure is the caller's cue to use the default triple.
    pub async fn probe_vibe(&self, sample: &str) -> Result<VibeSummary> {
        let model_id = self.first_model()?;
        let value = self.client.analyze(model_id, VIBE_INSTRUCTION, sample).await?;

        serde_json::from_value(value).map_err(|e| {
            SceneweaverError::analysis(model_id, format!("unexpected vibe shape: {e}"))
        })
    }

    /// Ask the model to fabricate `count` scenes continuing an existing
    /// book, described by `context`. Single attempt, no fallback tier.
    pub async fn continue_scenes(
        &self,
        context: &str,
        count: usize,
    ) -> Result<Vec<ContinuationScene>> {
        let model_id = self.first_model()?;

        let instruction = format!(
            "You are continuing a book for a reader who has reached the end \
             of the available text. {context}\n\
             Write {count} new scenes that continue the story. Each scene needs \
             a heading, narrative text, a detailed visual description for an \
             image generator, and a motion description for a video generator.\n\
             Return ONLY a valid JSON object with this structure:\n\
             {{ \"scenes\": [ {{ \"heading\": \"...\", \"text\": \"...\", \
             \"imagePrompt\": \"...\", \"videoPrompt\": \"...\" }} ] }}"
        );

        let value = self.client.analyze(model_id, &instruction, "").await?;

        let response: ContinuationResponse = serde_json::from_value(value).map_err(|e| {
            SceneweaverError::analysis(model_id, format!("unexpected continuation shape: {e}"))
        })?;

        Ok(response.scenes)
    }

    /// Freeform text generation against the first configured model.
    pub async fn generate_text(&self, instruction: &str) -> Result<String> {
        let model_id = self.first_model()?;
        self.client.generate_text(model_id, instruction).await
    }

    fn first_model(&self) -> Result<&str> {
        self.options
            .models
            .first()
            .map(String::as_str)
            .ok_or_else(|| SceneweaverError::validation("no analysis models configured"))
    }
}

// ---------------------------------------------------------------------------
// Post-processing
// ---------------------------------------------------------------------------

/// Normalize a parsed analysis payload against the submitted text.
///
/// Offsets are coerced to integers (zero on anything unusable), clamped to
/// `0..=char-length`, and an inverted range slices to empty (no swap, no
/// rejection). Prompt fields land in their camelCase destinations with
/// empty defaults.
fn process_analysis(model_id: &str, value: Value, full_text: &str) -> Result<AnalysisResult> {
    let raw: RawAnalysis = serde_json::from_value(value).map_err(|e| {
        SceneweaverError::analysis(model_id, format!("unexpected response shape: {e}"))
    })?;

    let text_len = char_len(full_text) as i64;

    let scenes = raw
        .scenes
        .into_iter()
        .map(|scene| {
            let start = coerce_offset(&scene.start_char, "start_char").max(0);
            let end = coerce_offset(&scene.end_char, "end_char").clamp(0, text_len);

            // end < start slices to empty via char_slice.
            let text = char_slice(full_text, start as usize, end as usize);

            SceneDraft {
                heading: scene.heading.unwrap_or_else(|| UNTITLED.into()),
                text: text.to_string(),
                summary: scene.summary.unwrap_or_default(),
                image_prompt: scene.image_prompt.unwrap_or_default(),
                video_prompt: scene.video_prompt.unwrap_or_default(),
                start_char: start as usize,
                end_char: end as usize,
            }
        })
        .collect();

    Ok(AnalysisResult {
        metadata: DocumentMetadata::from_raw(raw.metadata),
        scenes,
    })
}

/// Coerce a reported offset to an integer. Numbers are truncated, numeric
/// strings parsed, and anything else defaults to zero; extraction never
/// fails over a bad offset.
fn coerce_offset(value: &Value, field: &str) -> i64 {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f as i64))
            .unwrap_or_else(|| {
                warn!(field, "offset out of integer range, defaulting to 0");
                0
            }),
        Value::String(s) => s.trim().parse().unwrap_or_else(|_| {
            warn!(field, value = %s, "non-integer offset, defaulting to 0");
            0
        }),
        Value::Null => 0,
        other => {
            warn!(field, ?other, "non-numeric offset, defaulting to 0");
            0
        }
    }
}

fn or_placeholder(value: Option<String>, placeholder: &str) -> String {
    match value {
        Some(s) if !s.trim().is_empty() => s,
        _ => placeholder.into(),
    }
}
