//! Text analysis for Sceneweaver: the HTTP client for the external
//! generative analysis service, and the scene extractor that drives it
//! with ordered model fallback and output normalization.

pub mod client;
pub mod extractor;
pub mod text;

pub use client::{AnalysisClient, DEFAULT_API_BASE};
pub use extractor::{
    AnalysisResult, ContinuationScene, DEFAULT_FALLBACK_TAGS, DEFAULT_MODELS, DocumentMetadata,
    ExtractorOptions, MAX_ANALYSIS_CHARS, MODEL_RETRY_BACKOFF, SceneDraft, SceneExtractor,
    VibeSummary,
};
pub use text::{char_len, char_slice, truncate_chars};
