//! Manifest synthesis for Sceneweaver.
//!
//! Ties the analysis client, scene extractor, chunker, and vibe mapper into
//! the end-to-end ingestion pipeline.

pub mod pipeline;

pub use pipeline::{FALLBACK_CHUNK_SIZE, IngestOptions, Ingestor, VIBE_SAMPLE_CHARS};
