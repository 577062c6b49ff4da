//! Shared types, error model, and configuration for Sceneweaver.
//!
//! This crate is the foundation depended on by all other Sceneweaver crates.
//! It provides:
//! - [`SceneweaverError`] — the unified error type
//! - Manifest wire types ([`Manifest`], [`Scene`], [`Theme`], [`AudioProfile`])
//! - Configuration ([`AppConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DefaultsConfig, GeminiConfig, config_dir, config_file_path, init_config,
    load_config, load_config_from, resolve_api_key,
};
pub use error::{Result, SceneweaverError};
pub use types::{
    AmbientTrack, AudioProfile, BackgroundStyle, Font, Manifest, NarratorVoice,
    PLACEHOLDER_COVER_URL, RawDocument, Scene, Theme, manifest_id,
};
