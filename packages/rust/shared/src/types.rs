//! Core domain types for Sceneweaver manifests.
//!
//! The manifest JSON is the wire contract with the front-end: field names
//! are camelCase, scene ids are integers, the manifest id is a string.

use serde::{Deserialize, Serialize};

/// Placeholder cover image used until a real cover has been generated.
pub const PLACEHOLDER_COVER_URL: &str = "https://picsum.photos/400/600?grayscale";

// ---------------------------------------------------------------------------
// Theme
// ---------------------------------------------------------------------------

/// Display fonts the front-end knows how to load.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Font {
    Orbitron,
    #[serde(rename = "Share Tech Mono")]
    ShareTechMono,
    Merriweather,
}

/// Background treatments the reader view can render.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackgroundStyle {
    PulpTexture,
    IndustrialBlueprint,
    NoirShadows,
    ClinicalWhite,
}

/// Visual theme for a book: accent color, typeface, and background style.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Theme {
    /// CSS hex color, e.g. `#FF4500`.
    pub primary_color: String,
    pub font: Font,
    pub background_style: BackgroundStyle,
}

impl Default for Theme {
    /// The pulp-adventure look, used when nothing better is known.
    fn default() -> Self {
        Self {
            primary_color: "#FF4500".into(),
            font: Font::Orbitron,
            background_style: BackgroundStyle::PulpTexture,
        }
    }
}

// ---------------------------------------------------------------------------
// AudioProfile
// ---------------------------------------------------------------------------

/// Narrator voices available from the speech synthesis service.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NarratorVoice {
    Aoede,
    Charon,
    Fenrir,
    Puck,
    Kore,
    Zephyr,
}

/// Ambient background tracks bundled with the player.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AmbientTrack {
    DesertWind,
    ComputerHum,
    SubterraneanRumble,
    WindLeaves,
    DrippingWater,
    HospitalBeeps,
    Silence,
}

/// Audio profile for a book: narration voice plus ambient bed.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AudioProfile {
    pub narrator_voice: NarratorVoice,
    pub ambient_track: AmbientTrack,
}

impl Default for AudioProfile {
    fn default() -> Self {
        Self {
            narrator_voice: NarratorVoice::Aoede,
            ambient_track: AmbientTrack::DesertWind,
        }
    }
}

// ---------------------------------------------------------------------------
// Scene
// ---------------------------------------------------------------------------

/// A contiguous narrative unit with its generation prompts.
///
/// Ids are dense and zero-based, assigned by position during synthesis;
/// any id present in upstream analysis output is overwritten.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scene {
    pub id: u32,
    pub heading: String,
    /// Narrative text of the scene. May be empty if offsets collapsed.
    pub text: String,
    /// Visual description for the image generation service.
    pub image_prompt: String,
    /// Motion/action description for the video generation service.
    pub video_prompt: String,
    /// `None` until an external generation call fills it in.
    pub generated_image_url: Option<String>,
    /// `None` until an external generation call fills it in.
    pub generated_audio_url: Option<String>,
}

// ---------------------------------------------------------------------------
// Manifest
// ---------------------------------------------------------------------------

/// The terminal artifact of ingestion: a book's scenes, theme, and audio
/// profile. Created once per ingestion call and never mutated after return.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Manifest {
    /// Derived deterministically from the filename (see [`manifest_id`]).
    pub id: String,
    pub title: String,
    pub author: String,
    pub publication_year: i32,
    pub description: String,
    /// Placeholder URL until a cover is generated.
    pub cover_image: String,
    pub tags: Vec<String>,
    pub theme: Theme,
    pub audio_profile: AudioProfile,
    pub scenes: Vec<Scene>,
}

/// Derive a stable manifest id from an uploaded filename:
/// lowercased, with spaces and dots replaced by underscores.
pub fn manifest_id(filename: &str) -> String {
    filename
        .to_lowercase()
        .chars()
        .map(|c| if c == ' ' || c == '.' { '_' } else { c })
        .collect()
}

// ---------------------------------------------------------------------------
// RawDocument
// ---------------------------------------------------------------------------

/// Immutable ingestion input: an uploaded file's name and decoded text.
/// Created at request time, consumed once, not retained.
#[derive(Debug, Clone)]
pub struct RawDocument {
    pub filename: String,
    pub content: String,
}

impl RawDocument {
    pub fn new(filename: impl Into<String>, content: impl Into<String>) -> Self {
        Self {
            filename: filename.into(),
            content: content.into(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn manifest_id_lowercases_and_replaces() {
        assert_eq!(manifest_id("Alice in Wonderland.txt"), "alice_in_wonderland_txt");
        assert_eq!(manifest_id("The.Variable.Man"), "the_variable_man");
        assert_eq!(manifest_id("plain"), "plain");
    }

    #[test]
    fn scene_serializes_camel_case_with_null_urls() {
        let scene = Scene {
            id: 0,
            heading: "Opening".into(),
            text: "It was a dark night.".into(),
            image_prompt: "pulp art, cinematic lighting".into(),
            video_prompt: "Camera pans across the desert".into(),
            generated_image_url: None,
            generated_audio_url: None,
        };

        let json = serde_json::to_value(&scene).expect("serialize scene");
        assert_eq!(json["id"], 0);
        assert_eq!(json["imagePrompt"], "pulp art, cinematic lighting");
        assert_eq!(json["videoPrompt"], "Camera pans across the desert");
        assert!(json["generatedImageUrl"].is_null());
        assert!(json["generatedAudioUrl"].is_null());
        // No snake_case leakage on the wire.
        assert!(json.get("image_prompt").is_none());
    }

    #[test]
    fn theme_enum_wire_values() {
        let theme = Theme {
            primary_color: "#8B4513".into(),
            font: Font::ShareTechMono,
            background_style: BackgroundStyle::NoirShadows,
        };
        let json = serde_json::to_value(&theme).expect("serialize theme");
        assert_eq!(json["primaryColor"], "#8B4513");
        assert_eq!(json["font"], "Share Tech Mono");
        assert_eq!(json["backgroundStyle"], "noir_shadows");
    }

    #[test]
    fn audio_profile_wire_values() {
        let audio = AudioProfile {
            narrator_voice: NarratorVoice::Fenrir,
            ambient_track: AmbientTrack::SubterraneanRumble,
        };
        let json = serde_json::to_value(&audio).expect("serialize audio profile");
        assert_eq!(json["narratorVoice"], "Fenrir");
        assert_eq!(json["ambientTrack"], "subterranean_rumble");
    }

    #[test]
    fn manifest_roundtrip() {
        let manifest = Manifest {
            id: manifest_id("A Martian Odyssey.txt"),
            title: "A Martian Odyssey".into(),
            author: "Stanley G. Weinbaum".into(),
            publication_year: 1934,
            description: "A Sci-Fi story with an adventurous tone.".into(),
            cover_image: PLACEHOLDER_COVER_URL.into(),
            tags: vec!["Sci-Fi".into(), "Adventure".into()],
            theme: Theme::default(),
            audio_profile: AudioProfile::default(),
            scenes: vec![],
        };

        let json = serde_json::to_string_pretty(&manifest).expect("serialize");
        let parsed: Manifest = serde_json::from_str(&json).expect("deserialize");
        assert_eq!(parsed, manifest);
        assert_eq!(parsed.id, "a_martian_odyssey_txt");
    }

    #[test]
    fn manifest_fixture_validates() {
        let fixture =
            std::fs::read_to_string("../../../fixtures/json/manifest.fixture.json")
                .expect("read fixture");
        let parsed: Manifest =
            serde_json::from_str(&fixture).expect("deserialize fixture manifest");
        assert_eq!(parsed.id, "the_skull_txt");
        assert_eq!(parsed.theme.background_style, BackgroundStyle::NoirShadows);
        assert_eq!(parsed.scenes.len(), 2);
        assert_eq!(parsed.scenes[1].id, 1);
    }
}
