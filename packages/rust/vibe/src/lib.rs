//! Maps coarse narrative descriptors (tone, genre, setting) to a concrete
//! visual theme and audio profile.
//!
//! Both mappers are total: case-insensitive substring matching against a
//! small ordered rule table, first match wins, and a fixed complete default
//! covers everything else. No branch can return a partially-populated value.

use sceneweaver_shared::{
    AmbientTrack, AudioProfile, BackgroundStyle, Font, NarratorVoice, Theme,
};

/// True if `haystack` contains any of `needles`, ignoring ASCII case.
fn contains_any(haystack: &str, needles: &[&str]) -> bool {
    let lowered = haystack.to_lowercase();
    needles.iter().any(|n| lowered.contains(n))
}

// ---------------------------------------------------------------------------
// Theme mapping
// ---------------------------------------------------------------------------

/// Map a tone and setting to a visual theme. First matching rule wins;
/// the pulp default covers everything unrecognized.
pub fn map_tone_to_theme(tone: &str, setting: &str) -> Theme {
    if contains_any(tone, &["dark", "horror", "noir", "grim", "bleak"]) {
        return Theme {
            primary_color: "#8B4513".into(),
            font: Font::ShareTechMono,
            background_style: BackgroundStyle::NoirShadows,
        };
    }

    if contains_any(tone, &["clinical", "sterile", "detached"])
        || contains_any(setting, &["hospital", "laboratory", "clinic"])
    {
        return Theme {
            primary_color: "#800080".into(),
            font: Font::Orbitron,
            background_style: BackgroundStyle::ClinicalWhite,
        };
    }

    if contains_any(tone, &["tense", "oppressive"])
        || contains_any(setting, &["factory", "industrial", "station", "bunker", "war"])
    {
        return Theme {
            primary_color: "#00BFFF".into(),
            font: Font::ShareTechMono,
            background_style: BackgroundStyle::IndustrialBlueprint,
        };
    }

    if contains_any(tone, &["whimsical", "gentle", "dreamlike", "surreal"])
        || contains_any(setting, &["forest", "woods", "garden", "countryside"])
    {
        return Theme {
            primary_color: "#228B22".into(),
            font: Font::Merriweather,
            background_style: BackgroundStyle::ClinicalWhite,
        };
    }

    Theme::default()
}

// ---------------------------------------------------------------------------
// Audio mapping
// ---------------------------------------------------------------------------

/// Map a tone and genre to an audio profile. Same rule discipline as
/// [`map_tone_to_theme`].
pub fn map_tone_to_audio(tone: &str, genre: &str) -> AudioProfile {
    if contains_any(genre, &["horror"]) || contains_any(tone, &["dark", "dread", "grim"]) {
        return AudioProfile {
            narrator_voice: NarratorVoice::Fenrir,
            ambient_track: AmbientTrack::SubterraneanRumble,
        };
    }

    if contains_any(genre, &["mystery", "noir", "crime"])
        || contains_any(tone, &["tense", "suspense"])
    {
        return AudioProfile {
            narrator_voice: NarratorVoice::Kore,
            ambient_track: AmbientTrack::DrippingWater,
        };
    }

    if contains_any(genre, &["satire", "dystopia"]) || contains_any(tone, &["clinical", "detached"])
    {
        return AudioProfile {
            narrator_voice: NarratorVoice::Zephyr,
            ambient_track: AmbientTrack::HospitalBeeps,
        };
    }

    if contains_any(genre, &["fantasy", "pastoral", "fairy"])
        || contains_any(tone, &["whimsical", "gentle"])
    {
        return AudioProfile {
            narrator_voice: NarratorVoice::Puck,
            ambient_track: AmbientTrack::WindLeaves,
        };
    }

    if contains_any(genre, &["war", "thriller", "cyberpunk", "techno"]) {
        return AudioProfile {
            narrator_voice: NarratorVoice::Charon,
            ambient_track: AmbientTrack::ComputerHum,
        };
    }

    AudioProfile::default()
}
