//! Book ingestion pipeline: raw text in, scene manifest out.
//!
//! Three terminal outcomes, attempted in strict order: structured analysis
//! (Path A), chunk-based fallback seeded by a lightweight vibe probe
//! (Path B), and the fully offline fallback when no analysis capability is
//! configured (Path C). All three converge on the same manifest shape, so
//! ingestion never fails; degradation shows up only in tags, description,
//! and the log trail.

use tracing::{info, instrument, warn};

use sceneweaver_analysis::{
    AnalysisResult, SceneExtractor, VibeSummary, truncate_chars,
};
use sceneweaver_shared::{
    Manifest, PLACEHOLDER_COVER_URL, RawDocument, Scene, manifest_id,
};
use sceneweaver_vibe::{map_tone_to_audio, map_tone_to_theme};

/// Chunk size for the non-AI fallback path, larger than the chunker default
/// so degraded manifests stay readable.
pub const FALLBACK_CHUNK_SIZE: usize = 1500;

/// Leading characters sampled for the vibe probe.
pub const VIBE_SAMPLE_CHARS: usize = 5000;

/// Scenes fabricated per continuation request.
const CONTINUATION_SCENES: usize = 3;

/// Year used when the analysis metadata has no parseable year.
const DEFAULT_PUBLICATION_YEAR: i32 = 2024;

/// Fixed tag appended to every structured manifest.
const DEFAULT_TAG: &str = "Sci-Fi";

// ---------------------------------------------------------------------------
// Options
// ---------------------------------------------------------------------------

/// Knobs for the ingestion pipeline.
#[derive(Debug, Clone)]
pub struct IngestOptions {
    /// Chunk size (characters) for the fallback path.
    pub fallback_chunk_size: usize,
    /// Sample length (characters) for the vibe probe.
    pub vibe_sample_chars: usize,
}

impl Default for IngestOptions {
    fn default() -> Self {
        Self {
            fallback_chunk_size: FALLBACK_CHUNK_SIZE,
            vibe_sample_chars: VIBE_SAMPLE_CHARS,
        }
    }
}

// ---------------------------------------------------------------------------
// Ingestor
// ---------------------------------------------------------------------------

/// Manifest synthesizer. Holds the (optional) scene extractor for the whole
/// process lifetime; constructed once at startup and injected wherever
/// ingestion happens, so tests can hand it a fake analysis service.
pub struct Ingestor {
    extractor: Option<SceneExtractor>,
    options: IngestOptions,
}

impl Ingestor {
    /// Create an ingestor. `None` means no analysis capability is
    /// configured (e.g. missing API key) and every ingestion takes the
    /// offline path.
    pub fn new(extractor: Option<SceneExtractor>) -> Self {
        Self::with_options(extractor, IngestOptions::default())
    }

    pub fn with_options(extractor: Option<SceneExtractor>, options: IngestOptions) -> Self {
        Self { extractor, options }
    }

    /// Ingest a document into a manifest. Never fails: every internal
    /// failure lands on the chunk-based fallback instead.
    #[instrument(skip_all, fields(filename = %doc.filename))]
    pub async fn ingest(&self, doc: &RawDocument) -> Manifest {
        let Some(extractor) = &self.extractor else {
            info!("no analysis capability configured, synthesizing from chunks");
            return self.fallback_manifest(doc, VibeSummary::offline_default());
        };

        match extractor.extract_analysis(&doc.content).await {
            Ok(analysis) if !analysis.scenes.is_empty() => {
                info!(scenes = analysis.scenes.len(), "structured analysis succeeded");
                self.structured_manifest(doc, analysis)
            }
            Ok(_) => {
                warn!("analysis returned zero scenes, degrading to chunk fallback");
                let vibe = self.probe_or_default(extractor, &doc.content).await;
                self.fallback_manifest(doc, vibe)
            }
            Err(e) => {
                warn!(error = %e, "analysis failed, degrading to chunk fallback");
                let vibe = self.probe_or_default(extractor, &doc.content).await;
                self.fallback_manifest(doc, vibe)
            }
        }
    }

    /// Fabricate continuation scenes for a book whose original text is no
    /// longer available. Lower stakes than ingestion: any failure returns
    /// an empty batch, no fallback tier.
    pub async fn generate_more_scenes(
        &self,
        book_id: &str,
        last_scene_id: u32,
        context: &str,
    ) -> Vec<Scene> {
        let Some(extractor) = &self.extractor else {
            info!(book_id, "no analysis capability configured, no continuation scenes");
            return Vec::new();
        };

        match extractor.continue_scenes(context, CONTINUATION_SCENES).await {
            Ok(batch) => batch
                .into_iter()
                .enumerate()
                .map(|(i, scene)| Scene {
                    id: last_scene_id + 1 + i as u32,
                    heading: scene.heading.unwrap_or_else(|| "Untitled".into()),
                    text: scene.text.unwrap_or_default(),
                    image_prompt: scene.image_prompt.unwrap_or_default(),
                    video_prompt: scene.video_prompt.unwrap_or_default(),
                    generated_image_url: None,
                    generated_audio_url: None,
                })
                .collect(),
            Err(e) => {
                warn!(book_id, error = %e, "scene continuation failed");
                Vec::new()
            }
        }
    }

    /// Produce an image prompt for a book cover. Falls back to a plain
    /// caption on any failure; never errors.
    pub async fn generate_cover_prompt(&self, manifest: &Manifest) -> String {
        let fallback = format!("Cover art for {}", manifest.title);

        let Some(extractor) = &self.extractor else {
            return fallback;
        };

        let instruction = format!(
            "Create a vivid, detailed image prompt for the cover of the book \
             \"{}\" by {}. Description: {}. Style: {}. Return ONLY the prompt.",
            manifest.title,
            manifest.author,
            manifest.description,
            manifest.tags.join(", ")
        );

        match extractor.generate_text(&instruction).await {
            Ok(text) if !text.trim().is_empty() => text,
            Ok(_) => fallback,
            Err(e) => {
                warn!(error = %e, "cover prompt generation failed");
                fallback
            }
        }
    }

    // --- Path A -----------------------------------------------------------

    /// Build a manifest from a successful structured analysis.
    fn structured_manifest(&self, doc: &RawDocument, analysis: AnalysisResult) -> Manifest {
        let metadata = analysis.metadata;

        let theme = map_tone_to_theme(&metadata.tone, &metadata.setting);
        let audio_profile = map_tone_to_audio(&metadata.tone, &metadata.genre);

        let mut tags: Vec<String> = [&metadata.genre, &metadata.tone]
            .into_iter()
            .filter(|v| !v.is_empty())
            .cloned()
            .collect();
        tags.push(DEFAULT_TAG.into());

        let description = build_description(&metadata.genre, &metadata.tone);

        let publication_year = metadata
            .publication_year
            .trim()
            .parse()
            .unwrap_or(DEFAULT_PUBLICATION_YEAR);

        let title = if metadata.title_is_placeholder() {
            doc.filename.clone()
        } else {
            metadata.title
        };

        // Dense zero-based ids by position, overwriting anything upstream.
        let scenes = analysis
            .scenes
            .into_iter()
            .enumerate()
            .map(|(i, draft)| Scene {
                id: i as u32,
                heading: draft.heading,
                text: draft.text,
                image_prompt: draft.image_prompt,
                video_prompt: draft.video_prompt,
                generated_image_url: None,
                generated_audio_url: None,
            })
            .collect();

        Manifest {
            id: manifest_id(&doc.filename),
            title,
            author: metadata.author,
            publication_year,
            description,
            cover_image: PLACEHOLDER_COVER_URL.into(),
            tags,
            theme,
            audio_profile,
            scenes,
        }
    }

    // --- Paths B and C ----------------------------------------------------

    /// Probe the vibe of a content sample, landing on the offline default
    /// triple when the probe fails for any reason.
    async fn probe_or_default(&self, extractor: &SceneExtractor, content: &str) -> VibeSummary {
        let sample = truncate_chars(content, self.options.vibe_sample_chars);
        match extractor.probe_vibe(sample).await {
            Ok(vibe) => vibe,
            Err(e) => {
                warn!(error = %e, "vibe probe failed, using default vibe");
                VibeSummary::offline_default()
            }
        }
    }

    /// Build a manifest by chunking the document: one scene per chunk with
    /// generic headings and prompts seeded from the first vibe tag.
    fn fallback_manifest(&self, doc: &RawDocument, vibe: VibeSummary) -> Manifest {
        let seed_tag = vibe
            .tags
            .first()
            .cloned()
            .unwrap_or_else(|| DEFAULT_TAG.into());

        let scenes = sceneweaver_chunker::chunks(&doc.content, self.options.fallback_chunk_size)
            .enumerate()
            .map(|(i, chunk)| Scene {
                id: i as u32,
                heading: format!("Part {}", i + 1),
                text: chunk.to_string(),
                image_prompt: format!("Illustration for part {}: {} style.", i + 1, seed_tag),
                video_prompt: format!("Cinematic shot of a {} scene.", seed_tag),
                generated_image_url: None,
                generated_audio_url: None,
            })
            .collect();

        Manifest {
            id: manifest_id(&doc.filename),
            title: doc.filename.clone(),
            author: "Unknown".into(),
            publication_year: DEFAULT_PUBLICATION_YEAR,
            description: format!("Segmented automatically. {}", vibe.tags.join(", ")),
            cover_image: PLACEHOLDER_COVER_URL.into(),
            tags: vibe.tags,
            theme: vibe.theme,
            audio_profile: vibe.audio_profile,
            scenes,
        }
    }
}

/// Compose the manifest description from whatever metadata survived.
fn build_description(genre: &str, tone: &str) -> String {
    match (genre.is_empty(), tone.is_empty()) {
        (false, false) => format!("A {genre} story with a {tone} tone."),
        (false, true) => format!("A {genre} story."),
        (true, false) => format!("A story with a {tone} tone."),
        (true, true) => "A story reconstructed from the uploaded text.".into(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    use serde_json::json;
    use url::Url;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    use sceneweaver_analysis::{AnalysisClient, ExtractorOptions};
    use sceneweaver_shared::{AmbientTrack, BackgroundStyle, Theme};

    fn ingestor_for(server: &MockServer, models: &[&str]) -> Ingestor {
        let client =
            AnalysisClient::with_base("test-key", Url::parse(&server.uri()).unwrap()).unwrap();
        let extractor = SceneExtractor::with_options(
            client,
            ExtractorOptions {
                models: models.iter().map(|m| m.to_string()).collect(),
                backoff: Duration::ZERO,
                max_chars: 500_000,
            },
        );
        Ingestor::new(Some(extractor))
    }

    fn envelope(inner: &serde_json::Value) -> serde_json::Value {
        json!({
            "candidates": [
                { "content": { "parts": [ { "text": inner.to_string() } ] } }
            ]
        })
    }

    // --- Path C -------------------------------------------------------------

    #[tokio::test]
    async fn offline_ingest_chunks_the_document() {
        let ingestor = Ingestor::new(None);
        let doc = RawDocument::new("My Book.txt", "a".repeat(3400));

        let manifest = ingestor.ingest(&doc).await;

        assert_eq!(manifest.id, "my_book_txt");
        assert_eq!(manifest.title, "My Book.txt");
        assert_eq!(manifest.scenes.len(), 3);
        assert_eq!(manifest.scenes[0].text.chars().count(), 1500);
        assert_eq!(manifest.scenes[2].text.chars().count(), 400);
        assert_eq!(manifest.scenes[0].heading, "Part 1");
        assert_eq!(manifest.scenes[2].heading, "Part 3");

        let ids: Vec<u32> = manifest.scenes.iter().map(|s| s.id).collect();
        assert_eq!(ids, vec![0, 1, 2]);

        assert_eq!(manifest.theme, Theme::default());
        assert_eq!(manifest.tags, vec!["Sci-Fi".to_string(), "Classic".to_string()]);
        assert!(manifest.scenes[0].generated_image_url.is_none());
    }

    #[tokio::test]
    async fn offline_ingest_of_empty_document_is_well_formed() {
        let ingestor = Ingestor::new(None);
        let doc = RawDocument::new("empty.txt", "");

        let manifest = ingestor.ingest(&doc).await;
        assert!(manifest.scenes.is_empty());
        assert_eq!(manifest.id, "empty_txt");
        assert_eq!(manifest.cover_image, PLACEHOLDER_COVER_URL);
    }

    // --- Path A -------------------------------------------------------------

    #[tokio::test]
    async fn structured_ingest_builds_manifest_from_analysis() {
        let server = MockServer::start().await;

        // Upstream scene ids are deliberately wrong; they must be overwritten.
        let analysis = json!({
            "metadata": {
                "title": "The Lurker",
                "author": "A. Writer",
                "publication_year": "1931",
                "genre": "Horror",
                "tone": "Dark",
                "setting": "Victorian London"
            },
            "scenes": [
                { "id": 99, "heading": "Fog", "start_char": 0, "end_char": 10,
                  "image_prompt": "fog over cobblestones", "video_prompt": "slow pan" },
                { "id": 7, "heading": "The Cellar", "start_char": "10", "end_char": 9999 }
            ]
        });

        Mock::given(method("POST"))
            .and(path("/v1beta/models/primary:generateContent"))
            .respond_with(ResponseTemplate::new(200).set_body_json(envelope(&analysis)))
            .mount(&server)
            .await;

        let ingestor = ingestor_for(&server, &["primary"]);
        let content = "x".repeat(40);
        let doc = RawDocument::new("lurker.txt", content.clone());

        let manifest = ingestor.ingest(&doc).await;

        assert_eq!(manifest.title, "The Lurker");
        assert_eq!(manifest.author, "A. Writer");
        assert_eq!(manifest.publication_year, 1931);
        assert_eq!(manifest.description, "A Horror story with a Dark tone.");
        assert_eq!(
            manifest.tags,
            vec!["Horror".to_string(), "Dark".to_string(), "Sci-Fi".to_string()]
        );

        // Vibe mapping from tone/setting/genre.
        assert_eq!(manifest.theme.background_style, BackgroundStyle::NoirShadows);
        assert_eq!(
            manifest.audio_profile.ambient_track,
            AmbientTrack::SubterraneanRumble
        );

        // Dense ids regardless of upstream ids; offsets sliced and clamped.
        assert_eq!(manifest.scenes.len(), 2);
        assert_eq!(manifest.scenes[0].id, 0);
        assert_eq!(manifest.scenes[1].id, 1);
        assert_eq!(manifest.scenes[0].text, "x".repeat(10));
        assert_eq!(manifest.scenes[1].text, "x".repeat(30));
        assert!(manifest.scenes[1].generated_audio_url.is_none());
    }

    #[tokio::test]
    async fn placeholder_title_falls_back_to_filename() {
        let server = MockServer::start().await;

        let analysis = json!({
            "metadata": { "tone": "gentle" },
            "scenes": [ { "heading": "One", "start_char": 0, "end_char": 5 } ]
        });

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(envelope(&analysis)))
            .mount(&server)
            .await;

        let ingestor = ingestor_for(&server, &["primary"]);
        let doc = RawDocument::new("anon book.txt", "hello world");
        let manifest = ingestor.ingest(&doc).await;

        assert_eq!(manifest.title, "anon book.txt");
        assert_eq!(manifest.author, "Unknown");
        assert_eq!(manifest.publication_year, 2024);
    }

    // --- Path B -------------------------------------------------------------

    #[tokio::test]
    async fn zero_scenes_degrades_to_seeded_fallback() {
        let server = MockServer::start().await;

        let empty_analysis = json!({ "metadata": { "title": "T" }, "scenes": [] });
        let vibe = json!({
            "theme": {
                "primaryColor": "#8B4513",
                "font": "Share Tech Mono",
                "backgroundStyle": "noir_shadows"
            },
            "audioProfile": { "narratorVoice": "Kore", "ambientTrack": "dripping_water" },
            "tags": ["Noir", "Mystery"]
        });

        // First call is the extraction, second the vibe probe.
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(envelope(&empty_analysis)))
            .up_to_n_times(1)
            .mount(&server)
            .await;
        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(envelope(&vibe)))
            .mount(&server)
            .await;

        let ingestor = ingestor_for(&server, &["primary"]);
        let doc = RawDocument::new("book.txt", "b".repeat(3000));
        let manifest = ingestor.ingest(&doc).await;

        assert_eq!(manifest.scenes.len(), 2);
        assert_eq!(manifest.tags, vec!["Noir".to_string(), "Mystery".to_string()]);
        assert_eq!(manifest.theme.background_style, BackgroundStyle::NoirShadows);
        assert_eq!(
            manifest.scenes[0].image_prompt,
            "Illustration for part 1: Noir style."
        );
        assert_eq!(
            manifest.scenes[1].video_prompt,
            "Cinematic shot of a Noir scene."
        );
    }

    #[tokio::test]
    async fn total_analysis_failure_still_returns_manifest() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&server)
            .await;

        let ingestor = ingestor_for(&server, &["primary", "backup"]);
        let doc = RawDocument::new("book.txt", "c".repeat(3400));
        let manifest = ingestor.ingest(&doc).await;

        // ceil(3400 / 1500) chunks, offline vibe triple from the failed probe.
        assert_eq!(manifest.scenes.len(), 3);
        assert_eq!(manifest.theme, Theme::default());
        assert_eq!(manifest.tags, vec!["Sci-Fi".to_string(), "Classic".to_string()]);
        assert!(manifest.description.contains("Sci-Fi"));
    }

    // --- continuation and cover ---------------------------------------------

    #[tokio::test]
    async fn continuation_assigns_sequential_ids() {
        let server = MockServer::start().await;

        let continuation = json!({
            "scenes": [
                { "heading": "After", "text": "t1", "imagePrompt": "p1", "videoPrompt": "v1" },
                { "text": "t2" }
            ]
        });

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(200).set_body_json(envelope(&continuation)))
            .mount(&server)
            .await;

        let ingestor = ingestor_for(&server, &["primary"]);
        let scenes = ingestor.generate_more_scenes("book_1", 11, "ctx").await;

        assert_eq!(scenes.len(), 2);
        assert_eq!(scenes[0].id, 12);
        assert_eq!(scenes[1].id, 13);
        assert_eq!(scenes[1].heading, "Untitled");
        assert_eq!(scenes[1].image_prompt, "");
    }

    #[tokio::test]
    async fn continuation_failure_returns_empty() {
        let server = MockServer::start().await;

        Mock::given(method("POST"))
            .respond_with(ResponseTemplate::new(500))
            .mount(&server)
            .await;

        let ingestor = ingestor_for(&server, &["primary"]);
        assert!(ingestor.generate_more_scenes("book_1", 0, "ctx").await.is_empty());

        let offline = Ingestor::new(None);
        assert!(offline.generate_more_scenes("book_1", 0, "ctx").await.is_empty());
    }

    #[tokio::test]
    async fn cover_prompt_falls_back_to_caption() {
        let offline = Ingestor::new(None);
        let doc = RawDocument::new("The Skull.txt", "some text");
        let manifest = offline.ingest(&doc).await;

        let prompt = offline.generate_cover_prompt(&manifest).await;
        assert_eq!(prompt, "Cover art for The Skull.txt");
    }

    // --- helpers ------------------------------------------------------------

    #[test]
    fn description_composition() {
        assert_eq!(
            build_description("Horror", "Dark"),
            "A Horror story with a Dark tone."
        );
        assert_eq!(build_description("Horror", ""), "A Horror story.");
        assert_eq!(build_description("", "Dark"), "A story with a Dark tone.");
        assert_eq!(
            build_description("", ""),
            "A story reconstructed from the uploaded text."
        );
    }
}
