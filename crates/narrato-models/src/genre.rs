//! Content genres and their rendering profiles.
//!
//! Every genre runs through the same submit/build/assemble pipeline; only the
//! parameters in [`GenreProfile`] differ.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Language every genre falls back to when a submission omits one.
pub const DEFAULT_LANGUAGE: &str = "Spanish";

/// Attenuation applied to the background music bed.
pub const DEFAULT_MUSIC_VOLUME: f64 = 0.6;

/// Content genre.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Genre {
    /// Children's story over generated still images
    Animation,
    /// Motivational narration over stock footage
    Motivation,
    /// Product/website promo over stock footage
    Commercial,
}

impl Genre {
    pub const ALL: [Genre; 3] = [Genre::Animation, Genre::Motivation, Genre::Commercial];

    pub fn as_str(&self) -> &'static str {
        match self {
            Genre::Animation => "animation",
            Genre::Motivation => "motivation",
            Genre::Commercial => "commercial",
        }
    }

    /// Rendering profile for this genre.
    pub fn profile(&self) -> GenreProfile {
        match self {
            Genre::Animation => GenreProfile {
                caption_chunk_size: Some(1),
                frame_size: FrameSize::new(1280, 720),
                scene_fps: 10,
                voices: VoiceMap::new("Spanish")
                    .with_voice("Spanish", "Ir1QNHvhaJXbAGhT50w3")
                    .with_voice("French", "hFgOzpmS0CMtL2to8sAl")
                    .with_voice("English", "jsCqWAovK2LkecY7zXl4"),
                include_music: false,
                music_volume: DEFAULT_MUSIC_VOLUME,
                visual: VisualSource::ImageReference,
            },
            Genre::Motivation => GenreProfile {
                caption_chunk_size: Some(4),
                frame_size: FrameSize::new(1080, 720),
                scene_fps: 24,
                voices: VoiceMap::new("Spanish")
                    .with_voice("Spanish", "W5JElH3dK1UYYAiHH7uh")
                    .with_voice("English", "vKNO07o9JhKMgjLKbyQK"),
                include_music: true,
                music_volume: DEFAULT_MUSIC_VOLUME,
                visual: VisualSource::StockVideoSearch,
            },
            Genre::Commercial => GenreProfile {
                caption_chunk_size: None,
                frame_size: FrameSize::new(1080, 720),
                scene_fps: 24,
                voices: VoiceMap::new("English")
                    .with_voice("Spanish", "W5JElH3dK1UYYAiHH7uh")
                    .with_voice("English", "vKNO07o9JhKMgjLKbyQK"),
                include_music: true,
                music_volume: DEFAULT_MUSIC_VOLUME,
                visual: VisualSource::StockVideoSearch,
            },
        }
    }
}

impl fmt::Display for Genre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown genre '{0}' (expected animation, motivation or commercial)")]
pub struct GenreParseError(pub String);

impl FromStr for Genre {
    type Err = GenreParseError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "animation" => Ok(Genre::Animation),
            "motivation" | "motivational" => Ok(Genre::Motivation),
            "commercial" => Ok(Genre::Commercial),
            other => Err(GenreParseError(other.to_string())),
        }
    }
}

/// Output frame dimensions in pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct FrameSize {
    pub width: u32,
    pub height: u32,
}

impl FrameSize {
    pub const fn new(width: u32, height: u32) -> Self {
        Self { width, height }
    }
}

impl fmt::Display for FrameSize {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}x{}", self.width, self.height)
    }
}

/// How a scene's visual reference is turned into a track.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VisualSource {
    /// The reference is a local path or URL of an image
    ImageReference,
    /// The reference is a prompt for the image generator
    ImagePrompt,
    /// The reference is a stock-footage search query
    StockVideoSearch,
}

/// Language to voice-id mapping with one explicit fallback.
///
/// Matching is case-insensitive on the language name. A language that is
/// not listed resolves to the fallback language's voice.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceMap {
    voices: BTreeMap<String, String>,
    fallback_language: String,
}

impl VoiceMap {
    pub fn new(fallback_language: impl Into<String>) -> Self {
        Self {
            voices: BTreeMap::new(),
            fallback_language: normalize_language(&fallback_language.into()),
        }
    }

    pub fn with_voice(mut self, language: &str, voice_id: impl Into<String>) -> Self {
        self.voices
            .insert(normalize_language(language), voice_id.into());
        self
    }

    pub fn fallback_language(&self) -> &str {
        &self.fallback_language
    }

    /// Voice id for `language`, falling back to the fallback language.
    ///
    /// Returns `None` only if the fallback language itself has no voice,
    /// which [`VoiceMap::is_complete`] rules out for built-in profiles.
    pub fn resolve(&self, language: &str) -> Option<&str> {
        self.voices
            .get(&normalize_language(language))
            .or_else(|| self.voices.get(&self.fallback_language))
            .map(String::as_str)
    }

    /// Whether the fallback language has a voice.
    pub fn is_complete(&self) -> bool {
        self.voices.contains_key(&self.fallback_language)
    }
}

fn normalize_language(language: &str) -> String {
    language.trim().to_ascii_lowercase()
}

/// Per-genre rendering parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenreProfile {
    /// Words per caption phrase; `None` renders no captions
    pub caption_chunk_size: Option<usize>,
    pub frame_size: FrameSize,
    /// Frame rate of intermediate scene clips
    pub scene_fps: u32,
    pub voices: VoiceMap,
    pub include_music: bool,
    pub music_volume: f64,
    pub visual: VisualSource,
}

impl GenreProfile {
    /// Shortest caption window that still lands on at least one frame.
    pub fn min_caption_window(&self) -> f64 {
        1.0 / self.scene_fps.max(1) as f64
    }
}
