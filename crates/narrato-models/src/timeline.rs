//! Ordered concatenation of scene clips plus an optional music bed.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A rendered scene file and its authoritative duration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TimelineEntry {
    pub path: PathBuf,
    pub duration: f64,
}

/// Background music mixed under the narration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MusicBed {
    pub path: PathBuf,
    /// Linear gain applied to the music (1.0 = unchanged)
    pub volume: f64,
    /// Length the music is looped or truncated to
    pub duration: f64,
}

impl MusicBed {
    pub fn new(path: impl Into<PathBuf>, volume: f64) -> Self {
        Self {
            path: path.into(),
            volume,
            duration: 0.0,
        }
    }

    /// Fit the bed to exactly `duration` seconds, independent of the length
    /// of the music file.
    pub fn fit_to(mut self, duration: f64) -> Self {
        self.duration = duration;
        self
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct Timeline {
    pub entries: Vec<TimelineEntry>,
    pub music: Option<MusicBed>,
}

impl Timeline {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, path: impl Into<PathBuf>, duration: f64) {
        self.entries.push(TimelineEntry {
            path: path.into(),
            duration,
        });
    }

    /// Attach a music bed fitted to the current total duration.
    pub fn with_music(mut self, music: MusicBed) -> Self {
        let total = self.total_duration();
        self.music = Some(music.fit_to(total));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Sum of entry durations. Concatenation neither trims nor pads.
    pub fn total_duration(&self) -> f64 {
        self.entries.iter().map(|e| e.duration).sum()
    }
}
