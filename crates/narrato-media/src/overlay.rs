//! Burned-in caption overlays.
//!
//! Each cue becomes one `drawtext` filter reading its phrase from a text file,
//! so phrase content never needs filtergraph escaping. A cue is visible for
//! `start <= t < end`.

use std::path::{Path, PathBuf};
use tracing::debug;

use narrato_models::CaptionCue;

use crate::error::{MediaError, MediaResult};

/// Default caption font shipped with DejaVu.
pub const DEFAULT_CAPTION_FONT: &str = "/usr/share/fonts/truetype/dejavu/DejaVuSans-Bold.ttf";

/// Caption appearance.
#[derive(Debug, Clone, PartialEq)]
pub struct CaptionStyle {
    pub font_path: PathBuf,
    pub font_size: u32,
    pub font_color: String,
}

impl Default for CaptionStyle {
    fn default() -> Self {
        Self {
            font_path: PathBuf::from(DEFAULT_CAPTION_FONT),
            font_size: 40,
            font_color: "white".to_string(),
        }
    }
}

impl CaptionStyle {
    pub fn with_font(mut self, path: impl Into<PathBuf>) -> Self {
        self.font_path = path.into();
        self
    }

    /// Fails when the font file is missing; no phrase could be rendered.
    pub fn validate(&self) -> MediaResult<()> {
        if self.font_path.is_file() {
            Ok(())
        } else {
            Err(MediaError::caption_render(
                "",
                format!("caption font not found: {}", self.font_path.display()),
            ))
        }
    }
}

/// Write one text file per cue into `dir`. Fails on the first phrase that
/// cannot be written.
pub async fn write_caption_files(cues: &[CaptionCue], dir: &Path) -> MediaResult<Vec<PathBuf>> {
    let mut files = Vec::with_capacity(cues.len());
    for (i, cue) in cues.iter().enumerate() {
        if cue.text.trim().is_empty() {
            return Err(MediaError::caption_render(&cue.text, "empty phrase"));
        }
        let path = dir.join(format!("caption_{i:03}.txt"));
        tokio::fs::write(&path, cue.text.as_bytes())
            .await
            .map_err(|e| MediaError::caption_render(&cue.text, e.to_string()))?;
        files.push(path);
    }
    debug!(count = files.len(), dir = %dir.display(), "Wrote caption files");
    Ok(files)
}

/// Build the comma-separated `drawtext` chain for `cues`.
///
/// `text_files[i]` must hold the text of `cues[i]`.
pub fn caption_filter_chain(
    cues: &[CaptionCue],
    text_files: &[PathBuf],
    style: &CaptionStyle,
) -> MediaResult<String> {
    if cues.len() != text_files.len() {
        return Err(MediaError::invalid_input(format!(
            "{} caption cues but {} text files",
            cues.len(),
            text_files.len()
        )));
    }

    let font = escape_filter_path(&style.font_path.to_string_lossy());
    let filters: Vec<String> = cues
        .iter()
        .zip(text_files)
        .map(|(cue, file)| {
            format!(
                "drawtext=fontfile={font}:textfile={file}:expansion=none:\
                 fontsize={size}:fontcolor={color}:\
                 x=(w-text_w)/2:y=(h-text_h)/2:\
                 enable='gte(t,{start:.3})*lt(t,{end:.3})'",
                file = escape_filter_path(&file.to_string_lossy()),
                size = style.font_size,
                color = style.font_color,
                start = cue.start,
                end = cue.end,
            )
        })
        .collect();

    Ok(filters.join(","))
}

/// Escape a path for use as a filter option value inside a filtergraph.
///
/// Two levels apply: the option parser (`:` separates options) and the
/// graph parser (`,;[]` separate filters and labels).
pub(crate) fn escape_filter_path(path: &str) -> String {
    let option_level = escape_chars(path, &['\\', '\'', ':']);
    escape_chars(&option_level, &['\\', '\'', '[', ']', ',', ';'])
}

fn escape_chars(value: &str, special: &[char]) -> String {
    let mut out = String::with_capacity(value.len());
    for c in value.chars() {
        if special.contains(&c) {
            out.push('\\');
        }
        out.push(c);
    }
    out
}
