//! Caption segmentation.
//!
//! Narration text is split on whitespace, grouped into phrases of a fixed
//! number of words, and each phrase gets an equal display window. Windows are
//! laid back to back from 0 so that together they partition `[0, duration)`.

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Tolerance used when comparing cue offsets against the scene duration.
pub const CAPTION_TOLERANCE_SECS: f64 = 1e-6;

/// A single caption shown on screen during `[start, end)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CaptionCue {
    pub text: String,
    pub start: f64,
    pub end: f64,
}

impl CaptionCue {
    pub fn duration(&self) -> f64 {
        self.end - self.start
    }
}

#[derive(Debug, Clone, PartialEq, Error)]
pub enum CaptionError {
    #[error("narration text has no words to caption")]
    NoPhrases,

    #[error("caption duration must be positive and finite, got {0}")]
    InvalidDuration(f64),

    #[error("caption chunk size must be at least one word")]
    InvalidChunkSize,

    #[error("caption window {window:.3}s is shorter than the minimum {min:.3}s")]
    WindowTooShort { window: f64, min: f64 },
}

/// Group the words of `text` into phrases of `chunk_size` words.
/// The last phrase may be shorter.
pub fn phrases(text: &str, chunk_size: usize) -> Vec<String> {
    if chunk_size == 0 {
        return Vec::new();
    }
    let words: Vec<&str> = text.split_whitespace().collect();
    words.chunks(chunk_size).map(|chunk| chunk.join(" ")).collect()
}

/// Segment narration into timed caption cues covering `[0, duration)`.
///
/// `min_window` is the shortest window a phrase may be shown for (typically
/// one frame); pass `0.0` to disable the check.
pub fn segment_captions(
    text: &str,
    duration: f64,
    chunk_size: usize,
    min_window: f64,
) -> Result<Vec<CaptionCue>, CaptionError> {
    if chunk_size == 0 {
        return Err(CaptionError::InvalidChunkSize);
    }
    if !duration.is_finite() || duration <= 0.0 {
        return Err(CaptionError::InvalidDuration(duration));
    }

    let phrases = phrases(text, chunk_size);
    if phrases.is_empty() {
        return Err(CaptionError::NoPhrases);
    }

    let count = phrases.len();
    let window = duration / count as f64;
    if window < min_window {
        return Err(CaptionError::WindowTooShort {
            window,
            min: min_window,
        });
    }

    let cues = phrases
        .into_iter()
        .enumerate()
        .map(|(i, text)| {
            let start = i as f64 * window;
            // Pin the last end to the duration so rounding never leaves a gap.
            let end = if i + 1 == count {
                duration
            } else {
                (i + 1) as f64 * window
            };
            CaptionCue { text, start, end }
        })
        .collect();

    Ok(cues)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_partition(cues: &[CaptionCue], duration: f64) {
        assert!(cues[0].start.abs() < CAPTION_TOLERANCE_SECS);
        for pair in cues.windows(2) {
            assert!((pair[0].end - pair[1].start).abs() < CAPTION_TOLERANCE_SECS);
        }
        let last = cues.last().unwrap();
        assert!((last.end - duration).abs() < CAPTION_TOLERANCE_SECS);
        let total: f64 = cues.iter().map(CaptionCue::duration).sum();
        assert!((total - duration).abs() < CAPTION_TOLERANCE_SECS);
    }

    #[test]
    fn test_single_word_phrases() {
        let cues = segment_captions("hello world", 4.0, 1, 0.0).unwrap();
        assert_eq!(cues.len(), 2);
        assert_eq!(cues[0].text, "hello");
        assert_eq!((cues[0].start, cues[0].end), (0.0, 2.0));
        assert_eq!(cues[1].text, "world");
        assert_eq!((cues[1].start, cues[1].end), (2.0, 4.0));
    }

    #[test]
    fn test_four_word_phrases() {
        let text = "one two three four five six seven eight";
        let cues = segment_captions(text, 8.0, 4, 0.0).unwrap();
        assert_eq!(cues.len(), 2);
        assert_eq!(cues[0].text, "one two three four");
        assert_eq!(cues[1].text, "five six seven eight");
        assert!((cues[0].duration() - 4.0).abs() < CAPTION_TOLERANCE_SECS);
        assert!((cues[1].duration() - 4.0).abs() < CAPTION_TOLERANCE_SECS);
    }

    #[test]
    fn test_short_last_phrase() {
        let cues = segment_captions("a b c d e", 3.0, 2, 0.0).unwrap();
        assert_eq!(cues.len(), 3);
        assert_eq!(cues[2].text, "e");
        assert_partition(&cues, 3.0);
    }

    #[test]
    fn test_windows_cover_duration_without_gaps() {
        let text = "the quick brown fox jumps over the lazy dog again";
        for duration in [1.0, 2.37, 7.0 / 3.0, 11.11] {
            let cues = segment_captions(text, duration, 3, 0.0).unwrap();
            assert_partition(&cues, duration);
        }
    }

    #[test]
    fn test_whitespace_is_collapsed() {
        let cues = segment_captions("  hello \n\t world  ", 2.0, 1, 0.0).unwrap();
        let texts: Vec<_> = cues.iter().map(|c| c.text.as_str()).collect();
        assert_eq!(texts, vec!["hello", "world"]);
    }

    #[test]
    fn test_empty_text_is_an_error() {
        assert_eq!(
            segment_captions("", 4.0, 1, 0.0),
            Err(CaptionError::NoPhrases)
        );
        assert_eq!(
            segment_captions("   \n ", 4.0, 1, 0.0),
            Err(CaptionError::NoPhrases)
        );
    }

    #[test]
    fn test_zero_duration_is_an_error() {
        assert_eq!(
            segment_captions("hello", 0.0, 1, 0.0),
            Err(CaptionError::InvalidDuration(0.0))
        );
        assert!(matches!(
            segment_captions("hello", f64::NAN, 1, 0.0),
            Err(CaptionError::InvalidDuration(_))
        ));
    }

    #[test]
    fn test_zero_chunk_size_is_an_error() {
        assert_eq!(
            segment_captions("hello", 1.0, 0, 0.0),
            Err(CaptionError::InvalidChunkSize)
        );
    }

    #[test]
    fn test_sub_frame_window_is_rejected() {
        let text = "a b c d e f g h i j";
        let err = segment_captions(text, 0.5, 1, 0.1).unwrap_err();
        assert!(matches!(err, CaptionError::WindowTooShort { .. }));
        assert!(segment_captions(text, 1.0, 1, 0.1).is_ok());
    }
}
