//! Output encoding settings.
//!
//! The final artifact is H.264 + AAC in an MP4 container. Scene clips are
//! written with the same codecs so the concat step never needs to guess at
//! mismatched streams.

use serde::{Deserialize, Serialize};

/// Default video codec (H.264)
pub const DEFAULT_VIDEO_CODEC: &str = "libx264";
/// Default audio codec
pub const DEFAULT_AUDIO_CODEC: &str = "aac";
/// Fastest x264 preset; output size matters less than turnaround
pub const DEFAULT_PRESET: &str = "ultrafast";
/// Frame rate of the final artifact
pub const DEFAULT_OUTPUT_FPS: u32 = 14;
/// Default audio bitrate
pub const DEFAULT_AUDIO_BITRATE: &str = "128k";
/// Pixel format accepted by every mainstream player
pub const DEFAULT_PIXEL_FORMAT: &str = "yuv420p";

/// Encoding configuration for scene clips and the final artifact.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EncodingConfig {
    /// Video codec (e.g., "libx264")
    #[serde(default = "default_video_codec")]
    pub codec: String,

    /// Encoding preset (e.g., "ultrafast", "fast")
    #[serde(default = "default_preset")]
    pub preset: String,

    /// Output frame rate
    #[serde(default = "default_fps")]
    pub fps: u32,

    /// Audio codec
    #[serde(default = "default_audio_codec")]
    pub audio_codec: String,

    /// Audio bitrate
    #[serde(default = "default_audio_bitrate")]
    pub audio_bitrate: String,

    #[serde(default = "default_pixel_format")]
    pub pixel_format: String,

    /// Additional FFmpeg output arguments
    #[serde(default)]
    pub extra_args: Vec<String>,
}

fn default_video_codec() -> String {
    DEFAULT_VIDEO_CODEC.to_string()
}
fn default_preset() -> String {
    DEFAULT_PRESET.to_string()
}
fn default_fps() -> u32 {
    DEFAULT_OUTPUT_FPS
}
fn default_audio_codec() -> String {
    DEFAULT_AUDIO_CODEC.to_string()
}
fn default_audio_bitrate() -> String {
    DEFAULT_AUDIO_BITRATE.to_string()
}
fn default_pixel_format() -> String {
    DEFAULT_PIXEL_FORMAT.to_string()
}

impl Default for EncodingConfig {
    fn default() -> Self {
        Self {
            codec: default_video_codec(),
            preset: default_preset(),
            fps: DEFAULT_OUTPUT_FPS,
            audio_codec: default_audio_codec(),
            audio_bitrate: default_audio_bitrate(),
            pixel_format: default_pixel_format(),
            extra_args: Vec::new(),
        }
    }
}

impl EncodingConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Settings for an intermediate scene clip rendered at `fps`.
    pub fn for_scene(fps: u32) -> Self {
        Self {
            fps,
            ..Default::default()
        }
    }

    pub fn with_fps(mut self, fps: u32) -> Self {
        self.fps = fps;
        self
    }

    /// Convert to FFmpeg output arguments (codec, preset, rate, audio).
    pub fn to_ffmpeg_args(&self) -> Vec<String> {
        let mut args = vec![
            "-c:v".to_string(),
            self.codec.clone(),
            "-preset".to_string(),
            self.preset.clone(),
            "-pix_fmt".to_string(),
            self.pixel_format.clone(),
            "-r".to_string(),
            self.fps.to_string(),
            "-c:a".to_string(),
            self.audio_codec.clone(),
            "-b:a".to_string(),
            self.audio_bitrate.clone(),
        ];
        args.extend(self.extra_args.iter().cloned());
        args
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let config = EncodingConfig::default();
        assert_eq!(config.codec, "libx264");
        assert_eq!(config.preset, "ultrafast");
        assert_eq!(config.fps, 14);
        assert_eq!(config.audio_bitrate, "128k");
    }

    #[test]
    fn test_ffmpeg_args() {
        let args = EncodingConfig::default().to_ffmpeg_args();
        let joined = args.join(" ");
        assert!(joined.contains("-c:v libx264"));
        assert!(joined.contains("-preset ultrafast"));
        assert!(joined.contains("-r 14"));
        assert!(joined.contains("-c:a aac -b:a 128k"));
    }

    #[test]
    fn test_scene_config_overrides_rate_only() {
        let config = EncodingConfig::for_scene(10);
        assert_eq!(config.fps, 10);
        assert_eq!(config.codec, DEFAULT_VIDEO_CODEC);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: EncodingConfig = serde_json::from_str(r#"{"fps": 24}"#).unwrap();
        assert_eq!(config.fps, 24);
        assert_eq!(config.preset, DEFAULT_PRESET);
    }
}
