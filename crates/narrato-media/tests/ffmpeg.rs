//! End-to-end rendering against the real FFmpeg binaries.
//!
//! Run with: `cargo test -p narrato-media --test ffmpeg -- --ignored`

use std::path::Path;

use narrato_media::{
    assemble_timeline, compose_scene, probe_duration, CaptionStyle, FfmpegRunner,
    SceneRenderSettings,
};
use narrato_models::{
    segment_captions, EncodingConfig, FrameSize, MusicBed, SceneClip, Timeline, VisualTrack,
};

async fn lavfi(source: &str, seconds: f64, output: &Path) {
    let status = tokio::process::Command::new("ffmpeg")
        .args(["-y", "-v", "error", "-f", "lavfi", "-i", source, "-t"])
        .arg(seconds.to_string())
        .arg(output)
        .status()
        .await
        .expect("ffmpeg must be installed");
    assert!(status.success(), "failed to generate {}", output.display());
}

#[tokio::test]
#[ignore = "requires ffmpeg, ffprobe and the caption font"]
async fn test_two_scene_timeline_duration() {
    let dir = tempfile::tempdir().unwrap();
    let root = dir.path();

    let image = root.join("still.png");
    let voice_a = root.join("a.mp3");
    let voice_b = root.join("b.mp3");
    let music = root.join("music.mp3");
    lavfi("color=c=blue:s=640x360", 0.1, &image).await;
    lavfi("sine=frequency=440", 2.0, &voice_a).await;
    lavfi("sine=frequency=660", 3.0, &voice_b).await;
    lavfi("sine=frequency=220", 1.0, &music).await;

    let runner = FfmpegRunner::new().with_timeout(120);
    let settings = SceneRenderSettings::new(FrameSize::new(1280, 720), 10)
        .with_captions(CaptionStyle::default());

    let mut timeline = Timeline::new();
    for (i, (voice, text)) in [(&voice_a, "Once upon a time"), (&voice_b, "the end")]
        .into_iter()
        .enumerate()
    {
        let duration = probe_duration(voice).await.unwrap();
        let clip = SceneClip {
            visual: VisualTrack::image(&image),
            audio_path: voice.to_path_buf(),
            duration,
            cues: segment_captions(text, duration, 1, 0.1).unwrap(),
        };
        let caption_dir = root.join(format!("captions_{i}"));
        tokio::fs::create_dir_all(&caption_dir).await.unwrap();
        let output = root.join(format!("scene_{i}.mp4"));
        compose_scene(&clip, &settings, &caption_dir, &output, &runner)
            .await
            .unwrap();
        timeline.push(&output, duration);
    }

    let total = timeline.total_duration();
    let timeline = timeline.with_music(MusicBed::new(&music, 0.6).fit_to(total));
    let final_path = root.join("final.mp4");
    assemble_timeline(&timeline, &EncodingConfig::default(), root, &final_path, &runner)
        .await
        .unwrap();

    let rendered = probe_duration(&final_path).await.unwrap();
    assert!((rendered - 5.0).abs() < 0.3, "rendered {rendered}s");
}
