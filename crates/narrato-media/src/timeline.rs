//! Timeline assembly: concat scene clips, mix the music bed, encode.

use std::path::Path;
use tracing::info;

use narrato_models::{EncodingConfig, Timeline};

use crate::command::{format_secs, FfmpegCommand, FfmpegRunner};
use crate::error::{MediaError, MediaResult};
use crate::progress::FfmpegProgress;

/// Render the concat demuxer list for the timeline entries, in order.
pub fn concat_list(timeline: &Timeline) -> String {
    timeline
        .entries
        .iter()
        .map(|entry| {
            let path = entry.path.to_string_lossy().replace('\'', "'\\''");
            format!("file '{path}'\n")
        })
        .collect()
}

/// Build the final encode command reading the concat list at `list_path`.
///
/// With a music bed, the music is looped, trimmed to the timeline duration,
/// attenuated, and mixed under the narration.
pub fn timeline_command(
    timeline: &Timeline,
    list_path: &Path,
    encoding: &EncodingConfig,
    output: &Path,
) -> MediaResult<FfmpegCommand> {
    if timeline.is_empty() {
        return Err(MediaError::invalid_input("timeline has no scenes"));
    }
    let total = timeline.total_duration();

    let cmd = FfmpegCommand::new(output)
        .input_with_args(["-f", "concat", "-safe", "0"], list_path);

    let cmd = match &timeline.music {
        Some(music) => {
            let filter = format!(
                "[1:a]volume={volume},atrim=duration={duration},asetpts=N/SR/TB[bg];\
                 [0:a][bg]amix=inputs=2:duration=first:dropout_transition=0:normalize=0[a]",
                volume = music.volume,
                duration = format_secs(music.duration),
            );
            cmd.input_with_args(["-stream_loop", "-1"], &music.path)
                .filter_complex(filter)
                .map("0:v")
                .map("[a]")
        }
        None => cmd.map("0:v").map("0:a"),
    };

    Ok(cmd
        .output_args(encoding.to_ffmpeg_args())
        .output_args(["-movflags", "+faststart"])
        .duration(total))
}

/// Concatenate the timeline into `output`, writing the concat list into
/// `work_dir`.
pub async fn assemble_timeline(
    timeline: &Timeline,
    encoding: &EncodingConfig,
    work_dir: &Path,
    output: &Path,
    runner: &FfmpegRunner,
) -> MediaResult<()> {
    for entry in &timeline.entries {
        if !entry.path.exists() {
            return Err(MediaError::FileNotFound(entry.path.clone()));
        }
    }
    if let Some(music) = &timeline.music {
        if !music.path.exists() {
            return Err(MediaError::FileNotFound(music.path.clone()));
        }
    }

    let list_path = work_dir.join("concat.txt");
    tokio::fs::write(&list_path, concat_list(timeline)).await?;

    let cmd = timeline_command(timeline, &list_path, encoding, output)?;
    let total = timeline.total_duration();
    runner
        .run_with_progress(&cmd, move |progress: FfmpegProgress| {
            tracing::debug!(percent = progress.percentage(total), "Encoding timeline");
        })
        .await?;

    info!(
        output = %output.display(),
        scenes = timeline.len(),
        duration = total,
        music = timeline.music.is_some(),
        "Assembled timeline"
    );
    Ok(())
}
