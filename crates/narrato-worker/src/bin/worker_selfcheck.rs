use std::path::Path;

use narrato_worker::WorkerConfig;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    dotenvy::dotenv().ok();
    let config = WorkerConfig::from_env()?;

    println!(
        "worker-selfcheck: starting with work_dir={}",
        config.work_dir.display()
    );
    ensure_workdir(&config.work_dir).await?;
    ensure_tools()?;
    ensure_file("caption font", &config.caption_font_path)?;
    ensure_file("background music", &config.music_path)?;
    ensure_env_present(&[
        "REDIS_URL",
        "ELEVENLABS_API_KEY",
        "PEXELS_API_KEY",
        "STORAGE_ENDPOINT_URL",
        "STORAGE_BUCKET",
    ])?;

    println!("worker-selfcheck: ok");
    Ok(())
}

async fn ensure_workdir(path: &Path) -> anyhow::Result<()> {
    tokio::fs::create_dir_all(path).await?;
    Ok(())
}

fn ensure_tools() -> anyhow::Result<()> {
    let ffmpeg = narrato_media::check_ffmpeg()?;
    let ffprobe = narrato_media::check_ffprobe()?;
    println!(
        "worker-selfcheck: ffmpeg={} ffprobe={}",
        ffmpeg.display(),
        ffprobe.display()
    );
    Ok(())
}

fn ensure_file(label: &str, path: &Path) -> anyhow::Result<()> {
    if !path.is_file() {
        anyhow::bail!("{} not found at {}", label, path.display());
    }
    Ok(())
}

fn ensure_env_present(vars: &[&str]) -> anyhow::Result<()> {
    for var in vars {
        if std::env::var(var).is_err() {
            return Err(anyhow::anyhow!("missing required env var {}", var));
        }
    }
    Ok(())
}
