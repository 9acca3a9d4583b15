//! Rendering pipeline for claimed jobs.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use tracing::{debug, warn};

use vnote_media::{write_circle_mask, FfmpegCommand, FfmpegRunner};
use vnote_models::{JobRequest, JobSnapshot, MAX_CLIP_DURATION_SECS};

use crate::config::WorkerConfig;
use crate::error::{WorkerError, WorkerResult};

/// Length of the generated stand-in source, in seconds.
const PLACEHOLDER_SOURCE_SECS: f64 = 5.0;

/// Turns a claimed job into an artifact.
#[async_trait]
pub trait JobProcessor: Send + Sync {
    /// Process the job and return the result reference to report.
    async fn process(&self, job: &JobSnapshot) -> WorkerResult<String>;
}

/// FFmpeg-backed processor producing round video notes or voice clips.
#[derive(Debug, Clone)]
pub struct FfmpegProcessor {
    mask_size: u32,
    result_dir: PathBuf,
    test_video_path: Option<PathBuf>,
    runner: FfmpegRunner,
}

impl FfmpegProcessor {
    pub fn new(config: &WorkerConfig) -> Self {
        Self {
            mask_size: config.mask_size,
            result_dir: config.result_dir.clone(),
            test_video_path: config.test_video_path.clone(),
            runner: FfmpegRunner::new().with_timeout(config.ffmpeg_timeout),
        }
    }

    /// Path the artifact for `job` is written to.
    pub fn output_path(&self, job: &JobSnapshot) -> PathBuf {
        let extension = if job.payload.audio_only { "ogg" } else { "mp4" };
        self.result_dir.join(format!("{}.{}", job.job_id, extension))
    }

    /// Place the source video at `destination`.
    ///
    /// Telegram downloads are not wired in; the configured test video is used
    /// when present, otherwise a test pattern with a tone is synthesized.
    async fn fetch_source(&self, destination: &Path) -> WorkerResult<()> {
        if let Some(sample) = &self.test_video_path {
            if tokio::fs::try_exists(sample).await.unwrap_or(false) {
                tokio::fs::copy(sample, destination).await?;
                return Ok(());
            }
            warn!("Test video {} not found, generating a placeholder", sample.display());
        } else {
            debug!("No test video configured, generating a placeholder");
        }

        self.runner.run(&placeholder_source_command(destination)).await?;
        Ok(())
    }

    async fn trim(&self, source: &Path, request: &JobRequest, destination: &Path) -> WorkerResult<()> {
        let copy = trim_command(source, request, destination, true);
        if let Err(e) = self.runner.run(&copy).await {
            warn!("Fast trim failed, falling back to re-encode: {}", e);
            self.runner
                .run(&trim_command(source, request, destination, false))
                .await?;
        }
        Ok(())
    }
}

#[async_trait]
impl JobProcessor for FfmpegProcessor {
    async fn process(&self, job: &JobSnapshot) -> WorkerResult<String> {
        let workdir = tempfile::tempdir()?;
        let source = workdir.path().join("source.mp4");
        let trimmed = workdir.path().join("trimmed.mp4");

        self.fetch_source(&source).await?;
        self.trim(&source, &job.payload, &trimmed).await?;

        tokio::fs::create_dir_all(&self.result_dir).await?;
        let output = self.output_path(job);

        let render = if job.payload.audio_only {
            voice_clip_command(&trimmed, &output)
        } else {
            let mask = workdir.path().join("mask.png");
            let size = self.mask_size;
            let mask_path = mask.clone();
            tokio::task::spawn_blocking(move || write_circle_mask(&mask_path, size))
                .await
                .map_err(|e| WorkerError::processing_failed(format!("mask task failed: {e}")))??;
            video_note_command(&trimmed, &mask, &output, self.mask_size, job.payload.mute)
        };
        self.runner.run(&render).await?;

        let file_name = output
            .file_name()
            .map(|name| name.to_string_lossy().to_string())
            .ok_or_else(|| WorkerError::processing_failed("output path has no file name"))?;
        Ok(format!("local://{file_name}"))
    }
}

/// 640x640 test pattern with a 1 kHz tone.
fn placeholder_source_command(destination: &Path) -> FfmpegCommand {
    FfmpegCommand::new(destination)
        .format("lavfi")
        .input("testsrc=size=640x640:rate=30")
        .format("lavfi")
        .input("sine=frequency=1000:sample_rate=48000")
        .shortest()
        .output_duration(PLACEHOLDER_SOURCE_SECS)
}

/// Cut `[start, start + min(end - start, cap))` out of the source.
fn trim_command(source: &Path, request: &JobRequest, destination: &Path, stream_copy: bool) -> FfmpegCommand {
    let duration = request.duration_secs().min(MAX_CLIP_DURATION_SECS);
    let cmd = FfmpegCommand::new(destination)
        .seek(request.start)
        .input_path(source)
        .output_duration(duration);
    if stream_copy {
        cmd.stream_copy()
    } else {
        cmd
    }
}

/// Square, circle-masked H.264 note; audio kept as AAC unless muted.
fn video_note_command(trimmed: &Path, mask: &Path, output: &Path, size: u32, mute: bool) -> FfmpegCommand {
    let filter = format!(
        "[0:v]scale={s}:{s}:force_original_aspect_ratio=decrease,\
         pad={s}:{s}:(ow-iw)/2:(oh-ih)/2,format=rgba[base];\
         [base][1:v]alphamerge[outv]",
        s = size
    );

    let cmd = FfmpegCommand::new(output)
        .input_path(trimmed)
        .loop_input()
        .input_path(mask)
        .filter_complex(filter)
        .map("[outv]")
        .video_codec("libx264")
        .pixel_format("yuv420p")
        // The looped mask never ends on its own
        .shortest();

    if mute {
        cmd.no_audio()
    } else {
        cmd.map("0:a?").audio_codec("aac").audio_bitrate("128k")
    }
}

/// Opus voice clip from the trimmed fragment.
fn voice_clip_command(trimmed: &Path, output: &Path) -> FfmpegCommand {
    FfmpegCommand::new(output)
        .input_path(trimmed)
        .no_video()
        .audio_codec("libopus")
}
