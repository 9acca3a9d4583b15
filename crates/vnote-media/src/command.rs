//! FFmpeg command builder and runner.

use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::time::Duration;

use tokio::process::Command;
use tracing::{debug, warn};

use crate::error::{MediaError, MediaResult};

/// One `-i` input together with the options that precede it.
#[derive(Debug, Clone)]
struct FfmpegInput {
    args: Vec<String>,
    source: String,
}

/// Builder for FFmpeg commands.
///
/// Input options (`seek`, `format`, `loop_input`) apply to the next input
/// added with [`FfmpegCommand::input`]. Options left without a following
/// input are not emitted.
#[derive(Debug, Clone)]
pub struct FfmpegCommand {
    inputs: Vec<FfmpegInput>,
    /// Options waiting for the next input
    pending_input_args: Vec<String>,
    /// Output arguments (after all inputs)
    output_args: Vec<String>,
    output: PathBuf,
    overwrite: bool,
}

impl FfmpegCommand {
    /// Create a new FFmpeg command writing to `output`.
    pub fn new(output: impl AsRef<Path>) -> Self {
        Self {
            inputs: Vec::new(),
            pending_input_args: Vec::new(),
            output_args: Vec::new(),
            output: output.as_ref().to_path_buf(),
            overwrite: true,
        }
    }

    /// Add an option for the next input.
    pub fn input_arg(mut self, arg: impl Into<String>) -> Self {
        self.pending_input_args.push(arg.into());
        self
    }

    /// Add an input; pending input options are attached to it.
    pub fn input(mut self, source: impl Into<String>) -> Self {
        self.inputs.push(FfmpegInput {
            args: std::mem::take(&mut self.pending_input_args),
            source: source.into(),
        });
        self
    }

    /// Add a file input.
    pub fn input_path(self, path: impl AsRef<Path>) -> Self {
        let source = path.as_ref().to_string_lossy().to_string();
        self.input(source)
    }

    /// Add an output argument.
    pub fn output_arg(mut self, arg: impl Into<String>) -> Self {
        self.output_args.push(arg.into());
        self
    }

    /// Seek the next input.
    pub fn seek(self, seconds: f64) -> Self {
        self.input_arg("-ss").input_arg(format!("{:.3}", seconds))
    }

    /// Force the demuxer of the next input (e.g. `lavfi`).
    pub fn format(self, format: impl Into<String>) -> Self {
        self.input_arg("-f").input_arg(format)
    }

    /// Loop the next input (used for still images).
    pub fn loop_input(self) -> Self {
        self.input_arg("-loop").input_arg("1")
    }

    /// Set filter complex.
    pub fn filter_complex(self, filter: impl Into<String>) -> Self {
        self.output_arg("-filter_complex").output_arg(filter)
    }

    /// Map a stream or filter label to the output.
    pub fn map(self, stream: impl Into<String>) -> Self {
        self.output_arg("-map").output_arg(stream)
    }

    /// Set video codec.
    pub fn video_codec(self, codec: impl Into<String>) -> Self {
        self.output_arg("-c:v").output_arg(codec)
    }

    /// Set audio codec.
    pub fn audio_codec(self, codec: impl Into<String>) -> Self {
        self.output_arg("-c:a").output_arg(codec)
    }

    /// Copy all streams without re-encoding.
    pub fn stream_copy(self) -> Self {
        self.output_arg("-c").output_arg("copy")
    }

    /// Set audio bitrate.
    pub fn audio_bitrate(self, bitrate: impl Into<String>) -> Self {
        self.output_arg("-b:a").output_arg(bitrate)
    }

    /// Set pixel format.
    pub fn pixel_format(self, format: impl Into<String>) -> Self {
        self.output_arg("-pix_fmt").output_arg(format)
    }

    /// Drop audio.
    pub fn no_audio(self) -> Self {
        self.output_arg("-an")
    }

    /// Drop video.
    pub fn no_video(self) -> Self {
        self.output_arg("-vn")
    }

    /// Stop at the end of the shortest input.
    pub fn shortest(self) -> Self {
        self.output_arg("-shortest")
    }

    /// Limit the output duration.
    pub fn output_duration(self, seconds: f64) -> Self {
        self.output_arg("-t").output_arg(format!("{:.3}", seconds))
    }

    /// Build the command arguments.
    pub fn build_args(&self) -> Vec<String> {
        let mut args = Vec::new();

        if self.overwrite {
            args.push("-y".to_string());
        }

        // Keep stderr to the failure itself
        args.push("-v".to_string());
        args.push("error".to_string());

        for input in &self.inputs {
            args.extend(input.args.iter().cloned());
            args.push("-i".to_string());
            args.push(input.source.clone());
        }

        args.extend(self.output_args.iter().cloned());
        args.push(self.output.to_string_lossy().to_string());

        args
    }
}

/// Runner for FFmpeg commands with an optional timeout.
#[derive(Debug, Clone, Default)]
pub struct FfmpegRunner {
    timeout: Option<Duration>,
}

impl FfmpegRunner {
    /// Create a new runner.
    pub fn new() -> Self {
        Self::default()
    }

    /// Kill FFmpeg if it runs longer than `timeout`.
    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Run an FFmpeg command to completion.
    pub async fn run(&self, cmd: &FfmpegCommand) -> MediaResult<()> {
        check_ffmpeg()?;

        let args = cmd.build_args();
        debug!("Running FFmpeg: ffmpeg {}", args.join(" "));

        let child = Command::new("ffmpeg")
            .args(&args)
            .stdin(Stdio::null())
            .stdout(Stdio::null())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()?;

        let output = match self.timeout {
            Some(timeout) => match tokio::time::timeout(timeout, child.wait_with_output()).await {
                Ok(result) => result?,
                Err(_) => {
                    // Dropping the child future kills the process
                    warn!("FFmpeg timed out after {:?}", timeout);
                    return Err(MediaError::Timeout(timeout.as_secs()));
                }
            },
            None => child.wait_with_output().await?,
        };

        if output.status.success() {
            Ok(())
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
            let message = match (output.status.code(), stderr.lines().last()) {
                (Some(code), Some(last)) => format!("FFmpeg exited with status {code}: {last}"),
                (Some(code), None) => format!("FFmpeg exited with status {code}"),
                (None, _) => "FFmpeg was terminated by a signal".to_string(),
            };
            Err(MediaError::ffmpeg_failed(
                message,
                (!stderr.is_empty()).then_some(stderr),
                output.status.code(),
            ))
        }
    }
}

/// Check if FFmpeg is available.
pub fn check_ffmpeg() -> MediaResult<PathBuf> {
    which::which("ffmpeg").map_err(|_| MediaError::FfmpegNotFound)
}
