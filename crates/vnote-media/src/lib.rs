//! FFmpeg CLI wrapper for rendering video notes.
//!
//! This crate provides:
//! - Type-safe FFmpeg command building with multiple inputs
//! - A runner with timeout and exit status handling
//! - Circular alpha masks for round video notes

pub mod command;
pub mod error;
pub mod mask;

pub use command::{check_ffmpeg, FfmpegCommand, FfmpegRunner};
pub use error::{MediaError, MediaResult};
pub use mask::write_circle_mask;
