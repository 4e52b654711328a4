//! External media tooling: subprocess execution and the ffmpeg/ffprobe wrapper.

pub mod executor;
pub mod ffmpeg;

pub use executor::{CommandExecutor, MockCommandExecutor, SystemCommandExecutor};
pub use ffmpeg::{Ffmpeg, LoudnessTarget};
