//! Voice processing module
//!
//! Streamed audio playback plus the wake word, STT, and TTS collaborators
//! the daemon wires together.

pub mod clip;
mod stream;
mod stt;
mod tts;
mod wake_word;

pub use stream::{
    AudioStream, DeviceHandle, OutputDevice, PlaybackState, PullStatus, SharedQueue, SystemOutput,
};
pub use stt::SpeechToText;
pub use tts::TextToSpeech;
pub use wake_word::WakeWordDetector;
