//! Hopper - a voice assistant demo built around a streamed audio playback
//! engine
//!
//! The interesting part is [`voice::AudioStream`]: a play/pause/resume/stop
//! state machine over a sample queue shared with a real-time device callback.
//! Around it sits the usual assistant wiring: wake-word matching over
//! transcripts, an LLM chat client, speech-to-text and text-to-speech
//! clients, and a keyword-dispatch daemon loop.
//!
//! # Architecture
//!
//! ```text
//! utterances ──▶ daemon ──▶ wake word / keyword dispatch
//!                  │                  │
//!                  ▼         ┌────────┴────────┐
//!                 STT        ▼                 ▼
//!                         LLM chat ──▶ TTS ──▶ AudioStream ──▶ speakers
//! ```

pub mod agent;
pub mod config;
pub mod daemon;
pub mod error;
pub mod voice;

pub use config::Config;
pub use daemon::Daemon;
pub use error::{Error, Result};
