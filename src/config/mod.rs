//! Configuration management
//!
//! A resolved [`Config`] is built from defaults, overlaid by an optional TOML
//! file, then by environment variables.

pub mod file;

use std::path::{Path, PathBuf};

use crate::{Error, Result};

/// Default system prompt for the chat client
const DEFAULT_SYSTEM_PROMPT: &str =
    "You are a helpful voice assistant. Keep responses short and conversational.";

/// Utterance input mode for the daemon
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum InputMode {
    /// stdin lines are transcripts
    #[default]
    Text,
    /// stdin lines are paths to WAV utterance files, run through STT
    Wav,
}

/// Resolved assistant configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Wake words that activate the assistant
    pub wake_words: Vec<String>,

    /// How the daemon receives utterances
    pub input_mode: InputMode,

    /// LLM chat settings
    pub llm: LlmConfig,

    /// Speech-to-text settings
    pub stt: SttConfig,

    /// Text-to-speech settings
    pub tts: TtsConfig,

    /// Canned audio clips
    pub clips: ClipsConfig,

    /// Where the "save" voice command writes the remaining audio
    pub save_path: PathBuf,
}

/// LLM chat settings
#[derive(Debug, Clone)]
pub struct LlmConfig {
    /// Chat endpoint base URL (Ollama-compatible)
    pub url: String,

    /// Model identifier
    pub model: String,

    /// System prompt prepended to every conversation
    pub system_prompt: String,
}

/// Speech-to-text settings
#[derive(Debug, Clone)]
pub struct SttConfig {
    /// Transcription endpoint base URL (OpenAI-compatible)
    pub url: String,

    /// STT model
    pub model: String,

    /// Bearer API key, if the endpoint needs one
    pub api_key: Option<String>,
}

/// Text-to-speech settings
#[derive(Debug, Clone)]
pub struct TtsConfig {
    /// Speech endpoint base URL (OpenAI-compatible)
    pub url: String,

    /// TTS model
    pub model: String,

    /// TTS voice identifier
    pub voice: String,

    /// TTS speed multiplier
    pub speed: f64,

    /// Bearer API key, if the endpoint needs one
    pub api_key: Option<String>,
}

/// Canned audio clip paths
#[derive(Debug, Clone, Default)]
pub struct ClipsConfig {
    /// Clip played when the daemon starts
    pub startup: Option<PathBuf>,

    /// Clip played in response to an abusive phrase
    pub rebuke: Option<PathBuf>,
}

impl Config {
    /// Load configuration
    ///
    /// Defaults are overlaid by the TOML file at `path` (when given), then by
    /// `HOPPER_*` environment variables.
    ///
    /// # Errors
    ///
    /// Returns error if the file cannot be read or parsed, or a setting is
    /// invalid
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let overlay = match path {
            Some(p) => file::load(p)?,
            None => file::ConfigFile::default(),
        };
        let mut config = Self::resolve(overlay)?;
        config.apply_env();
        Ok(config)
    }

    /// Resolve a file overlay against the built-in defaults
    fn resolve(overlay: file::ConfigFile) -> Result<Self> {
        let input_mode = match overlay.assistant.input.as_deref() {
            None | Some("text") => InputMode::Text,
            Some("wav") => InputMode::Wav,
            Some(other) => {
                return Err(Error::Config(format!("unknown input mode: {other}")));
            }
        };

        Ok(Self {
            wake_words: overlay
                .assistant
                .wake_words
                .unwrap_or_else(|| vec!["grasshopper".to_string()]),
            input_mode,
            llm: LlmConfig {
                url: overlay
                    .llm
                    .url
                    .unwrap_or_else(|| "http://localhost:11434".to_string()),
                model: overlay.llm.model.unwrap_or_else(|| "llama3.2".to_string()),
                system_prompt: overlay
                    .llm
                    .system_prompt
                    .unwrap_or_else(|| DEFAULT_SYSTEM_PROMPT.to_string()),
            },
            stt: SttConfig {
                url: overlay
                    .stt
                    .url
                    .unwrap_or_else(|| "http://localhost:9000".to_string()),
                model: overlay
                    .stt
                    .model
                    .unwrap_or_else(|| "whisper-1".to_string()),
                api_key: overlay.stt.api_key,
            },
            tts: TtsConfig {
                url: overlay
                    .tts
                    .url
                    .unwrap_or_else(|| "http://localhost:8880".to_string()),
                model: overlay.tts.model.unwrap_or_else(|| "tts-1".to_string()),
                voice: overlay.tts.voice.unwrap_or_else(|| "alloy".to_string()),
                speed: overlay.tts.speed.unwrap_or(1.0),
                api_key: overlay.tts.api_key,
            },
            clips: ClipsConfig {
                startup: overlay.clips.startup,
                rebuke: overlay.clips.rebuke,
            },
            save_path: overlay
                .assistant
                .save_path
                .unwrap_or_else(|| PathBuf::from("output.wav")),
        })
    }

    /// Apply `HOPPER_*` environment variable overrides
    fn apply_env(&mut self) {
        if let Some(url) = env_value("HOPPER_LLM_URL") {
            self.llm.url = url;
        }
        if let Some(model) = env_value("HOPPER_LLM_MODEL") {
            self.llm.model = model;
        }
        if let Some(url) = env_value("HOPPER_STT_URL") {
            self.stt.url = url;
        }
        if let Some(key) = env_value("HOPPER_STT_API_KEY") {
            self.stt.api_key = Some(key);
        }
        if let Some(url) = env_value("HOPPER_TTS_URL") {
            self.tts.url = url;
        }
        if let Some(key) = env_value("HOPPER_TTS_API_KEY") {
            self.tts.api_key = Some(key);
        }
    }
}

/// Non-empty environment variable value
fn env_value(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|v| !v.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = Config::resolve(file::ConfigFile::default()).unwrap();

        assert_eq!(config.wake_words, vec!["grasshopper"]);
        assert_eq!(config.input_mode, InputMode::Text);
        assert_eq!(config.llm.url, "http://localhost:11434");
        assert_eq!(config.tts.voice, "alloy");
        assert_eq!(config.save_path, PathBuf::from("output.wav"));
    }

    #[test]
    fn test_file_overlay() {
        let overlay: file::ConfigFile = toml::from_str(
            r#"
            [assistant]
            wake_words = ["computer"]
            input = "wav"
            save_path = "reply.wav"

            [llm]
            model = "mistral"

            [tts]
            speed = 1.25

            [clips]
            startup = "audio/start_up.mp3"
            "#,
        )
        .unwrap();

        let config = Config::resolve(overlay).unwrap();
        assert_eq!(config.wake_words, vec!["computer"]);
        assert_eq!(config.input_mode, InputMode::Wav);
        assert_eq!(config.llm.model, "mistral");
        assert_eq!(config.tts.speed, 1.25);
        assert_eq!(config.save_path, PathBuf::from("reply.wav"));
        assert_eq!(config.clips.startup, Some(PathBuf::from("audio/start_up.mp3")));
        assert_eq!(config.clips.rebuke, None);
        // Untouched sections keep their defaults
        assert_eq!(config.llm.url, "http://localhost:11434");
    }

    #[test]
    fn test_unknown_input_mode_is_rejected() {
        let overlay: file::ConfigFile = toml::from_str(
            r#"
            [assistant]
            input = "microphone"
            "#,
        )
        .unwrap();

        assert!(Config::resolve(overlay).is_err());
    }
}
