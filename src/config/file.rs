//! TOML configuration file loading
//!
//! All fields are optional: the file is a partial overlay on top of defaults.

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::Result;

/// Top-level TOML configuration file schema
#[derive(Debug, Default, Deserialize)]
pub struct ConfigFile {
    /// Assistant behavior
    #[serde(default)]
    pub assistant: AssistantFileConfig,

    /// LLM configuration
    #[serde(default)]
    pub llm: LlmFileConfig,

    /// Speech-to-text configuration
    #[serde(default)]
    pub stt: SttFileConfig,

    /// Text-to-speech configuration
    #[serde(default)]
    pub tts: TtsFileConfig,

    /// Canned audio clips
    #[serde(default)]
    pub clips: ClipsFileConfig,
}

/// Assistant behavior configuration
#[derive(Debug, Default, Deserialize)]
pub struct AssistantFileConfig {
    /// Wake words (e.g. ["grasshopper"])
    pub wake_words: Option<Vec<String>>,

    /// Utterance input mode: "text" or "wav"
    pub input: Option<String>,

    /// Where the "save" voice command writes the remaining audio
    pub save_path: Option<PathBuf>,
}

/// LLM-related configuration
#[derive(Debug, Default, Deserialize)]
pub struct LlmFileConfig {
    /// Chat endpoint base URL (Ollama-compatible)
    pub url: Option<String>,

    /// Model identifier (e.g. "llama3.2")
    pub model: Option<String>,

    /// System prompt prepended to every conversation
    pub system_prompt: Option<String>,
}

/// Speech-to-text configuration
#[derive(Debug, Default, Deserialize)]
pub struct SttFileConfig {
    /// Transcription endpoint base URL (OpenAI-compatible)
    pub url: Option<String>,

    /// STT model (e.g. "whisper-1")
    pub model: Option<String>,

    /// Bearer API key, if the endpoint needs one
    pub api_key: Option<String>,
}

/// Text-to-speech configuration
#[derive(Debug, Default, Deserialize)]
pub struct TtsFileConfig {
    /// Speech endpoint base URL (OpenAI-compatible)
    pub url: Option<String>,

    /// TTS model (e.g. "tts-1")
    pub model: Option<String>,

    /// TTS voice identifier (e.g. "alloy")
    pub voice: Option<String>,

    /// TTS speed multiplier
    pub speed: Option<f64>,

    /// Bearer API key, if the endpoint needs one
    pub api_key: Option<String>,
}

/// Canned audio clip paths
#[derive(Debug, Default, Deserialize)]
pub struct ClipsFileConfig {
    /// Clip played when the daemon starts
    pub startup: Option<PathBuf>,

    /// Clip played in response to an abusive phrase
    pub rebuke: Option<PathBuf>,
}

/// Load a TOML config file
///
/// # Errors
///
/// Returns error if the file cannot be read or parsed
pub fn load(path: &Path) -> Result<ConfigFile> {
    let contents = std::fs::read_to_string(path)?;
    Ok(toml::from_str(&contents)?)
}
