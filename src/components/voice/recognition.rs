use crate::config::{Config, VOICE_INPUT};
use crate::error::{speech_error, unsupported_error, AppResult};
use async_trait::async_trait;
use std::fmt;
use std::process::Stdio;
use std::sync::Arc;
use tokio::process::Command;
use tracing::{debug, info};

/// A speech recognizer that listens for a single utterance
#[async_trait]
pub trait SpeechRecognizer: Send + Sync {
    /// Name used in logs
    fn name(&self) -> &str;

    /// Listen once and return the final transcript
    async fn recognize_once(&self) -> AppResult<String>;
}

/// Recognizer backed by an external command.
///
/// The command listens on its own, prints the transcript on stdout and
/// exits. Only the last non-empty line counts as the final transcript.
#[derive(Debug, Clone)]
pub struct CommandRecognizer {
    program: String,
    args: Vec<String>,
}

impl CommandRecognizer {
    /// Build from a whitespace-separated command line
    pub fn from_command_line(command_line: &str) -> Option<Self> {
        let mut parts = command_line.split_whitespace().map(str::to_string);
        let program = parts.next()?;
        Some(Self {
            program,
            args: parts.collect(),
        })
    }
}

#[async_trait]
impl SpeechRecognizer for CommandRecognizer {
    fn name(&self) -> &str {
        &self.program
    }

    async fn recognize_once(&self) -> AppResult<String> {
        debug!("Listening with {}", self.program);
        let output = Command::new(&self.program)
            .args(&self.args)
            .stdin(Stdio::null())
            .stderr(Stdio::null())
            .output()
            .await?;

        if !output.status.success() {
            return Err(speech_error(&format!(
                "{} exited with {}",
                self.program, output.status
            )));
        }

        let stdout = String::from_utf8_lossy(&output.stdout);
        let transcript = stdout
            .lines()
            .map(str::trim)
            .filter(|line| !line.is_empty())
            .last()
            .map(str::to_string);

        transcript.ok_or_else(|| speech_error("No speech was recognized"))
    }
}

/// The speech recognition capability chosen at startup
#[derive(Clone)]
pub enum RecognitionProvider {
    Available(Arc<dyn SpeechRecognizer>),
    Unavailable,
}

impl fmt::Debug for RecognitionProvider {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RecognitionProvider::Available(r) => {
                f.debug_tuple("Available").field(&r.name()).finish()
            }
            RecognitionProvider::Unavailable => f.write_str("Unavailable"),
        }
    }
}

impl RecognitionProvider {
    /// Pick the recognizer for this configuration
    pub fn detect(config: &Config) -> Self {
        if !config.is_component_enabled(VOICE_INPUT) {
            info!("Voice input disabled");
            return RecognitionProvider::Unavailable;
        }

        match config
            .speech_recognizer_cmd
            .as_deref()
            .and_then(CommandRecognizer::from_command_line)
        {
            Some(recognizer) => {
                info!("Using {} for speech recognition", recognizer.name());
                RecognitionProvider::Available(Arc::new(recognizer))
            }
            None => {
                info!("No speech recognizer configured");
                RecognitionProvider::Unavailable
            }
        }
    }

    pub fn is_available(&self) -> bool {
        matches!(self, RecognitionProvider::Available(_))
    }

    /// The recognizer, or an unsupported-feature error
    pub fn recognizer(&self) -> AppResult<Arc<dyn SpeechRecognizer>> {
        match self {
            RecognitionProvider::Available(r) => Ok(Arc::clone(r)),
            RecognitionProvider::Unavailable => Err(unsupported_error("speech recognition")),
        }
    }
}
