use crate::components::backend::Backend;
use crate::config::{Config, VOICE_OUTPUT};
use crate::error::{component_error, speech_error, AppResult};
use async_trait::async_trait;
use bytes::Bytes;
use std::io::Write;
use std::sync::Arc;
use tempfile::NamedTempFile;
use tokio::process::Command;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Plays a synthesized audio clip
#[async_trait]
pub trait AudioPlayer: Send + Sync {
    async fn play(&self, audio: Bytes) -> AppResult<()>;
}

/// Player backed by an external command such as `mpv` or `afplay`.
///
/// The clip is written to a temporary file that is deleted as soon as the
/// player exits.
#[derive(Debug, Clone)]
pub struct CommandPlayer {
    program: String,
    args: Vec<String>,
}

impl CommandPlayer {
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
impl AudioPlayer for CommandPlayer {
    async fn play(&self, audio: Bytes) -> AppResult<()> {
        let file = tokio::task::spawn_blocking(move || write_clip(&audio))
            .await
            .map_err(|e| component_error(&format!("Failed to write speech clip: {}", e)))??;

        let status = Command::new(&self.program)
            .args(&self.args)
            .arg(file.path())
            .stdin(std::process::Stdio::null())
            .stdout(std::process::Stdio::null())
            .stderr(std::process::Stdio::null())
            .status()
            .await?;

        // Dropping `file` removes the clip
        drop(file);

        if status.success() {
            Ok(())
        } else {
            Err(speech_error(&format!(
                "{} exited with {}",
                self.program, status
            )))
        }
    }
}

/// Write `audio` to a fresh temporary file
fn write_clip(audio: &[u8]) -> AppResult<NamedTempFile> {
    let mut file = tempfile::Builder::new()
        .prefix("kalenteri-speech-")
        .suffix(".mp3")
        .tempfile()?;
    file.write_all(audio)?;
    file.flush()?;
    Ok(file)
}

/// Commands that can be sent to the speech actor
#[derive(Debug)]
pub enum SpeechCommand {
    Speak(String),
    Shutdown,
}

/// Fetches synthesized speech from the backend and plays it
pub struct SpeechActor {
    backend: Arc<dyn Backend>,
    player: Arc<dyn AudioPlayer>,
    command_rx: mpsc::Receiver<SpeechCommand>,
}

/// Handle for communicating with the speech actor
#[derive(Debug, Clone)]
pub struct SpeechHandle {
    command_tx: Option<mpsc::Sender<SpeechCommand>>,
}

impl SpeechHandle {
    /// A handle that never speaks
    pub fn disabled() -> Self {
        Self { command_tx: None }
    }

    pub fn is_enabled(&self) -> bool {
        self.command_tx.is_some()
    }

    /// Speak `text` in the background.
    ///
    /// Blank text is skipped. Failures are only logged; requests are not
    /// queued against each other, so clips may overlap.
    pub fn speak(&self, text: &str) {
        let Some(command_tx) = &self.command_tx else {
            return;
        };
        if text.trim().is_empty() {
            return;
        }

        if let Err(e) = command_tx.try_send(SpeechCommand::Speak(text.to_string())) {
            warn!("Dropping speech request: {}", e);
        }
    }

    /// Shutdown the actor
    pub async fn shutdown(&self) -> AppResult<()> {
        if let Some(command_tx) = &self.command_tx {
            command_tx
                .send(SpeechCommand::Shutdown)
                .await
                .map_err(|e| component_error(&format!("Actor mailbox error: {}", e)))?;
        }
        Ok(())
    }
}

impl SpeechActor {
    /// Create a new actor and return its handle
    pub fn new(backend: Arc<dyn Backend>, player: Arc<dyn AudioPlayer>) -> (Self, SpeechHandle) {
        let (command_tx, command_rx) = mpsc::channel(32);

        let actor = Self {
            backend,
            player,
            command_rx,
        };

        let handle = SpeechHandle {
            command_tx: Some(command_tx),
        };

        (actor, handle)
    }

    /// Spawn the actor for this configuration, or return a disabled handle
    pub fn spawn(config: &Config, backend: Arc<dyn Backend>) -> SpeechHandle {
        if !config.is_component_enabled(VOICE_OUTPUT) {
            info!("Voice output disabled");
            return SpeechHandle::disabled();
        }

        let Some(player) = config
            .audio_player_cmd
            .as_deref()
            .and_then(CommandPlayer::from_command_line)
        else {
            info!("No audio player configured, voice output disabled");
            return SpeechHandle::disabled();
        };

        let (mut actor, handle) = Self::new(backend, Arc::new(player));
        tokio::spawn(async move {
            actor.run().await;
        });
        handle
    }

    /// Start the actor's processing loop
    pub async fn run(&mut self) {
        info!("Speech actor started");

        while let Some(cmd) = self.command_rx.recv().await {
            match cmd {
                SpeechCommand::Speak(text) => {
                    let backend = Arc::clone(&self.backend);
                    let player = Arc::clone(&self.player);
                    tokio::spawn(async move {
                        if let Err(e) = speak_once(backend.as_ref(), player.as_ref(), &text).await {
                            warn!("Speech playback failed: {}", e);
                        }
                    });
                }
                SpeechCommand::Shutdown => {
                    info!("Speech actor shutting down");
                    break;
                }
            }
        }

        info!("Speech actor shut down");
    }
}

/// Synthesize `text` and play it to the end
pub async fn speak_once(
    backend: &dyn Backend,
    player: &dyn AudioPlayer,
    text: &str,
) -> AppResult<()> {
    let audio = backend.synthesize(text).await?;
    debug!("Playing {} bytes of speech", audio.len());
    player.play(audio).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_text_is_not_sent() {
        let (command_tx, mut command_rx) = mpsc::channel(4);
        let handle = SpeechHandle {
            command_tx: Some(command_tx),
        };

        handle.speak("   \n");
        assert!(command_rx.try_recv().is_err());

        handle.speak("Done");
        assert!(matches!(
            command_rx.try_recv(),
            Ok(SpeechCommand::Speak(text)) if text == "Done"
        ));
    }

    #[test]
    fn disabled_handle_ignores_requests() {
        let handle = SpeechHandle::disabled();
        assert!(!handle.is_enabled());
        handle.speak("Done");
    }

    #[test]
    fn player_command_line_parses() {
        let player = CommandPlayer::from_command_line("mpv --really-quiet").unwrap();
        assert_eq!(player.program, "mpv");
        assert_eq!(player.args, vec!["--really-quiet"]);
    }

    #[test]
    fn clip_is_written_and_removed_on_drop() {
        let file = write_clip(b"ID3\x04").unwrap();
        let path = file.path().to_path_buf();
        assert_eq!(std::fs::read(&path).unwrap(), b"ID3\x04");

        drop(file);
        assert!(!path.exists());
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn player_receives_the_written_clip() {
        // `test -s` only succeeds for an existing, non-empty file
        let player = CommandPlayer::from_command_line("test -s").unwrap();
        player.play(Bytes::from_static(b"ID3")).await.unwrap();
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn failing_player_is_an_error() {
        let player = CommandPlayer::from_command_line("false").unwrap();
        assert!(player.play(Bytes::from_static(b"ID3")).await.is_err());
    }
}
