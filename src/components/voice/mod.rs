pub mod recognition;
pub mod speech;

pub use recognition::{CommandRecognizer, RecognitionProvider, SpeechRecognizer};
pub use speech::{AudioPlayer, CommandPlayer, SpeechActor, SpeechHandle};
