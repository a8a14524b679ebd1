use crate::components::auth_gate::BrowserNavigator;
use crate::components::calendar_grid::DisplayZone;
use crate::components::voice::{RecognitionProvider, SpeechActor};
use crate::components::{Backend, HttpBackend};
use crate::config::Config;
use crate::controller::{Controller, TerminalView, UserAction};
use crate::error::other_error;
use crate::shutdown;
use crate::utils::i18n::set_locale;
use std::io::{BufRead, IsTerminal};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Initialize logging with environment-based configuration
pub fn init_logging() -> miette::Result<()> {
    // Logs go to stderr; stdout belongs to the rendered frame
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,reqwest=warn,hyper=warn")),
        )
        .with_writer(std::io::stderr)
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| other_error(&format!("Failed to set up logging: {}", e)))?;

    Ok(())
}

/// Load the application config
pub fn load_config() -> miette::Result<Config> {
    match Config::load() {
        Ok(config) => Ok(config),
        Err(e) => {
            error!("Failed to load configuration: {:?}", e);
            Err(e.into())
        }
    }
}

/// Read terminal lines on a plain thread so a blocked read never holds up
/// runtime shutdown. The channel closes at end of input.
fn spawn_input_reader() -> mpsc::Receiver<UserAction> {
    let (action_tx, action_rx) = mpsc::channel(16);

    std::thread::spawn(move || {
        let stdin = std::io::stdin();
        for line in stdin.lock().lines() {
            let action = match line {
                Ok(line) => UserAction::parse(&line),
                Err(e) => {
                    warn!("Failed to read input: {}", e);
                    break;
                }
            };
            if action_tx.blocking_send(action).is_err() {
                break;
            }
        }
        debug!("Input reader finished");
    });

    action_rx
}

/// Build every component and run the client until it is told to stop
pub async fn start_client(config: Config) -> miette::Result<()> {
    set_locale(&config.ui_locale);
    info!("Setting locale to {}", config.ui_locale);

    let zone = DisplayZone::from_setting(config.timezone.as_deref())?;
    info!("Showing calendar days in {:?}", zone);

    let backend: Arc<dyn Backend> = Arc::new(HttpBackend::new(&config)?);
    info!("Using backend at {}", config.backend_url);

    // Initialize voice components
    let speech = SpeechActor::spawn(&config, Arc::clone(&backend));
    let recognition = RecognitionProvider::detect(&config);

    let mut controller = Controller::new(backend, zone)
        .with_speech(speech.clone())
        .with_recognition(recognition)
        .with_navigator(Arc::new(BrowserNavigator));

    // Spawn signal handler task
    let shutdown_token = CancellationToken::new();
    tokio::spawn(shutdown::handle_signals(shutdown_token.clone()));

    let actions = spawn_input_reader();
    let mut view = TerminalView::new(std::io::stdout()).clearing(std::io::stdout().is_terminal());

    controller.initialize();
    controller.run(actions, &mut view, shutdown_token).await;

    if let Err(e) = speech.shutdown().await {
        debug!("Speech actor already stopped: {}", e);
    }

    info!("Goodbye");
    Ok(())
}
