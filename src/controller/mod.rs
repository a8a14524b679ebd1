//! The client's controller.
//!
//! All state lives in one [`AppState`] owned by the [`Controller`]. Network
//! work runs in spawned tasks that post a [`Completion`] back to the
//! controller's channel; only the controller loop mutates state, so nothing
//! needs locking. Requests are never cancelled and complete in whatever
//! order the backend answers.

mod input;
mod view;

pub use input::UserAction;
pub use view::{render_agenda, render_frame, render_grid, TerminalView, View};

use crate::components::auth_gate::{AuthIndicator, AuthOutcome, Navigator};
use crate::components::backend::{AuthStatus, Backend, Event, QueryResponse};
use crate::components::calendar_grid::{render_month, DisplayZone, DisplayedMonth, MonthGrid};
use crate::components::conversation::{EventRefresh, MessageId, MessageKind, MessageLog};
use crate::components::voice::{RecognitionProvider, SpeechHandle};
use crate::error::{component_error, AppResult, Error};
use std::future::Future;
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, error, info, warn};

/// Everything the screen shows
#[derive(Debug)]
pub struct AppState {
    /// Event cache; replaced wholesale on every successful fetch
    pub events: Vec<Event>,
    pub month: DisplayedMonth,
    pub listening: bool,
    pub messages: MessageLog,
    pub auth: AuthIndicator,
    /// Text waiting in the input line
    pub input: String,
}

impl AppState {
    pub fn new(month: DisplayedMonth) -> Self {
        Self {
            events: Vec::new(),
            month,
            listening: false,
            messages: MessageLog::new(),
            auth: AuthIndicator::default(),
            input: String::new(),
        }
    }
}

/// Result of a finished background request
#[derive(Debug)]
pub enum Completion {
    Auth(AppResult<AuthStatus>),
    Events(AppResult<Vec<Event>>),
    Query {
        pending: MessageId,
        result: AppResult<QueryResponse>,
    },
    Transcript(AppResult<String>),
    LoggedOut(AppResult<()>),
}

enum Step {
    Stop,
    Action(UserAction),
    Completion(Completion),
}

/// Owns the application state and reacts to user actions and completions
pub struct Controller {
    state: AppState,
    backend: Arc<dyn Backend>,
    speech: SpeechHandle,
    recognition: RecognitionProvider,
    navigator: Option<Arc<dyn Navigator>>,
    zone: DisplayZone,
    completion_tx: mpsc::UnboundedSender<Completion>,
    completion_rx: mpsc::UnboundedReceiver<Completion>,
    in_flight: usize,
}

impl Controller {
    /// Create a controller showing the current month
    pub fn new(backend: Arc<dyn Backend>, zone: DisplayZone) -> Self {
        let (completion_tx, completion_rx) = mpsc::unbounded_channel();

        Self {
            state: AppState::new(DisplayedMonth::containing(zone.today())),
            backend,
            speech: SpeechHandle::disabled(),
            recognition: RecognitionProvider::Unavailable,
            navigator: None,
            zone,
            completion_tx,
            completion_rx,
            in_flight: 0,
        }
    }

    /// Set the speech output handle
    pub fn with_speech(mut self, speech: SpeechHandle) -> Self {
        self.speech = speech;
        self
    }

    /// Set the speech recognition capability
    pub fn with_recognition(mut self, recognition: RecognitionProvider) -> Self {
        self.recognition = recognition;
        self
    }

    /// Set where the login page is opened
    pub fn with_navigator(mut self, navigator: Arc<dyn Navigator>) -> Self {
        self.navigator = Some(navigator);
        self
    }

    /// Start on a specific month
    pub fn with_month(mut self, month: DisplayedMonth) -> Self {
        self.state.month = month;
        self
    }

    pub fn state(&self) -> &AppState {
        &self.state
    }

    /// Background requests whose completion has not been applied yet
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }

    /// The displayed month rendered from the event cache
    pub fn grid(&self) -> MonthGrid {
        render_month(
            self.state.month,
            &self.state.events,
            &self.zone,
            self.zone.today(),
        )
    }

    /// Run `task` in the background and post its completion.
    ///
    /// A task that panics still posts a completion, built by `on_failure`,
    /// so `in_flight` always returns to zero.
    fn spawn<F, E>(&mut self, task: F, on_failure: E)
    where
        F: Future<Output = Completion> + Send + 'static,
        E: FnOnce(Error) -> Completion + Send + 'static,
    {
        self.in_flight += 1;
        let completion_tx = self.completion_tx.clone();
        let handle = tokio::spawn(task);
        tokio::spawn(async move {
            let completion = match handle.await {
                Ok(completion) => completion,
                Err(e) => {
                    error!("Background request failed: {}", e);
                    on_failure(component_error(&format!("Request task failed: {}", e)))
                }
            };
            let _ = completion_tx.send(completion);
        });
    }

    /// Check the session and load the first event list
    pub fn initialize(&mut self) {
        self.check_auth();
        self.refresh_events();
    }

    /// Ask the backend for the auth status
    pub fn check_auth(&mut self) {
        let backend = Arc::clone(&self.backend);
        self.spawn(
            async move { Completion::Auth(backend.auth_status().await) },
            |e| Completion::Auth(Err(e)),
        );
    }

    /// Re-fetch the full event list
    pub fn refresh_events(&mut self) {
        let backend = Arc::clone(&self.backend);
        self.spawn(
            async move { Completion::Events(backend.list_events().await) },
            |e| Completion::Events(Err(e)),
        );
    }

    /// Replace the input line
    pub fn set_input(&mut self, text: impl Into<String>) {
        self.state.input = text.into();
    }

    /// Submit whatever is in the input line
    pub fn submit_input(&mut self) -> bool {
        let query = self.state.input.clone();
        self.submit(&query)
    }

    /// Send a query to the assistant.
    ///
    /// Blank queries are ignored and leave the input alone. Returns whether
    /// a request was sent.
    pub fn submit(&mut self, query: &str) -> bool {
        let query = query.trim();
        if query.is_empty() {
            return false;
        }

        self.state.input.clear();
        self.state.messages.push(MessageKind::User, query);
        let pending = self.state.messages.push_pending(t!("pending_message"));

        let backend = Arc::clone(&self.backend);
        let query = query.to_string();
        self.spawn(
            async move {
                let result = backend.submit_query(&query).await;
                Completion::Query { pending, result }
            },
            move |e| Completion::Query {
                pending,
                result: Err(e),
            },
        );
        true
    }

    pub fn prev_month(&mut self) {
        self.state.month = self.state.month.prev();
    }

    pub fn next_month(&mut self) {
        self.state.month = self.state.month.next();
    }

    /// Start listening for one utterance, or stop showing the listening state
    pub fn toggle_voice(&mut self) {
        if self.state.listening {
            // The recognizer keeps running; only the indicator goes away
            self.state.listening = false;
            debug!("Listening cancelled");
            return;
        }

        let recognizer = match self.recognition.recognizer() {
            Ok(recognizer) => recognizer,
            Err(e) => {
                warn!("Voice input unavailable: {}", e);
                self.state
                    .messages
                    .push(MessageKind::Error, t!("voice_unsupported"));
                return;
            }
        };

        self.state.listening = true;
        self.spawn(
            async move { Completion::Transcript(recognizer.recognize_once().await) },
            |e| Completion::Transcript(Err(e)),
        );
    }

    /// Sign out; only possible while the logout control is shown
    pub fn logout(&mut self) {
        if !self.state.auth.show_logout {
            debug!("Ignoring logout while signed out");
            return;
        }

        let backend = Arc::clone(&self.backend);
        self.spawn(
            async move { Completion::LoggedOut(backend.logout().await) },
            |e| Completion::LoggedOut(Err(e)),
        );
    }

    /// Handle a user action; returns `false` when the user wants to quit
    pub fn dispatch(&mut self, action: UserAction) -> bool {
        match action {
            UserAction::Submit(query) => {
                self.set_input(query);
                self.submit_input();
            }
            UserAction::PrevMonth => self.prev_month(),
            UserAction::NextMonth => self.next_month(),
            UserAction::ToggleVoice => self.toggle_voice(),
            UserAction::Refresh => self.refresh_events(),
            UserAction::Logout => self.logout(),
            UserAction::Help => {
                self.state
                    .messages
                    .push(MessageKind::Assistant, t!("help_text"));
            }
            UserAction::Quit => return false,
        }
        true
    }

    /// Apply a finished request to the state
    pub fn apply(&mut self, completion: Completion) {
        self.in_flight = self.in_flight.saturating_sub(1);

        match completion {
            Completion::Auth(result) => self.apply_auth(result),
            Completion::Events(result) => self.apply_events(result),
            Completion::Query { pending, result } => self.apply_query(pending, result),
            Completion::Transcript(result) => self.apply_transcript(result),
            Completion::LoggedOut(result) => self.apply_logout(result),
        }
    }

    fn apply_auth(&mut self, result: AppResult<AuthStatus>) {
        match result {
            Ok(status) => {
                let outcome = AuthOutcome::from(status);
                info!("Auth status: {:?}", outcome);
                self.state.auth.apply(outcome);
                if outcome.requires_login() {
                    self.open_login();
                }
            }
            // The indicator keeps its signed-out look
            Err(e) => error!("Failed to check auth status: {}", e),
        }
    }

    fn open_login(&mut self) {
        let url = match self.backend.login_url() {
            Ok(url) => url,
            Err(e) => {
                error!("No login URL: {}", e);
                return;
            }
        };

        self.state.messages.push(
            MessageKind::Assistant,
            t!("login_opened", url = url.as_str()),
        );

        if let Some(navigator) = &self.navigator {
            if let Err(e) = navigator.open(&url) {
                warn!("Failed to open login page: {}", e);
            }
        }
    }

    fn apply_events(&mut self, result: AppResult<Vec<Event>>) {
        match result {
            Ok(events) => {
                debug!("Event cache now holds {} events", events.len());
                self.state.events = events;
            }
            Err(e) => {
                warn!("Failed to load events: {}", e);
                self.state.messages.push(
                    MessageKind::Error,
                    t!("events_refresh_failed", detail = e.to_string()),
                );
            }
        }
    }

    fn apply_query(&mut self, pending: MessageId, result: AppResult<QueryResponse>) {
        self.state.messages.remove(pending);

        let response = match result {
            Ok(response) => response,
            Err(e) => {
                warn!("Query failed: {}", e);
                self.state.messages.push(
                    MessageKind::Error,
                    t!("error_message", detail = e.to_string()),
                );
                return;
            }
        };

        let text = response
            .response
            .as_deref()
            .map(str::trim)
            .filter(|t| !t.is_empty())
            .map(str::to_string);
        match &text {
            Some(text) => {
                self.state.messages.push(MessageKind::Assistant, text.as_str());
                self.speech.speak(text);
            }
            None => {
                self.state
                    .messages
                    .push(MessageKind::Assistant, t!("no_response"));
            }
        }

        match EventRefresh::for_response(&response) {
            EventRefresh::Inline(events) => self.apply_events(Ok(events)),
            EventRefresh::Refetch => self.refresh_events(),
            EventRefresh::Keep => {}
        }
    }

    fn apply_transcript(&mut self, result: AppResult<String>) {
        self.state.listening = false;

        match result {
            Ok(transcript) => {
                info!("Heard: {}", transcript);
                self.submit(&transcript);
            }
            Err(e) => {
                warn!("Speech recognition failed: {}", e);
                self.state.messages.push(
                    MessageKind::Error,
                    t!("voice_error", detail = e.to_string()),
                );
            }
        }
    }

    fn apply_logout(&mut self, result: AppResult<()>) {
        match result {
            Ok(()) => {
                info!("Signed out");
                self.state.auth.reset();
                self.state.events.clear();
                self.open_login();
            }
            Err(e) => {
                warn!("Logout failed: {}", e);
                self.state.messages.push(
                    MessageKind::Error,
                    t!("error_message", detail = e.to_string()),
                );
            }
        }
    }

    /// Wait for the next completion and apply it
    pub async fn pump(&mut self) -> bool {
        match self.completion_rx.recv().await {
            Some(completion) => {
                self.apply(completion);
                true
            }
            None => false,
        }
    }

    /// Apply completions until no request is outstanding
    pub async fn settle(&mut self) {
        while self.in_flight > 0 {
            if !self.pump().await {
                break;
            }
        }
    }

    /// Run the event loop until the user quits, input ends or shutdown
    pub async fn run<V: View>(
        mut self,
        mut actions: mpsc::Receiver<UserAction>,
        view: &mut V,
        shutdown: CancellationToken,
    ) {
        view.render(&self.state, &self.grid(), &self.zone);

        loop {
            let step = tokio::select! {
                _ = shutdown.cancelled() => Step::Stop,
                action = actions.recv() => match action {
                    Some(action) => Step::Action(action),
                    None => Step::Stop,
                },
                Some(completion) = self.completion_rx.recv() => Step::Completion(completion),
            };

            match step {
                Step::Stop => break,
                Step::Action(action) => {
                    if !self.dispatch(action) {
                        break;
                    }
                }
                Step::Completion(completion) => self.apply(completion),
            }

            view.render(&self.state, &self.grid(), &self.zone);
        }

        info!("Controller stopped with {} requests in flight", self.in_flight);
    }
}
