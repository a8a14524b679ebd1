use crate::components::backend::AuthStatus;
use crate::error::{component_error, AppResult};
use tracing::info;
use url::Url;

/// What the auth status check decided
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AuthOutcome {
    /// Signed in with calendar access
    Authorized,
    /// Signed in, but calendar access was not granted
    NoCalendarAccess,
    /// Not signed in; the user must go through login
    Unauthenticated,
}

impl From<AuthStatus> for AuthOutcome {
    fn from(status: AuthStatus) -> Self {
        match (status.authenticated, status.has_calendar_access) {
            (true, true) => AuthOutcome::Authorized,
            (true, false) => AuthOutcome::NoCalendarAccess,
            (false, _) => AuthOutcome::Unauthenticated,
        }
    }
}

impl AuthOutcome {
    /// Whether the browser must be sent to the login route
    pub fn requires_login(self) -> bool {
        self == AuthOutcome::Unauthenticated
    }
}

/// Connection indicator and logout control visibility
///
/// The default is the unauthenticated look, which is also what stays on
/// screen when the status check fails.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct AuthIndicator {
    pub connected: bool,
    pub show_logout: bool,
}

impl AuthIndicator {
    /// Update the indicator for a status check outcome
    pub fn apply(&mut self, outcome: AuthOutcome) {
        let connected = outcome == AuthOutcome::Authorized;
        self.connected = connected;
        self.show_logout = connected;
    }

    /// Back to the unauthenticated look
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

/// Sends the user somewhere outside the client, such as the login page
pub trait Navigator: Send + Sync {
    fn open(&self, url: &Url) -> AppResult<()>;
}

/// Opens URLs in the system browser
#[derive(Debug, Default, Clone, Copy)]
pub struct BrowserNavigator;

impl Navigator for BrowserNavigator {
    fn open(&self, url: &Url) -> AppResult<()> {
        info!("Opening {} in the browser", url);
        webbrowser::open(url.as_str())
            .map_err(|e| component_error(&format!("Failed to open browser: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn status(authenticated: bool, has_calendar_access: bool) -> AuthStatus {
        AuthStatus {
            authenticated,
            has_calendar_access,
        }
    }

    #[test]
    fn outcomes_follow_status_flags() {
        assert_eq!(AuthOutcome::from(status(true, true)), AuthOutcome::Authorized);
        assert_eq!(
            AuthOutcome::from(status(true, false)),
            AuthOutcome::NoCalendarAccess
        );
        assert_eq!(
            AuthOutcome::from(status(false, true)),
            AuthOutcome::Unauthenticated
        );
    }

    #[test]
    fn only_unauthenticated_requires_login() {
        assert!(AuthOutcome::Unauthenticated.requires_login());
        assert!(!AuthOutcome::NoCalendarAccess.requires_login());
        assert!(!AuthOutcome::Authorized.requires_login());
    }

    #[test]
    fn indicator_hides_logout_without_calendar_access() {
        let mut indicator = AuthIndicator::default();
        indicator.apply(AuthOutcome::Authorized);
        assert!(indicator.connected && indicator.show_logout);

        indicator.apply(AuthOutcome::NoCalendarAccess);
        assert!(!indicator.connected);
        assert!(!indicator.show_logout);
    }
}
