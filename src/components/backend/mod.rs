mod client;
pub mod models;

pub use client::HttpBackend;
pub use models::{AuthStatus, Event, Intent, QueryResponse};

use crate::error::AppResult;
use async_trait::async_trait;
use bytes::Bytes;
use url::Url;

/// Operations the calendar assistant backend offers to the client
#[async_trait]
pub trait Backend: Send + Sync {
    /// Query whether the session is signed in and has calendar access
    async fn auth_status(&self) -> AppResult<AuthStatus>;

    /// Fetch the full event list
    async fn list_events(&self) -> AppResult<Vec<Event>>;

    /// Send a free-text query; backend-reported failures are errors
    async fn submit_query(&self, query: &str) -> AppResult<QueryResponse>;

    /// Synthesize speech for `text`, returning the audio payload
    async fn synthesize(&self, text: &str) -> AppResult<Bytes>;

    /// End the backend session
    async fn logout(&self) -> AppResult<()>;

    /// Where the user signs in
    fn login_url(&self) -> AppResult<Url>;
}
