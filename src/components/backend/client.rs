use super::models::{
    AuthStatus, ErrorBody, Event, EventsResponse, QueryRequest, QueryResponse, SpeechRequest,
};
use super::Backend;
use crate::config::Config;
use crate::error::{backend_error, env_error, speech_error, AppResult, Error};
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::header::{self, HeaderMap, HeaderValue};
use reqwest::redirect::Policy;
use reqwest::{Client, Response};
use tracing::debug;
use url::Url;

const AUTH_STATUS_PATH: &str = "api/auth/status";
const EVENTS_PATH: &str = "api/events";
const QUERY_PATH: &str = "api/query";
const TTS_PATH: &str = "api/tts";
const LOGIN_PATH: &str = "login";
const LOGOUT_PATH: &str = "logout";

/// Backend reached over HTTP
#[derive(Debug, Clone)]
pub struct HttpBackend {
    client: Client,
    base_url: Url,
}

impl HttpBackend {
    /// Create a backend client from the application config
    pub fn new(config: &Config) -> AppResult<Self> {
        Self::with_session(&config.backend_url, config.session_cookie.as_deref())
    }

    /// Create a backend client for `base_url` with an optional session cookie
    pub fn with_session(base_url: &str, session_cookie: Option<&str>) -> AppResult<Self> {
        let mut base_url = Url::parse(base_url).map_err(|_| env_error("BACKEND_URL"))?;

        // Endpoint paths are joined relative to the base path
        if !base_url.path().ends_with('/') {
            let path = format!("{}/", base_url.path());
            base_url.set_path(&path);
        }

        let mut headers = HeaderMap::new();
        if let Some(cookie) = session_cookie {
            let value = HeaderValue::from_str(cookie).map_err(|_| env_error("SESSION_COOKIE"))?;
            headers.insert(header::COOKIE, value);
        }

        // The login and logout routes redirect to the OAuth provider, which
        // only makes sense inside a browser
        let client = Client::builder()
            .default_headers(headers)
            .redirect(Policy::none())
            .build()?;

        Ok(Self { client, base_url })
    }

    fn endpoint(&self, path: &str) -> AppResult<Url> {
        self.base_url
            .join(path)
            .map_err(|e| backend_error(&format!("Failed to build URL for {}: {}", path, e)))
    }
}

/// Turn a non-success response into an error carrying the backend's detail
async fn failure(response: Response) -> Error {
    let status = response.status();
    let body = response.text().await.unwrap_or_default();
    let detail = serde_json::from_str::<ErrorBody>(&body)
        .ok()
        .and_then(|b| b.error)
        .unwrap_or_else(|| format!("HTTP {}", status));
    backend_error(&detail)
}

fn is_json(response: &Response) -> bool {
    response
        .headers()
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v.starts_with("application/json"))
}

#[async_trait]
impl Backend for HttpBackend {
    async fn auth_status(&self) -> AppResult<AuthStatus> {
        let response = self.client.get(self.endpoint(AUTH_STATUS_PATH)?).send().await?;
        if !response.status().is_success() {
            return Err(failure(response).await);
        }
        Ok(response.json().await?)
    }

    async fn list_events(&self) -> AppResult<Vec<Event>> {
        let response = self.client.get(self.endpoint(EVENTS_PATH)?).send().await?;
        if !response.status().is_success() {
            return Err(failure(response).await);
        }

        let body: EventsResponse = response.json().await?;
        if !body.success {
            return Err(backend_error(
                body.error.as_deref().unwrap_or("Failed to load events"),
            ));
        }

        debug!("Fetched {} events", body.events.len());
        Ok(body.events)
    }

    async fn submit_query(&self, query: &str) -> AppResult<QueryResponse> {
        let response = self
            .client
            .post(self.endpoint(QUERY_PATH)?)
            .json(&QueryRequest { query })
            .send()
            .await?;
        if !response.status().is_success() {
            return Err(failure(response).await);
        }

        let body: QueryResponse = response.json().await?;
        if !body.success {
            return Err(backend_error(
                body.error.as_deref().unwrap_or("Unknown error"),
            ));
        }
        Ok(body)
    }

    async fn synthesize(&self, text: &str) -> AppResult<Bytes> {
        let response = self
            .client
            .post(self.endpoint(TTS_PATH)?)
            .json(&SpeechRequest { text })
            .send()
            .await?;
        if !response.status().is_success() || is_json(&response) {
            return Err(failure(response).await);
        }

        let audio = response.bytes().await?;
        if audio.is_empty() {
            return Err(speech_error("Received empty audio"));
        }
        Ok(audio)
    }

    async fn logout(&self) -> AppResult<()> {
        let response = self.client.get(self.endpoint(LOGOUT_PATH)?).send().await?;
        let status = response.status();
        if status.is_success() || status.is_redirection() {
            Ok(())
        } else {
            Err(failure(response).await)
        }
    }

    fn login_url(&self) -> AppResult<Url> {
        self.endpoint(LOGIN_PATH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoints_keep_base_path() {
        let backend = HttpBackend::with_session("https://example.com/assistant", None).unwrap();
        assert_eq!(
            backend.endpoint(EVENTS_PATH).unwrap().as_str(),
            "https://example.com/assistant/api/events"
        );
        assert_eq!(
            backend.login_url().unwrap().as_str(),
            "https://example.com/assistant/login"
        );
    }

    #[test]
    fn rejects_unusable_cookie() {
        let result = HttpBackend::with_session("http://127.0.0.1:5000", Some("bad\ncookie"));
        assert!(result.is_err());
    }
}
