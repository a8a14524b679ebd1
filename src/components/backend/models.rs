use serde::{Deserialize, Deserializer, Serialize};

/// Calendar event as delivered by the backend
///
/// Every field is optional. A field holding anything other than text is read
/// as absent so one malformed record never fails a whole event list.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct Event {
    #[serde(default, deserialize_with = "lenient_text")]
    pub id: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub summary: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub start: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub end: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub location: Option<String>,
    #[serde(default, deserialize_with = "lenient_text")]
    pub description: Option<String>,
}

impl Event {
    /// Location text, if it is present and not blank
    pub fn location(&self) -> Option<&str> {
        self.location
            .as_deref()
            .map(str::trim)
            .filter(|l| !l.is_empty())
    }
}

fn lenient_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::String(s) => Some(s),
        _ => None,
    })
}

/// Response of the auth status endpoint
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
pub struct AuthStatus {
    #[serde(default)]
    pub authenticated: bool,
    #[serde(default)]
    pub has_calendar_access: bool,
}

/// Backend-classified purpose of a query
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Intent {
    Query,
    Create,
    Modify,
    Cancel,
    #[serde(other)]
    Unknown,
}

impl Intent {
    /// Whether the intent changes calendar data
    pub fn is_mutation(self) -> bool {
        matches!(self, Intent::Create | Intent::Modify | Intent::Cancel)
    }
}

/// Response of the list events endpoint
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct EventsResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub events: Vec<Event>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Response of the submit query endpoint
#[derive(Debug, Clone, Serialize, Deserialize, Default)]
pub struct QueryResponse {
    #[serde(default)]
    pub success: bool,
    #[serde(default)]
    pub response: Option<String>,
    #[serde(default)]
    pub events: Option<Vec<Event>>,
    #[serde(default)]
    pub intent: Option<Intent>,
    #[serde(default)]
    pub error: Option<String>,
}

/// Request body of the submit query endpoint
#[derive(Debug, Serialize)]
pub struct QueryRequest<'a> {
    pub query: &'a str,
}

/// Request body of the speech synthesis endpoint
#[derive(Debug, Serialize)]
pub struct SpeechRequest<'a> {
    pub text: &'a str,
}

/// JSON body the backend sends with failures
#[derive(Debug, Deserialize, Default)]
pub struct ErrorBody {
    #[serde(default)]
    pub error: Option<String>,
}
