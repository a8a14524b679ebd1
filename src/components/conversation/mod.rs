use crate::components::backend::{Event, QueryResponse};

/// Who a message in the log came from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MessageKind {
    User,
    Assistant,
    Error,
}

/// Identifier of a message within one log
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct MessageId(u64);

/// A single entry of the conversation log
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Message {
    pub id: MessageId,
    pub kind: MessageKind,
    pub text: String,
    /// Placeholder shown while a query is in flight
    pub pending: bool,
}

/// Conversation log for the current session
///
/// Messages are only appended; the one exception is removing the pending
/// placeholder of a query once its outcome is known.
#[derive(Debug, Default)]
pub struct MessageLog {
    messages: Vec<Message>,
    next_id: u64,
}

impl MessageLog {
    pub fn new() -> Self {
        Self::default()
    }

    /// Append a message and return its id
    pub fn push(&mut self, kind: MessageKind, text: impl Into<String>) -> MessageId {
        self.append(kind, text.into(), false)
    }

    /// Append a pending assistant placeholder
    pub fn push_pending(&mut self, text: impl Into<String>) -> MessageId {
        self.append(MessageKind::Assistant, text.into(), true)
    }

    fn append(&mut self, kind: MessageKind, text: String, pending: bool) -> MessageId {
        let id = MessageId(self.next_id);
        self.next_id += 1;
        self.messages.push(Message {
            id,
            kind,
            text,
            pending,
        });
        id
    }

    /// Remove a message, returning whether it was present
    pub fn remove(&mut self, id: MessageId) -> bool {
        let before = self.messages.len();
        self.messages.retain(|m| m.id != id);
        self.messages.len() != before
    }

    /// Messages in display order, newest first
    pub fn newest_first(&self) -> impl Iterator<Item = &Message> {
        self.messages.iter().rev()
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }

    /// Whether any query is still waiting for its response
    pub fn has_pending(&self) -> bool {
        self.messages.iter().any(|m| m.pending)
    }
}

/// How the event cache follows a successful query response
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EventRefresh {
    /// The response carried a fresh event list; show it as is
    Inline(Vec<Event>),
    /// Fetch the full event list from the backend
    Refetch,
    /// Leave the cache alone
    Keep,
}

impl EventRefresh {
    /// Decide the refresh for a query response.
    ///
    /// Inline events win. Mutating intents refetch, and so does a response
    /// that carries neither an intent nor an event list.
    pub fn for_response(response: &QueryResponse) -> Self {
        match (&response.events, response.intent) {
            (Some(events), _) if !events.is_empty() => EventRefresh::Inline(events.clone()),
            (_, Some(intent)) if intent.is_mutation() => EventRefresh::Refetch,
            (None, None) => EventRefresh::Refetch,
            _ => EventRefresh::Keep,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::backend::Intent;

    fn response(events: Option<Vec<Event>>, intent: Option<Intent>) -> QueryResponse {
        QueryResponse {
            success: true,
            response: Some("Done".to_string()),
            events,
            intent,
            error: None,
        }
    }

    fn event(summary: &str) -> Event {
        Event {
            summary: Some(summary.to_string()),
            start: Some("2024-03-05T09:00:00Z".to_string()),
            ..Default::default()
        }
    }

    #[test]
    fn log_is_newest_first() {
        let mut log = MessageLog::new();
        log.push(MessageKind::User, "first");
        log.push(MessageKind::Assistant, "second");
        let texts: Vec<_> = log.newest_first().map(|m| m.text.as_str()).collect();
        assert_eq!(texts, vec!["second", "first"]);
    }

    #[test]
    fn placeholder_can_be_removed_once() {
        let mut log = MessageLog::new();
        log.push(MessageKind::User, "hello");
        let pending = log.push_pending("...");
        assert!(log.has_pending());
        assert!(log.remove(pending));
        assert!(!log.remove(pending));
        assert!(!log.has_pending());
        assert_eq!(log.len(), 1);
    }

    #[test]
    fn inline_events_win_over_intent() {
        let events = vec![event("Standup")];
        assert_eq!(
            EventRefresh::for_response(&response(Some(events.clone()), Some(Intent::Create))),
            EventRefresh::Inline(events)
        );
    }

    #[test]
    fn mutations_without_events_refetch() {
        for intent in [Intent::Create, Intent::Modify, Intent::Cancel] {
            assert_eq!(
                EventRefresh::for_response(&response(None, Some(intent))),
                EventRefresh::Refetch
            );
            assert_eq!(
                EventRefresh::for_response(&response(Some(Vec::new()), Some(intent))),
                EventRefresh::Refetch
            );
        }
    }

    #[test]
    fn bare_response_refetches() {
        assert_eq!(
            EventRefresh::for_response(&response(None, None)),
            EventRefresh::Refetch
        );
    }

    #[test]
    fn plain_query_keeps_cache() {
        assert_eq!(
            EventRefresh::for_response(&response(Some(Vec::new()), Some(Intent::Query))),
            EventRefresh::Keep
        );
        assert_eq!(
            EventRefresh::for_response(&response(None, Some(Intent::Query))),
            EventRefresh::Keep
        );
    }
}
