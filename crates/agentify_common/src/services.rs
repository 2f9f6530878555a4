//! Service abstractions for the calendar and mail providers.
//!
//! Capability functions are written against these traits rather than against
//! the Google clients directly, so the same code runs against the live
//! providers in the backend and against mocks in tests.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use crate::credential::CredentialRecord;
use crate::error::AgentifyError;

/// A calendar event to be inserted on the caller's behalf.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NewCalendarEvent {
    pub summary: String,
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
    /// IANA zone name sent alongside both timestamps.
    pub time_zone: String,
    pub description: Option<String>,
    /// Attendee e-mail addresses. Empty means the field is omitted entirely.
    pub attendees: Vec<String>,
    /// Request id for the attached conferencing request.
    pub conference_request_id: String,
}

/// What the provider reports back after an insert.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CreatedEvent {
    pub event_id: Option<String>,
    pub html_link: Option<String>,
}

/// A busy interval as reported by free/busy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct BusyInterval {
    pub start: DateTime<Utc>,
    pub end: DateTime<Utc>,
}

/// Header metadata for one mail message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MailSummary {
    pub id: String,
    pub from: Option<String>,
    pub subject: Option<String>,
    pub snippet: String,
}

/// Calendar provider operations.
#[cfg_attr(any(test, feature = "mocks"), mockall::automock)]
#[async_trait]
pub trait CalendarService: Send + Sync {
    /// Inserts an event, notifying attendees and requesting a conference link.
    async fn insert_event(
        &self,
        calendar_id: &str,
        event: NewCalendarEvent,
    ) -> Result<CreatedEvent, AgentifyError>;

    /// Busy intervals of `calendar_id` in `[start, end)`, sorted by start.
    async fn busy_intervals(
        &self,
        calendar_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        time_zone: &str,
    ) -> Result<Vec<BusyInterval>, AgentifyError>;
}

/// Mail provider operations. Messages travel as base64url-encoded RFC 2822.
#[cfg_attr(any(test, feature = "mocks"), mockall::automock)]
#[async_trait]
pub trait MailService: Send + Sync {
    /// Sends immediately; returns the message id.
    async fn send_message(&self, raw: String) -> Result<String, AgentifyError>;

    /// Stores an unsent draft; returns the draft id.
    async fn create_draft(&self, raw: String) -> Result<String, AgentifyError>;

    /// Ids of messages matching a provider search query.
    async fn list_message_ids(
        &self,
        query: &str,
        max_results: u32,
    ) -> Result<Vec<String>, AgentifyError>;

    /// Sender, subject and snippet of one message.
    async fn message_summary(&self, id: &str) -> Result<MailSummary, AgentifyError>;
}

/// Provider sessions bound to one caller's credential.
#[derive(Clone)]
pub struct Sessions {
    pub mail: Arc<dyn MailService>,
    pub calendar: Arc<dyn CalendarService>,
}

/// Turns a caller-supplied credential into provider sessions.
///
/// Implementations must not cache: one process serves many callers, and every
/// call derives its sessions from the record it is given.
#[cfg_attr(any(test, feature = "mocks"), mockall::automock)]
#[async_trait]
pub trait SessionFactory: Send + Sync {
    async fn obtain_sessions(&self, credential: &CredentialRecord)
        -> Result<Sessions, AgentifyError>;
}

/// Everything a capability function needs to act for one caller.
///
/// Built fresh for each request and passed down explicitly; there is no
/// process-wide credential slot.
#[derive(Clone, Copy)]
pub struct CallerContext<'a> {
    pub sessions: &'a dyn SessionFactory,
    pub credential: &'a CredentialRecord,
}

impl<'a> CallerContext<'a> {
    pub fn new(sessions: &'a dyn SessionFactory, credential: &'a CredentialRecord) -> Self {
        Self {
            sessions,
            credential,
        }
    }

    /// Fresh calendar session for this caller.
    pub async fn calendar(&self) -> Result<Arc<dyn CalendarService>, AgentifyError> {
        Ok(self.sessions.obtain_sessions(self.credential).await?.calendar)
    }

    /// Fresh mail session for this caller.
    pub async fn mail(&self) -> Result<Arc<dyn MailService>, AgentifyError> {
        Ok(self.sessions.obtain_sessions(self.credential).await?.mail)
    }
}
