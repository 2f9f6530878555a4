//! Tool catalog and per-request tool execution.

use agentify_common::{CallerContext, CredentialRecord, SessionFactory};
use agentify_gcal::{CalendarSettings, CreateEventArgs, FindFreeSlotsArgs, MAX_SLOT_MINUTES};
use agentify_gmail::{ComposeArgs, ListMailArgs};
use chrono::NaiveDate;
use serde::de::DeserializeOwned;
use serde_json::json;
use std::sync::Arc;
use tracing::{info, warn};
use uuid::Uuid;

use crate::types::{ToolCall, ToolDefinition};

pub const SCHEDULE_CALENDAR_EVENT: &str = "schedule_calendar_event";
pub const FIND_FREE_TIME_SLOTS: &str = "find_free_time_slots";
pub const SEND_EMAIL: &str = "send_email";
pub const CREATE_EMAIL_DRAFT: &str = "create_email_draft";
pub const LIST_EMAILS: &str = "list_emails";

/// The five capabilities offered to the model.
pub fn catalog() -> Vec<ToolDefinition> {
    let compose = json!({
        "type": "object",
        "properties": {
            "to": { "type": "string", "description": "Recipient e-mail address." },
            "subject": { "type": "string" },
            "body": { "type": "string", "description": "Plain-text body." }
        },
        "required": ["to", "subject", "body"],
        "additionalProperties": false
    });

    vec![
        ToolDefinition {
            name: SCHEDULE_CALENDAR_EVENT,
            description: "Schedules an event on Google Calendar and optionally invites attendees. \
                          Returns a confirmation message with the event link.",
            parameters: json!({
                "type": "object",
                "properties": {
                    "title": { "type": "string", "description": "The title of the event." },
                    "start_time": {
                        "type": "string",
                        "description": "The start time in ISO 8601 format (e.g., '2025-07-27T10:00:00')."
                    },
                    "end_time": {
                        "type": "string",
                        "description": "The end time in ISO 8601 format (e.g., '2025-07-27T11:00:00')."
                    },
                    "attendees": {
                        "type": "array",
                        "items": { "type": "string" },
                        "description": "Attendee e-mail addresses."
                    },
                    "description": { "type": "string", "description": "A description for the event." }
                },
                "required": ["title", "start_time", "end_time"],
                "additionalProperties": false
            }),
        },
        ToolDefinition {
            name: FIND_FREE_TIME_SLOTS,
            description: "Reports the busy intervals of a given day in the primary calendar so a \
                          free slot of the requested duration can be proposed.",
            parameters: json!({
                "type": "object",
                "properties": {
                    "duration_minutes": {
                        "type": "integer",
                        "minimum": 1,
                        "maximum": MAX_SLOT_MINUTES,
                        "description": "The desired duration of the meeting in minutes."
                    },
                    "day": {
                        "type": "string",
                        "description": "'today', 'tomorrow', or a date like '2025-07-28'."
                    }
                },
                "required": ["duration_minutes", "day"],
                "additionalProperties": false
            }),
        },
        ToolDefinition {
            name: SEND_EMAIL,
            description: "Sends an email to a recipient.",
            parameters: compose.clone(),
        },
        ToolDefinition {
            name: CREATE_EMAIL_DRAFT,
            description: "Creates a draft email in the Gmail account.",
            parameters: compose,
        },
        ToolDefinition {
            name: LIST_EMAILS,
            description: "Lists emails from the Gmail inbox based on a search query.",
            parameters: json!({
                "type": "object",
                "properties": {
                    "query": {
                        "type": "string",
                        "description": "Gmail search query. Defaults to 'is:unread in:inbox'."
                    },
                    "max_results": {
                        "type": "integer",
                        "description": "Maximum number of messages. Defaults to 5."
                    }
                },
                "additionalProperties": false
            }),
        },
    ]
}

fn parse_args<T: DeserializeOwned>(call: &ToolCall) -> Result<T, String> {
    let raw = call.arguments.trim();
    let raw = if raw.is_empty() { "{}" } else { raw };
    serde_json::from_str(raw).map_err(|e| {
        warn!("Rejected arguments for {}: {}", call.name, e);
        format!(
            "An error occurred: invalid arguments for {}: {}",
            call.name, e
        )
    })
}

/// Executes tool calls for exactly one caller.
///
/// Built per request and dropped with it. The credential lives here and is
/// handed to every capability through [`CallerContext`].
pub struct Toolbox {
    sessions: Arc<dyn SessionFactory>,
    credential: CredentialRecord,
    settings: CalendarSettings,
    today: NaiveDate,
}

impl Toolbox {
    pub fn new(
        sessions: Arc<dyn SessionFactory>,
        credential: CredentialRecord,
        settings: CalendarSettings,
        today: NaiveDate,
    ) -> Self {
        Self {
            sessions,
            credential,
            settings,
            today,
        }
    }

    fn context(&self) -> CallerContext<'_> {
        CallerContext::new(self.sessions.as_ref(), &self.credential)
    }

    /// Runs one tool call and returns the text the model will observe.
    ///
    /// Never fails: unknown tools and malformed arguments come back as text
    /// containing "error".
    pub async fn invoke(&self, call: &ToolCall) -> String {
        info!("Invoking tool {} ({})", call.name, call.id);
        match call.name.as_str() {
            SCHEDULE_CALENDAR_EVENT => match parse_args::<CreateEventArgs>(call) {
                Ok(args) => {
                    agentify_gcal::create_event(
                        self.context(),
                        &self.settings,
                        args,
                        Uuid::new_v4().to_string(),
                    )
                    .await
                }
                Err(e) => e,
            },
            FIND_FREE_TIME_SLOTS => match parse_args::<FindFreeSlotsArgs>(call) {
                Ok(args) => {
                    agentify_gcal::find_free_slots(
                        self.context(),
                        &self.settings,
                        self.today,
                        args,
                    )
                    .await
                }
                Err(e) => e,
            },
            SEND_EMAIL => match parse_args::<ComposeArgs>(call) {
                Ok(args) => agentify_gmail::send_mail(self.context(), args).await,
                Err(e) => e,
            },
            CREATE_EMAIL_DRAFT => match parse_args::<ComposeArgs>(call) {
                Ok(args) => agentify_gmail::create_draft(self.context(), args).await,
                Err(e) => e,
            },
            LIST_EMAILS => match parse_args::<ListMailArgs>(call) {
                Ok(args) => agentify_gmail::list_mail(self.context(), args).await,
                Err(e) => e,
            },
            other => {
                warn!("Model requested unknown tool {}", other);
                format!("An error occurred: unknown tool '{}'", other)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentify_common::{
        CreatedEvent, MockCalendarService, MockMailService, MockSessionFactory, Sessions,
    };
    use chrono::NaiveTime;

    fn settings() -> CalendarSettings {
        CalendarSettings {
            time_zone: chrono_tz::Asia::Kolkata,
            calendar_id: "primary".to_string(),
            work_start: NaiveTime::from_hms_opt(9, 0, 0).unwrap(),
            work_end: NaiveTime::from_hms_opt(18, 0, 0).unwrap(),
        }
    }

    fn toolbox(calendar: MockCalendarService, mail: MockMailService) -> Toolbox {
        let sessions = Sessions {
            mail: Arc::new(mail),
            calendar: Arc::new(calendar),
        };
        let mut factory = MockSessionFactory::new();
        factory
            .expect_obtain_sessions()
            .withf(|credential| credential.access_token.as_deref() == Some("ya29.caller"))
            .returning(move |_| Ok(sessions.clone()));
        Toolbox::new(
            Arc::new(factory),
            CredentialRecord {
                access_token: Some("ya29.caller".to_string()),
                ..Default::default()
            },
            settings(),
            NaiveDate::from_ymd_opt(2025, 7, 27).unwrap(),
        )
    }

    fn call(name: &str, arguments: &str) -> ToolCall {
        ToolCall {
            id: "call_1".to_string(),
            name: name.to_string(),
            arguments: arguments.to_string(),
        }
    }

    #[test]
    fn test_catalog_names_are_unique_and_complete() {
        let names: Vec<&str> = catalog().iter().map(|t| t.name).collect();
        assert_eq!(
            names,
            vec![
                SCHEDULE_CALENDAR_EVENT,
                FIND_FREE_TIME_SLOTS,
                SEND_EMAIL,
                CREATE_EMAIL_DRAFT,
                LIST_EMAILS
            ]
        );
        for tool in catalog() {
            assert_eq!(tool.parameters["type"], "object");
        }
    }

    #[tokio::test]
    async fn test_unknown_tool_is_text_error() {
        let toolbox = toolbox(MockCalendarService::new(), MockMailService::new());
        let out = toolbox.invoke(&call("delete_everything", "{}")).await;
        assert!(out.contains("error"));
        assert!(out.contains("delete_everything"));
    }

    #[tokio::test]
    async fn test_bad_arguments_never_reach_provider() {
        let mut calendar = MockCalendarService::new();
        calendar.expect_busy_intervals().never();
        let toolbox = toolbox(calendar, MockMailService::new());

        let out = toolbox
            .invoke(&call(FIND_FREE_TIME_SLOTS, r#"{"duration_minutes":"soon","day":"today"}"#))
            .await;
        assert!(out.contains("error"));

        let out = toolbox.invoke(&call(FIND_FREE_TIME_SLOTS, "not json")).await;
        assert!(out.contains("error"));
    }

    #[tokio::test]
    async fn test_schedule_uses_fresh_conference_ids() {
        let mut calendar = MockCalendarService::new();
        calendar
            .expect_insert_event()
            .withf(|_, event| Uuid::parse_str(&event.conference_request_id).is_ok())
            .times(2)
            .returning(|_, _| {
                Ok(CreatedEvent {
                    event_id: Some("e".to_string()),
                    html_link: Some("https://calendar.google.com/e".to_string()),
                })
            });
        let toolbox = toolbox(calendar, MockMailService::new());
        let args = r#"{"title":"Sync","start_time":"2025-07-28T15:00:00","end_time":"2025-07-28T15:30:00","attendees":["bob@x.com"]}"#;

        for _ in 0..2 {
            let out = toolbox.invoke(&call(SCHEDULE_CALENDAR_EVENT, args)).await;
            assert!(out.starts_with("Event created successfully!"));
        }
    }

    #[tokio::test]
    async fn test_list_emails_accepts_empty_arguments() {
        let mut mail = MockMailService::new();
        mail.expect_list_message_ids()
            .withf(|query, max| query == "is:unread in:inbox" && *max == 5)
            .returning(|_, _| Ok(vec![]));
        let toolbox = toolbox(MockCalendarService::new(), mail);

        let out = toolbox.invoke(&call(LIST_EMAILS, "")).await;
        assert_eq!(out, "No emails found matching the query.");
    }
}
