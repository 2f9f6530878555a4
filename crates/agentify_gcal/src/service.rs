//! Google Calendar service implementation.
//!
//! This module provides an implementation of the CalendarService trait for Google Calendar.

use agentify_common::{
    authentication_error, provider_error, AgentifyError, BusyInterval, CalendarService,
    CreatedEvent, NewCalendarEvent,
};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use google_calendar3::api::{
    ConferenceData, CreateConferenceRequest, Event, EventAttendee, EventDateTime,
    FreeBusyRequest, FreeBusyRequestItem,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::auth::HubType;

const SERVICE_NAME: &str = "Google Calendar";

/// Maps a Calendar API error, surfacing 401s as authentication failures.
pub(crate) fn api_error(err: google_calendar3::Error) -> AgentifyError {
    let unauthorized = match &err {
        google_calendar3::Error::Failure(response) => response.status().as_u16() == 401,
        google_calendar3::Error::BadRequest(body) => {
            body.pointer("/error/code").and_then(|c| c.as_u64()) == Some(401)
        }
        _ => false,
    };
    if unauthorized {
        authentication_error(format!("Google rejected the credential: {}", err))
    } else {
        provider_error(SERVICE_NAME, err)
    }
}

/// Converts the provider-neutral event into the Calendar API body.
///
/// `attendees` stays `None` when the list is empty so the field is omitted
/// from the request entirely.
pub fn to_google_event(event: &NewCalendarEvent) -> Event {
    let attendees = if event.attendees.is_empty() {
        None
    } else {
        Some(
            event
                .attendees
                .iter()
                .map(|email| EventAttendee {
                    email: Some(email.clone()),
                    ..Default::default()
                })
                .collect(),
        )
    };

    Event {
        summary: Some(event.summary.clone()),
        description: event.description.clone(),
        start: Some(EventDateTime {
            date_time: Some(event.start),
            time_zone: Some(event.time_zone.clone()),
            ..Default::default()
        }),
        end: Some(EventDateTime {
            date_time: Some(event.end),
            time_zone: Some(event.time_zone.clone()),
            ..Default::default()
        }),
        attendees,
        conference_data: Some(ConferenceData {
            create_request: Some(CreateConferenceRequest {
                request_id: Some(event.conference_request_id.clone()),
                ..Default::default()
            }),
            ..Default::default()
        }),
        ..Default::default()
    }
}

/// Google Calendar service implementation.
pub struct GoogleCalendarService {
    calendar_hub: Arc<HubType>,
}

impl GoogleCalendarService {
    /// Create a new Google Calendar service.
    pub fn new(calendar_hub: Arc<HubType>) -> Self {
        Self { calendar_hub }
    }
}

#[async_trait]
impl CalendarService for GoogleCalendarService {
    async fn insert_event(
        &self,
        calendar_id: &str,
        event: NewCalendarEvent,
    ) -> Result<CreatedEvent, AgentifyError> {
        let body = to_google_event(&event);
        info!(
            "Inserting event '{}' with {} attendee(s)",
            event.summary,
            event.attendees.len()
        );

        let (_response, created) = self
            .calendar_hub
            .events()
            .insert(body, calendar_id)
            .send_updates("all")
            .conference_data_version(1)
            .doit()
            .await
            .map_err(api_error)?;

        debug!("Created event id={:?}", created.id);
        Ok(CreatedEvent {
            event_id: created.id,
            html_link: created.html_link,
        })
    }

    async fn busy_intervals(
        &self,
        calendar_id: &str,
        start: DateTime<Utc>,
        end: DateTime<Utc>,
        time_zone: &str,
    ) -> Result<Vec<BusyInterval>, AgentifyError> {
        let req = FreeBusyRequest {
            time_min: Some(start),
            time_max: Some(end),
            time_zone: Some(time_zone.to_string()),
            items: Some(vec![FreeBusyRequestItem {
                id: Some(calendar_id.to_string()),
                ..Default::default()
            }]),
            ..Default::default()
        };

        let (_response, freebusy_response) = self
            .calendar_hub
            .freebusy()
            .query(req)
            .doit()
            .await
            .map_err(api_error)?;

        let cal_info = freebusy_response
            .calendars
            .and_then(|mut calendars| calendars.remove(calendar_id))
            .ok_or_else(|| {
                provider_error(
                    SERVICE_NAME,
                    format!("free/busy response did not include calendar '{}'", calendar_id),
                )
            })?;

        if let Some(errors) = cal_info.errors.filter(|e| !e.is_empty()) {
            let reasons: Vec<String> = errors
                .into_iter()
                .filter_map(|e| e.reason)
                .collect();
            return Err(provider_error(
                SERVICE_NAME,
                format!("free/busy failed for '{}': {}", calendar_id, reasons.join(", ")),
            ));
        }

        let mut busy: Vec<BusyInterval> = Vec::new();
        for period in cal_info.busy.unwrap_or_default() {
            match (period.start, period.end) {
                (Some(start), Some(end)) => busy.push(BusyInterval { start, end }),
                _ => warn!("Skipping busy period with missing start/end: {:?}", period),
            }
        }
        busy.sort_by_key(|b| b.start);
        Ok(busy)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn sample_event(attendees: Vec<String>) -> NewCalendarEvent {
        NewCalendarEvent {
            summary: "Sync".to_string(),
            start: Utc.with_ymd_and_hms(2025, 7, 28, 9, 30, 0).unwrap(),
            end: Utc.with_ymd_and_hms(2025, 7, 28, 10, 0, 0).unwrap(),
            time_zone: "Asia/Kolkata".to_string(),
            description: None,
            attendees,
            conference_request_id: "req-1".to_string(),
        }
    }

    #[test]
    fn test_attendees_become_structured_participants() {
        let event = to_google_event(&sample_event(vec![
            "bob@x.com".to_string(),
            "carol@x.com".to_string(),
        ]));
        let emails: Vec<Option<String>> = event
            .attendees
            .expect("attendees present")
            .into_iter()
            .map(|a| a.email)
            .collect();
        assert_eq!(
            emails,
            vec![Some("bob@x.com".to_string()), Some("carol@x.com".to_string())]
        );
    }

    #[test]
    fn test_no_attendees_omits_field() {
        let event = to_google_event(&sample_event(vec![]));
        assert!(event.attendees.is_none());
        let json = serde_json::to_value(&event).expect("event serializes");
        assert!(json.get("attendees").map_or(true, |v| v.is_null()));
    }

    #[test]
    fn test_conference_request_and_zone_attached() {
        let event = to_google_event(&sample_event(vec![]));
        let request_id = event
            .conference_data
            .and_then(|c| c.create_request)
            .and_then(|r| r.request_id);
        assert_eq!(request_id.as_deref(), Some("req-1"));
        assert_eq!(
            event.start.and_then(|s| s.time_zone).as_deref(),
            Some("Asia/Kolkata")
        );
    }
}
