//! Calendar capability functions exposed to the assistant.
//!
//! Both functions always return text. Validation problems and provider
//! failures are rendered into the string the model reads; nothing is
//! propagated as an error.

use agentify_common::{
    validation_error, AgentifyError, BusyInterval, CalendarService, CallerContext,
    NewCalendarEvent,
};
use agentify_config::GoogleConfig;
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc};
use chrono_tz::Tz;
use serde::Deserialize;
use tracing::{error, info};

pub const INVALID_DAY_FORMAT: &str =
    "Invalid day format. Please use 'today', 'tomorrow', or 'YYYY-MM-DD'.";

/// Calendar-side settings shared by every request.
#[derive(Debug, Clone)]
pub struct CalendarSettings {
    pub time_zone: Tz,
    pub calendar_id: String,
    pub work_start: NaiveTime,
    pub work_end: NaiveTime,
}

impl CalendarSettings {
    pub fn from_config(config: &GoogleConfig) -> Result<Self, AgentifyError> {
        let time_zone = config
            .zone()
            .map_err(|e| AgentifyError::Config(e.to_string()))?;
        let (work_start, work_end) = config
            .work_window()
            .map_err(|e| AgentifyError::Config(e.to_string()))?;
        Ok(Self {
            time_zone,
            calendar_id: config.calendar_id.clone(),
            work_start,
            work_end,
        })
    }

    /// Today's date in the configured zone.
    pub fn today(&self) -> NaiveDate {
        Utc::now().with_timezone(&self.time_zone).date_naive()
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CreateEventArgs {
    pub title: String,
    /// ISO 8601, with or without offset.
    pub start_time: String,
    pub end_time: String,
    #[serde(default)]
    pub attendees: Option<Vec<String>>,
    #[serde(default)]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FindFreeSlotsArgs {
    pub duration_minutes: i64,
    pub day: String,
}

/// Parses an event timestamp. Naive values are local to `tz`.
pub fn parse_event_time(raw: &str, tz: &Tz) -> Result<DateTime<Utc>, AgentifyError> {
    let raw = raw.trim();
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Ok(dt.with_timezone(&Utc));
    }
    let naive = ["%Y-%m-%dT%H:%M:%S%.f", "%Y-%m-%dT%H:%M", "%Y-%m-%d %H:%M:%S", "%Y-%m-%d %H:%M"]
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .ok_or_else(|| {
            validation_error(format!(
                "'{}' is not an ISO 8601 date-time (e.g. 2025-07-27T10:00:00)",
                raw
            ))
        })?;
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or_else(|| validation_error(format!("'{}' does not exist in {}", raw, tz.name())))
}

/// Validates the model's arguments and builds the provider-neutral event.
pub fn build_event(
    args: &CreateEventArgs,
    settings: &CalendarSettings,
    conference_request_id: String,
) -> Result<NewCalendarEvent, AgentifyError> {
    if args.title.trim().is_empty() {
        return Err(validation_error("title must not be empty"));
    }
    let start = parse_event_time(&args.start_time, &settings.time_zone)?;
    let end = parse_event_time(&args.end_time, &settings.time_zone)?;
    if end <= start {
        return Err(validation_error("end_time must be after start_time"));
    }

    let attendees: Vec<String> = args
        .attendees
        .iter()
        .flatten()
        .map(|a| a.trim().to_string())
        .filter(|a| !a.is_empty())
        .collect();
    if let Some(bad) = attendees.iter().find(|a| !a.contains('@')) {
        return Err(validation_error(format!(
            "attendee '{}' is not an e-mail address",
            bad
        )));
    }

    Ok(NewCalendarEvent {
        summary: args.title.trim().to_string(),
        start,
        end,
        time_zone: settings.time_zone.name().to_string(),
        description: args.description.clone().filter(|d| !d.trim().is_empty()),
        attendees,
        conference_request_id,
    })
}

/// Resolves `today`, `tomorrow` or `YYYY-MM-DD`. Anything else is `None`.
pub fn resolve_day(day: &str, today: NaiveDate) -> Option<NaiveDate> {
    let day = day.trim();
    if day.eq_ignore_ascii_case("today") {
        Some(today)
    } else if day.eq_ignore_ascii_case("tomorrow") {
        today.succ_opt()
    } else {
        NaiveDate::parse_from_str(day, "%Y-%m-%d").ok()
    }
}

/// UTC bounds of the working window on `date` in the configured zone.
pub fn working_window(
    date: NaiveDate,
    settings: &CalendarSettings,
) -> Result<(DateTime<Utc>, DateTime<Utc>), AgentifyError> {
    let local = |time: NaiveTime| {
        settings
            .time_zone
            .from_local_datetime(&date.and_time(time))
            .earliest()
            .map(|dt| dt.with_timezone(&Utc))
            .ok_or_else(|| {
                validation_error(format!(
                    "{} {} does not exist in {}",
                    date,
                    time,
                    settings.time_zone.name()
                ))
            })
    };
    Ok((local(settings.work_start)?, local(settings.work_end)?))
}

fn format_busy(busy: &[BusyInterval], tz: &Tz) -> String {
    busy.iter()
        .map(|b| {
            format!(
                "{}-{}",
                b.start.with_timezone(tz).format("%H:%M"),
                b.end.with_timezone(tz).format("%H:%M")
            )
        })
        .collect::<Vec<_>>()
        .join(", ")
}

/// Inserts the event with attendees notified and a conference link requested.
pub async fn create_event(
    ctx: CallerContext<'_>,
    settings: &CalendarSettings,
    args: CreateEventArgs,
    conference_request_id: String,
) -> String {
    let event = match build_event(&args, settings, conference_request_id) {
        Ok(event) => event,
        Err(e) => return format!("An error occurred: {}", e),
    };
    let calendar = match ctx.calendar().await {
        Ok(calendar) => calendar,
        Err(e) => return format!("An error occurred: {}", e),
    };
    insert_event(calendar.as_ref(), settings, event).await
}

async fn insert_event(
    calendar: &dyn CalendarService,
    settings: &CalendarSettings,
    event: NewCalendarEvent,
) -> String {
    match calendar.insert_event(&settings.calendar_id, event).await {
        Ok(created) => {
            info!("Event created: {:?}", created.event_id);
            format!(
                "Event created successfully! I have sent an invitation to all attendees. View it here: {}",
                created.html_link.unwrap_or_else(|| "(no link returned)".to_string())
            )
        }
        Err(e) => {
            error!("Event insert failed: {}", e);
            format!("An error occurred: {}", e)
        }
    }
}

/// Longest slot worth searching for: one day.
pub const MAX_SLOT_MINUTES: i64 = 24 * 60;

/// Reports the busy intervals of the working window on the requested day.
///
/// Choosing a slot is left to the model.
pub async fn find_free_slots(
    ctx: CallerContext<'_>,
    settings: &CalendarSettings,
    today: NaiveDate,
    args: FindFreeSlotsArgs,
) -> String {
    let Some(date) = resolve_day(&args.day, today) else {
        return INVALID_DAY_FORMAT.to_string();
    };
    if args.duration_minutes <= 0 {
        return format!(
            "An error occurred: {}",
            validation_error("duration_minutes must be positive")
        );
    }
    if args.duration_minutes > MAX_SLOT_MINUTES {
        return format!(
            "An error occurred: {}",
            validation_error(format!("duration_minutes must be at most {}", MAX_SLOT_MINUTES))
        );
    }
    let (start, end) = match working_window(date, settings) {
        Ok(window) => window,
        Err(e) => return format!("An error occurred while checking free time: {}", e),
    };
    let calendar = match ctx.calendar().await {
        Ok(calendar) => calendar,
        Err(e) => return format!("An error occurred while checking free time: {}", e),
    };

    match calendar
        .busy_intervals(&settings.calendar_id, start, end, settings.time_zone.name())
        .await
    {
        Ok(busy) if busy.is_empty() => format!(
            "The entire day ({} from {} to {}) is free.",
            date,
            settings.work_start.format("%H:%M"),
            settings.work_end.format("%H:%M")
        ),
        Ok(busy) => format!(
            "Here are the busy slots for {} ({}): {}. Find a gap of {} minutes between {} and {} and propose it to the user.",
            date,
            settings.time_zone.name(),
            format_busy(&busy, &settings.time_zone),
            args.duration_minutes,
            settings.work_start.format("%H:%M"),
            settings.work_end.format("%H:%M")
        ),
        Err(e) => {
            error!("Free/busy query failed: {}", e);
            format!("An error occurred while checking free time: {}", e)
        }
    }
}
