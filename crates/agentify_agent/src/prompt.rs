use chrono::NaiveDate;

use crate::tools::{FIND_FREE_TIME_SLOTS, SCHEDULE_CALENDAR_EVENT};

/// System instruction carrying the scheduling decision rule.
pub fn system_prompt(today: NaiveDate) -> String {
    format!(
        "You are a powerful assistant. The current date is {date}. \
         When asked to schedule a meeting, your primary goal is to get it on the calendar with all correct details. \
         Follow this logic: \
         1. **Analyze the Request:** Does the user provide a specific time (e.g., 'at 11 am')? \
         2. **If a time IS provided:** Do NOT use the `{find}` tool. Directly use the `{schedule}` tool. \
         Make sure to include the title, time, and any attendees mentioned. \
         3. **If a time IS NOT provided:** THEN use the `{find}` tool to find available slots and propose them to the user. \
         4. **Memory:** Remember all details from the user's original request (like attendee names and emails) \
         throughout the conversation, even if you have to ask for clarification on the time. \
         5. **Confirmation:** After scheduling, confirm with the user that the event has been created and that invitations have been sent.",
        date = today.format("%B %d, %Y"),
        find = FIND_FREE_TIME_SLOTS,
        schedule = SCHEDULE_CALENDAR_EVENT,
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_prompt_names_date_and_tools() {
        let prompt = system_prompt(NaiveDate::from_ymd_opt(2025, 7, 5).unwrap());
        assert!(prompt.contains("The current date is July 05, 2025."));
        assert!(prompt.contains("Do NOT use the `find_free_time_slots` tool"));
        assert!(prompt.contains("Directly use the `schedule_calendar_event` tool"));
    }
}
