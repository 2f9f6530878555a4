// Declare modules within this crate
pub mod auth;
pub mod logic;
pub mod service;

pub use auth::{create_calendar_hub, HubType};
pub use logic::{
    create_event, find_free_slots, CalendarSettings, CreateEventArgs, FindFreeSlotsArgs,
    MAX_SLOT_MINUTES,
};
pub use service::GoogleCalendarService;
