// Declare modules within this crate
pub mod credential; // Caller-supplied OAuth credentials and refresh
pub mod error; // Error handling
pub mod http; // HTTP utilities
pub mod logging; // Logging utilities
pub mod services; // Provider abstractions

// Re-export error types and utilities for easier access
pub use error::{
    authentication_error, dispatch_error, provider_error, validation_error, AgentifyError,
    Context, HttpStatusCode,
};

pub use credential::CredentialRecord;

pub use http::{
    client::create_client,
    IntoHttpResponse,
};

pub use logging::{init, init_with_level, log_error, log_result};

pub use services::{
    BusyInterval, CalendarService, CallerContext, CreatedEvent, MailService, MailSummary, NewCalendarEvent,
    SessionFactory, Sessions,
};

#[cfg(any(test, feature = "mocks"))]
pub use services::{MockCalendarService, MockMailService, MockSessionFactory};
