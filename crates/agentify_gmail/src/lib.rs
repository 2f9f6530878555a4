pub mod client;
pub mod logic;
pub mod message;

pub use client::GmailClient;
pub use logic::{create_draft, list_mail, send_mail, ComposeArgs, ListMailArgs};
pub use message::OutgoingMail;
