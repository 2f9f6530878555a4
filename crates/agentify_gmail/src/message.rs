//! RFC 2822 message building and Gmail transport encoding.

use agentify_common::{validation_error, AgentifyError};
use base64::{
    engine::general_purpose::{STANDARD, URL_SAFE},
    Engine as _,
};

/// A plain-text outbound message.
#[derive(Debug, Clone, PartialEq)]
pub struct OutgoingMail {
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl OutgoingMail {
    pub fn new(to: impl Into<String>, subject: impl Into<String>, body: impl Into<String>) -> Self {
        Self {
            to: to.into(),
            subject: subject.into(),
            body: body.into(),
        }
    }

    /// Renders the message as RFC 2822 text with CRLF line endings.
    pub fn to_rfc2822(&self) -> Result<String, AgentifyError> {
        let to = header_value("To", &self.to)?;
        if to.is_empty() {
            return Err(validation_error("recipient must not be empty"));
        }
        let subject = header_value("Subject", &self.subject)?;

        let body = self.body.replace("\r\n", "\n").replace('\n', "\r\n");
        let lines = [
            format!("To: {}", to),
            format!("Subject: {}", encode_header_word(subject)),
            "MIME-Version: 1.0".to_string(),
            "Content-Type: text/plain; charset=\"UTF-8\"".to_string(),
            "Content-Transfer-Encoding: 8bit".to_string(),
            String::new(),
            body,
        ];
        Ok(lines.join("\r\n"))
    }

    /// The base64url form Gmail expects in `raw`.
    pub fn encode_raw(&self) -> Result<String, AgentifyError> {
        Ok(URL_SAFE.encode(self.to_rfc2822()?.as_bytes()))
    }
}

fn header_value<'a>(name: &str, value: &'a str) -> Result<&'a str, AgentifyError> {
    if value.contains(['\r', '\n']) {
        return Err(validation_error(format!(
            "{} header must not contain line breaks",
            name
        )));
    }
    Ok(value.trim())
}

/// RFC 2047 `B` encoding for non-ASCII header text.
fn encode_header_word(value: &str) -> String {
    if value.is_ascii() {
        value.to_string()
    } else {
        format!("=?UTF-8?B?{}?=", STANDARD.encode(value.as_bytes()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn decode(raw: &str) -> String {
        let bytes = URL_SAFE.decode(raw).expect("valid base64url");
        String::from_utf8(bytes).expect("utf-8 message")
    }

    #[test]
    fn test_plain_message_headers_and_body() {
        let mail = OutgoingMail::new("alice@x.com", "Hello", "line one\nline two");
        let text = decode(&mail.encode_raw().unwrap());

        assert!(text.starts_with("To: alice@x.com\r\nSubject: Hello\r\n"));
        assert!(text.contains("Content-Type: text/plain; charset=\"UTF-8\"\r\n"));
        assert!(text.ends_with("\r\n\r\nline one\r\nline two"));
    }

    #[test]
    fn test_non_ascii_subject_is_encoded_word() {
        let mail = OutgoingMail::new("alice@x.com", "Grüße", "hi");
        let text = mail.to_rfc2822().unwrap();
        let expected = format!("Subject: =?UTF-8?B?{}?=", STANDARD.encode("Grüße"));
        assert!(text.contains(&expected));
    }

    #[test]
    fn test_header_injection_rejected() {
        let mail = OutgoingMail::new("alice@x.com\r\nBcc: eve@x.com", "Hi", "body");
        assert!(matches!(
            mail.encode_raw(),
            Err(AgentifyError::Validation(_))
        ));

        let mail = OutgoingMail::new("alice@x.com", "Hi\nthere", "body");
        assert!(mail.encode_raw().is_err());
    }

    #[test]
    fn test_empty_recipient_rejected() {
        let mail = OutgoingMail::new("  ", "Hi", "body");
        assert!(mail.to_rfc2822().is_err());
    }

    #[test]
    fn test_transport_encoding_is_url_safe() {
        let mail = OutgoingMail::new("alice@x.com", "??>>", "~~~???>>>");
        let raw = mail.encode_raw().unwrap();
        assert!(!raw.contains('+') && !raw.contains('/'));
    }
}
