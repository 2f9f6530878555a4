//! Mail capability functions exposed to the assistant.

use agentify_common::{AgentifyError, CallerContext, MailService, MailSummary};
use serde::Deserialize;
use std::sync::Arc;
use tracing::{error, info};

use crate::message::OutgoingMail;

pub const DEFAULT_QUERY: &str = "is:unread in:inbox";
pub const DEFAULT_MAX_RESULTS: u32 = 5;
pub const MAX_RESULTS_LIMIT: u32 = 50;

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ComposeArgs {
    pub to: String,
    pub subject: String,
    pub body: String,
}

impl From<ComposeArgs> for OutgoingMail {
    fn from(args: ComposeArgs) -> Self {
        OutgoingMail::new(args.to, args.subject, args.body)
    }
}

#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct ListMailArgs {
    #[serde(default)]
    pub query: Option<String>,
    #[serde(default)]
    pub max_results: Option<i64>,
}

impl ListMailArgs {
    pub fn query(&self) -> &str {
        self.query
            .as_deref()
            .map(str::trim)
            .filter(|q| !q.is_empty())
            .unwrap_or(DEFAULT_QUERY)
    }

    pub fn max_results(&self) -> u32 {
        match self.max_results {
            Some(n) => n.clamp(1, MAX_RESULTS_LIMIT as i64) as u32,
            None => DEFAULT_MAX_RESULTS,
        }
    }
}

/// Encodes the message before touching the provider.
async fn compose(
    ctx: &CallerContext<'_>,
    args: ComposeArgs,
) -> Result<(Arc<dyn MailService>, String), AgentifyError> {
    let raw = OutgoingMail::from(args).encode_raw()?;
    let mail = ctx.mail().await?;
    Ok((mail, raw))
}

/// Sends a message immediately.
pub async fn send_mail(ctx: CallerContext<'_>, args: ComposeArgs) -> String {
    let result = match compose(&ctx, args).await {
        Ok((mail, raw)) => mail.send_message(raw).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(id) => format!("Email sent successfully! Message ID: {}", id),
        Err(e) => {
            error!("send_mail failed: {}", e);
            format!("An error occurred: {}", e)
        }
    }
}

/// Stores the message as an unsent draft.
pub async fn create_draft(ctx: CallerContext<'_>, args: ComposeArgs) -> String {
    let result = match compose(&ctx, args).await {
        Ok((mail, raw)) => mail.create_draft(raw).await,
        Err(e) => Err(e),
    };
    match result {
        Ok(id) => format!("Draft created successfully! Draft ID: {}", id),
        Err(e) => {
            error!("create_draft failed: {}", e);
            format!("An error occurred: {}", e)
        }
    }
}

fn summary_line(summary: &MailSummary) -> String {
    format!(
        "ID: {}, From: {}, Subject: '{}', Snippet: {}",
        summary.id,
        summary.from.as_deref().unwrap_or("(unknown sender)"),
        summary.subject.as_deref().unwrap_or("(no subject)"),
        summary.snippet
    )
}

async fn fetch_summaries(
    ctx: &CallerContext<'_>,
    args: &ListMailArgs,
) -> Result<Vec<MailSummary>, AgentifyError> {
    let mail = ctx.mail().await?;
    let ids = mail
        .list_message_ids(args.query(), args.max_results())
        .await?;
    let mut summaries = Vec::with_capacity(ids.len());
    for id in ids {
        summaries.push(mail.message_summary(&id).await?);
    }
    Ok(summaries)
}

/// Lists matching messages, one summary line each.
pub async fn list_mail(ctx: CallerContext<'_>, args: ListMailArgs) -> String {
    match fetch_summaries(&ctx, &args).await {
        Ok(summaries) if summaries.is_empty() => "No emails found matching the query.".to_string(),
        Ok(summaries) => {
            info!("Listed {} message(s)", summaries.len());
            summaries
                .iter()
                .map(summary_line)
                .collect::<Vec<_>>()
                .join("\n")
        }
        Err(e) => {
            error!("list_mail failed: {}", e);
            format!("An error occurred: {}", e)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use agentify_common::{
        provider_error, CredentialRecord, MockCalendarService, MockMailService,
        MockSessionFactory, Sessions,
    };

    fn factory_with(mail: MockMailService) -> MockSessionFactory {
        let sessions = Sessions {
            mail: Arc::new(mail),
            calendar: Arc::new(MockCalendarService::new()),
        };
        let mut factory = MockSessionFactory::new();
        factory
            .expect_obtain_sessions()
            .returning(move |_| Ok(sessions.clone()));
        factory
    }

    fn compose_args(to: &str) -> ComposeArgs {
        ComposeArgs {
            to: to.to_string(),
            subject: "Agenda".to_string(),
            body: "See attached.".to_string(),
        }
    }

    #[test]
    fn test_list_defaults_and_clamping() {
        let args = ListMailArgs {
            query: None,
            max_results: None,
        };
        assert_eq!(args.query(), "is:unread in:inbox");
        assert_eq!(args.max_results(), 5);

        let args = ListMailArgs {
            query: Some("  ".to_string()),
            max_results: Some(500),
        };
        assert_eq!(args.query(), DEFAULT_QUERY);
        assert_eq!(args.max_results(), 50);

        let args = ListMailArgs {
            query: Some("from:bob".to_string()),
            max_results: Some(-3),
        };
        assert_eq!(args.query(), "from:bob");
        assert_eq!(args.max_results(), 1);
    }

    #[tokio::test]
    async fn test_send_mail_reports_id() {
        let mut mail = MockMailService::new();
        mail.expect_send_message()
            .withf(|raw| !raw.is_empty())
            .times(1)
            .returning(|_| Ok("18c0ffee".to_string()));
        let factory = factory_with(mail);
        let credential = CredentialRecord::default();

        let text = send_mail(
            CallerContext::new(&factory, &credential),
            compose_args("alice@x.com"),
        )
        .await;
        assert_eq!(text, "Email sent successfully! Message ID: 18c0ffee");
    }

    #[tokio::test]
    async fn test_draft_failure_becomes_text() {
        let mut mail = MockMailService::new();
        mail.expect_create_draft()
            .returning(|_| Err(provider_error("Gmail", "Insufficient Permission")));
        let factory = factory_with(mail);
        let credential = CredentialRecord::default();

        let text = create_draft(
            CallerContext::new(&factory, &credential),
            compose_args("alice@x.com"),
        )
        .await;
        assert_eq!(
            text,
            "An error occurred: Gmail error: Insufficient Permission"
        );
    }

    #[tokio::test]
    async fn test_invalid_header_never_reaches_provider() {
        let mut mail = MockMailService::new();
        mail.expect_send_message().never();
        let factory = factory_with(mail);
        let credential = CredentialRecord::default();

        let text = send_mail(
            CallerContext::new(&factory, &credential),
            compose_args("alice@x.com\nBcc: eve@x.com"),
        )
        .await;
        assert!(text.starts_with("An error occurred:"));
    }

    #[tokio::test]
    async fn test_list_mail_formats_summaries() {
        let mut mail = MockMailService::new();
        mail.expect_list_message_ids()
            .withf(|query, max| query == "is:unread in:inbox" && *max == 5)
            .returning(|_, _| Ok(vec!["a".to_string(), "b".to_string()]));
        mail.expect_message_summary().returning(|id| {
            Ok(if id == "a" {
                MailSummary {
                    id: "a".to_string(),
                    from: Some("Bob <bob@x.com>".to_string()),
                    subject: Some("Lunch".to_string()),
                    snippet: "noon?".to_string(),
                }
            } else {
                MailSummary {
                    id: id.to_string(),
                    from: None,
                    subject: None,
                    snippet: String::new(),
                }
            })
        });
        let factory = factory_with(mail);
        let credential = CredentialRecord::default();

        let text = list_mail(
            CallerContext::new(&factory, &credential),
            ListMailArgs {
                query: None,
                max_results: None,
            },
        )
        .await;
        assert_eq!(
            text,
            "ID: a, From: Bob <bob@x.com>, Subject: 'Lunch', Snippet: noon?\n\
             ID: b, From: (unknown sender), Subject: '(no subject)', Snippet: "
        );
    }

    #[tokio::test]
    async fn test_list_mail_empty() {
        let mut mail = MockMailService::new();
        mail.expect_list_message_ids().returning(|_, _| Ok(vec![]));
        let factory = factory_with(mail);
        let credential = CredentialRecord::default();

        let text = list_mail(
            CallerContext::new(&factory, &credential),
            ListMailArgs {
                query: Some("from:nobody".to_string()),
                max_results: Some(3),
            },
        )
        .await;
        assert_eq!(text, "No emails found matching the query.");
    }
}
