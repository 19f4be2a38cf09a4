/// Notification emails
///
/// Each user-facing event that warrants an email has a variant of
/// [`Notification`]. [`Notifier::notify`] renders it and queues the result in
/// the outbox; the worker delivers it later.
///
/// Queueing is best effort: a failure is logged and swallowed so it never
/// fails the request that triggered it.
///
/// # Example
///
/// ```no_run
/// use agora_shared::notifications::{Notification, Notifier};
/// use sqlx::PgPool;
///
/// # async fn example(pool: PgPool) {
/// let notifier = Notifier::new(pool, "https://agora.example.com");
/// notifier
///     .notify(Notification::MembershipAccepted {
///         to: "ana@example.com".to_string(),
///         page_name: "Riverside FC".to_string(),
///         page_slug: "riverside-fc".to_string(),
///     })
///     .await;
/// # }
/// ```

use sqlx::PgPool;
use tracing::{debug, error};

use crate::models::outbox::{NewEmail, OutboxEmail};

/// Events that send an email
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    /// To a listing owner: someone sent an inquiry
    InquiryReceived {
        to: String,
        sender_name: String,
        listing_name: String,
        subject: String,
    },

    /// To the inquiry sender: the owner accepted and a conversation is open
    InquiryAccepted {
        to: String,
        listing_name: String,
        conversation_id: uuid::Uuid,
    },

    /// To the inquiry sender: the owner declined
    InquiryRejected { to: String, listing_name: String },

    /// To the requester: a page admin accepted the membership request
    MembershipAccepted {
        to: String,
        page_name: String,
        page_slug: String,
    },

    /// To the page owner: a new contribution awaits review
    ContributionReceived {
        to: String,
        page_name: String,
        amount_cents: i64,
        currency: String,
        contributor_name: Option<String>,
    },
}

impl Notification {
    /// Stable template name, used in logs
    pub fn template(&self) -> &'static str {
        match self {
            Notification::InquiryReceived { .. } => "inquiry_received",
            Notification::InquiryAccepted { .. } => "inquiry_accepted",
            Notification::InquiryRejected { .. } => "inquiry_rejected",
            Notification::MembershipAccepted { .. } => "membership_accepted",
            Notification::ContributionReceived { .. } => "contribution_received",
        }
    }

    /// Renders subject and bodies; links are built from `base_url`
    pub fn render(&self, base_url: &str) -> NewEmail {
        let base_url = base_url.trim_end_matches('/');

        let (to, subject, lines, link) = match self {
            Notification::InquiryReceived {
                to,
                sender_name,
                listing_name,
                subject,
            } => (
                to,
                format!("New inquiry about {}", listing_name),
                vec![
                    format!("{} sent you an inquiry about {}.", sender_name, listing_name),
                    format!("Subject: {}", subject),
                ],
                format!("{}/inquiries", base_url),
            ),
            Notification::InquiryAccepted {
                to,
                listing_name,
                conversation_id,
            } => (
                to,
                format!("{} accepted your inquiry", listing_name),
                vec![format!(
                    "Your inquiry about {} was accepted. You can now continue the conversation.",
                    listing_name
                )],
                format!("{}/messages/{}", base_url, conversation_id),
            ),
            Notification::InquiryRejected { to, listing_name } => (
                to,
                format!("Update on your inquiry about {}", listing_name),
                vec![format!(
                    "Your inquiry about {} was declined by the owner.",
                    listing_name
                )],
                format!("{}/inquiries?box=sent", base_url),
            ),
            Notification::MembershipAccepted {
                to,
                page_name,
                page_slug,
            } => (
                to,
                format!("Welcome to {}", page_name),
                vec![format!("Your request to join {} was accepted.", page_name)],
                format!("{}/pages/{}", base_url, page_slug),
            ),
            Notification::ContributionReceived {
                to,
                page_name,
                amount_cents,
                currency,
                contributor_name,
            } => (
                to,
                format!("New contribution to {}", page_name),
                vec![format!(
                    "{} contributed {} to {}. Review it to add it to the page total.",
                    contributor_name.as_deref().unwrap_or("An anonymous supporter"),
                    format_amount(*amount_cents, currency),
                    page_name
                )],
                format!("{}/contributions", base_url),
            ),
        };

        let text_body = format!("{}\n\n{}\n", lines.join("\n"), link);
        let html_body = format!(
            "{}<p><a href=\"{}\">{}</a></p>",
            lines
                .iter()
                .map(|line| format!("<p>{}</p>", escape_html(line)))
                .collect::<String>(),
            escape_html(&link),
            escape_html(&link)
        );

        NewEmail {
            recipient: to.clone(),
            subject,
            text_body,
            html_body: Some(html_body),
        }
    }

    fn recipient(&self) -> &str {
        match self {
            Notification::InquiryReceived { to, .. }
            | Notification::InquiryAccepted { to, .. }
            | Notification::InquiryRejected { to, .. }
            | Notification::MembershipAccepted { to, .. }
            | Notification::ContributionReceived { to, .. } => to,
        }
    }
}

/// Formats minor units as `12.50 EUR`
pub fn format_amount(amount_cents: i64, currency: &str) -> String {
    let sign = if amount_cents < 0 { "-" } else { "" };
    let abs = amount_cents.unsigned_abs();
    format!("{}{}.{:02} {}", sign, abs / 100, abs % 100, currency)
}

fn escape_html(input: &str) -> String {
    let mut out = String::with_capacity(input.len());
    for ch in input.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
    out
}

/// Renders notifications and queues them in the outbox
#[derive(Clone)]
pub struct Notifier {
    pool: PgPool,
    base_url: String,
}

impl Notifier {
    pub fn new(pool: PgPool, base_url: impl Into<String>) -> Self {
        Self {
            pool,
            base_url: base_url.into(),
        }
    }

    /// Queues the notification; errors are logged, never returned
    pub async fn notify(&self, notification: Notification) {
        let template = notification.template();
        let email = notification.render(&self.base_url);

        match OutboxEmail::enqueue(&self.pool, &email).await {
            Ok(queued) => debug!(email_id = %queued.id, template, "Notification queued"),
            Err(e) => error!(
                error = %e,
                template,
                recipient = notification.recipient(),
                "Failed to queue notification"
            ),
        }
    }
}
