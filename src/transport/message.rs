//! Conversion of [`Email`] into a lettre [`Message`]
//!
//! Shared by the SMTP and sendmail transports.

use crate::error::{MailError, Result};
use crate::traits::transport::Email;
use lettre::{
    Message,
    message::{Mailbox, MultiPart, SinglePart, header::ContentType},
};

fn mailbox(field: &str, address: &str) -> Result<Mailbox> {
    address.parse().map_err(|e| {
        MailError::invalid_message(format!("Invalid '{}' address '{}': {}", field, address, e))
    })
}

pub(crate) fn build_message(email: &Email) -> Result<Message> {
    let mut builder = Message::builder()
        .from(mailbox("from", &email.from)?)
        .subject(&email.subject);

    for to in &email.to {
        builder = builder.to(mailbox("to", to)?);
    }
    for cc in &email.cc {
        builder = builder.cc(mailbox("cc", cc)?);
    }
    for bcc in &email.bcc {
        builder = builder.bcc(mailbox("bcc", bcc)?);
    }
    if let Some(ref reply_to) = email.reply_to {
        builder = builder.reply_to(mailbox("reply_to", reply_to)?);
    }

    let message = match (&email.text, &email.html) {
        (Some(text), Some(html)) => builder.multipart(
            MultiPart::alternative()
                .singlepart(
                    SinglePart::builder()
                        .header(ContentType::TEXT_PLAIN)
                        .body(text.clone()),
                )
                .singlepart(
                    SinglePart::builder()
                        .header(ContentType::TEXT_HTML)
                        .body(html.clone()),
                ),
        ),
        (Some(text), None) => builder.header(ContentType::TEXT_PLAIN).body(text.clone()),
        (None, Some(html)) => builder.header(ContentType::TEXT_HTML).body(html.clone()),
        (None, None) => {
            return Err(MailError::invalid_message(
                "Email must have either text or HTML body",
            ));
        }
    };

    message.map_err(|e| MailError::invalid_message(format!("Failed to build email: {}", e)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::Address;

    #[test]
    fn test_builds_multipart_when_both_bodies_present() {
        let email = Email::new("Sender <from@example.com>", "to@example.com", "Hello")
            .cc("cc@example.com")
            .text("plain")
            .html("<p>html</p>");

        let message = build_message(&email).unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();
        assert!(raw.contains("multipart/alternative"));
        assert!(raw.contains("Subject: Hello"));
        assert!(raw.contains("Cc: cc@example.com"));
    }

    #[test]
    fn test_configured_sender_with_comma_in_name() {
        let from = Address::new("ops@example.com").with_name("Doe, John");
        let to = Address::new("qa@example.com").with_name("QA; Staging");
        let email = Email::new(from.to_string(), to.to_string(), "Hello").text("plain");

        let message = build_message(&email).unwrap();
        let envelope = message.envelope();
        assert_eq!(
            envelope.from().map(ToString::to_string).as_deref(),
            Some("ops@example.com")
        );
        assert_eq!(envelope.to().len(), 1);
        assert_eq!(envelope.to()[0].to_string(), "qa@example.com");

        let raw = String::from_utf8(message.formatted()).unwrap();
        assert!(raw.contains("Doe, John"));
    }

    #[test]
    fn test_rejects_invalid_recipient() {
        let email = Email::new("from@example.com", "not an address", "Hello").text("plain");
        let err = build_message(&email).unwrap_err();
        assert!(matches!(err, MailError::InvalidMessage(_)));
        assert!(err.to_string().contains("'to'"));
    }
}
