pub mod errors;

use lettre::{Message, SmtpTransport, Transport};
use lettre::message::{Mailbox, MultiPart};
use lettre::transport::smtp::authentication::Credentials;
use log::info;
use crate::config::MailParameters;
use crate::manager_mail::errors::MailError;
use crate::report::Report;
use crate::worker::ReportSender;

/// Port on which the SMTP server expects implicit TLS, all others use STARTTLS
const IMPLICIT_TLS_PORT: u16 = 465;

pub struct Mail {
    transport: SmtpTransport,
    from: Mailbox,
    to: Vec<Mailbox>,
}

impl Mail {
    /// Returns a new instance of the Mail struct, no connection is made until a mail is sent
    ///
    /// # Arguments
    ///
    /// * 'params' - validated mail parameters
    pub fn new(params: &MailParameters) -> Result<Self, MailError> {
        let builder = if params.smtp_port == IMPLICIT_TLS_PORT {
            SmtpTransport::relay(&params.smtp_server)?
        } else {
            SmtpTransport::starttls_relay(&params.smtp_server)?
        };

        let transport = builder
            .port(params.smtp_port)
            .credentials(Credentials::new(params.smtp_username.clone(), params.smtp_password.clone()))
            .build();

        Ok(Self { transport, from: params.from.clone(), to: params.to.clone() })
    }
}

/// Builds the message for a report with a plain text and an html alternative
///
/// # Arguments
///
/// * 'from' - sender
/// * 'to' - recipients
/// * 'report' - the report to send
pub fn build_message(from: &Mailbox, to: &[Mailbox], report: &Report) -> Result<Message, MailError> {
    let mut builder = Message::builder()
        .from(from.clone())
        .subject(report.subject.clone());
    for t in to {
        builder = builder.to(t.clone());
    }

    Ok(builder.multipart(MultiPart::alternative_plain_html(report.text.clone(), report.html.clone()))?)
}

impl ReportSender for Mail {
    /// Sends the report to all recipients
    ///
    fn send(&self, report: &Report) -> Result<(), MailError> {
        let email = build_message(&self.from, &self.to, report)?;
        let _ = self.transport.send(&email)?;
        info!("report sent to {} recipient(s)", self.to.len());

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn message_has_all_recipients_and_both_bodies() {
        let report = Report {
            subject: "UV Forecast for Here - Monday, June 03, 2024".to_string(),
            html: "<p>html body</p>".to_string(),
            text: "text body".to_string(),
        };
        let from: Mailbox = "UV Bot <uv@example.com>".parse().unwrap();
        let to: Vec<Mailbox> = vec!["a@example.com".parse().unwrap(), "b@example.com".parse().unwrap()];

        let message = build_message(&from, &to, &report).unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();
        assert!(raw.contains("To: a@example.com, b@example.com"));
        assert!(raw.contains("Subject: UV Forecast for Here - Monday, June 03, 2024"));
        assert!(raw.contains("text body"));
        assert!(raw.contains("<p>html body</p>"));
    }
}
