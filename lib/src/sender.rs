use lettre::smtp::authentication::Credentials;
use lettre::smtp::extension::ClientId;
use lettre::{ClientSecurity, EmailAddress, Envelope, SendableEmail, SmtpClient, Transport};

use uuid::Uuid;

use crate::config::SmtpConfig;
use crate::error::Error;
use crate::message::Message;

/// Hands finished messages to an SMTP server.
///
/// Holds only connection settings; each `send` opens a fresh transport.
/// No retries: a delivery failure surfaces immediately as `Error::Smtp`.
pub struct EmailSender {
    host: String,
    port: u16,
    credentials: Option<(String, String)>,
}

impl EmailSender {
    pub fn new<S: Into<String>>(host: S, port: u16) -> EmailSender {
        EmailSender {
            host: host.into(),
            port,
            credentials: None,
        }
    }

    pub fn from_config(config: &SmtpConfig) -> EmailSender {
        let mut sender = EmailSender::new(config.host.as_str(), config.port);

        if let (Some(username), Some(password)) = (&config.username, &config.password) {
            sender = sender.credentials(username.as_str(), password.as_str());
        }

        sender
    }

    pub fn credentials<S: Into<String>>(mut self, username: S, password: S) -> Self {
        self.credentials = Some((username.into(), password.into()));
        self
    }

    /// SMTP envelope derived from the message's sender and recipients.
    pub fn envelope(message: &Message) -> Result<Envelope, Error> {
        let from = EmailAddress::new(message.sender().to_string())
            .map_err(|e| Error::Smtp(e.to_string()))?;

        let mut to = Vec::new();
        for recipient in message.recipients() {
            to.push(
                EmailAddress::new(recipient.clone()).map_err(|e| Error::Smtp(e.to_string()))?,
            );
        }

        Envelope::new(Some(from), to).map_err(|e| Error::Smtp(e.to_string()))
    }

    pub fn send(&self, message: &Message) -> Result<(), Error> {
        let envelope = EmailSender::envelope(message)?;

        let email = SendableEmail::new(
            envelope,
            Uuid::new_v4().to_string(),
            message.to_wire().into_bytes(),
        );

        let mut client = SmtpClient::new((self.host.as_str(), self.port), ClientSecurity::None)?
            .hello_name(ClientId::hostname());

        if let Some((username, password)) = &self.credentials {
            client = client.credentials(Credentials::new(username.clone(), password.clone()));
        }

        let mut mailer = client.transport();
        let result = mailer.send(email);

        match result {
            Ok(_) => {
                log::debug!("Email sent to {}", message.recipients().join(", "));
                Ok(())
            }
            Err(e) => {
                log::error!("Could not send email: {:?}", e);
                Err(Error::from(e))
            }
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::message::MessageBuilder;

    fn sample_message() -> Message {
        MessageBuilder::new()
            .sender("me@gmail.com")
            .recipients(vec!["a@x.com", "b@x.com"])
            .subject("Hi")
            .html_body("<p>hi</p>")
            .build()
            .unwrap()
    }

    #[test]
    fn envelope_carries_all_recipients() {
        let envelope = EmailSender::envelope(&sample_message()).unwrap();

        assert_eq!(envelope.from().unwrap().to_string(), "me@gmail.com");
        assert_eq!(envelope.to().len(), 2);
    }

    #[test]
    fn bad_address_is_rejected() {
        let msg = MessageBuilder::new()
            .sender("not an address")
            .recipient("you@gmail.com")
            .subject("Hi")
            .html_body("<p>hi</p>")
            .build()
            .unwrap();

        assert!(EmailSender::envelope(&msg).is_err());
    }
}
