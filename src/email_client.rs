use std::time::Duration;

use reqwest::Client;
use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use thiserror::Error;

use crate::{configuration::EmailSettings, domain::user_email::UserEmail};

// Postmark compatible client for account emails
#[derive(Clone)]
pub struct EmailClient {
    http_client: Client,
    base_url: String,
    sender: UserEmail,
    authorization_token: SecretString,
}

#[derive(Error, Debug)]
pub enum EmailClientError {
    #[error("Invalid sender address: {0}")]
    InvalidSender(String),
    #[error("Failed to build http client")]
    HttpClientError(#[from] reqwest::Error),
}

/// A rendered email, ready to be handed to [`EmailClient::send`].
#[derive(Debug, Clone, PartialEq)]
pub struct EmailMessage {
    pub subject: String,
    pub html_body: String,
    pub text_body: String,
}

impl EmailMessage {
    pub fn account_confirmation(name: &str, confirmation_link: &str) -> EmailMessage {
        EmailMessage {
            subject: "Confirm your marketplace account".to_string(),
            html_body: format!(
                "<p>Hi {},</p><p>Click <a href=\"{}\">here</a> to confirm your account.</p>",
                name, confirmation_link
            ),
            text_body: format!(
                "Hi {},\nVisit {} to confirm your account.",
                name, confirmation_link
            ),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct SendEmailRequest<'a> {
    from: &'a str,
    to: &'a str,
    subject: &'a str,
    html_body: &'a str,
    text_body: &'a str,
}

impl EmailClient {
    pub fn new(settings: &EmailSettings) -> Result<EmailClient, EmailClientError> {
        let sender = settings.sender().map_err(EmailClientError::InvalidSender)?;
        let http_client = Client::builder()
            .timeout(Duration::from_secs(settings.timeout_secs))
            .build()?;

        Ok(Self {
            http_client,
            base_url: settings.api_uri.clone(),
            sender,
            authorization_token: settings.authorization_token.clone(),
        })
    }

    #[tracing::instrument(
        "Sending email",
        skip(self, message),
        fields(subject = %message.subject)
    )]
    pub async fn send(
        &self,
        recipient: &UserEmail,
        message: &EmailMessage,
    ) -> Result<(), reqwest::Error> {
        self.http_client
            .post(format!("{}/email", self.base_url))
            .header("X-Postmark-Server-Token", self.authorization_token.expose_secret())
            .json(&SendEmailRequest {
                from: self.sender.as_ref(),
                to: recipient.as_ref(),
                subject: &message.subject,
                html_body: &message.html_body,
                text_body: &message.text_body,
            })
            .send()
            .await?
            .error_for_status()?;
        Ok(())
    }
}
