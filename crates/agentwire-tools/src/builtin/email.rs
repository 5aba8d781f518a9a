//! Outgoing e-mail over SMTP.

use futures::future::BoxFuture;
use lettre::message::header::ContentType;
use lettre::message::Mailbox;
use lettre::transport::smtp::authentication::Credentials;
use lettre::{AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor};
use serde::Deserialize;
use tracing::{error, info, warn};

use agentwire_core::config::EmailConfig;
use agentwire_core::error::{AgentwireError, Result};
use agentwire_core::traits::Tool;
use agentwire_core::types::ToolResult;

pub struct SendEmailTool {
    config: EmailConfig,
    timeout_secs: u64,
}

impl SendEmailTool {
    pub fn new(config: &EmailConfig, timeout_secs: u64) -> Self {
        if config.smtp_server.is_none() || config.sender.is_none() {
            warn!("SMTP server or sender not configured, send_email will fail");
        }
        Self {
            config: config.clone(),
            timeout_secs,
        }
    }

    fn failure(message: impl Into<String>) -> AgentwireError {
        AgentwireError::ToolExecution {
            tool: "send_email".to_string(),
            message: message.into(),
        }
    }

    fn transport(&self, server: &str) -> Result<AsyncSmtpTransport<Tokio1Executor>> {
        let mut builder = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(server)
            .map_err(|e| Self::failure(format!("Invalid SMTP server '{}': {}", server, e)))?
            .port(self.config.smtp_port)
            .timeout(Some(std::time::Duration::from_secs(self.timeout_secs)));
        if let Some(username) = &self.config.username {
            builder = builder.credentials(Credentials::new(
                username.clone(),
                self.config.password.clone().unwrap_or_default(),
            ));
        }
        Ok(builder.build())
    }
}

#[derive(Deserialize)]
struct EmailInput {
    recipient: String,
    subject: String,
    body: String,
}

fn parse_mailbox(field: &str, value: &str) -> Result<Mailbox> {
    value
        .parse()
        .map_err(|e| AgentwireError::ToolValidation(format!("invalid {} '{}': {}", field, value, e)))
}

/// Build the outgoing message from validated input.
fn build_message(sender: &str, input: &EmailInput) -> Result<Message> {
    Message::builder()
        .from(parse_mailbox("sender", sender)?)
        .to(parse_mailbox("recipient", &input.recipient)?)
        .subject(input.subject.as_str())
        .header(ContentType::TEXT_PLAIN)
        .body(input.body.clone())
        .map_err(|e| AgentwireError::ToolValidation(e.to_string()))
}

impl Tool for SendEmailTool {
    fn name(&self) -> &str {
        "send_email"
    }

    fn description(&self) -> &str {
        "Send a plain-text e-mail through the configured SMTP relay."
    }

    fn input_schema(&self) -> serde_json::Value {
        serde_json::json!({
            "type": "object",
            "properties": {
                "recipient": { "type": "string", "description": "Recipient address" },
                "subject": { "type": "string" },
                "body": { "type": "string" }
            },
            "required": ["recipient", "subject", "body"]
        })
    }

    fn timeout_secs(&self) -> u64 {
        self.timeout_secs
    }

    fn execute(&self, input: serde_json::Value) -> BoxFuture<'_, Result<ToolResult>> {
        Box::pin(async move {
            let params: EmailInput = serde_json::from_value(input)
                .map_err(|e| AgentwireError::ToolValidation(e.to_string()))?;

            let (Some(server), Some(sender)) = (&self.config.smtp_server, &self.config.sender)
            else {
                return Err(Self::failure("SMTP server and sender must be configured"));
            };

            let message = build_message(sender, &params)?;
            let transport = self.transport(server)?;

            info!(recipient = %params.recipient, "Sending email");
            match transport.send(message).await {
                Ok(_) => {
                    info!(recipient = %params.recipient, "Email sent");
                    Ok(ToolResult::success(serde_json::json!({
                        "sent": true,
                        "recipient": params.recipient,
                    })))
                }
                Err(e) => {
                    error!(recipient = %params.recipient, error = %e, "Failed to send email");
                    Ok(ToolResult::error(format!("Failed to send email: {}", e)))
                }
            }
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(recipient: &str) -> EmailInput {
        EmailInput {
            recipient: recipient.into(),
            subject: "Status".into(),
            body: "All green.".into(),
        }
    }

    fn configured(server: &str) -> EmailConfig {
        EmailConfig {
            smtp_server: Some(server.into()),
            smtp_port: 9,
            username: Some("agent".into()),
            password: Some("secret".into()),
            sender: Some("agent@example.com".into()),
        }
    }

    #[test]
    fn message_is_built_from_valid_addresses() {
        let message = build_message("agent@example.com", &input("ops@example.com")).unwrap();
        let raw = String::from_utf8(message.formatted()).unwrap();
        assert!(raw.contains("To: ops@example.com"));
        assert!(raw.contains("Subject: Status"));
    }

    #[test]
    fn bad_recipient_is_rejected() {
        let err = build_message("agent@example.com", &input("not an address")).unwrap_err();
        assert!(matches!(err, AgentwireError::ToolValidation(_)));
    }

    #[tokio::test]
    async fn unconfigured_relay_fails() {
        let tool = SendEmailTool::new(&EmailConfig::default(), 5);
        let err = tool
            .execute(serde_json::json!({
                "recipient": "ops@example.com",
                "subject": "s",
                "body": "b"
            }))
            .await
            .unwrap_err();
        assert!(matches!(err, AgentwireError::ToolExecution { .. }));
    }

    #[tokio::test]
    async fn missing_fields_are_rejected() {
        let tool = SendEmailTool::new(&configured("localhost"), 5);
        let err = tool
            .execute(serde_json::json!({ "recipient": "ops@example.com" }))
            .await
            .unwrap_err();
        assert!(matches!(err, AgentwireError::ToolValidation(_)));
    }

    #[tokio::test]
    async fn unreachable_relay_is_an_error_result() {
        let tool = SendEmailTool::new(&configured("localhost"), 2);
        let result = tool
            .execute(serde_json::json!({
                "recipient": "ops@example.com",
                "subject": "s",
                "body": "b"
            }))
            .await
            .unwrap();
        assert!(result.is_error);
    }
}
