//! 메일 알림.
//!
//! SMTP 설정이 있을 때만 [`SmtpMailer`]가 생성되며, 발송 실패는 요청을 실패시키지 않습니다.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use lettre::{
    message::{header::ContentType, Mailbox},
    transport::smtp::authentication::Credentials,
    AsyncSmtpTransport, AsyncTransport, Message, Tokio1Executor,
};
use secrecy::ExposeSecret;
use thiserror::Error;
use tracing::debug;

use crate::config::EmailConfig;

/// 메일 발송 에러
#[derive(Debug, Error)]
pub enum MailError {
    #[error("잘못된 주소: {0}")]
    Address(String),

    #[error("메시지 생성 실패: {0}")]
    Build(String),

    #[error("SMTP 전송 실패: {0}")]
    Send(String),
}

/// 발송할 메일
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MailMessage {
    pub to: String,
    pub subject: String,
    pub html_body: String,
}

impl MailMessage {
    /// 임대인에게 보내는 새 열람 요청 알림
    pub fn viewing_requested(
        landlord_email: &str,
        apartment_title: &str,
        tenant_name: &str,
        requested_date: DateTime<Utc>,
        message: Option<&str>,
    ) -> Self {
        let note = message
            .filter(|m| !m.trim().is_empty())
            .map(|m| format!("<p><em>{}</em></p>", escape_html(m)))
            .unwrap_or_default();

        Self {
            to: landlord_email.to_string(),
            subject: format!("New viewing request: {}", apartment_title),
            html_body: format!(
                "<h2>New viewing request</h2>\
                 <p><strong>{}</strong> would like to view <strong>{}</strong>.</p>\
                 <p>Requested date: {}</p>{}\
                 <p>Please log in to SichrPlace to approve or decline.</p>",
                escape_html(tenant_name),
                escape_html(apartment_title),
                requested_date.format("%Y-%m-%d %H:%M UTC"),
                note
            ),
        }
    }

    /// 열람 요청 상태 변경 알림 (임차인 대상)
    pub fn viewing_status_changed(tenant_email: &str, apartment_title: &str, status: &str) -> Self {
        Self {
            to: tenant_email.to_string(),
            subject: format!("Viewing request {}: {}", status, apartment_title),
            html_body: format!(
                "<p>Your viewing request for <strong>{}</strong> is now <strong>{}</strong>.</p>",
                escape_html(apartment_title),
                escape_html(status)
            ),
        }
    }
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}

/// 메일 발송 인터페이스
#[async_trait]
pub trait Notifier: Send + Sync {
    async fn send(&self, mail: &MailMessage) -> Result<(), MailError>;
}

/// lettre 기반 SMTP 발송기
pub struct SmtpMailer {
    from: Mailbox,
    transport: AsyncSmtpTransport<Tokio1Executor>,
}

impl SmtpMailer {
    pub fn new(config: &EmailConfig) -> Result<Self, MailError> {
        let from: Mailbox = config
            .from_email
            .parse()
            .map_err(|e| MailError::Address(format!("{}: {}", config.from_email, e)))?;

        let creds = Credentials::new(
            config.username.clone(),
            config.password.expose_secret().to_string(),
        );
        let transport = AsyncSmtpTransport::<Tokio1Executor>::starttls_relay(&config.smtp_host)
            .map_err(|e| MailError::Send(format!("SMTP 연결 실패: {}", e)))?
            .port(config.smtp_port)
            .credentials(creds)
            .build();

        Ok(Self { from, transport })
    }
}

#[async_trait]
impl Notifier for SmtpMailer {
    async fn send(&self, mail: &MailMessage) -> Result<(), MailError> {
        let to: Mailbox = mail
            .to
            .parse()
            .map_err(|e| MailError::Address(format!("{}: {}", mail.to, e)))?;

        let email = Message::builder()
            .from(self.from.clone())
            .to(to)
            .subject(mail.subject.clone())
            .header(ContentType::TEXT_HTML)
            .body(mail.html_body.clone())
            .map_err(|e| MailError::Build(e.to_string()))?;

        self.transport
            .send(email)
            .await
            .map_err(|e| MailError::Send(e.to_string()))?;

        debug!(to = %mail.to, "메일 전송 성공");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;

    use super::*;

    #[test]
    fn test_viewing_requested_mail() {
        let date = Utc.with_ymd_and_hms(2025, 3, 14, 17, 30, 0).unwrap();
        let mail = MailMessage::viewing_requested(
            "owner@example.com",
            "Altbau <Dresden>",
            "Max Mustermann",
            date,
            Some("Evenings work best"),
        );

        assert_eq!(mail.to, "owner@example.com");
        assert_eq!(mail.subject, "New viewing request: Altbau <Dresden>");
        assert!(mail.html_body.contains("Altbau &lt;Dresden&gt;"));
        assert!(mail.html_body.contains("2025-03-14 17:30 UTC"));
        assert!(mail.html_body.contains("Evenings work best"));
    }

    #[test]
    fn test_smtp_mailer_rejects_bad_sender() {
        let config = EmailConfig {
            smtp_host: "smtp.example.com".to_string(),
            smtp_port: 587,
            username: "user".to_string(),
            password: secrecy::SecretString::from("pw".to_string()),
            from_email: "not an address".to_string(),
        };
        assert!(matches!(SmtpMailer::new(&config), Err(MailError::Address(_))));
    }
}
