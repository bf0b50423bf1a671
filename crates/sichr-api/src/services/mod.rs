//! 외부 서비스 클라이언트.

pub mod mailer;
pub mod paypal;

pub use mailer::{MailError, MailMessage, Notifier, SmtpMailer};
pub use paypal::{CreateOrder, PayPalCapture, PayPalClient, PayPalError, PayPalOrder};
