//! 애플리케이션 공유 상태.

use std::sync::Arc;
use std::time::Duration;

use sqlx::postgres::{PgPool, PgPoolOptions};
use tracing::{info, warn};

use crate::auth::JwtKeys;
use crate::config::ApiConfig;
use crate::services::{MailMessage, Notifier, PayPalClient, SmtpMailer};

/// 핸들러에서 공유하는 상태
pub struct AppState {
    /// 서버 버전
    pub version: String,
    pub config: ApiConfig,
    /// DB 풀 (미설정 시 DB 의존 엔드포인트는 500)
    pub db_pool: Option<PgPool>,
    pub jwt: JwtKeys,
    pub paypal: PayPalClient,
    /// 메일 발송기 (SMTP 미설정 시 None)
    pub notifier: Option<Arc<dyn Notifier>>,
}

impl AppState {
    /// DB 없이 상태 생성
    pub fn new(config: ApiConfig) -> Self {
        let notifier: Option<Arc<dyn Notifier>> = config.email.as_ref().and_then(|email| {
            match SmtpMailer::new(email) {
                Ok(mailer) => Some(Arc::new(mailer) as Arc<dyn Notifier>),
                Err(e) => {
                    warn!(error = %e, "SMTP 발송기 생성 실패, 메일 알림 비활성화");
                    None
                }
            }
        });

        Self {
            version: env!("CARGO_PKG_VERSION").to_string(),
            jwt: JwtKeys::new(&config.jwt_secret, config.jwt_ttl_hours),
            paypal: PayPalClient::new(config.paypal.clone()),
            db_pool: None,
            notifier,
            config,
        }
    }

    /// 설정된 DATABASE_URL로 연결을 시도하여 상태 생성
    ///
    /// 연결에 실패해도 서버는 DB 없이 기동합니다.
    pub async fn connect(config: ApiConfig) -> Self {
        let database_url = config.database_url.clone();
        let state = Self::new(config);

        let Some(url) = database_url else {
            warn!("DATABASE_URL not set, running without database");
            return state;
        };

        match PgPoolOptions::new()
            .max_connections(10)
            .acquire_timeout(Duration::from_secs(5))
            .connect(&url)
            .await
        {
            Ok(pool) => {
                info!("Database connected");
                state.with_db_pool(pool)
            }
            Err(e) => {
                warn!(error = %e, "Database connection failed, running without database");
                state
            }
        }
    }

    pub fn with_db_pool(mut self, pool: PgPool) -> Self {
        self.db_pool = Some(pool);
        self
    }

    pub fn with_notifier(mut self, notifier: Arc<dyn Notifier>) -> Self {
        self.notifier = Some(notifier);
        self
    }

    /// 백그라운드로 메일 발송 (실패는 로그만 남김)
    pub fn notify(&self, mail: MailMessage) {
        let Some(notifier) = self.notifier.clone() else {
            return;
        };

        tokio::spawn(async move {
            if let Err(e) = notifier.send(&mail).await {
                warn!(to = %mail.to, error = %e, "메일 발송 실패");
            }
        });
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Mutex;

    use async_trait::async_trait;
    use tokio::sync::Notify;

    use super::*;
    use crate::services::MailError;

    #[derive(Default)]
    struct RecordingNotifier {
        sent: Mutex<Vec<String>>,
        delivered: Notify,
    }

    #[async_trait]
    impl Notifier for RecordingNotifier {
        async fn send(&self, mail: &MailMessage) -> Result<(), MailError> {
            self.sent.lock().unwrap().push(mail.to.clone());
            self.delivered.notify_one();
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_notify_dispatches_to_notifier() {
        let notifier = Arc::new(RecordingNotifier::default());
        let state = AppState::new(ApiConfig::default()).with_notifier(notifier.clone());

        state.notify(MailMessage {
            to: "landlord@example.com".to_string(),
            subject: "New viewing request".to_string(),
            html_body: "<p>hi</p>".to_string(),
        });

        tokio::time::timeout(Duration::from_secs(1), notifier.delivered.notified())
            .await
            .unwrap();
        assert_eq!(*notifier.sent.lock().unwrap(), vec!["landlord@example.com"]);
    }

    #[test]
    fn test_notify_without_notifier_is_noop() {
        let state = AppState::new(ApiConfig::default());
        assert!(state.notifier.is_none());
        state.notify(MailMessage {
            to: "nobody@example.com".to_string(),
            subject: String::new(),
            html_body: String::new(),
        });
    }
}
