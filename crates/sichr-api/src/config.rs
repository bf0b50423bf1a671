//! 환경변수 기반 설정 모듈.

use std::net::SocketAddr;

use rust_decimal::Decimal;
use rust_decimal_macros::dec;
use secrecy::SecretString;
use tracing::warn;

/// 개발용 기본 JWT 시크릿
const DEV_JWT_SECRET: &str = "dev-secret-key-change-in-production";

/// API 서버 전체 설정
#[derive(Debug, Clone)]
pub struct ApiConfig {
    /// 바인딩할 호스트 주소
    pub host: String,
    /// 바인딩할 포트
    pub port: u16,
    /// 데이터베이스 URL (없으면 DB 없이 기동)
    pub database_url: Option<String>,
    /// JWT 서명 키
    pub jwt_secret: SecretString,
    /// 토큰 유효 시간 (시간)
    pub jwt_ttl_hours: i64,
    /// 허용 CORS origin (비어 있으면 전체 허용)
    pub cors_origins: Vec<String>,
    /// PayPal 설정
    pub paypal: PayPalConfig,
    /// 열람 요청 수수료
    pub viewing_fee: Decimal,
    /// SMTP 설정 (없으면 메일 미발송)
    pub email: Option<EmailConfig>,
}

/// PayPal 실행 환경
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum PayPalEnvironment {
    #[default]
    Sandbox,
    Live,
}

impl PayPalEnvironment {
    /// REST API base URL
    pub fn api_base(&self) -> &'static str {
        match self {
            PayPalEnvironment::Sandbox => "https://api-m.sandbox.paypal.com",
            PayPalEnvironment::Live => "https://api-m.paypal.com",
        }
    }
}

impl std::fmt::Display for PayPalEnvironment {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PayPalEnvironment::Sandbox => write!(f, "sandbox"),
            PayPalEnvironment::Live => write!(f, "live"),
        }
    }
}

impl std::str::FromStr for PayPalEnvironment {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "sandbox" | "development" | "test" => Ok(PayPalEnvironment::Sandbox),
            "live" | "production" => Ok(PayPalEnvironment::Live),
            _ => Err(format!("Invalid PayPal environment: {}", s)),
        }
    }
}

/// PayPal 자격증명 및 통화 설정
#[derive(Debug, Clone)]
pub struct PayPalConfig {
    pub client_id: String,
    pub client_secret: SecretString,
    pub environment: PayPalEnvironment,
    /// 기본 통화 (기본값 EUR)
    pub currency: String,
    /// API base URL (테스트 시 재정의)
    pub api_base: String,
}

impl PayPalConfig {
    /// 자격증명이 모두 설정되었는지 확인
    pub fn is_configured(&self) -> bool {
        use secrecy::ExposeSecret;
        !self.client_id.is_empty() && !self.client_secret.expose_secret().is_empty()
    }

    fn from_env() -> Self {
        let environment: PayPalEnvironment = std::env::var("PAYPAL_ENVIRONMENT")
            .ok()
            .and_then(|v| v.parse().ok())
            .unwrap_or_default();
        let api_base = std::env::var("PAYPAL_API_BASE")
            .unwrap_or_else(|_| environment.api_base().to_string());

        Self {
            client_id: std::env::var("PAYPAL_CLIENT_ID").unwrap_or_default(),
            client_secret: SecretString::from(
                std::env::var("PAYPAL_CLIENT_SECRET").unwrap_or_default(),
            ),
            environment,
            currency: env_var_parse("PAYPAL_CURRENCY", "EUR".to_string()),
            api_base,
        }
    }
}

/// SMTP 설정
#[derive(Debug, Clone)]
pub struct EmailConfig {
    pub smtp_host: String,
    pub smtp_port: u16,
    pub username: String,
    pub password: SecretString,
    /// 발신자 주소
    pub from_email: String,
}

impl EmailConfig {
    /// 필수 값 중 하나라도 없으면 None
    fn from_env() -> Option<Self> {
        let smtp_host = std::env::var("EMAIL_SMTP_HOST").ok()?;
        let username = std::env::var("EMAIL_USERNAME").ok()?;
        let password = std::env::var("EMAIL_PASSWORD").ok()?;
        let from_email = std::env::var("EMAIL_FROM").unwrap_or_else(|_| username.clone());

        Some(Self {
            smtp_host,
            smtp_port: env_var_parse("EMAIL_SMTP_PORT", 587),
            username,
            password: SecretString::from(password),
            from_email,
        })
    }
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            host: "127.0.0.1".to_string(),
            port: 3001,
            database_url: None,
            jwt_secret: SecretString::from(DEV_JWT_SECRET.to_string()),
            jwt_ttl_hours: 24,
            cors_origins: Vec::new(),
            paypal: PayPalConfig {
                client_id: String::new(),
                client_secret: SecretString::from(String::new()),
                environment: PayPalEnvironment::Sandbox,
                currency: "EUR".to_string(),
                api_base: PayPalEnvironment::Sandbox.api_base().to_string(),
            },
            viewing_fee: dec!(25.00),
            email: None,
        }
    }
}

impl ApiConfig {
    /// 환경변수에서 설정 로드
    ///
    /// `.env` 파일이 있으면 먼저 읽습니다.
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        let jwt_secret = std::env::var("JWT_SECRET").unwrap_or_else(|_| {
            warn!("JWT_SECRET not set, using default (INSECURE for development only)");
            DEV_JWT_SECRET.to_string()
        });

        let email = EmailConfig::from_env();
        if email.is_none() {
            warn!("SMTP 설정 없음, 메일 알림 비활성화");
        }

        Self {
            host: env_var_parse("API_HOST", "127.0.0.1".to_string()),
            port: env_var_parse("API_PORT", 3001),
            database_url: std::env::var("DATABASE_URL")
                .ok()
                .filter(|url| !url.is_empty()),
            jwt_secret: SecretString::from(jwt_secret),
            jwt_ttl_hours: env_var_parse("JWT_TTL_HOURS", 24),
            cors_origins: env_var_list("CORS_ORIGINS"),
            paypal: PayPalConfig::from_env(),
            viewing_fee: env_var_parse("VIEWING_FEE", dec!(25.00)),
            email,
        }
    }

    /// 소켓 주소 반환
    ///
    /// # Errors
    /// `host:port` 형식이 유효하지 않으면 `AddrParseError`를 반환합니다.
    pub fn socket_addr(&self) -> Result<SocketAddr, std::net::AddrParseError> {
        format!("{}:{}", self.host, self.port).parse()
    }
}

/// 환경변수에서 값 파싱 (실패 시 기본값)
fn env_var_parse<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}

/// 환경변수에서 쉼표로 구분된 리스트 파싱
fn env_var_list(key: &str) -> Vec<String> {
    std::env::var(key)
        .map(|v| {
            v.split(',')
                .map(|s| s.trim().to_string())
                .filter(|s| !s.is_empty())
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paypal_environment_parsing() {
        assert_eq!("live".parse::<PayPalEnvironment>().unwrap(), PayPalEnvironment::Live);
        assert_eq!(
            "Production".parse::<PayPalEnvironment>().unwrap(),
            PayPalEnvironment::Live
        );
        assert_eq!(
            "sandbox".parse::<PayPalEnvironment>().unwrap(),
            PayPalEnvironment::Sandbox
        );
        assert!("staging".parse::<PayPalEnvironment>().is_err());
        assert_eq!(
            PayPalEnvironment::Live.api_base(),
            "https://api-m.paypal.com"
        );
    }

    #[test]
    fn test_default_config() {
        let config = ApiConfig::default();
        assert_eq!(config.socket_addr().unwrap().port(), 3001);
        assert!(config.database_url.is_none());
        assert!(!config.paypal.is_configured());
        assert_eq!(config.viewing_fee, dec!(25.00));
    }
}
