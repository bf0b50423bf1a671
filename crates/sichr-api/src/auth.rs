//! 인증: 비밀번호 해싱, JWT 발급/검증, 요청 추출기.
//!
//! - 비밀번호는 argon2id로 해싱합니다.
//! - 토큰은 HS256 JWT이며 `sub`(사용자 ID), `email`, `role`, `exp`를 담습니다.
//! - `Authorization` 헤더가 없으면 401, 토큰이 유효하지 않으면 403을 반환합니다.

use std::sync::Arc;

use argon2::{
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
    Argon2,
};
use axum::{
    extract::FromRequestParts,
    http::{header::AUTHORIZATION, request::Parts},
};
use chrono::{Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};
use sichr_core::UserRole;
use thiserror::Error;
use tracing::debug;
use uuid::Uuid;

use crate::error::{forbidden, unauthorized, ApiErrorResponse};
use crate::state::AppState;

/// 인증 관련 에러
#[derive(Debug, Error)]
pub enum AuthError {
    #[error("비밀번호 해싱 실패: {0}")]
    Hash(String),

    #[error("토큰 발급 실패: {0}")]
    Encode(#[from] jsonwebtoken::errors::Error),

    #[error("해싱 작업 실패: {0}")]
    Task(#[from] tokio::task::JoinError),
}

// ============================================================================
// 비밀번호
// ============================================================================

/// 비밀번호를 argon2 PHC 문자열로 해싱
pub fn hash_password(password: &str) -> Result<String, AuthError> {
    let salt = SaltString::generate(&mut rand::rngs::OsRng);
    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|e| AuthError::Hash(e.to_string()))
}

/// 저장된 해시와 비밀번호 비교 (해시 형식이 잘못되면 false)
pub fn verify_password(password: &str, stored_hash: &str) -> bool {
    match PasswordHash::new(stored_hash) {
        Ok(parsed) => Argon2::default()
            .verify_password(password.as_bytes(), &parsed)
            .is_ok(),
        Err(e) => {
            debug!(error = %e, "저장된 비밀번호 해시 형식 오류");
            false
        }
    }
}

/// `hash_password`를 blocking 스레드에서 실행
pub async fn hash_password_off_thread(password: String) -> Result<String, AuthError> {
    tokio::task::spawn_blocking(move || hash_password(&password)).await?
}

/// `verify_password`를 blocking 스레드에서 실행
pub async fn verify_password_off_thread(
    password: String,
    stored_hash: String,
) -> Result<bool, AuthError> {
    Ok(tokio::task::spawn_blocking(move || verify_password(&password, &stored_hash)).await?)
}

// ============================================================================
// JWT
// ============================================================================

/// 토큰 클레임
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// 사용자 ID
    pub sub: Uuid,
    pub email: String,
    pub role: UserRole,
    /// 발급 시각 (unix seconds)
    pub iat: i64,
    /// 만료 시각 (unix seconds)
    pub exp: i64,
}

/// JWT 서명/검증 키
#[derive(Clone)]
pub struct JwtKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    ttl: Duration,
}

impl JwtKeys {
    pub fn new(secret: &SecretString, ttl_hours: i64) -> Self {
        let bytes = secret.expose_secret().as_bytes();
        Self {
            encoding: EncodingKey::from_secret(bytes),
            decoding: DecodingKey::from_secret(bytes),
            ttl: Duration::hours(ttl_hours),
        }
    }

    /// 토큰 발급
    pub fn issue(&self, user_id: Uuid, email: &str, role: UserRole) -> Result<String, AuthError> {
        let now = Utc::now();
        let claims = Claims {
            sub: user_id,
            email: email.to_string(),
            role,
            iat: now.timestamp(),
            exp: (now + self.ttl).timestamp(),
        };
        Ok(encode(&Header::new(Algorithm::HS256), &claims, &self.encoding)?)
    }

    /// 토큰 검증 (서명, 만료)
    pub fn verify(&self, token: &str) -> Result<Claims, jsonwebtoken::errors::Error> {
        let validation = Validation::new(Algorithm::HS256);
        decode::<Claims>(token, &self.decoding, &validation).map(|data| data.claims)
    }
}

// ============================================================================
// 추출기
// ============================================================================

/// 인증된 요청자
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub id: Uuid,
    pub email: String,
    pub role: UserRole,
}

impl AuthUser {
    /// 관리자가 아니면 403
    pub fn require_admin(&self) -> Result<(), ApiErrorResponse> {
        if self.role.is_admin() {
            Ok(())
        } else {
            Err(forbidden("관리자 권한이 필요합니다"))
        }
    }
}

impl FromRequestParts<Arc<AppState>> for AuthUser {
    type Rejection = ApiErrorResponse;

    async fn from_request_parts(
        parts: &mut Parts,
        state: &Arc<AppState>,
    ) -> Result<Self, Self::Rejection> {
        let header = parts
            .headers
            .get(AUTHORIZATION)
            .ok_or_else(|| unauthorized("인증 토큰이 필요합니다"))?;

        let token = header
            .to_str()
            .ok()
            .and_then(|value| value.strip_prefix("Bearer "))
            .map(str::trim)
            .filter(|token| !token.is_empty())
            .ok_or_else(|| unauthorized("Authorization 헤더 형식이 올바르지 않습니다"))?;

        let claims = state.jwt.verify(token).map_err(|e| {
            debug!(error = %e, "토큰 검증 실패");
            forbidden("유효하지 않거나 만료된 토큰입니다")
        })?;

        Ok(AuthUser {
            id: claims.sub,
            email: claims.email,
            role: claims.role,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_password_hash_roundtrip() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2"));
        assert!(verify_password("correct horse", &hash));
        assert!(!verify_password("wrong horse", &hash));
        assert!(!verify_password("correct horse", "not-a-phc-string"));
    }

    #[tokio::test]
    async fn test_password_hashing_off_thread() {
        let hash = hash_password_off_thread("correct horse".to_string()).await.unwrap();
        assert!(verify_password_off_thread("correct horse".to_string(), hash.clone())
            .await
            .unwrap());
        assert!(!verify_password_off_thread("wrong horse".to_string(), hash)
            .await
            .unwrap());
    }

    #[test]
    fn test_jwt_issue_and_verify() {
        let keys = JwtKeys::new(&SecretString::from("test-secret".to_string()), 1);
        let id = Uuid::new_v4();

        let token = keys.issue(id, "anna@example.com", UserRole::Landlord).unwrap();
        let claims = keys.verify(&token).unwrap();

        assert_eq!(claims.sub, id);
        assert_eq!(claims.email, "anna@example.com");
        assert_eq!(claims.role, UserRole::Landlord);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn test_jwt_rejects_foreign_and_expired_tokens() {
        let keys = JwtKeys::new(&SecretString::from("test-secret".to_string()), 1);
        let other = JwtKeys::new(&SecretString::from("other-secret".to_string()), 1);
        let token = other
            .issue(Uuid::new_v4(), "a@example.com", UserRole::Tenant)
            .unwrap();
        assert!(keys.verify(&token).is_err());

        // 기본 leeway(60초)보다 충분히 과거
        let expired = JwtKeys::new(&SecretString::from("test-secret".to_string()), -2);
        let token = expired
            .issue(Uuid::new_v4(), "a@example.com", UserRole::Tenant)
            .unwrap();
        assert!(keys.verify(&token).is_err());
    }
}
