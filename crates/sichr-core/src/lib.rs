//! SichrPlace 공용 코어.
//!
//! - [`domain`]: 사용자 역할, 열람 요청 상태, 결제/동의 상태 등 도메인 열거형
//! - [`migration`]: SQL 스크립트 분할 → 문장별 실행 → 진행률 집계
//! - [`probe`]: 실행 중인 서버에 대한 엔드포인트 스모크 테스트

pub mod domain;
pub mod migration;
pub mod probe;

pub use domain::*;
