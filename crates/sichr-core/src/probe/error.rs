//! 프로브 에러 타입.

use std::path::PathBuf;

use thiserror::Error;

/// 스위트 로딩/클라이언트 구성 에러
///
/// 개별 요청 실패는 에러가 아니라 실패한 [`ProbeResult`](super::ProbeResult)로 집계됩니다.
#[derive(Debug, Error)]
pub enum ProbeError {
    /// 스위트 파일 읽기 실패
    #[error("스위트 파일 읽기 실패 {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// TOML 파싱 실패
    #[error("스위트 파싱 실패 {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    /// 잘못된 스위트 정의
    #[error("잘못된 케이스 '{case}': {reason}")]
    InvalidCase { case: String, reason: String },

    /// HTTP 클라이언트 생성 실패
    #[error("HTTP 클라이언트 생성 실패: {0}")]
    Client(String),
}
