//! 마이그레이션 에러 타입.

use std::path::PathBuf;

use thiserror::Error;

/// "이미 존재" 계열 SQLSTATE
///
/// duplicate_table, duplicate_object, duplicate_schema, duplicate_function,
/// duplicate_column, duplicate_database
const DUPLICATE_SQLSTATES: [&str; 6] = ["42P07", "42710", "42P06", "42723", "42701", "42P04"];

/// 문장 하나를 실행하다 발생한 에러
#[derive(Debug, Clone, Error)]
pub enum ExecError {
    /// DB가 거부한 문장
    #[error("DB 에러{}: {message}", .code.as_deref().map(|c| format!(" [{}]", c)).unwrap_or_default())]
    Database {
        /// SQLSTATE 코드
        code: Option<String>,
        /// DB 메시지
        message: String,
    },

    /// RPC 엔드포인트의 비정상 응답
    #[error("RPC 응답 오류 (HTTP {status}): {message}")]
    Http { status: u16, message: String },

    /// 연결/전송 실패
    #[error("전송 실패: {0}")]
    Transport(String),
}

impl ExecError {
    /// 재실행 시 정상으로 볼 수 있는 "이미 존재" 에러인지 확인
    pub fn is_already_exists(&self) -> bool {
        match self {
            ExecError::Database { code, message } => {
                code.as_deref()
                    .is_some_and(|c| DUPLICATE_SQLSTATES.contains(&c))
                    || contains_already_exists(message)
            }
            ExecError::Http { message, .. } => contains_already_exists(message),
            ExecError::Transport(_) => false,
        }
    }
}

fn contains_already_exists(message: &str) -> bool {
    message.to_lowercase().contains("already exists")
}

/// 스크립트 로딩/실행기 구성 에러 (문장 실패와 달리 실행 자체를 중단)
#[derive(Debug, Error)]
pub enum MigrationError {
    /// 디렉토리 없음
    #[error("디렉토리가 존재하지 않습니다: {0:?}")]
    DirectoryNotFound(PathBuf),

    /// 파일 입출력 실패
    #[error("파일 읽기 실패 {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// 실행기 초기화 실패 (DB 연결 등)
    #[error("실행기 초기화 실패: {0}")]
    Executor(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_already_exists_by_message() {
        let err = ExecError::Http {
            status: 400,
            message: "relation \"users\" ALREADY EXISTS".to_string(),
        };
        assert!(err.is_already_exists());
    }

    #[test]
    fn test_already_exists_by_sqlstate() {
        let err = ExecError::Database {
            code: Some("42710".to_string()),
            message: "policy \"owner_update\" for table \"apartments\" exists".to_string(),
        };
        assert!(err.is_already_exists());
    }

    #[test]
    fn test_other_errors_are_fatal() {
        let err = ExecError::Database {
            code: Some("42601".to_string()),
            message: "syntax error at or near \"TABEL\"".to_string(),
        };
        assert!(!err.is_already_exists());
        assert!(!ExecError::Transport("connection refused".to_string()).is_already_exists());
        assert_eq!(
            err.to_string(),
            "DB 에러 [42601]: syntax error at or near \"TABEL\""
        );
    }
}
