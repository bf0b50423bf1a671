//! SQL 마이그레이션 실행 도구.
//!
//! 스크립트를 문장 단위로 분할하고, 문장마다 개별 실행하며,
//! "이미 존재" 에러는 재실행 시 정상 상황으로 취급합니다.
//!
//! # 사용 예시
//!
//! ```ignore
//! use sichr_core::migration::{MigrationRunner, PgExecutor};
//!
//! let executor = PgExecutor::connect(&database_url).await?;
//! let runner = MigrationRunner::new(Box::new(executor));
//! let reports = runner.run_directory(Path::new("migrations")).await?;
//! ```

pub mod error;
pub mod executor;
pub mod models;
pub mod runner;
pub mod splitter;
pub mod stats;

pub use error::{ExecError, MigrationError};
pub use executor::{PgExecutor, SqlExecutor, SupabaseRpcConfig, SupabaseRpcExecutor};
pub use models::*;
pub use runner::MigrationRunner;
pub use splitter::StatementSplitter;
pub use stats::MigrationStats;
