//! 엔드포인트 점검 (스모크 테스트) 도구.
//!
//! 정해진 순서의 케이스를 하나씩 호출하고, 응답을 검증 조건으로 판정한 뒤
//! 통과율과 판정 결과를 보고합니다.
//!
//! # 사용 예시
//!
//! ```ignore
//! use sichr_core::probe::{smoke_suite, ProbeConfig, ProbeRunner};
//!
//! let runner = ProbeRunner::new(ProbeConfig::from_env())?;
//! let report = runner.run(&smoke_suite()).await;
//! println!("{}", report);
//! ```

pub mod error;
pub mod models;
pub mod report;
pub mod runner;
pub mod suite;

pub use error::ProbeError;
pub use models::{Expectation, ProbeCase, ProbeResult};
pub use report::{ProbeReport, Verdict};
pub use runner::{ProbeConfig, ProbeRunner, DEFAULT_BASE_URL};
pub use suite::{smoke_suite, ProbeSuite};
