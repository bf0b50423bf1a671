//! 엔드포인트 점검 CLI 명령어.
//!
//! 실패한 케이스가 있어도 종료 코드는 0입니다. 판정은 보고서로만 전달됩니다.

use std::path::PathBuf;
use std::time::Duration;

use anyhow::Context;
use sichr_core::probe::{smoke_suite, ProbeConfig, ProbeRunner, ProbeSuite, Verdict};

/// probe 명령 인자
#[derive(Debug, Clone)]
pub struct ProbeArgs {
    pub base_url: String,
    /// TOML 스위트 (None이면 기본 스모크 스위트)
    pub suite: Option<PathBuf>,
    pub timeout_secs: u64,
    pub startup_delay_ms: u64,
}

impl ProbeArgs {
    fn config(&self) -> ProbeConfig {
        ProbeConfig::new(self.base_url.trim_end_matches('/'))
            .with_timeout(Duration::from_secs(self.timeout_secs))
            .with_startup_delay(Duration::from_millis(self.startup_delay_ms))
    }

    fn load_suite(&self) -> anyhow::Result<ProbeSuite> {
        match &self.suite {
            Some(path) => ProbeSuite::load(path)
                .with_context(|| format!("스위트 로드 실패: {:?}", path)),
            None => Ok(smoke_suite()),
        }
    }
}

/// 명령 진입점
pub async fn run_probe(args: &ProbeArgs) -> anyhow::Result<()> {
    let suite = args.load_suite()?;
    let runner = ProbeRunner::new(args.config()).context("HTTP 클라이언트 생성 실패")?;

    println!(
        "\n🔎 {} 스위트 ({} 케이스) → {}\n",
        suite.name,
        suite.cases.len(),
        runner.config().base_url
    );

    let report = runner.run(&suite).await;
    println!("{}", report);

    if report.verdict() == Verdict::Failing {
        println!("\n  서버가 기동 중인지, --base-url이 올바른지 확인하세요.");
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    fn args(suite: Option<PathBuf>) -> ProbeArgs {
        ProbeArgs {
            base_url: "http://127.0.0.1:1/".to_string(),
            suite,
            timeout_secs: 1,
            startup_delay_ms: 0,
        }
    }

    #[test]
    fn test_config_from_args() {
        let config = args(None).config();
        assert_eq!(config.base_url, "http://127.0.0.1:1");
        assert_eq!(config.timeout, Duration::from_secs(1));
        assert!(config.startup_delay.is_zero());
    }

    #[test]
    fn test_missing_suite_file_is_error() {
        let err = args(Some(PathBuf::from("does/not/exist.toml")))
            .load_suite()
            .unwrap_err();
        assert!(err.to_string().contains("스위트 로드 실패"));
    }

    #[tokio::test]
    async fn test_unreachable_server_still_succeeds() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("mini.toml");
        fs::write(
            &path,
            r#"
name = "mini"

[[case]]
name = "health"
path = "/api/health"
"#,
        )
        .unwrap();

        assert!(run_probe(&args(Some(path))).await.is_ok());
    }
}
