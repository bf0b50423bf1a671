//! 프로브 실행 보고서와 판정.

use std::time::Duration;

use serde::Serialize;

use super::models::ProbeResult;

/// 전체 판정
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Verdict {
    /// 100% 통과
    AllPassed,
    /// 90% 이상 통과
    MostlyPassing,
    /// 90% 미만
    Failing,
}

impl Verdict {
    /// 성공률(%)로 판정
    pub fn from_rate(rate: f64) -> Self {
        if rate >= 100.0 {
            Verdict::AllPassed
        } else if rate >= 90.0 {
            Verdict::MostlyPassing
        } else {
            Verdict::Failing
        }
    }
}

impl std::fmt::Display for Verdict {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Verdict::AllPassed => write!(f, "🎉 모든 엔드포인트 정상"),
            Verdict::MostlyPassing => write!(f, "⚠️  대부분 정상 (일부 확인 필요)"),
            Verdict::Failing => write!(f, "❌ 다수 실패 (서버 상태 확인 필요)"),
        }
    }
}

/// 스위트 실행 보고서
#[derive(Debug, Clone, Serialize)]
pub struct ProbeReport {
    /// 스위트 이름
    pub suite: String,
    /// 대상 서버
    pub base_url: String,
    /// 케이스별 결과 (실행 순서)
    pub results: Vec<ProbeResult>,
    /// 전체 소요 시간
    #[serde(skip)]
    pub elapsed: Duration,
}

impl ProbeReport {
    pub fn total(&self) -> usize {
        self.results.len()
    }

    pub fn passed(&self) -> usize {
        self.results.iter().filter(|r| r.passed).count()
    }

    pub fn failed(&self) -> usize {
        self.total() - self.passed()
    }

    /// 통과율 (%). 케이스가 없으면 0
    pub fn success_rate(&self) -> f64 {
        if self.results.is_empty() {
            0.0
        } else {
            self.passed() as f64 / self.total() as f64 * 100.0
        }
    }

    pub fn verdict(&self) -> Verdict {
        Verdict::from_rate(self.success_rate())
    }
}

impl std::fmt::Display for ProbeReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "═══════════════════════════════════════════════════════════════")?;
        writeln!(f, "  엔드포인트 점검: {} ({})", self.suite, self.base_url)?;
        writeln!(f, "═══════════════════════════════════════════════════════════════")?;

        for (idx, result) in self.results.iter().enumerate() {
            let mark = if result.passed { "✅" } else { "❌" };
            let status = result
                .status
                .map(|s| s.to_string())
                .unwrap_or_else(|| "---".to_string());
            writeln!(
                f,
                "  {:>2}. {} {:<6} {:<40} {} ({}ms)",
                idx + 1,
                mark,
                result.method,
                result.path,
                status,
                result.elapsed.as_millis()
            )?;
            if !result.passed {
                writeln!(f, "        → {}", result.detail)?;
            }
        }

        writeln!(f)?;
        writeln!(f, "  통과:   {}/{}", self.passed(), self.total())?;
        writeln!(f, "  실패:   {}", self.failed())?;
        writeln!(f, "  성공률: {:.1}%", self.success_rate())?;
        writeln!(f, "  판정:   {}", self.verdict())?;
        write!(f, "───────────────────────────────────────────────────────────────")
    }
}
