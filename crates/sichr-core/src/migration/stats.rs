//! 마이그레이션 진행 통계.

use std::time::Duration;

use serde::{Deserialize, Serialize};

use super::models::StatementOutcome;

/// 스크립트 실행 통계
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct MigrationStats {
    /// 실행 대상 문장 수
    pub total: usize,
    /// 정상 적용
    pub applied: usize,
    /// 이미 존재 (비치명적)
    pub already_exists: usize,
    /// 실패
    pub failed: usize,
    /// dry-run으로 건너뜀
    pub skipped: usize,
    /// 소요 시간
    #[serde(skip)]
    pub elapsed: Duration,
}

impl MigrationStats {
    /// 새 통계 객체 생성
    pub fn new(total: usize) -> Self {
        Self {
            total,
            ..Self::default()
        }
    }

    /// 결과 하나를 반영
    pub fn record(&mut self, outcome: &StatementOutcome) {
        match outcome {
            StatementOutcome::Applied => self.applied += 1,
            StatementOutcome::AlreadyExists { .. } => self.already_exists += 1,
            StatementOutcome::Failed { .. } => self.failed += 1,
            StatementOutcome::Skipped => self.skipped += 1,
        }
    }

    /// 처리된 문장 수
    pub fn processed(&self) -> usize {
        self.applied + self.already_exists + self.failed + self.skipped
    }

    /// 성공률 계산 (%)
    ///
    /// "이미 존재"는 성공으로 본다. dry-run 건너뜀은 분모에서 제외.
    pub fn success_rate(&self) -> f64 {
        let attempted = self.total.saturating_sub(self.skipped);
        if attempted == 0 {
            0.0
        } else {
            ((self.applied + self.already_exists) as f64 / attempted as f64) * 100.0
        }
    }

    /// 진행률 표시 (`[3/7] 42.9%`)
    pub fn progress_line(&self) -> String {
        let percent = if self.total == 0 {
            100.0
        } else {
            self.processed() as f64 / self.total as f64 * 100.0
        };
        format!("[{}/{}] {:.1}%", self.processed(), self.total, percent)
    }

    /// 다른 스크립트의 통계를 합산
    pub fn merge(&mut self, other: &MigrationStats) {
        self.total += other.total;
        self.applied += other.applied;
        self.already_exists += other.already_exists;
        self.failed += other.failed;
        self.skipped += other.skipped;
        self.elapsed += other.elapsed;
    }

    /// 통계 요약 로그 출력
    pub fn log_summary(&self, script: &str) {
        tracing::info!(
            script = script,
            total = self.total,
            applied = self.applied,
            already_exists = self.already_exists,
            failed = self.failed,
            skipped = self.skipped,
            success_rate = format!("{:.1}%", self.success_rate()),
            elapsed = format!("{:.1}s", self.elapsed.as_secs_f64()),
            "마이그레이션 완료"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_success_rate_counts_existing_as_success() {
        let mut stats = MigrationStats::new(4);
        stats.record(&StatementOutcome::Applied);
        stats.record(&StatementOutcome::AlreadyExists {
            message: "relation \"users\" already exists".to_string(),
        });
        stats.record(&StatementOutcome::Applied);
        stats.record(&StatementOutcome::Failed {
            message: "syntax error".to_string(),
        });

        assert_eq!(stats.processed(), 4);
        assert!((stats.success_rate() - 75.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_empty_stats() {
        let stats = MigrationStats::new(0);
        assert_eq!(stats.success_rate(), 0.0);
        assert_eq!(stats.progress_line(), "[0/0] 100.0%");
    }

    #[test]
    fn test_progress_line_and_merge() {
        let mut stats = MigrationStats::new(7);
        for _ in 0..3 {
            stats.record(&StatementOutcome::Applied);
        }
        assert_eq!(stats.progress_line(), "[3/7] 42.9%");

        let mut total = MigrationStats::default();
        total.merge(&stats);
        total.merge(&stats);
        assert_eq!(total.total, 14);
        assert_eq!(total.applied, 6);
    }
}
