//! 마이그레이션 실행기.
//!
//! 분할 → 문장별 실행 → 집계. 실패한 문장이 있어도 나머지를 계속 실행하며
//! 롤백하지 않습니다.

use std::{
    fs,
    path::{Path, PathBuf},
    time::Instant,
};

use tracing::{info, warn};

use super::error::MigrationError;
use super::executor::SqlExecutor;
use super::models::*;
use super::splitter::StatementSplitter;
use super::stats::MigrationStats;

/// SQL 배치 실행기
pub struct MigrationRunner {
    executor: Box<dyn SqlExecutor>,
    splitter: StatementSplitter,
    dry_run: bool,
}

impl MigrationRunner {
    /// 실행기를 주입하여 생성
    pub fn new(executor: Box<dyn SqlExecutor>) -> Self {
        Self {
            executor,
            splitter: StatementSplitter::new(),
            dry_run: false,
        }
    }

    /// dry-run 모드 설정 (분할/분류만 수행)
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// 분할기 참조
    pub fn splitter(&self) -> &StatementSplitter {
        &self.splitter
    }

    /// 스크립트 텍스트 실행
    ///
    /// 문장 실패는 보고서에 기록될 뿐 에러로 반환되지 않습니다.
    pub async fn run_script(&self, script: &str, content: &str) -> MigrationReport {
        let started = Instant::now();
        let statements = self.splitter.split(content);
        let mut stats = MigrationStats::new(statements.len());
        let mut results = Vec::with_capacity(statements.len());

        info!(
            script = script,
            statements = statements.len(),
            executor = self.executor.name(),
            dry_run = self.dry_run,
            "마이그레이션 시작"
        );

        for (idx, statement) in statements.into_iter().enumerate() {
            let stmt_started = Instant::now();
            let outcome = if self.dry_run {
                StatementOutcome::Skipped
            } else {
                self.execute_statement(&statement).await
            };

            stats.record(&outcome);

            match &outcome {
                StatementOutcome::Applied => info!(
                    progress = %stats.progress_line(),
                    kind = %statement.kind,
                    object = %statement.object_name,
                    "적용"
                ),
                StatementOutcome::AlreadyExists { message } => info!(
                    progress = %stats.progress_line(),
                    line = statement.line_number,
                    reason = %message,
                    "이미 존재, 건너뜀"
                ),
                StatementOutcome::Failed { message } => warn!(
                    progress = %stats.progress_line(),
                    line = statement.line_number,
                    sql = %statement.summary(),
                    error = %message,
                    "문장 실패"
                ),
                StatementOutcome::Skipped => {}
            }

            results.push(StatementResult {
                index: idx + 1,
                statement,
                outcome,
                elapsed: stmt_started.elapsed(),
            });
        }

        stats.elapsed = started.elapsed();
        stats.log_summary(script);

        MigrationReport {
            script: script.to_string(),
            dry_run: self.dry_run,
            stats,
            results,
        }
    }

    /// 파일 하나 실행
    pub async fn run_file(&self, path: &Path) -> Result<MigrationReport, MigrationError> {
        let content = fs::read_to_string(path).map_err(|source| MigrationError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let name = path
            .file_name()
            .and_then(|s| s.to_str())
            .unwrap_or("script.sql");

        Ok(self.run_script(name, &content).await)
    }

    /// 디렉토리의 스크립트를 번호 순으로 실행
    pub async fn run_directory(&self, dir: &Path) -> Result<Vec<MigrationReport>, MigrationError> {
        let scripts = self.splitter.scan_directory(dir)?;
        if scripts.is_empty() {
            warn!(dir = %dir.display(), "마이그레이션 파일 없음");
        }

        let paths: Vec<PathBuf> = scripts.into_iter().map(|s| s.path).collect();
        self.run_files(&paths).await
    }

    /// 주어진 순서대로 파일 실행
    ///
    /// 읽을 수 없는 파일을 만나면 그 지점에서 중단합니다.
    pub async fn run_files(&self, paths: &[PathBuf]) -> Result<Vec<MigrationReport>, MigrationError> {
        let mut reports = Vec::with_capacity(paths.len());
        for path in paths {
            reports.push(self.run_file(path).await?);
        }

        Ok(reports)
    }

    async fn execute_statement(&self, statement: &SqlStatement) -> StatementOutcome {
        match self.executor.execute(&statement.sql).await {
            Ok(()) => StatementOutcome::Applied,
            Err(e) if e.is_already_exists() => StatementOutcome::AlreadyExists {
                message: e.to_string(),
            },
            Err(e) => StatementOutcome::Failed {
                message: e.to_string(),
            },
        }
    }
}
