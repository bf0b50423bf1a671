//! 마이그레이션 실행을 위한 데이터 모델.

use std::path::PathBuf;
use std::time::Duration;

use serde::Serialize;

use super::stats::MigrationStats;

/// SQL 문장 유형
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub enum StatementKind {
    /// CREATE TABLE
    CreateTable,
    /// CREATE VIEW
    CreateView,
    /// CREATE INDEX
    CreateIndex,
    /// CREATE FUNCTION
    CreateFunction,
    /// CREATE TRIGGER
    CreateTrigger,
    /// CREATE TYPE (ENUM 등)
    CreateType,
    /// CREATE EXTENSION
    CreateExtension,
    /// CREATE POLICY (RLS)
    CreatePolicy,
    /// DROP ...
    Drop,
    /// ALTER TABLE
    AlterTable,
    /// INSERT INTO
    Insert,
    /// UPDATE
    Update,
    /// DELETE FROM
    Delete,
    /// 기타 문장 (첫 키워드)
    Other(String),
}

impl StatementKind {
    /// CREATE 문장인지 확인
    pub fn is_create(&self) -> bool {
        matches!(
            self,
            StatementKind::CreateTable
                | StatementKind::CreateView
                | StatementKind::CreateIndex
                | StatementKind::CreateFunction
                | StatementKind::CreateTrigger
                | StatementKind::CreateType
                | StatementKind::CreateExtension
                | StatementKind::CreatePolicy
        )
    }

    /// 데이터 변경(DML) 문장인지 확인
    pub fn is_dml(&self) -> bool {
        matches!(
            self,
            StatementKind::Insert | StatementKind::Update | StatementKind::Delete
        )
    }
}

impl std::fmt::Display for StatementKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            StatementKind::CreateTable => write!(f, "CREATE TABLE"),
            StatementKind::CreateView => write!(f, "CREATE VIEW"),
            StatementKind::CreateIndex => write!(f, "CREATE INDEX"),
            StatementKind::CreateFunction => write!(f, "CREATE FUNCTION"),
            StatementKind::CreateTrigger => write!(f, "CREATE TRIGGER"),
            StatementKind::CreateType => write!(f, "CREATE TYPE"),
            StatementKind::CreateExtension => write!(f, "CREATE EXTENSION"),
            StatementKind::CreatePolicy => write!(f, "CREATE POLICY"),
            StatementKind::Drop => write!(f, "DROP"),
            StatementKind::AlterTable => write!(f, "ALTER TABLE"),
            StatementKind::Insert => write!(f, "INSERT"),
            StatementKind::Update => write!(f, "UPDATE"),
            StatementKind::Delete => write!(f, "DELETE"),
            StatementKind::Other(keyword) => write!(f, "{}", keyword),
        }
    }
}

/// 분할된 SQL 문장
#[derive(Debug, Clone, Serialize)]
pub struct SqlStatement {
    /// 문장 유형
    pub kind: StatementKind,
    /// 대상 객체 이름 (검출 실패 시 빈 문자열)
    pub object_name: String,
    /// 세미콜론을 제외한 SQL
    pub sql: String,
    /// 스크립트 내 시작 라인 (1-based)
    pub line_number: usize,
    /// IF NOT EXISTS 사용 여부
    pub if_not_exists: bool,
    /// IF EXISTS 사용 여부
    pub if_exists: bool,
}

impl SqlStatement {
    /// 로그용 한 줄 요약 (최대 80자)
    pub fn summary(&self) -> String {
        let flat: String = self.sql.split_whitespace().collect::<Vec<_>>().join(" ");
        if flat.chars().count() > 80 {
            let head: String = flat.chars().take(77).collect();
            format!("{}...", head)
        } else {
            flat
        }
    }
}

/// 문장 실행 결과
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", rename_all = "snake_case")]
pub enum StatementOutcome {
    /// 정상 적용
    Applied,
    /// 이미 존재 (재실행 시 정상 상황)
    AlreadyExists { message: String },
    /// 실패
    Failed { message: String },
    /// dry-run 모드로 실행하지 않음
    Skipped,
}

impl StatementOutcome {
    /// 실패로 집계되는지 확인
    pub fn is_failure(&self) -> bool {
        matches!(self, StatementOutcome::Failed { .. })
    }
}

/// 문장별 실행 기록
#[derive(Debug, Clone, Serialize)]
pub struct StatementResult {
    /// 스크립트 내 순번 (1-based)
    pub index: usize,
    /// 실행한 문장
    pub statement: SqlStatement,
    /// 결과
    pub outcome: StatementOutcome,
    /// 소요 시간
    #[serde(skip)]
    pub elapsed: Duration,
}

/// 디렉토리에서 찾은 마이그레이션 스크립트
#[derive(Debug, Clone)]
pub struct MigrationScript {
    /// 파일 경로
    pub path: PathBuf,
    /// 파일명 (확장자 제외)
    pub name: String,
    /// 파일명 앞 번호 (01_core.sql → 1)
    pub order: u32,
}

impl MigrationScript {
    /// 경로에서 스크립트 정보 생성
    pub fn from_path(path: PathBuf) -> Self {
        let name = path
            .file_stem()
            .and_then(|s| s.to_str())
            .unwrap_or("unknown")
            .to_string();
        let order = extract_order(&name);

        Self { path, name, order }
    }
}

/// 파일명에서 순서 번호 추출 (패턴: 01_name, 1_name)
pub fn extract_order(filename: &str) -> u32 {
    filename
        .split('_')
        .next()
        .and_then(|first| first.parse().ok())
        .unwrap_or(0)
}

/// 스크립트 하나의 실행 보고서
#[derive(Debug, Clone, Serialize)]
pub struct MigrationReport {
    /// 스크립트 이름
    pub script: String,
    /// dry-run 여부
    pub dry_run: bool,
    /// 집계
    pub stats: MigrationStats,
    /// 문장별 결과
    pub results: Vec<StatementResult>,
}

impl MigrationReport {
    /// 실패한 문장만 반환
    pub fn failures(&self) -> impl Iterator<Item = &StatementResult> {
        self.results.iter().filter(|r| r.outcome.is_failure())
    }

    /// 이미 존재하여 건너뛴 문장만 반환
    pub fn already_existing(&self) -> impl Iterator<Item = &StatementResult> {
        self.results
            .iter()
            .filter(|r| matches!(r.outcome, StatementOutcome::AlreadyExists { .. }))
    }
}

impl std::fmt::Display for MigrationReport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        writeln!(f, "═══════════════════════════════════════════════════════════════")?;
        writeln!(
            f,
            "  마이그레이션 결과: {}{}",
            self.script,
            if self.dry_run { " (dry-run)" } else { "" }
        )?;
        writeln!(f, "═══════════════════════════════════════════════════════════════")?;

        if self.dry_run {
            for result in &self.results {
                writeln!(
                    f,
                    "  {:>3}. L{:<4} {:<16} {}",
                    result.index,
                    result.statement.line_number,
                    result.statement.kind.to_string(),
                    result.statement.summary()
                )?;
            }
        }

        let existing: Vec<_> = self.already_existing().collect();
        if !existing.is_empty() {
            writeln!(f, "\n  ⏭️  이미 존재 ({} 건)", existing.len())?;
            for result in existing {
                writeln!(
                    f,
                    "     #{} L{} {}",
                    result.index,
                    result.statement.line_number,
                    result.statement.summary()
                )?;
            }
        }

        let failures: Vec<_> = self.failures().collect();
        if !failures.is_empty() {
            writeln!(f, "\n  ❌ 실패 ({} 건)", failures.len())?;
            for result in failures {
                if let StatementOutcome::Failed { message } = &result.outcome {
                    writeln!(
                        f,
                        "     #{} L{} {}\n        → {}",
                        result.index,
                        result.statement.line_number,
                        result.statement.summary(),
                        message
                    )?;
                }
            }
        }

        writeln!(f)?;
        writeln!(f, "  전체 문장: {}", self.stats.total)?;
        writeln!(f, "  ✅ 적용:    {}", self.stats.applied)?;
        writeln!(f, "  ⏭️  존재:    {}", self.stats.already_exists)?;
        writeln!(f, "  ❌ 실패:    {}", self.stats.failed)?;
        writeln!(f, "  성공률:    {:.1}%", self.stats.success_rate())?;
        write!(f, "───────────────────────────────────────────────────────────────")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_create() {
        assert!(StatementKind::CreateTable.is_create());
        assert!(StatementKind::CreateFunction.is_create());
        assert!(StatementKind::CreatePolicy.is_create());
        assert!(!StatementKind::Drop.is_create());
        assert!(!StatementKind::Insert.is_create());
    }

    #[test]
    fn test_extract_order_from_filename() {
        assert_eq!(extract_order("01_core_schema"), 1);
        assert_eq!(extract_order("10_gdpr"), 10);
        assert_eq!(extract_order("seed"), 0);
    }

    #[test]
    fn test_statement_summary_truncates() {
        let stmt = SqlStatement {
            kind: StatementKind::Insert,
            object_name: "apartments".to_string(),
            sql: format!("INSERT INTO apartments (title)\n  VALUES ('{}')", "x".repeat(120)),
            line_number: 3,
            if_not_exists: false,
            if_exists: false,
        };

        let summary = stmt.summary();
        assert_eq!(summary.chars().count(), 80);
        assert!(summary.starts_with("INSERT INTO apartments (title) VALUES"));
        assert!(summary.ends_with("..."));
    }
}
