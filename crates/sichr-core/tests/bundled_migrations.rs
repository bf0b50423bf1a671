//! 저장소에 포함된 `migrations/*.sql` 검증.

use std::path::PathBuf;
use std::sync::Mutex;

use async_trait::async_trait;
use sichr_core::migration::{ExecError, MigrationRunner, SqlExecutor, StatementKind, StatementSplitter};

fn migrations_dir() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../../migrations")
}

/// 실행된 문장을 기록하고, `existing`에 포함된 테이블 생성은 "이미 존재"로 거부
#[derive(Default)]
struct RecordingExecutor {
    existing: bool,
    executed: Mutex<Vec<String>>,
}

#[async_trait]
impl SqlExecutor for RecordingExecutor {
    fn name(&self) -> &str {
        "recording"
    }

    async fn execute(&self, sql: &str) -> Result<(), ExecError> {
        self.executed.lock().unwrap().push(sql.to_string());
        if self.existing && sql.starts_with("CREATE TABLE") {
            return Err(ExecError::Database {
                code: Some("42P07".to_string()),
                message: "relation already exists".to_string(),
            });
        }
        Ok(())
    }
}

#[test]
fn test_scripts_are_ordered() {
    let scripts = StatementSplitter::new().scan_directory(&migrations_dir()).unwrap();
    let names: Vec<_> = scripts.iter().map(|s| s.name.as_str()).collect();

    assert_eq!(names, ["01_core_schema", "02_gdpr", "03_payments"]);
}

#[test]
fn test_function_bodies_are_not_split() {
    let content = std::fs::read_to_string(migrations_dir().join("01_core_schema.sql")).unwrap();
    let statements = StatementSplitter::new().split(&content);

    let functions: Vec<_> = statements
        .iter()
        .filter(|s| s.kind == StatementKind::CreateFunction)
        .collect();
    assert_eq!(functions.len(), 2);
    for function in functions {
        assert!(function.sql.contains("END;"), "{}", function.sql);
        assert!(function.sql.trim_end().ends_with("$$"), "{}", function.sql);
    }

    let tables = statements
        .iter()
        .filter(|s| s.kind == StatementKind::CreateTable)
        .count();
    assert_eq!(tables, 5);
}

#[tokio::test]
async fn test_rerun_against_existing_schema_is_clean() {
    let runner = MigrationRunner::new(Box::new(RecordingExecutor {
        existing: true,
        ..Default::default()
    }));

    let reports = runner.run_directory(&migrations_dir()).await.unwrap();

    assert_eq!(reports.len(), 3);
    let tables: usize = reports.iter().map(|r| r.stats.already_exists).sum();
    let failed: usize = reports.iter().map(|r| r.stats.failed).sum();
    assert_eq!(tables, 8);
    assert_eq!(failed, 0);
}
