//! 마이그레이션 CLI 명령어.
//!
//! 문장 단위 실패는 보고서에 집계될 뿐 종료 코드에 영향을 주지 않습니다.
//! 실행기 구성, 파일 읽기 같은 실행 자체의 실패만 에러로 반환됩니다.

use std::path::PathBuf;

use anyhow::{bail, Context};
use secrecy::SecretString;
use sichr_core::migration::{
    MigrationReport, MigrationRunner, MigrationScript, MigrationStats, PgExecutor, SqlExecutor,
    StatementSplitter, SupabaseRpcConfig, SupabaseRpcExecutor,
};
use tracing::info;

/// 마이그레이션 액션
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MigrateAction {
    /// 실행
    Apply,
    /// 분할/분류 결과만 출력
    Plan,
}

impl MigrateAction {
    pub fn parse(s: &str) -> Option<Self> {
        match s.to_lowercase().as_str() {
            "apply" | "run" => Some(Self::Apply),
            "plan" | "dry-run" => Some(Self::Plan),
            _ => None,
        }
    }
}

/// 마이그레이션 설정
#[derive(Debug)]
pub struct MigrateConfig {
    /// 명시한 파일 (비어 있으면 디렉토리 스캔)
    pub files: Vec<PathBuf>,
    /// 마이그레이션 디렉토리
    pub migrations_dir: PathBuf,
    /// 직접 연결용 DB URL
    pub db_url: Option<String>,
    /// Supabase 프로젝트 URL
    pub supabase_url: Option<String>,
    /// Supabase service_role 키
    pub service_key: Option<SecretString>,
    /// apply에서도 실행 생략
    pub dry_run: bool,
}

impl Default for MigrateConfig {
    fn default() -> Self {
        Self {
            files: Vec::new(),
            migrations_dir: PathBuf::from("migrations"),
            db_url: None,
            supabase_url: None,
            service_key: None,
            dry_run: false,
        }
    }
}

impl MigrateConfig {
    /// 실행 대상 스크립트 목록 (번호 순)
    fn scripts(&self, splitter: &StatementSplitter) -> anyhow::Result<Vec<MigrationScript>> {
        if self.files.is_empty() {
            splitter
                .scan_directory(&self.migrations_dir)
                .with_context(|| format!("마이그레이션 디렉토리 스캔 실패: {:?}", self.migrations_dir))
        } else {
            Ok(self.files.iter().cloned().map(MigrationScript::from_path).collect())
        }
    }
}

/// DB URL 우선, 없으면 Supabase RPC 실행기 생성
async fn build_executor(config: &MigrateConfig) -> anyhow::Result<Box<dyn SqlExecutor>> {
    if let Some(db_url) = config.db_url.as_deref().filter(|u| !u.trim().is_empty()) {
        let executor = PgExecutor::connect(db_url)
            .await
            .context("데이터베이스 연결 실패")?;
        return Ok(Box::new(executor));
    }

    match (&config.supabase_url, &config.service_key) {
        (Some(url), Some(key)) => {
            let rpc = SupabaseRpcConfig::new(url.clone(), key.clone());
            let executor = SupabaseRpcExecutor::new(rpc).context("Supabase RPC 실행기 생성 실패")?;
            Ok(Box::new(executor))
        }
        _ => bail!(
            "실행 대상이 없습니다. --db-url (DATABASE_URL) 또는 \
             --supabase-url/--service-key (SUPABASE_URL, SUPABASE_SERVICE_ROLE_KEY)를 지정하세요"
        ),
    }
}

/// 명령 진입점
pub async fn run_migrate(action: MigrateAction, config: &MigrateConfig) -> anyhow::Result<()> {
    match action {
        MigrateAction::Plan => run_plan(config),
        MigrateAction::Apply if config.dry_run => run_plan(config),
        MigrateAction::Apply => run_apply(config).await,
    }
}

/// 분할 결과 출력 (DB 접속 없음)
pub fn run_plan(config: &MigrateConfig) -> anyhow::Result<()> {
    println!("\n🔍 마이그레이션 계획\n");

    let splitter = StatementSplitter::new();
    let scripts = config.scripts(&splitter)?;
    if scripts.is_empty() {
        bail!("마이그레이션 파일을 찾을 수 없습니다: {:?}", config.migrations_dir);
    }

    let mut total = 0;
    for script in &scripts {
        let content = std::fs::read_to_string(&script.path)
            .with_context(|| format!("파일 읽기 실패: {:?}", script.path))?;
        let statements = splitter.split(&content);
        total += statements.len();

        let creates = statements.iter().filter(|s| s.kind.is_create()).count();
        println!(
            "📄 {} ({} 문장, CREATE {})",
            script.name,
            statements.len(),
            creates
        );
        for (i, statement) in statements.iter().enumerate() {
            let guard = if statement.if_not_exists {
                " [IF NOT EXISTS]"
            } else if statement.if_exists {
                " [IF EXISTS]"
            } else {
                ""
            };
            println!(
                "   {:>3}. L{:<4} {:<16} {}{}",
                i + 1,
                statement.line_number,
                statement.kind.to_string(),
                statement.summary(),
                guard
            );
        }
        println!();
    }

    println!("총 {} 개 파일, {} 문장", scripts.len(), total);
    Ok(())
}

/// 스크립트 적용
pub async fn run_apply(config: &MigrateConfig) -> anyhow::Result<()> {
    println!("\n🚀 마이그레이션 적용 시작...\n");

    let executor = build_executor(config).await?;
    println!("   실행기: {}", executor.name());

    let runner = MigrationRunner::new(executor);
    let scripts = config.scripts(runner.splitter())?;
    if scripts.is_empty() {
        bail!("마이그레이션 파일을 찾을 수 없습니다: {:?}", config.migrations_dir);
    }

    let paths: Vec<PathBuf> = scripts.into_iter().map(|s| s.path).collect();
    let reports = runner.run_files(&paths).await?;

    for report in &reports {
        println!("{}", report);
    }

    let overall = summarize(&reports);
    print_summary(&overall, reports.len());

    info!(
        scripts = reports.len(),
        applied = overall.applied,
        already_exists = overall.already_exists,
        failed = overall.failed,
        "마이그레이션 적용 종료"
    );

    Ok(())
}

/// 전체 합산 통계
fn summarize(reports: &[MigrationReport]) -> MigrationStats {
    reports.iter().fold(MigrationStats::default(), |mut acc, report| {
        acc.merge(&report.stats);
        acc
    })
}

fn print_summary(stats: &MigrationStats, scripts: usize) {
    println!("═══════════════════════════════════════════════════════════════");
    println!("  전체 요약 ({} 개 스크립트)", scripts);
    println!("═══════════════════════════════════════════════════════════════");
    println!("  ✅ 적용:       {}", stats.applied);
    println!("  ⏭️  이미 존재:  {}", stats.already_exists);
    println!("  ❌ 실패:       {}", stats.failed);
    println!("  성공률:        {:.1}%", stats.success_rate());
    println!("  소요 시간:     {:.1}s", stats.elapsed.as_secs_f64());

    if stats.failed > 0 {
        println!("\n  ⚠️  일부 문장이 실패했습니다. 위 실패 목록을 확인하세요.");
    } else {
        println!("\n  🎉 모든 문장이 적용되었습니다.");
    }
}

#[cfg(test)]
mod tests {
    use std::fs;

    use super::*;

    #[test]
    fn test_action_parse() {
        assert_eq!(MigrateAction::parse("apply"), Some(MigrateAction::Apply));
        assert_eq!(MigrateAction::parse("PLAN"), Some(MigrateAction::Plan));
        assert_eq!(MigrateAction::parse("verify"), None);
    }

    #[test]
    fn test_plan_reads_directory() {
        let dir = tempfile::tempdir().unwrap();
        fs::write(
            dir.path().join("01_core.sql"),
            "CREATE TABLE IF NOT EXISTS users (id uuid);\nCREATE INDEX idx_users ON users(id);",
        )
        .unwrap();

        let config = MigrateConfig {
            migrations_dir: dir.path().to_path_buf(),
            ..Default::default()
        };
        assert!(run_plan(&config).is_ok());
    }

    #[test]
    fn test_plan_empty_directory_fails() {
        let dir = tempfile::tempdir().unwrap();
        let config = MigrateConfig {
            migrations_dir: dir.path().to_path_buf(),
            ..Default::default()
        };
        assert!(run_plan(&config).is_err());
    }

    #[tokio::test]
    async fn test_build_executor_uses_supabase_rpc() {
        let config = MigrateConfig {
            supabase_url: Some("https://xyz.supabase.co".to_string()),
            service_key: Some(SecretString::from("service-role-key".to_string())),
            ..Default::default()
        };

        let executor = build_executor(&config).await.unwrap();
        assert!(executor.name().to_lowercase().contains("supabase"));
    }

    #[tokio::test]
    async fn test_apply_without_target_fails() {
        let dir = tempfile::tempdir().unwrap();
        let config = MigrateConfig {
            migrations_dir: dir.path().to_path_buf(),
            ..Default::default()
        };
        let err = run_apply(&config).await.unwrap_err();
        assert!(err.to_string().contains("--db-url"));
    }
}
