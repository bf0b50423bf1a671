//! SichrPlace 운영 CLI.
//!
//! # 사용 예시
//!
//! ```bash
//! # migrations/ 디렉토리 전체 적용 (DATABASE_URL 직접 연결)
//! sichr migrate apply --dir migrations
//!
//! # Supabase exec_sql RPC로 단일 파일 적용
//! sichr migrate apply --file migrations/01_core_schema.sql \
//!     --supabase-url https://xyz.supabase.co --service-key "$SUPABASE_SERVICE_ROLE_KEY"
//!
//! # 실행 없이 분할 결과만 확인
//! sichr migrate plan --dir migrations
//!
//! # 기본 스모크 스위트
//! sichr probe --base-url http://localhost:3001
//!
//! # TOML 스위트
//! sichr probe --suite probes/payment_workflow.toml
//! ```

use std::path::PathBuf;

use clap::{Parser, Subcommand};

mod commands;

use commands::{
    migrate::{run_migrate, MigrateAction, MigrateConfig},
    probe::{run_probe, ProbeArgs},
};

#[derive(Parser)]
#[command(name = "sichr")]
#[command(about = "SichrPlace CLI - SQL 마이그레이션 적용 및 엔드포인트 점검", long_about = None)]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// SQL 마이그레이션 (apply: 실행, plan: 분할 결과만 출력)
    Migrate {
        /// 액션 (apply, plan)
        #[arg(value_name = "ACTION", default_value = "apply")]
        action: String,

        /// 단일 SQL 파일 (지정 시 --dir 무시, 여러 번 지정 가능)
        #[arg(short, long)]
        file: Vec<PathBuf>,

        /// 마이그레이션 디렉토리
        #[arg(short, long, default_value = "migrations")]
        dir: PathBuf,

        /// 데이터베이스 URL
        #[arg(long, env = "DATABASE_URL", hide_env_values = true)]
        db_url: Option<String>,

        /// Supabase 프로젝트 URL (DB URL이 없을 때 RPC 경로 사용)
        #[arg(long, env = "SUPABASE_URL")]
        supabase_url: Option<String>,

        /// Supabase service_role 키
        #[arg(long, env = "SUPABASE_SERVICE_ROLE_KEY", hide_env_values = true)]
        service_key: Option<String>,

        /// 실행 없이 분할/분류만 수행
        #[arg(long)]
        dry_run: bool,
    },

    /// 실행 중인 서버에 대한 엔드포인트 점검
    Probe {
        /// 대상 서버 URL
        #[arg(long, env = "PROBE_BASE_URL", default_value = sichr_core::probe::DEFAULT_BASE_URL)]
        base_url: String,

        /// TOML 스위트 파일 (미지정 시 기본 스모크 스위트)
        #[arg(short, long)]
        suite: Option<PathBuf>,

        /// 요청별 타임아웃 (초)
        #[arg(long, default_value = "10")]
        timeout_secs: u64,

        /// 첫 요청 전 대기 (밀리초)
        #[arg(long, default_value = "2000")]
        startup_delay_ms: u64,
    },
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // .env 파일 로드 (없어도 에러 안남)
    dotenvy::dotenv().ok();

    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "sichr_core=info,sichr=info".into()),
        )
        .init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Migrate {
            action,
            file,
            dir,
            db_url,
            supabase_url,
            service_key,
            dry_run,
        } => {
            let action = MigrateAction::parse(&action).ok_or_else(|| {
                anyhow::anyhow!("Unknown migrate action: {}. Supported: apply, plan", action)
            })?;

            let config = MigrateConfig {
                files: file,
                migrations_dir: dir,
                db_url,
                supabase_url,
                service_key: service_key.map(Into::into),
                dry_run,
            };

            run_migrate(action, &config).await?;
        }

        Commands::Probe {
            base_url,
            suite,
            timeout_secs,
            startup_delay_ms,
        } => {
            let args = ProbeArgs {
                base_url,
                suite,
                timeout_secs,
                startup_delay_ms,
            };

            run_probe(&args).await?;
        }
    }

    Ok(())
}
