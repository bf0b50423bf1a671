//! 프로브 실행기.
//!
//! 케이스를 순차적으로 호출합니다. 재시도와 병렬 실행은 없으며,
//! 연결 실패는 해당 케이스의 실패로만 집계됩니다.

use std::collections::HashMap;
use std::time::{Duration, Instant};

use reqwest::Method;
use serde_json::Value;
use tracing::{debug, info, warn};

use super::error::ProbeError;
use super::models::{substitute, substitute_json, ProbeCase, ProbeResult};
use super::report::ProbeReport;
use super::suite::ProbeSuite;

/// 기본 대상 서버
pub const DEFAULT_BASE_URL: &str = "http://localhost:3001";

/// 프로브 설정
#[derive(Debug, Clone)]
pub struct ProbeConfig {
    /// 대상 서버 base URL
    pub base_url: String,
    /// 요청별 타임아웃
    pub timeout: Duration,
    /// 첫 요청 전 대기 시간 (서버 기동 대기)
    pub startup_delay: Duration,
}

impl Default for ProbeConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: Duration::from_secs(10),
            startup_delay: Duration::from_secs(2),
        }
    }
}

impl ProbeConfig {
    /// base URL만 지정하여 생성
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// 환경변수에서 로드 (`PROBE_BASE_URL`)
    pub fn from_env() -> Self {
        match std::env::var("PROBE_BASE_URL") {
            Ok(url) if !url.trim().is_empty() => Self::new(url),
            _ => Self::default(),
        }
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    pub fn with_startup_delay(mut self, delay: Duration) -> Self {
        self.startup_delay = delay;
        self
    }
}

/// 엔드포인트 점검 실행기
pub struct ProbeRunner {
    config: ProbeConfig,
    client: reqwest::Client,
}

impl ProbeRunner {
    /// 새 실행기 생성
    pub fn new(config: ProbeConfig) -> Result<Self, ProbeError> {
        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .build()
            .map_err(|e| ProbeError::Client(e.to_string()))?;

        Ok(Self { config, client })
    }

    pub fn config(&self) -> &ProbeConfig {
        &self.config
    }

    /// 스위트 실행
    ///
    /// 모든 케이스를 끝까지 실행하며 에러를 반환하지 않습니다.
    pub async fn run(&self, suite: &ProbeSuite) -> ProbeReport {
        let started = Instant::now();

        info!(
            suite = %suite.name,
            base_url = %self.config.base_url,
            cases = suite.cases.len(),
            "엔드포인트 점검 시작"
        );

        if !self.config.startup_delay.is_zero() {
            tokio::time::sleep(self.config.startup_delay).await;
        }

        let mut vars: HashMap<String, String> = HashMap::new();
        let mut results = Vec::with_capacity(suite.cases.len());

        for (idx, case) in suite.cases.iter().enumerate() {
            let result = self.run_case(case, &mut vars).await;

            if result.passed {
                info!(
                    progress = format!("[{}/{}]", idx + 1, suite.cases.len()),
                    case = %result.name,
                    status = ?result.status,
                    elapsed_ms = result.elapsed.as_millis() as u64,
                    "통과"
                );
            } else {
                warn!(
                    progress = format!("[{}/{}]", idx + 1, suite.cases.len()),
                    case = %result.name,
                    status = ?result.status,
                    detail = %result.detail,
                    "실패"
                );
            }
            results.push(result);
        }

        let report = ProbeReport {
            suite: suite.name.clone(),
            base_url: self.config.base_url.clone(),
            results,
            elapsed: started.elapsed(),
        };

        info!(
            suite = %report.suite,
            passed = report.passed(),
            failed = report.failed(),
            success_rate = format!("{:.1}%", report.success_rate()),
            "엔드포인트 점검 완료"
        );

        report
    }

    async fn run_case(&self, case: &ProbeCase, vars: &mut HashMap<String, String>) -> ProbeResult {
        let started = Instant::now();
        let method = case.method.to_uppercase();
        let mut result = ProbeResult {
            name: case.name.clone(),
            method: method.clone(),
            path: case.path.clone(),
            passed: false,
            status: None,
            detail: String::new(),
            elapsed: Duration::ZERO,
        };

        let outcome = self.call(case, &method, vars, &mut result).await;
        result.elapsed = started.elapsed();
        match outcome {
            Ok(()) => {
                result.passed = true;
                result.detail = "OK".to_string();
            }
            Err(reason) => result.detail = reason,
        }
        result
    }

    /// 요청 하나를 보내고 검증. 실패 사유를 Err로 반환
    async fn call(
        &self,
        case: &ProbeCase,
        method: &str,
        vars: &mut HashMap<String, String>,
        result: &mut ProbeResult,
    ) -> Result<(), String> {
        let unresolved = |name: String| format!("해석되지 않은 변수 {{{{{}}}}}", name);

        let path = substitute(&case.path, vars).map_err(unresolved)?;
        result.path = path.clone();

        let method = Method::from_bytes(method.as_bytes())
            .map_err(|_| format!("알 수 없는 메서드 '{}'", method))?;
        let url = format!("{}{}", self.config.base_url.trim_end_matches('/'), path);

        let mut request = self.client.request(method, &url);
        for (name, value) in &case.headers {
            request = request.header(name.as_str(), substitute(value, vars).map_err(unresolved)?);
        }
        if let Some(body) = &case.body {
            request = request.json(&substitute_json(body, vars).map_err(unresolved)?);
        }

        debug!(url = %url, "요청 전송");
        let response = request
            .send()
            .await
            .map_err(|e| format!("요청 실패: {}", e))?;

        let status = response.status().as_u16();
        result.status = Some(status);

        let body = response
            .text()
            .await
            .map_err(|e| format!("응답 본문 읽기 실패: {}", e))?;
        let json: Option<Value> = serde_json::from_str(&body).ok();

        if case.expect.is_empty() {
            if !(200..300).contains(&status) {
                return Err(format!("상태 코드 {}", status));
            }
        } else {
            for expectation in &case.expect {
                expectation.check(status, &body, json.as_ref())?;
            }
        }

        for (var, pointer) in &case.captures {
            let value = json
                .as_ref()
                .and_then(|j| j.pointer(pointer))
                .ok_or_else(|| format!("캡처 실패: '{}' 위치에 값 없음", pointer))?;
            let text = match value {
                Value::String(s) => s.clone(),
                other => other.to_string(),
            };
            vars.insert(var.clone(), text);
        }

        Ok(())
    }
}
