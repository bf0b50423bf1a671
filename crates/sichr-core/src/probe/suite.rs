//! 프로브 스위트 정의와 로딩.
//!
//! TOML 파일 형식:
//!
//! ```toml
//! name = "smoke"
//!
//! [[case]]
//! name = "health"
//! path = "/api/health"
//! expect = [{ type = "status", one_of = [200] }, { type = "success_flag" }]
//! ```

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};
use serde_json::json;

use super::error::ProbeError;
use super::models::{Expectation, ProbeCase};

/// 순서가 있는 케이스 묶음
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeSuite {
    /// 스위트 이름
    pub name: String,
    /// 실행 순서대로 나열된 케이스
    #[serde(rename = "case", default)]
    pub cases: Vec<ProbeCase>,
}

impl ProbeSuite {
    /// TOML 문자열에서 로드
    pub fn from_toml_str(content: &str, origin: &Path) -> Result<Self, ProbeError> {
        let suite: ProbeSuite = toml::from_str(content).map_err(|source| ProbeError::Parse {
            path: origin.to_path_buf(),
            source,
        })?;
        suite.validate()?;
        Ok(suite)
    }

    /// TOML 파일에서 로드
    pub fn load(path: &Path) -> Result<Self, ProbeError> {
        let content = fs::read_to_string(path).map_err(|source| ProbeError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&content, path)
    }

    fn validate(&self) -> Result<(), ProbeError> {
        for case in &self.cases {
            if reqwest::Method::from_bytes(case.method.as_bytes()).is_err() {
                return Err(ProbeError::InvalidCase {
                    case: case.name.clone(),
                    reason: format!("알 수 없는 메서드 '{}'", case.method),
                });
            }
            if !case.path.starts_with('/') {
                return Err(ProbeError::InvalidCase {
                    case: case.name.clone(),
                    reason: format!("경로는 '/'로 시작해야 합니다: {}", case.path),
                });
            }
        }
        Ok(())
    }
}

/// 공개 엔드포인트 기본 점검 스위트
pub fn smoke_suite() -> ProbeSuite {
    ProbeSuite {
        name: "smoke".to_string(),
        cases: vec![
            ProbeCase::get("health", "/api/health")
                .expect(Expectation::status(200))
                .expect(Expectation::SuccessFlag)
                .expect(Expectation::JsonEquals {
                    pointer: "/status".to_string(),
                    value: json!("ok"),
                }),
            ProbeCase::get("csrf-token", "/api/csrf-token")
                .expect(Expectation::status(200))
                .expect(Expectation::JsonPresent {
                    pointer: "/csrfToken".to_string(),
                }),
            ProbeCase::get("paypal-config", "/api/paypal-config")
                .expect(Expectation::status(200))
                .expect(Expectation::JsonPresent {
                    pointer: "/clientId".to_string(),
                }),
            ProbeCase::get("apartments", "/api/apartments?limit=5")
                .expect(Expectation::status(200))
                .expect(Expectation::SuccessFlag)
                .expect(Expectation::JsonArray {
                    pointer: "/apartments".to_string(),
                }),
            ProbeCase::post(
                "upload-apartment-unauthorized",
                "/api/upload-apartment",
                json!({ "title": "smoke" }),
            )
            .expect(Expectation::Status {
                one_of: vec![401, 403],
            }),
            ProbeCase::get("auth-me-unauthorized", "/auth/me").expect(Expectation::Status {
                one_of: vec![401, 403],
            }),
        ],
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_toml_suite() {
        let content = r#"
name = "payment-workflow"

[[case]]
name = "login"
method = "POST"
path = "/auth/login"
body = { email = "tenant@example.com", password = "secret123" }
expect = [{ type = "status", one_of = [200] }, { type = "json_present", pointer = "/token" }]
captures = { token = "/token" }

[[case]]
name = "me"
path = "/auth/me"
headers = { Authorization = "Bearer {{token}}" }
expect = [{ type = "json_equals", pointer = "/user/email", value = "tenant@example.com" }]
"#;
        let suite = ProbeSuite::from_toml_str(content, Path::new("inline.toml")).unwrap();

        assert_eq!(suite.name, "payment-workflow");
        assert_eq!(suite.cases.len(), 2);
        assert_eq!(suite.cases[0].method, "POST");
        assert_eq!(suite.cases[0].captures["token"], "/token");
        assert_eq!(suite.cases[1].method, "GET");
        assert_eq!(
            suite.cases[1].expect[0],
            Expectation::JsonEquals {
                pointer: "/user/email".to_string(),
                value: json!("tenant@example.com"),
            }
        );
    }

    #[test]
    fn test_invalid_suite_is_rejected() {
        let bad_path = "name = \"x\"\n[[case]]\nname = \"a\"\npath = \"api/health\"\n";
        assert!(matches!(
            ProbeSuite::from_toml_str(bad_path, Path::new("x.toml")),
            Err(ProbeError::InvalidCase { .. })
        ));

        let bad_expect = "name = \"x\"\n[[case]]\nname = \"a\"\npath = \"/\"\nexpect = [{ type = \"vibes\" }]\n";
        assert!(matches!(
            ProbeSuite::from_toml_str(bad_expect, Path::new("x.toml")),
            Err(ProbeError::Parse { .. })
        ));
    }

    #[test]
    fn test_load_missing_file() {
        assert!(matches!(
            ProbeSuite::load(Path::new("/nonexistent/suite.toml")),
            Err(ProbeError::Io { .. })
        ));
    }

    #[test]
    fn test_smoke_suite_is_valid() {
        let suite = smoke_suite();
        assert!(suite.validate().is_ok());
        assert!(suite.cases.iter().all(|c| !c.expect.is_empty()));
    }
}
