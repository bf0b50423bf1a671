//! 프로브 케이스와 검증 조건.

use std::collections::{BTreeMap, HashMap};
use std::time::Duration;

use serde::{Deserialize, Serialize};
use serde_json::Value;

fn default_method() -> String {
    "GET".to_string()
}

/// 엔드포인트 호출 하나
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProbeCase {
    /// 표시 이름
    pub name: String,
    /// HTTP 메서드
    #[serde(default = "default_method")]
    pub method: String,
    /// base URL 뒤에 붙는 경로 (`{{var}}` 치환 가능)
    pub path: String,
    /// 추가 헤더
    #[serde(default)]
    pub headers: BTreeMap<String, String>,
    /// JSON 본문
    #[serde(default)]
    pub body: Option<Value>,
    /// 응답 검증 조건 (비어 있으면 2xx 여부만 확인)
    #[serde(default)]
    pub expect: Vec<Expectation>,
    /// 응답에서 추출할 변수 (이름 → JSON pointer)
    #[serde(default)]
    pub captures: BTreeMap<String, String>,
}

impl ProbeCase {
    /// GET 케이스 생성
    pub fn get(name: impl Into<String>, path: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            method: "GET".to_string(),
            path: path.into(),
            headers: BTreeMap::new(),
            body: None,
            expect: Vec::new(),
            captures: BTreeMap::new(),
        }
    }

    /// JSON 본문이 있는 POST 케이스 생성
    pub fn post(name: impl Into<String>, path: impl Into<String>, body: Value) -> Self {
        Self {
            method: "POST".to_string(),
            body: Some(body),
            ..Self::get(name, path)
        }
    }

    /// 검증 조건 추가
    pub fn expect(mut self, expectation: Expectation) -> Self {
        self.expect.push(expectation);
        self
    }

    /// 헤더 추가
    pub fn header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    /// 응답 값 캡처 추가
    pub fn capture(mut self, var: impl Into<String>, pointer: impl Into<String>) -> Self {
        self.captures.insert(var.into(), pointer.into());
        self
    }
}

/// 응답에 대한 엄격한 검증 조건
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Expectation {
    /// 상태 코드가 목록 중 하나
    Status { one_of: Vec<u16> },
    /// `/success == true`
    SuccessFlag,
    /// pointer 위치의 값이 배열 (빈 pointer = 루트)
    JsonArray {
        #[serde(default)]
        pointer: String,
    },
    /// pointer 위치의 값이 주어진 값과 동일
    JsonEquals { pointer: String, value: Value },
    /// pointer 위치에 값이 존재
    JsonPresent { pointer: String },
    /// 본문에 문자열 포함 (JSON이 아닌 응답용)
    BodyContains { text: String },
}

impl Expectation {
    /// 상태 코드 하나만 허용
    pub fn status(code: u16) -> Self {
        Expectation::Status { one_of: vec![code] }
    }

    /// 응답 검증. 실패 시 사유 반환
    pub fn check(&self, status: u16, body: &str, json: Option<&Value>) -> Result<(), String> {
        match self {
            Expectation::Status { one_of } => {
                if one_of.contains(&status) {
                    Ok(())
                } else {
                    Err(format!("상태 코드 {} (기대값 {:?})", status, one_of))
                }
            }
            Expectation::SuccessFlag => match lookup(json, "/success")? {
                Value::Bool(true) => Ok(()),
                other => Err(format!("success 플래그가 true가 아님: {}", other)),
            },
            Expectation::JsonArray { pointer } => match lookup(json, pointer)? {
                Value::Array(_) => Ok(()),
                other => Err(format!("'{}' 위치가 배열이 아님: {}", pointer, kind_of(other))),
            },
            Expectation::JsonEquals { pointer, value } => {
                let actual = lookup(json, pointer)?;
                if actual == value {
                    Ok(())
                } else {
                    Err(format!("'{}' = {} (기대값 {})", pointer, actual, value))
                }
            }
            Expectation::JsonPresent { pointer } => lookup(json, pointer).map(|_| ()),
            Expectation::BodyContains { text } => {
                if body.contains(text.as_str()) {
                    Ok(())
                } else {
                    Err(format!("본문에 '{}' 없음", text))
                }
            }
        }
    }
}

fn lookup<'a>(json: Option<&'a Value>, pointer: &str) -> Result<&'a Value, String> {
    let json = json.ok_or_else(|| "응답이 JSON이 아님".to_string())?;
    json.pointer(pointer)
        .ok_or_else(|| format!("'{}' 위치에 값 없음", pointer))
}

fn kind_of(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "bool",
        Value::Number(_) => "number",
        Value::String(_) => "string",
        Value::Array(_) => "array",
        Value::Object(_) => "object",
    }
}

/// 케이스 하나의 실행 결과
#[derive(Debug, Clone, Serialize)]
pub struct ProbeResult {
    /// 케이스 이름
    pub name: String,
    /// HTTP 메서드
    pub method: String,
    /// 치환 후 경로
    pub path: String,
    /// 통과 여부
    pub passed: bool,
    /// 응답 상태 코드 (연결 실패 시 None)
    pub status: Option<u16>,
    /// 실패 사유 또는 요약
    pub detail: String,
    /// 소요 시간
    #[serde(skip)]
    pub elapsed: Duration,
}

// ============================================================================
// 변수 치환
// ============================================================================

/// 문자열의 `{{name}}`을 캡처 값으로 치환
///
/// 해석되지 않는 자리표시자가 있으면 그 이름을 에러로 반환합니다.
pub fn substitute(template: &str, vars: &HashMap<String, String>) -> Result<String, String> {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(start) = rest.find("{{") {
        out.push_str(&rest[..start]);
        let after = &rest[start + 2..];
        let Some(end) = after.find("}}") else {
            out.push_str(&rest[start..]);
            return Ok(out);
        };

        let name = after[..end].trim();
        match vars.get(name) {
            Some(value) => out.push_str(value),
            None => return Err(name.to_string()),
        }
        rest = &after[end + 2..];
    }

    out.push_str(rest);
    Ok(out)
}

/// JSON 값 내부의 모든 문자열에 치환 적용
pub fn substitute_json(value: &Value, vars: &HashMap<String, String>) -> Result<Value, String> {
    Ok(match value {
        Value::String(s) => Value::String(substitute(s, vars)?),
        Value::Array(items) => Value::Array(
            items
                .iter()
                .map(|v| substitute_json(v, vars))
                .collect::<Result<_, _>>()?,
        ),
        Value::Object(map) => {
            let mut out = serde_json::Map::with_capacity(map.len());
            for (k, v) in map {
                out.insert(k.clone(), substitute_json(v, vars)?);
            }
            Value::Object(out)
        }
        other => other.clone(),
    })
}
