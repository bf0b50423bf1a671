//! SQL 스크립트 분할기.
//!
//! 세미콜론 기준으로 문장을 나누되 문자열 리터럴(`E'...'` 이스케이프 문자열 포함),
//! 따옴표 식별자, `$$`/`$tag$` 블록(함수 본문 등) 안의 세미콜론은 무시합니다.
//! 주석은 제거되며, 주석만 남은 조각은 버려집니다.

use std::{fs, path::Path};

use super::error::MigrationError;
use super::models::*;

/// 스캔 상태
#[derive(Debug, Clone, PartialEq, Eq)]
enum ScanState {
    Code,
    SingleQuote,
    /// `E'...'`: 백슬래시가 다음 문자를 이스케이프
    EscapeQuote,
    DoubleQuote,
    LineComment,
    BlockComment(usize),
    Dollar(String),
}

/// SQL 문장 분할기
#[derive(Debug, Default, Clone)]
pub struct StatementSplitter;

impl StatementSplitter {
    /// 새 분할기 생성
    pub fn new() -> Self {
        Self
    }

    /// 디렉토리에서 `*.sql` 스크립트 스캔 (번호 → 이름 순 정렬)
    pub fn scan_directory(&self, dir: &Path) -> Result<Vec<MigrationScript>, MigrationError> {
        if !dir.is_dir() {
            return Err(MigrationError::DirectoryNotFound(dir.to_path_buf()));
        }

        let entries = fs::read_dir(dir).map_err(|source| MigrationError::Io {
            path: dir.to_path_buf(),
            source,
        })?;

        let mut scripts: Vec<MigrationScript> = entries
            .flatten()
            .map(|entry| entry.path())
            .filter(|path| path.extension().is_some_and(|e| e == "sql"))
            .map(MigrationScript::from_path)
            .collect();

        scripts.sort_by(|a, b| a.order.cmp(&b.order).then_with(|| a.name.cmp(&b.name)));

        Ok(scripts)
    }

    /// 스크립트 내용을 문장 단위로 분할
    pub fn split(&self, content: &str) -> Vec<SqlStatement> {
        let chars: Vec<char> = content.chars().collect();
        let mut statements = Vec::new();

        let mut current = String::new();
        let mut start_line = 1;
        let mut line = 1;
        let mut state = ScanState::Code;
        let mut i = 0;

        while i < chars.len() {
            let c = chars[i];
            let next = chars.get(i + 1).copied();

            match &mut state {
                ScanState::Code => match c {
                    '-' if next == Some('-') => {
                        state = ScanState::LineComment;
                        i += 2;
                        continue;
                    }
                    '/' if next == Some('*') => {
                        state = ScanState::BlockComment(1);
                        i += 2;
                        continue;
                    }
                    ';' => {
                        self.flush(&mut current, start_line, &mut statements);
                    }
                    '$' => {
                        if let Some(tag) = dollar_tag(&chars, i) {
                            if current.is_empty() {
                                start_line = line;
                            }
                            current.push_str(&tag);
                            i += tag.chars().count();
                            state = ScanState::Dollar(tag);
                            continue;
                        }
                        if current.is_empty() {
                            start_line = line;
                        }
                        current.push(c);
                    }
                    _ if c.is_whitespace() && current.is_empty() => {}
                    _ => {
                        if current.is_empty() {
                            start_line = line;
                        }
                        current.push(c);
                        if c == '\'' {
                            state = if is_escape_prefix(&chars, i) {
                                ScanState::EscapeQuote
                            } else {
                                ScanState::SingleQuote
                            };
                        } else if c == '"' {
                            state = ScanState::DoubleQuote;
                        }
                    }
                },
                ScanState::SingleQuote => {
                    current.push(c);
                    if c == '\'' {
                        if next == Some('\'') {
                            // 이스케이프된 따옴표 ('')
                            current.push('\'');
                            i += 2;
                            continue;
                        }
                        state = ScanState::Code;
                    }
                }
                ScanState::EscapeQuote => {
                    current.push(c);
                    if c == '\\' {
                        if let Some(escaped) = next {
                            current.push(escaped);
                            if escaped == '\n' {
                                line += 1;
                            }
                            i += 2;
                            continue;
                        }
                    } else if c == '\'' {
                        if next == Some('\'') {
                            current.push('\'');
                            i += 2;
                            continue;
                        }
                        state = ScanState::Code;
                    }
                }
                ScanState::DoubleQuote => {
                    current.push(c);
                    if c == '"' {
                        state = ScanState::Code;
                    }
                }
                ScanState::LineComment => {
                    if c == '\n' {
                        state = ScanState::Code;
                        if !current.is_empty() {
                            current.push('\n');
                        }
                    }
                }
                ScanState::BlockComment(depth) => {
                    if c == '*' && next == Some('/') {
                        *depth -= 1;
                        if *depth == 0 {
                            state = ScanState::Code;
                            if !current.is_empty() {
                                current.push(' ');
                            }
                        }
                        i += 2;
                        continue;
                    }
                    if c == '/' && next == Some('*') {
                        *depth += 1;
                        i += 2;
                        continue;
                    }
                    if c == '\n' {
                        line += 1;
                    }
                    i += 1;
                    continue;
                }
                ScanState::Dollar(tag) => {
                    let tag_len = tag.chars().count();
                    if starts_with_at(&chars, i, tag) {
                        current.push_str(tag);
                        i += tag_len;
                        state = ScanState::Code;
                        continue;
                    }
                    current.push(c);
                }
            }

            if c == '\n' {
                line += 1;
            }
            i += 1;
        }

        // 마지막 문장 (세미콜론 없이 끝난 경우)
        self.flush(&mut current, start_line, &mut statements);

        statements
    }

    fn flush(&self, current: &mut String, start_line: usize, statements: &mut Vec<SqlStatement>) {
        let sql = current.trim();
        if !sql.is_empty() {
            statements.push(self.parse_statement(sql, start_line));
        }
        current.clear();
    }

    /// 단일 문장 분류
    fn parse_statement(&self, sql: &str, line_number: usize) -> SqlStatement {
        let flat_upper = sql
            .split_whitespace()
            .collect::<Vec<_>>()
            .join(" ")
            .to_ascii_uppercase();
        let (kind, object_name) = self.classify(sql);

        SqlStatement {
            kind,
            object_name,
            sql: sql.to_string(),
            line_number,
            if_not_exists: flat_upper.contains("IF NOT EXISTS"),
            if_exists: flat_upper.contains("IF EXISTS"),
        }
    }

    /// 문장 유형 및 대상 객체 검출
    fn classify(&self, sql: &str) -> (StatementKind, String) {
        let tokens: Vec<&str> = sql.split_whitespace().collect();
        let upper: Vec<String> = tokens.iter().map(|t| t.to_ascii_uppercase()).collect();
        let word = |i: usize| upper.get(i).map(String::as_str).unwrap_or("");
        let name_at = |i: usize| {
            tokens
                .get(i)
                .map(|t| self.clean_object_name(t))
                .unwrap_or_default()
        };

        match word(0) {
            "CREATE" => {
                let mut i = 1;
                if word(i) == "OR" && word(i + 1) == "REPLACE" {
                    i += 2;
                }
                while matches!(
                    word(i),
                    "TEMP" | "TEMPORARY" | "UNLOGGED" | "UNIQUE" | "MATERIALIZED" | "RECURSIVE"
                ) {
                    i += 1;
                }

                let kind = match word(i) {
                    "TABLE" => StatementKind::CreateTable,
                    "VIEW" => StatementKind::CreateView,
                    "INDEX" => StatementKind::CreateIndex,
                    "FUNCTION" | "PROCEDURE" => StatementKind::CreateFunction,
                    "TRIGGER" => StatementKind::CreateTrigger,
                    "TYPE" => StatementKind::CreateType,
                    "EXTENSION" => StatementKind::CreateExtension,
                    "POLICY" => StatementKind::CreatePolicy,
                    other => {
                        let keyword = format!("CREATE {}", other).trim_end().to_string();
                        return (StatementKind::Other(keyword), String::new());
                    }
                };
                i += 1;

                if kind == StatementKind::CreateIndex && word(i) == "CONCURRENTLY" {
                    i += 1;
                }
                if word(i) == "IF" && word(i + 1) == "NOT" && word(i + 2) == "EXISTS" {
                    i += 3;
                }
                // 이름 없는 인덱스: CREATE INDEX ON table (...)
                if kind == StatementKind::CreateIndex && word(i) == "ON" {
                    return (kind, String::new());
                }

                (kind, name_at(i))
            }
            "DROP" => {
                let mut i = if word(1) == "MATERIALIZED" { 3 } else { 2 };
                if word(i) == "IF" && word(i + 1) == "EXISTS" {
                    i += 2;
                }
                (StatementKind::Drop, name_at(i))
            }
            "ALTER" if word(1) == "TABLE" => {
                let mut i = 2;
                if word(i) == "IF" && word(i + 1) == "EXISTS" {
                    i += 2;
                }
                if word(i) == "ONLY" {
                    i += 1;
                }
                (StatementKind::AlterTable, name_at(i))
            }
            "INSERT" if word(1) == "INTO" => (StatementKind::Insert, name_at(2)),
            "UPDATE" => {
                let i = if word(1) == "ONLY" { 2 } else { 1 };
                (StatementKind::Update, name_at(i))
            }
            "DELETE" if word(1) == "FROM" => (StatementKind::Delete, name_at(2)),
            "" => (StatementKind::Other("UNKNOWN".to_string()), String::new()),
            other => (StatementKind::Other(other.to_string()), String::new()),
        }
    }

    /// 객체명 정리 (괄호 이후 제거, 스키마 prefix 제거, 소문자 변환)
    fn clean_object_name(&self, token: &str) -> String {
        let name = token.split('(').next().unwrap_or(token);
        let name = name.trim_matches(|c: char| c == ';' || c == ',');
        // public.users → users
        let name = name.rsplit('.').next().unwrap_or(name);

        name.trim_matches(|c: char| c == '"' || c == '\'')
            .to_lowercase()
    }
}

/// `i` 위치에서 시작하는 달러 인용 태그(`$$`, `$body$`) 검출
fn dollar_tag(chars: &[char], i: usize) -> Option<String> {
    // 식별자 일부인 `$`는 태그가 아님 (예: a$b)
    if i > 0 {
        let prev = chars[i - 1];
        if prev.is_alphanumeric() || prev == '_' {
            return None;
        }
    }

    let mut j = i + 1;
    while j < chars.len() && (chars[j].is_alphanumeric() || chars[j] == '_') {
        j += 1;
    }

    if j >= chars.len() || chars[j] != '$' {
        return None;
    }
    // $1 같은 위치 파라미터 제외
    if chars.get(i + 1).is_some_and(|c| c.is_ascii_digit()) {
        return None;
    }

    Some(chars[i..=j].iter().collect())
}

/// `i` 위치의 `'`가 `E'...'` 이스케이프 문자열의 시작인지 (`e`/`E` 앞이 식별자가 아니어야 함)
fn is_escape_prefix(chars: &[char], i: usize) -> bool {
    if i == 0 || !matches!(chars[i - 1], 'E' | 'e') {
        return false;
    }
    match i.checked_sub(2).map(|j| chars[j]) {
        Some(before) => !(before.is_alphanumeric() || before == '_' || before == '$'),
        None => true,
    }
}

fn starts_with_at(chars: &[char], i: usize, pattern: &str) -> bool {
    let mut idx = i;
    for p in pattern.chars() {
        if chars.get(idx) != Some(&p) {
            return false;
        }
        idx += 1;
    }
    true
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_split_discards_comments_and_blanks() {
        let splitter = StatementSplitter::new();
        let sql = r#"
-- 사용자 테이블
CREATE TABLE IF NOT EXISTS users (id UUID PRIMARY KEY, email TEXT);

-- 빈 조각
;
/* 블록 주석만 있는 조각 */ ;
CREATE INDEX IF NOT EXISTS idx_users_email ON users (email);
"#;
        let stmts = splitter.split(sql);

        assert_eq!(stmts.len(), 2);
        assert_eq!(stmts[0].kind, StatementKind::CreateTable);
        assert_eq!(stmts[0].object_name, "users");
        assert_eq!(stmts[0].line_number, 3);
        assert!(stmts[0].if_not_exists);
        assert!(!stmts[0].sql.ends_with(';'));

        assert_eq!(stmts[1].kind, StatementKind::CreateIndex);
        assert_eq!(stmts[1].object_name, "idx_users_email");
        assert_eq!(stmts[1].line_number, 8);
    }

    #[test]
    fn test_split_keeps_dollar_quoted_body() {
        let splitter = StatementSplitter::new();
        let sql = r#"
CREATE OR REPLACE FUNCTION public.touch_updated_at() RETURNS trigger AS $$
BEGIN
    NEW.updated_at = NOW();
    RETURN NEW;
END;
$$ LANGUAGE plpgsql;

CREATE TRIGGER trg_users_updated BEFORE UPDATE ON users
    FOR EACH ROW EXECUTE FUNCTION touch_updated_at();
"#;
        let stmts = splitter.split(sql);

        assert_eq!(stmts.len(), 2);
        assert_eq!(stmts[0].kind, StatementKind::CreateFunction);
        assert_eq!(stmts[0].object_name, "touch_updated_at");
        assert!(stmts[0].sql.contains("RETURN NEW;"));
        assert!(stmts[0].sql.ends_with("LANGUAGE plpgsql"));

        assert_eq!(stmts[1].kind, StatementKind::CreateTrigger);
        assert_eq!(stmts[1].object_name, "trg_users_updated");
    }

    #[test]
    fn test_split_named_dollar_tag_and_string_literals() {
        let splitter = StatementSplitter::new();
        let sql = "DO $body$ BEGIN PERFORM 1; END $body$;\n\
                   INSERT INTO messages (content) VALUES ('hi; it''s me');\n\
                   SELECT $1;";
        let stmts = splitter.split(sql);

        assert_eq!(stmts.len(), 3);
        assert_eq!(stmts[0].kind, StatementKind::Other("DO".to_string()));
        assert!(stmts[0].sql.contains("PERFORM 1;"));

        assert_eq!(stmts[1].kind, StatementKind::Insert);
        assert_eq!(stmts[1].object_name, "messages");
        assert!(stmts[1].sql.contains("'hi; it''s me'"));

        assert_eq!(stmts[2].sql, "SELECT $1");
    }

    #[test]
    fn test_split_escape_string_literal() {
        let splitter = StatementSplitter::new();
        let statements = splitter.split(
            "INSERT INTO messages (content) VALUES (E'it\\'s; fine');\nSELECT 1;",
        );

        assert_eq!(statements.len(), 2);
        assert_eq!(
            statements[0].sql,
            "INSERT INTO messages (content) VALUES (E'it\\'s; fine')"
        );
        assert_eq!(statements[1].sql, "SELECT 1");
        assert_eq!(statements[1].line_number, 2);
    }

    #[test]
    fn test_split_escape_prefix_requires_word_boundary() {
        let splitter = StatementSplitter::new();
        // `name'`의 e는 식별자 일부이므로 일반 문자열이고 백슬래시는 그대로 문자
        let statements = splitter.split("SELECT e'a\\'b' AS x, name'\\'; SELECT 2;");

        assert_eq!(statements.len(), 2);
        assert_eq!(statements[0].sql, "SELECT e'a\\'b' AS x, name'\\'");
        assert_eq!(statements[1].sql, "SELECT 2");
    }

    #[test]
    fn test_split_inline_comment_with_semicolon() {
        let splitter = StatementSplitter::new();
        let sql = "ALTER TABLE apartments -- note; not a terminator\n  ADD COLUMN IF NOT EXISTS deposit NUMERIC;";
        let stmts = splitter.split(sql);

        assert_eq!(stmts.len(), 1);
        assert_eq!(stmts[0].kind, StatementKind::AlterTable);
        assert_eq!(stmts[0].object_name, "apartments");
        assert!(!stmts[0].sql.contains("note"));
    }

    #[test]
    fn test_classify_drop_and_dml() {
        let splitter = StatementSplitter::new();
        let stmts = splitter.split(
            "DROP TABLE IF EXISTS legacy_bookings CASCADE;\n\
             UPDATE users SET role = 'admin' WHERE email = 'a@b.de';\n\
             DELETE FROM consents WHERE granted = false;\n\
             CREATE POLICY \"owner_select\" ON apartments FOR SELECT USING (true);\n\
             CREATE SEQUENCE invoice_seq;",
        );

        assert_eq!(stmts.len(), 5);
        assert_eq!(stmts[0].kind, StatementKind::Drop);
        assert_eq!(stmts[0].object_name, "legacy_bookings");
        assert!(stmts[0].if_exists);
        assert_eq!(stmts[1].kind, StatementKind::Update);
        assert_eq!(stmts[1].object_name, "users");
        assert!(stmts[1].kind.is_dml());
        assert_eq!(stmts[2].kind, StatementKind::Delete);
        assert_eq!(stmts[3].kind, StatementKind::CreatePolicy);
        assert_eq!(stmts[3].object_name, "owner_select");
        assert_eq!(
            stmts[4].kind,
            StatementKind::Other("CREATE SEQUENCE".to_string())
        );
    }

    #[test]
    fn test_trailing_statement_without_semicolon() {
        let splitter = StatementSplitter::new();
        let stmts = splitter.split("CREATE EXTENSION IF NOT EXISTS pgcrypto;\nSELECT 1");

        assert_eq!(stmts.len(), 2);
        assert_eq!(stmts[0].kind, StatementKind::CreateExtension);
        assert_eq!(stmts[0].object_name, "pgcrypto");
        assert_eq!(stmts[1].sql, "SELECT 1");
        assert_eq!(stmts[1].line_number, 2);
    }

    #[test]
    fn test_scan_directory_orders_by_prefix() {
        let dir = tempfile::tempdir().unwrap();
        for name in ["10_gdpr.sql", "02_payments.sql", "01_core.sql", "notes.txt"] {
            std::fs::write(dir.path().join(name), "SELECT 1;").unwrap();
        }

        let scripts = StatementSplitter::new().scan_directory(dir.path()).unwrap();
        let names: Vec<_> = scripts.iter().map(|s| s.name.as_str()).collect();
        assert_eq!(names, vec!["01_core", "02_payments", "10_gdpr"]);
    }

    #[test]
    fn test_scan_missing_directory() {
        let result = StatementSplitter::new().scan_directory(Path::new("/nonexistent/sichr"));
        assert!(matches!(result, Err(MigrationError::DirectoryNotFound(_))));
    }
}
