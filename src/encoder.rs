//! CSV 인코딩 모듈
//!
//! 레코드 목록을 헤더 목록과 CSV 텍스트로 변환합니다.
//! 구분자는 쉼표, 줄 구분은 `\n`으로 고정되어 있습니다.

use std::collections::HashSet;
use std::fmt::Write;

use serde_json::{Number, Value};

use crate::error::EncodeError;
use crate::parser::Record;

/// 인코딩 결과
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EncodedCsv {
    /// CSV 열 이름 (처음 등장한 순서)
    pub headers: Vec<String>,
    /// CSV 텍스트 (마지막 줄바꿈 없음)
    pub text: String,
}

/// 레코드 목록을 CSV로 인코딩
///
/// # Arguments
/// * `records` - 변환할 레코드 목록 (비어 있어도 됨)
///
/// # Returns
/// 헤더와 CSV 텍스트를 담은 `EncodedCsv`
///
/// # Examples
/// ```
/// use jcsv::encoder::encode;
/// use jcsv::parser::parse_records;
///
/// let records = parse_records(r#"[{"a":1,"b":2},{"b":3,"c":4}]"#).unwrap();
/// let csv = encode(&records).unwrap();
/// assert_eq!(csv.headers, vec!["a", "b", "c"]);
/// assert_eq!(csv.text, "a,b,c\n1,2,\n,3,4");
/// ```
pub fn encode(records: &[Record]) -> Result<EncodedCsv, EncodeError> {
    let headers = collect_headers(records);
    let mut text = String::new();
    let mut rows = 0usize;

    if !headers.is_empty() {
        write_row(&mut text, headers.iter().map(String::as_str))?;
        rows += 1;
    }

    for record in records {
        if rows > 0 {
            text.push('\n');
        }
        rows += 1;
        let cells: Vec<String> = headers
            .iter()
            .map(|header| record.get(header).map(cell_text).unwrap_or_default())
            .collect();
        write_row(&mut text, cells.iter().map(String::as_str))?;
    }

    Ok(EncodedCsv { headers, text })
}

/// 모든 레코드의 키 합집합 (처음 등장한 순서)
pub fn collect_headers(records: &[Record]) -> Vec<String> {
    let mut seen = HashSet::new();
    let mut headers = Vec::new();

    for key in records.iter().flat_map(|record| record.keys()) {
        if seen.insert(key.as_str()) {
            headers.push(key.clone());
        }
    }

    headers
}

/// JSON 값을 셀 문자열로 변환 (이스케이프 전)
///
/// `null`은 빈 문자열, 중첩된 배열/객체는 압축 JSON 텍스트가 됩니다.
pub fn cell_text(value: &Value) -> String {
    match value {
        Value::Null => String::new(),
        Value::String(s) => s.clone(),
        Value::Bool(b) => b.to_string(),
        Value::Number(n) => number_text(n),
        Value::Array(_) | Value::Object(_) => value.to_string(),
    }
}

/// 숫자를 셀 문자열로 변환
///
/// 정수 값인 실수는 소수점 없이 (`1.0` -> `1`, `1e2` -> `100`), `-0`은 `0`으로 씁니다.
/// 아주 크거나 작은 값은 지수 표기를 유지합니다.
fn number_text(n: &Number) -> String {
    match n.as_f64() {
        Some(f) if n.is_f64() => {
            if f == 0.0 {
                "0".to_string()
            } else if (1e-6..1e21).contains(&f.abs()) {
                f.to_string()
            } else {
                n.to_string()
            }
        }
        _ => n.to_string(),
    }
}

/// CSV 셀 이스케이프
///
/// 쉼표, 큰따옴표, 줄바꿈이 있으면 큰따옴표로 감싸고 내부 큰따옴표를 두 번 씁니다.
pub fn escape_cell(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn write_row<'a>(out: &mut String, cells: impl Iterator<Item = &'a str>) -> Result<(), EncodeError> {
    for (i, cell) in cells.enumerate() {
        if i > 0 {
            out.push(',');
        }
        write!(out, "{}", escape_cell(cell))?;
    }
    Ok(())
}
