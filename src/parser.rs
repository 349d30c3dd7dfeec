//! JSON 레코드 파싱 모듈
//!
//! 원본 파일 내용을 검증하여 평탄한 레코드(JSON 객체)의 순서 있는 목록으로 변환합니다.

use serde_json::{Map, Value};

use crate::error::ParseError;

/// CSV 한 행이 되는 JSON 객체
pub type Record = Map<String, Value>;

const UTF8_BOM: &[u8] = &[0xEF, 0xBB, 0xBF];

/// 텍스트를 레코드 목록으로 파싱
///
/// # Arguments
/// * `text` - 원본 JSON 텍스트
///
/// # Returns
/// 레코드 목록 또는 `ParseError`
///
/// # Examples
/// ```
/// use jcsv::parser::parse_records;
///
/// let records = parse_records(r#"{"a": 1}"#).unwrap();
/// assert_eq!(records.len(), 1);
/// assert!(parse_records("[1, 2, 3]").is_err());
/// ```
pub fn parse_records(text: &str) -> Result<Vec<Record>, ParseError> {
    parse_slice(text.as_bytes())
}

/// 바이트 버퍼를 레코드 목록으로 파싱
///
/// 앞쪽의 UTF-8 BOM은 무시하고, UTF-8이 아닌 입력은 문법 오류로 처리됩니다.
pub fn parse_slice(bytes: &[u8]) -> Result<Vec<Record>, ParseError> {
    let bytes = bytes.strip_prefix(UTF8_BOM).unwrap_or(bytes);
    let value: Value = serde_json::from_slice(bytes).map_err(|e| ParseError::InvalidSyntax {
        detail: e.to_string(),
    })?;

    into_records(value)
}

/// 디코딩된 JSON 값의 형태 검증
fn into_records(value: Value) -> Result<Vec<Record>, ParseError> {
    match value {
        Value::Object(map) => Ok(vec![map]),
        Value::Array(items) => items
            .into_iter()
            .map(|item| match item {
                Value::Object(map) => Ok(map),
                _ => Err(ParseError::NonObjectElement),
            })
            .collect(),
        _ => Err(ParseError::InvalidRoot),
    }
}
