//! 파일 필터 모듈
//!
//! JSON 파일 판별(확장자/MIME)과 폴더 탐색 시 쓰는 glob 이름 필터를 담당합니다.

use glob::Pattern;

use crate::error::{ConvertError, Result};

/// JSON MIME 타입
pub const JSON_MIME: &str = "application/json";

/// JSON 파일인지 확인
///
/// `.json` 확장자(대소문자 무시) 또는 `application/json` MIME 타입이면 통과합니다.
///
/// # Examples
/// ```
/// use jcsv::filter::is_json_file;
///
/// assert!(is_json_file("data.JSON", None));
/// assert!(is_json_file("export", Some("application/json")));
/// assert!(!is_json_file("notes.txt", Some("text/plain")));
/// ```
pub fn is_json_file(name: &str, mime: Option<&str>) -> bool {
    let by_mime = mime
        .map(|m| m.trim().eq_ignore_ascii_case(JSON_MIME))
        .unwrap_or(false);

    by_mime || name.to_ascii_lowercase().ends_with(".json")
}

/// 폴더 탐색용 파일 이름 필터
///
/// JSON 확장자 검사에 선택적인 glob 패턴을 더합니다.
#[derive(Default)]
pub struct NameFilter {
    pattern: Option<Pattern>,
}

impl NameFilter {
    /// 새 이름 필터 생성
    ///
    /// # Arguments
    /// * `pattern` - 글로브 패턴 문자열 (None이면 모든 JSON 파일 통과)
    ///
    /// # Examples
    /// ```
    /// use jcsv::filter::NameFilter;
    ///
    /// let filter = NameFilter::new(Some("*_SUM_*".to_string())).unwrap();
    /// assert!(filter.matches("test_SUM_1.json"));
    /// assert!(!filter.matches("test_SUM_1.txt"));
    /// assert!(!filter.matches("other.json"));
    /// ```
    pub fn new(pattern: Option<String>) -> Result<Self> {
        let compiled = pattern
            .map(|p| Pattern::new(&p).map_err(|_| ConvertError::InvalidPattern { pattern: p }))
            .transpose()?;

        Ok(Self { pattern: compiled })
    }

    /// 파일 이름이 JSON이고 패턴과 일치하는지 확인
    pub fn matches(&self, file_name: &str) -> bool {
        is_json_file(file_name, None)
            && self
                .pattern
                .as_ref()
                .map(|p| p.matches(file_name))
                .unwrap_or(true)
    }
}
