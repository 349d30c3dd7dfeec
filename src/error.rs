//! 에러 타입 정의 모듈
//!
//! jcsv에서 발생할 수 있는 모든 에러 타입을 정의합니다.
//! 파일 단위 에러는 해당 항목에만 기록되고, 배치 단위 에러는
//! 작업 전체가 의미 없을 때만 반환됩니다.

use std::path::PathBuf;
use thiserror::Error;

use crate::entry::EntryStatus;

/// JSON 레코드 파싱 에러
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// JSON 문법 오류
    #[error("invalid JSON syntax: {detail}")]
    InvalidSyntax { detail: String },

    /// 루트가 객체나 배열이 아님
    #[error("root must be an object or array")]
    InvalidRoot,

    /// 배열 요소 중 객체가 아닌 값이 있음
    #[error("array elements must be objects")]
    NonObjectElement,
}

/// CSV 인코딩 에러
#[derive(Error, Debug, Clone, PartialEq, Eq)]
#[error("CSV 인코딩 실패: {reason}")]
pub struct EncodeError {
    pub reason: String,
}

impl From<std::fmt::Error> for EncodeError {
    fn from(e: std::fmt::Error) -> Self {
        Self {
            reason: e.to_string(),
        }
    }
}

/// jcsv에서 발생할 수 있는 에러 타입
#[derive(Error, Debug)]
pub enum ConvertError {
    /// JSON 파일이 아님 (확장자/MIME 필터 탈락)
    #[error("JSON 파일이 아닙니다: {name}")]
    FilterRejected { name: String },

    /// 파일 읽기 실패
    #[error("파일을 읽을 수 없습니다 ({name}): {reason}")]
    ReadFailure { name: String, reason: String },

    /// JSON 파싱 실패
    #[error("JSON 파싱 실패: {0}")]
    Parse(#[from] ParseError),

    /// CSV 인코딩 실패
    #[error(transparent)]
    EncodeFailure(#[from] EncodeError),

    /// 변환 가능한 항목이 없음
    #[error("변환할 수 있는 JSON 데이터가 없습니다")]
    NothingToConvert,

    /// 다운로드할 변환 결과가 없음
    #[error("nothing to download")]
    NothingToDownload,

    /// ZIP 아카이브 생성 실패
    #[error("아카이브 생성 실패: {reason}")]
    ArchiveError { reason: String },

    /// 허용되지 않는 상태 전이
    #[error("허용되지 않는 상태 전이: {from} -> {to}")]
    InvalidTransition { from: EntryStatus, to: EntryStatus },

    /// 존재하지 않는 항목
    #[error("항목을 찾을 수 없습니다: {id}")]
    EntryNotFound { id: String },

    /// 입력 경로가 존재하지 않음
    #[error("입력 경로를 찾을 수 없습니다: {path}")]
    InputNotFound { path: PathBuf },

    /// 출력 파일이 이미 존재 (Error 모드에서)
    #[error("출력 파일이 이미 존재합니다: {path}")]
    OutputExists { path: PathBuf },

    /// 파일 쓰기 실패
    #[error("파일 쓰기 실패 ({path}): {reason}")]
    WriteError { path: PathBuf, reason: String },

    /// 유효하지 않은 패턴
    #[error("유효하지 않은 패턴: {pattern}")]
    InvalidPattern { pattern: String },
}

/// jcsv 결과 타입 별칭
pub type Result<T> = std::result::Result<T, ConvertError>;
