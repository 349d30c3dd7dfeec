//! 파일 변환 항목 모듈
//!
//! 업로드된 파일 하나가 거치는 상태 머신을 정의합니다.
//!
//! ```text
//! pending -> reading -> parsing -> parsed -> converting -> converted
//!    |          |          |                      |
//!    +----------+----------+----------------------+------> error
//! ```
//!
//! 상태별 데이터는 `EntryState` 변형 안에만 존재하므로
//! 레코드, CSV, 에러 메시지의 조합이 상태와 어긋날 수 없습니다.

use std::fmt;
use std::sync::Arc;

use memmap2::Mmap;
use serde::{Serialize, Serializer};
use uuid::Uuid;

use crate::encoder::EncodedCsv;
use crate::error::{ConvertError, EncodeError, ParseError, Result};
use crate::parser::Record;

/// 항목 식별자
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EntryId(Uuid);

impl EntryId {
    fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl fmt::Display for EntryId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl Serialize for EntryId {
    fn serialize<S: Serializer>(&self, serializer: S) -> std::result::Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// 항목 상태
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryStatus {
    Pending,
    Reading,
    Parsing,
    Parsed,
    Converting,
    Converted,
    Error,
}

impl fmt::Display for EntryStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EntryStatus::Pending => "pending",
            EntryStatus::Reading => "reading",
            EntryStatus::Parsing => "parsing",
            EntryStatus::Parsed => "parsed",
            EntryStatus::Converting => "converting",
            EntryStatus::Converted => "converted",
            EntryStatus::Error => "error",
        };
        f.write_str(name)
    }
}

/// 읽어 들인 파일 내용
pub enum RawContent {
    /// 메모리에 복사된 내용
    Owned(Vec<u8>),
    /// 메모리 매핑된 대용량 파일
    Mapped(Mmap),
}

impl RawContent {
    pub fn as_bytes(&self) -> &[u8] {
        match self {
            RawContent::Owned(bytes) => bytes.as_slice(),
            RawContent::Mapped(mmap) => &mmap[..],
        }
    }

    pub fn len(&self) -> usize {
        self.as_bytes().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl fmt::Debug for RawContent {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let kind = match self {
            RawContent::Owned(_) => "Owned",
            RawContent::Mapped(_) => "Mapped",
        };
        write!(f, "RawContent::{}({} bytes)", kind, self.len())
    }
}

#[derive(Debug)]
enum EntryState {
    Pending,
    Reading,
    Parsing(Arc<RawContent>),
    Parsed(Arc<Vec<Record>>),
    Converting(Arc<Vec<Record>>),
    Converted {
        records: Arc<Vec<Record>>,
        csv: Arc<EncodedCsv>,
    },
    Error(String),
}

impl EntryState {
    fn status(&self) -> EntryStatus {
        match self {
            EntryState::Pending => EntryStatus::Pending,
            EntryState::Reading => EntryStatus::Reading,
            EntryState::Parsing(_) => EntryStatus::Parsing,
            EntryState::Parsed(_) => EntryStatus::Parsed,
            EntryState::Converting(_) => EntryStatus::Converting,
            EntryState::Converted { .. } => EntryStatus::Converted,
            EntryState::Error(_) => EntryStatus::Error,
        }
    }
}

/// 파일 하나의 변환 항목
#[derive(Debug)]
pub struct FileConversionEntry {
    id: EntryId,
    source_name: String,
    mime: Option<String>,
    bytes_read: u64,
    state: EntryState,
}

impl FileConversionEntry {
    /// `pending` 상태의 새 항목 생성
    pub fn new(source_name: impl Into<String>, mime: Option<String>) -> Self {
        Self {
            id: EntryId::new(),
            source_name: source_name.into(),
            mime,
            bytes_read: 0,
            state: EntryState::Pending,
        }
    }

    pub fn id(&self) -> EntryId {
        self.id
    }

    pub fn source_name(&self) -> &str {
        &self.source_name
    }

    pub fn mime(&self) -> Option<&str> {
        self.mime.as_deref()
    }

    pub fn status(&self) -> EntryStatus {
        self.state.status()
    }

    pub fn bytes_read(&self) -> u64 {
        self.bytes_read
    }

    /// 확장자를 제외한 출력 파일 이름
    pub fn output_stem(&self) -> &str {
        strip_extension(&self.source_name)
    }

    /// 파싱된 레코드 (parsed, converting, converted 상태에서만 존재)
    pub fn records(&self) -> Option<&[Record]> {
        match &self.state {
            EntryState::Parsed(records)
            | EntryState::Converting(records)
            | EntryState::Converted { records, .. } => Some(records.as_slice()),
            _ => None,
        }
    }

    /// 변환된 CSV (converted 상태에서만 존재)
    pub fn csv(&self) -> Option<&EncodedCsv> {
        match &self.state {
            EntryState::Converted { csv, .. } => Some(csv),
            _ => None,
        }
    }

    pub fn error_message(&self) -> Option<&str> {
        match &self.state {
            EntryState::Error(message) => Some(message),
            _ => None,
        }
    }

    /// pending -> error (파일 형식 필터 탈락)
    pub fn reject(&mut self) -> Result<()> {
        self.expect(EntryStatus::Pending, EntryStatus::Error)?;
        let reason = ConvertError::FilterRejected {
            name: self.source_name.clone(),
        };
        self.state = EntryState::Error(reason.to_string());
        Ok(())
    }

    /// pending -> reading
    pub fn begin_read(&mut self) -> Result<()> {
        self.expect(EntryStatus::Pending, EntryStatus::Reading)?;
        self.state = EntryState::Reading;
        Ok(())
    }

    /// reading -> parsing
    pub fn finish_read(&mut self, content: Arc<RawContent>) -> Result<()> {
        self.expect(EntryStatus::Reading, EntryStatus::Parsing)?;
        self.bytes_read = content.len() as u64;
        self.state = EntryState::Parsing(content);
        Ok(())
    }

    /// reading -> error
    pub fn fail_read(&mut self, reason: impl Into<String>) -> Result<()> {
        self.expect(EntryStatus::Reading, EntryStatus::Error)?;
        let error = ConvertError::ReadFailure {
            name: self.source_name.clone(),
            reason: reason.into(),
        };
        self.state = EntryState::Error(error.to_string());
        Ok(())
    }

    /// parsing -> parsed | error
    ///
    /// 원본 내용은 어느 쪽이든 여기서 해제됩니다.
    pub fn finish_parse(
        &mut self,
        result: std::result::Result<Vec<Record>, ParseError>,
    ) -> Result<()> {
        let target = if result.is_ok() {
            EntryStatus::Parsed
        } else {
            EntryStatus::Error
        };
        self.expect(EntryStatus::Parsing, target)?;
        self.state = match result {
            Ok(records) => EntryState::Parsed(Arc::new(records)),
            Err(e) => EntryState::Error(ConvertError::from(e).to_string()),
        };
        Ok(())
    }

    /// parsed -> converting
    ///
    /// 인코더에 넘길 레코드를 반환합니다.
    pub fn begin_convert(&mut self) -> Result<Arc<Vec<Record>>> {
        let records = match &self.state {
            EntryState::Parsed(records) => Arc::clone(records),
            _ => return Err(self.invalid(EntryStatus::Converting)),
        };
        self.state = EntryState::Converting(Arc::clone(&records));
        Ok(records)
    }

    /// converting -> converted | error
    pub fn finish_convert(
        &mut self,
        result: std::result::Result<EncodedCsv, EncodeError>,
    ) -> Result<()> {
        let records = match (&self.state, &result) {
            (EntryState::Converting(records), _) => Arc::clone(records),
            (_, Ok(_)) => return Err(self.invalid(EntryStatus::Converted)),
            (_, Err(_)) => return Err(self.invalid(EntryStatus::Error)),
        };
        self.state = match result {
            Ok(csv) => EntryState::Converted {
                records,
                csv: Arc::new(csv),
            },
            Err(e) => EntryState::Error(ConvertError::from(e).to_string()),
        };
        Ok(())
    }

    /// 목록 표시용 읽기 전용 뷰
    pub fn view(&self) -> EntryView {
        EntryView {
            id: self.id,
            source_name: self.source_name.clone(),
            status: self.status(),
            error_message: self.error_message().map(str::to_string),
        }
    }

    /// 변환 결과 스냅샷 (converted 상태에서만 존재)
    pub fn converted(&self) -> Option<ConvertedFile> {
        match &self.state {
            EntryState::Converted { csv, .. } => Some(ConvertedFile {
                id: self.id,
                source_name: self.source_name.clone(),
                stem: self.output_stem().to_string(),
                csv: Arc::clone(csv),
            }),
            _ => None,
        }
    }

    fn expect(&self, from: EntryStatus, to: EntryStatus) -> Result<()> {
        if self.status() == from {
            Ok(())
        } else {
            Err(self.invalid(to))
        }
    }

    fn invalid(&self, to: EntryStatus) -> ConvertError {
        ConvertError::InvalidTransition {
            from: self.status(),
            to,
        }
    }
}

/// 항목 상태 뷰
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct EntryView {
    pub id: EntryId,
    pub source_name: String,
    pub status: EntryStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
}

/// 변환이 끝난 파일
#[derive(Debug, Clone)]
pub struct ConvertedFile {
    pub id: EntryId,
    pub source_name: String,
    /// 확장자를 뗀 파일 이름
    pub stem: String,
    pub csv: Arc<EncodedCsv>,
}

/// 마지막 확장자 제거 (`data.v2.json` -> `data.v2`, `.json` -> ``)
pub fn strip_extension(name: &str) -> &str {
    match name.rfind('.') {
        Some(pos) if pos + 1 < name.len() && !name[pos + 1..].contains('/') => &name[..pos],
        _ => name,
    }
}
