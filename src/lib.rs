//! jcsv - JSON TO CSV BATCH CONVERTER
//!
//! 여러 JSON 파일을 각각 CSV로 변환하고, 결과를 CSV 파일 하나 또는
//! ZIP 아카이브 하나로 내보내는 변환 엔진과 CLI 도구입니다.
//!
//! # 주요 기능
//!
//! - 🚀 **병렬 수집**: 파일마다 독립된 읽기+파싱 작업을 Rayon으로 동시 실행
//! - 🧩 **스키마 합집합**: 키 구성이 다른 레코드도 처음 등장한 순서의 열로 변환
//! - 🛡️ **오류 격리**: 한 파일의 실패는 그 항목에만 기록되고 나머지는 계속 진행
//! - 👀 **미리보기**: 첫 번째 변환 파일(또는 선택한 파일)의 처음 5행 표시
//! - 📦 **패키징**: 변환 파일이 하나면 CSV, 여러 개면 ZIP
//! - 📈 **상세 통계**: 상태별 항목 수, 입출력 용량, 성공률 표시
//!
//! # 예제
//!
//! ```bash
//! # 파일 하나 변환
//! jcsv users.json
//!
//! # 폴더 안의 JSON 파일을 모두 변환해 ZIP으로 저장
//! jcsv ./exports -o ./out
//!
//! # 유효성 검사만
//! jcsv ./exports --validate-only
//! ```
//!
//! ```
//! use jcsv::{BatchCoordinator, IncomingFile, PayloadKind};
//!
//! let batch = BatchCoordinator::default();
//! batch.ingest(vec![IncomingFile::from_bytes(
//!     "users.json",
//!     Some("application/json"),
//!     br#"[{"id": 1, "name": "Kim"}, {"id": 2, "team": "core"}]"#.to_vec(),
//! )]);
//! batch.convert_all().unwrap();
//!
//! let payload = batch.package().unwrap();
//! assert_eq!(payload.kind, PayloadKind::Csv);
//! assert_eq!(payload.name, "users.csv");
//! assert_eq!(payload.bytes, b"id,name,team\n1,Kim,\n2,,core");
//! ```

pub mod batch;
pub mod cli;
pub mod encoder;
pub mod entry;
pub mod error;
pub mod filter;
pub mod packager;
pub mod parser;
pub mod preview;
pub mod stats;

// Re-exports for convenient access
pub use batch::{BatchCoordinator, BatchOptions, ConversionSummary, FileSource, IncomingFile};
pub use cli::{Args, WriteMode};
pub use encoder::{encode, EncodedCsv};
pub use entry::{ConvertedFile, EntryId, EntryStatus, EntryView, FileConversionEntry};
pub use error::{ConvertError, EncodeError, ParseError, Result};
pub use filter::{is_json_file, NameFilter};
pub use packager::{package, Payload, PayloadKind};
pub use parser::{parse_records, Record};
pub use preview::PreviewTable;
pub use stats::{format_bytes, BatchSummary, Statistics};
