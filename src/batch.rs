//! 배치 조정 모듈
//!
//! 변환 항목 목록을 소유하고 수집(읽기+파싱), 일괄 변환, 미리보기 선택,
//! 집계 뷰를 담당합니다.
//!
//! 모든 상태 변경은 잠금 안에서 항목 하나(id 기준)에만 적용되므로
//! 동시에 끝나는 작업들이 서로의 항목을 덮어쓰지 않습니다.

use std::collections::HashMap;
use std::fs::File;
use std::panic::{self, AssertUnwindSafe};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use memmap2::Mmap;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::encoder::{self, EncodedCsv};
use crate::entry::{
    ConvertedFile, EntryId, EntryStatus, EntryView, FileConversionEntry, RawContent,
};
use crate::error::{ConvertError, EncodeError, Result};
use crate::filter::is_json_file;
use crate::packager::{self, Payload};
use crate::parser;
use crate::preview::PreviewTable;
use crate::stats::BatchSummary;

/// 수집할 파일의 내용 출처
#[derive(Debug, Clone)]
pub enum FileSource {
    /// 이미 메모리에 있는 내용
    Bytes(Vec<u8>),
    /// 디스크의 파일
    Path(PathBuf),
}

/// 배치에 들어오는 파일 하나
#[derive(Debug, Clone)]
pub struct IncomingFile {
    pub name: String,
    pub mime: Option<String>,
    pub source: FileSource,
}

impl IncomingFile {
    pub fn from_bytes(name: impl Into<String>, mime: Option<&str>, bytes: Vec<u8>) -> Self {
        Self {
            name: name.into(),
            mime: mime.map(str::to_string),
            source: FileSource::Bytes(bytes),
        }
    }

    /// 경로에서 생성 (이름은 파일 이름 부분)
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        let path = path.into();
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Self {
            name,
            mime: None,
            source: FileSource::Path(path),
        }
    }
}

/// 배치 처리 옵션
#[derive(Debug, Clone)]
pub struct BatchOptions {
    /// 대용량 파일 임계값 (이상이면 메모리 매핑 사용)
    pub mmap_threshold: u64,
}

impl BatchOptions {
    /// 기본 옵션 생성
    pub fn new() -> Self {
        Self {
            mmap_threshold: 10 * 1024 * 1024, // 10MB
        }
    }

    /// 메모리 매핑 임계값 설정
    pub fn with_mmap_threshold(mut self, threshold: u64) -> Self {
        self.mmap_threshold = threshold;
        self
    }
}

impl Default for BatchOptions {
    fn default() -> Self {
        Self::new()
    }
}

/// 일괄 변환 결과
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ConversionSummary {
    pub converted: usize,
    pub failed: usize,
}

#[derive(Debug, Default)]
struct BatchState {
    entries: Vec<FileConversionEntry>,
    index: HashMap<EntryId, usize>,
    preview: Option<EntryId>,
}

impl BatchState {
    fn push(&mut self, entry: FileConversionEntry) {
        self.index.insert(entry.id(), self.entries.len());
        self.entries.push(entry);
    }

    fn get(&self, id: EntryId) -> Option<&FileConversionEntry> {
        self.index.get(&id).map(|&i| &self.entries[i])
    }

    fn get_mut(&mut self, id: EntryId) -> Option<&mut FileConversionEntry> {
        self.index.get(&id).map(|&i| &mut self.entries[i])
    }

    fn select_default_preview(&mut self) {
        if self.preview.is_none() {
            self.preview = self
                .entries
                .iter()
                .find(|e| e.status() == EntryStatus::Converted)
                .map(FileConversionEntry::id);
        }
    }
}

/// 배치 조정자
///
/// 복제해도 같은 배치를 가리키는 핸들입니다.
#[derive(Debug, Clone)]
pub struct BatchCoordinator {
    state: Arc<Mutex<BatchState>>,
    options: BatchOptions,
}

impl BatchCoordinator {
    pub fn new(options: BatchOptions) -> Self {
        Self {
            state: Arc::default(),
            options,
        }
    }

    fn lock(&self) -> MutexGuard<'_, BatchState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// id에 해당하는 항목 하나에 변경을 적용
    ///
    /// 변경 후 기본 미리보기를 다시 계산합니다.
    fn update<T>(
        &self,
        id: EntryId,
        f: impl FnOnce(&mut FileConversionEntry) -> Result<T>,
    ) -> Result<T> {
        let mut state = self.lock();
        let entry = state
            .get_mut(id)
            .ok_or_else(|| ConvertError::EntryNotFound { id: id.to_string() })?;
        let result = f(entry);
        state.select_default_preview();
        result
    }

    /// 파일들을 배치에 추가하고 읽기+파싱을 병렬로 실행
    ///
    /// 모든 파일의 작업이 끝나면 반환합니다.
    ///
    /// # Returns
    /// 도착 순서대로 새로 만든 항목 id
    pub fn ingest(&self, files: Vec<IncomingFile>) -> Vec<EntryId> {
        self.ingest_with(files, |_| {})
    }

    /// `ingest`와 같지만 파일 하나의 작업이 끝날 때마다 `on_settled`를 호출
    pub fn ingest_with<F>(&self, files: Vec<IncomingFile>, on_settled: F) -> Vec<EntryId>
    where
        F: Fn(&EntryView) + Sync,
    {
        let (ids, jobs) = self.register(files);

        jobs.into_par_iter().for_each(|(id, source)| {
            if let Some(view) = self.run_read_task(id, source) {
                on_settled(&view);
            }
        });

        ids
    }

    /// 항목 생성 (필터 탈락은 바로 error, 통과는 reading)
    fn register(&self, files: Vec<IncomingFile>) -> (Vec<EntryId>, Vec<(EntryId, FileSource)>) {
        let mut state = self.lock();
        state.preview = None;

        let mut ids = Vec::with_capacity(files.len());
        let mut jobs = Vec::new();

        for file in files {
            let mut entry = FileConversionEntry::new(file.name, file.mime);
            let accepted = is_json_file(entry.source_name(), entry.mime());
            // 새 항목은 항상 pending이므로 두 전이 모두 실패하지 않는다
            let transition = if accepted {
                entry.begin_read()
            } else {
                entry.reject()
            };
            if let Err(e) = transition {
                warn!(error = %e, "unexpected state for new entry");
            }

            if accepted {
                jobs.push((entry.id(), file.source));
            } else {
                debug!(name = entry.source_name(), "file rejected by JSON filter");
            }
            ids.push(entry.id());
            state.push(entry);
        }

        state.select_default_preview();
        info!(added = ids.len(), scheduled = jobs.len(), "files ingested");
        (ids, jobs)
    }

    /// 파일 하나의 읽기 -> 파싱 -> 상태 갱신
    fn run_read_task(&self, id: EntryId, source: FileSource) -> Option<EntryView> {
        let outcome = match read_source(source, self.options.mmap_threshold) {
            Ok(content) => {
                let content = Arc::new(content);
                self.update(id, |entry| entry.finish_read(Arc::clone(&content)))
                    .and_then(|()| {
                        let parsed = parser::parse_slice(content.as_bytes());
                        self.update(id, |entry| {
                            entry.finish_parse(parsed)?;
                            Ok(entry.view())
                        })
                    })
            }
            Err(e) => self.update(id, |entry| {
                entry.fail_read(e.to_string())?;
                Ok(entry.view())
            }),
        };

        match outcome {
            Ok(view) => {
                debug!(%id, name = %view.source_name, status = %view.status, "read task settled");
                Some(view)
            }
            Err(e) => {
                // 작업 도중 reset 된 경우
                warn!(%id, error = %e, "read task result dropped");
                None
            }
        }
    }

    /// `parsed` 상태인 모든 항목을 CSV로 변환
    ///
    /// # Returns
    /// 변환 성공/실패 수. `parsed` 항목이 하나도 없으면 `NothingToConvert`
    pub fn convert_all(&self) -> Result<ConversionSummary> {
        self.convert_all_with(|_| {})
    }

    /// `convert_all`과 같지만 항목 하나가 끝날 때마다 `on_settled`를 호출
    pub fn convert_all_with<F>(&self, on_settled: F) -> Result<ConversionSummary>
    where
        F: Fn(&EntryView) + Sync,
    {
        let jobs: Vec<_> = {
            let mut state = self.lock();
            let parsed: Vec<EntryId> = state
                .entries
                .iter()
                .filter(|e| e.status() == EntryStatus::Parsed)
                .map(FileConversionEntry::id)
                .collect();

            if parsed.is_empty() {
                return Err(ConvertError::NothingToConvert);
            }

            let mut jobs = Vec::with_capacity(parsed.len());
            for id in parsed {
                if let Some(entry) = state.get_mut(id) {
                    match entry.begin_convert() {
                        Ok(records) => jobs.push((id, records)),
                        Err(e) => warn!(%id, error = %e, "entry skipped"),
                    }
                }
            }
            jobs
        };

        info!(count = jobs.len(), "converting parsed entries");

        let views: Vec<EntryView> = jobs
            .into_par_iter()
            .filter_map(|(id, records)| {
                let result = encode_guarded(|| encoder::encode(&records));
                let view = self
                    .update(id, |entry| {
                        entry.finish_convert(result)?;
                        Ok(entry.view())
                    })
                    .map_err(|e| warn!(%id, error = %e, "conversion result dropped"))
                    .ok()?;
                on_settled(&view);
                Some(view)
            })
            .collect();

        let converted = views
            .iter()
            .filter(|v| v.status == EntryStatus::Converted)
            .count();
        Ok(ConversionSummary {
            converted,
            failed: views.len() - converted,
        })
    }

    /// 선택된 미리보기가 없으면 첫 번째 변환 항목을 선택
    pub fn default_preview(&self) -> Option<EntryId> {
        let mut state = self.lock();
        state.select_default_preview();
        state.preview
    }

    /// 미리보기 선택 (존재하고 converted인 항목만)
    ///
    /// # Returns
    /// 선택이 바뀌었는지 여부
    pub fn set_preview(&self, id: EntryId) -> bool {
        let mut state = self.lock();
        let selectable = state
            .get(id)
            .map(|e| e.status() == EntryStatus::Converted)
            .unwrap_or(false);
        if selectable {
            state.preview = Some(id);
        }
        selectable
    }

    pub fn preview_id(&self) -> Option<EntryId> {
        self.lock().preview
    }

    /// 선택된 항목의 미리보기 표
    pub fn preview(&self) -> Option<PreviewTable> {
        let state = self.lock();
        let entry = state.get(state.preview?)?;
        let csv = entry.csv()?;
        let records = entry.records()?;
        Some(PreviewTable::new(&csv.headers, records))
    }

    /// 배치를 빈 초기 상태로 되돌림
    pub fn reset(&self) {
        let mut state = self.lock();
        *state = BatchState::default();
        info!("batch reset");
    }

    /// 원본 이름으로 첫 번째 항목 찾기
    pub fn find_by_name(&self, source_name: &str) -> Option<EntryId> {
        self.lock()
            .entries
            .iter()
            .find(|e| e.source_name() == source_name)
            .map(FileConversionEntry::id)
    }

    pub fn status(&self, id: EntryId) -> Option<EntryStatus> {
        self.lock().get(id).map(FileConversionEntry::status)
    }

    /// 배치 순서대로 모든 항목의 상태 뷰
    pub fn entries(&self) -> Vec<EntryView> {
        self.lock().entries.iter().map(FileConversionEntry::view).collect()
    }

    pub fn len(&self) -> usize {
        self.lock().entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn has_parsed(&self) -> bool {
        self.summary().has_parsed()
    }

    pub fn is_processing(&self) -> bool {
        self.summary().is_processing()
    }

    /// 배치 순서대로 converted 항목
    pub fn converted_entries(&self) -> Vec<ConvertedFile> {
        self.lock()
            .entries
            .iter()
            .filter_map(FileConversionEntry::converted)
            .collect()
    }

    pub fn converted_count(&self) -> usize {
        self.summary().converted_count()
    }

    /// 상태별 집계
    pub fn summary(&self) -> BatchSummary {
        BatchSummary::from_entries(&self.lock().entries)
    }

    /// 변환 결과 패키징 (CSV 하나 또는 ZIP 하나)
    pub fn package(&self) -> Result<Payload> {
        packager::package(&self.converted_entries())
    }
}

impl Default for BatchCoordinator {
    fn default() -> Self {
        Self::new(BatchOptions::new())
    }
}

/// 인코더 실행 (패닉도 항목 에러로 기록)
///
/// 패닉이 rayon 작업 밖으로 퍼지면 나머지 항목이 `converting`에 남는다.
fn encode_guarded<F>(encode: F) -> std::result::Result<EncodedCsv, EncodeError>
where
    F: FnOnce() -> std::result::Result<EncodedCsv, EncodeError>,
{
    panic::catch_unwind(AssertUnwindSafe(encode)).unwrap_or_else(|payload| {
        let reason = payload
            .downcast_ref::<&str>()
            .map(|s| s.to_string())
            .or_else(|| payload.downcast_ref::<String>().cloned())
            .unwrap_or_else(|| "encoder panicked".to_string());
        warn!(%reason, "encoder panicked");
        Err(EncodeError { reason })
    })
}

/// 파일 내용 읽기
fn read_source(source: FileSource, mmap_threshold: u64) -> std::io::Result<RawContent> {
    match source {
        FileSource::Bytes(bytes) => Ok(RawContent::Owned(bytes)),
        FileSource::Path(path) => read_path(&path, mmap_threshold),
    }
}

fn read_path(path: &Path, mmap_threshold: u64) -> std::io::Result<RawContent> {
    let file = File::open(path)?;
    let size = file.metadata()?.len();

    if size > 0 && size >= mmap_threshold {
        // 대용량 파일: 메모리 매핑 사용
        let mmap = unsafe { Mmap::map(&file)? };
        Ok(RawContent::Mapped(mmap))
    } else {
        std::fs::read(path).map(RawContent::Owned)
    }
}
