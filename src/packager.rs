//! 출력 패키징 모듈
//!
//! 변환된 항목 수에 따라 CSV 파일 하나 또는 ZIP 아카이브 하나를 만듭니다.

use std::collections::HashSet;
use std::fs::OpenOptions;
use std::io::{Cursor, Write};
use std::path::{Path, PathBuf};

use tracing::{debug, info};
use zip::write::FileOptions;
use zip::{CompressionMethod, ZipWriter};

use crate::cli::WriteMode;
use crate::entry::ConvertedFile;
use crate::error::{ConvertError, Result};

/// 원본 이름이 비어 있을 때 쓰는 CSV 이름
pub const FALLBACK_CSV_NAME: &str = "converted_data.csv";

const FALLBACK_STEM: &str = "converted_data";

/// 여러 파일을 묶은 아카이브 이름
pub const ARCHIVE_NAME: &str = "converted_csv_files.zip";

/// 다운로드 결과 종류
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PayloadKind {
    Csv,
    Archive,
}

/// 저장할 결과물
#[derive(Debug, Clone)]
pub struct Payload {
    pub name: String,
    pub kind: PayloadKind,
    pub bytes: Vec<u8>,
}

impl Payload {
    /// 결과물을 폴더에 저장
    ///
    /// # Arguments
    /// * `dir` - 저장할 폴더 (없으면 생성)
    /// * `mode` - 같은 이름의 파일이 있을 때 동작
    ///
    /// # Returns
    /// 저장된 파일 경로
    pub fn write_to(&self, dir: &Path, mode: WriteMode) -> Result<PathBuf> {
        let path = dir.join(&self.name);
        let write_error = |e: std::io::Error| ConvertError::WriteError {
            path: path.clone(),
            reason: e.to_string(),
        };

        std::fs::create_dir_all(dir).map_err(write_error)?;

        let mut options = OpenOptions::new();
        options.write(true);
        match mode {
            WriteMode::Overwrite => options.create(true).truncate(true),
            WriteMode::Error => options.create_new(true),
        };

        let mut file = options.open(&path).map_err(|e| {
            if e.kind() == std::io::ErrorKind::AlreadyExists {
                ConvertError::OutputExists { path: path.clone() }
            } else {
                write_error(e)
            }
        })?;
        file.write_all(&self.bytes).map_err(write_error)?;

        info!(path = %path.display(), bytes = self.bytes.len(), "payload saved");
        Ok(path)
    }
}

/// 변환된 항목들을 결과물 하나로 패키징
///
/// # Arguments
/// * `files` - 배치 순서대로 정렬된 변환 완료 항목
///
/// # Returns
/// 항목이 하나면 CSV, 여러 개면 ZIP 아카이브. 없으면 `NothingToDownload`
pub fn package(files: &[ConvertedFile]) -> Result<Payload> {
    match files {
        [] => Err(ConvertError::NothingToDownload),
        [single] => {
            let name = csv_file_name(&single.stem);
            debug!(%name, "packaging single CSV");
            Ok(Payload {
                name,
                kind: PayloadKind::Csv,
                bytes: single.csv.text.as_bytes().to_vec(),
            })
        }
        many => {
            debug!(count = many.len(), "packaging CSV archive");
            Ok(Payload {
                name: ARCHIVE_NAME.to_string(),
                kind: PayloadKind::Archive,
                bytes: build_archive(many)?,
            })
        }
    }
}

/// `{stem}.csv` (비어 있으면 기본 이름)
pub fn csv_file_name(stem: &str) -> String {
    format!("{}.csv", stem_or_fallback(stem))
}

fn stem_or_fallback(stem: &str) -> &str {
    if stem.is_empty() {
        FALLBACK_STEM
    } else {
        stem
    }
}

/// 아카이브 안의 파일 이름 목록
///
/// 같은 이름이 반복되면 `name (2).csv`처럼 번호를 붙입니다.
pub fn archive_entry_names(files: &[ConvertedFile]) -> Vec<String> {
    let mut used = HashSet::new();

    files
        .iter()
        .map(|file| {
            let stem = stem_or_fallback(&file.stem);
            let mut candidate = csv_file_name(stem);
            let mut n = 2;
            while !used.insert(candidate.clone()) {
                candidate = format!("{} ({}).csv", stem, n);
                n += 1;
            }
            candidate
        })
        .collect()
}

fn archive_error(e: impl std::fmt::Display) -> ConvertError {
    ConvertError::ArchiveError {
        reason: e.to_string(),
    }
}

fn build_archive(files: &[ConvertedFile]) -> Result<Vec<u8>> {
    let mut writer = ZipWriter::new(Cursor::new(Vec::new()));
    let options = FileOptions::default().compression_method(CompressionMethod::Deflated);

    for (file, name) in files.iter().zip(archive_entry_names(files)) {
        writer
            .start_file(name.as_str(), options)
            .map_err(archive_error)?;
        writer
            .write_all(file.csv.text.as_bytes())
            .map_err(archive_error)?;
    }

    let cursor = writer.finish().map_err(archive_error)?;
    Ok(cursor.into_inner())
}
