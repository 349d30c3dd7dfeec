//! CLI 인자 파싱 모듈
//!
//! clap을 사용한 명령줄 인자 정의 및 파싱을 담당합니다.

use clap::{Parser, ValueEnum};
use std::path::PathBuf;

/// 출력 파일 모드
#[derive(Debug, Clone, Copy, ValueEnum, Default, PartialEq)]
pub enum WriteMode {
    /// 기존 파일이 있으면 덮어쓰기
    #[default]
    Overwrite,
    /// 기존 파일이 있으면 에러
    Error,
}

impl std::fmt::Display for WriteMode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            WriteMode::Overwrite => write!(f, "Overwrite"),
            WriteMode::Error => write!(f, "Error"),
        }
    }
}

/// jcsv CLI 인자 구조체
#[derive(Parser, Debug)]
#[command(
    name = "jcsv",
    author = "YourName <your@email.com>",
    version,
    about = "JSON TO CSV BATCH CONVERTER - 여러 JSON 파일을 CSV로 일괄 변환하는 CLI 도구",
    long_about = r#"
JSON TO CSV BATCH CONVERTER
===========================

지정된 JSON 파일(또는 폴더 안의 JSON 파일)을 병렬로 읽어
각각 CSV로 변환합니다. 변환된 파일이 하나면 CSV 파일 하나를,
여러 개면 ZIP 아카이브 하나를 저장합니다.

특징:
  • 파일별 독립 처리 (한 파일의 오류가 다른 파일에 영향 없음)
  • 서로 다른 키 구성의 레코드도 열 합집합으로 변환
  • 변환 결과 미리보기 (처음 5행)
  • 상태 보고서(JSON) 및 에러 로그

예제:
  jcsv data.json
  jcsv ./exports -o ./out
  jcsv a.json b.json c.json --mode error
  jcsv ./exports --pattern "*_SUM_*" --validate-only
  jcsv ./exports --report status.json --log errors.log
"#
)]
pub struct Args {
    /// JSON 파일 또는 폴더 경로 (여러 개 지정 가능)
    #[arg(required = true)]
    pub inputs: Vec<PathBuf>,

    /// 결과를 저장할 폴더 (기본값: 현재 폴더)
    #[arg(short, long, default_value = ".")]
    pub output_dir: PathBuf,

    /// 출력 파일 모드
    #[arg(short, long, value_enum, default_value_t = WriteMode::Overwrite)]
    pub mode: WriteMode,

    /// 폴더 탐색 시 파일 이름 패턴 필터 (glob 형식, 예: "*_SUM_*")
    #[arg(short, long)]
    pub pattern: Option<String>,

    /// 상세 출력 모드
    #[arg(short, long)]
    pub verbose: bool,

    /// 실제 변환 없이 처리될 파일 목록만 표시
    #[arg(long)]
    pub dry_run: bool,

    /// JSON 유효성 검사만 수행 (변환 없음)
    #[arg(long)]
    pub validate_only: bool,

    /// 병렬 처리 스레드 수 (기본값: CPU 코어 수)
    #[arg(short = 'j', long)]
    pub threads: Option<usize>,

    /// 최대 폴더 탐색 깊이
    #[arg(long)]
    pub max_depth: Option<usize>,

    /// 에러 로그 파일 경로
    #[arg(long)]
    pub log: Option<PathBuf>,

    /// 항목별 상태 보고서(JSON) 파일 경로
    #[arg(long)]
    pub report: Option<PathBuf>,

    /// 미리보기할 원본 파일 이름 (기본값: 첫 번째 변환 파일)
    #[arg(long)]
    pub preview: Option<String>,

    /// 미리보기 표시 안 함
    #[arg(long)]
    pub no_preview: bool,
}

impl Args {
    /// 로그 필터 지시어 (`RUST_LOG`가 없을 때 사용)
    pub fn log_directive(&self) -> &'static str {
        if self.verbose {
            "jcsv=debug"
        } else {
            "warn"
        }
    }
}
