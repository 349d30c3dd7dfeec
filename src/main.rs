//! jcsv - JSON TO CSV BATCH CONVERTER
//!
//! 메인 엔트리포인트

use anyhow::{Context, Result};
use clap::Parser;
use colored::Colorize;
use indicatif::{ProgressBar, ProgressStyle};
use std::fs::File;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;
use walkdir::WalkDir;

use jcsv::{
    cli::Args,
    entry::{EntryStatus, EntryView},
    error::ConvertError,
    filter::NameFilter,
    stats::Statistics,
    BatchCoordinator, BatchOptions, IncomingFile, PayloadKind,
};

fn main() -> Result<()> {
    let args = Args::parse();

    init_tracing(&args);

    // 스레드 풀 설정
    if let Some(threads) = args.threads {
        rayon::ThreadPoolBuilder::new()
            .num_threads(threads)
            .build_global()
            .context("스레드 풀 초기화 실패")?;
    }

    // 헤더 출력
    print_header(&args);

    // 이름 필터 초기화
    let name_filter = NameFilter::new(args.pattern.clone())?;

    // 입력 파일 수집
    let files = collect_input_files(&args, &name_filter)?;

    if files.is_empty() {
        println!("{}", "⚠️ 처리할 JSON 파일이 없습니다.".yellow());
        return Ok(());
    }

    println!(
        "  {} 발견된 파일 수: {}",
        "📋".bright_white(),
        files.len().to_string().bright_green()
    );

    // 드라이런 모드
    if args.dry_run {
        print_dry_run(&files);
        return Ok(());
    }

    let stats = Statistics::new();
    let batch = BatchCoordinator::new(BatchOptions::new());

    run_ingestion(&args, &batch, files);

    // 유효성 검사 모드
    if args.validate_only {
        finish_reports(&args, &batch)?;
        let summary = batch.summary();
        stats.print_validation_summary(&summary);

        if summary.errors == 0 {
            println!("\n{} 모든 파일이 유효합니다!\n", "✅".bright_green());
        } else {
            println!(
                "\n{} {} 개의 파일에 오류가 있습니다.\n",
                "⚠️".bright_yellow(),
                summary.errors.to_string().red()
            );
        }
        return Ok(());
    }

    // 일반 변환 모드
    run_conversion(&args, &batch)?;

    if !args.no_preview {
        print_preview(&args, &batch);
    }

    let saved = save_payload(&args, &batch, &stats)?;

    finish_reports(&args, &batch)?;
    stats.print_summary(&batch.summary());

    if let Some(path) = saved {
        println!("\n{} 저장 완료: {:?}\n", "✅".bright_green(), path);
    }

    Ok(())
}

/// 로그 구독자 초기화 (`RUST_LOG` 우선)
fn init_tracing(args: &Args) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(args.log_directive()));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// 헤더 출력
fn print_header(args: &Args) {
    println!("\n{}", "═".repeat(50).bright_blue());
    println!(
        "{}",
        " 🚀 JSON TO CSV BATCH CONVERTER".bright_white().bold()
    );
    println!("{}", "═".repeat(50).bright_blue());

    for input in &args.inputs {
        println!("  {} 입력: {:?}", "📂".bright_cyan(), input);
    }

    if !args.validate_only {
        println!("  {} 출력 폴더: {:?}", "📄".bright_green(), args.output_dir);
        println!("  {} 모드: {}", "⚙️".bright_yellow(), args.mode);
    }

    if let Some(ref pattern) = args.pattern {
        println!("  {} 패턴 필터: {}", "🔍".bright_magenta(), pattern);
    }

    if let Some(depth) = args.max_depth {
        println!("  {} 최대 깊이: {}", "📏".bright_white(), depth);
    }

    if args.dry_run {
        println!(
            "  {} {}",
            "⚠️".bright_yellow(),
            "드라이런 모드 (실제 변환 없음)".yellow()
        );
    }

    if args.validate_only {
        println!("  {} {}", "🔍".bright_cyan(), "유효성 검사 모드".cyan());
    }

    println!("{}", "═".repeat(50).bright_blue());
    println!("\n{}", "📁 파일 검색 중...".bright_cyan());
}

/// 입력 파일 수집
///
/// 직접 지정한 파일은 확장자와 관계없이 모두 포함되고(필터 탈락은 항목 에러로 기록),
/// 폴더는 JSON 파일만 패턴 필터를 거쳐 포함됩니다.
fn collect_input_files(args: &Args, name_filter: &NameFilter) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for input in &args.inputs {
        if !input.exists() {
            return Err(ConvertError::InputNotFound {
                path: input.clone(),
            }
            .into());
        }

        if input.is_file() {
            files.push(input.clone());
            continue;
        }

        let walker = match args.max_depth {
            Some(max_depth) => WalkDir::new(input).max_depth(max_depth),
            None => WalkDir::new(input),
        };

        files.extend(
            walker
                .sort_by_file_name()
                .into_iter()
                .filter_map(|e| e.ok())
                .filter(|e| e.path().is_file())
                .filter(|e| {
                    e.path()
                        .file_name()
                        .and_then(|s| s.to_str())
                        .map(|s| name_filter.matches(s))
                        .unwrap_or(false)
                })
                .map(|e| e.path().to_path_buf()),
        );
    }

    Ok(files)
}

/// 드라이런 출력
fn print_dry_run(files: &[PathBuf]) {
    println!("\n{}", "📋 처리 예정 파일 목록:".bright_cyan());
    for (i, path) in files.iter().enumerate() {
        println!("  {}. {:?}", i + 1, path.file_name().unwrap_or_default());
    }
    println!(
        "\n{} 총 {} 개의 파일이 처리될 예정입니다.",
        "ℹ️".bright_blue(),
        files.len().to_string().bright_green()
    );
}

/// 수집(읽기+파싱) 실행
fn run_ingestion(args: &Args, batch: &BatchCoordinator, files: Vec<PathBuf>) {
    let pb = create_progress_bar(files.len());

    println!("\n{}", "⚡ 병렬 읽기 중...".bright_cyan());

    let incoming = files.into_iter().map(IncomingFile::from_path).collect();
    batch.ingest_with(incoming, |view| {
        pb.inc(1);
        if args.verbose && view.status == EntryStatus::Parsed {
            pb.println(format!("  {} {}", "✓".green(), view.source_name));
        }
    });

    // 필터에서 탈락한 항목은 작업이 없으므로 여기서 채운다
    pb.set_position(batch.len() as u64);
    pb.finish_with_message("완료!");

    print_errors(&batch.entries(), args.verbose);
}

/// 일괄 변환 실행
fn run_conversion(args: &Args, batch: &BatchCoordinator) -> Result<()> {
    let pending = batch.summary().parsed;
    let pb = create_progress_bar(pending);

    println!("\n{}", "🔄 CSV 변환 중...".bright_cyan());

    let result = batch.convert_all_with(|view| {
        pb.inc(1);
        if args.verbose && view.status == EntryStatus::Converted {
            pb.println(format!("  {} {}", "✓".green(), view.source_name));
        }
    });
    pb.finish_with_message("완료!");

    match result {
        Ok(summary) => {
            if summary.failed > 0 {
                println!(
                    "  {} {} 개 파일 변환 실패",
                    "❌".bright_red(),
                    summary.failed.to_string().red()
                );
            }
            Ok(())
        }
        Err(ConvertError::NothingToConvert) => {
            println!(
                "{}",
                "⚠️ 변환할 수 있는 JSON 데이터가 없습니다.".yellow()
            );
            Ok(())
        }
        Err(e) => Err(e.into()),
    }
}

/// 미리보기 출력
fn print_preview(args: &Args, batch: &BatchCoordinator) {
    if let Some(ref name) = args.preview {
        let selected = batch
            .find_by_name(name)
            .map(|id| batch.set_preview(id))
            .unwrap_or(false);
        if !selected {
            println!(
                "  {} 미리보기할 수 없는 파일입니다: {}",
                "⚠️".bright_yellow(),
                name
            );
        }
    }

    let Some(table) = batch.preview() else {
        return;
    };
    if table.headers.is_empty() {
        return;
    }

    println!(
        "\n{}",
        format!("👀 미리보기 (처음 {}개 데이터 행)", table.rows.len()).bright_cyan()
    );
    for line in table.render().lines() {
        println!("  {}", line);
    }
    if let Some(notice) = table.notice() {
        println!("  {}", notice.dimmed());
    }
}

/// 결과물 저장
fn save_payload(
    args: &Args,
    batch: &BatchCoordinator,
    stats: &Statistics,
) -> Result<Option<PathBuf>> {
    println!("\n{}", "💾 결과 저장 중...".bright_cyan());

    let payload = match batch.package() {
        Ok(payload) => payload,
        Err(ConvertError::NothingToDownload) => {
            println!("{}", "⚠️ 저장할 변환 결과가 없습니다.".yellow());
            return Ok(None);
        }
        Err(e) => return Err(e.into()),
    };

    let path = payload
        .write_to(&args.output_dir, args.mode)
        .with_context(|| format!("결과 저장 실패: {}", payload.name))?;
    stats.add_bytes_written(payload.bytes.len() as u64);

    if payload.kind == PayloadKind::Archive {
        println!(
            "  {} {} 개 CSV 파일을 ZIP으로 묶었습니다",
            "📦".bright_magenta(),
            batch.converted_count().to_string().bright_green()
        );
    }

    Ok(Some(path))
}

/// 에러 로그 및 상태 보고서 작성
fn finish_reports(args: &Args, batch: &BatchCoordinator) -> Result<()> {
    let entries = batch.entries();

    if let Some(ref log_path) = args.log {
        write_error_log(log_path, &entries)?;
    }

    if let Some(ref report_path) = args.report {
        write_report(report_path, &entries)?;
    }

    Ok(())
}

/// 진행률 바 생성
fn create_progress_bar(total: usize) -> ProgressBar {
    let pb = ProgressBar::new(total as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.green} [{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} ({percent}%) {msg}")
            .unwrap_or_else(|_| ProgressStyle::default_bar())
            .progress_chars("█▓▒░"),
    );
    pb
}

/// 에러 목록 출력
fn print_errors(entries: &[EntryView], verbose: bool) {
    let errors: Vec<&EntryView> = entries
        .iter()
        .filter(|e| e.status == EntryStatus::Error)
        .collect();
    if errors.is_empty() {
        return;
    }

    println!("\n{}", "❌ 오류 발생 파일:".bright_red());
    for entry in errors {
        println!("  {} {}", "•".red(), entry.source_name);
        if verbose {
            if let Some(ref message) = entry.error_message {
                println!("    {}", message.dimmed());
            }
        }
    }
}

/// 에러 로그 파일 작성
fn write_error_log(log_path: &Path, entries: &[EntryView]) -> Result<()> {
    let errors: Vec<&EntryView> = entries
        .iter()
        .filter(|e| e.status == EntryStatus::Error)
        .collect();
    let mut log_file = File::create(log_path)
        .with_context(|| format!("에러 로그 생성 실패: {:?}", log_path))?;

    writeln!(log_file, "jcsv 에러 로그")?;
    writeln!(log_file, "생성 시간: {}", unix_now())?;
    writeln!(log_file, "총 에러 수: {}", errors.len())?;
    writeln!(log_file, "{}", "=".repeat(50))?;

    for entry in errors {
        writeln!(log_file, "\n파일: {}", entry.source_name)?;
        writeln!(
            log_file,
            "에러: {}",
            entry.error_message.as_deref().unwrap_or_default()
        )?;
    }

    println!("\n{} 에러 로그 저장: {:?}", "📝".bright_cyan(), log_path);

    Ok(())
}

/// 상태 보고서(JSON) 작성
fn write_report(report_path: &Path, entries: &[EntryView]) -> Result<()> {
    let file = File::create(report_path)
        .with_context(|| format!("보고서 생성 실패: {:?}", report_path))?;
    serde_json::to_writer_pretty(file, entries).context("보고서 직렬화 실패")?;

    println!("{} 상태 보고서 저장: {:?}", "📝".bright_cyan(), report_path);

    Ok(())
}

/// 현재 시간 문자열 반환
fn unix_now() -> String {
    use std::time::SystemTime;
    let duration = SystemTime::now()
        .duration_since(SystemTime::UNIX_EPOCH)
        .unwrap_or_default();
    format!("Unix timestamp: {}", duration.as_secs())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn create_test_json(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        fs::write(&path, content).unwrap();
        path
    }

    fn args_for(inputs: Vec<PathBuf>) -> Args {
        Args::parse_from(
            std::iter::once("jcsv".to_string())
                .chain(inputs.iter().map(|p| p.to_string_lossy().into_owned())),
        )
    }

    #[test]
    fn test_collect_json_files_from_folder() {
        let temp_dir = TempDir::new().unwrap();
        create_test_json(temp_dir.path(), "test1.json", r#"{"id": 1}"#);
        create_test_json(temp_dir.path(), "test2.json", r#"{"id": 2}"#);
        create_test_json(temp_dir.path(), "other.txt", "not json");

        let args = args_for(vec![temp_dir.path().to_path_buf()]);
        let files = collect_input_files(&args, &NameFilter::new(None).unwrap()).unwrap();

        assert_eq!(files.len(), 2);
    }

    #[test]
    fn test_explicit_files_always_included() {
        let temp_dir = TempDir::new().unwrap();
        let txt = create_test_json(temp_dir.path(), "other.txt", "not json");
        let json = create_test_json(temp_dir.path(), "a.json", "{}");

        let args = args_for(vec![txt.clone(), json.clone()]);
        let files = collect_input_files(&args, &NameFilter::new(None).unwrap()).unwrap();

        assert_eq!(files, vec![txt, json]);
    }

    #[test]
    fn test_collect_with_pattern() {
        let temp_dir = TempDir::new().unwrap();
        create_test_json(temp_dir.path(), "data_SUM_1.json", r#"{"id": 1}"#);
        create_test_json(temp_dir.path(), "data_SUM_2.json", r#"{"id": 2}"#);
        create_test_json(temp_dir.path(), "other.json", r#"{"id": 3}"#);

        let args = args_for(vec![temp_dir.path().to_path_buf()]);
        let filter = NameFilter::new(Some("*_SUM_*".to_string())).unwrap();
        let files = collect_input_files(&args, &filter).unwrap();

        assert_eq!(files.len(), 2);
    }

    #[test]
    fn test_max_depth() {
        let temp_dir = TempDir::new().unwrap();
        let sub_dir = temp_dir.path().join("subdir");
        fs::create_dir(&sub_dir).unwrap();
        let deep_dir = sub_dir.join("deep");
        fs::create_dir(&deep_dir).unwrap();

        create_test_json(temp_dir.path(), "root.json", r#"{"level": 0}"#);
        create_test_json(&sub_dir, "level1.json", r#"{"level": 1}"#);
        create_test_json(&deep_dir, "level2.json", r#"{"level": 2}"#);

        let mut args = args_for(vec![temp_dir.path().to_path_buf()]);
        args.max_depth = Some(2);
        let files = collect_input_files(&args, &NameFilter::new(None).unwrap()).unwrap();

        // root.json, level1.json (level2.json은 깊이 3)
        assert_eq!(files.len(), 2);
    }

    #[test]
    fn test_missing_input() {
        let args = args_for(vec![PathBuf::from("/nonexistent/input")]);
        let result = collect_input_files(&args, &NameFilter::new(None).unwrap());
        assert!(result.is_err());
    }
}
