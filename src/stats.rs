//! 통계 및 유틸리티 모듈
//!
//! 배치 집계, 처리 통계 출력 및 포맷팅을 담당합니다.

use colored::Colorize;
use serde::Serialize;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{Duration, Instant};

use crate::entry::{EntryStatus, FileConversionEntry};

/// 배치 상태 집계 (저장 필드가 아닌 파생 값)
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub pending: usize,
    pub reading: usize,
    pub parsing: usize,
    pub parsed: usize,
    pub converting: usize,
    pub converted: usize,
    pub errors: usize,
    /// 읽은 총 바이트
    pub bytes_read: u64,
}

impl BatchSummary {
    pub fn from_entries(entries: &[FileConversionEntry]) -> Self {
        entries.iter().fold(
            Self {
                total: entries.len(),
                ..Default::default()
            },
            |mut summary, entry| {
                let counter = match entry.status() {
                    EntryStatus::Pending => &mut summary.pending,
                    EntryStatus::Reading => &mut summary.reading,
                    EntryStatus::Parsing => &mut summary.parsing,
                    EntryStatus::Parsed => &mut summary.parsed,
                    EntryStatus::Converting => &mut summary.converting,
                    EntryStatus::Converted => &mut summary.converted,
                    EntryStatus::Error => &mut summary.errors,
                };
                *counter += 1;
                summary.bytes_read += entry.bytes_read();
                summary
            },
        )
    }

    pub fn has_parsed(&self) -> bool {
        self.parsed > 0
    }

    pub fn is_processing(&self) -> bool {
        self.reading + self.parsing + self.converting > 0
    }

    pub fn converted_count(&self) -> usize {
        self.converted
    }

    /// 전체 대비 성공 비율 (%)
    pub fn success_rate(&self, succeeded: usize) -> Option<f64> {
        (self.total > 0).then(|| succeeded as f64 / self.total as f64 * 100.0)
    }
}

/// 처리 통계 구조체
#[derive(Debug)]
pub struct Statistics {
    /// 쓴 총 바이트
    pub total_bytes_written: AtomicU64,
    /// 처리 시작 시간
    start_time: Instant,
}

impl Default for Statistics {
    fn default() -> Self {
        Self::new()
    }
}

impl Statistics {
    /// 새 통계 인스턴스 생성
    pub fn new() -> Self {
        Self {
            total_bytes_written: AtomicU64::new(0),
            start_time: Instant::now(),
        }
    }

    /// 쓴 바이트 추가
    pub fn add_bytes_written(&self, bytes: u64) {
        self.total_bytes_written.fetch_add(bytes, Ordering::Relaxed);
    }

    pub fn bytes_written(&self) -> u64 {
        self.total_bytes_written.load(Ordering::Relaxed)
    }

    /// 경과 시간 반환
    pub fn elapsed(&self) -> Duration {
        self.start_time.elapsed()
    }

    /// 변환 통계 요약 출력
    pub fn print_summary(&self, summary: &BatchSummary) {
        print_rule();
        println!("{}", " 📊 변환 통계".bright_white().bold());
        print_rule();

        println!("  {} 전체 파일:    {}", "📁".bright_cyan(), summary.total);
        println!(
            "  {} 변환 완료:    {}",
            "✅".bright_green(),
            summary.converted.to_string().green()
        );
        print_error_line(summary.errors);

        let waiting = summary.parsed + summary.pending;
        if waiting > 0 {
            println!(
                "  {} 미변환:       {}",
                "⏸️".bright_yellow(),
                waiting.to_string().yellow()
            );
        }

        println!(
            "  {} 입력 용량:    {}",
            "📥".bright_yellow(),
            format_bytes(summary.bytes_read)
        );
        println!(
            "  {} 출력 용량:    {}",
            "📤".bright_magenta(),
            format_bytes(self.bytes_written())
        );

        if let Some(rate) = summary.success_rate(summary.converted) {
            println!("  {} 성공률:       {:.1}%", "📈".bright_white(), rate);
        }

        println!(
            "  {} 처리 시간:    {}",
            "⏱️".bright_cyan(),
            format_duration(self.elapsed())
        );

        print_rule();
    }

    /// 유효성 검사 통계 요약 출력
    pub fn print_validation_summary(&self, summary: &BatchSummary) {
        print_rule();
        println!("{}", " 🔍 유효성 검사 결과".bright_white().bold());
        print_rule();

        println!("  {} 전체 파일:    {}", "📁".bright_cyan(), summary.total);
        println!(
            "  {} 유효:         {}",
            "✅".bright_green(),
            summary.parsed.to_string().green()
        );
        print_error_line(summary.errors);

        if let Some(rate) = summary.success_rate(summary.parsed) {
            println!("  {} 유효율:       {:.1}%", "📈".bright_white(), rate);
        }

        println!(
            "  {} 검사 시간:    {}",
            "⏱️".bright_cyan(),
            format_duration(self.elapsed())
        );

        print_rule();
    }
}

fn print_rule() {
    println!("{}", "═".repeat(50).bright_blue());
}

fn print_error_line(errors: usize) {
    if errors > 0 {
        println!(
            "  {} 실패:         {}",
            "❌".bright_red(),
            errors.to_string().red()
        );
    } else {
        println!("  {} 실패:         {}", "✅".bright_green(), "0".green());
    }
}

/// 바이트를 읽기 쉬운 형식으로 변환
///
/// # Examples
/// ```
/// use jcsv::stats::format_bytes;
///
/// assert_eq!(format_bytes(500), "500 B");
/// assert_eq!(format_bytes(1024), "1.00 KB");
/// assert_eq!(format_bytes(1048576), "1.00 MB");
/// ```
pub fn format_bytes(bytes: u64) -> String {
    const KB: u64 = 1024;
    const MB: u64 = KB * 1024;
    const GB: u64 = MB * 1024;

    if bytes >= GB {
        format!("{:.2} GB", bytes as f64 / GB as f64)
    } else if bytes >= MB {
        format!("{:.2} MB", bytes as f64 / MB as f64)
    } else if bytes >= KB {
        format!("{:.2} KB", bytes as f64 / KB as f64)
    } else {
        format!("{} B", bytes)
    }
}

/// 경과 시간을 읽기 쉬운 형식으로 변환
pub fn format_duration(duration: Duration) -> String {
    let secs = duration.as_secs();
    let millis = duration.subsec_millis();

    if secs >= 3600 {
        format!("{}시간 {}분", secs / 3600, (secs % 3600) / 60)
    } else if secs >= 60 {
        format!("{}분 {}초", secs / 60, secs % 60)
    } else if secs > 0 {
        format!("{}.{:03}초", secs, millis)
    } else {
        format!("{}ms", millis)
    }
}
