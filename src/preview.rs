//! 미리보기 모듈
//!
//! 선택된 변환 항목의 헤더와 앞쪽 몇 개 행을 표 형태로 보여줍니다.

use crate::encoder::cell_text;
use crate::parser::Record;

/// 미리보기에 표시할 최대 행 수
pub const PREVIEW_ROWS: usize = 5;

/// 읽기 전용 미리보기 표
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreviewTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
    /// 전체 데이터 행 수
    pub total_rows: usize,
}

impl PreviewTable {
    pub fn new(headers: &[String], records: &[Record]) -> Self {
        let rows = records
            .iter()
            .take(PREVIEW_ROWS)
            .map(|record| {
                headers
                    .iter()
                    .map(|h| record.get(h).map(cell_text).unwrap_or_default())
                    .collect()
            })
            .collect();

        Self {
            headers: headers.to_vec(),
            rows,
            total_rows: records.len(),
        }
    }

    pub fn is_truncated(&self) -> bool {
        self.total_rows > self.rows.len()
    }

    /// 잘린 경우 안내 문구
    pub fn notice(&self) -> Option<String> {
        self.is_truncated().then(|| {
            format!(
                "(전체 {}개 데이터 행 중 처음 {}개 표시)",
                self.total_rows,
                self.rows.len()
            )
        })
    }

    /// 열 너비를 맞춘 텍스트 표
    pub fn render(&self) -> String {
        let widths: Vec<usize> = self
            .headers
            .iter()
            .enumerate()
            .map(|(i, h)| {
                self.rows
                    .iter()
                    .map(|row| display_width(&row[i]))
                    .chain(std::iter::once(display_width(h)))
                    .max()
                    .unwrap_or(0)
            })
            .collect();

        let format_line = |cells: &[String]| -> String {
            cells
                .iter()
                .zip(&widths)
                .map(|(cell, width)| {
                    let flat = flatten(cell);
                    let pad = width.saturating_sub(display_width(cell));
                    format!("{}{}", flat, " ".repeat(pad))
                })
                .collect::<Vec<_>>()
                .join(" | ")
                .trim_end()
                .to_string()
        };

        let mut lines = vec![format_line(&self.headers)];
        lines.push(
            widths
                .iter()
                .map(|w| "-".repeat(*w))
                .collect::<Vec<_>>()
                .join("-+-"),
        );
        lines.extend(self.rows.iter().map(|row| format_line(row)));
        lines.join("\n")
    }
}

// 줄바꿈은 한 줄 표시를 위해 공백으로 바꿉니다.
fn flatten(cell: &str) -> String {
    cell.replace(['\r', '\n'], " ")
}

fn display_width(cell: &str) -> usize {
    cell.chars().count()
}
