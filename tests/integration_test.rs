//! 통합 테스트 모듈
//!
//! jcsv의 전체 기능을 테스트합니다.

#![allow(dead_code)]

use std::fs;
use std::path::PathBuf;
use tempfile::TempDir;

use jcsv::IncomingFile;

/// 테스트용 JSON 파일 생성 헬퍼
fn create_json_file(dir: &std::path::Path, name: &str, content: &str) -> PathBuf {
    let path = dir.join(name);
    fs::write(&path, content).unwrap();
    path
}

/// 메모리 내용으로 수집할 JSON 파일
fn json_file(name: &str, content: &str) -> IncomingFile {
    IncomingFile::from_bytes(name, Some("application/json"), content.as_bytes().to_vec())
}

/// 유효/무효가 섞인 테스트 디렉토리 생성
fn setup_mixed_directory() -> TempDir {
    let temp_dir = TempDir::new().unwrap();

    create_json_file(
        temp_dir.path(),
        "users.json",
        r#"[{"id": 1, "name": "Kim"}, {"id": 2, "team": "core"}]"#,
    );
    create_json_file(temp_dir.path(), "invalid.json", r#"{"id": 1, broken"#);
    create_json_file(temp_dir.path(), "single.json", r#"{"id": 3, "tags": ["a", "b"]}"#);
    create_json_file(temp_dir.path(), "notes.txt", "plain text");

    temp_dir
}

mod parser_tests {
    use jcsv::{parse_records, ParseError};
    use serde_json::json;

    #[test]
    fn test_object_root_is_one_record() {
        let records = parse_records(r#"{"a": 1}"#).unwrap();
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].get("a"), Some(&json!(1)));
    }

    #[test]
    fn test_empty_array_is_zero_records() {
        assert!(parse_records("[]").unwrap().is_empty());
    }

    #[test]
    fn test_shape_errors() {
        assert_eq!(parse_records("[1,2,3]"), Err(ParseError::NonObjectElement));
        assert_eq!(
            parse_records(r#"[{"a":1},2]"#),
            Err(ParseError::NonObjectElement)
        );
        assert_eq!(parse_records(r#""just text""#), Err(ParseError::InvalidRoot));
    }

    #[test]
    fn test_syntax_error() {
        assert!(matches!(
            parse_records("{not json"),
            Err(ParseError::InvalidSyntax { .. })
        ));
    }
}

mod encoder_tests {
    use jcsv::{encode, parse_records};

    #[test]
    fn test_header_union_order() {
        let records = parse_records(r#"[{"a":1,"b":2},{"b":3,"c":4}]"#).unwrap();
        let csv = encode(&records).unwrap();

        assert_eq!(csv.headers, vec!["a", "b", "c"]);
        assert_eq!(csv.text, "a,b,c\n1,2,\n,3,4");
    }

    #[test]
    fn test_escaping() {
        let records = parse_records(
            r#"[{"a":"x,y"},{"a":"he said \"hi\""},{"a":"line1\nline2"}]"#,
        )
        .unwrap();
        let csv = encode(&records).unwrap();

        assert_eq!(csv.headers, vec!["a"]);
        let expected = [
            "a",
            "\"x,y\"",
            "\"he said \"\"hi\"\"\"",
            "\"line1\nline2\"",
        ]
        .join("\n");
        assert_eq!(csv.text, expected);
    }

    #[test]
    fn test_empty_batch_rule() {
        let csv = encode(&[]).unwrap();
        assert!(csv.headers.is_empty());
        assert!(csv.text.is_empty());
    }

    #[test]
    fn test_null_renders_empty() {
        let records = parse_records(r#"[{"a":null,"b":1}]"#).unwrap();
        assert_eq!(encode(&records).unwrap().text, "a,b\n,1");
    }
}

mod batch_tests {
    use super::*;
    use jcsv::{BatchCoordinator, ConvertError, EntryStatus};

    #[test]
    fn test_failure_isolation() {
        let batch = BatchCoordinator::default();
        let ids = batch.ingest(vec![
            json_file("one.json", r#"{"a": 1}"#),
            json_file("two.json", r#"{"a": 2, oops"#),
            json_file("three.json", r#"[{"a": 3}]"#),
        ]);

        assert_eq!(batch.status(ids[0]), Some(EntryStatus::Parsed));
        assert_eq!(batch.status(ids[1]), Some(EntryStatus::Error));
        assert_eq!(batch.status(ids[2]), Some(EntryStatus::Parsed));

        let entries = batch.entries();
        assert!(entries[1].error_message.is_some());
        assert!(entries[0].error_message.is_none());
    }

    #[test]
    fn test_many_concurrent_files() {
        let batch = BatchCoordinator::default();
        let files: Vec<IncomingFile> = (0..64)
            .map(|i| {
                let content = if i % 5 == 0 {
                    "[1]".to_string()
                } else {
                    format!(r#"[{{"n": {i}}}]"#)
                };
                json_file(&format!("f{i}.json"), &content)
            })
            .collect();

        let ids = batch.ingest(files);
        assert_eq!(ids.len(), 64);

        let entries = batch.entries();
        for (i, entry) in entries.iter().enumerate() {
            assert_eq!(entry.id, ids[i]);
            assert_eq!(entry.source_name, format!("f{i}.json"));
            let expected = if i % 5 == 0 {
                EntryStatus::Error
            } else {
                EntryStatus::Parsed
            };
            assert_eq!(entry.status, expected, "f{i}.json");
        }

        let summary = batch.convert_all().unwrap();
        assert_eq!(summary.converted, 51);
        assert_eq!(batch.converted_count(), 51);
    }

    #[test]
    fn test_convert_all_idempotent() {
        let batch = BatchCoordinator::default();
        batch.ingest(vec![
            json_file("a.json", r#"[{"x": 1}, {"y": "z"}]"#),
            json_file("b.json", r#"{"k": true}"#),
        ]);

        batch.convert_all().unwrap();
        let first: Vec<String> = batch
            .converted_entries()
            .iter()
            .map(|c| c.csv.text.clone())
            .collect();

        assert!(matches!(
            batch.convert_all(),
            Err(ConvertError::NothingToConvert)
        ));
        let second: Vec<String> = batch
            .converted_entries()
            .iter()
            .map(|c| c.csv.text.clone())
            .collect();

        assert_eq!(first, second);
        assert_eq!(first, vec!["x,y\n1,\n,z", "k\ntrue"]);
    }

    #[test]
    fn test_late_entries_need_another_convert() {
        let batch = BatchCoordinator::default();
        batch.ingest(vec![json_file("a.json", "{}")]);
        batch.convert_all().unwrap();

        let late = batch.ingest(vec![json_file("b.json", r#"{"b": 1}"#)]);
        assert_eq!(batch.status(late[0]), Some(EntryStatus::Parsed));
        assert!(batch.has_parsed());

        batch.convert_all().unwrap();
        assert_eq!(batch.status(late[0]), Some(EntryStatus::Converted));
        assert_eq!(batch.converted_count(), 2);
    }

    #[test]
    fn test_empty_array_converts_to_empty_csv() {
        let batch = BatchCoordinator::default();
        let ids = batch.ingest(vec![json_file("empty.json", "[]")]);
        batch.convert_all().unwrap();

        assert_eq!(batch.status(ids[0]), Some(EntryStatus::Converted));
        let converted = batch.converted_entries();
        assert_eq!(converted[0].csv.text, "");
        assert!(converted[0].csv.headers.is_empty());
    }

    #[test]
    fn test_bom_prefixed_file_parses() {
        let mut content = vec![0xEF, 0xBB, 0xBF];
        content.extend_from_slice(br#"[{"a": 1.0}]"#);

        let batch = BatchCoordinator::default();
        let ids = batch.ingest(vec![IncomingFile::from_bytes(
            "windows.json",
            None,
            content,
        )]);
        assert_eq!(batch.status(ids[0]), Some(EntryStatus::Parsed));

        batch.convert_all().unwrap();
        assert_eq!(batch.converted_entries()[0].csv.text, "a\n1");
    }

    #[test]
    fn test_mime_only_file_accepted() {
        let batch = BatchCoordinator::default();
        let ids = batch.ingest(vec![
            IncomingFile::from_bytes("export", Some("application/json"), b"{}".to_vec()),
            IncomingFile::from_bytes("export.txt", Some("text/plain"), b"{}".to_vec()),
        ]);

        assert_eq!(batch.status(ids[0]), Some(EntryStatus::Parsed));
        assert_eq!(batch.status(ids[1]), Some(EntryStatus::Error));
    }

    #[test]
    fn test_preview_auto_selection_and_reset() {
        let batch = BatchCoordinator::default();
        let ids = batch.ingest(vec![json_file("a.json", r#"{"a": 1}"#)]);
        assert_eq!(batch.preview_id(), None);

        batch.convert_all().unwrap();
        assert_eq!(batch.preview_id(), Some(ids[0]));

        let table = batch.preview().unwrap();
        assert_eq!(table.headers, vec!["a"]);
        assert_eq!(table.rows, vec![vec!["1"]]);

        batch.reset();
        assert_eq!(batch.preview_id(), None);
        assert_eq!(batch.default_preview(), None);
        assert_eq!(batch.converted_count(), 0);
    }

    #[test]
    fn test_preview_truncation_notice() {
        let batch = BatchCoordinator::default();
        let rows: Vec<String> = (0..8).map(|i| format!(r#"{{"i": {i}}}"#)).collect();
        batch.ingest(vec![json_file("big.json", &format!("[{}]", rows.join(",")))]);
        batch.convert_all().unwrap();

        let table = batch.preview().unwrap();
        assert_eq!(table.rows.len(), 5);
        assert_eq!(table.total_rows, 8);
        assert!(table.notice().is_some());
    }

    #[test]
    fn test_ingest_from_disk() {
        let temp_dir = setup_mixed_directory();
        let mut paths: Vec<PathBuf> = fs::read_dir(temp_dir.path())
            .unwrap()
            .map(|e| e.unwrap().path())
            .collect();
        paths.sort();

        let batch = BatchCoordinator::default();
        batch.ingest(paths.into_iter().map(IncomingFile::from_path).collect());

        let summary = batch.summary();
        assert_eq!(summary.total, 4);
        assert_eq!(summary.parsed, 2);
        assert_eq!(summary.errors, 2);
        assert!(summary.bytes_read > 0);
        assert!(!batch.is_processing());
    }
}

mod packager_tests {
    use super::*;
    use jcsv::{BatchCoordinator, ConvertError, PayloadKind};
    use std::io::{Cursor, Read};

    #[test]
    fn test_zero_converted() {
        let batch = BatchCoordinator::default();
        batch.ingest(vec![json_file("bad.json", "nope")]);
        assert!(matches!(batch.package(), Err(ConvertError::NothingToDownload)));
    }

    #[test]
    fn test_one_converted() {
        let batch = BatchCoordinator::default();
        batch.ingest(vec![
            json_file("report.json", r#"{"a": 1}"#),
            json_file("broken.json", "["),
        ]);
        batch.convert_all().unwrap();

        let payload = batch.package().unwrap();
        assert_eq!(payload.kind, PayloadKind::Csv);
        assert_eq!(payload.name, "report.csv");
        assert_eq!(payload.bytes, b"a\n1");
    }

    #[test]
    fn test_two_converted() {
        let batch = BatchCoordinator::default();
        batch.ingest(vec![
            json_file("first.json", r#"{"a": 1}"#),
            IncomingFile::from_bytes("skip.txt", Some("text/plain"), b"{}".to_vec()),
            json_file("second.json", r#"{"b": 2}"#),
        ]);
        batch.convert_all().unwrap();

        let payload = batch.package().unwrap();
        assert_eq!(payload.kind, PayloadKind::Archive);

        let mut archive = zip::ZipArchive::new(Cursor::new(payload.bytes)).unwrap();
        assert_eq!(archive.len(), 2);

        let mut first = String::new();
        archive
            .by_name("first.csv")
            .unwrap()
            .read_to_string(&mut first)
            .unwrap();
        assert_eq!(first, "a\n1");

        let mut second = String::new();
        archive
            .by_name("second.csv")
            .unwrap()
            .read_to_string(&mut second)
            .unwrap();
        assert_eq!(second, "b\n2");
    }

    #[test]
    fn test_write_payload_to_folder() {
        let out_dir = TempDir::new().unwrap();
        let batch = BatchCoordinator::default();
        batch.ingest(vec![json_file("data.json", r#"[{"id": 1}]"#)]);
        batch.convert_all().unwrap();

        let payload = batch.package().unwrap();
        let path = payload
            .write_to(&out_dir.path().join("nested"), jcsv::WriteMode::Overwrite)
            .unwrap();

        assert!(path.ends_with("data.csv"));
        assert_eq!(fs::read_to_string(path).unwrap(), "id\n1");
    }
}

mod filter_tests {
    use jcsv::NameFilter;

    #[test]
    fn test_glob_star() {
        let filter = NameFilter::new(Some("*.json".to_string())).unwrap();
        assert!(filter.matches("test.json"));
        assert!(!filter.matches("test.txt"));
    }

    #[test]
    fn test_complex_pattern() {
        let filter = NameFilter::new(Some("data_*_[0-9].json".to_string())).unwrap();
        assert!(filter.matches("data_test_1.json"));
        assert!(!filter.matches("data_test_10.json")); // 10은 두 자리
        assert!(!filter.matches("other_test_1.json"));
    }
}

mod error_tests {
    use jcsv::{ConvertError, ParseError};

    #[test]
    fn test_parse_error_display() {
        let error = ConvertError::from(ParseError::InvalidRoot);
        let msg = error.to_string();
        assert!(msg.contains("JSON 파싱 실패"));
        assert!(msg.contains("root must be an object or array"));
    }

    #[test]
    fn test_nothing_to_download_display() {
        assert_eq!(ConvertError::NothingToDownload.to_string(), "nothing to download");
    }
}
