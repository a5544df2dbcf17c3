//! End-to-end behavior of `FileLogger` against the real filesystem.

use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Barrier};
use std::thread;

use file_log_sink::caller::{NoCallerInfo, StackCallerInfo};
use file_log_sink::record::{CALLER, DATA, MESSAGE, TIMESTAMP, TYPE};
use file_log_sink::{
    log_entry, CsvBackend, FileLogger, LogBackend, LogError, LogRecord, Severity, Value,
};
use serde_json::json;
use tempfile::tempdir;

const TEMPLATE: &str = "[{timestamp}] - {type} - {caller} - {message} - {data}";

/// Backend with a fixed header and clock so whole files can be compared.
struct FixedBackend {
    dir: PathBuf,
}

impl LogBackend for FixedBackend {
    fn path_for_source(&self, source: &str) -> PathBuf {
        self.dir.join(format!("{source}.log"))
    }

    fn generate_file_header(&self, source: &str, _template: &str) -> String {
        format!("#HEADER {source}")
    }

    fn render_timestamp(&self) -> String {
        "NOW".to_string()
    }
}

fn fixed_logger(dir: &Path) -> FileLogger {
    FileLogger::builder(
        "app",
        Arc::new(FixedBackend {
            dir: dir.to_path_buf(),
        }),
    )
    .template(TEMPLATE)
    .caller_info(Arc::new(NoCallerInfo))
    .build()
    .unwrap()
}

fn record(timestamp: &str, kind: &str, caller: &str, message: &str, data: Value) -> LogRecord {
    LogRecord::new()
        .with_field(TIMESTAMP, timestamp)
        .with_field(TYPE, kind)
        .with_field(CALLER, caller)
        .with_field(MESSAGE, message)
        .with_field(DATA, data)
}

#[test]
fn fresh_file_gets_header_and_line() {
    let dir = tempdir().unwrap();
    let logger = fixed_logger(dir.path());

    logger
        .add_entry(record("T0", "error", "X:f", "boom", Value::Null))
        .unwrap();

    assert_eq!(
        fs::read_to_string(logger.path()).unwrap(),
        "#HEADER app\n[T0] - error - X:f - boom - \n"
    );
}

#[test]
fn header_written_once_and_lines_in_call_order() {
    let dir = tempdir().unwrap();
    let logger = fixed_logger(dir.path());

    for i in 0..5 {
        logger
            .add_entry(record("", "info", "loop:body", &format!("step {i}"), Value::Null))
            .unwrap();
    }

    let content = fs::read_to_string(logger.path()).unwrap();
    assert_eq!(content.matches("#HEADER").count(), 1);
    let lines: Vec<_> = content.lines().collect();
    assert_eq!(lines.len(), 6);
    for (i, line) in lines[1..].iter().enumerate() {
        assert_eq!(*line, format!("[NOW] - info - loop:body - step {i} - "));
    }
}

#[test]
fn missing_field_leaves_file_untouched() {
    let dir = tempdir().unwrap();
    let logger = fixed_logger(dir.path());
    logger
        .add_entry(record("T0", "info", "a:b", "first", Value::Null))
        .unwrap();
    let before = fs::read(logger.path()).unwrap();

    let mut incomplete = record("T1", "info", "a:b", "second", Value::Null);
    incomplete.remove(DATA);
    let err = logger.add_entry(incomplete).unwrap_err();

    assert!(matches!(err, LogError::MissingRequiredField(name) if name == "data"));
    assert_eq!(fs::read(logger.path()).unwrap(), before);
}

#[test]
fn unknown_field_leaves_file_untouched() {
    let dir = tempdir().unwrap();
    let logger = fixed_logger(dir.path());

    let err = logger
        .add_entry(record("T0", "info", "a:b", "m", Value::Null).with_field("request_id", "r-1"))
        .unwrap_err();

    assert!(matches!(err, LogError::UnknownField(name) if name == "request_id"));
    assert!(!logger.path().exists());
}

#[test]
fn type_and_data_are_normalized() {
    let dir = tempdir().unwrap();
    let logger = fixed_logger(dir.path());

    logger
        .add_entry(record("T0", "bogus", "a:b", "m", json!("a\nb c")))
        .unwrap();
    logger
        .add_entry(record("T1", "warning", "a:b", "m", json!({"k": [1, 2]})))
        .unwrap();

    let content = fs::read_to_string(logger.path()).unwrap();
    let lines: Vec<_> = content.lines().skip(1).collect();
    assert_eq!(
        lines,
        vec![
            "[T0] - info - a:b - m - abc",
            r#"[T1] - warning - a:b - m - {"k":[1,2]}"#,
        ]
    );
}

#[test]
fn write_failure_is_reported_with_path() {
    let dir = tempdir().unwrap();
    let blocker = dir.path().join("blocker");
    fs::write(&blocker, "not a directory").unwrap();

    let logger = FileLogger::builder(
        "app",
        Arc::new(FixedBackend {
            dir: dir.path().to_path_buf(),
        }),
    )
    .path(blocker.join("app.log"))
    .build()
    .unwrap();

    let err = logger
        .add_entry(record("T0", "info", "a:b", "m", Value::Null))
        .unwrap_err();
    match err {
        LogError::WriteFailure { path, .. } => assert_eq!(path, blocker.join("app.log")),
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn macro_supplies_caller() {
    let dir = tempdir().unwrap();
    let logger = fixed_logger(dir.path());

    log_entry!(logger, Severity::Warning, "low disk", json!({"free_mb": 12})).unwrap();
    log_entry!(logger, Severity::Info, "plain").unwrap();

    let content = fs::read_to_string(logger.path()).unwrap();
    let lines: Vec<_> = content.lines().skip(1).collect();
    assert_eq!(
        lines,
        vec![
            r#"[NOW] - warning - file_logger:macro_supplies_caller - low disk - {"free_mb":12}"#,
            "[NOW] - info - file_logger:macro_supplies_caller - plain - ",
        ]
    );
}

#[inline(never)]
fn place_order(logger: &FileLogger) {
    logger.info("order placed", Value::Null).unwrap();
}

#[test]
fn empty_caller_is_inferred_from_stack() {
    let dir = tempdir().unwrap();
    let logger = FileLogger::builder(
        "app",
        Arc::new(FixedBackend {
            dir: dir.path().to_path_buf(),
        }),
    )
    .template("{caller}")
    .caller_info(Arc::new(StackCallerInfo))
    .build()
    .unwrap();

    place_order(&logger);

    let content = fs::read_to_string(logger.path()).unwrap();
    assert_eq!(content.lines().nth(1), Some("file_logger:place_order"));
}

#[test]
fn csv_backend_writes_column_header() {
    let dir = tempdir().unwrap();
    let logger = FileLogger::builder("orders", Arc::new(CsvBackend::new(dir.path())))
        .caller_info(Arc::new(NoCallerInfo))
        .build()
        .unwrap();

    logger
        .add_entry(
            LogRecord::entry(Severity::Error, "declined")
                .with_timestamp("2024-05-01T12:00:00.000Z")
                .with_caller("shop:pay"),
        )
        .unwrap();

    assert_eq!(logger.path(), dir.path().join("orders.csv"));
    assert_eq!(
        fs::read_to_string(logger.path()).unwrap(),
        "timestamp;type;caller;message;data\n2024-05-01T12:00:00.000Z;error;shop:pay;declined;\n"
    );
}

#[test]
fn csv_values_with_separators_stay_in_their_column() {
    let dir = tempdir().unwrap();
    let logger = FileLogger::builder("orders", Arc::new(CsvBackend::new(dir.path())))
        .caller_info(Arc::new(NoCallerInfo))
        .build()
        .unwrap();

    logger
        .add_entry(
            LogRecord::entry(Severity::Warning, "retry; card \"expired\"")
                .with_timestamp("2024-05-01T12:00:00.000Z")
                .with_caller("shop:pay")
                .with_data(json!({"codes": ["a;b"]})),
        )
        .unwrap();

    let content = fs::read_to_string(logger.path()).unwrap();
    assert_eq!(
        content.lines().nth(1),
        Some(r#"2024-05-01T12:00:00.000Z;warning;shop:pay;"retry; card ""expired""";"{""codes"":[""a;b""]}""#)
    );
}

#[test]
fn concurrent_first_writes_share_one_header() {
    const WRITERS: usize = 16;
    const ROUNDS: usize = 20;

    let dir = tempdir().unwrap();
    for round in 0..ROUNDS {
        let logger = FileLogger::builder(
            format!("race{round}"),
            Arc::new(FixedBackend {
                dir: dir.path().to_path_buf(),
            }),
        )
        .template("{message}")
        .caller_info(Arc::new(NoCallerInfo))
        .build()
        .unwrap();
        let start = Barrier::new(WRITERS);

        thread::scope(|scope| {
            for writer in 0..WRITERS {
                let logger = &logger;
                let start = &start;
                scope.spawn(move || {
                    start.wait();
                    logger
                        .add_entry(record("T", "info", "a:b", &format!("writer {writer}"), Value::Null))
                        .unwrap();
                });
            }
        });

        let content = fs::read_to_string(logger.path()).unwrap();
        let lines: Vec<&str> = content.lines().collect();
        assert_eq!(lines[0], format!("#HEADER race{round}"), "round {round}");
        assert_eq!(content.matches("#HEADER").count(), 1, "round {round}");

        let mut bodies: Vec<&str> = lines[1..].to_vec();
        bodies.sort_unstable();
        let mut expected: Vec<String> = (0..WRITERS).map(|w| format!("writer {w}")).collect();
        expected.sort_unstable();
        assert_eq!(bodies, expected, "round {round}");
    }
}
