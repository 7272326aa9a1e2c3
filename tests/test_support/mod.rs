#![allow(dead_code)]

use rusqlite::types::Value;
use rusqlite::{params_from_iter, Connection};
use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

pub fn temp_dir(prefix: &str) -> PathBuf {
    let p = std::env::temp_dir().join(format!(
        "{}-{}",
        prefix,
        SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .expect("clock")
            .as_nanos()
    ));
    std::fs::create_dir_all(&p).expect("create temp dir");
    p
}

pub fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_resultsd");
    let mut child = Command::new(exe)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn resultsd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

pub fn request(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let payload = json!({
        "id": id,
        "method": method,
        "params": params,
    });
    writeln!(stdin, "{}", payload).expect("write request");
    stdin.flush().expect("flush request");

    let mut line = String::new();
    reader.read_line(&mut line).expect("read response line");
    assert!(!line.trim().is_empty(), "empty response for {}", method);
    let value: serde_json::Value = serde_json::from_str(line.trim()).expect("parse response json");
    assert_eq!(value.get("id").and_then(|v| v.as_str()), Some(id));
    value
}

pub fn request_ok(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> serde_json::Value {
    let value = request(stdin, reader, id, method, params);
    assert_eq!(
        value.get("ok").and_then(|v| v.as_bool()),
        Some(true),
        "expected ok for {}: {}",
        method,
        value
    );
    value.get("result").cloned().expect("result payload")
}

pub fn request_err_code(
    stdin: &mut ChildStdin,
    reader: &mut BufReader<ChildStdout>,
    id: &str,
    method: &str,
    params: serde_json::Value,
) -> String {
    let value = request(stdin, reader, id, method, params);
    assert_eq!(
        value.get("ok").and_then(|v| v.as_bool()),
        Some(false),
        "expected error for {}: {}",
        method,
        value
    );
    value
        .get("error")
        .and_then(|e| e.get("code"))
        .and_then(|v| v.as_str())
        .expect("error code")
        .to_string()
}

#[derive(Debug, Clone, Default)]
pub struct FixtureSubject {
    pub code: &'static str,
    pub name: &'static str,
    pub internal: Option<f64>,
    pub external: Option<f64>,
    pub total: Option<f64>,
    pub result: Option<&'static str>,
}

#[derive(Debug, Clone, Default)]
pub struct FixtureStudent {
    pub name: &'static str,
    pub seat: &'static str,
    pub department: &'static str,
    pub year: &'static str,
    pub semester: &'static str,
    pub internal: Option<f64>,
    pub external: Option<f64>,
    pub total: Option<f64>,
    pub subjects: Vec<FixtureSubject>,
}

fn text_or_null(value: &str) -> Value {
    if value.is_empty() {
        Value::Null
    } else {
        Value::Text(value.to_string())
    }
}

fn real_or_null(value: Option<f64>) -> Value {
    value.map(Value::Real).unwrap_or(Value::Null)
}

/// Write a dataset file with the upstream wide schema: spaced headers, one
/// row per student, subject slots flattened into indexed columns.
pub fn write_dataset(path: &Path, students: &[FixtureStudent]) {
    let slots = students.iter().map(|s| s.subjects.len()).max().unwrap_or(0);

    let mut columns: Vec<String> = vec![
        "Department".to_string(),
        "Year".to_string(),
        "Semester".to_string(),
        "University Seat Number".to_string(),
        "Student Name".to_string(),
    ];
    for i in 1..=slots {
        columns.push(format!("Subject Code {}", i));
        columns.push(format!("Subject Name {}", i));
        columns.push(format!("Internal Marks {}", i));
        columns.push(format!("External Marks {}", i));
        columns.push(format!("Total Marks {}", i));
        columns.push(format!("Result {}", i));
    }
    columns.push("Total Internal Marks".to_string());
    columns.push("Total External Marks".to_string());
    columns.push("Grand Total Marks".to_string());

    let conn = Connection::open(path).expect("create dataset");
    let ddl = format!(
        "CREATE TABLE results({})",
        columns
            .iter()
            .map(|c| format!("\"{}\"", c))
            .collect::<Vec<_>>()
            .join(", ")
    );
    conn.execute(&ddl, []).expect("create results table");

    let placeholders = std::iter::repeat("?")
        .take(columns.len())
        .collect::<Vec<_>>()
        .join(",");
    let insert = format!("INSERT INTO results VALUES ({})", placeholders);

    for student in students {
        let mut values: Vec<Value> = vec![
            text_or_null(student.department),
            text_or_null(student.year),
            text_or_null(student.semester),
            text_or_null(student.seat),
            text_or_null(student.name),
        ];
        for i in 0..slots {
            match student.subjects.get(i) {
                Some(subject) => {
                    values.push(text_or_null(subject.code));
                    values.push(text_or_null(subject.name));
                    values.push(real_or_null(subject.internal));
                    values.push(real_or_null(subject.external));
                    values.push(real_or_null(subject.total));
                    values.push(
                        subject
                            .result
                            .map(|r| Value::Text(r.to_string()))
                            .unwrap_or(Value::Null),
                    );
                }
                None => {
                    for _ in 0..6 {
                        values.push(Value::Null);
                    }
                }
            }
        }
        values.push(real_or_null(student.internal));
        values.push(real_or_null(student.external));
        values.push(real_or_null(student.total));

        conn.execute(&insert, params_from_iter(values))
            .expect("insert student row");
    }
}

pub fn plain_student(
    name: &'static str,
    seat: &'static str,
    department: &'static str,
    total: f64,
) -> FixtureStudent {
    FixtureStudent {
        name,
        seat,
        department,
        year: "2021",
        semester: "4",
        total: Some(total),
        ..FixtureStudent::default()
    }
}
