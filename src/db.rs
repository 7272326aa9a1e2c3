use std::path::{Path, PathBuf};

use chrono::Local;
use rusqlite::types::ValueRef;
use rusqlite::{Connection, OptionalExtension};

use crate::record::{StudentRecord, SubjectResult, SubjectSlot, MAX_SUBJECTS};

/// Table names the upstream extraction pipeline is known to write, in
/// preference order.
const RESULT_TABLE_CANDIDATES: [&str; 4] = ["results", "result", "student_results", "result_sheet"];

/// Resolve a dataset file. A file path is taken as-is; a directory is
/// searched for today's dated dump, `student_results_<DD-MM-YYYY>.db`,
/// the naming the extraction pipeline uses.
pub fn resolve_dataset_path(path: &Path) -> anyhow::Result<PathBuf> {
    if path.is_file() {
        return Ok(path.to_path_buf());
    }
    if path.is_dir() {
        let dated = path.join(format!(
            "student_results_{}.db",
            Local::now().format("%d-%m-%Y")
        ));
        if dated.is_file() {
            return Ok(dated);
        }
        anyhow::bail!("no dataset for today in {}", path.display());
    }
    anyhow::bail!("dataset path not found: {}", path.display())
}

pub fn open_dataset(path: &Path) -> anyhow::Result<Connection> {
    let conn = Connection::open(path)?;
    // Fail here, not on first query, if the file is not a results dump.
    find_results_table(&conn)?;
    Ok(conn)
}

pub fn find_results_table(conn: &Connection) -> anyhow::Result<String> {
    for candidate in RESULT_TABLE_CANDIDATES {
        let found: Option<String> = conn
            .query_row(
                "SELECT name FROM sqlite_master WHERE type='table' AND name = ?",
                [candidate],
                |r| r.get(0),
            )
            .optional()?;
        if let Some(name) = found {
            return Ok(name);
        }
    }

    let first: Option<String> = conn
        .query_row(
            "SELECT name FROM sqlite_master WHERE type='table' AND name NOT LIKE 'sqlite_%' ORDER BY rowid",
            [],
            |r| r.get(0),
        )
        .optional()?;
    let Some(name) = first else {
        anyhow::bail!("no tables found in the dataset");
    };
    Ok(name)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Column {
    Department,
    Year,
    Semester,
    Name,
    Seat,
    GrandTotal,
    TotalExternal,
    TotalInternal,
    SubjectCode(usize),
    SubjectName(usize),
    SubjectInternal(usize),
    SubjectExternal(usize),
    SubjectTotal(usize),
    SubjectResult(usize),
    Ignored,
}

/// Header matching is case-, space- and underscore-insensitive; the
/// upstream sheets vary between "Student Name", "Student_Name" and
/// "studentname" depending on which exporter wrote them.
fn classify_column(raw: &str) -> Column {
    let norm: String = raw
        .trim()
        .chars()
        .filter(|c| *c != ' ' && *c != '_')
        .collect::<String>()
        .to_ascii_lowercase();

    match norm.as_str() {
        "department" | "dept" => return Column::Department,
        "year" => return Column::Year,
        "semester" => return Column::Semester,
        "studentname" => return Column::Name,
        "universityseatnumber" => return Column::Seat,
        "grandtotalmarks" | "totalmarks" => return Column::GrandTotal,
        "totalexternalmarks" => return Column::TotalExternal,
        "totalinternalmarks" => return Column::TotalInternal,
        _ => {}
    }

    let digits: String = norm
        .chars()
        .rev()
        .take_while(|c| c.is_ascii_digit())
        .collect::<String>()
        .chars()
        .rev()
        .collect();
    if digits.is_empty() {
        return Column::Ignored;
    }
    let Ok(slot) = digits.parse::<usize>() else {
        return Column::Ignored;
    };
    if slot < 1 || slot > MAX_SUBJECTS {
        return Column::Ignored;
    }
    let index = slot - 1;
    match &norm[..norm.len() - digits.len()] {
        "subjectcode" => Column::SubjectCode(index),
        "subjectname" => Column::SubjectName(index),
        "internalmarks" => Column::SubjectInternal(index),
        "externalmarks" => Column::SubjectExternal(index),
        "totalmarks" => Column::SubjectTotal(index),
        "result" => Column::SubjectResult(index),
        _ => Column::Ignored,
    }
}

fn is_filler(text: &str) -> bool {
    let t = text.trim();
    t.is_empty() || t.eq_ignore_ascii_case("n/a") || t.eq_ignore_ascii_case("nan")
}

fn cell_string(value: ValueRef<'_>) -> Option<String> {
    match value {
        ValueRef::Null => None,
        ValueRef::Integer(i) => Some(i.to_string()),
        ValueRef::Real(f) => Some(f.to_string()),
        ValueRef::Text(bytes) => {
            let text = String::from_utf8_lossy(bytes);
            if is_filler(&text) {
                None
            } else {
                Some(text.trim().to_string())
            }
        }
        ValueRef::Blob(_) => None,
    }
}

fn cell_f64(value: ValueRef<'_>) -> Option<f64> {
    match value {
        ValueRef::Null => None,
        ValueRef::Integer(i) => Some(i as f64),
        ValueRef::Real(f) => Some(f),
        ValueRef::Text(bytes) => {
            let text = String::from_utf8_lossy(bytes);
            if is_filler(&text) {
                None
            } else {
                text.trim().parse::<f64>().ok()
            }
        }
        ValueRef::Blob(_) => None,
    }
}

pub fn load_student_records(conn: &Connection) -> anyhow::Result<Vec<StudentRecord>> {
    let table = find_results_table(conn)?;
    let mut stmt = conn.prepare(&format!("SELECT * FROM \"{}\"", table))?;
    let columns: Vec<Column> = stmt
        .column_names()
        .iter()
        .map(|name| classify_column(name))
        .collect();

    let mut records = Vec::new();
    let mut rows = stmt.query([])?;
    while let Some(row) = rows.next()? {
        let mut record = StudentRecord::default();
        let mut slots: Vec<SubjectSlot> = vec![SubjectSlot::default(); MAX_SUBJECTS];

        for (i, column) in columns.iter().enumerate() {
            let value = row.get_ref(i)?;
            match column {
                Column::Department => record.department = cell_string(value),
                Column::Year => record.year = cell_string(value),
                Column::Semester => record.semester = cell_string(value),
                Column::Name => {
                    if let Some(name) = cell_string(value) {
                        record.name = name;
                    }
                }
                Column::Seat => {
                    if let Some(seat) = cell_string(value) {
                        record.seat_number = seat;
                    }
                }
                Column::GrandTotal => record.total_marks = cell_f64(value),
                Column::TotalExternal => record.external_marks = cell_f64(value),
                Column::TotalInternal => record.internal_marks = cell_f64(value),
                Column::SubjectCode(s) => slots[*s].subject_code = cell_string(value),
                Column::SubjectName(s) => slots[*s].subject_name = cell_string(value),
                Column::SubjectInternal(s) => slots[*s].internal_marks = cell_f64(value),
                Column::SubjectExternal(s) => slots[*s].external_marks = cell_f64(value),
                Column::SubjectTotal(s) => slots[*s].total_marks = cell_f64(value),
                Column::SubjectResult(s) => {
                    slots[*s].result = cell_string(value).map(|c| SubjectResult::from_code(&c));
                }
                Column::Ignored => {}
            }
        }

        if record.name.is_empty() {
            record.name = "Unknown".to_string();
        }
        if record.seat_number.is_empty() {
            record.seat_number = "Unknown".to_string();
        }

        while slots.last().map(|s| s.is_empty()).unwrap_or(false) {
            slots.pop();
        }
        record.subjects = slots;
        records.push(record);
    }

    Ok(records)
}
