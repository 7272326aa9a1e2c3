use crate::analytics;
use crate::db;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::record::StudentRecord;
use rusqlite::Connection;
use serde_json::json;

fn db_conn<'a>(state: &'a AppState, req: &Request) -> Result<&'a Connection, serde_json::Value> {
    state
        .db
        .as_ref()
        .ok_or_else(|| err(&req.id, "no_dataset", "open a dataset first", None))
}

fn load_records(conn: &Connection, req: &Request) -> Result<Vec<StudentRecord>, serde_json::Value> {
    db::load_student_records(conn)
        .map_err(|e| err(&req.id, "db_query_failed", e.to_string(), None))
}

fn optional_filter(req: &Request, key: &str) -> Result<Option<String>, serde_json::Value> {
    let Some(value) = req.params.get(key) else {
        return Ok(None);
    };
    if value.is_null() {
        return Ok(None);
    }
    let Some(raw) = value.as_str() else {
        return Err(err(
            &req.id,
            "bad_params",
            format!("{} must be a string or null", key),
            None,
        ));
    };
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Ok(None);
    }
    Ok(Some(trimmed.to_string()))
}

fn handle_department_open(state: &mut AppState, req: &Request) -> serde_json::Value {
    let department = match optional_filter(req, "department") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let semester = match optional_filter(req, "semester") {
        Ok(v) => v,
        Err(e) => return e,
    };
    let conn = match db_conn(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let records = match load_records(conn, req) {
        Ok(v) => v,
        Err(e) => return e,
    };

    let rows: Vec<StudentRecord> = records
        .into_iter()
        .filter(|r| {
            let dept_ok = department
                .as_deref()
                .map(|d| r.department.as_deref() == Some(d))
                .unwrap_or(true);
            let sem_ok = semester
                .as_deref()
                .map(|s| r.semester.as_deref() == Some(s))
                .unwrap_or(true);
            dept_ok && sem_ok
        })
        .collect();

    let totals: Vec<f64> = rows.iter().filter_map(|r| r.total_marks).collect();
    let avg_marks = analytics::round2(analytics::compute_stats(&totals).avg);

    ok(
        &req.id,
        json!({
            "department": department,
            "semester": semester,
            "totalStudents": rows.len(),
            "avgMarks": avg_marks,
            "performance": analytics::compute_performance_metrics(&rows),
            "passFail": analytics::pass_fail_analysis(&rows),
            "subjectAverages": analytics::subject_averages(&rows, true),
            "rows": rows
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "department.open" => Some(handle_department_open(state, req)),
        _ => None,
    }
}
