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

fn handle_overview_open(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let records = match load_records(conn, req) {
        Ok(v) => v,
        Err(e) => return e,
    };

    let departments = analytics::department_counts(&records);
    let totals: Vec<f64> = records.iter().filter_map(|r| r.total_marks).collect();
    let avg_marks = analytics::round2(analytics::compute_stats(&totals).avg);
    let distribution = analytics::distribution_metrics(&departments);

    ok(
        &req.id,
        json!({
            "totalStudents": records.len(),
            "totalDepartments": departments.len(),
            "avgMarks": avg_marks,
            "studentsPerDepartment": departments,
            "distribution": distribution
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "overview.open" => Some(handle_overview_open(state, req)),
        _ => None,
    }
}
