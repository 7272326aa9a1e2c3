use crate::analytics;
use crate::db;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::record::StudentRecord;
use rusqlite::Connection;
use serde_json::json;

const DEFAULT_PERFORMER_COUNT: usize = 5;

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

fn parse_count(req: &Request) -> Result<usize, serde_json::Value> {
    let Some(value) = req.params.get("count") else {
        return Ok(DEFAULT_PERFORMER_COUNT);
    };
    if value.is_null() {
        return Ok(DEFAULT_PERFORMER_COUNT);
    }
    let Some(count) = value.as_u64() else {
        return Err(err(
            &req.id,
            "bad_params",
            "count must be a positive integer",
            None,
        ));
    };
    if count == 0 {
        return Err(err(&req.id, "bad_params", "count must be >= 1", None));
    }
    Ok(count as usize)
}

fn parse_truncate_labels(req: &Request) -> Result<bool, serde_json::Value> {
    let Some(value) = req.params.get("truncateLabels") else {
        return Ok(true);
    };
    if value.is_null() {
        return Ok(true);
    }
    let Some(flag) = value.as_bool() else {
        return Err(err(
            &req.id,
            "bad_params",
            "truncateLabels must be a boolean",
            None,
        ));
    };
    Ok(flag)
}

fn handle_performance(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let records = match load_records(conn, req) {
        Ok(v) => v,
        Err(e) => return e,
    };

    let metrics = analytics::compute_performance_metrics(&records);
    ok(
        &req.id,
        json!({ "studentCount": records.len(), "performance": metrics }),
    )
}

fn handle_pass_fail(state: &mut AppState, req: &Request) -> serde_json::Value {
    let conn = match db_conn(state, req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let records = match load_records(conn, req) {
        Ok(v) => v,
        Err(e) => return e,
    };

    ok(
        &req.id,
        json!({ "subjects": analytics::pass_fail_analysis(&records) }),
    )
}

fn handle_subject_averages(state: &mut AppState, req: &Request) -> serde_json::Value {
    let truncate = match parse_truncate_labels(req) {
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

    ok(
        &req.id,
        json!({ "subjects": analytics::subject_averages(&records, truncate) }),
    )
}

fn handle_performers(state: &mut AppState, req: &Request) -> serde_json::Value {
    let count = match parse_count(req) {
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

    ok(
        &req.id,
        json!({ "count": count, "performers": analytics::get_performers(&records, count) }),
    )
}

fn handle_dashboard(state: &mut AppState, req: &Request) -> serde_json::Value {
    let count = match parse_count(req) {
        Ok(v) => v,
        Err(e) => return e,
    };
    let truncate = match parse_truncate_labels(req) {
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

    let dashboard = analytics::compute_dashboard(&records, count, truncate);
    ok(
        &req.id,
        json!({ "studentCount": records.len(), "dashboard": dashboard }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "analytics.performance" => Some(handle_performance(state, req)),
        "analytics.passFail" => Some(handle_pass_fail(state, req)),
        "analytics.subjectAverages" => Some(handle_subject_averages(state, req)),
        "analytics.performers" => Some(handle_performers(state, req)),
        "analytics.dashboard" => Some(handle_dashboard(state, req)),
        _ => None,
    }
}
