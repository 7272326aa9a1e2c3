use crate::analytics;
use crate::db;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use serde_json::json;
use std::path::PathBuf;

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "datasetPath": state.dataset.as_ref().map(|p| p.to_string_lossy().to_string())
        }),
    )
}

fn handle_dataset_open(state: &mut AppState, req: &Request) -> serde_json::Value {
    let p = req
        .params
        .get("path")
        .and_then(|v| v.as_str())
        .map(PathBuf::from);
    let Some(path) = p else {
        return err(&req.id, "bad_params", "missing params.path", None);
    };

    let resolved = match db::resolve_dataset_path(&path) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "dataset_not_found", e.to_string(), None),
    };
    let conn = match db::open_dataset(&resolved) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_open_failed", e.to_string(), None),
    };
    // Decode once up front so a malformed dump fails at open, with counts
    // as a bonus for the caller.
    let records = match db::load_student_records(&conn) {
        Ok(v) => v,
        Err(e) => return err(&req.id, "db_query_failed", e.to_string(), None),
    };
    let departments = analytics::department_counts(&records);

    state.dataset = Some(resolved.clone());
    state.db = Some(conn);
    ok(
        &req.id,
        json!({
            "datasetPath": resolved.to_string_lossy(),
            "studentCount": records.len(),
            "departmentCount": departments.len()
        }),
    )
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "dataset.open" => Some(handle_dataset_open(state, req)),
        _ => None,
    }
}
