mod test_support;

use serde_json::json;
use test_support::{plain_student, request, request_ok, spawn_sidecar, temp_dir, write_dataset};

#[test]
fn router_dispatch_smoke_covers_handler_families() {
    let workspace = temp_dir("resultsd-router-smoke");
    let dataset = workspace.join("student_results_smoke.db");
    write_dataset(
        &dataset,
        &[
            plain_student("Asha Rao", "4GW21CI001", "AIML", 412.0),
            plain_student("Ravi Kumar", "4GW21AD002", "AIDS", 388.0),
        ],
    );

    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    // Analytics before a dataset is open must refuse, not crash.
    let early = request(&mut stdin, &mut reader, "0", "overview.open", json!({}));
    assert_eq!(
        early
            .get("error")
            .and_then(|e| e.get("code"))
            .and_then(|v| v.as_str()),
        Some("no_dataset")
    );

    let _ = request_ok(&mut stdin, &mut reader, "1", "health", json!({}));
    let opened = request_ok(
        &mut stdin,
        &mut reader,
        "2",
        "dataset.open",
        json!({ "path": dataset.to_string_lossy() }),
    );
    assert_eq!(opened.get("studentCount").and_then(|v| v.as_u64()), Some(2));

    let health = request_ok(&mut stdin, &mut reader, "3", "health", json!({}));
    assert!(health
        .get("datasetPath")
        .and_then(|v| v.as_str())
        .is_some());

    let _ = request_ok(&mut stdin, &mut reader, "4", "overview.open", json!({}));
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "5",
        "analytics.performance",
        json!({}),
    );
    let _ = request_ok(&mut stdin, &mut reader, "6", "analytics.passFail", json!({}));
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "7",
        "analytics.subjectAverages",
        json!({}),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "8",
        "analytics.performers",
        json!({ "count": 1 }),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "9",
        "analytics.dashboard",
        json!({}),
    );
    let _ = request_ok(
        &mut stdin,
        &mut reader,
        "10",
        "department.open",
        json!({ "department": "AIML" }),
    );

    let unknown = request(&mut stdin, &mut reader, "11", "nope.method", json!({}));
    assert_eq!(
        unknown
            .get("error")
            .and_then(|e| e.get("code"))
            .and_then(|v| v.as_str()),
        Some("not_implemented")
    );

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}
