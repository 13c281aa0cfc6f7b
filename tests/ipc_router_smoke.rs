use serde_json::json;
use std::io::{BufRead, BufReader, Write};
use std::path::PathBuf;
use std::process::{Child, ChildStdin, ChildStdout, Command, Stdio};
use std::time::{SystemTime, UNIX_EPOCH};

fn temp_dir(prefix: &str) -> PathBuf {
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

fn spawn_sidecar() -> (Child, ChildStdin, BufReader<ChildStdout>) {
    let exe = env!("CARGO_BIN_EXE_classkeeperd");
    let mut child = Command::new(exe)
        .stdin(Stdio::piped())
        .stdout(Stdio::piped())
        .stderr(Stdio::null())
        .spawn()
        .expect("spawn classkeeperd");
    let stdin = child.stdin.take().expect("child stdin");
    let stdout = child.stdout.take().expect("child stdout");
    (child, stdin, BufReader::new(stdout))
}

fn request(
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
    if value.get("ok").and_then(|v| v.as_bool()) == Some(false) {
        let code = value
            .get("error")
            .and_then(|e| e.get("code"))
            .and_then(|v| v.as_str())
            .unwrap_or("unknown");
        assert_ne!(
            code, "not_implemented",
            "unexpected unknown method for {}",
            method
        );
    }
    value
}

#[test]
fn router_dispatch_smoke_covers_handler_families() {
    let workspace = temp_dir("classkeeper-router-smoke");
    let roster_csv = workspace.join("smoke-roster.csv");
    std::fs::write(&roster_csv, "Name,Prelim\nImported Kid,1.25\n").expect("write roster csv");

    let (mut child, mut stdin, mut reader) = spawn_sidecar();

    let _ = request(&mut stdin, &mut reader, "1", "health", json!({}));
    let _ = request(
        &mut stdin,
        &mut reader,
        "2",
        "workspace.select",
        json!({ "path": workspace.to_string_lossy() }),
    );
    let _ = request(
        &mut stdin,
        &mut reader,
        "3",
        "session.signup",
        json!({
            "fullName": "Smoke Tester",
            "email": "smoke@example.com",
            "username": "smoke",
            "password": "pw"
        }),
    );
    let _ = request(
        &mut stdin,
        &mut reader,
        "4",
        "session.login",
        json!({ "username": "smoke", "password": "pw" }),
    );
    let _ = request(&mut stdin, &mut reader, "5", "session.current", json!({}));
    let _ = request(&mut stdin, &mut reader, "6", "profile.get", json!({}));
    let _ = request(
        &mut stdin,
        &mut reader,
        "7",
        "profile.photoSet",
        json!({ "dataUrl": "data:image/png;base64,QUJDRA==" }),
    );
    let _ = request(&mut stdin, &mut reader, "8", "profile.photoGet", json!({}));

    let created = request(
        &mut stdin,
        &mut reader,
        "9",
        "classes.create",
        json!({ "name": "Smoke Class", "semester": "Fall" }),
    );
    let class_id = created
        .pointer("/result/class/id")
        .and_then(|v| v.as_i64())
        .expect("class id")
        .to_string();

    let _ = request(&mut stdin, &mut reader, "10", "classes.list", json!({}));
    let _ = request(
        &mut stdin,
        &mut reader,
        "11",
        "classes.get",
        json!({ "classId": class_id }),
    );

    let created_student = request(
        &mut stdin,
        &mut reader,
        "12",
        "students.create",
        json!({ "classId": class_id, "name": "Smoke Student" }),
    );
    let student_id = created_student
        .pointer("/result/student/id")
        .and_then(|v| v.as_i64())
        .expect("student id")
        .to_string();

    let _ = request(
        &mut stdin,
        &mut reader,
        "13",
        "students.list",
        json!({ "classId": class_id }),
    );
    let _ = request(
        &mut stdin,
        &mut reader,
        "14",
        "students.update",
        json!({ "classId": class_id, "studentId": student_id, "name": "Renamed Student" }),
    );
    let _ = request(
        &mut stdin,
        &mut reader,
        "15",
        "scores.set",
        json!({ "classId": class_id, "studentId": student_id, "field": "quiz", "value": 80 }),
    );
    let _ = request(
        &mut stdin,
        &mut reader,
        "16",
        "grades.set",
        json!({ "classId": class_id, "studentId": student_id, "field": "prelim", "value": "1.50" }),
    );
    let _ = request(
        &mut stdin,
        &mut reader,
        "17",
        "attendance.markToday",
        json!({ "classId": class_id, "studentId": student_id, "status": "Present" }),
    );
    let _ = request(
        &mut stdin,
        &mut reader,
        "18",
        "attendance.open",
        json!({ "classId": class_id }),
    );
    let _ = request(
        &mut stdin,
        &mut reader,
        "19",
        "attendance.tally",
        json!({ "classId": class_id, "studentId": student_id }),
    );
    let _ = request(
        &mut stdin,
        &mut reader,
        "20",
        "students.import",
        json!({ "classId": class_id, "path": roster_csv.to_string_lossy() }),
    );
    let _ = request(&mut stdin, &mut reader, "21", "dashboard.open", json!({}));
    let _ = request(
        &mut stdin,
        &mut reader,
        "22",
        "students.delete",
        json!({ "classId": class_id, "studentId": student_id }),
    );
    let _ = request(
        &mut stdin,
        &mut reader,
        "23",
        "classes.delete",
        json!({ "classId": class_id }),
    );
    let _ = request(&mut stdin, &mut reader, "24", "session.logout", json!({}));

    drop(stdin);
    let _ = child.wait();
    let _ = std::fs::remove_dir_all(workspace);
}
