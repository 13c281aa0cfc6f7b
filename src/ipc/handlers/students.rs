use crate::import;
use crate::ipc::helpers::{
    find_class, find_student_index, get_required_str, load_roster, save_roster, storage_owner,
    student_json, validation, with_conn, HandlerErr,
};
use crate::ipc::types::{AppState, Request};
use crate::model::{fresh_id, Student};
use crate::store::StoreScope;
use rusqlite::Connection;
use serde_json::json;
use std::path::PathBuf;

fn students_list(
    conn: &Connection,
    scope: StoreScope,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let owner = storage_owner(conn, scope)?;
    let class_id = get_required_str(params, "classId")?;
    let class = find_class(conn, &owner, &class_id)?;
    let roster = load_roster(conn, &owner, &class)?;
    Ok(json!({ "students": roster }))
}

fn students_create(
    conn: &Connection,
    scope: StoreScope,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let owner = storage_owner(conn, scope)?;
    let class_id = get_required_str(params, "classId")?;
    let class = find_class(conn, &owner, &class_id)?;
    let name = get_required_str(params, "name")?.trim().to_string();
    if name.is_empty() {
        return Err(validation("Please enter student name."));
    }

    let mut roster = load_roster(conn, &owner, &class)?;
    if roster.iter().any(|s| s.name.eq_ignore_ascii_case(&name)) {
        return Err(validation("Student already exists."));
    }

    let student = Student::new(fresh_id(roster.iter().map(|s| s.id)), name);
    roster.push(student.clone());
    save_roster(conn, &owner, &class, &roster)?;
    Ok(json!({ "student": student_json(&student) }))
}

fn students_update(
    conn: &Connection,
    scope: StoreScope,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let owner = storage_owner(conn, scope)?;
    let class_id = get_required_str(params, "classId")?;
    let class = find_class(conn, &owner, &class_id)?;
    let student_id = get_required_str(params, "studentId")?;
    let name = get_required_str(params, "name")?.trim().to_string();
    if name.is_empty() {
        return Err(validation("Please enter student name."));
    }

    let mut roster = load_roster(conn, &owner, &class)?;
    let index = find_student_index(&roster, &student_id)?;
    let duplicate = roster
        .iter()
        .enumerate()
        .any(|(i, s)| i != index && s.name.eq_ignore_ascii_case(&name));
    if duplicate {
        return Err(validation("Student already exists."));
    }

    roster[index].name = name;
    save_roster(conn, &owner, &class, &roster)?;
    Ok(json!({ "student": student_json(&roster[index]) }))
}

fn students_delete(
    conn: &Connection,
    scope: StoreScope,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let owner = storage_owner(conn, scope)?;
    let class_id = get_required_str(params, "classId")?;
    let class = find_class(conn, &owner, &class_id)?;
    let student_id = get_required_str(params, "studentId")?;

    let mut roster = load_roster(conn, &owner, &class)?;
    let index = find_student_index(&roster, &student_id)?;
    roster.remove(index);
    save_roster(conn, &owner, &class, &roster)?;
    Ok(json!({ "ok": true }))
}

fn students_import(
    conn: &Connection,
    scope: StoreScope,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let owner = storage_owner(conn, scope)?;
    let class_id = get_required_str(params, "classId")?;
    let class = find_class(conn, &owner, &class_id)?;
    let path = PathBuf::from(get_required_str(params, "path")?);

    // The whole file is read and vetted before the roster is touched.
    let rows = import::read_roster_rows(&path)
        .map_err(|e| HandlerErr::new("import_failed", e.to_string()))?;
    if rows.is_empty() {
        return Err(HandlerErr::new(
            "import_empty",
            "file is empty or incorrectly formatted",
        ));
    }

    let mut roster = load_roster(conn, &owner, &class)?;
    let summary = import::merge_into_roster(&mut roster, rows);
    save_roster(conn, &owner, &class, &roster)?;
    Ok(json!({
        "imported": summary.imported,
        "skipped": summary.skipped,
        "total": roster.len()
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let scope = state.scope;
    match req.method.as_str() {
        "students.list" => Some(with_conn(state, req, move |c, p| students_list(c, scope, p))),
        "students.create" => Some(with_conn(state, req, move |c, p| {
            students_create(c, scope, p)
        })),
        "students.update" => Some(with_conn(state, req, move |c, p| {
            students_update(c, scope, p)
        })),
        "students.delete" => Some(with_conn(state, req, move |c, p| {
            students_delete(c, scope, p)
        })),
        "students.import" => Some(with_conn(state, req, move |c, p| {
            students_import(c, scope, p)
        })),
        _ => None,
    }
}
