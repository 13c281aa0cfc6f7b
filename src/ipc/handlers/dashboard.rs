use crate::attendance;
use crate::ipc::helpers::{
    load_classes, load_roster, storage_owner, with_conn, HandlerErr,
};
use crate::ipc::types::{AppState, Request};
use crate::store::StoreScope;
use rusqlite::Connection;
use serde_json::json;

/// The aggregate model behind the dashboard view: overall counts plus one
/// bar-chart row per class, in class-list order.
fn dashboard_open(conn: &Connection, scope: StoreScope) -> Result<serde_json::Value, HandlerErr> {
    let owner = storage_owner(conn, scope)?;
    let classes = load_classes(conn, &owner)?;

    let mut total_students = 0usize;
    let mut total_present = 0usize;
    let mut total_absent = 0usize;
    let mut rows: Vec<serde_json::Value> = Vec::with_capacity(classes.len());

    for class in &classes {
        let roster = load_roster(conn, &owner, class)?;
        let mut present = 0usize;
        let mut absent = 0usize;
        for student in &roster {
            let t = attendance::tally(&student.attendance);
            present += t.present;
            absent += t.absent;
        }

        total_students += roster.len();
        total_present += present;
        total_absent += absent;
        rows.push(json!({
            "classId": class.id,
            "name": class.name,
            "semester": class.semester,
            "studentCount": roster.len(),
            "present": present,
            "absent": absent
        }));
    }

    Ok(json!({
        "totalClasses": classes.len(),
        "totalStudents": total_students,
        "totalPresent": total_present,
        "totalAbsent": total_absent,
        "classes": rows
    }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let scope = state.scope;
    match req.method.as_str() {
        "dashboard.open" => Some(with_conn(state, req, move |c, _| dashboard_open(c, scope))),
        _ => None,
    }
}
