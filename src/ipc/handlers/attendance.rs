use crate::attendance::{self, MarkOutcome, SameDayPolicy};
use crate::ipc::helpers::{
    bad_params, find_class, find_student_index, get_required_str, load_roster, save_roster,
    storage_owner, with_conn, HandlerErr,
};
use crate::ipc::types::{AppState, Request};
use crate::model::AttendanceStatus;
use crate::store::StoreScope;
use rusqlite::Connection;
use serde_json::json;

fn attendance_open(
    conn: &Connection,
    scope: StoreScope,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let owner = storage_owner(conn, scope)?;
    let class_id = get_required_str(params, "classId")?;
    let class = find_class(conn, &owner, &class_id)?;
    let roster = load_roster(conn, &owner, &class)?;

    let rows: Vec<serde_json::Value> = roster
        .iter()
        .map(|s| {
            let t = attendance::tally(&s.attendance);
            json!({
                "studentId": s.id,
                "name": s.name,
                "present": t.present,
                "absent": t.absent
            })
        })
        .collect();
    Ok(json!({ "date": attendance::today(), "rows": rows }))
}

fn attendance_mark_today(
    conn: &Connection,
    scope: StoreScope,
    policy: SameDayPolicy,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let owner = storage_owner(conn, scope)?;
    let class_id = get_required_str(params, "classId")?;
    let class = find_class(conn, &owner, &class_id)?;
    let student_id = get_required_str(params, "studentId")?;
    let status_raw = get_required_str(params, "status")?;
    let status = AttendanceStatus::parse(&status_raw)
        .ok_or_else(|| bad_params("status must be Present or Absent"))?;

    let mut roster = load_roster(conn, &owner, &class)?;
    let index = find_student_index(&roster, &student_id)?;
    let today = attendance::today();

    let outcome = attendance::mark_date(&mut roster[index].attendance, &today, status, policy);
    if outcome == MarkOutcome::Rejected {
        return Err(HandlerErr::new(
            "already_marked",
            format!("{} is already marked for today.", roster[index].name),
        ));
    }

    let t = attendance::tally(&roster[index].attendance);
    save_roster(conn, &owner, &class, &roster)?;
    Ok(json!({
        "date": today,
        "outcome": outcome.as_str(),
        "present": t.present,
        "absent": t.absent
    }))
}

fn attendance_tally(
    conn: &Connection,
    scope: StoreScope,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let owner = storage_owner(conn, scope)?;
    let class_id = get_required_str(params, "classId")?;
    let class = find_class(conn, &owner, &class_id)?;
    let student_id = get_required_str(params, "studentId")?;

    let roster = load_roster(conn, &owner, &class)?;
    let index = find_student_index(&roster, &student_id)?;
    let t = attendance::tally(&roster[index].attendance);
    Ok(json!({ "present": t.present, "absent": t.absent }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let scope = state.scope;
    let policy = state.attendance_policy;
    match req.method.as_str() {
        "attendance.open" => Some(with_conn(state, req, move |c, p| {
            attendance_open(c, scope, p)
        })),
        "attendance.markToday" => Some(with_conn(state, req, move |c, p| {
            attendance_mark_today(c, scope, policy, p)
        })),
        "attendance.tally" => Some(with_conn(state, req, move |c, p| {
            attendance_tally(c, scope, p)
        })),
        _ => None,
    }
}
