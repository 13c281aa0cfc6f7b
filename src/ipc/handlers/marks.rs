use crate::calc;
use crate::ipc::helpers::{
    bad_params, find_class, find_student_index, get_required_str, load_roster, save_roster,
    storage_owner, student_json, validation, with_conn, HandlerErr,
};
use crate::ipc::types::{AppState, Request};
use crate::store::StoreScope;
use rusqlite::Connection;
use serde_json::json;

/// Raw score edit payload: empty clears the field, anything else must be a
/// number.
fn parse_score_value(value: Option<&serde_json::Value>) -> Result<Option<f64>, HandlerErr> {
    match value {
        None => Ok(None),
        Some(v) if v.is_null() => Ok(None),
        Some(v) if v.as_str() == Some("") => Ok(None),
        Some(v) => v
            .as_f64()
            .map(Some)
            .ok_or_else(|| bad_params("value must be a number or empty")),
    }
}

fn scores_set(
    conn: &Connection,
    scope: StoreScope,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let owner = storage_owner(conn, scope)?;
    let class_id = get_required_str(params, "classId")?;
    let class = find_class(conn, &owner, &class_id)?;
    let student_id = get_required_str(params, "studentId")?;
    let field = get_required_str(params, "field")?;

    let value = parse_score_value(params.get("value"))?;
    if let Some(v) = value {
        if !calc::score_in_range(v) {
            return Err(validation("Score must be between 0 and 100."));
        }
    }

    let mut roster = load_roster(conn, &owner, &class)?;
    let index = find_student_index(&roster, &student_id)?;
    let student = &mut roster[index];
    match field.as_str() {
        "quiz" => student.scores.quiz = value,
        "project" => student.scores.project = value,
        "exam" => student.scores.exam = value,
        _ => return Err(bad_params("field must be quiz, project, or exam")),
    }
    calc::recompute_scores(&mut student.scores);

    let updated = student_json(student);
    save_roster(conn, &owner, &class, &roster)?;
    Ok(json!({ "student": updated }))
}

fn grades_set(
    conn: &Connection,
    scope: StoreScope,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let owner = storage_owner(conn, scope)?;
    let class_id = get_required_str(params, "classId")?;
    let class = find_class(conn, &owner, &class_id)?;
    let student_id = get_required_str(params, "studentId")?;
    let field = get_required_str(params, "field")?;
    let raw = get_required_str(params, "value")?.trim().to_string();

    // Empty always clears the stored field; anything else must pass the
    // numeral check before it is persisted.
    let stored = if raw.is_empty() {
        String::new()
    } else {
        calc::normalize_grade(&raw).ok_or_else(|| validation("Invalid grade format."))?
    };

    let mut roster = load_roster(conn, &owner, &class)?;
    let index = find_student_index(&roster, &student_id)?;
    let student = &mut roster[index];
    match field.as_str() {
        "prelim" => student.grades.prelim = stored,
        "midterm" => student.grades.midterm = stored,
        "semifinals" => student.grades.semifinals = stored,
        "finals" => student.grades.finals = stored,
        _ => {
            return Err(bad_params(
                "field must be prelim, midterm, semifinals, or finals",
            ))
        }
    }
    calc::recompute_grades(&mut student.grades);

    let updated = student_json(student);
    save_roster(conn, &owner, &class, &roster)?;
    Ok(json!({ "student": updated }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let scope = state.scope;
    match req.method.as_str() {
        "scores.set" => Some(with_conn(state, req, move |c, p| scores_set(c, scope, p))),
        "grades.set" => Some(with_conn(state, req, move |c, p| grades_set(c, scope, p))),
        _ => None,
    }
}
