use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::model::{Class, Student};
use crate::store::{self, StoreKey, StoreScope};
use rusqlite::Connection;

/// Handler-level failure carried up to the wire error shape.
pub struct HandlerErr {
    pub code: &'static str,
    pub message: String,
    pub details: Option<serde_json::Value>,
}

impl HandlerErr {
    pub fn new(code: &'static str, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            details: None,
        }
    }

    pub fn response(self, id: &str) -> serde_json::Value {
        err(id, self.code, self.message, self.details)
    }
}

pub fn bad_params(message: impl Into<String>) -> HandlerErr {
    HandlerErr::new("bad_params", message)
}

/// User-correctable input failure; state is left unchanged.
pub fn validation(message: impl Into<String>) -> HandlerErr {
    HandlerErr::new("validation", message)
}

pub fn store_failed(e: anyhow::Error) -> HandlerErr {
    HandlerErr::new("store_failed", e.to_string())
}

pub fn get_required_str(params: &serde_json::Value, key: &str) -> Result<String, HandlerErr> {
    params
        .get(key)
        .and_then(|v| v.as_str())
        .map(|s| s.to_string())
        .ok_or_else(|| bad_params(format!("missing {}", key)))
}

pub fn current_user(conn: &Connection) -> Result<Option<String>, HandlerErr> {
    store::read_string(conn, &StoreKey::Session).map_err(store_failed)
}

/// Session guard: every protected operation resolves the marker through here
/// and fails closed when no session exists.
pub fn require_user(conn: &Connection) -> Result<String, HandlerErr> {
    current_user(conn)?.ok_or_else(|| HandlerErr::new("not_logged_in", "no active session"))
}

/// The key namespace owner for the guarded operation: the session user under
/// per-user scope, the shared owner otherwise.
pub fn storage_owner(conn: &Connection, scope: StoreScope) -> Result<String, HandlerErr> {
    let user = require_user(conn)?;
    Ok(store::owner_for(scope, Some(&user)))
}

pub fn load_classes(conn: &Connection, owner: &str) -> Result<Vec<Class>, HandlerErr> {
    store::read_collection(conn, &StoreKey::Classes(owner)).map_err(store_failed)
}

pub fn save_classes(conn: &Connection, owner: &str, classes: &[Class]) -> Result<(), HandlerErr> {
    store::write_collection(conn, &StoreKey::Classes(owner), classes).map_err(store_failed)
}

/// Class ids travel as URL-query strings; the lookup is a linear
/// string-compared scan of the owner's list.
pub fn find_class(conn: &Connection, owner: &str, class_id: &str) -> Result<Class, HandlerErr> {
    load_classes(conn, owner)?
        .into_iter()
        .find(|c| c.id.to_string() == class_id)
        .ok_or_else(|| HandlerErr::new("not_found", "class not found"))
}

pub fn load_roster(conn: &Connection, owner: &str, class: &Class) -> Result<Vec<Student>, HandlerErr> {
    store::read_collection(conn, &StoreKey::Roster(owner, class.id)).map_err(store_failed)
}

pub fn save_roster(
    conn: &Connection,
    owner: &str,
    class: &Class,
    roster: &[Student],
) -> Result<(), HandlerErr> {
    store::write_collection(conn, &StoreKey::Roster(owner, class.id), roster).map_err(store_failed)
}

pub fn find_student_index(roster: &[Student], student_id: &str) -> Result<usize, HandlerErr> {
    roster
        .iter()
        .position(|s| s.id.to_string() == student_id)
        .ok_or_else(|| HandlerErr::new("not_found", "student not found"))
}

pub fn student_json(student: &Student) -> serde_json::Value {
    serde_json::to_value(student).unwrap_or(serde_json::Value::Null)
}

/// Run a handler body against the open workspace connection, mapping the
/// missing-workspace case and HandlerErr onto the wire shape.
pub fn with_conn(
    state: &mut AppState,
    req: &Request,
    f: impl FnOnce(&Connection, &serde_json::Value) -> Result<serde_json::Value, HandlerErr>,
) -> serde_json::Value {
    let Some(conn) = state.db.as_ref() else {
        return err(&req.id, "no_workspace", "select a workspace first", None);
    };
    match f(conn, &req.params) {
        Ok(result) => ok(&req.id, result),
        Err(error) => error.response(&req.id),
    }
}
