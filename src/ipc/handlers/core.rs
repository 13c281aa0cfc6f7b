use crate::attendance::SameDayPolicy;
use crate::ipc::error::{err, ok};
use crate::ipc::types::{AppState, Request};
use crate::store::{self, StoreScope};
use serde_json::json;
use std::path::PathBuf;

fn handle_health(state: &mut AppState, req: &Request) -> serde_json::Value {
    ok(
        &req.id,
        json!({
            "version": env!("CARGO_PKG_VERSION"),
            "workspacePath": state.workspace.as_ref().map(|p| p.to_string_lossy().to_string())
        }),
    )
}

fn handle_workspace_select(state: &mut AppState, req: &Request) -> serde_json::Value {
    let p = req
        .params
        .get("path")
        .and_then(|v| v.as_str())
        .map(PathBuf::from);
    let Some(path) = p else {
        return err(&req.id, "bad_params", "missing params.path", None);
    };

    // Behavior knobs are workspace configuration, not code variants: key
    // namespacing scope and the same-day attendance policy.
    let scope = match req.params.get("scope").and_then(|v| v.as_str()) {
        None => StoreScope::PerUser,
        Some(raw) => match StoreScope::parse(raw) {
            Some(s) => s,
            None => {
                return err(
                    &req.id,
                    "bad_params",
                    "scope must be 'perUser' or 'global'",
                    None,
                )
            }
        },
    };
    let attendance_policy = match req.params.get("attendancePolicy").and_then(|v| v.as_str()) {
        None => SameDayPolicy::default(),
        Some(raw) => match SameDayPolicy::parse(raw) {
            Some(p) => p,
            None => {
                return err(
                    &req.id,
                    "bad_params",
                    "attendancePolicy must be 'replace' or 'reject'",
                    None,
                )
            }
        },
    };

    match store::open_db(&path) {
        Ok(conn) => {
            state.workspace = Some(path.clone());
            state.db = Some(conn);
            state.scope = scope;
            state.attendance_policy = attendance_policy;
            ok(
                &req.id,
                json!({
                    "workspacePath": path.to_string_lossy(),
                    "scope": scope.as_str(),
                    "attendancePolicy": attendance_policy.as_str()
                }),
            )
        }
        Err(e) => err(&req.id, "db_open_failed", format!("{e:?}"), None),
    }
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "health" => Some(handle_health(state, req)),
        "workspace.select" => Some(handle_workspace_select(state, req)),
        _ => None,
    }
}
