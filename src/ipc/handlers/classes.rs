use crate::ipc::helpers::{
    find_class, get_required_str, load_classes, save_classes, store_failed, storage_owner,
    validation, with_conn, HandlerErr,
};
use crate::ipc::types::{AppState, Request};
use crate::model::{fresh_id, Class, Student};
use crate::store::{self, StoreKey, StoreScope};
use rusqlite::Connection;
use serde_json::json;

fn classes_list(conn: &Connection, scope: StoreScope) -> Result<serde_json::Value, HandlerErr> {
    let owner = storage_owner(conn, scope)?;
    let classes = load_classes(conn, &owner)?;
    Ok(json!({ "classes": classes }))
}

fn classes_create(
    conn: &Connection,
    scope: StoreScope,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let owner = storage_owner(conn, scope)?;
    let name = get_required_str(params, "name")?.trim().to_string();
    if name.is_empty() {
        return Err(validation("Please enter a class name."));
    }
    let semester = get_required_str(params, "semester")?.trim().to_string();
    if semester.is_empty() {
        return Err(validation("Please select a semester."));
    }

    let mut classes = load_classes(conn, &owner)?;
    let duplicate = classes.iter().any(|c| {
        c.name.trim().eq_ignore_ascii_case(&name) && c.semester.trim().eq_ignore_ascii_case(&semester)
    });
    if duplicate {
        return Err(validation(
            "A class with the same name and semester already exists.",
        ));
    }

    let class = Class {
        id: fresh_id(classes.iter().map(|c| c.id)),
        name,
        semester,
    };
    classes.push(class.clone());

    // New class and its empty roster appear together.
    let tx = conn
        .unchecked_transaction()
        .map_err(|e| HandlerErr::new("db_tx_failed", e.to_string()))?;
    save_classes(&tx, &owner, &classes)?;
    store::write_collection::<Student>(&tx, &StoreKey::Roster(&owner, class.id), &[])
        .map_err(store_failed)?;
    tx.commit()
        .map_err(|e| HandlerErr::new("db_commit_failed", e.to_string()))?;

    Ok(json!({ "class": class }))
}

fn classes_get(
    conn: &Connection,
    scope: StoreScope,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let owner = storage_owner(conn, scope)?;
    let class_id = get_required_str(params, "classId")?;
    let class = find_class(conn, &owner, &class_id)?;
    Ok(json!({ "class": class }))
}

fn classes_delete(
    conn: &Connection,
    scope: StoreScope,
    params: &serde_json::Value,
) -> Result<serde_json::Value, HandlerErr> {
    let owner = storage_owner(conn, scope)?;
    let class_id = get_required_str(params, "classId")?;

    let mut classes = load_classes(conn, &owner)?;
    let Some(index) = classes.iter().position(|c| c.id.to_string() == class_id) else {
        return Err(HandlerErr::new("not_found", "class not found"));
    };
    let removed = classes.remove(index);

    // Roster never outlives its class: drop both in one transaction.
    let tx = conn
        .unchecked_transaction()
        .map_err(|e| HandlerErr::new("db_tx_failed", e.to_string()))?;
    save_classes(&tx, &owner, &classes)?;
    store::remove(&tx, &StoreKey::Roster(&owner, removed.id)).map_err(store_failed)?;
    tx.commit()
        .map_err(|e| HandlerErr::new("db_commit_failed", e.to_string()))?;

    Ok(json!({ "ok": true }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    let scope = state.scope;
    match req.method.as_str() {
        "classes.list" => Some(with_conn(state, req, move |c, _| classes_list(c, scope))),
        "classes.create" => Some(with_conn(state, req, move |c, p| classes_create(c, scope, p))),
        "classes.get" => Some(with_conn(state, req, move |c, p| classes_get(c, scope, p))),
        "classes.delete" => Some(with_conn(state, req, move |c, p| classes_delete(c, scope, p))),
        _ => None,
    }
}
