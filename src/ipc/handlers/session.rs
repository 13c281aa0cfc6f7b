use crate::ipc::helpers::{
    current_user, get_required_str, store_failed, validation, with_conn, HandlerErr,
};
use crate::ipc::types::{AppState, Request};
use crate::model::{Profile, User};
use crate::store::{self, StoreKey};
use chrono::Local;
use rusqlite::Connection;
use serde_json::json;

// The reserved account that bypasses the user registry.
const BUILTIN_ADMIN: (&str, &str) = ("admin", "admin");

fn load_users(conn: &Connection) -> Result<Vec<User>, HandlerErr> {
    store::read_collection(conn, &StoreKey::Users).map_err(store_failed)
}

fn session_login(conn: &Connection, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let username = get_required_str(params, "username")?.trim().to_string();
    let password = get_required_str(params, "password")?.trim().to_string();

    if username.is_empty() || password.is_empty() {
        return Err(validation("Please enter both username and password."));
    }

    let matched = (username == BUILTIN_ADMIN.0 && password == BUILTIN_ADMIN.1)
        || load_users(conn)?
            .iter()
            .any(|u| u.username == username && u.password == password);
    if !matched {
        return Err(validation("Invalid username or password."));
    }

    store::write_string(conn, &StoreKey::Session, &username).map_err(store_failed)?;
    Ok(json!({ "username": username }))
}

fn session_logout(conn: &Connection) -> Result<serde_json::Value, HandlerErr> {
    store::remove(conn, &StoreKey::Session).map_err(store_failed)?;
    Ok(json!({ "ok": true }))
}

fn session_current(conn: &Connection) -> Result<serde_json::Value, HandlerErr> {
    Ok(json!({ "username": current_user(conn)? }))
}

fn session_signup(conn: &Connection, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let full_name = get_required_str(params, "fullName")?.trim().to_string();
    let email = get_required_str(params, "email")?.trim().to_string();
    let username = get_required_str(params, "username")?.trim().to_string();
    let password = get_required_str(params, "password")?;

    if full_name.is_empty() || email.is_empty() || username.is_empty() || password.is_empty() {
        return Err(validation("All fields are required."));
    }

    let mut users = load_users(conn)?;
    if users.iter().any(|u| u.username == username) {
        return Err(validation("Username already exists."));
    }

    let joined = Local::now().format("%B %-d, %Y").to_string();
    users.push(User {
        username: username.clone(),
        password,
        full_name: full_name.clone(),
        email: email.clone(),
        joined: joined.clone(),
    });

    // User list and profile record land together or not at all.
    let tx = conn
        .unchecked_transaction()
        .map_err(|e| HandlerErr::new("db_tx_failed", e.to_string()))?;
    store::write_collection(&tx, &StoreKey::Users, &users).map_err(store_failed)?;
    store::write_record(
        &tx,
        &StoreKey::Profile(&username),
        &Profile {
            full_name,
            email,
            joined: joined.clone(),
        },
    )
    .map_err(store_failed)?;
    tx.commit()
        .map_err(|e| HandlerErr::new("db_commit_failed", e.to_string()))?;

    Ok(json!({ "username": username, "joined": joined }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "session.login" => Some(with_conn(state, req, |c, p| session_login(c, p))),
        "session.logout" => Some(with_conn(state, req, |c, _| session_logout(c))),
        "session.current" => Some(with_conn(state, req, |c, _| session_current(c))),
        "session.signup" => Some(with_conn(state, req, |c, p| session_signup(c, p))),
        _ => None,
    }
}
