use crate::ipc::helpers::{
    get_required_str, require_user, store_failed, validation, with_conn, HandlerErr,
};
use crate::ipc::types::{AppState, Request};
use crate::model::{Profile, User};
use crate::store::{self, StoreKey};
use base64::engine::general_purpose::STANDARD;
use base64::Engine as _;
use rusqlite::Connection;
use serde_json::json;

fn profile_get(conn: &Connection) -> Result<serde_json::Value, HandlerErr> {
    let username = require_user(conn)?;

    let record: Option<Profile> =
        store::read_record(conn, &StoreKey::Profile(&username)).map_err(store_failed)?;
    let profile = match record {
        Some(p) => p,
        None => {
            // Older data may only have the user list entry; the built-in
            // admin has neither and renders from defaults.
            let users: Vec<User> =
                store::read_collection(conn, &StoreKey::Users).map_err(store_failed)?;
            match users.into_iter().find(|u| u.username == username) {
                Some(u) => Profile {
                    full_name: u.full_name,
                    email: u.email,
                    joined: u.joined,
                },
                None => Profile {
                    full_name: username.clone(),
                    email: "No email provided".to_string(),
                    joined: "Unknown".to_string(),
                },
            }
        }
    };

    Ok(json!({
        "username": username,
        "fullName": profile.full_name,
        "email": profile.email,
        "joined": profile.joined
    }))
}

/// Whole-payload data-URL check; the view already did the file read, the
/// daemon only stores the completed result.
fn valid_photo_data_url(data_url: &str) -> bool {
    if !data_url.starts_with("data:image/") {
        return false;
    }
    let Some((_, payload)) = data_url.split_once(";base64,") else {
        return false;
    };
    STANDARD.decode(payload).is_ok()
}

fn profile_photo_set(conn: &Connection, params: &serde_json::Value) -> Result<serde_json::Value, HandlerErr> {
    let username = require_user(conn)?;
    let data_url = get_required_str(params, "dataUrl")?;
    if !valid_photo_data_url(&data_url) {
        return Err(validation("Not a valid image data URL."));
    }
    store::write_string(conn, &StoreKey::Photo(&username), &data_url).map_err(store_failed)?;
    Ok(json!({ "ok": true }))
}

fn profile_photo_get(conn: &Connection) -> Result<serde_json::Value, HandlerErr> {
    let username = require_user(conn)?;
    let photo = store::read_string(conn, &StoreKey::Photo(&username)).map_err(store_failed)?;
    Ok(json!({ "dataUrl": photo }))
}

pub fn try_handle(state: &mut AppState, req: &Request) -> Option<serde_json::Value> {
    match req.method.as_str() {
        "profile.get" => Some(with_conn(state, req, |c, _| profile_get(c))),
        "profile.photoSet" => Some(with_conn(state, req, |c, p| profile_photo_set(c, p))),
        "profile.photoGet" => Some(with_conn(state, req, |c, _| profile_photo_get(c))),
        _ => None,
    }
}
