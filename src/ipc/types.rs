use std::path::PathBuf;

use crate::attendance::SameDayPolicy;
use crate::store::StoreScope;
use rusqlite::Connection;
use serde::Deserialize;

#[derive(Debug, Deserialize, Clone)]
pub struct Request {
    pub id: String,
    pub method: String,
    #[serde(default)]
    pub params: serde_json::Value,
}

pub struct AppState {
    pub workspace: Option<PathBuf>,
    pub db: Option<Connection>,
    pub scope: StoreScope,
    pub attendance_policy: SameDayPolicy,
}

impl AppState {
    pub fn new() -> Self {
        Self {
            workspace: None,
            db: None,
            scope: StoreScope::PerUser,
            attendance_policy: SameDayPolicy::default(),
        }
    }
}
