use rusqlite::{Connection, OptionalExtension};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fmt;
use std::path::Path;
use tracing::warn;

/// Which owner segment composite keys are namespaced by. The per-user scope
/// keys collections by the logged-in username; the global scope shares one
/// `guest` namespace across sessions.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StoreScope {
    PerUser,
    Global,
}

impl StoreScope {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "perUser" => Some(Self::PerUser),
            "global" => Some(Self::Global),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PerUser => "perUser",
            Self::Global => "global",
        }
    }
}

/// Composite key for one stored collection or record: entity kind, owning
/// user, optional parent id. The rendered strings are the storage schema; the
/// rest of the system never touches them directly.
#[derive(Debug, Clone)]
pub enum StoreKey<'a> {
    Session,
    Users,
    Profile(&'a str),
    Photo(&'a str),
    Classes(&'a str),
    Roster(&'a str, i64),
}

impl fmt::Display for StoreKey<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StoreKey::Session => write!(f, "loggedInUser"),
            StoreKey::Users => write!(f, "users"),
            StoreKey::Profile(user) => write!(f, "user_{}", user),
            StoreKey::Photo(user) => write!(f, "profilePhoto_{}", user),
            StoreKey::Classes(owner) => write!(f, "classesList_{}", owner),
            StoreKey::Roster(owner, class_id) => {
                write!(f, "studentsList_{}_{}", owner, class_id)
            }
        }
    }
}

pub fn open_db(workspace: &Path) -> anyhow::Result<Connection> {
    std::fs::create_dir_all(workspace)?;
    let db_path = workspace.join("classkeeper.sqlite3");
    let conn = Connection::open(db_path)?;
    conn.execute(
        "CREATE TABLE IF NOT EXISTS kv(
            key TEXT PRIMARY KEY,
            value TEXT NOT NULL
        )",
        [],
    )?;
    Ok(conn)
}

fn get_raw(conn: &Connection, key: &StoreKey<'_>) -> anyhow::Result<Option<String>> {
    let value = conn
        .query_row(
            "SELECT value FROM kv WHERE key = ?",
            [key.to_string()],
            |r| r.get(0),
        )
        .optional()?;
    Ok(value)
}

fn set_raw(conn: &Connection, key: &StoreKey<'_>, value: &str) -> anyhow::Result<()> {
    conn.execute(
        "INSERT INTO kv(key, value) VALUES(?, ?)
         ON CONFLICT(key) DO UPDATE SET value = excluded.value",
        (key.to_string(), value),
    )?;
    Ok(())
}

pub fn remove(conn: &Connection, key: &StoreKey<'_>) -> anyhow::Result<()> {
    conn.execute("DELETE FROM kv WHERE key = ?", [key.to_string()])?;
    Ok(())
}

/// Read a stored collection. A missing or undecodable value yields the empty
/// collection; the anomaly is logged, never surfaced. Storage-level failures
/// still propagate.
pub fn read_collection<T: DeserializeOwned>(
    conn: &Connection,
    key: &StoreKey<'_>,
) -> anyhow::Result<Vec<T>> {
    let Some(raw) = get_raw(conn, key)? else {
        return Ok(Vec::new());
    };
    match serde_json::from_str(&raw) {
        Ok(items) => Ok(items),
        Err(e) => {
            warn!(key = %key, error = %e, "corrupt stored collection, treating as empty");
            Ok(Vec::new())
        }
    }
}

/// Whole-value overwrite of a collection. Read-modify-write discipline is the
/// caller's job; the store has no merge semantics.
pub fn write_collection<T: Serialize>(
    conn: &Connection,
    key: &StoreKey<'_>,
    items: &[T],
) -> anyhow::Result<()> {
    set_raw(conn, key, &serde_json::to_string(items)?)
}

/// Read a single stored record (profile and the like), with the same
/// decode-tolerant behavior as collections.
pub fn read_record<T: DeserializeOwned>(
    conn: &Connection,
    key: &StoreKey<'_>,
) -> anyhow::Result<Option<T>> {
    let Some(raw) = get_raw(conn, key)? else {
        return Ok(None);
    };
    match serde_json::from_str(&raw) {
        Ok(record) => Ok(Some(record)),
        Err(e) => {
            warn!(key = %key, error = %e, "corrupt stored record, treating as absent");
            Ok(None)
        }
    }
}

pub fn write_record<T: Serialize>(
    conn: &Connection,
    key: &StoreKey<'_>,
    record: &T,
) -> anyhow::Result<()> {
    set_raw(conn, key, &serde_json::to_string(record)?)
}

/// Scalar string slot (session marker, photo data URL). Stored as a JSON
/// string so every kv value is a JSON document.
pub fn read_string(conn: &Connection, key: &StoreKey<'_>) -> anyhow::Result<Option<String>> {
    read_record(conn, key)
}

pub fn write_string(conn: &Connection, key: &StoreKey<'_>, value: &str) -> anyhow::Result<()> {
    write_record(conn, key, &value)
}

/// Resolve the owner segment for namespaced keys: the session user under the
/// per-user scope, the shared `guest` owner otherwise or when no session
/// exists.
pub fn owner_for(scope: StoreScope, session_user: Option<&str>) -> String {
    match scope {
        StoreScope::PerUser => session_user.unwrap_or("guest").to_string(),
        StoreScope::Global => "guest".to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::Class;
    use std::path::PathBuf;
    use std::time::{SystemTime, UNIX_EPOCH};

    fn temp_workspace(prefix: &str) -> PathBuf {
        std::env::temp_dir().join(format!(
            "{}-{}",
            prefix,
            SystemTime::now()
                .duration_since(UNIX_EPOCH)
                .expect("clock")
                .as_nanos()
        ))
    }

    #[test]
    fn collection_round_trips_including_empty() {
        let ws = temp_workspace("classkeeper-store-rt");
        let conn = open_db(&ws).expect("open");
        let key = StoreKey::Classes("alice");

        let empty: Vec<Class> = read_collection(&conn, &key).expect("read");
        assert!(empty.is_empty());

        let classes = vec![
            Class {
                id: 1,
                name: "Bio 101".to_string(),
                semester: "Fall".to_string(),
            },
            Class {
                id: 2,
                name: "Algebra".to_string(),
                semester: "2024-1".to_string(),
            },
        ];
        write_collection(&conn, &key, &classes).expect("write");
        let back: Vec<Class> = read_collection(&conn, &key).expect("read back");
        assert_eq!(back.len(), 2);
        assert_eq!(back[0].name, "Bio 101");
        assert_eq!(back[1].id, 2);

        write_collection::<Class>(&conn, &key, &[]).expect("write empty");
        let back: Vec<Class> = read_collection(&conn, &key).expect("read empty");
        assert!(back.is_empty());

        let _ = std::fs::remove_dir_all(ws);
    }

    #[test]
    fn corrupt_value_reads_as_empty() {
        let ws = temp_workspace("classkeeper-store-corrupt");
        let conn = open_db(&ws).expect("open");
        let key = StoreKey::Classes("alice");
        set_raw(&conn, &key, "{not json").expect("plant corrupt value");

        let back: Vec<Class> = read_collection(&conn, &key).expect("read");
        assert!(back.is_empty());

        let _ = std::fs::remove_dir_all(ws);
    }

    #[test]
    fn keys_are_namespaced_per_owner_and_parent() {
        assert_eq!(StoreKey::Users.to_string(), "users");
        assert_eq!(StoreKey::Session.to_string(), "loggedInUser");
        assert_eq!(StoreKey::Classes("alice").to_string(), "classesList_alice");
        assert_eq!(
            StoreKey::Roster("alice", 17).to_string(),
            "studentsList_alice_17"
        );
        assert_eq!(StoreKey::Profile("bob").to_string(), "user_bob");
        assert_eq!(StoreKey::Photo("bob").to_string(), "profilePhoto_bob");
    }

    #[test]
    fn owner_falls_back_to_guest() {
        assert_eq!(owner_for(StoreScope::PerUser, Some("alice")), "alice");
        assert_eq!(owner_for(StoreScope::PerUser, None), "guest");
        assert_eq!(owner_for(StoreScope::Global, Some("alice")), "guest");
    }
}
