use chrono::Utc;
use serde::{Deserialize, Serialize};

/// Registered account. Credentials are stored and compared as plain strings
/// for parity with the data this replaces; see DESIGN.md.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub username: String,
    pub password: String,
    pub full_name: String,
    pub email: String,
    pub joined: String,
}

/// Per-user profile record, kept separately from the global user list so the
/// profile view can render without scanning it.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub full_name: String,
    pub email: String,
    pub joined: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Class {
    pub id: i64,
    pub name: String,
    pub semester: String,
}

/// Raw score inputs are 0..=100 or empty; `average` is derived and stored in
/// its rendered two-decimal form.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scores {
    #[serde(default)]
    pub quiz: Option<f64>,
    #[serde(default)]
    pub project: Option<f64>,
    #[serde(default)]
    pub exam: Option<f64>,
    #[serde(default)]
    pub average: String,
}

/// Period fields hold either "" or a normalized two-decimal numeral on the
/// 1.00-5.00 scale (lower is better). `final` and `remarks` are derived.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Grades {
    #[serde(default)]
    pub prelim: String,
    #[serde(default)]
    pub midterm: String,
    #[serde(default)]
    pub semifinals: String,
    #[serde(default)]
    pub finals: String,
    #[serde(default, rename = "final")]
    pub final_grade: String,
    #[serde(default)]
    pub remarks: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum AttendanceStatus {
    Present,
    Absent,
}

impl AttendanceStatus {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "Present" => Some(Self::Present),
            "Absent" => Some(Self::Absent),
            _ => None,
        }
    }
}

/// One mark per calendar date; `date` is the local date in ISO form.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AttendanceEntry {
    pub date: String,
    pub status: AttendanceStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Student {
    pub id: i64,
    pub name: String,
    #[serde(default)]
    pub scores: Scores,
    #[serde(default)]
    pub grades: Grades,
    #[serde(default)]
    pub attendance: Vec<AttendanceEntry>,
}

impl Student {
    pub fn new(id: i64, name: impl Into<String>) -> Self {
        Self {
            id,
            name: name.into(),
            scores: Scores::default(),
            grades: Grades::default(),
            attendance: Vec::new(),
        }
    }
}

/// Creation-timestamp-derived id, bumped past any value already taken in the
/// owning collection.
pub fn fresh_id<I>(taken: I) -> i64
where
    I: IntoIterator<Item = i64>,
{
    let taken: Vec<i64> = taken.into_iter().collect();
    let mut id = Utc::now().timestamp_millis();
    while taken.contains(&id) {
        id += 1;
    }
    id
}
