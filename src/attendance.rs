use crate::model::{AttendanceEntry, AttendanceStatus};
use chrono::Local;
use serde::Serialize;

/// What a second mark on an already-marked date does. Historical data shows
/// both behaviors; the workspace picks one explicitly and defaults to
/// replace.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SameDayPolicy {
    Replace,
    Reject,
}

impl SameDayPolicy {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "replace" => Some(Self::Replace),
            "reject" => Some(Self::Reject),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Replace => "replace",
            Self::Reject => "reject",
        }
    }
}

impl Default for SameDayPolicy {
    fn default() -> Self {
        Self::Replace
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MarkOutcome {
    Added,
    Replaced,
    Rejected,
}

impl MarkOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Added => "added",
            Self::Replaced => "replaced",
            Self::Rejected => "rejected",
        }
    }
}

/// The local calendar date, in the ISO form attendance entries are keyed by.
pub fn today() -> String {
    Local::now().date_naive().to_string()
}

/// Apply one mark for `date`. At most one entry per date ever exists: under
/// the replace policy a second mark overwrites the existing entry in place,
/// under the reject policy it leaves the sequence untouched.
pub fn mark_date(
    attendance: &mut Vec<AttendanceEntry>,
    date: &str,
    status: AttendanceStatus,
    policy: SameDayPolicy,
) -> MarkOutcome {
    if let Some(existing) = attendance.iter_mut().find(|e| e.date == date) {
        return match policy {
            SameDayPolicy::Replace => {
                existing.status = status;
                MarkOutcome::Replaced
            }
            SameDayPolicy::Reject => MarkOutcome::Rejected,
        };
    }
    attendance.push(AttendanceEntry {
        date: date.to_string(),
        status,
    });
    MarkOutcome::Added
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Tally {
    pub present: usize,
    pub absent: usize,
}

/// present = count of Present marks, absent = everything else.
pub fn tally(attendance: &[AttendanceEntry]) -> Tally {
    let present = attendance
        .iter()
        .filter(|e| e.status == AttendanceStatus::Present)
        .count();
    Tally {
        present,
        absent: attendance.len() - present,
    }
}
