use crate::calc;
use crate::model::{fresh_id, Student};
use std::path::Path;

const NAME_ALIASES: [&str; 3] = ["Name", "name", "Student Name"];
const PERIOD_COLUMNS: [&str; 4] = ["Prelim", "Midterm", "Semifinals", "Finals"];

/// One accepted spreadsheet row: the student name plus whatever period
/// grades the file supplied.
#[derive(Debug, Clone)]
pub struct RosterRow {
    pub name: String,
    pub periods: [String; 4],
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct ImportSummary {
    pub imported: usize,
    pub skipped: usize,
}

fn find_column(headers: &csv::StringRecord, names: &[&str]) -> Option<usize> {
    headers
        .iter()
        .position(|h| names.iter().any(|n| h.trim() == *n))
}

/// Parse the tabular file into roster rows. Rows without a resolvable name
/// are dropped here; a file whose header lacks any name column yields no
/// rows at all, which the caller reports as an empty import.
pub fn read_roster_rows(path: &Path) -> anyhow::Result<Vec<RosterRow>> {
    let mut reader = csv::ReaderBuilder::new().flexible(true).from_path(path)?;
    let headers = reader.headers()?.clone();
    let Some(name_col) = find_column(&headers, &NAME_ALIASES) else {
        return Ok(Vec::new());
    };
    let period_cols: Vec<Option<usize>> = PERIOD_COLUMNS
        .iter()
        .map(|&c| find_column(&headers, &[c]))
        .collect();

    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let name = record.get(name_col).unwrap_or("").trim().to_string();
        if name.is_empty() {
            continue;
        }
        let mut periods: [String; 4] = Default::default();
        for (slot, col) in periods.iter_mut().zip(&period_cols) {
            let raw = col.and_then(|i| record.get(i)).unwrap_or("");
            // Seed only values that already pass the grade numeral check.
            if let Some(normalized) = calc::normalize_grade(raw) {
                *slot = normalized;
            }
        }
        rows.push(RosterRow { name, periods });
    }
    Ok(rows)
}

/// Append accepted rows to the roster in one batch. Names already on the
/// roster are skipped case-insensitively, as are duplicates within the file
/// itself. Derived grade fields are recomputed for every seeded student.
pub fn merge_into_roster(roster: &mut Vec<Student>, rows: Vec<RosterRow>) -> ImportSummary {
    let mut summary = ImportSummary::default();
    for row in rows {
        let duplicate = roster
            .iter()
            .any(|s| s.name.eq_ignore_ascii_case(&row.name));
        if duplicate {
            summary.skipped += 1;
            continue;
        }
        let id = fresh_id(roster.iter().map(|s| s.id));
        let mut student = Student::new(id, row.name);
        let [prelim, midterm, semifinals, finals] = row.periods;
        student.grades.prelim = prelim;
        student.grades.midterm = midterm;
        student.grades.semifinals = semifinals;
        student.grades.finals = finals;
        calc::recompute_grades(&mut student.grades);
        roster.push(student);
        summary.imported += 1;
    }
    summary
}
