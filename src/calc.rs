use crate::model::{Grades, Scores};

/// Two-decimal rendering used for every derived mark field. This is the
/// stored form, so the rounding happens exactly once, here.
pub fn format_mark(x: f64) -> String {
    format!("{:.2}", x)
}

pub fn score_in_range(v: f64) -> bool {
    v.is_finite() && (0.0..=100.0).contains(&v)
}

/// Mean of the three score inputs with missing fields treated as 0.
pub fn compute_average(quiz: Option<f64>, project: Option<f64>, exam: Option<f64>) -> String {
    let q = quiz.unwrap_or(0.0);
    let p = project.unwrap_or(0.0);
    let e = exam.unwrap_or(0.0);
    format_mark((q + p + e) / 3.0)
}

/// Period grade numeral: a 1-5 digit, a dot, two digits. Matches the check
/// the grade entry view applies before accepting input.
pub fn is_valid_grade(text: &str) -> bool {
    let b = text.as_bytes();
    b.len() == 4
        && (b'1'..=b'5').contains(&b[0])
        && b[1] == b'.'
        && b[2].is_ascii_digit()
        && b[3].is_ascii_digit()
}

/// Normalize accepted input to its stored two-decimal form; None for input
/// that fails the numeral pattern.
pub fn normalize_grade(text: &str) -> Option<String> {
    let t = text.trim();
    if !is_valid_grade(t) {
        return None;
    }
    t.parse::<f64>().ok().map(format_mark)
}

/// Final grade and remarks from the four period fields. Only fields that are
/// present and parse to a value above zero count toward the mean; with none
/// present both derived fields stay empty. Lower is better on this scale:
/// pass at 3.00 or below, judged on the rounded value.
pub fn compute_final(periods: [&str; 4]) -> (String, String) {
    let values: Vec<f64> = periods
        .iter()
        .filter_map(|p| p.trim().parse::<f64>().ok())
        .filter(|v| *v > 0.0)
        .collect();
    if values.is_empty() {
        return (String::new(), String::new());
    }
    let avg = values.iter().sum::<f64>() / values.len() as f64;
    let final_grade = format_mark(avg);
    let rounded = final_grade.parse::<f64>().unwrap_or(avg);
    let remarks = if rounded <= 3.00 { "Passed" } else { "Failed" };
    (final_grade, remarks.to_string())
}

/// Refresh the derived average after a raw score edit.
pub fn recompute_scores(scores: &mut Scores) {
    scores.average = compute_average(scores.quiz, scores.project, scores.exam);
}

/// Refresh the derived final/remarks after a period grade edit.
pub fn recompute_grades(grades: &mut Grades) {
    let (final_grade, remarks) = compute_final([
        &grades.prelim,
        &grades.midterm,
        &grades.semifinals,
        &grades.finals,
    ]);
    grades.final_grade = final_grade;
    grades.remarks = remarks;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn average_treats_missing_as_zero() {
        assert_eq!(compute_average(Some(80.0), Some(90.0), Some(100.0)), "90.00");
        assert_eq!(compute_average(Some(80.0), None, None), "26.67");
        assert_eq!(compute_average(None, None, None), "0.00");
        assert_eq!(compute_average(Some(100.0), Some(100.0), Some(100.0)), "100.00");
    }

    #[test]
    fn average_rounds_to_two_decimals() {
        // 50 + 50 + 51 = 151 / 3 = 50.3333...
        assert_eq!(compute_average(Some(50.0), Some(50.0), Some(51.0)), "50.33");
        // 1 / 3 = 0.3333...
        assert_eq!(compute_average(Some(1.0), None, None), "0.33");
        // 2 / 3 = 0.6666...
        assert_eq!(compute_average(Some(2.0), None, None), "0.67");
    }

    #[test]
    fn grade_pattern_accepts_only_two_decimal_numerals() {
        assert!(is_valid_grade("1.00"));
        assert!(is_valid_grade("3.00"));
        assert!(is_valid_grade("5.00"));
        assert!(is_valid_grade("2.75"));
        assert!(!is_valid_grade(""));
        assert!(!is_valid_grade("0.50"));
        assert!(!is_valid_grade("6.00"));
        assert!(!is_valid_grade("1.0"));
        assert!(!is_valid_grade("1.000"));
        assert!(!is_valid_grade("1,00"));
        assert!(!is_valid_grade("10.0"));
        assert!(!is_valid_grade("abcd"));
    }

    #[test]
    fn final_counts_only_present_fields() {
        let (final_grade, remarks) = compute_final(["1.50", "2.00", "", ""]);
        assert_eq!(final_grade, "1.75");
        assert_eq!(remarks, "Passed");

        let (final_grade, remarks) = compute_final(["5.00", "", "", ""]);
        assert_eq!(final_grade, "5.00");
        assert_eq!(remarks, "Failed");

        let (final_grade, remarks) = compute_final(["1.00", "2.00", "3.00", "4.00"]);
        assert_eq!(final_grade, "2.50");
        assert_eq!(remarks, "Passed");
    }

    #[test]
    fn final_is_empty_when_all_periods_absent() {
        let (final_grade, remarks) = compute_final(["", "", "", ""]);
        assert_eq!(final_grade, "");
        assert_eq!(remarks, "");
    }

    #[test]
    fn pass_boundary_sits_at_three() {
        let (final_grade, remarks) = compute_final(["3.00", "", "", ""]);
        assert_eq!(final_grade, "3.00");
        assert_eq!(remarks, "Passed");

        let (final_grade, remarks) = compute_final(["3.01", "", "", ""]);
        assert_eq!(final_grade, "3.01");
        assert_eq!(remarks, "Failed");

        // 2.99 and 3.02 average to 3.005, which lands on the rounding edge;
        // the remark must agree with the rendered final either way.
        let (final_grade, remarks) = compute_final(["2.99", "3.02", "", ""]);
        let rounded: f64 = final_grade.parse().expect("numeric final");
        assert_eq!(remarks == "Passed", rounded <= 3.00);
    }

    #[test]
    fn normalize_grade_renders_two_decimals() {
        assert_eq!(normalize_grade("1.50").as_deref(), Some("1.50"));
        assert_eq!(normalize_grade(" 2.25 ").as_deref(), Some("2.25"));
        assert_eq!(normalize_grade("1.5"), None);
        assert_eq!(normalize_grade("abc"), None);
        assert_eq!(normalize_grade(""), None);
    }

    #[test]
    fn recompute_scores_updates_average_in_place() {
        let mut s = Scores {
            quiz: Some(80.0),
            project: Some(90.0),
            exam: Some(100.0),
            average: String::new(),
        };
        recompute_scores(&mut s);
        assert_eq!(s.average, "90.00");

        s.exam = None;
        recompute_scores(&mut s);
        assert_eq!(s.average, "56.67");
    }

    #[test]
    fn recompute_grades_updates_derived_fields_in_place() {
        let mut g = Grades {
            prelim: "1.50".to_string(),
            midterm: "2.00".to_string(),
            ..Grades::default()
        };
        recompute_grades(&mut g);
        assert_eq!(g.final_grade, "1.75");
        assert_eq!(g.remarks, "Passed");

        g.prelim.clear();
        g.midterm.clear();
        recompute_grades(&mut g);
        assert_eq!(g.final_grade, "");
        assert_eq!(g.remarks, "");
    }
}
