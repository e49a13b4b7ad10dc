//! Course references inside free-text prerequisite descriptions.

use regex::Regex;
use std::sync::LazyLock;

static COURSE_REF: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"([A-Z]{3,4})\s+([0-9]{3,4})[A-Z]?").expect("Invalid regex: COURSE_REF")
});

static PREREQ_LABEL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^\s*course\s+pre[-\s]?requisites?\s*:\s*")
        .expect("Invalid regex: PREREQ_LABEL")
});

/// Every course code mentioned in `text`, normalized to `"SUBJ NNN"`,
/// first occurrence first.
pub fn referenced_codes(text: &str) -> Vec<String> {
    let cleaned = text.to_uppercase().replace('.', "");
    let mut out: Vec<String> = Vec::new();
    for caps in COURSE_REF.captures_iter(&cleaned) {
        let code = format!("{} {}", &caps[1], &caps[2]);
        if !out.contains(&code) {
            out.push(code);
        }
    }
    out
}

/// Drops a leading "Course prerequisite(s):" label.
pub fn strip_label(text: &str) -> &str {
    match PREREQ_LABEL.find(text) {
        Some(m) => text[m.end()..].trim(),
        None => text.trim(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_referenced_codes_dedup_in_order() {
        let text = "Course Prerequisite: COMP 248; MATH 203 or MATH 204. Previously or concurrently: comp 248.";
        assert_eq!(
            referenced_codes(text),
            vec!["COMP 248", "MATH 203", "MATH 204"]
        );
    }

    #[test]
    fn test_referenced_codes_suffix_and_periods() {
        assert_eq!(referenced_codes("ENGR 213A and E.N.C.S. 282"), vec!["ENGR 213", "ENCS 282"]);
        assert!(referenced_codes("Permission of the department").is_empty());
    }

    #[test]
    fn test_strip_label() {
        assert_eq!(strip_label("Course Prerequisite: COMP 248."), "COMP 248.");
        assert_eq!(strip_label("Course pre-requisites:COMP 249"), "COMP 249");
        assert_eq!(strip_label("  COMP 352 "), "COMP 352");
    }
}
