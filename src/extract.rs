//! Entity extraction from free text.
//!
//! Every function here is pure and total: any input yields an answer, never
//! an error. Precedence between overlapping signals is left to
//! [`crate::classify`].

use regex::Regex;
use serde::Serialize;
use std::collections::BTreeSet;
use std::sync::LazyLock;

/// A family of intent-indicating keywords.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum KeywordFamily {
    Credits,
    Prerequisite,
    Equivalence,
    Terms,
    Session,
    Location,
    Title,
    Difficulty,
    Exam,
    InstructorQuality,
}

impl KeywordFamily {
    /// Families that signal a request for peer opinion.
    pub const SENTIMENT: [KeywordFamily; 3] = [
        KeywordFamily::Difficulty,
        KeywordFamily::Exam,
        KeywordFamily::InstructorQuality,
    ];
}

static COURSE_CODE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b([A-Z]{3,4})\s*-?\s*(\d{3,4})\b").expect("Invalid regex: COURSE_CODE")
});

static GREETING: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^(hi|hello|hey|help|start|menu)\b").expect("Invalid regex: GREETING")
});

static NAME_SHAPE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^[A-Za-z][A-Za-z.'\-]+(?:\s+[A-Za-z][A-Za-z.'\-]+){1,3}$")
        .expect("Invalid regex: NAME_SHAPE")
});

static PROFESSOR_ADDRESS: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(
        r"(?i:\b(?:rate(?:\s+my)?|prof\.?|professor|teacher|instructor|dr\.?))\s+([A-Z](?:[a-z]+|['\-][A-Z]?[a-z]+)+(?:\s+[A-Z](?:[a-z]+|['\-][A-Z]?[a-z]+)+){0,3})",
    )
    .expect("Invalid regex: PROFESSOR_ADDRESS")
});

static INSTRUCTOR_FOR: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(?:prof|professor|teacher|instructor)s?\s+for\b")
        .expect("Invalid regex: INSTRUCTOR_FOR")
});

static FAMILIES: LazyLock<Vec<(KeywordFamily, Regex)>> = LazyLock::new(|| {
    let table: [(KeywordFamily, &str); 10] = [
        (KeywordFamily::Credits, r"\bcredit(s)?\b|\bcr\b"),
        (
            KeywordFamily::Prerequisite,
            r"\bpre[-\s]?req(s|uisite|uisites)?\b|\brequirement(s)?\b",
        ),
        (KeywordFamily::Equivalence, r"\bequiv(alent|alents|alency)?\b"),
        (
            KeywordFamily::Terms,
            r"\b(term|terms|semester|semesters|offered|when)\b",
        ),
        (
            KeywordFamily::Session,
            r"\b(session|sessions|week|weeks|duration|13w|6h1)\b",
        ),
        (KeywordFamily::Location, r"\b(location|campus|where)\b"),
        (KeywordFamily::Title, r"\btitle\b"),
        (
            KeywordFamily::Difficulty,
            r"\b(hard|harder|easy|easier|difficult|difficulty|workload|heavy|light|opinions?|thoughts|reviews?|advice|tips?|worth|skip|vs|compare|better|resources)\b",
        ),
        (
            KeywordFamily::Exam,
            r"\b(exams?|midterms?|finals?|quiz|quizzes|labs?)\b",
        ),
        (
            KeywordFamily::InstructorQuality,
            r"\b(best|worst|good|bad|avoid|recommended?)\s+(profs?|professors?|teachers?|instructors?)\b|\bwho\s+(to|should\s+i)\s+take\b",
        ),
    ];
    table
        .into_iter()
        .map(|(family, pattern)| {
            let re = Regex::new(pattern).expect("Invalid regex: keyword family");
            (family, re)
        })
        .collect()
});

/// Words that may precede a name but are not part of it.
const HONORIFICS: &[&str] = &[
    "rate",
    "my",
    "prof",
    "professor",
    "teacher",
    "instructor",
    "dr",
];

/// A captured name starting with one of these is not a name.
const NAME_STOP_WORDS: &[&str] = &[
    "for", "is", "the", "of", "in", "to", "a", "an", "and", "who", "what",
];

/// First course code in `text`, normalized to `"SUBJ NNN"`.
pub fn course_code(text: &str) -> Option<String> {
    COURSE_CODE
        .captures(text)
        .map(|caps| format!("{} {}", caps[1].to_uppercase(), &caps[2]))
}

/// Permissive person-name shape: 2-4 word tokens, no digits, no greeting.
pub fn looks_like_person_name(text: &str) -> bool {
    let t = text.trim();
    if t.is_empty() || t.chars().any(|c| c.is_ascii_digit()) {
        return false;
    }
    if GREETING.is_match(t) {
        return false;
    }
    NAME_SHAPE.is_match(t)
}

/// Every keyword family matched by the lowercased text.
pub fn keyword_families(text: &str) -> BTreeSet<KeywordFamily> {
    let lower = text.to_lowercase();
    FAMILIES
        .iter()
        .filter(|(_, re)| re.is_match(&lower))
        .map(|(family, _)| *family)
        .collect()
}

/// A name introduced by "prof", "professor", "rate my", "dr" and similar.
pub fn professor_address(text: &str) -> Option<String> {
    PROFESSOR_ADDRESS.captures_iter(text).find_map(|caps| {
        let words: Vec<&str> = caps[1]
            .split_whitespace()
            .skip_while(|w| HONORIFICS.contains(&w.to_lowercase().as_str()))
            .collect();
        let first = words.first()?.to_lowercase();
        if NAME_STOP_WORDS.contains(&first.as_str()) {
            return None;
        }
        Some(words.join(" "))
    })
}

/// "professor for X" / "teacher for X" phrasing.
pub fn asks_instructor_for_course(text: &str) -> bool {
    INSTRUCTOR_FOR.is_match(text)
}
