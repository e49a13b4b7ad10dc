//! Core data models used throughout coursebot.
//!
//! These types represent the course records, raw export rows and per-turn
//! queries that flow through the build and answer pipeline.

use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;

/// An academic term. Ordering is display order: Fall, Winter, Summer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Term {
    Fall,
    Winter,
    Summer,
}

impl Term {
    pub const ALL: [Term; 3] = [Term::Fall, Term::Winter, Term::Summer];

    /// Every term named in a free-text term cell, e.g. `"2242 Fall 2024"`.
    pub fn parse_all(text: &str) -> Vec<Term> {
        let lower = text.to_lowercase();
        Term::ALL
            .into_iter()
            .filter(|t| lower.contains(t.keyword()))
            .collect()
    }

    fn keyword(self) -> &'static str {
        match self {
            Term::Fall => "fall",
            Term::Winter => "winter",
            Term::Summer => "summer",
        }
    }
}

impl fmt::Display for Term {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Term::Fall => "Fall",
            Term::Winter => "Winter",
            Term::Summer => "Summer",
        };
        f.write_str(s)
    }
}

/// Canonical, deduplicated representation of one course.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CourseRecord {
    pub subject: String,
    pub catalogue: String,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub credits: Option<f64>,
    #[serde(default)]
    pub terms: BTreeSet<Term>,
    #[serde(default)]
    pub sessions: Vec<String>,
    #[serde(default)]
    pub prereq: String,
    #[serde(default)]
    pub equivalent: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub description: String,
}

impl CourseRecord {
    pub fn new(subject: impl Into<String>, catalogue: impl Into<String>) -> Self {
        Self {
            subject: subject.into(),
            catalogue: catalogue.into(),
            title: String::new(),
            credits: None,
            terms: BTreeSet::new(),
            sessions: Vec::new(),
            prereq: String::new(),
            equivalent: String::new(),
            location: String::new(),
            description: String::new(),
        }
    }

    /// The primary key, `"SUBJECT NNN"`.
    pub fn code(&self) -> String {
        format!("{} {}", self.subject, self.catalogue)
    }

    /// Terms joined for display, in Fall, Winter, Summer order.
    pub fn terms_display(&self) -> String {
        self.terms
            .iter()
            .map(|t| t.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    }
}

/// One row of a tabular course export. Every column is optional; header
/// aliases are resolved by `connector_csv` before a row is built.
#[derive(Debug, Clone, Default)]
pub struct RawCourseRow {
    pub subject: Option<String>,
    pub catalogue: Option<String>,
    pub title: Option<String>,
    pub credits: Option<String>,
    pub term: Option<String>,
    pub session: Option<String>,
    pub description: Option<String>,
    pub prereqdescription: Option<String>,
    pub equivalent_course_description: Option<String>,
    pub location_description: Option<String>,
}

/// High-level category of what a user turn is asking for.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Intent {
    ProfessorLookup,
    CommunitySentiment,
    CourseFact,
    Unknown,
}

/// Which course fact a [`Intent::CourseFact`] query wants.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum FactTopic {
    Credits,
    Prereq,
    Equivalent,
    Terms,
    Session,
    Location,
    Title,
    Summary,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum SentimentTopic {
    Instructor,
    Exam,
    Difficulty,
}

impl SentimentTopic {
    pub fn as_str(self) -> &'static str {
        match self {
            SentimentTopic::Instructor => "instructor",
            SentimentTopic::Exam => "exam",
            SentimentTopic::Difficulty => "difficulty",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "snake_case")]
pub enum Entity {
    CourseCode(String),
    PersonName(String),
}

impl Entity {
    pub fn as_str(&self) -> &str {
        match self {
            Entity::CourseCode(s) | Entity::PersonName(s) => s,
        }
    }
}

/// The classifier rule that produced a [`Query`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Rule {
    Community,
    ProfessorAddress,
    CourseFact,
    LooseName,
    Fallthrough,
}

/// One classified user turn.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Query {
    pub raw_text: String,
    pub intent: Intent,
    pub entity: Option<Entity>,
    pub fact_topic: FactTopic,
    pub sentiment_topic: Option<SentimentTopic>,
    pub rule: Rule,
}
