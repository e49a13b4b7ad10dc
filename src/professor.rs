//! Professor-ratings adapter.
//!
//! Talks to the ratings scraper over HTTP:
//!
//! ```text
//! GET {base_url}{path}?name=<search text>&all=0|1
//! → { "count": 3, "top": { ... } | null, "others": [ ... ] }
//! ```
//!
//! `all=0` scopes the search to the home institution. Entries are parsed
//! leniently: absent, null, negative or non-numeric values become `None`
//! rather than a guessed default.

use async_trait::async_trait;
use regex::Regex;
use serde::Serialize;
use serde_json::Value;
use std::sync::LazyLock;
use tracing::{debug, warn};

use crate::config::Config;
use crate::error::UpstreamError;
use crate::traits::{Lookup, ProfessorRatings};
use crate::upstream::{self, first_number, first_text};

/// Hard cap on runner-up matches carried in a report.
pub const MAX_ALTERNATES: usize = 4;

static QUALITY_PREAMBLE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)^QUALITY\s*[\d.]+\s*\d+\s*ratings\s*").expect("Invalid regex: QUALITY_PREAMBLE")
});

static INSTITUTION_TAIL: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b(University|College|Department|School)\b.*$")
        .expect("Invalid regex: INSTITUTION_TAIL")
});

static CAPITALIZED_NAME: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"[A-Z][A-Za-z.'\-]+(?:\s+[A-Z][A-Za-z.'\-]+){1,3}")
        .expect("Invalid regex: CAPITALIZED_NAME")
});

static DIFFICULTY_AFTER: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)level\s*of\s*difficulty\s*[:\s]*([\d.]{1,3})")
        .expect("Invalid regex: DIFFICULTY_AFTER")
});

static DIFFICULTY_BEFORE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)([\d.]{1,3})\s*level\s*of\s*difficulty")
        .expect("Invalid regex: DIFFICULTY_BEFORE")
});

/// One professor as reported by the ratings service.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfessorMatch {
    pub name: String,
    pub department: Option<String>,
    pub school: Option<String>,
    pub quality: Option<f64>,
    pub difficulty: Option<f64>,
    pub would_take_again_pct: Option<f64>,
    pub rating_count: Option<u32>,
    pub profile_url: Option<String>,
}

/// Best match plus up to [`MAX_ALTERNATES`] runner-ups.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ProfessorReport {
    pub best: ProfessorMatch,
    pub alternates: Vec<ProfessorMatch>,
}

pub struct ProfessorRatingAdapter {
    client: reqwest::Client,
    url: String,
    all_institutions: bool,
    max_alternates: usize,
}

impl ProfessorRatingAdapter {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        Ok(Self {
            client: upstream::build_client(&config.upstream)?,
            url: upstream::endpoint(&config.upstream.base_url, &config.professor.path),
            all_institutions: config.professor.all_institutions,
            max_alternates: config.professor.max_alternates.min(MAX_ALTERNATES),
        })
    }

    /// Same as [`ProfessorRatings::lookup`] but across every institution.
    pub async fn lookup_all_institutions(&self, name: &str) -> Lookup<ProfessorReport> {
        self.lookup_scoped(name, true).await
    }

    async fn lookup_scoped(&self, name: &str, all: bool) -> Lookup<ProfessorReport> {
        match self.fetch(name, all).await {
            Ok(found) => {
                debug!(name, all, found = found.is_some(), "professor lookup");
                found.into()
            }
            Err(e) => {
                warn!(name, error = %e, "professor lookup failed");
                Lookup::NoMatch
            }
        }
    }

    async fn fetch(&self, name: &str, all: bool) -> Result<Option<ProfessorReport>, UpstreamError> {
        let params = [
            ("name", name.to_string()),
            ("all", if all { "1" } else { "0" }.to_string()),
        ];
        let body = upstream::get_json(&self.client, &self.url, &params).await?;
        Ok(parse_response(&body, name, self.max_alternates))
    }
}

#[async_trait]
impl ProfessorRatings for ProfessorRatingAdapter {
    async fn lookup(&self, name: &str) -> Lookup<ProfessorReport> {
        self.lookup_scoped(name, self.all_institutions).await
    }
}

/// Interprets a ratings response. `None` when `count` is zero or absent, or
/// `top` is missing.
pub fn parse_response(body: &Value, searched: &str, max_alternates: usize) -> Option<ProfessorReport> {
    let count = upstream::number(body.get("count")).unwrap_or(0.0);
    if count <= 0.0 {
        return None;
    }
    let top = body.get("top").filter(|t| t.is_object())?;

    let alternates = body
        .get("others")
        .and_then(Value::as_array)
        .map(|others| {
            others
                .iter()
                .filter(|o| o.is_object())
                .take(max_alternates.min(MAX_ALTERNATES))
                .map(|o| parse_entry(o, None))
                .collect()
        })
        .unwrap_or_default();

    Some(ProfessorReport {
        best: parse_entry(top, Some(searched)),
        alternates,
    })
}

fn parse_entry(entry: &Value, searched: Option<&str>) -> ProfessorMatch {
    let department = first_text(entry, &["dept", "department"]);
    let school = first_text(entry, &["school", "institution"]);
    let block_text = first_text(entry, &["blockText", "block_text"]).unwrap_or_default();

    let raw_name = first_text(entry, &["name"]).unwrap_or_default();
    let mut name = clean_name(&raw_name, department.as_deref(), school.as_deref());
    if name.is_empty() {
        let from_block = CAPITALIZED_NAME
            .find(&normalize_spaces(&block_text))
            .map(|m| m.as_str().to_string())
            .unwrap_or_default();
        name = clean_name(&from_block, department.as_deref(), school.as_deref());
    }
    if name.is_empty() {
        name = searched.unwrap_or_default().trim().to_string();
    }

    ProfessorMatch {
        name,
        department,
        school,
        quality: first_number(entry, &["quality", "avgRating", "rating"]),
        difficulty: first_number(entry, &["difficulty", "avgDifficulty"])
            .or_else(|| difficulty_from_block(&block_text)),
        would_take_again_pct: first_number(
            entry,
            &["wouldTakeAgain", "wouldTakeAgainPercent", "would_take_again"],
        ),
        rating_count: first_number(entry, &["numRatings", "ratings", "ratingCount"])
            .map(|n| n as u32),
        profile_url: first_text(entry, &["url", "profileUrl", "profile_url"]),
    }
}

fn normalize_spaces(s: &str) -> String {
    s.chars()
        .filter(|c| !matches!(c, '\u{200B}'..='\u{200D}' | '\u{FEFF}'))
        .map(|c| if c == '\u{00A0}' { ' ' } else { c })
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

/// Strips the scraper's "QUALITY x.y N ratings" preamble and any trailing
/// department or school text from a name.
pub fn clean_name(raw: &str, department: Option<&str>, school: Option<&str>) -> String {
    let mut s = normalize_spaces(raw);
    s = QUALITY_PREAMBLE.replace(&s, "").into_owned();

    for tail in [department, school].into_iter().flatten() {
        let pattern = format!(r"(?i)\b{}\b.*$", regex::escape(tail.trim()));
        if let Ok(re) = Regex::new(&pattern) {
            s = re.replace(&s, "").into_owned();
        }
    }
    s = INSTITUTION_TAIL.replace(&s, "").into_owned();

    normalize_spaces(&s)
}

fn difficulty_from_block(block_text: &str) -> Option<f64> {
    DIFFICULTY_AFTER
        .captures(block_text)
        .or_else(|| DIFFICULTY_BEFORE.captures(block_text))
        .and_then(|caps| caps[1].parse::<f64>().ok())
}
