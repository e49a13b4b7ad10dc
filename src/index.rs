//! The in-memory course index.
//!
//! Built once from raw export rows, then frozen. Exactly one [`CourseRecord`]
//! exists per `"SUBJECT NNN"` key; the list view keeps first-insertion order,
//! which is also the tie-break order for fuzzy title matching.
//!
//! The index persists as a JSON document:
//!
//! ```json
//! { "built_at": "...", "list": [ ... ], "map": { "COMP 248": { ... } } }
//! ```
//!
//! Loading only reads `list`; the key map and title token sets are rebuilt.

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::{BTreeMap, HashMap, HashSet};
use std::path::Path;
use std::sync::LazyLock;
use tracing::{info, warn};

use crate::config::Config;
use crate::connector_csv::{self, CsvScan};
use crate::models::{CourseRecord, RawCourseRow, Term};
use crate::prereq;

static CATALOGUE_DIGITS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[0-9]{3}").expect("Invalid regex: CATALOGUE_DIGITS"));

/// Minimum token-overlap score for a fuzzy title match.
pub const TITLE_MATCH_THRESHOLD: f64 = 0.4;

/// Intent-indicating words that never count toward a title match.
const TITLE_STOP_WORDS: &[&str] = &[
    "credit",
    "credits",
    "cr",
    "prereq",
    "prereqs",
    "prerequisite",
    "prerequisites",
    "requirement",
    "requirements",
    "equivalent",
    "equivalents",
    "term",
    "terms",
    "semester",
    "semesters",
    "offered",
    "when",
    "session",
    "sessions",
    "week",
    "duration",
    "title",
    "what",
    "is",
    "are",
    "for",
    "of",
    "the",
    "in",
];

/// Row-level outcome of a build.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct BuildStats {
    pub rows: usize,
    pub courses: usize,
    pub dropped: usize,
}

#[derive(Serialize)]
struct IndexDocumentRef<'a> {
    built_at: Option<DateTime<Utc>>,
    list: &'a [CourseRecord],
    map: BTreeMap<String, &'a CourseRecord>,
}

#[derive(Deserialize)]
struct IndexDocument {
    #[serde(default)]
    built_at: Option<DateTime<Utc>>,
    list: Vec<CourseRecord>,
}

#[derive(Debug, Clone)]
pub struct CourseIndex {
    built_at: Option<DateTime<Utc>>,
    list: Vec<CourseRecord>,
    keys: HashMap<String, usize>,
    title_tokens: Vec<HashSet<String>>,
}

impl CourseIndex {
    /// Builds an index from rows in order, merging rows that share a key.
    pub fn build<I>(rows: I) -> (CourseIndex, BuildStats)
    where
        I: IntoIterator<Item = RawCourseRow>,
    {
        let mut stats = BuildStats::default();
        let mut list: Vec<CourseRecord> = Vec::new();
        let mut keys: HashMap<String, usize> = HashMap::new();

        for row in rows {
            stats.rows += 1;
            let Some(incoming) = normalize_row(&row) else {
                stats.dropped += 1;
                continue;
            };

            let key = incoming.code();
            match keys.get(&key) {
                Some(&pos) => merge_into(&mut list[pos], incoming),
                None => {
                    keys.insert(key, list.len());
                    list.push(incoming);
                }
            }
        }

        stats.courses = list.len();
        let index = CourseIndex::from_parts(Some(Utc::now()), list);
        (index, stats)
    }

    /// Builds from a CSV scan. Records the reader could not decode count as
    /// both read and dropped rows.
    pub fn from_scan(scan: CsvScan) -> (CourseIndex, BuildStats) {
        let unreadable = scan.unreadable;
        let (index, stats) = CourseIndex::build(scan.rows);
        let stats = BuildStats {
            rows: stats.rows + unreadable,
            dropped: stats.dropped + unreadable,
            ..stats
        };
        (index, stats)
    }

    fn from_parts(built_at: Option<DateTime<Utc>>, list: Vec<CourseRecord>) -> CourseIndex {
        let mut keys = HashMap::with_capacity(list.len());
        let mut deduped: Vec<CourseRecord> = Vec::with_capacity(list.len());
        for record in list {
            match keys.get(&record.code()) {
                Some(&pos) => merge_into(&mut deduped[pos], record),
                None => {
                    keys.insert(record.code(), deduped.len());
                    deduped.push(record);
                }
            }
        }

        let title_tokens = deduped
            .iter()
            .map(|r| tokenize(&r.title).into_iter().collect())
            .collect();

        CourseIndex {
            built_at,
            list: deduped,
            keys,
            title_tokens,
        }
    }

    pub fn len(&self) -> usize {
        self.list.len()
    }

    pub fn is_empty(&self) -> bool {
        self.list.is_empty()
    }

    pub fn built_at(&self) -> Option<DateTime<Utc>> {
        self.built_at
    }

    /// All records in first-insertion order.
    pub fn list(&self) -> &[CourseRecord] {
        &self.list
    }

    /// Exact lookup by normalized key (`"COMP 248"`).
    pub fn get(&self, code: &str) -> Option<&CourseRecord> {
        self.keys.get(code).map(|&i| &self.list[i])
    }

    /// Scores `text` against every title and returns the first strictly-best
    /// record, if it reaches [`TITLE_MATCH_THRESHOLD`].
    pub fn find_by_title_fragment(&self, text: &str) -> Option<&CourseRecord> {
        let query = query_tokens(text);
        if query.is_empty() {
            return None;
        }

        let mut best: Option<(usize, f64)> = None;
        for i in 0..self.list.len() {
            let score = self.score(i, &query);
            if best.map_or(true, |(_, s)| score > s) {
                best = Some((i, score));
            }
        }

        match best {
            Some((i, score)) if score >= TITLE_MATCH_THRESHOLD => Some(&self.list[i]),
            _ => None,
        }
    }

    /// Title-overlap score of the record at `code` for `text`, in `[0, 1]`.
    pub fn title_score(&self, code: &str, text: &str) -> Option<f64> {
        let query = query_tokens(text);
        let &i = self.keys.get(code)?;
        if query.is_empty() {
            return Some(0.0);
        }
        Some(self.score(i, &query))
    }

    /// Every record with a non-zero title score, best first. Ties keep index order.
    pub fn search_titles(&self, text: &str, limit: usize) -> Vec<(&CourseRecord, f64)> {
        let query = query_tokens(text);
        if query.is_empty() {
            return Vec::new();
        }

        let mut hits: Vec<(&CourseRecord, f64)> = (0..self.list.len())
            .map(|i| (&self.list[i], self.score(i, &query)))
            .filter(|(_, score)| *score > 0.0)
            .collect();
        hits.sort_by(|a, b| b.1.total_cmp(&a.1));
        hits.truncate(limit);
        hits
    }

    fn score(&self, i: usize, query: &[String]) -> f64 {
        let tokens = &self.title_tokens[i];
        let hits = query.iter().filter(|t| tokens.contains(*t)).count();
        hits as f64 / query.len() as f64
    }

    /// Course codes referenced by the prerequisite text of `code`.
    pub fn prerequisites_of(&self, code: &str) -> Vec<String> {
        self.get(code)
            .map(|r| prereq::referenced_codes(&r.prereq))
            .unwrap_or_default()
    }

    /// Records whose prerequisite text references `code`, in index order.
    pub fn unlocked_by(&self, code: &str) -> Vec<&CourseRecord> {
        self.list
            .iter()
            .filter(|r| r.code() != code)
            .filter(|r| prereq::referenced_codes(&r.prereq).iter().any(|c| c == code))
            .collect()
    }

    /// Number of courses per subject, sorted by subject.
    pub fn subjects(&self) -> BTreeMap<&str, usize> {
        let mut out = BTreeMap::new();
        for r in &self.list {
            *out.entry(r.subject.as_str()).or_insert(0) += 1;
        }
        out
    }

    pub fn to_json(&self) -> Result<String> {
        let doc = IndexDocumentRef {
            built_at: self.built_at,
            list: &self.list,
            map: self.list.iter().map(|r| (r.code(), r)).collect(),
        };
        Ok(serde_json::to_string_pretty(&doc)?)
    }

    pub fn from_json(json: &str) -> Result<CourseIndex> {
        let doc: IndexDocument =
            serde_json::from_str(json).context("Failed to parse course index document")?;
        Ok(CourseIndex::from_parts(doc.built_at, doc.list))
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                std::fs::create_dir_all(parent).with_context(|| {
                    format!("Failed to create index directory: {}", parent.display())
                })?;
            }
        }
        std::fs::write(path, self.to_json()?)
            .with_context(|| format!("Failed to write index: {}", path.display()))?;
        Ok(())
    }

    pub fn load(path: &Path) -> Result<CourseIndex> {
        let json = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read index: {}", path.display()))?;
        CourseIndex::from_json(&json)
    }
}

/// Loads the built index document, or builds from the configured exports
/// when no document exists yet. With neither present the index is empty.
pub fn open_or_build(config: &Config) -> Result<CourseIndex> {
    let path = &config.index.path;
    if path.exists() {
        let index = CourseIndex::load(path)?;
        info!(path = %path.display(), courses = index.len(), "loaded course index");
        return Ok(index);
    }

    if !config.catalog.root.exists() {
        warn!(
            root = %config.catalog.root.display(),
            "no course index and no export root, starting with an empty index"
        );
        return Ok(CourseIndex::build(Vec::new()).0);
    }

    let scan = connector_csv::scan_exports(config)?;
    let files = scan.files.len();
    let (index, stats) = CourseIndex::from_scan(scan);
    info!(
        files,
        rows = stats.rows,
        courses = stats.courses,
        dropped = stats.dropped,
        "built course index from exports"
    );
    Ok(index)
}

/// Lowercase alphanumeric words.
pub fn tokenize(text: &str) -> Vec<String> {
    text.to_lowercase()
        .split(|c: char| !c.is_ascii_alphanumeric())
        .filter(|w| !w.is_empty())
        .map(str::to_string)
        .collect()
}

fn query_tokens(text: &str) -> Vec<String> {
    tokenize(text)
        .into_iter()
        .filter(|t| !TITLE_STOP_WORDS.contains(&t.as_str()))
        .collect()
}

/// First run of three consecutive digits (`"6951"` → `"695"`).
fn normalize_catalogue(raw: &str) -> Option<String> {
    CATALOGUE_DIGITS.find(raw).map(|m| m.as_str().to_string())
}

/// Leading decimal number of a credits cell (`"3.5"`, `"3 cr"`).
fn parse_credits(raw: &str) -> Option<f64> {
    let trimmed = raw.trim();
    let end = trimmed
        .char_indices()
        .find(|&(_, c)| !(c.is_ascii_digit() || c == '.'))
        .map_or(trimmed.len(), |(i, _)| i);
    trimmed[..end].parse::<f64>().ok().filter(|v| v.is_finite())
}

fn cell(value: &Option<String>) -> String {
    value.as_deref().map(str::trim).unwrap_or_default().to_string()
}

fn normalize_row(row: &RawCourseRow) -> Option<CourseRecord> {
    let subject = cell(&row.subject).to_uppercase();
    if subject.is_empty() {
        return None;
    }
    let catalogue = normalize_catalogue(&cell(&row.catalogue))?;

    let mut record = CourseRecord::new(subject, catalogue);
    record.title = cell(&row.title);
    record.credits = row.credits.as_deref().and_then(parse_credits);
    record
        .terms
        .extend(Term::parse_all(row.term.as_deref().unwrap_or_default()));
    let session = cell(&row.session);
    if !session.is_empty() {
        record.sessions.push(session);
    }
    record.prereq = cell(&row.prereqdescription);
    record.equivalent = cell(&row.equivalent_course_description);
    record.location = cell(&row.location_description);
    record.description = cell(&row.description);
    Some(record)
}

fn keep_longer(existing: &mut String, incoming: String) {
    if incoming.trim().chars().count() > existing.trim().chars().count() {
        *existing = incoming;
    }
}

fn merge_into(existing: &mut CourseRecord, incoming: CourseRecord) {
    keep_longer(&mut existing.title, incoming.title);
    keep_longer(&mut existing.description, incoming.description);
    keep_longer(&mut existing.prereq, incoming.prereq);
    keep_longer(&mut existing.equivalent, incoming.equivalent);

    if existing.credits.is_none() {
        existing.credits = incoming.credits;
    }
    if existing.location.is_empty() {
        existing.location = incoming.location;
    }

    existing.terms.extend(incoming.terms);
    for session in incoming.sessions {
        if !existing.sessions.contains(&session) {
            existing.sessions.push(session);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(subject: &str, catalogue: &str, title: &str) -> RawCourseRow {
        RawCourseRow {
            subject: Some(subject.to_string()),
            catalogue: Some(catalogue.to_string()),
            title: Some(title.to_string()),
            ..Default::default()
        }
    }

    fn sample() -> CourseIndex {
        let mut comp = row("COMP", "248", "Fundamentals of Programming");
        comp.credits = Some("3".into());
        let mut soen = row("SOEN", "287", "Web Programming");
        soen.prereqdescription = Some("Course Prerequisite: COMP 248.".into());
        let mut comp249 = row("COMP", "249", "Object-Oriented Programming II");
        comp249.prereqdescription = Some("COMP 248; MATH 203 or MATH 204".into());
        CourseIndex::build(vec![comp, soen, comp249]).0
    }

    #[test]
    fn test_normalization_and_drops() {
        let rows = vec![
            row(" comp ", "248", "A"),
            row("COMP", "248A", "Longer title"),
            row("COMP", "6951", "Grad"),
            row("", "101", "No subject"),
            row("ENGR", "", "No catalogue"),
            row("ENGR", "X", "Letters"),
            row("ENGR", "21", "Two digits"),
        ];
        let (index, stats) = CourseIndex::build(rows);
        assert_eq!(stats.rows, 7);
        assert_eq!(stats.dropped, 4);
        assert_eq!(stats.courses, 2);
        assert_eq!(index.get("COMP 248").unwrap().title, "Longer title");
        assert_eq!(index.get("COMP 695").unwrap().title, "Grad");
    }

    #[test]
    fn test_catalogue_takes_first_three_digit_run() {
        assert_eq!(normalize_catalogue("6951").as_deref(), Some("695"));
        assert_eq!(normalize_catalogue("C-12 345").as_deref(), Some("345"));
        assert_eq!(normalize_catalogue(" 248A").as_deref(), Some("248"));
        assert_eq!(normalize_catalogue("12"), None);
        assert_eq!(normalize_catalogue("1-2-3"), None);
    }

    #[test]
    fn test_from_scan_counts_unreadable_as_read_and_dropped() {
        let scan = CsvScan {
            files: vec!["fall.csv".into()],
            rows: vec![row("COMP", "248", "A"), row("", "101", "No subject")],
            unreadable: 2,
        };
        let (index, stats) = CourseIndex::from_scan(scan);
        assert_eq!(index.len(), 1);
        assert_eq!(
            stats,
            BuildStats {
                rows: 4,
                courses: 1,
                dropped: 3,
            }
        );
    }

    #[test]
    fn test_merge_keeps_longest_and_unions() {
        let mut a = row("COMP", "248", "Intro");
        a.term = Some("Fall 2024".into());
        a.session = Some("13W".into());
        a.credits = Some("3.5".into());
        a.location_description = Some("SGW".into());
        let mut b = row("COMP", "248", "  Fundamentals of Programming  ");
        b.term = Some("Winter".into());
        b.session = Some("6H1".into());
        b.credits = Some("4".into());
        b.location_description = Some("LOY".into());
        let mut c = row("COMP", "248", "Intro");
        c.session = Some("13W".into());

        let (index, stats) = CourseIndex::build(vec![a, b, c]);
        assert_eq!(stats.courses, 1);
        let rec = index.get("COMP 248").unwrap();
        assert_eq!(rec.title, "Fundamentals of Programming");
        assert_eq!(rec.credits, Some(3.5));
        assert_eq!(rec.location, "SGW");
        assert_eq!(rec.terms_display(), "Fall, Winter");
        assert_eq!(rec.sessions, vec!["13W", "6H1"]);
    }

    #[test]
    fn test_merge_tie_keeps_existing() {
        let rows = vec![row("COMP", "248", "Abcd"), row("COMP", "248", "Wxyz")];
        let (index, _) = CourseIndex::build(rows);
        assert_eq!(index.get("COMP 248").unwrap().title, "Abcd");
    }

    #[test]
    fn test_same_row_twice_is_idempotent() {
        let mut r = row("SOEN", "287", "Web Programming");
        r.term = Some("Fall".into());
        r.session = Some("13W".into());
        r.credits = Some("3".into());
        let (once, _) = CourseIndex::build(vec![r.clone()]);
        let (twice, _) = CourseIndex::build(vec![r.clone(), r]);
        assert_eq!(once.list(), twice.list());
    }

    #[test]
    fn test_every_inserted_key_round_trips() {
        let rows = vec![
            row("comp", "248", "a"),
            row("SOEN", "287", "b"),
            row("ENGR", "201", "c"),
            row("COMP", "248", "d"),
        ];
        let (index, _) = CourseIndex::build(rows);
        for key in ["COMP 248", "SOEN 287", "ENGR 201"] {
            let rec = index.get(key).unwrap();
            assert_eq!(rec.code(), key);
        }
        assert!(index.get("COMP 249").is_none());
    }

    #[test]
    fn test_insertion_order_preserved() {
        let index = sample();
        let codes: Vec<String> = index.list().iter().map(|r| r.code()).collect();
        assert_eq!(codes, vec!["COMP 248", "SOEN 287", "COMP 249"]);
    }

    #[test]
    fn test_title_fragment_full_match() {
        let index = sample();
        assert_eq!(
            index.title_score("COMP 248", "fundamentals of programming"),
            Some(1.0)
        );
        let rec = index.find_by_title_fragment("fundamentals of programming").unwrap();
        assert_eq!(rec.code(), "COMP 248");
    }

    #[test]
    fn test_title_fragment_below_threshold() {
        let index = sample();
        // one of four content tokens matches
        let text = "fundamentals astronomy biology chemistry";
        assert_eq!(index.title_score("COMP 248", text), Some(0.25));
        assert!(index.find_by_title_fragment(text).is_none());
    }

    #[test]
    fn test_title_fragment_tie_goes_to_first() {
        let index = sample();
        let rec = index.find_by_title_fragment("programming").unwrap();
        assert_eq!(rec.code(), "COMP 248");
    }

    #[test]
    fn test_title_fragment_only_stop_words() {
        let index = sample();
        assert!(index.find_by_title_fragment("what is the title").is_none());
    }

    #[test]
    fn test_search_titles_orders_by_score() {
        let index = sample();
        let hits = index.search_titles("web programming", 10);
        assert_eq!(hits[0].0.code(), "SOEN 287");
        assert_eq!(hits[0].1, 1.0);
        assert_eq!(hits.len(), 3);
        assert_eq!(index.search_titles("web programming", 1).len(), 1);
    }

    #[test]
    fn test_prerequisites_and_unlocks() {
        let index = sample();
        assert_eq!(
            index.prerequisites_of("COMP 249"),
            vec!["COMP 248", "MATH 203", "MATH 204"]
        );
        let unlocked: Vec<String> = index
            .unlocked_by("COMP 248")
            .iter()
            .map(|r| r.code())
            .collect();
        assert_eq!(unlocked, vec!["SOEN 287", "COMP 249"]);
    }

    #[test]
    fn test_json_document_round_trip() {
        let index = sample();
        let json = index.to_json().unwrap();
        let value: serde_json::Value = serde_json::from_str(&json).unwrap();
        assert!(value["map"]["SOEN 287"].is_object());
        assert_eq!(value["list"].as_array().unwrap().len(), 3);

        let loaded = CourseIndex::from_json(&json).unwrap();
        assert_eq!(loaded.list(), index.list());
        assert_eq!(
            loaded.find_by_title_fragment("web programming").unwrap().code(),
            "SOEN 287"
        );
    }

    #[test]
    fn test_parse_credits() {
        assert_eq!(parse_credits("3"), Some(3.0));
        assert_eq!(parse_credits(" 3.50 "), Some(3.5));
        assert_eq!(parse_credits("4 cr"), Some(4.0));
        assert_eq!(parse_credits("n/a"), None);
        assert_eq!(parse_credits(""), None);
    }

    #[test]
    fn test_open_or_build_prefers_saved_document() {
        let tmp = tempfile::TempDir::new().unwrap();
        let mut config = Config::minimal();
        config.index.path = tmp.path().join("index.json");
        config.catalog.root = tmp.path().join("exports");

        let empty = open_or_build(&config).unwrap();
        assert!(empty.is_empty());

        std::fs::create_dir_all(&config.catalog.root).unwrap();
        std::fs::write(
            config.catalog.root.join("a.csv"),
            "Subject,Catalogue,Title\nCOMP,248,Object-Oriented Programming I\n",
        )
        .unwrap();
        assert_eq!(open_or_build(&config).unwrap().len(), 1);

        sample().save(&config.index.path).unwrap();
        assert_eq!(open_or_build(&config).unwrap().len(), 3);
    }
}
