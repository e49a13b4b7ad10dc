use anyhow::{bail, Context, Result};
use csv::StringRecord;
use globset::{Glob, GlobSet, GlobSetBuilder};
use std::io::Read;
use std::path::{Path, PathBuf};
use tracing::warn;
use walkdir::WalkDir;

use crate::config::Config;
use crate::models::RawCourseRow;

/// Rows read from one or more CSV exports, in path order.
#[derive(Debug, Default)]
pub struct CsvScan {
    pub files: Vec<PathBuf>,
    pub rows: Vec<RawCourseRow>,
    /// Records the CSV reader could not decode at all.
    pub unreadable: usize,
}

impl CsvScan {
    pub fn extend(&mut self, path: PathBuf, rows: Vec<RawCourseRow>, unreadable: usize) {
        self.files.push(path);
        self.rows.extend(rows);
        self.unreadable += unreadable;
    }
}

/// Reads every export under `catalog.root` that passes the include/exclude globs.
pub fn scan_exports(config: &Config) -> Result<CsvScan> {
    let mut scan = CsvScan::default();
    for path in discover(config)? {
        let (rows, unreadable) = read_file(&path)?;
        scan.extend(path, rows, unreadable);
    }
    Ok(scan)
}

/// Reads an explicit list of files, in the order given.
pub fn scan_files(paths: &[PathBuf]) -> Result<CsvScan> {
    let mut scan = CsvScan::default();
    for path in paths {
        let (rows, unreadable) = read_file(path)?;
        scan.extend(path.clone(), rows, unreadable);
    }
    Ok(scan)
}

pub fn discover(config: &Config) -> Result<Vec<PathBuf>> {
    let catalog = &config.catalog;
    let root = &catalog.root;
    if !root.exists() {
        bail!("Catalog export root does not exist: {}", root.display());
    }

    let include_set = build_globset(&catalog.include_globs)?;

    let mut default_excludes = vec![
        "**/.git/**".to_string(),
        "**/target/**".to_string(),
        "**/node_modules/**".to_string(),
    ];
    default_excludes.extend(catalog.exclude_globs.clone());
    let exclude_set = build_globset(&default_excludes)?;

    let mut paths = Vec::new();
    for entry in WalkDir::new(root) {
        let entry = entry?;
        if !entry.file_type().is_file() {
            continue;
        }

        let path = entry.path();
        let relative = path.strip_prefix(root).unwrap_or(path);
        let rel_str = relative.to_string_lossy().to_string();

        if exclude_set.is_match(&rel_str) {
            continue;
        }
        if !include_set.is_match(&rel_str) {
            continue;
        }

        paths.push(path.to_path_buf());
    }

    // Later exports override earlier ones only through the merge rules,
    // so the order must not depend on directory iteration.
    paths.sort();

    Ok(paths)
}

pub fn read_file(path: &Path) -> Result<(Vec<RawCourseRow>, usize)> {
    let file = std::fs::File::open(path)
        .with_context(|| format!("Failed to open export: {}", path.display()))?;
    let (rows, unreadable) =
        read_rows(file).with_context(|| format!("Failed to read export: {}", path.display()))?;
    if unreadable > 0 {
        warn!(path = %path.display(), unreadable, "skipped unreadable CSV records");
    }
    Ok((rows, unreadable))
}

/// Parses CSV with a header row. Header names are matched case-insensitively
/// and inner spaces count as underscores (`Course Credit` = `course_credit`).
/// When several accepted names for one field are present, the first
/// non-empty cell in `COLUMNS` order wins.
pub fn read_rows<R: Read>(reader: R) -> Result<(Vec<RawCourseRow>, usize)> {
    let mut rdr = csv::ReaderBuilder::new()
        .flexible(true)
        .trim(csv::Trim::All)
        .from_reader(reader);

    let columns = ColumnMap::new(rdr.headers()?);

    let mut rows = Vec::new();
    let mut unreadable = 0usize;
    for record in rdr.records() {
        match record {
            Ok(record) => rows.push(columns.row(&record)),
            Err(_) => unreadable += 1,
        }
    }

    Ok((rows, unreadable))
}

const FIELD_COUNT: usize = 10;

#[derive(Debug, Clone, Copy)]
enum Field {
    Subject,
    Catalogue,
    Title,
    Credits,
    Term,
    Session,
    Description,
    Prereq,
    Equivalent,
    Location,
}

/// Accepted header names per field, highest priority first.
const COLUMNS: [(Field, &[&str]); FIELD_COUNT] = [
    (Field::Subject, &["subject"]),
    (Field::Catalogue, &["catalogue", "catalog"]),
    (Field::Title, &["title"]),
    (Field::Credits, &["course_credit", "credits", "credit"]),
    (Field::Term, &["term"]),
    (Field::Session, &["session"]),
    (Field::Description, &["description"]),
    (Field::Prereq, &["prereqdescription", "prereq"]),
    (Field::Equivalent, &["equivalent_course_description", "equivalent"]),
    (Field::Location, &["location_description", "location"]),
];

/// Column indices backing each field, in priority order.
struct ColumnMap {
    indices: [Vec<usize>; FIELD_COUNT],
}

impl ColumnMap {
    fn new(headers: &StringRecord) -> Self {
        let headers: Vec<String> = headers.iter().map(normalize_header).collect();
        let mut indices: [Vec<usize>; FIELD_COUNT] = std::array::from_fn(|_| Vec::new());
        for (field, names) in COLUMNS {
            indices[field as usize] = names
                .iter()
                .flat_map(|name| {
                    headers
                        .iter()
                        .enumerate()
                        .filter(move |(_, header)| header.as_str() == *name)
                        .map(|(i, _)| i)
                })
                .collect();
        }
        Self { indices }
    }

    fn value(&self, record: &StringRecord, field: Field) -> Option<String> {
        self.indices[field as usize]
            .iter()
            .filter_map(|&i| record.get(i))
            .find(|cell| !cell.is_empty())
            .map(str::to_string)
    }

    fn row(&self, record: &StringRecord) -> RawCourseRow {
        RawCourseRow {
            subject: self.value(record, Field::Subject),
            catalogue: self.value(record, Field::Catalogue),
            title: self.value(record, Field::Title),
            credits: self.value(record, Field::Credits),
            term: self.value(record, Field::Term),
            session: self.value(record, Field::Session),
            description: self.value(record, Field::Description),
            prereqdescription: self.value(record, Field::Prereq),
            equivalent_course_description: self.value(record, Field::Equivalent),
            location_description: self.value(record, Field::Location),
        }
    }
}

fn normalize_header(header: &str) -> String {
    header
        .trim_start_matches('\u{feff}')
        .trim()
        .to_lowercase()
        .replace(' ', "_")
}

fn build_globset(patterns: &[String]) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(builder.build()?)
}
