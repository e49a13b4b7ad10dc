//! Course index statistics.
//!
//! Provides a quick summary of what's indexed: course counts, per-subject
//! breakdowns and term coverage. Used by `coursebot stats` to confirm a
//! build picked up the expected exports.

use anyhow::Result;

use crate::config::Config;
use crate::index::{self, CourseIndex};
use crate::models::Term;

/// Number of courses offered in each term, in display order.
pub fn term_coverage(index: &CourseIndex) -> Vec<(Term, usize)> {
    Term::ALL
        .into_iter()
        .map(|t| (t, index.list().iter().filter(|r| r.terms.contains(&t)).count()))
        .collect()
}

pub fn run_stats(config: &Config) -> Result<()> {
    let index = index::open_or_build(config)?;

    let index_size = std::fs::metadata(&config.index.path)
        .map(|m| m.len())
        .unwrap_or(0);
    let with_credits = index.list().iter().filter(|r| r.credits.is_some()).count();
    let with_prereq = index
        .list()
        .iter()
        .filter(|r| !r.prereq.trim().is_empty())
        .count();

    println!("coursebot — Index Stats");
    println!("=======================");
    println!();
    println!("  Index:       {}", config.index.path.display());
    println!("  Size:        {}", format_bytes(index_size));
    if let Some(built_at) = index.built_at() {
        println!("  Built:       {}", built_at.format("%Y-%m-%d %H:%M:%S UTC"));
    }
    println!();
    println!("  Courses:     {}", index.len());
    println!("  With credits: {}", with_credits);
    println!("  With prereqs: {}", with_prereq);
    println!();

    println!("  Terms:");
    for (term, count) in term_coverage(&index) {
        println!("    {:<8} {}", term.to_string(), count);
    }
    println!();

    let subjects = index.subjects();
    println!("  By subject ({}):", subjects.len());
    println!("  {:<10} {:>7}", "SUBJECT", "COURSES");
    println!("  {:<10} {:>7}", "───────", "───────");
    for (subject, count) in subjects {
        println!("  {:<10} {:>7}", subject, count);
    }

    Ok(())
}

fn format_bytes(bytes: u64) -> String {
    if bytes >= 1_048_576 {
        format!("{:.1} MB", bytes as f64 / 1_048_576.0)
    } else if bytes >= 1024 {
        format!("{:.1} KB", bytes as f64 / 1024.0)
    } else {
        format!("{} B", bytes)
    }
}
