//! Title search over the course index.

use anyhow::{bail, Result};

use crate::config::Config;
use crate::index;

pub fn run_search(config: &Config, query: &str, limit: usize) -> Result<()> {
    if query.trim().is_empty() {
        bail!("query must not be empty");
    }

    let index = index::open_or_build(config)?;
    let hits = index.search_titles(query, limit.max(1));

    if hits.is_empty() {
        println!("No results.");
        return Ok(());
    }

    for (i, (record, score)) in hits.iter().enumerate() {
        let credits = record
            .credits
            .map(|c| format!("{c} cr"))
            .unwrap_or_else(|| "? cr".to_string());
        println!(
            "{}. [{:.2}] {} / {} ({})",
            i + 1,
            score,
            record.code(),
            if record.title.is_empty() {
                "(untitled)"
            } else {
                &record.title
            },
            credits
        );
    }

    Ok(())
}
