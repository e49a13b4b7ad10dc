//! Single-course inspection for `coursebot course <CODE>`.

use anyhow::{anyhow, Result};

use crate::config::Config;
use crate::extract;
use crate::index;
use crate::prereq;

pub fn run_course(config: &Config, code: &str) -> Result<()> {
    let key = extract::course_code(code).ok_or_else(|| anyhow!("not a course code: {}", code))?;
    let index = index::open_or_build(config)?;
    let record = index
        .get(&key)
        .ok_or_else(|| anyhow!("course not found: {}", key))?;

    println!("--- Course ---");
    println!("code:        {}", record.code());
    println!(
        "title:       {}",
        if record.title.is_empty() {
            "(untitled)"
        } else {
            &record.title
        }
    );
    if let Some(credits) = record.credits {
        println!("credits:     {}", credits);
    }
    if !record.terms.is_empty() {
        println!("terms:       {}", record.terms_display());
    }
    if !record.sessions.is_empty() {
        println!("sessions:    {}", record.sessions.join(", "));
    }
    if !record.location.is_empty() {
        println!("location:    {}", record.location);
    }
    if !record.equivalent.is_empty() {
        println!("equivalent:  {}", record.equivalent);
    }
    let prereq_text = prereq::strip_label(&record.prereq);
    if !prereq_text.is_empty() {
        println!("prereq:      {}", prereq_text);
    }
    println!();

    if !record.description.is_empty() {
        println!("--- Description ---");
        println!("{}", record.description);
        println!();
    }

    let prerequisites = index.prerequisites_of(&key);
    println!("--- Prerequisites ({}) ---", prerequisites.len());
    for code in &prerequisites {
        match index.get(code) {
            Some(r) => println!("{}  {}", code, r.title),
            None => println!("{}  (not in index)", code),
        }
    }
    println!();

    let unlocks = index.unlocked_by(&key);
    println!("--- Unlocks ({}) ---", unlocks.len());
    for r in unlocks {
        println!("{}  {}", r.code(), r.title);
    }

    Ok(())
}
