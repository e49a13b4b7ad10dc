//! Answer synthesis.
//!
//! Turns a lookup outcome into an [`Answer`]. Every answer renders as plain
//! text; professor and community answers also render as an HTML fragment
//! for clients that display rich replies. Which one is sent is the caller's
//! choice.

use serde::Serialize;
use std::fmt::Write as _;

use crate::community::CommunityReport;
use crate::models::{CourseRecord, FactTopic};
use crate::prereq;
use crate::professor::{ProfessorMatch, ProfessorReport};

pub const EMPTY_PROMPT: &str = "Ask about a course, e.g. “How many credits is COMP 248?”";

pub const COURSE_NOT_FOUND: &str = "I couldn't find that course in our index. Try a full code like `COMP 248` or a course title (e.g., `fundamentals of programming`).";

pub const HELP: &str = "I didn't catch that. Try:\n\
- **Course Code** (e.g. `COMP 248`) for details.\n\
- **Professor Name** (e.g. `Aiman Hanna`) for ratings.\n\
- **Question** (e.g. `Is COMP 248 hard?`) for community advice.";

const UNKNOWN: &str = "—";

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Answer {
    Text { text: String },
    Professor { report: ProfessorReport },
    Community { course: String, report: CommunityReport },
}

impl Answer {
    pub fn text(s: impl Into<String>) -> Self {
        Answer::Text { text: s.into() }
    }

    /// Community answer with at most `max_sources` sources.
    pub fn community(course: &str, mut report: CommunityReport, max_sources: usize) -> Self {
        report.sources.truncate(max_sources);
        Answer::Community {
            course: course.to_string(),
            report,
        }
    }

    pub fn plain(&self) -> String {
        match self {
            Answer::Text { text } => text.clone(),
            Answer::Professor { report } => professor_plain(report),
            Answer::Community { course, report } => community_plain(course, report),
        }
    }

    /// Rich rendering, for answers that have one.
    pub fn html(&self) -> Option<String> {
        match self {
            Answer::Text { .. } => None,
            Answer::Professor { report } => Some(professor_html(report)),
            Answer::Community { course, report } => Some(community_html(course, report)),
        }
    }
}

pub fn professor_not_found(name: &str) -> String {
    format!("I searched for professor \"{}\" but couldn't find a match.", name.trim())
}

/// One of the fixed course-fact sentences.
pub fn course_fact(record: &CourseRecord, topic: FactTopic) -> String {
    let code = record.code();
    match topic {
        FactTopic::Credits => {
            let credits = record
                .credits
                .map(|c| c.to_string())
                .unwrap_or_else(|| "-".to_string());
            format!("{code} is {credits} credits.")
        }
        FactTopic::Prereq => {
            let p = prereq::strip_label(&record.prereq);
            if p.is_empty() {
                format!("There are no listed prerequisites for {code}.")
            } else {
                format!("Prerequisites for {code}: {p}")
            }
        }
        FactTopic::Equivalent => {
            let e = record.equivalent.trim();
            if e.is_empty() {
                format!("No equivalents are listed for {code}.")
            } else {
                format!("Course(s) equivalent to {code}: {e}")
            }
        }
        FactTopic::Terms => {
            let terms = or_unknown(record.terms_display());
            format!("{code} is offered in: {terms}.")
        }
        FactTopic::Session => {
            let sessions = or_unknown(record.sessions.join(", "));
            format!("{code} session/format: {sessions}.")
        }
        FactTopic::Location => {
            let location = or_unknown(record.location.trim().to_string());
            format!("{code} location: {location}.")
        }
        FactTopic::Title | FactTopic::Summary => course_summary(record),
    }
}

/// Every known attribute of a course joined with bullets.
pub fn course_summary(record: &CourseRecord) -> String {
    let code = record.code();
    let title = record.title.trim();
    let mut lines = vec![if title.is_empty() {
        code
    } else {
        format!("{code} — {title}")
    }];

    if let Some(credits) = record.credits {
        lines.push(format!("{credits} credits"));
    }
    if !record.terms.is_empty() {
        lines.push(format!("Offered: {}", record.terms_display()));
    }
    if !record.sessions.is_empty() {
        lines.push(format!("Session: {}", record.sessions.join(", ")));
    }
    let p = prereq::strip_label(&record.prereq);
    if !p.is_empty() {
        lines.push(format!("Prerequisite(s): {p}"));
    }
    if !record.equivalent.trim().is_empty() {
        lines.push(format!("Equivalent: {}", record.equivalent.trim()));
    }
    if !record.location.trim().is_empty() {
        lines.push(format!("Location: {}", record.location.trim()));
    }
    if !record.description.trim().is_empty() {
        lines.push(format!("\n{}", record.description.trim()));
    }

    lines.join(" • ")
}

fn or_unknown(s: String) -> String {
    if s.trim().is_empty() {
        UNKNOWN.to_string()
    } else {
        s
    }
}

fn opt_num(n: Option<f64>) -> String {
    n.map_or_else(|| UNKNOWN.to_string(), |v| v.to_string())
}

fn opt_pct(n: Option<f64>) -> String {
    n.map_or_else(|| UNKNOWN.to_string(), |v| format!("{v}%"))
}

fn opt_str(s: &Option<String>) -> &str {
    s.as_deref().unwrap_or(UNKNOWN)
}

fn quality_label(m: &ProfessorMatch) -> String {
    match m.rating_count {
        Some(1) => "Overall quality (based on 1 rating):".to_string(),
        Some(n) => format!("Overall quality (based on {n} ratings):"),
        None => "Overall quality:".to_string(),
    }
}

fn professor_rows(m: &ProfessorMatch) -> Vec<(String, String)> {
    vec![
        ("Professor Name:".to_string(), m.name.clone()),
        ("Dept:".to_string(), opt_str(&m.department).to_string()),
        ("School:".to_string(), opt_str(&m.school).to_string()),
        (quality_label(m), opt_num(m.quality)),
        ("Would take again:".to_string(), opt_pct(m.would_take_again_pct)),
        ("Level of difficulty:".to_string(), opt_num(m.difficulty)),
    ]
}

fn professor_plain(report: &ProfessorReport) -> String {
    let mut out = String::new();
    for (k, v) in professor_rows(&report.best) {
        let _ = writeln!(out, "{k} {v}");
    }
    if let Some(url) = &report.best.profile_url {
        let _ = writeln!(out, "Profile: {url}");
    }

    if !report.alternates.is_empty() {
        out.push_str("\nOther matches:\n");
        for alt in &report.alternates {
            let _ = writeln!(
                out,
                "- {} ({}, {}): quality {}, difficulty {}, would take again {}",
                alt.name,
                opt_str(&alt.department),
                opt_str(&alt.school),
                opt_num(alt.quality),
                opt_num(alt.difficulty),
                opt_pct(alt.would_take_again_pct),
            );
        }
    }

    out.trim_end().to_string()
}

fn kv_html(out: &mut String, k: &str, v: &str) {
    let _ = write!(
        out,
        r#"<div class="kv"><span class="k">{}</span><span class="v">{}</span></div>"#,
        escape_html(k),
        escape_html(v)
    );
}

fn profile_html(out: &mut String, url: &Option<String>) {
    if let Some(url) = url {
        let _ = write!(
            out,
            r#"<div class="kv"><span class="k">Profile:</span><span class="v"><a href="{}" target="_blank" rel="noreferrer">Click here</a></span></div>"#,
            escape_html(url)
        );
    }
}

fn professor_html(report: &ProfessorReport) -> String {
    let mut out = String::from(r#"<div class="professor"><div class="top">"#);
    for (k, v) in professor_rows(&report.best) {
        kv_html(&mut out, &k, &v);
    }
    profile_html(&mut out, &report.best.profile_url);
    out.push_str("</div>");

    if !report.alternates.is_empty() {
        out.push_str(r#"<div class="others"><div class="title">Other matches</div><ul>"#);
        for alt in &report.alternates {
            out.push_str(r#"<li><div class="other">"#);
            kv_html(&mut out, "Professor Name:", &alt.name);
            kv_html(&mut out, "Dept:", opt_str(&alt.department));
            kv_html(&mut out, "Overall quality:", &opt_num(alt.quality));
            kv_html(&mut out, "Level of difficulty:", &opt_num(alt.difficulty));
            profile_html(&mut out, &alt.profile_url);
            out.push_str("</div></li>");
        }
        out.push_str("</ul></div>");
    }

    out.push_str("</div>");
    out
}

fn community_plain(course: &str, report: &CommunityReport) -> String {
    let mut out = format!("Community consensus on {course}:\n{}", report.summary_text.trim());
    if !report.sources.is_empty() {
        out.push_str("\n\nSources:");
        for s in &report.sources {
            match &s.url {
                Some(url) if *url != s.title => {
                    let _ = write!(out, "\n- {} ({url})", s.title);
                }
                _ => {
                    let _ = write!(out, "\n- {}", s.title);
                }
            }
        }
    }
    out
}

fn community_html(course: &str, report: &CommunityReport) -> String {
    let summary = escape_html(report.summary_text.trim()).replace('\n', "<br/>");
    let mut out = format!(
        r#"<div class="community"><p><strong>Community consensus on {}:</strong></p><p>{}</p>"#,
        escape_html(course),
        summary
    );
    if !report.sources.is_empty() {
        out.push_str("<div class=\"sources\"><small>Sources:</small><ul>");
        for s in &report.sources {
            match &s.url {
                Some(url) => {
                    let _ = write!(
                        out,
                        r#"<li><a href="{}" target="_blank" rel="noreferrer">{}</a></li>"#,
                        escape_html(url),
                        escape_html(&s.title)
                    );
                }
                None => {
                    let _ = write!(out, "<li>{}</li>", escape_html(&s.title));
                }
            }
        }
        out.push_str("</ul></div>");
    }
    out.push_str("</div>");
    out
}

pub fn escape_html(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(c),
        }
    }
    out
}
