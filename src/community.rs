//! Community-discussion adapter.
//!
//! Asks the discussion search service for a synthesized answer about one
//! course:
//!
//! ```text
//! GET {base_url}{path}?question=..&course=..&limit=..&windowDays=..
//! → { "answer": "...", "sources": [ ... ], "topic": "...", "count": 4 }
//! ```
//!
//! Found answers are kept for `community.cache_ttl_secs` keyed by
//! `(course, lowercased question)`, at most `community.cache_capacity` of
//! them, so a burst of identical questions costs one upstream call. Misses
//! and failures are not cached.

use async_trait::async_trait;
use serde::Serialize;
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, warn};

use crate::cache::ExpiringCache;
use crate::config::Config;
use crate::error::UpstreamError;
use crate::traits::{CommunityDiscussions, Lookup};
use crate::upstream::{self, first_text};

/// One post or thread the summary was drawn from.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct SourceLink {
    pub title: String,
    pub url: Option<String>,
    pub forum: Option<String>,
    pub posted_when: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct CommunityReport {
    pub summary_text: String,
    pub sources: Vec<SourceLink>,
    pub match_count: u32,
    pub topic: Option<String>,
}

pub type CacheKey = (String, String);

pub struct CommunitySentimentAdapter {
    client: reqwest::Client,
    url: String,
    limit: u32,
    cache: ExpiringCache<CacheKey, CommunityReport>,
}

impl CommunitySentimentAdapter {
    pub fn new(config: &Config) -> anyhow::Result<Self> {
        Ok(Self {
            client: upstream::build_client(&config.upstream)?,
            url: upstream::endpoint(&config.upstream.base_url, &config.community.path),
            limit: config.community.limit,
            cache: ExpiringCache::with_capacity(
                Duration::from_secs(config.community.cache_ttl_secs),
                config.community.cache_capacity,
            ),
        })
    }

    pub fn cache_key(course: &str, question: &str) -> CacheKey {
        (course.to_string(), question.to_lowercase())
    }

    async fn fetch(
        &self,
        course: &str,
        question: &str,
        window_days: u32,
    ) -> Result<Option<CommunityReport>, UpstreamError> {
        let params = [
            ("question", question.to_string()),
            ("course", course.to_string()),
            ("limit", self.limit.to_string()),
            ("windowDays", window_days.to_string()),
        ];
        let body = upstream::get_json(&self.client, &self.url, &params).await?;
        Ok(parse_response(&body))
    }
}

#[async_trait]
impl CommunityDiscussions for CommunitySentimentAdapter {
    async fn lookup(
        &self,
        course: &str,
        question: &str,
        window_days: u32,
    ) -> Lookup<CommunityReport> {
        let key = Self::cache_key(course, question);
        if let Some(hit) = self.cache.get(&key) {
            debug!(course, "community cache hit");
            return Lookup::Found(hit);
        }

        match self.fetch(course, question, window_days).await {
            Ok(Some(report)) => {
                self.cache.insert(key, report.clone());
                Lookup::Found(report)
            }
            Ok(None) => {
                debug!(course, "community lookup found nothing");
                Lookup::NoMatch
            }
            Err(e) => {
                warn!(course, error = %e, "community lookup failed");
                Lookup::NoMatch
            }
        }
    }
}

/// `None` when the answer is empty or `count` is zero.
pub fn parse_response(body: &Value) -> Option<CommunityReport> {
    let summary_text = first_text(body, &["answer"])?;

    let count = upstream::number(body.get("count"));
    if count == Some(0.0) {
        return None;
    }

    let sources: Vec<SourceLink> = body
        .get("sources")
        .and_then(Value::as_array)
        .map(|items| items.iter().filter_map(parse_source).collect())
        .unwrap_or_default();

    let match_count = count.map_or(sources.len() as u32, |c| c as u32);

    Some(CommunityReport {
        summary_text,
        sources,
        match_count,
        topic: first_text(body, &["topic"]),
    })
}

fn parse_source(item: &Value) -> Option<SourceLink> {
    let url = first_text(item, &["url", "permalink", "link"]);
    let title = first_text(item, &["title"]).or_else(|| url.clone())?;
    Some(SourceLink {
        title,
        url,
        forum: first_text(item, &["subreddit", "forum"]),
        posted_when: first_text(item, &["postedWhen", "created", "created_utc", "date"]),
    })
}
