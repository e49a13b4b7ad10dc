use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::{Path, PathBuf};

use crate::extract;

#[derive(Debug, Deserialize, Clone)]
pub struct Config {
    #[serde(default)]
    pub index: IndexConfig,
    #[serde(default)]
    pub catalog: CatalogConfig,
    #[serde(default)]
    pub upstream: UpstreamConfig,
    #[serde(default)]
    pub professor: ProfessorConfig,
    #[serde(default)]
    pub community: CommunityConfig,
    #[serde(default)]
    pub server: ServerConfig,
}

#[derive(Debug, Deserialize, Clone)]
pub struct IndexConfig {
    #[serde(default = "default_index_path")]
    pub path: PathBuf,
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            path: default_index_path(),
        }
    }
}

fn default_index_path() -> PathBuf {
    PathBuf::from("./data/course_index.json")
}

/// Where the tabular course exports live.
#[derive(Debug, Deserialize, Clone)]
pub struct CatalogConfig {
    #[serde(default = "default_catalog_root")]
    pub root: PathBuf,
    #[serde(default = "default_include_globs")]
    pub include_globs: Vec<String>,
    #[serde(default)]
    pub exclude_globs: Vec<String>,
}

impl Default for CatalogConfig {
    fn default() -> Self {
        Self {
            root: default_catalog_root(),
            include_globs: default_include_globs(),
            exclude_globs: Vec::new(),
        }
    }
}

fn default_catalog_root() -> PathBuf {
    PathBuf::from("./data/exports")
}

fn default_include_globs() -> Vec<String> {
    vec!["**/*.csv".to_string()]
}

#[derive(Debug, Deserialize, Clone)]
pub struct UpstreamConfig {
    #[serde(default = "default_base_url")]
    pub base_url: String,
    #[serde(default = "default_timeout_ms")]
    pub timeout_ms: u64,
}

impl Default for UpstreamConfig {
    fn default() -> Self {
        Self {
            base_url: default_base_url(),
            timeout_ms: default_timeout_ms(),
        }
    }
}

fn default_base_url() -> String {
    "http://localhost:4000".to_string()
}
fn default_timeout_ms() -> u64 {
    6000
}

#[derive(Debug, Deserialize, Clone)]
pub struct ProfessorConfig {
    #[serde(default = "default_professor_path")]
    pub path: String,
    #[serde(default)]
    pub all_institutions: bool,
    #[serde(default = "default_max_alternates")]
    pub max_alternates: usize,
}

impl Default for ProfessorConfig {
    fn default() -> Self {
        Self {
            path: default_professor_path(),
            all_institutions: false,
            max_alternates: default_max_alternates(),
        }
    }
}

fn default_professor_path() -> String {
    "/api/rmp".to_string()
}
fn default_max_alternates() -> usize {
    4
}

#[derive(Debug, Deserialize, Clone)]
pub struct CommunityConfig {
    #[serde(default = "default_community_path")]
    pub path: String,
    #[serde(default = "default_limit")]
    pub limit: u32,
    #[serde(default = "default_window_days")]
    pub window_days: u32,
    #[serde(default = "default_cache_ttl_secs")]
    pub cache_ttl_secs: u64,
    #[serde(default = "default_cache_capacity")]
    pub cache_capacity: u64,
    #[serde(default = "default_max_sources")]
    pub max_sources: usize,
    #[serde(default = "default_fallback_course")]
    pub fallback_course: String,
}

impl Default for CommunityConfig {
    fn default() -> Self {
        Self {
            path: default_community_path(),
            limit: default_limit(),
            window_days: default_window_days(),
            cache_ttl_secs: default_cache_ttl_secs(),
            cache_capacity: default_cache_capacity(),
            max_sources: default_max_sources(),
            fallback_course: default_fallback_course(),
        }
    }
}

fn default_community_path() -> String {
    "/api/reddit/answer".to_string()
}
fn default_limit() -> u32 {
    6
}
fn default_window_days() -> u32 {
    720
}
fn default_cache_ttl_secs() -> u64 {
    30
}
fn default_cache_capacity() -> u64 {
    crate::cache::DEFAULT_CAPACITY
}
fn default_max_sources() -> usize {
    5
}
fn default_fallback_course() -> String {
    "COMP 248".to_string()
}

#[derive(Debug, Deserialize, Clone)]
pub struct ServerConfig {
    #[serde(default = "default_bind")]
    pub bind: String,
    #[serde(default = "default_rich_replies")]
    pub rich_replies: bool,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind: default_bind(),
            rich_replies: default_rich_replies(),
        }
    }
}

fn default_bind() -> String {
    "127.0.0.1:7340".to_string()
}
fn default_rich_replies() -> bool {
    true
}

impl Config {
    /// All-defaults configuration, used when no config file is present.
    pub fn minimal() -> Self {
        Self {
            index: IndexConfig::default(),
            catalog: CatalogConfig::default(),
            upstream: UpstreamConfig::default(),
            professor: ProfessorConfig::default(),
            community: CommunityConfig::default(),
            server: ServerConfig::default(),
        }
    }
}

pub fn load_config(path: &Path) -> Result<Config> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read config file: {}", path.display()))?;

    let config: Config = toml::from_str(&content).with_context(|| "Failed to parse config file")?;

    validate(config)
}

/// Checks ranges and normalizes `community.fallback_course` to `SUBJ NNN`.
pub fn validate(mut config: Config) -> Result<Config> {
    if config.upstream.timeout_ms == 0 {
        anyhow::bail!("upstream.timeout_ms must be > 0");
    }

    let base = config.upstream.base_url.trim();
    if !(base.starts_with("http://") || base.starts_with("https://")) {
        anyhow::bail!(
            "upstream.base_url must start with http:// or https:// (got '{}')",
            config.upstream.base_url
        );
    }

    if config.community.limit == 0 {
        anyhow::bail!("community.limit must be >= 1");
    }

    if !(1..=6).contains(&config.community.max_sources) {
        anyhow::bail!("community.max_sources must be in [1, 6]");
    }

    if config.professor.max_alternates > 4 {
        anyhow::bail!("professor.max_alternates must be <= 4");
    }

    config.community.fallback_course = extract::course_code(&config.community.fallback_course)
        .ok_or_else(|| {
            anyhow::anyhow!(
                "community.fallback_course is not a course code: '{}'",
                config.community.fallback_course
            )
        })?;

    Ok(config)
}
