//! # coursebot
//!
//! A course-planning chat assistant for university students.
//!
//! coursebot builds a deduplicated course index from registrar CSV exports,
//! classifies each free-text message into one of a few intents and answers
//! it from the index, a professor-rating service or a community discussion
//! service. Answers are available from the CLI and from a small JSON HTTP API.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────┐   ┌─────────────┐   ┌─────────────┐
//! │ CSV exports │──▶│ CourseIndex │──▶│ index.json  │
//! └─────────────┘   └──────┬──────┘   └─────────────┘
//!                          │
//!   message ──▶ classify ──▶ Assistant ──▶ Answer (plain / html)
//!                          │
//!              ┌───────────┴───────────┐
//!              ▼                       ▼
//!      ┌───────────────┐       ┌───────────────┐
//!      │  professor    │       │  community    │
//!      │  ratings API  │       │  sentiment API│
//!      └───────────────┘       └───────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```bash
//! coursebot build                          # index ./data/**/*.csv
//! coursebot ask "How many credits is COMP 248?"
//! coursebot search "web programming"
//! coursebot serve                          # JSON API on [server].bind
//! ```
//!
//! ## Modules
//!
//! | Module | Purpose |
//! |--------|---------|
//! | [`config`] | TOML configuration parsing |
//! | [`models`] | Course records, terms, queries |
//! | [`connector_csv`] | CSV export discovery and row reading |
//! | [`index`] | Course index build, lookup and persistence |
//! | [`extract`] | Course codes, names and keyword families |
//! | [`classify`] | Intent classification |
//! | [`professor`] | Professor-rating adapter |
//! | [`community`] | Community-sentiment adapter |
//! | [`answer`] | Answer rendering |
//! | [`assistant`] | Per-message orchestration |
//! | [`server`] | JSON HTTP API |

pub mod answer;
pub mod ask;
pub mod assistant;
pub mod cache;
pub mod classify;
pub mod community;
pub mod config;
pub mod connector_csv;
pub mod error;
pub mod extract;
pub mod get;
pub mod index;
pub mod ingest;
pub mod logging;
pub mod models;
pub mod prereq;
pub mod professor;
pub mod search;
pub mod server;
pub mod stats;
pub mod traits;
pub mod upstream;
