//! Seams for the external sources the assistant consults.
//!
//! The assistant depends only on these traits, so the HTTP adapters in
//! [`crate::professor`] and [`crate::community`] can be swapped for
//! in-process stubs in tests or for other backends in custom binaries.
//!
//! # Example
//!
//! ```rust
//! use async_trait::async_trait;
//! use coursebot::professor::ProfessorReport;
//! use coursebot::traits::{Lookup, ProfessorRatings};
//!
//! struct NobodyHome;
//!
//! #[async_trait]
//! impl ProfessorRatings for NobodyHome {
//!     async fn lookup(&self, _name: &str) -> Lookup<ProfessorReport> {
//!         Lookup::NoMatch
//!     }
//! }
//! ```

use async_trait::async_trait;

use crate::community::CommunityReport;
use crate::professor::ProfessorReport;

/// Result of an external lookup.
///
/// `NoMatch` is a first-class answer: the source was asked and had nothing
/// usable, whether because nothing matched or because the call failed.
#[derive(Debug, Clone, PartialEq)]
pub enum Lookup<T> {
    Found(T),
    NoMatch,
}

impl<T> Lookup<T> {
    pub fn is_found(&self) -> bool {
        matches!(self, Lookup::Found(_))
    }
}

impl<T> From<Option<T>> for Lookup<T> {
    fn from(value: Option<T>) -> Self {
        match value {
            Some(v) => Lookup::Found(v),
            None => Lookup::NoMatch,
        }
    }
}

/// A professor-ratings source.
#[async_trait]
pub trait ProfessorRatings: Send + Sync {
    /// Best match for `name` plus runner-ups, scoped to the configured
    /// institution.
    async fn lookup(&self, name: &str) -> Lookup<ProfessorReport>;
}

/// A community-discussion search source.
#[async_trait]
pub trait CommunityDiscussions: Send + Sync {
    /// Synthesized peer opinion about `course` for `question`, drawn from
    /// posts in the last `window_days` days.
    async fn lookup(
        &self,
        course: &str,
        question: &str,
        window_days: u32,
    ) -> Lookup<CommunityReport>;
}
