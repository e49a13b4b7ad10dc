//! The per-turn pipeline: classify, dispatch to one source, synthesize.
//!
//! Each step finishes before the next starts and a turn makes at most one
//! upstream call. Lookup misses fall back where a useful answer is still
//! possible: a bare-name professor miss retries as a course title, and a
//! community miss answers from the course index instead.

use serde::Serialize;
use std::sync::Arc;
use tracing::debug;

use crate::answer::{self, Answer};
use crate::classify;
use crate::config::Config;
use crate::index::CourseIndex;
use crate::models::{Entity, FactTopic, Intent, Query, Rule};
use crate::traits::{CommunityDiscussions, Lookup, ProfessorRatings};

/// Per-turn knobs taken from configuration.
#[derive(Debug, Clone)]
pub struct Settings {
    pub window_days: u32,
    pub max_sources: usize,
    pub fallback_course: String,
}

impl From<&Config> for Settings {
    fn from(config: &Config) -> Self {
        Self {
            window_days: config.community.window_days,
            max_sources: config.community.max_sources,
            fallback_course: config.community.fallback_course.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct Reply {
    pub query: Query,
    pub answer: Answer,
}

#[derive(Clone)]
pub struct Assistant {
    index: Arc<CourseIndex>,
    professors: Arc<dyn ProfessorRatings>,
    community: Arc<dyn CommunityDiscussions>,
    settings: Settings,
}

impl Assistant {
    pub fn new(
        index: Arc<CourseIndex>,
        professors: Arc<dyn ProfessorRatings>,
        community: Arc<dyn CommunityDiscussions>,
        settings: Settings,
    ) -> Self {
        Self {
            index,
            professors,
            community,
            settings,
        }
    }

    pub fn index(&self) -> &CourseIndex {
        &self.index
    }

    pub async fn respond(&self, message: &str) -> Reply {
        let text = message.trim();
        let query = classify::classify(text);
        if text.is_empty() {
            return Reply {
                query,
                answer: Answer::text(answer::EMPTY_PROMPT),
            };
        }
        let answer = self.answer(&query).await;
        Reply { query, answer }
    }

    /// Answers an already-classified query.
    pub async fn answer(&self, query: &Query) -> Answer {
        match query.intent {
            Intent::CourseFact => {
                let code = query.entity.as_ref().map(Entity::as_str);
                self.course_answer(code, &query.raw_text, query.fact_topic)
            }
            Intent::ProfessorLookup => self.professor_answer(query).await,
            Intent::CommunitySentiment => self.community_answer(query).await,
            Intent::Unknown => Answer::text(answer::HELP),
        }
    }

    fn course_answer(&self, code: Option<&str>, text: &str, topic: FactTopic) -> Answer {
        let record = code
            .and_then(|c| self.index.get(c))
            .or_else(|| self.index.find_by_title_fragment(text));
        match record {
            Some(r) => {
                debug!(code = %r.code(), ?topic, "course fact");
                Answer::text(answer::course_fact(r, topic))
            }
            None => Answer::text(answer::COURSE_NOT_FOUND),
        }
    }

    async fn professor_answer(&self, query: &Query) -> Answer {
        let name = query.entity.as_ref().map(Entity::as_str).unwrap_or_default();
        match self.professors.lookup(name).await {
            Lookup::Found(report) => Answer::Professor { report },
            Lookup::NoMatch => {
                if query.rule == Rule::LooseName {
                    if let Some(r) = self.index.find_by_title_fragment(&query.raw_text) {
                        debug!(code = %r.code(), "no professor match, answering as course title");
                        return Answer::text(answer::course_fact(r, query.fact_topic));
                    }
                }
                Answer::text(answer::professor_not_found(name))
            }
        }
    }

    async fn community_answer(&self, query: &Query) -> Answer {
        let course = match &query.entity {
            Some(Entity::CourseCode(code)) => code.clone(),
            _ => self.settings.fallback_course.clone(),
        };

        match self
            .community
            .lookup(&course, &query.raw_text, self.settings.window_days)
            .await
        {
            Lookup::Found(report) => Answer::community(&course, report, self.settings.max_sources),
            Lookup::NoMatch => {
                debug!(course = %course, "no community match, answering from index");
                self.course_answer(Some(&course), &query.raw_text, query.fact_topic)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::community::CommunityReport;
    use crate::models::{RawCourseRow, SentimentTopic};
    use crate::professor::{ProfessorMatch, ProfessorReport};
    use async_trait::async_trait;
    use std::sync::Mutex;

    #[derive(Default)]
    struct StubProfessors {
        known: Option<String>,
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ProfessorRatings for StubProfessors {
        async fn lookup(&self, name: &str) -> Lookup<ProfessorReport> {
            self.calls.lock().unwrap().push(name.to_string());
            match &self.known {
                Some(k) if k == name => Lookup::Found(ProfessorReport {
                    best: ProfessorMatch {
                        name: name.to_string(),
                        department: None,
                        school: None,
                        quality: Some(4.0),
                        difficulty: None,
                        would_take_again_pct: None,
                        rating_count: Some(10),
                        profile_url: None,
                    },
                    alternates: vec![],
                }),
                _ => Lookup::NoMatch,
            }
        }
    }

    #[derive(Default)]
    struct StubCommunity {
        answer: Option<String>,
        calls: Mutex<Vec<(String, String, u32)>>,
    }

    #[async_trait]
    impl CommunityDiscussions for StubCommunity {
        async fn lookup(&self, course: &str, question: &str, window_days: u32) -> Lookup<CommunityReport> {
            self.calls
                .lock()
                .unwrap()
                .push((course.to_string(), question.to_string(), window_days));
            match &self.answer {
                Some(a) => Lookup::Found(CommunityReport {
                    summary_text: a.clone(),
                    sources: vec![],
                    match_count: 2,
                    topic: None,
                }),
                None => Lookup::NoMatch,
            }
        }
    }

    fn index() -> Arc<CourseIndex> {
        let rows = vec![
            RawCourseRow {
                subject: Some("COMP".into()),
                catalogue: Some("248".into()),
                title: Some("Fundamentals of Programming".into()),
                credits: Some("3".into()),
                ..Default::default()
            },
            RawCourseRow {
                subject: Some("SOEN".into()),
                catalogue: Some("287".into()),
                title: Some("Web Programming".into()),
                credits: Some("3".into()),
                term: Some("Winter".into()),
                ..Default::default()
            },
        ];
        Arc::new(CourseIndex::build(rows).0)
    }

    fn settings() -> Settings {
        Settings {
            window_days: 720,
            max_sources: 5,
            fallback_course: "COMP 248".into(),
        }
    }

    fn assistant(profs: Arc<StubProfessors>, community: Arc<StubCommunity>) -> Assistant {
        Assistant::new(index(), profs, community, settings())
    }

    #[tokio::test]
    async fn test_credits_scenario() {
        let a = assistant(Arc::default(), Arc::default());
        let reply = a.respond("How many credits is COMP 248?").await;
        assert_eq!(reply.query.intent, Intent::CourseFact);
        assert_eq!(reply.answer.plain(), "COMP 248 is 3 credits.");
        assert!(reply.answer.html().is_none());
    }

    #[tokio::test]
    async fn test_empty_message_prompts() {
        let profs = Arc::new(StubProfessors::default());
        let a = assistant(profs.clone(), Arc::default());
        let reply = a.respond("   ").await;
        assert_eq!(reply.answer.plain(), answer::EMPTY_PROMPT);
        assert!(profs.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unknown_gets_help() {
        let a = assistant(Arc::default(), Arc::default());
        assert_eq!(a.respond("hello").await.answer.plain(), answer::HELP);
    }

    #[tokio::test]
    async fn test_course_not_found() {
        let a = assistant(Arc::default(), Arc::default());
        let reply = a.respond("credits for ENGR 999").await;
        assert_eq!(reply.answer.plain(), answer::COURSE_NOT_FOUND);
    }

    #[tokio::test]
    async fn test_professor_found_is_rich() {
        let profs = Arc::new(StubProfessors {
            known: Some("Aiman Hanna".into()),
            ..Default::default()
        });
        let a = assistant(profs.clone(), Arc::default());
        let reply = a.respond("Aiman Hanna").await;
        assert_eq!(reply.query.rule, Rule::LooseName);
        assert!(matches!(reply.answer, Answer::Professor { .. }));
        assert!(reply.answer.html().is_some());
        assert_eq!(profs.calls.lock().unwrap().as_slice(), ["Aiman Hanna"]);
    }

    #[tokio::test]
    async fn test_garbled_name_not_found() {
        let a = assistant(Arc::default(), Arc::default());
        let reply = a.respond("Qzxv Wrtp").await;
        assert_eq!(reply.query.intent, Intent::ProfessorLookup);
        let text = reply.answer.plain();
        assert!(text.contains("couldn't find a match"));
        assert!(text.contains("Qzxv Wrtp"));
    }

    #[tokio::test]
    async fn test_loose_name_miss_falls_back_to_title() {
        let profs = Arc::new(StubProfessors::default());
        let a = assistant(profs.clone(), Arc::default());
        let reply = a.respond("Web Programming").await;
        assert_eq!(reply.query.rule, Rule::LooseName);
        assert!(reply.answer.plain().starts_with("SOEN 287 — Web Programming"));
        assert_eq!(profs.calls.lock().unwrap().len(), 1);
    }

    #[tokio::test]
    async fn test_explicit_address_miss_does_not_fall_back() {
        let a = assistant(Arc::default(), Arc::default());
        let reply = a.respond("professor Web Programming").await;
        assert_eq!(reply.query.rule, Rule::ProfessorAddress);
        assert!(reply.answer.plain().contains("couldn't find a match"));
    }

    #[tokio::test]
    async fn test_community_found() {
        let community = Arc::new(StubCommunity {
            answer: Some("Manageable if you practice.".into()),
            ..Default::default()
        });
        let a = assistant(Arc::default(), community.clone());
        let reply = a.respond("Is SOEN 287 hard?").await;
        assert_eq!(reply.query.sentiment_topic, Some(SentimentTopic::Difficulty));
        assert!(reply.answer.plain().contains("Manageable if you practice."));
        let calls = community.calls.lock().unwrap();
        assert_eq!(
            calls.as_slice(),
            [("SOEN 287".to_string(), "Is SOEN 287 hard?".to_string(), 720)]
        );
    }

    #[tokio::test]
    async fn test_community_miss_falls_back_to_course_fact() {
        let a = assistant(Arc::default(), Arc::default());
        let reply = a.respond("Is SOEN 287 hard?").await;
        assert_eq!(reply.query.intent, Intent::CommunitySentiment);
        assert!(reply.answer.plain().starts_with("SOEN 287 — Web Programming"));
    }

    #[tokio::test]
    async fn test_community_without_course_uses_fallback() {
        let community = Arc::new(StubCommunity::default());
        let a = assistant(Arc::default(), community.clone());
        let query = Query {
            raw_text: "which semester is lighter".into(),
            intent: Intent::CommunitySentiment,
            entity: None,
            fact_topic: FactTopic::Credits,
            sentiment_topic: Some(SentimentTopic::Difficulty),
            rule: Rule::Community,
        };
        let answer = a.answer(&query).await;
        assert_eq!(community.calls.lock().unwrap()[0].0, "COMP 248");
        assert_eq!(answer.plain(), "COMP 248 is 3 credits.");
    }
}
