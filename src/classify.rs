//! Intent classification as a fixed-priority rule cascade.
//!
//! Each rule is a predicate over [`Signals`] that either produces a
//! [`Query`] or declines. [`classify`] tries them in order and the first
//! rule to answer wins:
//!
//! 1. course code + sentiment keyword (or "professor for X") → community sentiment
//! 2. explicit professor address ("prof Hanna") → professor lookup
//! 3. course code → course fact
//! 4. bare name shape → professor lookup
//! 5. anything else → unknown
//!
//! Reordering the rules changes routing for real inputs: a two-word course
//! title also has a name shape, and a sentiment question about a course also
//! carries a course code.

use std::collections::BTreeSet;
use tracing::debug;

use crate::extract::{self, KeywordFamily};
use crate::models::{Entity, FactTopic, Intent, Query, Rule, SentimentTopic};

/// Everything the rules look at, extracted once per turn.
#[derive(Debug, Clone)]
pub struct Signals {
    pub raw_text: String,
    pub course_code: Option<String>,
    pub keywords: BTreeSet<KeywordFamily>,
    pub looks_like_name: bool,
    pub professor_address: Option<String>,
    pub instructor_for_course: bool,
}

impl Signals {
    pub fn from_text(text: &str) -> Self {
        Self {
            raw_text: text.to_string(),
            course_code: extract::course_code(text),
            keywords: extract::keyword_families(text),
            looks_like_name: extract::looks_like_person_name(text),
            professor_address: extract::professor_address(text),
            instructor_for_course: extract::asks_instructor_for_course(text),
        }
    }

    fn query(&self, intent: Intent, entity: Option<Entity>, rule: Rule) -> Query {
        Query {
            raw_text: self.raw_text.clone(),
            intent,
            entity,
            fact_topic: fact_topic(&self.keywords),
            sentiment_topic: None,
            rule,
        }
    }
}

type RuleFn = fn(&Signals) -> Option<Query>;

const CASCADE: [RuleFn; 5] = [
    community_rule,
    professor_address_rule,
    course_fact_rule,
    loose_name_rule,
    fallthrough_rule,
];

pub fn classify(text: &str) -> Query {
    classify_signals(&Signals::from_text(text))
}

pub fn classify_signals(signals: &Signals) -> Query {
    let query = CASCADE
        .iter()
        .find_map(|rule| rule(signals))
        .unwrap_or_else(|| signals.query(Intent::Unknown, None, Rule::Fallthrough));
    debug!(
        rule = ?query.rule,
        intent = ?query.intent,
        entity = query.entity.as_ref().map(Entity::as_str),
        "classified message"
    );
    query
}

/// Rule 1.
pub fn community_rule(s: &Signals) -> Option<Query> {
    let code = s.course_code.as_ref()?;
    let sentiment = KeywordFamily::SENTIMENT
        .iter()
        .any(|f| s.keywords.contains(f));
    if !sentiment && !s.instructor_for_course {
        return None;
    }

    let topic = if s.keywords.contains(&KeywordFamily::InstructorQuality) || s.instructor_for_course
    {
        SentimentTopic::Instructor
    } else if s.keywords.contains(&KeywordFamily::Exam) {
        SentimentTopic::Exam
    } else {
        SentimentTopic::Difficulty
    };

    let mut q = s.query(
        Intent::CommunitySentiment,
        Some(Entity::CourseCode(code.clone())),
        Rule::Community,
    );
    q.sentiment_topic = Some(topic);
    Some(q)
}

/// Rule 2.
pub fn professor_address_rule(s: &Signals) -> Option<Query> {
    let name = s.professor_address.as_ref()?;
    Some(s.query(
        Intent::ProfessorLookup,
        Some(Entity::PersonName(name.clone())),
        Rule::ProfessorAddress,
    ))
}

/// Rule 3.
pub fn course_fact_rule(s: &Signals) -> Option<Query> {
    let code = s.course_code.as_ref()?;
    Some(s.query(
        Intent::CourseFact,
        Some(Entity::CourseCode(code.clone())),
        Rule::CourseFact,
    ))
}

/// Rule 4.
pub fn loose_name_rule(s: &Signals) -> Option<Query> {
    if !s.looks_like_name {
        return None;
    }
    Some(s.query(
        Intent::ProfessorLookup,
        Some(Entity::PersonName(s.raw_text.trim().to_string())),
        Rule::LooseName,
    ))
}

/// Rule 5.
pub fn fallthrough_rule(s: &Signals) -> Option<Query> {
    Some(s.query(Intent::Unknown, None, Rule::Fallthrough))
}

/// The single fact topic a message asks about, by fixed priority.
pub fn fact_topic(keywords: &BTreeSet<KeywordFamily>) -> FactTopic {
    const PRIORITY: [(KeywordFamily, FactTopic); 7] = [
        (KeywordFamily::Credits, FactTopic::Credits),
        (KeywordFamily::Prerequisite, FactTopic::Prereq),
        (KeywordFamily::Equivalence, FactTopic::Equivalent),
        (KeywordFamily::Terms, FactTopic::Terms),
        (KeywordFamily::Session, FactTopic::Session),
        (KeywordFamily::Location, FactTopic::Location),
        (KeywordFamily::Title, FactTopic::Title),
    ];
    PRIORITY
        .iter()
        .find(|(family, _)| keywords.contains(family))
        .map_or(FactTopic::Summary, |(_, topic)| *topic)
}
