//! One-shot question answering for `coursebot ask "<message>"`.

use anyhow::Result;
use std::sync::Arc;

use crate::assistant::{Assistant, Settings};
use crate::community::CommunitySentimentAdapter;
use crate::config::Config;
use crate::index;
use crate::professor::ProfessorRatingAdapter;

/// Wires the index and both HTTP adapters into an [`Assistant`].
pub fn build_assistant(config: &Config) -> Result<Assistant> {
    let index = Arc::new(index::open_or_build(config)?);
    Ok(Assistant::new(
        index,
        Arc::new(ProfessorRatingAdapter::new(config)?),
        Arc::new(CommunitySentimentAdapter::new(config)?),
        Settings::from(config),
    ))
}

pub async fn run_ask(config: &Config, message: &str, html: bool, explain: bool) -> Result<()> {
    let assistant = build_assistant(config)?;
    let reply = assistant.respond(message).await;

    if explain {
        println!("intent: {:?}", reply.query.intent);
        println!("rule:   {:?}", reply.query.rule);
        if let Some(entity) = &reply.query.entity {
            println!("entity: {}", entity.as_str());
        }
        if let Some(topic) = reply.query.sentiment_topic {
            println!("topic:  {}", topic.as_str());
        }
        println!();
    }

    match reply.answer.html().filter(|_| html) {
        Some(markup) => println!("{}", markup),
        None => println!("{}", reply.answer.plain()),
    }

    Ok(())
}
