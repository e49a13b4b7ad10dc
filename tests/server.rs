//! HTTP API tests. The router is served on an ephemeral port with stubbed
//! professor and community sources.

use async_trait::async_trait;
use serde_json::{json, Value};
use std::sync::Arc;

use coursebot::assistant::{Assistant, Settings};
use coursebot::community::CommunityReport;
use coursebot::index::CourseIndex;
use coursebot::models::RawCourseRow;
use coursebot::professor::{ProfessorMatch, ProfessorReport};
use coursebot::server::{router, AppState};
use coursebot::traits::{CommunityDiscussions, Lookup, ProfessorRatings};

struct KnownProfessor;

#[async_trait]
impl ProfessorRatings for KnownProfessor {
    async fn lookup(&self, name: &str) -> Lookup<ProfessorReport> {
        if name != "Aiman Hanna" {
            return Lookup::NoMatch;
        }
        Lookup::Found(ProfessorReport {
            best: ProfessorMatch {
                name: name.to_string(),
                department: Some("Computer Science".into()),
                school: Some("Concordia University".into()),
                quality: Some(4.2),
                difficulty: Some(3.1),
                would_take_again_pct: Some(85.0),
                rating_count: Some(120),
                profile_url: None,
            },
            alternates: Vec::new(),
        })
    }
}

struct NoDiscussions;

#[async_trait]
impl CommunityDiscussions for NoDiscussions {
    async fn lookup(&self, _: &str, _: &str, _: u32) -> Lookup<CommunityReport> {
        Lookup::NoMatch
    }
}

fn row(subject: &str, catalogue: &str, title: &str, credits: &str, prereq: &str) -> RawCourseRow {
    RawCourseRow {
        subject: Some(subject.into()),
        catalogue: Some(catalogue.into()),
        title: Some(title.into()),
        credits: Some(credits.into()),
        prereqdescription: Some(prereq.into()),
        ..Default::default()
    }
}

async fn spawn(rich_replies: bool) -> String {
    let (index, _) = CourseIndex::build(vec![
        row("COMP", "248", "Object-Oriented Programming I", "3", ""),
        row("COMP", "249", "Object-Oriented Programming II", "3.5", "Course Prerequisite: COMP 248"),
        row("SOEN", "287", "Web Programming", "3", "Course Prerequisite: COMP 248"),
    ]);
    let assistant = Assistant::new(
        Arc::new(index),
        Arc::new(KnownProfessor),
        Arc::new(NoDiscussions),
        Settings {
            window_days: 720,
            max_sources: 5,
            fallback_course: "COMP 248".into(),
        },
    );
    let state = AppState {
        assistant: Arc::new(assistant),
        rich_replies,
    };

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router(state)).await.unwrap();
    });
    format!("http://{}", addr)
}

async fn chat(base: &str, body: Value) -> Value {
    reqwest::Client::new()
        .post(format!("{}/api/chat", base))
        .json(&body)
        .send()
        .await
        .unwrap()
        .json()
        .await
        .unwrap()
}

#[tokio::test]
async fn test_chat_course_fact() {
    let base = spawn(true).await;
    let body = chat(&base, json!({ "message": "How many credits is COMP 248?" })).await;
    assert_eq!(body["reply"], "COMP 248 is 3 credits.");
}

#[tokio::test]
async fn test_chat_accepts_alternate_field_names() {
    let base = spawn(true).await;
    let body = chat(&base, json!({ "q": "credits for comp249" })).await;
    assert_eq!(body["reply"], "COMP 249 is 3.5 credits.");
}

#[tokio::test]
async fn test_chat_professor_rich_and_plain() {
    let base = spawn(true).await;
    let body = chat(&base, json!({ "message": "prof Aiman Hanna" })).await;
    let html = body["html"].as_str().unwrap();
    assert!(html.contains("Aiman Hanna"));
    assert!(body.get("reply").is_none());

    let body = chat(
        &base,
        json!({ "message": "prof Aiman Hanna", "format": "plain" }),
    )
    .await;
    assert!(body["reply"].as_str().unwrap().contains("Aiman Hanna"));
}

#[tokio::test]
async fn test_chat_plain_by_default_when_rich_disabled() {
    let base = spawn(false).await;
    let body = chat(&base, json!({ "message": "prof Aiman Hanna" })).await;
    assert!(body["reply"].as_str().unwrap().contains("Aiman Hanna"));

    let body = chat(&base, json!({ "message": "prof Aiman Hanna", "format": "rich" })).await;
    assert!(body["html"].is_string());
}

#[tokio::test]
async fn test_chat_malformed_body_gets_prompt() {
    let base = spawn(true).await;
    let response = reqwest::Client::new()
        .post(format!("{}/api/chat", base))
        .header("content-type", "application/json")
        .body("{not json")
        .send()
        .await
        .unwrap();
    assert_eq!(response.status(), 200);
    let body: Value = response.json().await.unwrap();
    assert!(body["reply"].as_str().unwrap().contains("Ask about a course"));
}

#[tokio::test]
async fn test_courses_search() {
    let base = spawn(true).await;
    let body: Value = reqwest::get(format!("{}/api/courses?q=web%20programming&limit=2", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    let results = body["results"].as_array().unwrap();
    assert!(!results.is_empty() && results.len() <= 2);
    assert_eq!(results[0]["code"], "SOEN 287");
    assert_eq!(results[0]["score"], 1.0);
}

#[tokio::test]
async fn test_courses_search_requires_query() {
    let base = spawn(true).await;
    let response = reqwest::get(format!("{}/api/courses?q=", base)).await.unwrap();
    assert_eq!(response.status(), 400);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"]["code"], "bad_request");
}

#[tokio::test]
async fn test_course_detail() {
    let base = spawn(true).await;
    let body: Value = reqwest::get(format!("{}/api/courses/comp-248", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["course"]["title"], "Object-Oriented Programming I");
    assert_eq!(body["unlocks"], json!(["COMP 249", "SOEN 287"]));
    assert_eq!(body["prerequisites"], json!([]));
}

#[tokio::test]
async fn test_course_detail_not_found() {
    let base = spawn(true).await;
    let response = reqwest::get(format!("{}/api/courses/COMP%20999", base))
        .await
        .unwrap();
    assert_eq!(response.status(), 404);
    let body: Value = response.json().await.unwrap();
    assert_eq!(body["error"]["code"], "not_found");
    assert!(body["error"]["message"].as_str().unwrap().contains("COMP 999"));
}

#[tokio::test]
async fn test_course_detail_bad_code() {
    let base = spawn(true).await;
    let response = reqwest::get(format!("{}/api/courses/hello", base)).await.unwrap();
    assert_eq!(response.status(), 400);
}

#[tokio::test]
async fn test_health() {
    let base = spawn(true).await;
    let body: Value = reqwest::get(format!("{}/health", base))
        .await
        .unwrap()
        .json()
        .await
        .unwrap();
    assert_eq!(body["status"], "ok");
    assert_eq!(body["courses"], 3);
}
