//! Typed rows exchanged between stages through CSV files, plus the numeric
//! coercion rules every stage shares. Column names match the files the
//! existing study datasets use, so they load unchanged.

use crate::date::parse_post_time;
use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// Schema violations are the only input errors that abort a stage.
#[derive(Debug, thiserror::Error)]
pub enum SchemaError {
    #[error("{path}: missing required column `{column}`")]
    MissingColumn { column: String, path: String },
}

/// Columns a collector output file must carry.
pub const RAW_COLUMNS: &[&str] = &["question_title", "question_text", "date", "answers", "views", "votes", "url"];
/// Columns of the master / preprocessed question file.
pub const QUESTION_COLUMNS: &[&str] = &["question_title", "Question_body", "Question", "date", "answers", "votes", "views", "url"];
/// Columns added by the topic sweep.
pub const TOPIC_COLUMNS: &[&str] = &[
    "question_title", "Question_body", "Question", "date", "answers", "votes", "views", "url", "Topic", "Dominant_Keywords",
];
/// Columns the reporters rely on.
pub const LABELED_COLUMNS: &[&str] = &[
    "question_title", "Question_body", "date", "answers", "votes", "views", "Topic",
    "Mentions_Tool", "Mentions_Algorithm", "Primary_Stage", "Primary_Challenge",
];

/// One scraped question as the collectors write it. Numeric fields stay as
/// scraped text ("1.2k", "3,400") until a later stage coerces them.
/// Aliases accept the Reddit export layout (title/text/score/num_comments/time).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawQuestion {
    #[serde(alias = "title")]
    pub question_title: String,
    #[serde(alias = "text", default)]
    pub question_text: String,
    #[serde(alias = "time", default)]
    pub date: String,
    #[serde(alias = "num_comments", default)]
    pub answers: String,
    #[serde(default)]
    pub views: String,
    #[serde(alias = "score", default)]
    pub votes: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub source: String,
    /// Reddit only: top comment bodies joined with " | ".
    #[serde(default)]
    pub comments: String,
}

/// Row of the master file and of the preprocessed file. After preprocessing,
/// `question` holds the comma-joined token document.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct QuestionRow {
    pub question_title: String,
    #[serde(rename = "Question_body")]
    pub question_body: String,
    #[serde(rename = "Question")]
    pub question: String,
    pub date: String,
    pub answers: String,
    pub votes: String,
    pub views: String,
    pub url: String,
    #[serde(default)]
    pub source: String,
}

impl From<RawQuestion> for QuestionRow {
    fn from(r: RawQuestion) -> Self {
        let question = format!("{} {}", r.question_title.trim(), r.question_text.trim()).trim().to_string();
        Self {
            question_title: r.question_title,
            question_body: r.question_text,
            question,
            date: r.date,
            answers: r.answers,
            votes: r.votes,
            views: r.views,
            url: r.url,
            source: r.source,
        }
    }
}

/// Row of `question_topic.csv`: a question plus its dominant topic.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TopicRow {
    pub question_title: String,
    #[serde(rename = "Question_body")]
    pub question_body: String,
    #[serde(rename = "Question")]
    pub question: String,
    pub date: String,
    pub answers: String,
    pub votes: String,
    pub views: String,
    pub url: String,
    #[serde(default)]
    pub source: String,
    #[serde(rename = "Topic")]
    pub topic: usize,
    #[serde(rename = "Dominant_Keywords")]
    pub dominant_keywords: String,
}

impl TopicRow {
    pub fn from_question(q: QuestionRow, topic: usize, dominant_keywords: String) -> Self {
        Self {
            question_title: q.question_title,
            question_body: q.question_body,
            question: q.question,
            date: q.date,
            answers: q.answers,
            votes: q.votes,
            views: q.views,
            url: q.url,
            source: q.source,
            topic,
            dominant_keywords,
        }
    }
}

/// Fully labeled row consumed by the reporters.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct LabeledRow {
    pub question_title: String,
    #[serde(rename = "Question_body")]
    pub question_body: String,
    #[serde(rename = "Question", default)]
    pub question: String,
    pub date: String,
    pub answers: String,
    pub votes: String,
    pub views: String,
    #[serde(default)]
    pub url: String,
    #[serde(default)]
    pub source: String,
    #[serde(rename = "Topic")]
    pub topic: usize,
    #[serde(rename = "Dominant_Keywords", default)]
    pub dominant_keywords: String,
    #[serde(rename = "Mentions_Tool")]
    pub mentions_tool: String,
    #[serde(rename = "Mentions_Algorithm")]
    pub mentions_algorithm: String,
    #[serde(rename = "Primary_Stage")]
    pub primary_stage: String,
    #[serde(rename = "Secondary_Stage", default)]
    pub secondary_stage: String,
    #[serde(rename = "Primary_Challenge")]
    pub primary_challenge: String,
    #[serde(rename = "Secondary_Challenge", default)]
    pub secondary_challenge: String,
    #[serde(default)]
    pub difficulty_score: Option<f64>,
}

/// Numeric view of a question used by labeler and reporters.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub title: String,
    pub body: String,
    pub question: String,
    pub votes: Option<f64>,
    pub views: Option<f64>,
    pub answers: Option<f64>,
    pub posted: Option<OffsetDateTime>,
    pub url: String,
    pub source: String,
}

impl Record {
    pub fn from_question(q: &QuestionRow) -> Self {
        Self {
            title: q.question_title.clone(),
            body: q.question_body.clone(),
            question: q.question.clone(),
            votes: parse_count(&q.votes),
            views: parse_count(&q.views),
            answers: parse_count(&q.answers),
            posted: parse_post_time(&q.date),
            url: q.url.clone(),
            source: q.source.clone(),
        }
    }

    pub fn from_labeled(r: &LabeledRow) -> Self {
        Self {
            title: r.question_title.clone(),
            body: r.question_body.clone(),
            question: r.question.clone(),
            votes: parse_count(&r.votes),
            views: parse_count(&r.views),
            answers: parse_count(&r.answers),
            posted: parse_post_time(&r.date),
            url: r.url.clone(),
            source: r.source.clone(),
        }
    }

    pub fn difficulty_score(&self) -> Option<f64> {
        difficulty_score(self.views?, self.votes?, self.answers?)
    }
}

/// `(views + votes) / (answers + 1)`. Negative answer counts are clamped to 0
/// so the denominator is never below 1.
pub fn difficulty_score(views: f64, votes: f64, answers: f64) -> Option<f64> {
    let score = (views + votes) / (answers.max(0.0) + 1.0);
    score.is_finite().then_some(score)
}

/// Coerce a scraped count ("12", "1,500", "1.2k", "3m", "Viewed 1,234 times")
/// to a number; anything unparseable becomes `None`.
pub fn parse_count(raw: &str) -> Option<f64> {
    let mut s = raw.trim().to_lowercase().replace(',', "");
    if let Some(rest) = s.strip_prefix("viewed") {
        s = rest.trim().to_string();
    }
    for suffix in [" times", " views", " answers", " votes", " time", " view", " answer", " vote"] {
        if let Some(rest) = s.strip_suffix(suffix) {
            s = rest.trim().to_string();
            break;
        }
    }
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    let (num, mult) = if let Some(n) = s.strip_suffix('k') {
        (n, 1_000.0)
    } else if let Some(n) = s.strip_suffix('m') {
        (n, 1_000_000.0)
    } else {
        (s, 1.0)
    };
    let v = num.trim().parse::<f64>().ok()? * mult;
    v.is_finite().then_some(v)
}

/// Serialize a token document for persistence.
pub fn join_tokens(tokens: &[String]) -> String {
    tokens.join(",")
}

/// Inverse of [`join_tokens`]: the empty string is the empty document.
pub fn split_tokens(s: &str) -> Vec<String> {
    if s.is_empty() {
        return Vec::new();
    }
    s.split(',').map(str::to_string).collect()
}

/// Split a ", "-joined mention list back into its items.
pub fn split_mentions(s: &str) -> Vec<String> {
    s.split(',').map(|x| x.trim().to_lowercase()).filter(|x| !x.is_empty()).collect()
}
