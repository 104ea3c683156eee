#![allow(dead_code)]

use qdiscourse::{LabeledRow, QuestionRow, RawQuestion, TopicRow};
use std::fs;
use std::path::{Path, PathBuf};

/// Fresh temporary directory that outlives the test (kept for inspection on failure).
pub fn temp_dir() -> PathBuf {
    tempfile::tempdir().unwrap().into_path()
}

/// Write `text` to `path`, creating parents.
pub fn write_text(path: &Path, text: &str) {
    fs::create_dir_all(path.parent().unwrap()).unwrap();
    fs::write(path, text).unwrap();
}

/// All records of a headed CSV file, header first.
pub fn read_csv(path: &Path) -> Vec<Vec<String>> {
    let mut rdr = csv::ReaderBuilder::new().has_headers(false).flexible(true).from_path(path).unwrap();
    rdr.records().map(|r| r.unwrap().iter().map(str::to_string).collect()).collect()
}

/// Value of `column` in every data row.
pub fn column(path: &Path, column: &str) -> Vec<String> {
    let rows = read_csv(path);
    let idx = rows[0].iter().position(|h| h == column).unwrap_or_else(|| panic!("no column {column} in {}", path.display()));
    rows[1..].iter().map(|r| r[idx].clone()).collect()
}

pub fn raw(title: &str, text: &str, date: &str) -> RawQuestion {
    RawQuestion {
        question_title: title.into(),
        question_text: text.into(),
        date: date.into(),
        answers: "1".into(),
        views: "100".into(),
        votes: "2".into(),
        url: format!("https://example.org/q/{}", title.replace(' ', "-")),
        source: String::new(),
        comments: String::new(),
    }
}

pub fn question(title: &str, body: &str) -> QuestionRow {
    QuestionRow::from(raw(title, body, "2021-03-04 10:00:00Z"))
}

pub fn topic_row(title: &str, body: &str, topic: usize) -> TopicRow {
    TopicRow::from_question(question(title, body), topic, "qubit, noise".into())
}

/// Labeled row with explicit engagement numbers; labels start empty/unclassified.
pub fn labeled(title: &str, topic: usize, date: &str, views: &str, votes: &str, answers: &str) -> LabeledRow {
    LabeledRow {
        question_title: title.into(),
        question_body: format!("{title} body"),
        question: title.to_lowercase(),
        date: date.into(),
        answers: answers.into(),
        votes: votes.into(),
        views: views.into(),
        url: format!("https://example.org/{}", title.replace(' ', "-")),
        topic,
        dominant_keywords: "qubit, noise".into(),
        primary_stage: "Implementation".into(),
        primary_challenge: "Unclassified".into(),
        ..Default::default()
    }
}
