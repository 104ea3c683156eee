use crate::csv_io::CsvSink;
use crate::schema::{LabeledRow, Record};
use anyhow::Result;
use std::path::{Path, PathBuf};

/// Metric a per-topic ranking is ordered by.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TopMetric {
    Views,
    Votes,
    Difficulty,
}

impl TopMetric {
    pub const ALL: [TopMetric; 3] = [TopMetric::Views, TopMetric::Votes, TopMetric::Difficulty];

    pub fn file_name(self) -> &'static str {
        match self {
            TopMetric::Views => "top_5_most_viewed.csv",
            TopMetric::Votes => "top_5_most_voted.csv",
            TopMetric::Difficulty => "top_5_most_difficult.csv",
        }
    }

    fn score(self, r: &Record) -> Option<f64> {
        match self {
            TopMetric::Views => r.views,
            TopMetric::Votes => r.votes,
            TopMetric::Difficulty => r.difficulty_score(),
        }
    }
}

/// One ranked question.
#[derive(Clone, Debug, PartialEq)]
pub struct TopQuestion<'a> {
    pub row: &'a LabeledRow,
    pub score: f64,
}

/// The `per_topic` best questions of each topic by `metric`, topics ascending.
/// Rows missing any of answers, votes or views are left out entirely.
pub fn top_per_topic<'a>(rows: &'a [LabeledRow], records: &[Record], metric: TopMetric, per_topic: usize) -> Vec<TopQuestion<'a>> {
    let mut ranked: Vec<TopQuestion<'a>> = rows
        .iter()
        .zip(records)
        .filter(|(_, r)| r.views.is_some() && r.votes.is_some() && r.answers.is_some())
        .filter_map(|(row, r)| metric.score(r).map(|score| TopQuestion { row, score }))
        .collect();
    ranked.sort_by(|a, b| a.row.topic.cmp(&b.row.topic).then_with(|| b.score.total_cmp(&a.score)));

    let mut out = Vec::new();
    let mut current: Option<(usize, usize)> = None; // (topic, taken)
    for q in ranked {
        let taken = match current {
            Some((t, n)) if t == q.row.topic => n,
            _ => 0,
        };
        if taken < per_topic {
            current = Some((q.row.topic, taken + 1));
            out.push(q);
        } else {
            current = Some((q.row.topic, taken));
        }
    }
    out
}

pub fn write_top_questions(dest: &Path, top: &[TopQuestion<'_>]) -> Result<PathBuf> {
    let mut sink = CsvSink::create(dest)?;
    sink.write_record(["Topic", "Dominant_Keywords", "Question", "question_title", "Question_body", "Score", "url"])?;
    for q in top {
        let r = q.row;
        sink.write_record([
            r.topic.to_string(),
            r.dominant_keywords.clone(),
            r.question.clone(),
            r.question_title.clone(),
            r.question_body.clone(),
            q.score.to_string(),
            r.url.clone(),
        ])?;
    }
    sink.finish()
}
