//! Tool/algorithm mention detection and challenge/lifecycle classification.

use crate::config::PipelineOptions;
use crate::csv_io::{read_rows, write_rows};
use crate::labels::{Category, LabelSets};
use crate::progress::ProgressScope;
use crate::schema::{LabeledRow, Record, TopicRow, TOPIC_COLUMNS};
use anyhow::{Context, Result};
use rayon::prelude::*;
use regex::Regex;
use std::path::Path;
use tracing::info;

pub const UNCLASSIFIED: &str = "Unclassified";

/// Every term of `terms` that occurs in `text` (case-insensitive substring),
/// in list order, joined with ", ". Empty when nothing matches.
pub fn mentions(text: &str, terms: &[String]) -> String {
    let lower = text.to_lowercase();
    terms
        .iter()
        .filter(|t| lower.contains(t.as_str()))
        .map(String::as_str)
        .collect::<Vec<_>>()
        .join(", ")
}

/// Whole-word keyword regexes per category, compiled once.
pub struct CompiledCategories {
    cats: Vec<(String, Vec<Regex>)>,
}

impl CompiledCategories {
    pub fn new(categories: &[Category]) -> Result<Self> {
        let mut cats = Vec::with_capacity(categories.len());
        for c in categories {
            let mut res = Vec::with_capacity(c.keywords.len());
            for kw in &c.keywords {
                let pat = format!(r"\b{}\b", regex::escape(&kw.to_lowercase()));
                res.push(Regex::new(&pat).with_context(|| format!("keyword `{kw}` of `{}`", c.name))?);
            }
            cats.push((c.name.clone(), res));
        }
        Ok(Self { cats })
    }

    /// Number of keywords per category with at least one match, in category order.
    pub fn scores(&self, text: &str) -> Vec<(&str, usize)> {
        let lower = text.to_lowercase();
        self.cats
            .iter()
            .map(|(name, res)| (name.as_str(), res.iter().filter(|re| re.is_match(&lower)).count()))
            .collect()
    }

    /// `(primary, secondary)`. Ties go to the earlier category;
    /// secondary is empty unless a second category scored.
    pub fn classify(&self, text: &str) -> (String, String) {
        let mut scored: Vec<(&str, usize)> = self.scores(text).into_iter().filter(|(_, n)| *n > 0).collect();
        // stable: equal counts keep category order
        scored.sort_by(|a, b| b.1.cmp(&a.1));
        match scored.as_slice() {
            [] => (UNCLASSIFIED.to_string(), String::new()),
            [(p, _)] => (p.to_string(), String::new()),
            [(p, _), (s, _), ..] => (p.to_string(), s.to_string()),
        }
    }
}

/// One-off classification; prefer [`CompiledCategories`] for repeated use.
pub fn classify(text: &str, categories: &[Category]) -> Result<(String, String)> {
    Ok(CompiledCategories::new(categories)?.classify(text))
}

/// Applies every labeling rule to topic-assigned rows.
pub struct Labeler<'a> {
    sets: &'a LabelSets,
    algorithms: Vec<String>,
    challenges: CompiledCategories,
    stages: CompiledCategories,
}

impl<'a> Labeler<'a> {
    pub fn new(sets: &'a LabelSets) -> Result<Self> {
        Ok(Self {
            sets,
            algorithms: sets.all_algorithms(),
            challenges: CompiledCategories::new(&sets.challenge_categories).context("compile challenge categories")?,
            stages: CompiledCategories::new(&sets.lifecycle_stages).context("compile lifecycle stages")?,
        })
    }

    /// Tools, algorithms and challenges are matched over the raw title and
    /// body, lifecycle stages over the body alone. `question` holds stemmed
    /// tokens by now and is never matched.
    pub fn label(&self, row: TopicRow) -> LabeledRow {
        let text = format!("{} {}", row.question_title, row.question_body);
        let mentions_tool = mentions(&text, &self.sets.quantum_tools);
        let mentions_algorithm = mentions(&text, &self.algorithms);
        let (primary_challenge, secondary_challenge) = self.challenges.classify(&text);
        let (primary_stage, secondary_stage) = self.stages.classify(&row.question_body);

        let mut out = LabeledRow {
            question_title: row.question_title,
            question_body: row.question_body,
            question: row.question,
            date: row.date,
            answers: row.answers,
            votes: row.votes,
            views: row.views,
            url: row.url,
            source: row.source,
            topic: row.topic,
            dominant_keywords: row.dominant_keywords,
            mentions_tool,
            mentions_algorithm,
            primary_stage,
            secondary_stage,
            primary_challenge,
            secondary_challenge,
            difficulty_score: None,
        };
        out.difficulty_score = Record::from_labeled(&out).difficulty_score();
        out
    }

    /// Label all rows in parallel; output order matches input order.
    pub fn label_rows(&self, rows: Vec<TopicRow>, progress: &ProgressScope) -> Vec<LabeledRow> {
        rows.into_par_iter()
            .map(|r| {
                let l = self.label(r);
                progress.inc(1);
                l
            })
            .collect()
    }
}

/// Read `question_topic.csv`, label every row and write the labeled file.
/// A missing required column aborts before anything is written.
pub fn label_file(input: &Path, output: &Path, sets: &LabelSets, opts: &PipelineOptions) -> Result<usize> {
    opts.install_thread_pool();
    let rows: Vec<TopicRow> = read_rows(input, TOPIC_COLUMNS)?;
    let labeler = Labeler::new(sets)?;
    let pb = ProgressScope::count(opts.progress, "label", rows.len() as u64);
    let labeled = labeler.label_rows(rows, &pb);
    pb.finish("labeled");

    let n = labeled.len();
    write_rows(output, &labeled)?;
    info!(rows = n, "labeled {} -> {}", input.display(), output.display());
    Ok(n)
}
