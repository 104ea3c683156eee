//! Relevance filtering and token normalization of the master question file.

mod lemma;
mod stopwords;
mod tokenize;

pub use lemma::Lemmatizer;
pub use stopwords::{build_stopwords, ENGLISH_STOPWORDS};
pub use tokenize::{deaccent, Tokenizer, MAX_TOKEN_LEN, MIN_TOKEN_LEN};

use crate::config::PipelineOptions;
use crate::csv_io::{read_rows, write_rows};
use crate::labels::LabelSets;
use crate::progress::ProgressScope;
use crate::schema::{join_tokens, QuestionRow, QUESTION_COLUMNS};
use ahash::{AHashMap, AHashSet};
use anyhow::Result;
use rayon::prelude::*;
use rust_stemmers::{Algorithm, Stemmer};
use std::path::Path;
use tracing::info;

/// Row counts after each filtering step.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PreprocessStats {
    pub input: usize,
    pub quantum: usize,
    pub keyword: usize,
    pub unique: usize,
    pub low_frequency_tokens: usize,
}

pub struct Preprocessor<'a> {
    sets: &'a LabelSets,
    tokenizer: Tokenizer,
    lemmatizer: Lemmatizer,
    stemmer: Stemmer,
    stopwords: AHashSet<String>,
}

impl<'a> Preprocessor<'a> {
    pub fn new(sets: &'a LabelSets) -> Result<Self> {
        Ok(Self {
            sets,
            tokenizer: Tokenizer::new()?,
            lemmatizer: Lemmatizer::default(),
            stemmer: Stemmer::create(Algorithm::English),
            stopwords: build_stopwords(sets),
        })
    }

    /// Lowercased text mentions "quantum" (any suffix) and at least one curated keyword.
    pub fn is_relevant(&self, lower: &str) -> bool {
        lower.contains("quantum") && self.sets.filter_keywords.iter().any(|kw| lower.contains(kw.as_str()))
    }

    /// Markup removal, tokenization, lemmatization, stemming and stopword removal.
    pub fn normalize(&self, text: &str) -> Vec<String> {
        let stripped = self.tokenizer.strip_markup(text);
        let tokens = self.tokenizer.tokenize(&stripped);
        self.lemmatizer
            .lemmatize_all(&tokens)
            .into_iter()
            .map(|t| self.stemmer.stem(&t).into_owned())
            .filter(|t| !self.stopwords.contains(t))
            .collect()
    }

    /// Run every step over `rows`; returns the kept rows with `question`
    /// replaced by the comma-joined tokens.
    pub fn run(&self, rows: Vec<QuestionRow>, opts: &PipelineOptions) -> (Vec<QuestionRow>, PreprocessStats) {
        let mut stats = PreprocessStats { input: rows.len(), ..Default::default() };

        let mut lowered: Vec<(QuestionRow, String)> = rows
            .into_iter()
            .map(|r| {
                let lower = r.question.to_lowercase();
                (r, lower)
            })
            .filter(|(_, lower)| lower.contains("quantum"))
            .collect();
        stats.quantum = lowered.len();

        lowered.retain(|(_, lower)| self.is_relevant(lower));
        stats.keyword = lowered.len();

        let mut seen: AHashSet<String> = AHashSet::with_capacity(lowered.len());
        lowered.retain(|(_, lower)| seen.insert(lower.clone()));
        stats.unique = lowered.len();

        let pb = ProgressScope::count(opts.progress, "preprocess", lowered.len() as u64);
        let mut docs: Vec<Vec<String>> = lowered
            .par_iter()
            .map(|(_, lower)| {
                let d = self.normalize(lower);
                pb.inc(1);
                d
            })
            .collect();
        pb.finish("normalized");

        stats.low_frequency_tokens = remove_low_frequency(&mut docs, opts.min_token_count, &self.sets.filter_keywords);

        let out = lowered
            .into_iter()
            .zip(docs)
            .map(|((mut row, _), doc)| {
                row.question = join_tokens(&doc);
                row
            })
            .collect();
        (out, stats)
    }
}

/// Drop tokens whose corpus-wide count is below `threshold`, except keywords.
/// Returns the number of distinct tokens removed.
pub fn remove_low_frequency(docs: &mut [Vec<String>], threshold: usize, keywords: &AHashSet<String>) -> usize {
    let mut freq: AHashMap<&str, usize> = AHashMap::new();
    for doc in docs.iter() {
        for w in doc {
            *freq.entry(w.as_str()).or_insert(0) += 1;
        }
    }
    let low: AHashSet<String> = freq
        .into_iter()
        .filter(|(w, c)| *c < threshold && !keywords.contains(*w))
        .map(|(w, _)| w.to_string())
        .collect();
    if low.is_empty() {
        return 0;
    }
    for doc in docs.iter_mut() {
        doc.retain(|w| !low.contains(w));
    }
    low.len()
}

/// Read the master file, preprocess it and write the result.
pub fn preprocess_file(input: &Path, output: &Path, sets: &LabelSets, opts: &PipelineOptions) -> Result<PreprocessStats> {
    opts.install_thread_pool();
    let rows: Vec<QuestionRow> = read_rows(input, QUESTION_COLUMNS)?;
    let pre = Preprocessor::new(sets)?;
    let (out, stats) = pre.run(rows, opts);
    write_rows(output, &out)?;
    info!(
        input = stats.input,
        quantum = stats.quantum,
        keyword = stats.keyword,
        unique = stats.unique,
        dropped_tokens = stats.low_frequency_tokens,
        "preprocessed {} -> {}",
        input.display(),
        output.display()
    );
    Ok(stats)
}
