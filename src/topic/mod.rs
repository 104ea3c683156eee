//! Topic modeling: dictionary, LDA, coherence and the hyper-parameter sweep.

mod coherence;
mod dictionary;
mod lda;
mod sweep;
mod vis;

pub use coherence::{c_v, c_v_per_topic};
pub use dictionary::{BagOfWords, Dictionary, TokenId};
pub use lda::{LdaModel, LdaParams};
pub use sweep::{sweep, sweep_file, GridPoint, PreparedCorpus, SweepResult};

use crate::util::{create_with_backoff, ensure_parent, open_with_backoff, replace_file_atomic_backoff, tmp_path_for};
use ahash::AHashSet;
use anyhow::{Context, Result};
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

/// A trained topic model. Implementations are immutable once built.
pub trait TopicModel {
    fn num_topics(&self) -> usize;
    /// Probability of every topic for `bow` (length `num_topics`, sums to 1).
    fn document_topics(&self, bow: &BagOfWords) -> Vec<f64>;
    /// Top `topn` `(term id, weight)` pairs of `topic`, heaviest first.
    fn topic_terms(&self, topic: usize, topn: usize) -> Vec<(TokenId, f64)>;
}

/// Emit each keyword token `factor` times in place; other tokens once.
pub fn boost_keywords(tokens: &[String], keywords: &AHashSet<String>, factor: usize) -> Vec<String> {
    let mut out = Vec::with_capacity(tokens.len());
    for t in tokens {
        let n = if keywords.contains(t) { factor } else { 1 };
        out.extend(std::iter::repeat(t.clone()).take(n));
    }
    out
}

/// Index of the most probable topic; equal probabilities go to the lowest index.
pub fn dominant_topic(dist: &[f64]) -> usize {
    let mut best = 0;
    for (i, p) in dist.iter().enumerate().skip(1) {
        if *p > dist[best] {
            best = i;
        }
    }
    best
}

/// Keep purely alphabetic ASCII words.
pub fn clean_keywords<S: AsRef<str>>(words: &[S]) -> Vec<String> {
    words
        .iter()
        .map(AsRef::as_ref)
        .filter(|w| !w.is_empty() && w.bytes().all(|b| b.is_ascii_alphabetic()))
        .map(str::to_string)
        .collect()
}

/// Top `topn` term strings of `topic`.
pub fn topic_words<M: TopicModel + ?Sized>(model: &M, dictionary: &Dictionary, topic: usize, topn: usize) -> Vec<String> {
    model
        .topic_terms(topic, topn)
        .into_iter()
        .filter_map(|(id, _)| dictionary.token(id).map(str::to_string))
        .collect()
}

/// Serialize `value` as zstd-compressed JSON, promoted atomically.
pub fn write_json_zst<T: Serialize>(dest: &Path, value: &T) -> Result<()> {
    ensure_parent(dest)?;
    let tmp = tmp_path_for(dest);
    let f = create_with_backoff(&tmp, 16, 50).with_context(|| format!("create {}", tmp.display()))?;
    let mut enc = zstd::stream::write::Encoder::new(BufWriter::new(f), 3)?;
    serde_json::to_writer(&mut enc, value).with_context(|| format!("encode {}", dest.display()))?;
    let mut inner = enc.finish().with_context(|| format!("finish {}", tmp.display()))?;
    inner.flush()?;
    drop(inner);
    replace_file_atomic_backoff(&tmp, dest)
}

pub fn read_json_zst<T: DeserializeOwned>(path: &Path) -> Result<T> {
    let f = open_with_backoff(path, 16, 50).with_context(|| format!("open {}", path.display()))?;
    let dec = zstd::stream::read::Decoder::new(BufReader::new(f))?;
    serde_json::from_reader(dec).with_context(|| format!("decode {}", path.display()))
}

/// Load a persisted dictionary and rebuild its lookup index.
pub fn load_dictionary(path: &Path) -> Result<Dictionary> {
    let mut d: Dictionary = read_json_zst(path)?;
    d.reindex();
    Ok(d)
}
