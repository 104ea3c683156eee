//! Per-challenge keyword extraction with smoothed TF-IDF.
//!
//! Each challenge type is one document (all its question bodies joined).
//! Vocabulary pruning, idf smoothing and row normalization follow the usual
//! vectorizer defaults: `ln((1 + n) / (1 + df)) + 1`, raw term counts, l2 rows.

use ahash::{AHashMap, AHashSet};
use anyhow::Result;
use regex::Regex;
use tracing::warn;

/// Common English function words excluded from the vocabulary.
pub const ENGLISH_STOP_WORDS: &[&str] = &[
    "a", "about", "above", "across", "after", "afterwards", "again", "against", "all", "almost", "alone",
    "along", "already", "also", "although", "always", "am", "among", "amongst", "amoungst", "amount", "an",
    "and", "another", "any", "anyhow", "anyone", "anything", "anyway", "anywhere", "are", "around", "as",
    "at", "back", "be", "became", "because", "become", "becomes", "becoming", "been", "before",
    "beforehand", "behind", "being", "below", "beside", "besides", "between", "beyond", "bill", "both",
    "bottom", "but", "by", "call", "can", "cannot", "cant", "co", "con", "could", "couldnt", "cry", "de",
    "describe", "detail", "do", "done", "down", "due", "during", "each", "eg", "eight", "either", "eleven",
    "else", "elsewhere", "empty", "enough", "etc", "even", "ever", "every", "everyone", "everything",
    "everywhere", "except", "few", "fifteen", "fifty", "fill", "find", "fire", "first", "five", "for",
    "former", "formerly", "forty", "found", "four", "from", "front", "full", "further", "get", "give", "go",
    "had", "has", "hasnt", "have", "he", "hence", "her", "here", "hereafter", "hereby", "herein",
    "hereupon", "hers", "herself", "him", "himself", "his", "how", "however", "hundred", "i", "ie", "if",
    "in", "inc", "indeed", "interest", "into", "is", "it", "its", "itself", "keep", "last", "latter",
    "latterly", "least", "less", "ltd", "made", "many", "may", "me", "meanwhile", "might", "mill", "mine",
    "more", "moreover", "most", "mostly", "move", "much", "must", "my", "myself", "name", "namely",
    "neither", "never", "nevertheless", "next", "nine", "no", "nobody", "none", "noone", "nor", "not",
    "nothing", "now", "nowhere", "of", "off", "often", "on", "once", "one", "only", "onto", "or", "other",
    "others", "otherwise", "our", "ours", "ourselves", "out", "over", "own", "part", "per", "perhaps",
    "please", "put", "rather", "re", "same", "see", "seem", "seemed", "seeming", "seems", "serious",
    "several", "she", "should", "show", "side", "since", "sincere", "six", "sixty", "so", "some",
    "somehow", "someone", "something", "sometime", "sometimes", "somewhere", "still", "such", "system",
    "take", "ten", "than", "that", "the", "their", "them", "themselves", "then", "thence", "there",
    "thereafter", "thereby", "therefore", "therein", "thereupon", "these", "they", "thick", "thin",
    "third", "this", "those", "though", "three", "through", "throughout", "thru", "thus", "to",
    "together", "too", "top", "toward", "towards", "twelve", "twenty", "two", "un", "under", "until", "up",
    "upon", "us", "very", "via", "was", "we", "well", "were", "what", "whatever", "when", "whence",
    "whenever", "where", "whereafter", "whereas", "whereby", "wherein", "whereupon", "wherever",
    "whether", "which", "while", "whither", "who", "whoever", "whole", "whom", "whose", "why", "will",
    "with", "within", "without", "would", "yet", "you", "your", "yours", "yourself", "yourselves",
];

#[derive(Clone, Debug, PartialEq)]
pub struct TfidfOptions {
    /// Upper document-frequency bound as a fraction of the document count.
    pub max_df: f64,
    /// Lower document-frequency bound as an absolute count.
    pub min_df: usize,
    pub max_features: Option<usize>,
    /// Decimal places kept in the reported scores.
    pub round_to: i32,
}

impl Default for TfidfOptions {
    fn default() -> Self {
        Self { max_df: 0.85, min_df: 2, max_features: Some(1000), round_to: 4 }
    }
}

/// Fitted vocabulary (alphabetical) with its idf weights.
#[derive(Clone, Debug, PartialEq)]
pub struct TfidfModel {
    pub vocabulary: Vec<String>,
    pub idf: Vec<f64>,
}

/// Sparse l2-normalized row: `(feature index, weight)` sorted by index.
pub type TfidfRow = Vec<(usize, f64)>;

pub struct TfidfVectorizer {
    opts: TfidfOptions,
    token_re: Regex,
    stop: AHashSet<&'static str>,
}

impl TfidfVectorizer {
    pub fn new(opts: TfidfOptions) -> Result<Self> {
        Ok(Self { opts, token_re: Regex::new(r"\b\w\w+\b")?, stop: ENGLISH_STOP_WORDS.iter().copied().collect() })
    }

    /// Lowercased word tokens of two or more characters, stop words removed.
    pub fn tokenize(&self, text: &str) -> Vec<String> {
        let lower = text.to_lowercase();
        self.token_re
            .find_iter(&lower)
            .map(|m| m.as_str())
            .filter(|t| !self.stop.contains(t))
            .map(str::to_string)
            .collect()
    }

    /// Fit on `docs` and return the model with one weighted row per document.
    /// When the frequency bounds leave no usable vocabulary the model is empty.
    pub fn fit_transform<S: AsRef<str>>(&self, docs: &[S]) -> (TfidfModel, Vec<TfidfRow>) {
        let n = docs.len();
        let counts: Vec<AHashMap<String, u64>> = docs
            .iter()
            .map(|d| {
                let mut m: AHashMap<String, u64> = AHashMap::new();
                for t in self.tokenize(d.as_ref()) {
                    *m.entry(t).or_insert(0) += 1;
                }
                m
            })
            .collect();

        let mut df: AHashMap<&str, usize> = AHashMap::new();
        let mut tf_total: AHashMap<&str, u64> = AHashMap::new();
        for doc in &counts {
            for (t, c) in doc {
                *df.entry(t.as_str()).or_insert(0) += 1;
                *tf_total.entry(t.as_str()).or_insert(0) += c;
            }
        }

        let max_doc_count = self.opts.max_df * n as f64;
        if max_doc_count < self.opts.min_df as f64 {
            warn!(docs = n, "tf-idf: max_df bound is below min_df, no vocabulary kept");
            return (TfidfModel { vocabulary: Vec::new(), idf: Vec::new() }, vec![Vec::new(); n]);
        }

        let mut terms: Vec<&str> = df
            .iter()
            .filter(|(_, &d)| d >= self.opts.min_df && d as f64 <= max_doc_count)
            .map(|(t, _)| *t)
            .collect();
        terms.sort_unstable();
        if let Some(limit) = self.opts.max_features {
            if terms.len() > limit {
                // most frequent overall, alphabetical on ties
                terms.sort_by(|a, b| tf_total[b].cmp(&tf_total[a]).then_with(|| a.cmp(b)));
                terms.truncate(limit);
                terms.sort_unstable();
            }
        }

        let index: AHashMap<&str, usize> = terms.iter().enumerate().map(|(i, t)| (*t, i)).collect();
        let idf: Vec<f64> = terms.iter().map(|t| ((1.0 + n as f64) / (1.0 + df[t] as f64)).ln() + 1.0).collect();

        let rows = counts
            .iter()
            .map(|doc| {
                let mut row: TfidfRow = doc
                    .iter()
                    .filter_map(|(t, &c)| index.get(t.as_str()).map(|&i| (i, c as f64 * idf[i])))
                    .collect();
                row.sort_by_key(|(i, _)| *i);
                let norm = row.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
                if norm > 0.0 {
                    for (_, w) in row.iter_mut() {
                        *w /= norm;
                    }
                }
                row
            })
            .collect();

        let vocabulary = terms.into_iter().map(str::to_string).collect();
        (TfidfModel { vocabulary, idf }, rows)
    }

    fn round(&self, x: f64) -> f64 {
        let p = 10f64.powi(self.opts.round_to);
        (x * p).round() / p
    }
}

/// One reported keyword of a group.
#[derive(Clone, Debug, PartialEq)]
pub struct GroupKeyword {
    pub group: String,
    pub keyword: String,
    pub score: f64,
}

/// Top `per_group` keywords of each group. `groups` pairs a group name with
/// its joined text. Scores are ranked across all groups first (stable, so
/// ties keep group then vocabulary order) and then capped per group.
pub fn top_keywords_per_group(
    groups: &[(String, String)],
    opts: TfidfOptions,
    per_group: usize,
) -> Result<Vec<GroupKeyword>> {
    let vectorizer = TfidfVectorizer::new(opts)?;
    let texts: Vec<&str> = groups.iter().map(|(_, t)| t.as_str()).collect();
    let (model, rows) = vectorizer.fit_transform(&texts);

    let mut all: Vec<GroupKeyword> = Vec::new();
    for ((name, _), row) in groups.iter().zip(&rows) {
        for &(i, w) in row {
            all.push(GroupKeyword { group: name.clone(), keyword: model.vocabulary[i].clone(), score: vectorizer.round(w) });
        }
    }
    all.sort_by(|a, b| b.score.total_cmp(&a.score));

    let mut taken: AHashMap<String, usize> = AHashMap::new();
    Ok(all
        .into_iter()
        .filter(|k| {
            let n = taken.entry(k.group.clone()).or_insert(0);
            *n += 1;
            *n <= per_group
        })
        .collect())
}

/// Capitalize the first letter of every alphabetic run, lowercase the rest
/// ("TECHNICAL" -> "Technical", "post-quantum" -> "Post-Quantum").
pub fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_alpha = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}
