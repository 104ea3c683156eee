use ahash::{AHashMap, AHashSet};
use serde::{Deserialize, Serialize};

pub type TokenId = usize;
/// Sparse document: `(token id, count)` sorted by id.
pub type BagOfWords = Vec<(TokenId, u32)>;

/// Token <-> id mapping with document frequencies.
///
/// Ids are assigned in first-seen order and re-compacted (order preserved)
/// whenever tokens are filtered out.
#[derive(Clone, Debug, Default, Serialize, Deserialize)]
pub struct Dictionary {
    tokens: Vec<String>,
    dfs: Vec<usize>,
    num_docs: usize,
    num_pos: usize,
    #[serde(skip)]
    index: AHashMap<String, TokenId>,
}

impl Dictionary {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_documents<D: AsRef<[String]>>(docs: &[D]) -> Self {
        let mut d = Self::new();
        for doc in docs {
            d.add_document(doc.as_ref());
        }
        d
    }

    pub fn add_document(&mut self, doc: &[String]) {
        self.num_docs += 1;
        self.num_pos += doc.len();
        let mut seen_here: AHashSet<TokenId> = AHashSet::new();
        for tok in doc {
            let id = match self.index.get(tok) {
                Some(&id) => id,
                None => {
                    let id = self.tokens.len();
                    self.tokens.push(tok.clone());
                    self.dfs.push(0);
                    self.index.insert(tok.clone(), id);
                    id
                }
            };
            if seen_here.insert(id) {
                self.dfs[id] += 1;
            }
        }
    }

    /// Keep tokens present in at least `no_below` documents and in at most
    /// `floor(no_above * num_docs)` documents, then optionally the `keep_n`
    /// most frequent of those.
    pub fn filter_extremes(&mut self, no_below: usize, no_above: f64, keep_n: Option<usize>) {
        let no_above_abs = (no_above * self.num_docs as f64).floor() as usize;
        let mut good: Vec<TokenId> = (0..self.tokens.len())
            .filter(|&id| self.dfs[id] >= no_below && self.dfs[id] <= no_above_abs)
            .collect();
        if let Some(n) = keep_n {
            if good.len() > n {
                let mut by_df = good.clone();
                by_df.sort_by(|a, b| self.dfs[*b].cmp(&self.dfs[*a]).then(a.cmp(b)));
                by_df.truncate(n);
                by_df.sort_unstable();
                good = by_df;
            }
        }
        self.retain_ids(&good);
    }

    fn retain_ids(&mut self, keep_sorted: &[TokenId]) {
        let tokens = keep_sorted.iter().map(|&id| self.tokens[id].clone()).collect();
        let dfs = keep_sorted.iter().map(|&id| self.dfs[id]).collect();
        self.tokens = tokens;
        self.dfs = dfs;
        self.reindex();
    }

    /// Rebuild the token -> id index (after deserialization).
    pub fn reindex(&mut self) {
        self.index = self.tokens.iter().enumerate().map(|(i, t)| (t.clone(), i)).collect();
    }

    pub fn doc2bow(&self, doc: &[String]) -> BagOfWords {
        let mut counts: AHashMap<TokenId, u32> = AHashMap::new();
        for tok in doc {
            if let Some(&id) = self.index.get(tok) {
                *counts.entry(id).or_insert(0) += 1;
            }
        }
        let mut bow: BagOfWords = counts.into_iter().collect();
        bow.sort_unstable_by_key(|(id, _)| *id);
        bow
    }

    pub fn len(&self) -> usize {
        self.tokens.len()
    }
    pub fn is_empty(&self) -> bool {
        self.tokens.is_empty()
    }
    pub fn num_docs(&self) -> usize {
        self.num_docs
    }
    pub fn id(&self, token: &str) -> Option<TokenId> {
        self.index.get(token).copied()
    }
    pub fn token(&self, id: TokenId) -> Option<&str> {
        self.tokens.get(id).map(String::as_str)
    }
    pub fn doc_freq(&self, id: TokenId) -> usize {
        self.dfs.get(id).copied().unwrap_or(0)
    }
    pub fn tokens(&self) -> &[String] {
        &self.tokens
    }
}
