//! Latent Dirichlet Allocation trained by collapsed Gibbs sampling.

use super::dictionary::{BagOfWords, TokenId};
use super::TopicModel;
use crate::config::Alpha;
use crate::progress::ProgressScope;
use anyhow::{bail, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde::{Deserialize, Serialize};
use tracing::debug;

/// Sweeps used to infer the topic mix of a document against a trained model.
const FOLD_IN_SWEEPS: usize = 20;

#[derive(Clone, Debug)]
pub struct LdaParams {
    pub num_topics: usize,
    pub alpha: Alpha,
    pub eta: f64,
    pub random_state: u64,
    pub chunksize: usize,
    pub passes: usize,
    pub iterations: usize,
}

impl LdaParams {
    /// Gibbs sweeps per pass: `iterations / passes`, at least one.
    pub fn sweeps_per_pass(&self) -> usize {
        (self.iterations / self.passes.max(1)).max(1)
    }
}

/// Trained model: topic-word counts plus priors. Never mutated after training.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct LdaModel {
    num_topics: usize,
    num_terms: usize,
    alpha: Vec<f64>,
    eta: f64,
    random_state: u64,
    /// `[topic * num_terms + term]`
    topic_word: Vec<u32>,
    topic_totals: Vec<u64>,
}

/// Draw an index proportionally to `weights` (all non-negative).
fn sample(weights: &[f64], rng: &mut StdRng) -> usize {
    let total: f64 = weights.iter().sum();
    if !(total > f64::EPSILON) {
        return rng.gen_range(0..weights.len());
    }
    let mut u = rng.gen::<f64>() * total;
    for (i, w) in weights.iter().enumerate() {
        if u < *w {
            return i;
        }
        u -= w;
    }
    weights.len() - 1
}

fn expand(bow: &BagOfWords) -> Vec<TokenId> {
    bow.iter().flat_map(|&(id, n)| std::iter::repeat(id).take(n as usize)).collect()
}

impl LdaModel {
    /// Train on `corpus` over a vocabulary of `num_terms` ids.
    pub fn train(corpus: &[BagOfWords], num_terms: usize, params: &LdaParams, progress: &ProgressScope) -> Result<Self> {
        let k = params.num_topics;
        if k == 0 {
            bail!("num_topics must be at least 1");
        }
        if num_terms == 0 {
            bail!("dictionary is empty after filtering");
        }
        if !(params.eta.is_finite() && params.eta > 0.0) {
            bail!("eta must be positive, got {}", params.eta);
        }
        if let Some(bad) = corpus.iter().flatten().find(|(id, _)| *id >= num_terms) {
            bail!("token id {} out of range for vocabulary of {}", bad.0, num_terms);
        }

        let docs: Vec<Vec<TokenId>> = corpus.iter().map(expand).collect();
        let total_tokens: usize = docs.iter().map(Vec::len).sum();
        if total_tokens == 0 {
            bail!("corpus has no tokens");
        }

        let alpha = params.alpha.values(k);
        let eta = params.eta;
        let v_eta = num_terms as f64 * eta;
        let mut rng = StdRng::seed_from_u64(params.random_state);

        let mut topic_word = vec![0u32; k * num_terms];
        let mut topic_totals = vec![0u64; k];
        let mut doc_topic = vec![vec![0u32; k]; docs.len()];
        let mut z: Vec<Vec<usize>> = Vec::with_capacity(docs.len());

        for (d, doc) in docs.iter().enumerate() {
            let mut zd = Vec::with_capacity(doc.len());
            for &w in doc {
                let t = rng.gen_range(0..k);
                zd.push(t);
                doc_topic[d][t] += 1;
                topic_word[t * num_terms + w] += 1;
                topic_totals[t] += 1;
            }
            z.push(zd);
        }

        let sweeps = params.sweeps_per_pass();
        let chunk = params.chunksize.max(1);
        let mut weights = vec![0.0f64; k];
        for pass in 0..params.passes.max(1) {
            for _ in 0..sweeps {
                for (d, doc) in docs.iter().enumerate() {
                    for (i, &w) in doc.iter().enumerate() {
                        let old = z[d][i];
                        doc_topic[d][old] -= 1;
                        topic_word[old * num_terms + w] -= 1;
                        topic_totals[old] -= 1;

                        for t in 0..k {
                            let left = doc_topic[d][t] as f64 + alpha[t];
                            let right = (topic_word[t * num_terms + w] as f64 + eta) / (topic_totals[t] as f64 + v_eta);
                            weights[t] = left * right;
                        }
                        let new = sample(&weights, &mut rng);

                        z[d][i] = new;
                        doc_topic[d][new] += 1;
                        topic_word[new * num_terms + w] += 1;
                        topic_totals[new] += 1;
                    }
                    if (d + 1) % chunk == 0 {
                        debug!(pass = pass + 1, docs = d + 1, "gibbs chunk");
                    }
                }
            }
            progress.inc(1);
        }

        Ok(Self { num_topics: k, num_terms, alpha, eta, random_state: params.random_state, topic_word, topic_totals })
    }

    pub fn num_terms(&self) -> usize {
        self.num_terms
    }

    /// φ\[topic\]\[term\] = (n_tw + η) / (n_t + Vη)
    pub fn term_weight(&self, topic: usize, term: TokenId) -> f64 {
        let denom = self.topic_totals[topic] as f64 + self.num_terms as f64 * self.eta;
        (self.topic_word[topic * self.num_terms + term] as f64 + self.eta) / denom
    }
}

impl TopicModel for LdaModel {
    fn num_topics(&self) -> usize {
        self.num_topics
    }

    /// Fold the document in with φ fixed. Seeded from the model so the same
    /// document always gets the same mix, whatever order it is asked in.
    fn document_topics(&self, bow: &BagOfWords) -> Vec<f64> {
        let k = self.num_topics;
        let alpha_sum: f64 = self.alpha.iter().sum();
        let words: Vec<TokenId> = expand(bow).into_iter().filter(|w| *w < self.num_terms).collect();
        if words.is_empty() {
            return self.alpha.iter().map(|a| a / alpha_sum).collect();
        }

        let mut rng = StdRng::seed_from_u64(self.random_state);
        let mut counts = vec![0u32; k];
        let mut z = Vec::with_capacity(words.len());
        let mut weights = vec![0.0f64; k];
        for &w in &words {
            for t in 0..k {
                weights[t] = self.alpha[t] * self.term_weight(t, w);
            }
            let t = sample(&weights, &mut rng);
            counts[t] += 1;
            z.push(t);
        }
        for _ in 0..FOLD_IN_SWEEPS {
            for (i, &w) in words.iter().enumerate() {
                counts[z[i]] -= 1;
                for t in 0..k {
                    weights[t] = (counts[t] as f64 + self.alpha[t]) * self.term_weight(t, w);
                }
                let t = sample(&weights, &mut rng);
                counts[t] += 1;
                z[i] = t;
            }
        }

        let denom = words.len() as f64 + alpha_sum;
        counts.iter().zip(&self.alpha).map(|(c, a)| (*c as f64 + a) / denom).collect()
    }

    /// Highest-weight terms, ties broken by lower id.
    fn topic_terms(&self, topic: usize, topn: usize) -> Vec<(TokenId, f64)> {
        if topic >= self.num_topics {
            return Vec::new();
        }
        let mut pairs: Vec<(TokenId, f64)> = (0..self.num_terms).map(|w| (w, self.term_weight(topic, w))).collect();
        pairs.sort_by(|a, b| b.1.total_cmp(&a.1).then(a.0.cmp(&b.0)));
        pairs.truncate(topn);
        pairs
    }
}
