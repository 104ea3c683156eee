//! C_v topic coherence: boolean sliding-window probabilities, NPMI context
//! vectors and indirect cosine confirmation over one-set segmentation.

use super::dictionary::{Dictionary, TokenId};
use ahash::AHashMap;

const EPSILON: f64 = 1e-12;

/// Window occurrence counts restricted to the words being scored.
struct Occurrences {
    n: usize,
    windows: u64,
    single: Vec<u64>,
    joint: Vec<u64>, // n * n, symmetric
}

impl Occurrences {
    fn new(n: usize) -> Self {
        Self { n, windows: 0, single: vec![0; n], joint: vec![0; n * n] }
    }

    fn record_window(&mut self, present: &[usize]) {
        self.windows += 1;
        for (a, &i) in present.iter().enumerate() {
            self.single[i] += 1;
            for &j in &present[a + 1..] {
                self.joint[i * self.n + j] += 1;
                self.joint[j * self.n + i] += 1;
            }
        }
    }

    fn p(&self, i: usize) -> f64 {
        self.single[i] as f64 / self.windows.max(1) as f64
    }

    fn p_joint(&self, i: usize, j: usize) -> f64 {
        let c = if i == j { self.single[i] } else { self.joint[i * self.n + j] };
        c as f64 / self.windows.max(1) as f64
    }

    fn npmi(&self, i: usize, j: usize) -> f64 {
        let (pi, pj) = (self.p(i), self.p(j));
        if pi == 0.0 || pj == 0.0 {
            return 0.0;
        }
        let pij = self.p_joint(i, j) + EPSILON;
        let denom = -pij.ln();
        if denom.abs() < f64::MIN_POSITIVE {
            return 0.0;
        }
        (pij / (pi * pj)).ln() / denom
    }
}

/// Slide a boolean window of `window` tokens over each text. Texts shorter
/// than the window count as a single window.
fn accumulate(texts: &[Vec<Option<usize>>], n: usize, window: usize) -> Occurrences {
    let window = window.max(1);
    let mut occ = Occurrences::new(n);
    let mut in_window = vec![0u32; n];
    let mut present: Vec<usize> = Vec::new();

    let add = |w: usize, in_window: &mut [u32], present: &mut Vec<usize>| {
        in_window[w] += 1;
        if in_window[w] == 1 {
            present.push(w);
        }
    };
    let remove = |w: usize, in_window: &mut [u32], present: &mut Vec<usize>| {
        in_window[w] -= 1;
        if in_window[w] == 0 {
            if let Some(pos) = present.iter().position(|x| *x == w) {
                present.swap_remove(pos);
            }
        }
    };

    for text in texts {
        present.clear();
        in_window.iter_mut().for_each(|c| *c = 0);
        let head = text.len().min(window);
        for w in text[..head].iter().flatten() {
            add(*w, &mut in_window, &mut present);
        }
        occ.record_window(&present);
        for end in window..text.len() {
            if let Some(w) = text[end - window] {
                remove(w, &mut in_window, &mut present);
            }
            if let Some(w) = text[end] {
                add(w, &mut in_window, &mut present);
            }
            occ.record_window(&present);
        }
    }
    occ
}

fn cosine(a: &[f64], b: &[f64]) -> f64 {
    let dot: f64 = a.iter().zip(b).map(|(x, y)| x * y).sum();
    let na = a.iter().map(|x| x * x).sum::<f64>().sqrt();
    let nb = b.iter().map(|x| x * x).sum::<f64>().sqrt();
    if na == 0.0 || nb == 0.0 {
        0.0
    } else {
        dot / (na * nb)
    }
}

/// Per-topic C_v for each list of top term ids.
pub fn c_v_per_topic(topics: &[Vec<TokenId>], texts: &[Vec<String>], dictionary: &Dictionary, window: usize) -> Vec<f64> {
    let mut slot: AHashMap<TokenId, usize> = AHashMap::new();
    for id in topics.iter().flatten() {
        let next = slot.len();
        slot.entry(*id).or_insert(next);
    }
    let n = slot.len();
    if n == 0 {
        return vec![0.0; topics.len()];
    }

    let mapped: Vec<Vec<Option<usize>>> = texts
        .iter()
        .map(|t| t.iter().map(|tok| dictionary.id(tok).and_then(|id| slot.get(&id).copied())).collect())
        .collect();
    let occ = accumulate(&mapped, n, window);

    topics
        .iter()
        .map(|ids| {
            let idx: Vec<usize> = ids.iter().filter_map(|id| slot.get(id).copied()).collect();
            if idx.is_empty() {
                return 0.0;
            }
            let vectors: Vec<Vec<f64>> = idx.iter().map(|&i| idx.iter().map(|&j| occ.npmi(i, j)).collect()).collect();
            let mut topic_vec = vec![0.0; idx.len()];
            for v in &vectors {
                for (acc, x) in topic_vec.iter_mut().zip(v) {
                    *acc += x;
                }
            }
            let sims: Vec<f64> = vectors.iter().map(|v| cosine(v, &topic_vec)).collect();
            sims.iter().sum::<f64>() / sims.len() as f64
        })
        .collect()
}

/// Mean C_v over all topics.
pub fn c_v(topics: &[Vec<TokenId>], texts: &[Vec<String>], dictionary: &Dictionary, window: usize) -> f64 {
    let per = c_v_per_topic(topics, texts, dictionary, window);
    if per.is_empty() {
        0.0
    } else {
        per.iter().sum::<f64>() / per.len() as f64
    }
}
