use crate::schema::Record;
use std::cmp::Ordering;

/// Mean of the present values; `None` when there are none.
pub fn mean<I: IntoIterator<Item = Option<f64>>>(values: I) -> Option<f64> {
    let (mut sum, mut n) = (0.0, 0usize);
    for v in values.into_iter().flatten() {
        sum += v;
        n += 1;
    }
    (n > 0).then(|| sum / n as f64)
}

/// Mean difficulty of a group of records, skipping incomplete ones.
pub fn mean_difficulty<'a, I: IntoIterator<Item = &'a Record>>(group: I) -> Option<f64> {
    mean(group.into_iter().map(Record::difficulty_score))
}

/// Descending order on optional metrics, `None` last.
pub fn desc_option(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => y.total_cmp(&x),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

/// The `n` items with the highest metric, stable on ties (input order kept).
pub fn top_n<T, F>(items: &[T], n: usize, metric: F) -> Vec<&T>
where
    F: Fn(&T) -> Option<f64>,
{
    let mut refs: Vec<&T> = items.iter().collect();
    refs.sort_by(|a, b| desc_option(metric(a), metric(b)));
    refs.truncate(n);
    refs
}

/// Per-group question count and averages.
#[derive(Clone, Debug, PartialEq)]
pub struct GroupMetrics {
    pub name: String,
    pub total_questions: usize,
    pub average_views: Option<f64>,
    pub average_votes: Option<f64>,
    pub average_difficulty: Option<f64>,
}

/// Group `(key, record)` pairs and compute metrics per key. Groups come out
/// by descending count, ties in first-seen order.
pub fn group_metrics<'a, I>(pairs: I) -> Vec<GroupMetrics>
where
    I: IntoIterator<Item = (String, &'a Record)>,
{
    let mut groups: Vec<(String, Vec<&Record>)> = Vec::new();
    for (key, rec) in pairs {
        match groups.iter_mut().find(|(k, _)| *k == key) {
            Some((_, v)) => v.push(rec),
            None => groups.push((key, vec![rec])),
        }
    }
    let mut out: Vec<GroupMetrics> = groups
        .into_iter()
        .map(|(name, recs)| GroupMetrics {
            name,
            total_questions: recs.len(),
            average_views: mean(recs.iter().map(|r| r.views)),
            average_votes: mean(recs.iter().map(|r| r.votes)),
            average_difficulty: mean_difficulty(recs.iter().copied()),
        })
        .collect();
    out.sort_by(|a, b| b.total_questions.cmp(&a.total_questions));
    out
}

/// `(name, count, percentage of total)` rows ordered by descending count.
#[derive(Clone, Debug, PartialEq)]
pub struct ShareRow {
    pub name: String,
    pub total_questions: usize,
    pub percentage: f64,
}

pub fn shares<I: IntoIterator<Item = String>>(keys: I, total: usize) -> Vec<ShareRow> {
    let mut counts: Vec<(String, usize)> = Vec::new();
    for k in keys {
        match counts.iter_mut().find(|(n, _)| *n == k) {
            Some((_, c)) => *c += 1,
            None => counts.push((k, 1)),
        }
    }
    counts.sort_by(|a, b| b.1.cmp(&a.1));
    counts
        .into_iter()
        .map(|(name, c)| ShareRow { name, total_questions: c, percentage: percentage(c, total) })
        .collect()
}

pub fn percentage(part: usize, total: usize) -> f64 {
    if total == 0 {
        0.0
    } else {
        100.0 * part as f64 / total as f64
    }
}
