use super::vis::render_html;
use super::{boost_keywords, c_v, clean_keywords, dominant_topic, topic_words, write_json_zst};
use super::{BagOfWords, Dictionary, LdaModel, LdaParams, TopicModel};
use crate::config::{Alpha, SweepOptions};
use crate::csv_io::{read_rows, write_rows};
use crate::labels::LabelSets;
use crate::progress::ProgressScope;
use crate::schema::{split_tokens, QuestionRow, TopicRow, QUESTION_COLUMNS};
use crate::util::{create_with_backoff, ensure_parent, replace_file_atomic_backoff, tmp_path_for};
use anyhow::{Context, Result};
use rayon::prelude::*;
use serde::Serialize;
use std::io::Write;
use std::path::{Path, PathBuf};
use tracing::info;

/// Vocabulary cap applied after the `filter_extremes` thresholds.
const KEEP_N: usize = 100_000;
const KEYWORDS_TOPN: usize = 10;
const DOMINANT_KEYWORDS: usize = 5;

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct GridPoint {
    pub num_topics: usize,
    pub alpha: Alpha,
    pub beta: f64,
}

/// One row of `topics_cv.csv`.
#[derive(Clone, Debug, Serialize)]
pub struct SweepResult {
    #[serde(rename = "Topics")]
    pub topics: usize,
    #[serde(rename = "Alpha")]
    pub alpha: String,
    #[serde(rename = "Beta")]
    pub beta: f64,
    #[serde(rename = "Coherence")]
    pub coherence: f64,
    #[serde(skip)]
    pub dir: PathBuf,
}

#[derive(Serialize)]
struct TopicSummaryRow {
    #[serde(rename = "Topic")]
    topic: usize,
    #[serde(rename = "Keywords")]
    keywords: String,
    #[serde(rename = "Question_Count")]
    question_count: usize,
    #[serde(rename = "Coherence_Score")]
    coherence_score: f64,
}

#[derive(Serialize)]
struct KeywordWeightRow<'a> {
    #[serde(rename = "Topic")]
    topic: usize,
    #[serde(rename = "Keyword")]
    keyword: &'a str,
    #[serde(rename = "Weight")]
    weight: f64,
}

fn write_text(dest: &Path, text: &str) -> Result<()> {
    ensure_parent(dest)?;
    let tmp = tmp_path_for(dest);
    let mut f = create_with_backoff(&tmp, 16, 50).with_context(|| format!("create {}", tmp.display()))?;
    f.write_all(text.as_bytes()).with_context(|| format!("write {}", tmp.display()))?;
    drop(f);
    replace_file_atomic_backoff(&tmp, dest)
}

/// Boosted texts, filtered dictionary and bag-of-words corpus shared by every grid point.
pub struct PreparedCorpus {
    pub texts: Vec<Vec<String>>,
    pub dictionary: Dictionary,
    pub corpus: Vec<BagOfWords>,
}

impl PreparedCorpus {
    pub fn build(rows: &[QuestionRow], sets: &LabelSets, opts: &SweepOptions) -> Self {
        let texts: Vec<Vec<String>> = rows
            .iter()
            .map(|r| boost_keywords(&split_tokens(&r.question), &sets.boost_keywords, opts.boost_factor))
            .collect();
        let mut dictionary = Dictionary::from_documents(&texts);
        dictionary.filter_extremes(opts.no_below, opts.no_above, Some(KEEP_N));
        let corpus = texts.iter().map(|t| dictionary.doc2bow(t)).collect();
        info!(docs = texts.len(), tokens = dictionary.len(), "dictionary built");
        Self { texts, dictionary, corpus }
    }
}

/// Train, score and persist one grid point.
fn run_point(
    rows: &[QuestionRow],
    prepared: &PreparedCorpus,
    point: GridPoint,
    dir: &Path,
    opts: &SweepOptions,
) -> Result<SweepResult> {
    let params = LdaParams {
        num_topics: point.num_topics,
        alpha: point.alpha,
        eta: point.beta,
        random_state: opts.random_state,
        chunksize: opts.chunksize,
        passes: opts.passes,
        iterations: opts.iterations,
    };
    let k = point.num_topics;
    let pb = ProgressScope::count(opts.progress, format!("lda k={k}"), opts.passes as u64);
    let model = LdaModel::train(&prepared.corpus, prepared.dictionary.len(), &params, &pb)?;
    pb.finish(format!("lda k={k} trained"));

    let top_ids: Vec<Vec<usize>> = (0..k)
        .map(|t| model.topic_terms(t, opts.coherence_topn).into_iter().map(|(id, _)| id).collect())
        .collect();
    let coherence = c_v(&top_ids, &prepared.texts, &prepared.dictionary, opts.coherence_window);

    let topic_keywords: Vec<Vec<String>> =
        (0..k).map(|t| clean_keywords(&topic_words(&model, &prepared.dictionary, t, KEYWORDS_TOPN))).collect();

    let assignments: Vec<usize> =
        prepared.corpus.par_iter().map(|bow| dominant_topic(&model.document_topics(bow))).collect();
    let mut counts = vec![0usize; k];
    for t in &assignments {
        counts[*t] += 1;
    }

    let question_rows: Vec<TopicRow> = rows
        .iter()
        .zip(&assignments)
        .map(|(r, &t)| {
            let kw: Vec<&str> = topic_keywords[t].iter().take(DOMINANT_KEYWORDS).map(String::as_str).collect();
            TopicRow::from_question(r.clone(), t, kw.join(", "))
        })
        .collect();
    write_rows(&dir.join("question_topic.csv"), &question_rows)?;

    let summary: Vec<TopicSummaryRow> = (0..k)
        .map(|t| TopicSummaryRow {
            topic: t,
            keywords: topic_keywords[t].join(", "),
            question_count: counts[t],
            coherence_score: coherence,
        })
        .collect();
    write_rows(&dir.join("topics.csv"), &summary)?;

    let mut matrix = Vec::new();
    for t in 0..k {
        for (id, weight) in model.topic_terms(t, opts.matrix_topn) {
            if let Some(keyword) = prepared.dictionary.token(id) {
                matrix.push(KeywordWeightRow { topic: t, keyword, weight });
            }
        }
    }
    write_rows(&dir.join("topic_keyword_matrix.csv"), &matrix)?;

    write_json_zst(&dir.join("model.json.zst"), &model)?;
    write_json_zst(&dir.join("dictionary.json.zst"), &prepared.dictionary)?;
    write_json_zst(&dir.join("corpus.json.zst"), &prepared.corpus)?;
    let title = format!("LDA topics (k={k}, alpha={}, beta={})", point.alpha, point.beta);
    write_text(&dir.join("lda_visualization.html"), &render_html(&model, &prepared.dictionary, &counts, &title))?;

    info!(k, alpha = %point.alpha, beta = point.beta, coherence, "grid point saved to {}", dir.display());
    Ok(SweepResult { topics: k, alpha: point.alpha.to_string(), beta: point.beta, coherence, dir: dir.to_path_buf() })
}

/// Grid search over topic counts, alphas and betas. Every grid point writes
/// its own directory under `out_dir`; `topics_cv.csv` summarizes them.
/// The first failing grid point aborts the sweep.
pub fn sweep(rows: &[QuestionRow], out_dir: &Path, sets: &LabelSets, opts: &SweepOptions) -> Result<Vec<SweepResult>> {
    opts.validate()?;
    let prepared = PreparedCorpus::build(rows, sets, opts);

    let mut grid = Vec::new();
    for &num_topics in &opts.topic_counts {
        for &alpha in &opts.alphas {
            for &beta in &opts.betas {
                grid.push(GridPoint { num_topics, alpha, beta });
            }
        }
    }

    let pb = ProgressScope::count(opts.progress, "sweep", grid.len() as u64);
    let mut results = Vec::with_capacity(grid.len());
    for point in grid {
        let dir = out_dir.join(opts.grid_dir_name(point.num_topics, point.alpha, point.beta));
        let res = run_point(rows, &prepared, point, &dir, opts).with_context(|| {
            format!("grid point topics={} alpha={} beta={}", point.num_topics, point.alpha, point.beta)
        })?;
        results.push(res);
        pb.inc(1);
    }
    pb.finish("sweep done");

    write_rows(&out_dir.join("topics_cv.csv"), &results)?;
    Ok(results)
}

/// Read the preprocessed file and run [`sweep`].
pub fn sweep_file(input: &Path, out_dir: &Path, sets: &LabelSets, opts: &SweepOptions) -> Result<Vec<SweepResult>> {
    let rows: Vec<QuestionRow> = read_rows(input, QUESTION_COLUMNS)?;
    let results = sweep(&rows, out_dir, sets, opts)?;
    if let Some(best) = results.iter().max_by(|a, b| a.coherence.total_cmp(&b.coherence)) {
        info!(topics = best.topics, coherence = best.coherence, "best grid point: {}", best.dir.display());
    }
    Ok(results)
}
