#[path = "common/mod.rs"]
mod common;

use ahash::AHashSet;
use common::*;
use qdiscourse::topic::{boost_keywords, c_v, clean_keywords, dominant_topic, load_dictionary, Dictionary, LdaModel, LdaParams};
use qdiscourse::{sweep, Alpha, LabelSets, ProgressScope, QuestionRow, SweepOptions, TopicModel};

fn toks(xs: &[&str]) -> Vec<String> {
    xs.iter().map(|s| s.to_string()).collect()
}

#[test]
fn filter_extremes_applies_both_bounds() {
    let docs = vec![toks(&["a", "b", "c"]), toks(&["a", "b"]), toks(&["a", "d"]), toks(&["a", "b"])];
    let mut d = Dictionary::from_documents(&docs);
    assert_eq!(d.len(), 4);
    assert_eq!(d.doc_freq(d.id("a").unwrap()), 4);

    // floor(0.8 * 4) = 3: "a" is too common, "c" and "d" too rare
    d.filter_extremes(2, 0.8, Some(100_000));
    assert_eq!(d.tokens(), ["b".to_string()]);
    assert_eq!(d.id("b"), Some(0));
    assert_eq!(d.doc2bow(&toks(&["b", "a", "b"])), vec![(0, 2)]);
}

#[test]
fn default_thresholds_drop_terms_in_four_of_ten_documents() {
    let opts = SweepOptions::default();
    assert_eq!((opts.no_below, opts.no_above), (5, 0.5));

    let docs: Vec<Vec<String>> = (0..10)
        .map(|i| {
            let mut d = vec![format!("only{i}")];
            if i < 4 {
                d.push("four".into());
            }
            if i < 5 {
                d.push("five".into());
            }
            if i < 6 {
                d.push("six".into());
            }
            d
        })
        .collect();
    let mut d = Dictionary::from_documents(&docs);
    d.filter_extremes(opts.no_below, opts.no_above, Some(100_000));
    // floor(0.5 * 10) = 5 is the upper bound, 5 the lower
    assert_eq!(d.tokens(), ["five".to_string()]);
}

#[test]
fn filter_bounds_are_validated() {
    assert!(SweepOptions::default().with_filter_extremes(5, 1.5).validate().is_err());
    assert!(SweepOptions::default().with_filter_extremes(2, 0.8).with_boost_factor(2).with_chunksize(50).validate().is_ok());
}

#[test]
fn keep_n_prefers_frequent_tokens_and_keeps_id_order() {
    let docs = vec![toks(&["x", "y", "z"]), toks(&["y", "z"]), toks(&["z"])];
    let mut d = Dictionary::from_documents(&docs);
    d.filter_extremes(1, 1.0, Some(2));
    assert_eq!(d.tokens(), ["y".to_string(), "z".to_string()]);
}

#[test]
fn boosted_keywords_repeat_in_place() {
    let keywords: AHashSet<String> = ["stim".to_string()].into_iter().collect();
    let out = boost_keywords(&toks(&["qubit", "stim", "gate"]), &keywords, 3);
    assert_eq!(out, toks(&["qubit", "stim", "stim", "stim", "gate"]));
}

#[test]
fn dominant_topic_ties_go_to_the_lowest_index() {
    assert_eq!(dominant_topic(&[0.2, 0.4, 0.4]), 1);
    assert_eq!(dominant_topic(&[0.5, 0.5]), 0);
}

#[test]
fn keywords_keep_only_alphabetic_words() {
    assert_eq!(clean_keywords(&["qubit", "x2", "", "gate_error", "noise"]), toks(&["qubit", "noise"]));
}

#[test]
fn alpha_parses_and_asymmetric_prior_is_normalized() {
    assert_eq!("asymmetric".parse::<Alpha>().unwrap(), Alpha::Asymmetric);
    assert_eq!("0.5".parse::<Alpha>().unwrap(), Alpha::Symmetric(0.5));
    assert!("-1".parse::<Alpha>().is_err());

    let a = Alpha::Asymmetric.values(4);
    assert!((a.iter().sum::<f64>() - 1.0).abs() < 1e-12);
    assert!(a.windows(2).all(|w| w[0] > w[1]));
}

fn two_theme_corpus() -> Vec<Vec<String>> {
    let mut docs = Vec::new();
    for _ in 0..6 {
        docs.push(toks(&["qubit", "noise", "decoher", "qubit", "noise"]));
        docs.push(toks(&["kei", "encrypt", "protocol", "kei", "encrypt"]));
    }
    docs
}

#[test]
fn lda_training_is_seeded() {
    let docs = two_theme_corpus();
    let dict = Dictionary::from_documents(&docs);
    let corpus: Vec<_> = docs.iter().map(|d| dict.doc2bow(d)).collect();
    let params = LdaParams {
        num_topics: 2,
        alpha: Alpha::Asymmetric,
        eta: 0.01,
        random_state: 7,
        chunksize: 100,
        passes: 2,
        iterations: 40,
    };
    let a = LdaModel::train(&corpus, dict.len(), &params, &ProgressScope::hidden()).unwrap();
    let b = LdaModel::train(&corpus, dict.len(), &params, &ProgressScope::hidden()).unwrap();
    for t in 0..2 {
        assert_eq!(a.topic_terms(t, 3), b.topic_terms(t, 3));
    }

    let mix = a.document_topics(&corpus[0]);
    assert_eq!(mix.len(), 2);
    assert!((mix.iter().sum::<f64>() - 1.0).abs() < 1e-9);
    assert_eq!(mix, a.document_topics(&corpus[0]));
}

#[test]
fn empty_vocabulary_is_an_error() {
    let params = LdaParams {
        num_topics: 2,
        alpha: Alpha::Symmetric(0.1),
        eta: 0.01,
        random_state: 1,
        chunksize: 10,
        passes: 1,
        iterations: 1,
    };
    assert!(LdaModel::train(&[], 0, &params, &ProgressScope::hidden()).is_err());
}

#[test]
fn coherence_is_bounded() {
    let docs = two_theme_corpus();
    let dict = Dictionary::from_documents(&docs);
    let id = |t: &str| dict.id(t).unwrap();
    let topics = vec![vec![id("qubit"), id("noise"), id("decoher")], vec![id("kei"), id("encrypt"), id("protocol")]];
    let score = c_v(&topics, &docs, &dict, 110);
    assert!(score.is_finite());
    assert!((-1.0..=1.0 + 1e-9).contains(&score));
}

fn corpus_rows() -> Vec<QuestionRow> {
    two_theme_corpus()
        .into_iter()
        .enumerate()
        .map(|(i, d)| {
            let mut q = question(&format!("question {i}"), "body");
            q.question = d.join(",");
            q
        })
        .collect()
}

#[test]
fn sweep_writes_one_directory_per_grid_point() {
    let out = temp_dir();
    let rows = corpus_rows();
    let opts = SweepOptions::default()
        .with_topic_counts(vec![2, 3])
        .with_passes(2)
        .with_iterations(20)
        .with_progress(false);
    let results = sweep(&rows, &out, &LabelSets::default(), &opts).unwrap();

    assert_eq!(results.len(), 2);
    assert_eq!(results[0].topics, 2);
    assert!(results.iter().all(|r| r.coherence.is_finite()));
    assert_eq!(column(&out.join("topics_cv.csv"), "Topics"), vec!["2", "3"]);

    let dir = out.join("2topics");
    for f in ["question_topic.csv", "topics.csv", "topic_keyword_matrix.csv", "lda_visualization.html", "model.json.zst"] {
        assert!(dir.join(f).exists(), "missing {f}");
    }
    let topics = column(&dir.join("question_topic.csv"), "Topic");
    assert_eq!(topics.len(), rows.len());
    assert!(topics.iter().all(|t| t == "0" || t == "1"));

    let dict = load_dictionary(&dir.join("dictionary.json.zst")).unwrap();
    assert!(dict.id("qubit").is_some());
}

#[test]
fn sweep_is_reproducible_with_the_same_seed() {
    let rows = corpus_rows();
    let opts = SweepOptions::default().with_topic_counts(vec![2]).with_passes(2).with_iterations(20).with_progress(false);
    let (a, b) = (temp_dir(), temp_dir());
    sweep(&rows, &a, &LabelSets::default(), &opts).unwrap();
    sweep(&rows, &b, &LabelSets::default(), &opts).unwrap();
    assert_eq!(
        column(&a.join("2topics").join("question_topic.csv"), "Topic"),
        column(&b.join("2topics").join("question_topic.csv"), "Topic")
    );
}

#[test]
fn sweep_rejects_an_empty_grid() {
    let opts = SweepOptions::default().with_topic_counts(vec![]).with_progress(false);
    assert!(sweep(&corpus_rows(), &temp_dir(), &LabelSets::default(), &opts).is_err());
}
