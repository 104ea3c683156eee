#[path = "common/mod.rs"]
mod common;

use ahash::AHashSet;
use common::*;
use qdiscourse::preprocess::{deaccent, remove_low_frequency, Lemmatizer, Tokenizer};
use qdiscourse::{preprocess_file, read_rows, split_tokens, write_rows, LabelSets, PipelineOptions, Preprocessor, QuestionRow, QUESTION_COLUMNS};

#[test]
fn tokenizer_folds_accents_and_bounds_length() {
    let t = Tokenizer::new().unwrap();
    let toks = t.tokenize("Café qubit-2 a _hidden x86 superconductingqubitarrays éé");
    assert_eq!(toks, vec!["cafe", "qubit", "ee"]);
}

#[test]
fn markup_and_code_blocks_are_removed() {
    let t = Tokenizer::new().unwrap();
    let s = t.strip_markup("<p>Why does <b>my</b> circuit fail?</p><code>qc.h(0)\nqc.cx(0, 1)</code> thanks");
    assert_eq!(s, "Why does my circuit fail? thanks");
}

#[test]
fn deaccent_keeps_base_letters() {
    assert_eq!(deaccent("Schrödinger élan"), "Schrodinger elan");
}

#[test]
fn lemmatizer_drops_closed_class_words() {
    let l = Lemmatizer::default();
    assert_eq!(l.lemmatize("the"), None);
    assert_eq!(l.lemmatize("circuits").as_deref(), Some("circuit"));
    assert_eq!(l.lemmatize("running").as_deref(), Some("run"));
    assert_eq!(l.lemmatize("matrices").as_deref(), Some("matrix"));
    assert_eq!(l.lemmatize("process").as_deref(), Some("process"));
}

#[test]
fn normalize_runs_the_whole_chain() {
    let sets = LabelSets::default();
    let pre = Preprocessor::new(&sets).unwrap();
    let doc = pre.normalize("<code>x = 1</code><p>Quantum circuits in the lab</p>");
    assert!(doc.contains(&"quantum".to_string()));
    assert!(doc.contains(&"circuit".to_string()));
    assert!(!doc.iter().any(|t| t == "in" || t == "the" || t == "x"));
}

#[test]
fn low_frequency_tokens_are_dropped_except_keywords() {
    let mut docs = vec![
        vec!["qubit".to_string(), "rare".to_string(), "stim".to_string()],
        vec!["qubit".to_string()],
    ];
    let keywords: AHashSet<String> = ["stim".to_string()].into_iter().collect();
    let removed = remove_low_frequency(&mut docs, 2, &keywords);
    assert_eq!(removed, 1);
    assert_eq!(docs[0], vec!["qubit", "stim"]);
    assert_eq!(docs[1], vec!["qubit"]);
}

#[test]
fn filtering_counts_each_step() {
    let sets = LabelSets::default();
    let pre = Preprocessor::new(&sets).unwrap();
    let rows = vec![
        question("Quantum noise in circuits", ""),
        question("Classical noise", ""),
        question("Quantum computing careers", ""),
        question("QUANTUM NOISE IN CIRCUITS", ""),
    ];
    let (out, stats) = pre.run(rows, &PipelineOptions::default().with_progress(false).with_min_token_count(1));
    assert_eq!(stats.input, 4);
    assert_eq!(stats.quantum, 3);
    assert_eq!(stats.keyword, 2);
    assert_eq!(stats.unique, 1);
    assert_eq!(out.len(), 1);
    assert_eq!(out[0].question_title, "Quantum noise in circuits");
    let tokens = split_tokens(&out[0].question);
    assert!(tokens.contains(&"circuit".to_string()));
}

#[test]
fn preprocess_file_round_trips_token_documents() {
    let dir = temp_dir();
    let input = dir.join("master.csv");
    let output = dir.join("preprocessed.csv");
    let rows = vec![
        question("Surface code decoding", "How do quantum surface code decoders handle noise?"),
        question("Surface code threshold", "Quantum surface code threshold under circuit noise"),
        question("Weather", "Not relevant at all"),
    ];
    write_rows(&input, &rows).unwrap();

    let opts = PipelineOptions::default().with_progress(false).with_min_token_count(2);
    let stats = preprocess_file(&input, &output, &LabelSets::default(), &opts).unwrap();
    assert_eq!(stats.input, 3);
    assert_eq!(stats.unique, 2);

    let out: Vec<QuestionRow> = read_rows(&output, QUESTION_COLUMNS).unwrap();
    assert_eq!(out.len(), 2);
    for row in &out {
        let tokens = split_tokens(&row.question);
        assert!(!tokens.is_empty());
        assert!(tokens.iter().all(|t| !t.is_empty() && !t.contains(',')));
        // untouched columns survive
        assert!(row.question_body.contains("surface code"));
    }
}
