#[path = "common/mod.rs"]
mod common;

use common::*;
use qdiscourse::{
    classify, label_file, mentions, split_tokens, write_rows, CompiledCategories, LabelSets, Labeler, LabeledRow, PipelineOptions,
    Preprocessor, SchemaError, TopicRow,
};

#[test]
fn technical_challenge_wins_on_keyword_count() {
    let sets = LabelSets::default();
    let (primary, secondary) =
        classify("I am getting a calibration error due to qubit leakage noise", &sets.challenge_categories).unwrap();
    assert_eq!(primary, "Technical");
    assert_eq!(secondary, "");
}

#[test]
fn no_keyword_means_unclassified() {
    let sets = LabelSets::default();
    let cats = CompiledCategories::new(&sets.challenge_categories).unwrap();
    assert_eq!(cats.classify("lovely weather today"), ("Unclassified".to_string(), String::new()));
}

#[test]
fn equal_scores_go_to_the_earlier_stage() {
    let sets = LabelSets::default();
    let stages = CompiledCategories::new(&sets.lifecycle_stages).unwrap();
    // Implementation: run + circuit; Development: circuit; Learning: how to
    let (primary, secondary) = stages.classify("How to run a circuit");
    assert_eq!(primary, "Implementation");
    assert_eq!(secondary, "Development");
}

#[test]
fn keywords_match_whole_words_only() {
    let sets = LabelSets::default();
    let cats = CompiledCategories::new(&sets.challenge_categories).unwrap();
    // "errors" and "noisy" are not the keywords "error" / "noise"
    assert_eq!(cats.classify("errors everywhere, noisy").0, "Unclassified");
}

#[test]
fn mentions_keep_list_order() {
    let sets = LabelSets::default();
    assert_eq!(mentions("Cirq or Qiskit for Shor?", &sets.quantum_tools), "qiskit, cirq");
    assert_eq!(mentions("Cirq or Qiskit for Shor?", &sets.all_algorithms()), "shor");
    assert_eq!(mentions("nothing relevant", &sets.quantum_tools), "");
}

#[test]
fn labeling_is_deterministic_and_idempotent() {
    let sets = LabelSets::default();
    let labeler = Labeler::new(&sets).unwrap();
    let row = topic_row("Qiskit calibration error", "How to run a circuit", 3);

    let a = labeler.label(row.clone());
    let b = labeler.label(row);
    assert_eq!(a, b);
    assert_eq!(a.mentions_tool, "qiskit");
    assert_eq!(a.primary_challenge, "Technical");
    assert_eq!(a.primary_stage, "Implementation");
    assert_eq!(a.topic, 3);
    // (100 + 2) / (1 + 1)
    assert_eq!(a.difficulty_score, Some(51.0));
}

#[test]
fn labels_come_from_raw_text_after_preprocessing() {
    let sets = LabelSets::default();
    let pre = Preprocessor::new(&sets).unwrap();
    let rows = vec![question(
        "Quantum key distribution with Qiskit",
        "I am getting a calibration error due to qubit leakage noise in quantum key distribution",
    )];
    let (out, _) = pre.run(rows, &PipelineOptions::default().with_progress(false).with_min_token_count(1));
    assert_eq!(out.len(), 1);
    let tokens = split_tokens(&out[0].question);
    assert!(tokens.contains(&"nois".to_string()));
    assert!(!tokens.contains(&"noise".to_string()));

    let labeled = Labeler::new(&sets).unwrap().label(TopicRow::from_question(out[0].clone(), 0, String::new()));
    assert_eq!(labeled.mentions_algorithm, "quantum key distribution");
    assert_eq!(labeled.mentions_tool, "qiskit");
    assert_eq!(labeled.primary_challenge, "Technical");
    // the stemmed document is carried through untouched
    assert_eq!(labeled.question, out[0].question);
}

#[test]
fn label_file_writes_every_row() {
    let dir = temp_dir();
    let input = dir.join("question_topic.csv");
    let output = dir.join("labeled.csv");
    let rows = vec![
        topic_row("Qiskit calibration error", "noise on hardware", 0),
        topic_row("Grover tutorial", "what is amplitude amplification", 1),
    ];
    write_rows(&input, &rows).unwrap();

    let sets = LabelSets::default();
    let n = label_file(&input, &output, &sets, &PipelineOptions::default().with_progress(false)).unwrap();
    assert_eq!(n, 2);

    let labeled: Vec<LabeledRow> = qdiscourse::read_rows(&output, qdiscourse::LABELED_COLUMNS).unwrap();
    assert_eq!(labeled.len(), 2);
    assert_eq!(labeled[0].mentions_tool, "qiskit");
    assert_eq!(labeled[1].mentions_algorithm, "grover, amplitude amplification");
    assert_eq!(labeled[1].primary_stage, "Learning");
}

#[test]
fn missing_topic_column_fails_before_writing() {
    let dir = temp_dir();
    let input = dir.join("question_topic.csv");
    let output = dir.join("labeled.csv");
    write_text(&input, "question_title,Question_body,Question,date,answers,votes,views,url\nt,b,q,,1,1,1,u\n");

    let err = label_file(&input, &output, &LabelSets::default(), &PipelineOptions::default().with_progress(false)).unwrap_err();
    match err.downcast_ref::<SchemaError>() {
        Some(SchemaError::MissingColumn { column, .. }) => assert_eq!(column, "Topic"),
        None => panic!("expected a schema error, got {err:#}"),
    }
    assert!(!output.exists());
}
