#[path = "common/mod.rs"]
mod common;

use common::*;
use qdiscourse::{
    difficulty_score, half_year_index, join_tokens, parse_count, parse_post_time, read_rows, split_mentions, split_tokens,
    HalfYear, QuestionRow, Record, SchemaError, QUESTION_COLUMNS,
};

#[test]
fn scraped_counts_coerce_to_numbers() {
    assert_eq!(parse_count("12"), Some(12.0));
    assert_eq!(parse_count("1,500"), Some(1500.0));
    assert_eq!(parse_count("1.2k"), Some(1200.0));
    assert_eq!(parse_count("3m"), Some(3_000_000.0));
    assert_eq!(parse_count("Viewed 1,234 times"), Some(1234.0));
    assert_eq!(parse_count(""), None);
    assert_eq!(parse_count("n/a"), None);
}

#[test]
fn difficulty_never_divides_by_zero() {
    assert_eq!(difficulty_score(100.0, 2.0, 1.0), Some(51.0));
    assert_eq!(difficulty_score(10.0, 0.0, -3.0), Some(10.0));
}

#[test]
fn record_difficulty_is_non_negative_for_unanswered_questions() {
    for answers in ["0", "-2"] {
        let mut q = question("Bell states", "how to prepare");
        q.views = "50".into();
        q.votes = "3".into();
        q.answers = answers.into();
        let score = Record::from_question(&q).difficulty_score().unwrap();
        assert!(score.is_finite() && score >= 0.0);
        assert_eq!(score, 53.0);
    }
}

#[test]
fn token_documents_round_trip() {
    let doc = vec!["qubit".to_string(), "nois".to_string()];
    assert_eq!(split_tokens(&join_tokens(&doc)), doc);
    assert!(split_tokens("").is_empty());
    assert_eq!(split_mentions("Qiskit, cirq,,"), vec!["qiskit", "cirq"]);
}

#[test]
fn post_times_in_collector_shapes() {
    let a = parse_post_time("2023-05-01 12:30:00Z").unwrap();
    let b = parse_post_time("2023-05-01T12:30:00").unwrap();
    let c = parse_post_time("2023-05-01 12:30:00 UTC").unwrap();
    assert_eq!(a, b);
    assert_eq!(b, c);
    assert_eq!(parse_post_time("1682944200"), Some(a));
    assert!(parse_post_time("2023-05-01").is_some());
    assert!(parse_post_time("yesterday").is_none());
}

#[test]
fn half_years_are_labeled_and_ordered() {
    let idx = half_year_index(2017, 2025);
    assert_eq!(idx.len(), 18);
    assert_eq!(idx[0].to_string(), "2017-H1");
    assert_eq!(idx[17], HalfYear::second(2025));
    assert_eq!("2020-H2".parse::<HalfYear>().unwrap(), HalfYear::second(2020));
    assert!("2020-H3".parse::<HalfYear>().is_err());
    assert_eq!(HalfYear::new(2020, 1), Some(HalfYear::first(2020)));
    assert_eq!(HalfYear::new(2020, 0), None);
}

#[test]
fn missing_columns_are_named() {
    let dir = temp_dir();
    let path = dir.join("master.csv");
    write_text(&path, "question_title,Question_body,Question,date,answers,votes,url\nt,b,q,,1,1,u\n");
    let err = read_rows::<QuestionRow>(&path, QUESTION_COLUMNS).unwrap_err();
    match err.downcast_ref::<SchemaError>() {
        Some(SchemaError::MissingColumn { column, .. }) => assert_eq!(column, "views"),
        None => panic!("expected a schema error, got {err:#}"),
    }
}
