#[path = "common/mod.rs"]
mod common;

use common::*;
use qdiscourse::{discover_raw_files, merge_dir, merge_rows, read_rows, write_rows, QuestionRow, SchemaError, QUESTION_COLUMNS};

#[test]
fn duplicates_keep_the_first_occurrence() {
    let (rows, dupes) = merge_rows(vec![
        raw("Bell states", "how to prepare", "2020-01-01"),
        raw("Bell states", "how to prepare", "2021-01-01"),
        raw("GHZ states", "", "2022-01-01"),
    ]);
    assert_eq!(dupes, 1);
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].question, "Bell states how to prepare");
    assert_eq!(rows[0].date, "2020-01-01");
    assert_eq!(rows[1].question, "GHZ states");
}

#[test]
fn discovery_skips_hidden_files_other_extensions_and_the_output() {
    let dir = temp_dir();
    for name in ["b.csv", "a.CSV", ".hidden.csv", "notes.txt", "master.csv"] {
        write_text(&dir.join(name), "question_title,question_text\n");
    }
    write_text(&dir.join("nested").join("c.csv"), "question_title,question_text\n");

    let files = discover_raw_files(&dir, Some(dir.join("master.csv").as_path()));
    assert_eq!(files, vec![dir.join("a.CSV"), dir.join("b.csv")]);
}

#[test]
fn merge_dir_combines_site_and_reddit_layouts() {
    let dir = temp_dir();
    write_rows(&dir.join("qcse.csv"), &[raw("Surface code", "threshold?", "2023-05-01 12:30:00Z"), raw("Stim", "sampling", "")]).unwrap();
    write_text(
        &dir.join("reddit.csv"),
        "title,text,time,score,num_comments,url\nQiskit on M1?,it fails,2023-11-14 22:13:20 UTC,12,3,https://r/x\nStim,sampling,,1,0,https://r/y\n",
    );
    let out = dir.join("master.csv");
    let stats = merge_dir(&dir, &out).unwrap();
    assert_eq!(stats.files, 2);
    assert_eq!(stats.rows, 4);
    assert_eq!(stats.duplicates, 1);

    let rows: Vec<QuestionRow> = read_rows(&out, QUESTION_COLUMNS).unwrap();
    assert_eq!(rows.len(), 3);
    let reddit = rows.iter().find(|r| r.question_title == "Qiskit on M1?").unwrap();
    assert_eq!(reddit.votes, "12");
    assert_eq!(reddit.answers, "3");
    assert_eq!(reddit.source, "reddit");
    assert_eq!(reddit.question_body, "it fails");
}

#[test]
fn merge_fails_fast_on_a_file_without_question_text() {
    let dir = temp_dir();
    write_text(&dir.join("broken.csv"), "question_title,date\nx,2020-01-01\n");
    let out = dir.join("out").join("master.csv");

    let err = merge_dir(&dir, &out).unwrap_err();
    match err.downcast_ref::<SchemaError>() {
        Some(SchemaError::MissingColumn { column, .. }) => assert_eq!(column, "question_text"),
        None => panic!("expected a schema error, got {err:#}"),
    }
    assert!(!out.exists());
}
