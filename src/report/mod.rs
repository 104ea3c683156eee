//! Research-question tables over the labeled question file.
//!
//! Every table is a CSV under the report directory:
//! `rq1/` tools, `rq2/` lifecycle stages, `rq3/` algorithms, `rq4/` challenges,
//! `topics/` per-topic distribution, trends and top questions.

mod summary;
mod tfidf;
mod top;
mod trends;

pub use summary::{desc_option, group_metrics, mean, mean_difficulty, percentage, shares, top_n, GroupMetrics, ShareRow};
pub use tfidf::{title_case, top_keywords_per_group, GroupKeyword, TfidfModel, TfidfOptions, TfidfRow, TfidfVectorizer, ENGLISH_STOP_WORDS};
pub use top::{top_per_topic, write_top_questions, TopMetric, TopQuestion};
pub use trends::{trend_table, TrendTable};

use crate::config::PipelineOptions;
use crate::csv_io::{read_rows, write_rows, CsvSink};
use crate::labeler::UNCLASSIFIED;
use crate::labels::LabelSets;
use crate::schema::{split_mentions, LabeledRow, Record, LABELED_COLUMNS};
use anyhow::Result;
use std::path::{Path, PathBuf};
use tracing::info;

const TFIDF_KEYWORDS_PER_CHALLENGE: usize = 30;
const TOP_QUESTIONS_PER_TOPIC: usize = 5;

/// Optional number as a CSV cell; missing values stay empty.
pub fn fmt_opt(v: Option<f64>) -> String {
    v.map(|x| x.to_string()).unwrap_or_default()
}

/// Labeled rows with their numeric view, index-aligned.
pub struct ReportInput {
    pub rows: Vec<LabeledRow>,
    pub records: Vec<Record>,
}

impl ReportInput {
    pub fn new(rows: Vec<LabeledRow>) -> Self {
        let records = rows.iter().map(Record::from_labeled).collect();
        Self { rows, records }
    }

    pub fn load(path: &Path) -> Result<Self> {
        Ok(Self::new(read_rows(path, LABELED_COLUMNS)?))
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    fn pairs(&self) -> impl Iterator<Item = (&LabeledRow, &Record)> {
        self.rows.iter().zip(&self.records)
    }
}

fn write_shares(dest: &Path, key: &str, rows: &[ShareRow]) -> Result<PathBuf> {
    let mut sink = CsvSink::create(dest)?;
    sink.write_record([key, "Total_Questions", "Percentage"])?;
    for r in rows {
        sink.write_record([r.name.clone(), r.total_questions.to_string(), r.percentage.to_string()])?;
    }
    sink.finish()
}

fn write_metrics(dest: &Path, key: &str, rows: &[GroupMetrics], with_difficulty: bool) -> Result<PathBuf> {
    let mut sink = CsvSink::create(dest)?;
    let mut header = vec![key, "Total_Questions", "Average_Views", "Average_Votes"];
    if with_difficulty {
        header.push("Average_Difficulty");
    }
    sink.write_record(&header)?;
    for m in rows {
        let mut rec = vec![m.name.clone(), m.total_questions.to_string(), fmt_opt(m.average_views), fmt_opt(m.average_votes)];
        if with_difficulty {
            rec.push(fmt_opt(m.average_difficulty));
        }
        sink.write_record(&rec)?;
    }
    sink.finish()
}

fn names(metrics: &[GroupMetrics], n: usize) -> Vec<String> {
    metrics.iter().take(n).map(|m| m.name.clone()).collect()
}

/// RQ1: tool mentions.
pub fn tools_report(input: &ReportInput, dir: &Path, sets: &LabelSets, opts: &PipelineOptions) -> Result<Vec<PathBuf>> {
    let exploded: Vec<(String, &Record)> = input
        .pairs()
        .flat_map(|(row, rec)| split_mentions(&row.mentions_tool).into_iter().map(move |t| (t, rec)))
        .collect();
    let mut files = Vec::new();

    let summary = shares(exploded.iter().map(|(t, _)| t.clone()), input.len());
    files.push(write_shares(&dir.join("q1_tools_summary.csv"), "Tool", &summary)?);

    let focused: Vec<(String, &Record)> = exploded.into_iter().filter(|(t, _)| sets.focus_tools.contains(t)).collect();
    let metrics = group_metrics(focused.iter().cloned());
    files.push(write_metrics(&dir.join("rq1_tools_metrics.csv"), "Mentions_Tool", &metrics, false)?);

    let mut difficulty: Vec<&GroupMetrics> = metrics.iter().take(opts.top_n).collect();
    difficulty.sort_by(|a, b| desc_option(a.average_difficulty, b.average_difficulty));
    let mut sink = CsvSink::create(&dir.join("top10_tools_difficulty_summary.csv"))?;
    sink.write_record(["Mentions_Tool", "Average_Difficulty"])?;
    for m in difficulty {
        sink.write_record([m.name.clone(), fmt_opt(m.average_difficulty)])?;
    }
    files.push(sink.finish()?);

    let series = names(&metrics, opts.trend_series);
    let trend = trend_table(focused.iter().map(|(t, r)| (r.posted, t.as_str())), &series, opts.first_year, opts.last_year);
    files.push(trend.write_csv(&dir.join("rq1_tools_trend.csv"))?);
    Ok(files)
}

/// RQ2: primary lifecycle stage per topic, as count and share of the topic.
pub fn lifecycle_report(input: &ReportInput, dir: &Path) -> Result<Vec<PathBuf>> {
    let mut counts: Vec<((usize, String), usize)> = Vec::new();
    let mut topic_totals: Vec<(usize, usize)> = Vec::new();
    for row in &input.rows {
        match topic_totals.iter_mut().find(|(t, _)| *t == row.topic) {
            Some((_, n)) => *n += 1,
            None => topic_totals.push((row.topic, 1)),
        }
        let key = (row.topic, row.primary_stage.clone());
        match counts.iter_mut().find(|(k, _)| *k == key) {
            Some((_, n)) => *n += 1,
            None => counts.push((key, 1)),
        }
    }
    counts.sort_by(|a, b| a.0.cmp(&b.0));

    let mut sink = CsvSink::create(&dir.join("q2_lifecycle_summary.csv"))?;
    sink.write_record(["Topic", "Primary_Stage", "Count", "Total_Questions", "Percentage"])?;
    for ((topic, stage), n) in &counts {
        let total = topic_totals.iter().find(|(t, _)| t == topic).map_or(0, |(_, c)| *c);
        sink.write_record([topic.to_string(), stage.clone(), n.to_string(), total.to_string(), percentage(*n, total).to_string()])?;
    }
    Ok(vec![sink.finish()?])
}

/// RQ3: algorithm mentions, canonicalized through the alias table.
pub fn algorithms_report(input: &ReportInput, dir: &Path, sets: &LabelSets, opts: &PipelineOptions) -> Result<Vec<PathBuf>> {
    let exploded: Vec<(String, &Record)> = input
        .pairs()
        .flat_map(|(row, rec)| {
            split_mentions(&row.mentions_algorithm).into_iter().map(move |a| (sets.canonical_algorithm(&a), rec))
        })
        .collect();
    let mut files = Vec::new();

    let summary = shares(exploded.iter().map(|(a, _)| a.clone()), input.len());
    files.push(write_shares(&dir.join("q3_algorithm_summary.csv"), "Algorithm", &summary)?);

    let metrics = group_metrics(exploded.iter().cloned());
    let type_of = |name: &str| sets.algorithm_type(name).map(|t| t.as_str()).unwrap_or_default().to_string();

    let write_typed = |dest: PathBuf, rows: &[&GroupMetrics]| -> Result<PathBuf> {
        let mut sink = CsvSink::create(&dest)?;
        sink.write_record(["Algorithm", "Type", "Total_Questions", "Average_Views", "Average_Votes", "Average_Difficulty"])?;
        for m in rows {
            sink.write_record([
                m.name.clone(),
                type_of(&m.name),
                m.total_questions.to_string(),
                fmt_opt(m.average_views),
                fmt_opt(m.average_votes),
                fmt_opt(m.average_difficulty),
            ])?;
        }
        sink.finish()
    };

    let all: Vec<&GroupMetrics> = metrics.iter().collect();
    files.push(write_typed(dir.join("rq3_algorithms_metrics_full.csv"), &all)?);

    let by_count: Vec<&GroupMetrics> = metrics.iter().take(opts.top_n).collect();
    files.push(write_typed(dir.join("rq3_top10_algorithms_by_count.csv"), &by_count)?);

    let by_difficulty: Vec<&GroupMetrics> =
        top_n(&metrics, opts.top_n, |m| m.average_difficulty).into_iter().collect();
    files.push(write_typed(dir.join("rq3_top10_algorithms_by_difficulty.csv"), &by_difficulty)?);

    let focused: Vec<&GroupMetrics> = metrics.iter().filter(|m| sets.focus_algorithms.contains(&m.name)).collect();
    files.push(write_typed(dir.join("RQ3_algorithm_final_metrics_filtered.csv"), &focused)?);

    let series = names(&metrics, opts.trend_series);
    let trend = trend_table(exploded.iter().map(|(a, r)| (r.posted, a.as_str())), &series, opts.first_year, opts.last_year);
    files.push(trend.write_csv(&dir.join("rq3_algorithms_trend.csv"))?);
    Ok(files)
}

/// RQ4: challenge categories, their engagement, trends, top questions and keywords.
pub fn challenges_report(input: &ReportInput, dir: &Path, opts: &PipelineOptions) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    let classified = input.rows.iter().filter(|r| r.primary_challenge != UNCLASSIFIED).map(|r| r.primary_challenge.clone());
    let summary = shares(classified, input.len());
    files.push(write_shares(&dir.join("q4_challenges_summary.csv"), "Challenge", &summary)?);

    let typed: Vec<(String, &LabeledRow, &Record)> = input
        .pairs()
        .map(|(row, rec)| (title_case(row.primary_challenge.trim()), row, rec))
        .filter(|(c, _, _)| !c.is_empty())
        .collect();
    let mut challenge_types: Vec<String> = typed.iter().map(|(c, _, _)| c.clone()).collect();
    challenge_types.sort();
    challenge_types.dedup();

    let mut metrics = group_metrics(typed.iter().map(|(c, _, r)| (c.clone(), *r)));
    metrics.sort_by(|a, b| a.name.cmp(&b.name));
    let mut sink = CsvSink::create(&dir.join("RQ4_challenges_summary.csv"))?;
    sink.write_record(["Challenge_Type", "avg_views", "avg_votes", "avg_difficulty"])?;
    for m in &metrics {
        sink.write_record([m.name.clone(), fmt_opt(m.average_views), fmt_opt(m.average_votes), fmt_opt(m.average_difficulty)])?;
    }
    files.push(sink.finish()?);

    let trend = trend_table(typed.iter().map(|(c, _, r)| (r.posted, c.as_str())), &challenge_types, opts.first_year, opts.last_year);
    files.push(trend.write_csv(&dir.join("rq4_challenges_trend.csv"))?);

    let top_dir = dir.join("top10_questions");
    let header = ["Challenge_Type", "question_title", "Question_body", "views", "votes", "difficulty_score"];
    let mut all_sink = CsvSink::create(&top_dir.join("top10_questions_all_challenges.csv"))?;
    all_sink.write_record(header)?;
    for challenge in &challenge_types {
        let mut group: Vec<&(String, &LabeledRow, &Record)> = typed.iter().filter(|(c, _, _)| c == challenge).collect();
        group.sort_by(|a, b| desc_option(a.2.views, b.2.views).then_with(|| desc_option(a.2.votes, b.2.votes)));
        group.truncate(opts.top_n);

        let mut sink = CsvSink::create(&top_dir.join(format!("top10_questions_{}.csv", challenge.to_lowercase())))?;
        sink.write_record(header)?;
        for (c, row, rec) in group {
            let record = [
                c.clone(),
                row.question_title.clone(),
                row.question_body.clone(),
                fmt_opt(rec.views),
                fmt_opt(rec.votes),
                fmt_opt(rec.difficulty_score()),
            ];
            sink.write_record(&record)?;
            all_sink.write_record(&record)?;
        }
        files.push(sink.finish()?);
    }
    files.push(all_sink.finish()?);

    let groups: Vec<(String, String)> = challenge_types
        .iter()
        .map(|c| {
            let bodies: Vec<&str> = typed.iter().filter(|(t, _, _)| t == c).map(|(_, r, _)| r.question_body.as_str()).collect();
            (c.clone(), bodies.join(" "))
        })
        .collect();
    let keywords = top_keywords_per_group(&groups, TfidfOptions::default(), TFIDF_KEYWORDS_PER_CHALLENGE)?;
    let mut sink = CsvSink::create(&dir.join("tfidf_keywords_per_challenge.csv"))?;
    sink.write_record(["Challenge_Type", "Keyword", "TFIDF_Score"])?;
    for k in &keywords {
        sink.write_record([k.group.clone(), k.keyword.clone(), k.score.to_string()])?;
    }
    files.push(sink.finish()?);
    Ok(files)
}

/// Per-topic distribution, half-year trend, dated document split and top questions.
pub fn topics_report(input: &ReportInput, dir: &Path, opts: &PipelineOptions) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    let dist = shares(input.rows.iter().map(|r| r.topic.to_string()), input.len());
    let mut sink = CsvSink::create(&dir.join("topic_distribution.csv"))?;
    sink.write_record(["Topic", "Question_Count", "Percentage"])?;
    for s in &dist {
        sink.write_record([s.name.clone(), s.total_questions.to_string(), s.percentage.to_string()])?;
    }
    files.push(sink.finish()?);

    let mut topics: Vec<usize> = input.rows.iter().map(|r| r.topic).collect();
    topics.sort_unstable();
    topics.dedup();
    let series: Vec<String> = topics.iter().map(usize::to_string).collect();
    let labels: Vec<String> = input.rows.iter().map(|r| r.topic.to_string()).collect();
    let trend = trend_table(
        input.records.iter().zip(&labels).map(|(r, l)| (r.posted, l.as_str())),
        &series,
        opts.first_year,
        opts.last_year,
    );
    files.push(trend.write_csv(&dir.join("topic_trend.csv"))?);

    let mut dated: Vec<(&LabeledRow, &Record)> = input.pairs().filter(|(_, r)| r.posted.is_some()).collect();
    dated.sort_by_key(|(_, r)| r.posted);
    for topic in &topics {
        let docs: Vec<LabeledRow> = dated.iter().filter(|(row, _)| row.topic == *topic).map(|(row, _)| (*row).clone()).collect();
        files.push(write_rows(&dir.join("trend_documents").join(format!("{topic}.csv")), &docs)?);
    }

    for metric in TopMetric::ALL {
        let top = top_per_topic(&input.rows, &input.records, metric, TOP_QUESTIONS_PER_TOPIC);
        files.push(write_top_questions(&dir.join(metric.file_name()), &top)?);
    }
    Ok(files)
}

/// Run every report over the labeled file; returns the files written.
pub fn run_reports(input: &Path, out_dir: &Path, sets: &LabelSets, opts: &PipelineOptions) -> Result<Vec<PathBuf>> {
    let data = ReportInput::load(input)?;
    info!(rows = data.len(), "reporting on {}", input.display());

    let mut files = Vec::new();
    files.extend(tools_report(&data, &out_dir.join("rq1"), sets, opts)?);
    files.extend(lifecycle_report(&data, &out_dir.join("rq2"))?);
    files.extend(algorithms_report(&data, &out_dir.join("rq3"), sets, opts)?);
    files.extend(challenges_report(&data, &out_dir.join("rq4"), opts)?);
    files.extend(topics_report(&data, &out_dir.join("topics"), opts)?);
    info!(files = files.len(), "reports written under {}", out_dir.display());
    Ok(files)
}
