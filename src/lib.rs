mod config;
mod date;
mod progress;
mod util;

mod schema;
mod csv_io;
mod labels;

pub mod collect;
mod merge;
pub mod preprocess;
pub mod topic;
mod labeler;
pub mod report;

pub use crate::config::{
    Alpha, CollectorOptions, PipelineOptions, RedditCredentials, RetryPolicy, SiteConfig, SiteKind, SitesFile, SweepOptions,
};
pub use crate::date::{format_post_time, half_year_index, iter_half_years, parse_post_time, HalfYear};

// Row schemas and the shared coercion rules.
pub use crate::schema::{
    difficulty_score, join_tokens, parse_count, split_mentions, split_tokens, LabeledRow, QuestionRow, RawQuestion, Record,
    SchemaError, TopicRow, LABELED_COLUMNS, QUESTION_COLUMNS, RAW_COLUMNS, TOPIC_COLUMNS,
};
pub use crate::csv_io::{read_headers, read_rows, require_columns, write_rows, CsvSink};
pub use crate::labels::{AlgorithmType, Category, LabelSets};

// Stage entry points.
pub use crate::collect::{collect_site, collect_sites};
pub use crate::merge::{discover_raw_files, merge_dir, merge_rows, MergeStats};
pub use crate::preprocess::{preprocess_file, PreprocessStats, Preprocessor};
pub use crate::topic::{sweep, sweep_file, SweepResult, TopicModel};
pub use crate::labeler::{classify, label_file, mentions, CompiledCategories, Labeler, UNCLASSIFIED};
pub use crate::report::run_reports;

// Expose multiprogress and progress helpers.
pub use crate::progress::{make_count_progress, set_global_multiprogress, ProgressScope};

// Robust file ops and tracing setup for binaries.
pub use crate::util::{
    create_with_backoff, init_tracing_once, merge_extra_stopwords, open_with_backoff, remove_with_backoff,
    replace_file_atomic_backoff,
};
