use anyhow::Result;
use clap::{Parser, Subcommand};
use qdiscourse::collect::{ThreadSleeper, UreqFetcher};
use qdiscourse::{
    collect_sites, init_tracing_once, label_file, merge_dir, preprocess_file, run_reports, set_global_multiprogress, sweep_file,
    Alpha, CollectorOptions, LabelSets, PipelineOptions, RetryPolicy, SitesFile, SweepOptions,
};
use indicatif::MultiProgress;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;
use tracing::info;

#[derive(Parser)]
#[command(name = "qdiscourse", version, about = "Quantum-computing Q&A discourse pipeline")]
struct Cli {
    /// Disable progress bars.
    #[arg(long, global = true)]
    no_progress: bool,

    /// Worker threads for per-document stages (default: all cores).
    #[arg(long, global = true)]
    threads: Option<usize>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Scrape every site of a sites file into one CSV per site.
    Collect {
        #[arg(long, default_value = "sites.toml")]
        sites: PathBuf,
        #[arg(long, default_value = "data/raw")]
        out: PathBuf,
        /// Seed header rotation and politeness jitter.
        #[arg(long)]
        seed: Option<u64>,
        #[arg(long, default_value_t = 8, conflicts_with = "unbounded_retries")]
        max_retries: u32,
        /// Retry rate limits and transport failures without limit.
        #[arg(long)]
        unbounded_retries: bool,
        /// Seconds to wait on a 429 without `Retry-After`.
        #[arg(long, default_value_t = 10)]
        rate_limit_wait: u64,
        /// Only scrape listing pages, skip question pages.
        #[arg(long)]
        listing_only: bool,
    },
    /// Merge collector CSVs into one deduplicated master file.
    Merge {
        #[arg(long, default_value = "data/raw")]
        input: PathBuf,
        #[arg(long, default_value = "data/master.csv")]
        output: PathBuf,
    },
    /// Filter, clean and tokenize the master file.
    Preprocess {
        #[arg(long, default_value = "data/master.csv")]
        input: PathBuf,
        #[arg(long, default_value = "data/preprocessed.csv")]
        output: PathBuf,
        #[arg(long, default_value_t = 10)]
        min_count: usize,
    },
    /// Train one topic model per grid point and score coherence.
    Sweep {
        #[arg(long, default_value = "data/preprocessed.csv")]
        input: PathBuf,
        #[arg(long, default_value = "data/lda")]
        out: PathBuf,
        #[arg(long, default_value_t = 2)]
        min_topics: usize,
        #[arg(long, default_value_t = 20)]
        max_topics: usize,
        /// `asymmetric` or a positive number; repeat to sweep several.
        #[arg(long = "alpha", default_value = "asymmetric")]
        alphas: Vec<Alpha>,
        #[arg(long = "beta", default_value = "0.01")]
        betas: Vec<f64>,
        #[arg(long, default_value_t = 10)]
        passes: usize,
        #[arg(long, default_value_t = 100)]
        iterations: usize,
        #[arg(long, default_value_t = 100)]
        seed: u64,
        #[arg(long, default_value_t = 500)]
        chunksize: usize,
        /// Drop terms in fewer documents than this.
        #[arg(long, default_value_t = 5)]
        no_below: usize,
        /// Drop terms in more than this fraction of documents.
        #[arg(long, default_value_t = 0.5)]
        no_above: f64,
        /// Copies of each boosted keyword.
        #[arg(long, default_value_t = 3)]
        boost_factor: usize,
    },
    /// Label tools, algorithms, lifecycle stages and challenges.
    Label {
        /// `question_topic.csv` of the chosen grid point.
        #[arg(long)]
        input: PathBuf,
        #[arg(long, default_value = "data/labeled.csv")]
        output: PathBuf,
    },
    /// Write the research-question tables.
    Report {
        #[arg(long, default_value = "data/labeled.csv")]
        input: PathBuf,
        #[arg(long, default_value = "data/reports")]
        out: PathBuf,
        #[arg(long, default_value_t = 2017)]
        first_year: i32,
        #[arg(long, default_value_t = 2025)]
        last_year: i32,
        /// Rows kept in ranking tables.
        #[arg(long, default_value_t = 10)]
        top_n: usize,
        /// Series kept in trend tables.
        #[arg(long, default_value_t = 5)]
        trend_series: usize,
    },
}

fn main() -> Result<()> {
    init_tracing_once();
    let cli = Cli::parse();
    let progress = !cli.no_progress;
    if progress {
        set_global_multiprogress(Arc::new(MultiProgress::new()));
    }

    let mut opts = PipelineOptions::default().with_progress(progress);
    if let Some(n) = cli.threads {
        opts = opts.with_parallelism(n);
    }
    let sets = LabelSets::default();

    match cli.command {
        Command::Collect { sites, out, seed, max_retries, unbounded_retries, rate_limit_wait, listing_only } => {
            let sites = SitesFile::load(&sites)?;
            let retry = if unbounded_retries { RetryPolicy::unbounded() } else { RetryPolicy::default().with_max_retries(max_retries) }
                .with_default_retry_after(Duration::from_secs(rate_limit_wait));
            let mut copts = CollectorOptions::default().with_retry(retry).with_progress(progress).with_fetch_details(!listing_only);
            if let Some(s) = seed {
                copts = copts.with_seed(s);
            }
            let written = collect_sites(&sites, &out, &copts, &UreqFetcher::default(), &ThreadSleeper)?;
            info!(files = written.len(), "collection finished");
        }
        Command::Merge { input, output } => {
            let stats = merge_dir(&input, &output)?;
            println!("merged {} rows from {} files ({} duplicates dropped)", stats.rows, stats.files, stats.duplicates);
        }
        Command::Preprocess { input, output, min_count } => {
            let stats = preprocess_file(&input, &output, &sets, &opts.with_min_token_count(min_count))?;
            println!("kept {} of {} questions", stats.unique, stats.input);
        }
        Command::Sweep {
            input,
            out,
            min_topics,
            max_topics,
            alphas,
            betas,
            passes,
            iterations,
            seed,
            chunksize,
            no_below,
            no_above,
            boost_factor,
        } => {
            let sopts = SweepOptions::default()
                .with_topic_range(min_topics, max_topics)
                .with_alphas(alphas)
                .with_betas(betas)
                .with_passes(passes)
                .with_iterations(iterations)
                .with_random_state(seed)
                .with_chunksize(chunksize)
                .with_filter_extremes(no_below, no_above)
                .with_boost_factor(boost_factor)
                .with_progress(progress);
            let results = sweep_file(&input, &out, &sets, &sopts)?;
            if let Some(best) = results.iter().max_by(|a, b| a.coherence.total_cmp(&b.coherence)) {
                println!("best coherence {:.4} at {} topics (alpha {}, beta {})", best.coherence, best.topics, best.alpha, best.beta);
            }
        }
        Command::Label { input, output } => {
            let n = label_file(&input, &output, &sets, &opts)?;
            println!("labeled {n} questions");
        }
        Command::Report { input, out, first_year, last_year, top_n, trend_series } => {
            let ropts = opts.with_year_range(first_year, last_year).with_top_n(top_n).with_trend_series(trend_series);
            let files = run_reports(&input, &out, &sets, &ropts)?;
            println!("wrote {} report files under {}", files.len(), out.display());
        }
    }
    Ok(())
}
