use anyhow::{bail, Context, Result};
use serde::Deserialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use std::time::Duration;

/// Options shared by the preprocess, label and report stages.
#[derive(Clone, Debug)]
pub struct PipelineOptions {
    pub progress: bool,
    pub parallelism: Option<usize>, // Some(N) to set rayon threads, None to use default
    pub min_token_count: usize,     // corpus-wide frequency floor for non-keyword tokens
    pub first_year: i32,            // report period index, inclusive
    pub last_year: i32,
    pub top_n: usize,               // rows kept in "top" tables
    pub trend_series: usize,        // series kept in trend tables
}

impl Default for PipelineOptions {
    fn default() -> Self {
        Self {
            progress: true,
            parallelism: None,
            min_token_count: 10,
            first_year: 2017,
            last_year: 2025,
            top_n: 10,
            trend_series: 5,
        }
    }
}

impl PipelineOptions {
    pub fn with_progress(mut self, yes: bool) -> Self {
        self.progress = yes;
        self
    }
    pub fn with_parallelism(mut self, threads: usize) -> Self {
        self.parallelism = Some(threads.max(1));
        self
    }
    pub fn with_min_token_count(mut self, n: usize) -> Self {
        self.min_token_count = n;
        self
    }
    pub fn with_year_range(mut self, first: i32, last: i32) -> Self {
        self.first_year = first.min(last);
        self.last_year = first.max(last);
        self
    }
    pub fn with_top_n(mut self, n: usize) -> Self {
        self.top_n = n.max(1);
        self
    }
    pub fn with_trend_series(mut self, n: usize) -> Self {
        self.trend_series = n.max(1);
        self
    }

    /// Install a global rayon pool when a thread count was requested.
    /// A pool that is already built is left alone.
    pub fn install_thread_pool(&self) {
        if let Some(n) = self.parallelism {
            if let Err(e) = rayon::ThreadPoolBuilder::new().num_threads(n).build_global() {
                tracing::debug!("rayon pool already configured: {}", e);
            }
        }
    }
}

/// Dirichlet document-topic prior.
#[derive(Clone, Copy, Debug, PartialEq)]
pub enum Alpha {
    /// Same value for every topic.
    Symmetric(f64),
    /// `1 / (i + sqrt(K))` for topic `i`, normalized to sum to one.
    Asymmetric,
}

impl Alpha {
    pub fn values(self, num_topics: usize) -> Vec<f64> {
        match self {
            Alpha::Symmetric(a) => vec![a; num_topics],
            Alpha::Asymmetric => {
                let root = (num_topics as f64).sqrt();
                let raw: Vec<f64> = (0..num_topics).map(|i| 1.0 / (i as f64 + root)).collect();
                let total: f64 = raw.iter().sum();
                raw.into_iter().map(|v| v / total).collect()
            }
        }
    }
}

impl fmt::Display for Alpha {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Alpha::Symmetric(a) => write!(f, "{a}"),
            Alpha::Asymmetric => f.write_str("asymmetric"),
        }
    }
}

impl FromStr for Alpha {
    type Err = String;
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let t = s.trim().to_lowercase();
        if t == "asymmetric" {
            return Ok(Alpha::Asymmetric);
        }
        t.parse::<f64>()
            .ok()
            .filter(|v| v.is_finite() && *v > 0.0)
            .map(Alpha::Symmetric)
            .ok_or_else(|| format!("invalid alpha `{s}` (expected `asymmetric` or a positive number)"))
    }
}

/// Grid and training parameters for the topic sweep.
#[derive(Clone, Debug)]
pub struct SweepOptions {
    pub topic_counts: Vec<usize>,
    pub alphas: Vec<Alpha>,
    pub betas: Vec<f64>,
    pub passes: usize,
    pub iterations: usize,
    pub chunksize: usize,
    pub random_state: u64,
    pub no_below: usize,
    pub no_above: f64,
    pub boost_factor: usize,
    pub coherence_topn: usize,
    pub coherence_window: usize,
    pub matrix_topn: usize,
    pub progress: bool,
}

impl Default for SweepOptions {
    fn default() -> Self {
        Self {
            topic_counts: (2..=20).collect(),
            alphas: vec![Alpha::Asymmetric],
            betas: vec![0.01],
            passes: 10,
            iterations: 100,
            chunksize: 500,
            random_state: 100,
            no_below: 5,
            no_above: 0.5,
            boost_factor: 3,
            coherence_topn: 10,
            coherence_window: 110,
            matrix_topn: 50,
            progress: true,
        }
    }
}

impl SweepOptions {
    pub fn with_topic_range(mut self, lo: usize, hi: usize) -> Self {
        let lo = lo.max(1);
        self.topic_counts = (lo..=hi.max(lo)).collect();
        self
    }
    pub fn with_topic_counts(mut self, counts: Vec<usize>) -> Self {
        self.topic_counts = counts.into_iter().filter(|k| *k > 0).collect();
        self
    }
    pub fn with_alphas(mut self, alphas: Vec<Alpha>) -> Self {
        self.alphas = alphas;
        self
    }
    pub fn with_betas(mut self, betas: Vec<f64>) -> Self {
        self.betas = betas;
        self
    }
    pub fn with_passes(mut self, passes: usize) -> Self {
        self.passes = passes.max(1);
        self
    }
    pub fn with_iterations(mut self, iterations: usize) -> Self {
        self.iterations = iterations.max(1);
        self
    }
    pub fn with_chunksize(mut self, chunksize: usize) -> Self {
        self.chunksize = chunksize.max(1);
        self
    }
    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = seed;
        self
    }
    pub fn with_filter_extremes(mut self, no_below: usize, no_above: f64) -> Self {
        self.no_below = no_below;
        self.no_above = no_above;
        self
    }
    pub fn with_boost_factor(mut self, factor: usize) -> Self {
        self.boost_factor = factor.max(1);
        self
    }
    pub fn with_progress(mut self, yes: bool) -> Self {
        self.progress = yes;
        self
    }

    /// Output directory name for one grid point. The prior suffix is only
    /// added when more than one alpha or beta is swept.
    pub fn grid_dir_name(&self, k: usize, alpha: Alpha, beta: f64) -> String {
        if self.alphas.len() > 1 || self.betas.len() > 1 {
            format!("{k}topics_a{alpha}_b{beta}")
        } else {
            format!("{k}topics")
        }
    }

    pub fn validate(&self) -> Result<()> {
        if self.topic_counts.is_empty() {
            bail!("topic sweep needs at least one topic count");
        }
        if self.alphas.is_empty() || self.betas.is_empty() {
            bail!("topic sweep needs at least one alpha and one beta value");
        }
        if self.betas.iter().any(|b| !b.is_finite() || *b <= 0.0) {
            bail!("beta values must be positive");
        }
        if !(0.0..=1.0).contains(&self.no_above) {
            bail!("no_above must be a fraction in [0, 1], got {}", self.no_above);
        }
        Ok(())
    }
}

/// Bounded retry behaviour shared by every collector.
#[derive(Clone, Debug, PartialEq)]
pub struct RetryPolicy {
    /// `None` retries forever.
    pub max_retries: Option<u32>,
    /// Wait applied to a 429 that carries no usable `Retry-After`.
    pub default_retry_after: Duration,
    pub base_backoff: Duration,
    pub max_backoff: Duration,
}

impl Default for RetryPolicy {
    fn default() -> Self {
        Self {
            max_retries: Some(8),
            default_retry_after: Duration::from_secs(10),
            base_backoff: Duration::from_secs(1),
            max_backoff: Duration::from_secs(120),
        }
    }
}

impl RetryPolicy {
    /// No retry limit for either rate limits or transport failures.
    pub fn unbounded() -> Self {
        Self { max_retries: None, ..Self::default() }
    }
    pub fn with_max_retries(mut self, n: u32) -> Self {
        self.max_retries = Some(n);
        self
    }
    pub fn with_default_retry_after(mut self, d: Duration) -> Self {
        self.default_retry_after = d;
        self
    }
    pub fn with_backoff(mut self, base: Duration, max: Duration) -> Self {
        self.base_backoff = base;
        self.max_backoff = max.max(base);
        self
    }

    /// Wait before retry number `attempt` (0-based). A server-provided
    /// `Retry-After` is honoured as given, even above `max_backoff`. A 429
    /// without one waits `default_retry_after`. Transport failures back off
    /// exponentially up to `max_backoff`.
    pub fn delay_for(&self, attempt: u32, retry_after: Option<Duration>, rate_limited: bool) -> Duration {
        if let Some(d) = retry_after {
            return d;
        }
        if rate_limited {
            return self.default_retry_after;
        }
        let factor = 1u32.checked_shl(attempt.min(20)).unwrap_or(u32::MAX);
        self.base_backoff.saturating_mul(factor).min(self.max_backoff)
    }

    pub fn allows(&self, retries_so_far: u32) -> bool {
        self.max_retries.map_or(true, |m| retries_so_far < m)
    }
}

/// Collector runtime knobs (everything that is not per-site).
#[derive(Clone, Debug)]
pub struct CollectorOptions {
    pub retry: RetryPolicy,
    pub progress: bool,
    pub fetch_details: bool, // follow each listing item to its page for body/date
    pub seed: Option<u64>,   // seed for header rotation and politeness jitter
}

impl Default for CollectorOptions {
    fn default() -> Self {
        Self { retry: RetryPolicy::default(), progress: true, fetch_details: true, seed: None }
    }
}

impl CollectorOptions {
    pub fn with_retry(mut self, retry: RetryPolicy) -> Self {
        self.retry = retry;
        self
    }
    pub fn with_progress(mut self, yes: bool) -> Self {
        self.progress = yes;
        self
    }
    pub fn with_fetch_details(mut self, yes: bool) -> Self {
        self.fetch_details = yes;
        self
    }
    pub fn with_seed(mut self, seed: u64) -> Self {
        self.seed = Some(seed);
        self
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SiteKind {
    StackExchange,
    Reddit,
}

/// One collection target from the sites file.
///
/// ```toml
/// [[site]]
/// name = "quantumcomputing"
/// kind = "stack_exchange"
/// base_url = "https://quantumcomputing.stackexchange.com/questions?tab=newest"
/// host = "https://quantumcomputing.stackexchange.com"
/// first_page = 1
/// last_page = 50
/// ```
#[derive(Clone, Debug, Deserialize)]
pub struct SiteConfig {
    pub name: String,
    pub kind: SiteKind,
    #[serde(default)]
    pub base_url: String,
    #[serde(default)]
    pub host: String,
    #[serde(default)]
    pub referer: Option<String>,
    #[serde(default = "default_first_page")]
    pub first_page: u32,
    #[serde(default = "default_last_page")]
    pub last_page: u32,
    #[serde(default = "default_delay_min")]
    pub delay_min_secs: f64,
    #[serde(default = "default_delay_max")]
    pub delay_max_secs: f64,
    /// Reddit only.
    #[serde(default)]
    pub subreddit: Option<String>,
    /// Reddit only: overall submission cap.
    #[serde(default = "default_reddit_limit")]
    pub limit: usize,
    /// Reddit only: top comments kept per submission, 0 skips the extra requests.
    #[serde(default = "default_reddit_comments")]
    pub comments: usize,
    #[serde(default)]
    pub output: Option<PathBuf>,
}

fn default_first_page() -> u32 {
    1
}
fn default_last_page() -> u32 {
    1
}
fn default_delay_min() -> f64 {
    5.0
}
fn default_delay_max() -> f64 {
    20.0
}
fn default_reddit_limit() -> usize {
    1000
}
fn default_reddit_comments() -> usize {
    2
}

impl SiteConfig {
    pub fn referer(&self) -> &str {
        self.referer.as_deref().unwrap_or(if self.host.is_empty() { &self.base_url } else { &self.host })
    }

    /// Politeness window as an ordered pair of durations.
    pub fn delay_window(&self) -> (Duration, Duration) {
        let lo = self.delay_min_secs.max(0.0);
        let hi = self.delay_max_secs.max(lo);
        (Duration::from_secs_f64(lo), Duration::from_secs_f64(hi))
    }

    pub fn output_path(&self, out_dir: &Path) -> PathBuf {
        match &self.output {
            Some(p) if p.is_absolute() => p.clone(),
            Some(p) => out_dir.join(p),
            None => out_dir.join(format!("{}.csv", self.name)),
        }
    }
}

#[derive(Clone, Debug, Deserialize)]
pub struct SitesFile {
    #[serde(rename = "site", default)]
    pub sites: Vec<SiteConfig>,
}

impl SitesFile {
    pub fn parse(text: &str) -> Result<Self> {
        let parsed: SitesFile = toml::from_str(text).context("parse sites file")?;
        for s in &parsed.sites {
            match s.kind {
                SiteKind::StackExchange if s.base_url.trim().is_empty() => {
                    bail!("site `{}`: stack_exchange sites need a base_url", s.name)
                }
                SiteKind::Reddit if s.subreddit.as_deref().map_or(true, |x| x.trim().is_empty()) => {
                    bail!("site `{}`: reddit sites need a subreddit", s.name)
                }
                _ => {}
            }
        }
        Ok(parsed)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).with_context(|| format!("read {}", path.display()))?;
        Self::parse(&text).with_context(|| format!("in {}", path.display()))
    }
}

/// Reddit API credentials, read from the environment at runtime.
#[derive(Clone, Debug)]
pub struct RedditCredentials {
    pub client_id: String,
    pub client_secret: String,
    pub user_agent: String,
}

impl RedditCredentials {
    /// - QD_REDDIT_CLIENT_ID
    /// - QD_REDDIT_CLIENT_SECRET
    /// - QD_REDDIT_USER_AGENT (optional)
    pub fn from_env() -> Result<Self> {
        let get = |k: &str| std::env::var(k).ok().map(|v| v.trim().to_string()).filter(|v| !v.is_empty());
        let client_id = get("QD_REDDIT_CLIENT_ID").context("QD_REDDIT_CLIENT_ID is not set")?;
        let client_secret = get("QD_REDDIT_CLIENT_SECRET").context("QD_REDDIT_CLIENT_SECRET is not set")?;
        let user_agent = get("QD_REDDIT_USER_AGENT").unwrap_or_else(|| "qdiscourse/0.1".to_string());
        Ok(Self { client_id, client_secret, user_agent })
    }
}
