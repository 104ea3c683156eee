//! Collectors: Stack Exchange family scrapers and the Reddit API client.

mod http;
mod reddit;
mod stackexchange;

pub use http::{
    fetch_with_retry, parse_retry_after, random_headers, retry_call, FetchError, Fetcher, Headers, HttpResponse, Sleeper,
    ThreadSleeper, UreqFetcher, USER_AGENTS,
};
pub use reddit::{parse_comments as parse_reddit_comments, parse_listing as parse_reddit_listing, RedditCollector, Submission};
pub use stackexchange::{
    page_url, parse_listing, parse_question_page, ListingItem, QuestionDetails, Selectors, StackExchangeCollector,
    NO_DETAILS,
};

use crate::config::{CollectorOptions, RedditCredentials, SiteConfig, SiteKind, SitesFile};
use crate::csv_io::write_rows;
use crate::schema::RawQuestion;
use anyhow::{Context, Result};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

/// Collect every question of one configured site.
pub fn collect_site<F, S>(site: &SiteConfig, opts: &CollectorOptions, fetcher: &F, sleeper: &S) -> Result<Vec<RawQuestion>>
where
    F: Fetcher + ?Sized,
    S: Sleeper + ?Sized,
{
    match site.kind {
        SiteKind::StackExchange => Ok(StackExchangeCollector::new(site, opts, fetcher, sleeper)?.collect()),
        SiteKind::Reddit => {
            let creds = RedditCredentials::from_env()?;
            RedditCollector::new(site, opts, creds, fetcher, sleeper).collect()
        }
    }
}

/// Collect each site of the sites file into its own CSV under `out_dir`.
/// A site that yields nothing is logged and produces no file.
pub fn collect_sites<F, S>(sites: &SitesFile, out_dir: &Path, opts: &CollectorOptions, fetcher: &F, sleeper: &S) -> Result<Vec<PathBuf>>
where
    F: Fetcher + ?Sized,
    S: Sleeper + ?Sized,
{
    let mut written = Vec::new();
    for site in &sites.sites {
        let rows = collect_site(site, opts, fetcher, sleeper).with_context(|| format!("site `{}`", site.name))?;
        if rows.is_empty() {
            warn!("{}: no data scraped", site.name);
            continue;
        }
        let dest = site.output_path(out_dir);
        write_rows(&dest, &rows)?;
        info!(rows = rows.len(), "{} saved to {}", site.name, dest.display());
        written.push(dest);
    }
    Ok(written)
}
