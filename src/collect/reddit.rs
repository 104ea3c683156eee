//! Subreddit collector on Reddit's OAuth API (application-only grant).

use super::http::{retry_call, Fetcher, Headers, Sleeper};
use crate::config::{CollectorOptions, RedditCredentials, SiteConfig};
use crate::date::format_post_time;
use crate::progress::ProgressScope;
use crate::schema::RawQuestion;
use anyhow::{bail, Context, Result};
use base64::Engine;
use serde::Deserialize;
use time::OffsetDateTime;
use tracing::{info, warn};

pub const TOKEN_URL: &str = "https://www.reddit.com/api/v1/access_token";
pub const API_BASE: &str = "https://oauth.reddit.com";
const PAGE_LIMIT: usize = 100;

#[derive(Deserialize)]
struct TokenResponse {
    access_token: String,
}

#[derive(Deserialize)]
struct Listing {
    data: ListingData,
}

#[derive(Deserialize)]
struct ListingData {
    #[serde(default)]
    children: Vec<Child>,
    after: Option<String>,
}

#[derive(Deserialize)]
struct Child {
    data: Submission,
}

#[derive(Clone, Debug, Deserialize)]
pub struct Submission {
    #[serde(default)]
    pub id: String,
    pub title: String,
    #[serde(default)]
    pub selftext: String,
    #[serde(default)]
    pub score: i64,
    #[serde(default)]
    pub num_comments: i64,
    #[serde(default)]
    pub created_utc: f64,
    #[serde(default)]
    pub url: String,
}

impl Submission {
    pub fn into_raw(self, source: &str) -> RawQuestion {
        let date = OffsetDateTime::from_unix_timestamp(self.created_utc as i64)
            .map(|dt| format!("{} UTC", format_post_time(dt)))
            .unwrap_or_default();
        RawQuestion {
            question_title: self.title,
            question_text: self.selftext,
            date,
            answers: self.num_comments.to_string(),
            views: String::new(),
            votes: self.score.to_string(),
            url: self.url,
            source: source.to_string(),
            comments: String::new(),
        }
    }
}

#[derive(Deserialize)]
struct CommentListing {
    data: CommentListingData,
}

#[derive(Deserialize)]
struct CommentListingData {
    #[serde(default)]
    children: Vec<CommentChild>,
}

#[derive(Deserialize)]
struct CommentChild {
    kind: String,
    data: CommentData,
}

#[derive(Deserialize)]
struct CommentData {
    #[serde(default)]
    body: String,
}

/// Parse one `/new` listing page into its submissions and the next cursor.
pub fn parse_listing(json: &str) -> Result<(Vec<Submission>, Option<String>)> {
    let listing: Listing = serde_json::from_str(json).context("decode reddit listing")?;
    let subs = listing.data.children.into_iter().map(|c| c.data).collect();
    Ok((subs, listing.data.after.filter(|a| !a.is_empty())))
}

/// First `limit` comment bodies of a `/comments/{id}` response, which is a
/// pair of listings: the submission, then its comment tree.
pub fn parse_comments(json: &str, limit: usize) -> Result<Vec<String>> {
    let listings: Vec<CommentListing> = serde_json::from_str(json).context("decode reddit comments")?;
    Ok(listings
        .into_iter()
        .nth(1)
        .map(|l| {
            l.data
                .children
                .into_iter()
                .filter(|c| c.kind == "t1" && !c.data.body.trim().is_empty())
                .map(|c| c.data.body)
                .take(limit)
                .collect()
        })
        .unwrap_or_default())
}

pub struct RedditCollector<'a, F: Fetcher + ?Sized, S: Sleeper + ?Sized> {
    site: &'a SiteConfig,
    opts: &'a CollectorOptions,
    creds: RedditCredentials,
    fetcher: &'a F,
    sleeper: &'a S,
}

impl<'a, F: Fetcher + ?Sized, S: Sleeper + ?Sized> RedditCollector<'a, F, S> {
    pub fn new(site: &'a SiteConfig, opts: &'a CollectorOptions, creds: RedditCredentials, fetcher: &'a F, sleeper: &'a S) -> Self {
        Self { site, opts, creds, fetcher, sleeper }
    }

    fn subreddit(&self) -> Result<String> {
        let raw = self.site.subreddit.as_deref().unwrap_or_default().trim();
        let s = raw.strip_prefix("r/").unwrap_or(raw);
        if s.is_empty() {
            bail!("site `{}` has no subreddit", self.site.name);
        }
        Ok(s.to_string())
    }

    pub fn access_token(&self) -> Result<String> {
        let basic = base64::engine::general_purpose::STANDARD
            .encode(format!("{}:{}", self.creds.client_id, self.creds.client_secret));
        let headers: Headers = vec![
            ("Authorization".into(), format!("Basic {basic}")),
            ("User-Agent".into(), self.creds.user_agent.clone()),
        ];
        let body = retry_call(TOKEN_URL, &self.opts.retry, self.sleeper, || {
            self.fetcher.post_form(TOKEN_URL, &headers, &[("grant_type", "client_credentials")])
        })
        .context("reddit token request")?;
        let tok: TokenResponse = serde_json::from_str(&body).context("decode reddit token")?;
        Ok(tok.access_token)
    }

    /// Top comments joined with " | ". A failed request logs and yields "".
    fn comments_for(&self, id: &str, headers: &Headers) -> String {
        let n = self.site.comments;
        if n == 0 || id.is_empty() {
            return String::new();
        }
        let url = format!("{API_BASE}/comments/{id}?limit={n}&depth=1&sort=confidence&raw_json=1");
        let parsed = retry_call(&url, &self.opts.retry, self.sleeper, || self.fetcher.get(&url, headers))
            .map_err(anyhow::Error::from)
            .and_then(|body| parse_comments(&body, n));
        match parsed {
            Ok(bodies) => bodies.join(" | "),
            Err(e) => {
                warn!("comments of {}: {:#}", id, e);
                String::new()
            }
        }
    }

    /// Newest submissions of the subreddit, up to the site limit.
    /// A failing listing page ends collection with what was gathered so far.
    pub fn collect(&self) -> Result<Vec<RawQuestion>> {
        let sub = self.subreddit()?;
        let token = self.access_token()?;
        let headers: Headers = vec![
            ("Authorization".into(), format!("bearer {token}")),
            ("User-Agent".into(), self.creds.user_agent.clone()),
        ];
        let (lo, _) = self.site.delay_window();
        let limit = self.site.limit;
        let pb = ProgressScope::count(self.opts.progress, format!("r/{sub}"), limit as u64);

        let mut out: Vec<RawQuestion> = Vec::new();
        let mut after: Option<String> = None;
        while out.len() < limit {
            let n = PAGE_LIMIT.min(limit - out.len());
            let mut url = format!("{API_BASE}/r/{sub}/new?limit={n}&raw_json=1");
            if let Some(a) = &after {
                url.push_str(&format!("&after={a}"));
            }
            let body = match retry_call(&url, &self.opts.retry, self.sleeper, || self.fetcher.get(&url, &headers)) {
                Ok(b) => b,
                Err(e) => {
                    warn!("r/{}: listing skipped: {}", sub, e);
                    break;
                }
            };
            let (subs, next) = match parse_listing(&body) {
                Ok(x) => x,
                Err(e) => {
                    warn!("r/{}: {:#}", sub, e);
                    break;
                }
            };
            if subs.is_empty() {
                break;
            }
            pb.inc(subs.len() as u64);
            for s in subs.into_iter().take(limit - out.len()) {
                let comments = self.comments_for(&s.id, &headers);
                let mut raw = s.into_raw(&self.site.name);
                raw.comments = comments;
                out.push(raw);
            }
            match next {
                Some(a) => after = Some(a),
                None => break,
            }
            self.sleeper.sleep(lo);
        }
        pb.finish(format!("r/{sub}: {} posts", out.len()));
        info!(posts = out.len(), "collected r/{}", sub);
        Ok(out)
    }
}
