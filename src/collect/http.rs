//! HTTP plumbing shared by all collectors: the fetcher seam, rotated
//! request headers and one bounded retry loop.

use crate::config::RetryPolicy;
use rand::seq::SliceRandom;
use rand::Rng;
use std::time::Duration;
use tracing::warn;

pub const USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/91.0.4472.124 Safari/537.36",
    "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/90.0.4430.93 Safari/537.36",
    "Mozilla/5.0 (X11; Ubuntu; Linux x86_64; rv:89.0) Gecko/20100101 Firefox/89.0",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:87.0) Gecko/20100101 Firefox/87.0",
    "Mozilla/5.0 (iPhone; CPU iPhone OS 14_6 like Mac OS X) AppleWebKit/605.1.15 (KHTML, like Gecko) Version/14.0 Mobile/15E148 Safari/604.1",
];

pub type Headers = Vec<(String, String)>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct HttpResponse {
    pub status: u16,
    pub retry_after: Option<Duration>,
    pub body: String,
}

impl HttpResponse {
    pub fn ok(body: impl Into<String>) -> Self {
        Self { status: 200, retry_after: None, body: body.into() }
    }

    /// 200 yields the body; 429 and every other status become errors.
    pub fn into_body(self) -> Result<String, FetchError> {
        match self.status {
            200 => Ok(self.body),
            429 => Err(FetchError::RateLimited { retry_after: self.retry_after }),
            s => Err(FetchError::Status(s)),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("rate limited (retry after {retry_after:?})")]
    RateLimited { retry_after: Option<Duration> },
    #[error("unexpected HTTP status {0}")]
    Status(u16),
    #[error("transport error: {0}")]
    Transport(String),
    #[error("{url}: giving up after {attempts} attempts")]
    RetriesExhausted { url: String, attempts: u32 },
}

/// Network seam; tests script responses through their own implementation.
pub trait Fetcher {
    fn get(&self, url: &str, headers: &[(String, String)]) -> Result<HttpResponse, FetchError>;
    fn post_form(&self, url: &str, headers: &[(String, String)], form: &[(&str, &str)]) -> Result<HttpResponse, FetchError>;
}

pub trait Sleeper {
    fn sleep(&self, d: Duration);
}

pub struct ThreadSleeper;

impl Sleeper for ThreadSleeper {
    fn sleep(&self, d: Duration) {
        std::thread::sleep(d);
    }
}

/// Production fetcher on a shared `ureq` agent.
pub struct UreqFetcher {
    agent: ureq::Agent,
}

impl Default for UreqFetcher {
    fn default() -> Self {
        Self::new(Duration::from_secs(30))
    }
}

impl UreqFetcher {
    pub fn new(timeout: Duration) -> Self {
        Self { agent: ureq::AgentBuilder::new().timeout(timeout).build() }
    }

    fn finish(res: Result<ureq::Response, ureq::Error>) -> Result<HttpResponse, FetchError> {
        let resp = match res {
            Ok(r) => r,
            Err(ureq::Error::Status(_, r)) => r,
            Err(ureq::Error::Transport(t)) => return Err(FetchError::Transport(t.to_string())),
        };
        let status = resp.status();
        let retry_after = resp.header("Retry-After").and_then(parse_retry_after);
        let body = resp.into_string().map_err(|e| FetchError::Transport(e.to_string()))?;
        Ok(HttpResponse { status, retry_after, body })
    }
}

impl Fetcher for UreqFetcher {
    fn get(&self, url: &str, headers: &[(String, String)]) -> Result<HttpResponse, FetchError> {
        let mut req = self.agent.get(url);
        for (k, v) in headers {
            req = req.set(k, v);
        }
        Self::finish(req.call())
    }

    fn post_form(&self, url: &str, headers: &[(String, String)], form: &[(&str, &str)]) -> Result<HttpResponse, FetchError> {
        let mut req = self.agent.post(url);
        for (k, v) in headers {
            req = req.set(k, v);
        }
        Self::finish(req.send_form(form))
    }
}

/// `Retry-After` in whole seconds; HTTP-date values are ignored.
pub fn parse_retry_after(v: &str) -> Option<Duration> {
    v.trim().parse::<u64>().ok().map(Duration::from_secs)
}

/// Rotated User-Agent plus fixed language and the site's referer.
pub fn random_headers<R: Rng + ?Sized>(rng: &mut R, referer: &str) -> Headers {
    let ua = USER_AGENTS.choose(rng).copied().unwrap_or(USER_AGENTS[0]);
    vec![
        ("User-Agent".to_string(), ua.to_string()),
        ("Accept-Language".to_string(), "en-US,en;q=0.9".to_string()),
        ("Referer".to_string(), referer.to_string()),
    ]
}

/// Run `call` until it yields a 200 body. Rate limits and transport errors
/// are retried per `policy`; any other status fails immediately.
pub fn retry_call<S, F>(url: &str, policy: &RetryPolicy, sleeper: &S, mut call: F) -> Result<String, FetchError>
where
    S: Sleeper + ?Sized,
    F: FnMut() -> Result<HttpResponse, FetchError>,
{
    let mut retries = 0u32;
    loop {
        let err = match call().and_then(HttpResponse::into_body) {
            Ok(body) => return Ok(body),
            Err(e) => e,
        };
        let (retry_after, rate_limited) = match &err {
            FetchError::RateLimited { retry_after } => (*retry_after, true),
            FetchError::Transport(_) => (None, false),
            _ => return Err(err),
        };
        if !policy.allows(retries) {
            return Err(FetchError::RetriesExhausted { url: url.to_string(), attempts: retries + 1 });
        }
        let wait = policy.delay_for(retries, retry_after, rate_limited);
        warn!("{}: {}; retrying in {:?}", url, err, wait);
        sleeper.sleep(wait);
        retries += 1;
    }
}

/// GET `url` with retries.
pub fn fetch_with_retry<F, S>(fetcher: &F, url: &str, headers: &[(String, String)], policy: &RetryPolicy, sleeper: &S) -> Result<String, FetchError>
where
    F: Fetcher + ?Sized,
    S: Sleeper + ?Sized,
{
    retry_call(url, policy, sleeper, || fetcher.get(url, headers))
}
