#[path = "common/mod.rs"]
mod common;

use common::*;
use qdiscourse::collect::{
    fetch_with_retry, page_url, parse_listing, parse_question_page, parse_reddit_comments, parse_reddit_listing,
    parse_retry_after, FetchError, Fetcher, HttpResponse, RedditCollector, Selectors, Sleeper, StackExchangeCollector,
    NO_DETAILS,
};
use qdiscourse::{collect_sites, CollectorOptions, RedditCredentials, RetryPolicy, SitesFile};
use std::cell::RefCell;
use std::collections::VecDeque;
use std::time::Duration;

/// Replays canned responses in order and records every requested URL.
#[derive(Default)]
struct ScriptedFetcher {
    responses: RefCell<VecDeque<Result<HttpResponse, FetchError>>>,
    requested: RefCell<Vec<String>>,
}

impl ScriptedFetcher {
    fn new(responses: Vec<Result<HttpResponse, FetchError>>) -> Self {
        Self { responses: RefCell::new(responses.into()), requested: RefCell::default() }
    }
}

impl Fetcher for ScriptedFetcher {
    fn get(&self, url: &str, _headers: &[(String, String)]) -> Result<HttpResponse, FetchError> {
        self.requested.borrow_mut().push(url.to_string());
        self.responses
            .borrow_mut()
            .pop_front()
            .unwrap_or_else(|| Ok(HttpResponse { status: 404, retry_after: None, body: String::new() }))
    }

    fn post_form(&self, url: &str, headers: &[(String, String)], _form: &[(&str, &str)]) -> Result<HttpResponse, FetchError> {
        self.get(url, headers)
    }
}

#[derive(Default)]
struct RecordingSleeper {
    waits: RefCell<Vec<Duration>>,
}

impl Sleeper for RecordingSleeper {
    fn sleep(&self, d: Duration) {
        self.waits.borrow_mut().push(d);
    }
}

fn rate_limited(secs: Option<u64>) -> Result<HttpResponse, FetchError> {
    Ok(HttpResponse { status: 429, retry_after: secs.map(Duration::from_secs), body: String::new() })
}

const LISTING: &str = r#"
<html><body>
<div class="s-post-summary">
  <div class="s-post-summary--stats-item s-post-summary--stats-item__emphasized" title="Score of 5">
    <span class="s-post-summary--stats-item-number">5</span><span>votes</span>
  </div>
  <div class="s-post-summary--stats-item has-answers" title="2 answers">
    <span class="s-post-summary--stats-item-number">2</span><span>answers</span>
  </div>
  <div class="s-post-summary--stats-item" title="1,234 views">
    <span class="s-post-summary--stats-item-number">1.2k</span><span>views</span>
  </div>
  <h3><a class="s-link" href="/questions/1/surface-code">Surface code threshold?</a></h3>
</div>
<div class="s-post-summary">
  <h3><a class="s-link" href="https://other.example/q/2">Stim sampling</a></h3>
</div>
<div class="s-post-summary"><h3>no link here</h3></div>
</body></html>
"#;

const QUESTION_PAGE: &str = r#"
<html><body>
<div class="flex--item ws-nowrap mr16 mb8" title="2023-05-01 12:30:00Z"><span>Asked</span><time datetime="2023-05-01T12:30:00">1 May</time></div>
<div class="flex--item ws-nowrap mb8" title="Viewed 1,234 times">Viewed 1,234 times</div>
<div class="s-prose js-post-body">
  <p>How is the threshold estimated?</p>
  <pre><code>import stim</code></pre>
</div>
</body></html>
"#;

#[test]
fn listing_items_carry_stats_and_absolute_urls() {
    let s = Selectors::new().unwrap();
    let items = parse_listing(LISTING, "https://quantumcomputing.stackexchange.com", &s);
    assert_eq!(items.len(), 2);

    assert_eq!(items[0].title, "Surface code threshold?");
    assert_eq!(items[0].url, "https://quantumcomputing.stackexchange.com/questions/1/surface-code");
    assert_eq!(items[0].votes, "5");
    assert_eq!(items[0].answers, "2");
    assert_eq!(items[0].views, "1.2k");

    // missing stats default to zero
    assert_eq!(items[1].url, "https://other.example/q/2");
    assert_eq!((items[1].votes.as_str(), items[1].answers.as_str(), items[1].views.as_str()), ("0", "0", "0"));
}

#[test]
fn question_page_yields_body_date_and_views() {
    let s = Selectors::new().unwrap();
    let d = parse_question_page(QUESTION_PAGE, &s);
    assert_eq!(d.body, "How is the threshold estimated?\nimport stim");
    assert_eq!(d.date, "2023-05-01 12:30:00Z");
    assert_eq!(d.views.as_deref(), Some("1,234"));

    let empty = parse_question_page("<html></html>", &s);
    assert_eq!(empty.body, NO_DETAILS);
    assert_eq!(empty.date, "");
}

#[test]
fn page_urls_respect_existing_queries() {
    assert_eq!(page_url("https://x.org/questions?tab=newest", 3), "https://x.org/questions?tab=newest&page=3");
    assert_eq!(page_url("https://x.org/questions", 1), "https://x.org/questions?page=1");
}

#[test]
fn retry_after_waits_then_succeeds() {
    let fetcher = ScriptedFetcher::new(vec![rate_limited(Some(7)), rate_limited(None), Ok(HttpResponse::ok("hello"))]);
    let sleeper = RecordingSleeper::default();
    let policy = RetryPolicy::default();
    let body = fetch_with_retry(&fetcher, "https://x.org/p", &[], &policy, &sleeper).unwrap();

    assert_eq!(body, "hello");
    assert_eq!(*sleeper.waits.borrow(), vec![Duration::from_secs(7), policy.default_retry_after]);
    assert_eq!(fetcher.requested.borrow().len(), 3);
}

#[test]
fn retries_are_bounded() {
    let fetcher = ScriptedFetcher::new((0..5).map(|_| rate_limited(Some(1))).collect());
    let sleeper = RecordingSleeper::default();
    let policy = RetryPolicy::default().with_max_retries(2);
    let err = fetch_with_retry(&fetcher, "https://x.org/p", &[], &policy, &sleeper).unwrap_err();

    assert_eq!(err, FetchError::RetriesExhausted { url: "https://x.org/p".into(), attempts: 3 });
    assert_eq!(sleeper.waits.borrow().len(), 2);
}

#[test]
fn other_statuses_fail_without_retry() {
    let fetcher = ScriptedFetcher::new(vec![Ok(HttpResponse { status: 503, retry_after: None, body: String::new() })]);
    let sleeper = RecordingSleeper::default();
    let err = fetch_with_retry(&fetcher, "https://x.org/p", &[], &RetryPolicy::default(), &sleeper).unwrap_err();
    assert_eq!(err, FetchError::Status(503));
    assert!(sleeper.waits.borrow().is_empty());
}

#[test]
fn transport_errors_back_off_exponentially() {
    let fetcher = ScriptedFetcher::new(vec![
        Err(FetchError::Transport("reset".into())),
        Err(FetchError::Transport("reset".into())),
        Ok(HttpResponse::ok("ok")),
    ]);
    let sleeper = RecordingSleeper::default();
    let policy = RetryPolicy::default().with_backoff(Duration::from_secs(1), Duration::from_secs(60));
    fetch_with_retry(&fetcher, "https://x.org/p", &[], &policy, &sleeper).unwrap();
    assert_eq!(*sleeper.waits.borrow(), vec![Duration::from_secs(1), Duration::from_secs(2)]);
}

#[test]
fn unbounded_policy_keeps_retrying_both_failure_kinds() {
    let mut script: Vec<Result<HttpResponse, FetchError>> =
        (0..12).map(|_| Err(FetchError::Transport("reset".into()))).collect();
    script.push(rate_limited(None));
    script.push(rate_limited(Some(600)));
    script.push(Ok(HttpResponse::ok("done")));
    let fetcher = ScriptedFetcher::new(script);
    let sleeper = RecordingSleeper::default();
    let policy = RetryPolicy::unbounded()
        .with_backoff(Duration::from_secs(1), Duration::from_secs(30))
        .with_default_retry_after(Duration::from_secs(3));

    assert_eq!(fetch_with_retry(&fetcher, "https://x.org/p", &[], &policy, &sleeper).unwrap(), "done");
    let waits = sleeper.waits.borrow();
    assert_eq!(waits.len(), 14);
    assert_eq!(waits[4], Duration::from_secs(16));
    assert!(waits[5..12].iter().all(|w| *w == Duration::from_secs(30)));
    assert_eq!(waits[12], Duration::from_secs(3));
    // the server's wait is not shortened
    assert_eq!(waits[13], Duration::from_secs(600));
}

#[test]
fn retry_after_header_is_whole_seconds() {
    assert_eq!(parse_retry_after(" 12 "), Some(Duration::from_secs(12)));
    assert_eq!(parse_retry_after("Wed, 21 Oct 2015 07:28:00 GMT"), None);
}

fn se_sites(last_page: u32) -> SitesFile {
    SitesFile::parse(&format!(
        r#"
[[site]]
name = "qcse"
kind = "stack_exchange"
base_url = "https://qc.example/questions?tab=newest"
host = "https://qc.example"
first_page = 1
last_page = {last_page}
delay_min_secs = 1.0
delay_max_secs = 1.0
"#
    ))
    .unwrap()
}

#[test]
fn collection_stops_at_the_first_empty_page() {
    let sites = se_sites(5);
    let fetcher = ScriptedFetcher::new(vec![
        Ok(HttpResponse::ok(LISTING)),
        Ok(HttpResponse::ok("<html><body>nothing</body></html>")),
    ]);
    let sleeper = RecordingSleeper::default();
    let opts = CollectorOptions::default().with_progress(false).with_fetch_details(false).with_seed(1);

    let mut collector = StackExchangeCollector::new(&sites.sites[0], &opts, &fetcher, &sleeper).unwrap();
    let rows = collector.collect();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].source, "qcse");
    assert_eq!(rows[0].question_text, NO_DETAILS);
    assert_eq!(
        *fetcher.requested.borrow(),
        vec!["https://qc.example/questions?tab=newest&page=1", "https://qc.example/questions?tab=newest&page=2"]
    );
    // one politeness pause between the two pages
    assert_eq!(*sleeper.waits.borrow(), vec![Duration::from_secs(1)]);
}

#[test]
fn failed_question_pages_are_skipped_not_fatal() {
    let sites = se_sites(1);
    let fetcher = ScriptedFetcher::new(vec![
        Ok(HttpResponse::ok(LISTING)),
        Ok(HttpResponse::ok(QUESTION_PAGE)),
        Ok(HttpResponse { status: 404, retry_after: None, body: String::new() }),
    ]);
    let sleeper = RecordingSleeper::default();
    let opts = CollectorOptions::default().with_progress(false).with_seed(1);

    let mut collector = StackExchangeCollector::new(&sites.sites[0], &opts, &fetcher, &sleeper).unwrap();
    let rows = collector.collect();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].date, "2023-05-01 12:30:00Z");
    assert_eq!(rows[0].views, "1.2k");
    assert_eq!(rows[1].question_text, NO_DETAILS);
    // listing had no views, page fallback is missing too
    assert_eq!(rows[1].views, "0");
}

#[test]
fn collect_sites_writes_one_csv_per_site() {
    let out = temp_dir();
    let sites = se_sites(1);
    let fetcher = ScriptedFetcher::new(vec![Ok(HttpResponse::ok(LISTING))]);
    let opts = CollectorOptions::default().with_progress(false).with_fetch_details(false).with_seed(3);
    let written = collect_sites(&sites, &out, &opts, &fetcher, &RecordingSleeper::default()).unwrap();

    assert_eq!(written, vec![out.join("qcse.csv")]);
    assert_eq!(column(&written[0], "question_title"), vec!["Surface code threshold?", "Stim sampling"]);
}

#[test]
fn sites_file_validates_required_fields() {
    assert!(SitesFile::parse("[[site]]\nname = \"r\"\nkind = \"reddit\"\n").is_err());
    assert!(SitesFile::parse("[[site]]\nname = \"se\"\nkind = \"stack_exchange\"\n").is_err());
    let ok = SitesFile::parse("[[site]]\nname = \"r\"\nkind = \"reddit\"\nsubreddit = \"r/QuantumComputing\"\n").unwrap();
    assert_eq!(ok.sites[0].limit, 1000);
}

#[test]
fn reddit_listing_parses_submissions_and_cursor() {
    let json = r#"{"kind":"Listing","data":{"after":"t3_abc","children":[
        {"kind":"t3","data":{"title":"Qiskit on M1?","selftext":"it fails","score":12,"num_comments":3,
         "created_utc":1700000000.0,"url":"https://reddit.com/r/QuantumComputing/x"}},
        {"kind":"t3","data":{"title":"Link post"}}
    ]}}"#;
    let (subs, after) = parse_reddit_listing(json).unwrap();
    assert_eq!(after.as_deref(), Some("t3_abc"));
    assert_eq!(subs.len(), 2);

    let raw = subs[0].clone().into_raw("reddit");
    assert_eq!(raw.question_title, "Qiskit on M1?");
    assert_eq!(raw.votes, "12");
    assert_eq!(raw.answers, "3");
    assert_eq!(raw.date, "2023-11-14 22:13:20 UTC");
    assert_eq!(subs[1].selftext, "");

    let (_, none) = parse_reddit_listing(r#"{"data":{"after":"","children":[]}}"#).unwrap();
    assert_eq!(none, None);
}

const COMMENTS: &str = r#"[
    {"kind":"Listing","data":{"children":[{"kind":"t3","data":{"title":"Qiskit on M1?"}}]}},
    {"kind":"Listing","data":{"children":[
        {"kind":"t1","data":{"body":"reinstall rust"}},
        {"kind":"t1","data":{"body":"  "}},
        {"kind":"t1","data":{"body":"works on 1.0"}},
        {"kind":"t1","data":{"body":"third"}},
        {"kind":"more","data":{"count":4}}
    ]}}
]"#;

#[test]
fn reddit_comments_skip_blank_and_more_entries() {
    assert_eq!(parse_reddit_comments(COMMENTS, 2).unwrap(), vec!["reinstall rust", "works on 1.0"]);
    assert!(parse_reddit_comments("[]", 2).unwrap().is_empty());
    assert!(parse_reddit_comments("{}", 2).is_err());
}

#[test]
fn reddit_collector_attaches_top_comments() {
    let sites = SitesFile::parse(
        "[[site]]\nname = \"reddit\"\nkind = \"reddit\"\nsubreddit = \"r/Qiskit\"\nlimit = 2\ncomments = 2\ndelay_min_secs = 0.0\ndelay_max_secs = 0.0\n",
    )
    .unwrap();
    let listing = r#"{"data":{"after":null,"children":[
        {"kind":"t3","data":{"id":"a1","title":"Qiskit on M1?","selftext":"it fails","score":12,"num_comments":3,"created_utc":1700000000.0}},
        {"kind":"t3","data":{"id":"b2","title":"Transpiler question","score":1,"num_comments":0,"created_utc":1700000100.0}}
    ]}}"#;
    let fetcher = ScriptedFetcher::new(vec![
        Ok(HttpResponse::ok(r#"{"access_token":"tok"}"#)),
        Ok(HttpResponse::ok(listing)),
        Ok(HttpResponse::ok(COMMENTS)),
        Ok(HttpResponse { status: 500, retry_after: None, body: String::new() }),
    ]);
    let creds = RedditCredentials { client_id: "id".into(), client_secret: "secret".into(), user_agent: "test".into() };
    let opts = CollectorOptions::default().with_progress(false);
    let sleeper = RecordingSleeper::default();

    let rows = RedditCollector::new(&sites.sites[0], &opts, creds, &fetcher, &sleeper).collect().unwrap();
    assert_eq!(rows.len(), 2);
    assert_eq!(rows[0].comments, "reinstall rust | works on 1.0");
    // a failed comment request keeps the submission
    assert_eq!(rows[1].question_title, "Transpiler question");
    assert_eq!(rows[1].comments, "");

    let requested = fetcher.requested.borrow();
    assert_eq!(requested.len(), 4);
    assert!(requested[1].starts_with("https://oauth.reddit.com/r/Qiskit/new?limit=2"));
    assert!(requested[2].starts_with("https://oauth.reddit.com/comments/a1?limit=2"));
}
