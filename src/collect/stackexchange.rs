//! Scraper for Stack Overflow and Stack Exchange listing/search pages.

use super::http::{fetch_with_retry, random_headers, Fetcher, Sleeper};
use crate::config::{CollectorOptions, SiteConfig};
use crate::progress::ProgressScope;
use crate::schema::RawQuestion;
use anyhow::{anyhow, Result};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use scraper::{ElementRef, Html, Selector};
use tracing::{info, warn};

pub const NO_DETAILS: &str = "No details provided.";

/// One entry of a listing page, before its question page is visited.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct ListingItem {
    pub title: String,
    pub url: String,
    pub votes: String,
    pub answers: String,
    pub views: String,
}

/// What a question page adds to its listing entry.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct QuestionDetails {
    pub body: String,
    pub date: String,
    pub views: Option<String>,
}

fn sel(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow!("bad selector `{css}`: {e}"))
}

/// Compiled CSS selectors for listing and question pages.
pub struct Selectors {
    summary: Selector,
    title_link: Selector,
    stat_item: Selector,
    stat_number: Selector,
    body: Selector,
    date_div: Selector,
    time: Selector,
    viewed_div: Selector,
}

impl Selectors {
    pub fn new() -> Result<Self> {
        Ok(Self {
            summary: sel("div.s-post-summary")?,
            title_link: sel("a.s-link")?,
            stat_item: sel(".s-post-summary--stats-item")?,
            stat_number: sel(".s-post-summary--stats-item-number")?,
            body: sel("div.s-prose.js-post-body")?,
            date_div: sel("div.flex--item.ws-nowrap.mr16.mb8")?,
            time: sel("time")?,
            viewed_div: sel("div.flex--item.ws-nowrap.mb8")?,
        })
    }
}

fn text_of(el: ElementRef<'_>) -> String {
    el.text().collect::<String>().trim().to_string()
}

fn absolute(host: &str, href: &str) -> String {
    if href.starts_with("http://") || href.starts_with("https://") {
        href.to_string()
    } else {
        format!("{}/{}", host.trim_end_matches('/'), href.trim_start_matches('/'))
    }
}

/// Parse every `.s-post-summary` of a listing page.
/// Missing stats default to "0"; entries without a title link are skipped.
pub fn parse_listing(html: &str, host: &str, s: &Selectors) -> Vec<ListingItem> {
    let doc = Html::parse_document(html);
    let mut out = Vec::new();
    for summary in doc.select(&s.summary) {
        let Some(link) = summary.select(&s.title_link).next() else {
            continue;
        };
        let href = link.value().attr("href").unwrap_or_default();
        let number = |el: ElementRef<'_>| el.select(&s.stat_number).next().map(text_of);

        let mut votes = summary.select(&s.stat_number).next().map(text_of);
        let mut answers = None;
        let mut views = None;
        for item in summary.select(&s.stat_item) {
            let title = item.value().attr("title").unwrap_or_default().to_lowercase();
            let classes = item.value().attr("class").unwrap_or_default();
            if title.contains("answer") || classes.contains("has-answers") {
                answers = answers.or_else(|| number(item));
            } else if title.contains("view") {
                views = views.or_else(|| number(item));
            } else if title.contains("vote") || classes.contains("stats-item__emphasized") {
                votes = number(item).or(votes);
            }
        }

        out.push(ListingItem {
            title: text_of(link),
            url: absolute(host, href),
            votes: votes.unwrap_or_else(|| "0".into()),
            answers: answers.unwrap_or_else(|| "0".into()),
            views: views.unwrap_or_else(|| "0".into()),
        });
    }
    out
}

/// Body text (one line per text node), post date and view count of a question page.
pub fn parse_question_page(html: &str, s: &Selectors) -> QuestionDetails {
    let doc = Html::parse_document(html);
    let body = doc
        .select(&s.body)
        .next()
        .map(|b| b.text().map(str::trim).filter(|t| !t.is_empty()).collect::<Vec<_>>().join("\n"))
        .filter(|b| !b.is_empty())
        .unwrap_or_else(|| NO_DETAILS.to_string());

    let date = doc
        .select(&s.date_div)
        .next()
        .and_then(|div| {
            div.value()
                .attr("title")
                .map(str::to_string)
                .or_else(|| div.select(&s.time).find_map(|t| t.value().attr("datetime").map(str::to_string)))
        })
        .unwrap_or_default();

    let views = doc
        .select(&s.viewed_div)
        .find(|d| d.value().attr("title").is_some_and(|t| t.contains("Viewed")))
        .map(|d| text_of(d).replace("Viewed", "").replace("times", "").trim().to_string());

    QuestionDetails { body, date, views }
}

/// `{base}{sep}page={n}` where `sep` is `&` if the base already has a query.
pub fn page_url(base: &str, page: u32) -> String {
    let sep = if base.contains('?') { '&' } else { '?' };
    format!("{base}{sep}page={page}")
}

pub struct StackExchangeCollector<'a, F: Fetcher + ?Sized, S: Sleeper + ?Sized> {
    site: &'a SiteConfig,
    opts: &'a CollectorOptions,
    fetcher: &'a F,
    sleeper: &'a S,
    selectors: Selectors,
    rng: StdRng,
}

impl<'a, F: Fetcher + ?Sized, S: Sleeper + ?Sized> StackExchangeCollector<'a, F, S> {
    pub fn new(site: &'a SiteConfig, opts: &'a CollectorOptions, fetcher: &'a F, sleeper: &'a S) -> Result<Self> {
        let rng = match opts.seed {
            Some(seed) => StdRng::seed_from_u64(seed),
            None => StdRng::from_entropy(),
        };
        Ok(Self { site, opts, fetcher, sleeper, selectors: Selectors::new()?, rng })
    }

    fn host(&self) -> &str {
        if self.site.host.is_empty() {
            &self.site.base_url
        } else {
            &self.site.host
        }
    }

    fn details(&mut self, url: &str) -> QuestionDetails {
        let headers = random_headers(&mut self.rng, self.site.referer());
        match fetch_with_retry(self.fetcher, url, &headers, &self.opts.retry, self.sleeper) {
            Ok(html) => parse_question_page(&html, &self.selectors),
            Err(e) => {
                warn!("{}: question page skipped: {}", url, e);
                QuestionDetails { body: NO_DETAILS.to_string(), ..Default::default() }
            }
        }
    }

    /// All questions of one listing page. Failures yield an empty page.
    pub fn scrape_page(&mut self, page: u32) -> Vec<RawQuestion> {
        let url = page_url(&self.site.base_url, page);
        let headers = random_headers(&mut self.rng, self.site.referer());
        let html = match fetch_with_retry(self.fetcher, &url, &headers, &self.opts.retry, self.sleeper) {
            Ok(h) => h,
            Err(e) => {
                warn!("{}: page {} skipped: {}", self.site.name, page, e);
                return Vec::new();
            }
        };
        let items = parse_listing(&html, self.host(), &self.selectors);
        if items.is_empty() {
            warn!("{}: no questions found on page {}", self.site.name, page);
        }

        let mut out = Vec::with_capacity(items.len());
        for item in items {
            let d = if self.opts.fetch_details {
                self.details(&item.url)
            } else {
                QuestionDetails { body: NO_DETAILS.to_string(), ..Default::default() }
            };
            let views = if item.views == "0" { d.views.unwrap_or(item.views) } else { item.views };
            out.push(RawQuestion {
                question_title: item.title,
                question_text: d.body,
                date: d.date,
                answers: item.answers,
                views,
                votes: item.votes,
                url: item.url,
                source: self.site.name.clone(),
                comments: String::new(),
            });
        }
        out
    }

    /// Walk the configured page range, pausing between pages, until a page
    /// comes back empty.
    pub fn collect(&mut self) -> Vec<RawQuestion> {
        let first = self.site.first_page;
        let last = self.site.last_page.max(first);
        let (lo, hi) = self.site.delay_window();
        let pb = ProgressScope::count(self.opts.progress, self.site.name.clone(), u64::from(last - first + 1));

        let mut all = Vec::new();
        for page in first..=last {
            let rows = self.scrape_page(page);
            pb.inc(1);
            if rows.is_empty() {
                info!("{}: stopping at empty page {}", self.site.name, page);
                break;
            }
            all.extend(rows);
            if page < last {
                let wait = if hi > lo { self.rng.gen_range(lo..=hi) } else { lo };
                self.sleeper.sleep(wait);
            }
        }
        pb.finish(format!("{}: {} questions", self.site.name, all.len()));
        all
    }
}
