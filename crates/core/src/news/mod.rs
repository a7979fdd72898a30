//! Headline links scraped from the quote page of a finance site.
//!
//! The markup belongs to a third party. The orchestrator treats every failure here as
//! "no headlines".

use crate::config::Settings;
use crate::domain::headline::{Headline, MAX_HEADLINES};
use anyhow::{Context, Result};
use reqwest::header::{HeaderMap, HeaderValue, USER_AGENT};
use scraper::{Html, Selector};
use std::time::Duration;

const DEFAULT_TIMEOUT_SECS: u64 = 5;
const HEADLINE_CLASS: &str = "Mb(5px)";
const BROWSER_USER_AGENT: &str =
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/126.0 Safari/537.36";

#[async_trait::async_trait]
pub trait HeadlineSource: Send + Sync {
    async fn fetch_headlines(&self, symbol: &str) -> Result<Vec<Headline>>;
}

#[derive(Debug, Clone)]
pub struct QuotePageScraper {
    http: reqwest::Client,
    base_url: String,
}

impl QuotePageScraper {
    pub fn from_settings(settings: &Settings) -> Result<Self> {
        let timeout_secs = std::env::var("NEWS_TIMEOUT_SECS")
            .ok()
            .and_then(|s| s.parse::<u64>().ok())
            .unwrap_or(DEFAULT_TIMEOUT_SECS);

        let mut headers = HeaderMap::new();
        headers.insert(USER_AGENT, HeaderValue::from_static(BROWSER_USER_AGENT));

        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .default_headers(headers)
            .build()
            .context("failed to build news http client")?;

        Ok(Self {
            http,
            base_url: settings.news_base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, symbol: &str) -> Result<reqwest::Url> {
        let mut url = reqwest::Url::parse(&self.base_url)
            .with_context(|| format!("invalid news base url: {}", self.base_url))?;
        url.path_segments_mut()
            .map_err(|_| anyhow::anyhow!("news base url cannot be a base: {}", self.base_url))?
            .pop_if_empty()
            .extend(["quote", symbol]);
        url.query_pairs_mut().append_pair("p", symbol);
        Ok(url)
    }
}

#[async_trait::async_trait]
impl HeadlineSource for QuotePageScraper {
    async fn fetch_headlines(&self, symbol: &str) -> Result<Vec<Headline>> {
        let url = self.url(symbol)?;

        let res = self
            .http
            .get(url)
            .send()
            .await
            .context("news page request failed")?;

        let status = res.status();
        let body = res.text().await.context("failed to read news page")?;
        if !status.is_success() {
            anyhow::bail!("news page HTTP {status}");
        }

        parse_headlines(&body, &self.base_url)
    }
}

/// Extracts up to [`MAX_HEADLINES`] links from `h3` elements carrying the headline class.
///
/// Only the first five matching headings are considered; a heading without a usable
/// anchor is skipped, not replaced by a later one.
pub fn parse_headlines(html: &str, base_url: &str) -> Result<Vec<Headline>> {
    let heading = selector("h3")?;
    let anchor = selector("a")?;

    let doc = Html::parse_document(html);
    let mut out = Vec::new();

    let headings = doc
        .select(&heading)
        .filter(|el| el.value().classes().any(|c| c == HEADLINE_CLASS))
        .take(MAX_HEADLINES);

    for h in headings {
        let Some(a) = h.select(&anchor).next() else {
            continue;
        };
        let title = a.text().collect::<String>().trim().to_string();
        if title.is_empty() {
            continue;
        }
        let Some(href) = a.value().attr("href") else {
            continue;
        };
        out.push(Headline {
            title,
            url: absolute_url(base_url, href),
        });
    }

    Ok(out)
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| anyhow::anyhow!("invalid selector {css:?}: {e}"))
}

fn absolute_url(base_url: &str, href: &str) -> String {
    let href = href.trim();
    if href.starts_with("http://") || href.starts_with("https://") {
        return href.to_string();
    }
    let base = base_url.trim_end_matches('/');
    if href.starts_with('/') {
        format!("{base}{href}")
    } else {
        format!("{base}/{href}")
    }
}
