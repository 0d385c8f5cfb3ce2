//! Strategy chain that turns a list of candidate URLs into one complete
//! (total, client) tally.
//!
//! Every (URL, strategy) pair is one endpoint. Endpoints are tried in order
//! with a fixed pause in between; transient failures on an endpoint are
//! retried in place according to the [`RetryPolicy`]. The first endpoint
//! whose page yields both counts wins.

use crate::challenge::ChallengeDetector;
use crate::client::ClientKind;
use crate::error::{Error, Result};
use crate::extract::{Extraction, Extractor, Tally};
use crate::metrics::{AttemptOutcome, MetricsCollector};
use crate::retry::{pause, RetryDecision, RetryPolicy};
use crate::source::Source;
use reqwest::header::{
    HeaderMap, HeaderName, HeaderValue, ACCEPT, ACCEPT_LANGUAGE, CACHE_CONTROL, USER_AGENT,
};
use reqwest::{Client, StatusCode};
use std::fmt;
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio_util::sync::CancellationToken;

pub const DIRECT_USER_AGENT: &str = "Mozilla/5.0 (Macintosh; Intel Mac OS X 10_15_7) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36";

pub const ALTERNATE_USER_AGENTS: &[&str] = &[
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (X11; Linux x86_64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64; rv:109.0) Gecko/20100101 Firefox/121.0",
];

const HTML_ACCEPT: &str = "text/html,application/xhtml+xml,application/xml;q=0.9,image/avif,image/webp,*/*;q=0.8";

/// How a request is dressed up before it is sent.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Strategy {
    /// Plain GET with a fixed desktop user agent
    Direct,
    /// GET carrying the full header set a browser sends on navigation
    Browser { user_agent: &'static str },
}

impl Strategy {
    pub fn headers(&self) -> HeaderMap {
        let mut headers = HeaderMap::new();
        match self {
            Strategy::Direct => {
                headers.insert(USER_AGENT, HeaderValue::from_static(DIRECT_USER_AGENT));
                headers.insert(ACCEPT, HeaderValue::from_static(HTML_ACCEPT));
            }
            Strategy::Browser { user_agent } => {
                headers.insert(USER_AGENT, HeaderValue::from_static(*user_agent));
                headers.insert(ACCEPT, HeaderValue::from_static(HTML_ACCEPT));
                headers.insert(ACCEPT_LANGUAGE, HeaderValue::from_static("en-US,en;q=0.9"));
                headers.insert(CACHE_CONTROL, HeaderValue::from_static("max-age=0"));
                for (name, value) in [
                    (
                        "sec-ch-ua",
                        "\"Not_A Brand\";v=\"8\", \"Chromium\";v=\"120\", \"Google Chrome\";v=\"120\"",
                    ),
                    ("sec-ch-ua-mobile", "?0"),
                    ("sec-ch-ua-platform", "\"Windows\""),
                    ("sec-fetch-dest", "document"),
                    ("sec-fetch-mode", "navigate"),
                    ("sec-fetch-site", "none"),
                    ("sec-fetch-user", "?1"),
                    ("upgrade-insecure-requests", "1"),
                ] {
                    headers.insert(HeaderName::from_static(name), HeaderValue::from_static(value));
                }
            }
        }
        headers
    }
}

impl fmt::Display for Strategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Strategy::Direct => write!(f, "direct"),
            Strategy::Browser { user_agent } => write!(f, "browser[{}]", user_agent),
        }
    }
}

/// One request against one endpoint, kept only for diagnostics.
#[derive(Debug, Clone)]
pub struct FetchAttempt<'a> {
    pub url: &'a str,
    pub strategy: Strategy,
    pub attempt: u32,
    pub outcome: AttemptOutcome,
}

impl fmt::Display for FetchAttempt<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} via {} (attempt {}): {:?}",
            self.url, self.strategy, self.attempt, self.outcome
        )
    }
}

#[derive(Debug, Clone)]
pub struct FetcherOptions {
    pub retry: RetryPolicy,
    /// Pause between two endpoints, to stay under the site's rate limit
    pub attempt_delay: Duration,
    pub request_timeout: Duration,
    pub detector: ChallengeDetector,
}

impl Default for FetcherOptions {
    fn default() -> Self {
        Self {
            retry: RetryPolicy::default(),
            attempt_delay: Duration::from_secs(2),
            request_timeout: Duration::from_secs(30),
            detector: ChallengeDetector::default(),
        }
    }
}

struct Page {
    status: StatusCode,
    body: String,
}

/// Result of working one endpoint to the end.
#[derive(Debug)]
enum Probe {
    Complete(Tally),
    Incomplete(Extraction),
    /// `blocked` is set when the challenge came with a 403.
    Challenge { blocked: bool },
}

pub struct Fetcher {
    client: Client,
    extractor: Arc<dyn Extractor>,
    strategies: Vec<Strategy>,
    options: FetcherOptions,
    metrics: Arc<MetricsCollector>,
}

impl Fetcher {
    pub fn new(source: &Source, options: FetcherOptions, metrics: Arc<MetricsCollector>) -> Result<Self> {
        let client = Client::builder().timeout(options.request_timeout).build()?;

        Ok(Self {
            client,
            extractor: source.extractor.clone(),
            strategies: source.strategies.clone(),
            options,
            metrics,
        })
    }

    /// Walks `urls` × strategies until one endpoint yields a complete tally.
    ///
    /// Fails with the last concrete error seen, or [`Error::Exhausted`] when
    /// every endpoint answered with a bot challenge.
    pub async fn fetch(
        &self,
        urls: &[String],
        client: ClientKind,
        cancel: &CancellationToken,
    ) -> Result<Tally> {
        let mut last_err: Option<Error> = None;
        let mut tried = 0usize;

        for url in urls {
            for strategy in &self.strategies {
                if tried > 0 {
                    pause(self.options.attempt_delay, cancel).await?;
                }
                tried += 1;
                log::debug!("Trying {} with {} strategy", url, strategy);

                match self.probe(url, *strategy, client, cancel).await {
                    Ok(Probe::Complete(tally)) => {
                        log::info!("Successfully retrieved data from {}", url);
                        return Ok(tally);
                    }
                    Ok(Probe::Challenge { blocked }) => {
                        log::debug!("Bot challenge at {} using {} strategy", url, strategy);
                        if blocked {
                            log::debug!("{} is blocked, skipping its remaining strategies", url);
                            break;
                        }
                    }
                    Ok(Probe::Incomplete(found)) => {
                        self.metrics.increment_incomplete();
                        if found.is_partial() {
                            log::info!(
                                "Got partial data from {}: total={:?}, client={:?}",
                                url,
                                found.total,
                                found.client
                            );
                        } else {
                            log::debug!("No client data found at {}", url);
                        }
                        last_err = Some(Error::Incomplete {
                            url: url.clone(),
                            total: found.total,
                            client: found.client,
                        });
                    }
                    Err(Error::Cancelled) => return Err(Error::Cancelled),
                    Err(err) => {
                        log::warn!("Failed to get data from {}: {}", url, err);
                        last_err = Some(err);
                    }
                }
            }
        }

        Err(last_err.unwrap_or(Error::Exhausted { endpoints: tried }))
    }

    async fn probe(
        &self,
        url: &str,
        strategy: Strategy,
        client: ClientKind,
        cancel: &CancellationToken,
    ) -> Result<Probe> {
        let mut attempt = 0u32;
        loop {
            let started = Instant::now();
            let result = match self.request(url, strategy, cancel).await {
                Ok(page) => self.inspect(url, page, client),
                Err(err) => Err(err),
            };

            let outcome = match &result {
                Err(Error::Cancelled) => return Err(Error::Cancelled),
                Ok(Probe::Complete(_)) => AttemptOutcome::Success,
                Ok(Probe::Challenge { .. }) => AttemptOutcome::ChallengeDetected,
                Ok(Probe::Incomplete(_)) => AttemptOutcome::Unusable,
                Err(Error::Http(_)) => AttemptOutcome::NetworkError,
                Err(Error::Status { .. }) => AttemptOutcome::HttpError,
                // Parse and invariant failures on a page that did arrive
                Err(_) => AttemptOutcome::Unusable,
            };
            self.metrics.record_attempt(outcome, started.elapsed());
            log::debug!(
                "{}",
                FetchAttempt {
                    url,
                    strategy,
                    attempt,
                    outcome
                }
            );

            let err = match result {
                Ok(probe) => return Ok(probe),
                Err(err) => err,
            };
            match self.options.retry.should_retry(attempt, &err) {
                RetryDecision::Retry(delay) => {
                    log::info!(
                        "Error during HTTP request to {}, retrying in {:?} (retry {}): {}",
                        url,
                        delay,
                        attempt + 1,
                        err
                    );
                    self.metrics.increment_retries();
                    pause(delay, cancel).await?;
                    attempt += 1;
                }
                RetryDecision::GiveUp => return Err(err),
            }
        }
    }

    async fn request(&self, url: &str, strategy: Strategy, cancel: &CancellationToken) -> Result<Page> {
        let send = self.client.get(url).headers(strategy.headers()).send();
        let response = tokio::select! {
            _ = cancel.cancelled() => return Err(Error::Cancelled),
            res = send => res?,
        };

        let status = response.status();
        let body = tokio::select! {
            _ = cancel.cancelled() => return Err(Error::Cancelled),
            text = response.text() => text?,
        };
        log::debug!("{} answered {} with {} bytes", url, status, body.len());

        Ok(Page { status, body })
    }

    fn inspect(&self, url: &str, page: Page, client: ClientKind) -> Result<Probe> {
        let forbidden = page.status == StatusCode::FORBIDDEN;
        if !page.status.is_success() && !forbidden {
            return Err(Error::Status {
                url: url.to_string(),
                status: page.status.as_u16(),
            });
        }

        if self.options.detector.is_challenge(&page.body) {
            return Ok(Probe::Challenge { blocked: forbidden });
        }
        if forbidden {
            log::debug!("Received 403 from {} without a challenge page, extracting anyway", url);
        }

        let found = self.extractor.extract(&page.body, client)?;
        Ok(match found.complete() {
            Some(tally) => Probe::Complete(tally),
            None => Probe::Incomplete(found),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn browser_strategy_sends_navigation_headers() {
        let headers = Strategy::Browser {
            user_agent: ALTERNATE_USER_AGENTS[0],
        }
        .headers();
        assert_eq!(headers[USER_AGENT], ALTERNATE_USER_AGENTS[0]);
        assert_eq!(headers["sec-fetch-mode"], "navigate");
        assert!(headers.contains_key(ACCEPT_LANGUAGE));
    }

    #[test]
    fn direct_strategy_is_minimal() {
        let headers = Strategy::Direct.headers();
        assert_eq!(headers[USER_AGENT], DIRECT_USER_AGENT);
        assert!(!headers.contains_key("sec-fetch-mode"));
    }

    #[test]
    fn attempt_renders_for_logs() {
        let attempt = FetchAttempt {
            url: "https://ethernodes.org/",
            strategy: Strategy::Direct,
            attempt: 2,
            outcome: AttemptOutcome::ChallengeDetected,
        };
        assert_eq!(
            attempt.to_string(),
            "https://ethernodes.org/ via direct (attempt 2): ChallengeDetected"
        );
    }
}
