// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Paginated collection from the GitHub REST API.
//!
//! The first request of a listing carries explicit `per_page` and `page`
//! parameters. Every following request uses the URL the server names in the
//! `rel="next"` entry of its `Link` header, verbatim, and collection stops as
//! soon as a response has no such entry. Page indices are never guessed once
//! the server has supplied a continuation, and no URL is requested twice.
//!
//! Responses are classified before their bodies are decoded. Authentication
//! and rate-limit failures surface as distinct [`Error`] variants and are never
//! retried; transport and 5xx failures are retried per [`RetryConfig`].

use std::collections::HashSet;

use chrono::DateTime;
use octocrab::Octocrab;
use regex::Regex;
use serde_json::Value;
use tracing::{debug, info, warn};

use crate::{
    error::Error,
    retry::{RetryConfig, retry_with_backoff},
};

/// Page size requested when none is configured; the GitHub maximum.
pub const DEFAULT_PER_PAGE: u32 = 100;

/// Response data the collector needs from one HTTP round-trip.
#[derive(Debug, Clone, PartialEq, Eq,)]
pub struct RawResponse
{
    /// HTTP status code.
    pub status:               u16,
    /// Raw `Link` header, when present.
    pub link:                 Option<String,>,
    /// Value of `x-ratelimit-remaining`, when present.
    pub rate_limit_remaining: Option<u64,>,
    /// Value of `x-ratelimit-reset` (epoch seconds), when present.
    pub rate_limit_reset:     Option<i64,>,
    /// Value of `retry-after` (seconds), when present.
    pub retry_after:          Option<u64,>,
    /// Response body as text.
    pub body:                 String,
}

impl RawResponse
{
    /// Successful JSON response without pagination metadata.
    pub fn ok(body: impl Into<String,>,) -> Self
    {
        Self {
            status:               200,
            link:                 None,
            rate_limit_remaining: None,
            rate_limit_reset:     None,
            retry_after:          None,
            body:                 body.into(),
        }
    }
}

/// Transport seam between the collector and the remote API.
///
/// `url` is either an API path (`/repos/...`) or an absolute URL taken from a
/// `Link` header. Implementations return any HTTP status as a response and
/// only fail for transport problems.
#[allow(async_fn_in_trait)]
pub trait PageSource
{
    /// Performs one authenticated GET request.
    async fn get(&self, url: &str,) -> Result<RawResponse, Error,>;
}

/// [`PageSource`] backed by an authenticated [`Octocrab`] client.
#[derive(Debug, Clone,)]
pub struct GitHubSource
{
    client: Octocrab,
}

impl GitHubSource
{
    /// Builds a client authenticated with a personal access token.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Unauthorized`] when the client cannot be initialized.
    pub fn new(token: &str,) -> Result<Self, Error,>
    {
        let client =
            Octocrab::builder().personal_token(token.to_owned(),).build().map_err(|e| {
                Error::Unauthorized {
                    message: format!("failed to initialize GitHub client: {e}"),
                }
            },)?;
        Ok(Self {
            client,
        },)
    }

    /// Wraps an already configured client.
    pub fn from_client(client: Octocrab,) -> Self
    {
        Self {
            client,
        }
    }
}

impl PageSource for GitHubSource
{
    async fn get(&self, url: &str,) -> Result<RawResponse, Error,>
    {
        let response = match self.client._get(url.to_owned(),).await {
            Ok(response,) => response,
            Err(octocrab::Error::GitHub {
                source, ..
            },) => {
                return Ok(RawResponse {
                    status:               source.status_code.as_u16(),
                    link:                 None,
                    rate_limit_remaining: None,
                    rate_limit_reset:     None,
                    retry_after:          None,
                    body:                 serde_json::json!({ "message": source.message })
                        .to_string(),
                },);
            }
            Err(e,) => return Err(Error::network(format!("GET {url} failed: {e}"),),),
        };

        let header = |name: &str| {
            response
                .headers()
                .get(name,)
                .and_then(|value| value.to_str().ok(),)
                .map(str::to_owned,)
        };
        let status = response.status().as_u16();
        let link = header("link",);
        let rate_limit_remaining = header("x-ratelimit-remaining",).and_then(|v| v.parse().ok(),);
        let rate_limit_reset = header("x-ratelimit-reset",).and_then(|v| v.parse().ok(),);
        let retry_after = header("retry-after",).and_then(|v| v.parse().ok(),);

        let body = self
            .client
            .body_to_string(response,)
            .await
            .map_err(|e| Error::network(format!("reading body of {url} failed: {e}"),),)?;

        Ok(RawResponse {
            status,
            link,
            rate_limit_remaining,
            rate_limit_reset,
            retry_after,
            body,
        },)
    }
}

/// Describes the first page of a listing.
#[derive(Debug, Clone, PartialEq, Eq,)]
pub struct PageRequest
{
    /// API path, optionally with a query string.
    pub path:     String,
    /// Items requested per page.
    pub per_page: u32,
}

impl PageRequest
{
    /// Creates a request for `path` using [`DEFAULT_PER_PAGE`].
    pub fn new(path: impl Into<String,>,) -> Self
    {
        Self {
            path: path.into(), per_page: DEFAULT_PER_PAGE,
        }
    }

    /// Overrides the page size.
    pub fn per_page(mut self, per_page: u32,) -> Self
    {
        self.per_page = per_page;
        self
    }

    /// URL of the first page with explicit page-size and page-index
    /// parameters.
    ///
    /// # Examples
    ///
    /// ```
    /// use repopulse::PageRequest;
    ///
    /// let request = PageRequest::new("/repos/o/r/commits?since=2024-01-01",).per_page(50,);
    /// assert_eq!(request.first_page_url(), "/repos/o/r/commits?since=2024-01-01&per_page=50&page=1");
    /// ```
    pub fn first_page_url(&self,) -> String
    {
        let separator = if self.path.contains('?',) { '&' } else { '?' };
        format!("{}{}per_page={}&page=1", self.path, separator, self.per_page)
    }
}

/// Parser for RFC 8288 `Link` headers.
#[derive(Debug, Clone,)]
pub struct LinkParser
{
    pattern: Regex,
}

impl LinkParser
{
    /// Compiles the link pattern.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Service`] if the pattern fails to compile.
    pub fn new() -> Result<Self, Error,>
    {
        let pattern = Regex::new(r"<([^>]*)>([^<]*)",)
            .map_err(|e| Error::service(format!("invalid link pattern: {e}"),),)?;
        Ok(Self {
            pattern,
        },)
    }

    /// Returns the URL carrying relation `relation`, if any.
    ///
    /// # Examples
    ///
    /// ```
    /// use repopulse::LinkParser;
    ///
    /// let parser = LinkParser::new()?;
    /// let header = r#"<https://api.github.com/x?page=2>; rel="next", <https://api.github.com/x?page=5>; rel="last""#;
    /// assert_eq!(parser.relation(header, "next"), Some("https://api.github.com/x?page=2".to_owned()));
    /// assert_eq!(parser.relation(header, "prev"), None);
    /// # Ok::<(), repopulse::Error>(())
    /// ```
    pub fn relation(&self, header: &str, relation: &str,) -> Option<String,>
    {
        self.pattern.captures_iter(header,).find_map(|captures| {
            let url = captures.get(1,)?.as_str().trim();
            let params = captures.get(2,)?.as_str().trim_end().trim_end_matches(',',);
            let matches = params.split(';',).any(|param| {
                param
                    .trim()
                    .strip_prefix("rel=",)
                    .map(|names| names.trim().trim_matches('"',),)
                    .is_some_and(|names| {
                        names.split_whitespace().any(|name| name.eq_ignore_ascii_case(relation,),)
                    },)
            },);
            (matches && !url.is_empty()).then(|| url.to_owned(),)
        },)
    }
}

/// Maps a response status onto the error taxonomy.
///
/// # Errors
///
/// * [`Error::RateLimited`] for 429, or 403 with an exhausted quota, a
///   `retry-after` header, or a rate-limit message (secondary limits)
/// * [`Error::Unauthorized`] for 401 and other 403 responses
/// * [`Error::Network`] for 5xx responses
/// * [`Error::Service`] for any other non-success status
pub fn classify_response(url: &str, response: &RawResponse,) -> Result<(), Error,>
{
    let status = response.status;
    if (200..300).contains(&status,) {
        return Ok((),);
    }

    let detail = remote_message(&response.body,);
    let throttled = response.rate_limit_remaining == Some(0,)
        || response.retry_after.is_some()
        || detail.to_ascii_lowercase().contains("rate limit",);

    match status {
        429 => Err(rate_limited(url, response,),),
        403 if throttled => Err(rate_limited(url, response,),),
        401 | 403 => Err(Error::Unauthorized {
            message: format!("GET {url} returned {status}: {detail}"),
        },),
        500..=599 => Err(Error::network(format!("GET {url} returned {status}: {detail}"),),),
        _ => Err(Error::service(format!("GET {url} returned {status}: {detail}"),),),
    }
}

fn rate_limited(url: &str, response: &RawResponse,) -> Error
{
    let reset_at = response
        .rate_limit_reset
        .and_then(|epoch| DateTime::from_timestamp(epoch, 0,),)
        .map(|at| format!("quota resets at {}", at.format("%Y-%m-%d %H:%M:%S UTC")),);
    let wait = response.retry_after.map(|seconds| format!("retry after {seconds}s"),);
    let reset = if response.rate_limit_remaining == Some(0,) {
        reset_at.or(wait,)
    } else {
        wait.or(reset_at,)
    }
    .unwrap_or_else(|| "reset time unknown".to_owned(),);
    Error::RateLimited {
        message: format!("GET {url} returned {}; {reset}; re-run later", response.status),
    }
}

fn remote_message(body: &str,) -> String
{
    serde_json::from_str::<Value,>(body,)
        .ok()
        .and_then(|value| value.get("message",).and_then(Value::as_str,).map(str::to_owned,),)
        .unwrap_or_else(|| body.chars().take(200,).collect(),)
}

/// Gathers complete listings and single resources from a [`PageSource`].
#[derive(Debug,)]
pub struct Collector<'source, S,>
{
    source: &'source S,
    retry:  RetryConfig,
    links:  LinkParser,
}

impl<'source, S: PageSource,> Collector<'source, S,>
{
    /// Creates a collector over `source`.
    ///
    /// # Errors
    ///
    /// Propagates [`LinkParser::new`] failures.
    pub fn new(source: &'source S, retry: RetryConfig,) -> Result<Self, Error,>
    {
        Ok(Self {
            source,
            retry,
            links: LinkParser::new()?,
        },)
    }

    /// Returns every item of a paginated listing, in server order.
    ///
    /// # Errors
    ///
    /// Returns the classified error of the first page that fails, or
    /// [`Error::Json`] when a page body is not a JSON array. Items gathered
    /// before the failure are discarded.
    pub async fn collect(&self, request: &PageRequest,) -> Result<Vec<Value,>, Error,>
    {
        self.collect_pages(request, None,).await
    }

    /// Like [`Collector::collect`], but a first page answered with
    /// `empty_status` yields an empty listing instead of an error.
    ///
    /// GitHub answers the commit listing of an empty repository with 409.
    ///
    /// # Errors
    ///
    /// Same as [`Collector::collect`].
    pub async fn collect_or_empty(
        &self,
        request: &PageRequest,
        empty_status: u16,
    ) -> Result<Vec<Value,>, Error,>
    {
        self.collect_pages(request, Some(empty_status,),).await
    }

    async fn collect_pages(
        &self,
        request: &PageRequest,
        empty_status: Option<u16,>,
    ) -> Result<Vec<Value,>, Error,>
    {
        let mut url = request.first_page_url();
        let mut visited: HashSet<String,> = HashSet::new();
        let mut items: Vec<Value,> = Vec::new();
        let mut pages = 0u32;

        loop {
            if !visited.insert(url.clone(),) {
                warn!("Continuation {} was already fetched; stopping pagination", url);
                break;
            }

            let tolerated = if pages == 0 { empty_status } else { None };
            let Some(response,) = self.fetch_unless(&url, tolerated,).await? else {
                debug!("{} answered {:?}; treating listing as empty", request.path, empty_status);
                break;
            };
            let page: Vec<Value,> = serde_json::from_str(&response.body,)?;
            pages += 1;
            debug!("Page {} of {} returned {} items", pages, request.path, page.len());
            items.extend(page,);

            match response.link.as_deref().and_then(|header| self.links.relation(header, "next",),)
            {
                Some(next,) => url = next,
                None => break,
            }
        }

        info!("Collected {} items from {} in {} pages", items.len(), request.path, pages);
        Ok(items,)
    }

    /// Fetches a single JSON resource.
    ///
    /// # Errors
    ///
    /// Returns the classified error of the response or [`Error::Json`] for an
    /// undecodable body.
    pub async fn fetch_object(&self, url: &str,) -> Result<Value, Error,>
    {
        let response = self.fetch(url,).await?;
        Ok(serde_json::from_str(&response.body,)?,)
    }

    async fn fetch(&self, url: &str,) -> Result<RawResponse, Error,>
    {
        let response = self.fetch_unless(url, None,).await?;
        response.ok_or_else(|| Error::service(format!("GET {url} returned no response"),),)
    }

    /// Fetches `url`; a response with status `tolerated` yields `None`.
    async fn fetch_unless(
        &self,
        url: &str,
        tolerated: Option<u16,>,
    ) -> Result<Option<RawResponse,>, Error,>
    {
        let source = self.source;
        retry_with_backoff(&self.retry, &format!("GET {url}"), move || async move {
            let response = source.get(url,).await?;
            if tolerated == Some(response.status,) {
                return Ok(None,);
            }
            classify_response(url, &response,)?;
            Ok(Some(response,),)
        },)
        .await
    }
}

#[cfg(test)]
pub(crate) mod fixtures
{
    use std::{collections::HashMap, sync::Mutex};

    use serde_json::Value;

    use super::{PageSource, RawResponse};
    use crate::error::Error;

    /// In-memory [`PageSource`] answering from a fixed URL table.
    #[derive(Debug, Default,)]
    pub(crate) struct ScriptedSource
    {
        responses: HashMap<String, RawResponse,>,
        failures:  HashMap<String, String,>,
        requests:  Mutex<Vec<String,>,>,
    }

    impl ScriptedSource
    {
        pub(crate) fn new() -> Self
        {
            Self::default()
        }

        /// Registers a listing page with an optional `next` continuation.
        ///
        /// The `Link` header has GitHub's shape: `next` first, then `last`.
        pub(crate) fn page(mut self, url: &str, items: Vec<Value,>, next: Option<&str,>,) -> Self
        {
            let mut response = RawResponse::ok(Value::Array(items,).to_string(),);
            response.link = next.map(|next| {
                format!("<{next}>; rel=\"next\", <{next}&last=1>; rel=\"last\"")
            },);
            self.responses.insert(url.to_owned(), response,);
            self
        }

        pub(crate) fn object(mut self, url: &str, value: Value,) -> Self
        {
            self.responses.insert(url.to_owned(), RawResponse::ok(value.to_string(),),);
            self
        }

        pub(crate) fn response(mut self, url: &str, response: RawResponse,) -> Self
        {
            self.responses.insert(url.to_owned(), response,);
            self
        }

        /// Makes every request to `url` fail at the transport level.
        pub(crate) fn transport_failure(mut self, url: &str, message: &str,) -> Self
        {
            self.failures.insert(url.to_owned(), message.to_owned(),);
            self
        }

        pub(crate) fn requests(&self,) -> Vec<String,>
        {
            self.requests.lock().map(|requests| requests.clone(),).unwrap_or_default()
        }
    }

    impl PageSource for ScriptedSource
    {
        async fn get(&self, url: &str,) -> Result<RawResponse, Error,>
        {
            if let Ok(mut requests,) = self.requests.lock() {
                requests.push(url.to_owned(),);
            }
            if let Some(message,) = self.failures.get(url,) {
                return Err(Error::network(message.clone(),),);
            }
            Ok(self.responses.get(url,).cloned().unwrap_or_else(|| RawResponse {
                status:               404,
                link:                 None,
                rate_limit_remaining: None,
                rate_limit_reset:     None,
                retry_after:          None,
                body:                 r#"{"message":"Not Found"}"#.to_owned(),
            },),)
        }
    }

    pub(crate) fn numbered_items(start: usize, count: usize,) -> Vec<Value,>
    {
        (start..start + count).map(|index| serde_json::json!({ "index": index }),).collect()
    }
}
