// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Repository data gathered from the GitHub REST API.
//!
//! Every listing goes through [`Collector::collect`], so pagination and error
//! classification behave the same for repositories, commits, and
//! sub-resources.
use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tracing::{debug, info};

use crate::{
    collector::{Collector, PageRequest, PageSource},
    commit::Commit,
    error::Error,
    normalizer::{commit_from_api, commits_from_api},
};

/// Status GitHub returns for the commit listing of an empty repository.
const EMPTY_REPOSITORY_STATUS: u16 = 409;

/// Repository listing entry.
#[derive(Debug, Clone, Deserialize,)]
struct RepositorySummary
{
    name:     String,
    #[serde(default)]
    fork:     bool,
    #[serde(default)]
    archived: bool,
}

/// Repository metadata returned by `/repos/{owner}/{repo}`.
#[derive(Debug, Clone, Default, Deserialize,)]
struct RepositoryDetails
{
    #[serde(default)]
    description:      Option<String,>,
    #[serde(default)]
    default_branch:   Option<String,>,
    #[serde(default)]
    stargazers_count: u64,
}

#[derive(Debug, Clone, Deserialize,)]
struct Topics
{
    #[serde(default)]
    names: Vec<String,>,
}

/// Repository level facts shown on report cards.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize,)]
pub struct RepositoryCard
{
    /// Repository description, if any.
    pub description:    Option<String,>,
    /// Default branch name.
    pub default_branch: Option<String,>,
    /// Stargazer count.
    pub stars:          u64,
    /// Topic tags in server order.
    pub topics:         Vec<String,>,
    /// Language byte counts, largest first.
    pub languages:      Vec<(String, u64,),>,
}

impl RepositoryCard
{
    /// Share of each language in percent, largest first.
    pub fn language_shares(&self,) -> Vec<(&str, f64,),>
    {
        let total: u64 = self.languages.iter().map(|(_, bytes,)| bytes,).sum();
        let denominator = total.max(1,) as f64;
        self.languages
            .iter()
            .map(|(name, bytes,)| (name.as_str(), *bytes as f64 * 100.0 / denominator,),)
            .collect()
    }
}

/// Options controlling commit collection.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq,)]
pub struct CommitQuery
{
    /// Only commits on or after this date are requested.
    pub since:          Option<NaiveDate,>,
    /// Fetch each commit individually to obtain line counts.
    pub detailed_stats: bool,
}

/// Lists the non-fork, non-archived repositories of `owner` in server order.
///
/// Listing entries that do not decode are skipped.
///
/// # Errors
///
/// Propagates collection errors.
pub async fn list_repositories<S: PageSource,>(
    collector: &Collector<'_, S,>,
    owner: &str,
) -> Result<Vec<String,>, Error,>
{
    let request = PageRequest::new(format!("/users/{owner}/repos?type=owner&sort=full_name"),);
    let items = collector.collect(&request,).await?;

    let mut names = Vec::with_capacity(items.len(),);
    for item in items {
        let summary: RepositorySummary = match serde_json::from_value(item,) {
            Ok(summary,) => summary,
            Err(e,) => {
                debug!("Skipping undecodable repository entry: {}", e);
                continue;
            }
        };
        if summary.fork || summary.archived {
            debug!("Skipping fork or archived repository {}", summary.name);
            continue;
        }
        names.push(summary.name,);
    }

    info!("Found {} repositories for {}", names.len(), owner);
    Ok(names,)
}

/// Collects the commit history of `owner/repo`.
///
/// The listing endpoint omits line counts; with
/// [`CommitQuery::detailed_stats`] every commit is fetched on its own. An
/// empty repository (HTTP 409 on the listing) has no commits.
///
/// # Errors
///
/// Propagates collection errors for the listing and every detail request.
pub async fn fetch_commits<S: PageSource,>(
    collector: &Collector<'_, S,>,
    owner: &str,
    repo: &str,
    query: CommitQuery,
) -> Result<Vec<Commit,>, Error,>
{
    let mut path = format!("/repos/{owner}/{repo}/commits");
    if let Some(since,) = query.since {
        path.push_str(&format!("?since={}T00:00:00Z", since.format("%Y-%m-%d")),);
    }

    let items =
        collector.collect_or_empty(&PageRequest::new(path,), EMPTY_REPOSITORY_STATUS,).await?;
    if !query.detailed_stats {
        return Ok(commits_from_api(&items,),);
    }

    let mut commits = Vec::with_capacity(items.len(),);
    for item in &items {
        let Some(sha,) = item.get("sha",).and_then(Value::as_str,) else {
            continue;
        };
        let detail = collector.fetch_object(&format!("/repos/{owner}/{repo}/commits/{sha}"),).await?;
        if let Some(commit,) = commit_from_api(&detail,) {
            commits.push(commit,);
        }
    }
    debug!("Fetched line stats for {} commits of {}/{}", commits.len(), owner, repo);

    Ok(commits,)
}

/// Fetches description, topics, and language breakdown of `owner/repo`.
///
/// # Errors
///
/// Propagates collection errors and [`Error::Json`] for unexpected payloads.
pub async fn fetch_card<S: PageSource,>(
    collector: &Collector<'_, S,>,
    owner: &str,
    repo: &str,
) -> Result<RepositoryCard, Error,>
{
    let details: RepositoryDetails =
        serde_json::from_value(collector.fetch_object(&format!("/repos/{owner}/{repo}"),).await?,)?;
    let topics: Topics = serde_json::from_value(
        collector.fetch_object(&format!("/repos/{owner}/{repo}/topics"),).await?,
    )?;
    let languages = collector.fetch_object(&format!("/repos/{owner}/{repo}/languages"),).await?;

    Ok(RepositoryCard {
        description:    details.description.filter(|text| !text.trim().is_empty(),),
        default_branch: details.default_branch,
        stars:          details.stargazers_count,
        topics:         topics.names,
        languages:      language_breakdown(&languages,),
    },)
}

fn language_breakdown(value: &Value,) -> Vec<(String, u64,),>
{
    let mut languages: Vec<(String, u64,),> = value
        .as_object()
        .map(|map| {
            map.iter()
                .map(|(name, bytes,)| (name.clone(), bytes.as_u64().unwrap_or(0,),),)
                .collect()
        },)
        .unwrap_or_default();
    languages.sort_by(|a, b| b.1.cmp(&a.1,).then_with(|| a.0.cmp(&b.0,),),);
    languages
}

#[cfg(test)]
mod tests
{
    use serde_json::json;

    use super::*;
    use crate::{
        collector::{RawResponse, fixtures::ScriptedSource},
        retry::RetryConfig,
    };

    fn api_commit(sha: &str, author: &str, date: &str,) -> Value
    {
        json!({
            "sha": sha,
            "commit": {
                "author": { "name": author, "email": format!("{author}@example.com"), "date": date },
                "message": format!("change {sha}")
            }
        })
    }

    #[tokio::test]
    async fn list_repositories_skips_forks_and_archived()
    {
        let source = ScriptedSource::new().page(
            "/users/octo/repos?type=owner&sort=full_name&per_page=100&page=1",
            vec![
                json!({"name": "alpha", "fork": false}),
                json!({"name": "fork", "fork": true}),
                json!({"name": "old", "archived": true}),
                json!({"name": "beta"}),
            ],
            None,
        );
        let collector = Collector::new(&source, RetryConfig::no_retry(),).expect("collector",);
        let names = list_repositories(&collector, "octo",).await.expect("listing",);
        assert_eq!(names, vec!["alpha".to_owned(), "beta".to_owned()]);
    }

    #[tokio::test]
    async fn list_repositories_skips_undecodable_entries()
    {
        let source = ScriptedSource::new().page(
            "/users/octo/repos?type=owner&sort=full_name&per_page=100&page=1",
            vec![json!({"name": "alpha"}), json!({"fork": false}), json!(42), json!({"name": "beta"})],
            None,
        );
        let collector = Collector::new(&source, RetryConfig::no_retry(),).expect("collector",);
        let names = list_repositories(&collector, "octo",).await.expect("listing",);
        assert_eq!(names, vec!["alpha".to_owned(), "beta".to_owned()]);
    }

    #[tokio::test]
    async fn empty_repository_has_no_commits()
    {
        let source = ScriptedSource::new().response(
            "/repos/octo/empty/commits?per_page=100&page=1",
            RawResponse {
                status: 409,
                body: r#"{"message":"Git Repository is empty."}"#.to_owned(),
                ..RawResponse::ok("",)
            },
        );
        let collector = Collector::new(&source, RetryConfig::no_retry(),).expect("collector",);
        let commits = fetch_commits(&collector, "octo", "empty", CommitQuery::default(),)
            .await
            .expect("empty repository is not an error",);
        assert!(commits.is_empty());
        assert_eq!(source.requests().len(), 1);
    }

    #[tokio::test]
    async fn conflict_on_other_resources_is_still_an_error()
    {
        let source = ScriptedSource::new().response(
            "/repos/octo/empty",
            RawResponse {
                status: 409,
                body: r#"{"message":"Git Repository is empty."}"#.to_owned(),
                ..RawResponse::ok("",)
            },
        );
        let collector = Collector::new(&source, RetryConfig::no_retry(),).expect("collector",);
        let error = fetch_card(&collector, "octo", "empty",).await.expect_err("409 on details",);
        assert!(matches!(error, Error::Service { .. }));
    }

    #[tokio::test]
    async fn fetch_commits_normalizes_listing()
    {
        let source = ScriptedSource::new().page(
            "/repos/octo/alpha/commits?since=2024-01-01T00:00:00Z&per_page=100&page=1",
            vec![
                api_commit("a1", "Ada", "2024-01-05T10:00:00Z",),
                api_commit("b2", "Bob", "2024-01-06T10:00:00Z",),
            ],
            None,
        );
        let collector = Collector::new(&source, RetryConfig::no_retry(),).expect("collector",);
        let query = CommitQuery {
            since: NaiveDate::from_ymd_opt(2024, 1, 1,), detailed_stats: false,
        };
        let commits = fetch_commits(&collector, "octo", "alpha", query,).await.expect("commits",);
        assert_eq!(commits.len(), 2);
        assert_eq!(commits[0].author, "Ada");
        assert_eq!(commits[1].id, "b2");
    }

    #[tokio::test]
    async fn fetch_commits_with_details_reads_line_stats()
    {
        let mut detail = api_commit("a1", "Ada", "2024-01-05T10:00:00Z",);
        detail["stats"] = json!({"additions": 7, "deletions": 3});
        let source = ScriptedSource::new()
            .page(
                "/repos/octo/alpha/commits?per_page=100&page=1",
                vec![api_commit("a1", "Ada", "2024-01-05T10:00:00Z",)],
                None,
            )
            .object("/repos/octo/alpha/commits/a1", detail,);
        let collector = Collector::new(&source, RetryConfig::no_retry(),).expect("collector",);
        let query = CommitQuery {
            since: None, detailed_stats: true,
        };
        let commits = fetch_commits(&collector, "octo", "alpha", query,).await.expect("commits",);
        assert_eq!(commits[0].lines_added, 7);
        assert_eq!(commits[0].lines_removed, 3);
        assert_eq!(source.requests().len(), 2);
    }

    #[tokio::test]
    async fn fetch_card_combines_sub_resources()
    {
        let source = ScriptedSource::new()
            .object(
                "/repos/octo/alpha",
                json!({"description": "Alpha service", "default_branch": "main", "stargazers_count": 5}),
            )
            .object("/repos/octo/alpha/topics", json!({"names": ["rust", "cli"]}),)
            .object("/repos/octo/alpha/languages", json!({"Shell": 100, "Rust": 900, "C": 100}),);
        let collector = Collector::new(&source, RetryConfig::no_retry(),).expect("collector",);
        let card = fetch_card(&collector, "octo", "alpha",).await.expect("card",);

        assert_eq!(card.description.as_deref(), Some("Alpha service"));
        assert_eq!(card.stars, 5);
        assert_eq!(card.topics, vec!["rust".to_owned(), "cli".to_owned()]);
        assert_eq!(card.languages, vec![
            ("Rust".to_owned(), 900),
            ("C".to_owned(), 100),
            ("Shell".to_owned(), 100),
        ]);
        let shares = card.language_shares();
        assert!((shares[0].1 - 81.818).abs() < 0.01);
    }

    #[test]
    fn language_shares_of_empty_card_are_empty()
    {
        assert!(RepositoryCard::default().language_shares().is_empty());
    }
}
