// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! Reduction of a commit sequence into author and month statistics.
//!
//! [`aggregate`] is a pure function: every call builds a fresh
//! [`Aggregates`] value from the immutable input and nothing is shared
//! between calls. Authors are kept in first-seen order, which makes ranking a
//! plain stable sort: authors with equal metric values keep the order in which
//! they first appeared in the input.

use std::{
    collections::{BTreeMap, HashMap},
    fmt,
    str::FromStr,
};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{chart::SeriesPoint, commit::Commit, error::Error};

/// Metric used to order authors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RankMetric {
    /// Number of commits.
    #[default]
    Commits,
    /// Lines added.
    LinesAdded,
    /// Lines removed.
    LinesRemoved
}

impl RankMetric {
    /// Reads the metric from an author row.
    pub fn value(self, stat: &AuthorStat) -> u64 {
        match self {
            Self::Commits => stat.commit_count,
            Self::LinesAdded => stat.lines_added,
            Self::LinesRemoved => stat.lines_removed
        }
    }

    /// Column heading used in reports.
    pub fn label(self) -> &'static str {
        match self {
            Self::Commits => "Commits",
            Self::LinesAdded => "Lines added",
            Self::LinesRemoved => "Lines removed"
        }
    }
}

impl FromStr for RankMetric {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "commits" => Ok(Self::Commits),
            "lines-added" | "additions" => Ok(Self::LinesAdded),
            "lines-removed" | "deletions" => Ok(Self::LinesRemoved),
            other => Err(Error::validation(format!(
                "unknown ranking metric '{other}' (expected commits, lines-added or lines-removed)"
            )))
        }
    }
}

impl fmt::Display for RankMetric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Self::Commits => "commits",
            Self::LinesAdded => "lines-added",
            Self::LinesRemoved => "lines-removed"
        })
    }
}

/// How commits are attributed to authors.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AuthorIdentity {
    /// Key by display name; several emails under one name merge.
    #[default]
    Name,
    /// Key by display name and case-insensitive email.
    NameAndEmail
}

impl FromStr for AuthorIdentity {
    type Err = Error;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().replace('_', "-").as_str() {
            "name" => Ok(Self::Name),
            "name-and-email" | "email" => Ok(Self::NameAndEmail),
            other => Err(Error::validation(format!(
                "unknown author identity '{other}' (expected name or name-and-email)"
            )))
        }
    }
}

/// Per-author totals.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorStat {
    /// Author display name.
    pub author:        String,
    /// Email, only populated with [`AuthorIdentity::NameAndEmail`].
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email:         Option<String>,
    /// Number of commits.
    pub commit_count:  u64,
    /// Lines added.
    pub lines_added:   u64,
    /// Lines removed.
    pub lines_removed: u64,
    /// Latest parseable commit date.
    pub last_active:   Option<NaiveDate>
}

impl AuthorStat {
    fn new(author: &str, email: Option<String>) -> Self {
        Self {
            author: author.to_owned(),
            email,
            commit_count: 0,
            lines_added: 0,
            lines_removed: 0,
            last_active: None
        }
    }

    /// Label used in tables and charts.
    pub fn display_name(&self) -> String {
        match self.email.as_deref() {
            Some(email) if !email.is_empty() => format!("{} ({email})", self.author),
            _ => self.author.clone()
        }
    }
}

/// Commits per calendar month.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthBucket {
    /// `YYYY-MM` key.
    pub period:       String,
    /// Commits dated within the month.
    pub commit_count: u64
}

/// Run-wide totals.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Totals {
    /// Commits aggregated.
    pub commits:       u64,
    /// Lines added across all commits.
    pub lines_added:   u64,
    /// Lines removed across all commits.
    pub lines_removed: u64,
    /// Distinct author rows.
    pub authors:       u64,
    /// Commits without a parseable date.
    pub undated:       u64,
    /// Earliest parseable date.
    pub first_date:    Option<NaiveDate>,
    /// Latest parseable date.
    pub last_date:     Option<NaiveDate>
}

/// Parameters of a reduction.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct AggregateOptions {
    /// Inclusive lower bound; commits before it, or without a parseable date,
    /// are dropped before aggregation.
    pub since:    Option<NaiveDate>,
    /// Author attribution mode.
    pub identity: AuthorIdentity
}

/// Result of [`aggregate`].
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Aggregates {
    /// Author rows in first-seen order.
    pub authors: Vec<AuthorStat>,
    /// Months with at least one commit, ascending.
    pub months:  Vec<MonthBucket>,
    /// Totals over the aggregated commits.
    pub totals:  Totals
}

/// Reduces `commits` into author rows, month buckets, and totals.
///
/// # Examples
///
/// ```
/// use repopulse::{AggregateOptions, Commit, aggregate};
///
/// let commit = |author: &str, date: &str| Commit {
///     author: author.to_owned(),
///     date: date.to_owned(),
///     ..Commit::default()
/// };
/// let result = aggregate(
///     &[commit("A", "2024-01-05"), commit("B", "2024-01-06"), commit("A", "2024-02-01")],
///     &AggregateOptions::default(),
/// );
/// assert_eq!(result.authors[0].commit_count, 2);
/// assert_eq!(result.months.len(), 2);
/// ```
pub fn aggregate(commits: &[Commit], options: &AggregateOptions) -> Aggregates {
    let mut authors: Vec<AuthorStat> = Vec::new();
    let mut index: HashMap<(String, Option<String>), usize> = HashMap::new();
    let mut months: BTreeMap<String, u64> = BTreeMap::new();
    let mut totals = Totals::default();

    for commit in commits {
        let date = commit.calendar_date();
        if let Some(since) = options.since
            && date.is_none_or(|date| date < since)
        {
            continue;
        }

        let email = match options.identity {
            AuthorIdentity::Name => None,
            AuthorIdentity::NameAndEmail => Some(commit.author_email.trim().to_lowercase())
        };
        let key = (commit.author.clone(), email);
        let position = match index.get(&key) {
            Some(position) => *position,
            None => {
                authors.push(AuthorStat::new(&commit.author, key.1.clone()));
                index.insert(key, authors.len() - 1);
                authors.len() - 1
            }
        };

        let stat = &mut authors[position];
        stat.commit_count += 1;
        stat.lines_added += commit.lines_added;
        stat.lines_removed += commit.lines_removed;
        stat.last_active = stat.last_active.max(date);

        totals.commits += 1;
        totals.lines_added += commit.lines_added;
        totals.lines_removed += commit.lines_removed;

        match date {
            Some(date) => {
                *months.entry(date.format("%Y-%m").to_string()).or_insert(0) += 1;
                totals.first_date = Some(totals.first_date.map_or(date, |first| first.min(date)));
                totals.last_date = totals.last_date.max(Some(date));
            }
            None => totals.undated += 1
        }
    }

    totals.authors = authors.len() as u64;

    Aggregates {
        authors,
        months: months
            .into_iter()
            .map(|(period, commit_count)| MonthBucket {
                period,
                commit_count
            })
            .collect(),
        totals
    }
}

/// Orders authors by `metric`, descending. Ties keep input order.
pub fn rank(authors: &[AuthorStat], metric: RankMetric) -> Vec<&AuthorStat> {
    let mut ranked: Vec<&AuthorStat> = authors.iter().collect();
    ranked.sort_by(|a, b| metric.value(b).cmp(&metric.value(a)));
    ranked
}

/// Keeps the first `limit` entries of a ranking.
pub fn top_n<T>(mut ranked: Vec<T>, limit: usize) -> Vec<T> {
    ranked.truncate(limit);
    ranked
}

impl Aggregates {
    /// Top `limit` authors by `metric`.
    pub fn ranking(&self, metric: RankMetric, limit: usize) -> Vec<&AuthorStat> {
        top_n(rank(&self.authors, metric), limit)
    }

    /// Ranking as a chart series labelled with author names.
    pub fn ranking_series(&self, metric: RankMetric, limit: usize) -> Vec<SeriesPoint> {
        self.ranking(metric, limit)
            .into_iter()
            .map(|stat| SeriesPoint::new(stat.display_name(), metric.value(stat)))
            .collect()
    }

    /// Monthly commit counts as a chart series.
    pub fn monthly_series(&self) -> Vec<SeriesPoint> {
        self.months
            .iter()
            .map(|bucket| SeriesPoint::new(bucket.period.clone(), bucket.commit_count))
            .collect()
    }
}
