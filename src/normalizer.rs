// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! Conversion of raw change records into [`Commit`] values.
//!
//! Two shapes are understood: the text emitted by `git log --numstat` with the
//! [`LOG_FORMAT`] header, and commit objects returned by the GitHub REST API.
//! Parsing is tolerant. Lines and records that do not match the expected shape
//! are skipped and malformed numbers count as zero, so bad input degrades the
//! totals but never aborts a run.

use chrono::NaiveDate;
use serde_json::Value;
use tracing::debug;

use crate::commit::Commit;

/// `git log --pretty=format:` string producing the header lines parsed here.
pub const LOG_FORMAT: &str = "%H|%an|%ae|%ad|%s";

/// Minimum length of the identifier token that marks a header line.
const MIN_ID_LEN: usize = 7;
const FIELD_SEPARATOR: char = '|';

/// Parses `git log --numstat` output into commits in log order.
///
/// Header lines start a new commit, stat lines (`added\tremoved\tpath`) add
/// to the most recent one, and anything else is ignored. Binary files report
/// `-` instead of counts and contribute zero.
///
/// # Examples
///
/// ```
/// use repopulse::parse_log;
///
/// let log = "a1b2c3d4|Ada|ada@example.com|2024-01-05|Initial import\n\
///            10\t2\tsrc/lib.rs\n\
///            -\t-\tlogo.png\n";
/// let commits = parse_log(log);
/// assert_eq!(commits.len(), 1);
/// assert_eq!(commits[0].lines_added, 10);
/// assert_eq!(commits[0].lines_removed, 2);
/// ```
pub fn parse_log(text: &str) -> Vec<Commit> {
    let mut commits: Vec<Commit> = Vec::new();
    let mut skipped = 0usize;

    for line in text.lines() {
        let line = line.trim_end_matches('\r');
        if line.trim().is_empty() {
            continue;
        }

        if let Some(commit) = parse_header(line) {
            commits.push(commit);
            continue;
        }

        match (parse_stat(line), commits.last_mut()) {
            (Some((added, removed)), Some(current)) => {
                current.lines_added += added;
                current.lines_removed += removed;
            }
            _ => skipped += 1
        }
    }

    if skipped > 0 {
        debug!("Skipped {} unrecognized log lines", skipped);
    }

    commits
}

/// Splits a header line into its fields.
///
/// Author names and subjects may contain the separator, so the date field is
/// located by its shape: the first field after at least an author and an
/// email that reads as a `YYYY-MM-DD` date. Without such a field the line is
/// split positionally and the commit stays undated.
fn parse_header(line: &str) -> Option<Commit> {
    let (id, rest) = line.split_once(FIELD_SEPARATOR)?;
    let id = id.trim();
    if id.len() < MIN_ID_LEN || !id.chars().all(|ch| ch.is_ascii_hexdigit()) {
        return None;
    }

    let fields: Vec<&str> = rest.split(FIELD_SEPARATOR).collect();
    if fields.len() < 3 {
        return None;
    }
    let date_at = (2..fields.len())
        .find(|&index| is_short_date(fields[index]))
        .unwrap_or(2);

    let join = |parts: &[&str]| parts.join("|").trim().to_owned();
    Some(Commit {
        id:            id.to_owned(),
        author:        join(&fields[..date_at - 1]),
        author_email:  fields[date_at - 1].trim().to_owned(),
        date:          fields[date_at].trim().to_owned(),
        lines_added:   0,
        lines_removed: 0,
        message:       join(&fields[date_at + 1..])
    })
}

fn is_short_date(field: &str) -> bool {
    field
        .trim()
        .get(..10)
        .is_some_and(|prefix| NaiveDate::parse_from_str(prefix, "%Y-%m-%d").is_ok())
}

fn parse_stat(line: &str) -> Option<(u64, u64)> {
    let mut fields = line.splitn(3, '\t');
    let added = fields.next()?.trim();
    let removed = fields.next()?.trim();
    fields.next()?;

    Some((stat_count(added)?, stat_count(removed)?))
}

/// Reads a numstat counter. `-` marks a binary file and counts as zero;
/// anything else that is not a number disqualifies the line.
fn stat_count(token: &str) -> Option<u64> {
    if token == "-" {
        return Some(0);
    }
    if token.is_empty() || !token.chars().all(|ch| ch.is_ascii_digit()) {
        return None;
    }
    Some(token.parse().unwrap_or(0))
}

/// Converts a GitHub commit object into a [`Commit`].
///
/// Returns `None` when the object has no `sha`. Other missing fields degrade
/// to empty strings or zero counts. Line stats are read from `stats`, which
/// only the single-commit endpoint includes.
pub fn commit_from_api(value: &Value) -> Option<Commit> {
    let id = value.get("sha").and_then(Value::as_str)?;
    let details = value.get("commit");
    let author = details.and_then(|commit| commit.get("author"));

    let author_name = author
        .and_then(|author| text_field(author, "name"))
        .or_else(|| {
            value
                .get("author")
                .and_then(|account| text_field(account, "login"))
        })
        .unwrap_or_default();
    let email = author
        .and_then(|author| text_field(author, "email"))
        .unwrap_or_default();
    let date = author
        .and_then(|author| text_field(author, "date"))
        .unwrap_or_default();
    let message = details
        .and_then(|commit| text_field(commit, "message"))
        .and_then(|message| message.lines().next())
        .unwrap_or_default();

    let stats = value.get("stats");
    let lines_added = stats.map_or(0, |stats| count_field(stats, "additions"));
    let lines_removed = stats.map_or(0, |stats| count_field(stats, "deletions"));

    Some(Commit {
        id: id.to_owned(),
        author: author_name.trim().to_owned(),
        author_email: email.trim().to_owned(),
        date: date.trim().to_owned(),
        lines_added,
        lines_removed,
        message: message.trim().to_owned()
    })
}

/// Converts a page of GitHub commit objects, skipping malformed entries.
pub fn commits_from_api(values: &[Value]) -> Vec<Commit> {
    let commits: Vec<Commit> = values.iter().filter_map(commit_from_api).collect();
    if commits.len() < values.len() {
        debug!(
            "Skipped {} malformed commit records",
            values.len() - commits.len()
        );
    }
    commits
}

fn text_field<'a>(value: &'a Value, key: &str) -> Option<&'a str> {
    value.get(key).and_then(Value::as_str)
}

fn count_field(value: &Value, key: &str) -> u64 {
    value.get(key).and_then(Value::as_u64).unwrap_or(0)
}
