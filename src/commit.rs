// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Uniform commit record produced by every input source.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// One recorded change with author, date, and line deltas.
///
/// `date` keeps the text reported by the source. Dates are only interpreted
/// on demand so that a malformed value degrades bucketing instead of dropping
/// the commit.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Commit {
    /// Commit identifier (full or abbreviated hash).
    pub id:            String,
    /// Author display name.
    pub author:        String,
    /// Author email as reported by the source.
    pub author_email:  String,
    /// Raw author date, `YYYY-MM-DD` or an RFC 3339 timestamp.
    pub date:          String,
    /// Lines added across all files.
    pub lines_added:   u64,
    /// Lines removed across all files.
    pub lines_removed: u64,
    /// First line of the commit message.
    pub message:       String
}

impl Commit {
    /// Returns the calendar date of the commit, if the raw date parses.
    ///
    /// Both `2024-01-05` and `2024-01-05T10:00:00Z` yield the same date; the
    /// time component and offset are ignored.
    ///
    /// # Examples
    ///
    /// ```
    /// use repopulse::Commit;
    ///
    /// let mut commit = Commit::default();
    /// commit.date = "2024-01-05T10:00:00Z".to_owned();
    /// assert_eq!(commit.calendar_date().map(|d| d.to_string()).as_deref(), Some("2024-01-05"));
    /// ```
    pub fn calendar_date(&self) -> Option<NaiveDate> {
        let prefix = self.date.trim().get(..10)?;
        NaiveDate::parse_from_str(prefix, "%Y-%m-%d").ok()
    }

    /// Returns the `YYYY-MM` bucket key, or `None` for unparseable dates.
    pub fn period(&self) -> Option<String> {
        self.calendar_date()
            .map(|date| date.format("%Y-%m").to_string())
    }
}

impl Default for Commit {
    fn default() -> Self {
        Self {
            id:            String::new(),
            author:        String::new(),
            author_email:  String::new(),
            date:          String::new(),
            lines_added:   0,
            lines_removed: 0,
            message:       String::new()
        }
    }
}
