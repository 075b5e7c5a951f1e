// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! Ordered fragment list used to assemble SVG and HTML documents.

use std::{borrow::Cow, fmt};

/// Markup assembled from ordered fragments and joined once.
///
/// Implements [`fmt::Write`] so `write!`/`writeln!` append a fragment.
///
/// # Examples
///
/// ```
/// use std::fmt::Write as _;
///
/// use repopulse::Fragments;
///
/// let mut fragments = Fragments::new();
/// fragments.push("<p>");
/// let _ = write!(fragments, "{}", 42);
/// fragments.push("</p>");
/// assert_eq!(fragments.finish(), "<p>42</p>");
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Fragments {
    parts: Vec<String>
}

impl Fragments {
    /// Creates an empty fragment list.
    pub fn new() -> Self {
        Self::default()
    }

    /// Appends a fragment.
    pub fn push(&mut self, fragment: impl Into<String>) {
        self.parts.push(fragment.into());
    }

    /// Appends every fragment of `other` in order.
    pub fn append(&mut self, other: Fragments) {
        self.parts.extend(other.parts);
    }

    /// Number of fragments collected so far.
    pub fn len(&self) -> usize {
        self.parts.len()
    }

    /// Returns `true` when nothing was pushed.
    pub fn is_empty(&self) -> bool {
        self.parts.is_empty()
    }

    /// Joins all fragments into the final document.
    pub fn finish(self) -> String {
        self.parts.concat()
    }
}

impl fmt::Write for Fragments {
    fn write_str(&mut self, fragment: &str) -> fmt::Result {
        self.parts.push(fragment.to_owned());
        Ok(())
    }
}

/// Escapes the five XML special characters, borrowing when none occur.
///
/// The same escaping is valid for HTML text and attribute values.
pub fn escape_xml(value: &str) -> Cow<'_, str> {
    if value
        .chars()
        .any(|character| matches!(character, '&' | '<' | '>' | '\"' | '\''))
    {
        let mut escaped = String::with_capacity(value.len() + 8);
        for character in value.chars() {
            match character {
                '&' => escaped.push_str("&amp;"),
                '<' => escaped.push_str("&lt;"),
                '>' => escaped.push_str("&gt;"),
                '\"' => escaped.push_str("&quot;"),
                '\'' => escaped.push_str("&#39;"),
                other => escaped.push(other)
            }
        }
        Cow::Owned(escaped)
    } else {
        Cow::Borrowed(value)
    }
}
