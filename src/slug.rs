// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! Mapping from entity names to report file stems.
//!
//! Slugs contain only lowercase ASCII alphanumerics separated by single
//! hyphens, so `<slug>.html` is a portable file name. Names without any
//! slug-worthy character fall back to `entity-<index>`.

use std::collections::HashSet;

/// Builder for slug strings derived from entity names.
#[derive(Debug, Clone, Copy,)]
pub struct SlugStrategy<'input,>
{
    source: &'input str,
}

impl<'input,> SlugStrategy<'input,>
{
    /// Creates a slug builder borrowing `source`.
    pub fn builder(source: &'input str,) -> Self
    {
        Self {
            source,
        }
    }

    /// Builds the slug, or `None` when nothing slug-worthy remains.
    ///
    /// # Examples
    ///
    /// ```
    /// use repopulse::SlugStrategy;
    ///
    /// let slug = SlugStrategy::builder(" Platform/API Gateway ",).build();
    /// assert_eq!(slug.as_deref(), Some("platform-api-gateway"));
    /// ```
    pub fn build(self,) -> Option<String,>
    {
        let mut slug = String::with_capacity(self.source.len(),);
        let mut pending_hyphen = false;

        for candidate in self.source.trim().chars() {
            if candidate.is_ascii_alphanumeric() {
                if pending_hyphen && !slug.is_empty() {
                    slug.push('-',);
                }
                slug.push(candidate.to_ascii_lowercase(),);
                pending_hyphen = false;
            } else {
                pending_hyphen = true;
            }
        }

        if slug.is_empty() { None } else { Some(slug,) }
    }

    /// Builds the slug, falling back to `entity-<index>`.
    pub fn build_or_index(self, index: usize,) -> String
    {
        self.build().unwrap_or_else(|| format!("entity-{index}"),)
    }
}

/// Assigns a distinct slug to every name, in order.
///
/// A slug already taken by an earlier name gets a numeric suffix (`-2`, `-3`,
/// ...), so two entities never share report files.
///
/// # Examples
///
/// ```
/// use repopulse::assign_slugs;
///
/// let slugs = assign_slugs(&["Core API", "core-api", "***"],);
/// assert_eq!(slugs, vec!["core-api", "core-api-2", "entity-2"]);
/// ```
pub fn assign_slugs<S: AsRef<str,>,>(names: &[S],) -> Vec<String,>
{
    let mut taken = HashSet::with_capacity(names.len(),);
    names
        .iter()
        .enumerate()
        .map(|(index, name,)| {
            let base = SlugStrategy::builder(name.as_ref(),).build_or_index(index,);
            let mut candidate = base.clone();
            let mut suffix = 2;
            while !taken.insert(candidate.clone(),) {
                candidate = format!("{base}-{suffix}");
                suffix += 1;
            }
            candidate
        },)
        .collect()
}
