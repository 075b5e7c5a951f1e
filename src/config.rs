// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

//! Optional YAML configuration for report runs.
//!
//! Every value is optional; command-line flags override whatever the file
//! sets. Unknown keys are rejected so typos surface before any collection
//! starts.

use std::{collections::HashSet, fs, path::Path, str::FromStr};

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::{
    aggregate::{AuthorIdentity, RankMetric},
    error::{self, Error},
};

/// Root configuration document.
///
/// # Examples
///
/// ```
/// use repopulse::{RankMetric, parse_config};
///
/// let yaml = r#"
/// title: Platform pulse
/// metric: lines-added
/// remote:
///   owner: octocat
///   repositories: [hello-world, spoon-knife]
/// "#;
/// let config = parse_config(yaml,).expect("valid configuration",);
/// assert_eq!(config.metric, Some(RankMetric::LinesAdded));
/// assert_eq!(config.remote.unwrap().repositories.len(), 2);
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize,)]
#[serde(deny_unknown_fields)]
pub struct ReportConfig
{
    /// Portal title.
    #[serde(default)]
    pub title: Option<String,>,

    /// Output directory.
    #[serde(default, alias = "output_dir", alias = "output-dir")]
    pub output: Option<String,>,

    /// Inclusive lower bound of the primary view.
    #[serde(default)]
    pub since: Option<NaiveDate,>,

    /// Ranking metric.
    #[serde(default, deserialize_with = "deserialize_optional_metric")]
    pub metric: Option<RankMetric,>,

    /// Number of ranked authors.
    #[serde(default, deserialize_with = "deserialize_optional_top")]
    pub top: Option<usize,>,

    /// Recent window in days; `0` disables the secondary view.
    #[serde(default, alias = "recent-days", alias = "recentDays")]
    pub recent_days: Option<u32,>,

    /// Author attribution mode.
    #[serde(default, deserialize_with = "deserialize_optional_identity")]
    pub identity: Option<AuthorIdentity,>,

    /// Write JSON artifacts next to the pages.
    #[serde(default)]
    pub json: Option<bool,>,

    /// Local repository source.
    #[serde(default)]
    pub local: Option<LocalSource,>,

    /// GitHub source.
    #[serde(default)]
    pub remote: Option<RemoteSource,>,
}

/// Local git repository or captured log file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize,)]
#[serde(deny_unknown_fields)]
pub struct LocalSource
{
    /// Repository working tree.
    #[serde(default, alias = "repository")]
    pub repo: Option<String,>,

    /// `git log` output captured with the documented format.
    #[serde(default)]
    pub log: Option<String,>,

    /// Entity name shown in the report.
    #[serde(default)]
    pub name: Option<String,>,
}

/// GitHub owner and optional repository selection.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize, Serialize,)]
#[serde(deny_unknown_fields)]
pub struct RemoteSource
{
    /// User or organization login.
    #[serde(alias = "user")]
    pub owner: String,

    /// Repositories to report on; empty means every owned repository.
    #[serde(default, alias = "repos")]
    pub repositories: Vec<String,>,

    /// Fetch every commit individually for line counts.
    #[serde(default, alias = "detailed-stats", alias = "detailedStats")]
    pub detailed_stats: Option<bool,>,
}

/// Loads and validates a configuration file.
///
/// # Errors
///
/// Returns [`Error::Io`] when the file cannot be read, [`Error::Config`] when
/// the YAML does not decode, and [`Error::Validation`] for invalid values.
pub fn load_config(path: &Path,) -> Result<ReportConfig, Error,>
{
    let contents = fs::read_to_string(path,).map_err(|source| error::io_error(path, source,),)?;
    parse_config(&contents,)
}

/// Parses and validates a configuration document.
///
/// # Errors
///
/// Returns [`Error::Config`] when the YAML does not decode and
/// [`Error::Validation`] for invalid values.
pub fn parse_config(contents: &str,) -> Result<ReportConfig, Error,>
{
    if contents.trim().is_empty() {
        return Ok(ReportConfig::default(),);
    }
    let config: ReportConfig = serde_yaml::from_str(contents,)?;
    validate(&config,)?;
    Ok(config,)
}

fn validate(config: &ReportConfig,) -> Result<(), Error,>
{
    if let Some(title,) = &config.title
        && title.trim().is_empty()
    {
        return Err(Error::validation("title must not be blank",),);
    }

    if let Some(local,) = &config.local
        && local.repo.is_some()
        && local.log.is_some()
    {
        return Err(Error::validation("local source accepts either repo or log, not both",),);
    }

    if let Some(remote,) = &config.remote {
        if remote.owner.trim().is_empty() {
            return Err(Error::validation("remote.owner must not be blank",),);
        }
        let mut seen = HashSet::with_capacity(remote.repositories.len(),);
        for repository in &remote.repositories {
            let name = repository.trim();
            if name.is_empty() {
                return Err(Error::validation("remote.repositories must not contain blank names",),);
            }
            if !seen.insert(name.to_ascii_lowercase(),) {
                return Err(Error::validation(format!("duplicate repository '{name}'"),),);
            }
        }
    }

    Ok((),)
}

fn deserialize_optional_metric<'de, D,>(deserializer: D,) -> Result<Option<RankMetric,>, D::Error,>
where
    D: serde::Deserializer<'de,>,
{
    let value: Option<String,> = Option::deserialize(deserializer,)?;
    value
        .map(|raw| RankMetric::from_str(&raw,).map_err(serde::de::Error::custom,),)
        .transpose()
}

fn deserialize_optional_identity<'de, D,>(
    deserializer: D,
) -> Result<Option<AuthorIdentity,>, D::Error,>
where
    D: serde::Deserializer<'de,>,
{
    let value: Option<String,> = Option::deserialize(deserializer,)?;
    value
        .map(|raw| AuthorIdentity::from_str(&raw,).map_err(serde::de::Error::custom,),)
        .transpose()
}

fn deserialize_optional_top<'de, D,>(deserializer: D,) -> Result<Option<usize,>, D::Error,>
where
    D: serde::Deserializer<'de,>,
{
    let value: Option<usize,> = Option::deserialize(deserializer,)?;
    if value == Some(0,) {
        return Err(serde::de::Error::custom("top must be at least 1",),);
    }
    Ok(value,)
}

#[cfg(test)]
mod tests
{
    use std::io::Write;

    use tempfile::NamedTempFile;

    use super::*;

    #[test]
    fn empty_document_yields_defaults()
    {
        assert_eq!(parse_config("",).expect("empty config",), ReportConfig::default());
        assert_eq!(parse_config("  \n",).expect("blank config",), ReportConfig::default());
    }

    #[test]
    fn full_document_is_decoded()
    {
        let yaml = r#"
title: Engineering
output-dir: out
since: 2024-01-01
metric: lines_removed
top: 5
recent-days: 30
identity: name-and-email
json: true
local:
  repo: .
  name: monorepo
"#;
        let config = parse_config(yaml,).expect("valid configuration",);
        assert_eq!(config.output.as_deref(), Some("out"));
        assert_eq!(config.since, NaiveDate::from_ymd_opt(2024, 1, 1,));
        assert_eq!(config.metric, Some(RankMetric::LinesRemoved));
        assert_eq!(config.top, Some(5));
        assert_eq!(config.recent_days, Some(30));
        assert_eq!(config.identity, Some(AuthorIdentity::NameAndEmail));
        assert_eq!(config.json, Some(true));
        assert_eq!(config.local.and_then(|local| local.name,).as_deref(), Some("monorepo"));
    }

    #[test]
    fn unknown_keys_are_rejected()
    {
        let error = parse_config("titel: typo\n",).expect_err("unknown key",);
        assert!(matches!(error, Error::Config { .. }));
    }

    #[test]
    fn invalid_values_are_rejected()
    {
        assert!(matches!(parse_config("metric: stars\n",), Err(Error::Config { .. })));
        assert!(matches!(parse_config("top: 0\n",), Err(Error::Config { .. })));
        assert!(matches!(parse_config("since: yesterday\n",), Err(Error::Config { .. })));
    }

    #[test]
    fn remote_section_is_validated()
    {
        let blank_owner = parse_config("remote:\n  owner: ' '\n",);
        assert!(matches!(blank_owner, Err(Error::Validation { .. })));

        let duplicate = parse_config("remote:\n  owner: octo\n  repos: [api, API]\n",);
        match duplicate {
            Err(Error::Validation {
                message,
            },) => assert!(message.contains("duplicate repository"), "{message}"),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn local_source_accepts_single_input()
    {
        let both = parse_config("local:\n  repo: .\n  log: git.log\n",);
        assert!(matches!(both, Err(Error::Validation { .. })));
    }

    #[test]
    fn load_config_reads_file_and_reports_missing_path()
    {
        let mut file = NamedTempFile::new().expect("temp file",);
        writeln!(file, "title: From file").expect("write config",);
        let config = load_config(file.path(),).expect("config loads",);
        assert_eq!(config.title.as_deref(), Some("From file"));

        let missing = load_config(Path::new("/nonexistent/repopulse.yaml",),);
        assert!(matches!(missing, Err(Error::Io { .. })));
    }
}
