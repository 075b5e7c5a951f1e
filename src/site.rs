// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

/// Cross-link resolution for the portal page.
///
/// The manifest is the single place that decides whether a report link is
/// live. Links to files that were not generated stay in the layout but are
/// marked disabled.
use std::{collections::BTreeSet, fs, io::ErrorKind, path::Path};

use serde::Serialize;
use tracing::debug;

use crate::{
    error::{self, Error},
    slug::assign_slugs,
};

/// Conventional subdirectory holding entity reports.
pub const SITE_DIR: &str = "site";
/// Extension of files that count as reports.
pub const REPORT_EXTENSION: &str = "html";
/// Suffix of the secondary (recent window) report.
pub const SECONDARY_SUFFIX: &str = "_recent";

/// File name of the primary report of `slug`.
pub fn primary_file_name(slug: &str,) -> String
{
    format!("{slug}.{REPORT_EXTENSION}")
}

/// File name of the secondary report of `slug`.
pub fn secondary_file_name(slug: &str,) -> String
{
    format!("{slug}{SECONDARY_SUFFIX}.{REPORT_EXTENSION}")
}

/// Relative link from the portal to a report.
#[derive(Debug, Clone, PartialEq, Eq, Serialize,)]
pub struct LinkTarget
{
    /// Path relative to the output root, `/` separated.
    pub path:    String,
    /// Whether the target file exists.
    pub enabled: bool,
}

/// Resolved links of one entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize,)]
pub struct ManifestEntry
{
    /// Entity name as configured.
    pub name:      String,
    /// File stem of its reports.
    pub slug:      String,
    /// Full-history report.
    pub primary:   LinkTarget,
    /// Recent-window report.
    pub secondary: LinkTarget,
}

/// Link targets for every entity, in input order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize,)]
pub struct SiteManifest
{
    /// Directory the links point into, relative to the output root; empty for
    /// the root itself.
    pub base:    String,
    /// One entry per entity.
    pub entries: Vec<ManifestEntry,>,
}

impl SiteManifest
{
    /// Looks up the entry of `name`.
    pub fn entry(&self, name: &str,) -> Option<&ManifestEntry,>
    {
        self.entries.iter().find(|entry| entry.name == name,)
    }

    /// Number of live links across all entries.
    pub fn live_links(&self,) -> usize
    {
        self.entries
            .iter()
            .map(|entry| usize::from(entry.primary.enabled,) + usize::from(entry.secondary.enabled,),)
            .sum()
    }
}

/// Lists report candidates under `output`: files in the root and in
/// [`SITE_DIR`], as `/` separated relative paths.
///
/// A missing output directory yields an empty set.
///
/// # Errors
///
/// Returns [`Error::Io`] when a directory exists but cannot be read.
pub fn list_known_files(output: &Path,) -> Result<BTreeSet<String,>, Error,>
{
    let mut known = BTreeSet::new();
    collect_files(output, None, &mut known,)?;
    collect_files(&output.join(SITE_DIR,), Some(SITE_DIR,), &mut known,)?;
    debug!("Found {} files under {}", known.len(), output.display());
    Ok(known,)
}

fn collect_files(
    directory: &Path,
    prefix: Option<&str,>,
    known: &mut BTreeSet<String,>,
) -> Result<(), Error,>
{
    let entries = match fs::read_dir(directory,) {
        Ok(entries,) => entries,
        Err(source,) if source.kind() == ErrorKind::NotFound => return Ok((),),
        Err(source,) => return Err(error::io_error(directory, source,),),
    };

    for entry in entries {
        let entry = entry.map_err(|source| error::io_error(directory, source,),)?;
        let is_file = entry
            .file_type()
            .map_err(|source| error::io_error(&entry.path(), source,),)?
            .is_file();
        if !is_file {
            continue;
        }
        let name = entry.file_name().to_string_lossy().into_owned();
        known.insert(match prefix {
            Some(prefix,) => format!("{prefix}/{name}"),
            None => name,
        },);
    }
    Ok((),)
}

/// Picks the directory reports live in.
///
/// [`SITE_DIR`] wins when it holds at least one report file; otherwise links
/// point at the output root.
pub fn detect_base_dir(known: &BTreeSet<String,>,) -> &'static str
{
    let site_prefix = format!("{SITE_DIR}/");
    let has_reports = known.iter().any(|path| {
        path.strip_prefix(&site_prefix,)
            .is_some_and(|name| Path::new(name,).extension().is_some_and(|ext| ext == REPORT_EXTENSION,),)
    },);
    if has_reports { SITE_DIR } else { "" }
}

/// Resolves primary and secondary links for `names` against `known` files.
///
/// # Examples
///
/// ```
/// use std::collections::BTreeSet;
///
/// use repopulse::resolve_manifest;
///
/// let known: BTreeSet<String,> = ["site/api.html".to_owned()].into_iter().collect();
/// let manifest = resolve_manifest(&["API", "Web"], &known,);
///
/// let api = manifest.entry("API",).unwrap();
/// assert!(api.primary.enabled);
/// assert!(!api.secondary.enabled);
/// assert_eq!(manifest.entry("Web",).unwrap().primary.path, "site/web.html");
/// ```
pub fn resolve_manifest<S: AsRef<str,>,>(names: &[S], known: &BTreeSet<String,>,) -> SiteManifest
{
    let base = detect_base_dir(known,);
    let link = |file: String| {
        let path = if base.is_empty() { file } else { format!("{base}/{file}") };
        LinkTarget {
            enabled: known.contains(&path,),
            path,
        }
    };

    let entries = names
        .iter()
        .zip(assign_slugs(names,),)
        .map(|(name, slug,)| ManifestEntry {
            name:      name.as_ref().to_owned(),
            primary:   link(primary_file_name(&slug,),),
            secondary: link(secondary_file_name(&slug,),),
            slug,
        },)
        .collect();

    SiteManifest {
        base: base.to_owned(),
        entries,
    }
}

#[cfg(test)]
mod tests
{
    use std::fs;

    use tempfile::tempdir;

    use super::*;

    fn known(paths: &[&str],) -> BTreeSet<String,>
    {
        paths.iter().map(|path| (*path).to_owned(),).collect()
    }

    #[test]
    fn site_directory_preferred_when_it_has_reports()
    {
        assert_eq!(detect_base_dir(&known(&["site/a.html", "index.html"],),), "site");
        assert_eq!(detect_base_dir(&known(&["site/a.json", "a.html"],),), "");
        assert_eq!(detect_base_dir(&known(&[],),), "");
    }

    #[test]
    fn missing_targets_are_kept_but_disabled()
    {
        let manifest =
            resolve_manifest(&["Core", "Edge"], &known(&["site/core.html", "site/core_recent.html"],),);
        assert_eq!(manifest.base, "site");
        assert_eq!(manifest.entries.len(), 2);

        let edge = manifest.entry("Edge",).expect("edge entry",);
        assert_eq!(edge.primary.path, "site/edge.html");
        assert!(!edge.primary.enabled);
        assert_eq!(edge.secondary.path, "site/edge_recent.html");
        assert!(!edge.secondary.enabled);
        assert_eq!(manifest.live_links(), 2);
    }

    #[test]
    fn root_fallback_links_without_prefix()
    {
        let manifest = resolve_manifest(&["Core"], &known(&["core.html"],),);
        let core = manifest.entry("Core",).expect("core entry",);
        assert_eq!(core.primary.path, "core.html");
        assert!(core.primary.enabled);
    }

    #[test]
    fn unsluggable_names_fall_back_to_index()
    {
        let manifest = resolve_manifest(&["Core", "???"], &known(&["site/entity-1.html"],),);
        let entry = manifest.entry("???",).expect("fallback entry",);
        assert_eq!(entry.slug, "entity-1");
        assert!(entry.primary.enabled);
    }

    #[test]
    fn list_known_files_reads_root_and_site()
    {
        let directory = tempdir().expect("failed to create temp dir",);
        let output = directory.path();
        fs::create_dir_all(output.join("site",).join("nested",),).expect("dirs",);
        fs::write(output.join("index.html",), "",).expect("index",);
        fs::write(output.join("site",).join("core.html",), "",).expect("core",);
        fs::write(output.join("site",).join("core.json",), "",).expect("json",);

        let files = list_known_files(output,).expect("listing",);
        assert_eq!(files, known(&["index.html", "site/core.html", "site/core.json"],));
    }

    #[test]
    fn list_known_files_tolerates_missing_output()
    {
        let directory = tempdir().expect("failed to create temp dir",);
        let files = list_known_files(&directory.path().join("absent",),).expect("listing",);
        assert!(files.is_empty());
    }
}
