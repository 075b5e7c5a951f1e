// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

/// End-to-end report runs.
///
/// Entities are processed one after another in source order. A failure while
/// collecting one entity becomes a failed [`EntityReport`] and the run moves
/// on; only output failures abort the run. The portal is written last, from
/// the files that actually exist.
use std::path::{Path, PathBuf};

use indicatif::{ProgressBar, ProgressStyle};
use tracing::{debug, info, warn};

use crate::{
    aggregate::{AggregateOptions, AuthorIdentity, aggregate},
    collector::{Collector, PageSource},
    commit::Commit,
    error::Error,
    local::{read_log_file, read_repository},
    remote::{CommitQuery, RepositoryCard, fetch_card, fetch_commits, list_repositories},
    report::{
        EntityArtifact, EntityReport, EntityStatus, PortalEntry, ReportSettings, ReportView,
        write_entity_outputs, write_index,
    },
    retry::RetryConfig,
    site::{SITE_DIR, SiteManifest, list_known_files, resolve_manifest},
    slug::assign_slugs,
};

/// Settings shared by every entity of a run.
#[derive(Debug, Clone,)]
pub struct RunOptions
{
    /// Output root; pages go to its `site` subdirectory.
    pub output:   PathBuf,
    /// Presentation settings.
    pub settings: ReportSettings,
    /// Author attribution mode.
    pub identity: AuthorIdentity,
}

impl RunOptions
{
    fn site_dir(&self,) -> PathBuf
    {
        self.output.join(SITE_DIR,)
    }
}

/// Outcome of a run.
#[derive(Debug, Clone,)]
pub struct RunSummary
{
    /// One report per entity, in processing order.
    pub reports:  Vec<EntityReport,>,
    /// Resolved portal links.
    pub manifest: SiteManifest,
    /// Path of the written portal.
    pub index:    PathBuf,
}

impl RunSummary
{
    /// Number of entities whose collection failed.
    pub fn failed(&self,) -> usize
    {
        self.reports.iter().filter(|report| report.failure().is_some(),).count()
    }
}

/// Where local commits come from.
#[derive(Debug, Clone, PartialEq, Eq,)]
pub enum LocalInput
{
    /// Run `git log` in a working tree.
    Repository(PathBuf,),
    /// Parse a captured log file.
    LogFile(PathBuf,),
}

impl LocalInput
{
    /// Entity name derived from the input path.
    pub fn default_name(&self,) -> String
    {
        let path = match self {
            Self::Repository(path,) | Self::LogFile(path,) => path,
        };
        let absolute = path.canonicalize().unwrap_or_else(|_| path.clone(),);
        let stem = match self {
            Self::Repository(_,) => absolute.file_name(),
            Self::LogFile(_,) => absolute.file_stem(),
        };
        stem.map(|name| name.to_string_lossy().into_owned(),)
            .unwrap_or_else(|| "repository".to_owned(),)
    }
}

/// GitHub owner and repository selection.
#[derive(Debug, Clone, Default, PartialEq, Eq,)]
pub struct RemoteTarget
{
    /// User or organization login.
    pub owner:          String,
    /// Repositories to report on; empty lists every owned repository.
    pub repositories:   Vec<String,>,
    /// Fetch every commit individually for line counts.
    pub detailed_stats: bool,
}

/// Builds the report of one collected entity.
///
/// The primary view honors the lower bound; the secondary view covers the
/// recent window when one is configured.
pub fn build_report(
    name: &str,
    slug: &str,
    commits: &[Commit],
    card: Option<RepositoryCard,>,
    options: &RunOptions,
) -> EntityReport
{
    let base = AggregateOptions {
        since: None, identity: options.identity,
    };
    let settings = &options.settings;
    let aggregates = settings
        .options_for(ReportView::Primary, base,)
        .map(|primary| aggregate(commits, &primary,),)
        .unwrap_or_default();
    let recent =
        settings.options_for(ReportView::Recent, base,).map(|window| aggregate(commits, &window,),);

    debug!(
        "Aggregated {} commits of {} into {} authors",
        aggregates.totals.commits,
        name,
        aggregates.authors.len()
    );

    EntityReport {
        name: name.to_owned(),
        slug: slug.to_owned(),
        status: EntityStatus::Collected,
        aggregates,
        recent,
        card,
    }
}

fn failed_report(name: &str, slug: &str, error: &Error, options: &RunOptions,) -> EntityReport
{
    warn!("Collection of {} failed: {}", name, error);
    EntityReport::failed(
        name,
        slug,
        error.to_display_string(),
        options.settings.recent_since().is_some(),
    )
}

fn progress_bar(total: usize,) -> ProgressBar
{
    let pb = ProgressBar::new(total as u64,);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("{spinner:.yellow} [{elapsed_precise}] {bar:30.cyan/blue} {pos}/{len} {msg}",)
            .unwrap_or_else(|_| ProgressStyle::default_bar(),),
    );
    pb
}

/// Reports on a single local repository or log file.
///
/// A repository that cannot be read yields a failed report; the pages and the
/// portal are still written.
///
/// # Errors
///
/// Returns [`Error::ReportIo`] or [`Error::Json`] when outputs cannot be
/// written.
pub fn run_local(input: &LocalInput, name: Option<&str,>, options: &RunOptions,) -> Result<RunSummary, Error,>
{
    let name = name.map_or_else(|| input.default_name(), str::to_owned,);
    let slug = assign_slugs(&[name.as_str()],).remove(0,);
    info!("Reading commits of {}", name);

    let commits = match input {
        LocalInput::Repository(path,) => read_repository(path, options.settings.since,),
        LocalInput::LogFile(path,) => read_log_file(path,),
    };
    let report = match commits {
        Ok(commits,) => build_report(&name, &slug, &commits, None, options,),
        Err(error,) => failed_report(&name, &slug, &error, options,),
    };

    write_entity_outputs(&options.site_dir(), &report, &options.settings,)?;
    finish(vec![report], options,)
}

/// Reports on the repositories of a GitHub owner.
///
/// Repositories are processed sequentially. An entity whose commits or card
/// cannot be collected is recorded as failed and the run continues.
///
/// # Errors
///
/// Returns collection errors from listing the owner's repositories (there is
/// no entity to attach them to) and output errors.
pub async fn run_remote<S: PageSource,>(
    source: &S,
    retry: RetryConfig,
    target: &RemoteTarget,
    options: &RunOptions,
) -> Result<RunSummary, Error,>
{
    let collector = Collector::new(source, retry,)?;
    let repositories = if target.repositories.is_empty() {
        list_repositories(&collector, &target.owner,).await?
    } else {
        target.repositories.clone()
    };
    let slugs = assign_slugs(&repositories,);
    let query = CommitQuery {
        since: options.settings.since, detailed_stats: target.detailed_stats,
    };
    let site_dir = options.site_dir();

    let pb = progress_bar(repositories.len(),);
    let mut reports = Vec::with_capacity(repositories.len(),);
    for (repository, slug,) in repositories.iter().zip(&slugs,) {
        pb.set_message(format!("{}/{}", target.owner, repository),);

        let collected = async {
            let commits = fetch_commits(&collector, &target.owner, repository, query,).await?;
            let card = fetch_card(&collector, &target.owner, repository,).await?;
            Ok::<_, Error,>((commits, card,),)
        }
        .await;

        let report = match collected {
            Ok((commits, card,),) => build_report(repository, slug, &commits, Some(card,), options,),
            Err(error,) => failed_report(repository, slug, &error, options,),
        };
        write_entity_outputs(&site_dir, &report, &options.settings,)?;
        reports.push(report,);
        pb.inc(1,);
    }

    let failed = reports.iter().filter(|report| report.failure().is_some(),).count();
    pb.finish_with_message(format!(
        "Collected {} of {} repositories",
        reports.len() - failed,
        reports.len()
    ),);

    finish(reports, options,)
}

fn finish(reports: Vec<EntityReport,>, options: &RunOptions,) -> Result<RunSummary, Error,>
{
    let known = list_known_files(&options.output,)?;
    let names: Vec<&str,> = reports.iter().map(|report| report.name.as_str(),).collect();
    let manifest = resolve_manifest(&names, &known,);
    let entries: Vec<PortalEntry,> = reports.iter().map(PortalEntry::from,).collect();
    let index = write_index(&options.output, &entries, &manifest, &options.settings,)?;

    info!(
        "Wrote {} with {} entities ({} live links)",
        index.display(),
        reports.len(),
        manifest.live_links()
    );

    Ok(RunSummary {
        reports,
        manifest,
        index,
    },)
}

/// Rebuilds the portal for `names` from files already under `output`.
///
/// Entity figures are read from `<slug>.json` artifacts when present; names
/// without an artifact still get a card with links.
///
/// # Errors
///
/// Returns [`Error::Io`] when the output directory cannot be listed and
/// [`Error::ReportIo`] when the portal cannot be written.
pub fn rebuild_index(
    output: &Path,
    names: &[String],
    settings: &ReportSettings,
) -> Result<(PathBuf, SiteManifest,), Error,>
{
    let known = list_known_files(output,)?;
    let manifest = resolve_manifest(names, &known,);

    let entries: Vec<PortalEntry,> = manifest
        .entries
        .iter()
        .map(|entry| {
            let relative = if manifest.base.is_empty() {
                format!("{}.json", entry.slug)
            } else {
                format!("{}/{}.json", manifest.base, entry.slug)
            };
            if !known.contains(&relative,) {
                return PortalEntry::named(entry.name.clone(),);
            }
            match EntityArtifact::read(&output.join(&relative,),) {
                Ok(artifact,) => PortalEntry {
                    name: entry.name.clone(),
                    ..PortalEntry::from(&artifact,)
                },
                Err(error,) => {
                    warn!("Ignoring unreadable artifact {}: {}", relative, error);
                    PortalEntry::named(entry.name.clone(),)
                }
            }
        },)
        .collect();

    let index = write_index(output, &entries, &manifest, settings,)?;
    info!("Rebuilt {} for {} entities", index.display(), entries.len());
    Ok((index, manifest,),)
}
