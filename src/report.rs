// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! Static HTML pages and JSON artifacts.
//!
//! Every entity gets a primary page over the full (lower-bounded) history and,
//! when a recent window is configured, a secondary page over that window. The
//! portal page links both through the [`SiteManifest`]; disabled links render
//! as inert spans.

use std::{
    collections::BTreeSet,
    fmt::Write as _,
    fs::{self, File},
    io::{BufReader, BufWriter, ErrorKind, Write},
    path::{Path, PathBuf}
};

use chrono::{DateTime, Days, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::{
    aggregate::{AggregateOptions, Aggregates, AuthorStat, RankMetric},
    chart::{BAR_CANVAS, LINE_CANVAS, layout_bars, layout_line},
    error::{self, Error},
    markup::{Fragments, escape_xml},
    remote::RepositoryCard,
    site::{LinkTarget, SiteManifest, primary_file_name, secondary_file_name},
    svg::{bar_chart_svg, line_chart_svg}
};

/// Outcome of collecting one entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "state", content = "message", rename_all = "snake_case")]
pub enum EntityStatus {
    /// Commits were collected and aggregated.
    Collected,
    /// Collection failed; aggregates are empty.
    Failed(String)
}

/// Everything rendered for one entity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EntityReport {
    /// Entity name as configured.
    pub name:       String,
    /// File stem of its outputs.
    pub slug:       String,
    /// Collection outcome.
    pub status:     EntityStatus,
    /// Aggregates over the lower-bounded history.
    pub aggregates: Aggregates,
    /// Aggregates over the recent window, when one is configured.
    pub recent:     Option<Aggregates>,
    /// Repository facts, remote runs only.
    pub card:       Option<RepositoryCard>
}

impl EntityReport {
    /// Report of an entity whose collection failed.
    ///
    /// Aggregates are zero; the recent view is kept empty when a window is
    /// configured so the secondary page is still written.
    pub fn failed(
        name: impl Into<String>,
        slug: impl Into<String>,
        message: impl Into<String>,
        recent_enabled: bool
    ) -> Self {
        Self {
            name:       name.into(),
            slug:       slug.into(),
            status:     EntityStatus::Failed(message.into()),
            aggregates: Aggregates::default(),
            recent:     recent_enabled.then(Aggregates::default),
            card:       None
        }
    }

    /// Failure message, if collection failed.
    pub fn failure(&self) -> Option<&str> {
        match &self.status {
            EntityStatus::Collected => None,
            EntityStatus::Failed(message) => Some(message)
        }
    }
}

/// Which aggregate view a page shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReportView {
    /// Full history from the lower bound.
    Primary,
    /// Recent window ending at the run date.
    Recent
}

/// Presentation settings shared by all pages of a run.
#[derive(Debug, Clone, PartialEq)]
pub struct ReportSettings {
    /// Portal title.
    pub title:        String,
    /// Ranking metric.
    pub metric:       RankMetric,
    /// Number of ranked authors shown.
    pub top:          usize,
    /// Lower bound of the primary view.
    pub since:        Option<NaiveDate>,
    /// Length of the recent window in days; `0` disables it.
    pub recent_days:  u32,
    /// Write `<slug>.json` next to the pages.
    pub json:         bool,
    /// Run timestamp.
    pub generated_at: DateTime<Utc>
}

impl ReportSettings {
    /// Settings with defaults for everything but the title.
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title:        title.into(),
            metric:       RankMetric::default(),
            top:          12,
            since:        None,
            recent_days:  90,
            json:         false,
            generated_at: Utc::now()
        }
    }

    /// First day of the recent window, never earlier than [`Self::since`].
    pub fn recent_since(&self) -> Option<NaiveDate> {
        if self.recent_days == 0 {
            return None;
        }
        let start = self
            .generated_at
            .date_naive()
            .checked_sub_days(Days::new(u64::from(self.recent_days)))?;
        Some(self.since.map_or(start, |since| since.max(start)))
    }

    /// Aggregation options of a view.
    pub fn options_for(&self, view: ReportView, base: AggregateOptions) -> Option<AggregateOptions> {
        match view {
            ReportView::Primary => Some(AggregateOptions {
                since: self.since,
                ..base
            }),
            ReportView::Recent => self.recent_since().map(|since| AggregateOptions {
                since: Some(since),
                ..base
            })
        }
    }

    fn generated_label(&self) -> String {
        self.generated_at.format("%Y-%m-%d %H:%M UTC").to_string()
    }

    fn view_description(&self, view: ReportView) -> String {
        match (view, self.since) {
            (ReportView::Primary, Some(since)) => format!("History since {since}"),
            (ReportView::Primary, None) => "Full history".to_owned(),
            (ReportView::Recent, _) => match self.recent_since() {
                Some(start) => format!("Last {} days (since {start})", self.recent_days),
                None => "Recent window disabled".to_owned()
            }
        }
    }
}

const STYLE: &str = r#"
:root { color-scheme: light; --fg: #1f2328; --muted: #57606a; --line: #d0d7de; --accent: #2f81f7; --bad: #cf222e; }
* { box-sizing: border-box; }
body { margin: 0; font-family: 'Segoe UI', 'SF Pro Display', sans-serif; color: var(--fg); background: #f6f8fa; }
main { max-width: 980px; margin: 0 auto; padding: 24px; }
header p { color: var(--muted); margin-top: 4px; }
nav a { color: var(--accent); text-decoration: none; }
.kpis { display: grid; grid-template-columns: repeat(auto-fit, minmax(150px, 1fr)); gap: 12px; margin: 20px 0; }
.kpi, .card, section { background: #fff; border: 1px solid var(--line); border-radius: 8px; padding: 14px 16px; }
.kpi .value { font-size: 1.6em; font-weight: 600; }
.kpi .label { color: var(--muted); font-size: 0.85em; }
section { margin: 16px 0; overflow-x: auto; }
table { border-collapse: collapse; width: 100%; }
th, td { text-align: left; padding: 6px 8px; border-bottom: 1px solid var(--line); }
th.metric, td.metric { font-weight: 600; }
.cards { display: grid; grid-template-columns: repeat(auto-fill, minmax(280px, 1fr)); gap: 12px; }
.links a, .links span { margin-right: 12px; }
.links span.disabled { color: var(--muted); cursor: not-allowed; }
.topics span { display: inline-block; background: #ddf4ff; color: #0969da; border-radius: 12px; padding: 2px 8px; margin: 2px; font-size: 0.8em; }
.banner.error { background: #ffebe9; border: 1px solid var(--bad); color: var(--bad); border-radius: 8px; padding: 12px 16px; }
.status.failed { color: var(--bad); }
footer { color: var(--muted); font-size: 0.8em; margin: 24px 0; }
"#;

fn page(title: &str, body: Fragments) -> String {
    let mut html = Fragments::new();
    let _ = writeln!(
        html,
        "<!DOCTYPE html>\n<html lang=\"en\">\n<head>\n<meta charset=\"utf-8\">\n<meta name=\"viewport\" content=\"width=device-width, initial-scale=1\">\n<title>{}</title>\n<style>{STYLE}</style>\n</head>\n<body>\n<main>",
        escape_xml(title),
    );
    html.append(body);
    html.push("</main>\n</body>\n</html>\n");
    html.finish()
}

fn kpi(body: &mut Fragments, label: &str, value: impl std::fmt::Display) {
    let _ = writeln!(
        body,
        "<div class=\"kpi\"><div class=\"value\">{}</div><div class=\"label\">{}</div></div>",
        escape_xml(&value.to_string()),
        escape_xml(label),
    );
}

fn optional_date(date: Option<NaiveDate>) -> String {
    date.map_or_else(|| "n/a".to_owned(), |date| date.to_string())
}

/// Renders the detail page of `report` for `view`.
///
/// Returns `None` for [`ReportView::Recent`] when the report has no recent
/// aggregates.
pub fn render_entity_page(
    report: &EntityReport,
    view: ReportView,
    settings: &ReportSettings
) -> Option<String> {
    let aggregates = match view {
        ReportView::Primary => &report.aggregates,
        ReportView::Recent => report.recent.as_ref()?
    };
    let name = escape_xml(&report.name);
    let mut body = Fragments::new();

    body.push("<nav><a href=\"../index.html\">&larr; All projects</a></nav>\n");
    let _ = writeln!(
        body,
        "<header><h1>{name}</h1><p>{}</p></header>",
        escape_xml(&settings.view_description(view)),
    );

    if let Some(message) = report.failure() {
        let _ = writeln!(
            body,
            "<div class=\"banner error\" role=\"alert\"><strong>Collection failed.</strong> {}</div>",
            escape_xml(message),
        );
    }

    let totals = &aggregates.totals;
    body.push("<div class=\"kpis\">\n");
    kpi(&mut body, "Commits", totals.commits);
    kpi(&mut body, "Authors", totals.authors);
    kpi(&mut body, "Lines added", totals.lines_added);
    kpi(&mut body, "Lines removed", totals.lines_removed);
    kpi(&mut body, "First commit", optional_date(totals.first_date));
    kpi(&mut body, "Last commit", optional_date(totals.last_date));
    body.push("</div>\n");
    if totals.undated > 0 {
        let _ = writeln!(
            body,
            "<p class=\"note\">{} commits without a parseable date are excluded from the monthly trend.</p>",
            totals.undated,
        );
    }

    if let Some(card) = &report.card {
        body.append(card_section(card));
    }

    let ranking = aggregates.ranking(settings.metric, settings.top);
    body.append(ranking_section(&ranking, settings));

    let bars = layout_bars(
        &aggregates.ranking_series(settings.metric, settings.top),
        &BAR_CANVAS
    );
    let chart_title = format!("Top authors by {}", settings.metric.label());
    let _ = writeln!(
        body,
        "<section><h2>{}</h2>\n{}</section>",
        escape_xml(&chart_title),
        bar_chart_svg(&bars, &chart_title),
    );

    let line = layout_line(&aggregates.monthly_series(), &LINE_CANVAS);
    let _ = writeln!(
        body,
        "<section><h2>Commits per month</h2>\n{}</section>",
        line_chart_svg(&line, "Commits per month"),
    );

    body.append(month_section(aggregates));

    let _ = writeln!(
        body,
        "<footer>Generated {}</footer>",
        escape_xml(&settings.generated_label()),
    );

    let title = match view {
        ReportView::Primary => report.name.clone(),
        ReportView::Recent => format!("{} (recent)", report.name)
    };
    Some(page(&title, body))
}

fn card_section(card: &RepositoryCard) -> Fragments {
    let mut section = Fragments::new();
    section.push("<section class=\"card\"><h2>Repository</h2>\n");
    if let Some(description) = &card.description {
        let _ = writeln!(section, "<p>{}</p>", escape_xml(description));
    }
    let _ = writeln!(
        section,
        "<p>Default branch: <code>{}</code> &middot; Stars: {}</p>",
        escape_xml(card.default_branch.as_deref().unwrap_or("n/a")),
        card.stars,
    );
    if !card.topics.is_empty() {
        section.append(topics(&card.topics));
    }
    if !card.languages.is_empty() {
        section.push("<table><thead><tr><th>Language</th><th>Share</th></tr></thead><tbody>\n");
        for (language, share) in card.language_shares() {
            let _ = writeln!(
                section,
                "<tr><td>{}</td><td>{share:.1}%</td></tr>",
                escape_xml(language),
            );
        }
        section.push("</tbody></table>\n");
    }
    section.push("</section>\n");
    section
}

fn topics(names: &[String]) -> Fragments {
    let mut topics = Fragments::new();
    topics.push("<div class=\"topics\">");
    for name in names {
        let _ = write!(topics, "<span>{}</span>", escape_xml(name));
    }
    topics.push("</div>\n");
    topics
}

fn ranking_section(ranking: &[&AuthorStat], settings: &ReportSettings) -> Fragments {
    let mut section = Fragments::new();
    let _ = writeln!(
        section,
        "<section><h2>Top {} authors</h2>",
        settings.top
    );
    if ranking.is_empty() {
        section.push("<p>No commits in this period.</p></section>\n");
        return section;
    }

    let class = |metric: RankMetric| {
        if settings.metric == metric {
            " class=\"metric\""
        } else {
            ""
        }
    };
    let _ = writeln!(
        section,
        "<table><thead><tr><th>#</th><th>Author</th><th{}>Commits</th><th{}>Lines added</th><th{}>Lines removed</th><th>Last active</th></tr></thead><tbody>",
        class(RankMetric::Commits),
        class(RankMetric::LinesAdded),
        class(RankMetric::LinesRemoved),
    );
    for (position, stat) in ranking.iter().enumerate() {
        let _ = writeln!(
            section,
            "<tr><td>{}</td><td>{}</td><td{}>{}</td><td{}>{}</td><td{}>{}</td><td>{}</td></tr>",
            position + 1,
            escape_xml(&stat.display_name()),
            class(RankMetric::Commits),
            stat.commit_count,
            class(RankMetric::LinesAdded),
            stat.lines_added,
            class(RankMetric::LinesRemoved),
            stat.lines_removed,
            optional_date(stat.last_active),
        );
    }
    section.push("</tbody></table></section>\n");
    section
}

fn month_section(aggregates: &Aggregates) -> Fragments {
    let mut section = Fragments::new();
    section.push("<section><h2>Monthly activity</h2>\n");
    if aggregates.months.is_empty() {
        section.push("<p>No dated commits.</p></section>\n");
        return section;
    }
    section.push("<table><thead><tr><th>Month</th><th>Commits</th></tr></thead><tbody>\n");
    for bucket in &aggregates.months {
        let _ = writeln!(
            section,
            "<tr><td>{}</td><td>{}</td></tr>",
            escape_xml(&bucket.period),
            bucket.commit_count,
        );
    }
    section.push("</tbody></table></section>\n");
    section
}

/// Summary of one entity shown on the portal.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PortalEntry {
    /// Entity name.
    pub name:    String,
    /// Commits in the primary view; unknown when no report data is available.
    pub commits: Option<u64>,
    /// Distinct author labels of the primary view.
    pub authors: Vec<String>,
    /// Failure message of a failed collection.
    pub failure: Option<String>,
    /// Repository topics.
    pub topics:  Vec<String>
}

impl PortalEntry {
    /// Entry known only by name.
    pub fn named(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

impl From<&EntityReport> for PortalEntry {
    fn from(report: &EntityReport) -> Self {
        Self {
            name:    report.name.clone(),
            commits: Some(report.aggregates.totals.commits),
            authors: report
                .aggregates
                .authors
                .iter()
                .map(AuthorStat::display_name)
                .collect(),
            failure: report.failure().map(str::to_owned),
            topics:  report
                .card
                .as_ref()
                .map(|card| card.topics.clone())
                .unwrap_or_default()
        }
    }
}

/// Renders the portal page.
pub fn render_index(
    entries: &[PortalEntry],
    manifest: &SiteManifest,
    settings: &ReportSettings
) -> String {
    let mut body = Fragments::new();
    let _ = writeln!(
        body,
        "<header><h1>{}</h1><p>{}</p></header>",
        escape_xml(&settings.title),
        escape_xml(&settings.view_description(ReportView::Primary)),
    );

    let commits: u64 = entries.iter().filter_map(|entry| entry.commits).sum();
    let authors: BTreeSet<&str> = entries
        .iter()
        .flat_map(|entry| entry.authors.iter().map(String::as_str))
        .collect();
    let failed = entries.iter().filter(|entry| entry.failure.is_some()).count();

    body.push("<div class=\"kpis\">\n");
    kpi(&mut body, "Projects", entries.len());
    kpi(&mut body, "Commits", commits);
    kpi(&mut body, "Active authors", authors.len());
    kpi(&mut body, "Failed collections", failed);
    kpi(&mut body, "Generated", settings.generated_label());
    body.push("</div>\n<div class=\"cards\">\n");

    for entry in entries {
        let _ = writeln!(body, "<div class=\"card\"><h2>{}</h2>", escape_xml(&entry.name));
        match (&entry.failure, entry.commits) {
            (Some(message), _) => {
                let _ = writeln!(
                    body,
                    "<p class=\"status failed\">Collection failed: {}</p>",
                    escape_xml(message),
                );
            }
            (None, Some(commits)) => {
                let _ = writeln!(
                    body,
                    "<p>{commits} commits by {} authors</p>",
                    entry.authors.len(),
                );
            }
            (None, None) => {}
        }

        body.push("<div class=\"links\">");
        if let Some(links) = manifest.entry(&entry.name) {
            body.push(link_html(&links.primary, "Full history"));
            body.push(link_html(&links.secondary, "Recent"));
        }
        body.push("</div>\n");
        if !entry.topics.is_empty() {
            body.append(topics(&entry.topics));
        }
        body.push("</div>\n");
    }

    body.push("</div>\n");
    page(&settings.title, body)
}

fn link_html(target: &LinkTarget, label: &str) -> String {
    if target.enabled {
        format!(
            "<a href=\"{}\">{}</a>",
            escape_xml(&target.path),
            escape_xml(label)
        )
    } else {
        format!(
            "<span class=\"disabled\" title=\"Not generated\">{}</span>",
            escape_xml(label)
        )
    }
}

/// JSON mirror of an entity report.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityArtifact {
    /// Entity name.
    pub name:         String,
    /// File stem.
    pub slug:         String,
    /// Collection outcome.
    pub status:       EntityStatus,
    /// Run timestamp.
    pub generated_at: DateTime<Utc>,
    /// Ranking metric.
    pub metric:       RankMetric,
    /// Top authors by [`Self::metric`].
    pub ranking:      Vec<AuthorStat>,
    /// Primary view.
    pub aggregates:   Aggregates,
    /// Recent view.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub recent:       Option<Aggregates>,
    /// Repository facts.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub card:         Option<RepositoryCard>
}

impl EntityArtifact {
    /// Builds the artifact of `report`.
    pub fn new(report: &EntityReport, settings: &ReportSettings) -> Self {
        Self {
            name:         report.name.clone(),
            slug:         report.slug.clone(),
            status:       report.status.clone(),
            generated_at: settings.generated_at,
            metric:       settings.metric,
            ranking:      report
                .aggregates
                .ranking(settings.metric, settings.top)
                .into_iter()
                .cloned()
                .collect(),
            aggregates:   report.aggregates.clone(),
            recent:       report.recent.clone(),
            card:         report.card.clone()
        }
    }

    /// Reads an artifact previously written by [`write_entity_outputs`].
    ///
    /// # Errors
    ///
    /// Returns [`Error::Io`] when the file cannot be opened and
    /// [`Error::Json`] when it does not decode.
    pub fn read(path: &Path) -> Result<Self, Error> {
        let file = File::open(path).map_err(|source| error::io_error(path, source))?;
        Ok(serde_json::from_reader(BufReader::new(file))?)
    }
}

impl From<&EntityArtifact> for PortalEntry {
    fn from(artifact: &EntityArtifact) -> Self {
        Self {
            name:    artifact.name.clone(),
            commits: Some(artifact.aggregates.totals.commits),
            authors: artifact
                .aggregates
                .authors
                .iter()
                .map(AuthorStat::display_name)
                .collect(),
            failure: match &artifact.status {
                EntityStatus::Collected => None,
                EntityStatus::Failed(message) => Some(message.clone())
            },
            topics:  artifact
                .card
                .as_ref()
                .map(|card| card.topics.clone())
                .unwrap_or_default()
        }
    }
}

/// Writes the pages (and optional artifact) of `report` into `site_dir`.
///
/// Returns the written paths in order: primary page, secondary page when a
/// recent view exists, JSON artifact when enabled. A secondary page left by an
/// earlier run is removed when no recent view exists, so the portal link to it
/// renders disabled.
///
/// # Errors
///
/// Returns [`Error::ReportIo`] when a directory or file cannot be written and
/// [`Error::Json`] if the artifact cannot be encoded.
pub fn write_entity_outputs(
    site_dir: &Path,
    report: &EntityReport,
    settings: &ReportSettings
) -> Result<Vec<PathBuf>, Error> {
    fs::create_dir_all(site_dir).map_err(|source| error::report_io_error(site_dir, source))?;
    let mut written = Vec::with_capacity(3);

    for (view, file_name) in [
        (ReportView::Primary, primary_file_name(&report.slug)),
        (ReportView::Recent, secondary_file_name(&report.slug))
    ] {
        let path = site_dir.join(file_name);
        match render_entity_page(report, view, settings) {
            Some(html) => {
                write_text(&path, &html)?;
                written.push(path);
            }
            None => remove_stale(&path)?
        }
    }

    if settings.json {
        let path = site_dir.join(format!("{}.json", report.slug));
        write_artifact(&path, &EntityArtifact::new(report, settings))?;
        written.push(path);
    }

    Ok(written)
}

/// Writes `index.html` into `output`.
///
/// # Errors
///
/// Returns [`Error::ReportIo`] when the file cannot be written.
pub fn write_index(
    output: &Path,
    entries: &[PortalEntry],
    manifest: &SiteManifest,
    settings: &ReportSettings
) -> Result<PathBuf, Error> {
    fs::create_dir_all(output).map_err(|source| error::report_io_error(output, source))?;
    let path = output.join("index.html");
    write_text(&path, &render_index(entries, manifest, settings))?;
    Ok(path)
}

fn remove_stale(path: &Path) -> Result<(), Error> {
    match fs::remove_file(path) {
        Ok(()) => {
            debug!("Removed stale page {}", path.display());
            Ok(())
        }
        Err(source) if source.kind() == ErrorKind::NotFound => Ok(()),
        Err(source) => Err(error::report_io_error(path, source))
    }
}

fn write_text(path: &Path, contents: &str) -> Result<(), Error> {
    let file = File::create(path).map_err(|source| error::report_io_error(path, source))?;
    let mut writer = BufWriter::new(file);
    writer
        .write_all(contents.as_bytes())
        .map_err(|source| error::report_io_error(path, source))?;
    writer
        .flush()
        .map_err(|source| error::report_io_error(path, source))
}

fn write_artifact(path: &Path, artifact: &EntityArtifact) -> Result<(), Error> {
    let file = File::create(path).map_err(|source| error::report_io_error(path, source))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, artifact)?;
    writer
        .write_all(b"\n")
        .map_err(|source| error::report_io_error(path, source))?;
    writer
        .flush()
        .map_err(|source| error::report_io_error(path, source))
}

#[cfg(test)]
mod tests {
    use chrono::TimeZone;
    use tempfile::tempdir;

    use super::*;
    use crate::{aggregate::aggregate, commit::Commit, site::resolve_manifest};

    fn settings() -> ReportSettings {
        ReportSettings {
            generated_at: Utc
                .with_ymd_and_hms(2024, 3, 1, 12, 0, 0)
                .single()
                .expect("valid timestamp"),
            ..ReportSettings::new("Engineering <Pulse>")
        }
    }

    fn commit(author: &str, date: &str, added: u64) -> Commit {
        Commit {
            author: author.to_owned(),
            date: date.to_owned(),
            lines_added: added,
            ..Commit::default()
        }
    }

    fn collected(name: &str, slug: &str) -> EntityReport {
        let commits = [
            commit("Ada", "2024-01-05", 10),
            commit("Bob", "2024-01-06", 0),
            commit("Ada", "2024-02-01", 5)
        ];
        let aggregates = aggregate(&commits, &AggregateOptions::default());
        EntityReport {
            name:       name.to_owned(),
            slug:       slug.to_owned(),
            status:     EntityStatus::Collected,
            recent:     Some(aggregates.clone()),
            aggregates,
            card:       Some(RepositoryCard {
                description: Some("Edge <proxy>".to_owned()),
                topics: vec!["rust".to_owned()],
                languages: vec![("Rust".to_owned(), 3), ("Shell".to_owned(), 1)],
                ..RepositoryCard::default()
            })
        }
    }

    #[test]
    fn recent_window_ends_at_run_date() {
        let mut settings = settings();
        settings.recent_days = 30;
        assert_eq!(settings.recent_since(), NaiveDate::from_ymd_opt(2024, 1, 31));

        settings.since = NaiveDate::from_ymd_opt(2024, 2, 15);
        assert_eq!(settings.recent_since(), NaiveDate::from_ymd_opt(2024, 2, 15));

        settings.recent_days = 0;
        assert_eq!(settings.recent_since(), None);
        assert!(settings.options_for(ReportView::Recent, AggregateOptions::default()).is_none());
    }

    #[test]
    fn detail_page_contains_tables_and_charts() {
        let report = collected("Edge", "edge");
        let html = render_entity_page(&report, ReportView::Primary, &settings())
            .expect("primary page");

        assert!(html.starts_with("<!DOCTYPE html>"));
        assert!(html.contains("<h1>Edge</h1>"));
        assert!(html.contains("Edge &lt;proxy&gt;"));
        assert!(html.contains("<td>Ada</td>"));
        assert!(html.contains("<td>2024-02</td><td>1</td>"));
        assert!(html.contains("75.0%"));
        assert_eq!(html.matches("<svg").count(), 2);
        assert!(!html.contains("banner error"));
    }

    #[test]
    fn failed_report_shows_banner_and_zero_totals() {
        let report = EntityReport::failed("Edge", "edge", "authentication failed: Bad credentials", true);
        let html = render_entity_page(&report, ReportView::Recent, &settings()).expect("recent page");
        assert!(html.contains("banner error"));
        assert!(html.contains("Bad credentials"));
        assert!(html.contains("No commits in this period."));
    }

    #[test]
    fn recent_page_absent_without_recent_view() {
        let mut report = collected("Edge", "edge");
        report.recent = None;
        assert!(render_entity_page(&report, ReportView::Recent, &settings()).is_none());
    }

    #[test]
    fn index_renders_kpis_and_disabled_links() {
        let reports = [
            collected("Edge", "edge"),
            EntityReport::failed("Core", "core", "rate limit exceeded", false)
        ];
        let entries: Vec<PortalEntry> = reports.iter().map(PortalEntry::from).collect();
        let known = ["site/edge.html".to_owned()].into_iter().collect();
        let manifest = resolve_manifest(&["Edge", "Core"], &known);

        let html = render_index(&entries, &manifest, &settings());
        assert!(html.contains("<title>Engineering &lt;Pulse&gt;</title>"));
        assert!(html.contains("<div class=\"value\">2</div><div class=\"label\">Projects</div>"));
        assert!(html.contains("<div class=\"value\">3</div><div class=\"label\">Commits</div>"));
        assert!(html.contains("<div class=\"value\">1</div><div class=\"label\">Failed collections</div>"));
        assert!(html.contains("<a href=\"site/edge.html\">Full history</a>"));
        assert!(html.contains("<span class=\"disabled\" title=\"Not generated\">Recent</span>"));
        assert!(html.contains("Collection failed: rate limit exceeded"));
    }

    #[test]
    fn write_entity_outputs_creates_pages_and_artifact() {
        let directory = tempdir().expect("failed to create temp dir");
        let site_dir = directory.path().join("site");
        let mut settings = settings();
        settings.json = true;

        let written = write_entity_outputs(&site_dir, &collected("Edge", "edge"), &settings)
            .expect("outputs written");
        assert_eq!(written, vec![
            site_dir.join("edge.html"),
            site_dir.join("edge_recent.html"),
            site_dir.join("edge.json")
        ]);

        let artifact = EntityArtifact::read(&site_dir.join("edge.json")).expect("artifact");
        assert_eq!(artifact.status, EntityStatus::Collected);
        assert_eq!(artifact.ranking[0].author, "Ada");
        assert_eq!(PortalEntry::from(&artifact).commits, Some(3));
    }

    #[test]
    fn disabled_recent_window_removes_stale_secondary_page() {
        let directory = tempdir().expect("failed to create temp dir");
        let site_dir = directory.path().join("site");
        write_entity_outputs(&site_dir, &collected("Edge", "edge"), &settings())
            .expect("first run");
        assert!(site_dir.join("edge_recent.html").exists());

        let mut report = collected("Edge", "edge");
        report.recent = None;
        let written = write_entity_outputs(&site_dir, &report, &settings()).expect("second run");
        assert_eq!(written, vec![site_dir.join("edge.html")]);
        assert!(!site_dir.join("edge_recent.html").exists());

        let known = crate::site::list_known_files(directory.path()).expect("listing");
        let manifest = resolve_manifest(&["Edge"], &known);
        let entry = manifest.entry("Edge").expect("entry");
        assert!(entry.primary.enabled);
        assert!(!entry.secondary.enabled);
    }

    #[test]
    fn write_index_propagates_directory_errors() {
        let directory = tempdir().expect("failed to create temp dir");
        let blocked = directory.path().join("blocked");
        File::create(&blocked).expect("failed to create placeholder file");

        let error = write_index(&blocked, &[], &SiteManifest::default(), &settings())
            .expect_err("expected io failure");
        match error {
            Error::ReportIo {
                path, ..
            } => assert_eq!(path, blocked),
            other => panic!("unexpected error variant: {other:?}")
        }
    }
}
