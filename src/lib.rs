//! Commit activity reports rendered as static HTML.
//!
//! The library turns a commit history, read from a local `git log` or
//! collected page by page from the GitHub REST API, into per-author rankings,
//! monthly trends, and a portal page linking one report per repository.
//!
//! The main pieces, leaves first:
//!
//! - [`parse_log`] and [`commit_from_api`] normalize raw records into
//!   [`Commit`] values.
//! - [`Collector`] follows `Link: rel="next"` continuations over any
//!   [`PageSource`] and classifies authentication, rate-limit, and transport
//!   failures.
//! - [`aggregate`] reduces commits into [`AuthorStat`] rows and
//!   [`MonthBucket`]s.
//! - [`layout_bars`] and [`layout_line`] map series onto pixel geometry.
//! - [`resolve_manifest`] decides which portal links are live.
//! - [`run_local`] and [`run_remote`] drive a whole run.

mod aggregate;
mod chart;
mod collector;
mod commit;
mod config;
mod error;
mod local;
mod markup;
mod normalizer;
mod pipeline;
mod remote;
mod report;
mod retry;
mod site;
mod slug;
mod svg;

pub use aggregate::{
    AggregateOptions, Aggregates, AuthorIdentity, AuthorStat, MonthBucket, RankMetric, Totals,
    aggregate, rank, top_n
};
pub use chart::{
    AxisLabel, BAR_CANVAS, Bar, BarCanvas, BarLayout, GRIDLINE_COUNT, Gridline, LINE_CANVAS,
    LineCanvas, LineLayout, LinePoint, SeriesPoint, TARGET_X_TICKS, layout_bars, layout_line,
    thin_label_indices
};
pub use collector::{
    Collector, DEFAULT_PER_PAGE, GitHubSource, LinkParser, PageRequest, PageSource, RawResponse,
    classify_response
};
pub use commit::Commit;
pub use config::{LocalSource, RemoteSource, ReportConfig, load_config, parse_config};
pub use error::{Error, io_error, report_io_error};
pub use local::{read_log_file, read_repository};
pub use markup::{Fragments, escape_xml};
pub use normalizer::{LOG_FORMAT, commit_from_api, commits_from_api, parse_log};
pub use pipeline::{
    LocalInput, RemoteTarget, RunOptions, RunSummary, build_report, rebuild_index, run_local,
    run_remote
};
pub use remote::{CommitQuery, RepositoryCard, fetch_card, fetch_commits, list_repositories};
pub use report::{
    EntityArtifact, EntityReport, EntityStatus, PortalEntry, ReportSettings, ReportView,
    render_entity_page, render_index, write_entity_outputs, write_index
};
pub use retry::{RetryConfig, retry_with_backoff};
pub use site::{
    LinkTarget, ManifestEntry, REPORT_EXTENSION, SECONDARY_SUFFIX, SITE_DIR, SiteManifest,
    detect_base_dir, list_known_files, primary_file_name, resolve_manifest, secondary_file_name
};
pub use slug::{SlugStrategy, assign_slugs};
pub use svg::{bar_chart_svg, line_chart_svg};
