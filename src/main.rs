//! Command-line interface for the repopulse binary.
//!
//! `local` and `remote` collect commits and write a full report; `index`
//! rebuilds only the portal page from reports already on disk. Values from an
//! optional `--config` YAML file are overridden by explicit flags.

use std::{path::PathBuf, process, str::FromStr};

use chrono::NaiveDate;
use clap::{ArgAction, Args, Parser, Subcommand};
use repopulse::{
    AuthorIdentity, Error, GitHubSource, LocalInput, RankMetric, RemoteTarget, ReportConfig,
    ReportSettings, RetryConfig, RunOptions, RunSummary, load_config, rebuild_index, run_local,
    run_remote,
};
use tracing::info;
use tracing_subscriber::EnvFilter;

const DEFAULT_OUTPUT: &str = "report";
const DEFAULT_TITLE: &str = "Repository activity";

/// Render commit activity reports as static HTML.
#[derive(Debug, Parser,)]
#[command(name = "repopulse", version, about = "Render commit activity reports as static HTML")]
struct Cli
{
    #[command(subcommand)]
    command: Command,
}

#[derive(Debug, Subcommand,)]
enum Command
{
    /// Report on a local git repository or a captured log file.
    Local(LocalArgs,),
    /// Report on the repositories of a GitHub user or organization.
    Remote(RemoteArgs,),
    /// Rebuild the portal page from existing reports.
    Index(IndexArgs,),
}

/// Options shared by the collecting subcommands.
#[derive(Debug, Args, Default,)]
struct CommonArgs
{
    /// YAML configuration file; flags take precedence over its values.
    #[arg(long = "config", value_name = "PATH")]
    config: Option<PathBuf,>,

    /// Output directory [default: report].
    #[arg(long = "output", value_name = "DIR")]
    output: Option<PathBuf,>,

    /// Ignore commits before this date.
    #[arg(long = "since", value_name = "YYYY-MM-DD")]
    since: Option<String,>,

    /// Portal title.
    #[arg(long = "title", value_name = "TEXT")]
    title: Option<String,>,

    /// Ranking metric: commits, lines-added, or lines-removed.
    #[arg(long = "metric", value_name = "METRIC")]
    metric: Option<String,>,

    /// Number of ranked authors [default: 12].
    #[arg(long = "top", value_name = "N")]
    top: Option<usize,>,

    /// Length of the recent window in days, 0 disables it [default: 90].
    #[arg(long = "recent-days", value_name = "DAYS")]
    recent_days: Option<u32,>,

    /// Author identity: name or name-and-email.
    #[arg(long = "identity", value_name = "MODE")]
    identity: Option<String,>,

    /// Also write a JSON artifact per entity.
    #[arg(long = "json", action = ArgAction::SetTrue)]
    json: bool,
}

#[derive(Debug, Args,)]
struct LocalArgs
{
    /// Repository working tree [default: current directory].
    #[arg(long = "repo", value_name = "DIR", conflicts_with = "log")]
    repo: Option<PathBuf,>,

    /// Log captured with `git log --numstat --date=short --pretty=format:'%H|%an|%ae|%ad|%s'`.
    #[arg(long = "log", value_name = "FILE")]
    log: Option<PathBuf,>,

    /// Entity name shown in the report.
    #[arg(long = "name", value_name = "NAME")]
    name: Option<String,>,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Debug, Args,)]
struct RemoteArgs
{
    /// GitHub user or organization.
    #[arg(long = "owner", value_name = "OWNER", env = "REPOPULSE_OWNER")]
    owner: Option<String,>,

    /// Repository to include; repeat for several. Defaults to every owned
    /// repository.
    #[arg(long = "repo", value_name = "NAME")]
    repos: Vec<String,>,

    /// Personal access token.
    #[arg(long = "token", value_name = "TOKEN", env = "GITHUB_TOKEN", hide_env_values = true)]
    token: Option<String,>,

    /// Fetch every commit individually to obtain line counts.
    #[arg(long = "detailed-stats", action = ArgAction::SetTrue)]
    detailed_stats: bool,

    #[command(flatten)]
    common: CommonArgs,
}

#[derive(Debug, Args,)]
struct IndexArgs
{
    /// Output directory holding the reports.
    #[arg(long = "output", value_name = "DIR", default_value = DEFAULT_OUTPUT)]
    output: PathBuf,

    /// Entity to list; repeat for several.
    #[arg(long = "entity", value_name = "NAME", required = true)]
    entities: Vec<String,>,

    /// Portal title.
    #[arg(long = "title", value_name = "TEXT", default_value = DEFAULT_TITLE)]
    title: String,
}

#[tokio::main]
async fn main()
{
    init_logging();

    if let Err(error,) = run(Cli::parse(),).await {
        eprintln!("{}", error.to_display_string());
        process::exit(1,);
    }
}

fn init_logging()
{
    let _ = tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info",),),
        )
        .with_writer(std::io::stderr,)
        .try_init();
}

async fn run(cli: Cli,) -> Result<(), Error,>
{
    match cli.command {
        Command::Local(args,) => run_local_command(args,),
        Command::Remote(args,) => run_remote_command(args,).await,
        Command::Index(args,) => run_index_command(args,),
    }
}

fn run_local_command(args: LocalArgs,) -> Result<(), Error,>
{
    let config = file_config(&args.common,)?;
    let options = run_options(&args.common, &config,)?;
    let local = config.local.unwrap_or_default();

    let input = match (args.repo, args.log,) {
        (Some(repo,), _,) => LocalInput::Repository(repo,),
        (None, Some(log,),) => LocalInput::LogFile(log,),
        (None, None,) => match (local.repo, local.log,) {
            (_, Some(log,),) => LocalInput::LogFile(PathBuf::from(log,),),
            (repo, None,) => LocalInput::Repository(PathBuf::from(repo.unwrap_or_else(|| ".".to_owned(),),),),
        },
    };
    let name = args.name.or(local.name,);

    let summary = run_local(&input, name.as_deref(), &options,)?;
    print_summary(&summary,);
    Ok((),)
}

async fn run_remote_command(args: RemoteArgs,) -> Result<(), Error,>
{
    let config = file_config(&args.common,)?;
    let options = run_options(&args.common, &config,)?;
    let remote = config.remote.unwrap_or_default();

    let owner = args
        .owner
        .or_else(|| Some(remote.owner,).filter(|owner| !owner.trim().is_empty(),),)
        .ok_or_else(|| Error::validation("missing GitHub owner (use --owner or REPOPULSE_OWNER)",),)?;
    let token = args
        .token
        .filter(|token| !token.trim().is_empty(),)
        .ok_or_else(|| Error::validation("missing GitHub token (use --token or GITHUB_TOKEN)",),)?;
    let target = RemoteTarget {
        owner,
        repositories: if args.repos.is_empty() { remote.repositories } else { args.repos },
        detailed_stats: args.detailed_stats || remote.detailed_stats.unwrap_or(false,),
    };

    info!("Collecting repositories of {}", target.owner);
    let source = GitHubSource::new(&token,)?;
    let summary = run_remote(&source, RetryConfig::default(), &target, &options,).await?;
    print_summary(&summary,);
    Ok((),)
}

fn run_index_command(args: IndexArgs,) -> Result<(), Error,>
{
    let settings = ReportSettings::new(args.title,);
    let (index, manifest,) = rebuild_index(&args.output, &args.entities, &settings,)?;
    println!("Wrote {} ({} live links)", index.display(), manifest.live_links());
    Ok((),)
}

fn print_summary(summary: &RunSummary,)
{
    println!(
        "Wrote {} ({} entities, {} failed)",
        summary.index.display(),
        summary.reports.len(),
        summary.failed()
    );
}

fn file_config(common: &CommonArgs,) -> Result<ReportConfig, Error,>
{
    match &common.config {
        Some(path,) => load_config(path,),
        None => Ok(ReportConfig::default(),),
    }
}

fn run_options(common: &CommonArgs, config: &ReportConfig,) -> Result<RunOptions, Error,>
{
    let since = match common.since.as_deref() {
        Some(raw,) => Some(parse_date(raw,)?,),
        None => config.since,
    };
    let metric = match common.metric.as_deref() {
        Some(raw,) => RankMetric::from_str(raw,)?,
        None => config.metric.unwrap_or_default(),
    };
    let identity = match common.identity.as_deref() {
        Some(raw,) => AuthorIdentity::from_str(raw,)?,
        None => config.identity.unwrap_or_default(),
    };
    let top = common.top.or(config.top,).unwrap_or(12,);
    if top == 0 {
        return Err(Error::validation("--top must be at least 1",),);
    }

    let title = common
        .title
        .clone()
        .or_else(|| config.title.clone(),)
        .unwrap_or_else(|| DEFAULT_TITLE.to_owned(),);
    let mut settings = ReportSettings::new(title,);
    settings.metric = metric;
    settings.top = top;
    settings.since = since;
    settings.recent_days = common.recent_days.or(config.recent_days,).unwrap_or(90,);
    settings.json = common.json || config.json.unwrap_or(false,);

    let output = common
        .output
        .clone()
        .or_else(|| config.output.as_ref().map(PathBuf::from,),)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT,),);

    Ok(RunOptions {
        output,
        settings,
        identity,
    },)
}

fn parse_date(raw: &str,) -> Result<NaiveDate, Error,>
{
    NaiveDate::parse_from_str(raw.trim(), "%Y-%m-%d",)
        .map_err(|_| Error::validation(format!("invalid date '{raw}' (expected YYYY-MM-DD)"),),)
}

#[cfg(test)]
mod tests
{
    use std::path::Path;

    use clap::Parser;
    use repopulse::parse_config;

    use super::*;

    #[test]
    fn local_subcommand_accepts_common_flags()
    {
        let cli = Cli::try_parse_from([
            env!("CARGO_PKG_NAME"),
            "local",
            "--log",
            "git.log",
            "--since",
            "2024-01-01",
            "--metric",
            "lines-added",
            "--top",
            "5",
            "--json",
        ],)
        .expect("failed to parse CLI",);

        let Command::Local(args,) = cli.command else {
            panic!("unexpected command variant");
        };
        assert_eq!(args.log.as_deref(), Some(Path::new("git.log")));
        assert!(args.common.json);

        let options = run_options(&args.common, &ReportConfig::default(),).expect("valid options",);
        assert_eq!(options.settings.metric, RankMetric::LinesAdded);
        assert_eq!(options.settings.top, 5);
        assert_eq!(options.settings.since, NaiveDate::from_ymd_opt(2024, 1, 1,));
        assert_eq!(options.output, PathBuf::from("report"));
    }

    #[test]
    fn repo_and_log_conflict()
    {
        let result = Cli::try_parse_from([
            env!("CARGO_PKG_NAME"),
            "local",
            "--repo",
            ".",
            "--log",
            "git.log",
        ],);
        assert!(result.is_err());
    }

    #[test]
    fn remote_subcommand_collects_repeated_repos()
    {
        let cli = Cli::try_parse_from([
            env!("CARGO_PKG_NAME"),
            "remote",
            "--owner",
            "octo",
            "--repo",
            "alpha",
            "--repo",
            "beta",
            "--token",
            "secret",
            "--detailed-stats",
        ],)
        .expect("failed to parse CLI",);

        let Command::Remote(args,) = cli.command else {
            panic!("unexpected command variant");
        };
        assert_eq!(args.owner.as_deref(), Some("octo"));
        assert_eq!(args.repos, vec!["alpha".to_owned(), "beta".to_owned()]);
        assert!(args.detailed_stats);
    }

    #[test]
    fn flags_override_file_configuration()
    {
        let config = parse_config(
            "title: From file\noutput: site-out\ntop: 3\nrecent_days: 0\nmetric: lines-removed\n",
        )
        .expect("valid configuration",);
        let common = CommonArgs {
            title: Some("From flag".to_owned(),),
            top: Some(8,),
            ..CommonArgs::default()
        };

        let options = run_options(&common, &config,).expect("valid options",);
        assert_eq!(options.settings.title, "From flag");
        assert_eq!(options.settings.top, 8);
        assert_eq!(options.settings.recent_days, 0);
        assert_eq!(options.settings.metric, RankMetric::LinesRemoved);
        assert_eq!(options.output, PathBuf::from("site-out"));
    }

    #[test]
    fn invalid_values_are_validation_errors()
    {
        let bad_date = CommonArgs {
            since: Some("01/02/2024".to_owned(),), ..CommonArgs::default()
        };
        match run_options(&bad_date, &ReportConfig::default(),) {
            Err(Error::Validation {
                message,
            },) => assert!(message.contains("YYYY-MM-DD"), "{message}"),
            other => panic!("expected validation error, got {other:?}"),
        }

        let bad_metric = CommonArgs {
            metric: Some("stars".to_owned(),), ..CommonArgs::default()
        };
        assert!(matches!(
            run_options(&bad_metric, &ReportConfig::default(),),
            Err(Error::Validation { .. })
        ));

        let zero_top = CommonArgs {
            top: Some(0,), ..CommonArgs::default()
        };
        assert!(matches!(
            run_options(&zero_top, &ReportConfig::default(),),
            Err(Error::Validation { .. })
        ));
    }

    #[tokio::test]
    async fn remote_without_token_fails_before_collection()
    {
        let args = RemoteArgs {
            owner:          Some("octo".to_owned(),),
            repos:          Vec::new(),
            token:          None,
            detailed_stats: false,
            common:         CommonArgs::default(),
        };
        match run_remote_command(args,).await {
            Err(Error::Validation {
                message,
            },) => assert!(message.contains("token"), "{message}"),
            other => panic!("expected validation error, got {other:?}"),
        }
    }

    #[test]
    fn index_subcommand_requires_entities()
    {
        assert!(Cli::try_parse_from([env!("CARGO_PKG_NAME"), "index"],).is_err());
        let cli = Cli::try_parse_from([env!("CARGO_PKG_NAME"), "index", "--entity", "Core"],)
            .expect("failed to parse CLI",);
        let Command::Index(args,) = cli.command else {
            panic!("unexpected command variant");
        };
        assert_eq!(args.output, PathBuf::from("report"));
        assert_eq!(args.title, DEFAULT_TITLE);
    }
}
