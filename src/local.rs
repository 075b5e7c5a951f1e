// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
// SPDX-License-Identifier: MIT

/// Local commit history input.
///
/// Runs `git log` against a working copy, or reads a previously captured log
/// file, and feeds the text through [`parse_log`].
use std::{fs, path::Path, process::Command};

use chrono::NaiveDate;
use tracing::{debug, info};

use crate::{
    commit::Commit,
    error::{self, Error},
    normalizer::{LOG_FORMAT, parse_log},
};

/// Reads the commit history of the repository at `repo`.
///
/// # Arguments
///
/// * `repo` - Path to a git working copy
/// * `since` - Optional lower bound forwarded to `git log --since`
///
/// # Errors
///
/// Returns [`Error::Git`] when git cannot be spawned or exits unsuccessfully.
///
/// # Example
///
/// ```no_run
/// use std::path::Path;
///
/// use repopulse::read_repository;
///
/// # fn example() -> Result<(), repopulse::Error> {
/// let commits = read_repository(Path::new("."), None)?;
/// println!("{} commits", commits.len());
/// # Ok(())
/// # }
/// ```
pub fn read_repository(repo: &Path, since: Option<NaiveDate,>,) -> Result<Vec<Commit,>, Error,>
{
    debug!("Running git log in {}", repo.display());

    let output = Command::new("git",)
        .arg("-C",)
        .arg(repo,)
        .args(git_log_args(since,),)
        .output()
        .map_err(|e| Error::Git {
            message: format!("failed to spawn git: {e}"),
        },)?;

    if !output.status.success() {
        let stderr = String::from_utf8_lossy(&output.stderr,);
        return Err(Error::Git {
            message: format!("git log in {} failed: {}", repo.display(), stderr.trim()),
        },);
    }

    let text = String::from_utf8_lossy(&output.stdout,);
    let commits = parse_log(&text,);
    info!("Read {} commits from {}", commits.len(), repo.display());

    Ok(commits,)
}

/// Reads a log captured earlier with `git log --numstat` and [`LOG_FORMAT`].
///
/// # Errors
///
/// Returns [`Error::Io`] when the file cannot be read.
pub fn read_log_file(path: &Path,) -> Result<Vec<Commit,>, Error,>
{
    let bytes = fs::read(path,).map_err(|source| error::io_error(path, source,),)?;
    let commits = parse_log(&String::from_utf8_lossy(&bytes,),);
    info!("Read {} commits from {}", commits.len(), path.display());
    Ok(commits,)
}

fn git_log_args(since: Option<NaiveDate,>,) -> Vec<String,>
{
    let mut args = vec![
        "log".to_owned(),
        "--numstat".to_owned(),
        "--date=short".to_owned(),
        format!("--pretty=format:{LOG_FORMAT}"),
    ];
    if let Some(date,) = since {
        args.push(format!("--since={}", date.format("%Y-%m-%d")),);
    }
    args
}
