#![allow(non_shorthand_field_patterns)]
#![doc = "Error handling primitives shared across the report generator."]
// SPDX-FileCopyrightText: 2025 RAprogramm <andrey.rozanov.vl@gmail.com>
//
// SPDX-License-Identifier: MIT

//! The derive emitted by [`masterror::Error`] expands pattern matches that
//! trigger the `non_shorthand_field_patterns` lint. The lint is disabled for
//! the module to keep the generated implementations warning-free.
//!
//! Errors fall into three groups. Configuration and validation failures are
//! fatal and abort a run before collection starts. Remote failures
//! ([`Error::Unauthorized`], [`Error::RateLimited`], [`Error::Network`],
//! [`Error::Service`]) are scoped to a single entity and end up as a visible
//! status in the generated report. Output failures abort the run.

use std::path::{Path, PathBuf};

/// Unified error type returned by the collectors, renderers, and CLI.
#[derive(Debug, masterror::Error)]
pub enum Error {
    /// Wraps I/O errors that occur while reading inputs.
    #[error("failed to read {path:?}: {source}")]
    Io {
        /// Location of the input that could not be read.
        path:   PathBuf,
        /// Underlying I/O error.
        source: std::io::Error
    },
    /// Wraps YAML decoding errors for configuration files.
    #[error("failed to parse configuration: {source}")]
    Config {
        /// Source decoding error from serde_yaml.
        source: serde_yaml::Error
    },
    /// Returned when configuration or arguments violate invariants.
    #[error("invalid configuration: {message}")]
    Validation {
        /// Human readable message describing the validation problem.
        message: String
    },
    /// Wraps JSON encoding and decoding errors.
    #[error("invalid JSON payload: {source}")]
    Json {
        /// Underlying serde_json error.
        source: serde_json::Error
    },
    /// Wraps I/O errors that occur while writing report files.
    #[error("failed to write report artifact at {path:?}: {source}")]
    ReportIo {
        /// Location of the artifact being produced.
        path:   PathBuf,
        /// Underlying I/O error reported by the operating system.
        source: std::io::Error
    },
    /// Local `git` invocation failed.
    #[error("git failed: {message}")]
    Git {
        /// Stderr or spawn failure reported by git.
        message: String
    },
    /// The remote rejected the credentials or denied access.
    #[error("authentication failed: {message}")]
    Unauthorized {
        /// Details reported by the remote.
        message: String
    },
    /// The remote rate limit is exhausted; re-run after the reset time.
    #[error("rate limit exceeded: {message}")]
    RateLimited {
        /// Details including the reset time when known.
        message: String
    },
    /// Transport failure or server-side error; safe to retry.
    #[error("network error: {message}")]
    Network {
        /// Human readable message describing the failure.
        message: String
    },
    /// Any other unexpected remote response.
    #[error("service error: {message}")]
    Service {
        /// Human readable message describing the service error.
        message: String
    }
}

impl Error {
    /// Constructs a validation error from the provided displayable value.
    ///
    /// # Parameters
    ///
    /// * `message` - Human-readable description of the validation failure.
    pub fn validation<M>(message: M) -> Self
    where
        M: Into<String>
    {
        Self::Validation {
            message: message.into()
        }
    }

    /// Constructs a service error from the provided displayable value.
    pub fn service<M>(message: M) -> Self
    where
        M: Into<String>
    {
        Self::Service {
            message: message.into()
        }
    }

    /// Constructs a network error from the provided displayable value.
    pub fn network<M>(message: M) -> Self
    where
        M: Into<String>
    {
        Self::Network {
            message: message.into()
        }
    }

    /// Returns `true` when repeating the same request may succeed.
    ///
    /// Only transport and server-side failures qualify. Authentication and
    /// rate-limit failures will not resolve within a single run.
    pub fn is_transient(&self) -> bool {
        matches!(self, Self::Network { .. })
    }

    /// Formats the error for diagnostics without the variant name.
    ///
    /// The returned string matches the [`std::fmt::Display`] implementation.
    pub fn to_display_string(&self) -> String {
        format!("{self}")
    }
}

impl From<serde_yaml::Error> for Error {
    fn from(source: serde_yaml::Error) -> Self {
        Self::Config {
            source
        }
    }
}

impl From<serde_json::Error> for Error {
    fn from(source: serde_json::Error) -> Self {
        Self::Json {
            source
        }
    }
}

/// Creates an [`Error::Io`] variant capturing the failing path and source.
///
/// # Parameters
///
/// * `path` - Location of the input that triggered the error.
/// * `source` - I/O error reported by the operating system.
pub fn io_error(path: &Path, source: std::io::Error) -> Error {
    Error::Io {
        path: path.to_path_buf(),
        source
    }
}

/// Creates an [`Error::ReportIo`] variant capturing the failing path and
/// source.
///
/// # Parameters
///
/// * `path` - Location of the report artifact that triggered the error.
/// * `source` - I/O error reported by the operating system.
pub fn report_io_error(path: &Path, source: std::io::Error) -> Error {
    Error::ReportIo {
        path: path.to_path_buf(),
        source
    }
}
