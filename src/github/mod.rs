//! GitHub API client, app authentication and effect interpreter.
//!
//! This module executes `GitHubEffect`s via the octocrab library and mints
//! installation-scoped clients for the `InstallationBroker` seam.
//!
//! Key features:
//! - Exponential backoff retry for transient failures
//! - Distinguishes transient vs permanent errors
//! - 404 on a lookup is an empty response, not an error

mod app;
mod client;
mod error;
mod interpreter;
mod retry;

pub use app::GitHubApp;
pub use client::OctocrabClient;
pub use error::{GitHubApiError, GitHubErrorKind};
pub use interpreter::interpret_github_effect;
pub use retry::{RetryConfig, retry_with_backoff};
