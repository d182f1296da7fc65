//! Effect interpreter trait.
//!
//! The trait-based design lets the pipeline run against the real GitHub API
//! (`crate::github::OctocrabClient`) or against in-memory fake organizations
//! in tests.

use std::future::Future;

use super::github::{GitHubEffect, GitHubResponse};

/// Interprets GitHub effects against the GitHub API.
///
/// An interpreter carries one set of credentials. Reads against an
/// organization other than the one it was authorized for may fail, which is
/// why the pipeline obtains a separate interpreter scoped to the source
/// organization when it needs to read there.
///
/// # Example (mock for testing)
///
/// ```ignore
/// struct MockGitHubInterpreter {
///     response: GitHubResponse,
/// }
///
/// impl GitHubInterpreter for MockGitHubInterpreter {
///     type Error = GitHubApiError;
///
///     fn interpret(
///         &self,
///         _effect: GitHubEffect,
///     ) -> impl Future<Output = Result<GitHubResponse, Self::Error>> + Send {
///         let response = self.response.clone();
///         async move { Ok(response) }
///     }
/// }
/// ```
pub trait GitHubInterpreter {
    /// The error type returned by this interpreter.
    type Error;

    /// Execute a GitHub effect and return its response.
    fn interpret(
        &self,
        effect: GitHubEffect,
    ) -> impl Future<Output = Result<GitHubResponse, Self::Error>> + Send;
}
