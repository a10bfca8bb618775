use std::future::Future;

use super::models::{PullRequest, RepoRef, ReviewThread, SearchCriteria};
use crate::error::ServiceError;

/// The two read endpoints a report run needs.
///
/// Implemented by [`AzureDevOpsClient`](super::AzureDevOpsClient); tests
/// supply in-memory sources.
pub trait ReviewSource {
    /// Up to `top` pull requests matching `criteria`, starting at `skip`.
    fn list_pull_requests(
        &self,
        repo: &RepoRef,
        criteria: &SearchCriteria,
        skip: u32,
        top: u32,
    ) -> impl Future<Output = Result<Vec<PullRequest>, ServiceError>> + Send;

    fn list_threads(
        &self,
        repo: &RepoRef,
        pull_request_id: u32,
    ) -> impl Future<Output = Result<Vec<ReviewThread>, ServiceError>> + Send;
}
