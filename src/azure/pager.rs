use futures::Stream;
use tokio_util::sync::CancellationToken;
use tracing::debug;

use super::models::{PullRequest, RepoRef, SearchCriteria};
use super::source::ReviewSource;
use crate::error::FetchError;

pub const DEFAULT_PAGE_SIZE: u32 = 500;

/// One batch from the listing endpoint.
#[derive(Debug, Clone, PartialEq)]
pub enum Page<T> {
    /// A full page; more results may follow.
    More(Vec<T>),
    /// A short (possibly empty) page; nothing follows.
    Last(Vec<T>),
}

impl<T> Page<T> {
    /// Borrow the batch without consuming the page.
    pub fn items(&self) -> &[T] {
        match self {
            Page::More(items) | Page::Last(items) => items,
        }
    }

    pub fn into_items(self) -> Vec<T> {
        match self {
            Page::More(items) | Page::Last(items) => items,
        }
    }

    pub fn is_last(&self) -> bool {
        matches!(self, Page::Last(_))
    }
}

/// Offset-based pager over the pull request listing.
///
/// Requests `page_size` records at a time and stops after the first batch
/// shorter than `page_size`. No total count is consulted, so a result set
/// that is an exact multiple of the page size costs one extra request that
/// comes back empty.
///
/// Every request is raced against `cancel`. A cancelled pager returns
/// [`FetchError::Cancelled`] and makes no further requests. A service error
/// leaves the offset untouched, so calling [`next_batch`](Self::next_batch)
/// again re-requests the same page.
pub struct PullRequestPager<'a, S> {
    source: &'a S,
    repo: &'a RepoRef,
    criteria: &'a SearchCriteria,
    page_size: u32,
    offset: u32,
    finished: bool,
    cancel: CancellationToken,
}

impl<'a, S: ReviewSource> PullRequestPager<'a, S> {
    pub fn new(
        source: &'a S,
        repo: &'a RepoRef,
        criteria: &'a SearchCriteria,
        page_size: u32,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            source,
            repo,
            criteria,
            page_size: page_size.max(1),
            offset: 0,
            finished: false,
            cancel,
        }
    }

    /// Offset of the next request. After a service error this is the page
    /// that failed, so a caller can resume from it.
    pub fn offset(&self) -> u32 {
        self.offset
    }

    /// True once the last batch was returned or the pager was cancelled.
    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Fetch the next batch, or `None` once the last batch was returned.
    pub async fn next_batch(&mut self) -> Result<Option<Page<PullRequest>>, FetchError> {
        if self.finished {
            return Ok(None);
        }
        if self.cancel.is_cancelled() {
            self.finished = true;
            return Err(FetchError::Cancelled);
        }

        let source = self.source;
        let cancel = self.cancel.clone();
        let fetch = source.list_pull_requests(self.repo, self.criteria, self.offset, self.page_size);

        let outcome = tokio::select! {
            biased;
            _ = cancel.cancelled() => None,
            result = fetch => Some(result),
        };

        let Some(result) = outcome else {
            self.finished = true;
            debug!(offset = self.offset, "Pagination cancelled");
            return Err(FetchError::Cancelled);
        };
        let batch = result?;

        if batch.len() < self.page_size as usize {
            self.finished = true;
            debug!(
                offset = self.offset,
                count = batch.len(),
                "Short batch, pagination complete"
            );
            return Ok(Some(Page::Last(batch)));
        }

        debug!(offset = self.offset, count = batch.len(), "Full batch");
        self.offset = self.offset.saturating_add(self.page_size);
        Ok(Some(Page::More(batch)))
    }

    /// Adapt the pager into a stream of batches. The stream ends after the
    /// last batch or the first error.
    pub fn into_stream(self) -> impl Stream<Item = Result<Vec<PullRequest>, FetchError>> + 'a {
        futures::stream::try_unfold(self, |mut pager| async move {
            let page = pager.next_batch().await?;
            Ok(page.map(|page| (page.into_items(), pager)))
        })
    }
}
