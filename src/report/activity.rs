//! Rebuilds a reviewer's activity on one pull request from its lifecycle
//! dates and its vote-update threads.

use chrono::{DateTime, Utc};
use thiserror::Error;
use tracing::{debug, warn};

use crate::azure::models::{PullRequest, ReviewThread, Vote};

pub const THREAD_TYPE_KEY: &str = "CodeReviewThreadType";
pub const VOTE_UPDATE: &str = "VoteUpdate";
pub const VOTED_BY_KEY: &str = "CodeReviewVotedByIdentity";
pub const VOTE_RESULT_KEY: &str = "CodeReviewVoteResult";

pub const CREATED_LABEL: &str = "Created";
pub const CLOSED_LABEL: &str = "Closed";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimelineEntry {
    pub label: String,
    pub timestamp: DateTime<Utc>,
}

impl TimelineEntry {
    pub fn new(label: impl Into<String>, timestamp: DateTime<Utc>) -> Self {
        Self {
            label: label.into(),
            timestamp,
        }
    }
}

/// A vote cast by the target identity, as recorded by a vote-update thread.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VoteEvent {
    pub voter_id: String,
    pub code: String,
    pub vote: Vote,
    /// Published date of the comment announcing the vote.
    pub timestamp: DateTime<Utc>,
}

impl VoteEvent {
    pub fn label(&self) -> String {
        format!("Marked PR as {}", self.vote.label())
    }

    pub fn to_entry(&self) -> TimelineEntry {
        TimelineEntry::new(self.label(), self.timestamp)
    }
}

/// A vote-update thread whose metadata does not have the expected shape.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ThreadDecodeError {
    #[error("missing property {0}")]
    MissingProperty(&'static str),

    #[error("property {0} is not a string")]
    MalformedProperty(&'static str),

    #[error("voter reference {0:?} not found in thread identities")]
    UnknownIdentity(String),

    #[error("no comment contains \"voted {0}\"")]
    NoConfirmingComment(String),
}

/// A pull request together with its reconstructed timeline.
#[derive(Debug, Clone)]
pub struct PullRequestActivity {
    pub pull_request: PullRequest,
    pub timeline: Vec<TimelineEntry>,
}

/// Decode `thread` into a vote cast by `target_id`.
///
/// `Ok(None)` means the thread is not a vote update by the target: it has no
/// properties, a different thread type, or a different voter. Errors are
/// vote-update threads with missing or malformed metadata.
///
/// The vote time is taken from the first comment containing
/// `voted {code}`. Threads carry no structured timestamp for the vote itself,
/// so this is a text heuristic: a thread holding two votes with the same code
/// resolves both to the earlier comment.
pub fn decode_vote_event(
    thread: &ReviewThread,
    target_id: &str,
) -> Result<Option<VoteEvent>, ThreadDecodeError> {
    let Some(properties) = thread.properties.as_ref() else {
        return Ok(None);
    };

    let Some(thread_type) = properties.get(THREAD_TYPE_KEY) else {
        return Ok(None);
    };
    if thread_type.to_text().as_deref() != Some(VOTE_UPDATE) {
        return Ok(None);
    }

    let voter_ref = properties
        .get(VOTED_BY_KEY)
        .ok_or(ThreadDecodeError::MissingProperty(VOTED_BY_KEY))?
        .to_text()
        .ok_or(ThreadDecodeError::MalformedProperty(VOTED_BY_KEY))?;

    let voter = thread
        .identities
        .as_ref()
        .and_then(|identities| identities.get(&voter_ref))
        .ok_or_else(|| ThreadDecodeError::UnknownIdentity(voter_ref.clone()))?;

    if !voter.id.eq_ignore_ascii_case(target_id) {
        return Ok(None);
    }

    let code = properties
        .get(VOTE_RESULT_KEY)
        .ok_or(ThreadDecodeError::MissingProperty(VOTE_RESULT_KEY))?
        .to_text()
        .ok_or(ThreadDecodeError::MalformedProperty(VOTE_RESULT_KEY))?;
    let code = code.trim().to_string();

    let comment = thread
        .comments
        .iter()
        .find(|c| {
            c.content
                .as_deref()
                .is_some_and(|text| comment_confirms_vote(text, &code))
        })
        .ok_or_else(|| ThreadDecodeError::NoConfirmingComment(code.clone()))?;

    Ok(Some(VoteEvent {
        voter_id: voter.id.clone(),
        vote: Vote::from_code(&code),
        code,
        timestamp: comment.published_date,
    }))
}

/// True if `text` contains `voted {code}` with no further digit after the
/// code, so `voted 1` does not match `voted 10`.
pub fn comment_confirms_vote(text: &str, code: &str) -> bool {
    let needle = format!("voted {code}");
    text.match_indices(&needle).any(|(start, _)| {
        !text[start + needle.len()..]
            .chars()
            .next()
            .is_some_and(|c| c.is_ascii_digit())
    })
}

/// Build the timeline of `pull_request` as seen by `target_id`, most recent
/// entry first. Entries with equal timestamps keep insertion order:
/// created, closed, then votes from the most recently updated thread down.
pub fn reconstruct_timeline(
    pull_request: &PullRequest,
    threads: &[ReviewThread],
    target_id: &str,
) -> Vec<TimelineEntry> {
    let mut timeline = vec![TimelineEntry::new(
        CREATED_LABEL,
        pull_request.creation_date,
    )];

    if let Some(closed) = pull_request.closed_date {
        timeline.push(TimelineEntry::new(CLOSED_LABEL, closed));
    }

    let mut ordered: Vec<&ReviewThread> = threads.iter().collect();
    ordered.sort_by(|a, b| b.last_updated_date.cmp(&a.last_updated_date));

    for thread in ordered {
        match decode_vote_event(thread, target_id) {
            Ok(Some(event)) => {
                debug!(
                    pull_request = pull_request.id,
                    thread = thread.id,
                    code = %event.code,
                    "Found vote event"
                );
                timeline.push(event.to_entry());
            }
            Ok(None) => {}
            Err(e) => {
                warn!(
                    pull_request = pull_request.id,
                    thread = thread.id,
                    error = %e,
                    "Skipping vote thread"
                );
            }
        }
    }

    timeline.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
    timeline
}
