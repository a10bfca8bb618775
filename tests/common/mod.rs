#![allow(dead_code)]

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, TimeZone, Utc};
use reviewtrail::azure::models::{
    Comment, IdentityRef, PropertyValue, PullRequest, RepoRef, ReviewThread, Reviewer,
    SearchCriteria,
};
use reviewtrail::azure::source::ReviewSource;
use reviewtrail::error::ServiceError;
use reviewtrail::report::activity::PullRequestActivity;
use reviewtrail::report::render::{ReportContext, render_report};
use tokio_util::sync::CancellationToken;

pub const ME: &str = "6f1c3e2a-0000-4000-8000-000000000001";
pub const OTHER: &str = "9b2d4f6c-0000-4000-8000-000000000002";

pub fn render_to_string(ctx: &ReportContext, activities: &[PullRequestActivity]) -> String {
    let mut buf = Vec::new();
    render_report(&mut buf, ctx, activities).unwrap();
    String::from_utf8(buf).unwrap()
}

pub fn at(y: i32, m: u32, d: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(y, m, d, 12, 0, 0).unwrap()
}

pub fn identity(id: &str, name: &str) -> IdentityRef {
    IdentityRef {
        id: id.into(),
        display_name: name.into(),
        unique_name: None,
    }
}

pub fn make_pr(id: u32, title: &str, created: DateTime<Utc>) -> PullRequest {
    PullRequest {
        id,
        title: title.into(),
        created_by: identity(OTHER, "Alice"),
        creation_date: created,
        closed_date: None,
        status: Some("active".into()),
        reviewers: vec![],
    }
}

pub fn with_reviewer(mut pr: PullRequest, id: &str, vote: i32) -> PullRequest {
    pr.reviewers.push(Reviewer {
        id: id.into(),
        display_name: "Reviewer".into(),
        vote,
    });
    pr
}

pub fn comment(id: u64, content: &str, published: DateTime<Utc>) -> Comment {
    Comment {
        id,
        content: Some(content.into()),
        published_date: published,
        author: None,
    }
}

/// A vote-update thread as the service returns it, voter under reference "1".
pub fn vote_thread(
    thread_id: u64,
    voter_id: &str,
    code: &str,
    comments: Vec<Comment>,
) -> ReviewThread {
    let last_updated = comments.last().map(|c| c.published_date);
    let mut properties = HashMap::new();
    properties.insert(
        "CodeReviewThreadType".to_string(),
        PropertyValue::text("VoteUpdate"),
    );
    properties.insert(
        "CodeReviewVotedByIdentity".to_string(),
        PropertyValue::text("1"),
    );
    properties.insert("CodeReviewVoteResult".to_string(), PropertyValue::text(code));

    let mut identities = HashMap::new();
    identities.insert("1".to_string(), identity(voter_id, "Bob"));

    ReviewThread {
        id: thread_id,
        last_updated_date: last_updated,
        properties: Some(properties),
        identities: Some(identities),
        comments,
    }
}

pub fn repo() -> RepoRef {
    RepoRef::new("Project", "repo")
}

pub fn criteria() -> SearchCriteria {
    SearchCriteria {
        status: reviewtrail::azure::models::PullRequestStatus::All,
        reviewer_id: ME.into(),
        min_time: at(2023, 12, 1),
        max_time: at(2024, 1, 31),
    }
}

/// In-memory service. Records every listing request as `(skip, top)`.
#[derive(Default)]
pub struct FakeSource {
    pub pull_requests: Vec<PullRequest>,
    pub threads: HashMap<u32, Vec<ReviewThread>>,
    pub calls: Mutex<Vec<(u32, u32)>>,
    pub thread_calls: Mutex<Vec<u32>>,
    pub fail_at_skip: Option<u32>,
    pub fail_threads: bool,
    /// Cancel this token while serving the given (1-based) listing call.
    pub cancel_on_call: Option<(usize, CancellationToken)>,
    /// Listing requests never complete.
    pub hang: bool,
}

impl FakeSource {
    pub fn with_pull_requests(pull_requests: Vec<PullRequest>) -> Self {
        Self {
            pull_requests,
            ..Default::default()
        }
    }

    pub fn calls(&self) -> Vec<(u32, u32)> {
        self.calls.lock().unwrap().clone()
    }

    pub fn thread_calls(&self) -> Vec<u32> {
        self.thread_calls.lock().unwrap().clone()
    }
}

impl ReviewSource for FakeSource {
    async fn list_pull_requests(
        &self,
        _repo: &RepoRef,
        _criteria: &SearchCriteria,
        skip: u32,
        top: u32,
    ) -> Result<Vec<PullRequest>, ServiceError> {
        let call_number = {
            let mut calls = self.calls.lock().unwrap();
            calls.push((skip, top));
            calls.len()
        };

        if let Some((n, token)) = &self.cancel_on_call
            && *n == call_number
        {
            token.cancel();
        }

        if self.hang {
            std::future::pending::<()>().await;
        }

        if self.fail_at_skip == Some(skip) {
            return Err(ServiceError::Api {
                status: 500,
                endpoint: "/Project/_apis/git/repositories/repo/pullrequests".into(),
                message: "internal error".into(),
            });
        }

        Ok(self
            .pull_requests
            .iter()
            .skip(skip as usize)
            .take(top as usize)
            .cloned()
            .collect())
    }

    async fn list_threads(
        &self,
        _repo: &RepoRef,
        pull_request_id: u32,
    ) -> Result<Vec<ReviewThread>, ServiceError> {
        self.thread_calls.lock().unwrap().push(pull_request_id);
        if self.fail_threads {
            return Err(ServiceError::Unauthorized {
                status: 401,
                endpoint: "threads".into(),
            });
        }
        Ok(self
            .threads
            .get(&pull_request_id)
            .cloned()
            .unwrap_or_default())
    }
}
