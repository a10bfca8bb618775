use std::collections::HashMap;

use chrono::{DateTime, Datelike, NaiveDateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;

/// Reviewer vote value meaning "no vote cast".
pub const NO_VOTE: i32 = 0;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct IdentityRef {
    pub id: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub unique_name: Option<String>,
}

/// The identity the access token authenticates as.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AuthenticatedIdentity {
    pub id: String,
    #[serde(rename = "providerDisplayName", default)]
    pub display_name: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub(crate) struct ConnectionData {
    pub authenticated_user: AuthenticatedIdentity,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProjectInfo {
    pub id: String,
    pub name: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoryInfo {
    pub id: String,
    pub name: String,
}

/// Envelope for list endpoints: `{"value": [...], "count": n}`.
#[derive(Debug, Deserialize)]
pub(crate) struct ListResponse<T> {
    pub value: Vec<T>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Reviewer {
    pub id: String,
    #[serde(default)]
    pub display_name: String,
    #[serde(default)]
    pub vote: i32,
}

impl Reviewer {
    pub fn has_voted(&self) -> bool {
        self.vote != NO_VOTE
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PullRequest {
    #[serde(rename = "pullRequestId")]
    pub id: u32,
    pub title: String,
    pub created_by: IdentityRef,
    pub creation_date: DateTime<Utc>,
    /// `None` while the pull request is open.
    #[serde(default, deserialize_with = "deserialize_closed_date")]
    pub closed_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub status: Option<String>,
    #[serde(default)]
    pub reviewers: Vec<Reviewer>,
}

impl PullRequest {
    pub fn author(&self) -> &str {
        &self.created_by.display_name
    }

    /// True when `identity_id` is a reviewer who cast a non-zero vote.
    pub fn voted_on_by(&self, identity_id: &str) -> bool {
        self.reviewers
            .iter()
            .any(|r| r.id.eq_ignore_ascii_case(identity_id) && r.has_voted())
    }
}

/// The service reports open pull requests with a `0001-01-01T00:00:00`
/// closed date, sometimes without an offset.
fn deserialize_closed_date<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw: Option<String> = Option::deserialize(deserializer)?;
    let Some(raw) = raw else {
        return Ok(None);
    };

    let parsed = match raw.parse::<DateTime<Utc>>() {
        Ok(dt) => dt,
        Err(_) => NaiveDateTime::parse_from_str(&raw, "%Y-%m-%dT%H:%M:%S%.f")
            .map_err(<D::Error as serde::de::Error>::custom)?
            .and_utc(),
    };

    if parsed.year() <= 1 {
        return Ok(None);
    }
    Ok(Some(parsed))
}

/// A thread property. The REST API wraps values as
/// `{"$type": "System.String", "$value": "..."}`; bare values are accepted too.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum PropertyValue {
    Typed {
        #[serde(rename = "$type", default)]
        kind: Option<String>,
        #[serde(rename = "$value")]
        value: Value,
    },
    Plain(Value),
}

impl PropertyValue {
    pub fn text(value: &str) -> Self {
        PropertyValue::Typed {
            kind: Some("System.String".to_string()),
            value: Value::String(value.to_string()),
        }
    }

    fn raw(&self) -> &Value {
        match self {
            PropertyValue::Typed { value, .. } => value,
            PropertyValue::Plain(value) => value,
        }
    }

    /// String or numeric content; other JSON shapes yield `None`.
    pub fn to_text(&self) -> Option<String> {
        match self.raw() {
            Value::String(s) => Some(s.clone()),
            Value::Number(n) => Some(n.to_string()),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Comment {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub content: Option<String>,
    pub published_date: DateTime<Utc>,
    #[serde(default)]
    pub author: Option<IdentityRef>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReviewThread {
    #[serde(default)]
    pub id: u64,
    #[serde(default)]
    pub last_updated_date: Option<DateTime<Utc>>,
    #[serde(default)]
    pub properties: Option<HashMap<String, PropertyValue>>,
    #[serde(default)]
    pub identities: Option<HashMap<String, IdentityRef>>,
    #[serde(default)]
    pub comments: Vec<Comment>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum PullRequestStatus {
    Active,
    Abandoned,
    Completed,
    All,
}

impl PullRequestStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            PullRequestStatus::Active => "active",
            PullRequestStatus::Abandoned => "abandoned",
            PullRequestStatus::Completed => "completed",
            PullRequestStatus::All => "all",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchCriteria {
    pub status: PullRequestStatus,
    pub reviewer_id: String,
    pub min_time: DateTime<Utc>,
    pub max_time: DateTime<Utc>,
}

impl SearchCriteria {
    pub fn query_pairs(&self) -> Vec<(&'static str, String)> {
        vec![
            ("searchCriteria.status", self.status.as_str().to_string()),
            ("searchCriteria.reviewerId", self.reviewer_id.clone()),
            ("searchCriteria.queryTimeRangeType", "created".to_string()),
            ("searchCriteria.minTime", self.min_time.to_rfc3339()),
            ("searchCriteria.maxTime", self.max_time.to_rfc3339()),
        ]
    }
}

/// A project/repository pair that pull requests are read from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RepoRef {
    pub project: String,
    pub repository: String,
}

impl RepoRef {
    pub fn new(project: impl Into<String>, repository: impl Into<String>) -> Self {
        Self {
            project: project.into(),
            repository: repository.into(),
        }
    }

    /// Web link to a pull request under `base_url`.
    pub fn pull_request_url(&self, base_url: &str, pull_request_id: u32) -> String {
        format!(
            "{}/{}/_git/{}/pullrequest/{}",
            base_url.trim_end_matches('/'),
            self.project,
            self.repository,
            pull_request_id
        )
    }
}

/// Reviewer vote codes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Vote {
    Approved,
    ApprovedWithSuggestions,
    NoVote,
    WaitingForAuthor,
    Rejected,
    Unknown,
}

impl Vote {
    pub fn from_code(code: &str) -> Self {
        match code.trim() {
            "10" => Vote::Approved,
            "5" => Vote::ApprovedWithSuggestions,
            "0" => Vote::NoVote,
            "-5" => Vote::WaitingForAuthor,
            "-10" => Vote::Rejected,
            _ => Vote::Unknown,
        }
    }

    pub fn label(&self) -> &'static str {
        match self {
            Vote::Approved => "Approved",
            Vote::ApprovedWithSuggestions => "Approved with suggestions",
            Vote::NoVote => "No vote",
            Vote::WaitingForAuthor => "Waiting for author",
            Vote::Rejected => "Rejected",
            Vote::Unknown => "Unknown",
        }
    }
}
