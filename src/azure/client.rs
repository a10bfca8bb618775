use anyhow::{Context, Result, anyhow, bail};
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::debug;

use super::models::*;
use super::source::ReviewSource;
use crate::error::ServiceError;

const API_VERSION: &str = "7.1";

#[derive(Clone)]
pub struct AzureDevOpsClient {
    client: Client,
    org_url: Url,
    token: String,
}

impl AzureDevOpsClient {
    pub fn new(token: &str, org_url: &str) -> Result<Self> {
        if !org_url.starts_with("https://") {
            bail!("Azure DevOps URL must use HTTPS: {}", org_url);
        }
        let parsed = Url::parse(org_url)
            .with_context(|| format!("Invalid Azure DevOps URL: {}", org_url))?;
        if parsed.cannot_be_a_base() {
            bail!("Invalid Azure DevOps URL: {}", org_url);
        }

        let client = Client::builder()
            .user_agent("reviewtrail")
            .build()
            .context("Failed to create HTTP client")?;

        Ok(Self {
            client,
            org_url: parsed,
            token: token.to_string(),
        })
    }

    pub fn org_url(&self) -> &str {
        self.org_url.as_str().trim_end_matches('/')
    }

    fn endpoint(&self, segments: &[&str]) -> Url {
        let mut url = self.org_url.clone();
        if let Ok(mut path) = url.path_segments_mut() {
            path.pop_if_empty().extend(segments);
        }
        url
    }

    async fn get<T: DeserializeOwned>(
        &self,
        segments: &[&str],
        query: &[(&str, String)],
    ) -> Result<T, ServiceError> {
        let url = self.endpoint(segments);
        let endpoint = url.path().to_string();

        let resp = self
            .client
            .get(url)
            .basic_auth("", Some(&self.token))
            .query(query)
            .send()
            .await?;

        let status = resp.status();
        let body = resp.text().await?;
        if let Some(err) = classify_response(status, &body, &endpoint) {
            return Err(err);
        }
        serde_json::from_str(&body).map_err(|source| ServiceError::Decode { endpoint, source })
    }

    fn api_version() -> Vec<(&'static str, String)> {
        vec![("api-version", API_VERSION.to_string())]
    }

    pub async fn fetch_identity(&self) -> Result<AuthenticatedIdentity, ServiceError> {
        let data: ConnectionData = self.get(&["_apis", "connectionData"], &[]).await?;
        debug!(id = %data.authenticated_user.id, "Fetched authenticated identity");
        Ok(data.authenticated_user)
    }

    pub async fn get_project(&self, project: &str) -> Result<ProjectInfo, ServiceError> {
        self.get(&["_apis", "projects", project], &Self::api_version())
            .await
    }

    pub async fn get_repository(&self, repo: &RepoRef) -> Result<RepositoryInfo, ServiceError> {
        self.get(
            &[
                repo.project.as_str(),
                "_apis",
                "git",
                "repositories",
                repo.repository.as_str(),
            ],
            &Self::api_version(),
        )
        .await
    }

    /// Fail early with a readable message if the project or repository is missing.
    pub async fn verify_target(&self, repo: &RepoRef) -> Result<()> {
        self.get_project(&repo.project)
            .await
            .map_err(|e| lookup_error(e, "Project", &repo.project))?;
        self.get_repository(repo)
            .await
            .map_err(|e| lookup_error(e, "Repository", &repo.repository))?;
        Ok(())
    }

    pub async fn list_pull_requests(
        &self,
        repo: &RepoRef,
        criteria: &SearchCriteria,
        skip: u32,
        top: u32,
    ) -> Result<Vec<PullRequest>, ServiceError> {
        let mut query = criteria.query_pairs();
        query.push(("$skip", skip.to_string()));
        query.push(("$top", top.to_string()));
        query.extend(Self::api_version());

        let list: ListResponse<PullRequest> = self
            .get(
                &[
                    repo.project.as_str(),
                    "_apis",
                    "git",
                    "repositories",
                    repo.repository.as_str(),
                    "pullrequests",
                ],
                &query,
            )
            .await?;

        debug!(skip, top, count = list.value.len(), "Fetched pull request batch");
        Ok(list.value)
    }

    pub async fn list_threads(
        &self,
        repo: &RepoRef,
        pull_request_id: u32,
    ) -> Result<Vec<ReviewThread>, ServiceError> {
        let id = pull_request_id.to_string();
        let list: ListResponse<ReviewThread> = self
            .get(
                &[
                    repo.project.as_str(),
                    "_apis",
                    "git",
                    "repositories",
                    repo.repository.as_str(),
                    "pullRequests",
                    id.as_str(),
                    "threads",
                ],
                &Self::api_version(),
            )
            .await?;

        debug!(
            pull_request = pull_request_id,
            count = list.value.len(),
            "Fetched review threads"
        );
        Ok(list.value)
    }
}

/// Map a non-success response to a `ServiceError`; `None` for success.
///
/// An invalid PAT gets a 203 with the HTML sign-in page instead of a 401.
pub fn classify_response(status: StatusCode, body: &str, endpoint: &str) -> Option<ServiceError> {
    let endpoint = endpoint.to_string();
    if status == StatusCode::UNAUTHORIZED
        || status == StatusCode::FORBIDDEN
        || status == StatusCode::NON_AUTHORITATIVE_INFORMATION
    {
        return Some(ServiceError::Unauthorized {
            status: status.as_u16(),
            endpoint,
        });
    }
    if status == StatusCode::NOT_FOUND {
        return Some(ServiceError::NotFound { endpoint });
    }
    if status.is_success() {
        return None;
    }

    let message = serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v.get("message").and_then(|m| m.as_str()).map(String::from))
        .unwrap_or_else(|| body.to_string());
    Some(ServiceError::Api {
        status: status.as_u16(),
        endpoint,
        message,
    })
}

/// `"<kind> <name> not found"` for a 404; any other failure passes through.
pub fn lookup_error(err: ServiceError, kind: &str, name: &str) -> anyhow::Error {
    if err.is_not_found() {
        anyhow!("{} {} not found", kind, name)
    } else {
        err.into()
    }
}

impl ReviewSource for AzureDevOpsClient {
    async fn list_pull_requests(
        &self,
        repo: &RepoRef,
        criteria: &SearchCriteria,
        skip: u32,
        top: u32,
    ) -> Result<Vec<PullRequest>, ServiceError> {
        AzureDevOpsClient::list_pull_requests(self, repo, criteria, skip, top).await
    }

    async fn list_threads(
        &self,
        repo: &RepoRef,
        pull_request_id: u32,
    ) -> Result<Vec<ReviewThread>, ServiceError> {
        AzureDevOpsClient::list_threads(self, repo, pull_request_id).await
    }
}
