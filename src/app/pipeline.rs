use std::fs::OpenOptions;
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use std::pin::pin;

use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::azure::models::{PullRequest, PullRequestStatus, RepoRef, SearchCriteria};
use crate::azure::pager::PullRequestPager;
use crate::azure::source::ReviewSource;
use crate::error::FetchError;
use crate::report::activity::{PullRequestActivity, reconstruct_timeline};
use crate::report::render::{ReportContext, render_report};
use crate::util::config::AppConfig;
use crate::util::time::ReportWindow;

/// Everything a report run needs, resolved from config and CLI flags.
#[derive(Debug, Clone)]
pub struct RunSettings {
    pub org_url: String,
    pub repo: RepoRef,
    pub lookback_days: u32,
    pub page_size: u32,
    pub output_dir: PathBuf,
}

impl RunSettings {
    pub fn from_config(config: &AppConfig) -> Result<Self> {
        config.validate()?;
        let azure = &config.azure;
        Ok(Self {
            org_url: azure.org_url.clone().context("Missing org_url")?,
            repo: RepoRef::new(
                azure.project.clone().context("Missing project")?,
                azure.repository.clone().context("Missing repository")?,
            ),
            lookback_days: config.report.lookback_days,
            page_size: config.report.page_size,
            output_dir: config.output_dir(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    /// No pull request carried a vote from the identity; no file was written.
    NothingToReport,
    Saved(PathBuf),
}

pub fn search_criteria(identity_id: &str, window: &ReportWindow) -> SearchCriteria {
    SearchCriteria {
        status: PullRequestStatus::All,
        reviewer_id: identity_id.to_string(),
        min_time: window.start,
        max_time: window.end,
    }
}

/// Page through every pull request matching `criteria` and keep those
/// `identity_id` cast a vote on.
pub async fn collect_participated<S: ReviewSource>(
    source: &S,
    repo: &RepoRef,
    criteria: &SearchCriteria,
    page_size: u32,
    identity_id: &str,
    cancel: &CancellationToken,
) -> Result<Vec<PullRequest>, FetchError> {
    let pager = PullRequestPager::new(source, repo, criteria, page_size, cancel.clone());
    let mut batches = pin!(pager.into_stream());

    let mut participated = Vec::new();
    let mut seen = 0usize;
    while let Some(batch) = batches.try_next().await? {
        seen += batch.len();
        participated.extend(batch.into_iter().filter(|pr| pr.voted_on_by(identity_id)));
    }

    info!(
        seen,
        participated = participated.len(),
        "Collected pull requests"
    );
    Ok(participated)
}

/// Fetch threads for each pull request in turn and rebuild its timeline.
pub async fn gather_activity<S: ReviewSource>(
    source: &S,
    repo: &RepoRef,
    pull_requests: Vec<PullRequest>,
    identity_id: &str,
    cancel: &CancellationToken,
) -> Result<Vec<PullRequestActivity>, FetchError> {
    let mut activities = Vec::with_capacity(pull_requests.len());

    for pull_request in pull_requests {
        if cancel.is_cancelled() {
            return Err(FetchError::Cancelled);
        }

        let threads = tokio::select! {
            biased;
            _ = cancel.cancelled() => return Err(FetchError::Cancelled),
            result = source.list_threads(repo, pull_request.id) => result?,
        };

        let timeline = reconstruct_timeline(&pull_request, &threads, identity_id);
        debug!(
            pull_request = pull_request.id,
            threads = threads.len(),
            entries = timeline.len(),
            "Reconstructed timeline"
        );
        activities.push(PullRequestActivity {
            pull_request,
            timeline,
        });
    }

    Ok(activities)
}

/// `reviews_<7 hex chars>.md`
pub fn report_file_name() -> String {
    let id = Uuid::new_v4().simple().to_string();
    format!("reviews_{}.md", &id[..7])
}

/// Render the report into a new file under `dir`. A file left half-written
/// by a render failure is removed.
pub fn write_report(
    dir: &Path,
    ctx: &ReportContext,
    activities: &[PullRequestActivity],
) -> Result<PathBuf> {
    std::fs::create_dir_all(dir)
        .with_context(|| format!("Failed to create output directory: {}", dir.display()))?;

    let path = dir.join(report_file_name());
    let file = OpenOptions::new()
        .write(true)
        .create_new(true)
        .open(&path)
        .with_context(|| format!("Failed to create report file: {}", path.display()))?;

    let mut writer = BufWriter::new(file);
    let written = render_report(&mut writer, ctx, activities).and_then(|()| writer.flush());
    drop(writer);

    if let Err(e) = written {
        if let Err(remove_err) = std::fs::remove_file(&path) {
            warn!(path = %path.display(), error = %remove_err, "Failed to remove partial report");
        }
        return Err(e).with_context(|| format!("Failed to write report: {}", path.display()));
    }

    let path = std::path::absolute(&path).unwrap_or(path);
    info!(path = %path.display(), "Report written");
    Ok(path)
}

/// One report run for `identity_id`, covering the window that ends at `now`.
///
/// All service data is gathered before the output file is created, so a
/// cancellation or service error leaves no file behind.
pub async fn run<S: ReviewSource>(
    source: &S,
    settings: &RunSettings,
    identity_id: &str,
    now: DateTime<Utc>,
    cancel: &CancellationToken,
) -> Result<RunOutcome> {
    let window = ReportWindow::ending_at(now, settings.lookback_days).with_context(|| {
        format!(
            "A lookback of {} days is out of range",
            settings.lookback_days
        )
    })?;
    let criteria = search_criteria(identity_id, &window);
    info!(window = %window.describe(), "Searching pull requests");

    let participated = collect_participated(
        source,
        &settings.repo,
        &criteria,
        settings.page_size,
        identity_id,
        cancel,
    )
    .await?;

    if participated.is_empty() {
        return Ok(RunOutcome::NothingToReport);
    }

    let activities =
        gather_activity(source, &settings.repo, participated, identity_id, cancel).await?;

    if cancel.is_cancelled() {
        return Err(FetchError::Cancelled.into());
    }

    let ctx = ReportContext {
        org_url: settings.org_url.clone(),
        repo: settings.repo.clone(),
        window,
    };
    let path = write_report(&settings.output_dir, &ctx, &activities)?;
    Ok(RunOutcome::Saved(path))
}
