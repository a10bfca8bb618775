use std::io::{self, Write};

use super::activity::{PullRequestActivity, TimelineEntry};
use crate::azure::models::RepoRef;
use crate::util::time::{ReportWindow, short_date};

/// Where the report's pull request links point.
#[derive(Debug, Clone)]
pub struct ReportContext {
    pub org_url: String,
    pub repo: RepoRef,
    pub window: ReportWindow,
}

/// Write the Markdown report. Pull requests are ordered newest first by
/// creation date and each timeline newest first; ties keep input order.
pub fn render_report<W: Write>(
    out: &mut W,
    ctx: &ReportContext,
    activities: &[PullRequestActivity],
) -> io::Result<()> {
    writeln!(out, "## Pull requests ({})", ctx.window.describe())?;

    let mut ordered: Vec<&PullRequestActivity> = activities.iter().collect();
    ordered.sort_by(|a, b| {
        b.pull_request
            .creation_date
            .cmp(&a.pull_request.creation_date)
    });

    for activity in ordered {
        let pr = &activity.pull_request;
        writeln!(
            out,
            "1. [{} by {}]({})",
            pr.title,
            pr.author(),
            ctx.repo.pull_request_url(&ctx.org_url, pr.id)
        )?;

        let mut entries: Vec<&TimelineEntry> = activity.timeline.iter().collect();
        entries.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        for entry in entries {
            writeln!(out, "   * {}", render_entry(entry))?;
        }
    }

    Ok(())
}

/// `<label> on <MM/DD/YYYY>`
pub fn render_entry(entry: &TimelineEntry) -> String {
    format!("{} on {}", entry.label, short_date(&entry.timestamp))
}
