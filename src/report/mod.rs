pub mod activity;
pub mod render;

pub use activity::{PullRequestActivity, TimelineEntry, VoteEvent, reconstruct_timeline};
pub use render::{ReportContext, render_report};
