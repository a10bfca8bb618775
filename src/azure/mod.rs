pub mod auth;
pub mod client;
pub mod models;
pub mod pager;
pub mod source;

pub use client::AzureDevOpsClient;
pub use models::*;
pub use pager::{Page, PullRequestPager};
pub use source::ReviewSource;
