pub mod app;
pub mod azure;
pub mod error;
pub mod report;
pub mod util;
