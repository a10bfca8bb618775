pub mod pipeline;

pub use pipeline::{RunOutcome, RunSettings, run};
