pub mod catalog;
pub mod fetch;

pub use catalog::{Section, Submission, SubmissionKey};
pub use fetch::{FetchResult, PersistOutcome};
