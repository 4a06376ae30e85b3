//! Data produced by the finder and its serialization.

pub mod report;
pub mod yaml;

pub use report::{CommitRecord, ContextEntry, IntroductionMatch, Report};
pub use yaml::to_yaml;
