pub mod runner;

pub use runner::{prepare_directories, Pipeline, RunSummary};
