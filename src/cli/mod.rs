//! Command-line interface for the callscope binary

pub mod args;

pub use args::Args;
