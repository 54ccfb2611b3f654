//! Declarative record-and-replay UI test runner.
//!
//! Test cases are named, ordered lists of steps (visit, click, input,
//! assert, select_dropdown). A run opens a fresh isolated browser session
//! per iteration, resolves `{{field}}` placeholders from an optional dataset
//! row, executes the steps in order and collects one record per step into a
//! [`RunLog`](run::run_model::RunLog).

pub mod browser;
pub mod case;
pub mod cli;
pub mod data;
pub mod error;
pub mod report;
pub mod run;
pub mod trace;

pub use error::{ReplayError, Result};
