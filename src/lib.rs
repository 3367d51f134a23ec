//! Column statistics and one-vs-all logistic regression for tabular data.
//!
//! The crate is split the way data flows through it: [`data`] loads a table of
//! raw cells, [`stats`] derives per-column attributes, [`training`] builds the
//! feature matrix and fits the classifier, and [`pipeline`] ties those together
//! for the command line.

pub mod data;
pub mod error;
pub mod pipeline;
pub mod stats;
pub mod training;

pub use error::{MlError, Result};
