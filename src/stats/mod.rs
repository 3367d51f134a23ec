//! Per-column descriptive statistics and their text rendering.

pub mod attributes;
pub mod describe;
