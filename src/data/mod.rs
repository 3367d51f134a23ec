/// Data layer: core types, loading, and class/feature selection.
///
/// Architecture:
/// ```text
///  .csv / .json / .parquet
///        │
///        ▼
///   ┌──────────┐
///   │  loader  │  parse file → DataTable
///   └──────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ DataTable │  ordered Columns of raw cells + attributes
///   └───────────┘
///        │
///        ▼
///   ┌───────────┐
///   │ condition │  class label → feature columns used to train it
///   └───────────┘
/// ```

pub mod condition;
pub mod loader;
pub mod model;
