//! Data layer: core types, loading, normalization, and filtering.
//!
//! Architecture:
//! ```text
//!  .parquet / .json / .csv
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  loader   │  parse file → GeochemDataset
//!   └──────────┘
//!        │
//!        ▼
//!   ┌───────────────┐
//!   │ GeochemDataset │  Vec<Sample>, column indices
//!   └───────────────┘
//!        │                      ┌───────────┐
//!        ▼                      │ reference  │  BSE normalizing values
//!   ┌──────────┐   divides by  └───────────┘
//!   │   norm    │ ◀──────────────────┘
//!   └──────────┘  resolve columns → NormalizedTable
//!        │
//!        ▼
//!   ┌──────────┐
//!   │  filter   │  apply metadata predicates → filtered indices
//!   └──────────┘
//! ```

pub mod filter;
pub mod loader;
pub mod model;
pub mod norm;
pub mod reference;
