//! Utilities for petrology and geochemistry: normalize trace-element
//! concentrations to a reference composition (by default the primitive
//! mantle of McDonough & Sun, 1995) and view the ratios as multi-element
//! variation (spider) diagrams.
//!
//! The normalization core lives in [`data::norm`]; the binary in
//! `src/main.rs` wraps it in an egui viewer.

pub mod app;
pub mod color;
pub mod data;
pub mod state;
pub mod ui;

pub use data::norm::{
    ColumnSpec, EXTENDED, NormError, NormOptions, NormalizedTable, Preset, REE, camel,
    pm_norm, resolve_columns,
};
pub use data::reference::{ReferenceTable, bse};
