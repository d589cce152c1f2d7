use std::fmt;

use thiserror::Error;

use super::model::GeochemDataset;
use super::reference::{ReferenceTable, bse};

// ---------------------------------------------------------------------------
// Element presets
// ---------------------------------------------------------------------------

/// The 15 lanthanides, sorted by increasing Z number.
pub const REE: [&str; 15] = [
    "La", "Ce", "Pr", "Pm", "Nd", "Sm", "Eu", "Gd", "Tb", "Dy", "Ho", "Er", "Tm", "Yb", "Lu",
];

/// Extended trace-element set, modified after Hofmann (1997, Nature).
pub const EXTENDED: [&str; 25] = [
    "Cs", "Rb", "Ba", "Th", "Nb", "U", "La", "Ce", "Pb", "Nd", "Sr", "Sm", "Zr", "Hf", "Eu",
    "Gd", "Tb", "Dy", "Er", "Y", "Yb", "Lu", "Sc", "Cr", "Ni",
];

/// A named element list.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Preset {
    Ree,
    Extended,
}

impl Preset {
    /// The preset's fixed element list, in plotting order.
    pub fn elements(&self) -> &'static [&'static str] {
        match self {
            Preset::Ree => &REE,
            Preset::Extended => &EXTENDED,
        }
    }
}

impl fmt::Display for Preset {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Preset::Ree => write!(f, "REE"),
            Preset::Extended => write!(f, "Extended"),
        }
    }
}

// ---------------------------------------------------------------------------
// Column selection spec
// ---------------------------------------------------------------------------

/// Which columns to normalize: a named preset or an explicit ordered list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ColumnSpec {
    Preset(Preset),
    Explicit(Vec<String>),
}

impl ColumnSpec {
    /// Interpret a selection string: `"ree"` and `"extended"` map to their
    /// presets (case-insensitive), anything else is a one-element list.
    pub fn parse(spec: &str) -> Self {
        if spec.eq_ignore_ascii_case("ree") {
            ColumnSpec::Preset(Preset::Ree)
        } else if spec.eq_ignore_ascii_case("extended") {
            ColumnSpec::Preset(Preset::Extended)
        } else {
            ColumnSpec::Explicit(vec![spec.to_string()])
        }
    }

    /// Parse a comma- or whitespace-separated list of abbreviations.
    pub fn parse_list(spec: &str) -> Self {
        let entries: Vec<String> = spec
            .split(|c: char| c == ',' || c.is_whitespace())
            .filter(|s| !s.is_empty())
            .map(|s| s.to_string())
            .collect();
        ColumnSpec::Explicit(entries)
    }

    /// The requested abbreviations, in request order.
    pub fn requested(&self) -> Vec<&str> {
        match self {
            ColumnSpec::Preset(p) => p.elements().to_vec(),
            ColumnSpec::Explicit(list) => list.iter().map(String::as_str).collect(),
        }
    }
}

impl Default for ColumnSpec {
    fn default() -> Self {
        ColumnSpec::Preset(Preset::Ree)
    }
}

// ---------------------------------------------------------------------------
// Errors
// ---------------------------------------------------------------------------

/// Failures of the normalization entry point. Normalization is all-or-nothing
/// per call; no partial table is ever returned.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum NormError {
    /// The selection spec resolved to zero usable columns.
    #[error("no requested columns are present in both the dataset and the normalizing values")]
    NoMatchingColumns,
    /// A documented-but-unimplemented option was requested.
    #[error("unsupported option: {0}")]
    UnsupportedOption(&'static str),
}

// ---------------------------------------------------------------------------
// Canonicalization
// ---------------------------------------------------------------------------

/// Force an elemental abbreviation to canonical case: first letter upper,
/// remainder lower (`"LA"` → `"La"`, `"nd"` → `"Nd"`).
///
/// Only meaningful for single-element abbreviations; compound formulae such
/// as oxide species will not come out as expected.
pub fn camel(el: &str) -> String {
    let mut chars = el.chars();
    match chars.next() {
        Some(first) => {
            first.to_uppercase().collect::<String>() + &chars.as_str().to_lowercase()
        }
        None => String::new(),
    }
}

// ---------------------------------------------------------------------------
// Column resolution
// ---------------------------------------------------------------------------

/// Resolve a selection spec against the normalizing values and the columns
/// actually present in the observation table.
///
/// A candidate survives iff its canonical form is a reference key and it
/// appears literally among `available`. Survivors keep the spec's order; zero
/// survivors is a failure, not an empty list.
pub fn resolve_columns(
    spec: &ColumnSpec,
    reference: &ReferenceTable,
    available: &[String],
) -> Result<Vec<String>, NormError> {
    let resolved: Vec<String> = spec
        .requested()
        .into_iter()
        .filter(|el| reference.contains(&camel(el)) && available.iter().any(|a| a == el))
        .map(|el| el.to_string())
        .collect();

    if resolved.is_empty() {
        return Err(NormError::NoMatchingColumns);
    }
    Ok(resolved)
}

// ---------------------------------------------------------------------------
// Normalization
// ---------------------------------------------------------------------------

/// Options recognized by [`pm_norm`].
#[derive(Debug, Clone, PartialEq)]
pub struct NormOptions {
    /// Columns to normalize. Defaults to the REE preset.
    pub cols: ColumnSpec,
    /// Restrict the output to the resolved intersection. Only `true` is
    /// implemented; `false` is rejected with [`NormError::UnsupportedOption`].
    pub squeeze: bool,
    /// Fill missing columns by linear interpolation. Unimplemented (would
    /// require `squeeze = false`); rejected when requested.
    pub interp: bool,
    /// Normalizing values; `None` means the built-in BSE composition.
    pub norm_vals: Option<ReferenceTable>,
}

impl Default for NormOptions {
    fn default() -> Self {
        NormOptions {
            cols: ColumnSpec::default(),
            squeeze: true,
            interp: false,
            norm_vals: None,
        }
    }
}

/// A normalized table: rows parallel to the input samples, columns renamed to
/// canonical form, each value divided by its reference concentration.
#[derive(Debug, Clone, PartialEq)]
pub struct NormalizedTable {
    /// Canonical column names, in the order given by the selection spec.
    pub columns: Vec<String>,
    /// One row per input sample, index-aligned with the source dataset.
    pub rows: Vec<Vec<f64>>,
}

impl NormalizedTable {
    /// Number of rows.
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// Whether the table has no rows.
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Position of a canonical column name, if present.
    pub fn column_index(&self, canonical: &str) -> Option<usize> {
        self.columns.iter().position(|c| c == canonical)
    }
}

/// Normalize geochemical concentrations to a reference composition
/// (by default the primitive mantle of McDonough & Sun, 1995).
///
/// Resolves `options.cols` against the normalizing values and the dataset's
/// concentration columns, then divides every row element-wise by the
/// reference concentrations. Row order and index alignment are preserved; a
/// sample that lacks a resolved column gets NaN in that cell rather than
/// dropping the row.
pub fn pm_norm(
    dataset: &GeochemDataset,
    options: &NormOptions,
) -> Result<NormalizedTable, NormError> {
    if !options.squeeze {
        return Err(NormError::UnsupportedOption("squeeze = false"));
    }
    if options.interp {
        return Err(NormError::UnsupportedOption("interp = true"));
    }

    let reference = options.norm_vals.as_ref().unwrap_or_else(|| bse());
    let resolved = resolve_columns(&options.cols, reference, &dataset.element_columns)?;

    // Present by construction: resolve_columns admits only reference keys.
    let normers: Vec<f64> = resolved
        .iter()
        .map(|col| {
            reference
                .value(&camel(col))
                .expect("resolved column missing from reference table")
        })
        .collect();

    let rows: Vec<Vec<f64>> = dataset
        .samples
        .iter()
        .map(|sample| {
            resolved
                .iter()
                .zip(&normers)
                .map(|(col, norm)| sample.concentration(col) / norm)
                .collect()
        })
        .collect();

    Ok(NormalizedTable {
        columns: resolved.iter().map(|col| camel(col)).collect(),
        rows,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Sample;

    fn dataset(rows: &[&[(&str, f64)]], columns: &[&str]) -> GeochemDataset {
        let samples = rows
            .iter()
            .map(|row| Sample {
                values: row.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
                metadata: Default::default(),
            })
            .collect();
        GeochemDataset::from_samples(samples, columns.iter().map(|c| c.to_string()).collect())
    }

    fn la_ce_reference() -> ReferenceTable {
        ReferenceTable::from_pairs([("La", 0.2), ("Ce", 0.6)])
    }

    #[test]
    fn camel_forces_canonical_case() {
        assert_eq!(camel("LA"), "La");
        assert_eq!(camel("nd"), "Nd");
        assert_eq!(camel("Yb"), "Yb");
        assert_eq!(camel(""), "");
    }

    #[test]
    fn camel_is_idempotent() {
        for el in ["LA", "nd", "sR", "Ce", "u"] {
            assert_eq!(camel(&camel(el)), camel(el));
        }
    }

    #[test]
    fn explicit_columns_normalize_elementwise() {
        // Scenario A: ratios against a two-element reference.
        let ds = dataset(&[&[("La", 2.0), ("Ce", 3.0), ("Sr", 10.0)]], &["La", "Ce", "Sr"]);
        let options = NormOptions {
            cols: ColumnSpec::Explicit(vec!["La".into(), "Ce".into()]),
            norm_vals: Some(la_ce_reference()),
            ..Default::default()
        };
        let table = pm_norm(&ds, &options).unwrap();
        assert_eq!(table.columns, vec!["La", "Ce"]);
        assert_eq!(table.rows, vec![vec![10.0, 5.0]]);
    }

    #[test]
    fn preset_drops_columns_missing_from_input_or_reference() {
        // Scenario B: REE preset, but the input only carries La and Sr.
        let ds = dataset(&[&[("La", 1.0), ("Sr", 100.0)]], &["La", "Sr"]);
        let options = NormOptions {
            cols: ColumnSpec::Preset(Preset::Ree),
            norm_vals: Some(la_ce_reference()),
            ..Default::default()
        };
        let table = pm_norm(&ds, &options).unwrap();
        assert_eq!(table.columns, vec!["La"]);
        assert_eq!(table.rows, vec![vec![5.0]]);
    }

    #[test]
    fn unknown_column_fails_with_no_matching_columns() {
        // Scenario C.
        let ds = dataset(&[&[("La", 1.0)]], &["La"]);
        let options = NormOptions {
            cols: ColumnSpec::Explicit(vec!["Xx".into()]),
            norm_vals: Some(la_ce_reference()),
            ..Default::default()
        };
        assert_eq!(pm_norm(&ds, &options), Err(NormError::NoMatchingColumns));
    }

    #[test]
    fn extended_preset_keeps_survivors_in_preset_order() {
        // Scenario E: three of the 25 extended elements are present.
        let ds = dataset(
            &[&[("Ni", 200.0), ("Ba", 300.0), ("La", 5.0)]],
            &["Ni", "Ba", "La"],
        );
        let options = NormOptions {
            cols: ColumnSpec::Preset(Preset::Extended),
            ..Default::default()
        };
        let table = pm_norm(&ds, &options).unwrap();
        // Fixed extended order, not input order.
        assert_eq!(table.columns, vec!["Ba", "La", "Ni"]);
    }

    #[test]
    fn explicit_order_is_request_order() {
        let ds = dataset(&[&[("La", 2.0), ("Ce", 3.0)]], &["La", "Ce"]);
        let options = NormOptions {
            cols: ColumnSpec::Explicit(vec!["Ce".into(), "La".into()]),
            norm_vals: Some(la_ce_reference()),
            ..Default::default()
        };
        let table = pm_norm(&ds, &options).unwrap();
        assert_eq!(table.columns, vec!["Ce", "La"]);
        assert_eq!(table.rows, vec![vec![5.0, 10.0]]);
    }

    #[test]
    fn resolution_matches_literal_headers_but_renames_canonically() {
        // Lowercase header survives (case-insensitive against the reference,
        // literal against the dataset) and is renamed on output.
        let ds = dataset(&[&[("la", 2.0)]], &["la"]);
        let options = NormOptions {
            cols: ColumnSpec::Explicit(vec!["la".into()]),
            norm_vals: Some(la_ce_reference()),
            ..Default::default()
        };
        let table = pm_norm(&ds, &options).unwrap();
        assert_eq!(table.columns, vec!["La"]);
        assert_eq!(table.rows, vec![vec![10.0]]);
    }

    #[test]
    fn round_trip_recovers_input_subset() {
        let ds = dataset(
            &[
                &[("La", 2.0), ("Ce", 3.0)],
                &[("La", 0.5), ("Ce", 7.25)],
            ],
            &["La", "Ce"],
        );
        let reference = la_ce_reference();
        let options = NormOptions {
            cols: ColumnSpec::Explicit(vec!["La".into(), "Ce".into()]),
            norm_vals: Some(reference.clone()),
            ..Default::default()
        };
        let table = pm_norm(&ds, &options).unwrap();

        for (row, sample) in table.rows.iter().zip(&ds.samples) {
            for (value, col) in row.iter().zip(&table.columns) {
                let recovered = value * reference.value(col).unwrap();
                assert!((recovered - sample.concentration(col)).abs() < 1e-12);
            }
        }
    }

    #[test]
    fn rows_stay_aligned_and_missing_cells_are_nan() {
        let ds = dataset(
            &[&[("La", 2.0), ("Ce", 3.0)], &[("Ce", 1.2)]],
            &["La", "Ce"],
        );
        let options = NormOptions {
            cols: ColumnSpec::Explicit(vec!["La".into(), "Ce".into()]),
            norm_vals: Some(la_ce_reference()),
            ..Default::default()
        };
        let table = pm_norm(&ds, &options).unwrap();
        assert_eq!(table.len(), 2);
        assert!(table.rows[1][0].is_nan());
        assert_eq!(table.rows[1][1], 2.0);
    }

    #[test]
    fn unimplemented_options_are_rejected() {
        let ds = dataset(&[&[("La", 2.0)]], &["La"]);
        let no_squeeze = NormOptions {
            squeeze: false,
            ..Default::default()
        };
        assert_eq!(
            pm_norm(&ds, &no_squeeze),
            Err(NormError::UnsupportedOption("squeeze = false"))
        );
        let interp = NormOptions {
            interp: true,
            ..Default::default()
        };
        assert_eq!(
            pm_norm(&ds, &interp),
            Err(NormError::UnsupportedOption("interp = true"))
        );
    }

    #[test]
    fn spec_parsing_is_case_insensitive_for_presets() {
        assert_eq!(ColumnSpec::parse("REE"), ColumnSpec::Preset(Preset::Ree));
        assert_eq!(ColumnSpec::parse("ree"), ColumnSpec::Preset(Preset::Ree));
        assert_eq!(
            ColumnSpec::parse("Extended"),
            ColumnSpec::Preset(Preset::Extended)
        );
        assert_eq!(
            ColumnSpec::parse("Sr"),
            ColumnSpec::Explicit(vec!["Sr".to_string()])
        );
    }

    #[test]
    fn parse_list_splits_on_commas_and_whitespace() {
        assert_eq!(
            ColumnSpec::parse_list("La, Ce  Nd,Yb"),
            ColumnSpec::Explicit(vec![
                "La".to_string(),
                "Ce".to_string(),
                "Nd".to_string(),
                "Yb".to_string(),
            ])
        );
    }

    #[test]
    fn single_abbreviation_not_in_reference_fails() {
        // "Sr" parses to a one-element list; the reference lacks Sr, so
        // resolution fails outright even though the dataset has the column.
        let ds = dataset(&[&[("Sr", 100.0)]], &["Sr"]);
        let options = NormOptions {
            cols: ColumnSpec::parse("Sr"),
            norm_vals: Some(la_ce_reference()),
            ..Default::default()
        };
        assert_eq!(pm_norm(&ds, &options), Err(NormError::NoMatchingColumns));
    }

    #[test]
    fn default_preset_against_builtin_bse() {
        let ds = dataset(&[&[("La", 6.48), ("Ce", 16.75)]], &["La", "Ce"]);
        let table = pm_norm(&ds, &NormOptions::default()).unwrap();
        assert_eq!(table.columns, vec!["La", "Ce"]);
        assert!((table.rows[0][0] - 10.0).abs() < 1e-9);
        assert!((table.rows[0][1] - 10.0).abs() < 1e-9);
    }
}
