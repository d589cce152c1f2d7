use std::collections::BTreeMap;
use std::io::Read;
use std::path::Path;

use anyhow::{Context, Result, bail};
use once_cell::sync::Lazy;

use super::norm::camel;

/// Built-in Bulk Silicate Earth (primitive mantle) composition of
/// McDonough & Sun (1995, Chem. Geol.), embedded at compile time.
const BSE_CSV: &str = include_str!("../../include/bse.csv");

static BSE: Lazy<ReferenceTable> = Lazy::new(|| {
    ReferenceTable::from_csv_reader(BSE_CSV.as_bytes())
        .expect("built-in include/bse.csv is malformed")
});

/// The built-in BSE reference table, parsed once per process.
///
/// The table is immutable for the process lifetime; a malformed built-in file
/// is a fatal initialization error on first access, never a per-call error.
pub fn bse() -> &'static ReferenceTable {
    &BSE
}

// ---------------------------------------------------------------------------
// ReferenceTable – normalizing values, keyed by canonical abbreviation
// ---------------------------------------------------------------------------

/// Normalizing values: canonical element abbreviation → concentration (ppm).
///
/// Any delimited table with an `Element` key column and at least one numeric
/// column satisfies the shape contract; the first value column per row is
/// taken as the reference concentration.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ReferenceTable {
    values: BTreeMap<String, f64>,
    /// Element keys in source row order.
    order: Vec<String>,
}

impl ReferenceTable {
    /// Parse a reference table from CSV text.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self> {
        let mut csv_reader = csv::Reader::from_reader(reader);
        let headers: Vec<String> = csv_reader
            .headers()
            .context("reading reference table headers")?
            .iter()
            .map(|h| h.to_string())
            .collect();

        let element_idx = headers
            .iter()
            .position(|h| h == "Element")
            .context("reference table missing 'Element' column")?;
        let value_idx = (0..headers.len())
            .find(|&i| i != element_idx)
            .context("reference table has no value column")?;

        let mut table = ReferenceTable::default();
        for (row_no, result) in csv_reader.records().enumerate() {
            let record = result.with_context(|| format!("reference table row {row_no}"))?;
            let element = record
                .get(element_idx)
                .unwrap_or("")
                .trim();
            if element.is_empty() {
                bail!("reference table row {row_no}: empty element key");
            }
            let raw = record.get(value_idx).unwrap_or("").trim();
            let value: f64 = raw
                .parse()
                .with_context(|| format!("reference table row {row_no}: '{raw}' is not a number"))?;
            table.insert(camel(element), value);
        }

        if table.is_empty() {
            bail!("reference table contains no rows");
        }
        Ok(table)
    }

    /// Parse a reference table from a CSV file on disk.
    pub fn from_csv_path(path: &Path) -> Result<Self> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("opening reference table {}", path.display()))?;
        Self::from_csv_reader(file)
    }

    /// Build a table from (abbreviation, value) pairs; keys are canonicalized.
    pub fn from_pairs<I, S>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: AsRef<str>,
    {
        let mut table = ReferenceTable::default();
        for (el, value) in pairs {
            table.insert(camel(el.as_ref()), value);
        }
        table
    }

    fn insert(&mut self, canonical: String, value: f64) {
        if !self.values.contains_key(&canonical) {
            self.order.push(canonical.clone());
        }
        self.values.insert(canonical, value);
    }

    /// Whether a canonical abbreviation is a key of this table.
    pub fn contains(&self, canonical: &str) -> bool {
        self.values.contains_key(canonical)
    }

    /// Reference concentration for a canonical abbreviation.
    pub fn value(&self, canonical: &str) -> Option<f64> {
        self.values.get(canonical).copied()
    }

    /// Element keys in source row order.
    pub fn elements(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
