use std::collections::{BTreeMap, BTreeSet};
use std::fmt;

// ---------------------------------------------------------------------------
// MetadataValue – a single cell in a metadata column
// ---------------------------------------------------------------------------

/// A dynamically-typed metadata value mirroring common tidy-table dtypes.
/// Using `BTreeMap` / `BTreeSet` downstream so `MetadataValue` must be `Ord`.
#[derive(Debug, Clone, PartialEq)]
pub enum MetadataValue {
    String(String),
    Integer(i64),
    Float(f64),
    Bool(bool),
    /// ISO-8601 date string kept as text for simplicity.
    Date(String),
    Null,
}

// -- Manual Eq/Ord so we can put MetadataValue in BTreeSet --

impl Eq for MetadataValue {}

impl PartialOrd for MetadataValue {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}

impl Ord for MetadataValue {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        use MetadataValue::*;
        fn discriminant(v: &MetadataValue) -> u8 {
            match v {
                Null => 0,
                Bool(_) => 1,
                Integer(_) => 2,
                Float(_) => 3,
                String(_) => 4,
                Date(_) => 5,
            }
        }
        let da = discriminant(self);
        let db = discriminant(other);
        if da != db {
            return da.cmp(&db);
        }
        match (self, other) {
            (Null, Null) => std::cmp::Ordering::Equal,
            (Bool(a), Bool(b)) => a.cmp(b),
            (Integer(a), Integer(b)) => a.cmp(b),
            (Float(a), Float(b)) => a.total_cmp(b),
            (String(a), String(b)) | (Date(a), Date(b)) => a.cmp(b),
            _ => std::cmp::Ordering::Equal,
        }
    }
}

impl std::hash::Hash for MetadataValue {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            MetadataValue::String(s) | MetadataValue::Date(s) => s.hash(state),
            MetadataValue::Integer(i) => i.hash(state),
            MetadataValue::Float(f) => f.to_bits().hash(state),
            MetadataValue::Bool(b) => b.hash(state),
            MetadataValue::Null => {}
        }
    }
}

impl fmt::Display for MetadataValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MetadataValue::String(s) => write!(f, "{s}"),
            MetadataValue::Integer(i) => write!(f, "{i}"),
            MetadataValue::Float(v) => write!(f, "{v:.4}"),
            MetadataValue::Bool(b) => write!(f, "{b}"),
            MetadataValue::Date(d) => write!(f, "{d}"),
            MetadataValue::Null => write!(f, "<null>"),
        }
    }
}

// ---------------------------------------------------------------------------
// Sample – one row of the observation table
// ---------------------------------------------------------------------------

/// A single sample (one row of the source table).
///
/// Concentration cells are keyed by the literal column header as it appeared
/// in the file; canonicalization of element abbreviations happens later,
/// during normalization. A missing key means the element was not measured.
#[derive(Debug, Clone, Default)]
pub struct Sample {
    /// Elemental concentrations in ppm: column header → value.
    pub values: BTreeMap<String, f64>,
    /// Dynamic metadata columns: column_name → value.
    pub metadata: BTreeMap<String, MetadataValue>,
}

impl Sample {
    /// Concentration under a literal column header, NaN when not measured.
    pub fn concentration(&self, column: &str) -> f64 {
        self.values.get(column).copied().unwrap_or(f64::NAN)
    }
}

// ---------------------------------------------------------------------------
// GeochemDataset – the complete loaded observation table
// ---------------------------------------------------------------------------

/// The full parsed observation table with pre-computed column indices.
#[derive(Debug, Clone, Default)]
pub struct GeochemDataset {
    /// All samples (rows), in file order.
    pub samples: Vec<Sample>,
    /// Concentration column headers, in file order. Selection specs are
    /// resolved against this list.
    pub element_columns: Vec<String>,
    /// Ordered list of metadata column names.
    pub metadata_columns: Vec<String>,
    /// For each metadata column the sorted set of unique values.
    pub unique_values: BTreeMap<String, BTreeSet<MetadataValue>>,
}

impl GeochemDataset {
    /// Build column indices from the loaded samples.
    ///
    /// `element_order` fixes the concentration column order (loaders pass the
    /// file header order); columns present in samples but absent from it are
    /// appended alphabetically.
    pub fn from_samples(samples: Vec<Sample>, element_order: Vec<String>) -> Self {
        let mut element_columns = element_order;
        let known: BTreeSet<String> = element_columns.iter().cloned().collect();
        let mut extra: BTreeSet<String> = BTreeSet::new();
        let mut metadata_set: BTreeSet<String> = BTreeSet::new();
        let mut unique_values: BTreeMap<String, BTreeSet<MetadataValue>> = BTreeMap::new();

        for sample in &samples {
            for col in sample.values.keys() {
                if !known.contains(col) {
                    extra.insert(col.clone());
                }
            }
            for (col, val) in &sample.metadata {
                metadata_set.insert(col.clone());
                unique_values
                    .entry(col.clone())
                    .or_default()
                    .insert(val.clone());
            }
        }
        element_columns.extend(extra);

        GeochemDataset {
            samples,
            element_columns,
            metadata_columns: metadata_set.into_iter().collect(),
            unique_values,
        }
    }

    /// Number of samples.
    pub fn len(&self) -> usize {
        self.samples.len()
    }

    /// Whether the dataset is empty.
    pub fn is_empty(&self) -> bool {
        self.samples.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample(values: &[(&str, f64)], meta: &[(&str, MetadataValue)]) -> Sample {
        Sample {
            values: values.iter().map(|(k, v)| (k.to_string(), *v)).collect(),
            metadata: meta
                .iter()
                .map(|(k, v)| (k.to_string(), v.clone()))
                .collect(),
        }
    }

    #[test]
    fn from_samples_indexes_columns() {
        let s1 = sample(
            &[("La", 10.0), ("Ce", 24.0)],
            &[("rock_type", MetadataValue::String("basalt".into()))],
        );
        let s2 = sample(
            &[("La", 4.0), ("Sr", 400.0)],
            &[("rock_type", MetadataValue::String("andesite".into()))],
        );
        let ds =
            GeochemDataset::from_samples(vec![s1, s2], vec!["La".to_string(), "Ce".to_string()]);

        // Header order preserved, stray column appended.
        assert_eq!(ds.element_columns, vec!["La", "Ce", "Sr"]);
        assert_eq!(ds.metadata_columns, vec!["rock_type"]);
        assert_eq!(ds.unique_values["rock_type"].len(), 2);
        assert_eq!(ds.len(), 2);
        assert!(!ds.is_empty());
    }

    #[test]
    fn missing_concentration_is_nan() {
        let s = sample(&[("La", 10.0)], &[]);
        assert_eq!(s.concentration("La"), 10.0);
        assert!(s.concentration("Ce").is_nan());
    }

    #[test]
    fn metadata_value_ordering_is_total() {
        let mut set = BTreeSet::new();
        set.insert(MetadataValue::Float(1.5));
        set.insert(MetadataValue::Integer(2));
        set.insert(MetadataValue::String("a".into()));
        set.insert(MetadataValue::Null);
        assert_eq!(set.len(), 4);
    }
}
