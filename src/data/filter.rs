use std::collections::{BTreeMap, BTreeSet};

use super::model::{GeochemDataset, MetadataValue};

// ---------------------------------------------------------------------------
// Filter predicate: which unique values are selected per metadata column
// ---------------------------------------------------------------------------

/// Per-column selection state: maps column_name → set of selected values.
/// If a column is absent or its set is empty, it means "no filter" (show all).
pub type FilterState = BTreeMap<String, BTreeSet<MetadataValue>>;

/// Initialise a [`FilterState`] with all values selected (i.e., show everything).
pub fn init_filter_state(dataset: &GeochemDataset) -> FilterState {
    dataset
        .unique_values
        .iter()
        .map(|(col, vals)| (col.clone(), vals.clone()))
        .collect()
}

/// Return indices of samples that pass all active filters.
///
/// A sample passes a column filter when:
/// * The column is not present in `filters` → passes (no constraint)
/// * The filter set for that column is empty → nothing selected → fails
/// * The sample's value for that column is in the selected set → passes
pub fn filtered_indices(dataset: &GeochemDataset, filters: &FilterState) -> Vec<usize> {
    dataset
        .samples
        .iter()
        .enumerate()
        .filter(|(_, sample)| {
            for (col, selected) in filters {
                if selected.is_empty() {
                    // Nothing selected for this column → hide everything
                    return false;
                }
                // Check all unique values are selected → no effective filter
                if let Some(all_vals) = dataset.unique_values.get(col) {
                    if selected.len() == all_vals.len() {
                        continue; // everything selected, no filtering needed
                    }
                }
                match sample.metadata.get(col) {
                    Some(val) => {
                        if !selected.contains(val) {
                            return false;
                        }
                    }
                    None => {
                        // sample doesn't have this column → include only if Null is selected
                        if !selected.contains(&MetadataValue::Null) {
                            return false;
                        }
                    }
                }
            }
            true
        })
        .map(|(i, _)| i)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Sample;

    fn dataset() -> GeochemDataset {
        let samples = ["basalt", "basalt", "andesite"]
            .iter()
            .map(|rock| Sample {
                values: [("La".to_string(), 1.0)].into_iter().collect(),
                metadata: [(
                    "rock_type".to_string(),
                    MetadataValue::String(rock.to_string()),
                )]
                .into_iter()
                .collect(),
            })
            .collect();
        GeochemDataset::from_samples(samples, vec!["La".to_string()])
    }

    #[test]
    fn all_selected_shows_everything() {
        let ds = dataset();
        let filters = init_filter_state(&ds);
        assert_eq!(filtered_indices(&ds, &filters), vec![0, 1, 2]);
    }

    #[test]
    fn deselecting_a_value_hides_its_samples() {
        let ds = dataset();
        let mut filters = init_filter_state(&ds);
        filters
            .get_mut("rock_type")
            .unwrap()
            .remove(&MetadataValue::String("basalt".into()));
        assert_eq!(filtered_indices(&ds, &filters), vec![2]);
    }

    #[test]
    fn empty_selection_hides_everything() {
        let ds = dataset();
        let mut filters = init_filter_state(&ds);
        filters.insert("rock_type".to_string(), BTreeSet::new());
        assert!(filtered_indices(&ds, &filters).is_empty());
    }
}
