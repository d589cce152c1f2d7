use std::collections::BTreeSet;
use std::fmt;

use crate::color::ColorMap;
use crate::data::filter::{FilterState, filtered_indices, init_filter_state};
use crate::data::model::{GeochemDataset, MetadataValue};
use crate::data::norm::{ColumnSpec, NormError, NormOptions, NormalizedTable, Preset, pm_norm};

// ---------------------------------------------------------------------------
// Column-selection choice exposed in the UI
// ---------------------------------------------------------------------------

/// Which selection spec the side panel currently targets.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpecChoice {
    Ree,
    Extended,
    Custom,
}

impl fmt::Display for SpecChoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            SpecChoice::Ree => write!(f, "REE"),
            SpecChoice::Extended => write!(f, "Extended"),
            SpecChoice::Custom => write!(f, "Custom…"),
        }
    }
}

// ---------------------------------------------------------------------------
// Application state
// ---------------------------------------------------------------------------

/// The full UI state, independent of rendering.
pub struct AppState {
    /// Loaded observation table (None until user loads a file).
    pub dataset: Option<GeochemDataset>,

    /// Normalization result for the current dataset and selection.
    pub normalized: Option<Result<NormalizedTable, NormError>>,

    /// Which selection spec is active.
    pub spec_choice: SpecChoice,

    /// Raw text of the custom element list (used when `spec_choice` is Custom).
    pub custom_cols: String,

    /// Line/marker opacity of the spider diagram.
    pub alpha: f32,

    /// Per-column filter selections.
    pub filters: FilterState,

    /// Indices of samples passing the current filters (cached).
    pub visible_indices: Vec<usize>,

    /// Which metadata column is used for colouring.
    pub color_column: Option<String>,

    /// Active colour map.
    pub color_map: Option<ColorMap>,

    /// Status / error message shown in the UI.
    pub status_message: Option<String>,

    /// Whether a file loading operation is in progress.
    pub loading: bool,
}

impl Default for AppState {
    fn default() -> Self {
        Self {
            dataset: None,
            normalized: None,
            spec_choice: SpecChoice::Ree,
            custom_cols: String::new(),
            alpha: 0.5,
            filters: FilterState::default(),
            visible_indices: Vec::new(),
            color_column: None,
            color_map: None,
            status_message: None,
            loading: false,
        }
    }
}

impl AppState {
    /// Ingest a newly loaded dataset, initialise filters, colour, and ratios.
    pub fn set_dataset(&mut self, dataset: GeochemDataset) {
        self.filters = init_filter_state(&dataset);
        self.visible_indices = (0..dataset.len()).collect();

        // Default colour column: first metadata column (if any).
        self.color_column = dataset.metadata_columns.first().cloned();
        self.rebuild_color_map(&dataset);

        self.dataset = Some(dataset);
        self.status_message = None;
        self.loading = false;
        self.renormalize();
    }

    /// The selection spec the current UI choice stands for.
    pub fn column_spec(&self) -> ColumnSpec {
        match self.spec_choice {
            SpecChoice::Ree => ColumnSpec::Preset(Preset::Ree),
            SpecChoice::Extended => ColumnSpec::Preset(Preset::Extended),
            SpecChoice::Custom => ColumnSpec::parse_list(&self.custom_cols),
        }
    }

    /// Re-run normalization for the current dataset and selection.
    ///
    /// `NoMatchingColumns` is an expected outcome (e.g. a custom list naming
    /// no measured element); it is surfaced via the status message.
    pub fn renormalize(&mut self) {
        let Some(dataset) = &self.dataset else {
            self.normalized = None;
            return;
        };
        let options = NormOptions {
            cols: self.column_spec(),
            ..Default::default()
        };
        let result = pm_norm(dataset, &options);
        match &result {
            Ok(table) => {
                log::info!(
                    "normalized {} samples over {} elements",
                    table.len(),
                    table.columns.len()
                );
                self.status_message = None;
            }
            Err(err) => {
                log::warn!("normalization failed: {err}");
                self.status_message = Some(format!("Error: {err}"));
            }
        }
        self.normalized = Some(result);
    }

    /// Change the selection spec choice and recompute ratios.
    pub fn set_spec_choice(&mut self, choice: SpecChoice) {
        if self.spec_choice != choice {
            self.spec_choice = choice;
            self.renormalize();
        }
    }

    /// Rebuild the colour map from the current `color_column`.
    pub fn rebuild_color_map(&mut self, dataset: &GeochemDataset) {
        self.color_map = self.color_column.as_ref().and_then(|col| {
            dataset
                .unique_values
                .get(col)
                .map(|vals| ColorMap::new(col, vals))
        });
    }

    /// Recompute `visible_indices` after filter change.
    pub fn refilter(&mut self) {
        if let Some(ds) = &self.dataset {
            self.visible_indices = filtered_indices(ds, &self.filters);
        }
    }

    /// Set colour column and rebuild the map.
    pub fn set_color_column(&mut self, col: String) {
        self.color_column = Some(col);
        if let Some(ds) = &self.dataset {
            let ds_clone = ds.clone();
            self.rebuild_color_map(&ds_clone);
        }
    }

    /// Toggle a single metadata value in a column's filter.
    pub fn toggle_filter_value(&mut self, column: &str, value: &MetadataValue) {
        let selected = self.filters.entry(column.to_string()).or_default();
        if selected.contains(value) {
            selected.remove(value);
        } else {
            selected.insert(value.clone());
        }
        self.refilter();
    }

    /// Select all values in a column.
    pub fn select_all(&mut self, column: &str) {
        if let Some(ds) = &self.dataset {
            if let Some(all_vals) = ds.unique_values.get(column) {
                self.filters.insert(column.to_string(), all_vals.clone());
                self.refilter();
            }
        }
    }

    /// Deselect all values in a column.
    pub fn select_none(&mut self, column: &str) {
        self.filters.insert(column.to_string(), BTreeSet::new());
        self.refilter();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::model::Sample;

    fn dataset() -> GeochemDataset {
        let samples = vec![
            Sample {
                values: [("La".to_string(), 6.48), ("Ce".to_string(), 16.75)]
                    .into_iter()
                    .collect(),
                metadata: [(
                    "rock_type".to_string(),
                    MetadataValue::String("basalt".into()),
                )]
                .into_iter()
                .collect(),
            },
            Sample {
                values: [("La".to_string(), 1.296)].into_iter().collect(),
                metadata: [(
                    "rock_type".to_string(),
                    MetadataValue::String("andesite".into()),
                )]
                .into_iter()
                .collect(),
            },
        ];
        GeochemDataset::from_samples(samples, vec!["La".to_string(), "Ce".to_string()])
    }

    #[test]
    fn set_dataset_normalizes_with_default_spec() {
        let mut state = AppState::default();
        state.set_dataset(dataset());
        let table = state.normalized.as_ref().unwrap().as_ref().unwrap();
        assert_eq!(table.columns, vec!["La", "Ce"]);
        assert_eq!(table.len(), 2);
        assert_eq!(state.visible_indices, vec![0, 1]);
        assert_eq!(state.color_column.as_deref(), Some("rock_type"));
    }

    #[test]
    fn custom_spec_with_no_match_sets_status() {
        let mut state = AppState::default();
        state.set_dataset(dataset());
        state.custom_cols = "Xx, Qq".to_string();
        state.set_spec_choice(SpecChoice::Custom);
        assert_eq!(
            state.normalized,
            Some(Err(NormError::NoMatchingColumns))
        );
        assert!(state.status_message.is_some());
    }

    #[test]
    fn switching_back_to_preset_clears_status() {
        let mut state = AppState::default();
        state.set_dataset(dataset());
        state.custom_cols = "Xx".to_string();
        state.set_spec_choice(SpecChoice::Custom);
        state.set_spec_choice(SpecChoice::Ree);
        assert!(state.status_message.is_none());
        assert!(matches!(state.normalized, Some(Ok(_))));
    }

    #[test]
    fn filters_only_affect_visibility_not_the_table() {
        let mut state = AppState::default();
        state.set_dataset(dataset());
        state.toggle_filter_value("rock_type", &MetadataValue::String("andesite".into()));
        assert_eq!(state.visible_indices, vec![0]);
        // Normalized rows stay index-aligned with the full dataset.
        let table = state.normalized.as_ref().unwrap().as_ref().unwrap();
        assert_eq!(table.len(), 2);
    }
}
