use eframe::egui::Ui;
use egui_plot::{Legend, Line, MarkerShape, Plot, PlotPoints, Points};

use crate::color::index_color;
use crate::state::AppState;

// ---------------------------------------------------------------------------
// Spider diagram (central panel)
// ---------------------------------------------------------------------------

/// Render the multi-element variation (spider) diagram in the central panel.
///
/// One line with diamond markers per visible sample; x = element position in
/// the resolved column order, y = normalized concentration on a log scale
/// (drawn as log10 values with a decade-aware axis). Ratios that are not
/// finite and positive cannot sit on a log axis and are skipped.
pub fn spider_plot(ui: &mut Ui, state: &AppState) {
    let dataset = match &state.dataset {
        Some(ds) => ds,
        None => {
            ui.centered_and_justified(|ui: &mut Ui| {
                ui.heading("Open a file to view spider diagrams  (File → Open…)");
            });
            return;
        }
    };

    let table = match &state.normalized {
        Some(Ok(table)) => table,
        Some(Err(_)) => {
            ui.centered_and_justified(|ui: &mut Ui| {
                ui.heading("Nothing to plot — no requested element is present in this dataset");
            });
            return;
        }
        None => return,
    };

    let color_map = &state.color_map;
    let color_col = state.color_column.as_deref();
    let alpha = state.alpha;

    let columns = table.columns.clone();

    Plot::new("spider_plot")
        .legend(Legend::default())
        .include_x(-0.5)
        .include_x(table.columns.len() as f64 - 0.5)
        .x_axis_label("element")
        .y_axis_label("concentration / reference")
        .x_axis_formatter(move |mark, _range| {
            let i = mark.value;
            if (i - i.round()).abs() > 1e-6 || i < -0.5 {
                return String::new();
            }
            columns
                .get(i.round() as usize)
                .cloned()
                .unwrap_or_default()
        })
        .y_axis_formatter(|mark, _range| decade_label(mark.value))
        .allow_boxed_zoom(true)
        .allow_drag(true)
        .allow_scroll(true)
        .allow_zoom(true)
        .show(ui, |plot_ui| {
            for &idx in &state.visible_indices {
                let row = &table.rows[idx];
                let sample = &dataset.samples[idx];

                // Determine colour from the colour-by column.
                let base_color = color_col
                    .and_then(|col| {
                        let val = sample.metadata.get(col)?;
                        let cm = color_map.as_ref()?;
                        Some(cm.color_for(val))
                    })
                    .unwrap_or_else(|| index_color(idx, dataset.len()));
                let color = base_color.gamma_multiply(alpha);

                // Build the legend name from the colour column value.
                let name = color_col
                    .and_then(|col| sample.metadata.get(col))
                    .map(|v| v.to_string())
                    .unwrap_or_else(|| format!("sample {idx}"));

                let points: Vec<[f64; 2]> = row
                    .iter()
                    .enumerate()
                    .filter(|(_, &v)| v.is_finite() && v > 0.0)
                    .map(|(i, &v)| [i as f64, v.log10()])
                    .collect();
                if points.is_empty() {
                    continue;
                }

                let line = Line::new(PlotPoints::from(points.clone()))
                    .name(&name)
                    .color(color)
                    .width(1.5);
                plot_ui.line(line);

                let markers = Points::new(PlotPoints::from(points))
                    .name(&name)
                    .color(color)
                    .shape(MarkerShape::Diamond)
                    .radius(3.5)
                    .filled(true);
                plot_ui.points(markers);
            }
        });
}

/// Label for a log10-transformed axis mark: decades get their linear value,
/// everything else stays unlabeled.
fn decade_label(log_value: f64) -> String {
    let rounded = log_value.round();
    if (log_value - rounded).abs() > 1e-6 {
        return String::new();
    }
    let exp = rounded as i32;
    match exp {
        -4..=-1 => format!("{:.*}", exp.unsigned_abs() as usize, 10f64.powi(exp)),
        0..=4 => format!("{}", 10f64.powi(exp) as i64),
        _ => format!("1e{exp}"),
    }
}
