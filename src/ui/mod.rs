//! UI layer: egui panels and the spider-diagram plot.

pub mod panels;
pub mod plot;
