//! Line Chart
//!
//! Renders a population series as a two-line SVG chart with plotters:
//! herbivores and carnivores against a shared year axis, with a grid,
//! a legend and per-year hover tooltips.

mod svg;

pub use svg::{escape, render_svg, ChartError};

use plotters::style::RGBColor;

use crate::config::ChartConfig;
use crate::series::AnimalCount;

/// Space outside the chart, in pixels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Margin {
    pub top: i32,
    pub right: i32,
    pub bottom: i32,
    pub left: i32,
}

impl Default for Margin {
    fn default() -> Self {
        Self {
            top: 5,
            right: 30,
            bottom: 5,
            left: 20,
        }
    }
}

/// Which count a line plots
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Measure {
    Herbivores,
    Carnivores,
}

impl Measure {
    pub fn value(&self, sample: &AnimalCount) -> u32 {
        match self {
            Measure::Herbivores => sample.num_herbs,
            Measure::Carnivores => sample.num_carns,
        }
    }
}

/// Appearance of one line
#[derive(Debug, Clone, PartialEq)]
pub struct SeriesStyle {
    pub measure: Measure,
    pub label: String,
    pub color: RGBColor,
}

/// Fixed chart surface settings
#[derive(Debug, Clone, PartialEq)]
pub struct ChartOptions {
    pub width: u32,
    pub height: u32,
    pub margin: Margin,
    /// Upper bound on the number of year labels
    pub max_x_labels: usize,
    /// Upper bound on the number of count labels
    pub y_tick_count: usize,
    pub lines: Vec<SeriesStyle>,
}

impl Default for ChartOptions {
    fn default() -> Self {
        Self {
            width: 1500,
            height: 800,
            margin: Margin::default(),
            max_x_labels: 20,
            y_tick_count: 5,
            lines: vec![
                SeriesStyle {
                    measure: Measure::Herbivores,
                    label: "Herbivores".to_string(),
                    color: RGBColor(0x88, 0x84, 0xd8),
                },
                SeriesStyle {
                    measure: Measure::Carnivores,
                    label: "Carnivores".to_string(),
                    color: RGBColor(0x82, 0xca, 0x9d),
                },
            ],
        }
    }
}

impl From<&ChartConfig> for ChartOptions {
    fn from(config: &ChartConfig) -> Self {
        Self {
            width: config.width,
            height: config.height,
            max_x_labels: config.max_x_labels.max(1),
            ..Default::default()
        }
    }
}
