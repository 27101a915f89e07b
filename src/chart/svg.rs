//! SVG rendering
//!
//! plotters draws the grid, axes, lines and legend into an in-memory SVG
//! document. Per-year hover bands with a `<title>` are appended afterwards so
//! browsers show every series value for the year under the cursor.

use plotters::coord::Shift;
use plotters::prelude::*;
use plotters::style::text_anchor::{HPos, Pos, VPos};
use std::fmt::Write;
use thiserror::Error;

use super::ChartOptions;
use crate::series::AnimalCount;

const GRID_COLOR: RGBColor = RGBColor(0xcc, 0xcc, 0xcc);
const AXIS_COLOR: RGBColor = RGBColor(0x66, 0x66, 0x66);
const EMPTY_COLOR: RGBColor = RGBColor(0x99, 0x99, 0x99);
const FONT: &str = "sans-serif";

#[derive(Error, Debug)]
pub enum ChartError {
    #[error("Chart rendering failed: {0}")]
    Render(String),
}

impl From<DrawingAreaErrorKind<std::io::Error>> for ChartError {
    fn from(e: DrawingAreaErrorKind<std::io::Error>) -> Self {
        ChartError::Render(e.to_string())
    }
}

/// Transparent hover target covering one year's column
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct HoverBand {
    pub year: u32,
    pub x: i32,
    pub width: i32,
    pub title: String,
}

/// Render `samples` as a standalone SVG document
///
/// Years sit on a categorical axis in document order. The count axis starts
/// at 0 and its ticks are chosen by plotters.
pub fn render_svg(
    samples: &[AnimalCount],
    options: &ChartOptions,
) -> Result<String, ChartError> {
    render(samples, options).map(|(svg, _)| svg)
}

pub(crate) fn render(
    samples: &[AnimalCount],
    options: &ChartOptions,
) -> Result<(String, Vec<HoverBand>), ChartError> {
    let mut svg = String::with_capacity(8192 + samples.len() * 512);

    let (bands, top, height) = {
        let root = SVGBackend::with_string(&mut svg, (options.width, options.height))
            .into_drawing_area();
        let drawn = draw_chart(&root, samples, options)?;
        root.present()?;
        drawn
    };

    append_hover_bands(&mut svg, &bands, top, height);
    Ok((svg, bands))
}

fn draw_chart(
    root: &DrawingArea<SVGBackend<'_>, Shift>,
    samples: &[AnimalCount],
    options: &ChartOptions,
) -> Result<(Vec<HoverBand>, i32, i32), ChartError> {
    root.fill(&WHITE)?;

    let count = samples.len() as i32;
    let max_value = samples
        .iter()
        .flat_map(|s| options.lines.iter().map(move |line| line.measure.value(s)))
        .max()
        .unwrap_or(0);
    let y_top = max_value.saturating_add(max_value / 10).max(1);

    let margin = options.margin;
    let mut chart = ChartBuilder::on(root)
        .margin_top(margin.top)
        .margin_right(margin.right)
        .margin_bottom(margin.bottom)
        .margin_left(margin.left)
        .x_label_area_size(30)
        .y_label_area_size(60)
        .build_cartesian_2d(-1i32..count, 0u32..y_top)?;

    // Index -1 and `count` pad the axis so the outermost years are not on its edge
    let year_label = |index: &i32| {
        usize::try_from(*index)
            .ok()
            .and_then(|i| samples.get(i))
            .map(|s| s.year.to_string())
            .unwrap_or_default()
    };

    chart
        .configure_mesh()
        .light_line_style(TRANSPARENT)
        .bold_line_style(GRID_COLOR)
        .axis_style(AXIS_COLOR)
        .x_labels(options.max_x_labels)
        .y_labels(options.y_tick_count)
        .x_label_formatter(&year_label)
        .label_style((FONT, 12).into_font().color(&AXIS_COLOR))
        .draw()?;

    for line in &options.lines {
        let color = line.color;
        chart
            .draw_series(
                LineSeries::new(
                    samples
                        .iter()
                        .enumerate()
                        .map(|(i, s)| (i as i32, line.measure.value(s))),
                    color.stroke_width(2),
                )
                .point_size(3),
            )?
            .label(line.label.clone())
            .legend(move |(x, y)| {
                PathElement::new(vec![(x, y), (x + 16, y)], color.stroke_width(2))
            });
    }

    chart
        .configure_series_labels()
        .position(SeriesLabelPosition::UpperRight)
        .background_style(WHITE.mix(0.8))
        .border_style(GRID_COLOR)
        .label_font((FONT, 12))
        .draw()?;

    let (x_range, y_range) = chart.plotting_area().get_pixel_range();

    if samples.is_empty() {
        let center = (
            (x_range.start + x_range.end) / 2,
            (y_range.start + y_range.end) / 2,
        );
        root.draw(&Text::new(
            "No data yet",
            center,
            (FONT, 16)
                .into_font()
                .color(&EMPTY_COLOR)
                .pos(Pos::new(HPos::Center, VPos::Center)),
        ))?;
    }

    let band = chart.backend_coord(&(1, 0)).0 - chart.backend_coord(&(0, 0)).0;
    let bands = samples
        .iter()
        .enumerate()
        .map(|(i, sample)| HoverBand {
            year: sample.year,
            x: chart.backend_coord(&(i as i32, 0)).0 - band / 2,
            width: band,
            title: tooltip(sample, options),
        })
        .collect();

    Ok((bands, y_range.start, y_range.end - y_range.start))
}

fn tooltip(sample: &AnimalCount, options: &ChartOptions) -> String {
    let mut title = format!("Year {}", sample.year);
    for line in &options.lines {
        title.push('\n');
        title.push_str(&line.label);
        title.push_str(": ");
        title.push_str(&line.measure.value(sample).to_string());
    }
    title
}

fn append_hover_bands(svg: &mut String, bands: &[HoverBand], top: i32, height: i32) {
    if bands.is_empty() {
        return;
    }

    let mut group = String::from("<g class=\"tooltips\">\n");
    for band in bands {
        // Writing into a String cannot fail
        let _ = writeln!(
            group,
            r#"<rect class="hover" data-year="{}" x="{}" y="{}" width="{}" height="{}" fill="transparent"><title>{}</title></rect>"#,
            band.year,
            band.x,
            top,
            band.width,
            height,
            escape(&band.title)
        );
    }
    group.push_str("</g>\n");

    if let Some(end) = svg.rfind("</svg>") {
        svg.insert_str(end, &group);
    }
}

/// Escape text for use in XML or HTML content and attributes
pub fn escape(text: &str) -> String {
    let mut escaped = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => escaped.push_str("&amp;"),
            '<' => escaped.push_str("&lt;"),
            '>' => escaped.push_str("&gt;"),
            '"' => escaped.push_str("&quot;"),
            '\'' => escaped.push_str("&#39;"),
            _ => escaped.push(c),
        }
    }
    escaped
}
