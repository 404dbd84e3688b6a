//! Grouped box-and-whisker figures.
//!
//! A figure holds several groups of series. Each group gets one color and
//! one entry in the legend. Every group has one (possibly empty) series per
//! x-tick, and the boxes for the same tick are drawn next to each other.

use crate::tasks::color::{FONT_SIZE, Rgb, STROKE_WIDTH};
use anyhow::Result;
use clap::ValueEnum;
use log::{debug, error, info};
use plotters::{
    coord::{
        Shift,
        combinators::WithKeyPoints,
        ranged1d::{KeyPointHint, NoDefaultFormatting, ValueFormatter},
        types::RangedCoordf64,
    },
    prelude::*,
    style::text_anchor::{HPos, Pos, VPos},
};
use std::{fmt, fs, ops::Range, path::Path};
use svg2pdf::{ConversionOptions, PageOptions, usvg};

pub const Y_LABEL: &str = "Computation time (ms)";

/// Half the width of a box, in x-axis units.
const BOX_HALF_WIDTH: f64 = 0.25;

const FIGURE_SIZE: (u32, u32) = (700, 500);

#[derive(Clone, Copy, Debug, Default, ValueEnum, PartialEq, Eq)]
pub enum OutputFormat {
    #[default]
    Pdf,
    Svg,
    Png,
}

impl OutputFormat {
    pub fn extension(&self) -> &'static str {
        match self {
            OutputFormat::Pdf => "pdf",
            OutputFormat::Svg => "svg",
            OutputFormat::Png => "png",
        }
    }
}

impl fmt::Display for OutputFormat {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.extension())
    }
}

/// Descriptive statistics behind one box glyph.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoxStats {
    pub whisker_low: f64,
    pub q1: f64,
    pub median: f64,
    pub q3: f64,
    pub whisker_high: f64,
}

impl BoxStats {
    /// Quartiles use linear interpolation between closest ranks. Whiskers
    /// reach the most extreme samples within 1.5 IQR of the box. Returns
    /// `None` for an empty series.
    pub fn new(values: &[f64]) -> Option<Self> {
        if values.is_empty() {
            return None;
        }

        let mut sorted = values.to_owned();
        sorted.sort_by(f64::total_cmp);

        let q1 = percentile_of_sorted(&sorted, 0.25);
        let median = percentile_of_sorted(&sorted, 0.5);
        let q3 = percentile_of_sorted(&sorted, 0.75);
        let iqr = q3 - q1;

        let low_fence = q1 - 1.5 * iqr;
        let high_fence = q3 + 1.5 * iqr;
        let whisker_low = sorted
            .iter()
            .copied()
            .find(|v| *v >= low_fence)
            .unwrap_or(q1);
        let whisker_high = sorted
            .iter()
            .rev()
            .copied()
            .find(|v| *v <= high_fence)
            .unwrap_or(q3);

        Some(Self {
            whisker_low,
            q1,
            median,
            q3,
            whisker_high,
        })
    }
}

fn percentile_of_sorted(sorted: &[f64], p: f64) -> f64 {
    let rank = p * (sorted.len() - 1) as f64;
    let lo = rank.floor() as usize;
    let hi = rank.ceil() as usize;
    sorted[lo] + (sorted[hi] - sorted[lo]) * (rank - lo as f64)
}

/// Y coordinate of a figure. Plotters picks the ticks unless the caller has
/// fixed them.
pub enum TimeAxis {
    Auto(RangedCoordf64),
    Fixed(WithKeyPoints<RangedCoordf64>),
}

impl Ranged for TimeAxis {
    type ValueType = f64;
    type FormatOption = NoDefaultFormatting;

    fn range(&self) -> Range<f64> {
        match self {
            TimeAxis::Auto(inner) => inner.range(),
            TimeAxis::Fixed(inner) => inner.range(),
        }
    }

    fn map(&self, value: &f64, limit: (i32, i32)) -> i32 {
        match self {
            TimeAxis::Auto(inner) => inner.map(value, limit),
            TimeAxis::Fixed(inner) => inner.map(value, limit),
        }
    }

    fn key_points<Hint: KeyPointHint>(&self, hint: Hint) -> Vec<f64> {
        match self {
            TimeAxis::Auto(inner) => inner.key_points(hint),
            TimeAxis::Fixed(inner) => inner.key_points(hint),
        }
    }
}

impl ValueFormatter<f64> for TimeAxis {
    fn format(value: &f64) -> String {
        format!("{:.0}", value)
    }
}

/// A grouped box plot that has been laid out but not drawn yet.
///
/// Callers may still change the axis labelling before calling `save`, which
/// acquires the drawing backend, renders, writes the file and releases the
/// backend again.
#[derive(Debug)]
pub struct Figure {
    datasets: Vec<Vec<Vec<f64>>>,
    labels: Vec<String>,
    colors: Vec<Rgb>,
    x_ticks: Vec<String>,
    x_label: String,
    y_ticks: Option<Vec<f64>>,
}

/// Build a grouped box plot.
///
/// `datasets[g][t]` holds the samples for group `g` at x-tick `t`. Groups
/// with fewer series than `x_ticks` are padded with empty series. There must
/// be at least as many labels and colors as groups.
pub fn box_graph<L: AsRef<str>, T: ToString>(
    mut datasets: Vec<Vec<Vec<f64>>>,
    labels: &[L],
    colors: &[Rgb],
    x_ticks: &[T],
) -> Result<Figure> {
    anyhow::ensure!(
        datasets.len() <= colors.len(),
        "box_graph(): more groups than colors (groups={}, colors={})",
        datasets.len(),
        colors.len()
    );
    anyhow::ensure!(
        datasets.len() <= labels.len(),
        "box_graph(): more groups than labels (groups={}, labels={})",
        datasets.len(),
        labels.len()
    );
    for (idx, dataset) in datasets.iter().enumerate() {
        anyhow::ensure!(
            dataset.len() <= x_ticks.len(),
            "box_graph(): group {idx} has more series than x-ticks (series={}, ticks={})",
            dataset.len(),
            x_ticks.len()
        );
    }

    for dataset in datasets.iter_mut() {
        dataset.resize(x_ticks.len(), Vec::new());
    }

    let num_groups = datasets.len();
    Ok(Figure {
        datasets,
        labels: labels[..num_groups]
            .iter()
            .map(|l| l.as_ref().to_string())
            .collect(),
        colors: colors[..num_groups].to_vec(),
        x_ticks: x_ticks.iter().map(|t| t.to_string()).collect(),
        x_label: String::new(),
        y_ticks: None,
    })
}

impl Figure {
    pub fn set_x_label<S: Into<String>>(&mut self, label: S) {
        self.x_label = label.into();
    }

    /// Replace the automatic y-axis ticks with fixed values.
    pub fn set_y_ticks(&mut self, ticks: &[f64]) {
        self.y_ticks = Some(ticks.to_vec());
    }

    pub fn datasets(&self) -> &[Vec<Vec<f64>>] {
        &self.datasets
    }

    pub fn x_ticks(&self) -> &[String] {
        &self.x_ticks
    }

    pub fn x_label(&self) -> &str {
        &self.x_label
    }

    fn group_size(&self) -> usize {
        self.datasets.len()
    }

    fn step_size(&self) -> usize {
        self.group_size() + 1
    }

    /// X coordinate of each of `group`'s boxes, one per tick.
    pub fn positions(&self, group: usize) -> Vec<f64> {
        (0..self.x_ticks.len())
            .map(|t| (t * self.step_size() + group) as f64)
            .collect()
    }

    /// X coordinate at which each tick label is centered under its cluster.
    pub fn tick_centers(&self) -> Vec<f64> {
        (0..self.x_ticks.len())
            .map(|t| (t * self.step_size()) as f64 + self.group_size() as f64 / 2.0 - 0.5)
            .collect()
    }

    pub fn x_range(&self) -> Range<f64> {
        -1.0..(self.step_size() * self.x_ticks.len()) as f64
    }

    /// Statistics of every non-empty series, with the box's x coordinate.
    pub fn boxes(&self, group: usize) -> Vec<(f64, BoxStats)> {
        self.positions(group)
            .into_iter()
            .zip(self.datasets[group].iter())
            .filter_map(|(x, series)| BoxStats::new(series).map(|stats| (x, stats)))
            .collect()
    }

    /// Fixed y-axis ticks, if any were set.
    pub fn y_ticks(&self) -> Option<&[f64]> {
        self.y_ticks.as_deref()
    }

    fn data_max(&self) -> f64 {
        (0..self.group_size())
            .flat_map(|g| self.boxes(g))
            .map(|(_, stats)| stats.whisker_high)
            .fold(0.0, f64::max)
    }

    pub fn y_range(&self) -> Range<f64> {
        let ticks_max = self.y_ticks().unwrap_or_default().iter().copied().fold(0.0, f64::max);
        let y_max = self.data_max().max(ticks_max);
        if y_max > 0.0 {
            0.0..y_max * 1.05
        } else {
            0.0..1.0
        }
    }

    pub fn y_axis(&self) -> TimeAxis {
        let y_range = self.y_range();
        match &self.y_ticks {
            Some(ticks) => TimeAxis::Fixed(y_range.with_key_points(ticks.clone())),
            None => TimeAxis::Auto(y_range.into()),
        }
    }

    /// Render the figure to `path` and release the drawing backend.
    pub fn save(self, path: &Path, format: OutputFormat) -> Result<()> {
        match format {
            OutputFormat::Pdf => {
                let mut svg = String::new();
                {
                    let root = SVGBackend::with_string(&mut svg, FIGURE_SIZE).into_drawing_area();
                    self.draw(&root)?;
                    root.present()?;
                }

                let pdf = svg_to_pdf(&svg)?;
                fs::write(path, pdf).map_err(|e| {
                    let reason = format!(
                        "error writing figure (path={}, error={e:?})",
                        path.display()
                    );
                    error!("{reason}");
                    anyhow::anyhow!(reason)
                })?;
            }
            OutputFormat::Svg => {
                let root = SVGBackend::new(path, FIGURE_SIZE).into_drawing_area();
                self.draw(&root)?;
                root.present()?;
            }
            OutputFormat::Png => {
                let root = BitMapBackend::new(path, FIGURE_SIZE).into_drawing_area();
                self.draw(&root)?;
                root.present()?;
            }
        }

        info!("generated plot at: {}", path.display());
        Ok(())
    }

    fn draw<DB: DrawingBackend>(&self, root: &DrawingArea<DB, Shift>) -> Result<()>
    where
        DB::ErrorType: 'static,
    {
        root.fill(&WHITE)?;

        let x_range = self.x_range();
        let y_range = self.y_range();
        debug!(
            "drawing box plot (groups={}, ticks={}, y_range={y_range:?})",
            self.group_size(),
            self.x_ticks.len()
        );

        let mut chart = ChartBuilder::on(root)
            .margin(10)
            .margin_top(40)
            .margin_left(30)
            .x_label_area_size(50)
            .y_label_area_size(50)
            .build_cartesian_2d(x_range.clone(), self.y_axis())?;

        // Light grey gridlines at the major y ticks, x labels are drawn by hand
        chart
            .configure_mesh()
            .light_line_style(WHITE)
            .bold_line_style(RGBColor(211, 211, 211))
            .y_labels(10)
            .y_label_style(("sans-serif", FONT_SIZE).into_font())
            .x_desc("")
            .x_label_formatter(&|_| String::new())
            .disable_x_mesh()
            .disable_x_axis()
            .y_label_formatter(&|y| format!("{:.0}", y))
            .draw()?;

        for (group, color) in self.colors.iter().enumerate() {
            let style = color.to_rgb_color().stroke_width(STROKE_WIDTH);
            let boxes = self.boxes(group);

            chart.draw_series(boxes.iter().map(|(x, stats)| {
                Rectangle::new(
                    [(x - BOX_HALF_WIDTH, stats.q1), (x + BOX_HALF_WIDTH, stats.q3)],
                    style,
                )
            }))?;

            chart.draw_series(
                boxes
                    .iter()
                    .flat_map(|(x, stats)| whisker_paths(*x, stats))
                    .map(|points| PathElement::new(points, style)),
            )?;
        }

        let y0 = y_range.start;
        chart.plotting_area().draw(&PathElement::new(
            vec![(x_range.start, y0), (x_range.end, y0)],
            BLACK,
        ))?;

        let tick_font = ("sans-serif", FONT_SIZE).into_font().color(&BLACK);

        for (x, tick) in self.tick_centers().iter().zip(self.x_ticks.iter()) {
            let (px, py) = chart.plotting_area().map_coordinate(&(*x, y0));
            root.draw(&PathElement::new(vec![(px, py), (px, py + 5)], BLACK))?;
            root.draw(&Text::new(
                tick.as_str(),
                (px, py + 8),
                tick_font.pos(Pos::new(HPos::Center, VPos::Top)),
            ))?;
        }

        // Manually draw the axis labels
        let (x_pixels, y_pixels) = chart.plotting_area().get_pixel_range();
        root.draw(&Text::new(
            Y_LABEL,
            (5, (y_pixels.start + y_pixels.end) / 2),
            ("sans-serif", FONT_SIZE)
                .into_font()
                .transform(FontTransform::Rotate270)
                .color(&BLACK)
                .pos(Pos::new(HPos::Center, VPos::Top)),
        ))?;
        if !self.x_label.is_empty() {
            root.draw(&Text::new(
                self.x_label.as_str(),
                ((x_pixels.start + x_pixels.end) / 2, y_pixels.end + 30),
                tick_font.pos(Pos::new(HPos::Center, VPos::Top)),
            ))?;
        }

        // Legend goes in a single row above the chart
        let legend_y = y_pixels.start / 2;
        let mut legend_x = x_pixels.start;
        for (label, color) in self.labels.iter().zip(self.colors.iter()) {
            root.draw(&PathElement::new(
                vec![(legend_x, legend_y), (legend_x + 20, legend_y)],
                color.to_rgb_color().stroke_width(STROKE_WIDTH),
            ))?;
            root.draw(&Text::new(
                label.as_str(),
                (legend_x + 26, legend_y),
                tick_font.pos(Pos::new(HPos::Left, VPos::Center)),
            ))?;
            legend_x += legend_entry_width(label);
        }

        Ok(())
    }
}

/// Convert a rendered SVG document into a single-page PDF.
fn svg_to_pdf(svg: &str) -> Result<Vec<u8>> {
    let mut options = usvg::Options::default();
    options.fontdb_mut().load_system_fonts();

    let tree = usvg::Tree::from_str(svg, &options).map_err(|e| {
        let reason = format!("error parsing rendered figure (error={e:?})");
        error!("{reason}");
        anyhow::anyhow!(reason)
    })?;

    svg2pdf::to_pdf(&tree, ConversionOptions::default(), PageOptions::default()).map_err(|e| {
        let reason = format!("error converting figure to pdf (error={e:?})");
        error!("{reason}");
        anyhow::anyhow!(reason)
    })
}

/// Horizontal space taken by one legend entry, in pixels. Text is not
/// measured, so this goes by an average glyph width.
fn legend_entry_width(label: &str) -> i32 {
    26 + (label.chars().count() as f64 * FONT_SIZE as f64 * 0.6).ceil() as i32 + 20
}

/// Median line, both whiskers and both caps of one box.
fn whisker_paths(x: f64, stats: &BoxStats) -> Vec<Vec<(f64, f64)>> {
    let cap = BOX_HALF_WIDTH / 2.0;
    vec![
        vec![(x - BOX_HALF_WIDTH, stats.median), (x + BOX_HALF_WIDTH, stats.median)],
        vec![(x, stats.q1), (x, stats.whisker_low)],
        vec![(x, stats.q3), (x, stats.whisker_high)],
        vec![(x - cap, stats.whisker_low), (x + cap, stats.whisker_low)],
        vec![(x - cap, stats.whisker_high), (x + cap, stats.whisker_high)],
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tasks::color::make_colors;

    fn series(values: &[f64]) -> Vec<f64> {
        values.to_vec()
    }

    #[test]
    fn test_box_stats_quartiles() {
        let stats = BoxStats::new(&[4.0, 1.0, 3.0, 2.0, 5.0]).unwrap();
        assert_eq!(stats.q1, 2.0);
        assert_eq!(stats.median, 3.0);
        assert_eq!(stats.q3, 4.0);
        assert_eq!(stats.whisker_low, 1.0);
        assert_eq!(stats.whisker_high, 5.0);

        let stats = BoxStats::new(&[1.0, 2.0, 3.0, 4.0]).unwrap();
        assert_eq!(stats.q1, 1.75);
        assert_eq!(stats.median, 2.5);
        assert_eq!(stats.q3, 3.25);
    }

    #[test]
    fn test_box_stats_drops_fliers() {
        let stats = BoxStats::new(&[1.0, 2.0, 3.0, 4.0, 5.0, 100.0]).unwrap();
        assert_eq!(stats.whisker_low, 1.0);
        assert_eq!(stats.whisker_high, 5.0);
    }

    #[test]
    fn test_box_stats_empty_and_single() {
        assert!(BoxStats::new(&[]).is_none());

        let stats = BoxStats::new(&[7.0]).unwrap();
        assert_eq!(stats.whisker_low, 7.0);
        assert_eq!(stats.median, 7.0);
        assert_eq!(stats.whisker_high, 7.0);
    }

    #[test]
    fn test_pads_short_groups() {
        let datasets = vec![
            vec![series(&[1.0]), series(&[2.0]), series(&[3.0])],
            vec![series(&[4.0]), series(&[5.0])],
        ];
        let figure = box_graph(datasets, &["a", "b"], &make_colors(2), &[5, 6, 7]).unwrap();

        assert_eq!(figure.datasets().len(), 2);
        assert_eq!(figure.datasets()[0].len(), 3);
        assert_eq!(figure.datasets()[1].len(), 3);
        assert!(figure.datasets()[1][2].is_empty());

        // The padded tick renders no box
        assert_eq!(figure.boxes(0).len(), 3);
        assert_eq!(figure.boxes(1).len(), 2);
    }

    #[test]
    fn test_layout() {
        let datasets = vec![vec![], vec![]];
        let figure = box_graph(datasets, &["a", "b"], &make_colors(2), &["x", "y", "z"]).unwrap();

        assert_eq!(figure.positions(0), vec![0.0, 3.0, 6.0]);
        assert_eq!(figure.positions(1), vec![1.0, 4.0, 7.0]);
        assert_eq!(figure.tick_centers(), vec![0.5, 3.5, 6.5]);
        assert_eq!(figure.x_range(), -1.0..9.0);
    }

    #[test]
    fn test_layout_three_groups() {
        let datasets = vec![vec![], vec![], vec![]];
        let figure = box_graph(datasets, &["a", "b", "c"], &make_colors(3), &[1, 2]).unwrap();

        assert_eq!(figure.positions(2), vec![2.0, 6.0]);
        assert_eq!(figure.tick_centers(), vec![1.0, 5.0]);
        assert_eq!(figure.x_range(), -1.0..8.0);
    }

    #[test]
    fn test_more_groups_than_colors() {
        let datasets = vec![vec![series(&[1.0])], vec![series(&[2.0])], vec![series(&[3.0])]];
        let result = box_graph(datasets, &["a", "b", "c"], &make_colors(2), &[1]);
        assert!(result.is_err());
    }

    #[test]
    fn test_more_groups_than_labels() {
        let datasets = vec![vec![series(&[1.0])], vec![series(&[2.0])]];
        let result = box_graph(datasets, &["a"], &make_colors(2), &[1]);
        assert!(result.is_err());
    }

    #[test]
    fn test_more_series_than_ticks() {
        let datasets = vec![vec![series(&[1.0]), series(&[2.0])]];
        let result = box_graph(datasets, &["a"], &make_colors(1), &[1]);
        assert!(result.is_err());
    }

    #[test]
    fn test_extra_labels_and_colors_are_ignored() {
        let datasets = vec![vec![series(&[1.0])]];
        let figure = box_graph(datasets, &["a", "b"], &make_colors(3), &[1]).unwrap();
        assert_eq!(figure.labels, vec!["a".to_string()]);
        assert_eq!(figure.colors.len(), 1);
    }

    #[test]
    fn test_y_ticks() {
        let datasets = vec![vec![series(&[10.0, 20.0, 30.0])]];
        let mut figure = box_graph(datasets, &["a"], &make_colors(1), &[1]).unwrap();

        assert!(figure.y_ticks().is_none());
        assert_eq!(figure.y_range(), 0.0..31.5);

        figure.set_y_ticks(&[0.0, 100.0]);
        assert_eq!(figure.y_ticks(), Some(&[0.0, 100.0][..]));
        assert_eq!(figure.y_range(), 0.0..105.0);
    }

    #[test]
    fn test_y_axis_key_points() {
        let datasets = vec![vec![series(&[100.0, 200.0, 300.0])]];
        let mut figure = box_graph(datasets, &["a"], &make_colors(1), &[1]).unwrap();

        let auto = figure.y_axis().key_points(10usize);
        assert!(!auto.is_empty());
        assert!(auto.iter().all(|y| figure.y_range().contains(y)));

        figure.set_y_ticks(&[0.0, 50.0, 250.0]);
        assert_eq!(figure.y_axis().key_points(10usize), vec![0.0, 50.0, 250.0]);
        assert_eq!(figure.y_axis().range(), figure.y_range());
    }

    #[test]
    fn test_output_format_extension() {
        assert_eq!(OutputFormat::default(), OutputFormat::Pdf);
        assert_eq!(OutputFormat::Pdf.to_string(), "pdf");
        assert_eq!(OutputFormat::Png.extension(), "png");
    }
}
