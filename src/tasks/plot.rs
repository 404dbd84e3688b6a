use crate::{
    env::Env,
    tasks::{
        boxplot::{Figure, OutputFormat, box_graph},
        color::make_colors,
        grouping::{SeriesGroup, align_groups, group_by},
        results::{Column, NS_TO_MS, ResultTable},
        solvers::SolverStrategy,
    },
};
use anyhow::Result;
use clap::ValueEnum;
use log::{error, warn};
use std::{fmt, fs, path::PathBuf};

/// Only runs with at most this many hungry workers make it into `morerooms`.
pub const MORE_ROOMS_MAX_HUNGRY: i32 = 25;

/// Fixed y-axis ticks (in ms) for the `onebyone` figure.
pub const ONE_BY_ONE_Y_TICKS: [f64; 11] = [
    0.0, 1000.0, 2000.0, 3000.0, 4000.0, 5000.0, 10000.0, 15000.0, 20000.0, 25000.0, 30000.0,
];

/// The figures we know how to produce, in the order they are rendered by
/// default.
#[derive(Clone, Copy, Debug, ValueEnum, PartialEq, Eq, PartialOrd, Ord)]
pub enum Scenario {
    /// Computation time per worker count, one box series per project count
    Simple,
    /// Computation time per worker count for each solver strategy
    #[value(name = "morerooms")]
    MoreRooms,
    /// Computation time per lunch-room count, one box series per project count
    #[value(name = "onebyone")]
    OneByOne,
}

impl Scenario {
    pub const SIMPLE_NAME: &'static str = "simple";
    pub const MORE_ROOMS_NAME: &'static str = "morerooms";
    pub const ONE_BY_ONE_NAME: &'static str = "onebyone";

    pub fn iter_variants() -> std::slice::Iter<'static, Scenario> {
        static VARIANTS: [Scenario; 3] = [Scenario::Simple, Scenario::MoreRooms, Scenario::OneByOne];
        VARIANTS.iter()
    }

    /// File name (without extension) the figure is saved under.
    pub fn output_stem(&self) -> &'static str {
        match self {
            Scenario::Simple => "1",
            Scenario::MoreRooms => "2",
            Scenario::OneByOne => "3",
        }
    }

    pub fn x_label(&self) -> &'static str {
        match self {
            Scenario::Simple | Scenario::MoreRooms => "Number of workers",
            Scenario::OneByOne => "Number of lunch rooms",
        }
    }
}

impl fmt::Display for Scenario {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Scenario::Simple => write!(f, "{}", Self::SIMPLE_NAME),
            Scenario::MoreRooms => write!(f, "{}", Self::MORE_ROOMS_NAME),
            Scenario::OneByOne => write!(f, "{}", Self::ONE_BY_ONE_NAME),
        }
    }
}

/// Where to read result logs from and where to put the figures.
#[derive(Clone, Debug)]
pub struct PlotConfig {
    pub results_dir: PathBuf,
    pub output_dir: PathBuf,
    pub format: OutputFormat,
    pub scale: f64,
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            results_dir: Env::results_root(),
            output_dir: Env::output_root(),
            format: OutputFormat::default(),
            scale: NS_TO_MS,
        }
    }
}

impl PlotConfig {
    pub fn output_path(&self, scenario: &Scenario) -> PathBuf {
        self.output_dir.join(format!(
            "{}.{}",
            scenario.output_stem(),
            self.format.extension()
        ))
    }
}

/// One series group per distinct project count, in order of first
/// appearance, each bucketed by `column`.
fn group_by_projects(data: &ResultTable, column: Column) -> (Vec<String>, Vec<SeriesGroup>) {
    data.unique(Column::Projects)
        .into_iter()
        .map(|n| {
            let subsel = data.filter(|row| row.projects == n);
            (format!("{n} projects"), group_by(&subsel, column))
        })
        .unzip()
}

fn build_figure(scenario: &Scenario, labels: &[String], groups: &[SeriesGroup]) -> Result<Figure> {
    if groups.iter().all(SeriesGroup::is_empty) {
        warn!("{scenario}: no rows left to plot, the figure will be empty");
    }

    let (x_ticks, datasets) = align_groups(groups);
    let colors = make_colors(groups.len());
    let mut figure = box_graph(datasets, labels, &colors, &x_ticks)?;
    figure.set_x_label(scenario.x_label());

    Ok(figure)
}

fn plot_simple(config: &PlotConfig) -> Result<Figure> {
    let data = ResultTable::load(&config.results_dir, "workercount-simple", config.scale)?;
    let (labels, groups) = group_by_projects(&data, Column::Workers);

    build_figure(&Scenario::Simple, &labels, &groups)
}

fn plot_more_rooms(config: &PlotConfig) -> Result<Figure> {
    let mut labels = Vec::new();
    let mut groups = Vec::new();

    for strategy in SolverStrategy::iter_variants() {
        let data = ResultTable::load(&config.results_dir, &strategy.log_label(), config.scale)?;
        let subsel = data.filter(|row| !row.failed && row.hungry <= MORE_ROOMS_MAX_HUNGRY);

        labels.push(strategy.legend_label().to_string());
        groups.push(group_by(&subsel, Column::Hungry));
    }

    build_figure(&Scenario::MoreRooms, &labels, &groups)
}

fn plot_one_by_one(config: &PlotConfig) -> Result<Figure> {
    let data = ResultTable::load(&config.results_dir, "oneworker-params", config.scale)?
        .filter(|row| !row.failed);
    let (labels, groups) = group_by_projects(&data, Column::LunchN);

    let mut figure = build_figure(&Scenario::OneByOne, &labels, &groups)?;
    figure.set_y_ticks(&ONE_BY_ONE_Y_TICKS);

    Ok(figure)
}

/// Render one scenario and return the path of the written figure.
pub fn plot(scenario: &Scenario, config: &PlotConfig) -> Result<PathBuf> {
    let figure = match scenario {
        Scenario::Simple => plot_simple(config)?,
        Scenario::MoreRooms => plot_more_rooms(config)?,
        Scenario::OneByOne => plot_one_by_one(config)?,
    };

    fs::create_dir_all(&config.output_dir).map_err(|e| {
        let reason = format!(
            "error creating output directory (path={}, error={e:?})",
            config.output_dir.display()
        );
        error!("{reason}");
        anyhow::anyhow!(reason)
    })?;

    let plot_path = config.output_path(scenario);
    figure.save(&plot_path, config.format)?;

    Ok(plot_path)
}

/// Render every scenario, in order. Stops at the first failure.
pub fn plot_all(config: &PlotConfig) -> Result<Vec<PathBuf>> {
    Scenario::iter_variants()
        .map(|scenario| plot(scenario, config))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_paths() {
        let config = PlotConfig {
            output_dir: PathBuf::from("/tmp/figures"),
            ..PlotConfig::default()
        };

        let paths: Vec<PathBuf> = Scenario::iter_variants()
            .map(|s| config.output_path(s))
            .collect();
        assert_eq!(
            paths,
            vec![
                PathBuf::from("/tmp/figures/1.pdf"),
                PathBuf::from("/tmp/figures/2.pdf"),
                PathBuf::from("/tmp/figures/3.pdf"),
            ]
        );
    }

    #[test]
    fn test_scenario_names() {
        let names: Vec<String> = Scenario::iter_variants().map(|s| s.to_string()).collect();
        assert_eq!(names, vec!["simple", "morerooms", "onebyone"]);

        for scenario in Scenario::iter_variants() {
            assert_eq!(
                Scenario::from_str(&scenario.to_string(), false),
                Ok(*scenario)
            );
        }
    }

    #[test]
    fn test_group_by_projects() {
        let log = "4,1,1,1,1,5,0,true,false,0,1\n\
                   2,1,1,1,1,5,0,true,false,0,2\n\
                   4,1,1,1,1,6,0,true,false,1,3\n";
        let data = ResultTable::from_reader(std::io::Cursor::new(log), "t", 1.0).unwrap();

        let (labels, groups) = group_by_projects(&data, Column::Workers);
        assert_eq!(labels, vec!["4 projects", "2 projects"]);
        assert_eq!(groups[0].keys, vec![5, 6]);
        assert_eq!(groups[1].keys, vec![5]);
    }
}
