use clap::{Parser, Subcommand};
use env_logger::Builder;
use log::info;
use resplot::{
    env::Env,
    tasks::{
        boxplot::OutputFormat,
        plot::{self, PlotConfig, Scenario},
        results::{Column, NS_TO_MS, ResultTable},
        summary,
    },
};
use std::path::PathBuf;

#[derive(Parser)]
#[command(about = "Plot constraint-solver benchmark results")]
struct Cli {
    /// Directory holding the `<label>.log` result files
    #[arg(long, global = true, env = "RESPLOT_RESULTS_DIR")]
    results_dir: Option<PathBuf>,
    /// Directory to write figures to (defaults to the current directory)
    #[arg(long, global = true)]
    output_dir: Option<PathBuf>,
    /// Output format of the figures
    #[arg(long, global = true, value_enum, default_value_t = OutputFormat::Pdf)]
    format: OutputFormat,
    /// Factor applied to the elapsed nanoseconds (default: to milliseconds)
    #[arg(long, global = true, default_value_t = NS_TO_MS)]
    scale: f64,
    // The task to execute, plots every figure if missing
    #[clap(subcommand)]
    task: Option<Command>,
}

#[derive(Debug, Subcommand)]
enum Command {
    /// Render figures (all of them if none is given)
    Plot {
        #[arg(value_enum)]
        scenarios: Vec<Scenario>,
    },
    /// Print a quartile summary of a result log
    Summary {
        /// Label of the result log, e.g. `workercount-simple`
        label: String,
        /// Column to bucket the runs by
        #[arg(long, value_enum, default_value_t = Column::Workers)]
        by: Column,
    },
}

fn main() -> anyhow::Result<()> {
    // Initialize the logger.
    let env = env_logger::Env::default().filter_or("RUST_LOG", "info");
    let mut builder = Builder::from_env(env);
    builder.init();

    let cli = Cli::parse();
    let config = PlotConfig {
        results_dir: cli.results_dir.unwrap_or_else(Env::results_root),
        output_dir: cli.output_dir.unwrap_or_else(Env::output_root),
        format: cli.format,
        scale: cli.scale,
    };

    match cli.task {
        None => {
            plot::plot_all(&config)?;
        }
        Some(Command::Plot { scenarios }) => {
            if scenarios.is_empty() {
                plot::plot_all(&config)?;
            } else {
                for scenario in &scenarios {
                    plot::plot(scenario, &config)?;
                }
            }
        }
        Some(Command::Summary { label, by }) => {
            let table = ResultTable::load(&config.results_dir, &label, config.scale)?;
            info!(
                "{}: summarizing {} runs of {label} by {by}",
                Env::SYS_NAME,
                table.len()
            );
            print!("{}", summary::format_summary(by, &summary::summarize(&table, by)));
        }
    }

    Ok(())
}
