use anyhow::Result;
use clap::ValueEnum;
use csv::{ReaderBuilder, Trim};
use log::{debug, error};
use serde::Deserialize;
use std::{
    fmt,
    fs::File,
    io::Read,
    path::{Path, PathBuf},
};

/// Runs taking longer than this many nanoseconds hit the solver timeout.
pub const TIMEOUT_NSEC: i64 = 30_000_000_000;

/// Default rescaling factor applied to the elapsed time column.
pub const NS_TO_MS: f64 = 1e-6;

/// Number of fields in every result record.
pub const NUM_COLUMNS: usize = 11;

/// Raw record as laid out in a `.log` file. Logs carry no header row, so
/// fields are matched by position.
#[derive(Debug, Deserialize)]
struct Record {
    projects: i32,
    lunch_n: i32,
    lunch_cap: i32,
    work_n: i32,
    work_cap: i32,
    workers: i32,
    hungry: i32,
    full: String,
    lunchtime: String,
    i: i32,
    nsec: i64,
}

/// One benchmark trial.
#[derive(Clone, Debug, PartialEq)]
pub struct ResultRow {
    pub projects: i32,
    pub lunch_n: i32,
    pub lunch_cap: i32,
    pub work_n: i32,
    pub work_cap: i32,
    pub workers: i32,
    pub hungry: i32,
    pub full: bool,
    pub lunchtime: bool,
    pub i: i32,
    /// Elapsed time, already multiplied by the table's scale factor.
    pub nsec: f64,
    /// Whether the raw elapsed time exceeded `TIMEOUT_NSEC`.
    pub failed: bool,
}

impl ResultRow {
    fn from_record(record: Record, scale: f64) -> Self {
        Self {
            projects: record.projects,
            lunch_n: record.lunch_n,
            lunch_cap: record.lunch_cap,
            work_n: record.work_n,
            work_cap: record.work_cap,
            workers: record.workers,
            hungry: record.hungry,
            full: record.full == "true",
            lunchtime: record.lunchtime == "true",
            i: record.i,
            nsec: record.nsec as f64 * scale,
            failed: record.nsec > TIMEOUT_NSEC,
        }
    }

    pub fn get(&self, column: Column) -> i32 {
        match column {
            Column::Projects => self.projects,
            Column::LunchN => self.lunch_n,
            Column::LunchCap => self.lunch_cap,
            Column::WorkN => self.work_n,
            Column::WorkCap => self.work_cap,
            Column::Workers => self.workers,
            Column::Hungry => self.hungry,
            Column::I => self.i,
        }
    }
}

/// Integer columns of a result log that rows can be bucketed by.
#[derive(Clone, Copy, Debug, ValueEnum, PartialEq, Eq, PartialOrd, Ord)]
pub enum Column {
    Projects,
    LunchN,
    LunchCap,
    WorkN,
    WorkCap,
    Workers,
    Hungry,
    I,
}

impl fmt::Display for Column {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Column::Projects => write!(f, "projects"),
            Column::LunchN => write!(f, "lunch_n"),
            Column::LunchCap => write!(f, "lunch_cap"),
            Column::WorkN => write!(f, "work_n"),
            Column::WorkCap => write!(f, "work_cap"),
            Column::Workers => write!(f, "workers"),
            Column::Hungry => write!(f, "hungry"),
            Column::I => write!(f, "i"),
        }
    }
}

/// All trials read from one labelled result log.
#[derive(Clone, Debug, PartialEq)]
pub struct ResultTable {
    label: String,
    scale: f64,
    rows: Vec<ResultRow>,
}

impl ResultTable {
    pub fn log_path(results_dir: &Path, label: &str) -> PathBuf {
        results_dir.join(format!("{label}.log"))
    }

    /// Load `<results_dir>/<label>.log`, rescaling elapsed times by `scale`.
    pub fn load(results_dir: &Path, label: &str, scale: f64) -> Result<Self> {
        Self::from_path(&Self::log_path(results_dir, label), label, scale)
    }

    pub fn from_path(path: &Path, label: &str, scale: f64) -> Result<Self> {
        let file = File::open(path).map_err(|e| {
            let reason = format!(
                "error opening result log (label={label}, path={}, error={e:?})",
                path.display()
            );
            error!("{reason}");
            anyhow::anyhow!(reason)
        })?;

        let table = Self::from_reader(file, label, scale)?;
        debug!(
            "loaded {} rows from {} (scale={scale})",
            table.len(),
            path.display()
        );

        Ok(table)
    }

    pub fn from_reader<R: Read>(reader: R, label: &str, scale: f64) -> Result<Self> {
        let mut reader = ReaderBuilder::new()
            .has_headers(false)
            .trim(Trim::All)
            .from_reader(reader);

        let mut rows = Vec::new();
        for result in reader.records() {
            let parse_err = |e: String| {
                let reason = format!("error parsing result record (label={label}, error={e})");
                error!("{reason}");
                anyhow::anyhow!(reason)
            };

            let raw = result.map_err(|e| parse_err(e.to_string()))?;
            if raw.len() != NUM_COLUMNS {
                let line = raw.position().map_or(0, |pos| pos.line());
                return Err(parse_err(format!(
                    "line {line}: expected {NUM_COLUMNS} fields, found {}",
                    raw.len()
                )));
            }

            let record: Record = raw
                .deserialize(None)
                .map_err(|e| parse_err(e.to_string()))?;
            rows.push(ResultRow::from_record(record, scale));
        }

        Ok(Self {
            label: label.to_string(),
            scale,
            rows,
        })
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn scale(&self) -> f64 {
        self.scale
    }

    pub fn rows(&self) -> &[ResultRow] {
        &self.rows
    }

    pub fn iter(&self) -> std::slice::Iter<'_, ResultRow> {
        self.rows.iter()
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// New table with the rows matching `pred`. Values are not rescaled again.
    pub fn filter<P: Fn(&ResultRow) -> bool>(&self, pred: P) -> Self {
        Self {
            label: self.label.clone(),
            scale: self.scale,
            rows: self.rows.iter().filter(|&row| pred(row)).cloned().collect(),
        }
    }

    /// Distinct values of `column`, in order of first appearance.
    pub fn unique(&self, column: Column) -> Vec<i32> {
        let mut values = Vec::new();
        for row in &self.rows {
            let value = row.get(column);
            if !values.contains(&value) {
                values.push(value);
            }
        }
        values
    }
}
