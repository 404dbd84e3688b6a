use std::{env, path::PathBuf};

pub struct Env {}

impl Env {
    pub const SYS_NAME: &'static str = "resplot";

    /// Date-stamped sub-directory of `results/` holding the benchmark logs
    /// we plot.
    pub const RESULTS_RUN: &'static str = "2019-04-12";

    pub fn proj_root() -> PathBuf {
        env!("CARGO_MANIFEST_DIR").into()
    }

    pub fn results_root() -> PathBuf {
        let mut path = Self::proj_root();
        path.push("results");
        path.push(Self::RESULTS_RUN);
        path
    }

    /// Plots are written to the directory the tool is invoked from.
    pub fn output_root() -> PathBuf {
        env::current_dir().unwrap_or_else(|_| PathBuf::from("."))
    }
}
