//! Box-plot figures of constraint-solver benchmark logs.
//!
//! Result logs are loaded into typed tables (`tasks::results`), bucketed by an
//! experiment parameter (`tasks::grouping`) and drawn as grouped box plots
//! (`tasks::boxplot`). `tasks::plot` wires these together for each of the
//! figures we publish.

pub mod env;
pub mod tasks;
