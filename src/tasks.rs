// List the different tasks here
pub mod boxplot;
pub mod color;
pub mod grouping;
pub mod plot;
pub mod results;
pub mod solvers;
pub mod summary;
