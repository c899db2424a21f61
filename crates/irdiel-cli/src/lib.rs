//! Library side of the `irdiel` binary: job configuration, the runner and
//! the plot description it writes.

pub mod config;
pub mod plot;
pub mod runner;
