//! Commands exposed by the `workdash` binary

mod dashboard;
mod plugins;

pub use dashboard::*;
pub use plugins::*;
