//! Charts module - Chart rendering

mod histogram;
mod renderer;

pub use renderer::{ChartOptions, StaticChartRenderer};
