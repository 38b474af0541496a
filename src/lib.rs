pub mod align;
pub mod chart;
pub mod config_file;
pub mod ctx;
pub mod curve;
pub mod get_terminal_width;
pub mod index_map;
pub mod io_utils;
pub mod json5_from_str;
pub mod record;
pub mod reshape;
pub mod result_store;
pub mod simulator;
pub mod sweep;
pub mod terminal_table;
pub mod utillib;

pub const NETSWEEP_VERSION: &str = env!("CARGO_PKG_VERSION");
