//! Running the simulator over the Cartesian product of the sweep axes.

pub mod axis;
pub mod config;
pub mod derived;
pub mod runner;
