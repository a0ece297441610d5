//! `tcrit-curves` library crate.
//!
//! Estimates the critical temperature (Tcrit) of photosynthetic thermal
//! tolerance from PAM fluorescence ramps, along with T50 and Tmax, for every
//! well of a plate.
//!
//! The binary (`tcrit`) is a thin wrapper around this library so that:
//!
//! - the pipeline is testable without spawning processes
//! - the numeric stages (`signal`, `fit`) stay independent of file formats

pub mod app;
pub mod cli;
pub mod data;
pub mod domain;
pub mod error;
pub mod fit;
pub mod io;
pub mod math;
pub mod plot;
pub mod report;
pub mod signal;
