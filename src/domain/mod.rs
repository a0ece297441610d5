//! Domain types used throughout the pipeline.
//!
//! This module defines:
//!
//! - plate geometry and well labels (`WellId`, `PlateLayout`)
//! - raw and derived per-well series (`RawTable`, `WellSeries`, `ScaledSeries`)
//! - per-well results (`Landmarks`, `TcritResult`, `WellOutcome`, `FinalRecord`)
//! - run configuration (`AnalysisConfig`, `RawFormat`, `RunConfig`)

pub mod plate;
pub mod types;

pub use plate::*;
pub use types::*;
