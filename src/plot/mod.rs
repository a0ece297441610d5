//! Chart rendering for fitted wells.

pub mod png;

pub use png::*;
