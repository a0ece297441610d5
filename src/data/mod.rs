//! Data sources other than instrument files.

pub mod synthetic;

pub use synthetic::*;
