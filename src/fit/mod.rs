//! Breakpoint fitting.
//!
//! Responsibilities:
//!
//! - cut the scaled series down to the window around T50
//! - fit the one-breakpoint segmented regression (Tcrit and its SE)

pub mod segmented;

pub use segmented::*;
