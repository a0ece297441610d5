//! Input/output helpers.
//!
//! - raw instrument file ingest (`ingest`)
//! - label table loading (`labels`)
//! - result table export (`export`)
//! - run summary JSON (`summary`)
//! - pending-file discovery and output naming (`discovery`)

pub mod discovery;
pub mod export;
pub mod ingest;
pub mod labels;
pub mod summary;

pub use discovery::*;
pub use export::*;
pub use ingest::*;
pub use labels::*;
pub use summary::*;
