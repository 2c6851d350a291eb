//! Usage-report plumbing for blob containers.
//!
//! Two entry points: [`trigger::handle_blob_created`] splits a freshly arrived usage export
//! into one file per meter, and [`pipeline::compute_report`] builds a client's consolidated
//! monthly cost report out of the official and daily exports.

pub mod app;
pub mod calculation;
pub mod cli;
pub mod config;
pub mod display;
pub mod error;
pub mod io;
pub mod pipeline;
pub mod prelude;
pub mod router;
pub mod trigger;

pub use error::Error;
pub use prelude::AppResult;
