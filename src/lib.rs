//! # meshshot
//!
//! Render mesh files to PNG screenshots from a YAML configuration.
//!
//! The pipeline runs once per invocation:
//! read config, load mesh, configure the view, then export or open the
//! interactive viewer. See [`driver::run`].

pub mod cli;
pub mod driver;
pub mod paths;

pub use cli::Cli;
pub use driver::{run, Outcome};
