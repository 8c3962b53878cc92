//! Core data structures, settings and configuration for meshshot
//!
//! This crate provides the mesh type shared by the loader and the renderer,
//! the normalized [`Settings`] tree, and the YAML configuration loader.

pub mod point;
pub mod mesh;
pub mod traits;
pub mod color;
pub mod settings;
pub mod config;
pub mod error;

pub use point::*;
pub use mesh::*;
pub use traits::*;
pub use color::Color;
pub use settings::*;
pub use config::load_config;
pub use error::*;

/// Re-export commonly used types from nalgebra
pub use nalgebra::{Point3, Vector3, Matrix4};

/// Common result type for meshshot operations
pub type Result<T> = std::result::Result<T, Error>;
