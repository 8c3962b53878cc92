//! Interactive preview for meshshot
//!
//! This crate opens a window showing a configured mesh and lets the user
//! move the camera and export screenshots:
//! - Frame presentation through wgpu
//! - Orbit, pan and zoom camera controls
//! - Keyboard export, reset and exit

pub mod interactive_viewer;
pub mod present;
pub mod shaders;

pub use interactive_viewer::{
    ExportHandler, Input, InteractiveViewer, PointerButton, ViewerAction, ViewerKey, ViewerState,
};
pub use present::{FramePresenter, PresentUniform};
