//! # meshshot render
//!
//! Scene configuration and a software rasterizer for mesh screenshots.
//!
//! [`configure`] turns [`RenderSettings`](meshshot_core::RenderSettings) and a
//! loaded mesh into a [`RenderContext`]. [`render_frame`] draws that context
//! into an RGBA frame on the CPU, and [`save_screenshot`] writes it to disk.
//!
//! ```rust,no_run
//! use meshshot_core::{load_config, TriangleMesh};
//! use meshshot_render::{configure, save_screenshot, Capabilities};
//! use std::path::Path;
//!
//! fn example(mesh: TriangleMesh) -> meshshot_core::Result<()> {
//!     let settings = load_config(Some(Path::new("config/config.yaml")))?;
//!     let ctx = configure(&settings.render, mesh, &Capabilities::software());
//!     save_screenshot(&ctx, Path::new("fig/mesh.png"), 1, false)
//! }
//! ```

pub mod camera;
pub mod configure;
pub mod export;
pub mod lighting;
pub mod post;
pub mod raster;
pub mod scene;

pub use camera::Camera;
pub use configure::configure;
pub use export::{capture, frame_to_rgba8, save_screenshot, write_png};
pub use lighting::{light_kit, resolve_lights, Light, LightSource};
pub use raster::{background_color, render_frame, Frame};
pub use scene::{Capabilities, EdgeStyle, Effects, Material, MeshActor, PbrParams, RenderContext};
