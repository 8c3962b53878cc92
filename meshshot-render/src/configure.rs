//! Turn render settings and a loaded mesh into a [`RenderContext`]

use crate::camera::Camera;
use crate::lighting::resolve_lights;
use crate::scene::{Capabilities, Effects, MeshActor, RenderContext};
use meshshot_core::{
    Bounds, CameraSetting, FocalPoint, Point3f, RenderSettings, TriangleMesh, Vector3f,
    ViewPreset,
};

/// Build the scene for `mesh`. Never fails: anything that cannot be applied
/// falls back to its default.
pub fn configure(settings: &RenderSettings, mesh: TriangleMesh, caps: &Capabilities) -> RenderContext {
    let actor = MeshActor::new(mesh, &settings.mesh);
    let bounds = actor.bounds();

    let mut camera = place_camera(&settings.camera, bounds);
    camera.parallel_projection = settings.parallel_projection;
    if settings.camera_zoom != 1.0 {
        camera.zoom(settings.camera_zoom);
    }

    let lights = resolve_lights(settings.lighting_mode, &settings.lights);
    let effects = Effects::negotiate(settings, caps);

    log::debug!(
        "Configured {:?} lighting with {} lights, effects {:?}",
        settings.lighting_mode,
        lights.len(),
        effects
    );

    RenderContext {
        size: [settings.window_size[0].max(1), settings.window_size[1].max(1)],
        background: settings.background,
        transparent_background: settings.transparent_background,
        lights,
        home_camera: camera.clone(),
        camera,
        actor,
        effects,
        show_axes: settings.show_axes,
    }
}

fn place_camera(setting: &CameraSetting, bounds: Bounds) -> Camera {
    match *setting {
        CameraSetting::View(preset) => Camera::from_preset(preset, bounds),
        CameraSetting::Explicit { position, focal_point, up } => {
            let focal_point = match focal_point {
                FocalPoint::Point(p) => Point3f::from(p),
                FocalPoint::MeshCenter => Point3f::from((bounds.0.coords + bounds.1.coords) / 2.0),
            };
            Camera::look_at(Point3f::from(position), focal_point, Vector3f::from(up))
                .unwrap_or_else(|| {
                    log::debug!("degenerate camera_position, using isometric view");
                    Camera::from_preset(ViewPreset::Iso, bounds)
                })
        }
    }
}
