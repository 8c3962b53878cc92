//! The configured scene: mesh actor, material, effects and the render context

use crate::camera::Camera;
use crate::lighting::Light;
use meshshot_core::{
    AntiAliasing, Background, Bounds, Color, Drawable, MeshSettings, RenderSettings,
    SurfaceStyle, TriangleMesh, Vector3f,
};

/// Roughness and metallic, only present when physically based shading is on
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PbrParams {
    pub metallic: f32,
    pub roughness: f32,
}

/// Surface material.
///
/// Without `pbr` the surface is Blinn-Phong shaded from `ambient`, `diffuse`,
/// `specular` and `specular_power`.
#[derive(Debug, Clone, PartialEq)]
pub struct Material {
    pub albedo: Color,
    pub opacity: f32,
    pub ambient: f32,
    pub diffuse: f32,
    pub specular: f32,
    pub specular_power: f32,
    pub pbr: Option<PbrParams>,
}

impl Default for Material {
    fn default() -> Self {
        Self::from_settings(&MeshSettings::default())
    }
}

impl Material {
    pub fn from_settings(settings: &MeshSettings) -> Self {
        Self {
            albedo: settings.color,
            opacity: settings.opacity.clamp(0.0, 1.0),
            ambient: settings.ambient.max(0.0),
            diffuse: settings.diffuse.max(0.0),
            specular: settings.specular.max(0.0),
            specular_power: settings.specular_power.max(0.0),
            pbr: settings.pbr.then_some(PbrParams {
                metallic: settings.metallic,
                roughness: settings.roughness,
            }),
        }
    }
}

/// Line drawing for mesh edges
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EdgeStyle {
    pub color: Color,
    pub width: f32,
}

/// The mesh together with everything needed to draw it
#[derive(Debug, Clone)]
pub struct MeshActor {
    pub mesh: TriangleMesh,
    pub material: Material,
    pub style: SurfaceStyle,
    /// Per-vertex normals when smooth shading is on
    pub vertex_normals: Option<Vec<Vector3f>>,
    /// Flat normal of every face
    pub face_normals: Vec<Vector3f>,
    /// Edges drawn on top of the surface, or the lines of a wireframe
    pub edges: Option<EdgeStyle>,
    /// Unique edges as vertex index pairs
    pub edge_list: Vec<[usize; 2]>,
    bounds: Bounds,
}

impl MeshActor {
    pub fn new(mesh: TriangleMesh, settings: &MeshSettings) -> Self {
        let width = if settings.line_width.is_finite() && settings.line_width > 0.0 {
            settings.line_width
        } else {
            1.0
        };
        let edges = match settings.style {
            SurfaceStyle::Wireframe => Some(EdgeStyle { color: settings.color, width }),
            SurfaceStyle::Surface if settings.show_edges => Some(EdgeStyle {
                color: settings.edge_color,
                width,
            }),
            SurfaceStyle::Surface => None,
        };

        let vertex_normals = settings.smooth_shading.then(|| mesh.vertex_normals());
        let face_normals = mesh.calculate_face_normals();
        let edge_list = if edges.is_some() { unique_edges(&mesh) } else { Vec::new() };
        let bounds = mesh.bounding_box();

        Self {
            mesh,
            material: Material::from_settings(settings),
            style: settings.style,
            vertex_normals,
            face_normals,
            edges,
            edge_list,
            bounds,
        }
    }

    pub fn bounds(&self) -> Bounds {
        self.bounds
    }
}

fn unique_edges(mesh: &TriangleMesh) -> Vec<[usize; 2]> {
    let mut edges: Vec<[usize; 2]> = mesh
        .faces
        .iter()
        .flat_map(|f| [[f[0], f[1]], [f[1], f[2]], [f[2], f[0]]])
        .map(|[a, b]| if a < b { [a, b] } else { [b, a] })
        .collect();
    edges.sort_unstable();
    edges.dedup();
    edges
}

/// What a backend can draw
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Capabilities {
    pub supersampling: bool,
    pub fxaa: bool,
    pub eye_dome_lighting: bool,
    pub ssao: bool,
    pub depth_peeling: bool,
}

impl Capabilities {
    /// The software rasterizer in this crate
    pub fn software() -> Self {
        Self {
            supersampling: true,
            fxaa: true,
            eye_dome_lighting: true,
            ssao: false,
            depth_peeling: false,
        }
    }
}

impl Default for Capabilities {
    fn default() -> Self {
        Self::software()
    }
}

/// Post-processing and sampling options that survived capability checks
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Effects {
    /// Samples per pixel along each axis
    pub supersample: u32,
    pub fxaa: bool,
    pub eye_dome_lighting: bool,
}

impl Default for Effects {
    fn default() -> Self {
        Self {
            supersample: 1,
            fxaa: false,
            eye_dome_lighting: false,
        }
    }
}

impl Effects {
    /// Keep the requested effects the backend supports. Anything else is
    /// dropped with a debug message.
    pub fn negotiate(settings: &RenderSettings, caps: &Capabilities) -> Self {
        let mut effects = Effects::default();

        match settings.anti_aliasing {
            Some(AntiAliasing::Ssaa | AntiAliasing::Msaa) if caps.supersampling => {
                effects.supersample = 2;
            }
            Some(AntiAliasing::Fxaa) if caps.fxaa => effects.fxaa = true,
            Some(mode) => log::debug!("anti-aliasing {:?} is not supported, skipping", mode),
            None => {}
        }

        if settings.quality.fxaa {
            if caps.fxaa {
                effects.fxaa = true;
            } else {
                log::debug!("FXAA is not supported, skipping");
            }
        }
        if settings.quality.ssao && !caps.ssao {
            log::debug!("SSAO is not supported, skipping");
        }
        if settings.quality.depth_peeling && !caps.depth_peeling {
            log::debug!("depth peeling is not supported, skipping");
        }

        if settings.eye_dome_lighting {
            if caps.eye_dome_lighting {
                effects.eye_dome_lighting = true;
            } else {
                log::debug!("eye-dome lighting is not supported, skipping");
            }
        }

        effects
    }
}

/// The configured view: everything a backend needs to draw a frame
#[derive(Debug, Clone)]
pub struct RenderContext {
    pub size: [u32; 2],
    pub background: Background,
    pub transparent_background: bool,
    /// Empty when lighting is off
    pub lights: Vec<Light>,
    pub camera: Camera,
    /// The camera as configured, restored on reset
    pub home_camera: Camera,
    pub actor: MeshActor,
    pub effects: Effects,
    pub show_axes: bool,
}

impl RenderContext {
    /// Put the camera back where configuration placed it
    pub fn reset_camera(&mut self) {
        self.camera = self.home_camera.clone();
    }
}
