//! Normalized render settings
//!
//! [`Settings`] is built from a parsed YAML tree. Every recognised key ends up
//! with a value: either the document's, or the default documented on the
//! field. Extraction is lenient per key: a value of the wrong shape is logged
//! at `debug` and replaced by the default, unknown keys are ignored.

use crate::color::Color;
use serde::de::DeserializeOwned;
use serde_yaml::{Mapping, Value};
use std::path::{Path, PathBuf};

pub const DEFAULT_TIMESTAMP_FORMAT: &str = "%Y%m%d-%H%M%S";
pub const DEFAULT_WINDOW_SIZE: [u32; 2] = [1024, 768];
pub const DEFAULT_BACKGROUND: Color = Color::new(0.3, 0.3, 0.3);
pub const DEFAULT_EDGE_COLOR: Color = Color::new(0.4, 0.4, 0.4);
pub const DEFAULT_EXPORT_SUFFIX: &str = ".png";

/// Top-level settings for one run
#[derive(Debug, Clone, PartialEq)]
pub struct Settings {
    /// Mesh to render. `None` until the CLI or the document names one.
    pub mesh_path: Option<PathBuf>,
    /// Static export target. `None` means `fig/<mesh-stem>.png`.
    pub output_path: Option<PathBuf>,
    /// `chrono` strftime pattern for export suffixes
    pub timestamp_format: String,
    /// Whether static exports get a `_<timestamp>` stem suffix
    pub append_timestamp: bool,
    /// Fallback directory for interactive exports
    pub export_directory: Option<PathBuf>,
    pub render: RenderSettings,
    /// Directory of the loaded config file; relative paths resolve against it
    pub config_dir: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            mesh_path: None,
            output_path: None,
            timestamp_format: DEFAULT_TIMESTAMP_FORMAT.to_string(),
            append_timestamp: true,
            export_directory: None,
            render: RenderSettings::default(),
            config_dir: None,
        }
    }
}

/// The `render` table
#[derive(Debug, Clone, PartialEq)]
pub struct RenderSettings {
    pub window_size: [u32; 2],
    pub window_title: Option<String>,
    pub image_scale: u32,
    pub transparent_background: bool,
    pub background: Background,
    pub lighting_mode: LightingMode,
    pub lights: Vec<LightSetting>,
    pub camera: CameraSetting,
    pub camera_zoom: f32,
    pub parallel_projection: bool,
    pub eye_dome_lighting: bool,
    pub anti_aliasing: Option<AntiAliasing>,
    pub quality: QualitySettings,
    pub show_axes: bool,
    pub mesh: MeshSettings,
    pub export: ExportSettings,
}

impl Default for RenderSettings {
    fn default() -> Self {
        Self {
            window_size: DEFAULT_WINDOW_SIZE,
            window_title: None,
            image_scale: 1,
            transparent_background: false,
            background: Background::default(),
            lighting_mode: LightingMode::Auto,
            lights: Vec::new(),
            camera: CameraSetting::default(),
            camera_zoom: 1.0,
            parallel_projection: false,
            eye_dome_lighting: false,
            anti_aliasing: None,
            quality: QualitySettings::default(),
            show_axes: false,
            mesh: MeshSettings::default(),
            export: ExportSettings::default(),
        }
    }
}

/// Viewport background
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Background {
    Flat(Color),
    /// Vertical gradient, `bottom` at the bottom row
    Gradient { bottom: Color, top: Color },
}

impl Default for Background {
    fn default() -> Self {
        Background::Flat(DEFAULT_BACKGROUND)
    }
}

/// Lighting preset selected by `render.lighting_mode`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LightingMode {
    /// A single head light attached to the camera
    Default,
    /// Key, fill, back and head lights
    LightKit,
    /// No lights; the mesh is drawn unlit
    Off,
    /// Absent or unrecognised: the `lighting` table if it has entries, else `Default`
    Auto,
}

impl LightingMode {
    pub fn parse(mode: &str) -> Self {
        match mode.trim().to_lowercase().as_str() {
            "default" | "on" | "true" => LightingMode::Default,
            "light kit" | "light_kit" | "lightkit" | "kit" | "physically based"
            | "physically_based" => LightingMode::LightKit,
            "off" | "false" | "none" => LightingMode::Off,
            other => {
                log::debug!("unrecognised lighting mode '{}', using automatic lighting", other);
                LightingMode::Auto
            }
        }
    }

    fn from_value(value: &Value) -> Self {
        match value {
            Value::Bool(true) => LightingMode::Default,
            Value::Bool(false) => LightingMode::Off,
            Value::String(mode) => LightingMode::parse(mode),
            _ => LightingMode::Auto,
        }
    }
}

/// One entry of the `render.lighting` table
#[derive(Debug, Clone, PartialEq)]
pub struct LightSetting {
    pub name: String,
    pub position: [f32; 3],
    pub intensity: f32,
    pub color: Color,
}

/// Named camera directions, as accepted by `camera_position: <name>`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ViewPreset {
    Iso,
    Xy,
    Xz,
    Yz,
    Yx,
    Zx,
    Zy,
}

impl ViewPreset {
    pub fn parse(name: &str) -> Option<Self> {
        match name.trim().to_lowercase().as_str() {
            "iso" | "isometric" => Some(ViewPreset::Iso),
            "xy" => Some(ViewPreset::Xy),
            "xz" => Some(ViewPreset::Xz),
            "yz" => Some(ViewPreset::Yz),
            "yx" => Some(ViewPreset::Yx),
            "zx" => Some(ViewPreset::Zx),
            "zy" => Some(ViewPreset::Zy),
            _ => None,
        }
    }
}

/// Focal point of an explicit camera
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FocalPoint {
    Point([f32; 3]),
    /// `center`, `centre` or `auto`: the mesh bounding-box center
    MeshCenter,
}

/// Camera placement
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum CameraSetting {
    /// Look along a preset direction and fit the mesh
    View(ViewPreset),
    Explicit {
        position: [f32; 3],
        focal_point: FocalPoint,
        up: [f32; 3],
    },
}

impl Default for CameraSetting {
    fn default() -> Self {
        CameraSetting::View(ViewPreset::Iso)
    }
}

impl CameraSetting {
    /// Anything malformed falls back to the isometric view
    fn from_value(value: &Value) -> Self {
        match value {
            Value::String(name) => ViewPreset::parse(name)
                .map(CameraSetting::View)
                .unwrap_or_else(|| {
                    log::debug!("unknown camera preset '{}', using isometric view", name);
                    CameraSetting::default()
                }),
            Value::Sequence(items) => Self::explicit(items).unwrap_or_else(|| {
                log::debug!("malformed camera_position {:?}, using isometric view", items);
                CameraSetting::default()
            }),
            _ => CameraSetting::default(),
        }
    }

    fn explicit(items: &[Value]) -> Option<Self> {
        let [position, focal_point, up] = items else {
            return None;
        };
        let focal_point = match focal_point {
            Value::String(name)
                if matches!(name.trim().to_lowercase().as_str(), "center" | "centre" | "auto") =>
            {
                FocalPoint::MeshCenter
            }
            other => FocalPoint::Point(vec3(other)?),
        };
        Some(CameraSetting::Explicit {
            position: vec3(position)?,
            focal_point,
            up: vec3(up)?,
        })
    }
}

/// Anti-aliasing requested through `render.anti_aliasing`
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AntiAliasing {
    Ssaa,
    Msaa,
    Fxaa,
}

impl AntiAliasing {
    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(true) => Some(AntiAliasing::Ssaa),
            Value::String(mode) => match mode.trim().to_lowercase().as_str() {
                "ssaa" => Some(AntiAliasing::Ssaa),
                "msaa" => Some(AntiAliasing::Msaa),
                "fxaa" => Some(AntiAliasing::Fxaa),
                other => {
                    log::debug!("unknown anti_aliasing mode '{}', ignoring", other);
                    None
                }
            },
            _ => None,
        }
    }
}

/// The `render.quality` table
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct QualitySettings {
    pub ssao: bool,
    pub depth_peeling: bool,
    pub fxaa: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SurfaceStyle {
    #[default]
    Surface,
    Wireframe,
}

/// The `render.mesh` table: material and display options for the mesh
#[derive(Debug, Clone, PartialEq)]
pub struct MeshSettings {
    pub color: Color,
    pub show_edges: bool,
    pub edge_color: Color,
    pub line_width: f32,
    pub smooth_shading: bool,
    pub style: SurfaceStyle,
    pub opacity: f32,
    pub ambient: f32,
    pub diffuse: f32,
    pub specular: f32,
    pub specular_power: f32,
    /// Roughness and metallic are only read when this is on
    pub pbr: bool,
    pub metallic: f32,
    pub roughness: f32,
}

impl Default for MeshSettings {
    fn default() -> Self {
        Self {
            color: Color::WHITE,
            show_edges: true,
            edge_color: DEFAULT_EDGE_COLOR,
            line_width: 1.0,
            smooth_shading: true,
            style: SurfaceStyle::Surface,
            opacity: 1.0,
            ambient: 0.0,
            diffuse: 1.0,
            specular: 0.0,
            specular_power: 100.0,
            pbr: false,
            metallic: 0.0,
            roughness: 0.5,
        }
    }
}

/// The `render.export` table, used by on-demand exports
#[derive(Debug, Clone, PartialEq, Default)]
pub struct ExportSettings {
    pub output_path: Option<PathBuf>,
    pub directory: Option<PathBuf>,
    pub filename: Option<String>,
    pub suffix: Option<String>,
    pub image_scale: Option<u32>,
    pub transparent_background: Option<bool>,
}

impl Settings {
    /// Build settings from a YAML mapping. Never fails.
    pub fn from_mapping(root: &Mapping) -> Self {
        let defaults = Settings::default();
        let fields = Fields::new(Some(root), "");

        let render = match root.get("render") {
            Some(Value::Mapping(render)) => RenderSettings::from_mapping(render),
            _ => RenderSettings::default(),
        };

        Self {
            mesh_path: fields.get("mesh_path"),
            output_path: fields.get("output_path"),
            timestamp_format: fields
                .get::<String>("timestamp_format")
                .filter(|format| !format.is_empty())
                .unwrap_or(defaults.timestamp_format),
            append_timestamp: fields.get("append_timestamp").unwrap_or(defaults.append_timestamp),
            export_directory: fields.get("export_directory"),
            render,
            config_dir: None,
        }
    }

    /// Resolve a path from the document: absolute paths stay, relative ones
    /// are joined onto the config file's directory
    pub fn resolve_path(&self, path: &Path) -> PathBuf {
        match &self.config_dir {
            Some(dir) if path.is_relative() => dir.join(path),
            _ => path.to_path_buf(),
        }
    }
}

impl RenderSettings {
    pub fn from_mapping(render: &Mapping) -> Self {
        let defaults = RenderSettings::default();
        let fields = Fields::new(Some(render), "render.");

        let window_size = fields
            .get::<[u32; 2]>("window_size")
            .filter(|[w, h]| *w > 0 && *h > 0)
            .unwrap_or(defaults.window_size);

        let image_scale = fields
            .get::<f64>("image_scale")
            .map(scale_factor)
            .unwrap_or(defaults.image_scale);

        let camera_zoom = fields
            .get::<f32>("camera_zoom")
            .filter(|zoom| zoom.is_finite() && *zoom > 0.0)
            .unwrap_or(defaults.camera_zoom);

        let show_axes = match render.get("axes") {
            Some(Value::Bool(enabled)) => *enabled,
            Some(Value::Mapping(axes)) => Fields::new(Some(axes), "render.axes.")
                .get("enabled")
                .unwrap_or(false),
            _ => false,
        };

        Self {
            window_size,
            window_title: fields.get("window_title"),
            image_scale,
            transparent_background: fields
                .get("transparent_background")
                .unwrap_or(defaults.transparent_background),
            background: render
                .get("background")
                .map(background_from_value)
                .unwrap_or(defaults.background),
            lighting_mode: render
                .get("lighting_mode")
                .map(LightingMode::from_value)
                .unwrap_or(defaults.lighting_mode),
            lights: render.get("lighting").map(lights_from_value).unwrap_or_default(),
            camera: render
                .get("camera_position")
                .map(CameraSetting::from_value)
                .unwrap_or(defaults.camera),
            camera_zoom,
            parallel_projection: fields
                .get("parallel_projection")
                .unwrap_or(defaults.parallel_projection),
            eye_dome_lighting: fields
                .get("eye_dome_lighting")
                .unwrap_or(defaults.eye_dome_lighting),
            anti_aliasing: render.get("anti_aliasing").and_then(AntiAliasing::from_value),
            quality: match render.get("quality") {
                Some(Value::Mapping(quality)) => QualitySettings::from_mapping(quality),
                _ => defaults.quality,
            },
            show_axes,
            mesh: match render.get("mesh") {
                Some(Value::Mapping(mesh)) => MeshSettings::from_mapping(mesh),
                _ => defaults.mesh,
            },
            export: match render.get("export") {
                Some(Value::Mapping(export)) => ExportSettings::from_mapping(export),
                _ => defaults.export,
            },
        }
    }
}

impl QualitySettings {
    fn from_mapping(quality: &Mapping) -> Self {
        let fields = Fields::new(Some(quality), "render.quality.");
        Self {
            ssao: fields.get("ssao").unwrap_or(false),
            depth_peeling: fields.get("depth_peeling").unwrap_or(false),
            fxaa: fields.get("fxaa").unwrap_or(false),
        }
    }
}

impl MeshSettings {
    fn from_mapping(mesh: &Mapping) -> Self {
        let d = MeshSettings::default();
        let fields = Fields::new(Some(mesh), "render.mesh.");
        let unit = |key: &str, default: f32| {
            fields
                .get::<f32>(key)
                .filter(|v| (0.0..=1.0).contains(v))
                .unwrap_or(default)
        };

        let style = match fields.get::<String>("style").as_deref().map(str::trim) {
            Some(s) if s.eq_ignore_ascii_case("wireframe") => SurfaceStyle::Wireframe,
            _ => SurfaceStyle::Surface,
        };

        Self {
            color: fields.get("color").unwrap_or(d.color),
            show_edges: fields.get("show_edges").unwrap_or(d.show_edges),
            edge_color: fields.get("edge_color").unwrap_or(d.edge_color),
            line_width: fields
                .get::<f32>("line_width")
                .filter(|w| w.is_finite() && *w > 0.0)
                .unwrap_or(d.line_width),
            smooth_shading: fields.get("smooth_shading").unwrap_or(d.smooth_shading),
            style,
            opacity: unit("opacity", d.opacity),
            ambient: unit("ambient", d.ambient),
            diffuse: unit("diffuse", d.diffuse),
            specular: unit("specular", d.specular),
            specular_power: fields
                .get::<f32>("specular_power")
                .filter(|p| p.is_finite() && *p >= 0.0)
                .unwrap_or(d.specular_power),
            pbr: fields.get("pbr").unwrap_or(d.pbr),
            metallic: unit("metallic", d.metallic),
            roughness: unit("roughness", d.roughness),
        }
    }
}

impl ExportSettings {
    fn from_mapping(export: &Mapping) -> Self {
        let fields = Fields::new(Some(export), "render.export.");
        Self {
            output_path: fields.get("output_path"),
            directory: fields.get("directory"),
            filename: fields.get("filename"),
            suffix: fields.get("suffix"),
            image_scale: fields.get::<f64>("image_scale").map(scale_factor),
            transparent_background: fields.get("transparent_background"),
        }
    }
}

/// Lenient typed access to one YAML mapping
struct Fields<'a> {
    map: Option<&'a Mapping>,
    scope: &'static str,
}

impl<'a> Fields<'a> {
    fn new(map: Option<&'a Mapping>, scope: &'static str) -> Self {
        Self { map, scope }
    }

    /// `None` when the key is absent, null, or of the wrong shape
    fn get<T: DeserializeOwned>(&self, key: &str) -> Option<T> {
        let value = self.map?.get(key)?;
        if value.is_null() {
            return None;
        }
        match serde_yaml::from_value(value.clone()) {
            Ok(parsed) => Some(parsed),
            Err(e) => {
                log::debug!("ignoring {}{}: {}", self.scope, key, e);
                None
            }
        }
    }
}

/// Image scale factors are whole numbers, at least 1
fn scale_factor(raw: f64) -> u32 {
    if raw.is_finite() && raw >= 1.0 {
        raw.min(u32::MAX as f64) as u32
    } else {
        1
    }
}

fn vec3(value: &Value) -> Option<[f32; 3]> {
    let parsed: [f32; 3] = serde_yaml::from_value(value.clone()).ok()?;
    parsed.iter().all(|c| c.is_finite()).then_some(parsed)
}

fn color(value: Option<&Value>) -> Option<Color> {
    let value = value?;
    serde_yaml::from_value(value.clone())
        .map_err(|e| log::debug!("ignoring color {:?}: {}", value, e))
        .ok()
}

fn background_from_value(value: &Value) -> Background {
    let Value::Mapping(background) = value else {
        return Background::default();
    };
    match (color(background.get("bottom")), color(background.get("top"))) {
        (Some(bottom), Some(top)) => Background::Gradient { bottom, top },
        (Some(bottom), None) => Background::Flat(bottom),
        _ => Background::default(),
    }
}

fn lights_from_value(value: &Value) -> Vec<LightSetting> {
    let Value::Mapping(table) = value else {
        return Vec::new();
    };

    table
        .iter()
        .filter_map(|(name, entry)| {
            let name = match name {
                Value::String(name) => name.clone(),
                other => serde_yaml::to_string(other).unwrap_or_default().trim().to_string(),
            };
            let Value::Mapping(entry) = entry else {
                log::debug!("light '{}' is not a table, skipping", name);
                return None;
            };
            let Some(position) = entry.get("position").and_then(vec3) else {
                log::debug!("light '{}' has no usable position, skipping", name);
                return None;
            };
            let fields = Fields::new(Some(entry), "render.lighting.");
            Some(LightSetting {
                name,
                position,
                intensity: fields
                    .get::<f32>("intensity")
                    .filter(|i| i.is_finite() && *i >= 0.0)
                    .unwrap_or(1.0),
                color: color(entry.get("color")).unwrap_or(Color::WHITE),
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render_from(yaml: &str) -> RenderSettings {
        let value: Value = serde_yaml::from_str(yaml).unwrap();
        match value {
            Value::Mapping(map) => RenderSettings::from_mapping(&map),
            _ => panic!("test document must be a mapping"),
        }
    }

    #[test]
    fn test_lighting_mode_is_case_insensitive() {
        assert_eq!(LightingMode::parse("LIGHT KIT"), LightingMode::LightKit);
        assert_eq!(LightingMode::parse("physically based"), LightingMode::LightKit);
        assert_eq!(LightingMode::parse("  On "), LightingMode::Default);
        assert_eq!(LightingMode::parse("NONE"), LightingMode::Off);
        assert_eq!(LightingMode::parse("spotlights"), LightingMode::Auto);
    }

    #[test]
    fn test_boolean_lighting_mode() {
        assert_eq!(render_from("lighting_mode: false").lighting_mode, LightingMode::Off);
        assert_eq!(render_from("lighting_mode: true").lighting_mode, LightingMode::Default);
        assert_eq!(render_from("lighting_mode: 3").lighting_mode, LightingMode::Auto);
    }

    #[test]
    fn test_background_flat_and_gradient() {
        let flat = render_from("background: {bottom: '#000000'}");
        assert_eq!(flat.background, Background::Flat(Color::BLACK));

        let gradient = render_from("background: {bottom: '#000000', top: '#ffffff'}");
        assert_eq!(
            gradient.background,
            Background::Gradient { bottom: Color::BLACK, top: Color::WHITE }
        );

        let top_only = render_from("background: {top: '#ffffff'}");
        assert_eq!(top_only.background, Background::default());
    }

    #[test]
    fn test_camera_position_shapes() {
        let explicit = render_from("camera_position: [[1, 2, 3], center, [0, 0, 1]]");
        assert_eq!(
            explicit.camera,
            CameraSetting::Explicit {
                position: [1.0, 2.0, 3.0],
                focal_point: FocalPoint::MeshCenter,
                up: [0.0, 0.0, 1.0],
            }
        );

        let two = render_from("camera_position: [[1, 2, 3], [0, 0, 0]]");
        assert_eq!(two.camera, CameraSetting::View(ViewPreset::Iso));

        let non_numeric = render_from("camera_position: [[1, x, 3], [0, 0, 0], [0, 0, 1]]");
        assert_eq!(non_numeric.camera, CameraSetting::View(ViewPreset::Iso));

        let preset = render_from("camera_position: XY");
        assert_eq!(preset.camera, CameraSetting::View(ViewPreset::Xy));
    }

    #[test]
    fn test_lighting_table_skips_entries_without_position() {
        let render = render_from(
            r#"
lighting:
  key:
    position: [10, 10, 10]
    intensity: 0.8
    color: '#ff0000'
  broken:
    intensity: 2.0
  fill:
    position: [-5, 0, 2]
"#,
        );
        assert_eq!(render.lights.len(), 2);
        assert_eq!(render.lights[0].name, "key");
        assert_eq!(render.lights[0].intensity, 0.8);
        assert_eq!(render.lights[0].color, Color::new(1.0, 0.0, 0.0));
        assert_eq!(render.lights[1].name, "fill");
        assert_eq!(render.lights[1].intensity, 1.0);
        assert_eq!(render.lights[1].color, Color::WHITE);
    }

    #[test]
    fn test_bad_fields_fall_back_individually() {
        let render = render_from(
            r#"
window_size: [800, "tall"]
image_scale: 0
camera_zoom: -2
mesh:
  color: not-a-color
  roughness: 3.0
  show_edges: false
"#,
        );
        assert_eq!(render.window_size, DEFAULT_WINDOW_SIZE);
        assert_eq!(render.image_scale, 1);
        assert_eq!(render.camera_zoom, 1.0);
        assert_eq!(render.mesh.color, Color::WHITE);
        assert_eq!(render.mesh.roughness, 0.5);
        assert!(!render.mesh.show_edges);
    }

    #[test]
    fn test_axes_and_anti_aliasing_forms() {
        assert!(render_from("axes: true").show_axes);
        assert!(render_from("axes: {enabled: true}").show_axes);
        assert!(!render_from("axes: {enabled: false}").show_axes);
        assert_eq!(render_from("anti_aliasing: MSAA").anti_aliasing, Some(AntiAliasing::Msaa));
        assert_eq!(render_from("anti_aliasing: true").anti_aliasing, Some(AntiAliasing::Ssaa));
        assert_eq!(render_from("anti_aliasing: bogus").anti_aliasing, None);
    }

    #[test]
    fn test_resolve_path_against_config_dir() {
        let settings = Settings {
            config_dir: Some(PathBuf::from("/etc/meshshot")),
            ..Settings::default()
        };
        assert_eq!(
            settings.resolve_path(Path::new("mesh/part.stl")),
            PathBuf::from("/etc/meshshot/mesh/part.stl")
        );
        assert_eq!(settings.resolve_path(Path::new("/tmp/a.stl")), PathBuf::from("/tmp/a.stl"));
    }
}
