//! Light presets and surface shading

use crate::camera::Camera;
use crate::scene::Material;
use meshshot_core::{Color, LightSetting, LightingMode, Point3f, Vector3f};
use std::f32::consts::PI;

/// Where a light sits relative to the scene
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LightSource {
    /// Positioned at the camera, shining at the focal point
    Headlight,
    /// Fixed relative to the camera, angles in degrees
    CameraRelative { elevation: f32, azimuth: f32 },
    /// Fixed in the scene; the vector points from the scene towards the light
    Directional { towards_light: Vector3f },
}

/// A light in a configured scene
#[derive(Debug, Clone, PartialEq)]
pub struct Light {
    pub name: String,
    pub source: LightSource,
    pub color: Color,
    pub intensity: f32,
}

impl Light {
    pub fn headlight(intensity: f32) -> Self {
        Self {
            name: "head".to_string(),
            source: LightSource::Headlight,
            color: Color::WHITE,
            intensity,
        }
    }

    fn camera_relative(name: &str, elevation: f32, azimuth: f32, intensity: f32) -> Self {
        Self {
            name: name.to_string(),
            source: LightSource::CameraRelative { elevation, azimuth },
            color: Color::WHITE,
            intensity,
        }
    }

    /// A light from the `lighting` table, shining from its position towards
    /// the origin. Lights placed at the origin have no direction.
    pub fn from_setting(setting: &LightSetting) -> Option<Self> {
        let towards_light = Vector3f::from(setting.position).try_normalize(f32::EPSILON)?;
        Some(Self {
            name: setting.name.clone(),
            source: LightSource::Directional { towards_light },
            color: setting.color,
            intensity: setting.intensity,
        })
    }

    /// Unit vector from the scene towards the light for the current camera
    pub fn direction(&self, camera: &Camera) -> Vector3f {
        match self.source {
            LightSource::Headlight => camera.direction_to_camera(),
            LightSource::CameraRelative { elevation, azimuth } => {
                let (el, az) = (elevation.to_radians(), azimuth.to_radians());
                let back = camera.direction_to_camera();
                let v = camera.right() * (el.cos() * az.sin())
                    + camera.view_up * el.sin()
                    + back * (el.cos() * az.cos());
                v.try_normalize(f32::EPSILON).unwrap_or(back)
            }
            LightSource::Directional { towards_light } => towards_light,
        }
    }
}

/// Key, fill, two back lights and a head light, placed around the camera
pub fn light_kit() -> Vec<Light> {
    const KEY: f32 = 0.75;
    vec![
        Light::camera_relative("key", 50.0, 10.0, KEY),
        Light::camera_relative("fill", -75.0, -10.0, KEY / 3.0),
        Light::camera_relative("back left", 0.0, 110.0, KEY / 3.5),
        Light::camera_relative("back right", 0.0, -110.0, KEY / 3.5),
        Light::camera_relative("head", 0.0, 0.0, KEY / 3.0),
    ]
}

/// Resolve a lighting mode and the `lighting` table into scene lights.
///
/// An empty result means the mesh is drawn unlit.
pub fn resolve_lights(mode: LightingMode, table: &[LightSetting]) -> Vec<Light> {
    let table_lights: Vec<Light> = table
        .iter()
        .filter_map(|setting| {
            let light = Light::from_setting(setting);
            if light.is_none() {
                log::debug!("light '{}' sits at the origin, skipping", setting.name);
            }
            light
        })
        .collect();

    let mut lights = match mode {
        LightingMode::Default => vec![Light::headlight(1.0)],
        LightingMode::LightKit => light_kit(),
        LightingMode::Off => Vec::new(),
        LightingMode::Auto if table_lights.is_empty() => vec![Light::headlight(1.0)],
        LightingMode::Auto => Vec::new(),
    };
    lights.extend(table_lights);
    lights
}

/// Shade one surface point.
///
/// `normal` is flipped towards the viewer so both sides of a face are lit.
pub fn shade(
    material: &Material,
    lights: &[Light],
    camera: &Camera,
    position: Point3f,
    normal: Vector3f,
) -> Color {
    let albedo = material.albedo.to_array();
    if lights.is_empty() {
        return material.albedo;
    }

    let view = if camera.parallel_projection {
        camera.direction_to_camera()
    } else {
        (camera.position - position)
            .try_normalize(f32::EPSILON)
            .unwrap_or_else(|| camera.direction_to_camera())
    };
    let normal = match normal.try_normalize(f32::EPSILON) {
        Some(n) if n.dot(&view) < 0.0 => -n,
        Some(n) => n,
        None => view,
    };

    let mut rgb = [0.0f32; 3];
    for (channel, value) in rgb.iter_mut().zip(albedo) {
        *channel = material.ambient * value;
    }

    for light in lights {
        let l = light.direction(camera);
        let n_dot_l = normal.dot(&l);
        if n_dot_l <= 0.0 {
            continue;
        }
        let radiance = light.color.to_array().map(|c| c * light.intensity);
        let contribution = match &material.pbr {
            Some(pbr) => cook_torrance(albedo, pbr.metallic, pbr.roughness, normal, view, l),
            None => blinn_phong(material, albedo, normal, view, l),
        };
        for k in 0..3 {
            rgb[k] += contribution[k] * radiance[k] * n_dot_l;
        }
    }

    Color::new(rgb[0], rgb[1], rgb[2])
}

/// Diffuse and specular response, not yet scaled by `n·l`
fn blinn_phong(
    material: &Material,
    albedo: [f32; 3],
    normal: Vector3f,
    view: Vector3f,
    light: Vector3f,
) -> [f32; 3] {
    let half = (view + light).try_normalize(f32::EPSILON).unwrap_or(normal);
    let n_dot_l = normal.dot(&light).max(f32::EPSILON);
    let specular = if material.specular > 0.0 {
        material.specular * normal.dot(&half).max(0.0).powf(material.specular_power) / n_dot_l
    } else {
        0.0
    };
    albedo.map(|a| material.diffuse * a + specular)
}

/// Cook-Torrance BRDF with a GGX distribution, scaled so that a white
/// Lambertian surface facing a unit light returns white
fn cook_torrance(
    albedo: [f32; 3],
    metallic: f32,
    roughness: f32,
    normal: Vector3f,
    view: Vector3f,
    light: Vector3f,
) -> [f32; 3] {
    let metallic = metallic.clamp(0.0, 1.0);
    let roughness = roughness.clamp(0.04, 1.0);
    let half = (view + light).try_normalize(f32::EPSILON).unwrap_or(normal);

    let n_dot_v = normal.dot(&view).max(1e-4);
    let n_dot_l = normal.dot(&light).max(1e-4);
    let n_dot_h = normal.dot(&half).max(0.0);
    let h_dot_v = half.dot(&view).max(0.0);

    let a = roughness * roughness;
    let a2 = a * a;
    let d = a2 / (PI * (n_dot_h * n_dot_h * (a2 - 1.0) + 1.0).powi(2));

    let k = (roughness + 1.0).powi(2) / 8.0;
    let g = (n_dot_v / (n_dot_v * (1.0 - k) + k)) * (n_dot_l / (n_dot_l * (1.0 - k) + k));

    let fresnel_weight = (1.0 - h_dot_v).powi(5);
    let mut out = [0.0; 3];
    for (k_out, &base) in out.iter_mut().zip(albedo.iter()) {
        let f0 = 0.04 + (base - 0.04) * metallic;
        let f = f0 + (1.0 - f0) * fresnel_weight;
        let specular = d * g * f / (4.0 * n_dot_v * n_dot_l);
        let diffuse = (1.0 - f) * (1.0 - metallic) * base / PI;
        *k_out = (diffuse + specular) * PI;
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use meshshot_core::ViewPreset;

    fn setting(name: &str, position: [f32; 3]) -> LightSetting {
        LightSetting {
            name: name.to_string(),
            position,
            intensity: 0.5,
            color: Color::WHITE,
        }
    }

    #[test]
    fn test_lighting_mode_aliases_resolve_to_same_preset() {
        let a = resolve_lights(LightingMode::parse("LIGHT KIT"), &[]);
        let b = resolve_lights(LightingMode::parse("physically based"), &[]);
        assert_eq!(a, b);
        assert_eq!(a, light_kit());
        assert_eq!(a.len(), 5);
    }

    #[test]
    fn test_auto_uses_table_or_headlight() {
        assert_eq!(resolve_lights(LightingMode::Auto, &[]), vec![Light::headlight(1.0)]);

        let table = [setting("sun", [0.0, 0.0, 10.0])];
        let lights = resolve_lights(LightingMode::Auto, &table);
        assert_eq!(lights.len(), 1);
        assert_eq!(lights[0].source, LightSource::Directional { towards_light: Vector3f::z() });
    }

    #[test]
    fn test_explicit_mode_appends_table() {
        let table = [setting("sun", [0.0, 0.0, 10.0]), setting("nowhere", [0.0, 0.0, 0.0])];
        let lights = resolve_lights(LightingMode::LightKit, &table);
        assert_eq!(lights.len(), 6);
        assert_eq!(lights[5].name, "sun");

        assert!(resolve_lights(LightingMode::Off, &[]).is_empty());
        assert_eq!(resolve_lights(LightingMode::Off, &table).len(), 1);
    }

    #[test]
    fn test_headlight_follows_camera() {
        let camera = Camera::from_preset(ViewPreset::Xz, (Point3f::origin(), Point3f::new(1.0, 1.0, 1.0)));
        let light = Light::headlight(1.0);
        assert_relative_eq!(light.direction(&camera), -Vector3f::y(), epsilon = 1e-6);

        let key = &light_kit()[0];
        let up = key.direction(&camera).dot(&camera.view_up);
        assert!(up > 0.0, "key light sits above the camera");
    }

    #[test]
    fn test_face_on_headlight_gives_albedo() {
        let camera = Camera::from_preset(ViewPreset::Xy, (Point3f::origin(), Point3f::new(1.0, 1.0, 0.0)));
        let lights = vec![Light::headlight(1.0)];
        let material = Material {
            albedo: Color::new(0.2, 0.4, 0.6),
            ..Material::default()
        };

        let shaded = shade(&material, &lights, &camera, camera.focal_point, Vector3f::z());
        assert_relative_eq!(shaded.r, 0.2, epsilon = 1e-3);
        assert_relative_eq!(shaded.b, 0.6, epsilon = 1e-3);

        // Back faces are lit the same way
        let back = shade(&material, &lights, &camera, camera.focal_point, -Vector3f::z());
        assert_eq!(back, shaded);

        // No lights at all means flat albedo
        assert_eq!(shade(&material, &[], &camera, camera.focal_point, Vector3f::x()), material.albedo);
    }

    #[test]
    fn test_pbr_is_bounded_and_lit() {
        let camera = Camera::from_preset(ViewPreset::Xy, (Point3f::origin(), Point3f::new(1.0, 1.0, 0.0)));
        let material = Material {
            pbr: Some(crate::scene::PbrParams { metallic: 0.5, roughness: 0.5 }),
            ..Material::default()
        };
        let color = shade(&material, &[Light::headlight(1.0)], &camera, camera.focal_point, Vector3f::z());
        for c in color.to_array() {
            assert!(c > 0.2 && c.is_finite());
        }
    }
}
