//! Scene camera with perspective and parallel projection

use meshshot_core::{Bounds, Point3f, Vector3f, ViewPreset};
use nalgebra::{Matrix4, Rotation3, Unit};

/// Vertical view angle of a fresh camera, in degrees
pub const DEFAULT_VIEW_ANGLE: f32 = 30.0;

/// A camera looking at a focal point.
///
/// The view angle is vertical and in degrees. `parallel_scale` is half the
/// height of the viewport in world units when parallel projection is on.
#[derive(Debug, Clone, PartialEq)]
pub struct Camera {
    pub position: Point3f,
    pub focal_point: Point3f,
    pub view_up: Vector3f,
    pub view_angle: f32,
    pub parallel_scale: f32,
    pub parallel_projection: bool,
}

impl Camera {
    /// Place a camera explicitly. Returns `None` when the position coincides
    /// with the focal point or `up` is zero or parallel to the view direction.
    pub fn look_at(position: Point3f, focal_point: Point3f, up: Vector3f) -> Option<Self> {
        let offset = position - focal_point;
        if !offset.iter().chain(up.iter()).all(|v| v.is_finite()) {
            return None;
        }
        let direction = offset.try_normalize(f32::EPSILON)?;
        let up = up.try_normalize(f32::EPSILON)?;
        // Orthogonalize the up vector against the view direction
        let view_up = (up - direction * up.dot(&direction)).try_normalize(1e-4)?;

        Some(Self {
            position,
            focal_point,
            view_up,
            view_angle: DEFAULT_VIEW_ANGLE,
            parallel_scale: offset.norm() * (DEFAULT_VIEW_ANGLE.to_radians() / 2.0).tan(),
            parallel_projection: false,
        })
    }

    /// Look along a preset direction and fit `bounds` into the view
    pub fn from_preset(preset: ViewPreset, bounds: Bounds) -> Self {
        let (towards_camera, up) = preset_direction(preset);
        let mut camera = Self {
            position: Point3f::from(towards_camera),
            focal_point: Point3f::origin(),
            view_up: up,
            view_angle: DEFAULT_VIEW_ANGLE,
            parallel_scale: 1.0,
            parallel_projection: false,
        };
        camera.reset_to_bounds(bounds);
        camera
    }

    /// Unit vector from the focal point towards the camera
    pub fn direction_to_camera(&self) -> Vector3f {
        (self.position - self.focal_point)
            .try_normalize(f32::EPSILON)
            .unwrap_or_else(Vector3f::z)
    }

    /// Unit vector pointing to the right of the view
    pub fn right(&self) -> Vector3f {
        (-self.direction_to_camera())
            .cross(&self.view_up)
            .try_normalize(f32::EPSILON)
            .unwrap_or_else(Vector3f::x)
    }

    pub fn distance(&self) -> f32 {
        (self.position - self.focal_point).norm()
    }

    /// Keep the view direction, center on `bounds` and back off until the
    /// bounding sphere fills the view angle
    pub fn reset_to_bounds(&mut self, bounds: Bounds) {
        let (min, max) = bounds;
        let center = Point3f::from((min.coords + max.coords) / 2.0);
        let mut radius = (max - min).norm() / 2.0;
        if radius <= f32::EPSILON {
            radius = 0.5;
        }

        let direction = self.direction_to_camera();
        let distance = radius / (self.view_angle.to_radians() / 2.0).sin();
        self.focal_point = center;
        self.position = center + direction * distance;
        self.parallel_scale = radius;
    }

    /// Magnify the view by `factor`; values above one move in
    pub fn zoom(&mut self, factor: f32) {
        if !(factor.is_finite() && factor > 0.0) {
            return;
        }
        if self.parallel_projection {
            self.parallel_scale /= factor;
        } else {
            self.view_angle = (self.view_angle / factor).clamp(0.01, 179.0);
        }
    }

    /// Rotate the camera around the focal point, angles in degrees.
    ///
    /// Azimuth turns about the view-up vector, elevation about the view's
    /// right axis.
    pub fn orbit(&mut self, azimuth: f32, elevation: f32) {
        let up = Unit::new_normalize(self.view_up);
        let azimuth_rotation = Rotation3::from_axis_angle(&up, -azimuth.to_radians());
        let offset = azimuth_rotation * (self.position - self.focal_point);
        self.position = self.focal_point + offset;

        let right = Unit::new_normalize(self.right());
        let elevation_rotation = Rotation3::from_axis_angle(&right, -elevation.to_radians());
        let offset = elevation_rotation * (self.position - self.focal_point);
        let view_up = elevation_rotation * self.view_up;

        // Refuse to flip over the pole
        if offset.try_normalize(f32::EPSILON).map_or(false, |d| d.dot(&view_up).abs() < 0.999) {
            self.position = self.focal_point + offset;
            self.view_up = view_up.normalize();
        }
    }

    /// Move camera and focal point together within the view plane
    pub fn pan(&mut self, right: f32, up: f32) {
        let shift = self.right() * right + self.view_up * up;
        self.position += shift;
        self.focal_point += shift;
    }

    /// World-space height of the view at the focal point
    pub fn view_height(&self) -> f32 {
        if self.parallel_projection {
            self.parallel_scale * 2.0
        } else {
            2.0 * self.distance() * (self.view_angle.to_radians() / 2.0).tan()
        }
    }

    /// Get the view matrix
    pub fn view_matrix(&self) -> Matrix4<f32> {
        Matrix4::look_at_rh(&self.position, &self.focal_point, &self.view_up)
    }

    /// Get the projection matrix for an aspect ratio and clipping range
    pub fn projection_matrix(&self, aspect: f32, (near, far): (f32, f32)) -> Matrix4<f32> {
        if self.parallel_projection {
            let half_height = self.parallel_scale;
            let half_width = half_height * aspect;
            Matrix4::new_orthographic(-half_width, half_width, -half_height, half_height, near, far)
        } else {
            Matrix4::new_perspective(aspect, self.view_angle.to_radians(), near, far)
        }
    }

    /// Near and far planes that enclose a sphere around `center`
    pub fn clipping_range(&self, center: Point3f, radius: f32) -> (f32, f32) {
        let forward = -self.direction_to_camera();
        let depth = (center - self.position).dot(&forward);
        let radius = radius.max(f32::EPSILON) * 1.01;

        let far = (depth + radius).max(1e-3);
        let near = (depth - radius).max(far * 1e-3);
        (near, far)
    }
}

impl Default for Camera {
    fn default() -> Self {
        Self::from_preset(ViewPreset::Iso, (Point3f::new(-0.5, -0.5, -0.5), Point3f::new(0.5, 0.5, 0.5)))
    }
}

/// Direction from the focal point to the camera, and the up vector
fn preset_direction(preset: ViewPreset) -> (Vector3f, Vector3f) {
    match preset {
        ViewPreset::Iso => (Vector3f::new(1.0, 1.0, 1.0).normalize(), Vector3f::z()),
        ViewPreset::Xy => (Vector3f::z(), Vector3f::y()),
        ViewPreset::Yx => (-Vector3f::z(), Vector3f::x()),
        ViewPreset::Xz => (-Vector3f::y(), Vector3f::z()),
        ViewPreset::Zx => (Vector3f::y(), Vector3f::x()),
        ViewPreset::Yz => (Vector3f::x(), Vector3f::z()),
        ViewPreset::Zy => (-Vector3f::x(), Vector3f::y()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_cube() -> Bounds {
        (Point3f::new(0.0, 0.0, 0.0), Point3f::new(1.0, 1.0, 1.0))
    }

    #[test]
    fn test_iso_fits_bounding_sphere() {
        let camera = Camera::from_preset(ViewPreset::Iso, unit_cube());
        let radius = 3.0f32.sqrt() / 2.0;

        assert_relative_eq!(camera.focal_point, Point3f::new(0.5, 0.5, 0.5));
        assert_relative_eq!(camera.distance(), radius / 15.0f32.to_radians().sin(), epsilon = 1e-4);
        assert_relative_eq!(camera.direction_to_camera(), Vector3f::new(1.0, 1.0, 1.0).normalize(), epsilon = 1e-6);
        assert_relative_eq!(camera.parallel_scale, radius);
        assert!(camera.view_up.dot(&camera.direction_to_camera()).abs() < 1e-6);
    }

    #[test]
    fn test_look_at_rejects_degenerate_input() {
        let p = Point3f::new(1.0, 2.0, 3.0);
        assert!(Camera::look_at(p, p, Vector3f::z()).is_none());
        assert!(Camera::look_at(Point3f::new(0.0, 0.0, 5.0), Point3f::origin(), Vector3f::zeros()).is_none());
        assert!(Camera::look_at(Point3f::new(0.0, 0.0, 5.0), Point3f::origin(), Vector3f::z()).is_none());

        let camera = Camera::look_at(Point3f::new(0.0, 0.0, 5.0), Point3f::origin(), Vector3f::new(0.0, 1.0, 1.0)).unwrap();
        assert_relative_eq!(camera.view_up, Vector3f::y(), epsilon = 1e-6);
    }

    #[test]
    fn test_zoom_depends_on_projection() {
        let mut camera = Camera::default();
        camera.zoom(2.0);
        assert_relative_eq!(camera.view_angle, DEFAULT_VIEW_ANGLE / 2.0);

        let mut parallel = Camera::default();
        parallel.parallel_projection = true;
        let scale = parallel.parallel_scale;
        parallel.zoom(2.0);
        assert_relative_eq!(parallel.parallel_scale, scale / 2.0);
        assert_relative_eq!(parallel.view_angle, DEFAULT_VIEW_ANGLE);

        parallel.zoom(0.0);
        parallel.zoom(-1.0);
        assert_relative_eq!(parallel.parallel_scale, scale / 2.0);
    }

    #[test]
    fn test_orbit_keeps_distance_and_focus() {
        let mut camera = Camera::from_preset(ViewPreset::Xy, unit_cube());
        let distance = camera.distance();
        let focus = camera.focal_point;

        camera.orbit(90.0, 0.0);
        assert_relative_eq!(camera.distance(), distance, epsilon = 1e-4);
        assert_relative_eq!(camera.focal_point, focus);
        assert_relative_eq!(camera.direction_to_camera().z, 0.0, epsilon = 1e-5);

        camera.orbit(0.0, 30.0);
        assert_relative_eq!(camera.distance(), distance, epsilon = 1e-4);
        assert!(camera.view_up.dot(&camera.direction_to_camera()).abs() < 1e-5);
    }

    #[test]
    fn test_pan_moves_focus_in_view_plane() {
        let mut camera = Camera::from_preset(ViewPreset::Xy, unit_cube());
        let before = camera.clone();
        camera.pan(1.0, 2.0);

        assert_relative_eq!(camera.focal_point - before.focal_point, Vector3f::new(1.0, 2.0, 0.0), epsilon = 1e-6);
        assert_relative_eq!(camera.direction_to_camera(), before.direction_to_camera(), epsilon = 1e-6);
    }

    #[test]
    fn test_clipping_range_encloses_sphere() {
        let camera = Camera::from_preset(ViewPreset::Iso, unit_cube());
        let center = Point3f::new(0.5, 0.5, 0.5);
        let (near, far) = camera.clipping_range(center, 0.9);
        let distance = camera.distance();

        assert!(near > 0.0);
        assert!(near < distance - 0.9);
        assert!(far > distance + 0.9);
    }
}
