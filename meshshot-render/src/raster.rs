//! Software rasterizer.
//!
//! A frame is drawn in two passes. Geometry is first scanned into a
//! G-buffer holding depth, position and normal per pixel, with edges drawn
//! on top as depth-tested lines. The buffer is then shaded row by row in
//! parallel, and post effects run on the shaded frame.

use crate::camera::Camera;
use crate::lighting::shade;
use crate::post;
use crate::scene::RenderContext;
use image::{Rgba, Rgba32FImage};
use meshshot_core::{Background, Bounds, Color, Error, Point3f, Result, SurfaceStyle, Vector3f};
use nalgebra::{Matrix4, Vector4};
use rayon::prelude::*;

/// Linear RGBA frame with straight alpha
pub type Frame = Rgba32FImage;

/// Largest render target, counted after supersampling. The G-buffer and
/// float frame together take about 56 bytes per pixel.
const MAX_TARGET_PIXELS: u64 = 1 << 25;

/// Widest edge line in output pixels
const MAX_EDGE_WIDTH: f32 = 32.0;

/// Relative depth slack that lets edges win against their own faces
const EDGE_DEPTH_BIAS: f32 = 0.005;

/// Render `ctx` into a `width` x `height` frame
pub fn render_frame(ctx: &RenderContext, width: u32, height: u32) -> Result<Frame> {
    if width == 0 || height == 0 {
        return Err(Error::RenderSetup(format!(
            "cannot render a {}x{} image",
            width, height
        )));
    }

    let samples = ctx.effects.supersample.max(1);
    let (w, h) = match (width.checked_mul(samples), height.checked_mul(samples)) {
        (Some(w), Some(h)) if w as u64 * h as u64 <= MAX_TARGET_PIXELS => (w, h),
        _ => {
            return Err(Error::RenderSetup(format!(
                "render target {}x{} with {}x supersampling is too large",
                width, height, samples
            )))
        }
    };

    let projector = Projector::new(&ctx.camera, ctx.actor.bounds(), w, h);
    let mut gbuffer = GBuffer::new(w, h)?;

    if ctx.actor.style == SurfaceStyle::Surface {
        rasterize_surface(&mut gbuffer, ctx, &projector);
    }
    if let Some(edges) = ctx.actor.edges {
        let width = edges.width.min(MAX_EDGE_WIDTH) * samples as f32;
        rasterize_edges(&mut gbuffer, ctx, &projector, edges.color, width);
    }

    let mut frame = shade_frame(&gbuffer, ctx)?;
    if ctx.effects.eye_dome_lighting {
        post::eye_dome_lighting(&mut frame, &gbuffer.view_depth, samples);
    }
    if ctx.show_axes {
        draw_axes(&mut frame, &ctx.camera, samples);
    }
    if samples > 1 {
        frame = post::downsample(&frame, width, height);
    }
    if ctx.effects.fxaa {
        frame = post::fxaa(&frame);
    }

    Ok(frame)
}

/// Background color of row `y` in a frame `height` rows tall
pub fn background_color(background: &Background, y: u32, height: u32) -> Color {
    match *background {
        Background::Flat(color) => color,
        Background::Gradient { bottom, top } => {
            let t = if height > 1 {
                y as f32 / (height - 1) as f32
            } else {
                0.0
            };
            top.lerp(bottom, t)
        }
    }
}

#[derive(Debug, Clone, Copy)]
enum Sample {
    Empty,
    Surface { position: Point3f, normal: Vector3f },
    Line(Color),
}

struct GBuffer {
    width: u32,
    height: u32,
    /// Normalized device depth in `0..=1`
    depth: Vec<f32>,
    /// Distance along the view axis, infinite where nothing was drawn
    view_depth: Vec<f32>,
    samples: Vec<Sample>,
}

impl GBuffer {
    fn new(width: u32, height: u32) -> Result<Self> {
        let len = width as usize * height as usize;
        Ok(Self {
            width,
            height,
            depth: filled(len, f32::INFINITY)?,
            view_depth: filled(len, f32::INFINITY)?,
            samples: filled(len, Sample::Empty)?,
        })
    }

    fn index(&self, x: i64, y: i64) -> Option<usize> {
        if x < 0 || y < 0 || x >= self.width as i64 || y >= self.height as i64 {
            return None;
        }
        Some(y as usize * self.width as usize + x as usize)
    }

    fn plot_line(&mut self, x: i64, y: i64, depth: f32, view_depth: f32, color: Color) {
        let Some(i) = self.index(x, y) else {
            return;
        };
        let visible = match self.samples[i] {
            Sample::Empty => true,
            Sample::Surface { .. } => view_depth <= self.view_depth[i] * (1.0 + EDGE_DEPTH_BIAS),
            Sample::Line(_) => depth <= self.depth[i],
        };
        if visible {
            self.samples[i] = Sample::Line(color);
            self.depth[i] = self.depth[i].min(depth);
            self.view_depth[i] = self.view_depth[i].min(view_depth);
        }
    }
}

/// A `len` long buffer of `value`, failing instead of aborting when the
/// allocation cannot be made
fn filled<T: Clone>(len: usize, value: T) -> Result<Vec<T>> {
    let mut buffer = Vec::new();
    buffer
        .try_reserve_exact(len)
        .map_err(|e| Error::RenderSetup(format!("cannot allocate a {} pixel buffer: {}", len, e)))?;
    buffer.resize(len, value);
    Ok(buffer)
}

/// A vertex after the model-view-projection transform
#[derive(Debug, Clone, Copy)]
struct ClipVertex {
    clip: Vector4<f32>,
    world: Point3f,
    normal: Vector3f,
    view_depth: f32,
}

impl ClipVertex {
    fn lerp(&self, other: &ClipVertex, t: f32) -> ClipVertex {
        ClipVertex {
            clip: self.clip.lerp(&other.clip, t),
            world: self.world + (other.world - self.world) * t,
            normal: self.normal.lerp(&other.normal, t),
            view_depth: self.view_depth + (other.view_depth - self.view_depth) * t,
        }
    }

    /// Signed distance to the near plane, positive inside
    fn near_distance(&self) -> f32 {
        self.clip.z + self.clip.w
    }
}

#[derive(Debug, Clone, Copy)]
struct ScreenVertex {
    x: f32,
    y: f32,
    z: f32,
    inv_w: f32,
    world: Point3f,
    normal: Vector3f,
    view_depth: f32,
}

struct Projector {
    view: Matrix4<f32>,
    view_proj: Matrix4<f32>,
    width: f32,
    height: f32,
}

impl Projector {
    fn new(camera: &Camera, bounds: Bounds, width: u32, height: u32) -> Self {
        let (min, max) = bounds;
        let center = Point3f::from((min.coords + max.coords) / 2.0);
        let range = camera.clipping_range(center, (max - min).norm() / 2.0);
        let view = camera.view_matrix();
        let projection = camera.projection_matrix(width as f32 / height as f32, range);

        Self {
            view,
            view_proj: projection * view,
            width: width as f32,
            height: height as f32,
        }
    }

    fn vertex(&self, world: Point3f, normal: Vector3f) -> ClipVertex {
        let p = world.to_homogeneous();
        ClipVertex {
            clip: self.view_proj * p,
            world,
            normal,
            view_depth: -(self.view * p).z,
        }
    }

    fn to_screen(&self, v: &ClipVertex) -> ScreenVertex {
        let inv_w = 1.0 / v.clip.w;
        ScreenVertex {
            x: (v.clip.x * inv_w + 1.0) * 0.5 * self.width,
            y: (1.0 - v.clip.y * inv_w) * 0.5 * self.height,
            z: v.clip.z * inv_w * 0.5 + 0.5,
            inv_w,
            world: v.world,
            normal: v.normal,
            view_depth: v.view_depth,
        }
    }
}

/// Clip a polygon against the near plane
fn clip_near(polygon: &[ClipVertex]) -> Vec<ClipVertex> {
    let mut out = Vec::with_capacity(polygon.len() + 1);
    for (i, current) in polygon.iter().enumerate() {
        let next = &polygon[(i + 1) % polygon.len()];
        let (dc, dn) = (current.near_distance(), next.near_distance());
        if dc >= 0.0 {
            out.push(*current);
        }
        if (dc >= 0.0) != (dn >= 0.0) {
            out.push(current.lerp(next, dc / (dc - dn)));
        }
    }
    out
}

fn rasterize_surface(gbuffer: &mut GBuffer, ctx: &RenderContext, projector: &Projector) {
    let actor = &ctx.actor;
    let mesh = &actor.mesh;

    for (f, face) in mesh.faces.iter().enumerate() {
        let corners = [0, 1, 2].map(|k| {
            let index = face[k];
            let normal = match &actor.vertex_normals {
                Some(normals) => normals[index],
                None => actor.face_normals[f],
            };
            projector.vertex(mesh.vertices[index], normal)
        });

        let polygon = if corners.iter().all(|c| c.near_distance() >= 0.0) {
            corners.to_vec()
        } else {
            clip_near(&corners)
        };
        if polygon.len() < 3 {
            continue;
        }

        let screen: Vec<ScreenVertex> = polygon.iter().map(|v| projector.to_screen(v)).collect();
        for i in 1..screen.len() - 1 {
            rasterize_triangle(gbuffer, [screen[0], screen[i], screen[i + 1]]);
        }
    }
}

fn rasterize_triangle(gbuffer: &mut GBuffer, [v0, v1, v2]: [ScreenVertex; 3]) {
    let vertices = [v0, v1, v2];
    if !vertices.iter().all(|v| v.x.is_finite() && v.y.is_finite() && v.z.is_finite()) {
        return;
    }

    let min_x = (v0.x.min(v1.x).min(v2.x).floor() as i64).max(0);
    let max_x = (v0.x.max(v1.x).max(v2.x).ceil() as i64).min(gbuffer.width as i64 - 1);
    let min_y = (v0.y.min(v1.y).min(v2.y).floor() as i64).max(0);
    let max_y = (v0.y.max(v1.y).max(v2.y).ceil() as i64).min(gbuffer.height as i64 - 1);
    if min_x > max_x || min_y > max_y {
        return;
    }

    let denom = (v1.y - v2.y) * (v0.x - v2.x) + (v2.x - v1.x) * (v0.y - v2.y);
    if denom.abs() < 1e-12 {
        return;
    }

    for y in min_y..=max_y {
        let py = y as f32 + 0.5;
        for x in min_x..=max_x {
            let px = x as f32 + 0.5;

            let w0 = ((v1.y - v2.y) * (px - v2.x) + (v2.x - v1.x) * (py - v2.y)) / denom;
            let w1 = ((v2.y - v0.y) * (px - v2.x) + (v0.x - v2.x) * (py - v2.y)) / denom;
            let w2 = 1.0 - w0 - w1;
            if w0 < 0.0 || w1 < 0.0 || w2 < 0.0 {
                continue;
            }

            let z = w0 * v0.z + w1 * v1.z + w2 * v2.z;
            let i = y as usize * gbuffer.width as usize + x as usize;
            if !(0.0..=1.0).contains(&z) || z >= gbuffer.depth[i] {
                continue;
            }

            // Perspective-correct weights
            let p0 = w0 * v0.inv_w;
            let p1 = w1 * v1.inv_w;
            let p2 = w2 * v2.inv_w;
            let sum = p0 + p1 + p2;
            if sum.abs() < f32::EPSILON {
                continue;
            }
            let (p0, p1, p2) = (p0 / sum, p1 / sum, p2 / sum);

            let position = Point3f::from(v0.world.coords * p0 + v1.world.coords * p1 + v2.world.coords * p2);
            let normal = v0.normal * p0 + v1.normal * p1 + v2.normal * p2;

            gbuffer.depth[i] = z;
            gbuffer.view_depth[i] = v0.view_depth * p0 + v1.view_depth * p1 + v2.view_depth * p2;
            gbuffer.samples[i] = Sample::Surface { position, normal };
        }
    }
}

fn rasterize_edges(
    gbuffer: &mut GBuffer,
    ctx: &RenderContext,
    projector: &Projector,
    color: Color,
    width: f32,
) {
    let mesh = &ctx.actor.mesh;
    let brush = (width.round() as i64).clamp(1, gbuffer.width.max(gbuffer.height) as i64);
    let (lo, hi) = (-(brush - 1) / 2, brush / 2);
    let margin = brush as f32;
    // Consecutive stamps overlap as long as they move less than a brush
    let stride = (brush / 2).max(1) as f32;

    for &[a, b] in &ctx.actor.edge_list {
        let mut ends = [
            projector.vertex(mesh.vertices[a], Vector3f::zeros()),
            projector.vertex(mesh.vertices[b], Vector3f::zeros()),
        ];
        let (da, db) = (ends[0].near_distance(), ends[1].near_distance());
        match (da >= 0.0, db >= 0.0) {
            (true, true) => {}
            (false, false) => continue,
            (true, false) => ends[1] = ends[0].lerp(&ends[1], da / (da - db)),
            (false, true) => ends[0] = ends[0].lerp(&ends[1], da / (da - db)),
        }

        let (s0, s1) = (projector.to_screen(&ends[0]), projector.to_screen(&ends[1]));
        let Some((t0, t1)) = clip_to_rect(
            (s0.x, s0.y),
            (s1.x, s1.y),
            (-margin, -margin),
            (gbuffer.width as f32 + margin, gbuffer.height as f32 + margin),
        ) else {
            continue;
        };

        let length = (s1.x - s0.x).abs().max((s1.y - s0.y).abs()) * (t1 - t0);
        let steps = ((length / stride).ceil() as usize).max(1);
        for step in 0..=steps {
            let t = t0 + (t1 - t0) * step as f32 / steps as f32;
            let x = s0.x + (s1.x - s0.x) * t;
            let y = s0.y + (s1.y - s0.y) * t;
            let z = s0.z + (s1.z - s0.z) * t;
            // View depth is interpolated perspective-correctly
            let inv_w = s0.inv_w + (s1.inv_w - s0.inv_w) * t;
            let view_depth = (s0.view_depth * s0.inv_w
                + (s1.view_depth * s1.inv_w - s0.view_depth * s0.inv_w) * t)
                / inv_w;

            let (cx, cy) = (x.floor() as i64, y.floor() as i64);
            for dy in lo..=hi {
                for dx in lo..=hi {
                    gbuffer.plot_line(cx + dx, cy + dy, z, view_depth, color);
                }
            }
        }
    }
}

/// Parameter range of the segment `p0 -> p1` inside a rectangle
/// (Liang-Barsky)
fn clip_to_rect(p0: (f32, f32), p1: (f32, f32), min: (f32, f32), max: (f32, f32)) -> Option<(f32, f32)> {
    let (dx, dy) = (p1.0 - p0.0, p1.1 - p0.1);
    let mut t0 = 0.0f32;
    let mut t1 = 1.0f32;

    for (p, q) in [
        (-dx, p0.0 - min.0),
        (dx, max.0 - p0.0),
        (-dy, p0.1 - min.1),
        (dy, max.1 - p0.1),
    ] {
        if p == 0.0 {
            if q < 0.0 {
                return None;
            }
            continue;
        }
        let r = q / p;
        if p < 0.0 {
            t0 = t0.max(r);
        } else {
            t1 = t1.min(r);
        }
        if t0 > t1 {
            return None;
        }
    }

    (t0.is_finite() && t1.is_finite()).then_some((t0, t1))
}

fn shade_frame(gbuffer: &GBuffer, ctx: &RenderContext) -> Result<Frame> {
    let (width, height) = (gbuffer.width, gbuffer.height);
    let material = &ctx.actor.material;
    let background_alpha = if ctx.transparent_background { 0.0 } else { 1.0 };

    let mut data = filled(width as usize * height as usize * 4, 0.0f32)?;
    data.par_chunks_mut(width as usize * 4)
        .enumerate()
        .for_each(|(y, row)| {
            let background = background_color(&ctx.background, y as u32, height);
            for (x, pixel) in row.chunks_exact_mut(4).enumerate() {
                let i = y * width as usize + x;
                let (color, alpha) = match gbuffer.samples[i] {
                    Sample::Empty => (background, background_alpha),
                    Sample::Line(color) => (color, 1.0),
                    Sample::Surface { position, normal } => {
                        let lit = shade(material, &ctx.lights, &ctx.camera, position, normal);
                        if ctx.transparent_background {
                            (lit, material.opacity)
                        } else {
                            (background.lerp(lit, material.opacity), 1.0)
                        }
                    }
                };
                pixel.copy_from_slice(&[color.r, color.g, color.b, alpha]);
            }
        });

    Frame::from_raw(width, height, data)
        .ok_or_else(|| Error::RenderSetup("frame buffer has the wrong size".to_string()))
}

/// Orientation triad in the lower-left corner
fn draw_axes(frame: &mut Frame, camera: &Camera, samples: u32) {
    let (width, height) = frame.dimensions();
    let length = (width.min(height) as f32 * 0.08).max(8.0);
    let origin = (length * 1.3, height as f32 - length * 1.3);
    let thickness = (2 * samples).max(1);
    let view = camera.view_matrix();

    let mut axes: Vec<(Vector3f, Color)> = [
        (Vector3f::x(), Color::new(1.0, 0.0, 0.0)),
        (Vector3f::y(), Color::new(0.0, 0.8, 0.0)),
        (Vector3f::z(), Color::new(0.0, 0.3, 1.0)),
    ]
    .into_iter()
    .map(|(axis, color)| (view.transform_vector(&axis), color))
    .collect();
    // Draw the axis pointing furthest away first
    axes.sort_by(|a, b| a.0.z.total_cmp(&b.0.z));

    for (direction, color) in axes {
        let tip = (origin.0 + direction.x * length, origin.1 - direction.y * length);
        draw_segment(frame, origin, tip, thickness, color);
    }
}

/// Opaque 2D line without depth testing
fn draw_segment(frame: &mut Frame, from: (f32, f32), to: (f32, f32), thickness: u32, color: Color) {
    let (width, height) = frame.dimensions();
    let steps = ((to.0 - from.0).abs().max((to.1 - from.1).abs()).ceil() as usize).max(1);
    let brush = thickness as i64;
    let (lo, hi) = (-(brush - 1) / 2, brush / 2);

    for step in 0..=steps {
        let t = step as f32 / steps as f32;
        let x = (from.0 + (to.0 - from.0) * t).floor() as i64;
        let y = (from.1 + (to.1 - from.1) * t).floor() as i64;
        for dy in lo..=hi {
            for dx in lo..=hi {
                let (px, py) = (x + dx, y + dy);
                if px >= 0 && py >= 0 && px < width as i64 && py < height as i64 {
                    frame.put_pixel(px as u32, py as u32, Rgba([color.r, color.g, color.b, 1.0]));
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configure::configure;
    use crate::scene::Capabilities;
    use meshshot_core::{RenderSettings, Settings, TriangleMesh};

    /// A square in the z = 0 plane
    fn square() -> TriangleMesh {
        TriangleMesh::from_vertices_and_faces(
            vec![
                Point3f::new(-1.0, -1.0, 0.0),
                Point3f::new(1.0, -1.0, 0.0),
                Point3f::new(1.0, 1.0, 0.0),
                Point3f::new(-1.0, 1.0, 0.0),
            ],
            vec![[0, 1, 2], [0, 2, 3]],
        )
    }

    fn settings(yaml: &str) -> RenderSettings {
        Settings::from_yaml_str(yaml).unwrap().render
    }

    fn pixel(frame: &Frame, x: u32, y: u32) -> [f32; 4] {
        frame.get_pixel(x, y).0
    }

    #[test]
    fn test_face_on_square_fills_center() {
        let ctx = configure(
            &settings("render: {camera_position: xy, mesh: {show_edges: false, color: red}, background: {bottom: black}}"),
            square(),
            &Capabilities::software(),
        );
        let frame = render_frame(&ctx, 64, 48).unwrap();

        let [r, g, b, a] = pixel(&frame, 32, 24);
        assert!((r - 1.0).abs() < 1e-3 && g < 1e-3 && b < 1e-3);
        assert_eq!(a, 1.0);
        assert_eq!(pixel(&frame, 0, 0), [0.0, 0.0, 0.0, 1.0]);
    }

    #[test]
    fn test_transparent_background_has_zero_alpha() {
        let ctx = configure(
            &settings("render: {camera_position: xy, transparent_background: true}"),
            square(),
            &Capabilities::software(),
        );
        let frame = render_frame(&ctx, 40, 30).unwrap();
        assert_eq!(pixel(&frame, 0, 0)[3], 0.0);
        assert_eq!(pixel(&frame, 20, 15)[3], 1.0);
    }

    #[test]
    fn test_gradient_runs_from_top_to_bottom() {
        let background = Background::Gradient { bottom: Color::BLACK, top: Color::WHITE };
        assert_eq!(background_color(&background, 0, 10), Color::WHITE);
        assert_eq!(background_color(&background, 9, 10), Color::BLACK);
        assert_eq!(background_color(&background, 0, 1), Color::WHITE);
    }

    #[test]
    fn test_edges_are_drawn_over_the_surface() {
        let ctx = configure(
            &settings("render: {camera_position: xy, mesh: {edge_color: blue, color: white, line_width: 3}}"),
            square(),
            &Capabilities::software(),
        );
        let frame = render_frame(&ctx, 64, 64).unwrap();

        // The diagonal edge passes through the center
        let [r, g, b, _] = pixel(&frame, 32, 32);
        assert!(b > 0.9 && r < 0.1 && g < 0.1, "center is {:?}", [r, g, b]);
    }

    #[test]
    fn test_wireframe_leaves_faces_empty() {
        let ctx = configure(
            &settings("render: {camera_position: xy, background: {bottom: black}, mesh: {style: wireframe, color: white, line_width: 3}}"),
            square(),
            &Capabilities::software(),
        );
        let frame = render_frame(&ctx, 64, 64).unwrap();
        // Off the diagonal, inside the square
        assert_eq!(pixel(&frame, 44, 28), [0.0, 0.0, 0.0, 1.0]);
        assert_eq!(pixel(&frame, 32, 32), [1.0, 1.0, 1.0, 1.0]);
    }

    #[test]
    fn test_plane_crossing_near_plane_is_clipped() {
        // Looking along the plane from just above it, half the square is behind the camera
        let yaml = "render: {camera_position: [[0, 0, 0.01], [0, 1, 0.01], [0, 0, 1]]}";
        let ctx = configure(&settings(yaml), square(), &Capabilities::software());
        assert!(render_frame(&ctx, 32, 32).is_ok());
    }

    #[test]
    fn test_supersampled_frame_has_requested_size() {
        let ctx = configure(
            &settings("render: {anti_aliasing: ssaa, quality: {fxaa: true}, eye_dome_lighting: true, axes: true}"),
            square(),
            &Capabilities::software(),
        );
        assert_eq!(ctx.effects.supersample, 2);
        let frame = render_frame(&ctx, 50, 40).unwrap();
        assert_eq!(frame.dimensions(), (50, 40));
    }

    #[test]
    fn test_invalid_sizes_are_render_setup_errors() {
        let ctx = configure(&RenderSettings::default(), square(), &Capabilities::software());
        assert!(matches!(render_frame(&ctx, 0, 10), Err(Error::RenderSetup(_))));
        assert!(matches!(render_frame(&ctx, u32::MAX, 2), Err(Error::RenderSetup(_))));
        // Fits in u32 arithmetic but would need several gigabytes
        assert!(matches!(render_frame(&ctx, 8192, 8192), Err(Error::RenderSetup(_))));
        assert!(matches!(render_frame(&ctx, 16384, 12288), Err(Error::RenderSetup(_))));
    }

    #[test]
    fn test_huge_line_width_renders_quickly() {
        let ctx = configure(
            &settings("render: {camera_position: xy, mesh: {edge_color: blue, color: white, line_width: 100000}}"),
            square(),
            &Capabilities::software(),
        );
        let start = std::time::Instant::now();
        let frame = render_frame(&ctx, 640, 480).unwrap();
        assert!(start.elapsed() < std::time::Duration::from_secs(10));

        // The edges still cover the middle of the square
        let [r, g, b, _] = pixel(&frame, 320, 240);
        assert!(b > 0.9 && r < 0.1 && g < 0.1);
    }

    #[test]
    fn test_wide_lines_have_no_gaps() {
        let ctx = configure(
            &settings("render: {camera_position: xy, background: {bottom: black}, mesh: {style: wireframe, color: white, line_width: 9}}"),
            square(),
            &Capabilities::software(),
        );
        let frame = render_frame(&ctx, 64, 64).unwrap();
        // Every pixel along the diagonal edge is covered
        let white = |x: u32, y: u32| pixel(&frame, x, y) == [1.0, 1.0, 1.0, 1.0];
        let main = (24..40).all(|i| white(i, i));
        let anti = (24..40).all(|i| white(i, 63 - i));
        assert!(main || anti);
    }

    #[test]
    fn test_liang_barsky() {
        assert_eq!(clip_to_rect((-10.0, 5.0), (20.0, 5.0), (0.0, 0.0), (10.0, 10.0)), Some((1.0 / 3.0, 2.0 / 3.0)));
        assert_eq!(clip_to_rect((-10.0, 50.0), (20.0, 50.0), (0.0, 0.0), (10.0, 10.0)), None);
    }
}
