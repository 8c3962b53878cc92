//! Image-space passes run on a shaded frame

use crate::raster::Frame;
use image::imageops::{self, FilterType};
use rayon::prelude::*;

/// Weight of a neighbour that shows background instead of geometry
const EDL_SILHOUETTE: f32 = 1.0;
/// Scale applied to log-depth differences between neighbours
const EDL_DEPTH_SCALE: f32 = 100.0;

/// Darken pixels whose neighbours are closer to the camera.
///
/// `view_depth` holds one depth per frame pixel, infinite where nothing was
/// drawn. The neighbourhood radius grows with the supersampling factor so
/// the effect keeps its size in the final image.
pub fn eye_dome_lighting(frame: &mut Frame, view_depth: &[f32], samples: u32) {
    let (width, height) = frame.dimensions();
    let (w, h) = (width as i64, height as i64);
    let radius = samples.max(1) as i64;
    let offsets = [
        (-radius, -radius),
        (0, -radius),
        (radius, -radius),
        (-radius, 0),
        (radius, 0),
        (-radius, radius),
        (0, radius),
        (radius, radius),
    ];

    let shading: Vec<f32> = (0..view_depth.len())
        .into_par_iter()
        .map(|i| {
            let depth = view_depth[i];
            if !depth.is_finite() || depth <= 0.0 {
                return 1.0;
            }
            let (x, y) = ((i as i64) % w, (i as i64) / w);
            let log_depth = depth.ln();

            let response: f32 = offsets
                .iter()
                .map(|&(dx, dy)| {
                    let (nx, ny) = (x + dx, y + dy);
                    if nx < 0 || ny < 0 || nx >= w || ny >= h {
                        return 0.0;
                    }
                    let neighbour = view_depth[(ny * w + nx) as usize];
                    if neighbour.is_finite() && neighbour > 0.0 {
                        (log_depth - neighbour.ln()).max(0.0) * EDL_DEPTH_SCALE
                    } else {
                        EDL_SILHOUETTE
                    }
                })
                .sum();

            (-response / offsets.len() as f32).exp()
        })
        .collect();

    for (pixel, factor) in frame.pixels_mut().zip(shading) {
        for c in &mut pixel.0[..3] {
            *c *= factor;
        }
    }
}

/// Reduce a supersampled frame to its output size
pub fn downsample(frame: &Frame, width: u32, height: u32) -> Frame {
    if frame.dimensions() == (width, height) {
        return frame.clone();
    }

    // Filter premultiplied colors so transparent pixels do not bleed
    let mut premultiplied = frame.clone();
    for pixel in premultiplied.pixels_mut() {
        let alpha = pixel.0[3];
        for c in &mut pixel.0[..3] {
            *c *= alpha;
        }
    }

    let mut resized = imageops::resize(&premultiplied, width, height, FilterType::Triangle);
    for pixel in resized.pixels_mut() {
        let alpha = pixel.0[3];
        if alpha > f32::EPSILON {
            for c in &mut pixel.0[..3] {
                *c /= alpha;
            }
        }
    }
    resized
}

const FXAA_SPAN_MAX: f32 = 8.0;
const FXAA_REDUCE_MUL: f32 = 1.0 / 8.0;
const FXAA_REDUCE_MIN: f32 = 1.0 / 128.0;

fn luma(p: [f32; 4]) -> f32 {
    0.299 * p[0] + 0.587 * p[1] + 0.114 * p[2]
}

/// Bilinear sample at a pixel-space position, clamped to the frame
fn sample(frame: &Frame, x: f32, y: f32) -> [f32; 4] {
    let (width, height) = frame.dimensions();
    let x = (x - 0.5).clamp(0.0, (width - 1) as f32);
    let y = (y - 0.5).clamp(0.0, (height - 1) as f32);
    let (x0, y0) = (x.floor() as u32, y.floor() as u32);
    let (x1, y1) = ((x0 + 1).min(width - 1), (y0 + 1).min(height - 1));
    let (fx, fy) = (x - x0 as f32, y - y0 as f32);

    let p00 = frame.get_pixel(x0, y0).0;
    let p10 = frame.get_pixel(x1, y0).0;
    let p01 = frame.get_pixel(x0, y1).0;
    let p11 = frame.get_pixel(x1, y1).0;

    let mut out = [0.0; 4];
    for k in 0..4 {
        let top = p00[k] + (p10[k] - p00[k]) * fx;
        let bottom = p01[k] + (p11[k] - p01[k]) * fx;
        out[k] = top + (bottom - top) * fy;
    }
    out
}

fn mix(a: [f32; 4], b: [f32; 4], t: f32) -> [f32; 4] {
    [0, 1, 2, 3].map(|k| a[k] + (b[k] - a[k]) * t)
}

/// Fast approximate anti-aliasing: blend along detected luma edges
pub fn fxaa(frame: &Frame) -> Frame {
    let (width, height) = frame.dimensions();
    if width < 2 || height < 2 {
        return frame.clone();
    }

    let mut data = vec![0.0f32; width as usize * height as usize * 4];
    data.par_chunks_mut(width as usize * 4)
        .enumerate()
        .for_each(|(y, row)| {
            let cy = y as f32 + 0.5;
            for (x, out) in row.chunks_exact_mut(4).enumerate() {
                let cx = x as f32 + 0.5;
                let center = frame.get_pixel(x as u32, y as u32).0;

                let l_nw = luma(sample(frame, cx - 1.0, cy - 1.0));
                let l_ne = luma(sample(frame, cx + 1.0, cy - 1.0));
                let l_sw = luma(sample(frame, cx - 1.0, cy + 1.0));
                let l_se = luma(sample(frame, cx + 1.0, cy + 1.0));
                let l_m = luma(center);

                let l_min = l_m.min(l_nw.min(l_ne).min(l_sw.min(l_se)));
                let l_max = l_m.max(l_nw.max(l_ne).max(l_sw.max(l_se)));

                let mut dir_x = -((l_nw + l_ne) - (l_sw + l_se));
                let mut dir_y = (l_nw + l_sw) - (l_ne + l_se);
                let reduce = ((l_nw + l_ne + l_sw + l_se) * 0.25 * FXAA_REDUCE_MUL).max(FXAA_REDUCE_MIN);
                let rcp_min = 1.0 / (dir_x.abs().min(dir_y.abs()) + reduce);
                dir_x = (dir_x * rcp_min).clamp(-FXAA_SPAN_MAX, FXAA_SPAN_MAX);
                dir_y = (dir_y * rcp_min).clamp(-FXAA_SPAN_MAX, FXAA_SPAN_MAX);

                let a = mix(
                    sample(frame, cx + dir_x * (1.0 / 3.0 - 0.5), cy + dir_y * (1.0 / 3.0 - 0.5)),
                    sample(frame, cx + dir_x * (2.0 / 3.0 - 0.5), cy + dir_y * (2.0 / 3.0 - 0.5)),
                    0.5,
                );
                let b = mix(
                    a,
                    mix(
                        sample(frame, cx - dir_x * 0.5, cy - dir_y * 0.5),
                        sample(frame, cx + dir_x * 0.5, cy + dir_y * 0.5),
                        0.5,
                    ),
                    0.5,
                );

                let l_b = luma(b);
                let result = if l_b < l_min || l_b > l_max { a } else { b };
                out.copy_from_slice(&result);
            }
        });

    Frame::from_raw(width, height, data).unwrap_or_else(|| frame.clone())
}
