//! Screenshot capture and PNG export

use crate::raster::{render_frame, Frame};
use crate::scene::RenderContext;
use image::codecs::png::PngEncoder;
use image::{ColorType, DynamicImage, ImageEncoder, RgbImage, RgbaImage};
use meshshot_core::{Error, Result};
use std::fs;
use std::io::BufWriter;
use std::path::Path;
use tempfile::NamedTempFile;

/// Render `ctx` at `scale` times its window size.
///
/// A transparent capture keeps alpha and yields an RGBA image; an opaque one
/// yields RGB.
pub fn capture(ctx: &RenderContext, scale: u32, transparent: bool) -> Result<DynamicImage> {
    let scale = scale.max(1);
    let (width, height) = match (ctx.size[0].checked_mul(scale), ctx.size[1].checked_mul(scale)) {
        (Some(w), Some(h)) => (w, h),
        _ => {
            return Err(Error::RenderSetup(format!(
                "image scale {} overflows the {}x{} window",
                scale, ctx.size[0], ctx.size[1]
            )))
        }
    };

    let frame = if transparent == ctx.transparent_background {
        render_frame(ctx, width, height)?
    } else {
        let mut ctx = ctx.clone();
        ctx.transparent_background = transparent;
        render_frame(&ctx, width, height)?
    };

    Ok(to_image(&frame, transparent))
}

fn to_u8(value: f32) -> u8 {
    (value.clamp(0.0, 1.0) * 255.0).round() as u8
}

/// Quantize a frame to 8-bit RGBA
pub fn frame_to_rgba8(frame: &Frame) -> RgbaImage {
    let (width, height) = frame.dimensions();
    RgbaImage::from_fn(width, height, |x, y| image::Rgba(frame.get_pixel(x, y).0.map(to_u8)))
}

fn to_image(frame: &Frame, transparent: bool) -> DynamicImage {
    let (width, height) = frame.dimensions();
    if transparent {
        DynamicImage::ImageRgba8(frame_to_rgba8(frame))
    } else {
        DynamicImage::ImageRgb8(RgbImage::from_fn(width, height, |x, y| {
            let [r, g, b, _] = frame.get_pixel(x, y).0;
            image::Rgb([to_u8(r), to_u8(g), to_u8(b)])
        }))
    }
}

/// Write `image` as a PNG at `path`, creating parent directories.
///
/// The image is encoded into a temporary file next to the destination and
/// renamed into place, so a failed export leaves nothing behind.
pub fn write_png(image: &DynamicImage, path: &Path) -> Result<()> {
    let export_error = |what: &str, e: &dyn std::fmt::Display| {
        Error::Export(format!("{} '{}': {}", what, path.display(), e))
    };

    let parent = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };
    fs::create_dir_all(parent).map_err(|e| export_error("cannot create directory for", &e))?;

    let (buffer, color_type) = match image {
        DynamicImage::ImageRgba8(rgba) => (rgba.as_raw().as_slice(), ColorType::Rgba8),
        DynamicImage::ImageRgb8(rgb) => (rgb.as_raw().as_slice(), ColorType::Rgb8),
        _ => return Err(Error::Export("only 8-bit RGB and RGBA images are exported".to_string())),
    };

    let mut temp = NamedTempFile::new_in(parent)
        .map_err(|e| export_error("cannot create temporary file for", &e))?;
    {
        let mut writer = BufWriter::new(temp.as_file_mut());
        PngEncoder::new(&mut writer)
            .write_image(buffer, image.width(), image.height(), color_type)
            .map_err(|e| export_error("cannot encode", &e))?;
        std::io::Write::flush(&mut writer).map_err(|e| export_error("cannot write", &e))?;
    }
    temp.persist(path)
        .map_err(|e| export_error("cannot save", &e.error))?;
    Ok(())
}

/// Capture `ctx` and save it to `path`
pub fn save_screenshot(ctx: &RenderContext, path: &Path, scale: u32, transparent: bool) -> Result<()> {
    let image = capture(ctx, scale, transparent)?;
    write_png(&image, path)?;
    log::info!(
        "Saved {}x{} screenshot to {}",
        image.width(),
        image.height(),
        path.display()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::configure::configure;
    use crate::scene::Capabilities;
    use meshshot_core::{Point3f, Settings, TriangleMesh};
    use tempfile::TempDir;

    fn context(yaml: &str) -> RenderContext {
        let mesh = TriangleMesh::from_vertices_and_faces(
            vec![
                Point3f::new(0.0, 0.0, 0.0),
                Point3f::new(1.0, 0.0, 0.0),
                Point3f::new(0.0, 1.0, 0.0),
            ],
            vec![[0, 1, 2]],
        );
        let settings = Settings::from_yaml_str(yaml).unwrap();
        configure(&settings.render, mesh, &Capabilities::software())
    }

    #[test]
    fn test_capture_scales_and_picks_channels() {
        let ctx = context("render: {window_size: [40, 30]}");
        let opaque = capture(&ctx, 2, false).unwrap();
        assert_eq!((opaque.width(), opaque.height()), (80, 60));
        assert!(matches!(opaque, DynamicImage::ImageRgb8(_)));

        let transparent = capture(&ctx, 1, true).unwrap();
        let rgba = transparent.as_rgba8().unwrap();
        assert_eq!(rgba.get_pixel(0, 0).0[3], 0);
    }

    #[test]
    fn test_write_png_creates_directories() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested/deeper/shot.png");
        let ctx = context("render: {window_size: [16, 12]}");

        save_screenshot(&ctx, &path, 1, false).unwrap();

        let written = image::open(&path).unwrap();
        assert_eq!((written.width(), written.height()), (16, 12));
        // Only the final file is left in the directory
        let entries: Vec<_> = fs::read_dir(path.parent().unwrap()).unwrap().collect();
        assert_eq!(entries.len(), 1);
    }

    #[test]
    fn test_failed_export_leaves_no_file() {
        let dir = TempDir::new().unwrap();
        // The destination is an existing directory, so persisting fails
        let target = dir.path().join("taken");
        fs::create_dir(&target).unwrap();
        fs::write(target.join("keep"), b"x").unwrap();

        let ctx = context("render: {window_size: [8, 8]}");
        let err = save_screenshot(&ctx, &target, 1, false).unwrap_err();
        assert!(matches!(err, Error::Export(_)));

        let names: Vec<_> = fs::read_dir(dir.path())
            .unwrap()
            .map(|e| e.unwrap().file_name())
            .collect();
        assert_eq!(names, vec![std::ffi::OsString::from("taken")]);
    }
}
