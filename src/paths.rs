//! Where screenshots are written

use chrono::format::{Item, StrftimeItems};
use chrono::{DateTime, Local};
use meshshot_core::{Settings, DEFAULT_EXPORT_SUFFIX, DEFAULT_TIMESTAMP_FORMAT};
use std::path::{Path, PathBuf};

/// Directory used when nothing else names one
pub const DEFAULT_OUTPUT_DIR: &str = "fig";

/// Format `now` with a strftime pattern. A pattern chrono cannot format
/// falls back to the default one.
pub fn format_timestamp(now: &DateTime<Local>, format: &str) -> String {
    let valid = !format.is_empty() && StrftimeItems::new(format).all(|item| !matches!(item, Item::Error));
    if valid {
        now.format(format).to_string()
    } else {
        log::debug!("invalid timestamp_format {:?}, using default", format);
        now.format(DEFAULT_TIMESTAMP_FORMAT).to_string()
    }
}

/// `dir/name.ext` becomes `dir/name_<stamp>.ext`
pub fn with_timestamp(path: &Path, stamp: &str) -> PathBuf {
    let stem = path.file_stem().map(|s| s.to_string_lossy().into_owned()).unwrap_or_default();
    let name = match path.extension() {
        Some(ext) => format!("{}_{}.{}", stem, stamp, ext.to_string_lossy()),
        None => format!("{}_{}", stem, stamp),
    };
    path.with_file_name(name)
}

fn mesh_stem(mesh_path: &Path) -> String {
    mesh_path
        .file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .unwrap_or_else(|| "mesh".to_string())
}

/// Output of a static run.
///
/// The CLI's `--output` wins, then `output_path` from the document, then
/// `fig/<mesh-stem>.png`.
pub fn static_output_path(
    settings: &Settings,
    cli_output: Option<&Path>,
    mesh_path: &Path,
    now: &DateTime<Local>,
) -> PathBuf {
    let base = match (cli_output, &settings.output_path) {
        (Some(path), _) => path.to_path_buf(),
        (None, Some(path)) => settings.resolve_path(path),
        (None, None) => Path::new(DEFAULT_OUTPUT_DIR).join(format!("{}.png", mesh_stem(mesh_path))),
    };

    if settings.append_timestamp {
        with_timestamp(&base, &format_timestamp(now, &settings.timestamp_format))
    } else {
        base
    }
}

/// Output of an export from the interactive viewer.
///
/// `render.export.output_path` is used as a file when it has an extension
/// and as a directory otherwise. Without it the directory comes from
/// `render.export.directory`, then `export_directory`, then `fig/`, and the
/// file name from `render.export.filename` or the mesh stem. Every export
/// gets its own timestamp.
pub fn interactive_export_path(settings: &Settings, mesh_path: &Path, now: &DateTime<Local>) -> PathBuf {
    let export = &settings.render.export;
    let suffix = export
        .suffix
        .as_deref()
        .filter(|s| !s.is_empty())
        .unwrap_or(DEFAULT_EXPORT_SUFFIX);
    let suffix = suffix.trim_start_matches('.');

    let target = export
        .output_path
        .as_deref()
        .map(|p| settings.resolve_path(p))
        .or_else(|| export.directory.as_deref().map(|p| settings.resolve_path(p)))
        .or_else(|| settings.export_directory.as_deref().map(|p| settings.resolve_path(p)))
        .unwrap_or_else(|| PathBuf::from(DEFAULT_OUTPUT_DIR));

    let (dir, mut candidate) = if export.output_path.is_some() && target.extension().is_some() {
        let dir = target.parent().map(Path::to_path_buf).unwrap_or_default();
        let name = target.file_name().map(PathBuf::from).unwrap_or_default();
        (dir, name)
    } else {
        let name = match &export.filename {
            Some(name) if !name.is_empty() => PathBuf::from(name),
            _ => PathBuf::from(format!("{}.{}", mesh_stem(mesh_path), suffix)),
        };
        (target, name)
    };
    if candidate.extension().is_none() {
        candidate.set_extension(suffix);
    }

    dir.join(with_timestamp(&candidate, &format_timestamp(now, &settings.timestamp_format)))
}

/// Scale used for interactive exports
pub fn export_scale(settings: &Settings) -> u32 {
    settings.render.export.image_scale.unwrap_or(settings.render.image_scale).max(1)
}

/// Background transparency used for interactive exports
pub fn export_transparency(settings: &Settings) -> bool {
    settings
        .render
        .export
        .transparent_background
        .unwrap_or(settings.render.transparent_background)
}

/// Window title, defaulting to `Mesh Viewer - <file name>`
pub fn window_title(settings: &Settings, mesh_path: &Path) -> String {
    match &settings.render.window_title {
        Some(title) if !title.is_empty() => title.clone(),
        _ => {
            let name = mesh_path
                .file_name()
                .map(|n| n.to_string_lossy().into_owned())
                .unwrap_or_default();
            format!("Mesh Viewer - {}", name)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn noon() -> DateTime<Local> {
        Local.with_ymd_and_hms(2024, 3, 9, 12, 30, 5).unwrap()
    }

    fn settings(yaml: &str) -> Settings {
        Settings::from_yaml_str(yaml).unwrap()
    }

    #[test]
    fn test_timestamp_formats() {
        assert_eq!(format_timestamp(&noon(), "%Y%m%d-%H%M%S"), "20240309-123005");
        assert_eq!(format_timestamp(&noon(), "%Y"), "2024");
        // Unknown specifier falls back to the default
        assert_eq!(format_timestamp(&noon(), "%Q"), "20240309-123005");
    }

    #[test]
    fn test_with_timestamp_keeps_directory_and_extension() {
        assert_eq!(with_timestamp(Path::new("a/b/out.png"), "T"), PathBuf::from("a/b/out_T.png"));
        assert_eq!(with_timestamp(Path::new("out"), "T"), PathBuf::from("out_T"));
    }

    #[test]
    fn test_static_output_defaults_to_fig() {
        let path = static_output_path(&Settings::default(), None, Path::new("meshes/part.msh"), &noon());
        assert_eq!(path, PathBuf::from("fig/part_20240309-123005.png"));
    }

    #[test]
    fn test_static_output_precedence() {
        let mut s = settings("output_path: shots/doc.png\nappend_timestamp: false");
        s.config_dir = Some(PathBuf::from("/cfg"));
        assert_eq!(
            static_output_path(&s, None, Path::new("m.stl"), &noon()),
            PathBuf::from("/cfg/shots/doc.png")
        );
        assert_eq!(
            static_output_path(&s, Some(Path::new("cli.png")), Path::new("m.stl"), &noon()),
            PathBuf::from("cli.png")
        );
    }

    #[test]
    fn test_interactive_export_defaults() {
        let path = interactive_export_path(&Settings::default(), Path::new("part.stl"), &noon());
        assert_eq!(path, PathBuf::from("fig/part_20240309-123005.png"));
    }

    #[test]
    fn test_interactive_export_file_target() {
        let s = settings("render: {export: {output_path: /tmp/shots/view.png}}");
        assert_eq!(
            interactive_export_path(&s, Path::new("part.stl"), &noon()),
            PathBuf::from("/tmp/shots/view_20240309-123005.png")
        );
    }

    #[test]
    fn test_interactive_export_directory_chain() {
        let s = settings(
            "export_directory: /global\nrender: {export: {filename: snap, suffix: jpg}}",
        );
        assert_eq!(
            interactive_export_path(&s, Path::new("part.stl"), &noon()),
            PathBuf::from("/global/snap_20240309-123005.jpg")
        );

        let s = settings("export_directory: /global\nrender: {export: {directory: /local}}");
        assert_eq!(
            interactive_export_path(&s, Path::new("part.stl"), &noon()),
            PathBuf::from("/local/part_20240309-123005.png")
        );
    }

    #[test]
    fn test_export_scale_and_transparency_fall_back_to_render() {
        let s = settings("render: {image_scale: 3, transparent_background: true}");
        assert_eq!(export_scale(&s), 3);
        assert!(export_transparency(&s));

        let s = settings("render: {image_scale: 3, export: {image_scale: 2, transparent_background: false}}");
        assert_eq!(export_scale(&s), 2);
        assert!(!export_transparency(&s));
    }

    #[test]
    fn test_window_title() {
        assert_eq!(window_title(&Settings::default(), Path::new("dir/part.stl")), "Mesh Viewer - part.stl");
        let s = settings("render: {window_title: Custom}");
        assert_eq!(window_title(&s, Path::new("part.stl")), "Custom");
    }
}
