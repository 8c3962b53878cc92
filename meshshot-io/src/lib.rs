//! Mesh I/O for meshshot
//!
//! Surface meshes in STL, OBJ and PLY are read directly. Anything the direct
//! readers reject can be handed to a [`MeshConverter`], which turns it into a
//! surface mesh through a temporary PLY file; see [`MeshLoader`].

pub mod gmsh;
pub mod loader;
pub mod obj;
pub mod ply;
pub mod stl;

pub use gmsh::GmshConverter;
pub use loader::{MeshConverter, MeshLoader};

use meshshot_core::{Error, Result, TriangleMesh};
use std::path::Path;

/// Trait for reading meshes from files
pub trait MeshReader {
    fn read_mesh<P: AsRef<Path>>(path: P) -> Result<TriangleMesh>;
}

/// Trait for writing meshes to files
pub trait MeshWriter {
    fn write_mesh<P: AsRef<Path>>(mesh: &TriangleMesh, path: P) -> Result<()>;
}

/// Lowercased file extension, if any
pub(crate) fn extension(path: &Path) -> Option<String> {
    path.extension()
        .and_then(|s| s.to_str())
        .map(|s| s.to_ascii_lowercase())
}

/// Auto-detect format from the extension and read a surface mesh
pub fn read_mesh<P: AsRef<Path>>(path: P) -> Result<TriangleMesh> {
    let path = path.as_ref();
    match extension(path).as_deref() {
        Some("stl") => stl::StlReader::read_mesh(path),
        Some("obj") => obj::ObjReader::read_mesh(path),
        Some("ply") => ply::PlyReader::read_mesh(path),
        _ => Err(Error::UnsupportedFormat(format!(
            "No direct reader for {:?}",
            path.extension().unwrap_or_default()
        ))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use meshshot_core::Point3f;

    fn triangle() -> TriangleMesh {
        TriangleMesh::from_vertices_and_faces(
            vec![
                Point3f::new(0.0, 0.0, 0.0),
                Point3f::new(1.0, 0.0, 0.0),
                Point3f::new(0.0, 1.0, 0.0),
            ],
            vec![[0, 1, 2]],
        )
    }

    #[test]
    fn test_dispatch_is_case_insensitive() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("TRI.PLY");
        ply::PlyWriter::write_mesh(&triangle(), &path).unwrap();

        let mesh = read_mesh(&path).unwrap();
        assert_eq!(mesh.face_count(), 1);
    }

    #[test]
    fn test_unknown_extension_is_unsupported() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("part.step");
        std::fs::write(&path, "ISO-10303-21;").unwrap();

        assert!(matches!(read_mesh(&path), Err(Error::UnsupportedFormat(_))));
        assert!(matches!(read_mesh(dir.path().join("noext")), Err(Error::UnsupportedFormat(_))));
    }

    #[test]
    fn test_missing_file_is_io_error() {
        assert!(matches!(read_mesh("nowhere/part.stl"), Err(Error::Io(_))));
    }
}
