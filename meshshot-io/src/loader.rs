//! Mesh loading with a conversion fallback

use crate::gmsh::GmshConverter;
use crate::ply::PlyReader;
use crate::MeshReader;
use meshshot_core::{Error, Result, TriangleMesh};
use std::path::{Path, PathBuf};
use tempfile::{Builder, TempDir};

/// Turns a file the direct readers cannot handle into one they can
pub trait MeshConverter: Send + Sync {
    /// Short name used in log and error messages
    fn name(&self) -> &str;

    /// Whether this converter should be tried for `path`
    fn accepts(&self, path: &Path) -> bool;

    /// Convert `source` into a PLY surface mesh inside `target_dir` and
    /// return the written file
    fn convert(&self, source: &Path, target_dir: &Path) -> Result<PathBuf>;
}

/// Loads a surface mesh from any supported file.
///
/// The direct readers are tried first. When they fail, the first converter
/// that accepts the file writes an intermediate PLY into a fresh temporary
/// directory, which is removed again when loading returns or unwinds.
pub struct MeshLoader {
    converters: Vec<Box<dyn MeshConverter>>,
    scratch_dir: Option<PathBuf>,
}

impl MeshLoader {
    /// A loader with the Gmsh converter registered
    pub fn new() -> Self {
        Self::without_converters().with_converter(GmshConverter)
    }

    /// A loader that only uses the direct readers
    pub fn without_converters() -> Self {
        Self {
            converters: Vec::new(),
            scratch_dir: None,
        }
    }

    pub fn with_converter(mut self, converter: impl MeshConverter + 'static) -> Self {
        self.converters.push(Box::new(converter));
        self
    }

    /// Create conversion directories under `dir` instead of the system
    /// temporary directory
    pub fn with_scratch_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.scratch_dir = Some(dir.into());
        self
    }

    /// Load the mesh at `path`
    pub fn load(&self, path: &Path) -> Result<TriangleMesh> {
        if !path.is_file() {
            return Err(Error::mesh_load(path, "file not found"));
        }

        let direct_error = match crate::read_mesh(path).and_then(non_empty) {
            Ok(mesh) => {
                log::info!(
                    "Loaded {} ({} vertices, {} triangles)",
                    path.display(),
                    mesh.vertex_count(),
                    mesh.face_count()
                );
                return Ok(mesh);
            }
            Err(e) => e,
        };
        log::debug!("Direct read of {} failed: {}", path.display(), direct_error);

        let Some(converter) = self.converters.iter().find(|c| c.accepts(path)) else {
            return Err(Error::mesh_load(path, direct_error.to_string()));
        };

        match self.convert(converter.as_ref(), path) {
            Ok(mesh) => {
                log::info!(
                    "Loaded {} through {} conversion ({} vertices, {} triangles)",
                    path.display(),
                    converter.name(),
                    mesh.vertex_count(),
                    mesh.face_count()
                );
                Ok(mesh)
            }
            Err(conversion_error) => Err(Error::mesh_load(
                path,
                format!(
                    "{}; {} conversion failed: {}",
                    direct_error,
                    converter.name(),
                    conversion_error
                ),
            )),
        }
    }

    fn convert(&self, converter: &dyn MeshConverter, path: &Path) -> Result<TriangleMesh> {
        let scratch = self.scratch()?;
        let converted = converter.convert(path, scratch.path())?;
        let mesh = PlyReader::read_mesh(&converted).and_then(non_empty)?;
        scratch.close()?;
        Ok(mesh)
    }

    fn scratch(&self) -> Result<TempDir> {
        let mut builder = Builder::new();
        builder.prefix("meshshot-");
        let dir = match &self.scratch_dir {
            Some(root) => builder.tempdir_in(root)?,
            None => builder.tempdir()?,
        };
        Ok(dir)
    }
}

impl Default for MeshLoader {
    fn default() -> Self {
        Self::new()
    }
}

fn non_empty(mesh: TriangleMesh) -> Result<TriangleMesh> {
    if mesh.is_empty() {
        Err(Error::InvalidData("mesh has no triangles".to_string()))
    } else {
        Ok(mesh)
    }
}
