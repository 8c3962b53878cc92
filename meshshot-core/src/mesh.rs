//! Mesh data structures and functionality

use crate::point::*;
use crate::{Error, Result};

/// A triangle mesh with vertices and faces
#[derive(Debug, Clone, PartialEq)]
pub struct TriangleMesh {
    pub vertices: Vec<Point3f>,
    pub faces: Vec<[usize; 3]>,
    pub normals: Option<Vec<Vector3f>>,
    pub colors: Option<Vec<[u8; 3]>>,
}

impl TriangleMesh {
    /// Create a new empty mesh
    pub fn new() -> Self {
        Self {
            vertices: Vec::new(),
            faces: Vec::new(),
            normals: None,
            colors: None,
        }
    }

    /// Create a mesh from vertices and faces
    pub fn from_vertices_and_faces(vertices: Vec<Point3f>, faces: Vec<[usize; 3]>) -> Self {
        Self {
            vertices,
            faces,
            normals: None,
            colors: None,
        }
    }

    /// Get the number of vertices
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Get the number of faces
    pub fn face_count(&self) -> usize {
        self.faces.len()
    }

    /// Check if the mesh is empty
    pub fn is_empty(&self) -> bool {
        self.vertices.is_empty() || self.faces.is_empty()
    }

    /// Add a vertex to the mesh
    pub fn add_vertex(&mut self, vertex: Point3f) -> usize {
        let index = self.vertices.len();
        self.vertices.push(vertex);
        index
    }

    /// Add a face to the mesh
    pub fn add_face(&mut self, face: [usize; 3]) {
        self.faces.push(face);
    }

    /// Calculate face normals. Degenerate faces get a zero normal.
    pub fn calculate_face_normals(&self) -> Vec<Vector3f> {
        self.faces
            .iter()
            .map(|face| {
                let v0 = self.vertices[face[0]];
                let v1 = self.vertices[face[1]];
                let v2 = self.vertices[face[2]];

                let edge1 = v1 - v0;
                let edge2 = v2 - v0;

                edge1
                    .cross(&edge2)
                    .try_normalize(f32::EPSILON)
                    .unwrap_or_else(Vector3f::zeros)
            })
            .collect()
    }

    /// Area-weighted vertex normals, used for smooth shading
    pub fn calculate_vertex_normals(&self) -> Vec<Vector3f> {
        let mut normals = vec![Vector3f::zeros(); self.vertices.len()];

        for face in &self.faces {
            let v0 = self.vertices[face[0]];
            let v1 = self.vertices[face[1]];
            let v2 = self.vertices[face[2]];
            // Unnormalized cross product weights by twice the face area
            let weighted = (v1 - v0).cross(&(v2 - v0));
            for &index in face {
                normals[index] += weighted;
            }
        }

        normals
            .into_iter()
            .map(|n| n.try_normalize(f32::EPSILON).unwrap_or_else(Vector3f::zeros))
            .collect()
    }

    /// Vertex normals from the file if present, otherwise computed
    pub fn vertex_normals(&self) -> Vec<Vector3f> {
        match &self.normals {
            Some(normals) if normals.len() == self.vertices.len() => normals.clone(),
            _ => self.calculate_vertex_normals(),
        }
    }

    /// Set vertex normals
    pub fn set_normals(&mut self, normals: Vec<Vector3f>) {
        if normals.len() == self.vertices.len() {
            self.normals = Some(normals);
        }
    }

    /// Set vertex colors
    pub fn set_colors(&mut self, colors: Vec<[u8; 3]>) {
        if colors.len() == self.vertices.len() {
            self.colors = Some(colors);
        }
    }

    /// Check that every face references an existing vertex
    pub fn validate(&self) -> Result<()> {
        let count = self.vertices.len();
        if let Some((i, face)) = self
            .faces
            .iter()
            .enumerate()
            .find(|(_, face)| face.iter().any(|&index| index >= count))
        {
            return Err(Error::InvalidData(format!(
                "face {} references vertex {:?} but the mesh has {} vertices",
                i, face, count
            )));
        }
        Ok(())
    }
}

impl Default for TriangleMesh {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;

    fn unit_square() -> TriangleMesh {
        TriangleMesh::from_vertices_and_faces(
            vec![
                Point3f::new(0.0, 0.0, 0.0),
                Point3f::new(1.0, 0.0, 0.0),
                Point3f::new(1.0, 1.0, 0.0),
                Point3f::new(0.0, 1.0, 0.0),
            ],
            vec![[0, 1, 2], [0, 2, 3]],
        )
    }

    #[test]
    fn test_face_normals_point_up() {
        let mesh = unit_square();
        for normal in mesh.calculate_face_normals() {
            assert_relative_eq!(normal, Vector3f::new(0.0, 0.0, 1.0), epsilon = 1e-6);
        }
    }

    #[test]
    fn test_vertex_normals_are_unit_length() {
        let mesh = unit_square();
        let normals = mesh.calculate_vertex_normals();
        assert_eq!(normals.len(), 4);
        for normal in normals {
            assert_relative_eq!(normal.norm(), 1.0, epsilon = 1e-6);
        }
    }

    #[test]
    fn test_degenerate_face_has_zero_normal() {
        let mesh = TriangleMesh::from_vertices_and_faces(
            vec![Point3f::origin(), Point3f::origin(), Point3f::origin()],
            vec![[0, 1, 2]],
        );
        assert_eq!(mesh.calculate_face_normals()[0], Vector3f::zeros());
    }

    #[test]
    fn test_mismatched_normals_are_ignored() {
        let mut mesh = unit_square();
        mesh.set_normals(vec![Vector3f::z(); 2]);
        assert!(mesh.normals.is_none());
        assert_eq!(mesh.vertex_normals().len(), 4);
    }

    #[test]
    fn test_validate_rejects_out_of_range_faces() {
        let mut mesh = unit_square();
        assert!(mesh.validate().is_ok());
        mesh.add_face([0, 1, 7]);
        assert!(mesh.validate().is_err());
    }
}
