//! OBJ format support

use crate::MeshReader;
use meshshot_core::{Error, Point3f, Result, TriangleMesh, Vector3f};
use obj::Obj;
use std::path::Path;

pub struct ObjReader;

impl MeshReader for ObjReader {
    fn read_mesh<P: AsRef<Path>>(path: P) -> Result<TriangleMesh> {
        let obj = Obj::load(path.as_ref())
            .map_err(|e| Error::InvalidData(format!("Failed to parse OBJ: {}", e)))?;
        let data = obj.data;

        let vertices: Vec<Point3f> = data
            .position
            .iter()
            .map(|p| Point3f::new(p[0], p[1], p[2]))
            .collect();

        // Polygons are fanned into triangles around their first corner
        let mut faces = Vec::new();
        let mut corner_normals: Vec<Option<usize>> = Vec::new();
        for object in &data.objects {
            for group in &object.groups {
                for polygon in &group.polys {
                    let corners = &polygon.0;
                    if corners.len() < 3 {
                        continue;
                    }
                    for i in 1..corners.len() - 1 {
                        let tri = [&corners[0], &corners[i], &corners[i + 1]];
                        faces.push([tri[0].0, tri[1].0, tri[2].0]);
                        corner_normals.extend(tri.iter().map(|corner| corner.2));
                    }
                }
            }
        }

        let mut mesh = TriangleMesh::from_vertices_and_faces(vertices, faces);
        mesh.validate()?;

        // Only keep file normals when every position maps to exactly one normal
        if !data.normal.is_empty() {
            let mut normals: Vec<Option<usize>> = vec![None; mesh.vertex_count()];
            let mut consistent = true;
            for (face, chunk) in mesh.faces.iter().zip(corner_normals.chunks(3)) {
                for (&vertex, &normal) in face.iter().zip(chunk) {
                    match (normals[vertex], normal) {
                        (_, None) => consistent = false,
                        (None, Some(n)) => normals[vertex] = Some(n),
                        (Some(existing), Some(n)) if existing != n => consistent = false,
                        _ => {}
                    }
                }
            }
            if consistent {
                let resolved: Option<Vec<Vector3f>> = normals
                    .iter()
                    .map(|n| n.and_then(|i| data.normal.get(i)).map(|n| Vector3f::new(n[0], n[1], n[2])))
                    .collect();
                if let Some(resolved) = resolved {
                    mesh.set_normals(resolved);
                }
            }
        }

        Ok(mesh)
    }
}
