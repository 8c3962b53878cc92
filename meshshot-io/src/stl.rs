//! STL format support (binary and ASCII)

use crate::MeshReader;
use meshshot_core::{Error, Point3f, Result, TriangleMesh};
use nom::{
    bytes::complete::tag,
    character::complete::{multispace0, multispace1, not_line_ending},
    multi::many0,
    number::complete::float,
    sequence::preceded,
    IResult,
};
use std::collections::HashMap;
use std::path::Path;

pub struct StlReader;

const HEADER_LEN: usize = 80;
const TRIANGLE_LEN: usize = 50;

impl MeshReader for StlReader {
    fn read_mesh<P: AsRef<Path>>(path: P) -> Result<TriangleMesh> {
        let data = std::fs::read(path)?;
        parse_stl(&data)
    }
}

/// Detect and parse an STL buffer.
///
/// Binary files may also start with `solid`, so a buffer is only treated as
/// ASCII if it parses as ASCII; otherwise it is read as binary.
pub fn parse_stl(data: &[u8]) -> Result<TriangleMesh> {
    if data.starts_with(b"solid") {
        if let Ok(text) = std::str::from_utf8(data) {
            if let Ok(triangles) = parse_ascii_stl(text) {
                return Ok(weld(triangles));
            }
        }
    }

    parse_binary_stl(data).map(weld)
}

/// Parse a binary STL buffer into raw triangles
pub fn parse_binary_stl(data: &[u8]) -> Result<Vec<[Point3f; 3]>> {
    if data.len() < HEADER_LEN + 4 {
        return Err(Error::InvalidData("File too small to be a valid STL".to_string()));
    }

    let data = &data[HEADER_LEN..];
    let triangle_count = u32::from_le_bytes([data[0], data[1], data[2], data[3]]) as usize;
    let body = &data[4..];

    if body.len() < triangle_count.saturating_mul(TRIANGLE_LEN) {
        return Err(Error::InvalidData(format!(
            "STL declares {} triangles but only holds {} bytes of triangle data",
            triangle_count,
            body.len()
        )));
    }

    let read_f32 = |offset: usize| {
        f32::from_le_bytes([body[offset], body[offset + 1], body[offset + 2], body[offset + 3]])
    };

    let mut triangles = Vec::with_capacity(triangle_count);
    for i in 0..triangle_count {
        // Skip the 12-byte facet normal; normals are recomputed from geometry
        let base = i * TRIANGLE_LEN + 12;
        let mut corners = [Point3f::origin(); 3];
        for (k, corner) in corners.iter_mut().enumerate() {
            let offset = base + k * 12;
            *corner = Point3f::new(read_f32(offset), read_f32(offset + 4), read_f32(offset + 8));
        }
        triangles.push(corners);
    }

    Ok(triangles)
}

/// Parse an ASCII STL document into raw triangles
pub fn parse_ascii_stl(input: &str) -> Result<Vec<[Point3f; 3]>> {
    match ascii_solid(input) {
        Ok((_, triangles)) => Ok(triangles),
        Err(e) => Err(Error::InvalidData(format!("Failed to parse ASCII STL: {:?}", e))),
    }
}

fn ascii_solid(input: &str) -> IResult<&str, Vec<[Point3f; 3]>> {
    let (input, _) = preceded(multispace0, tag("solid"))(input)?;
    let (input, _) = not_line_ending(input)?; // Optional name
    let (input, triangles) = many0(facet)(input)?;
    let (input, _) = preceded(multispace0, tag("endsolid"))(input)?;
    Ok((input, triangles))
}

fn facet(input: &str) -> IResult<&str, [Point3f; 3]> {
    let (input, _) = preceded(multispace0, tag("facet"))(input)?;
    let (input, _) = preceded(multispace1, tag("normal"))(input)?;
    let (input, _) = vector3(input)?;
    let (input, _) = preceded(multispace0, tag("outer"))(input)?;
    let (input, _) = preceded(multispace1, tag("loop"))(input)?;
    let (input, v1) = vertex(input)?;
    let (input, v2) = vertex(input)?;
    let (input, v3) = vertex(input)?;
    let (input, _) = preceded(multispace0, tag("endloop"))(input)?;
    let (input, _) = preceded(multispace0, tag("endfacet"))(input)?;

    Ok((input, [v1, v2, v3]))
}

fn vertex(input: &str) -> IResult<&str, Point3f> {
    let (input, _) = preceded(multispace0, tag("vertex"))(input)?;
    let (input, (x, y, z)) = vector3(input)?;
    Ok((input, Point3f::new(x, y, z)))
}

fn vector3(input: &str) -> IResult<&str, (f32, f32, f32)> {
    let (input, _) = multispace0(input)?;
    let (input, x) = float(input)?;
    let (input, _) = multispace1(input)?;
    let (input, y) = float(input)?;
    let (input, _) = multispace1(input)?;
    let (input, z) = float(input)?;
    Ok((input, (x, y, z)))
}

/// Merge coincident corners so that neighbouring facets share vertices
fn weld(triangles: Vec<[Point3f; 3]>) -> TriangleMesh {
    let mut mesh = TriangleMesh::new();
    let mut index: HashMap<[u32; 3], usize> = HashMap::with_capacity(triangles.len());

    // -0.0 and 0.0 must hash the same
    let key = |p: &Point3f| [(p.x + 0.0).to_bits(), (p.y + 0.0).to_bits(), (p.z + 0.0).to_bits()];

    for corners in triangles {
        let mut face = [0usize; 3];
        for (slot, corner) in face.iter_mut().zip(corners.iter()) {
            *slot = *index
                .entry(key(corner))
                .or_insert_with(|| mesh.add_vertex(*corner));
        }
        mesh.add_face(face);
    }

    mesh
}

#[cfg(test)]
mod tests {
    use super::*;

    fn binary_stl(triangles: &[[[f32; 3]; 3]]) -> Vec<u8> {
        let mut data = vec![0u8; HEADER_LEN];
        data.extend_from_slice(&(triangles.len() as u32).to_le_bytes());
        for triangle in triangles {
            data.extend_from_slice(&[0u8; 12]);
            for corner in triangle {
                for c in corner {
                    data.extend_from_slice(&c.to_le_bytes());
                }
            }
            data.extend_from_slice(&[0u8; 2]);
        }
        data
    }

    #[test]
    fn test_parse_binary_header() {
        let mut data = vec![0u8; 84];
        data[80..84].copy_from_slice(&0u32.to_le_bytes());

        let mesh = parse_stl(&data).unwrap();
        assert_eq!(mesh.face_count(), 0);
    }

    #[test]
    fn test_binary_shared_corners_are_welded() {
        let data = binary_stl(&[
            [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 1.0, 0.0]],
            [[0.0, 0.0, 0.0], [1.0, 1.0, 0.0], [0.0, 1.0, -0.0]],
        ]);
        let mesh = parse_stl(&data).unwrap();
        assert_eq!(mesh.face_count(), 2);
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.faces[1], [0, 2, 3]);
    }

    #[test]
    fn test_truncated_binary_is_rejected() {
        let mut data = binary_stl(&[[[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]]]);
        data.truncate(data.len() - 10);
        assert!(parse_stl(&data).is_err());
        assert!(parse_stl(b"solid").is_err());
    }

    #[test]
    fn test_parse_named_ascii_solid() {
        let text = "solid cube_part\n\
            facet normal 0 0 1\n\
              outer loop\n\
                vertex 0 0 0\n\
                vertex 1 0 0\n\
                vertex 1 1 0\n\
              endloop\n\
            endfacet\n\
            facet normal 0 0 1\n\
              outer loop\n\
                vertex 0 0 0\n\
                vertex 1 1 0\n\
                vertex 0 1 0\n\
              endloop\n\
            endfacet\n\
            endsolid cube_part\n";
        let mesh = parse_stl(text.as_bytes()).unwrap();
        assert_eq!(mesh.face_count(), 2);
        assert_eq!(mesh.vertex_count(), 4);
        assert_eq!(mesh.vertices[2], Point3f::new(1.0, 1.0, 0.0));
    }

    #[test]
    fn test_binary_starting_with_solid_falls_back() {
        let mut data = binary_stl(&[[[0.0, 0.0, 0.0], [2.0, 0.0, 0.0], [0.0, 2.0, 0.0]]]);
        data[..5].copy_from_slice(b"solid");
        let mesh = parse_stl(&data).unwrap();
        assert_eq!(mesh.face_count(), 1);
        assert_eq!(mesh.vertices[1], Point3f::new(2.0, 0.0, 0.0));
    }
}
