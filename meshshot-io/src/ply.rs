//! PLY format support

use crate::{MeshReader, MeshWriter};
use meshshot_core::{Error, Point3f, Result, TriangleMesh, Vector3f};
use ply_rs::{
    parser::Parser,
    ply::{
        Addable, DefaultElement, ElementDef, Encoding, Ply, Property, PropertyDef, PropertyType,
        ScalarType,
    },
    writer::Writer,
};
use std::fs::File;
use std::io::{BufReader, BufWriter, Write};
use std::path::Path;

pub struct PlyReader;
pub struct PlyWriter;

impl MeshReader for PlyReader {
    fn read_mesh<P: AsRef<Path>>(path: P) -> Result<TriangleMesh> {
        let file = File::open(path)?;
        let mut reader = BufReader::new(file);

        let parser = Parser::<DefaultElement>::new();
        let ply = parser.read_ply(&mut reader)?;

        let vertex_elements = ply.payload.get("vertex").map(Vec::as_slice).unwrap_or(&[]);

        let mut vertices = Vec::with_capacity(vertex_elements.len());
        for vertex in vertex_elements {
            let x = extract_property_value(vertex, "x")?;
            let y = extract_property_value(vertex, "y")?;
            let z = extract_property_value(vertex, "z")?;
            vertices.push(Point3f::new(x, y, z));
        }

        // Polygons are fanned into triangles
        let mut faces = Vec::new();
        if let Some(face_element) = ply.payload.get("face") {
            for face in face_element {
                let indices = extract_face_indices(face)?;
                for i in 1..indices.len().saturating_sub(1) {
                    faces.push([indices[0], indices[i], indices[i + 1]]);
                }
            }
        }

        let normals: Option<Vec<Vector3f>> = vertex_elements
            .iter()
            .map(|vertex| {
                let nx = extract_property_value(vertex, "nx").ok()?;
                let ny = extract_property_value(vertex, "ny").ok()?;
                let nz = extract_property_value(vertex, "nz").ok()?;
                Some(Vector3f::new(nx, ny, nz))
            })
            .collect();

        let colors: Option<Vec<[u8; 3]>> = vertex_elements
            .iter()
            .map(|vertex| {
                Some([
                    extract_color_channel(vertex, "red")?,
                    extract_color_channel(vertex, "green")?,
                    extract_color_channel(vertex, "blue")?,
                ])
            })
            .collect();

        let mut mesh = TriangleMesh::from_vertices_and_faces(vertices, faces);
        mesh.validate()?;
        if let Some(normals) = normals.filter(|n| !n.is_empty()) {
            mesh.set_normals(normals);
        }
        if let Some(colors) = colors.filter(|c| !c.is_empty()) {
            mesh.set_colors(colors);
        }

        Ok(mesh)
    }
}

impl MeshWriter for PlyWriter {
    fn write_mesh<P: AsRef<Path>>(mesh: &TriangleMesh, path: P) -> Result<()> {
        let file = File::create(path)?;
        let mut writer = BufWriter::new(file);

        let mut ply = Ply::<DefaultElement>::new();
        ply.header.encoding = Encoding::BinaryLittleEndian;

        let mut vertex_element = ElementDef::new("vertex".to_string());
        vertex_element.count = mesh.vertices.len();
        let float = PropertyType::Scalar(ScalarType::Float);
        for name in ["x", "y", "z"] {
            vertex_element.properties.add(PropertyDef::new(name.to_string(), float.clone()));
        }
        if mesh.normals.is_some() {
            for name in ["nx", "ny", "nz"] {
                vertex_element.properties.add(PropertyDef::new(name.to_string(), float.clone()));
            }
        }
        if mesh.colors.is_some() {
            for name in ["red", "green", "blue"] {
                vertex_element.properties.add(PropertyDef::new(
                    name.to_string(),
                    PropertyType::Scalar(ScalarType::UChar),
                ));
            }
        }
        ply.header.elements.add(vertex_element);

        let mut face_element = ElementDef::new("face".to_string());
        face_element.count = mesh.faces.len();
        face_element.properties.add(PropertyDef::new(
            "vertex_indices".to_string(),
            PropertyType::List(ScalarType::UChar, ScalarType::Int),
        ));
        ply.header.elements.add(face_element);

        let mut vertices = Vec::with_capacity(mesh.vertices.len());
        for (i, vertex) in mesh.vertices.iter().enumerate() {
            let mut element = DefaultElement::new();
            element.insert("x".to_string(), Property::Float(vertex.x));
            element.insert("y".to_string(), Property::Float(vertex.y));
            element.insert("z".to_string(), Property::Float(vertex.z));

            if let Some(normal) = mesh.normals.as_ref().and_then(|n| n.get(i)) {
                element.insert("nx".to_string(), Property::Float(normal.x));
                element.insert("ny".to_string(), Property::Float(normal.y));
                element.insert("nz".to_string(), Property::Float(normal.z));
            }
            if let Some(color) = mesh.colors.as_ref().and_then(|c| c.get(i)) {
                element.insert("red".to_string(), Property::UChar(color[0]));
                element.insert("green".to_string(), Property::UChar(color[1]));
                element.insert("blue".to_string(), Property::UChar(color[2]));
            }

            vertices.push(element);
        }
        ply.payload.insert("vertex".to_string(), vertices);

        let mut faces = Vec::with_capacity(mesh.faces.len());
        for face in &mesh.faces {
            let mut element = DefaultElement::new();
            let indices = face
                .iter()
                .map(|&i| {
                    i32::try_from(i).map_err(|_| {
                        Error::InvalidData(format!("Vertex index {} does not fit a PLY int", i))
                    })
                })
                .collect::<Result<Vec<i32>>>()?;
            element.insert("vertex_indices".to_string(), Property::ListInt(indices));
            faces.push(element);
        }
        ply.payload.insert("face".to_string(), faces);

        let writer_instance = Writer::new();
        writer_instance.write_ply(&mut writer, &mut ply)?;
        writer.flush()?;

        Ok(())
    }
}

/// Extract a property value as f32 from a PLY element
fn extract_property_value(element: &DefaultElement, name: &str) -> Result<f32> {
    match element.get(name) {
        Some(Property::Float(val)) => Ok(*val),
        Some(Property::Double(val)) => Ok(*val as f32),
        Some(Property::Int(val)) => Ok(*val as f32),
        Some(Property::UInt(val)) => Ok(*val as f32),
        Some(Property::Short(val)) => Ok(*val as f32),
        Some(Property::UShort(val)) => Ok(*val as f32),
        Some(Property::Char(val)) => Ok(*val as f32),
        Some(Property::UChar(val)) => Ok(*val as f32),
        _ => Err(Error::InvalidData(format!(
            "Property '{}' not found or invalid type",
            name
        ))),
    }
}

fn extract_color_channel(element: &DefaultElement, name: &str) -> Option<u8> {
    match element.get(name)? {
        Property::UChar(val) => Some(*val),
        Property::Float(val) => Some((val.clamp(0.0, 1.0) * 255.0).round() as u8),
        Property::Double(val) => Some((val.clamp(0.0, 1.0) * 255.0).round() as u8),
        _ => None,
    }
}

/// Extract face indices from a PLY face element
fn extract_face_indices(element: &DefaultElement) -> Result<Vec<usize>> {
    let property = element
        .get("vertex_indices")
        .or_else(|| element.get("vertex_index"));

    let indices: Vec<i64> = match property {
        Some(Property::ListInt(indices)) => indices.iter().map(|&i| i as i64).collect(),
        Some(Property::ListUInt(indices)) => indices.iter().map(|&i| i as i64).collect(),
        Some(Property::ListShort(indices)) => indices.iter().map(|&i| i as i64).collect(),
        Some(Property::ListUShort(indices)) => indices.iter().map(|&i| i as i64).collect(),
        Some(Property::ListChar(indices)) => indices.iter().map(|&i| i as i64).collect(),
        Some(Property::ListUChar(indices)) => indices.iter().map(|&i| i as i64).collect(),
        _ => {
            return Err(Error::InvalidData("Face indices not found".to_string()));
        }
    };

    indices
        .into_iter()
        .map(|i| {
            usize::try_from(i)
                .map_err(|_| Error::InvalidData(format!("Negative face index {}", i)))
        })
        .collect()
}
