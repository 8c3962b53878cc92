//! Gmsh `.msh` volume meshes (ASCII 2.2 and 4.1)
//!
//! A volume mesh cannot be drawn directly. [`GmshMesh::boundary_surface`]
//! keeps the 2D cells and the faces of volume cells that belong to exactly
//! one cell, which together form the visible surface.

use crate::loader::MeshConverter;
use crate::ply::PlyWriter;
use crate::MeshWriter;
use meshshot_core::{Error, Point3f, Result, TriangleMesh};
use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};

/// Cell shapes that contribute to the surface. Higher-order variants map to
/// the same shape and only their corner nodes are used.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CellKind {
    Triangle,
    Quad,
    Tetrahedron,
    Hexahedron,
    Prism,
    Pyramid,
}

impl CellKind {
    /// Map a Gmsh element type number
    pub fn from_gmsh_type(element_type: u32) -> Option<Self> {
        match element_type {
            2 | 9 | 20 | 21 | 22 | 23 | 24 | 25 => Some(CellKind::Triangle),
            3 | 10 | 16 => Some(CellKind::Quad),
            4 | 11 | 29 | 30 | 31 => Some(CellKind::Tetrahedron),
            5 | 12 | 17 => Some(CellKind::Hexahedron),
            6 | 13 | 18 => Some(CellKind::Prism),
            7 | 14 | 19 => Some(CellKind::Pyramid),
            _ => None,
        }
    }

    pub fn corner_count(self) -> usize {
        match self {
            CellKind::Triangle => 3,
            CellKind::Quad | CellKind::Tetrahedron => 4,
            CellKind::Pyramid => 5,
            CellKind::Prism => 6,
            CellKind::Hexahedron => 8,
        }
    }

    pub fn is_volume(self) -> bool {
        !matches!(self, CellKind::Triangle | CellKind::Quad)
    }

    /// Faces as corner positions, ordered so that normals point outwards
    fn faces(self) -> &'static [&'static [usize]] {
        match self {
            CellKind::Triangle => &[&[0, 1, 2]],
            CellKind::Quad => &[&[0, 1, 2, 3]],
            CellKind::Tetrahedron => &[&[0, 2, 1], &[0, 1, 3], &[0, 3, 2], &[1, 2, 3]],
            CellKind::Hexahedron => &[
                &[0, 3, 2, 1],
                &[4, 5, 6, 7],
                &[0, 1, 5, 4],
                &[1, 2, 6, 5],
                &[2, 3, 7, 6],
                &[3, 0, 4, 7],
            ],
            CellKind::Prism => &[
                &[0, 2, 1],
                &[3, 4, 5],
                &[0, 1, 4, 3],
                &[1, 2, 5, 4],
                &[2, 0, 3, 5],
            ],
            CellKind::Pyramid => &[
                &[0, 3, 2, 1],
                &[0, 1, 4],
                &[1, 2, 4],
                &[2, 3, 4],
                &[3, 0, 4],
            ],
        }
    }
}

/// A cell with its corner node tags
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub kind: CellKind,
    pub nodes: Vec<usize>,
}

/// Nodes and surface-relevant cells of a Gmsh file
#[derive(Debug, Clone, Default)]
pub struct GmshMesh {
    pub nodes: HashMap<usize, Point3f>,
    pub cells: Vec<Cell>,
}

impl GmshMesh {
    /// Parse an ASCII `.msh` document
    pub fn parse(text: &str) -> Result<Self> {
        let sections = sections(text)?;

        let format = sections
            .get("MeshFormat")
            .ok_or_else(|| invalid("missing $MeshFormat section"))?;
        let header = format.first().copied().unwrap_or_default();
        let mut fields = header.split_whitespace();
        let version = fields.next().unwrap_or_default();
        let file_type = fields.next().unwrap_or_default();
        if file_type != "0" {
            return Err(Error::UnsupportedFormat(
                "binary .msh files are not supported".to_string(),
            ));
        }

        let nodes = sections
            .get("Nodes")
            .ok_or_else(|| invalid("missing $Nodes section"))?;
        let elements = sections
            .get("Elements")
            .ok_or_else(|| invalid("missing $Elements section"))?;

        let mesh = if version.starts_with("2.") {
            GmshMesh {
                nodes: parse_nodes_v2(nodes)?,
                cells: parse_elements_v2(elements)?,
            }
        } else if version.starts_with("4.") {
            GmshMesh {
                nodes: parse_nodes_v4(nodes)?,
                cells: parse_elements_v4(elements)?,
            }
        } else {
            return Err(Error::UnsupportedFormat(format!(
                "MSH version {} is not supported",
                version
            )));
        };

        log::debug!(
            "Parsed MSH {} with {} nodes and {} cells",
            version,
            mesh.nodes.len(),
            mesh.cells.len()
        );
        Ok(mesh)
    }

    /// Extract the outer surface as a triangle mesh
    pub fn boundary_surface(&self) -> Result<TriangleMesh> {
        // Sorted corner tags identify a face regardless of winding
        let key = |face: &[usize]| {
            let mut key = face.to_vec();
            key.sort_unstable();
            key
        };

        let mut polygons: Vec<Vec<usize>> = Vec::new();
        let mut seen_2d: HashSet<Vec<usize>> = HashSet::new();
        for cell in self.cells.iter().filter(|c| !c.kind.is_volume()) {
            if seen_2d.insert(key(&cell.nodes)) {
                polygons.push(cell.nodes.clone());
            }
        }

        let mut volume_faces: HashMap<Vec<usize>, (Vec<usize>, usize)> = HashMap::new();
        let mut order = Vec::new();
        for cell in self.cells.iter().filter(|c| c.kind.is_volume()) {
            for local in cell.kind.faces() {
                let face: Vec<usize> = local.iter().map(|&i| cell.nodes[i]).collect();
                let k = key(&face);
                let entry = volume_faces.entry(k.clone()).or_insert_with(|| {
                    order.push(k);
                    (face, 0)
                });
                entry.1 += 1;
            }
        }
        for k in order {
            if seen_2d.contains(&k) {
                continue;
            }
            if let Some((face, 1)) = volume_faces.remove(&k) {
                polygons.push(face);
            }
        }

        let mut mesh = TriangleMesh::new();
        let mut index: HashMap<usize, usize> = HashMap::new();
        for polygon in polygons {
            let mut corners = Vec::with_capacity(polygon.len());
            for tag in polygon {
                let vertex = match index.get(&tag) {
                    Some(&i) => i,
                    None => {
                        let point = self
                            .nodes
                            .get(&tag)
                            .ok_or_else(|| invalid(&format!("cell references unknown node {}", tag)))?;
                        let i = mesh.add_vertex(*point);
                        index.insert(tag, i);
                        i
                    }
                };
                corners.push(vertex);
            }
            for i in 1..corners.len() - 1 {
                mesh.add_face([corners[0], corners[i], corners[i + 1]]);
            }
        }

        Ok(mesh)
    }
}

/// Converts `.msh` files into a PLY surface
#[derive(Debug, Clone, Copy, Default)]
pub struct GmshConverter;

impl MeshConverter for GmshConverter {
    fn name(&self) -> &str {
        "gmsh"
    }

    fn accepts(&self, path: &Path) -> bool {
        crate::extension(path).as_deref() == Some("msh")
    }

    fn convert(&self, source: &Path, target_dir: &Path) -> Result<PathBuf> {
        let text = std::fs::read_to_string(source)?;
        let surface = GmshMesh::parse(&text)?.boundary_surface()?;
        if surface.is_empty() {
            return Err(invalid("no surface cells found"));
        }

        let target = target_dir.join("converted_mesh.ply");
        PlyWriter::write_mesh(&surface, &target)?;
        log::debug!(
            "Converted {} to {} ({} triangles)",
            source.display(),
            target.display(),
            surface.face_count()
        );
        Ok(target)
    }
}

fn invalid(message: &str) -> Error {
    Error::InvalidData(format!("Invalid MSH file: {}", message))
}

/// Split a document into `$Name ... $EndName` sections of non-empty lines
fn sections(text: &str) -> Result<HashMap<&str, Vec<&str>>> {
    let mut sections = HashMap::new();
    let mut lines = text.lines().map(str::trim).filter(|l| !l.is_empty());

    while let Some(line) = lines.next() {
        let Some(name) = line.strip_prefix('$') else {
            continue;
        };
        let end = format!("$End{}", name);
        let mut body = Vec::new();
        loop {
            match lines.next() {
                Some(l) if l == end => break,
                Some(l) => body.push(l),
                None => return Err(invalid(&format!("unterminated section ${}", name))),
            }
        }
        sections.insert(name, body);
    }

    Ok(sections)
}

/// Whitespace-separated numbers of one line
fn numbers<T: std::str::FromStr>(line: &str) -> Result<Vec<T>> {
    line.split_whitespace()
        .map(|token| {
            token
                .parse()
                .map_err(|_| invalid(&format!("unexpected token '{}'", token)))
        })
        .collect()
}

fn point(values: &[f64]) -> Result<Point3f> {
    match values {
        [x, y, z, ..] => Ok(Point3f::new(*x as f32, *y as f32, *z as f32)),
        _ => Err(invalid("node with fewer than three coordinates")),
    }
}

fn cell(element_type: u32, nodes: &[usize]) -> Result<Option<Cell>> {
    let Some(kind) = CellKind::from_gmsh_type(element_type) else {
        return Ok(None);
    };
    if nodes.len() < kind.corner_count() {
        return Err(invalid(&format!(
            "element of type {} lists {} nodes",
            element_type,
            nodes.len()
        )));
    }
    Ok(Some(Cell {
        kind,
        nodes: nodes[..kind.corner_count()].to_vec(),
    }))
}

fn parse_nodes_v2(lines: &[&str]) -> Result<HashMap<usize, Point3f>> {
    let (count_line, rest) = lines.split_first().ok_or_else(|| invalid("empty $Nodes"))?;
    let count: usize = count_line.trim().parse().map_err(|_| invalid("bad node count"))?;
    if rest.len() < count {
        return Err(invalid("fewer nodes than declared"));
    }

    let mut nodes = HashMap::with_capacity(count);
    for line in &rest[..count] {
        // id x y z
        let (tag, coords) = line
            .split_once(char::is_whitespace)
            .ok_or_else(|| invalid("bad node line"))?;
        let tag: usize = tag.parse().map_err(|_| invalid("bad node tag"))?;
        nodes.insert(tag, point(&numbers::<f64>(coords)?)?);
    }
    Ok(nodes)
}

fn parse_elements_v2(lines: &[&str]) -> Result<Vec<Cell>> {
    let (count_line, rest) = lines.split_first().ok_or_else(|| invalid("empty $Elements"))?;
    let count: usize = count_line.trim().parse().map_err(|_| invalid("bad element count"))?;
    if rest.len() < count {
        return Err(invalid("fewer elements than declared"));
    }

    let mut cells = Vec::new();
    for line in &rest[..count] {
        // id type tag-count tags... nodes...
        let values: Vec<usize> = numbers(line)?;
        if values.len() < 3 {
            return Err(invalid("truncated element"));
        }
        let element_type = values[1] as u32;
        let node_start = values[2]
            .checked_add(3)
            .ok_or_else(|| invalid("bad element tag count"))?;
        let nodes = values.get(node_start..).unwrap_or(&[]);
        if let Some(cell) = cell(element_type, nodes)? {
            cells.push(cell);
        }
    }
    Ok(cells)
}

fn parse_nodes_v4(lines: &[&str]) -> Result<HashMap<usize, Point3f>> {
    let mut lines = lines.iter();
    let header: Vec<usize> = numbers(lines.next().ok_or_else(|| invalid("empty $Nodes"))?)?;
    let (blocks, total) = match header.as_slice() {
        [blocks, total, ..] => (*blocks, *total),
        _ => return Err(invalid("bad $Nodes header")),
    };

    // Counts come from the file; a node takes at least two lines
    let mut nodes = HashMap::with_capacity(total.min(lines.len() / 2));
    for _ in 0..blocks {
        // entityDim entityTag parametric count
        let block: Vec<usize> = numbers(lines.next().ok_or_else(|| invalid("missing node block"))?)?;
        let count = *block.get(3).ok_or_else(|| invalid("bad node block header"))?;

        let mut tags = Vec::with_capacity(count.min(lines.len()));
        for _ in 0..count {
            let line = lines.next().ok_or_else(|| invalid("missing node tag"))?;
            tags.push(line.trim().parse::<usize>().map_err(|_| invalid("bad node tag"))?);
        }
        for tag in tags {
            let line = lines.next().ok_or_else(|| invalid("missing node coordinates"))?;
            nodes.insert(tag, point(&numbers::<f64>(line)?)?);
        }
    }
    Ok(nodes)
}

fn parse_elements_v4(lines: &[&str]) -> Result<Vec<Cell>> {
    let mut lines = lines.iter();
    let header: Vec<usize> = numbers(lines.next().ok_or_else(|| invalid("empty $Elements"))?)?;
    let blocks = *header.first().ok_or_else(|| invalid("bad $Elements header"))?;

    let mut cells = Vec::new();
    for _ in 0..blocks {
        // entityDim entityTag elementType count
        let block: Vec<usize> =
            numbers(lines.next().ok_or_else(|| invalid("missing element block"))?)?;
        let (element_type, count) = match block.as_slice() {
            [_, _, element_type, count] => (*element_type as u32, *count),
            _ => return Err(invalid("bad element block header")),
        };
        for _ in 0..count {
            let line = lines.next().ok_or_else(|| invalid("missing element"))?;
            let values: Vec<usize> = numbers(line)?;
            if let Some(cell) = cell(element_type, values.get(1..).unwrap_or(&[]))? {
                cells.push(cell);
            }
        }
    }
    Ok(cells)
}

#[cfg(test)]
mod tests {
    use super::*;
    use approx::assert_relative_eq;
    use meshshot_core::Drawable;

    const TWO_TETS_V2: &str = "$MeshFormat\n2.2 0 8\n$EndMeshFormat\n\
$Nodes\n5\n1 0 0 0\n2 1 0 0\n3 0 1 0\n4 0 0 1\n5 1 1 1\n$EndNodes\n\
$Elements\n3\n\
1 15 2 0 1 1\n\
2 4 2 0 1 1 2 3 4\n\
3 4 2 0 1 2 3 4 5\n\
$EndElements\n";

    #[test]
    fn test_shared_face_is_interior() {
        let mesh = GmshMesh::parse(TWO_TETS_V2).unwrap();
        assert_eq!(mesh.cells.len(), 2);

        let surface = mesh.boundary_surface().unwrap();
        // 8 faces total, the face 2-3-4 is shared
        assert_eq!(surface.face_count(), 6);
        assert_eq!(surface.vertex_count(), 5);
    }

    #[test]
    fn test_tetrahedron_faces_point_outwards() {
        let text = "$MeshFormat\n2.2 0 8\n$EndMeshFormat\n\
$Nodes\n4\n1 0 0 0\n2 1 0 0\n3 0 1 0\n4 0 0 1\n$EndNodes\n\
$Elements\n1\n1 4 0 1 2 3 4\n$EndElements\n";
        let surface = GmshMesh::parse(text).unwrap().boundary_surface().unwrap();
        let centroid = |points: &mut dyn Iterator<Item = Point3f>| {
            let (sum, n) = points.fold((Point3f::origin().coords, 0.0), |(s, n), p| (s + p.coords, n + 1.0));
            sum / n
        };
        let center = centroid(&mut surface.vertices.iter().copied());

        for (face, normal) in surface.faces.iter().zip(surface.calculate_face_normals()) {
            let face_center = centroid(&mut face.iter().map(|&i| surface.vertices[i]));
            let outward = face_center - center;
            assert!(normal.dot(&outward) > 0.0);
        }
    }

    #[test]
    fn test_v4_hexahedron_with_boundary_quads() {
        // A unit cube as one hex plus its bottom face tagged as a quad
        let text = "$MeshFormat\n4.1 0 8\n$EndMeshFormat\n\
$Entities\n0 0 0 1\n1 0 0 0 1 1 1 0 0\n$EndEntities\n\
$Nodes\n1 8 1 8\n3 1 0 8\n1\n2\n3\n4\n5\n6\n7\n8\n\
0 0 0\n1 0 0\n1 1 0\n0 1 0\n0 0 1\n1 0 1\n1 1 1\n0 1 1\n$EndNodes\n\
$Elements\n2 2 1 2\n\
2 1 3 1\n1 1 4 3 2\n\
3 1 5 1\n2 1 2 3 4 5 6 7 8\n\
$EndElements\n";
        let mesh = GmshMesh::parse(text).unwrap();
        assert_eq!(mesh.nodes.len(), 8);
        assert_eq!(mesh.cells[0].kind, CellKind::Quad);
        assert_eq!(mesh.cells[1].kind, CellKind::Hexahedron);

        let surface = mesh.boundary_surface().unwrap();
        // 6 cube sides split in two, the tagged bottom is not duplicated
        assert_eq!(surface.face_count(), 12);
        let (min, max) = surface.bounding_box();
        assert_relative_eq!(min, Point3f::new(0.0, 0.0, 0.0));
        assert_relative_eq!(max, Point3f::new(1.0, 1.0, 1.0));
    }

    #[test]
    fn test_second_order_cells_use_corners() {
        let text = "$MeshFormat\n2.2 0 8\n$EndMeshFormat\n\
$Nodes\n6\n1 0 0 0\n2 2 0 0\n3 0 2 0\n4 1 0 0\n5 1 1 0\n6 0 1 0\n$EndNodes\n\
$Elements\n1\n1 9 2 0 1 1 2 3 4 5 6\n$EndElements\n";
        let surface = GmshMesh::parse(text).unwrap().boundary_surface().unwrap();
        assert_eq!(surface.faces, vec![[0, 1, 2]]);
        assert_eq!(surface.vertex_count(), 3);
    }

    #[test]
    fn test_rejects_binary_and_broken_files() {
        let binary = "$MeshFormat\n4.1 1 8\n$EndMeshFormat\n";
        assert!(matches!(
            GmshMesh::parse(binary),
            Err(Error::UnsupportedFormat(_))
        ));

        let unterminated = "$MeshFormat\n2.2 0 8\n$EndMeshFormat\n$Nodes\n1\n1 0 0 0\n";
        assert!(GmshMesh::parse(unterminated).is_err());

        let unknown_node = "$MeshFormat\n2.2 0 8\n$EndMeshFormat\n\
$Nodes\n1\n1 0 0 0\n$EndNodes\n$Elements\n1\n1 2 0 1 2 3\n$EndElements\n";
        let mesh = GmshMesh::parse(unknown_node).unwrap();
        assert!(mesh.boundary_surface().is_err());
    }

    #[test]
    fn test_oversized_counts_do_not_allocate() {
        let huge_total = format!(
            "$MeshFormat\n4.1 0 8\n$EndMeshFormat\n$Nodes\n1 {} 1 1\n3 1 0 1\n1\n0 0 0\n$EndNodes\n\
$Elements\n0 0 0 0\n$EndElements\n",
            usize::MAX
        );
        let huge_block = format!(
            "$MeshFormat\n4.1 0 8\n$EndMeshFormat\n$Nodes\n1 1 1 1\n3 1 0 {}\n1\n0 0 0\n$EndNodes\n\
$Elements\n0 0 0 0\n$EndElements\n",
            usize::MAX
        );
        let huge_tags = format!(
            "$MeshFormat\n2.2 0 8\n$EndMeshFormat\n$Nodes\n1\n1 0 0 0\n$EndNodes\n\
$Elements\n1\n1 2 {} 1 1 1\n$EndElements\n",
            usize::MAX
        );

        assert!(matches!(GmshMesh::parse(&huge_total), Ok(mesh) if mesh.nodes.len() == 1));
        assert!(matches!(GmshMesh::parse(&huge_block), Err(Error::InvalidData(_))));
        assert!(matches!(GmshMesh::parse(&huge_tags), Err(Error::InvalidData(_))));
    }

    #[test]
    fn test_converter_writes_ply_into_target_dir() {
        let dir = tempfile::tempdir().unwrap();
        let source = dir.path().join("tets.MSH");
        std::fs::write(&source, TWO_TETS_V2).unwrap();
        let target_dir = tempfile::tempdir().unwrap();

        assert!(GmshConverter.accepts(&source));
        let target = GmshConverter.convert(&source, target_dir.path()).unwrap();
        assert!(target.starts_with(target_dir.path()));
        assert_eq!(crate::extension(&target).as_deref(), Some("ply"));
    }
}
