//! Mesh serialization.
//!
//! The wire format is a little-endian binary image of the four element
//! arenas, including their tombstone layout, so a round trip reproduces the
//! exact same handles, connectivity, geometry and flags — never-reused
//! handles survive serialization.
//!
//! The header deliberately embeds an ASCII space and newline right after the
//! magic (the "separator probe"). Transports that strip or normalize
//! whitespace destroy the probe, and reading fails deterministically with
//! [`ReadResult::Error`] instead of silently producing a corrupt mesh.

use std::io::{self, Read, Write};

use byteorder::{LittleEndian, ReadBytesExt, WriteBytesExt};
use cgmath::{Point3, Vector2, Vector3};
use failure::Fail;
use fxhash::FxHashSet;
use log::debug;
use optional::Optioned as Opt;

use crate::{
    core::checked::Checked,
    core::{Edge, Face, HalfEdge, Vertex, WhiteBoxMesh},
    handle::{hsize, EdgeHandle, FaceHandle, Handle, HalfedgeHandle, VertexHandle},
};


/// Magic bytes, including the whitespace separator probe (`' '`, `'\n'`).
const MAGIC: [u8; 6] = [b'W', b'B', b'M', b' ', b'\n', 0x01];
const FOOTER: [u8; 5] = *b"WBEND";
const VERSION: u16 = 1;

/// Index sentinel for "no handle".
const NONE_IDX: u64 = u64::max_value();


/// Serialization error.
#[derive(Debug, Fail)]
pub enum Error {
    #[fail(display = "IO error: {}", _0)]
    Io(#[cause] io::Error),

    #[fail(display = "not a white box mesh stream (bad magic)")]
    BadMagic,

    #[fail(display = "unsupported white box mesh version {}", _0)]
    UnsupportedVersion(u16),

    #[fail(display = "corrupt white box mesh stream: {}", _0)]
    Corrupt(&'static str),
}

impl From<io::Error> for Error {
    fn from(src: io::Error) -> Self {
        Error::Io(src)
    }
}

/// Outcome of [`read_mesh`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadResult {
    /// A complete mesh was read and committed.
    Full,

    /// The input contained no bytes at all; the target mesh is untouched.
    Empty,

    /// The input was malformed or truncated; the target mesh is untouched.
    Error,
}


// ===============================================================================================
// ===== Writing
// ===============================================================================================

/// Serializes `mesh` into `writer`.
pub fn write_mesh<W: Write>(mesh: &WhiteBoxMesh, mut writer: W) -> Result<(), Error> {
    writer.write_all(&MAGIC)?;
    writer.write_u16::<LittleEndian>(VERSION)?;

    // vertices
    writer.write_u64::<LittleEndian>(u64::from(mesh.num_vertices()))?;
    for vh in mesh.vertices.handles() {
        let vertex = &mesh.vertices[vh];
        writer.write_u64::<LittleEndian>(u64::from(vh.idx()))?;
        write_point(&mut writer, vertex.position)?;
        write_opt_idx(&mut writer, vertex.outgoing.into_option().map(|he| he.idx()))?;
        writer.write_u8(vertex.hidden as u8)?;
    }

    // halfedges
    writer.write_u64::<LittleEndian>(u64::from(mesh.num_halfedges()))?;
    for heh in mesh.half_edges.handles() {
        let halfedge = &mesh.half_edges[heh];
        writer.write_u64::<LittleEndian>(u64::from(heh.idx()))?;
        writer.write_u64::<LittleEndian>(u64::from(halfedge.target.idx()))?;
        write_opt_idx(&mut writer, halfedge.face.into_option().map(|f| f.idx()))?;
        writer.write_u64::<LittleEndian>(u64::from(halfedge.next.idx()))?;
        writer.write_f32::<LittleEndian>(halfedge.uv.x)?;
        writer.write_f32::<LittleEndian>(halfedge.uv.y)?;
    }

    // edges
    writer.write_u64::<LittleEndian>(u64::from(mesh.num_edges()))?;
    for eh in mesh.edges.handles() {
        writer.write_u64::<LittleEndian>(u64::from(eh.idx()))?;
        writer.write_u8(mesh.edges[eh].hidden as u8)?;
    }

    // faces
    writer.write_u64::<LittleEndian>(u64::from(mesh.num_faces()))?;
    for fh in mesh.faces.handles() {
        let face = &mesh.faces[fh];
        writer.write_u64::<LittleEndian>(u64::from(fh.idx()))?;
        writer.write_u64::<LittleEndian>(u64::from(face.edge.idx()))?;
        write_vector(&mut writer, face.normal)?;
    }

    writer.write_all(&FOOTER)?;
    Ok(())
}

/// Serializes `mesh` into a fresh byte buffer.
pub fn write_mesh_to_vec(mesh: &WhiteBoxMesh) -> Result<Vec<u8>, Error> {
    let mut buffer = Vec::new();
    write_mesh(mesh, &mut buffer)?;
    Ok(buffer)
}

fn write_point<W: Write>(writer: &mut W, p: Point3<f32>) -> Result<(), Error> {
    writer.write_f32::<LittleEndian>(p.x)?;
    writer.write_f32::<LittleEndian>(p.y)?;
    writer.write_f32::<LittleEndian>(p.z)?;
    Ok(())
}

fn write_vector<W: Write>(writer: &mut W, v: Vector3<f32>) -> Result<(), Error> {
    writer.write_f32::<LittleEndian>(v.x)?;
    writer.write_f32::<LittleEndian>(v.y)?;
    writer.write_f32::<LittleEndian>(v.z)?;
    Ok(())
}

fn write_opt_idx<W: Write>(writer: &mut W, idx: Option<hsize>) -> Result<(), Error> {
    let raw = idx.map(u64::from).unwrap_or(NONE_IDX);
    writer.write_u64::<LittleEndian>(raw)?;
    Ok(())
}


// ===============================================================================================
// ===== Reading
// ===============================================================================================

/// Deserializes a mesh from `reader` into `mesh`.
///
/// The incoming data is parsed and cross-validated in full before anything
/// is committed: on [`ReadResult::Error`] the target mesh is left exactly as
/// it was.
pub fn read_mesh<R: Read>(mesh: &mut WhiteBoxMesh, mut reader: R) -> ReadResult {
    // distinguish "no data at all" from a truncated stream
    let mut first = [0u8; 1];
    match reader.read(&mut first) {
        Ok(0) => return ReadResult::Empty,
        Ok(_) => {}
        Err(_) => return ReadResult::Error,
    }

    match parse_mesh(first[0], reader) {
        Ok(parsed) => {
            *mesh = parsed;
            ReadResult::Full
        }
        Err(err) => {
            debug!("read_mesh failed: {}", err);
            ReadResult::Error
        }
    }
}

/// Deserializes a mesh from an in-memory buffer.
pub fn read_mesh_from_slice(mesh: &mut WhiteBoxMesh, input: &[u8]) -> ReadResult {
    read_mesh(mesh, input)
}

fn parse_mesh<R: Read>(first_byte: u8, mut reader: R) -> Result<WhiteBoxMesh, Error> {
    let mut magic_rest = [0u8; 5];
    reader.read_exact(&mut magic_rest)?;
    if first_byte != MAGIC[0] || magic_rest[..] != MAGIC[1..] {
        return Err(Error::BadMagic);
    }

    let version = reader.read_u16::<LittleEndian>()?;
    if version != VERSION {
        return Err(Error::UnsupportedVersion(version));
    }

    // ----- raw sections --------------------------------------------------
    struct RawVertex {
        idx: hsize,
        position: Point3<f32>,
        outgoing: Option<hsize>,
        hidden: bool,
    }
    struct RawHalfedge {
        idx: hsize,
        target: hsize,
        face: Option<hsize>,
        next: hsize,
        uv: Vector2<f32>,
    }
    struct RawEdge {
        idx: hsize,
        hidden: bool,
    }
    struct RawFace {
        idx: hsize,
        edge: hsize,
        normal: Vector3<f32>,
    }

    let num_vertices = read_count(&mut reader)?;
    let mut vertices = Vec::with_capacity(num_vertices);
    for _ in 0..num_vertices {
        vertices.push(RawVertex {
            idx: read_idx(&mut reader)?,
            position: read_point(&mut reader)?,
            outgoing: read_opt_idx(&mut reader)?,
            hidden: read_bool(&mut reader)?,
        });
    }

    let num_halfedges = read_count(&mut reader)?;
    let mut halfedges = Vec::with_capacity(num_halfedges);
    for _ in 0..num_halfedges {
        halfedges.push(RawHalfedge {
            idx: read_idx(&mut reader)?,
            target: read_idx(&mut reader)?,
            face: read_opt_idx(&mut reader)?,
            next: read_idx(&mut reader)?,
            uv: Vector2::new(
                reader.read_f32::<LittleEndian>()?,
                reader.read_f32::<LittleEndian>()?,
            ),
        });
    }

    let num_edges = read_count(&mut reader)?;
    let mut edges = Vec::with_capacity(num_edges);
    for _ in 0..num_edges {
        edges.push(RawEdge {
            idx: read_idx(&mut reader)?,
            hidden: read_bool(&mut reader)?,
        });
    }

    let num_faces = read_count(&mut reader)?;
    let mut faces = Vec::with_capacity(num_faces);
    for _ in 0..num_faces {
        faces.push(RawFace {
            idx: read_idx(&mut reader)?,
            edge: read_idx(&mut reader)?,
            normal: read_vector(&mut reader)?,
        });
    }

    let mut footer = [0u8; 5];
    reader.read_exact(&mut footer)?;
    if footer != FOOTER {
        return Err(Error::Corrupt("footer mismatch"));
    }

    // ----- cross-validation ----------------------------------------------
    let vertex_set: FxHashSet<hsize> = vertices.iter().map(|v| v.idx).collect();
    let halfedge_set: FxHashSet<hsize> = halfedges.iter().map(|he| he.idx).collect();
    let edge_set: FxHashSet<hsize> = edges.iter().map(|e| e.idx).collect();
    let face_set: FxHashSet<hsize> = faces.iter().map(|f| f.idx).collect();

    if vertex_set.len() != vertices.len()
        || halfedge_set.len() != halfedges.len()
        || edge_set.len() != edges.len()
        || face_set.len() != faces.len()
    {
        return Err(Error::Corrupt("duplicate element index"));
    }

    for vertex in &vertices {
        if let Some(outgoing) = vertex.outgoing {
            if !halfedge_set.contains(&outgoing) {
                return Err(Error::Corrupt("vertex outgoing halfedge does not exist"));
            }
        }
    }

    for halfedge in &halfedges {
        if !vertex_set.contains(&halfedge.target) {
            return Err(Error::Corrupt("halfedge target vertex does not exist"));
        }
        if !halfedge_set.contains(&halfedge.next) {
            return Err(Error::Corrupt("halfedge next handle does not exist"));
        }
        if !halfedge_set.contains(&(halfedge.idx ^ 1)) {
            return Err(Error::Corrupt("halfedge has no opposite twin"));
        }
        if !edge_set.contains(&(halfedge.idx / 2)) {
            return Err(Error::Corrupt("halfedge has no edge record"));
        }
        if let Some(face) = halfedge.face {
            if !face_set.contains(&face) {
                return Err(Error::Corrupt("halfedge face does not exist"));
            }
        }
    }

    for edge in &edges {
        if !halfedge_set.contains(&(edge.idx * 2)) || !halfedge_set.contains(&(edge.idx * 2 + 1)) {
            return Err(Error::Corrupt("edge record without halfedge pair"));
        }
    }

    for face in &faces {
        if !halfedge_set.contains(&face.edge) {
            return Err(Error::Corrupt("face halfedge does not exist"));
        }
    }

    // ----- commit ---------------------------------------------------------
    let mut mesh = WhiteBoxMesh::new();

    for vertex in vertices {
        mesh.vertices.insert(
            VertexHandle::new(vertex.idx),
            Vertex {
                position: vertex.position,
                outgoing: match vertex.outgoing {
                    Some(idx) => Opt::some(Checked(HalfedgeHandle::new(idx))),
                    None => Opt::none(),
                },
                hidden: vertex.hidden,
            },
        );
    }

    for halfedge in halfedges {
        mesh.half_edges.insert(
            HalfedgeHandle::new(halfedge.idx),
            HalfEdge {
                target: Checked(VertexHandle::new(halfedge.target)),
                face: match halfedge.face {
                    Some(idx) => Opt::some(Checked(FaceHandle::new(idx))),
                    None => Opt::none(),
                },
                next: Checked(HalfedgeHandle::new(halfedge.next)),
                uv: halfedge.uv,
            },
        );
    }

    for edge in edges {
        mesh.edges.insert(EdgeHandle::new(edge.idx), Edge { hidden: edge.hidden });
    }

    for face in faces {
        mesh.faces.insert(
            FaceHandle::new(face.idx),
            Face {
                edge: Checked(HalfedgeHandle::new(face.edge)),
                normal: face.normal,
            },
        );
    }

    Ok(mesh)
}

fn read_count<R: Read>(reader: &mut R) -> Result<usize, Error> {
    let raw = reader.read_u64::<LittleEndian>()?;
    if raw > hsize::max_value() as u64 {
        return Err(Error::Corrupt("element count out of range"));
    }

    Ok(raw as usize)
}

fn read_idx<R: Read>(reader: &mut R) -> Result<hsize, Error> {
    match read_opt_idx(reader)? {
        Some(idx) => Ok(idx),
        None => Err(Error::Corrupt("unexpected none-handle")),
    }
}

fn read_opt_idx<R: Read>(reader: &mut R) -> Result<Option<hsize>, Error> {
    let raw = reader.read_u64::<LittleEndian>()?;
    if raw == NONE_IDX {
        return Ok(None);
    }
    if raw >= hsize::max_value() as u64 {
        return Err(Error::Corrupt("handle index out of range"));
    }

    Ok(Some(raw as hsize))
}

fn read_bool<R: Read>(reader: &mut R) -> Result<bool, Error> {
    match reader.read_u8()? {
        0 => Ok(false),
        1 => Ok(true),
        _ => Err(Error::Corrupt("flag byte out of range")),
    }
}

fn read_point<R: Read>(reader: &mut R) -> Result<Point3<f32>, Error> {
    Ok(Point3::new(
        reader.read_f32::<LittleEndian>()?,
        reader.read_f32::<LittleEndian>()?,
        reader.read_f32::<LittleEndian>()?,
    ))
}

fn read_vector<R: Read>(reader: &mut R) -> Result<Vector3<f32>, Error> {
    Ok(Vector3::new(
        reader.read_f32::<LittleEndian>()?,
        reader.read_f32::<LittleEndian>()?,
        reader.read_f32::<LittleEndian>()?,
    ))
}
