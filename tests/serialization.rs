//! Round-trip serialization and the wire format's whitespace fragility.

#![cfg(feature = "io")]

#[macro_use]
mod common;

use cgmath::Vector3;
use whitebox::io::{read_mesh_from_slice, write_mesh_to_vec, ReadResult};
use whitebox::prelude::*;
use whitebox::shape;

use common::*;


fn roundtrip(mesh: &WhiteBoxMesh) -> WhiteBoxMesh {
    let bytes = write_mesh_to_vec(mesh).expect("write never fails into memory");

    let mut restored = WhiteBoxMesh::new();
    assert_eq!(read_mesh_from_slice(&mut restored, &bytes), ReadResult::Full);
    restored
}

fn assert_identical(a: &WhiteBoxMesh, b: &WhiteBoxMesh) {
    assert_eq!(a.num_vertices(), b.num_vertices());
    assert_eq!(a.num_halfedges(), b.num_halfedges());
    assert_eq!(a.vertex_handles(), b.vertex_handles());
    assert_eq!(a.face_handles(), b.face_handles());
    assert_eq!(a.edge_handles(), b.edge_handles());
    assert_eq!(a.mesh_faces(), b.mesh_faces());

    let a_edges = a.mesh_user_edge_handles();
    let b_edges = b.mesh_user_edge_handles();
    assert_eq!(a_edges.user, b_edges.user);
    assert_eq!(a_edges.mesh, b_edges.mesh);

    for vh in a.vertex_handles() {
        assert_eq!(a.vertex_is_hidden(vh), b.vertex_is_hidden(vh));
        assert!(close(a.vertex_position(vh), b.vertex_position(vh)));
    }

    assert_eq!(a.mesh_polygon_handles(), b.mesh_polygon_handles());
}

#[test]
fn cube_roundtrip() {
    let mut mesh = WhiteBoxMesh::new();
    shape::unit_cube(&mut mesh);

    let restored = roundtrip(&mesh);
    assert_identical(&mesh, &restored);
}

#[test]
fn edited_mesh_roundtrip_preserves_sparse_handles() {
    let mut mesh = WhiteBoxMesh::new();
    let polygons = shape::unit_cube(&mut mesh);

    // extrude twice and hide an edge: the arenas now contain holes from the
    // removed cap faces, and a mix of hidden flags
    mesh.translate_polygon_append(&polygons[0], 1.0);
    let right =
        polygon_with_normal_near(&mesh, Vector3::unit_x(), cgmath::Point3::new(0.5, 0.0, 0.0));
    mesh.translate_polygon_append(&right, 1.0);
    mesh.hide_edge(eh(0));
    mesh.hide_vertex(vh(4));

    // the original top faces are gone; their handles must stay gone after a
    // round trip
    assert!(!mesh.contains_face(fh(0)));

    let restored = roundtrip(&mesh);
    assert_identical(&mesh, &restored);
    assert!(!restored.contains_face(fh(0)));

    // the restored mesh keeps allocating fresh handles above the old ones
    let mut a = mesh.clone_mesh();
    let mut b = restored;
    let va = a.add_vertex(cgmath::Point3::new(0.0, 0.0, 9.0));
    let vb = b.add_vertex(cgmath::Point3::new(0.0, 0.0, 9.0));
    assert_eq!(va, vb);
}

#[test]
fn grid_roundtrip() {
    let mut mesh = WhiteBoxMesh::new();
    box_grid(&mut mesh);

    let restored = roundtrip(&mesh);
    assert_identical(&mesh, &restored);

    assert_eq!(restored.mesh_polygon_handles().len(), 22);
    assert_eq!(restored.num_faces(), 44);
    assert_eq!(restored.num_vertices(), 24);
    assert_eq!(restored.num_halfedges(), 132);
}

#[test]
fn clone_mesh_produces_identical_results() {
    let mut mesh = WhiteBoxMesh::new();
    box_grid(&mut mesh);

    let clone = mesh.clone_mesh();
    assert_identical(&mesh, &clone);
}

#[test]
fn whitespace_stripping_transport_fails_deterministically() {
    let mut mesh = WhiteBoxMesh::new();
    shape::unit_cube(&mut mesh);

    let bytes = write_mesh_to_vec(&mesh).unwrap();

    // a transport that treats the stream as text and swallows whitespace
    // destroys the separator probe in the header
    let stripped: Vec<u8> = bytes
        .iter()
        .copied()
        .filter(|byte| *byte != b' ' && *byte != b'\n' && *byte != b'\r' && *byte != b'\t')
        .collect();
    assert!(stripped.len() < bytes.len());

    let mut target = WhiteBoxMesh::new();
    shape::unit_quad(&mut target);

    assert_eq!(read_mesh_from_slice(&mut target, &stripped), ReadResult::Error);

    // the failed read left the target untouched
    assert_eq!(target.num_vertices(), 4);
    assert_eq!(target.num_faces(), 2);
}

#[test]
fn empty_input_is_reported_as_empty() {
    let mut mesh = WhiteBoxMesh::new();
    assert_eq!(read_mesh_from_slice(&mut mesh, &[]), ReadResult::Empty);
}

#[test]
fn truncated_stream_fails_cleanly() {
    let mut mesh = WhiteBoxMesh::new();
    shape::unit_cube(&mut mesh);
    let bytes = write_mesh_to_vec(&mesh).unwrap();

    for cut in &[1usize, 8, 32, bytes.len() - 1] {
        let mut target = WhiteBoxMesh::new();
        assert_eq!(
            read_mesh_from_slice(&mut target, &bytes[..*cut]),
            ReadResult::Error,
            "cut at {} must fail",
            cut,
        );
        assert_eq!(target.num_vertices(), 0);
    }
}

#[test]
fn flag_bytes_are_validated() {
    let mut mesh = WhiteBoxMesh::new();
    shape::unit_quad(&mut mesh);
    let mut bytes = write_mesh_to_vec(&mesh).unwrap();

    // vertex records start after magic (6), version (2) and the vertex
    // count (8); corrupt the hidden flag of the first vertex record:
    // index (8) + position (12) + outgoing (8) bytes in
    let flag_offset = 6 + 2 + 8 + 8 + 12 + 8;
    assert!(bytes[flag_offset] <= 1);
    bytes[flag_offset] = 7;

    let mut target = WhiteBoxMesh::new();
    assert_eq!(read_mesh_from_slice(&mut target, &bytes), ReadResult::Error);
}
