//! Unit tests for the half-edge store itself: insertion, removal, splits,
//! flips and the structural invariants everything else relies on.

use cgmath::Point3;

use crate::handle::{EdgeHandle, FaceHandle, Handle, HalfedgeHandle, VertexHandle};
use super::{EdgeHalfedge, WhiteBoxMesh};


/// Takes an iterator and a list of elements. Collects both into sets and
/// compares those sets for equality.
macro_rules! assert_eq_set {
    ($iter:expr, [$($item:expr),* $(,)*] $(,)?) => {
        {
            let actual = $iter.collect::<std::collections::BTreeSet<_>>();
            let expected = [$($item),*]
                .iter()
                .cloned()
                .collect::<std::collections::BTreeSet<_>>();
            if actual != expected {
                panic!(
                    "assert_eq_set failed:\n  left: {:?}\n right: {:?}",
                    actual,
                    expected,
                );
            }
        }
    }
}


fn he(idx: u32) -> HalfedgeHandle {
    HalfedgeHandle::new(idx as crate::handle::hsize)
}

fn e(idx: u32) -> EdgeHandle {
    EdgeHandle::new(idx as crate::handle::hsize)
}

fn v(idx: u32) -> VertexHandle {
    VertexHandle::new(idx as crate::handle::hsize)
}

fn f(idx: u32) -> FaceHandle {
    FaceHandle::new(idx as crate::handle::hsize)
}

/// Builds the raw two-triangle quad used all over these tests (no polygon
/// flags involved at this layer).
fn quad() -> WhiteBoxMesh {
    let mut mesh = WhiteBoxMesh::new();
    let v0 = mesh.add_vertex(Point3::new(-0.5, 0.0, -0.5));
    let v1 = mesh.add_vertex(Point3::new(0.5, 0.0, -0.5));
    let v2 = mesh.add_vertex(Point3::new(0.5, 0.0, 0.5));
    let v3 = mesh.add_vertex(Point3::new(-0.5, 0.0, 0.5));
    mesh.add_face(v0, v1, v2);
    mesh.add_face(v0, v2, v3);
    mesh
}

/// Structural health check: twin pairing, face cycles, hole cycles, vertex
/// outgoing handles and edge/halfedge arena alignment.
fn check_invariants(mesh: &WhiteBoxMesh) {
    for heh in mesh.half_edges.handles() {
        let twin = HalfedgeHandle::new(heh.idx() ^ 1);
        assert!(
            mesh.half_edges.contains_handle(twin),
            "{:?} exists but its twin {:?} does not",
            heh,
            twin,
        );

        let edge = EdgeHandle::new(heh.idx() / 2);
        assert!(
            mesh.edges.contains_handle(edge),
            "{:?} exists but its edge record {:?} does not",
            heh,
            edge,
        );

        // a boundary halfedge chains to another boundary halfedge
        let next = mesh.halfedge_handle_next(heh);
        if mesh.halfedge_is_boundary(heh) {
            assert!(
                mesh.halfedge_is_boundary(next),
                "hole cycle of {:?} runs into non-boundary {:?}",
                heh,
                next,
            );
        }
    }

    for eh in mesh.edges.handles() {
        assert!(mesh.half_edges.contains_handle(HalfedgeHandle::new(eh.idx() * 2)));
        assert!(mesh.half_edges.contains_handle(HalfedgeHandle::new(eh.idx() * 2 + 1)));
    }

    for fh in mesh.faces.handles() {
        let halfedges = mesh.face_halfedge_handles(fh);
        assert_eq!(halfedges.len(), 3);

        // `next` applied three times returns to the start
        let back = mesh.halfedge_handle_next(mesh.halfedge_handle_next(
            mesh.halfedge_handle_next(halfedges[0]),
        ));
        assert_eq!(back, halfedges[0]);

        for &heh in &halfedges {
            assert_eq!(mesh.halfedge_face_handle(heh), Some(fh));
        }
    }

    for vh in mesh.vertices.handles() {
        let outgoing = mesh.vertex_outgoing_halfedge_handles(vh);
        for &heh in &outgoing {
            assert_eq!(
                mesh.halfedge_vertex_handle_at_tail(heh),
                vh,
                "outgoing halfedge of {:?} does not start there",
                vh,
            );
        }

        // if the vertex touches a boundary, its stored halfedge must be a
        // boundary halfedge (face insertion relies on this)
        if outgoing.iter().any(|&heh| mesh.halfedge_is_boundary(heh)) {
            assert!(
                mesh.halfedge_is_boundary(outgoing[0]),
                "{:?} lies on a boundary but stores non-boundary {:?}",
                vh,
                outgoing[0],
            );
        }
    }
}


#[test]
fn empty_mesh() {
    let mesh = WhiteBoxMesh::new();
    assert_eq!(mesh.num_vertices(), 0);
    assert_eq!(mesh.num_faces(), 0);
    assert_eq!(mesh.num_edges(), 0);
    assert_eq!(mesh.num_halfedges(), 0);
    assert!(mesh.vertex_handles().is_empty());
    assert!(mesh.face_handles().is_empty());
}

#[test]
fn quad_element_numbering() {
    let mesh = quad();
    check_invariants(&mesh);

    assert_eq!(mesh.num_vertices(), 4);
    assert_eq!(mesh.num_faces(), 2);
    assert_eq!(mesh.num_edges(), 5);
    assert_eq!(mesh.num_halfedges(), 10);

    // shared diagonal between the two triangles
    assert_eq!(mesh.edge_vertex_handles(e(0)), [v(0), v(1)]);
    assert_eq!(mesh.edge_vertex_handles(e(1)), [v(1), v(2)]);
    assert_eq!(mesh.edge_vertex_handles(e(2)), [v(2), v(0)]);
    assert_eq!(mesh.edge_vertex_handles(e(3)), [v(2), v(3)]);
    assert_eq!(mesh.edge_vertex_handles(e(4)), [v(3), v(0)]);
}

#[test]
fn quad_halfedges_of_edges() {
    let mesh = quad();

    // boundary edge: only one halfedge has a face
    assert_eq_set!(mesh.edge_halfedge_handles(e(1)).into_iter(), [he(2)]);
    // interior diagonal: both
    assert_eq_set!(mesh.edge_halfedge_handles(e(2)).into_iter(), [he(4), he(5)]);

    assert_eq!(mesh.edge_halfedge_handle(e(2), EdgeHalfedge::First), he(4));
    assert_eq!(mesh.edge_halfedge_handle(e(2), EdgeHalfedge::Second), he(5));
    assert_eq!(mesh.halfedge_edge_handle(he(5)), e(2));
    assert_eq!(mesh.halfedge_opposite_handle(he(4)), he(5));
}

#[test]
fn quad_next_and_previous() {
    let mesh = quad();

    // within the second triangle: diagonal -> (v2 -> v3)
    assert_eq!(mesh.halfedge_handle_next(he(5)), he(6));
    assert_eq!(mesh.halfedge_handle_previous(he(6)), he(5));
}

#[test]
fn quad_vertex_rotation() {
    let mesh = quad();

    // starting at the stored boundary halfedge, rotating via
    // opposite-then-next hops
    assert_eq!(
        mesh.vertex_outgoing_halfedge_handles(v(0)),
        vec![he(9), he(5), he(0)],
    );
    assert_eq!(
        mesh.vertex_incoming_halfedge_handles(v(0)),
        vec![he(8), he(4), he(1)],
    );
    assert_eq!(
        mesh.vertex_halfedge_handles(v(0)),
        vec![he(9), he(5), he(0), he(8), he(4), he(1)],
    );
    assert_eq_set!(mesh.vertex_edge_handles(v(0)).into_iter(), [e(0), e(2), e(4)]);
}

#[test]
fn face_vertices_in_insertion_order() {
    let mesh = quad();

    assert_eq!(mesh.face_vertex_handles(f(0)).to_vec(), vec![v(0), v(1), v(2)]);
    assert_eq!(mesh.face_vertex_handles(f(1)).to_vec(), vec![v(0), v(2), v(3)]);
}

#[test]
fn invalid_handles_give_empty_answers() {
    let mesh = quad();

    assert!(mesh.face_vertex_handles(f(77)).is_empty());
    assert!(mesh.face_edge_handles(f(77)).is_empty());
    assert!(mesh.face_halfedge_handles(f(77)).is_empty());
    assert!(mesh.vertex_outgoing_halfedge_handles(v(77)).is_empty());
    assert!(mesh.vertex_edge_handles(v(77)).is_empty());
    assert!(!mesh.contains_face(f(77)));
}

#[test]
fn remove_face_leaves_consistent_boundary() {
    let mut mesh = quad();
    mesh.remove_faces(&[f(1)]);
    check_invariants(&mesh);

    // the diagonal survives as a boundary edge of the remaining triangle;
    // the two open edges of the removed triangle are dissolved entirely
    assert_eq!(mesh.num_faces(), 1);
    assert_eq!(mesh.num_edges(), 3);
    assert_eq!(mesh.num_halfedges(), 6);
    assert_eq_set!(mesh.edge_handles().into_iter(), [e(0), e(1), e(2)]);

    // v3 lost its last edge and is isolated now, but keeps its slot
    assert_eq!(mesh.num_vertices(), 4);
    assert!(mesh.vertex_outgoing_halfedge_handles(v(3)).is_empty());
}

#[test]
fn remove_all_faces_empties_connectivity() {
    let mut mesh = quad();
    mesh.remove_faces(&[f(0), f(1)]);
    check_invariants(&mesh);

    assert_eq!(mesh.num_faces(), 0);
    assert_eq!(mesh.num_edges(), 0);
    assert_eq!(mesh.num_halfedges(), 0);
    assert_eq!(mesh.num_vertices(), 4);

    // handles of removed elements stay dead forever
    assert!(!mesh.contains_edge(e(0)));
    assert!(!mesh.contains_face(f(0)));

    // new geometry picks up fresh handles
    let fh = mesh.add_face(v(0), v(1), v(2));
    assert_eq!(fh, f(2));
    assert_eq_set!(mesh.edge_handles().into_iter(), [e(5), e(6), e(7)]);
    check_invariants(&mesh);
}

#[test]
fn refill_hole_after_removal() {
    // removing a face and adding it back must reuse the surrounding
    // boundary cleanly (fresh handles, same shape)
    let mut mesh = quad();
    mesh.remove_faces(&[f(1)]);

    let fh = mesh.add_face(v(0), v(2), v(3));
    check_invariants(&mesh);

    assert_eq!(fh, f(2));
    assert_eq!(mesh.num_faces(), 2);
    assert_eq!(mesh.num_edges(), 5);
    assert_eq!(mesh.face_vertex_handles(fh).to_vec(), vec![v(0), v(2), v(3)]);
}

#[test]
fn flip_quad_diagonal() {
    let mut mesh = quad();

    assert_eq!(mesh.edge_vertex_handles(e(2)), [v(2), v(0)]);

    assert!(mesh.flip_edge_topology(e(2)));
    check_invariants(&mesh);

    // the diagonal now connects the other two corners
    assert_eq!(mesh.edge_vertex_handles(e(2)), [v(3), v(1)]);
    assert_eq!(mesh.num_faces(), 2);
    assert_eq!(mesh.num_edges(), 5);

    // flipping again is still possible and rotates back
    assert!(mesh.flip_edge_topology(e(2)));
    check_invariants(&mesh);
    assert_eq!(mesh.edge_vertex_handles(e(2)), [v(0), v(2)]);
}

#[test]
fn flip_boundary_edge_fails() {
    let mut mesh = quad();

    let before_edges = mesh.num_edges();
    assert!(!mesh.flip_edge_topology(e(0)));
    assert!(!mesh.flip_edge_topology(e(55)));
    assert_eq!(mesh.num_edges(), before_edges);
    check_invariants(&mesh);
}

#[test]
fn flip_fails_when_target_diagonal_exists() {
    // a third face already realizes the diagonal the flip would create
    let mut mesh = quad();
    let apex = mesh.add_vertex(Point3::new(0.0, 1.0, 0.0));
    mesh.add_face(v(1), v(3), apex);

    let before = mesh.edge_vertex_handles(e(2));
    assert!(!mesh.flip_edge_topology(e(2)));
    assert_eq!(mesh.edge_vertex_handles(e(2)), before);
    check_invariants(&mesh);
}

#[test]
fn split_edge_counts_and_handles() {
    let mut mesh = quad();

    let split = mesh.split_edge_topology(e(2), Point3::new(0.0, 0.0, 0.0));
    check_invariants(&mesh);

    // midpoint vertex gets the next free handle
    assert_eq!(split.vertex, v(4));
    // one new edge half, one transversal per adjacent face
    assert_eq!(split.new_edge, e(5));
    assert_eq_set!(split.transversal_edges.into_iter(), [e(6), e(7)]);

    assert_eq!(mesh.num_vertices(), 5);
    assert_eq!(mesh.num_faces(), 4);
    assert_eq!(mesh.num_edges(), 8);

    // the original edge handle still exists, now ending at the midpoint
    assert_eq_set!(
        mesh.edge_vertex_handles(e(2)).iter().copied(),
        [v(2), v(4)],
    );
}

#[test]
fn split_boundary_edge() {
    let mut mesh = quad();

    let split = mesh.split_edge_topology(e(0), Point3::new(0.0, 0.0, -0.5));
    check_invariants(&mesh);

    assert_eq!(split.vertex, v(4));
    // only one adjacent face to divide at a boundary
    assert_eq!(split.transversal_edges.len(), 1);
    assert_eq!(mesh.num_faces(), 3);
}

#[test]
fn split_face_fans_around_midpoint() {
    let mut mesh = quad();

    let split = mesh.split_face_topology(f(0), Point3::new(0.2, 0.0, -0.1));
    check_invariants(&mesh);

    assert_eq!(split.vertex, v(4));
    assert_eq!(split.new_edges.len(), 3);
    assert_eq!(mesh.num_faces(), 4);
    assert_eq!(mesh.num_edges(), 8);

    // the old face record survives as one of the three sectors and contains
    // the midpoint
    assert!(mesh.face_vertex_handles(f(0)).contains(&split.vertex));
}

#[test]
fn clear_restarts_handle_allocation() {
    let mut mesh = quad();
    mesh.clear();

    assert_eq!(mesh.num_vertices(), 0);
    assert_eq!(mesh.num_halfedges(), 0);

    let vh = mesh.add_vertex(Point3::new(0.0, 0.0, 0.0));
    assert_eq!(vh, v(0));
}

#[test]
fn clone_is_deep() {
    let mut mesh = quad();
    let clone = mesh.clone_mesh();

    mesh.set_vertex_position(v(0), Point3::new(9.0, 9.0, 9.0));

    assert_eq!(clone.vertex_position(v(0)), Point3::new(-0.5, 0.0, -0.5));
    assert_eq!(clone.num_faces(), mesh.num_faces());
}

#[test]
fn triangle_fan_keeps_rotation_order() {
    // fan of faces around a central vertex, all in one plane
    let mut mesh = WhiteBoxMesh::new();
    let center = mesh.add_vertex(Point3::new(0.0, 0.0, 0.0));
    let ring: Vec<_> = (0..5)
        .map(|i| {
            let angle = i as f32 * 0.8;
            mesh.add_vertex(Point3::new(angle.cos(), angle.sin(), 0.0))
        })
        .collect();

    let mut faces = Vec::new();
    for pair in ring.windows(2) {
        faces.push(mesh.add_face(center, pair[0], pair[1]));
    }
    check_invariants(&mesh);

    // all fan faces are found around the center vertex
    let outgoing = mesh.vertex_outgoing_halfedge_handles(center);
    assert_eq!(outgoing.len(), 5);
    let found: Vec<_> = outgoing
        .iter()
        .filter_map(|&heh| mesh.halfedge_face_handle(heh))
        .collect();
    assert_eq_set!(found.into_iter(), [faces[0], faces[1], faces[2], faces[3]]);
}
