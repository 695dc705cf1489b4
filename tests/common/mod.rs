//! Shared fixtures and assertions for the integration suites.

#![allow(dead_code)]

use cgmath::{InnerSpace, Point3, Vector3};
use whitebox::prelude::*;
use whitebox::shape;

/// Takes an iterator and a list of elements. Collects both into sets and
/// compares those sets for equality.
#[allow(unused_macros)]
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

pub fn vh(idx: u32) -> VertexHandle {
    VertexHandle::new(idx as hsize)
}

pub fn fh(idx: u32) -> FaceHandle {
    FaceHandle::new(idx as hsize)
}

pub fn eh(idx: u32) -> EdgeHandle {
    EdgeHandle::new(idx as hsize)
}

pub fn heh(idx: u32) -> HalfedgeHandle {
    HalfedgeHandle::new(idx as hsize)
}

pub fn close(a: Point3<f32>, b: Point3<f32>) -> bool {
    (b - a).magnitude() < 1.0e-4
}

pub fn close_vec(a: Vector3<f32>, b: Vector3<f32>) -> bool {
    (b - a).magnitude() < 1.0e-4
}

/// The polygon whose averaged normal matches `normal`; panics when none or
/// several match.
pub fn polygon_with_normal(mesh: &WhiteBoxMesh, normal: Vector3<f32>) -> PolygonHandle {
    let matching: Vec<_> = mesh
        .mesh_polygon_handles()
        .into_iter()
        .filter(|polygon| close_vec(mesh.polygon_normal(polygon), normal))
        .collect();

    assert_eq!(
        matching.len(),
        1,
        "expected exactly one polygon with normal {:?}, found {}",
        normal,
        matching.len(),
    );

    matching.into_iter().next().unwrap()
}

/// The polygon with the given normal whose midpoint is closest to `near`.
pub fn polygon_with_normal_near(
    mesh: &WhiteBoxMesh,
    normal: Vector3<f32>,
    near: Point3<f32>,
) -> PolygonHandle {
    mesh.mesh_polygon_handles()
        .into_iter()
        .filter(|polygon| close_vec(mesh.polygon_normal(polygon), normal))
        .min_by(|a, b| {
            let da = (mesh.polygon_midpoint(a) - near).magnitude();
            let db = (mesh.polygon_midpoint(b) - near).magnitude();
            da.partial_cmp(&db).unwrap()
        })
        .expect("no polygon with the requested normal")
}

/// The edge whose midpoint lies at `at`; panics when none does.
pub fn edge_at(mesh: &WhiteBoxMesh, at: Point3<f32>) -> EdgeHandle {
    mesh.edge_handles()
        .into_iter()
        .find(|&eh| close(mesh.edge_midpoint(eh), at))
        .expect("no edge at the requested midpoint")
}

/// Structural health check through the public API: triangle cycles, twin
/// involution, and the polygon partition invariant.
pub fn check_mesh(mesh: &WhiteBoxMesh) {
    for fh in mesh.face_handles() {
        let halfedges = mesh.face_halfedge_handles(fh);
        assert_eq!(halfedges.len(), 3);

        // `next` three times returns to the start halfedge
        let around = mesh.halfedge_handle_next(mesh.halfedge_handle_next(
            mesh.halfedge_handle_next(halfedges[0]),
        ));
        assert_eq!(around, halfedges[0]);

        for &heh in halfedges.iter() {
            assert_eq!(mesh.halfedge_opposite_handle(mesh.halfedge_opposite_handle(heh)), heh);
            assert_eq!(mesh.halfedge_face_handle(heh), Some(fh));
        }
    }

    // every face belongs to exactly one polygon, and the polygons cover the
    // face set without overlap
    let mut seen = std::collections::BTreeSet::new();
    for polygon in mesh.mesh_polygon_handles() {
        for &face in &polygon.face_handles {
            assert!(seen.insert(face), "{:?} appears in two polygons", face);
        }
    }
    assert_eq!(seen.len(), mesh.num_faces() as usize);

    for fh in mesh.face_handles() {
        let polygon = mesh.face_polygon_handle(fh);
        assert!(polygon.contains(fh));
    }
}

/// A cube with its top polygon pulled up by one unit: two stacked unit
/// boxes.
pub fn stacked_boxes(mesh: &mut WhiteBoxMesh) -> PolygonHandle {
    let polygons = shape::unit_cube(mesh);
    mesh.translate_polygon_append(&polygons[0], 1.0)
}

/// A row of three unit boxes along +X, built by extruding the right side of
/// a cube twice. Returns nothing; query by geometry.
pub fn box_row(mesh: &mut WhiteBoxMesh) {
    shape::unit_cube(mesh);

    let right = polygon_with_normal(mesh, Vector3::unit_x());
    mesh.translate_polygon_append(&right, 1.0);

    let right = polygon_with_normal(mesh, Vector3::unit_x());
    mesh.translate_polygon_append(&right, 1.0);
}

/// The canonical grid fixture: a cube, two opposite side appends, two mesh
/// (diagonal) edge hides, then two further side appends — a plus-shaped
/// group of five boxes with 22 polygons, 44 faces, 24 vertices and 132
/// halfedges.
pub fn box_grid(mesh: &mut WhiteBoxMesh) {
    shape::unit_cube(mesh);

    let right = polygon_with_normal(mesh, Vector3::unit_x());
    mesh.translate_polygon_append(&right, 1.0);

    let left = polygon_with_normal(mesh, -Vector3::unit_x());
    mesh.translate_polygon_append(&left, 1.0);

    // hide two cap diagonals: mesh edges, so no grouping changes
    let top_diagonal = edge_at(mesh, Point3::new(0.0, 0.0, 0.5));
    assert!(mesh.edge_is_hidden(top_diagonal));
    mesh.hide_edge(top_diagonal);

    let bottom_diagonal = edge_at(mesh, Point3::new(0.0, 0.0, -0.5));
    assert!(mesh.edge_is_hidden(bottom_diagonal));
    mesh.hide_edge(bottom_diagonal);

    // the front and back of the center box (each extrusion grew its own
    // front- and back-facing side quads too)
    let front = polygon_with_normal_near(mesh, -Vector3::unit_y(), Point3::new(0.0, -0.5, 0.0));
    mesh.translate_polygon_append(&front, 1.0);

    let back = polygon_with_normal_near(mesh, Vector3::unit_y(), Point3::new(0.0, 0.5, 0.0));
    mesh.translate_polygon_append(&back, 1.0);
}
