//! The render data builder.
//!
//! Converts the mesh into a flat triangle list for a renderer and culls
//! degenerate (zero-area) triangles. Everything here is a pure function of
//! its inputs; the renderer itself lives outside this crate.

use cgmath::{prelude::*, Point3, Vector2, Vector3};

use crate::{core::WhiteBoxMesh, math::DEGENERATE_TOLERANCE};


/// One render vertex: position plus texture coordinate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WhiteBoxVertex {
    pub position: Point3<f32>,
    pub uv: Vector2<f32>,
}

/// One render triangle.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct WhiteBoxFace {
    pub vertices: [WhiteBoxVertex; 3],
    pub normal: Vector3<f32>,
}

/// Flattens the mesh into render triangles, in face handle order.
pub fn build_faces(mesh: &WhiteBoxMesh) -> Vec<WhiteBoxFace> {
    mesh.face_handles()
        .into_iter()
        .map(|fh| {
            let halfedges = mesh.face_halfedge_handles(fh);

            let mut vertices = [WhiteBoxVertex {
                position: Point3::origin(),
                uv: Vector2::zero(),
            }; 3];
            for (corner, &heh) in vertices.iter_mut().zip(halfedges.iter()) {
                *corner = WhiteBoxVertex {
                    position: mesh.halfedge_vertex_position_at_tip(heh),
                    uv: mesh.halfedge_uv(heh),
                };
            }

            WhiteBoxFace {
                vertices,
                normal: mesh.face_normal(fh),
            }
        })
        .collect()
}

/// Removes degenerate triangles — those where any two corner positions
/// coincide — keeping the rest unmodified and in their original relative
/// order.
pub fn build_culled_faces(faces: Vec<WhiteBoxFace>) -> Vec<WhiteBoxFace> {
    faces
        .into_iter()
        .filter(|face| !face_is_degenerate(face))
        .collect()
}

fn face_is_degenerate(face: &WhiteBoxFace) -> bool {
    let [a, b, c] = [
        face.vertices[0].position,
        face.vertices[1].position,
        face.vertices[2].position,
    ];

    positions_coincide(a, b) || positions_coincide(b, c) || positions_coincide(c, a)
}

fn positions_coincide(a: Point3<f32>, b: Point3<f32>) -> bool {
    (b - a).magnitude2() <= DEGENERATE_TOLERANCE * DEGENERATE_TOLERANCE
}


#[cfg(test)]
mod tests {
    use super::*;

    fn face(a: [f32; 3], b: [f32; 3], c: [f32; 3]) -> WhiteBoxFace {
        let corner = |p: [f32; 3]| WhiteBoxVertex {
            position: Point3::new(p[0], p[1], p[2]),
            uv: Vector2::zero(),
        };

        WhiteBoxFace {
            vertices: [corner(a), corner(b), corner(c)],
            normal: Vector3::unit_z(),
        }
    }

    #[test]
    fn culls_triangles_with_coincident_corners() {
        let ok = face([0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]);
        let degenerate_ab = face([1.0, 2.0, 3.0], [1.0, 2.0, 3.0], [0.0, 1.0, 0.0]);
        let degenerate_ca = face([5.0, 0.0, 0.0], [6.0, 0.0, 0.0], [5.0, 0.0, 0.0]);

        let culled = build_culled_faces(vec![degenerate_ab, ok, degenerate_ca]);

        assert_eq!(culled, vec![ok]);
    }

    #[test]
    fn keeps_relative_order_of_survivors() {
        let first = face([0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [0.0, 1.0, 0.0]);
        let second = face([2.0, 0.0, 0.0], [3.0, 0.0, 0.0], [2.0, 1.0, 0.0]);
        let bad = face([0.5, 0.5, 0.5], [0.5, 0.5, 0.5], [0.5, 0.5, 0.5]);

        let culled = build_culled_faces(vec![first, bad, second]);

        assert_eq!(culled, vec![first, second]);
    }

    #[test]
    fn flattens_quad_into_two_triangles() {
        let mut mesh = WhiteBoxMesh::new();
        crate::shape::unit_quad(&mut mesh);

        let faces = build_faces(&mesh);
        assert_eq!(faces.len(), 2);

        // the quad is flat, no triangle is degenerate
        let culled = build_culled_faces(faces);
        assert_eq!(culled.len(), 2);
    }
}
