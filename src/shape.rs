//! Canonical starter shapes: the unit quad, unit cube and unit triangle the
//! editor seeds new meshes with.

use cgmath::{Point3, Rad};

use crate::{core::WhiteBoxMesh, polygon::PolygonHandle};


/// Initializes `mesh` as a unit quad in the XZ plane (normal along -Y).
pub fn unit_quad(mesh: &mut WhiteBoxMesh) -> PolygonHandle {
    let vertex_handles = [
        mesh.add_vertex(Point3::new(-0.5, 0.0, -0.5)), // bottom left
        mesh.add_vertex(Point3::new(0.5, 0.0, -0.5)),  // bottom right
        mesh.add_vertex(Point3::new(0.5, 0.0, 0.5)),   // top right
        mesh.add_vertex(Point3::new(-0.5, 0.0, 0.5)),  // top left
    ];

    let polygon = mesh.add_quad_polygon(
        vertex_handles[0],
        vertex_handles[1],
        vertex_handles[2],
        vertex_handles[3],
    );

    mesh.calculate_normals();
    mesh.calculate_planar_uvs();

    polygon
}

/// Initializes `mesh` as an axis-aligned unit cube centered at the origin,
/// one quad polygon per side. The first polygon is the top (+Z) side.
pub fn unit_cube(mesh: &mut WhiteBoxMesh) -> Vec<PolygonHandle> {
    // top verts
    let v0 = mesh.add_vertex(Point3::new(-0.5, -0.5, 0.5));
    let v1 = mesh.add_vertex(Point3::new(0.5, -0.5, 0.5));
    let v2 = mesh.add_vertex(Point3::new(0.5, 0.5, 0.5));
    let v3 = mesh.add_vertex(Point3::new(-0.5, 0.5, 0.5));

    // bottom verts
    let v4 = mesh.add_vertex(Point3::new(-0.5, -0.5, -0.5));
    let v5 = mesh.add_vertex(Point3::new(0.5, -0.5, -0.5));
    let v6 = mesh.add_vertex(Point3::new(0.5, 0.5, -0.5));
    let v7 = mesh.add_vertex(Point3::new(-0.5, 0.5, -0.5));

    let polygon_handles = vec![
        // top
        mesh.add_quad_polygon(v0, v1, v2, v3),
        // bottom
        mesh.add_quad_polygon(v7, v6, v5, v4),
        // front
        mesh.add_quad_polygon(v4, v5, v1, v0),
        // right
        mesh.add_quad_polygon(v5, v6, v2, v1),
        // back
        mesh.add_quad_polygon(v6, v7, v3, v2),
        // left
        mesh.add_quad_polygon(v7, v4, v0, v3),
    ];

    mesh.calculate_normals();
    mesh.calculate_planar_uvs();

    polygon_handles
}

/// Initializes `mesh` as a single equilateral-ish triangle polygon inscribed
/// in the unit circle in the XY plane.
pub fn unit_triangle(mesh: &mut WhiteBoxMesh) -> PolygonHandle {
    let point_on_circle = |angle: Rad<f32>| {
        let (sin, cos) = angle.0.sin_cos();
        Point3::new(cos, sin, 0.0)
    };

    let top = mesh.add_vertex(point_on_circle(Rad(90.0_f32.to_radians())));
    let bottom_left = mesh.add_vertex(point_on_circle(Rad(-150.0_f32.to_radians())));
    let bottom_right = mesh.add_vertex(point_on_circle(Rad(-30.0_f32.to_radians())));

    let polygon = mesh.add_tri_polygon(top, bottom_left, bottom_right);

    mesh.calculate_normals();
    mesh.calculate_planar_uvs();

    polygon
}


#[cfg(test)]
mod tests {
    use super::*;
    use cgmath::prelude::*;
    use cgmath::Vector3;
    use crate::handle::{FaceHandle, Handle};

    #[test]
    fn quad_is_one_polygon_of_two_faces() {
        let mut mesh = WhiteBoxMesh::new();
        let polygon = unit_quad(&mut mesh);

        assert_eq!(mesh.num_vertices(), 4);
        assert_eq!(mesh.num_faces(), 2);
        assert_eq!(polygon.face_handles.len(), 2);
        assert_eq!(mesh.mesh_polygon_handles().len(), 1);
    }

    #[test]
    fn cube_counts() {
        let mut mesh = WhiteBoxMesh::new();
        let polygons = unit_cube(&mut mesh);

        assert_eq!(polygons.len(), 6);
        assert_eq!(mesh.num_vertices(), 8);
        assert_eq!(mesh.num_faces(), 12);
        assert_eq!(mesh.num_edges(), 18);
        assert_eq!(mesh.num_halfedges(), 36);
    }

    #[test]
    fn first_face_of_cube_is_top() {
        let mut mesh = WhiteBoxMesh::new();
        unit_cube(&mut mesh);

        let normal = mesh.face_normal(FaceHandle::new(0));
        assert!((normal - Vector3::unit_z()).magnitude() < 1.0e-6);
    }

    #[test]
    fn triangle_positions() {
        let mut mesh = WhiteBoxMesh::new();
        unit_triangle(&mut mesh);

        let positions = mesh.mesh_vertex_positions();
        assert_eq!(positions.len(), 3);
        assert!((positions[0] - Point3::new(0.0, 1.0, 0.0)).magnitude() < 1.0e-4);
        assert!((positions[1] - Point3::new(-0.866, -0.5, 0.0)).magnitude() < 1.0e-3);
        assert!((positions[2] - Point3::new(0.866, -0.5, 0.0)).magnitude() < 1.0e-3);
    }
}
