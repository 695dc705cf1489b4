//! The polygon grouping layer.
//!
//! Polygons are not stored anywhere: a polygon is the maximal set of faces
//! reachable from a seed face by crossing only hidden edges, recomputed on
//! demand. Because grouping is derived, every mutating operation implicitly
//! keeps it up to date, and no cache can go stale.

use std::collections::VecDeque;

use boolinator::Boolinator;
use cgmath::{prelude::*, Point3, Vector3};
use fxhash::FxHashSet;

use crate::{
    core::WhiteBoxMesh,
    handle::{EdgeHandle, FaceHandle, HalfedgeHandle, VertexHandle},
    math::{self, Space, NORMAL_TOLERANCE},
};


/// A derived grouping of faces forming one logical N-gon.
///
/// The face list is in flood-fill discovery order. Two polygon handles are
/// equal when they contain the same face *set*: flood fills seeded from
/// different faces of the same polygon enumerate it in different orders.
#[derive(Debug, Clone, Default)]
pub struct PolygonHandle {
    pub face_handles: Vec<FaceHandle>,
}

impl PolygonHandle {
    pub fn new(face_handles: Vec<FaceHandle>) -> Self {
        Self { face_handles }
    }

    pub fn is_empty(&self) -> bool {
        self.face_handles.is_empty()
    }

    pub fn contains(&self, fh: FaceHandle) -> bool {
        self.face_handles.contains(&fh)
    }

    fn sorted(&self) -> Vec<FaceHandle> {
        let mut faces = self.face_handles.clone();
        faces.sort_unstable();
        faces
    }
}

impl PartialEq for PolygonHandle {
    fn eq(&self, other: &Self) -> bool {
        self.sorted() == other.sorted()
    }
}

impl Eq for PolygonHandle {}

impl From<Vec<FaceHandle>> for PolygonHandle {
    fn from(face_handles: Vec<FaceHandle>) -> Self {
        Self::new(face_handles)
    }
}


/// The user/mesh classification of all edges of a mesh.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EdgeTypes {
    /// Edges visible and selectable to the user (polygon borders).
    pub user: Vec<EdgeHandle>,

    /// Internal ("mesh") edges invisible to the user.
    pub mesh: Vec<EdgeHandle>,
}


// ===============================================================================================
// ===== Polygon discovery
// ===============================================================================================

impl WhiteBoxMesh {
    /// Computes the polygon containing `fh`: a breadth-first flood fill from
    /// the seed face that crosses only hidden edges. Returns an empty
    /// polygon for a face that does not exist.
    pub fn face_polygon_handle(&self, fh: FaceHandle) -> PolygonHandle {
        if self.try_face(fh).is_none() {
            return PolygonHandle::default();
        }

        let mut faces = Vec::new();
        let mut queue = VecDeque::new();
        let mut visited = FxHashSet::default();

        queue.push_back(fh);
        visited.insert(fh);

        while let Some(face) = queue.pop_front() {
            faces.push(face);

            for heh in self.face_halfedge_handles(face) {
                let eh = self.halfedge_edge_handle(heh);
                if !self.edges[eh].hidden {
                    continue;
                }

                if let Some(opposite) = self.halfedge_opposite_face_handle(heh) {
                    if visited.insert(opposite) {
                        queue.push_back(opposite);
                    }
                }
            }
        }

        PolygonHandle::new(faces)
    }

    /// Enumerates every polygon of the mesh exactly once, discovered in
    /// ascending seed-face order.
    pub fn mesh_polygon_handles(&self) -> Vec<PolygonHandle> {
        let mut polygons = Vec::new();
        let mut seen = FxHashSet::default();

        for fh in self.face_handles() {
            if seen.contains(&fh) {
                continue;
            }

            let polygon = self.face_polygon_handle(fh);
            seen.extend(polygon.face_handles.iter().copied());
            polygons.push(polygon);
        }

        polygons
    }

    /// All inner halfedges of the polygon's faces.
    pub fn polygon_halfedge_handles(&self, polygon: &PolygonHandle) -> Vec<HalfedgeHandle> {
        let mut halfedges = Vec::with_capacity(polygon.face_handles.len() * 3);
        for &fh in &polygon.face_handles {
            halfedges.extend(self.face_halfedge_handles(fh));
        }

        halfedges
    }

    /// The unique vertices of the polygon's faces, in first-seen order.
    pub fn polygon_vertex_handles(&self, polygon: &PolygonHandle) -> Vec<VertexHandle> {
        self.faces_vertex_handles(&polygon.face_handles)
    }

    pub fn polygon_vertex_positions(&self, polygon: &PolygonHandle) -> Vec<Point3<f32>> {
        self.vertex_positions(&self.polygon_vertex_handles(polygon))
    }

    /// Corner positions of the polygon's faces, three per face.
    pub fn polygon_faces_positions(&self, polygon: &PolygonHandle) -> Vec<Point3<f32>> {
        self.faces_positions(&polygon.face_handles)
    }

    /// Normalized sum of the (unit) face normals. Faces are not weighted by
    /// area.
    pub fn polygon_normal(&self, polygon: &PolygonHandle) -> Vector3<f32> {
        let sum = polygon
            .face_handles
            .iter()
            .fold(Vector3::zero(), |normal, &fh| normal + self.face_normal(fh));

        math::normalize_safe(sum)
    }

    /// Midpoint of the polygon's border vertices; falls back to all polygon
    /// vertices when every border edge has been hidden.
    pub fn polygon_midpoint(&self, polygon: &PolygonHandle) -> Point3<f32> {
        let border_vertices = self.polygon_border_vertex_handles_flattened(polygon);
        if !border_vertices.is_empty() {
            return self.vertices_midpoint(&border_vertices);
        }

        self.vertices_midpoint(&self.polygon_vertex_handles(polygon))
    }

    /// Orthonormal frame of a polygon: two axes in the polygon plane, the
    /// third along its normal, anchored at `pivot`.
    pub fn polygon_space(&self, polygon: &PolygonHandle, pivot: Point3<f32>) -> Space {
        Space::from_axis(self.polygon_normal(polygon), pivot)
    }

    /// Orthonormal frame of an edge: third axis along the edge direction.
    pub fn edge_space(&self, eh: EdgeHandle, pivot: Point3<f32>) -> Space {
        let [a, b] = self.edge_vertex_positions(eh);
        Space::from_axis(math::normalize_safe(b - a), pivot)
    }

    pub(crate) fn faces_vertex_handles(&self, fhs: &[FaceHandle]) -> Vec<VertexHandle> {
        let mut vertices = Vec::new();
        for &fh in fhs {
            for vh in self.face_vertex_handles(fh) {
                if !vertices.contains(&vh) {
                    vertices.push(vh);
                }
            }
        }

        vertices
    }
}


// ===============================================================================================
// ===== Polygon borders
// ===============================================================================================

impl WhiteBoxMesh {
    /// Collects the border halfedges of a face set and chains them into
    /// ordered loops (tip to tail). A closed chain starts a new loop, so a
    /// polygon with holes yields several loops. A face set whose every edge
    /// is interior (all borders hidden) yields no loops at all.
    pub(crate) fn border_halfedge_handles(&self, fhs: &[FaceHandle]) -> Vec<Vec<HalfedgeHandle>> {
        // gather all unordered border halfedges: face inside the set,
        // opposite face outside (or boundary)
        let mut halfedges: Vec<HalfedgeHandle> = Vec::new();
        for &fh in fhs {
            for vh in self.face_vertex_handles(fh) {
                for heh in self.vertex_outgoing_halfedge_handles(vh) {
                    let inside = self
                        .halfedge_face_handle(heh)
                        .map_or(false, |f| fhs.contains(&f));
                    if !inside {
                        continue;
                    }

                    let opposite_inside = self
                        .halfedge_opposite_face_handle(heh)
                        .map_or(false, |f| fhs.contains(&f));
                    if !opposite_inside && !halfedges.contains(&heh) {
                        halfedges.push(heh);
                    }
                }
            }
        }

        // pathological case: every border edge of the group is hidden
        if halfedges.is_empty() {
            return Vec::new();
        }

        let mut collection = Vec::new();

        let mut ordered = Vec::with_capacity(halfedges.len());
        ordered.push(halfedges.pop().expect("checked non-empty"));

        while !halfedges.is_empty() {
            let tail = *ordered.last().expect("chain never empty");
            let next_vertex = self.halfedge_vertex_handle_at_tip(tail);

            let found = halfedges
                .iter()
                .position(|&heh| self.halfedge_vertex_handle_at_tail(heh) == next_vertex);

            match found {
                Some(pos) => {
                    ordered.push(halfedges[pos]);
                    halfedges.swap_remove(pos);
                }
                None => {
                    // cycle closed, start the next loop
                    let start = halfedges.pop().expect("checked non-empty");
                    collection.push(std::mem::replace(&mut ordered, vec![start]));
                }
            }
        }

        collection.push(ordered);
        collection
    }

    /// One ordered halfedge loop per polygon border (outer border plus any
    /// hole borders).
    pub fn polygon_border_halfedge_handles(&self, polygon: &PolygonHandle) -> Vec<Vec<HalfedgeHandle>> {
        self.border_halfedge_handles(&polygon.face_handles)
    }

    pub fn polygon_border_halfedge_handles_flattened(
        &self,
        polygon: &PolygonHandle,
    ) -> Vec<HalfedgeHandle> {
        self.polygon_border_halfedge_handles(polygon)
            .into_iter()
            .flatten()
            .collect()
    }

    /// One ordered edge loop per polygon border.
    pub fn polygon_border_edge_handles(&self, polygon: &PolygonHandle) -> Vec<Vec<EdgeHandle>> {
        self.polygon_border_halfedge_handles(polygon)
            .into_iter()
            .map(|halfedges| {
                halfedges
                    .into_iter()
                    .map(|heh| self.halfedge_edge_handle(heh))
                    .collect()
            })
            .collect()
    }

    pub fn polygon_border_edge_handles_flattened(&self, polygon: &PolygonHandle) -> Vec<EdgeHandle> {
        self.polygon_border_edge_handles(polygon)
            .into_iter()
            .flatten()
            .collect()
    }

    /// One ordered vertex loop per polygon border (the tip of each border
    /// halfedge).
    pub fn polygon_border_vertex_handles(&self, polygon: &PolygonHandle) -> Vec<Vec<VertexHandle>> {
        self.polygon_border_halfedge_handles(polygon)
            .into_iter()
            .map(|halfedges| {
                halfedges
                    .into_iter()
                    .map(|heh| self.halfedge_vertex_handle_at_tip(heh))
                    .collect()
            })
            .collect()
    }

    pub fn polygon_border_vertex_handles_flattened(&self, polygon: &PolygonHandle) -> Vec<VertexHandle> {
        self.polygon_border_vertex_handles(polygon)
            .into_iter()
            .flatten()
            .collect()
    }

    pub fn polygon_border_vertex_positions(&self, polygon: &PolygonHandle) -> Vec<Vec<Point3<f32>>> {
        self.polygon_border_vertex_handles(polygon)
            .into_iter()
            .map(|vertices| self.vertex_positions(&vertices))
            .collect()
    }
}


// ===============================================================================================
// ===== Derived edge classification
// ===============================================================================================

impl WhiteBoxMesh {
    /// Whether the edge is visible/selectable to the user.
    ///
    /// Derived from grouping, not from the stored flag: an edge is a user
    /// edge iff it is a boundary edge or its two faces belong to different
    /// polygons. (A visible-flagged edge whose faces are connected around it
    /// by other hidden edges is still a mesh edge, and a hidden-flagged
    /// boundary edge is still a user edge.)
    pub fn edge_is_user(&self, eh: EdgeHandle) -> bool {
        let faces = self.edge_face_handles(eh);
        match faces.len() {
            0 => false,
            1 => true,
            _ => !self.face_polygon_handle(faces[0]).contains(faces[1]),
        }
    }

    /// Whether the edge is an internal ("mesh") edge.
    pub fn edge_is_hidden(&self, eh: EdgeHandle) -> bool {
        !self.edge_is_user(eh)
    }

    /// The sorted union of all polygon border edges (the user edges).
    pub fn mesh_polygon_edge_handles(&self) -> Vec<EdgeHandle> {
        let mut edges = Vec::new();
        for polygon in self.mesh_polygon_handles() {
            edges.extend(self.polygon_border_edge_handles_flattened(&polygon));
        }

        edges.sort_unstable();
        edges.dedup();
        edges
    }

    /// Splits the edge set into user and mesh edges.
    pub fn mesh_user_edge_handles(&self) -> EdgeTypes {
        let user = self.mesh_polygon_edge_handles();

        let mut all = self.edge_handles();
        all.sort_unstable();

        let mesh = all.into_iter().filter(|eh| user.binary_search(eh).is_err()).collect();

        EdgeTypes { user, mesh }
    }

    /// The chain of user edges logically merged with `eh` through hidden
    /// vertices (subdivision points the user should treat as not there).
    /// Empty for a mesh edge: those are not selectable.
    pub fn edge_grouping(&self, eh: EdgeHandle) -> Vec<EdgeHandle> {
        if !self.edge_is_user(eh) {
            return Vec::new();
        }

        let mut grouping = vec![eh];

        let mut vertices: Vec<VertexHandle> = self.edge_vertex_handles(eh).to_vec();
        let mut visited: Vec<VertexHandle> = Vec::new();

        while let Some(vh) = vertices.pop() {
            // a visible vertex ends the merge chain
            if !self.vertex_is_hidden(vh) {
                continue;
            }

            visited.push(vh);

            for vertex_edge in self.vertex_edge_handles(vh) {
                if !self.edge_is_user(vertex_edge) {
                    continue;
                }
                if grouping.contains(&vertex_edge) {
                    continue;
                }

                grouping.push(vertex_edge);

                for &next_vertex in self.edge_vertex_handles(vertex_edge).iter() {
                    if !visited.contains(&next_vertex) {
                        vertices.push(next_vertex);
                    }
                }
            }
        }

        grouping
    }

    /// Whether the vertex has no user edge left (nothing to select or
    /// restore).
    pub fn vertex_is_isolated(&self, vh: VertexHandle) -> bool {
        self.vertex_edge_handles(vh)
            .iter()
            .all(|&eh| !self.edge_is_user(eh))
    }

    /// The user edges connected to a vertex.
    pub fn vertex_user_edge_handles(&self, vh: VertexHandle) -> Vec<EdgeHandle> {
        self.vertex_edge_handles(vh)
            .into_iter()
            .filter(|&eh| self.edge_is_user(eh))
            .collect()
    }

    /// Vectors of the user edges connected to a vertex, pointing away from
    /// it; zero-length edges are dropped.
    pub fn vertex_user_edge_vectors(&self, vh: VertexHandle) -> Vec<Vector3<f32>> {
        self.vertex_user_edges(vh, |mesh, eh| mesh.edge_vector_from(eh, Some(vh)))
    }

    /// Normalized directions of the user edges connected to a vertex.
    pub fn vertex_user_edge_axes(&self, vh: VertexHandle) -> Vec<Vector3<f32>> {
        self.vertex_user_edges(vh, |mesh, eh| mesh.edge_axis_from(eh, Some(vh)))
    }

    fn vertex_user_edges(
        &self,
        vh: VertexHandle,
        edge_fn: impl Fn(&Self, EdgeHandle) -> Vector3<f32>,
    ) -> Vec<Vector3<f32>> {
        self.vertex_user_edge_handles(vh)
            .into_iter()
            .filter_map(|eh| {
                let v = edge_fn(self, eh);
                (!math::is_close_zero(v.magnitude2(), std::f32::EPSILON)).as_some(v)
            })
            .collect()
    }
}


// ===============================================================================================
// ===== Flat-side discovery (faces connected with matching normals)
// ===============================================================================================

impl WhiteBoxMesh {
    /// All faces connected to `fh` that share (within tolerance) its normal:
    /// the flat side of the mesh the face lies on.
    pub fn side_face_handles(&self, fh: FaceHandle) -> Vec<FaceHandle> {
        let mut faces = Vec::new();
        if self.try_face(fh).is_none() {
            return faces;
        }

        let normal = math::normalize_safe(self.face_normal(fh));
        self.side_face_handles_internal(fh, &mut faces, normal);
        faces
    }

    fn side_face_handles_internal(
        &self,
        fh: FaceHandle,
        faces: &mut Vec<FaceHandle>,
        normal: Vector3<f32>,
    ) {
        if !self.build_side_face_handles(fh, faces, normal) {
            return;
        }

        for heh in self.face_halfedge_handles(fh) {
            if let Some(opposite) = self.halfedge_opposite_face_handle(heh) {
                self.side_face_handles_internal(opposite, faces, normal);
            }
        }
    }

    fn build_side_face_handles(
        &self,
        fh: FaceHandle,
        faces: &mut Vec<FaceHandle>,
        normal: Vector3<f32>,
    ) -> bool {
        if faces.contains(&fh) {
            return false;
        }

        let next_normal = math::normalize_safe(self.face_normal(fh));
        if next_normal.dot(normal) > NORMAL_TOLERANCE {
            faces.push(fh);
            return true;
        }

        false
    }

    /// The border halfedge loops of the flat side containing `fh`.
    pub fn side_border_halfedge_handles(&self, fh: FaceHandle) -> Vec<Vec<HalfedgeHandle>> {
        self.border_halfedge_handles(&self.side_face_handles(fh))
    }

    /// The border vertex loops of the flat side containing `fh`.
    pub fn side_border_vertex_handles(&self, fh: FaceHandle) -> Vec<Vec<VertexHandle>> {
        self.side_border_halfedge_handles(fh)
            .into_iter()
            .map(|halfedges| {
                halfedges
                    .into_iter()
                    .map(|heh| self.halfedge_vertex_handle_at_tip(heh))
                    .collect()
            })
            .collect()
    }

    /// The unique vertices of the flat side containing `fh`.
    pub fn side_vertex_handles(&self, fh: FaceHandle) -> Vec<VertexHandle> {
        self.faces_vertex_handles(&self.side_face_handles(fh))
    }
}
