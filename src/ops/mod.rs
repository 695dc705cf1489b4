//! The interactive editing operations.
//!
//! Every operation either completes with a well-defined result or is a
//! guarded no-op (sentinel return, zero mutation). All of them leave the
//! halfedge structure manifold-valid and the hidden/user classification
//! consistent with the derived polygon grouping.

use cgmath::{Point3, Vector3};
use fxhash::FxHashMap;
use log::debug;

use crate::{
    core::{EdgeHalfedge, WhiteBoxMesh},
    handle::{EdgeHandle, FaceHandle, HalfedgeHandle, VertexHandle},
    math,
    polygon::PolygonHandle,
};

mod append;

pub use self::append::{AppendedPolygonHandles, RestoredPolygonHandlePair};


/// The three vertices of one triangle to add, in CCW order.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FaceVertHandles {
    pub vertex_handles: [VertexHandle; 3],
}

impl FaceVertHandles {
    pub fn new(v0: VertexHandle, v1: VertexHandle, v2: VertexHandle) -> Self {
        Self { vertex_handles: [v0, v1, v2] }
    }
}


// ===============================================================================================
// ===== Polygon construction
// ===============================================================================================

impl WhiteBoxMesh {
    /// Adds the given triangles as one logical polygon: every edge shared by
    /// two of the new faces becomes hidden (interior), every border edge
    /// becomes visible.
    pub fn add_polygon(&mut self, face_vert_handles: &[FaceVertHandles]) -> PolygonHandle {
        debug!("add_polygon {:?}", face_vert_handles);

        let mut faces = Vec::with_capacity(face_vert_handles.len());
        for face in face_vert_handles {
            let [v0, v1, v2] = face.vertex_handles;
            faces.push(self.add_face(v0, v1, v2));
        }

        let mut edge_counts: FxHashMap<EdgeHandle, u32> = FxHashMap::default();
        for &fh in &faces {
            for eh in self.face_edge_handles(fh) {
                *edge_counts.entry(eh).or_insert(0) += 1;
            }
        }

        for (eh, count) in edge_counts {
            self.edges[eh].hidden = count > 1;
        }

        PolygonHandle::new(faces)
    }

    /// Adds a single triangle polygon.
    pub fn add_tri_polygon(
        &mut self,
        v0: VertexHandle,
        v1: VertexHandle,
        v2: VertexHandle,
    ) -> PolygonHandle {
        self.add_polygon(&[FaceVertHandles::new(v0, v1, v2)])
    }

    /// Adds a quad polygon as two triangles sharing a hidden diagonal.
    pub fn add_quad_polygon(
        &mut self,
        v0: VertexHandle,
        v1: VertexHandle,
        v2: VertexHandle,
        v3: VertexHandle,
    ) -> PolygonHandle {
        self.add_polygon(&[
            FaceVertHandles::new(v0, v1, v2),
            FaceVertHandles::new(v0, v2, v3),
        ])
    }
}


// ===============================================================================================
// ===== In-place transforms
// ===============================================================================================

impl WhiteBoxMesh {
    /// Moves every vertex of the polygon along its averaged normal. No
    /// topology change.
    pub fn translate_polygon(&mut self, polygon: &PolygonHandle, distance: f32) {
        debug!("translate_polygon {:?} {}", polygon.face_handles, distance);

        let vertex_handles = self.polygon_vertex_handles(polygon);
        let positions = self.vertex_positions(&vertex_handles);
        let normal = self.polygon_normal(polygon);

        for (&vh, position) in vertex_handles.iter().zip(positions) {
            self.set_vertex_position(vh, position + normal * distance);
        }

        self.calculate_planar_uvs();
    }

    /// Scales every vertex of the polygon about `pivot` by `1 + scale_delta`
    /// (negative deltas shrink toward the pivot).
    pub fn scale_polygon_relative(
        &mut self,
        polygon: &PolygonHandle,
        pivot: Point3<f32>,
        scale_delta: f32,
    ) {
        debug!(
            "scale_polygon_relative {:?} pivot {:?} scale {}",
            polygon.face_handles, pivot, scale_delta
        );

        let space = self.polygon_space(polygon, pivot);
        for vh in self.polygon_vertex_handles(polygon) {
            let position = self.vertex_position(vh);
            self.set_vertex_position(vh, math::scale_position(1.0 + scale_delta, position, &space));
        }

        self.calculate_normals();
        self.calculate_planar_uvs();
    }

    /// Moves both vertices of an edge by `displacement`.
    pub fn translate_edge(&mut self, eh: EdgeHandle, displacement: Vector3<f32>) {
        debug!("translate_edge {:?} {:?}", eh, displacement);

        for &vh in self.edge_vertex_handles(eh).iter() {
            let position = self.vertex_position(vh);
            self.set_vertex_position(vh, position + displacement);
        }

        self.calculate_normals();
        self.calculate_planar_uvs();
    }
}


// ===============================================================================================
// ===== Hiding and restoring
// ===============================================================================================

impl WhiteBoxMesh {
    /// Marks a vertex as not user-selectable.
    pub fn hide_vertex(&mut self, vh: VertexHandle) {
        debug!("hide_vertex {:?}", vh);
        self.vertices[vh].hidden = true;
    }

    /// Makes a vertex user-selectable again, unconditionally.
    pub fn restore_vertex(&mut self, vh: VertexHandle) {
        debug!("restore_vertex {:?}", vh);
        self.vertices[vh].hidden = false;
    }

    /// Restores a vertex unless it is isolated (no user edge left to attach
    /// a selection to). Returns whether anything changed.
    pub fn try_restore_vertex(&mut self, vh: VertexHandle) -> bool {
        debug!("try_restore_vertex {:?}", vh);

        if !self.vertex_is_isolated(vh) {
            self.restore_vertex(vh);
            return true;
        }

        false
    }

    /// Hides an edge, merging the polygons on its two sides into one.
    /// Vertices that end up with no user edge are hidden as a side effect.
    /// Returns the merged polygon.
    pub fn hide_edge(&mut self, eh: EdgeHandle) -> PolygonHandle {
        debug!("hide_edge {:?}", eh);

        if self.num_halfedges() == 0 || !self.contains_edge(eh) {
            return PolygonHandle::default();
        }

        let faces = self.edge_face_handles(eh);
        let seed = match faces.first() {
            Some(&fh) => fh,
            None => return PolygonHandle::default(),
        };

        // vertex candidates for hiding, gathered before the merge
        let first_polygon = self.face_polygon_handle(seed);
        let first_polygon_vertices = self.polygon_vertex_handles(&first_polygon);

        self.edges[eh].hidden = true;

        let merged = self.face_polygon_handle(seed);

        for vh in first_polygon_vertices {
            if self.vertex_is_isolated(vh) {
                self.hide_vertex(vh);
            }
        }

        merged
    }

    /// Promotes a hidden edge back to a user edge, splitting its polygon in
    /// two.
    ///
    /// When the polygon has several borders (a hole), one restored edge may
    /// not disconnect anything yet; in that case the edge is remembered in
    /// `restoring_edge_handles` and `None` is returned. Callers must keep
    /// passing the same accumulator across calls; once the accumulated edges
    /// together separate two face sets, the split succeeds, the participating
    /// edges become user edges (and leave the accumulator), and the two
    /// polygons are returned.
    pub fn restore_edge(
        &mut self,
        eh: EdgeHandle,
        restoring_edge_handles: &mut Vec<EdgeHandle>,
    ) -> Option<[PolygonHandle; 2]> {
        debug!("restore_edge {:?} (pending {:?})", eh, restoring_edge_handles);

        // an existing user edge has nothing to restore
        if !self.edge_is_hidden(eh) {
            return None;
        }

        let first = self.edge_halfedge_handle(eh, EdgeHalfedge::First);
        let second = self.edge_halfedge_handle(eh, EdgeHalfedge::Second);

        // a hidden edge always lies strictly inside a polygon
        let seed = self.halfedge_face_handle(first)?;
        let polygon = self.face_polygon_handle(seed);
        let border = self.polygon_border_halfedge_handles_flattened(&polygon);

        let first_polygon = self.merge_faces(first, second, &border, restoring_edge_handles);
        let second_polygon = self.merge_faces(second, first, &border, restoring_edge_handles);

        // identical face sets happen when the restored edges form a loop
        let identical = {
            let mut a = first_polygon.face_handles.clone();
            let mut b = second_polygon.face_handles.clone();
            a.sort_unstable();
            b.sort_unstable();
            a == b
        };

        // if one side spans the whole polygon, nothing was disconnected yet
        if first_polygon.face_handles.len() == polygon.face_handles.len() || identical {
            restoring_edge_handles.push(eh);
            return None;
        }

        // the split happened: align the stored flags with the new grouping
        let mut all_polygon_edges = self.polygon_border_edge_handles_flattened(&first_polygon);
        all_polygon_edges.extend(self.polygon_border_edge_handles_flattened(&second_polygon));
        all_polygon_edges.sort_unstable();
        all_polygon_edges.dedup();

        self.edges[eh].hidden = false;
        for &pending in restoring_edge_handles.iter() {
            if all_polygon_edges.binary_search(&pending).is_ok() {
                self.edges[pending].hidden = false;
            }
        }

        // un-hide every endpoint that is no longer isolated
        for &restored in restoring_edge_handles.iter().chain(std::iter::once(&eh)) {
            for &vh in self.edge_vertex_handles(restored).iter() {
                self.try_restore_vertex(vh);
            }
        }

        restoring_edge_handles.retain(|pending| all_polygon_edges.binary_search(pending).is_err());

        Some([first_polygon, second_polygon])
    }

    /// Collects the faces reachable from `halfedge` without crossing the
    /// candidate edge (`opposite` side), the polygon border, or any edge in
    /// `building_edges`: the tentative polygon on one side of a restore.
    fn merge_faces(
        &self,
        halfedge: HalfedgeHandle,
        opposite: HalfedgeHandle,
        border: &[HalfedgeHandle],
        building_edges: &[EdgeHandle],
    ) -> PolygonHandle {
        let mut polygon_faces: Vec<FaceHandle> = Vec::new();

        let mut to_visit = vec![halfedge];
        let mut visited: Vec<HalfedgeHandle> = Vec::new();

        while let Some(he) = to_visit.pop() {
            visited.push(he);

            let face = match self.halfedge_face_handle(he) {
                Some(fh) => fh,
                None => continue,
            };
            if polygon_faces.contains(&face) {
                continue;
            }

            polygon_faces.push(face);

            for face_he in self.face_halfedge_handles(face) {
                let eh = self.halfedge_edge_handle(face_he);
                if face_he != opposite
                    && !border.contains(&face_he)
                    && !visited.contains(&face_he)
                    && !building_edges.contains(&eh)
                {
                    to_visit.push(self.halfedge_opposite_handle(face_he));
                }
            }
        }

        PolygonHandle::new(polygon_faces)
    }
}


// ===============================================================================================
// ===== Splitting and flipping
// ===============================================================================================

impl WhiteBoxMesh {
    /// Inserts a vertex at `position` on the edge, subdividing the edge and
    /// its adjacent faces. The new vertex is hidden iff the edge was a mesh
    /// edge; the two halves keep the original crossability, the transversal
    /// edges are always hidden. Polygon membership of the new faces follows
    /// automatically from the derived grouping.
    pub fn split_edge(&mut self, eh: EdgeHandle, position: Point3<f32>) -> VertexHandle {
        debug!("split_edge {:?} {:?}", eh, position);

        let user_edge = self.edge_is_user(eh);
        let hidden_flag = self.edges[eh].hidden;

        let split = self.split_edge_topology(eh, position);

        self.edges[split.new_edge].hidden = hidden_flag;
        for &transversal in &split.transversal_edges {
            self.edges[transversal].hidden = true;
        }

        if !user_edge {
            self.hide_vertex(split.vertex);
        }

        split.vertex
    }

    /// Inserts a vertex inside a triangle, fanning it into three. All new
    /// edges and the new vertex are hidden, so the face's polygon simply
    /// grows by two faces.
    pub fn split_face(&mut self, fh: FaceHandle, position: Point3<f32>) -> VertexHandle {
        debug!("split_face {:?} {:?}", fh, position);

        let split = self.split_face_topology(fh, position);

        for &new_edge in &split.new_edges {
            self.edges[new_edge].hidden = true;
        }

        self.hide_vertex(split.vertex);

        split.vertex
    }

    /// Re-triangulates the quad around an interior diagonal. Fails (returns
    /// `false`, no mutation) on boundary edges and on user edges: flipping a
    /// visible edge would silently change the visible silhouette.
    pub fn flip_edge(&mut self, eh: EdgeHandle) -> bool {
        debug!("flip_edge {:?}", eh);

        if !self.contains_edge(eh) || !self.edge_is_hidden(eh) {
            return false;
        }

        self.flip_edge_topology(eh)
    }
}
