//! Circulators and local adjacency queries.
//!
//! Rotational order around a vertex is defined by successive
//! opposite-then-next hops starting at the vertex's stored halfedge; face
//! order is CCW via `next`. All public queries answer with empty collections
//! for handles that do not exist (a valid "nothing here" answer), matching
//! the invalid-handle policy of the editing API.

use cgmath::{prelude::*, Point3, Vector3};
use smallvec::SmallVec;

use crate::{
    handle::{EdgeHandle, FaceHandle, HalfedgeHandle, VertexHandle},
    math,
};
use super::{checked::Checked, EdgeHalfedge, WhiteBoxMesh};


/// Rotates around a vertex, yielding outgoing halfedges.
pub(crate) enum VertexCirculator<'a> {
    Empty,
    NonEmpty {
        mesh: &'a WhiteBoxMesh,
        current_he: Checked<HalfedgeHandle>,
        start_he: Checked<HalfedgeHandle>,
    },
}

impl Iterator for VertexCirculator<'_> {
    type Item = Checked<HalfedgeHandle>;

    #[inline(always)]
    fn next(&mut self) -> Option<Self::Item> {
        match *self {
            VertexCirculator::Empty => None,
            VertexCirculator::NonEmpty { mesh, ref mut current_he, start_he } => {
                let out = *current_he;

                let next = mesh[out.twin()].next;
                if next == start_he {
                    *self = VertexCirculator::Empty;
                } else {
                    *current_he = next;
                }

                Some(out)
            }
        }
    }
}

impl WhiteBoxMesh {
    pub(crate) fn circulate_around_vertex(&self, center: Checked<VertexHandle>) -> VertexCirculator<'_> {
        match self[center].outgoing.into_option() {
            None => VertexCirculator::Empty,
            Some(start_he) => VertexCirculator::NonEmpty {
                mesh: self,
                current_he: start_he,
                start_he,
            },
        }
    }

    /// The three inner halfedges of a face, starting at the stored one.
    pub(crate) fn face_halfedges(&self, f: Checked<FaceHandle>) -> [Checked<HalfedgeHandle>; 3] {
        let he0 = self[f].edge;
        let he1 = self[he0].next;
        let he2 = self[he1].next;
        [he0, he1, he2]
    }
}


// ===============================================================================================
// ===== Halfedge queries
// ===============================================================================================

impl WhiteBoxMesh {
    /// The vertex this halfedge points at.
    pub fn halfedge_vertex_handle_at_tip(&self, heh: HalfedgeHandle) -> VertexHandle {
        *self.half_edges[heh].target
    }

    /// The vertex this halfedge starts from.
    pub fn halfedge_vertex_handle_at_tail(&self, heh: HalfedgeHandle) -> VertexHandle {
        self.halfedge_vertex_handle_at_tip(self.halfedge_opposite_handle(heh))
    }

    pub fn halfedge_vertex_position_at_tip(&self, heh: HalfedgeHandle) -> Point3<f32> {
        self.vertex_position(self.halfedge_vertex_handle_at_tip(heh))
    }

    pub fn halfedge_vertex_position_at_tail(&self, heh: HalfedgeHandle) -> Point3<f32> {
        self.vertex_position(self.halfedge_vertex_handle_at_tail(heh))
    }

    /// The opposite (twin) halfedge.
    pub fn halfedge_opposite_handle(&self, heh: HalfedgeHandle) -> HalfedgeHandle {
        let heh = self
            .try_halfedge(heh)
            .unwrap_or_else(|| panic!("{:?} does not exist in this mesh", heh));
        *heh.twin()
    }

    /// The edge this halfedge belongs to.
    pub fn halfedge_edge_handle(&self, heh: HalfedgeHandle) -> EdgeHandle {
        heh.full_edge()
    }

    /// The face bordered by this halfedge, or `None` on a boundary.
    pub fn halfedge_face_handle(&self, heh: HalfedgeHandle) -> Option<FaceHandle> {
        self.half_edges[heh].face.into_option().map(|f| *f)
    }

    /// The face on the other side of this halfedge's edge, or `None`.
    pub fn halfedge_opposite_face_handle(&self, heh: HalfedgeHandle) -> Option<FaceHandle> {
        self.halfedge_face_handle(self.halfedge_opposite_handle(heh))
    }

    /// Whether the halfedge has no adjacent face.
    pub fn halfedge_is_boundary(&self, heh: HalfedgeHandle) -> bool {
        self.half_edges[heh].face.is_none()
    }

    /// The next halfedge around the face (CCW order).
    pub fn halfedge_handle_next(&self, heh: HalfedgeHandle) -> HalfedgeHandle {
        *self.half_edges[heh].next
    }

    /// The previous halfedge around the face (CW order).
    pub fn halfedge_handle_previous(&self, heh: HalfedgeHandle) -> HalfedgeHandle {
        let heh = self
            .try_halfedge(heh)
            .unwrap_or_else(|| panic!("{:?} does not exist in this mesh", heh));
        *self.prev(heh)
    }
}


// ===============================================================================================
// ===== Edge queries
// ===============================================================================================

impl WhiteBoxMesh {
    /// Selects one halfedge of an edge; `First` is the canonical
    /// (even-indexed) one, defined at edge creation.
    pub fn edge_halfedge_handle(&self, eh: EdgeHandle, which: EdgeHalfedge) -> HalfedgeHandle {
        let first = self.checked_half_of(eh);
        match which {
            EdgeHalfedge::First => *first,
            EdgeHalfedge::Second => *first.twin(),
        }
    }

    /// The non-boundary halfedges of an edge: one element at a mesh
    /// boundary, two otherwise, canonical halfedge first.
    pub fn edge_halfedge_handles(&self, eh: EdgeHandle) -> SmallVec<[HalfedgeHandle; 2]> {
        let mut handles = SmallVec::new();
        if let Some(first) = self.try_half_of(eh) {
            for he in &[first, first.twin()] {
                if self[*he].face.is_some() {
                    handles.push(**he);
                }
            }
        }

        handles
    }

    /// Tail and tip vertices of the edge's canonical halfedge.
    pub fn edge_vertex_handles(&self, eh: EdgeHandle) -> [VertexHandle; 2] {
        let first = self.checked_half_of(eh);
        [*self[first.twin()].target, *self[first].target]
    }

    /// The 1–2 faces adjacent to an edge.
    pub fn edge_face_handles(&self, eh: EdgeHandle) -> SmallVec<[FaceHandle; 2]> {
        let mut faces = SmallVec::new();
        if let Some(first) = self.try_half_of(eh) {
            for he in &[first, first.twin()] {
                if let Some(f) = self[*he].face.into_option() {
                    faces.push(*f);
                }
            }
        }

        faces
    }

    /// Whether the edge borders fewer than two faces.
    pub fn edge_is_boundary(&self, eh: EdgeHandle) -> bool {
        let first = self.checked_half_of(eh);
        self[first].face.is_none() || self[first.twin()].face.is_none()
    }

    pub fn edge_vertex_positions(&self, eh: EdgeHandle) -> [Point3<f32>; 2] {
        let [tail, tip] = self.edge_vertex_handles(eh);
        [self.vertex_position(tail), self.vertex_position(tip)]
    }

    pub fn edge_midpoint(&self, eh: EdgeHandle) -> Point3<f32> {
        let [a, b] = self.edge_vertex_positions(eh);
        a.midpoint(b)
    }

    /// Vector from the edge's tail to its tip. When `from` is one of the
    /// edge's vertices, the vector points away from it.
    pub(crate) fn edge_vector_from(&self, eh: EdgeHandle, from: Option<VertexHandle>) -> Vector3<f32> {
        let [tail, tip] = self.edge_vertex_handles(eh);
        let (start, end) = match from {
            Some(vh) if vh == tip => (tip, tail),
            _ => (tail, tip),
        };

        self.vertex_position(end) - self.vertex_position(start)
    }

    pub fn edge_vector(&self, eh: EdgeHandle) -> Vector3<f32> {
        self.edge_vector_from(eh, None)
    }

    pub(crate) fn edge_axis_from(&self, eh: EdgeHandle, from: Option<VertexHandle>) -> Vector3<f32> {
        math::normalize_safe(self.edge_vector_from(eh, from))
    }

    /// Normalized edge direction (zero for a degenerate edge).
    pub fn edge_axis(&self, eh: EdgeHandle) -> Vector3<f32> {
        self.edge_axis_from(eh, None)
    }
}


// ===============================================================================================
// ===== Vertex queries
// ===============================================================================================

impl WhiteBoxMesh {
    /// Outgoing halfedges in rotational order, starting from the vertex's
    /// stored halfedge.
    pub fn vertex_outgoing_halfedge_handles(&self, vh: VertexHandle) -> Vec<HalfedgeHandle> {
        match self.try_vertex(vh) {
            Some(v) => self.circulate_around_vertex(v).map(|he| *he).collect(),
            None => Vec::new(),
        }
    }

    /// Incoming halfedges in rotational order (the twins of the outgoing
    /// ones).
    pub fn vertex_incoming_halfedge_handles(&self, vh: VertexHandle) -> Vec<HalfedgeHandle> {
        match self.try_vertex(vh) {
            Some(v) => self.circulate_around_vertex(v).map(|he| *he.twin()).collect(),
            None => Vec::new(),
        }
    }

    /// All halfedges touching the vertex: outgoing ones first, then incoming
    /// ones.
    pub fn vertex_halfedge_handles(&self, vh: VertexHandle) -> Vec<HalfedgeHandle> {
        let mut handles = self.vertex_outgoing_halfedge_handles(vh);
        handles.extend(self.vertex_incoming_halfedge_handles(vh));
        handles
    }

    /// All edges touching the vertex, in rotational order.
    pub fn vertex_edge_handles(&self, vh: VertexHandle) -> Vec<EdgeHandle> {
        match self.try_vertex(vh) {
            Some(v) => self.circulate_around_vertex(v).map(|he| he.full_edge()).collect(),
            None => Vec::new(),
        }
    }
}


// ===============================================================================================
// ===== Face queries
// ===============================================================================================

impl WhiteBoxMesh {
    /// The three inner halfedges of a face in CCW order.
    pub fn face_halfedge_handles(&self, fh: FaceHandle) -> SmallVec<[HalfedgeHandle; 3]> {
        match self.try_face(fh) {
            Some(f) => self.face_halfedges(f).iter().map(|he| **he).collect(),
            None => SmallVec::new(),
        }
    }

    /// The three edges of a face.
    pub fn face_edge_handles(&self, fh: FaceHandle) -> SmallVec<[EdgeHandle; 3]> {
        self.face_halfedge_handles(fh)
            .into_iter()
            .map(|heh| heh.full_edge())
            .collect()
    }

    /// The three vertices of a face, in the order they were passed to
    /// `add_face`.
    pub fn face_vertex_handles(&self, fh: FaceHandle) -> SmallVec<[VertexHandle; 3]> {
        self.face_halfedge_handles(fh)
            .into_iter()
            .map(|heh| self.halfedge_vertex_handle_at_tip(heh))
            .collect()
    }

    pub fn face_vertex_positions(&self, fh: FaceHandle) -> SmallVec<[Point3<f32>; 3]> {
        self.face_vertex_handles(fh)
            .into_iter()
            .map(|vh| self.vertex_position(vh))
            .collect()
    }

    /// Corner positions of the given faces, three per face.
    pub fn faces_positions(&self, fhs: &[FaceHandle]) -> Vec<Point3<f32>> {
        let mut positions = Vec::with_capacity(fhs.len() * 3);
        for &fh in fhs {
            positions.extend(self.face_vertex_positions(fh));
        }

        positions
    }

    /// All triangles of the mesh as corner-position triples, in face handle
    /// order.
    pub fn mesh_faces(&self) -> Vec<[Point3<f32>; 3]> {
        self.face_handles()
            .into_iter()
            .map(|fh| {
                let positions = self.face_vertex_positions(fh);
                [positions[0], positions[1], positions[2]]
            })
            .collect()
    }

    pub fn face_midpoint(&self, fh: FaceHandle) -> Point3<f32> {
        let positions = self.face_vertex_positions(fh);
        Point3::centroid(&positions)
    }

    /// Arithmetic mean of the given vertices' positions.
    pub fn vertices_midpoint(&self, vhs: &[VertexHandle]) -> Point3<f32> {
        if vhs.is_empty() {
            return Point3::origin();
        }

        Point3::centroid(&self.vertex_positions(vhs))
    }
}
