//! Low-level topology edits: edge flipping and edge/face splitting.
//!
//! These only maintain connectivity; the hidden/user flag bookkeeping on top
//! of them lives with the editing operations.

use cgmath::{prelude::*, Point3, Vector3};
use optional::Optioned as Opt;
use smallvec::{smallvec, SmallVec};

use crate::handle::{EdgeHandle, FaceHandle, Handle, HalfedgeHandle, VertexHandle};
use super::{checked::Checked, Face, WhiteBoxMesh};


/// Result of a low-level edge split.
#[derive(Debug, Clone)]
pub struct EdgeSplit {
    /// The inserted midpoint vertex.
    pub vertex: VertexHandle,

    /// The second half of the split edge (the original edge handle remains
    /// the first half).
    pub new_edge: EdgeHandle,

    /// The 1–2 edges inserted across the adjacent faces.
    pub transversal_edges: SmallVec<[EdgeHandle; 2]>,
}

/// Result of a low-level face split.
#[derive(Debug, Clone)]
pub struct FaceSplit {
    /// The inserted interior vertex.
    pub vertex: VertexHandle,

    /// The three edges fanning out from the new vertex.
    pub new_edges: SmallVec<[EdgeHandle; 3]>,
}


impl WhiteBoxMesh {
    /// Re-triangulates the quad formed by the two faces of `eh` along the
    /// other diagonal.
    ///
    /// Returns `false` without touching the mesh when the edge does not
    /// exist, borders fewer than two faces, or the target diagonal already
    /// exists.
    pub(crate) fn flip_edge_topology(&mut self, eh: EdgeHandle) -> bool {
        //                                  |
        //            Before                |                After
        //                                  |
        //              [C]                 |                 [C]
        //          ^  /   ^  \             |             ^  / ^ | \  \
        //         c  /     \  d            |            c  /  | |  \  d
        //        /  /  (X)  \  \           |           /  /   | |   \  \
        //       /  v    a    \  v          |          /  v    | |    \  v
        //  [A]     --------->     [B]      |     [A]  (Y)   b | | a   (X)  [B]
        //       ^  \ <-------- ^  /        |          ^  \    | |    ^  /
        //        \  \    b    /  /         |           \  \   | |   /  /
        //         e  \  (Y)  /  f          |            e  \  | v  /  f
        //          \  v     v  /           |             \  v     v  /
        //              [D]                 |                 [D]
        //
        let he_center_above = match self.try_half_of(eh) {
            Some(he) => he,
            None => return false,
        };
        let he_center_below = he_center_above.twin();

        let faces = (
            self[he_center_above].face.into_option(),
            self[he_center_below].face.into_option(),
        );
        let (f_above, f_below) = match faces {
            (Some(above), Some(below)) => (above, below),
            _ => return false,
        };

        let he_above_right = self[he_center_above].next;
        let he_above_left = self[he_above_right].next;
        let he_below_left = self[he_center_below].next;
        let he_below_right = self[he_below_left].next;

        let v_right = self[he_center_above].target;
        let v_left = self[he_center_below].target;
        let v_above = self[he_above_right].target;
        let v_below = self[he_below_left].target;

        // The flipped edge would be a duplicate if the opposite diagonal is
        // already in the mesh.
        if self.he_between(v_above, v_below).is_some() {
            return false;
        }

        // `outgoing` handles only need fixing when they point along the
        // rotating diagonal; a vertex whose outgoing handle was the diagonal
        // cannot be a boundary vertex, so any replacement halfedge works.
        if self[v_left].outgoing == Opt::some(he_center_above) {
            self[v_left].outgoing = Opt::some(he_below_left);
        }
        if self[v_right].outgoing == Opt::some(he_center_below) {
            self[v_right].outgoing = Opt::some(he_above_right);
        }

        self[f_above].edge = he_center_above;
        self[f_below].edge = he_center_below;

        self[he_center_above].target = v_above;
        self[he_center_above].next = he_above_left;
        self[he_center_below].target = v_below;
        self[he_center_below].next = he_below_right;

        self[he_above_left].next = he_below_left;
        self[he_below_left].face = Opt::some(f_above);
        self[he_below_left].next = he_center_above;

        self[he_below_right].next = he_above_right;
        self[he_above_right].face = Opt::some(f_below);
        self[he_above_right].next = he_center_below;

        let normal = self.compute_face_normal(f_above);
        self[f_above].normal = normal;
        let normal = self.compute_face_normal(f_below);
        self[f_below].normal = normal;

        true
    }

    /// Splits `eh` at `position`: inserts a midpoint vertex, divides the
    /// edge into two, and divides each adjacent face into two.
    pub(crate) fn split_edge_topology(&mut self, eh: EdgeHandle, position: Point3<f32>) -> EdgeSplit {
        // Split just the edge first:
        //
        //             above           new_above
        //   (left) ----------> (mid) -----------> (right)
        //          <---------- (mid) <-----------
        //             below           new_below
        //
        let he_above = self.checked_half_of(eh);
        let he_below = he_above.twin();
        let v_right = self[he_above].target;

        let he_below_prev = self.prev(he_below);

        let v_mid = Checked(self.add_vertex(position));
        let he_new_above = self.add_edge_partially(v_mid, v_right);
        let he_new_below = he_new_above.twin();

        self[he_new_above].next = self[he_above].next;
        self[he_above].next = he_new_above;
        self[he_above].target = v_mid;
        self[he_new_below].next = he_below;
        self[he_below_prev].next = he_new_below;

        // `v_right.outgoing` must stay a boundary halfedge if it was one.
        if self[v_right].outgoing == Opt::some(he_below) {
            self[v_right].outgoing = Opt::some(he_new_below);
        }

        let face_above = self[he_above].face.into_option();
        let face_below = self[he_below].face.into_option();
        let outgoing = match (face_above.is_some(), face_below.is_some()) {
            // pick a boundary halfedge for the midpoint where one exists
            (false, true) => he_new_above,
            (true, false) => he_below,
            (false, false) | (true, true) => he_new_above,
        };
        self[v_mid].outgoing = Opt::some(outgoing);

        // Then split the (up to two) adjacent faces. On both sides the old
        // face record stays with the sub-face next to the original edge
        // half, so the split edge keeps its old neighbors.
        let mut transversal_edges = SmallVec::new();
        if let Some(face) = face_above {
            transversal_edges.push(self.split_adjacent_face(face, he_above, he_new_above, v_mid, true));
        }
        if let Some(face) = face_below {
            transversal_edges.push(self.split_adjacent_face(face, he_new_below, he_below, v_mid, false));
        }

        EdgeSplit {
            vertex: *v_mid,
            new_edge: he_new_above.full_edge(),
            transversal_edges,
        }
    }

    /// Divides one face along `v_mid` -> apex:
    ///
    //                      (top)
    //                    /  ^ |  \
    //                   /   | |   \                       1: mid_right
    //       top_left   /  2 | | 1  \   top_right          2: mid_left
    //                 v     | v     v
    //   (left) ----------> (mid) -----------> (right)
    //          bottom_left       bottom_right
    //
    /// `old_keeps_left` selects which of the two sub-faces reuses the old
    /// face record. Returns the new transversal edge.
    fn split_adjacent_face(
        &mut self,
        old_face: Checked<FaceHandle>,
        he_bottom_left: Checked<HalfedgeHandle>,
        he_bottom_right: Checked<HalfedgeHandle>,
        v_mid: Checked<VertexHandle>,
        old_keeps_left: bool,
    ) -> EdgeHandle {
        let he_top_right = self[he_bottom_right].next;
        let v_top = self[he_top_right].target;
        let he_top_left = self[he_top_right].next;

        let he_mid_left = self.add_edge_partially(v_mid, v_top);
        let he_mid_right = he_mid_left.twin();

        let new_face = Checked(self.faces.push(Face {
            edge: Checked(HalfedgeHandle::new(0)), // overwritten below
            normal: Vector3::zero(),
        }));
        let (left_face, right_face) = if old_keeps_left {
            (old_face, new_face)
        } else {
            (new_face, old_face)
        };

        self[he_bottom_left].next = he_mid_left;
        self[he_bottom_left].face = Opt::some(left_face);
        self[he_mid_left].next = he_top_left;
        self[he_mid_left].face = Opt::some(left_face);
        self[he_top_left].face = Opt::some(left_face);
        self[left_face].edge = he_bottom_left;

        self[he_top_right].next = he_mid_right;
        self[he_mid_right].next = he_bottom_right;
        self[he_mid_right].face = Opt::some(right_face);
        self[he_bottom_right].face = Opt::some(right_face);
        self[he_top_right].face = Opt::some(right_face);
        self[right_face].edge = he_bottom_right;

        let normal = self.compute_face_normal(left_face);
        self[left_face].normal = normal;
        let normal = self.compute_face_normal(right_face);
        self[right_face].normal = normal;

        he_mid_left.full_edge()
    }

    /// Splits `fh` into three triangles fanned around a vertex at
    /// `position`.
    pub(crate) fn split_face_topology(&mut self, fh: FaceHandle, position: Point3<f32>) -> FaceSplit {
        let f = self.check_face(fh);

        // Walk the face once; each sector contributes one new edge from the
        // midpoint and one new face, except for the last sector, which
        // reuses the old face record. Starting the walk one halfedge past
        // the stored one leaves the old record on the stored halfedge's
        // sector.
        let midpoint = Checked(self.add_vertex(position));

        let start_ohe = self[self[f].edge].next;
        let start_vertex = self[start_ohe.twin()].target;

        let start_nhe = self.add_edge_partially(midpoint, start_vertex);
        self[midpoint].outgoing = Opt::some(start_nhe);

        let mut new_edges: SmallVec<[EdgeHandle; 3]> = smallvec![start_nhe.full_edge()];

        let mut border_ohe = start_ohe;
        let mut last_nhe = start_nhe;

        while self[border_ohe].target != start_vertex {
            let next_border_ohe = self[border_ohe].next;

            let next_vertex = self[border_ohe].target;
            let next_nhe = self.add_edge_partially(midpoint, next_vertex);
            new_edges.push(next_nhe.full_edge());

            let inner_new = next_nhe.twin();
            let new_face = Checked(self.faces.push(Face {
                edge: inner_new,
                normal: Vector3::zero(),
            }));

            self[inner_new].next = last_nhe;
            self[last_nhe].next = border_ohe;
            self[border_ohe].next = inner_new;

            self[inner_new].face = Opt::some(new_face);
            self[last_nhe].face = Opt::some(new_face);
            self[border_ohe].face = Opt::some(new_face);

            let normal = self.compute_face_normal(new_face);
            self[new_face].normal = normal;

            last_nhe = next_nhe;
            border_ohe = next_border_ohe;
        }

        // the last sector reuses the old face record
        let start_inner_nhe = start_nhe.twin();
        self[f].edge = start_inner_nhe;

        self[start_inner_nhe].next = last_nhe;
        self[last_nhe].next = border_ohe;
        self[border_ohe].next = start_inner_nhe;

        self[start_inner_nhe].face = Opt::some(f);
        self[last_nhe].face = Opt::some(f);
        // `border_ohe.face` is already `f`

        let normal = self.compute_face_normal(f);
        self[f].normal = normal;

        FaceSplit {
            vertex: *midpoint,
            new_edges,
        }
    }
}
