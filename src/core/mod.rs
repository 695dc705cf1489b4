//! The half-edge mesh store.
//!
//! # Some notes for developers about this implementation
//!
//! - The two opposite halfedges of an edge are stored next to one another in
//!   the underlying arena and thus always have indices 2k and 2k + 1. The
//!   opposite handle is computed by flipping the lowest index bit, and edge
//!   handles map to halfedge handles by a single shift.
//! - Arena indices are handed out monotonically and never reused, even after
//!   removals. Everything that derives data from handles (polygon grouping,
//!   render data, serialization) depends on this.
//! - Faces are always triangles. Boundary halfedges have no face; their
//!   `next` handles chain them into hole cycles. A boundary vertex stores a
//!   boundary halfedge as its `outgoing` handle, which the face-insertion
//!   code requires to find the hole to insert into.

use cgmath::{prelude::*, Point3, Vector2, Vector3};
use log::debug;
use optional::Optioned as Opt;
use smallvec::SmallVec;

use crate::{
    handle::{hsize, EdgeHandle, FaceHandle, Handle, HalfedgeHandle, VertexHandle},
    map::VecMap,
    math,
};
use self::checked::Checked;

pub(crate) mod checked;

mod adj;
mod edit;
#[cfg(test)]
mod tests;


const NON_MANIFOLD_VERTEX_ERR: &str =
    "new face would add a non-manifold vertex (no hole found in cycle)";
const NON_MANIFOLD_EDGE_ERR: &str = "new face would add a non-manifold edge";


// ===============================================================================================
// ===== Definition of types stored inside the data structure
// ===============================================================================================

/// Data stored per vertex.
#[derive(Clone, Copy)]
pub(crate) struct Vertex {
    pub(crate) position: Point3<f32>,

    /// One outgoing halfedge.
    ///
    /// - `none` if the vertex is isolated.
    /// - A boundary halfedge if the vertex lies on a boundary (one such
    ///   halfedge exists per fan blade).
    /// - Arbitrary otherwise.
    pub(crate) outgoing: Opt<Checked<HalfedgeHandle>>,

    /// Whether the vertex is hidden from the user (topologically present but
    /// not selectable, e.g. a subdivision byproduct).
    pub(crate) hidden: bool,
}

/// Data stored per halfedge.
#[derive(Clone, Copy)]
pub(crate) struct HalfEdge {
    /// The vertex this halfedge points to.
    pub(crate) target: Checked<VertexHandle>,

    /// The adjacent face, if one exists.
    pub(crate) face: Opt<Checked<FaceHandle>>,

    /// The next halfedge around the face (CCW) or around the hole.
    pub(crate) next: Checked<HalfedgeHandle>,

    /// Texture coordinate at the tip of this halfedge.
    pub(crate) uv: Vector2<f32>,
}

/// Data stored per edge (per halfedge pair).
#[derive(Clone, Copy)]
pub(crate) struct Edge {
    /// The stored grouping flag: hidden edges merge their two faces into one
    /// logical polygon. User/mesh classification is derived from grouping,
    /// not read from this flag directly.
    pub(crate) hidden: bool,
}

/// Data stored per face.
#[derive(Clone, Copy)]
pub(crate) struct Face {
    /// Handle of one (arbitrary) inner halfedge of the face.
    pub(crate) edge: Checked<HalfedgeHandle>,

    /// Face normal, recomputed on geometry changes.
    pub(crate) normal: Vector3<f32>,
}


/// Which halfedge of an edge to select.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EdgeHalfedge {
    /// The even-indexed halfedge (deterministic canonical choice).
    First,
    /// The odd-indexed halfedge.
    Second,
}


/// The mesh: vertices, triangular faces, halfedges, edges and their
/// connectivity, geometry and hidden/user classification flags.
///
/// A mesh is exclusively owned by one caller; all mutation goes through
/// `&mut self`. `clone()` produces a fully independent deep copy.
#[derive(Clone)]
pub struct WhiteBoxMesh {
    pub(crate) vertices: VecMap<VertexHandle, Vertex>,
    pub(crate) half_edges: VecMap<HalfedgeHandle, HalfEdge>,
    pub(crate) edges: VecMap<EdgeHandle, Edge>,
    pub(crate) faces: VecMap<FaceHandle, Face>,
}

impl std::fmt::Debug for WhiteBoxMesh {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        f.debug_struct("WhiteBoxMesh")
            .field("num_vertices", &self.num_vertices())
            .field("num_faces", &self.num_faces())
            .field("num_edges", &self.num_edges())
            .finish()
    }
}

impl Default for WhiteBoxMesh {
    fn default() -> Self {
        Self::new()
    }
}

impl Checked<HalfedgeHandle> {
    /// Returns the opposite halfedge (the twin stored right next to this
    /// halfedge, pointing in the other direction).
    ///
    /// Relies on the pairwise storage scheme: flipping the lowest bit of the
    /// index is all that is needed.
    #[inline(always)]
    pub(crate) fn twin(self) -> Checked<HalfedgeHandle> {
        Checked(HalfedgeHandle::new(self.idx() ^ 1))
    }
}

macro_rules! impl_index {
    ($handle:ident, $field:ident, $out:ident) => {
        impl std::ops::Index<Checked<$handle>> for WhiteBoxMesh {
            type Output = $out;

            #[inline(always)]
            fn index(&self, idx: Checked<$handle>) -> &Self::Output {
                &self.$field[*idx]
            }
        }

        impl std::ops::IndexMut<Checked<$handle>> for WhiteBoxMesh {
            #[inline(always)]
            fn index_mut(&mut self, idx: Checked<$handle>) -> &mut Self::Output {
                &mut self.$field[*idx]
            }
        }
    };
}

impl_index!(VertexHandle, vertices, Vertex);
impl_index!(HalfedgeHandle, half_edges, HalfEdge);
impl_index!(EdgeHandle, edges, Edge);
impl_index!(FaceHandle, faces, Face);


// ===============================================================================================
// ===== Construction, counts and element enumeration
// ===============================================================================================

impl WhiteBoxMesh {
    /// Creates an empty mesh.
    pub fn new() -> Self {
        Self {
            vertices: VecMap::new(),
            half_edges: VecMap::new(),
            edges: VecMap::new(),
            faces: VecMap::new(),
        }
    }

    /// Removes all elements. Handle counters restart: a cleared mesh is
    /// indistinguishable from a freshly created one.
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.half_edges.clear();
        self.edges.clear();
        self.faces.clear();
    }

    /// Deep copy with identical handles, connectivity, geometry and flags.
    pub fn clone_mesh(&self) -> Self {
        self.clone()
    }

    pub fn num_vertices(&self) -> hsize {
        self.vertices.num_elements()
    }

    pub fn num_faces(&self) -> hsize {
        self.faces.num_elements()
    }

    pub fn num_halfedges(&self) -> hsize {
        self.half_edges.num_elements()
    }

    pub fn num_edges(&self) -> hsize {
        self.edges.num_elements()
    }

    /// All live vertex handles in ascending index order.
    pub fn vertex_handles(&self) -> Vec<VertexHandle> {
        self.vertices.handles().collect()
    }

    /// All live face handles in ascending index order.
    pub fn face_handles(&self) -> Vec<FaceHandle> {
        self.faces.handles().collect()
    }

    /// All live edge handles in ascending index order.
    pub fn edge_handles(&self) -> Vec<EdgeHandle> {
        self.edges.handles().collect()
    }

    pub fn contains_vertex(&self, vh: VertexHandle) -> bool {
        self.vertices.contains_handle(vh)
    }

    pub fn contains_face(&self, fh: FaceHandle) -> bool {
        self.faces.contains_handle(fh)
    }

    pub fn contains_edge(&self, eh: EdgeHandle) -> bool {
        self.edges.contains_handle(eh)
    }
}


// ===============================================================================================
// ===== Internal helpers: handle validation and low-level traversal
// ===============================================================================================

impl WhiteBoxMesh {
    pub(crate) fn try_vertex(&self, vh: VertexHandle) -> Option<Checked<VertexHandle>> {
        if self.vertices.contains_handle(vh) {
            Some(Checked(vh))
        } else {
            None
        }
    }

    pub(crate) fn try_face(&self, fh: FaceHandle) -> Option<Checked<FaceHandle>> {
        if self.faces.contains_handle(fh) {
            Some(Checked(fh))
        } else {
            None
        }
    }

    pub(crate) fn try_halfedge(&self, heh: HalfedgeHandle) -> Option<Checked<HalfedgeHandle>> {
        if self.half_edges.contains_handle(heh) {
            Some(Checked(heh))
        } else {
            None
        }
    }

    /// Returns the canonical (even-indexed) halfedge of `eh`, if the edge
    /// exists.
    pub(crate) fn try_half_of(&self, eh: EdgeHandle) -> Option<Checked<HalfedgeHandle>> {
        let heh = HalfedgeHandle::lower_half_of(eh);
        if self.half_edges.contains_handle(heh) {
            Some(Checked(heh))
        } else {
            None
        }
    }

    /// Like [`Self::try_vertex`], but panics: mutating operations are not
    /// defined for dangling handles.
    pub(crate) fn check_vertex(&self, vh: VertexHandle) -> Checked<VertexHandle> {
        self.try_vertex(vh)
            .unwrap_or_else(|| panic!("{:?} does not exist in this mesh", vh))
    }

    pub(crate) fn check_face(&self, fh: FaceHandle) -> Checked<FaceHandle> {
        self.try_face(fh)
            .unwrap_or_else(|| panic!("{:?} does not exist in this mesh", fh))
    }

    pub(crate) fn checked_half_of(&self, eh: EdgeHandle) -> Checked<HalfedgeHandle> {
        self.try_half_of(eh)
            .unwrap_or_else(|| panic!("{:?} does not exist in this mesh", eh))
    }

    /// Returns the halfedge whose `next` points to `he`.
    ///
    /// `prev` handles are not stored, so this circulates around the origin
    /// vertex of `he` until the predecessor is found.
    pub(crate) fn prev(&self, he: Checked<HalfedgeHandle>) -> Checked<HalfedgeHandle> {
        self.find_incoming_he(he.twin(), |incoming| self[incoming].next == he)
            .expect("internal half-edge error: could not find `prev` halfedge")
    }

    /// Rotates around the vertex `start_edge` points at, yielding incoming
    /// halfedges, until `predicate` matches or the rotation closes.
    #[inline(always)]
    pub(crate) fn find_incoming_he(
        &self,
        start_edge: Checked<HalfedgeHandle>,
        mut predicate: impl FnMut(Checked<HalfedgeHandle>) -> bool,
    ) -> Option<Checked<HalfedgeHandle>> {
        let mut incoming = start_edge;
        loop {
            if predicate(incoming) {
                return Some(incoming);
            }

            let next = self[incoming].next.twin();
            if next == start_edge {
                return None;
            }

            incoming = next;
        }
    }

    /// Tries to find the halfedge from `from` to `to`.
    pub(crate) fn he_between(
        &self,
        from: Checked<VertexHandle>,
        to: Checked<VertexHandle>,
    ) -> Option<Checked<HalfedgeHandle>> {
        self.circulate_around_vertex(from)
            .find(|&outgoing| self[outgoing].target == to)
    }
}


// ===============================================================================================
// ===== Geometry accessors
// ===============================================================================================

impl WhiteBoxMesh {
    pub fn vertex_position(&self, vh: VertexHandle) -> Point3<f32> {
        self.vertices[vh].position
    }

    pub fn vertex_positions(&self, vhs: &[VertexHandle]) -> Vec<Point3<f32>> {
        vhs.iter().map(|&vh| self.vertex_position(vh)).collect()
    }

    /// Positions of all live vertices in handle order.
    pub fn mesh_vertex_positions(&self) -> Vec<Point3<f32>> {
        self.vertices.handles().map(|vh| self.vertices[vh].position).collect()
    }

    pub fn set_vertex_position(&mut self, vh: VertexHandle, position: Point3<f32>) {
        debug!("set_vertex_position {:?} {:?}", vh, position);
        self.vertices[vh].position = position;
    }

    /// Moves a vertex and refreshes the planar UVs of the whole mesh.
    pub fn set_vertex_position_and_update_uvs(&mut self, vh: VertexHandle, position: Point3<f32>) {
        self.set_vertex_position(vh, position);
        self.calculate_planar_uvs();
    }

    pub fn vertex_is_hidden(&self, vh: VertexHandle) -> bool {
        self.vertices[vh].hidden
    }

    pub fn face_normal(&self, fh: FaceHandle) -> Vector3<f32> {
        self.faces[fh].normal
    }

    pub fn halfedge_uv(&self, heh: HalfedgeHandle) -> Vector2<f32> {
        self.half_edges[heh].uv
    }

    /// Recomputes the normals of all faces from current vertex positions.
    pub fn calculate_normals(&mut self) {
        let fhs: Vec<_> = self.faces.handles().collect();
        for fh in fhs {
            let f = Checked(fh);
            let normal = self.compute_face_normal(f);
            self[f].normal = normal;
        }
    }

    /// Recomputes planar texture coordinates for the given faces.
    pub fn calculate_planar_uvs_for_faces(&mut self, fhs: &[FaceHandle]) {
        for &fh in fhs {
            let f = match self.try_face(fh) {
                Some(f) => f,
                None => continue,
            };

            let normal = self[f].normal;
            for he in self.face_halfedges(f) {
                let position = self[self[he].target].position;
                self[he].uv = math::planar_uv(normal, position);
            }
        }
    }

    /// Recomputes planar texture coordinates for every face.
    pub fn calculate_planar_uvs(&mut self) {
        let fhs = self.face_handles();
        self.calculate_planar_uvs_for_faces(&fhs);
    }

    /// Resets all texture coordinates to zero.
    pub fn zero_uvs(&mut self) {
        let hehs: Vec<_> = self.half_edges.handles().collect();
        for heh in hehs {
            self.half_edges[heh].uv = Vector2::zero();
        }
    }

    pub(crate) fn compute_face_normal(&self, f: Checked<FaceHandle>) -> Vector3<f32> {
        let [a, b, c] = self.face_positions(f);
        math::normalize_safe((b - a).cross(c - a))
    }

    fn face_positions(&self, f: Checked<FaceHandle>) -> [Point3<f32>; 3] {
        let he0 = self[f].edge;
        let he1 = self[he0].next;
        let he2 = self[he1].next;
        [
            self[self[he0].target].position,
            self[self[he1].target].position,
            self[self[he2].target].position,
        ]
    }
}


// ===============================================================================================
// ===== Mesh mutation: vertices and faces
// ===============================================================================================

impl WhiteBoxMesh {
    /// Adds an isolated vertex at `position` and returns its (fresh) handle.
    pub fn add_vertex(&mut self, position: Point3<f32>) -> VertexHandle {
        debug!("add_vertex {:?}", position);
        self.vertices.push(Vertex {
            position,
            outgoing: Opt::none(),
            hidden: false,
        })
    }

    /// Adds a triangle between three existing, distinct vertices.
    ///
    /// The vertices must be given in CCW order as seen from the side the
    /// normal should point to; a CW triple silently produces an inverted
    /// normal. Panics when the new face would create a non-manifold edge or
    /// vertex.
    pub fn add_face(&mut self, v0: VertexHandle, v1: VertexHandle, v2: VertexHandle) -> FaceHandle {
        debug!("add_face {:?} {:?} {:?}", v0, v1, v2);
        assert_ne!(v0, v1, "vertices of new face are not unique");
        assert_ne!(v0, v2, "vertices of new face are not unique");
        assert_ne!(v1, v2, "vertices of new face are not unique");

        let vertices = [self.check_vertex(v0), self.check_vertex(v1), self.check_vertex(v2)];
        self.add_face_impl(vertices)
    }

    /// Adds two halfedges between `from` and `to`, partially filled with
    /// dummy values, plus the edge record of the pair. Returns the halfedge
    /// pointing to `to`.
    ///
    /// The `next` fields hold a dummy value that the caller must overwrite;
    /// `outgoing` fields of the vertices are left untouched.
    pub(crate) fn add_edge_partially(
        &mut self,
        from: Checked<VertexHandle>,
        to: Checked<VertexHandle>,
    ) -> Checked<HalfedgeHandle> {
        let face = Opt::none();
        let next = Checked(HalfedgeHandle::new(0));
        let uv = Vector2::zero();

        // The halfedge running in the traversal direction gets the even
        // index and thereby becomes the edge's canonical "first" halfedge.
        let out = self.half_edges.push(HalfEdge { target: to, face, next, uv });
        let inward = self.half_edges.push(HalfEdge { target: from, face, next, uv });
        let eh = self.edges.push(Edge { hidden: false });

        debug_assert_eq!(out.idx(), eh.idx() * 2, "halfedge/edge arenas out of step");
        debug_assert_eq!(inward.idx(), out.idx() + 1);

        Checked(out)
    }

    fn add_face_impl(&mut self, vertices: [Checked<VertexHandle>; 3]) -> FaceHandle {
        // ===================================================================
        // ===== Find or create the three inner edges
        // ===================================================================
        let mut inner_half_edges = [Checked(HalfedgeHandle::new(0)); 3];
        for vi in 0..3 {
            let from = vertices[vi];
            let to = vertices[(vi + 1) % 3];

            let he = self.he_between(from, to);

            // A pre-existing halfedge already bound to a face means the edge
            // would have three adjacent faces after this call.
            if let Some(he) = he {
                assert!(self[he].face.is_none(), "{}", NON_MANIFOLD_EDGE_ERR);
            }

            inner_half_edges[vi] = he.unwrap_or_else(|| self.add_edge_partially(from, to));
        }

        // ===================================================================
        // ===== Add face and fix `face` handle of inner edges
        // ===================================================================
        let normal = {
            let [a, b, c] = [
                self[vertices[0]].position,
                self[vertices[1]].position,
                self[vertices[2]].position,
            ];
            math::normalize_safe((b - a).cross(c - a))
        };

        // Store the halfedge pointing at the first vertex, so that walking
        // the face yields its vertices in insertion order.
        let new_face = Checked(self.faces.push(Face {
            edge: inner_half_edges[2],
            normal,
        }));

        for &he in &inner_half_edges {
            self[he].face = Opt::some(new_face);
        }

        // ===================================================================
        // ===== Fix `next` handles around each corner
        // ===================================================================
        // For each corner vertex, `incoming` and `outgoing` are the two outer
        // (twin) halfedges meeting at it. What has to happen depends on
        // whether either of them is already bound to a face:
        //
        //                 ?
        //           ?           ?
        //
        //                (v)
        //               ^/ ^\
        //    incoming  //   \\  outgoing
        //             //  F   \\
        //            /v        \v
        //          ( ) ------> ( )
        //
        // Boundary vertices can carry several fan blades whose order around
        // the vertex is ambiguous; reconnecting blades is the ugly case.
        for vi in 0..3 {
            let prev_idx = (vi + 2) % 3;

            let vh = vertices[vi];
            let incoming = inner_half_edges[vi].twin();
            let outgoing = inner_half_edges[prev_idx].twin();

            let incoming_face = self[incoming].face;
            let outgoing_face = self[outgoing].face;

            match (incoming_face.is_some(), outgoing_face.is_some()) {
                // Both edges are new.
                (false, false) => {
                    if let Some(outgoing_from_v) = self[vh].outgoing.into_option() {
                        // `v` already has edges: insert the new blade between
                        // the end of one existing blade and the start of the
                        // next.
                        let end = self
                            .find_incoming_he(outgoing_from_v.twin(), |incoming| {
                                self[incoming].face.is_none()
                            })
                            .expect(NON_MANIFOLD_VERTEX_ERR);

                        let start = self[end].next;
                        self[incoming].next = start;
                        self[end].next = outgoing;

                        // `v.outgoing` was a boundary halfedge before and
                        // still is one.
                    } else {
                        // `v` was isolated.
                        self[incoming].next = outgoing;
                        self[vh].outgoing = Opt::some(outgoing);
                    }
                }

                // The incoming edge borders an existing face, the outgoing
                // one is new: the halfedge that used to point at
                // `incoming.twin()` must now point at `outgoing`.
                (true, false) => {
                    let before_new = self.prev(incoming.twin());
                    self[before_new].next = outgoing;

                    // `incoming.twin()` may have been `v.outgoing`, but it is
                    // an inner halfedge of the new face now; `outgoing` is
                    // certainly a boundary halfedge.
                    self[vh].outgoing = Opt::some(outgoing);
                }

                // The outgoing edge borders an existing face, the incoming
                // one is new.
                (false, true) => {
                    self[incoming].next = self[outgoing.twin()].next;
                    // `v.outgoing` keeps pointing at a boundary halfedge.
                }

                // Both edges already border faces: the new face connects two
                // fan blades. If the blade of `incoming` does not directly
                // follow the blade of `outgoing` in the rotation around `v`,
                // the blades have to be reordered first.
                (true, true) => {
                    let ib_end_opt = self
                        .find_incoming_he(incoming, |incoming| self[incoming].face.is_none());

                    if self[outgoing.twin()].next != incoming.twin() {
                        // Conceptually remove the blade starting at
                        // `incoming.twin()` from the cycle around `v` and
                        // reinsert it right after the blade ending at
                        // `outgoing.twin()`.
                        let ib_end =
                            ib_end_opt.expect("internal half-edge error: cannot find blade end");
                        let bib_end = self.prev(incoming.twin());

                        self[bib_end].next = self[ib_end].next;

                        let aob_start = self[outgoing.twin()].next;
                        self[ib_end].next = aob_start;

                        // The cycle is briefly broken here; setting the inner
                        // `next` handles below repairs it.
                        self[vh].outgoing = Opt::some(aob_start);
                    } else {
                        // Blade order is fine; only `v.outgoing` may need a
                        // new boundary halfedge. If no boundary blade is left
                        // the vertex stops being a boundary vertex and any
                        // handle works.
                        if let Some(ib_end) = ib_end_opt {
                            let new_outgoing = self[ib_end].next;
                            self[vh].outgoing = Opt::some(new_outgoing);
                        }
                    }
                }
            }
        }

        // Inner halfedges chain among themselves.
        for he_i in 0..3 {
            let curr = inner_half_edges[he_i];
            let next = inner_half_edges[(he_i + 1) % 3];
            self[curr].next = next;
        }

        *new_face
    }
}


// ===============================================================================================
// ===== Mesh mutation: face removal
// ===============================================================================================

impl WhiteBoxMesh {
    /// Removes the given faces from the mesh.
    ///
    /// Inner halfedges of a removed face become boundary halfedges. An edge
    /// whose two halfedges both end up without a face is dissolved entirely;
    /// a vertex that loses its last edge stays in the mesh as an isolated
    /// vertex. No handle is ever reused.
    pub fn remove_faces(&mut self, fhs: &[FaceHandle]) {
        debug!("remove_faces {:?}", fhs);
        for &fh in fhs {
            self.remove_face(fh);
        }
    }

    fn remove_face(&mut self, fh: FaceHandle) {
        let f = self.check_face(fh);

        let he0 = self[f].edge;
        let he1 = self[he0].next;
        let he2 = self[he1].next;
        let inner = [he0, he1, he2];

        for &he in &inner {
            self[he].face = Opt::none();
        }
        self.faces.remove(fh);

        // Edges whose other side is also faceless now have to go entirely.
        // The twin of an inner halfedge is never another inner halfedge of
        // the same triangle, so this can be decided up front.
        let lonely: SmallVec<[Checked<HalfedgeHandle>; 3]> = inner
            .iter()
            .copied()
            .filter(|&he| self[he.twin()].face.is_none())
            .collect();

        for &he in &lonely {
            self.dissolve_edge(he);
        }

        // The surviving inner halfedges are boundary halfedges now; make them
        // the `outgoing` handle of their origin vertex to keep the
        // boundary-outgoing invariant.
        for &he in &inner {
            if !lonely.contains(&he) {
                let origin = self[he.twin()].target;
                self[origin].outgoing = Opt::some(he);
            }
        }
    }

    /// Removes a halfedge pair (and its edge record) from the mesh. Both
    /// halfedges must be faceless. Splices the surrounding boundary cycles
    /// back together and updates `outgoing` handles of the two endpoint
    /// vertices, marking them isolated if this was their last edge.
    fn dissolve_edge(&mut self, h: Checked<HalfedgeHandle>) {
        let o = h.twin();
        debug_assert!(self[h].face.is_none() && self[o].face.is_none());

        let h_next = self[h].next;
        let o_next = self[o].next;

        // `h` runs a -> b, `o` runs b -> a.
        let b = self[h].target;
        let a = self[o].target;

        if h_next == o && o_next == h {
            // The pair is completely isolated.
            self[a].outgoing = Opt::none();
            self[b].outgoing = Opt::none();
        } else if h_next == o {
            // `b` has no other edge.
            let h_prev = self.prev(h);
            self[h_prev].next = o_next;
            self[b].outgoing = Opt::none();
            if self[a].outgoing == Opt::some(h) {
                self[a].outgoing = Opt::some(o_next);
            }
        } else if o_next == h {
            // `a` has no other edge.
            let o_prev = self.prev(o);
            self[o_prev].next = h_next;
            self[a].outgoing = Opt::none();
            if self[b].outgoing == Opt::some(o) {
                self[b].outgoing = Opt::some(h_next);
            }
        } else {
            let h_prev = self.prev(h);
            let o_prev = self.prev(o);
            self[h_prev].next = o_next;
            self[o_prev].next = h_next;
            if self[a].outgoing == Opt::some(h) {
                self[a].outgoing = Opt::some(o_next);
            }
            if self[b].outgoing == Opt::some(o) {
                self[b].outgoing = Opt::some(h_next);
            }
        }

        let eh = h.full_edge();
        self.half_edges.remove(*h);
        self.half_edges.remove(*o);
        self.edges.remove(eh);
    }
}
