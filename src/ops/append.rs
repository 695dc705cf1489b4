//! Append operations: polygon extrusion, impression, and edge extrusion.
//!
//! An append duplicates a polygon's border loop(s) at an offset position and
//! stitches old and new geometry together with side walls. Pulling outward
//! (`append_all`) always duplicates every vertex; pushing inward (an
//! impression) reuses and moves existing vertices wherever all adjacent
//! out-of-polygon faces are orthogonal to the appended polygon, rebuilding
//! those orthogonal neighbors against the moved vertices and stitching the
//! remaining gaps with single-triangle linking faces.

use cgmath::{prelude::*, Point3, Vector3};
use log::debug;

use crate::{
    core::{EdgeHalfedge, WhiteBoxMesh},
    handle::{EdgeHandle, FaceHandle, HalfedgeHandle, VertexHandle},
    math::{self, ADJACENT_POLYGON_NORMAL_TOLERANCE},
    polygon::PolygonHandle,
};
use super::FaceVertHandles;


/// Maps an existing border vertex to the vertex used for the appended
/// geometry. During an impression both handles may refer to the same vertex:
/// the existing one is reused (and moved) instead of duplicated.
#[derive(Debug, Clone, Copy)]
struct VertexHandlePair {
    existing: VertexHandle,
    added: VertexHandle,
}

impl VertexHandlePair {
    fn changed(&self) -> bool {
        self.existing != self.added
    }
}

/// The vertex mapping produced while appending.
#[derive(Debug, Default)]
struct AppendedVerts {
    vertex_handle_pairs: Vec<VertexHandlePair>,
}

impl AppendedVerts {
    fn pair_for(&self, existing: VertexHandle) -> Option<VertexHandlePair> {
        self.vertex_handle_pairs
            .iter()
            .copied()
            .find(|pair| pair.existing == existing)
    }
}

/// A polygon that had to be rebuilt as a side effect of an append, reported
/// as its face set before and after the operation.
#[derive(Debug, Clone, Default)]
pub struct RestoredPolygonHandlePair {
    pub before: PolygonHandle,
    pub after: PolygonHandle,
}

/// Full result of an advanced append.
#[derive(Debug, Clone, Default)]
pub struct AppendedPolygonHandles {
    /// The new cap polygon (or the unchanged input polygon when the append
    /// was a no-op).
    pub appended_polygon_handle: PolygonHandle,

    /// Every other polygon whose face set changed, with its before/after
    /// handles. Appending can silently regroup unrelated polygons, so
    /// callers tracking polygon identity need these.
    pub restored_polygon_handles: Vec<RestoredPolygonHandlePair>,
}


// ===============================================================================================
// ===== Public append operations
// ===============================================================================================

impl WhiteBoxMesh {
    /// Extrudes (positive distance) or impresses (negative distance) a
    /// polygon along its normal.
    ///
    /// A polygon whose borders have all been hidden cannot be appended; the
    /// call is then a no-op returning the input polygon handle.
    pub fn translate_polygon_append(&mut self, polygon: &PolygonHandle, distance: f32) -> PolygonHandle {
        debug!("translate_polygon_append {:?} {}", polygon.face_handles, distance);

        self.translate_polygon_append_advanced(polygon, distance)
            .appended_polygon_handle
    }

    /// Like [`Self::translate_polygon_append`], additionally reporting
    /// before/after handles of every other polygon the append regrouped.
    pub fn translate_polygon_append_advanced(
        &mut self,
        polygon: &PolygonHandle,
        distance: f32,
    ) -> AppendedPolygonHandles {
        debug!(
            "translate_polygon_append_advanced {:?} {}",
            polygon.face_handles, distance
        );

        if self.num_faces() == 0 {
            return AppendedPolygonHandles::default();
        }

        let direction = self.polygon_normal(polygon);
        self.extrude(polygon, &|position| position + direction * distance)
    }

    /// Appends a scaled copy of the polygon: negative `scale` insets toward
    /// the polygon midpoint (an impression ring), positive expands outward.
    pub fn scale_polygon_append_relative(
        &mut self,
        polygon: &PolygonHandle,
        scale: f32,
    ) -> PolygonHandle {
        debug!("scale_polygon_append_relative {:?} {}", polygon.face_handles, scale);

        if self.num_faces() == 0 {
            return PolygonHandle::default();
        }

        let space = self.polygon_space(polygon, self.polygon_midpoint(polygon));
        self.extrude(polygon, &|position| math::scale_position(1.0 + scale, position, &space))
            .appended_polygon_handle
    }

    /// Extrudes a single user edge by `displacement`, replacing the polygon
    /// the edge is moving toward with near/far/top/bottom polygons around
    /// the displaced edge.
    ///
    /// Only simple polygons (one or two faces) may be replaced this way;
    /// anything larger makes the call a no-op that returns `eh` unchanged,
    /// guarding against corrupting bigger polygon groupings.
    pub fn translate_edge_append(&mut self, eh: EdgeHandle, displacement: Vector3<f32>) -> EdgeHandle {
        debug!("translate_edge_append {:?} {:?}", eh, displacement);

        let halfedge = match self.find_best_fit_halfedge(eh, displacement) {
            Some(heh) => heh,
            None => return eh,
        };
        let face = match self.halfedge_face_handle(halfedge) {
            Some(fh) => fh,
            None => return eh,
        };

        let polygon = self.face_polygon_handle(face);
        if polygon.face_handles.len() > 2 {
            return eh;
        }

        let to_vertex = self.halfedge_vertex_handle_at_tip(halfedge);
        let from_vertex = self.halfedge_vertex_handle_at_tail(halfedge);

        // the border loop containing the edge, to find the neighbors of its
        // endpoints
        let border_vertices: Vec<VertexHandle> = self
            .polygon_border_vertex_handles(&polygon)
            .into_iter()
            .filter(|border| border.contains(&to_vertex))
            .flatten()
            .collect();
        if border_vertices.is_empty() {
            return eh;
        }

        let to_index = border_vertices
            .iter()
            .position(|&vh| vh == to_vertex)
            .expect("border loop lost its own vertex");
        let from_index = border_vertices
            .iter()
            .position(|&vh| vh == from_vertex)
            .expect("border loop lost its own vertex");

        let len = border_vertices.len();
        let after_to_vertex = border_vertices[(to_index + 1) % len];
        let before_from_vertex = border_vertices[(from_index + len - 1) % len];

        let added_to_vertex = {
            let position = self.vertex_position(to_vertex);
            self.add_vertex(position + displacement)
        };
        let added_from_vertex = {
            let position = self.vertex_position(from_vertex);
            self.add_vertex(position + displacement)
        };

        let existing_faces = polygon.face_handles.clone();
        let multi_face = existing_faces.len() > 1;
        self.remove_faces(&existing_faces);

        let near_polygon = self.add_polygon(&[
            FaceVertHandles::new(from_vertex, to_vertex, added_to_vertex),
            FaceVertHandles::new(from_vertex, added_to_vertex, added_from_vertex),
        ]);

        // extruding an edge of a triangle polygon leaves only one face on
        // the far side
        let far_polygon = if multi_face {
            self.add_polygon(&[
                FaceVertHandles::new(added_from_vertex, added_to_vertex, after_to_vertex),
                FaceVertHandles::new(added_from_vertex, after_to_vertex, before_from_vertex),
            ])
        } else {
            self.add_polygon(&[FaceVertHandles::new(
                added_from_vertex,
                added_to_vertex,
                after_to_vertex,
            )])
        };

        self.add_polygon(&[FaceVertHandles::new(
            from_vertex,
            added_from_vertex,
            before_from_vertex,
        )]);
        self.add_polygon(&[FaceVertHandles::new(
            to_vertex,
            after_to_vertex,
            added_to_vertex,
        )]);

        self.calculate_normals();
        self.calculate_planar_uvs();

        self.find_selected_edge_handle(&near_polygon, &far_polygon)
            .unwrap_or(eh)
    }
}


// ===============================================================================================
// ===== The extrusion pipeline
// ===============================================================================================

impl WhiteBoxMesh {
    fn extrude(
        &mut self,
        polygon: &PolygonHandle,
        append_fn: &dyn Fn(Point3<f32>) -> Point3<f32>,
    ) -> AppendedPolygonHandles {
        let border_vertex_collection = self.polygon_border_vertex_handles(polygon);

        // pathological case: all border edges hidden, nothing to append to
        if border_vertex_collection.is_empty() {
            return AppendedPolygonHandles {
                appended_polygon_handle: polygon.clone(),
                restored_polygon_handles: Vec::new(),
            };
        }

        let polygon_vertex_handles = self.polygon_vertex_handles(polygon);
        let border_edge_collection = self.polygon_border_edge_handles(polygon);

        let (appended_verts, append_all) =
            self.add_verts_for_append(&polygon_vertex_handles, polygon, append_fn);

        let top_faces_to_add =
            self.build_new_vertex_face_handles(&appended_verts, &polygon.face_handles);

        let mut polygons_to_remove: Vec<PolygonHandle> = Vec::new();
        let mut verts_for_new_adjacent: Vec<Vec<FaceVertHandles>> = Vec::new();
        let mut verts_for_existing_adjacent: Vec<Vec<FaceVertHandles>> = Vec::new();
        let mut verts_for_linking_adjacent: Vec<Vec<FaceVertHandles>> = Vec::new();

        for (border_vertices, border_edges) in
            border_vertex_collection.iter().zip(&border_edge_collection)
        {
            self.add_adjacent_faces(
                &appended_verts,
                append_all,
                polygon,
                border_vertices,
                border_edges,
                &mut polygons_to_remove,
                &mut verts_for_new_adjacent,
                &mut verts_for_existing_adjacent,
                &mut verts_for_linking_adjacent,
            );
        }

        // all removals happen in one batch, before anything is re-added
        let mut all_faces_to_remove = polygon.face_handles.clone();
        for to_remove in &polygons_to_remove {
            all_faces_to_remove.extend(to_remove.face_handles.iter().copied());
        }
        self.remove_faces(&all_faces_to_remove);

        let restored_after: Vec<PolygonHandle> = verts_for_existing_adjacent
            .iter()
            .map(|verts| self.add_polygon(verts))
            .collect();
        debug_assert_eq!(restored_after.len(), polygons_to_remove.len());

        let restored_polygon_handles = polygons_to_remove
            .into_iter()
            .zip(restored_after)
            .map(|(before, after)| RestoredPolygonHandlePair { before, after })
            .collect();

        for verts in &verts_for_linking_adjacent {
            self.add_polygon(verts);
        }

        let appended_polygon_handle = self.add_polygon(&top_faces_to_add);

        for verts in &verts_for_new_adjacent {
            self.add_polygon(verts);
        }

        self.calculate_normals();

        AppendedPolygonHandles {
            appended_polygon_handle,
            restored_polygon_handles,
        }
    }

    /// Decides, per polygon vertex, whether the appended geometry gets a
    /// duplicated vertex at the mapped position or reuses the moved original.
    fn add_verts_for_append(
        &mut self,
        existing_vertex_handles: &[VertexHandle],
        polygon: &PolygonHandle,
        append_fn: &dyn Fn(Point3<f32>) -> Point3<f32>,
    ) -> (AppendedVerts, bool) {
        let polygon_normal = self.polygon_normal(polygon);
        let polygon_halfedges = self.polygon_halfedge_handles(polygon);

        // pulling away from the surface must always duplicate; only a push
        // into the surface can reuse verts
        let extrude_direction = append_fn(Point3::origin()) - Point3::origin();
        let append_all = extrude_direction.dot(polygon_normal) >= 0.0;

        let mut appended_verts = AppendedVerts::default();
        appended_verts
            .vertex_handle_pairs
            .reserve(existing_vertex_handles.len());

        for &existing in existing_vertex_handles {
            let mut vertex_handle_added = false;

            for halfedge in self.vertex_halfedge_handles(existing) {
                let eh = self.halfedge_edge_handle(halfedge);
                let boundary_edge = self.edge_is_boundary(eh);

                // only halfedges leading out of the polygon matter here
                if boundary_edge || !polygon_halfedges.contains(&halfedge) {
                    let next_halfedge = self.halfedge_handle_next(halfedge);
                    let next_eh = self.halfedge_edge_handle(next_halfedge);

                    let edge_axis = self.edge_axis(eh);
                    let next_edge_axis = self.edge_axis(next_eh);

                    let face_normal = math::normalize_safe(edge_axis.cross(next_edge_axis));
                    let orthogonal = math::is_close(
                        face_normal.dot(polygon_normal).abs(),
                        0.0,
                        ADJACENT_POLYGON_NORMAL_TOLERANCE,
                    );

                    if append_all || boundary_edge || !orthogonal {
                        vertex_handle_added = true;

                        let position = self.vertex_position(existing);
                        let added = self.add_vertex(append_fn(position));
                        appended_verts
                            .vertex_handle_pairs
                            .push(VertexHandlePair { existing, added });

                        break;
                    }
                }
            }

            if !vertex_handle_added {
                // every neighbor is orthogonal: move the vertex in place
                let position = self.vertex_position(existing);
                self.set_vertex_position(existing, append_fn(position));
                appended_verts.vertex_handle_pairs.push(VertexHandlePair {
                    existing,
                    added: existing,
                });
            }
        }

        (appended_verts, append_all)
    }

    /// Maps the vertex triples of `existing_faces` through the append pair
    /// table.
    fn build_new_vertex_face_handles(
        &self,
        appended_verts: &AppendedVerts,
        existing_faces: &[FaceHandle],
    ) -> Vec<FaceVertHandles> {
        existing_faces
            .iter()
            .map(|&fh| {
                let vertex_handles = self.face_vertex_handles(fh);
                let mapped: Vec<VertexHandle> = vertex_handles
                    .iter()
                    .map(|&vh| {
                        appended_verts
                            .pair_for(vh)
                            .map(|pair| pair.added)
                            .unwrap_or(vh)
                    })
                    .collect();

                FaceVertHandles::new(mapped[0], mapped[1], mapped[2])
            })
            .collect()
    }

    /// Builds the walls of the append along one border loop: one quad per
    /// border edge, unless the impression machinery can reuse the existing
    /// geometry across that edge.
    fn add_adjacent_faces(
        &mut self,
        appended_verts: &AppendedVerts,
        append_all: bool,
        selected_polygon: &PolygonHandle,
        border_vertex_handles: &[VertexHandle],
        border_edge_handles: &[EdgeHandle],
        polygons_to_remove: &mut Vec<PolygonHandle>,
        verts_for_new_adjacent: &mut Vec<Vec<FaceVertHandles>>,
        verts_for_existing_adjacent: &mut Vec<Vec<FaceVertHandles>>,
        verts_for_linking_adjacent: &mut Vec<Vec<FaceVertHandles>>,
    ) {
        for index in 0..border_vertex_handles.len() {
            let next_index = (index + 1) % border_vertex_handles.len();

            let existing_vertex = border_vertex_handles[index];
            let next_existing_vertex = border_vertex_handles[next_index];

            let current_pair = appended_verts
                .pair_for(existing_vertex)
                .expect("border vertex missing from append table");
            let next_pair = appended_verts
                .pair_for(next_existing_vertex)
                .expect("border vertex missing from append table");

            let border_edge = border_edge_handles
                .iter()
                .copied()
                .find(|&eh| {
                    let [a, b] = self.edge_vertex_handles(eh);
                    (a == existing_vertex && b == next_existing_vertex)
                        || (a == next_existing_vertex && b == existing_vertex)
                })
                .expect("no border edge between consecutive border vertices");

            // short circuit when appending everything: no linking faces are
            // ever required
            let create_new_adjacent_polygon = append_all
                || !self.try_add_linking_faces(
                    border_edge,
                    appended_verts,
                    selected_polygon,
                    current_pair,
                    next_pair,
                    polygons_to_remove,
                    verts_for_existing_adjacent,
                    verts_for_linking_adjacent,
                );

            if create_new_adjacent_polygon {
                verts_for_new_adjacent.push(vec![
                    FaceVertHandles::new(existing_vertex, next_existing_vertex, next_pair.added),
                    FaceVertHandles::new(existing_vertex, next_pair.added, current_pair.added),
                ]);
            }
        }
    }

    /// Returns `true` when existing verts were reused across `border_edge`
    /// and (if any endpoint moved) the orthogonal adjacent polygon was
    /// scheduled for rebuild with linking faces. Returns `false` when a new
    /// full side wall must be created instead.
    fn try_add_linking_faces(
        &self,
        border_edge: EdgeHandle,
        appended_verts: &AppendedVerts,
        selected_polygon: &PolygonHandle,
        current_pair: VertexHandlePair,
        next_pair: VertexHandlePair,
        polygons_to_remove: &mut Vec<PolygonHandle>,
        verts_for_existing_adjacent: &mut Vec<Vec<FaceVertHandles>>,
        verts_for_linking_adjacent: &mut Vec<Vec<FaceVertHandles>>,
    ) -> bool {
        for face in self.edge_face_handles(border_edge) {
            // only faces outside the polygon being appended are of interest
            if selected_polygon.contains(face) {
                continue;
            }

            let adjacent_polygon = self.face_polygon_handle(face);
            let selected_polygon_normal = self.polygon_normal(selected_polygon);
            let adjacent_polygon_normal = self.polygon_normal(&adjacent_polygon);

            let angle_cosine = adjacent_polygon_normal.dot(selected_polygon_normal);
            if !math::is_close(angle_cosine, 0.0, ADJACENT_POLYGON_NORMAL_TOLERANCE) {
                continue;
            }

            if current_pair.changed() || next_pair.changed() {
                // the adjacent polygon must be rebuilt against the moved
                // verts (unless an earlier border edge already scheduled it)
                if !polygons_to_remove.contains(&adjacent_polygon) {
                    let rebuilt = self.build_new_vertex_face_handles(
                        appended_verts,
                        &adjacent_polygon.face_handles,
                    );
                    polygons_to_remove.push(adjacent_polygon.clone());
                    verts_for_existing_adjacent.push(rebuilt);
                }
            }

            if current_pair.changed() {
                self.add_linking_face(
                    current_pair,
                    selected_polygon,
                    &adjacent_polygon,
                    verts_for_linking_adjacent,
                );
            }

            if next_pair.changed() {
                self.add_linking_face(
                    next_pair,
                    selected_polygon,
                    &adjacent_polygon,
                    verts_for_linking_adjacent,
                );
            }

            return true;
        }

        false
    }

    /// Adds the single triangle stitching a moved border vertex to the
    /// stationary neighbor it separated from.
    fn add_linking_face(
        &self,
        vertex_handle_pair: VertexHandlePair,
        selected_polygon: &PolygonHandle,
        adjacent_polygon: &PolygonHandle,
        verts_for_linking_adjacent: &mut Vec<Vec<FaceVertHandles>>,
    ) {
        let found = self.find_halfedge_in_adjacent_polygon(
            vertex_handle_pair,
            selected_polygon,
            adjacent_polygon,
        );

        if let Some(halfedge) = found {
            let to_vertex = self.halfedge_vertex_handle_at_tip(halfedge);

            // winding depends on which side of the adjacent polygon the
            // outgoing halfedge lies on
            let in_adjacent = self
                .halfedge_face_handle(halfedge)
                .map_or(false, |fh| adjacent_polygon.contains(fh));

            let linking_face = if in_adjacent {
                FaceVertHandles::new(vertex_handle_pair.existing, to_vertex, vertex_handle_pair.added)
            } else {
                FaceVertHandles::new(vertex_handle_pair.existing, vertex_handle_pair.added, to_vertex)
            };

            verts_for_linking_adjacent.push(vec![linking_face]);
        }
    }

    /// Finds an outgoing halfedge of the moved vertex lying on a border edge
    /// of the adjacent polygon that is not shared with the selected polygon.
    fn find_halfedge_in_adjacent_polygon(
        &self,
        vertex_handle_pair: VertexHandlePair,
        selected_polygon: &PolygonHandle,
        adjacent_polygon: &PolygonHandle,
    ) -> Option<HalfedgeHandle> {
        let selected_edges = self.polygon_border_edge_handles_flattened(selected_polygon);
        let adjacent_edges = self.polygon_border_edge_handles_flattened(adjacent_polygon);

        for eh in adjacent_edges {
            if selected_edges.contains(&eh) {
                continue;
            }

            for halfedge in self.vertex_outgoing_halfedge_handles(vertex_handle_pair.existing) {
                if self.halfedge_edge_handle(halfedge) == eh {
                    return Some(halfedge);
                }
            }
        }

        None
    }
}


// ===============================================================================================
// ===== Edge append helpers
// ===============================================================================================

impl WhiteBoxMesh {
    /// Picks the halfedge of `eh` whose face the displacement moves the edge
    /// toward: the polygon on that side is the one replaced by the edge
    /// extrusion. The heuristic compares how the distance to each adjacent
    /// face midpoint changes under the displacement.
    fn find_best_fit_halfedge(
        &self,
        eh: EdgeHandle,
        displacement: Vector3<f32>,
    ) -> Option<HalfedgeHandle> {
        if !self.contains_edge(eh) {
            return None;
        }

        let first = self.edge_halfedge_handle(eh, EdgeHalfedge::First);
        let second = self.edge_halfedge_handle(eh, EdgeHalfedge::Second);

        let (first_face, second_face) = match (
            self.halfedge_face_handle(first),
            self.halfedge_face_handle(second),
        ) {
            (Some(a), Some(b)) => (a, b),
            (Some(_), None) => return Some(first),
            (None, Some(_)) => return Some(second),
            (None, None) => return None,
        };

        let first_face_midpoint = self.vertices_midpoint(&self.face_vertex_handles(first_face));
        let second_face_midpoint = self.vertices_midpoint(&self.face_vertex_handles(second_face));

        let edge_midpoint = self.edge_midpoint(eh);
        let next_edge_position = edge_midpoint + displacement;

        let distance_from_first = (first_face_midpoint - edge_midpoint).magnitude();
        let distance_from_second = (second_face_midpoint - edge_midpoint).magnitude();

        let next_distance_from_first = (next_edge_position - first_face_midpoint).magnitude();
        let next_distance_from_second = (next_edge_position - second_face_midpoint).magnitude();

        // which face did the displacement move the edge toward?
        let delta_first = next_distance_from_first - distance_from_first;
        let delta_second = next_distance_from_second - distance_from_second;

        if delta_first < delta_second {
            Some(first)
        } else {
            Some(second)
        }
    }

    /// The edge shared by the near and far polygons of an edge append: the
    /// displaced edge the user keeps dragging.
    fn find_selected_edge_handle(
        &self,
        near_polygon: &PolygonHandle,
        far_polygon: &PolygonHandle,
    ) -> Option<EdgeHandle> {
        let mut all_edges = self.polygon_border_edge_handles_flattened(near_polygon);
        all_edges.extend(self.polygon_border_edge_handles_flattened(far_polygon));
        all_edges.sort_unstable();

        all_edges.windows(2).find(|pair| pair[0] == pair[1]).map(|pair| pair[0])
    }
}
