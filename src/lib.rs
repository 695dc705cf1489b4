//! A half-edge mesh editing core for interactive box modeling.
//!
//! The central type is [`WhiteBoxMesh`]: a manifold triangle mesh with
//! stable, never-reused handles, a derived polygon grouping layer (faces
//! merged across hidden edges into logical N-gons), and the interactive
//! editing operations built on both — extrusion, impression, edge append,
//! hide/restore, split and flip. Serialization round-trips the exact mesh
//! state, and the render module flattens it into culled triangle lists.
//!
//! ```
//! use whitebox::{shape, WhiteBoxMesh};
//!
//! let mut mesh = WhiteBoxMesh::new();
//! let polygons = shape::unit_cube(&mut mesh);
//!
//! // pull the top side of the cube up by one unit
//! let top = mesh.translate_polygon_append(&polygons[0], 1.0);
//! assert_eq!(top.face_handles.len(), 2);
//! assert_eq!(mesh.num_vertices(), 12);
//! ```
//!
//! The mesh is exclusively owned and strictly single-threaded: all mutation
//! goes through `&mut WhiteBoxMesh`, every operation runs to completion, and
//! callers re-query polygon state after each mutating call.

pub mod core;
pub mod handle;
#[cfg(feature = "io")]
pub mod io;
mod map;
pub mod math;
pub mod ops;
pub mod polygon;
pub mod render;
pub mod shape;

pub use crate::{
    core::{EdgeHalfedge, WhiteBoxMesh},
    handle::{hsize, EdgeHandle, FaceHandle, Handle, HalfedgeHandle, VertexHandle},
    ops::{AppendedPolygonHandles, FaceVertHandles, RestoredPolygonHandlePair},
    polygon::{EdgeTypes, PolygonHandle},
};

/// Reexports of the types and traits needed by almost every user of this
/// library.
pub mod prelude {
    pub use crate::core::{EdgeHalfedge, WhiteBoxMesh};
    pub use crate::handle::{
        hsize, EdgeHandle, FaceHandle, Handle, HalfedgeHandle, VertexHandle,
    };
    pub use crate::ops::{AppendedPolygonHandles, FaceVertHandles, RestoredPolygonHandlePair};
    pub use crate::polygon::{EdgeTypes, PolygonHandle};
}
