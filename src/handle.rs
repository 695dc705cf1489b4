//! Strongly typed handles for the mesh elements.
//!
//! All mesh elements are referred to by opaque index handles instead of
//! pointers or references. This makes deep-cloning and serializing a mesh
//! trivial and sidesteps all aliasing questions: a handle is just a number.
//! Handles of one mesh must never be used with another mesh.

use std::fmt;

use static_assertions::const_assert;


/// The integer type used as the underlying index of all handle types.
///
/// By default this is `u32`, which is sufficient for meshes with up to 2³² -
/// 1 elements per kind and keeps the connectivity records compact. Enable the
/// `large-handle` feature if you really need more elements.
#[allow(non_camel_case_types)]
#[cfg(not(feature = "large-handle"))]
pub type hsize = u32;

#[allow(non_camel_case_types)]
#[cfg(feature = "large-handle")]
pub type hsize = u64;

// Two halfedge indices must always fit into `hsize` (they are allocated in
// pairs), so the index type must leave one bit of headroom on this platform.
const_assert!(std::mem::size_of::<hsize>() <= std::mem::size_of::<usize>());


/// Types that can be used to refer to a mesh element.
pub trait Handle: Copy + Eq + Ord + std::hash::Hash + fmt::Debug {
    /// Creates a handle from the given index.
    fn new(idx: hsize) -> Self;

    /// Returns the index of this handle.
    fn idx(&self) -> hsize;

    /// Creates a handle from the given `usize`. Panics if the value does not
    /// fit into `hsize`.
    #[inline(always)]
    fn from_usize(raw: usize) -> Self {
        assert!(raw <= hsize::max_value() as usize, "handle index out of range");
        Self::new(raw as hsize)
    }

    /// Returns the index of this handle as `usize`.
    #[inline(always)]
    fn to_usize(&self) -> usize {
        self.idx() as usize
    }
}

macro_rules! make_handle_type {
    ($(#[$attr:meta])* $name:ident = $short:expr;) => {
        $(#[$attr])*
        #[derive(Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
        pub struct $name(hsize);

        impl Handle for $name {
            #[inline(always)]
            fn new(idx: hsize) -> Self {
                $name(idx)
            }

            #[inline(always)]
            fn idx(&self) -> hsize {
                self.0
            }
        }

        impl fmt::Debug for $name {
            fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
                write!(f, "{}{}", $short, self.0)
            }
        }
    }
}

make_handle_type!(
    /// A handle referring to a vertex.
    VertexHandle = "V";
);
make_handle_type!(
    /// A handle referring to a face (always a triangle).
    FaceHandle = "F";
);
make_handle_type!(
    /// A handle referring to an edge (one pair of opposite halfedges).
    EdgeHandle = "E";
);
make_handle_type!(
    /// A handle referring to one directed halfedge.
    ///
    /// The two halfedges of one edge are stored next to each other: the
    /// halfedges of edge `k` always have the indices `2k` and `2k + 1`. The
    /// even-indexed halfedge is the deterministic "first" halfedge of the
    /// edge.
    HalfedgeHandle = "HE";
);

impl HalfedgeHandle {
    /// Returns the first (even-indexed) halfedge of `edge`.
    ///
    /// This is pure index arithmetic; whether the halfedge actually exists is
    /// not checked here.
    #[inline(always)]
    pub(crate) fn lower_half_of(edge: EdgeHandle) -> Self {
        Self(edge.idx() * 2)
    }

    /// Returns the edge this halfedge belongs to (integer division by two,
    /// thanks to the pairwise storage scheme).
    #[inline(always)]
    pub(crate) fn full_edge(self) -> EdgeHandle {
        EdgeHandle::new(self.0 / 2)
    }

    /// Returns whether this is the even-indexed ("first") halfedge of its
    /// edge.
    #[inline(always)]
    pub(crate) fn is_lower_half(self) -> bool {
        self.0 % 2 == 0
    }
}
