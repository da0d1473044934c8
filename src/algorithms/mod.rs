//! Keyword distance algorithms (edge extraction, membership bitmap, relaxation)
//!
//! Backend-agnostic building blocks shared by the CPU and GPU backends.

pub mod bitmap;
pub mod edge_list;
pub mod relaxation;
pub mod snapshot;

pub use bitmap::KeywordBitmap;
pub use edge_list::{EdgeList, OutgoingEdges, WeightedEdge};
pub use relaxation::{
    fits_sentinel, relax_keyword, relax_pass, KeywordRow, NO_PREDECESSOR, UNREACHABLE,
};
pub use snapshot::GraphSnapshot;
