//! Spatial world index: model footprints and ray queries

pub mod geometry;
pub mod sparse_hash;

pub use geometry::Footprint;
pub use sparse_hash::{IndexHit, SparseHashGrid};
