//! Mathematical utilities: rays and voxel grid traversal

pub mod ray;

pub use ray::{Ray, walk_segment};
