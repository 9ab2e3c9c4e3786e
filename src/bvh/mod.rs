//! Bounding volume hierarchy accelerator

pub mod accel;
pub mod build;
mod flatten;
pub mod primitive;

pub use accel::Bvh;
pub use build::SplitMethod;
pub use primitive::{BoxPrimitive, Hit, Primitive};
