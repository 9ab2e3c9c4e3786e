//! Core infrastructure: types, errors, logging, arena allocation

pub mod arena;
pub mod error;
pub mod logging;
pub mod types;

pub use arena::{Arena, Handle};
pub use error::Error;
