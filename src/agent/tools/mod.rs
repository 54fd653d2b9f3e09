//! Agent tool registry and definitions.

mod registry;

pub use registry::*;
