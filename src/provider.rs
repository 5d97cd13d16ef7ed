//! Provider descriptors, configuration sources, and the family-to-handler registry.

pub mod descriptor;
pub mod registry;

pub use descriptor::*;
pub use registry::*;
