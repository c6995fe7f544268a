//! Capability model: the privilege tiers used to rank evidence, and the
//! sources that discover which capabilities a permission check tests.

pub mod hierarchy;
pub mod source;

pub use hierarchy::{AccessLevel, CapabilityHierarchy, Tier};
pub use source::{CapabilitySource, NoopSource, SourceFileScanner};
