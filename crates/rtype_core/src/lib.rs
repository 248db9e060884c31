//! rtype_core: Core utilities shared by the rtype crates.
//!
//! Provides property-name interning used by record types and the binder.

pub mod intern;

pub use intern::{DisplayName, Name, NameTable};
