//! rtype_checker: The structural type checker.
//!
//! Checks literal values against string, number, string-literal, array,
//! tuple, record, union and intersection types, infers types for
//! unannotated bindings, and enforces `const` bindings.

mod binding;
mod checker;
mod error;
mod types;
mod value;

pub use binding::{Binding, Mutability};
pub use checker::Checker;
pub use error::{AccessPath, CheckError, MismatchReason, PathSegment};
pub use types::{Property, Shape, TypeFlags, TypeId, TypeKind, TypeTable};
pub use value::Value;
