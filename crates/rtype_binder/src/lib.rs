//! rtype_binder: Scope analysis and statement checking.
//!
//! The binder walks a program's statements, declares bindings into a
//! chain of block scopes, resolves interface names to types and runs every
//! read and write through the checker. Errors are collected as
//! diagnostics; binding continues with the next statement.

mod binder;
mod error;
mod scope;
pub mod syntax;

pub use binder::Binder;
pub use error::BindError;
pub use scope::Scope;
pub use syntax::{parse_source_file, SourceFile, Statement, TypeExpr};
