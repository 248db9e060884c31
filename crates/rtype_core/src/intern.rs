//! Property-name interning.
//!
//! Record field names are interned once so that record types can be
//! hashed, compared and looked up through a `u32` handle instead of a
//! string.

use lasso::{Spur, ThreadedRodeo};
use std::fmt;
use std::sync::Arc;

/// An interned property or binding name.
///
/// Comparing two `Name` values is an O(1) integer comparison. Resolving
/// the text requires the [`NameTable`] that produced it.
#[derive(Copy, Clone, Eq, PartialEq, Hash, Ord, PartialOrd)]
pub struct Name(Spur);

impl fmt::Debug for Name {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Name({:?})", self.0)
    }
}

/// Thread-safe name table.
///
/// Cloning is cheap: clones share the same underlying storage, so a name
/// interned through one clone resolves through every other.
#[derive(Clone)]
pub struct NameTable {
    rodeo: Arc<ThreadedRodeo>,
}

impl NameTable {
    pub fn new() -> Self {
        Self {
            rodeo: Arc::new(ThreadedRodeo::new()),
        }
    }

    /// Intern a name, returning the existing handle if already present.
    #[inline]
    pub fn intern(&self, s: &str) -> Name {
        Name(self.rodeo.get_or_intern(s))
    }

    /// Look up a name without interning it.
    ///
    /// A name that was never interned cannot be a field of any record type,
    /// which lets value checks treat it as an extra property directly.
    #[inline]
    pub fn get(&self, s: &str) -> Option<Name> {
        self.rodeo.get(s).map(Name)
    }

    #[inline]
    pub fn resolve(&self, name: Name) -> &str {
        self.rodeo.resolve(&name.0)
    }

    /// Pair a name with this table for `Display`.
    pub fn display(&self, name: Name) -> DisplayName<'_> {
        DisplayName { name, table: self }
    }

    pub fn len(&self) -> usize {
        self.rodeo.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rodeo.is_empty()
    }
}

impl Default for NameTable {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for NameTable {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("NameTable")
            .field("len", &self.len())
            .finish()
    }
}

pub struct DisplayName<'a> {
    name: Name,
    table: &'a NameTable,
}

impl fmt::Display for DisplayName<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.table.resolve(self.name))
    }
}
