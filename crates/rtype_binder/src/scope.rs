//! Scope management for the binder.

use indexmap::IndexMap;
use rtype_checker::Binding;
use rustc_hash::FxBuildHasher;

/// A block scope. Scopes form a chain from inner to outer.
#[derive(Debug, Default)]
pub struct Scope {
    /// Bindings declared directly in this scope, in declaration order.
    bindings: IndexMap<String, Binding, FxBuildHasher>,
    /// The parent scope (None for the global scope).
    pub parent: Option<Box<Scope>>,
}

impl Scope {
    pub fn new(parent: Option<Box<Scope>>) -> Self {
        Self {
            bindings: IndexMap::default(),
            parent,
        }
    }

    /// Whether `name` is declared in this scope, ignoring parents.
    pub fn declares(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    pub fn declare(&mut self, binding: Binding) {
        self.bindings.insert(binding.name.clone(), binding);
    }

    /// Resolve `name` through the scope chain.
    pub fn lookup(&self, name: &str) -> Option<&Binding> {
        let mut scope = Some(self);
        while let Some(s) = scope {
            if let Some(binding) = s.bindings.get(name) {
                return Some(binding);
            }
            scope = s.parent.as_deref();
        }
        None
    }

    pub fn lookup_mut(&mut self, name: &str) -> Option<&mut Binding> {
        let mut scope = self;
        loop {
            if scope.bindings.contains_key(name) {
                return scope.bindings.get_mut(name);
            }
            scope = scope.parent.as_deref_mut()?;
        }
    }

    pub fn bindings(&self) -> impl Iterator<Item = &Binding> {
        self.bindings.values()
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}
