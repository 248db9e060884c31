//! Named bindings and their mutability.

use crate::types::TypeId;
use crate::value::Value;

/// Whether a binding may be written after declaration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Mutability {
    /// `let`: reassignable, initializers widen to their base type.
    Mutable,
    /// `const`: fixed at declaration, string initializers keep their literal type.
    Immutable,
}

impl Mutability {
    pub fn is_mutable(self) -> bool {
        self == Mutability::Mutable
    }

    pub fn keyword(self) -> &'static str {
        match self {
            Mutability::Mutable => "let",
            Mutability::Immutable => "const",
        }
    }
}

/// A declared name with its type and current value.
///
/// The declared type never changes after construction; assignments only
/// replace `value`.
#[derive(Debug, Clone, PartialEq)]
pub struct Binding {
    pub name: String,
    declared_type: TypeId,
    pub mutability: Mutability,
    value: Option<Value>,
    /// Set once an initializer or assignment has been written, even if the
    /// written value could not be stored.
    initialized: bool,
}

impl Binding {
    pub fn new(name: impl Into<String>, declared_type: TypeId, mutability: Mutability, value: Option<Value>) -> Self {
        Self {
            name: name.into(),
            declared_type,
            mutability,
            initialized: value.is_some(),
            value,
        }
    }

    /// Mark the binding as written at declaration without a stored value.
    pub fn initialized(mut self) -> Self {
        self.initialized = true;
        self
    }

    pub fn declared_type(&self) -> TypeId {
        self.declared_type
    }

    pub fn value(&self) -> Option<&Value> {
        self.value.as_ref()
    }

    pub fn value_mut(&mut self) -> Option<&mut Value> {
        self.value.as_mut()
    }

    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    /// Whether a write would be rejected regardless of the value written.
    pub fn is_frozen(&self) -> bool {
        !self.mutability.is_mutable() && self.initialized
    }

    /// Store a value that has already passed
    /// [`Checker::check_reassignment`](crate::Checker::check_reassignment).
    pub fn assign(&mut self, value: Value) {
        self.value = Some(value);
        self.initialized = true;
    }
}
