//! Type system representation.
//!
//! Types are stored in a TypeTable (type arena) and referenced by TypeId.
//! The table hash-conses type kinds: constructing a type that is
//! structurally equal to an existing one returns the existing id, so
//! structural equality is `TypeId` equality.

use bitflags::bitflags;
use indexmap::{IndexMap, IndexSet};
use rtype_core::{Name, NameTable};
use rustc_hash::{FxBuildHasher, FxHasher};
use std::fmt;
use std::hash::{Hash, Hasher};

/// Handle to a type in the [`TypeTable`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub u32);

impl TypeId {
    #[inline]
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl fmt::Display for TypeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "TypeId({})", self.0)
    }
}

bitflags! {
    /// Type flags used by the checker.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TypeFlags: u32 {
        const NONE           = 0;
        const ANY            = 1 << 0;
        const NEVER          = 1 << 1;
        const STRING         = 1 << 2;
        const STRING_LITERAL = 1 << 3;
        const NUMBER         = 1 << 4;
        const ARRAY          = 1 << 5;
        const TUPLE          = 1 << 6;
        const RECORD         = 1 << 7;
        const UNION          = 1 << 8;
        const INTERSECTION   = 1 << 9;

        const STRING_LIKE = Self::STRING.bits() | Self::STRING_LITERAL.bits();
        const ARRAY_LIKE  = Self::ARRAY.bits() | Self::TUPLE.bits();
        const OBJECT      = Self::ARRAY_LIKE.bits() | Self::RECORD.bits();
        const PRIMITIVE   = Self::STRING_LIKE.bits() | Self::NUMBER.bits();
    }
}

/// A record property: its type and whether it may be absent.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Property {
    pub type_id: TypeId,
    pub optional: bool,
}

impl Property {
    pub fn required(type_id: TypeId) -> Self {
        Self { type_id, optional: false }
    }

    pub fn optional(type_id: TypeId) -> Self {
        Self { type_id, optional: true }
    }
}

/// The field set of a record type.
///
/// Fields keep declaration order for display. Equality and hashing ignore
/// order, so `{ a; b }` and `{ b; a }` intern to the same type.
#[derive(Debug, Clone, Default)]
pub struct Shape {
    pub fields: IndexMap<Name, Property, FxBuildHasher>,
    /// A closed shape rejects values carrying properties it does not declare.
    pub closed: bool,
}

impl Shape {
    pub fn new(fields: impl IntoIterator<Item = (Name, Property)>) -> Self {
        Self {
            fields: fields.into_iter().collect(),
            closed: false,
        }
    }

    pub fn closed(mut self) -> Self {
        self.closed = true;
        self
    }

    pub fn get(&self, name: Name) -> Option<&Property> {
        self.fields.get(&name)
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }
}

impl PartialEq for Shape {
    fn eq(&self, other: &Self) -> bool {
        self.closed == other.closed && self.fields == other.fields
    }
}

impl Eq for Shape {}

impl Hash for Shape {
    fn hash<H: Hasher>(&self, state: &mut H) {
        // Order-independent combination of per-field hashes.
        let mut combined: u64 = 0;
        for (name, prop) in &self.fields {
            let mut h = FxHasher::default();
            name.hash(&mut h);
            prop.hash(&mut h);
            combined = combined.wrapping_add(h.finish());
        }
        self.closed.hash(state);
        self.fields.len().hash(state);
        combined.hash(state);
    }
}

/// The specific data for each type kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum TypeKind {
    Any,
    Never,
    String,
    Number,
    StringLiteral(String),
    Array(TypeId),
    Tuple(Vec<TypeId>),
    Record(Shape),
    /// Members are deduplicated and sorted by id.
    Union(Vec<TypeId>),
    /// Members are deduplicated and sorted by id.
    Intersection(Vec<TypeId>),
}

impl TypeKind {
    fn flags(&self) -> TypeFlags {
        match self {
            TypeKind::Any => TypeFlags::ANY,
            TypeKind::Never => TypeFlags::NEVER,
            TypeKind::String => TypeFlags::STRING,
            TypeKind::Number => TypeFlags::NUMBER,
            TypeKind::StringLiteral(_) => TypeFlags::STRING_LITERAL,
            TypeKind::Array(_) => TypeFlags::ARRAY,
            TypeKind::Tuple(_) => TypeFlags::TUPLE,
            TypeKind::Record(_) => TypeFlags::RECORD,
            TypeKind::Union(_) => TypeFlags::UNION,
            TypeKind::Intersection(_) => TypeFlags::INTERSECTION,
        }
    }
}

/// The type table stores all types and provides access by TypeId.
#[derive(Debug)]
pub struct TypeTable {
    kinds: IndexSet<TypeKind, FxBuildHasher>,
    flags: Vec<TypeFlags>,
    /// Fields readable on a value of each type, computed at construction.
    /// `None` for types with no record-like view.
    visible: Vec<Option<Shape>>,
    names: NameTable,
    pub any_type: TypeId,
    pub never_type: TypeId,
    pub string_type: TypeId,
    pub number_type: TypeId,
}

impl TypeTable {
    pub fn new() -> Self {
        Self::with_names(NameTable::new())
    }

    /// Create a table that interns property names into `names`.
    pub fn with_names(names: NameTable) -> Self {
        let mut table = Self {
            kinds: IndexSet::with_capacity_and_hasher(256, FxBuildHasher),
            flags: Vec::with_capacity(256),
            visible: Vec::with_capacity(256),
            names,
            any_type: TypeId(0),
            never_type: TypeId(1),
            string_type: TypeId(2),
            number_type: TypeId(3),
        };
        table.intern(TypeKind::Any);
        table.intern(TypeKind::Never);
        table.intern(TypeKind::String);
        table.intern(TypeKind::Number);
        table
    }

    pub fn names(&self) -> &NameTable {
        &self.names
    }

    /// Intern a type kind, returning the id of the structurally equal type
    /// if one exists.
    ///
    /// Union and intersection kinds passed here must already be normalized;
    /// use [`TypeTable::union`] and [`TypeTable::intersection`] to build them.
    pub fn intern(&mut self, kind: TypeKind) -> TypeId {
        if let Some(index) = self.kinds.get_index_of(&kind) {
            return TypeId(index as u32);
        }
        let visible = self.compute_visible(&kind);
        let flags = kind.flags();
        let (index, _) = self.kinds.insert_full(kind);
        self.flags.push(flags);
        self.visible.push(visible);
        TypeId(index as u32)
    }

    pub fn kind(&self, id: TypeId) -> &TypeKind {
        &self.kinds[id.index()]
    }

    pub fn flags(&self, id: TypeId) -> TypeFlags {
        self.flags[id.index()]
    }

    /// The cached field view of a type: the record itself, the common fields
    /// of a union, or the merged fields of an intersection.
    pub fn visible_fields(&self, id: TypeId) -> Option<&Shape> {
        self.visible[id.index()].as_ref()
    }

    pub fn len(&self) -> usize {
        self.kinds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.kinds.is_empty()
    }

    // ========================================================================
    // Constructors
    // ========================================================================

    pub fn string_literal(&mut self, value: impl Into<String>) -> TypeId {
        self.intern(TypeKind::StringLiteral(value.into()))
    }

    pub fn array(&mut self, element: TypeId) -> TypeId {
        self.intern(TypeKind::Array(element))
    }

    pub fn tuple(&mut self, elements: Vec<TypeId>) -> TypeId {
        self.intern(TypeKind::Tuple(elements))
    }

    pub fn record(&mut self, shape: Shape) -> TypeId {
        self.intern(TypeKind::Record(shape))
    }

    /// Build a record from `(name, type, optional)` triples.
    pub fn record_of(&mut self, fields: &[(&str, TypeId, bool)]) -> TypeId {
        let shape = Shape::new(fields.iter().map(|&(name, type_id, optional)| {
            (self.names.intern(name), Property { type_id, optional })
        }));
        self.record(shape)
    }

    /// Build a union. Nested unions are flattened, `never` members dropped
    /// and duplicates removed. An `any` member absorbs the whole union.
    pub fn union(&mut self, types: impl IntoIterator<Item = TypeId>) -> TypeId {
        let mut members = Vec::new();
        for t in types {
            match self.kind(t) {
                TypeKind::Union(inner) => members.extend_from_slice(inner),
                TypeKind::Never => {}
                TypeKind::Any => return self.any_type,
                _ => members.push(t),
            }
        }
        members.sort_unstable();
        members.dedup();
        match members.len() {
            0 => self.never_type,
            1 => members[0],
            _ => self.intern(TypeKind::Union(members)),
        }
    }

    /// Build an intersection. Nested intersections are flattened and `any`
    /// members dropped; a `never` member collapses the whole intersection.
    pub fn intersection(&mut self, types: impl IntoIterator<Item = TypeId>) -> TypeId {
        let mut members = Vec::new();
        for t in types {
            match self.kind(t) {
                TypeKind::Intersection(inner) => members.extend_from_slice(inner),
                TypeKind::Any => {}
                TypeKind::Never => return self.never_type,
                _ => members.push(t),
            }
        }
        members.sort_unstable();
        members.dedup();
        match members.len() {
            0 => self.any_type,
            1 => members[0],
            _ => self.intern(TypeKind::Intersection(members)),
        }
    }

    // ========================================================================
    // Field visibility
    // ========================================================================

    fn compute_visible(&mut self, kind: &TypeKind) -> Option<Shape> {
        match kind {
            TypeKind::Record(shape) => Some(shape.clone()),
            TypeKind::Union(members) => Some(self.common_fields(members)),
            TypeKind::Intersection(members) => Some(self.merged_fields(members)),
            _ => None,
        }
    }

    /// Fields present in every member. A common field's type is the union of
    /// the member field types, optional if optional in any member.
    fn common_fields(&mut self, members: &[TypeId]) -> Shape {
        let shapes: Vec<Shape> = match members
            .iter()
            .map(|&m| self.visible_fields(m).cloned())
            .collect::<Option<Vec<_>>>()
        {
            Some(shapes) => shapes,
            None => return Shape::default(),
        };
        let Some((first, rest)) = shapes.split_first() else {
            return Shape::default();
        };

        let mut fields = Vec::new();
        'fields: for (&name, prop) in &first.fields {
            let mut types = vec![prop.type_id];
            let mut optional = prop.optional;
            for shape in rest {
                match shape.get(name) {
                    Some(other) => {
                        types.push(other.type_id);
                        optional |= other.optional;
                    }
                    None => continue 'fields,
                }
            }
            let type_id = self.union(types);
            fields.push((name, Property { type_id, optional }));
        }
        let mut shape = Shape::new(fields);
        shape.closed = shapes.iter().all(|s| s.closed);
        shape
    }

    /// Fields of every member. A field declared by several members gets the
    /// intersection of their types and is required if any member requires it.
    fn merged_fields(&mut self, members: &[TypeId]) -> Shape {
        let mut collected: IndexMap<Name, (Vec<TypeId>, bool), FxBuildHasher> = IndexMap::default();
        let mut closed = true;
        let mut any_shape = false;
        for &member in members {
            let Some(shape) = self.visible_fields(member) else {
                continue;
            };
            any_shape = true;
            closed &= shape.closed;
            for (&name, prop) in &shape.fields {
                let entry = collected.entry(name).or_insert_with(|| (Vec::new(), true));
                entry.0.push(prop.type_id);
                entry.1 &= prop.optional;
            }
        }

        let mut fields = Vec::with_capacity(collected.len());
        for (name, (types, optional)) in collected {
            let type_id = self.intersection(types);
            fields.push((name, Property { type_id, optional }));
        }
        let mut shape = Shape::new(fields);
        shape.closed = any_shape && closed;
        shape
    }
}

impl Default for TypeTable {
    fn default() -> Self {
        Self::new()
    }
}
