//! The type checker implementation.
//!
//! Decides whether a literal value fits a declared type, infers types for
//! unannotated declarations, and answers which fields of a union or
//! intersection are readable.

use crate::binding::{Binding, Mutability};
use crate::error::{AccessPath, CheckError, MismatchReason};
use crate::types::{Property, Shape, TypeFlags, TypeId, TypeKind, TypeTable};
use crate::value::{self, Value};
use indexmap::IndexMap;
use rtype_core::{Name, NameTable};
use rustc_hash::FxHashMap;

/// Maximum recursion depth for type stringification to prevent stack overflow.
const MAX_TYPE_TO_STRING_DEPTH: u32 = 20;

/// The type checker.
///
/// Value checks (`check_assignable`, `check_reassignment`) take `&self` and
/// never touch the type table. Operations that may construct new types take
/// `&mut self`.
pub struct Checker {
    /// The type table (type arena).
    pub type_table: TypeTable,
    /// Treat every record as closed when checking values.
    closed_records: bool,
    /// Display names for types declared under a name (interfaces).
    aliases: FxHashMap<TypeId, String>,
    /// Memoization cache for type-to-type assignability.
    assignability_cache: FxHashMap<(TypeId, TypeId), bool>,
}

impl Checker {
    pub fn new() -> Self {
        Self::with_options(false)
    }

    pub fn with_options(closed_records: bool) -> Self {
        Self::with_type_table(TypeTable::new(), closed_records)
    }

    pub fn with_type_table(type_table: TypeTable, closed_records: bool) -> Self {
        Self {
            type_table,
            closed_records,
            aliases: FxHashMap::default(),
            assignability_cache: FxHashMap::default(),
        }
    }

    pub fn names(&self) -> &NameTable {
        self.type_table.names()
    }

    pub fn closed_records(&self) -> bool {
        self.closed_records
    }

    /// Give a type a display name. The first name registered for a type wins,
    /// since structurally equal declarations share one id.
    pub fn name_type(&mut self, type_id: TypeId, name: &str) {
        self.aliases.entry(type_id).or_insert_with(|| name.to_string());
    }

    // ========================================================================
    // Inference
    // ========================================================================

    /// Infer the type of an initializer.
    ///
    /// A string initializing an immutable binding keeps its literal type;
    /// everything else, and anything nested in arrays or records, is widened.
    pub fn infer_type(&mut self, value: &Value, mutability: Mutability) -> TypeId {
        match (value, mutability) {
            (Value::String(s), Mutability::Immutable) => self.type_table.string_literal(s.as_str()),
            _ => self.infer_widened(value),
        }
    }

    fn infer_widened(&mut self, value: &Value) -> TypeId {
        match value {
            Value::String(_) => self.type_table.string_type,
            Value::Number(_) => self.type_table.number_type,
            Value::Array(items) if items.is_empty() => {
                let any = self.type_table.any_type;
                self.type_table.array(any)
            }
            Value::Array(items) => {
                let elements: Vec<TypeId> = items.iter().map(|item| self.infer_widened(item)).collect();
                let element = self.type_table.union(elements);
                self.type_table.array(element)
            }
            Value::Record(fields) => {
                let mut props = Vec::with_capacity(fields.len());
                for (key, field) in fields {
                    let type_id = self.infer_widened(field);
                    props.push((self.type_table.names().intern(key), Property::required(type_id)));
                }
                self.type_table.record(Shape::new(props))
            }
        }
    }

    // ========================================================================
    // Value checks
    // ========================================================================

    /// Check that `value` may be stored in a location of type `target`.
    pub fn check_assignable(&self, value: &Value, target: TypeId) -> Result<(), CheckError> {
        let mut path = AccessPath::root();
        self.check_value(value, target, &mut path, true)
    }

    /// Check a write to an existing binding.
    ///
    /// An immutable binding that already holds a value rejects every write,
    /// whatever its type. Otherwise the value must fit the declared type.
    pub fn check_reassignment(&self, binding: &Binding, new_value: &Value) -> Result<(), CheckError> {
        if binding.is_frozen() {
            return Err(CheckError::ImmutableBinding {
                binding_name: binding.name.clone(),
            });
        }
        self.check_assignable(new_value, binding.declared_type())
    }

    /// `excess` is false while checking a member of an intersection: the
    /// intersection checks unknown properties against its merged fields.
    fn check_value(&self, value: &Value, target: TypeId, path: &mut AccessPath, excess: bool) -> Result<(), CheckError> {
        match (self.type_table.kind(target), value) {
            (TypeKind::Any, _) => Ok(()),
            (TypeKind::String, Value::String(_)) => Ok(()),
            (TypeKind::Number, Value::Number(_)) => Ok(()),
            (TypeKind::StringLiteral(expected), Value::String(s)) if s == expected => Ok(()),
            (TypeKind::Array(element), Value::Array(items)) => {
                for (i, item) in items.iter().enumerate() {
                    path.push_index(i);
                    self.check_value(item, *element, path, true)?;
                    path.pop();
                }
                Ok(())
            }
            (TypeKind::Tuple(elements), Value::Array(items)) => {
                if elements.len() != items.len() {
                    return Err(self.mismatch(
                        value,
                        target,
                        path,
                        MismatchReason::TupleLength {
                            expected: elements.len(),
                            actual: items.len(),
                        },
                    ));
                }
                for (i, (item, &element)) in items.iter().zip(elements).enumerate() {
                    path.push_index(i);
                    self.check_value(item, element, path, true)?;
                    path.pop();
                }
                Ok(())
            }
            (TypeKind::Record(shape), Value::Record(fields)) => {
                if excess && (shape.closed || self.closed_records) {
                    self.check_excess(value, fields, target, path, |name| shape.get(name).is_some())?;
                }
                self.check_fields(value, fields, target, shape, path)
            }
            (TypeKind::Union(members), _) => {
                for &member in members {
                    if self.check_value(value, member, &mut path.clone(), excess).is_ok() {
                        return Ok(());
                    }
                }
                Err(self.mismatch(value, target, path, MismatchReason::NoMatchingMember))
            }
            (TypeKind::Intersection(members), _) => {
                if let (true, Value::Record(fields), Some(merged)) =
                    (excess, value, self.type_table.visible_fields(target))
                {
                    // A key is known if any record reachable through the
                    // members declares it, including non-common union fields.
                    if merged.closed || self.closed_records {
                        self.check_excess(value, fields, target, path, |name| self.declares_field(target, name))?;
                    }
                }
                for &member in members {
                    self.check_value(value, member, path, false)?;
                }
                Ok(())
            }
            _ => Err(self.mismatch(value, target, path, MismatchReason::Incompatible)),
        }
    }

    fn check_fields(
        &self,
        value: &Value,
        fields: &IndexMap<String, Value>,
        target: TypeId,
        shape: &Shape,
        path: &mut AccessPath,
    ) -> Result<(), CheckError> {
        let names = self.type_table.names();
        for (&name, prop) in &shape.fields {
            let key = names.resolve(name);
            match fields.get(key) {
                Some(field) => {
                    path.push_property(key);
                    self.check_value(field, prop.type_id, path, true)?;
                    path.pop();
                }
                None if prop.optional => {}
                None => {
                    return Err(self.mismatch(
                        value,
                        target,
                        path,
                        MismatchReason::MissingProperty(key.to_string()),
                    ))
                }
            }
        }
        Ok(())
    }

    fn check_excess(
        &self,
        value: &Value,
        fields: &IndexMap<String, Value>,
        target: TypeId,
        path: &AccessPath,
        declares: impl Fn(Name) -> bool,
    ) -> Result<(), CheckError> {
        let names = self.type_table.names();
        for key in fields.keys() {
            if !names.get(key).is_some_and(&declares) {
                return Err(self.mismatch(value, target, path, MismatchReason::ExcessProperty(key.clone())));
            }
        }
        Ok(())
    }

    /// Whether `name` is declared by `type_id` or by any union or
    /// intersection member beneath it. `any` declares every name.
    fn declares_field(&self, type_id: TypeId, name: Name) -> bool {
        match self.type_table.kind(type_id) {
            TypeKind::Any => true,
            TypeKind::Record(shape) => shape.get(name).is_some(),
            TypeKind::Union(members) | TypeKind::Intersection(members) => {
                members.iter().any(|&member| self.declares_field(member, name))
            }
            _ => false,
        }
    }

    /// Render a value the way mismatch errors report it: a top-level string
    /// as its literal, anything else widened.
    pub fn describe_value(&self, value: &Value) -> String {
        value::describe(value)
    }

    fn mismatch(&self, value: &Value, target: TypeId, path: &AccessPath, reason: MismatchReason) -> CheckError {
        CheckError::TypeMismatch {
            expected: self.type_to_string(target),
            actual: value::describe(value),
            path: path.clone(),
            reason,
        }
    }

    // ========================================================================
    // Field visibility
    // ========================================================================

    /// The record of fields readable on any value of a union type without
    /// narrowing: those present in every member.
    pub fn project_common_fields(&mut self, union: TypeId) -> TypeId {
        let shape = self.type_table.visible_fields(union).cloned().unwrap_or_default();
        self.type_table.record(shape)
    }

    /// The record of fields readable on a value of the intersection of
    /// `types`: every field of every member.
    pub fn merge_intersection(&mut self, types: &[TypeId]) -> TypeId {
        let intersection = self.type_table.intersection(types.iter().copied());
        let shape = self.type_table.visible_fields(intersection).cloned().unwrap_or_default();
        self.type_table.record(shape)
    }

    /// The type of `name` read from a value of type `type_id`, or `None` if
    /// the property is not visible on that type.
    pub fn property_type(&self, type_id: TypeId, name: &str) -> Option<TypeId> {
        let flags = self.type_table.flags(type_id);
        if flags.contains(TypeFlags::ANY) {
            return Some(self.type_table.any_type);
        }
        if name == "length" && flags.intersects(TypeFlags::STRING_LIKE | TypeFlags::ARRAY_LIKE) {
            return Some(self.type_table.number_type);
        }
        let name: Name = self.type_table.names().get(name)?;
        self.type_table
            .visible_fields(type_id)?
            .get(name)
            .map(|prop| prop.type_id)
    }

    /// The element type accepted by pushing onto a value of `type_id`.
    pub fn array_element_type(&mut self, type_id: TypeId) -> Option<TypeId> {
        match self.type_table.kind(type_id) {
            TypeKind::Any => Some(self.type_table.any_type),
            TypeKind::Array(element) => Some(*element),
            TypeKind::Tuple(elements) => {
                let elements = elements.clone();
                Some(self.type_table.union(elements))
            }
            _ => None,
        }
    }

    // ========================================================================
    // Type relationship checking
    // ========================================================================

    pub fn is_type_assignable_to(&mut self, source: TypeId, target: TypeId) -> bool {
        if source == target {
            return true;
        }

        if let Some(&result) = self.assignability_cache.get(&(source, target)) {
            return result;
        }

        // Optimistic sentinel: a cycle re-entering this pair assumes success.
        self.assignability_cache.insert((source, target), true);

        let result = self.is_type_assignable_to_worker(source, target);

        self.assignability_cache.insert((source, target), result);
        result
    }

    fn is_type_assignable_to_worker(&mut self, source: TypeId, target: TypeId) -> bool {
        let target_flags = self.type_table.flags(target);
        let source_flags = self.type_table.flags(source);

        if target_flags.contains(TypeFlags::ANY) || source_flags.contains(TypeFlags::ANY) {
            return true;
        }
        if source_flags.contains(TypeFlags::NEVER) {
            return true;
        }

        // Union source: each constituent must be assignable to target.
        if let TypeKind::Union(types) = self.type_table.kind(source) {
            let source_types = types.clone();
            return source_types.iter().all(|&t| self.is_type_assignable_to(t, target));
        }

        // Union target: source must be assignable to at least one constituent.
        if let TypeKind::Union(types) = self.type_table.kind(target) {
            let target_types = types.clone();
            return target_types.iter().any(|&t| self.is_type_assignable_to(source, t));
        }

        // Intersection target: source must be assignable to every constituent.
        if let TypeKind::Intersection(types) = self.type_table.kind(target) {
            let target_types = types.clone();
            return target_types.iter().all(|&t| self.is_type_assignable_to(source, t));
        }

        let source_kind = self.type_table.kind(source).clone();
        let target_kind = self.type_table.kind(target).clone();
        match (&source_kind, &target_kind) {
            (TypeKind::StringLiteral(_), TypeKind::String) => true,
            (TypeKind::Array(s), TypeKind::Array(t)) => self.is_type_assignable_to(*s, *t),
            (TypeKind::Tuple(elements), TypeKind::Array(t)) => {
                elements.iter().all(|&s| self.is_type_assignable_to(s, *t))
            }
            (TypeKind::Tuple(sources), TypeKind::Tuple(targets)) => {
                sources.len() == targets.len()
                    && sources
                        .iter()
                        .zip(targets)
                        .all(|(&s, &t)| self.is_type_assignable_to(s, t))
            }
            // Records and intersections compare through their field view.
            (_, TypeKind::Record(target_shape)) => match self.type_table.visible_fields(source).cloned() {
                Some(source_shape) => self.is_shape_assignable_to(&source_shape, target_shape),
                None => false,
            },
            (TypeKind::Intersection(types), _) => types.iter().any(|&t| self.is_type_assignable_to(t, target)),
            _ => false,
        }
    }

    fn is_shape_assignable_to(&mut self, source: &Shape, target: &Shape) -> bool {
        for (name, target_prop) in &target.fields {
            match source.get(*name) {
                Some(source_prop) => {
                    if source_prop.optional && !target_prop.optional {
                        return false;
                    }
                    if !self.is_type_assignable_to(source_prop.type_id, target_prop.type_id) {
                        return false;
                    }
                }
                None if target_prop.optional => {}
                None => return false,
            }
        }
        !target.closed || source.fields.keys().all(|name| target.fields.contains_key(name))
    }

    // ========================================================================
    // Display
    // ========================================================================

    pub fn type_to_string(&self, type_id: TypeId) -> String {
        self.type_to_string_inner(type_id, 0)
    }

    fn type_to_string_inner(&self, type_id: TypeId, depth: u32) -> String {
        if depth > MAX_TYPE_TO_STRING_DEPTH {
            return "...".to_string();
        }
        if let Some(alias) = self.aliases.get(&type_id) {
            return alias.clone();
        }
        match self.type_table.kind(type_id) {
            TypeKind::Any => "any".to_string(),
            TypeKind::Never => "never".to_string(),
            TypeKind::String => "string".to_string(),
            TypeKind::Number => "number".to_string(),
            TypeKind::StringLiteral(value) => format!("{:?}", value),
            TypeKind::Array(element) => {
                let inner = self.type_to_string_inner(*element, depth + 1);
                if self.needs_parens(*element) {
                    format!("({})[]", inner)
                } else {
                    format!("{}[]", inner)
                }
            }
            TypeKind::Tuple(elements) => {
                let elems = elements
                    .iter()
                    .map(|t| self.type_to_string_inner(*t, depth + 1))
                    .collect::<Vec<_>>()
                    .join(", ");
                format!("[{}]", elems)
            }
            TypeKind::Record(shape) => {
                if shape.is_empty() {
                    return "{}".to_string();
                }
                let names = self.type_table.names();
                let props = shape
                    .fields
                    .iter()
                    .map(|(&name, prop)| {
                        format!(
                            "{}{}: {}",
                            names.display(name),
                            if prop.optional { "?" } else { "" },
                            self.type_to_string_inner(prop.type_id, depth + 1)
                        )
                    })
                    .collect::<Vec<_>>()
                    .join("; ");
                format!("{{ {} }}", props)
            }
            TypeKind::Union(types) => types
                .iter()
                .map(|t| self.type_to_string_inner(*t, depth + 1))
                .collect::<Vec<_>>()
                .join(" | "),
            TypeKind::Intersection(types) => types
                .iter()
                .map(|t| {
                    let s = self.type_to_string_inner(*t, depth + 1);
                    if self.type_table.flags(*t).contains(TypeFlags::UNION) && !self.aliases.contains_key(t) {
                        format!("({})", s)
                    } else {
                        s
                    }
                })
                .collect::<Vec<_>>()
                .join(" & "),
        }
    }

    fn needs_parens(&self, type_id: TypeId) -> bool {
        !self.aliases.contains_key(&type_id)
            && self
                .type_table
                .flags(type_id)
                .intersects(TypeFlags::UNION | TypeFlags::INTERSECTION)
    }
}

impl Default for Checker {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_primitive_assignability() {
        let mut checker = Checker::new();
        let num = checker.type_table.number_type;
        let str_ = checker.type_table.string_type;
        assert!(checker.is_type_assignable_to(num, num));
        assert!(checker.is_type_assignable_to(str_, str_));
        assert!(!checker.is_type_assignable_to(num, str_));
    }

    #[test]
    fn test_any_assignability() {
        let mut checker = Checker::new();
        let any = checker.type_table.any_type;
        let num = checker.type_table.number_type;
        assert!(checker.is_type_assignable_to(any, num));
        assert!(checker.is_type_assignable_to(num, any));
    }

    #[test]
    fn test_never_assignability() {
        let mut checker = Checker::new();
        let never = checker.type_table.never_type;
        let num = checker.type_table.number_type;
        assert!(checker.is_type_assignable_to(never, num));
        assert!(!checker.is_type_assignable_to(num, never));
    }

    #[test]
    fn test_literal_widens_to_string() {
        let mut checker = Checker::new();
        let str_ = checker.type_table.string_type;
        let hello = checker.type_table.string_literal("hello world");
        assert!(checker.is_type_assignable_to(hello, str_));
        assert!(!checker.is_type_assignable_to(str_, hello));
    }

    #[test]
    fn test_union_assignability() {
        let mut checker = Checker::new();
        let str_ = checker.type_table.string_type;
        let num = checker.type_table.number_type;
        let rachel = checker.type_table.string_literal("Rachel");
        let union = checker.type_table.union([str_, num]);
        assert!(checker.is_type_assignable_to(str_, union));
        assert!(checker.is_type_assignable_to(num, union));
        assert!(checker.is_type_assignable_to(rachel, union));
        assert!(!checker.is_type_assignable_to(union, str_));
    }

    #[test]
    fn test_tuple_and_array_relation() {
        let mut checker = Checker::new();
        let num = checker.type_table.number_type;
        let str_ = checker.type_table.string_type;
        let pair = checker.type_table.tuple(vec![num, num]);
        let triple = checker.type_table.tuple(vec![num, num, num]);
        let numbers = checker.type_table.array(num);
        let strings = checker.type_table.array(str_);
        assert!(checker.is_type_assignable_to(pair, numbers));
        assert!(!checker.is_type_assignable_to(pair, strings));
        assert!(!checker.is_type_assignable_to(triple, pair));
        assert!(!checker.is_type_assignable_to(numbers, pair));
    }

    #[test]
    fn test_record_relation_with_optional_fields() {
        let mut checker = Checker::new();
        let num = checker.type_table.number_type;
        let str_ = checker.type_table.string_type;
        let address = checker.type_table.record_of(&[("houseNumber", num, false), ("streetName", str_, true)]);
        let just_number = checker.type_table.record_of(&[("houseNumber", num, false)]);
        let full = checker.type_table.record_of(&[("houseNumber", num, false), ("streetName", str_, false)]);
        assert!(checker.is_type_assignable_to(just_number, address));
        assert!(checker.is_type_assignable_to(full, address));
        assert!(!checker.is_type_assignable_to(address, full));
    }

    #[test]
    fn test_intersection_source_satisfies_both_members() {
        let mut checker = Checker::new();
        let num = checker.type_table.number_type;
        let str_ = checker.type_table.string_type;
        let phone = checker.type_table.record_of(&[("name", str_, false), ("phone", num, false)]);
        let email = checker.type_table.record_of(&[("name", str_, false), ("email", str_, false)]);
        let both = checker.type_table.intersection([phone, email]);
        let either = checker.type_table.union([phone, email]);
        assert!(checker.is_type_assignable_to(both, phone));
        assert!(checker.is_type_assignable_to(both, email));
        assert!(checker.is_type_assignable_to(both, either));
        assert!(!checker.is_type_assignable_to(either, both));
    }

    #[test]
    fn test_type_to_string() {
        let mut checker = Checker::new();
        let num = checker.type_table.number_type;
        let str_ = checker.type_table.string_type;
        assert_eq!(checker.type_to_string(str_), "string");
        assert_eq!(checker.type_to_string(checker.type_table.any_type), "any");

        let lit = checker.type_table.string_literal("hello world");
        assert_eq!(checker.type_to_string(lit), "\"hello world\"");

        let tuple = checker.type_table.tuple(vec![num, str_, str_, num]);
        assert_eq!(checker.type_to_string(tuple), "[number, string, string, number]");

        let union = checker.type_table.union([str_, num]);
        let arr = checker.type_table.array(union);
        assert_eq!(checker.type_to_string(arr), "(string | number)[]");

        let address = checker.type_table.record_of(&[("houseNumber", num, false), ("streetName", str_, true)]);
        assert_eq!(checker.type_to_string(address), "{ houseNumber: number; streetName?: string }");
    }

    #[test]
    fn test_aliases_are_used_for_display() {
        let mut checker = Checker::new();
        let str_ = checker.type_table.string_type;
        let email = checker.type_table.record_of(&[("name", str_, false), ("email", str_, false)]);
        checker.name_type(email, "HasEmail");
        checker.name_type(email, "Other");
        let list = checker.type_table.array(email);
        assert_eq!(checker.type_to_string(list), "HasEmail[]");
    }

    #[test]
    fn test_property_type_on_primitives() {
        let checker = Checker::new();
        let str_ = checker.type_table.string_type;
        let num = checker.type_table.number_type;
        let any = checker.type_table.any_type;
        assert_eq!(checker.property_type(str_, "length"), Some(num));
        assert_eq!(checker.property_type(num, "length"), None);
        assert_eq!(checker.property_type(any, "whatever"), Some(any));
    }
}
