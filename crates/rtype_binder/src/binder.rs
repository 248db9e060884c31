//! The binder implementation.
//!
//! Walks a program's statements in order and checks each one:
//! - Interface resolution (with cycle detection)
//! - Declarations, with inference for unannotated initializers
//! - Assignment through the binding's mutability and declared type
//! - Array pushes and property reads
//! - Block scopes

use crate::error::BindError;
use crate::scope::Scope;
use crate::syntax::{lower_value, Declaration, SourceFile, Statement, TypeExpr};
use rtype_checker::{Binding, Checker, Mutability, Property, Shape, TypeId, Value};
use rtype_diagnostics::DiagnosticCollection;
use rtype_options::CheckerOptions;
use rustc_hash::FxHashMap;

/// The binder declares bindings and reports every error it meets.
pub struct Binder {
    /// The checker, owning the type table.
    checker: Checker,
    /// The current scope.
    current_scope: Option<Box<Scope>>,
    /// Resolved interface types by name.
    interfaces: FxHashMap<String, TypeId>,
    /// File name attached to diagnostics.
    file_name: Option<String>,
    /// 1-based index of the statement being bound, counting nested ones.
    statement_index: u32,
    no_implicit_any: bool,
    /// Diagnostics from binding.
    diagnostics: DiagnosticCollection,
    /// Nesting depth for scope tracking.
    scope_depth: u32,
}

impl Binder {
    pub fn new(options: &CheckerOptions) -> Self {
        Self {
            checker: Checker::with_options(options.closed_records()),
            current_scope: Some(Box::new(Scope::new(None))),
            interfaces: FxHashMap::default(),
            file_name: None,
            statement_index: 0,
            no_implicit_any: options.no_implicit_any(),
            diagnostics: DiagnosticCollection::new(),
            scope_depth: 0,
        }
    }

    /// Attach `file_name` to every diagnostic reported from now on.
    pub fn with_file_name(mut self, file_name: impl Into<String>) -> Self {
        self.file_name = Some(file_name.into());
        self
    }

    pub fn checker(&self) -> &Checker {
        &self.checker
    }

    /// Take diagnostics from the binder.
    pub fn take_diagnostics(&mut self) -> DiagnosticCollection {
        std::mem::take(&mut self.diagnostics)
    }

    /// Bindings declared at the top level, in declaration order.
    pub fn global_bindings(&self) -> impl Iterator<Item = &Binding> {
        self.current_scope.iter().flat_map(|scope| scope.bindings())
    }

    /// Resolve `name` through the current scope chain.
    pub fn lookup(&self, name: &str) -> Option<&Binding> {
        self.current_scope.as_deref()?.lookup(name)
    }

    /// The type declared under an interface name.
    pub fn interface_type(&self, name: &str) -> Option<TypeId> {
        self.interfaces.get(name).copied()
    }

    pub fn scope_depth(&self) -> u32 {
        self.scope_depth
    }

    // ========================================================================
    // Source file binding
    // ========================================================================

    /// Bind a source file: resolve its interfaces, then check every
    /// statement in order.
    pub fn bind_source_file(&mut self, source_file: &SourceFile) {
        let mut resolving = Vec::new();
        for name in source_file.interfaces.keys() {
            self.resolve_interface(name, source_file, &mut resolving);
        }

        for statement in &source_file.statements {
            self.bind_statement(statement);
        }
    }

    fn bind_statement(&mut self, statement: &Statement) {
        self.statement_index += 1;
        let result = match statement {
            Statement::Let(decl) => self.bind_declaration(decl, Mutability::Mutable),
            Statement::Const(decl) => self.bind_declaration(decl, Mutability::Immutable),
            Statement::Assign { name, value } => self.bind_assignment(name, value),
            Statement::Push { name, value } => self.bind_push(name, value),
            Statement::Access { name, property } => self.bind_access(name, property),
            Statement::Block { statements } => {
                self.push_block_scope();
                for statement in statements {
                    self.bind_statement(statement);
                }
                self.pop_scope();
                Ok(())
            }
        };
        if let Err(err) = result {
            self.report(err);
        }
    }

    fn bind_declaration(&mut self, decl: &Declaration, mutability: Mutability) -> Result<(), BindError> {
        if self.current_scope.as_ref().is_some_and(|scope| scope.declares(&decl.name)) {
            return Err(BindError::Redeclared(decl.name.clone()));
        }

        let value = match decl.init.as_ref().map(lower_value).transpose() {
            Ok(value) => value,
            Err(err) => {
                self.report(err);
                None
            }
        };

        if mutability == Mutability::Immutable && decl.init.is_none() {
            self.report(BindError::ConstWithoutInitializer { name: decl.name.clone() });
        }

        let declared_type = match (&decl.annotation, &value) {
            (Some(annotation), _) => {
                let declared = self.resolve_type_expr(annotation);
                if let Some(value) = &value {
                    if let Err(err) = self.checker.check_assignable(value, declared) {
                        self.report(err.into());
                    }
                }
                declared
            }
            (None, Some(value)) => self.checker.infer_type(value, mutability),
            (None, None) => {
                if self.no_implicit_any && decl.init.is_none() {
                    self.report(BindError::ImplicitAny(decl.name.clone()));
                }
                self.checker.type_table.any_type
            }
        };

        let mut binding = Binding::new(decl.name.clone(), declared_type, mutability, value);
        if decl.init.is_some() {
            binding = binding.initialized();
        }
        self.declare(binding);
        Ok(())
    }

    fn bind_assignment(&mut self, name: &str, value: &serde_json::Value) -> Result<(), BindError> {
        let value = lower_value(value)?;
        let binding = self
            .current_scope
            .as_deref_mut()
            .and_then(|scope| scope.lookup_mut(name))
            .ok_or_else(|| BindError::UnknownName(name.to_string()))?;
        self.checker.check_reassignment(binding, &value)?;
        binding.assign(value);
        Ok(())
    }

    fn bind_push(&mut self, name: &str, value: &serde_json::Value) -> Result<(), BindError> {
        let value = lower_value(value)?;
        let declared = self
            .lookup(name)
            .map(Binding::declared_type)
            .ok_or_else(|| BindError::UnknownName(name.to_string()))?;

        // The array a binding refers to stays mutable even when the binding
        // is immutable.
        let Some(element) = self.checker.array_element_type(declared) else {
            return Err(BindError::UnknownProperty {
                property: "push".to_string(),
                type_name: self.checker.type_to_string(declared),
            });
        };
        if self.checker.check_assignable(&value, element).is_err() {
            return Err(BindError::ArgumentMismatch {
                expected: self.checker.type_to_string(element),
                actual: self.checker.describe_value(&value),
            });
        }

        if let Some(Value::Array(items)) = self
            .current_scope
            .as_deref_mut()
            .and_then(|scope| scope.lookup_mut(name))
            .and_then(Binding::value_mut)
        {
            items.push(value);
        }
        Ok(())
    }

    fn bind_access(&mut self, name: &str, property: &str) -> Result<(), BindError> {
        let declared = self
            .lookup(name)
            .map(Binding::declared_type)
            .ok_or_else(|| BindError::UnknownName(name.to_string()))?;
        match self.checker.property_type(declared, property) {
            Some(_) => Ok(()),
            None => Err(BindError::UnknownProperty {
                property: property.to_string(),
                type_name: self.checker.type_to_string(declared),
            }),
        }
    }

    // ========================================================================
    // Type resolution
    // ========================================================================

    fn resolve_interface(&mut self, name: &str, source_file: &SourceFile, resolving: &mut Vec<String>) -> TypeId {
        if let Some(&type_id) = self.interfaces.get(name) {
            return type_id;
        }
        if resolving.iter().any(|n| n == name) {
            self.report(BindError::CircularInterface(name.to_string()));
            return self.checker.type_table.any_type;
        }
        let Some(expr) = source_file.interfaces.get(name) else {
            return self.checker.type_table.any_type;
        };

        resolving.push(name.to_string());
        let type_id = self.lower_type_expr(expr, &mut |binder, named| {
            binder.resolve_named(named, |binder, interface| {
                if source_file.interfaces.contains_key(interface) {
                    Some(binder.resolve_interface(interface, source_file, resolving))
                } else {
                    None
                }
            })
        });
        resolving.pop();

        self.checker.name_type(type_id, name);
        self.interfaces.insert(name.to_string(), type_id);
        type_id
    }

    /// Resolve an annotation once every interface is known.
    fn resolve_type_expr(&mut self, expr: &TypeExpr) -> TypeId {
        self.lower_type_expr(expr, &mut |binder, named| {
            binder.resolve_named(named, |binder, interface| binder.interfaces.get(interface).copied())
        })
    }

    /// Resolve a bare type name: an intrinsic, an interface found by
    /// `interface`, or an unknown name reported as `any`.
    fn resolve_named(
        &mut self,
        named: &str,
        interface: impl FnOnce(&mut Self, &str) -> Option<TypeId>,
    ) -> TypeId {
        let table = &self.checker.type_table;
        match named {
            "any" => table.any_type,
            "never" => table.never_type,
            "string" => table.string_type,
            "number" => table.number_type,
            _ => match interface(self, named) {
                Some(type_id) => type_id,
                None => {
                    self.report(BindError::UnknownName(named.to_string()));
                    self.checker.type_table.any_type
                }
            },
        }
    }

    fn lower_type_expr(&mut self, expr: &TypeExpr, named: &mut dyn FnMut(&mut Self, &str) -> TypeId) -> TypeId {
        match expr {
            TypeExpr::Named(name) => named(self, name),
            TypeExpr::Literal { literal } => self.checker.type_table.string_literal(literal.as_str()),
            TypeExpr::Array { array } => {
                let element = self.lower_type_expr(array, named);
                self.checker.type_table.array(element)
            }
            TypeExpr::Tuple { tuple } => {
                let elements = tuple.iter().map(|t| self.lower_type_expr(t, named)).collect();
                self.checker.type_table.tuple(elements)
            }
            TypeExpr::Record { record, closed } => {
                let mut fields = Vec::with_capacity(record.len());
                for (key, field) in record {
                    let (key, optional) = match key.strip_suffix('?') {
                        Some(key) => (key, true),
                        None => (key.as_str(), false),
                    };
                    let type_id = self.lower_type_expr(field, named);
                    let name = self.checker.names().intern(key);
                    // `a` and `a?` name the same field; the first one wins.
                    if fields.iter().any(|&(existing, _)| existing == name) {
                        self.report(BindError::DuplicateField(key.to_string()));
                        continue;
                    }
                    fields.push((name, Property { type_id, optional }));
                }
                let mut shape = Shape::new(fields);
                shape.closed = *closed;
                self.checker.type_table.record(shape)
            }
            TypeExpr::Union { union } => {
                let members: Vec<TypeId> = union.iter().map(|t| self.lower_type_expr(t, named)).collect();
                self.checker.type_table.union(members)
            }
            TypeExpr::Intersection { intersection } => {
                let members: Vec<TypeId> = intersection.iter().map(|t| self.lower_type_expr(t, named)).collect();
                self.checker.type_table.intersection(members)
            }
        }
    }

    // ========================================================================
    // Scopes and reporting
    // ========================================================================

    fn declare(&mut self, binding: Binding) {
        if let Some(scope) = &mut self.current_scope {
            scope.declare(binding);
        }
    }

    fn push_block_scope(&mut self) {
        let parent = self.current_scope.take();
        self.current_scope = Some(Box::new(Scope::new(parent)));
        self.scope_depth += 1;
    }

    fn pop_scope(&mut self) {
        if let Some(scope) = self.current_scope.take() {
            self.current_scope = scope.parent;
            if self.scope_depth > 0 {
                self.scope_depth -= 1;
            }
        }
    }

    fn report(&mut self, err: BindError) {
        let mut diag = err.to_diagnostic();
        if self.statement_index > 0 {
            diag = diag.at_statement(self.statement_index);
        }
        if let Some(file_name) = &self.file_name {
            diag = diag.in_file(file_name.clone());
        }
        self.diagnostics.add(diag);
    }
}

impl Default for Binder {
    fn default() -> Self {
        Self::new(&CheckerOptions::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::parse_source_file;

    fn bind(source: &str) -> (Binder, Vec<u32>) {
        let file = parse_source_file(source).unwrap();
        let mut binder = Binder::default();
        binder.bind_source_file(&file);
        let codes = binder.take_diagnostics().diagnostics().iter().map(|d| d.code).collect();
        (binder, codes)
    }

    #[test]
    fn test_binder_creation() {
        let binder = Binder::default();
        assert_eq!(binder.scope_depth(), 0);
        assert_eq!(binder.global_bindings().count(), 0);
    }

    #[test]
    fn test_scope_management() {
        let mut binder = Binder::default();
        binder.push_block_scope();
        assert_eq!(binder.scope_depth(), 1);
        binder.push_block_scope();
        assert_eq!(binder.scope_depth(), 2);
        binder.pop_scope();
        binder.pop_scope();
        assert_eq!(binder.scope_depth(), 0);
    }

    #[test]
    fn test_interface_is_named() {
        let (binder, codes) = bind(
            r#"{ "interfaces": { "Address": { "record": { "houseNumber": "number", "streetName?": "string" } } } }"#,
        );
        assert!(codes.is_empty());
        let address = binder.interface_type("Address").unwrap();
        assert_eq!(binder.checker().type_to_string(address), "Address");
    }

    #[test]
    fn test_interfaces_may_reference_later_interfaces() {
        let (binder, codes) = bind(
            r#"{ "interfaces": {
                "Book": { "record": { "contacts": { "array": "HasEmail" } } },
                "HasEmail": { "record": { "name": "string", "email": "string" } }
            } }"#,
        );
        assert!(codes.is_empty());
        let book = binder.interface_type("Book").unwrap();
        let contacts = binder.checker().property_type(book, "contacts").unwrap();
        assert_eq!(binder.checker().type_to_string(contacts), "HasEmail[]");
    }

    #[test]
    fn test_circular_interface() {
        let (_, codes) = bind(
            r#"{ "interfaces": {
                "A": { "record": { "next": "B" } },
                "B": { "record": { "prev": "A" } }
            } }"#,
        );
        assert_eq!(codes, vec![2456]);
    }

    #[test]
    fn test_optional_marker_does_not_make_a_second_field() {
        let (binder, codes) = bind(
            r#"{ "interfaces": { "Contact": { "record": { "phone": "number", "phone?": "string" } } } }"#,
        );
        assert_eq!(codes, vec![2300]);
        let contact = binder.interface_type("Contact").unwrap();
        assert_eq!(binder.checker().type_to_string(contact), "Contact");
        let phone = binder.checker().property_type(contact, "phone").unwrap();
        assert_eq!(phone, binder.checker().type_table.number_type);
    }

    #[test]
    fn test_unknown_type_name() {
        let (binder, codes) = bind(r#"{ "statements": [{ "kind": "let", "name": "x", "type": "Missing", "init": 1 }] }"#);
        assert_eq!(codes, vec![2304]);
        let x = binder.lookup("x").unwrap();
        assert_eq!(x.declared_type(), binder.checker().type_table.any_type);
    }

    #[test]
    fn test_push_records_the_value() {
        let (binder, codes) = bind(
            r#"{ "statements": [
                { "kind": "const", "name": "aa", "type": { "array": "number" }, "init": [] },
                { "kind": "push", "name": "aa", "value": 33 }
            ] }"#,
        );
        assert!(codes.is_empty());
        assert_eq!(binder.lookup("aa").unwrap().value(), Some(&Value::array([Value::from(33)])));
    }
}
