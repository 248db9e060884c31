//! Errors produced by value checks.

use rtype_diagnostics::{format_message, messages, Diagnostic, DiagnosticMessage};
use std::fmt;
use thiserror::Error;

/// Why a value failed to match a type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MismatchReason {
    /// The value has the wrong kind or literal.
    Incompatible,
    /// No member of a union accepted the value.
    NoMatchingMember,
    /// A required record field is absent.
    MissingProperty(String),
    /// A closed record received a field it does not declare.
    ExcessProperty(String),
    /// An array literal has a different length than the tuple.
    TupleLength { expected: usize, actual: usize },
}

/// One step from the checked value down to the offending member.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSegment {
    Property(String),
    Index(usize),
}

/// Location of a mismatch inside the checked value, e.g. `contacts[0].phone`.
/// The empty path is the value itself.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AccessPath(Vec<PathSegment>);

impl AccessPath {
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn segments(&self) -> &[PathSegment] {
        &self.0
    }

    pub(crate) fn push_property(&mut self, name: &str) {
        self.0.push(PathSegment::Property(name.to_string()));
    }

    pub(crate) fn push_index(&mut self, index: usize) {
        self.0.push(PathSegment::Index(index));
    }

    pub(crate) fn pop(&mut self) {
        self.0.pop();
    }
}

impl fmt::Display for AccessPath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, segment) in self.0.iter().enumerate() {
            match segment {
                PathSegment::Property(name) if i == 0 => write!(f, "{}", name)?,
                PathSegment::Property(name) => write!(f, ".{}", name)?,
                PathSegment::Index(index) => write!(f, "[{}]", index)?,
            }
        }
        Ok(())
    }
}

/// A rejected assignment.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CheckError {
    /// The value does not fit the declared type. `expected` and `actual` are
    /// rendered types at `path`.
    #[error("{}", mismatch_text(.reason, .expected, .actual))]
    TypeMismatch {
        expected: String,
        actual: String,
        path: AccessPath,
        reason: MismatchReason,
    },

    /// A second write to a binding that was fixed at declaration.
    #[error("Cannot assign to '{binding_name}' because it is a constant.")]
    ImmutableBinding { binding_name: String },
}

impl CheckError {
    pub fn is_type_mismatch(&self) -> bool {
        matches!(self, CheckError::TypeMismatch { .. })
    }

    /// Convert into a diagnostic carrying the matching message code.
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            CheckError::ImmutableBinding { binding_name } => Diagnostic::new(
                &messages::CANNOT_ASSIGN_TO_0_BECAUSE_IT_IS_A_CONSTANT,
                &[binding_name.as_str()],
            ),
            CheckError::TypeMismatch { expected, actual, path, reason } => {
                let (message, args) = mismatch_message(reason, expected, actual);
                let args: Vec<&str> = args.iter().map(String::as_str).collect();
                let mut diag = Diagnostic::new(message, &args);
                if let MismatchReason::MissingProperty(property) = reason {
                    diag = diag.with_related(Diagnostic::new(&messages::_0_IS_DECLARED_HERE, &[property.as_str()]));
                }
                if !path.is_root() {
                    diag = diag.with_related(Diagnostic::new(
                        &messages::TYPES_OF_PROPERTY_0_ARE_INCOMPATIBLE,
                        &[path.to_string().as_str()],
                    ));
                }
                diag
            }
        }
    }
}

fn mismatch_message(reason: &MismatchReason, expected: &str, actual: &str) -> (&'static DiagnosticMessage, Vec<String>) {
    let (expected, actual) = (expected.to_string(), actual.to_string());
    match reason {
        MismatchReason::Incompatible | MismatchReason::NoMatchingMember => {
            (&messages::TYPE_0_IS_NOT_ASSIGNABLE_TO_TYPE_1, vec![actual, expected])
        }
        MismatchReason::MissingProperty(property) => (
            &messages::PROPERTY_0_IS_MISSING_IN_TYPE_1_BUT_REQUIRED_IN_TYPE_2,
            vec![property.clone(), actual, expected],
        ),
        MismatchReason::ExcessProperty(property) => (
            &messages::OBJECT_LITERAL_MAY_ONLY_SPECIFY_KNOWN_PROPERTIES,
            vec![property.clone(), expected],
        ),
        MismatchReason::TupleLength { expected: want, actual: got } => (
            &messages::SOURCE_HAS_0_ELEMENTS_BUT_TARGET_REQUIRES_1,
            vec![actual, expected, got.to_string(), want.to_string()],
        ),
    }
}

fn mismatch_text(reason: &MismatchReason, expected: &str, actual: &str) -> String {
    let (message, args) = mismatch_message(reason, expected, actual);
    let args: Vec<&str> = args.iter().map(String::as_str).collect();
    format_message(message.message, &args)
}
