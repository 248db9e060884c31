//! Errors reported while binding a program.

use rtype_checker::CheckError;
use rtype_diagnostics::{messages, Diagnostic};
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BindError {
    #[error(transparent)]
    Check(#[from] CheckError),

    #[error("'const' declarations must be initialized.")]
    ConstWithoutInitializer { name: String },

    #[error("Cannot find name '{0}'.")]
    UnknownName(String),

    #[error("Cannot redeclare block-scoped variable '{0}'.")]
    Redeclared(String),

    #[error("Duplicate identifier '{0}'.")]
    DuplicateField(String),

    #[error("Type alias '{0}' circularly references itself.")]
    CircularInterface(String),

    #[error("Variable '{0}' implicitly has an 'any' type.")]
    ImplicitAny(String),

    #[error("Literal '{0}' is not supported; only strings, numbers, arrays and objects can be checked.")]
    UnsupportedLiteral(String),

    #[error("Argument of type '{actual}' is not assignable to parameter of type '{expected}'.")]
    ArgumentMismatch { expected: String, actual: String },

    #[error("Property '{property}' does not exist on type '{type_name}'.")]
    UnknownProperty { property: String, type_name: String },
}

impl BindError {
    pub fn to_diagnostic(&self) -> Diagnostic {
        match self {
            BindError::Check(err) => err.to_diagnostic(),
            BindError::ConstWithoutInitializer { .. } => {
                Diagnostic::new(&messages::CONST_DECLARATIONS_MUST_BE_INITIALIZED, &[])
            }
            BindError::UnknownName(name) => Diagnostic::new(&messages::CANNOT_FIND_NAME_0, &[name.as_str()]),
            BindError::Redeclared(name) => {
                Diagnostic::new(&messages::CANNOT_REDECLARE_BLOCK_SCOPED_VARIABLE_0, &[name.as_str()])
            }
            BindError::DuplicateField(name) => Diagnostic::new(&messages::DUPLICATE_IDENTIFIER_0, &[name.as_str()]),
            BindError::CircularInterface(name) => {
                Diagnostic::new(&messages::TYPE_ALIAS_0_CIRCULARLY_REFERENCES_ITSELF, &[name.as_str()])
            }
            BindError::ImplicitAny(name) => {
                Diagnostic::new(&messages::VARIABLE_0_IMPLICITLY_HAS_AN_1_TYPE, &[name.as_str(), "any"])
            }
            BindError::UnsupportedLiteral(text) => Diagnostic::new(&messages::UNSUPPORTED_LITERAL_0, &[text.as_str()]),
            BindError::ArgumentMismatch { expected, actual } => Diagnostic::new(
                &messages::ARGUMENT_OF_TYPE_0_IS_NOT_ASSIGNABLE_TO_PARAMETER_OF_TYPE_1,
                &[actual.as_str(), expected.as_str()],
            ),
            BindError::UnknownProperty { property, type_name } => Diagnostic::new(
                &messages::PROPERTY_0_DOES_NOT_EXIST_ON_TYPE_1,
                &[property.as_str(), type_name.as_str()],
            ),
        }
    }
}
