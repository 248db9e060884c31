//! Program syntax: the JSON form of interfaces and statements.

use crate::error::BindError;
use indexmap::IndexMap;
use rtype_checker::Value;
use serde::Deserialize;

/// A parsed program file.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct SourceFile {
    /// Named record types, in declaration order.
    #[serde(default)]
    pub interfaces: IndexMap<String, TypeExpr>,
    #[serde(default)]
    pub statements: Vec<Statement>,
}

/// A type annotation.
///
/// `"string"`, `"number"`, `"any"` and `"never"` name the intrinsic types;
/// any other bare string names an interface.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum TypeExpr {
    Named(String),
    Literal {
        literal: String,
    },
    Array {
        array: Box<TypeExpr>,
    },
    Tuple {
        tuple: Vec<TypeExpr>,
    },
    /// A key ending in `?` declares an optional field.
    Record {
        record: IndexMap<String, TypeExpr>,
        #[serde(default)]
        closed: bool,
    },
    Union {
        union: Vec<TypeExpr>,
    },
    Intersection {
        intersection: Vec<TypeExpr>,
    },
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Declaration {
    pub name: String,
    #[serde(rename = "type", default)]
    pub annotation: Option<TypeExpr>,
    #[serde(default)]
    pub init: Option<serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum Statement {
    /// `let name: type = init`
    Let(Declaration),
    /// `const name: type = init`
    Const(Declaration),
    /// `name = value`
    Assign { name: String, value: serde_json::Value },
    /// `name.push(value)`
    Push { name: String, value: serde_json::Value },
    /// `name.property`
    Access { name: String, property: String },
    /// `{ statements }`
    Block {
        #[serde(default)]
        statements: Vec<Statement>,
    },
}

/// Parse a program file from a string.
pub fn parse_source_file(content: &str) -> Result<SourceFile, serde_json::Error> {
    serde_json::from_str(content)
}

/// Convert a JSON literal into a checkable value. Booleans and `null` have
/// no type in this language.
pub fn lower_value(json: &serde_json::Value) -> Result<Value, BindError> {
    match json {
        serde_json::Value::String(s) => Ok(Value::String(s.clone())),
        serde_json::Value::Number(n) => n
            .as_f64()
            .map(Value::Number)
            .ok_or_else(|| BindError::UnsupportedLiteral(n.to_string())),
        serde_json::Value::Array(items) => items.iter().map(lower_value).collect::<Result<Vec<_>, _>>().map(Value::Array),
        serde_json::Value::Object(fields) => {
            let mut record = IndexMap::with_capacity(fields.len());
            for (key, field) in fields {
                record.insert(key.clone(), lower_value(field)?);
            }
            Ok(Value::Record(record))
        }
        other @ (serde_json::Value::Bool(_) | serde_json::Value::Null) => {
            Err(BindError::UnsupportedLiteral(other.to_string()))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_parse_statements() {
        let file = parse_source_file(
            r#"{
                "statements": [
                    { "kind": "let", "name": "x", "init": "hello world" },
                    { "kind": "const", "name": "y", "type": "number", "init": 1 },
                    { "kind": "assign", "name": "x", "value": 42 },
                    { "kind": "push", "name": "aa", "value": 33 },
                    { "kind": "access", "name": "x", "property": "length" },
                    { "kind": "block", "statements": [] }
                ]
            }"#,
        )
        .unwrap();
        assert!(file.interfaces.is_empty());
        assert_eq!(file.statements.len(), 6);
        match &file.statements[1] {
            Statement::Const(decl) => {
                assert_eq!(decl.name, "y");
                assert_eq!(decl.annotation, Some(TypeExpr::Named("number".to_string())));
                assert_eq!(decl.init, Some(json!(1)));
            }
            other => panic!("unexpected statement {:?}", other),
        }
        assert!(matches!(&file.statements[5], Statement::Block { statements } if statements.is_empty()));
    }

    #[test]
    fn test_parse_type_exprs() {
        let file = parse_source_file(
            r#"{
                "interfaces": {
                    "Address": { "record": { "houseNumber": "number", "streetName?": "string" }, "closed": true },
                    "Contact": { "union": ["HasEmail", { "intersection": ["A", "B"] }] },
                    "Row": { "tuple": ["number", { "literal": "x" }, { "array": "string" }] }
                }
            }"#,
        )
        .unwrap();
        match &file.interfaces["Address"] {
            TypeExpr::Record { record, closed } => {
                assert!(*closed);
                assert_eq!(record.keys().collect::<Vec<_>>(), vec!["houseNumber", "streetName?"]);
            }
            other => panic!("unexpected type {:?}", other),
        }
        assert!(matches!(&file.interfaces["Contact"], TypeExpr::Union { union } if union.len() == 2));
        match &file.interfaces["Row"] {
            TypeExpr::Tuple { tuple } => {
                assert_eq!(tuple[1], TypeExpr::Literal { literal: "x".to_string() });
                assert_eq!(tuple[2], TypeExpr::Array { array: Box::new(TypeExpr::Named("string".to_string())) });
            }
            other => panic!("unexpected type {:?}", other),
        }
    }

    #[test]
    fn test_unknown_statement_kind_is_rejected() {
        assert!(parse_source_file(r#"{ "statements": [{ "kind": "delete", "name": "x" }] }"#).is_err());
    }

    #[test]
    fn test_lower_value() {
        let value = lower_value(&json!({ "name": "murphy", "age": 2.5, "tags": ["a", 1] })).unwrap();
        assert_eq!(
            value,
            Value::record([
                ("name", Value::from("murphy")),
                ("age", Value::from(2.5)),
                ("tags", Value::array([Value::from("a"), Value::from(1)])),
            ])
        );
    }

    #[test]
    fn test_lower_value_rejects_booleans() {
        let err = lower_value(&json!([1, true])).unwrap_err();
        assert_eq!(err, BindError::UnsupportedLiteral("true".to_string()));
    }
}
