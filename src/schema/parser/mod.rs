// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! ROS 2 `.msg` parser using Pest.
//!
//! Accepts a single definition or a concatenated one, where dependency
//! definitions follow the root, each introduced by a `===` separator line
//! and a `MSG: package/Type` header (the layout rosbag2 and MCAP writers
//! embed in recordings).

use pest::iterators::Pair;
use pest::Parser;
use pest_derive::Parser;

use crate::core::{BagError, Result};
use crate::schema::ast::{
    canonical_type_name, package_of, ArrayKind, Constant, Field, FieldType, MessageSchema,
    MessageType, PrimitiveType,
};

#[derive(Parser)]
#[grammar = "schema/parser/msg.pest"] // Path relative to src/ directory
struct MsgParser;

/// Parse a `.msg` definition for the type `name`.
///
/// The returned schema holds the root type plus any dependency blocks found
/// in `definition`; references to types not defined in the text are left
/// for the caller to resolve.
pub fn parse(name: &str, definition: &str) -> Result<MessageSchema> {
    let root_name = canonical_type_name(name, None);
    let schema_pair = MsgParser::parse(Rule::schema, definition)
        .map_err(|e| BagError::schema(&root_name, e.to_string()))?
        .next()
        .ok_or_else(|| BagError::schema(&root_name, "empty parse result"))?;

    let mut schema = MessageSchema::new(root_name.clone());
    for pair in schema_pair.into_inner() {
        match pair.as_rule() {
            Rule::block => {
                let msg_type = parse_block(&root_name, pair)?;
                schema.add_type(msg_type);
            }
            Rule::dependency => {
                let mut inner = pair.into_inner();
                let Some(header) = inner.next() else {
                    continue;
                };
                let dep_name = canonical_type_name(header.as_str(), None);
                let msg_type = match inner.next() {
                    Some(block) => parse_block(&dep_name, block)?,
                    None => MessageType::new(&dep_name),
                };
                if dep_name == root_name {
                    continue;
                }
                schema.add_type(msg_type);
            }
            _ => {}
        }
    }
    Ok(schema)
}

fn parse_block(type_name: &str, block: Pair<'_, Rule>) -> Result<MessageType> {
    let package = package_of(type_name);
    let mut msg_type = MessageType::new(type_name);

    for line in block.into_inner() {
        match line.as_rule() {
            Rule::field => {
                let mut inner = line.into_inner();
                let (Some(ty), Some(name)) = (inner.next(), inner.next()) else {
                    continue;
                };
                let mut field = Field::new(name.as_str(), parse_field_type(type_name, package, ty)?);
                field.default_value = inner.next().map(|v| v.as_str().trim().to_string());
                msg_type.add_field(field);
            }
            Rule::constant => {
                let mut inner = line.into_inner();
                let (Some(ty), Some(name), Some(value)) = (inner.next(), inner.next(), inner.next())
                else {
                    continue;
                };
                msg_type.constants.push(Constant {
                    name: name.as_str().to_string(),
                    type_name: ty.as_str().to_string(),
                    value: value.as_str().trim().to_string(),
                });
            }
            _ => {}
        }
    }
    Ok(msg_type)
}

fn parse_field_type(owner: &str, package: Option<&str>, pair: Pair<'_, Rule>) -> Result<FieldType> {
    let mut base = None;
    let mut array = None;

    for part in pair.into_inner() {
        match part.as_rule() {
            Rule::type_name => base = Some(resolve_type_name(part.as_str(), package)),
            // Bounded strings share the unbounded wire format.
            Rule::string_bound => {}
            Rule::array_spec => {
                let kind = match part.into_inner().next() {
                    None => ArrayKind::Unbounded,
                    Some(bound) if bound.as_rule() == Rule::upper_bound => {
                        ArrayKind::Bounded(parse_bound(owner, bound.as_str())?)
                    }
                    Some(bound) => ArrayKind::Fixed(parse_bound(owner, bound.as_str())?),
                };
                array = Some(kind);
            }
            _ => {}
        }
    }

    let base = base.ok_or_else(|| BagError::schema(owner, "field without a type"))?;
    Ok(match array {
        Some(kind) => FieldType::Array {
            element: Box::new(base),
            kind,
        },
        None => base,
    })
}

fn resolve_type_name(name: &str, package: Option<&str>) -> FieldType {
    if let Some(primitive) = PrimitiveType::try_from_str(name) {
        return FieldType::Primitive(primitive);
    }
    if name == "Header" {
        return FieldType::Nested("std_msgs/msg/Header".to_string());
    }
    FieldType::Nested(canonical_type_name(name, package))
}

fn parse_bound(owner: &str, text: &str) -> Result<usize> {
    text.trim_start_matches("<=")
        .parse()
        .map_err(|_| BagError::schema(owner, format!("invalid array bound '{text}'")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_simple_fields() {
        let schema = parse("geometry_msgs/Vector3", "float64 x\nfloat64 y\nfloat64 z\n").unwrap();
        assert_eq!(schema.name, "geometry_msgs/msg/Vector3");
        let root = schema.root().unwrap();
        assert_eq!(root.fields.len(), 3);
        assert_eq!(
            root.fields[2].field_type,
            FieldType::Primitive(PrimitiveType::Float64)
        );
    }

    #[test]
    fn test_comments_blank_lines_and_constants() {
        let text = "# Log levels\n\
                    byte DEBUG=10\n\
                    byte INFO = 20  # informational\n\
                    string PREFIX=\"a # b\"\n\
                    \n\
                    uint8 level   # severity\n\
                    string name\n";
        let schema = parse("rcl_interfaces/msg/Log", text).unwrap();
        let root = schema.root().unwrap();
        assert_eq!(root.fields.len(), 2);
        assert_eq!(root.constants.len(), 3);
        assert_eq!(root.constants[0].value, "10");
        assert_eq!(root.constants[1].name, "INFO");
        assert_eq!(root.constants[1].value, "20");
        assert_eq!(root.constants[2].value, "\"a # b\"");
    }

    #[test]
    fn test_arrays_and_bounds() {
        let text = "int32[] a\nint32[4] b\nint32[<=8] c\nstring<=16 d\nstring<=4[<=2] e";
        let schema = parse("test_msgs/msg/Arrays", text).unwrap();
        let root = schema.root().unwrap();
        let kinds: Vec<_> = root
            .fields
            .iter()
            .map(|f| match &f.field_type {
                FieldType::Array { kind, .. } => Some(*kind),
                _ => None,
            })
            .collect();
        assert_eq!(
            kinds,
            vec![
                Some(ArrayKind::Unbounded),
                Some(ArrayKind::Fixed(4)),
                Some(ArrayKind::Bounded(8)),
                None,
                Some(ArrayKind::Bounded(2)),
            ]
        );
        assert_eq!(
            root.field("d").unwrap().field_type,
            FieldType::Primitive(PrimitiveType::String)
        );
    }

    #[test]
    fn test_default_values() {
        let schema = parse("test_msgs/msg/Defaults", "int32 x 5\nstring s \"hi\"  # c\nint32[] v [1, 2]\n").unwrap();
        let root = schema.root().unwrap();
        assert_eq!(root.fields[0].default_value.as_deref(), Some("5"));
        assert_eq!(root.fields[1].default_value.as_deref(), Some("\"hi\""));
        assert_eq!(root.fields[2].default_value.as_deref(), Some("[1, 2]"));
    }

    #[test]
    fn test_nested_names_resolved_against_package() {
        let text = "Point position\nstd_msgs/Header header\nHeader other\n";
        let schema = parse("geometry_msgs/msg/PointStamped", text).unwrap();
        let deps: Vec<_> = schema.root().unwrap().dependencies().collect();
        assert_eq!(
            deps,
            vec![
                "geometry_msgs/msg/Point",
                "std_msgs/msg/Header",
                "std_msgs/msg/Header"
            ]
        );
    }

    #[test]
    fn test_concatenated_dependencies() {
        let text = "std_msgs/Header header\n\
                    geometry_msgs/Point point\n\
                    ================================================================================\n\
                    MSG: std_msgs/Header\n\
                    builtin_interfaces/Time stamp\n\
                    string frame_id\n\
                    ================================================================================\n\
                    MSG: builtin_interfaces/Time\n\
                    int32 sec\n\
                    uint32 nanosec\n\
                    ================================================================================\n\
                    MSG: geometry_msgs/Point\n\
                    float64 x\nfloat64 y\nfloat64 z\n";
        let schema = parse("geometry_msgs/msg/PointStamped", text).unwrap();
        assert_eq!(schema.types.len(), 4);
        let header = schema.get_type("std_msgs/msg/Header").unwrap();
        assert_eq!(
            header.fields[0].field_type,
            FieldType::Nested("builtin_interfaces/msg/Time".into())
        );
        assert_eq!(schema.get_type("geometry_msgs/msg/Point").unwrap().fields.len(), 3);
    }

    #[test]
    fn test_empty_definition() {
        let schema = parse("std_msgs/msg/Empty", "").unwrap();
        assert!(schema.root().unwrap().fields.is_empty());
    }

    #[test]
    fn test_syntax_error() {
        let err = parse("test_msgs/msg/Bad", "int32 [] x\n").unwrap_err();
        assert!(matches!(err, BagError::Schema { ref schema_name, .. } if schema_name == "test_msgs/msg/Bad"));
    }
}
