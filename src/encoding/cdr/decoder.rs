// SPDX-FileCopyrightText: 2026 ArcheBase
//
// SPDX-License-Identifier: MulanPSL-2.0

//! Schema-driven CDR decoder.

use crate::core::{BagError, CodecValue, DecodedMessage, Result};
use crate::encoding::registry::MessageDecoder;
use crate::schema::{ArrayKind, FieldType, MessageSchema, PrimitiveType};

use super::cursor::CdrCursor;

/// Nesting depth at which a schema is assumed to be self-referential.
const MAX_NESTING_DEPTH: usize = 64;

/// Decodes CDR payloads of one resolved message type.
#[derive(Debug, Clone)]
pub struct CdrDecoder {
    schema: MessageSchema,
}

impl CdrDecoder {
    /// The schema must contain its root type and every nested type.
    pub fn new(schema: MessageSchema) -> Result<Self> {
        if schema.root().is_none() {
            return Err(BagError::unknown_type(&schema.name));
        }
        Ok(Self { schema })
    }

    pub fn schema(&self) -> &MessageSchema {
        &self.schema
    }

    pub fn decode_message(&self, data: &[u8]) -> Result<DecodedMessage> {
        let mut cursor = CdrCursor::new(data, &self.schema.name)?;
        self.decode_struct(&mut cursor, &self.schema.name, 0)
    }

    fn decode_struct(
        &self,
        cursor: &mut CdrCursor<'_>,
        type_name: &str,
        depth: usize,
    ) -> Result<DecodedMessage> {
        if depth > MAX_NESTING_DEPTH {
            return Err(cursor.error(format!("'{type_name}' nests deeper than {MAX_NESTING_DEPTH}")));
        }
        let msg_type = self
            .schema
            .get_type(type_name)
            .ok_or_else(|| BagError::unknown_type(type_name))?;

        let mut message = DecodedMessage::new();
        if msg_type.fields.is_empty() {
            // Empty messages carry one placeholder octet on the wire.
            cursor.read_u8()?;
            return Ok(message);
        }
        for field in &msg_type.fields {
            let value = self.decode_field(cursor, &field.field_type, depth)?;
            message.insert(field.name.clone(), value);
        }
        Ok(message)
    }

    fn decode_field(
        &self,
        cursor: &mut CdrCursor<'_>,
        field_type: &FieldType,
        depth: usize,
    ) -> Result<CodecValue> {
        match field_type {
            FieldType::Primitive(primitive) => decode_primitive(cursor, *primitive),
            FieldType::Nested(name) => Ok(CodecValue::Struct(self.decode_struct(
                cursor,
                name,
                depth + 1,
            )?)),
            FieldType::Array { element, kind } => {
                let octets = matches!(element.as_ref(), FieldType::Primitive(p) if p.is_octet());
                let min_size = min_wire_size(element).max(1);
                let len = match kind {
                    ArrayKind::Fixed(n) => *n,
                    ArrayKind::Unbounded => cursor.read_length(min_size)?,
                    ArrayKind::Bounded(bound) => {
                        let len = cursor.read_length(min_size)?;
                        if len > *bound {
                            return Err(cursor.error(format!(
                                "sequence length {len} exceeds bound {bound}"
                            )));
                        }
                        len
                    }
                };

                if octets {
                    return Ok(CodecValue::Bytes(cursor.read_bytes(len)?.to_vec()));
                }
                let mut items = Vec::with_capacity(len.min(cursor.remaining()));
                for _ in 0..len {
                    items.push(self.decode_field(cursor, element, depth)?);
                }
                Ok(CodecValue::Array(items))
            }
        }
    }
}

/// Fewest bytes one value of `field_type` can occupy, ignoring padding.
///
/// Bounds sequence lengths against the remaining payload.
fn min_wire_size(field_type: &FieldType) -> usize {
    match field_type {
        // Strings are at least their u32 length prefix.
        FieldType::Primitive(primitive) => primitive.alignment(),
        FieldType::Nested(_) => 1,
        FieldType::Array {
            kind: ArrayKind::Fixed(n),
            element,
        } => n.saturating_mul(min_wire_size(element)),
        FieldType::Array { .. } => 4,
    }
}

fn decode_primitive(cursor: &mut CdrCursor<'_>, primitive: PrimitiveType) -> Result<CodecValue> {
    Ok(match primitive {
        PrimitiveType::Bool => CodecValue::Bool(cursor.read_bool()?),
        PrimitiveType::Byte | PrimitiveType::Char | PrimitiveType::UInt8 => {
            CodecValue::UInt8(cursor.read_u8()?)
        }
        PrimitiveType::Int8 => CodecValue::Int8(cursor.read_i8()?),
        PrimitiveType::Int16 => CodecValue::Int16(cursor.read_i16()?),
        PrimitiveType::UInt16 => CodecValue::UInt16(cursor.read_u16()?),
        PrimitiveType::Int32 => CodecValue::Int32(cursor.read_i32()?),
        PrimitiveType::UInt32 => CodecValue::UInt32(cursor.read_u32()?),
        PrimitiveType::Int64 => CodecValue::Int64(cursor.read_i64()?),
        PrimitiveType::UInt64 => CodecValue::UInt64(cursor.read_u64()?),
        PrimitiveType::Float32 => CodecValue::Float32(cursor.read_f32()?),
        PrimitiveType::Float64 => CodecValue::Float64(cursor.read_f64()?),
        PrimitiveType::String => CodecValue::String(cursor.read_string()?),
        PrimitiveType::WString => return Err(cursor.error("wstring fields are not supported")),
    })
}

impl MessageDecoder for CdrDecoder {
    fn decode(&self, data: &[u8]) -> Result<DecodedMessage> {
        self.decode_message(data)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::schema::parser::parse;

    fn decoder(name: &str, text: &str) -> CdrDecoder {
        CdrDecoder::new(parse(name, text).unwrap()).unwrap()
    }

    fn le(body: &[u8]) -> Vec<u8> {
        let mut data = vec![0x00, 0x01, 0x00, 0x00];
        data.extend_from_slice(body);
        data
    }

    #[test]
    fn test_decode_nested_with_alignment() {
        let decoder = decoder(
            "test_msgs/msg/Stamped",
            "uint8 flag\nbuiltin_interfaces/Time stamp\nfloat64 value\n\
             ===\nMSG: builtin_interfaces/Time\nint32 sec\nuint32 nanosec\n",
        );
        let mut body = vec![1, 0, 0, 0];
        body.extend_from_slice(&5i32.to_le_bytes());
        body.extend_from_slice(&6u32.to_le_bytes());
        body.extend_from_slice(&[0; 4]);
        body.extend_from_slice(&2.5f64.to_le_bytes());

        let msg = decoder.decode_message(&le(&body)).unwrap();
        assert_eq!(msg["flag"], CodecValue::UInt8(1));
        assert_eq!(msg["value"], CodecValue::Float64(2.5));
        let stamp = msg["stamp"].as_struct().unwrap();
        assert_eq!(stamp["sec"], CodecValue::Int32(5));
        assert_eq!(stamp["nanosec"], CodecValue::UInt32(6));
    }

    #[test]
    fn test_decode_sequences() {
        let decoder = decoder(
            "test_msgs/msg/Arrays",
            "uint8[] raw\nint16[2] pair\nstring[<=2] names\n",
        );
        let mut body = vec![3, 0, 0, 0, 9, 8, 7, 0];
        body.extend_from_slice(&[1, 0, 2, 0]);
        body.extend_from_slice(&[1, 0, 0, 0, 2, 0, 0, 0, b'a', 0]);

        let msg = decoder.decode_message(&le(&body)).unwrap();
        assert_eq!(msg["raw"], CodecValue::Bytes(vec![9, 8, 7]));
        assert_eq!(
            msg["pair"],
            CodecValue::Array(vec![CodecValue::Int16(1), CodecValue::Int16(2)])
        );
        assert_eq!(
            msg["names"],
            CodecValue::Array(vec![CodecValue::String("a".into())])
        );
    }

    #[test]
    fn test_bounded_sequence_overflow() {
        let decoder = decoder("test_msgs/msg/Bounded", "int32[<=1] values\n");
        let mut body = vec![2, 0, 0, 0];
        body.extend_from_slice(&[0; 8]);
        let err = decoder.decode_message(&le(&body)).unwrap_err();
        assert!(err.to_string().contains("exceeds bound 1"));
    }

    #[test]
    fn test_empty_message() {
        let decoder = decoder("std_msgs/msg/Empty", "");
        assert!(decoder.decode_message(&le(&[0])).unwrap().is_empty());
        assert!(matches!(
            decoder.decode_message(&le(&[])),
            Err(BagError::Decode { .. })
        ));
    }

    #[test]
    fn test_sequence_of_empty_structs_bounded_by_payload() {
        let decoder = decoder(
            "test_msgs/msg/Many",
            "Empty[] items\n===\nMSG: test_msgs/Empty\n",
        );
        let err = decoder
            .decode_message(&le(&20_000_000u32.to_le_bytes()))
            .unwrap_err();
        assert!(err.to_string().contains("exceeds the 0 bytes remaining"));

        let err = decoder
            .decode_message(&le(&[0xff, 0xff, 0xff, 0xff, 0, 0, 0, 0]))
            .unwrap_err();
        assert!(matches!(err, BagError::Decode { .. }));

        let msg = decoder.decode_message(&le(&[2, 0, 0, 0, 0, 0])).unwrap();
        assert_eq!(
            msg["items"],
            CodecValue::Array(vec![
                CodecValue::Struct(DecodedMessage::new()),
                CodecValue::Struct(DecodedMessage::new()),
            ])
        );
    }

    #[test]
    fn test_min_wire_size() {
        assert_eq!(min_wire_size(&FieldType::Primitive(PrimitiveType::Float64)), 8);
        assert_eq!(min_wire_size(&FieldType::Primitive(PrimitiveType::String)), 4);
        assert_eq!(min_wire_size(&FieldType::Nested("p/msg/T".into())), 1);
        assert_eq!(
            min_wire_size(&FieldType::Array {
                element: Box::new(FieldType::Primitive(PrimitiveType::Int16)),
                kind: ArrayKind::Fixed(3),
            }),
            6
        );
        assert_eq!(
            min_wire_size(&FieldType::Array {
                element: Box::new(FieldType::Primitive(PrimitiveType::Int16)),
                kind: ArrayKind::Unbounded,
            }),
            4
        );
    }

    #[test]
    fn test_truncated_payload() {
        let decoder = decoder("std_msgs/msg/String", "string data\n");
        let err = decoder.decode_message(&le(&[10, 0, 0, 0, b'x'])).unwrap_err();
        assert!(matches!(err, BagError::Decode { .. }));
    }

    #[test]
    fn test_missing_root_type() {
        let schema = MessageSchema::new("pkg/msg/Missing");
        assert!(matches!(
            CdrDecoder::new(schema),
            Err(BagError::UnknownMessageType { .. })
        ));
    }

    #[test]
    fn test_wstring_unsupported() {
        let decoder = decoder("test_msgs/msg/Wide", "wstring text\n");
        assert!(decoder.decode_message(&le(&[0, 0, 0, 0])).is_err());
    }
}
