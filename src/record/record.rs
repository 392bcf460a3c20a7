use std::fmt;

use crate::common::{DataType, DbError, Result, Rid};

use super::Schema;

/// Tombstone byte of an occupied slot.
pub const SLOT_OCCUPIED: u8 = b'+';

/// Tombstone byte of an empty slot.
pub const SLOT_EMPTY: u8 = b'-';

/// A typed attribute value.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i32),
    Float(f32),
    Bool(bool),
    String(String),
}

impl Value {
    pub fn data_type(&self) -> DataType {
        match self {
            Value::Int(_) => DataType::Int,
            Value::Float(_) => DataType::Float,
            Value::Bool(_) => DataType::Bool,
            Value::String(_) => DataType::String,
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{v}"),
            Value::Float(v) => write!(f, "{v}"),
            Value::Bool(v) => write!(f, "{v}"),
            Value::String(v) => write!(f, "{v}"),
        }
    }
}

/// A fixed-size tuple: one tombstone byte followed by the encoded
/// attributes in schema order. `id` is where the tuple lives inside its
/// table, or `Rid::INVALID` before insertion.
#[derive(Debug, Clone, PartialEq)]
pub struct Record {
    pub id: Rid,
    data: Vec<u8>,
}

impl Record {
    /// A blank record sized for the schema, marked empty.
    pub fn new(schema: &Schema) -> Record {
        let mut data = vec![0u8; schema.record_size()];
        data[0] = SLOT_EMPTY;
        Record {
            id: Rid::INVALID,
            data,
        }
    }

    pub(crate) fn from_raw(id: Rid, data: Vec<u8>) -> Record {
        Record { id, data }
    }

    pub fn data(&self) -> &[u8] {
        &self.data
    }

    pub fn tombstone(&self) -> u8 {
        self.data[0]
    }

    /// Decodes attribute `index` of this record.
    pub fn get_attr(&self, schema: &Schema, index: usize) -> Result<Value> {
        let attr = schema
            .attribute(index)
            .ok_or(DbError::InvalidParameter("attribute index out of range"))?;
        let off = schema.attribute_offset(index)?;
        let bytes = &self.data[off..off + attr.size()];

        Ok(match attr.data_type() {
            DataType::Int => Value::Int(i32::from_ne_bytes(bytes.try_into().unwrap())),
            DataType::Float => Value::Float(f32::from_ne_bytes(bytes.try_into().unwrap())),
            DataType::Bool => Value::Bool(bytes[0] != 0),
            DataType::String => {
                // stored unterminated at the declared length; a shorter
                // value is padded with zero bytes
                let end = bytes.iter().position(|&b| b == 0).unwrap_or(bytes.len());
                Value::String(String::from_utf8_lossy(&bytes[..end]).into_owned())
            }
        })
    }

    /// Encodes `value` into attribute `index` of this record.
    pub fn set_attr(&mut self, schema: &Schema, index: usize, value: &Value) -> Result<()> {
        let attr = schema
            .attribute(index)
            .ok_or(DbError::InvalidParameter("attribute index out of range"))?;
        if value.data_type() != attr.data_type() {
            return Err(DbError::TypeMismatch {
                left: attr.data_type(),
                right: value.data_type(),
            });
        }

        let off = schema.attribute_offset(index)?;
        match value {
            Value::Int(v) => self.data[off..off + 4].copy_from_slice(&v.to_ne_bytes()),
            Value::Float(v) => self.data[off..off + 4].copy_from_slice(&v.to_ne_bytes()),
            Value::Bool(v) => self.data[off] = *v as u8,
            Value::String(s) => {
                if s.len() > attr.length() {
                    return Err(DbError::InvalidParameter(
                        "string value longer than the attribute length",
                    ));
                }
                let field = &mut self.data[off..off + attr.length()];
                field[..s.len()].copy_from_slice(s.as_bytes());
                field[s.len()..].fill(0);
            }
        }
        Ok(())
    }
}
