use std::fmt;

use crate::{
    buffer::{WireReader, WireWriter},
    error::WireError,
};

/// Most tables and arrays a decoder will open, counting the outermost table.
/// Decoding recurses once per level, so a peer must not choose the depth.
pub const MAX_NESTING_DEPTH: usize = 64;

/// A single value inside a field table or field array.
///
/// Tags follow the AMQP 0-9-1 errata used by the common brokers, where `s`
/// is a signed 16-bit integer rather than a short string.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldValue {
    Bool(bool),
    I8(i8),
    U8(u8),
    I16(i16),
    U16(u16),
    I32(i32),
    U32(u32),
    I64(i64),
    F32(f32),
    F64(f64),
    Decimal { scale: u8, value: u32 },
    LongString(String),
    Bytes(Vec<u8>),
    Array(Vec<FieldValue>),
    Timestamp(u64),
    Table(Table),
    Void,
}

impl FieldValue {
    pub fn tag(&self) -> u8 {
        match self {
            FieldValue::Bool(_) => b't',
            FieldValue::I8(_) => b'b',
            FieldValue::U8(_) => b'B',
            FieldValue::I16(_) => b's',
            FieldValue::U16(_) => b'u',
            FieldValue::I32(_) => b'I',
            FieldValue::U32(_) => b'i',
            FieldValue::I64(_) => b'l',
            FieldValue::F32(_) => b'f',
            FieldValue::F64(_) => b'd',
            FieldValue::Decimal { .. } => b'D',
            FieldValue::LongString(_) => b'S',
            FieldValue::Bytes(_) => b'x',
            FieldValue::Array(_) => b'A',
            FieldValue::Timestamp(_) => b'T',
            FieldValue::Table(_) => b'F',
            FieldValue::Void => b'V',
        }
    }

    /// A convenience method to extract the value out of a [Bool](#variant.Bool).
    /// Returns `false` for other value kinds.
    pub fn as_bool(&self) -> bool {
        matches!(self, FieldValue::Bool(true))
    }

    /// A convenience method to extract the value out of a [LongString](#variant.LongString).
    /// Returns `""` for other value kinds.
    pub fn as_str(&self) -> &str {
        match self {
            FieldValue::LongString(value) => value.as_str(),
            _ => "",
        }
    }

    /// A convenience method to get the nested table out of a [Table](#variant.Table).
    pub fn as_table(&self) -> Option<&Table> {
        match self {
            FieldValue::Table(table) => Some(table),
            _ => None,
        }
    }

    /// `depth` is the nesting level of the table or array holding the value.
    fn decode(rx: &mut WireReader, depth: usize) -> Result<FieldValue, WireError> {
        let tag = rx.read_u8()?;
        Ok(match tag {
            b't' => FieldValue::Bool(rx.read_u8()? != 0),
            b'b' => FieldValue::I8(rx.read_i8()?),
            b'B' => FieldValue::U8(rx.read_u8()?),
            b's' => FieldValue::I16(rx.read_i16()?),
            b'u' => FieldValue::U16(rx.read_u16()?),
            b'I' => FieldValue::I32(rx.read_i32()?),
            b'i' => FieldValue::U32(rx.read_u32()?),
            b'l' => FieldValue::I64(rx.read_i64()?),
            b'f' => FieldValue::F32(rx.read_f32()?),
            b'd' => FieldValue::F64(rx.read_f64()?),
            b'D' => FieldValue::Decimal {
                scale: rx.read_u8()?,
                value: rx.read_u32()?,
            },
            b'S' => FieldValue::LongString(rx.read_long_string()?.to_string()),
            b'x' => FieldValue::Bytes(rx.read_long_bytes()?.to_vec()),
            b'A' => {
                check_depth(depth + 1)?;
                let bytes = rx.read_long_bytes()?;
                let mut items = WireReader::new(bytes);
                let mut values = Vec::new();
                while items.remaining() > 0 {
                    values.push(FieldValue::decode(&mut items, depth + 1)?);
                }
                FieldValue::Array(values)
            }
            b'T' => FieldValue::Timestamp(rx.read_u64()?),
            b'F' => {
                let bytes = rx.read_long_bytes()?;
                FieldValue::Table(Table::decode_nested(&mut WireReader::new(bytes), depth + 1)?)
            }
            b'V' => FieldValue::Void,
            other => return Err(WireError::InvalidFieldType(other)),
        })
    }

    fn encode(&self, tx: &mut WireWriter) -> Result<(), WireError> {
        tx.write_u8(self.tag());
        match self {
            FieldValue::Bool(value) => tx.write_u8(*value as u8),
            FieldValue::I8(value) => tx.write_i8(*value),
            FieldValue::U8(value) => tx.write_u8(*value),
            FieldValue::I16(value) => tx.write_i16(*value),
            FieldValue::U16(value) => tx.write_u16(*value),
            FieldValue::I32(value) => tx.write_i32(*value),
            FieldValue::U32(value) => tx.write_u32(*value),
            FieldValue::I64(value) => tx.write_i64(*value),
            FieldValue::F32(value) => tx.write_f32(*value),
            FieldValue::F64(value) => tx.write_f64(*value),
            FieldValue::Decimal { scale, value } => {
                tx.write_u8(*scale);
                tx.write_u32(*value);
            }
            FieldValue::LongString(value) => tx.write_long_string(value)?,
            FieldValue::Bytes(value) => tx.write_long_bytes(value)?,
            FieldValue::Array(values) => {
                let mut items = WireWriter::new();
                for value in values {
                    value.encode(&mut items)?;
                }
                tx.write_long_bytes(items.extent())?;
            }
            FieldValue::Timestamp(value) => tx.write_u64(*value),
            FieldValue::Table(table) => tx.write_table(Some(table))?,
            FieldValue::Void => {}
        }
        Ok(())
    }
}

impl From<bool> for FieldValue {
    fn from(value: bool) -> Self {
        FieldValue::Bool(value)
    }
}

impl From<&str> for FieldValue {
    fn from(value: &str) -> Self {
        FieldValue::LongString(value.to_string())
    }
}

impl From<String> for FieldValue {
    fn from(value: String) -> Self {
        FieldValue::LongString(value)
    }
}

impl From<Table> for FieldValue {
    fn from(value: Table) -> Self {
        FieldValue::Table(value)
    }
}

/// An AMQP field table: short-string keys mapped to tagged values.
///
/// Entry order is preserved so that a decoded table re-encodes to the same
/// bytes. Inserting an existing key replaces its value in place.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    entries: Vec<(String, FieldValue)>,
}

impl Table {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<FieldValue>) {
        let key = key.into();
        let value = value.into();
        match self.entries.iter_mut().find(|(k, _)| *k == key) {
            Some(entry) => entry.1 = value,
            None => self.entries.push((key, value)),
        }
    }

    pub fn get(&self, key: &str) -> Option<&FieldValue> {
        self.entries.iter().find(|(k, _)| k == key).map(|(_, v)| v)
    }

    pub fn remove(&mut self, key: &str) -> Option<FieldValue> {
        let position = self.entries.iter().position(|(k, _)| k == key)?;
        Some(self.entries.remove(position).1)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FieldValue)> {
        self.entries.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Decode table entries until the reader is exhausted. The caller is
    /// expected to have bounded the reader by the table's length prefix.
    ///
    /// Fails with [WireError::NestingTooDeep] once tables and arrays are
    /// nested more than [MAX_NESTING_DEPTH] levels.
    pub fn decode(rx: &mut WireReader) -> Result<Table, WireError> {
        Table::decode_nested(rx, 1)
    }

    fn decode_nested(rx: &mut WireReader, depth: usize) -> Result<Table, WireError> {
        check_depth(depth)?;
        let mut table = Table::new();
        while rx.remaining() > 0 {
            let key = rx.read_short_string()?.to_string();
            let value = FieldValue::decode(rx, depth)?;
            table.entries.push((key, value));
        }
        Ok(table)
    }

    /// Encode the entries without the outer length prefix.
    pub fn encode(&self, tx: &mut WireWriter) -> Result<(), WireError> {
        for (key, value) in &self.entries {
            tx.write_short_string(key)?;
            value.encode(tx)?;
        }
        Ok(())
    }
}

fn check_depth(depth: usize) -> Result<(), WireError> {
    if depth > MAX_NESTING_DEPTH {
        Err(WireError::NestingTooDeep { max: MAX_NESTING_DEPTH })
    } else {
        Ok(())
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (key, value)) in self.entries.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            write!(f, "{}: {:?}", key, value)?;
        }
        write!(f, "}}")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_table_insert_replaces_in_place() {
        let mut table = Table::new();
        table.insert("product", "amqp-gen");
        table.insert("copy", false);
        table.insert("product", "other");
        assert_eq!(table.len(), 2);
        assert_eq!(table.get("product").map(FieldValue::as_str), Some("other"));
        assert_eq!(table.iter().next().map(|(k, _)| k), Some("product"));
    }

    #[test]
    fn test_nested_table_survives_the_wire() {
        let mut capabilities = Table::new();
        capabilities.insert("publisher_confirms", true);
        capabilities.insert("consumer_priorities", true);

        let mut table = Table::new();
        table.insert("capabilities", capabilities.clone());
        table.insert("x-max-length", FieldValue::I64(10_000));
        table.insert("x-args", FieldValue::Array(vec![FieldValue::U8(1), FieldValue::Void]));
        table.insert("stamp", FieldValue::Timestamp(1_700_000_000));
        table.insert("price", FieldValue::Decimal { scale: 2, value: 1999 });

        let mut tx = WireWriter::new();
        tx.write_table(Some(&table)).unwrap();

        let mut rx = WireReader::new(tx.extent());
        let decoded = rx.read_table().unwrap();
        rx.expect_eof().unwrap();
        assert_eq!(decoded, table);
        assert_eq!(
            decoded.get("capabilities").and_then(FieldValue::as_table),
            Some(&capabilities)
        );
    }

    #[test]
    fn test_unknown_tag_is_rejected() {
        let bytes = [0, 0, 0, 3, 1, b'k', b'?'];
        let err = WireReader::new(&bytes).read_table().unwrap_err();
        assert_eq!(err, WireError::InvalidFieldType(b'?'));
    }

    /// `table` inside `levels` enclosing tables.
    fn wrap(mut table: Table, levels: usize) -> Table {
        for _ in 0..levels {
            let mut outer = Table::new();
            outer.insert("t", table);
            table = outer;
        }
        table
    }

    fn round_trip(table: &Table) -> Result<Table, WireError> {
        let mut tx = WireWriter::new();
        tx.write_table(Some(table))?;
        WireReader::new(tx.extent()).read_table()
    }

    #[test]
    fn test_nesting_limit() {
        let deepest = wrap(Table::new(), MAX_NESTING_DEPTH - 1);
        assert_eq!(round_trip(&deepest), Ok(deepest.clone()));

        let too_deep = wrap(Table::new(), MAX_NESTING_DEPTH);
        assert_eq!(round_trip(&too_deep), Err(WireError::NestingTooDeep { max: MAX_NESTING_DEPTH }));

        // an array is a level too
        let mut leaf = Table::new();
        leaf.insert("a", FieldValue::Array(vec![FieldValue::Void]));
        assert!(round_trip(&wrap(leaf.clone(), MAX_NESTING_DEPTH - 2)).is_ok());
        assert_eq!(
            round_trip(&wrap(leaf, MAX_NESTING_DEPTH - 1)),
            Err(WireError::NestingTooDeep { max: MAX_NESTING_DEPTH })
        );
    }

    #[test]
    fn test_hostile_nesting_fails_without_recursing_to_the_bottom() {
        // 100k tables, each holding only the next one
        let levels: usize = 100_000;
        let mut bytes = Vec::with_capacity(levels * 7);
        for level in 0..levels {
            let body_len = 7 * (levels - 1 - level) as u32;
            bytes.extend_from_slice(&body_len.to_be_bytes());
            if level + 1 < levels {
                bytes.extend_from_slice(&[1, b't', b'F']);
            }
        }
        assert_eq!(
            WireReader::new(&bytes).read_table(),
            Err(WireError::NestingTooDeep { max: MAX_NESTING_DEPTH })
        );
    }

    #[test]
    fn test_signed_short_uses_s_tag() {
        let mut table = Table::new();
        table.insert("n", FieldValue::I16(-2));
        let mut tx = WireWriter::new();
        table.encode(&mut tx).unwrap();
        assert_eq!(tx.extent(), &[1, b'n', b's', 0xff, 0xfe]);
    }
}
