use std::collections::HashMap;

use lazy_static::lazy_static;
use serde::Serialize;

use crate::{
    error::CompileError,
    types::{ClassDef, FieldDef, MethodDef},
};

/// Wire codec a field resolves to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum WireType {
    Octet,
    Short,
    Long,
    LongLong,
    Bit,
    ShortStr,
    LongStr,
    Table,
}

/// How a decoded value is handed to application code.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ValueKind {
    Scalar,
    /// Bit-packed with neighbouring flags.
    Flag,
    String,
    /// Passed by mutable reference; optional on encode.
    Reference,
}

lazy_static! {
    /// Every type and domain name a field may use. Anything else fails generation.
    static ref TYPE_TABLE: HashMap<&'static str, WireType> = {
        let mut m = HashMap::new();
        m.insert("octet",          WireType::Octet);
        m.insert("longlong",       WireType::LongLong);
        m.insert("delivery-tag",   WireType::LongLong);
        m.insert("long",           WireType::Long);
        m.insert("message-count",  WireType::Long);
        m.insert("short",          WireType::Short);
        m.insert("class-id",       WireType::Short);
        m.insert("method-id",      WireType::Short);
        m.insert("reply-code",     WireType::Short);
        m.insert("bit",            WireType::Bit);
        m.insert("no-ack",         WireType::Bit);
        m.insert("no-local",       WireType::Bit);
        m.insert("no-wait",        WireType::Bit);
        m.insert("redelivered",    WireType::Bit);
        m.insert("queue-name",     WireType::ShortStr);
        m.insert("exchange-name",  WireType::ShortStr);
        m.insert("consumer-tag",   WireType::ShortStr);
        m.insert("reply-text",     WireType::ShortStr);
        m.insert("path",           WireType::ShortStr);
        m.insert("shortstr",       WireType::ShortStr);
        m.insert("longstr",        WireType::LongStr);
        m.insert("peer-properties", WireType::Table);
        m.insert("table",          WireType::Table);
        m
    };
}

impl WireType {
    pub fn from_name(name: &str) -> Option<WireType> {
        TYPE_TABLE.get(name).copied()
    }

    pub fn kind(self) -> ValueKind {
        match self {
            WireType::Octet | WireType::Short | WireType::Long | WireType::LongLong => ValueKind::Scalar,
            WireType::Bit => ValueKind::Flag,
            WireType::ShortStr | WireType::LongStr => ValueKind::String,
            WireType::Table => ValueKind::Reference,
        }
    }

    pub fn is_flag(self) -> bool {
        self.kind() == ValueKind::Flag
    }

    /// Reader method. Flags are never read individually; the packer reads
    /// their backing byte with `read_u8`.
    pub fn read_op(self) -> &'static str {
        match self {
            WireType::Octet | WireType::Bit => "read_u8",
            WireType::Short    => "read_u16",
            WireType::Long     => "read_u32",
            WireType::LongLong => "read_u64",
            WireType::ShortStr => "read_short_string",
            WireType::LongStr  => "read_long_string",
            WireType::Table    => "read_table",
        }
    }

    /// Writer method. Writes returning `Result` are marked by [WireType::write_is_fallible].
    pub fn write_op(self) -> &'static str {
        match self {
            WireType::Octet | WireType::Bit => "write_u8",
            WireType::Short    => "write_u16",
            WireType::Long     => "write_u32",
            WireType::LongLong => "write_u64",
            WireType::ShortStr => "write_short_string",
            WireType::LongStr  => "write_long_string",
            WireType::Table    => "write_table",
        }
    }

    pub fn write_is_fallible(self) -> bool {
        matches!(self, WireType::ShortStr | WireType::LongStr | WireType::Table)
    }

    /// Argument type of generated encode functions.
    pub fn arg_type(self) -> &'static str {
        match self {
            WireType::Octet    => "u8",
            WireType::Short    => "u16",
            WireType::Long     => "u32",
            WireType::LongLong => "u64",
            WireType::Bit      => "bool",
            WireType::ShortStr | WireType::LongStr => "&str",
            WireType::Table    => "Option<&rt::Table>",
        }
    }

    /// Argument type handed to bound handlers after decode.
    pub fn handler_type(self) -> &'static str {
        match self {
            WireType::Table => "&mut rt::Table",
            other           => other.arg_type(),
        }
    }

    /// Literal written in place of a reserved field.
    pub fn reserved_default(self) -> &'static str {
        match self {
            WireType::Octet | WireType::Short | WireType::Long | WireType::LongLong => "0",
            WireType::Bit      => "false",
            WireType::ShortStr | WireType::LongStr => "\"\"",
            WireType::Table    => "None",
        }
    }
}

/// A field paired with its resolved codec.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ResolvedField {
    pub name:      String,
    pub wire_type: WireType,
    pub reserved:  bool,
}

/// Resolve one field, naming the field and method on failure.
pub fn resolve_field(class: &ClassDef, method: &MethodDef, field: &FieldDef) -> Result<ResolvedField, CompileError> {
    let type_name = field.type_name().ok_or_else(|| CompileError::MissingType {
        class:  class.name.clone(),
        method: method.name.clone(),
        field:  field.name.clone(),
    })?;

    let wire_type = WireType::from_name(type_name).ok_or_else(|| CompileError::UnresolvedType {
        class:     class.name.clone(),
        method:    method.name.clone(),
        field:     field.name.clone(),
        type_name: type_name.to_string(),
    })?;

    Ok(ResolvedField {
        name:     field.name.clone(),
        wire_type,
        reserved: field.reserved,
    })
}

pub fn resolve_method(class: &ClassDef, method: &MethodDef) -> Result<Vec<ResolvedField>, CompileError> {
    method
        .fields
        .iter()
        .map(|field| resolve_field(class, method, field))
        .collect()
}
