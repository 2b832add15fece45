use thiserror::Error;

/// Failures while reading or writing wire primitives.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum WireError {
    #[error("Unexpected end of payload: needed {needed} bytes, {remaining} remaining")]
    UnexpectedEof { needed: usize, remaining: usize },

    /// Decode finished with bytes left over; the method layout does not match the payload.
    #[error("{remaining} trailing bytes after the last field")]
    TrailingBytes { remaining: usize },

    #[error("String is not valid UTF-8")]
    InvalidUtf8,

    #[error("String of {len} bytes exceeds the maximum of {max}")]
    StringTooLong { len: usize, max: usize },

    #[error("Unknown field value tag {0:#04x}")]
    InvalidFieldType(u8),

    #[error("Expected frame end 0xce but found {0:#04x}")]
    InvalidFrameEnd(u8),

    #[error("Field tables nested deeper than {max} levels")]
    NestingTooDeep { max: usize },
}

/// Errors surfaced by generated dispatch, request and response routines.
#[derive(Debug, Error)]
pub enum ProtocolError {
    #[error("Unknown class {class_id}")]
    UnknownClass { class_id: u16 },

    #[error("Unknown method {method_id} in class {class_id}")]
    UnknownMethod { class_id: u16, method_id: u16 },

    #[error("No handler bound for method {method_id} in class {class_id}")]
    MethodNotImplemented { class_id: u16, method_id: u16 },

    #[error("Expected a method frame but received frame type {frame_type}")]
    UnexpectedFrame { frame_type: u8 },

    #[error("Connection closed")]
    Closed,

    #[error("Wire error: {0}")]
    Wire(#[from] WireError),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}
