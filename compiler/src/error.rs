use thiserror::Error;

#[derive(Debug, Error)]
pub enum CompileError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("XML error: {0}")]
    Xml(#[from] roxmltree::Error),

    #[error("Parse error at line {line}, column {column}: {msg}")]
    ParseError {
        msg:    String,
        line:   u32,
        column: u32,
    },

    #[error("Field {field} of method {class}.{method} has unknown type or domain {type_name}")]
    UnresolvedType {
        class:     String,
        method:    String,
        field:     String,
        type_name: String,
    },

    #[error("Field {field} of method {class}.{method} declares neither a type nor a domain")]
    MissingType {
        class:  String,
        method: String,
        field:  String,
    },

    #[error("Class index {index} is used by both {first} and {second}")]
    DuplicateClassIndex {
        index:  u16,
        first:  String,
        second: String,
    },

    #[error("Method index {index} in class {class} is used by both {first} and {second}")]
    DuplicateMethodIndex {
        class:  String,
        index:  u16,
        first:  String,
        second: String,
    },

    #[error("Synchronous request {class}.{method} expects reply {reply}, which is not declared in the class")]
    MissingReply {
        class:  String,
        method: String,
        reply:  String,
    },

    #[error("Invalid identifier {0}")]
    InvalidName(String),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Lookup failed: {0}")]
    Lookup(#[from] LookupError),
}

/// Misses against the dispatch and synchronicity tables.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum LookupError {
    #[error("Unknown class {class_id}")]
    UnknownClass { class_id: u16 },

    #[error("Unknown method {method_id} in class {class_id}")]
    UnknownMethod { class_id: u16, method_id: u16 },
}
