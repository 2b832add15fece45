//! amqp-gen-compiler
//!
//! This crate implements:
//!  1) A parser for AMQP-style protocol documents (`parse_protocol` → [Protocol]),
//!  2) A verifier (duplicate indices, unresolvable field types, missing replies, bad names),
//!  3) The type resolver, bitfield packer and method classifier,
//!  4) Dispatch/synchronicity table planning (`DispatchTable`),
//!  5) Code generation through a [Backend] (`compile_protocol` → `String`),
//!  6) Error types (`CompileError`, `LookupError`).

pub mod error;
pub mod types;
pub mod utils;
pub mod parser;
pub mod verifier;
pub mod resolver;
pub mod bitfield;
pub mod classify;
pub mod dispatch;
pub mod compiler;
pub mod gen_rust;
pub mod traits;

pub use compiler::compile_protocol;
pub use compiler::compile_protocol_file;
pub use compiler::compile_protocol_with;
pub use dispatch::DispatchTable;
pub use gen_rust::{compile_protocol_to_rust, RustBackend};
pub use parser::parse_protocol;
pub use traits::Backend;
pub use types::Protocol;
