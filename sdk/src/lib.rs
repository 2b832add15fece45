//! amqp-gen
//!
//! Entry point for build scripts and tools that turn an AMQP-style protocol
//! schema into Rust.
//!
//! - `generate_from_path` / `write_generated` for `build.rs` use
//! - `protocol_to_json` to inspect what the parser saw
//! - the compiler and wire runtime, re-exported

use std::fs;
use std::path::Path;

pub use amqp_gen_compiler::error::{CompileError, LookupError};
pub use amqp_gen_compiler::{compile_protocol, parse_protocol, Backend, DispatchTable, Protocol, RustBackend};

/// Read the schema at `path` and return the generated Rust source.
pub fn generate_from_path(path: impl AsRef<Path>) -> Result<String, CompileError> {
    let (_protocol, code) = amqp_gen_compiler::compile_protocol_file(path)?;
    Ok(code)
}

/// Generate from `schema` and write the result to `out`. The file is only
/// written when generation succeeds.
pub fn write_generated(schema: impl AsRef<Path>, out: impl AsRef<Path>) -> Result<(), CompileError> {
    let code = generate_from_path(schema.as_ref())?;
    fs::write(out.as_ref(), code)?;
    tracing::debug!(schema = %schema.as_ref().display(), out = %out.as_ref().display(), "wrote generated code");
    Ok(())
}

/// Parse and verify a schema document, then pretty-print its model as JSON.
pub fn protocol_to_json(text: &str) -> Result<String, CompileError> {
    let protocol = parse_protocol(text)?;
    amqp_gen_compiler::verifier::verify_protocol(&protocol)?;
    Ok(serde_json::to_string_pretty(&protocol)?)
}

pub mod wire {
    pub use amqp_gen_wire::*;
}

pub mod compiler {
    pub use amqp_gen_compiler::*;
}
