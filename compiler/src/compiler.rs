use std::fs;
use std::path::Path;

use crate::{
    dispatch::DispatchTable,
    error::CompileError,
    gen_rust::RustBackend,
    parser::parse_protocol,
    traits::Backend,
    types::Protocol,
    verifier::verify_protocol,
};

/// Compile a protocol document into `(Protocol, String)` with the default
/// Rust backend. Returns `Err(CompileError)` if parsing, verification or
/// planning fails; nothing is emitted in that case.
pub fn compile_protocol(text: &str) -> Result<(Protocol, String), CompileError> {
    compile_protocol_with(text, &RustBackend::default())
}

/// Same as [compile_protocol], rendering through `backend`.
pub fn compile_protocol_with(text: &str, backend: &dyn Backend) -> Result<(Protocol, String), CompileError> {
    let protocol = parse_protocol(text)?;
    verify_protocol(&protocol)?;
    let code = {
        let table = DispatchTable::build(&protocol)?;
        tracing::info!(
            constants = protocol.constants.len(),
            classes = protocol.classes.len(),
            methods = table.len(),
            "compiled protocol"
        );
        backend.render(&protocol, &table)
    };
    Ok((protocol, code))
}

/// Read and compile the document at `path`.
pub fn compile_protocol_file(path: impl AsRef<Path>) -> Result<(Protocol, String), CompileError> {
    let text = fs::read_to_string(path)?;
    compile_protocol(&text)
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Summary;

    impl Backend for Summary {
        fn render(&self, _protocol: &Protocol, table: &DispatchTable) -> String {
            table
                .keys()
                .map(|(class_id, method_id)| format!("{}.{}", class_id, method_id))
                .collect::<Vec<_>>()
                .join(",")
        }
    }

    const SCHEMA: &str = r#"<amqp>
      <class name="channel" index="20">
        <method name="flow" index="20" synchronous="1">
          <chassis name="server"/><chassis name="client"/><response name="flow-ok"/>
          <field name="active" type="bit"/>
        </method>
        <method name="flow-ok" index="21">
          <chassis name="server"/><chassis name="client"/>
          <field name="active" type="bit"/>
        </method>
      </class>
    </amqp>"#;

    #[test]
    fn test_compile_protocol_with_custom_backend() {
        let (protocol, out) = compile_protocol_with(SCHEMA, &Summary).unwrap();
        assert_eq!(protocol.classes.len(), 1);
        assert_eq!(out, "20.20,20.21");
    }

    #[test]
    fn test_compile_protocol_default_backend() {
        let (_, code) = compile_protocol(SCHEMA).unwrap();
        assert!(code.contains("pub fn flow_sync<C: rt::Connector>(__conn: &mut C, active: bool)"));
        assert!(code.contains("pub fn flow_ok_resp<C: rt::Connector>(__conn: &mut C, active: bool)"));
    }

    #[test]
    fn test_verification_runs_before_emission() {
        let text = r#"<amqp><class name="a" index="1"/><class name="b" index="1"/></amqp>"#;
        assert!(matches!(
            compile_protocol_with(text, &Summary),
            Err(CompileError::DuplicateClassIndex { .. })
        ));
    }

    #[test]
    fn test_compile_missing_file() {
        let err = compile_protocol_file("/definitely/not/here.xml").unwrap_err();
        assert!(matches!(err, CompileError::Io(_)), "got {:?}", err);
    }
}
