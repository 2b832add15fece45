use std::fs;

use amqp_gen::{generate_from_path, protocol_to_json, write_generated, CompileError};

const SCHEMA: &str = r#"<?xml version="1.0"?>
<amqp major="0" minor="9" revision="1">
  <constant name="frame-end" value="206"/>
  <class name="basic" index="60">
    <method name="ack" index="80">
      <chassis name="server"/>
      <field name="delivery-tag" domain="delivery-tag"/>
      <field name="multiple" domain="bit"/>
    </method>
  </class>
</amqp>"#;

#[test]
fn test_generate_from_path() {
    let dir = tempfile::tempdir().unwrap();
    let path = dir.path().join("protocol.xml");
    fs::write(&path, SCHEMA).unwrap();

    let code = generate_from_path(&path).unwrap();
    assert!(code.contains("pub const FRAME_END: u16 = 206;"));
    assert!(code.contains("pub fn ack_resp<C: rt::Connector>(__conn: &mut C, delivery_tag: u64, multiple: bool)"));
}

#[test]
fn test_write_generated_creates_file() {
    let dir = tempfile::tempdir().unwrap();
    let schema = dir.path().join("protocol.xml");
    let out = dir.path().join("protocol.rs");
    fs::write(&schema, SCHEMA).unwrap();

    write_generated(&schema, &out).unwrap();
    let code = fs::read_to_string(&out).unwrap();
    assert!(code.starts_with("// @generated by amqp-gen."));
}

#[test]
fn test_write_generated_leaves_nothing_on_failure() {
    let dir = tempfile::tempdir().unwrap();
    let schema = dir.path().join("broken.xml");
    let out = dir.path().join("broken.rs");
    fs::write(
        &schema,
        r#"<amqp><class name="basic" index="60">
             <method name="publish" index="40"><field name="ts" domain="timestamp"/></method>
           </class></amqp>"#,
    )
    .unwrap();

    let err = write_generated(&schema, &out).unwrap_err();
    match err {
        CompileError::UnresolvedType { method, field, .. } => {
            assert_eq!(method, "publish");
            assert_eq!(field, "ts");
        }
        other => panic!("unexpected error {:?}", other),
    }
    assert!(!out.exists());
}

#[test]
fn test_protocol_to_json() {
    let json = protocol_to_json(SCHEMA).unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["constants"][0]["name"], "frame-end");
    assert_eq!(value["constants"][0]["value"], 206);
    assert_eq!(value["classes"][0]["index"], 60);
    assert_eq!(value["classes"][0]["methods"][0]["name"], "ack");
    assert_eq!(value["classes"][0]["methods"][0]["to_server"], true);
    assert_eq!(value["classes"][0]["methods"][0]["fields"][1]["domain"], "bit");
}
