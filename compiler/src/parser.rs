use std::str::FromStr;

use roxmltree::{Document, Node};

use crate::{
    error::CompileError,
    types::{ClassDef, Constant, FieldDef, MethodDef, Protocol},
    utils::{error, quote},
};

/// Parse an AMQP-style protocol document into a [Protocol].
///
/// Only `constant`, `class`, `method`, `chassis`, `response` and `field`
/// elements carry meaning here; documentation, rules and domain declarations
/// are skipped.
pub fn parse_protocol(text: &str) -> Result<Protocol, CompileError> {
    let doc = Document::parse(text)?;
    let root = doc.root_element();

    if root.tag_name().name() != "amqp" {
        return Err(node_error(
            &doc,
            root,
            &format!("Expected root element \"amqp\" but found {}", quote(root.tag_name().name())),
        ));
    }

    let mut constants = Vec::new();
    let mut classes   = Vec::new();

    for child in root.children().filter(Node::is_element) {
        match child.tag_name().name() {
            "constant" => constants.push(Constant {
                name:  attribute(&doc, child, "name")?.to_string(),
                value: integer(&doc, child, "value")?,
                class: child.attribute("class").map(str::to_string),
            }),
            "class" => classes.push(parse_class(&doc, child)?),
            _ => {}
        }
    }

    Ok(Protocol { constants, classes })
}

fn parse_class(doc: &Document, node: Node) -> Result<ClassDef, CompileError> {
    let mut methods = Vec::new();
    for child in node.children().filter(|n| n.has_tag_name("method")) {
        methods.push(parse_method(doc, child)?);
    }

    Ok(ClassDef {
        name:  attribute(doc, node, "name")?.to_string(),
        index: integer(doc, node, "index")?,
        methods,
    })
}

fn parse_method(doc: &Document, node: Node) -> Result<MethodDef, CompileError> {
    let mut to_server        = false;
    let mut expects_response = false;
    let mut response         = None;
    let mut fields           = Vec::new();

    for child in node.children().filter(Node::is_element) {
        match child.tag_name().name() {
            "chassis" => {
                if child.attribute("name") == Some("server") {
                    to_server = true;
                }
            }
            "response" => {
                if !expects_response {
                    response = child.attribute("name").map(str::to_string);
                }
                expects_response = true;
            }
            "field" => fields.push(FieldDef {
                name:     attribute(doc, child, "name")?.to_string(),
                domain:   child.attribute("domain").map(str::to_string),
                type_:    child.attribute("type").map(str::to_string),
                reserved: flag(child, "reserved"),
            }),
            _ => {}
        }
    }

    Ok(MethodDef {
        name:        attribute(doc, node, "name")?.to_string(),
        index:       integer(doc, node, "index")?,
        synchronous: flag(node, "synchronous"),
        to_server,
        expects_response,
        response,
        fields,
    })
}

fn node_error(doc: &Document, node: Node, msg: &str) -> CompileError {
    let pos = doc.text_pos_at(node.range().start);
    error(msg, pos.row, pos.col)
}

fn attribute<'a>(doc: &Document, node: Node<'a, '_>, name: &str) -> Result<&'a str, CompileError> {
    node.attribute(name).ok_or_else(|| {
        node_error(
            doc,
            node,
            &format!("Element {} is missing attribute {}", quote(node.tag_name().name()), quote(name)),
        )
    })
}

fn integer<T: FromStr>(doc: &Document, node: Node, name: &str) -> Result<T, CompileError> {
    let text = attribute(doc, node, name)?;
    text.trim().parse::<T>().map_err(|_| {
        node_error(
            doc,
            node,
            &format!("Invalid integer {} for attribute {}", quote(text), quote(name)),
        )
    })
}

fn flag(node: Node, name: &str) -> bool {
    matches!(node.attribute(name), Some("1") | Some("true"))
}

#[cfg(test)]
mod tests {
    use super::*;

    const QUEUE: &str = r#"<?xml version="1.0"?>
<amqp major="0" minor="9" revision="1">
  <constant name="frame-end" value="206"/>
  <constant name="not-found" value="404" class="soft-error"/>
  <domain name="queue-name" type="shortstr"/>
  <class name="queue" index="50">
    <doc>Work with queues.</doc>
    <chassis name="server" implement="MUST"/>
    <method name="declare" synchronous="1" index="10">
      <chassis name="server" implement="MUST"/>
      <response name="declare-ok"/>
      <field name="reserved-1" type="short" reserved="1"/>
      <field name="queue" domain="queue-name"/>
      <field name="passive" domain="bit"/>
    </method>
    <method name="declare-ok" synchronous="1" index="11">
      <chassis name="client" implement="MUST"/>
      <field name="queue" domain="queue-name"/>
    </method>
  </class>
</amqp>"#;

    #[test]
    fn test_parse_protocol() {
        let protocol = parse_protocol(QUEUE).unwrap();

        assert_eq!(protocol.constants.len(), 2);
        assert_eq!(protocol.constants[0].name, "frame-end");
        assert_eq!(protocol.constants[0].value, 206);
        assert_eq!(protocol.constants[1].class.as_deref(), Some("soft-error"));

        assert_eq!(protocol.classes.len(), 1);
        let queue = &protocol.classes[0];
        assert_eq!(queue.name, "queue");
        assert_eq!(queue.index, 50);
        assert_eq!(queue.methods.len(), 2);

        let declare = &queue.methods[0];
        assert!(declare.synchronous);
        assert!(declare.to_server);
        assert!(declare.expects_response);
        assert_eq!(declare.reply_name(), "declare-ok");
        assert_eq!(declare.fields.len(), 3);
        assert!(declare.fields[0].reserved);
        assert_eq!(declare.fields[0].type_name(), Some("short"));
        assert_eq!(declare.fields[1].type_name(), Some("queue-name"));
        assert!(!declare.fields[1].reserved);

        let declare_ok = &queue.methods[1];
        assert!(!declare_ok.to_server);
        assert!(!declare_ok.expects_response);
    }

    #[test]
    fn test_explicit_type_overrides_domain() {
        let field = FieldDef {
            name:     "ticket".to_string(),
            domain:   Some("queue-name".to_string()),
            type_:    Some("short".to_string()),
            reserved: false,
        };
        assert_eq!(field.type_name(), Some("short"));
    }

    #[test]
    fn test_missing_attribute_reports_position() {
        let text = "<amqp>\n  <class index=\"10\"/>\n</amqp>";
        let err = parse_protocol(text).unwrap_err();
        assert!(
            matches!(err, CompileError::ParseError { line: 2, column: 3, .. }),
            "expected a ParseError at 2:3 but got {:?}",
            err
        );
    }

    #[test]
    fn test_invalid_integer() {
        let text = r#"<amqp><class name="basic" index="sixty"/></amqp>"#;
        let err = parse_protocol(text).unwrap_err();
        assert!(matches!(err, CompileError::ParseError { .. }), "got {:?}", err);
    }

    #[test]
    fn test_malformed_document() {
        let err = parse_protocol("<amqp><class>").unwrap_err();
        assert!(matches!(err, CompileError::Xml(_)), "got {:?}", err);
    }

    #[test]
    fn test_wrong_root() {
        let err = parse_protocol("<protocol/>").unwrap_err();
        assert!(matches!(err, CompileError::ParseError { line: 1, column: 1, .. }));
    }
}
