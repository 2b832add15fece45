use crate::{
    bitfield::CodecStep,
    classify::MethodRole,
    dispatch::{ClassPlan, DispatchTable, MethodPlan},
    error::CompileError,
    resolver::{ResolvedField, WireType},
    traits::Backend,
    types::{ClassDef, MethodDef, Protocol},
    utils::{name_clean, name_pascal, name_pascal_part, name_upper},
};

/// Keeps `C` used in handler structs that would otherwise have no fields.
const MARKER_FIELD: &str = "_marker: std::marker::PhantomData<fn(&mut C)>";
const MARKER_DEFAULT: &str = "_marker: std::marker::PhantomData";

/// Renders Rust source against the `amqp-gen-wire` runtime.
///
/// The output is a plain item list with no inner attributes, so it can be
/// pulled into a module with `include!`.
#[derive(Debug, Clone)]
pub struct RustBackend {
    /// Path the runtime crate is imported from; aliased to `rt` in the output.
    pub runtime_crate: String,
}

impl Default for RustBackend {
    fn default() -> Self {
        RustBackend {
            runtime_crate: "amqp_gen_wire".to_string(),
        }
    }
}

impl Backend for RustBackend {
    fn render(&self, protocol: &Protocol, table: &DispatchTable) -> String {
        let mut rust_code: Vec<String> = Vec::new();

        rust_code.push("// @generated by amqp-gen. Do not edit.".to_string());
        rust_code.push("".to_string());
        rust_code.push(format!("use {} as rt;", self.runtime_crate));
        rust_code.push("".to_string());

        for constant in &protocol.constants {
            rust_code.push(format!(
                "pub const {}: {} = {};",
                name_upper(&constant.name),
                constant_type(constant.value),
                constant.value
            ));
        }
        rust_code.push("".to_string());

        generate_dispatch(table, &mut rust_code);
        generate_is_synchronous(table, &mut rust_code);
        generate_registry(table, &mut rust_code);

        for plan in &table.classes {
            generate_handlers(plan, &mut rust_code);
            generate_class(plan, &mut rust_code);
        }

        rust_code.join("\n")
    }
}

/// Names every generated module defines or relies on regardless of the
/// schema: the runtime alias, fixed items, the connector parameter and the
/// prelude names the output spells out.
pub(crate) const RESERVED_ITEMS: &[&str] = &[
    "rt", "dispatch", "is_synchronous", "Handlers", "C",
    "Option", "Some", "None", "Result", "Ok", "Err", "Default", "Clone", "Copy",
];

/// Plans the protocol and renders it with the default [RustBackend].
pub fn compile_protocol_to_rust(protocol: &Protocol) -> Result<String, CompileError> {
    let table = DispatchTable::build(protocol)?;
    Ok(RustBackend::default().render(protocol, &table))
}

fn constant_type(value: i64) -> &'static str {
    if (0..=u16::MAX as i64).contains(&value) {
        "u16"
    } else if (0..=u32::MAX as i64).contains(&value) {
        "u32"
    } else {
        "i64"
    }
}

pub(crate) fn class_const(class: &ClassDef) -> String {
    format!("{}_CLASS", name_upper(&class.name))
}

pub(crate) fn method_const(method: &MethodDef) -> String {
    format!("{}_METHOD", name_upper(&method.name))
}

pub(crate) fn handlers_type(class: &ClassDef) -> String {
    format!("{}Handlers", name_pascal_part(&class.name))
}

pub(crate) fn handler_alias(class: &ClassDef, method: &MethodDef) -> String {
    format!("{}{}Handler", name_pascal_part(&class.name), name_pascal_part(&method.name))
}

/// Associated function name: the suffix keeps keywords like `return` usable.
pub(crate) fn fn_name(method: &MethodDef, suffix: &str) -> String {
    format!("{}_{}", method.name.replace('-', "_"), suffix)
}

/// Local binding a decoded field is read into.
///
/// Bindings the emitter introduces itself (`__conn`, `__tx`, `__bitset0`, ...)
/// carry a `__` prefix. Schema names must start with a letter, so no field
/// can produce them.
fn decode_local(field: &ResolvedField) -> String {
    if field.reserved {
        format!("_{}", name_clean(&field.name))
    } else {
        name_clean(&field.name)
    }
}

fn generate_dispatch(table: &DispatchTable, rust_code: &mut Vec<String>) {
    rust_code.push("/// Decode the payload of method (`class_id`, `method_id`) and invoke its bound handler.".to_string());
    rust_code.push("pub fn dispatch<C: rt::Connector>(".to_string());
    rust_code.push("    conn: &mut C,".to_string());
    rust_code.push("    handlers: &Handlers<C>,".to_string());
    rust_code.push("    class_id: u16,".to_string());
    rust_code.push("    method_id: u16,".to_string());
    rust_code.push("    rx: &mut rt::WireReader<'_>,".to_string());
    rust_code.push(") -> Result<(), rt::ProtocolError> {".to_string());
    rust_code.push("    match class_id {".to_string());

    for plan in &table.classes {
        let class = plan.class;
        rust_code.push(format!("        // {}", class.name));
        rust_code.push(format!("        {} => match method_id {{", class.index));
        for method_plan in &plan.methods {
            let method = method_plan.method;
            rust_code.push(format!("            // {}", method.name));
            rust_code.push(format!("            {} => {{", method.index));
            rust_code.push(format!(
                "                let handler = handlers.{}.{}.ok_or(rt::ProtocolError::MethodNotImplemented {{ class_id, method_id }})?;",
                name_clean(&class.name),
                name_clean(&method.name)
            ));
            rust_code.push(format!(
                "                {}::{}(conn, handler, rx)",
                name_pascal(&class.name),
                fn_name(method, "decode")
            ));
            rust_code.push("            }".to_string());
        }
        rust_code.push("            _ => Err(rt::ProtocolError::UnknownMethod { class_id, method_id }),".to_string());
        rust_code.push("        },".to_string());
    }

    rust_code.push("        _ => Err(rt::ProtocolError::UnknownClass { class_id }),".to_string());
    rust_code.push("    }".to_string());
    rust_code.push("}".to_string());
    rust_code.push("".to_string());
}

fn generate_is_synchronous(table: &DispatchTable, rust_code: &mut Vec<String>) {
    rust_code.push("/// Whether method (`class_id`, `method_id`) is declared synchronous.".to_string());
    rust_code.push("pub fn is_synchronous(class_id: u16, method_id: u16) -> Result<bool, rt::ProtocolError> {".to_string());
    rust_code.push("    match class_id {".to_string());

    for plan in &table.classes {
        rust_code.push(format!("        // {}", plan.class.name));
        rust_code.push(format!("        {} => match method_id {{", plan.class.index));
        for method_plan in &plan.methods {
            rust_code.push(format!(
                "            {} => Ok({}), // {}",
                method_plan.method.index, method_plan.synchronous, method_plan.method.name
            ));
        }
        rust_code.push("            _ => Err(rt::ProtocolError::UnknownMethod { class_id, method_id }),".to_string());
        rust_code.push("        },".to_string());
    }

    rust_code.push("        _ => Err(rt::ProtocolError::UnknownClass { class_id }),".to_string());
    rust_code.push("    }".to_string());
    rust_code.push("}".to_string());
    rust_code.push("".to_string());
}

/// `Handlers<C>` holds one handler set per class. The runtime builds it and
/// hands it to `dispatch`; nothing is stored in statics.
fn generate_registry(table: &DispatchTable, rust_code: &mut Vec<String>) {
    rust_code.push("/// Handler registry passed to `dispatch`. Every slot starts unbound.".to_string());
    rust_code.push("pub struct Handlers<C> {".to_string());
    for plan in &table.classes {
        rust_code.push(format!(
            "    pub {}: {}<C>,",
            name_clean(&plan.class.name),
            handlers_type(plan.class)
        ));
    }
    if table.classes.is_empty() {
        rust_code.push(format!("    {},", MARKER_FIELD));
    }
    rust_code.push("}".to_string());
    rust_code.push("".to_string());

    let mut fields: Vec<String> = table
        .classes
        .iter()
        .map(|plan| format!("{}: {}::default()", name_clean(&plan.class.name), handlers_type(plan.class)))
        .collect();
    if fields.is_empty() {
        fields.push(MARKER_DEFAULT.to_string());
    }
    push_copy_impls("Handlers", &fields, rust_code);
}

fn push_copy_impls(type_name: &str, fields: &[String], rust_code: &mut Vec<String>) {
    rust_code.push(format!("impl<C> Default for {}<C> {{", type_name));
    rust_code.push("    fn default() -> Self {".to_string());
    rust_code.push(format!("        {} {{", type_name));
    for field in fields {
        rust_code.push(format!("            {},", field));
    }
    rust_code.push("        }".to_string());
    rust_code.push("    }".to_string());
    rust_code.push("}".to_string());
    rust_code.push("".to_string());
    rust_code.push(format!("impl<C> Clone for {}<C> {{", type_name));
    rust_code.push("    fn clone(&self) -> Self {".to_string());
    rust_code.push("        *self".to_string());
    rust_code.push("    }".to_string());
    rust_code.push("}".to_string());
    rust_code.push("".to_string());
    rust_code.push(format!("impl<C> Copy for {}<C> {{}}", type_name));
    rust_code.push("".to_string());
}

fn generate_handlers(plan: &ClassPlan, rust_code: &mut Vec<String>) {
    let class = plan.class;

    for method_plan in &plan.methods {
        let mut args = vec!["&mut C".to_string()];
        args.extend(method_plan.visible_fields().map(|f| f.wire_type.handler_type().to_string()));
        rust_code.push(format!(
            "pub type {}<C> = fn({}) -> Result<(), rt::ProtocolError>;",
            handler_alias(class, method_plan.method),
            args.join(", ")
        ));
    }
    rust_code.push("".to_string());

    rust_code.push(format!("/// Handlers for class `{}`.", class.name));
    rust_code.push(format!("pub struct {}<C> {{", handlers_type(class)));
    for method_plan in &plan.methods {
        rust_code.push(format!(
            "    pub {}: Option<{}<C>>,",
            name_clean(&method_plan.method.name),
            handler_alias(class, method_plan.method)
        ));
    }
    if plan.methods.is_empty() {
        rust_code.push(format!("    {},", MARKER_FIELD));
    }
    rust_code.push("}".to_string());
    rust_code.push("".to_string());

    let mut fields: Vec<String> = plan
        .methods
        .iter()
        .map(|m| format!("{}: None", name_clean(&m.method.name)))
        .collect();
    if fields.is_empty() {
        fields.push(MARKER_DEFAULT.to_string());
    }
    push_copy_impls(&handlers_type(class), &fields, rust_code);
}

fn generate_class(plan: &ClassPlan, rust_code: &mut Vec<String>) {
    let class = plan.class;

    rust_code.push(format!("pub const {}: u16 = {};", class_const(class), class.index));
    rust_code.push("".to_string());
    rust_code.push(format!("pub struct {};", name_pascal(&class.name)));
    rust_code.push("".to_string());
    rust_code.push(format!("impl {} {{", name_pascal(&class.name)));

    for method_plan in &plan.methods {
        rust_code.push(format!(
            "    pub const {}: u16 = {};",
            method_const(method_plan.method),
            method_plan.method.index
        ));
    }

    for method_plan in &plan.methods {
        rust_code.push("".to_string());
        generate_decode(class, method_plan, rust_code);
        if method_plan.role != MethodRole::Unclassified {
            rust_code.push("".to_string());
            generate_encode(class, method_plan, rust_code);
        }
    }

    rust_code.push("}".to_string());
    rust_code.push("".to_string());
}

fn generate_decode(class: &ClassDef, plan: &MethodPlan, rust_code: &mut Vec<String>) {
    let method = plan.method;

    rust_code.push(format!(
        "    pub fn {}<C>(__conn: &mut C, __handler: {}<C>, __rx: &mut rt::WireReader<'_>) -> Result<(), rt::ProtocolError> {{",
        fn_name(method, "decode"),
        handler_alias(class, method)
    ));

    for step in &plan.steps {
        match *step {
            CodecStep::OpenBitset { bitset } => {
                rust_code.push(format!("        let __bitset{} = __rx.read_u8()?;", bitset));
            }
            CodecStep::Flag { field, bitset, bit } => {
                rust_code.push(format!(
                    "        let {} = (__bitset{} & (1 << {})) != 0;",
                    decode_local(&plan.fields[field]),
                    bitset,
                    bit
                ));
            }
            CodecStep::CloseBitset { .. } => {}
            CodecStep::Value { field } => {
                let field = &plan.fields[field];
                let binding = if field.wire_type == WireType::Table && !field.reserved {
                    "let mut"
                } else {
                    "let"
                };
                rust_code.push(format!(
                    "        {} {} = __rx.{}()?;",
                    binding,
                    decode_local(field),
                    field.wire_type.read_op()
                ));
            }
        }
    }

    rust_code.push("        __rx.expect_eof()?;".to_string());
    rust_code.push(format!(
        "        rt::tracing::trace!(\"{}.{}\");",
        name_pascal_part(&class.name),
        name_pascal_part(&method.name)
    ));

    let mut args = vec!["__conn".to_string()];
    args.extend(plan.visible_fields().map(|f| {
        if f.wire_type == WireType::Table {
            format!("&mut {}", name_clean(&f.name))
        } else {
            name_clean(&f.name)
        }
    }));
    rust_code.push(format!("        __handler({})", args.join(", ")));
    rust_code.push("    }".to_string());
}

fn generate_encode(class: &ClassDef, plan: &MethodPlan, rust_code: &mut Vec<String>) {
    let method = plan.method;
    let suffix = match plan.role.suffix() {
        Some(suffix) => suffix,
        None => return,
    };

    let mut params = vec!["__conn: &mut C".to_string()];
    params.extend(
        plan.visible_fields()
            .map(|f| format!("{}: {}", name_clean(&f.name), f.wire_type.arg_type())),
    );
    if params.len() > 7 {
        rust_code.push("    #[allow(clippy::too_many_arguments)]".to_string());
    }
    rust_code.push(format!(
        "    pub fn {}<C: rt::Connector>({}) -> Result<(), rt::ProtocolError> {{",
        fn_name(method, suffix),
        params.join(", ")
    ));

    rust_code.push("        let __channel = __conn.channel();".to_string());
    rust_code.push("        let __tx = __conn.tx_buffer();".to_string());
    rust_code.push("        __tx.write_frame_header(rt::FrameType::Method, __channel);".to_string());
    rust_code.push(format!(
        "        __tx.write_method_header({}, Self::{});",
        class_const(class),
        method_const(method)
    ));

    for field in plan.fields.iter().filter(|f| f.reserved) {
        rust_code.push(format!(
            "        let {}: {} = {};",
            name_clean(&field.name),
            field.wire_type.arg_type(),
            field.wire_type.reserved_default()
        ));
    }

    for step in &plan.steps {
        match *step {
            CodecStep::OpenBitset { bitset } => {
                rust_code.push(format!("        let mut __bitset{}: u8 = 0;", bitset));
            }
            CodecStep::Flag { field, bitset, bit } => {
                rust_code.push(format!(
                    "        if {} {{ __bitset{} |= 1 << {}; }}",
                    name_clean(&plan.fields[field].name),
                    bitset,
                    bit
                ));
            }
            CodecStep::CloseBitset { bitset } => {
                rust_code.push(format!("        __tx.write_u8(__bitset{});", bitset));
            }
            CodecStep::Value { field } => {
                let field = &plan.fields[field];
                rust_code.push(format!(
                    "        __tx.{}({}){};",
                    field.wire_type.write_op(),
                    name_clean(&field.name),
                    if field.wire_type.write_is_fallible() { "?" } else { "" }
                ));
            }
        }
    }

    rust_code.push("        __tx.update_frame_length();".to_string());
    rust_code.push("        __conn.flush()?;".to_string());

    if let Some(reply) = plan.reply {
        rust_code.push(format!(
            "        let __expecting = rt::ClassMethod {{ class: {}, method: Self::{} }};",
            class_const(class),
            method_const(reply)
        ));
        rust_code.push("        let mut __received_response = false;".to_string());
        rust_code.push("        while !__received_response {".to_string());
        rust_code.push("            __received_response = __conn.dispatch(__expecting)?;".to_string());
        rust_code.push("        }".to_string());
    }

    rust_code.push("        Ok(())".to_string());
    rust_code.push("    }".to_string());
}
