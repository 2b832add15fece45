use std::collections::HashMap;

use crate::{
    classify::{classify, MethodRole},
    error::CompileError,
    gen_rust::{class_const, fn_name, handler_alias, handlers_type, method_const, RESERVED_ITEMS},
    resolver::resolve_method,
    types::Protocol,
    utils::{check_binding_name, check_name, name_clean, name_pascal, name_upper, quote},
};

/// Returns `Ok(())` if the protocol can be compiled, or the first problem found.
///
/// Checks, in order: identifiers, class index uniqueness, method index
/// uniqueness within each class, field type resolution, that every
/// synchronous request has its reply declared in the same class, and that no
/// two schema names map to the same generated identifier.
pub fn verify_protocol(protocol: &Protocol) -> Result<(), CompileError> {
    for constant in &protocol.constants {
        check_name(&constant.name)?;
    }

    let mut class_indices: HashMap<u16, &str> = HashMap::new();
    for class in &protocol.classes {
        check_name(&class.name)?;
        if let Some(first) = class_indices.insert(class.index, &class.name) {
            return Err(CompileError::DuplicateClassIndex {
                index:  class.index,
                first:  first.to_string(),
                second: class.name.clone(),
            });
        }

        let mut method_indices: HashMap<u16, &str> = HashMap::new();
        for method in &class.methods {
            check_name(&method.name)?;
            if let Some(first) = method_indices.insert(method.index, &method.name) {
                return Err(CompileError::DuplicateMethodIndex {
                    class:  class.name.clone(),
                    index:  method.index,
                    first:  first.to_string(),
                    second: method.name.clone(),
                });
            }
            for field in &method.fields {
                check_binding_name(&field.name)?;
            }
            resolve_method(class, method)?;

            if classify(method) == MethodRole::SynchronousRequest {
                let reply = method.reply_name();
                if class.method(&reply).is_none() {
                    return Err(CompileError::MissingReply {
                        class:  class.name.clone(),
                        method: method.name.clone(),
                        reply,
                    });
                }
            }
        }
    }

    check_identifiers(protocol)
}

/// Generated identifiers in one namespace, each mapped to what produced it.
#[derive(Default)]
struct Scope {
    taken: HashMap<String, String>,
}

impl Scope {
    fn reserved() -> Scope {
        let mut scope = Scope::default();
        for item in RESERVED_ITEMS {
            scope.taken.insert(item.to_string(), "the generated module".to_string());
        }
        scope
    }

    fn claim(&mut self, ident: String, owner: &str) -> Result<(), CompileError> {
        match self.taken.get(&ident) {
            Some(first) => Err(CompileError::InvalidName(format!(
                "{} (produced by both {} and {})",
                ident,
                first,
                quote(owner)
            ))),
            None => {
                self.taken.insert(ident, quote(owner));
                Ok(())
            }
        }
    }
}

/// `-` becomes `_` and keywords gain a suffix, so distinct schema names such
/// as `foo-bar` and `foo_bar` can land on one identifier.
fn check_identifiers(protocol: &Protocol) -> Result<(), CompileError> {
    let mut module = Scope::reserved();
    let mut registry = Scope::default();

    for constant in &protocol.constants {
        module.claim(name_upper(&constant.name), &constant.name)?;
    }

    for class in &protocol.classes {
        module.claim(class_const(class), &class.name)?;
        module.claim(name_pascal(&class.name), &class.name)?;
        module.claim(handlers_type(class), &class.name)?;
        registry.claim(name_clean(&class.name), &class.name)?;

        let mut associated = Scope::default();
        let mut slots = Scope::default();
        for method in &class.methods {
            let owner = format!("{}.{}", class.name, method.name);
            module.claim(handler_alias(class, method), &owner)?;
            associated.claim(method_const(method), &owner)?;
            for suffix in ["decode", "sync", "resp"] {
                associated.claim(fn_name(method, suffix), &owner)?;
            }
            slots.claim(name_clean(&method.name), &owner)?;

            let mut bindings = Scope::default();
            for field in &method.fields {
                bindings.claim(name_clean(&field.name), &format!("{}.{}", owner, field.name))?;
            }
        }
    }

    Ok(())
}
