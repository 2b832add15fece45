use std::collections::HashMap;

use crate::{
    bitfield::{pack, CodecStep},
    classify::{classify, MethodRole},
    error::{CompileError, LookupError},
    resolver::{resolve_method, ResolvedField},
    types::{ClassDef, MethodDef, Protocol},
};

/// Everything the emitter needs to know about one method.
#[derive(Debug, Clone)]
pub struct MethodPlan<'p> {
    pub method:      &'p MethodDef,
    pub role:        MethodRole,
    pub synchronous: bool,
    pub fields:      Vec<ResolvedField>,
    pub steps:       Vec<CodecStep>,
    /// Paired reply of a synchronous request.
    pub reply:       Option<&'p MethodDef>,
}

impl MethodPlan<'_> {
    /// Fields handed to handlers and taken by encode functions, in declared order.
    pub fn visible_fields(&self) -> impl Iterator<Item = &ResolvedField> {
        self.fields.iter().filter(|f| !f.reserved)
    }
}

#[derive(Debug, Clone)]
pub struct ClassPlan<'p> {
    pub class:   &'p ClassDef,
    pub methods: Vec<MethodPlan<'p>>,
}

/// The (class, method) keyed tables the generated dispatcher and
/// synchronicity lookup are rendered from.
#[derive(Debug, Clone)]
pub struct DispatchTable<'p> {
    pub classes: Vec<ClassPlan<'p>>,
    positions:   HashMap<u16, usize>,
}

impl<'p> DispatchTable<'p> {
    /// Resolve, pack and classify every method. Expects a verified protocol;
    /// resolution failures still surface as errors.
    pub fn build(protocol: &'p Protocol) -> Result<Self, CompileError> {
        let mut classes   = Vec::with_capacity(protocol.classes.len());
        let mut positions = HashMap::with_capacity(protocol.classes.len());

        for class in &protocol.classes {
            let mut methods = Vec::with_capacity(class.methods.len());
            for method in &class.methods {
                let fields = resolve_method(class, method)?;
                let steps  = pack(&fields);
                let role   = classify(method);
                let reply  = match role {
                    MethodRole::SynchronousRequest => {
                        let reply = method.reply_name();
                        Some(class.method(&reply).ok_or_else(|| CompileError::MissingReply {
                            class:  class.name.clone(),
                            method: method.name.clone(),
                            reply,
                        })?)
                    }
                    _ => None,
                };
                tracing::debug!(
                    class = %class.name,
                    method = %method.name,
                    ?role,
                    fields = fields.len(),
                    "planned method"
                );
                methods.push(MethodPlan {
                    method,
                    role,
                    synchronous: method.synchronous,
                    fields,
                    steps,
                    reply,
                });
            }
            positions.insert(class.index, classes.len());
            classes.push(ClassPlan { class, methods });
        }

        Ok(DispatchTable { classes, positions })
    }

    pub fn lookup(&self, class_id: u16, method_id: u16) -> Result<&MethodPlan<'p>, LookupError> {
        let position = self
            .positions
            .get(&class_id)
            .ok_or(LookupError::UnknownClass { class_id })?;
        self.classes[*position]
            .methods
            .iter()
            .find(|plan| plan.method.index == method_id)
            .ok_or(LookupError::UnknownMethod { class_id, method_id })
    }

    pub fn is_synchronous(&self, class_id: u16, method_id: u16) -> Result<bool, LookupError> {
        Ok(self.lookup(class_id, method_id)?.synchronous)
    }

    /// Every (class index, method index) pair, in schema order.
    pub fn keys(&self) -> impl Iterator<Item = (u16, u16)> + '_ {
        self.classes.iter().flat_map(|plan| {
            plan.methods
                .iter()
                .map(move |m| (plan.class.index, m.method.index))
        })
    }

    pub fn len(&self) -> usize {
        self.classes.iter().map(|c| c.methods.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
