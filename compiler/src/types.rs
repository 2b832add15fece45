use serde::Serialize;

/// A parsed protocol schema. Read-only once built.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Protocol {
    pub constants: Vec<Constant>,
    pub classes:   Vec<ClassDef>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Constant {
    pub name:  String,
    pub value: i64,
    /// Error class (`soft-error`, `hard-error`) when the constant is a reply code.
    pub class: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ClassDef {
    pub name:    String,
    pub index:   u16,
    pub methods: Vec<MethodDef>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MethodDef {
    pub name:        String,
    pub index:       u16,
    pub synchronous: bool,
    /// A `server` chassis was declared: this peer sends the method.
    pub to_server:   bool,
    /// A `<response>` marker was declared: a paired reply is expected.
    pub expects_response: bool,
    /// Name attribute of the first `<response>` marker, if it carried one.
    pub response:    Option<String>,
    pub fields:      Vec<FieldDef>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FieldDef {
    pub name:     String,
    pub domain:   Option<String>,
    pub type_:    Option<String>,
    pub reserved: bool,
}

impl Protocol {
    pub fn class(&self, name: &str) -> Option<&ClassDef> {
        self.classes.iter().find(|c| c.name == name)
    }
}

impl ClassDef {
    pub fn method(&self, name: &str) -> Option<&MethodDef> {
        self.methods.iter().find(|m| m.name == name)
    }
}

impl MethodDef {
    /// Name of the paired reply: the `<response name>` if given, else `<method>-ok`.
    pub fn reply_name(&self) -> String {
        match &self.response {
            Some(name) => name.clone(),
            None => format!("{}-ok", self.name),
        }
    }
}

impl FieldDef {
    /// The name the field's codec is resolved from. An explicit `type`
    /// overrides the `domain`.
    pub fn type_name(&self) -> Option<&str> {
        self.type_.as_deref().or(self.domain.as_deref())
    }
}
