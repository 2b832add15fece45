use serde::Serialize;

use crate::types::MethodDef;

/// Outbound role of a method, derived from its chassis and response markers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum MethodRole {
    /// Sent by this peer; blocks until the paired reply has been dispatched.
    SynchronousRequest,
    /// Sent by this peer with no reply expected.
    Response,
    /// Never sent by this peer. Still a decode target.
    Unclassified,
}

impl MethodRole {
    /// Suffix of the generated outbound function, if one is generated.
    pub fn suffix(self) -> Option<&'static str> {
        match self {
            MethodRole::SynchronousRequest => Some("sync"),
            MethodRole::Response => Some("resp"),
            MethodRole::Unclassified => None,
        }
    }
}

pub fn classify(method: &MethodDef) -> MethodRole {
    match (method.to_server, method.expects_response) {
        (true, true) => MethodRole::SynchronousRequest,
        (true, false) => MethodRole::Response,
        (false, _) => MethodRole::Unclassified,
    }
}
