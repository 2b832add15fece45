use crate::{dispatch::DispatchTable, types::Protocol};

/// A code generation target. The front end (parse, verify, plan) is shared;
/// a backend only turns the planned tables into source text.
pub trait Backend {
    fn render(&self, protocol: &Protocol, table: &DispatchTable) -> String;
}
