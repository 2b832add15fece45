use crate::{buffer::WireWriter, error::ProtocolError};

/// Wire identity of a method: (class index, method index).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ClassMethod {
    pub class: u16,
    pub method: u16,
}

/// The transport seam generated code is written against.
///
/// An implementation owns the socket (or whatever carries frames), the
/// outbound [WireWriter] and the handler registry. Only one encode or decode
/// sequence may be in flight at a time; sharing a connector between callers
/// needs external synchronization.
pub trait Connector {
    /// Channel number written into outbound frame headers.
    fn channel(&self) -> u16;

    /// Buffer outbound frames are assembled in.
    fn tx_buffer(&mut self) -> &mut WireWriter;

    /// Send everything in the tx buffer and reset it.
    fn flush(&mut self) -> Result<(), ProtocolError>;

    /// Receive exactly one frame and fully dispatch it, side effects
    /// included. Returns `true` only if the frame processed was the
    /// `expecting` method.
    fn dispatch(&mut self, expecting: ClassMethod) -> Result<bool, ProtocolError>;
}
