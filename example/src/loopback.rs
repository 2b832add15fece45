use amqp_gen_wire::{ClassMethod, Connector, Frame, FrameType, ProtocolError, WireWriter};
use bytes::{Bytes, BytesMut};

use crate::generated::{self, Handlers};

/// An in-memory [Connector].
///
/// Flushed frames are appended to `sent`. Inbound bytes are decoded one frame
/// at a time and dispatched through `handlers`, which can record what they
/// saw in `events`.
pub struct Loopback {
    channel: u16,
    tx: WireWriter,
    inbound: BytesMut,
    pub handlers: Handlers<Loopback>,
    pub sent: Vec<Bytes>,
    pub events: Vec<String>,
}

impl Loopback {
    pub fn new(channel: u16, handlers: Handlers<Loopback>) -> Self {
        Loopback {
            channel,
            tx: WireWriter::new(),
            inbound: BytesMut::new(),
            handlers,
            sent: Vec::new(),
            events: Vec::new(),
        }
    }

    /// Queue raw frame bytes as if they had arrived from the peer.
    pub fn push_inbound(&mut self, bytes: &[u8]) {
        self.inbound.extend_from_slice(bytes);
    }

    /// Bytes queued but not dispatched yet.
    pub fn pending(&self) -> usize {
        self.inbound.len()
    }

    /// Dispatch the next inbound method frame, skipping heartbeats.
    ///
    /// Returns the method that was processed, or `None` if no complete frame
    /// is queued.
    pub fn receive(&mut self) -> Result<Option<ClassMethod>, ProtocolError> {
        loop {
            let frame = match Frame::decode(&mut self.inbound)? {
                Some(frame) => frame,
                None => return Ok(None),
            };

            if frame.frame_type == FrameType::Heartbeat as u8 {
                tracing::trace!(channel = frame.channel, "heartbeat");
                continue;
            }
            if !frame.is_method() {
                return Err(ProtocolError::UnexpectedFrame {
                    frame_type: frame.frame_type,
                });
            }

            let (class_method, mut rx) = frame.method_header()?;
            let handlers = self.handlers;
            generated::dispatch(self, &handlers, class_method.class, class_method.method, &mut rx)?;
            return Ok(Some(class_method));
        }
    }

    /// Feed everything this connector has sent into `peer`.
    pub fn deliver_to(&mut self, peer: &mut Loopback) {
        for bytes in self.sent.drain(..) {
            peer.push_inbound(&bytes);
        }
    }
}

impl Connector for Loopback {
    fn channel(&self) -> u16 {
        self.channel
    }

    fn tx_buffer(&mut self) -> &mut WireWriter {
        &mut self.tx
    }

    fn flush(&mut self) -> Result<(), ProtocolError> {
        let bytes = self.tx.take();
        tracing::debug!(channel = self.channel, len = bytes.len(), "flush");
        self.sent.push(bytes);
        Ok(())
    }

    fn dispatch(&mut self, expecting: ClassMethod) -> Result<bool, ProtocolError> {
        match self.receive()? {
            Some(received) => Ok(received == expecting),
            // nothing left to read: the reply will never come
            None => Err(ProtocolError::Closed),
        }
    }
}
