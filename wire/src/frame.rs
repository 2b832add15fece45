use bytes::{Buf, Bytes, BytesMut};

use crate::{
    buffer::WireReader,
    connector::ClassMethod,
    error::WireError,
    FRAME_END, FRAME_HEADER_SIZE, METHOD_HEADER_SIZE,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum FrameType {
    Method = 1,
    Header = 2,
    Body = 3,
    Heartbeat = 8,
}

/// A complete frame with its header and frame-end octet stripped.
#[derive(Debug, Clone, PartialEq)]
pub struct Frame {
    pub frame_type: u8,
    pub channel: u16,
    pub payload: Bytes,
}

impl Frame {
    /// Decode one frame from the front of `src`.
    ///
    /// Returns `Ok(None)` if the buffer doesn't contain a complete frame yet.
    /// On success, consumes the frame bytes from the buffer.
    pub fn decode(src: &mut BytesMut) -> Result<Option<Frame>, WireError> {
        if src.len() < FRAME_HEADER_SIZE {
            return Ok(None);
        }

        let frame_type = src[0];
        let channel = u16::from_be_bytes([src[1], src[2]]);
        let size = u32::from_be_bytes([src[3], src[4], src[5], src[6]]) as usize;

        let total = FRAME_HEADER_SIZE + size + 1;
        if src.len() < total {
            return Ok(None);
        }
        if src[total - 1] != FRAME_END {
            return Err(WireError::InvalidFrameEnd(src[total - 1]));
        }

        src.advance(FRAME_HEADER_SIZE);
        let payload = src.split_to(size).freeze();
        src.advance(1);

        tracing::trace!(frame_type, channel, size, "decoded frame");
        Ok(Some(Frame {
            frame_type,
            channel,
            payload,
        }))
    }

    /// Decode a buffer that must hold exactly one frame.
    pub fn parse(bytes: &[u8]) -> Result<Frame, WireError> {
        let mut src = BytesMut::from(bytes);
        let frame = Frame::decode(&mut src)?.ok_or(WireError::UnexpectedEof {
            needed: FRAME_HEADER_SIZE + 1,
            remaining: bytes.len(),
        })?;
        match src.len() {
            0 => Ok(frame),
            remaining => Err(WireError::TrailingBytes { remaining }),
        }
    }

    pub fn is_method(&self) -> bool {
        self.frame_type == FrameType::Method as u8
    }

    /// Split a method frame into its class/method ids and a reader positioned
    /// at the first argument.
    pub fn method_header(&self) -> Result<(ClassMethod, WireReader<'_>), WireError> {
        let mut rx = WireReader::new(&self.payload);
        if rx.remaining() < METHOD_HEADER_SIZE {
            return Err(WireError::UnexpectedEof {
                needed: METHOD_HEADER_SIZE,
                remaining: rx.remaining(),
            });
        }
        let class = rx.read_u16()?;
        let method = rx.read_u16()?;
        Ok((ClassMethod { class, method }, rx))
    }
}
