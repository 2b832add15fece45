use bytes::{BufMut, Bytes, BytesMut};
use std::str;

use crate::{
    error::WireError,
    frame::FrameType,
    table::Table,
    FRAME_END, FRAME_HEADER_SIZE,
};

/// A method payload meant for reading.
///
/// Example usage:
///
/// ```
/// let mut rx = amqp_gen_wire::WireReader::new(&[0, 42, 3, b'a', b'm', b'q']);
/// assert_eq!(rx.read_u16(), Ok(42));
/// assert_eq!(rx.read_short_string(), Ok("amq"));
/// assert_eq!(rx.expect_eof(), Ok(()));
/// ```
///
pub struct WireReader<'a> {
    data: &'a [u8],
    index: usize,
}

impl<'a> WireReader<'a> {
    /// Wrap a payload. The reader borrows the slice; strings read from it
    /// alias the underlying memory.
    pub fn new(data: &'a [u8]) -> WireReader<'a> {
        WireReader { data, index: 0 }
    }

    /// Retrieves the underlying byte slice.
    pub fn data(&self) -> &'a [u8] {
        self.data
    }

    /// Retrieves the current index into the payload. This starts off as 0 and
    /// must end up as `self.data().len()` once a method has been decoded.
    pub fn index(&self) -> usize {
        self.index
    }

    pub fn remaining(&self) -> usize {
        self.data.len() - self.index
    }

    /// Try to read `len` raw bytes starting at the current index.
    pub fn read_bytes(&mut self, len: usize) -> Result<&'a [u8], WireError> {
        if len > self.remaining() {
            return Err(WireError::UnexpectedEof {
                needed: len,
                remaining: self.remaining(),
            });
        }
        let value = &self.data[self.index..self.index + len];
        self.index += len;
        Ok(value)
    }

    fn read_array<const N: usize>(&mut self) -> Result<[u8; N], WireError> {
        let mut out = [0u8; N];
        out.copy_from_slice(self.read_bytes(N)?);
        Ok(out)
    }

    pub fn read_u8(&mut self) -> Result<u8, WireError> {
        Ok(self.read_array::<1>()?[0])
    }

    pub fn read_i8(&mut self) -> Result<i8, WireError> {
        Ok(i8::from_be_bytes(self.read_array()?))
    }

    pub fn read_u16(&mut self) -> Result<u16, WireError> {
        Ok(u16::from_be_bytes(self.read_array()?))
    }

    pub fn read_i16(&mut self) -> Result<i16, WireError> {
        Ok(i16::from_be_bytes(self.read_array()?))
    }

    pub fn read_u32(&mut self) -> Result<u32, WireError> {
        Ok(u32::from_be_bytes(self.read_array()?))
    }

    pub fn read_i32(&mut self) -> Result<i32, WireError> {
        Ok(i32::from_be_bytes(self.read_array()?))
    }

    pub fn read_u64(&mut self) -> Result<u64, WireError> {
        Ok(u64::from_be_bytes(self.read_array()?))
    }

    pub fn read_i64(&mut self) -> Result<i64, WireError> {
        Ok(i64::from_be_bytes(self.read_array()?))
    }

    pub fn read_f32(&mut self) -> Result<f32, WireError> {
        Ok(f32::from_be_bytes(self.read_array()?))
    }

    pub fn read_f64(&mut self) -> Result<f64, WireError> {
        Ok(f64::from_be_bytes(self.read_array()?))
    }

    /// Read a string prefixed by an 8-bit length.
    pub fn read_short_string(&mut self) -> Result<&'a str, WireError> {
        let len = self.read_u8()? as usize;
        let bytes = self.read_bytes(len)?;
        str::from_utf8(bytes).map_err(|_| WireError::InvalidUtf8)
    }

    /// Read raw bytes prefixed by a 32-bit length.
    pub fn read_long_bytes(&mut self) -> Result<&'a [u8], WireError> {
        let len = self.read_u32()? as usize;
        self.read_bytes(len)
    }

    /// Read a string prefixed by a 32-bit length.
    pub fn read_long_string(&mut self) -> Result<&'a str, WireError> {
        let bytes = self.read_long_bytes()?;
        str::from_utf8(bytes).map_err(|_| WireError::InvalidUtf8)
    }

    /// Read a field table prefixed by its 32-bit byte length.
    pub fn read_table(&mut self) -> Result<Table, WireError> {
        let bytes = self.read_long_bytes()?;
        Table::decode(&mut WireReader::new(bytes))
    }

    /// Succeeds only if every byte of the payload has been consumed.
    pub fn expect_eof(&self) -> Result<(), WireError> {
        match self.remaining() {
            0 => Ok(()),
            remaining => Err(WireError::TrailingBytes { remaining }),
        }
    }
}

/// Outbound frame buffer.
///
/// A frame is opened with [write_frame_header](WireWriter::write_frame_header),
/// filled with method fields and closed with
/// [update_frame_length](WireWriter::update_frame_length), which patches the
/// size and appends the frame-end octet. A frame that is never closed, for
/// instance because a string argument was too long, is discarded by the next
/// frame header.
#[derive(Debug, Default)]
pub struct WireWriter {
    buffer: BytesMut,
    frame_start: usize,
    frame_open: bool,
}

impl WireWriter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn write_frame_header(&mut self, frame_type: FrameType, channel: u16) {
        if self.frame_open {
            self.buffer.truncate(self.frame_start);
        }
        self.frame_open = true;
        self.frame_start = self.buffer.len();
        self.buffer.put_u8(frame_type as u8);
        self.buffer.put_u16(channel);
        self.buffer.put_u32(0);
    }

    pub fn write_method_header(&mut self, class_id: u16, method_id: u16) {
        self.buffer.put_u16(class_id);
        self.buffer.put_u16(method_id);
    }

    pub fn write_u8(&mut self, value: u8) {
        self.buffer.put_u8(value);
    }

    pub fn write_i8(&mut self, value: i8) {
        self.buffer.put_i8(value);
    }

    pub fn write_u16(&mut self, value: u16) {
        self.buffer.put_u16(value);
    }

    pub fn write_i16(&mut self, value: i16) {
        self.buffer.put_i16(value);
    }

    pub fn write_u32(&mut self, value: u32) {
        self.buffer.put_u32(value);
    }

    pub fn write_i32(&mut self, value: i32) {
        self.buffer.put_i32(value);
    }

    pub fn write_u64(&mut self, value: u64) {
        self.buffer.put_u64(value);
    }

    pub fn write_i64(&mut self, value: i64) {
        self.buffer.put_i64(value);
    }

    pub fn write_f32(&mut self, value: f32) {
        self.buffer.put_f32(value);
    }

    pub fn write_f64(&mut self, value: f64) {
        self.buffer.put_f64(value);
    }

    pub fn write_short_string(&mut self, value: &str) -> Result<(), WireError> {
        let len = value.len();
        if len > u8::MAX as usize {
            return Err(WireError::StringTooLong {
                len,
                max: u8::MAX as usize,
            });
        }
        self.buffer.put_u8(len as u8);
        self.buffer.put_slice(value.as_bytes());
        Ok(())
    }

    pub fn write_long_bytes(&mut self, value: &[u8]) -> Result<(), WireError> {
        let len = value.len();
        if len > u32::MAX as usize {
            return Err(WireError::StringTooLong {
                len,
                max: u32::MAX as usize,
            });
        }
        self.buffer.put_u32(len as u32);
        self.buffer.put_slice(value);
        Ok(())
    }

    pub fn write_long_string(&mut self, value: &str) -> Result<(), WireError> {
        self.write_long_bytes(value.as_bytes())
    }

    /// Write a field table. `None` writes an empty table.
    pub fn write_table(&mut self, table: Option<&Table>) -> Result<(), WireError> {
        let mut body = WireWriter::new();
        if let Some(table) = table {
            table.encode(&mut body)?;
        }
        self.write_long_bytes(body.extent())
    }

    /// Patch the size of the frame opened by the last frame header and
    /// append the frame-end octet. Does nothing when no frame is open.
    pub fn update_frame_length(&mut self) {
        if !self.frame_open {
            return;
        }
        let payload_start = self.frame_start + FRAME_HEADER_SIZE;
        let size = (self.buffer.len() - payload_start) as u32;
        self.buffer[self.frame_start + 3..payload_start].copy_from_slice(&size.to_be_bytes());
        self.buffer.put_u8(FRAME_END);
        self.frame_open = false;
    }

    /// Everything written since the last reset.
    pub fn extent(&self) -> &[u8] {
        &self.buffer
    }

    pub fn len(&self) -> usize {
        self.buffer.len()
    }

    pub fn is_empty(&self) -> bool {
        self.buffer.is_empty()
    }

    pub fn reset(&mut self) {
        self.buffer.clear();
        self.frame_start = 0;
        self.frame_open = false;
    }

    /// Hand the written bytes to the transport and leave the writer empty.
    pub fn take(&mut self) -> Bytes {
        self.frame_start = 0;
        self.frame_open = false;
        self.buffer.split().freeze()
    }
}

#[test]
fn read_u8() {
    let read = |bytes: &[u8]| WireReader::new(bytes).read_u8();
    assert_eq!(read(&[]), Err(WireError::UnexpectedEof { needed: 1, remaining: 0 }));
    assert_eq!(read(&[0]), Ok(0));
    assert_eq!(read(&[254]), Ok(254));
    assert_eq!(read(&[255]), Ok(255));
}

#[test]
fn read_big_endian_integers() {
    assert_eq!(WireReader::new(&[1, 2]).read_u16(), Ok(0x0102));
    assert_eq!(WireReader::new(&[0, 0, 1, 0]).read_u32(), Ok(256));
    assert_eq!(
        WireReader::new(&[0, 0, 0, 0, 0, 0, 0, 7]).read_u64(),
        Ok(7)
    );
    assert_eq!(
        WireReader::new(&[0, 0, 1]).read_u32(),
        Err(WireError::UnexpectedEof { needed: 4, remaining: 3 })
    );
}

#[test]
fn read_strings() {
    let mut rx = WireReader::new(&[2, b'o', b'k', 0, 0, 0, 3, b'a', b'b', b'c']);
    assert_eq!(rx.read_short_string(), Ok("ok"));
    assert_eq!(rx.read_long_string(), Ok("abc"));
    assert_eq!(rx.expect_eof(), Ok(()));

    let mut rx = WireReader::new(&[5, b'a']);
    assert_eq!(
        rx.read_short_string(),
        Err(WireError::UnexpectedEof { needed: 5, remaining: 1 })
    );

    let mut rx = WireReader::new(&[2, 0xff, 0xfe]);
    assert_eq!(rx.read_short_string(), Err(WireError::InvalidUtf8));
}

#[test]
fn expect_eof_reports_trailing_bytes() {
    let mut rx = WireReader::new(&[1, 2, 3]);
    rx.read_u8().unwrap();
    assert_eq!(rx.expect_eof(), Err(WireError::TrailingBytes { remaining: 2 }));
}

#[test]
fn write_frame() {
    let mut tx = WireWriter::new();
    tx.write_frame_header(FrameType::Method, 3);
    tx.write_method_header(60, 40);
    tx.write_u8(0b11);
    tx.update_frame_length();
    assert_eq!(
        tx.extent(),
        &[1, 0, 3, 0, 0, 0, 5, 0, 60, 0, 40, 3, FRAME_END]
    );

    tx.reset();
    assert!(tx.is_empty());
}

#[test]
fn abandoned_frame_is_discarded() {
    let mut tx = WireWriter::new();
    tx.write_frame_header(FrameType::Method, 1);
    tx.write_method_header(60, 40);
    assert!(tx.write_short_string(&"x".repeat(300)).is_err());

    tx.write_frame_header(FrameType::Heartbeat, 0);
    tx.update_frame_length();
    assert_eq!(tx.extent(), &[8, 0, 0, 0, 0, 0, 0, FRAME_END]);
}

#[test]
fn closing_without_an_open_frame_is_a_no_op() {
    let mut tx = WireWriter::new();
    tx.update_frame_length();
    assert!(tx.is_empty());

    tx.write_frame_header(FrameType::Heartbeat, 0);
    tx.update_frame_length();
    tx.update_frame_length();
    assert_eq!(tx.extent(), &[8, 0, 0, 0, 0, 0, 0, FRAME_END]);

    tx.take();
    tx.update_frame_length();
    assert!(tx.is_empty());
}

#[test]
fn write_short_string_rejects_long_values() {
    let mut tx = WireWriter::new();
    let long = "x".repeat(256);
    assert_eq!(
        tx.write_short_string(&long),
        Err(WireError::StringTooLong { len: 256, max: 255 })
    );
    assert!(tx.is_empty());
}

#[test]
fn empty_table_is_four_zero_bytes() {
    let mut tx = WireWriter::new();
    tx.write_table(None).unwrap();
    assert_eq!(tx.extent(), &[0, 0, 0, 0]);
    assert_eq!(WireReader::new(tx.extent()).read_table(), Ok(Table::new()));
}
