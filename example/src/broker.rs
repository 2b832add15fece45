//! Frames a broker sends to a client. The schema gives these methods a
//! client chassis only, so no encoder is generated for them.

use amqp_gen_wire::{FrameType, WireError, WireWriter};
use bytes::Bytes;

use crate::generated::{Basic, Queue, BASIC_CLASS, QUEUE_CLASS};

/// Build one method frame; `fields` writes the arguments.
pub fn method_frame(
    channel: u16,
    class_id: u16,
    method_id: u16,
    fields: impl FnOnce(&mut WireWriter) -> Result<(), WireError>,
) -> Result<Bytes, WireError> {
    let mut tx = WireWriter::new();
    tx.write_frame_header(FrameType::Method, channel);
    tx.write_method_header(class_id, method_id);
    fields(&mut tx)?;
    tx.update_frame_length();
    Ok(tx.take())
}

pub fn queue_declare_ok(channel: u16, queue: &str, message_count: u32, consumer_count: u32) -> Result<Bytes, WireError> {
    method_frame(channel, QUEUE_CLASS, Queue::DECLARE_OK_METHOD, |tx| {
        tx.write_short_string(queue)?;
        tx.write_u32(message_count);
        tx.write_u32(consumer_count);
        Ok(())
    })
}

pub fn basic_consume_ok(channel: u16, consumer_tag: &str) -> Result<Bytes, WireError> {
    method_frame(channel, BASIC_CLASS, Basic::CONSUME_OK_METHOD, |tx| {
        tx.write_short_string(consumer_tag)
    })
}

pub fn basic_deliver(
    channel: u16,
    consumer_tag: &str,
    delivery_tag: u64,
    redelivered: bool,
    exchange: &str,
    routing_key: &str,
) -> Result<Bytes, WireError> {
    method_frame(channel, BASIC_CLASS, Basic::DELIVER_METHOD, |tx| {
        tx.write_short_string(consumer_tag)?;
        tx.write_u64(delivery_tag);
        tx.write_u8(redelivered as u8);
        tx.write_short_string(exchange)?;
        tx.write_short_string(routing_key)
    })
}

pub fn heartbeat() -> Bytes {
    let mut tx = WireWriter::new();
    tx.write_frame_header(FrameType::Heartbeat, 0);
    tx.update_frame_length();
    tx.take()
}
