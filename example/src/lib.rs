//! A toy AMQP client built on the code generated from `protocol.xml`.
//!
//! [Loopback] stands in for a socket: request functions write into it and
//! frames queued with [Loopback::push_inbound] are dispatched back out of it.
//! The [broker] module builds the frames a broker would answer with.

/// Output of `amqp-gen` for `protocol.xml`.
#[allow(clippy::all)]
pub mod generated {
    include!(concat!(env!("OUT_DIR"), "/protocol.rs"));
}

pub mod broker;
mod loopback;

pub use loopback::Loopback;
